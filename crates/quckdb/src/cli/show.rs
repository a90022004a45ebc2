use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bson::Bson;
use chrono::Utc;

use quckdb_core::{Collection, FieldStyle, SeedSet};

pub fn run(collection: Collection, style: FieldStyle, output: Option<&Path>) -> Result<()> {
    let documents = SeedSet::development(Utc::now()).documents(collection, style);

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    for document in documents {
        let json = Bson::Document(document).into_relaxed_extjson();
        writeln!(out, "{}", serde_json::to_string(&json)?)?;
    }
    out.flush()?;
    Ok(())
}
