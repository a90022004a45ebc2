use anyhow::Result;
use chrono::Utc;
use console::style;

use quckdb_core::validate::check;
use quckdb_core::{Collection, FieldStyle, SeedSet};

pub fn run(field_style: FieldStyle) -> Result<()> {
    let set = SeedSet::development(Utc::now());

    for collection in Collection::ALL {
        let documents = set.documents(collection, field_style);
        println!("{collection}: {} documents", documents.len());
    }
    println!("total: {} documents ({field_style} keys)", set.total());

    let violations = check(&set);
    if violations.is_empty() {
        eprintln!("{} All integrity checks passed", style("✓").green());
        return Ok(());
    }

    for violation in &violations {
        eprintln!("{} {violation}", style("✗").red());
    }
    anyhow::bail!("{} integrity check(s) failed", violations.len())
}
