use anyhow::{Context, Result};
use chrono::Utc;
use console::style;

use quckdb_core::{
    DocumentStore, MemoryStore, MongoStore, SeedOptions, SeedReport, SeedSet, Seeder,
};

use super::SeedArgs;
use crate::config::redact;

pub async fn run(mongo_uri: &str, args: &SeedArgs) -> Result<()> {
    let set = SeedSet::development(Utc::now());
    let options = SeedOptions {
        style: args.style,
        fresh: args.fresh,
    };

    if args.dry_run {
        let store = MemoryStore::new();
        let report = Seeder::new(&store, options).run(&set).await?;
        print_report(&report);
        println!(
            "Dry run: {} documents rendered, nothing written.",
            report.total_inserted()
        );
        return Ok(());
    }

    tracing::info!("Seeding {} via {}", args.database, redact(mongo_uri));
    let store = MongoStore::connect(mongo_uri, &args.database)
        .await
        .with_context(|| format!("failed to connect to {}", redact(mongo_uri)))?;

    seed_into(&store, options, &set, args.verify).await?;
    println!("MongoDB seed data inserted successfully.");
    Ok(())
}

async fn seed_into(
    store: &dyn DocumentStore,
    options: SeedOptions,
    set: &SeedSet,
    verify: bool,
) -> Result<()> {
    let seeder = Seeder::new(store, options);
    let report = seeder
        .run(set)
        .await
        .with_context(|| format!("seeding {} failed", store.describe()))?;
    print_report(&report);

    if verify {
        let mismatched = seeder
            .verify(set)
            .await?
            .into_iter()
            .filter(|check| !check.matches())
            .count();
        if mismatched > 0 {
            anyhow::bail!(
                "{mismatched} collection(s) do not match the seed data (run with --fresh for exact counts)"
            );
        }
    }

    Ok(())
}

fn print_report(report: &SeedReport) {
    for entry in &report.collections {
        let created = if entry.created { " (created)" } else { "" };
        eprintln!(
            "{} {}: {} documents{created}",
            style("●").green(),
            style(entry.collection).bold(),
            entry.inserted
        );
    }
}
