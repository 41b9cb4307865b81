use anyhow::{bail, Result};
use std::env;
use std::path::Path;

// Use library instead of local modules
use vehicle_registry::{
    find_record, link_batch, load_records, unit_breakdown, write_records, NormalizeEngine,
    DEFAULT_CARD_PAD, VERSION,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("normalize") => run_normalize(&args[2..]),
        Some("stats") => run_stats(&args[2..]),
        Some("find") => run_find(&args[2..]),
        Some("links") => run_links(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("🚗 Vehicle Registry v{}", VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Usage:");
    println!("  vehicle-registry normalize <current.csv> <incoming.csv> <out.csv> [--width N] [--json]");
    println!("  vehicle-registry stats <file.csv>");
    println!("  vehicle-registry find <file.csv> <query>");
    println!("  vehicle-registry links <file.csv> <base-url>");
}

fn run_normalize(args: &[String]) -> Result<()> {
    let mut paths = Vec::new();
    let mut width = DEFAULT_CARD_PAD;
    let mut json = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--width" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--width needs a value"))?;
                width = value.parse()?;
            }
            "--json" => json = true,
            other => paths.push(other.to_string()),
        }
    }
    if paths.len() != 3 {
        bail!("normalize needs <current.csv> <incoming.csv> <out.csv>");
    }

    println!("🧮 Normalizing batch (card code width {})", width);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load snapshot and incoming batch
    println!("\n📂 Loading current records...");
    let (current, current_stat) = load_records(Path::new(&paths[0]))?;
    println!("✓ {}", current_stat.summary());

    println!("\n📂 Loading incoming records...");
    let (incoming, incoming_stat) = load_records(Path::new(&paths[1]))?;
    println!("✓ {}", incoming_stat.summary());

    // 2. Normalize
    println!("\n🏛️  Resolving unit codes and card codes...");
    let engine = NormalizeEngine::new().with_pad(width);
    let report = engine.normalize_batch(&current, &incoming);
    println!("✓ {}", report.summary());

    for error in &report.errors {
        eprintln!("  ⚠️  {}", error);
    }

    // 3. Write back
    println!("\n💾 Writing normalized records...");
    write_records(Path::new(&paths[2]), &report.records)?;
    println!("✓ Wrote {} rows to {}", report.records.len(), paths[2]);

    if json {
        println!("\n{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn run_stats(args: &[String]) -> Result<()> {
    let [path] = args else {
        bail!("stats needs <file.csv>");
    };

    let (records, stat) = load_records(Path::new(path))?;
    println!("📂 {}", stat.summary());

    let breakdown = unit_breakdown(&records);
    println!("📊 {}", breakdown.summary());
    for count in &breakdown.counts {
        println!("  {:<10} {}", count.unit_code, count.count);
    }

    Ok(())
}

fn run_find(args: &[String]) -> Result<()> {
    let [path, query] = args else {
        bail!("find needs <file.csv> <query>");
    };

    let (records, _) = load_records(Path::new(path))?;
    match find_record(&records, query) {
        Some(record) => {
            println!("✅ Found:");
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        None => println!("❌ No record matches '{}'", query),
    }

    Ok(())
}

fn run_links(args: &[String]) -> Result<()> {
    let [path, base_url] = args else {
        bail!("links needs <file.csv> <base-url>");
    };

    let (records, _) = load_records(Path::new(path))?;
    let batch = link_batch(&records, base_url);
    println!("🎁 {}", batch.summary());
    for (unit, links) in &batch.groups {
        println!("\n{}", unit);
        for link in links {
            println!("  {}  {}", link.id, link.url);
        }
    }

    Ok(())
}
