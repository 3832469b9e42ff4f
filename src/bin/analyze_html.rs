use anyhow::{Context, Result};
use std::fs;
use url::Url;

use classroom_ingest::{discover_links, extract_records, merge_documents, normalize_records, Config};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: analyze_html <file.html> [base_url]")?;
    let base_url = args
        .next()
        .unwrap_or_else(|| "http://localhost/".to_string());

    let base_url = Url::parse(&base_url).context("Invalid base URL")?;
    let html = fs::read_to_string(&path).with_context(|| format!("Failed to read {path}"))?;

    let config = Config::load()?;
    let selectors = config.selectors.compile()?;

    let records = extract_records(&html, &selectors);
    println!("Found {} raw records", records.len());
    for (index, record) in records.iter().enumerate().take(5) {
        let fields: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        println!("  record {}: fields {:?}", index + 1, fields);
    }

    let document = normalize_records(base_url.as_str(), &records);
    println!(
        "Normalized {} students, {} classes, {} grades",
        document.students.len(),
        document.classes.len(),
        document.grades.len()
    );

    let links = discover_links(&html, &base_url, &selectors);
    println!("Discovered {} detail links", links.len());
    for link in &links {
        println!("  {link}");
    }

    let merged = merge_documents(&[document]);
    println!("{}", serde_json::to_string_pretty(&merged)?);

    Ok(())
}
