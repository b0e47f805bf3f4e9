//! crucible-shape: Shape a JSON response into a table or time series
//!
//! Usage:
//!   # Read the document from a file, the query from another
//!   crucible-shape response.json --query query.json
//!
//!   # Read the document from stdin with an inline query
//!   curl -s https://api.example.com/metrics | crucible-shape \
//!       --query-json '{"root_selector": "$.data[*]", "format": "timeseries"}'
//!
//!   # Pin the fallback timestamp for repeatable series output
//!   crucible-shape data.json --query q.json --end-time 2024-01-01T00:00:00Z --compact

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use crucible::{ExtractConfig, Extractor, QueryDescriptor};
use log::info;
use std::fs;
use std::io::{stdin, Read};

#[derive(Parser, Debug)]
#[command(name = "crucible-shape")]
#[command(about = "Shape a JSON response into a table or time series", long_about = None)]
struct Args {
    /// Input document (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// File holding the query descriptor as JSON
    #[arg(long, short = 'q', conflicts_with = "query_json", required_unless_present = "query_json")]
    query: Option<String>,

    /// Query descriptor given inline as JSON
    #[arg(long)]
    query_json: Option<String>,

    /// Timestamp for series points without a time column
    /// (RFC 3339 or epoch milliseconds, default: now)
    #[arg(long, value_parser = parse_end_time)]
    end_time: Option<DateTime<Utc>>,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

fn parse_end_time(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(millis) = text.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| anyhow!("epoch milliseconds out of range: {}", millis));
    }
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("not RFC 3339 or epoch milliseconds: {}", text))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let query_text = match (&args.query, &args.query_json) {
        (Some(path), _) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file {}", path))?,
        (None, Some(inline)) => inline.clone(),
        (None, None) => return Err(anyhow!("either --query or --query-json is required")),
    };
    let query = QueryDescriptor::from_json(&query_text).context("Failed to parse query descriptor")?;

    let document = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path))?,
        None => {
            let mut buffer = String::new();
            stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let config = ExtractConfig {
        end_time: args.end_time,
    };
    let result = Extractor::new(config)
        .extract_str(&document, &query)
        .context("Failed to shape document")?;
    info!("shaped document as {:?}", query.format);

    let output = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };

    println!("{}", output);

    Ok(())
}
