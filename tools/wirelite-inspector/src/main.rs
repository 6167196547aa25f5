//! wirelite-inspector - dump the structure of encoded type tables.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wirelite::prelude::*;
use wirelite::{Blob, RawMessage, ReaderOptions, TypeTable};

/// Inspect wirelite-encoded type tables.
///
/// Every element is treated as an opaque message, so any well-formed input
/// can be inspected without knowing the element schema.
#[derive(Parser)]
#[command(name = "wirelite-inspector", version, about)]
struct Cli {
    /// Input file (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Treat the input as hex text instead of raw bytes
    #[arg(long)]
    hex: bool,

    /// Input is a stream of length-prefixed tables
    #[arg(short, long)]
    delimited: bool,

    /// Bytes of each element to show
    #[arg(long, default_value_t = 16)]
    preview: usize,

    /// Reject inputs nested deeper than this
    #[arg(long)]
    recursion_limit: Option<usize>,

    /// Reject tables larger than this many bytes
    #[arg(long)]
    size_limit: Option<usize>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn read_input(cli: &Cli) -> Result<Bytes> {
    let raw = match &cli.input {
        Some(path) => fs::read(path).with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("failed to read stdin")?;
            buf
        }
    };
    if !cli.hex {
        return Ok(Bytes::from(raw));
    }
    let text: String = String::from_utf8(raw)
        .context("hex input is not valid UTF-8")?
        .split_whitespace()
        .collect();
    let decoded = hex::decode(&text).context("invalid hex input")?;
    Ok(Bytes::from(decoded))
}

fn preview(blob: &Blob, limit: usize) -> String {
    let shown = blob.slice(..blob.len().min(limit));
    let mut out = hex::encode(shown.to_vec());
    if blob.len() > limit {
        out.push_str("..");
    }
    out
}

fn print_table(index: Option<usize>, table: &TypeTable<RawMessage>, limit: usize) {
    match index {
        Some(i) => println!("table #{} ({} bytes)", i, table.serialized_size()),
        None => println!("table ({} bytes)", table.serialized_size()),
    }
    println!("  types: {}", table.types_count());
    for (i, element) in table.types_list().iter().enumerate() {
        println!(
            "  [{}] {} bytes  {}",
            i,
            element.serialized_size(),
            preview(element.unknown_fields(), limit)
        );
    }
    let unknown = table.unknown_fields();
    if !unknown.is_empty() {
        println!("  unknown fields: {} bytes  {}", unknown.len(), preview(unknown, limit));
    }
}

fn run(cli: &Cli) -> Result<()> {
    let data = read_input(cli)?;
    info!(bytes = data.len(), delimited = cli.delimited, "read input");

    let mut options = ReaderOptions::new();
    if let Some(limit) = cli.recursion_limit {
        options = options.with_recursion_limit(limit);
    }
    if let Some(limit) = cli.size_limit {
        options = options.with_size_limit(limit);
    }

    if !cli.delimited {
        let table = TypeTable::<RawMessage>::parse_with_options(data, &options)
            .context("failed to parse table")?;
        print_table(None, &table, cli.preview);
        return Ok(());
    }

    let mut buf = data;
    let mut count = 0;
    loop {
        let offset_left = buf.len();
        match TypeTable::<RawMessage>::parse_delimited_with_options(&mut buf, &options) {
            Ok(Some(table)) => {
                debug!(index = count, consumed = offset_left - buf.len(), "parsed delimited table");
                print_table(Some(count), &table, cli.preview);
                count += 1;
            }
            Ok(None) => break,
            Err(err) => bail!("table #{}: {}", count, err),
        }
    }
    info!(tables = count, "done");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    run(&cli)
}
