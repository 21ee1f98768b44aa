//! ingot-cast: Cast flat rows back into nested JSON documents
//!
//! Usage:
//!   # Read NDJSON rows from file, output to stdout
//!   ingot-cast rows.jsonl
//!
//!   # Read from stdin, output to stdout
//!   echo '{"ocid": "A", "id:integer": "1", "parties[]/name": "Alice"}' | ingot-cast
//!
//!   # Rows as a single JSON array, titles resolved through a schema
//!   ingot-cast --array --titles --schema schema.json rows.json
//!
//!   # Disable cross-row grouping entirely
//!   ingot-cast --root-id "" rows.jsonl

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ingot::{
    AddressingMode, Cell, Row, SchemaIndex, SheetUnflattener, UnflattenConfig,
};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};

#[derive(Parser, Debug)]
#[command(name = "ingot-cast")]
#[command(about = "Cast flat rows back into nested JSON documents", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Input is a single JSON array of row objects instead of NDJSON
    #[arg(long)]
    array: bool,

    /// Output file (use stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Root-identifier column name; an empty string disables grouping
    #[arg(long, default_value = "ocid")]
    root_id: String,

    /// Title token recognized as the root-identifier column in title mode
    #[arg(long)]
    root_id_title: Option<String>,

    /// Address columns by schema titles instead of field paths
    #[arg(long)]
    titles: bool,

    /// JSON schema file used for type casting and title resolution
    #[arg(long)]
    schema: Option<String>,

    /// Delimiter for splitting array-typed scalar cells
    #[arg(long, default_value = ",")]
    array_delimiter: char,

    /// Always append rollup items instead of merging on matching ids
    #[arg(long)]
    no_merge_rollups: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = UnflattenConfig {
        mode: if args.titles {
            AddressingMode::Titles
        } else {
            AddressingMode::FieldNames
        },
        root_id: args.root_id.clone(),
        root_id_title: args.root_id_title.clone(),
        array_delimiter: args.array_delimiter,
        merge_rollups: !args.no_merge_rollups,
        ..UnflattenConfig::default()
    };

    let schema = match &args.schema {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read schema file: {path}"))?;
            let value: Value = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse schema file: {path}"))?;
            Some(SchemaIndex::from_value(&value))
        }
        None => None,
    };

    let rows = read_rows(args.input.as_deref(), args.array)?;

    let unflattener = match &schema {
        Some(index) => SheetUnflattener::with_schema(config, index),
        None => SheetUnflattener::new(config),
    };

    let mut writer: BufWriter<Box<dyn Write>> = match &args.output {
        Some(path) => BufWriter::new(Box::new(
            File::create(path).with_context(|| format!("Failed to create output: {path}"))?,
        )),
        None => BufWriter::new(Box::new(std::io::stdout())),
    };

    let mut records = unflattener.unflatten(rows);
    for record in &mut records {
        let record = record.context("Failed to unflatten row")?;
        let json = serde_json::to_string(&record).context("Failed to serialize record")?;
        writeln!(writer, "{}", json).context("Failed to write record")?;
    }
    writer.flush().context("Failed to flush output")?;

    for warning in records.warnings() {
        eprintln!("warning: {}", warning);
    }

    Ok(())
}

/// Read flat rows from a file or stdin, as NDJSON or one JSON array.
fn read_rows(input: Option<&str>, array: bool) -> Result<Vec<Row>> {
    let values: Vec<Value> = if array {
        let mut text = String::new();
        match input {
            Some(path) => {
                File::open(path)
                    .with_context(|| format!("Failed to open input: {path}"))?
                    .read_to_string(&mut text)
                    .context("Failed to read input")?;
            }
            None => {
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read stdin")?;
            }
        }
        let parsed: Value = serde_json::from_str(&text).context("Failed to parse JSON")?;
        match parsed {
            Value::Array(items) => items,
            _ => bail!("expected a top-level JSON array of row objects"),
        }
    } else {
        let reader: Box<dyn BufRead> = match input {
            Some(path) => Box::new(BufReader::new(
                File::open(path).with_context(|| format!("Failed to open input: {path}"))?,
            )),
            None => Box::new(BufReader::new(std::io::stdin())),
        };
        let mut items = Vec::new();
        for line in reader.lines() {
            let line = line.context("Failed to read line")?;
            if line.trim().is_empty() {
                continue;
            }
            items.push(serde_json::from_str(&line).context("Failed to parse JSON row")?);
        }
        items
    };

    values
        .into_iter()
        .map(|value| match value {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(column, cell)| (column, Cell::from(cell)))
                .collect()),
            other => bail!("expected a JSON object per row, got: {other}"),
        })
        .collect()
}
