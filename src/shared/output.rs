//! Rendering of command results as table, TSV, or JSON.

use std::path::Path;

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::table::render_table;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize, Serialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

/// Values that can be flattened into rows.
pub trait Tabular {
    fn headers(&self) -> Vec<&'static str>;
    fn rows(&self) -> Vec<Vec<String>>;
}

fn escape_tsv(cell: &str) -> String {
    cell.replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

fn render_tsv(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = headers.join("\t");
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_tsv(c)).collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

/// Render a value in the requested format.
pub fn render<T: Serialize + Tabular>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(value)?;
            text.push('\n');
            Ok(text)
        }
        OutputFormat::Tsv => Ok(render_tsv(&value.headers(), &value.rows())),
        OutputFormat::Table => Ok(render_table(&value.headers(), &value.rows())),
    }
}

/// Write already-rendered text to stdout, or to `output` when given.
pub fn write_text(text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            info!(path = %path.display(), "wrote output file");
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Render and write a value.
pub fn emit<T: Serialize + Tabular>(
    value: &T,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    write_text(&render(value, format)?, output)
}
