//! List command implementation.
//!
//! This module implements the `list` command, which displays managed files
//! in various formats (table, JSON, CSV, TSV), optionally with the health
//! of each link.

use crate::error::CliError;
use crate::utils::{format_timestamp, GlobalOptions, LinkHealth, Session};
use clap::{Args, ValueEnum};
use dotcor::ManagedFile;
use serde::Serialize;
use std::io::Write;

/// Column headers for CSV/TSV output.
const COLUMN_HEADERS: [&str; 4] = ["source_path", "repo_path", "added_at", "platforms"];

/// List managed dotfiles.
#[derive(Args)]
pub struct ListCommand {
    /// Output format
    #[arg(
        long,
        value_enum,
        default_value = "table",
        env = "DOTCOR_OUTPUT_FORMAT",
        ignore_case = true
    )]
    pub format: OutputFormat,

    /// Include the health of each link
    #[arg(long)]
    pub status: bool,

    /// Print only the source paths, one per line
    #[arg(long)]
    pub paths_only: bool,

    /// Include files restricted to other platforms
    #[arg(long)]
    pub all_platforms: bool,
}

/// Output format for list command.
#[derive(Clone, Copy, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated table format (human-readable)
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
    /// TSV format (tab-separated values)
    Tsv,
}

/// One output row.
#[derive(Serialize)]
struct Row {
    source_path: String,
    repo_path: String,
    added_at: String,
    platforms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
}

impl Row {
    fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.source_path.clone(),
            self.repo_path.clone(),
            self.added_at.clone(),
            self.platforms.join(","),
        ];
        if let Some(status) = self.status {
            fields.push(status.to_string());
        }
        fields
    }
}

impl ListCommand {
    /// Execute the list command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let session = Session::open(global)?;

        let entries: Vec<ManagedFile> = session
            .config()
            .managed_files
            .iter()
            .filter(|f| self.all_platforms || f.applies_here())
            .cloned()
            .collect();

        if self.paths_only {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            for entry in &entries {
                writeln!(handle, "{}", entry.source_path)?;
            }
            return Ok(());
        }

        let rows: Vec<Row> = entries
            .iter()
            .map(|entry| Row {
                source_path: entry.source_path.clone(),
                repo_path: entry.repo_path.clone(),
                added_at: entry.added_at.to_rfc3339(),
                platforms: entry.platforms.clone(),
                status: self
                    .status
                    .then(|| LinkHealth::check(&session.ctx, entry).as_str()),
            })
            .collect();

        match self.format {
            OutputFormat::Table => format_as_table(&entries, &rows, self.status)?,
            OutputFormat::Json => format_as_json(&rows)?,
            OutputFormat::Csv => format_as_delimited(&rows, self.status, b',')?,
            OutputFormat::Tsv => format_as_delimited(&rows, self.status, b'\t')?,
        }
        Ok(())
    }
}

fn headers(with_status: bool) -> Vec<&'static str> {
    let mut headers = COLUMN_HEADERS.to_vec();
    if with_status {
        headers.push("status");
    }
    headers
}

/// Format rows as a human-readable table.
fn format_as_table(entries: &[ManagedFile], rows: &[Row], with_status: bool) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    if rows.is_empty() {
        writeln!(handle, "No managed files")?;
        return Ok(());
    }

    let header_line = headers(with_status)
        .iter()
        .map(|s| s.to_uppercase())
        .collect::<Vec<_>>()
        .join("\t");
    writeln!(handle, "{header_line}")?;

    for (entry, row) in entries.iter().zip(rows) {
        let mut fields = row.fields();
        fields[2] = format_timestamp(entry.added_at);
        if fields[3].is_empty() {
            fields[3] = "all".to_string();
        }
        writeln!(handle, "{}", fields.join("\t"))?;
    }
    Ok(())
}

/// Format rows as pretty-printed JSON.
fn format_as_json(rows: &[Row]) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(rows)
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    println!("{json}");
    Ok(())
}

/// Format rows as CSV or TSV with a header line.
fn format_as_delimited(rows: &[Row], with_status: bool, delimiter: u8) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(stdout.lock());

    writer
        .write_record(headers(with_status))
        .map_err(csv_error)?;
    for row in rows {
        writer.write_record(row.fields()).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_error(e: csv::Error) -> CliError {
    CliError::Io(std::io::Error::other(e))
}
