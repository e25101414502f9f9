//! bcp non-XML format files.
//!
//! bcp needs a format file to know how the character data is delimited. When a
//! [`FlatFile`] does not point at one, a format file is derived from its first
//! line: every column is read as `SQLCHAR` up to the file delimiter and the last
//! column up to the row terminator.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::FlatFile;

const FORMAT_VERSION: &str = "9.0";
const MAX_FIELD_LENGTH: usize = 8000;

/// A format file that stays valid for as long as this value lives
#[derive(Debug)]
pub enum FormatFile {
    Provided(PathBuf),
    Generated(NamedTempFile),
}

impl FormatFile {
    pub fn path(&self) -> &Path {
        match self {
            FormatFile::Provided(path) => path,
            FormatFile::Generated(file) => file.path(),
        }
    }

    /// Use the file's own format file, or generate one from its first line
    pub async fn for_flat_file(file: &FlatFile) -> Result<Self> {
        if let Some(path) = &file.format_file_path {
            return Ok(FormatFile::Provided(path.clone()));
        }

        let first_line = read_first_line(&file.path).await?;
        let row_terminator = if first_line.ends_with("\r\n") {
            "\r\n"
        } else {
            "\n"
        };
        let fields: Vec<&str> = first_line
            .trim_end_matches(['\r', '\n'])
            .split(file.delimiter)
            .collect();
        let columns: Vec<String> = if file.file_has_header_line {
            fields.iter().map(|field| column_name(field)).collect()
        } else {
            (1..=fields.len()).map(|n| format!("column_{n}")).collect()
        };

        let contents = render(&columns, file.delimiter, row_terminator);

        let mut generated = tempfile::Builder::new()
            .prefix("bcpaz-")
            .suffix(".fmt")
            .tempfile()
            .map_err(|e| Error::io(std::env::temp_dir(), e))?;
        let written = generated
            .write_all(contents.as_bytes())
            .and_then(|()| generated.flush());
        written.map_err(|e| Error::io(generated.path(), e))?;

        debug!(
            columns = columns.len(),
            path = %generated.path().display(),
            "Generated bcp format file"
        );

        Ok(FormatFile::Generated(generated))
    }
}

async fn read_first_line(path: &Path) -> Result<String> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| Error::io(path, e))?;

    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .await
        .map_err(|e| Error::io(path, e))?;

    if line.trim().is_empty() {
        return Err(Error::Configuration(format!(
            "cannot derive a format file from {}: first line is empty",
            path.display()
        )));
    }
    Ok(line)
}

fn column_name(field: &str) -> String {
    field
        .trim()
        .trim_matches('"')
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn escape_terminator(terminator: &str) -> String {
    terminator
        .chars()
        .map(|c| match c {
            '\t' => "\\t".to_string(),
            '\n' => "\\n".to_string(),
            '\r' => "\\r".to_string(),
            '"' => "\\\"".to_string(),
            '\\' => "\\\\".to_string(),
            other => other.to_string(),
        })
        .collect()
}

/// Render a non-XML format file for character data
pub fn render(columns: &[String], delimiter: char, row_terminator: &str) -> String {
    let delimiter = escape_terminator(&delimiter.to_string());
    let row_terminator = escape_terminator(row_terminator);

    let mut out = format!("{FORMAT_VERSION}\n{}\n", columns.len());
    for (idx, name) in columns.iter().enumerate() {
        let position = idx + 1;
        let terminator = if position == columns.len() {
            &row_terminator
        } else {
            &delimiter
        };
        out.push_str(&format!(
            "{position}\tSQLCHAR\t0\t{MAX_FIELD_LENGTH}\t\"{terminator}\"\t{position}\t{name}\t\"\"\n"
        ));
    }
    out
}
