//! Loading URL lists from batch files.
//!
//! The format follows the file extension: `.json` is an array of strings,
//! `.csv` takes the first column of each row, anything else is plain text
//! with one URL per line.

use csv::{ReaderBuilder, Trim};
use log::debug;
use std::{fs, path::Path};

use crate::error::Error;

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<String>, Error> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read batch file {}: {e}", path.display())))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let urls = match extension.as_deref() {
        Some("json") => parse_json(&content)?,
        Some("csv") => parse_csv(&content)?,
        _ => parse_text(&content),
    };
    debug!("Loaded {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// One URL per line; blank lines and `#` comments are skipped.
#[must_use]
pub fn parse_text(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

pub fn parse_json(content: &str) -> Result<Vec<String>, Error> {
    let urls: Vec<String> = serde_json::from_str(content)?;
    Ok(urls
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect())
}

/// First column of each row. The first row is dropped when it is a header
/// or does not carry a scheme.
pub fn parse_csv(content: &str) -> Result<Vec<String>, Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut urls = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let Some(url) = record.get(0) else { continue };
        if row == 0 && looks_like_header(url) {
            continue;
        }
        if !url.is_empty() && !url.starts_with('#') {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}

fn looks_like_header(value: &str) -> bool {
    value.eq_ignore_ascii_case("url") || !value.contains("://")
}
