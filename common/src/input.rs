//! Line-delimited list inputs.
//!
//! Every list (targets, exclusions, commands, proxies) holds one entry per
//! non-blank line, with surrounding whitespace trimmed.

use std::fs;
use std::io::BufRead;
use std::path::Path;

use crate::config::InputSource;
use crate::error::ValidationError;

/// Splits text into trimmed, non-blank lines.
pub fn lines_from_str(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Reads a list file.
pub fn read_lines(path: &Path) -> Result<Vec<String>, ValidationError> {
    let text = fs::read_to_string(path).map_err(|source| ValidationError::UnreadableFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(lines_from_str(&text))
}

/// Reads every non-blank line from a reader such as stdin.
pub fn read_lines_from<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

impl InputSource {
    /// Resolves the source into its entries.
    ///
    /// An inline value is a single entry; it is not split on newlines.
    pub fn entries(&self) -> Result<Vec<String>, ValidationError> {
        match self {
            InputSource::Inline(value) => {
                let value = value.trim();
                if value.is_empty() {
                    Ok(Vec::new())
                } else {
                    Ok(vec![value.to_string()])
                }
            }
            InputSource::File(path) => read_lines(path),
            InputSource::Lines(lines) => Ok(lines.clone()),
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
