//! Append-only log of evaluation runs.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Appends one summary line per evaluation run to a text file.
///
/// Line format: `{dataset} | {model} | {method} | ANLS*: {mean}`.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the mean score of a run. Returns the line written.
    pub fn append(&self, dataset: &str, model: &str, method: &str, anlss: &[f64]) -> io::Result<String> {
        let line = format_line(dataset, model, method, anlss);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        tracing::info!("Logged result to {}: {}", self.path.display(), line.trim_end());
        Ok(line)
    }
}

/// Mean of the scores rounded to three decimals; 0.0 when empty.
///
/// Rounds the exact binary value of the mean, so 0.2345 (stored as
/// 0.23449999...) becomes 0.234.
pub fn mean_score(anlss: &[f64]) -> f64 {
    if anlss.is_empty() {
        return 0.0;
    }
    let mean = anlss.iter().sum::<f64>() / anlss.len() as f64;
    let rounded = format!("{mean:.3}");
    rounded.parse().unwrap_or(mean)
}

fn format_line(dataset: &str, model: &str, method: &str, anlss: &[f64]) -> String {
    // Debug formatting prints the shortest round-trip form and keeps ".0"
    format!(
        "{dataset} | {model} | {method} | ANLS*: {:?}\n",
        mean_score(anlss)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_score() {
        assert_eq!(mean_score(&[]), 0.0);
        assert_eq!(mean_score(&[0.8, 1.0]), 0.9);
        assert_eq!(mean_score(&[1.0, 0.5, 0.0]), 0.5);
        assert_eq!(mean_score(&[1.0, 1.0, 0.5]), 0.833);
    }

    #[test]
    fn test_half_way_mean_rounds_exact_value() {
        assert_eq!(mean_score(&[0.2345]), 0.234);
        assert_eq!(mean_score(&[0.1235]), 0.123);
        assert_eq!(
            format_line("ds", "m", "simple", &[0.2345]),
            "ds | m | simple | ANLS*: 0.234\n"
        );
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_line("ds", "m", "simple", &[]),
            "ds | m | simple | ANLS*: 0.0\n"
        );
        assert_eq!(
            format_line("ds", "m", "simple", &[0.8, 1.0]),
            "ds | m | simple | ANLS*: 0.9\n"
        );
        assert_eq!(
            format_line("docvqa", "claude-3", "latin", &[1.0]),
            "docvqa | claude-3 | latin | ANLS*: 1.0\n"
        );
    }

    #[test]
    fn test_append_accumulates_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path().join("results.txt"));

        log.append("ds", "m", "simple", &[]).unwrap();
        log.append("ds", "m", "simple", &[0.8, 1.0]).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            content,
            "ds | m | simple | ANLS*: 0.0\nds | m | simple | ANLS*: 0.9\n"
        );
    }
}
