//! Append-only log of discovered exchange tickers.
//!
//! One upper-case code per line. Lines starting with `#` are comments.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::normalize_ticker;
use jaibird_core::Result;

pub struct TickerRegistry {
    path: PathBuf,
    // Serializes appends within this process.
    write_lock: Mutex<()>,
}

impl TickerRegistry {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sorted, de-duplicated set of known tickers. A missing file is empty.
    pub fn load(&self) -> Result<BTreeSet<String>> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_uppercase)
            .collect())
    }

    /// Append `code` if it is a valid ticker not already present.
    /// Returns whether the file grew.
    pub fn append(&self, code: &str) -> Result<bool> {
        let Some(code) = normalize_ticker(code) else {
            debug!("Ignoring invalid ticker {:?}", code);
            return Ok(false);
        };

        let _guard = self.write_lock.lock();
        if self.load()?.contains(&code) {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Keep the file line-oriented even if the last line lacks a newline.
        let needs_newline = std::fs::read(&self.path)
            .map(|bytes| !bytes.is_empty() && !bytes.ends_with(b"\n"))
            .unwrap_or(false);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if needs_newline {
            writeln!(file)?;
        }
        writeln!(file, "{}", code)?;

        info!("Discovered new ticker {}", code);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = TickerRegistry::new(dir.path().join("jse_tickers.txt"));
        assert!(registry.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let registry = TickerRegistry::new(dir.path().join("jse_tickers.txt"));

        assert!(registry.append("npn").unwrap());
        assert!(!registry.append("NPN").unwrap());
        assert!(registry.append("SOL").unwrap());
        assert!(!registry.append("TOOLONG").unwrap());

        let codes: Vec<String> = registry.load().unwrap().into_iter().collect();
        assert_eq!(codes, vec!["NPN", "SOL"]);
    }

    #[test]
    fn test_comments_and_missing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jse_tickers.txt");
        std::fs::write(&path, "# JSE tickers\nAGL\nbhg").unwrap();

        let registry = TickerRegistry::new(&path);
        assert!(registry.append("MTN").unwrap());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("bhg\nMTN\n"));
        let codes: Vec<String> = registry.load().unwrap().into_iter().collect();
        assert_eq!(codes, vec!["AGL", "BHG", "MTN"]);
    }
}
