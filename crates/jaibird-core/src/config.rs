//! Configuration and data directory management.
//!
//! A single `JaibirdConfig` is built at process start and handed to each
//! component's constructor. Nothing reads settings from ambient state after
//! that point.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to all JAIBird data files and directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Announcement database (`data/jaibird.db`).
    pub announcements_db: PathBuf,
    /// Company intelligence database (`data/company_intel.db`).
    pub company_db: PathBuf,
    /// Discovered ticker log (`data/jse_tickers.txt`).
    pub ticker_registry: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
    /// Locally cached filing PDFs (`data/sens_pdfs/`).
    pub pdf_cache: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            announcements_db: root.join("jaibird.db"),
            company_db: root.join("company_intel.db"),
            ticker_registry: root.join("jse_tickers.txt"),
            llm_config_file: root.join("llm-config.json"),
            pdf_cache: root.join("sens_pdfs"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.pdf_cache)?;
        Ok(())
    }
}

/// Rasterizer and recognition engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Rasterization resolution for each page.
    pub dpi: u32,
    /// Path to the `pdftoppm` binary (Poppler).
    pub pdftoppm_path: String,
    /// Path to the `tesseract` binary.
    pub tesseract_path: String,
    /// Tesseract page segmentation mode (6 = single uniform block).
    pub page_segmentation_mode: u8,
    /// Recognition language.
    pub language: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            dpi: 300,
            pdftoppm_path: "pdftoppm".into(),
            tesseract_path: "tesseract".into(),
            page_segmentation_mode: 6,
            language: "eng".into(),
        }
    }
}

/// Thresholds used by the aggregation helpers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    /// Recent 7-day count must exceed `avg_weekly * anomaly_threshold`.
    pub anomaly_threshold: f64,
    /// Recent 7-day count must be at least this to be flagged.
    pub anomaly_min_recent: usize,
    /// Trailing window used to compute the weekly average.
    pub anomaly_lookback_days: i64,
    /// Scores above `+t` are Positive, below `-t` Negative.
    pub sentiment_threshold: f64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            anomaly_threshold: 2.0,
            anomaly_min_recent: 3,
            anomaly_lookback_days: 30,
            sentiment_threshold: 0.2,
        }
    }
}

/// Summary generation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarySettings {
    /// Hard word ceiling given to the model.
    pub max_words: usize,
    /// Only the first `input_window` characters of the content are sent.
    pub input_window: usize,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            max_words: 50,
            input_window: 10_000,
        }
    }
}

/// Top-level JAIBird configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JaibirdConfig {
    /// Data directory paths.
    pub data_paths: DataPaths,
    pub ocr: OcrSettings,
    pub summary: SummarySettings,
    pub analytics: AnalyticsSettings,
}

impl JaibirdConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let data_paths = DataPaths::new(data_dir)?;

        let mut ocr = OcrSettings::default();
        if let Ok(p) = std::env::var("PDFTOPPM_PATH") {
            ocr.pdftoppm_path = p;
        }
        if let Ok(p) = std::env::var("TESSERACT_CMD") {
            ocr.tesseract_path = p;
        }
        if let Some(dpi) = env_parse("OCR_DPI") {
            ocr.dpi = dpi;
        }

        let mut summary = SummarySettings::default();
        if let Some(words) = env_parse("SUMMARY_MAX_WORDS") {
            summary.max_words = words;
        }

        let mut analytics = AnalyticsSettings::default();
        if let Some(t) = env_parse("ANOMALY_THRESHOLD") {
            analytics.anomaly_threshold = t;
        }
        if let Some(n) = env_parse("ANOMALY_MIN_RECENT") {
            analytics.anomaly_min_recent = n;
        }
        if let Some(days) = env_parse("ANOMALY_LOOKBACK_DAYS") {
            analytics.anomaly_lookback_days = days;
        }
        if let Some(t) = env_parse("SENTIMENT_THRESHOLD") {
            analytics.sentiment_threshold = t;
        }

        Ok(Self {
            data_paths,
            ocr,
            summary,
            analytics,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_data_paths_layout() {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        assert!(paths.pdf_cache.is_dir());
        assert_eq!(paths.ticker_registry, dir.path().join("jse_tickers.txt"));
        assert_eq!(paths.company_db, dir.path().join("company_intel.db"));
    }

    #[test]
    fn test_defaults() {
        let analytics = AnalyticsSettings::default();
        assert_eq!(analytics.anomaly_threshold, 2.0);
        assert_eq!(analytics.anomaly_min_recent, 3);
        assert_eq!(analytics.sentiment_threshold, 0.2);
        assert_eq!(OcrSettings::default().dpi, 300);
        assert_eq!(SummarySettings::default().input_window, 10_000);
    }
}
