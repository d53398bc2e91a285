//! JAIBird Core — configuration, errors, announcement types.

pub mod config;
pub mod error;
pub mod text;
pub mod types;

pub use config::{AnalyticsSettings, DataPaths, JaibirdConfig, OcrSettings, SummarySettings};
pub use error::{Error, Result};
pub use types::{Announcement, ExtractionMethod, ExtractionStatus, StageResult};
