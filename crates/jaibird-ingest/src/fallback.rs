//! Model-assisted recovery of poorly recognized text.
//!
//! Attempt order: recognized text (if long enough) or the embedded text
//! layer, then a cleanup pass through the document model. Every failure
//! degrades to the best raw text in hand.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::text_layer::{self, TextLayerExtractor};
use jaibird_core::StageResult;
use jaibird_llm::{CompletionRequest, TextModel};

/// Below this many characters the recognized text is replaced by the
/// embedded text layer before cleanup.
pub const MIN_SOURCE_CHARS: usize = 50;

const CLEANUP_SYSTEM: &str =
    "You are a financial document parser specializing in JSE SENS announcements.";
const CLEANUP_MAX_TOKENS: usize = 2000;
const CLEANUP_TEMPERATURE: f64 = 0.1;

pub fn cleanup_prompt(raw: &str) -> String {
    format!(
        r#"Please clean and structure the following OCR-extracted text from a JSE SENS announcement.
The OCR may have errors, broken words, or formatting issues.

Your task:
1. Fix obvious OCR errors and broken words
2. Structure the content logically
3. Preserve all financial data, dates, and company information
4. Remove excessive whitespace and formatting artifacts
5. Return clean, readable text that maintains the original meaning. Do NOT add assumptions. Do NOT insert phrases like "details not provided" unless those exact words appear.

OCR Text:
{raw}

Please return only the cleaned text without any explanations or comments."#
    )
}

pub struct AiFallbackExtractor {
    model: Option<Arc<dyn TextModel>>,
    text_layers: Arc<Vec<Box<dyn TextLayerExtractor>>>,
}

impl AiFallbackExtractor {
    pub fn new(
        model: Option<Arc<dyn TextModel>>,
        text_layers: Vec<Box<dyn TextLayerExtractor>>,
    ) -> Self {
        Self {
            model,
            text_layers: Arc::new(text_layers),
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Runs the text-layer chain on the blocking pool.
    async fn read_text_layer(&self, pdf: &Path) -> Option<String> {
        let chain = self.text_layers.clone();
        let pdf = pdf.to_path_buf();
        match tokio::task::spawn_blocking(move || text_layer::extract_first(&chain, &pdf)).await {
            Ok(text) => text,
            Err(e) => {
                error!("Text-layer task failed: {}", e);
                None
            }
        }
    }

    /// Recover text for `pdf`, given the (possibly poor) recognized text.
    pub async fn extract(&self, pdf: &Path, recognized: &str) -> StageResult<String> {
        let Some(model) = &self.model else {
            error!("No model configured for document cleanup");
            return as_degraded(recognized, "no document model configured");
        };

        let source = if recognized.trim().chars().count() < MIN_SOURCE_CHARS {
            info!("Recognized text unusable, reading text layer of {}", pdf.display());
            match self.read_text_layer(pdf).await {
                Some(text) => {
                    info!("Text layer yielded {} characters", text.chars().count());
                    text
                }
                None => {
                    warn!("Neither recognition nor text layer produced text for {}", pdf.display());
                    return StageResult::Empty;
                }
            }
        } else {
            recognized.to_string()
        };

        let request = CompletionRequest::new(cleanup_prompt(&source))
            .with_system(CLEANUP_SYSTEM)
            .with_max_tokens(CLEANUP_MAX_TOKENS)
            .with_temperature(CLEANUP_TEMPERATURE);

        match model.complete(request).await {
            Ok(cleaned) if !cleaned.trim().is_empty() => StageResult::Success(cleaned.trim().to_string()),
            Ok(_) => {
                warn!("{} returned empty cleanup", model.name());
                as_degraded(&source, "model returned no text")
            }
            Err(e) => {
                error!("AI parsing failed via {}: {}", model.name(), e);
                as_degraded(&source, e.to_string())
            }
        }
    }
}

fn as_degraded(text: &str, reason: impl Into<String>) -> StageResult<String> {
    if text.trim().is_empty() {
        StageResult::Empty
    } else {
        StageResult::degraded(text.to_string(), reason)
    }
}
