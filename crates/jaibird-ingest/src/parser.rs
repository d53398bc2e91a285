//! The parse pipeline: recognition → fallback → summary.

use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use tracing::{error, info, warn};

use crate::fallback::AiFallbackExtractor;
use crate::ocr::OcrExtractor;
use crate::quality::OcrQuality;
use crate::summary::SummaryGenerator;
use crate::text_layer;
use jaibird_core::{
    Announcement, Error, ExtractionMethod, ExtractionStatus, JaibirdConfig, Result, StageResult,
};
use jaibird_llm::TextModel;

pub struct PdfParser {
    ocr: Arc<OcrExtractor>,
    fallback: AiFallbackExtractor,
    summary: SummaryGenerator,
}

impl PdfParser {
    pub fn new(ocr: OcrExtractor, fallback: AiFallbackExtractor, summary: SummaryGenerator) -> Self {
        Self {
            ocr: Arc::new(ocr),
            fallback,
            summary,
        }
    }

    /// Parser backed by the command-line OCR tools and the default text-layer chain.
    pub fn from_config(
        config: &JaibirdConfig,
        parse_model: Option<Arc<dyn TextModel>>,
        summary_model: Option<Arc<dyn TextModel>>,
    ) -> Self {
        Self::new(
            OcrExtractor::from_settings(&config.ocr),
            AiFallbackExtractor::new(parse_model, text_layer::default_chain()),
            SummaryGenerator::new(summary_model, config.summary.clone()),
        )
    }

    /// Extract content and summary for `ann`.
    ///
    /// Never fails: problems surface only as the record's status and method.
    pub async fn parse(&self, mut ann: Announcement) -> Announcement {
        let path = match ann.local_pdf_path.as_deref() {
            Some(p) if Path::new(p).exists() => p.to_string(),
            other => {
                error!("PDF file not found for SENS {}: {:?}", ann.sens_number, other);
                if ann.parse_status != ExtractionStatus::Processing {
                    ann.advance_status(ExtractionStatus::Processing);
                }
                ann.advance_status(ExtractionStatus::Failed);
                ann.parse_method = ExtractionMethod::None;
                ann.pdf_content = None;
                ann.ai_summary = None;
                return ann;
            }
        };

        info!("Starting PDF parsing for SENS {}", ann.sens_number);
        if ann.parse_status != ExtractionStatus::Processing {
            ann.advance_status(ExtractionStatus::Processing);
        }
        ann.parsed_at = Some(Local::now().naive_local());

        match self.extract_content(Path::new(&path), &ann).await {
            Ok((content, method)) => {
                ann.parse_method = method;
                ann.pdf_content = if content.trim().is_empty() {
                    None
                } else {
                    Some(content)
                };
            }
            Err(e) => {
                error!("PDF parsing failed for SENS {}: {}", ann.sens_number, e);
                ann.parse_method = ExtractionMethod::Failed;
                ann.advance_status(ExtractionStatus::Failed);
                return ann;
            }
        }

        match ann.content().map(str::to_string) {
            Some(content) => {
                let summary = self.summary.generate(&content, &ann).await;
                ann.set_summary(summary.into_text());
                ann.advance_status(ExtractionStatus::Completed);
                info!("Successfully parsed and summarized SENS {}", ann.sens_number);
            }
            None => {
                ann.ai_summary = None;
                ann.advance_status(ExtractionStatus::Failed);
                error!("No content extracted from SENS {}", ann.sens_number);
            }
        }
        ann
    }

    async fn extract_content(
        &self,
        path: &Path,
        ann: &Announcement,
    ) -> Result<(String, ExtractionMethod)> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(Error::Extraction(format!("{} is not a file", path.display())));
        }

        let ocr = {
            let extractor = self.ocr.clone();
            let pdf = path.to_path_buf();
            tokio::task::spawn_blocking(move || extractor.extract(&pdf))
                .await
                .map_err(|e| Error::Ocr(format!("OCR task failed: {}", e)))?
        };
        if ocr.quality == OcrQuality::Good {
            info!("OCR successful for SENS {}", ann.sens_number);
            return Ok((ocr.text, ExtractionMethod::RecognizedText));
        }

        warn!(
            "OCR quality poor for SENS {} ({} chars), trying AI",
            ann.sens_number, ocr.char_count
        );
        let recovered = self.fallback.extract(path, &ocr.text).await;
        if let StageResult::Degraded { reason, .. } = &recovered {
            warn!("Fallback degraded for SENS {}: {}", ann.sens_number, reason);
        }
        Ok((recovered.into_text(), ExtractionMethod::AiAssisted))
    }
}
