//! Short factual digests of announcement content.

use std::sync::Arc;

use tracing::{error, warn};

use jaibird_core::text::truncate_chars;
use jaibird_core::{Announcement, StageResult, SummarySettings};
use jaibird_llm::{CompletionRequest, TextModel};

const SUMMARY_SYSTEM: &str =
    "You are a financial analyst creating concise summaries of JSE SENS announcements.";
const SUMMARY_MAX_TOKENS: usize = 250;
const SUMMARY_TEMPERATURE: f64 = 0.1;

pub struct SummaryGenerator {
    model: Option<Arc<dyn TextModel>>,
    settings: SummarySettings,
}

impl SummaryGenerator {
    pub fn new(model: Option<Arc<dyn TextModel>>, settings: SummarySettings) -> Self {
        Self { model, settings }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    pub fn prompt(&self, content: &str, ann: &Announcement) -> String {
        let window = truncate_chars(content, self.settings.input_window);
        format!(
            r#"Summarize the announcement in <= {max_words} words. No preamble. No company name restatement. Focus ONLY on substance:
- instrument/security, amounts/percentages, prices, key dates, tickers/codes, parties, and effects on holders
- if it's an interest or listing notice, extract the essential fields above
- do NOT use vague phrases like "further details were not provided" unless the text explicitly says so

Title: {title}
SENS: {sens}

Text:
{window}"#,
            max_words = self.settings.max_words,
            title = ann.title,
            sens = ann.sens_number,
        )
    }

    /// Summarize `content`. Empty when no model is configured or the call fails.
    pub async fn generate(&self, content: &str, ann: &Announcement) -> StageResult<String> {
        let Some(model) = &self.model else {
            error!("No model configured for summary generation");
            return StageResult::Empty;
        };
        if content.trim().is_empty() {
            return StageResult::Empty;
        }

        let request = CompletionRequest::new(self.prompt(content, ann))
            .with_system(SUMMARY_SYSTEM)
            .with_max_tokens(SUMMARY_MAX_TOKENS)
            .with_temperature(SUMMARY_TEMPERATURE);

        match model.complete(request).await {
            Ok(summary) if !summary.trim().is_empty() => {
                StageResult::Success(summary.trim().to_string())
            }
            Ok(_) => {
                warn!("Empty summary for SENS {}", ann.sens_number);
                StageResult::Empty
            }
            Err(e) => {
                error!("Summary generation failed for SENS {}: {}", ann.sens_number, e);
                StageResult::Empty
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jaibird_llm::testing::ScriptedModel;

    fn announcement() -> Announcement {
        Announcement::new("S512345", "Acme Ltd", "Dividend declaration")
    }

    #[test]
    fn test_prompt_window_and_fields() {
        let generator = SummaryGenerator::new(
            None,
            SummarySettings {
                max_words: 40,
                input_window: 10,
            },
        );
        let prompt = generator.prompt("0123456789ABCDEF", &announcement());
        assert!(prompt.contains("<= 40 words"));
        assert!(prompt.contains("Title: Dividend declaration"));
        assert!(prompt.contains("SENS: S512345"));
        assert!(prompt.ends_with("0123456789"));
    }

    #[tokio::test]
    async fn test_generate_success_and_request_shape() {
        let model = Arc::new(ScriptedModel::always("  Gross dividend of 120 cents per share.  "));
        let generator = SummaryGenerator::new(
            Some(model.clone() as Arc<dyn TextModel>),
            SummarySettings::default(),
        );

        let out = generator.generate("Dividend text", &announcement()).await;
        assert_eq!(out.into_text(), "Gross dividend of 120 cents per share.");

        let req = &model.requests()[0];
        assert_eq!(req.max_tokens, 250);
        assert!(req.system.as_deref().unwrap().contains("financial analyst"));
    }

    #[tokio::test]
    async fn test_failures_yield_empty() {
        let failing = SummaryGenerator::new(
            Some(Arc::new(ScriptedModel::failing()) as Arc<dyn TextModel>),
            SummarySettings::default(),
        );
        assert!(failing.generate("text", &announcement()).await.is_empty());

        let none = SummaryGenerator::new(None, SummarySettings::default());
        assert!(none.generate("text", &announcement()).await.is_empty());
    }
}
