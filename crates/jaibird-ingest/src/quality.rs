//! Structural quality heuristics for recognized text.
//!
//! Recognition engines rarely expose usable confidence scores, so garbled
//! output is caught from the shape of the text instead.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters outside letters, digits, whitespace, common punctuation and
/// currency symbols.
static UNUSUAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s\.,;:!?\-\(\)%\$£€]").unwrap());

/// Single letters separated by spaces: words broken apart.
static BROKEN_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z]\s[a-zA-Z]\s").unwrap());

/// Long digit runs, usually merged numbers or noise.
static LONG_DIGIT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{5,}").unwrap());

pub const MIN_CHARS: usize = 100;
pub const MAX_ARTIFACT_RATIO: f64 = 0.1;
pub const MIN_WORDS: usize = 20;
pub const MIN_AVG_WORD_LEN: f64 = 2.0;
pub const MAX_AVG_WORD_LEN: f64 = 15.0;

/// Verdict on recognized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrQuality {
    Good,
    Poor,
}

impl OcrQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrQuality::Good => "good",
            OcrQuality::Poor => "poor",
        }
    }
}

impl std::fmt::Display for OcrQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality verdict plus the first rule that failed, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    pub quality: OcrQuality,
    pub reason: Option<String>,
}

impl QualityReport {
    fn good() -> Self {
        Self {
            quality: OcrQuality::Good,
            reason: None,
        }
    }

    fn poor(reason: String) -> Self {
        Self {
            quality: OcrQuality::Poor,
            reason: Some(reason),
        }
    }
}

/// Number of artifact matches across all three artifact patterns.
pub fn artifact_count(text: &str) -> usize {
    UNUSUAL_CHARS.find_iter(text).count()
        + BROKEN_WORDS.find_iter(text).count()
        + LONG_DIGIT_RUNS.find_iter(text).count()
}

/// Score recognized text. `char_count` is the total of trimmed per-page
/// character counts.
pub fn assess(text: &str, char_count: usize) -> QualityReport {
    if char_count < MIN_CHARS {
        return QualityReport::poor(format!("only {} characters", char_count));
    }

    let artifacts = artifact_count(text);
    if artifacts as f64 > char_count as f64 * MAX_ARTIFACT_RATIO {
        return QualityReport::poor(format!(
            "{} artifacts in {} characters",
            artifacts, char_count
        ));
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < MIN_WORDS {
        return QualityReport::poor(format!("only {} words", words.len()));
    }

    let avg = words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64;
    if !(MIN_AVG_WORD_LEN..=MAX_AVG_WORD_LEN).contains(&avg) {
        return QualityReport::poor(format!("average word length {:.1}", avg));
    }

    QualityReport::good()
}

/// Score text whose character count has not been tallied per page.
pub fn assess_text(text: &str) -> OcrQuality {
    assess(text, text.trim().chars().count()).quality
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str = "Shareholders are advised that the company has concluded an agreement \
        to dispose of its entire shareholding in its logistics subsidiary for a cash consideration \
        of R450 million. The disposal remains subject to the fulfilment of conditions precedent, \
        including approval by the competition authorities and the consent of its lenders. The \
        proceeds will be applied to reduce debt and fund the expansion of the retail division. \
        Further details regarding the transaction, including the pro forma financial effects, \
        will be published in due course once the independent reporting accountants have \
        completed their review of the financial information.";

    #[test]
    fn test_short_text_is_poor() {
        let text = "Trading statement for the period ended 31 March.";
        assert_eq!(assess_text(text), OcrQuality::Poor);
        assert_eq!(assess_text(&text[..40]), OcrQuality::Poor);
    }

    #[test]
    fn test_clean_paragraph_is_good() {
        assert!(CLEAN.len() > 500);
        let report = assess(CLEAN, CLEAN.chars().count());
        assert_eq!(report.quality, OcrQuality::Good, "{:?}", report.reason);
        assert!(report.reason.is_none());
    }

    #[test]
    fn test_symbol_noise_is_poor() {
        // One '#' per six characters is well above the 10% ceiling.
        let noisy = "profit# growth# shares# market# capital# income# ".repeat(10);
        let report = assess(&noisy, noisy.trim().chars().count());
        assert_eq!(report.quality, OcrQuality::Poor);
        assert!(report.reason.unwrap().contains("artifacts"));
    }

    #[test]
    fn test_broken_words_and_digit_runs_count_as_artifacts() {
        assert_eq!(artifact_count("t h e company"), 1);
        assert_eq!(artifact_count("ref 1234567 and 99"), 1);
        assert_eq!(artifact_count("R1,50 (15%) £2 €3 $4"), 0);
    }

    #[test]
    fn test_too_few_words_is_poor() {
        let text = "Extraordinarilylongwordsequence ".repeat(5);
        let report = assess(&text, text.trim().chars().count());
        assert_eq!(report.quality, OcrQuality::Poor);
        assert!(report.reason.unwrap().contains("words"));
    }

    #[test]
    fn test_average_word_length_bounds() {
        let long = "Supercalifragilisticexpialidocious ".repeat(25);
        let report = assess(&long, long.trim().chars().count());
        assert_eq!(report.quality, OcrQuality::Poor);
        assert!(report.reason.unwrap().contains("average"));
    }
}
