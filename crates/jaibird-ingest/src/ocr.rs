//! Page rasterization and text recognition.
//!
//! Uses the Poppler `pdftoppm` and `tesseract` command-line tools. Both sit
//! behind traits so the pipeline can run against stubs.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tracing::{debug, error};

use crate::quality::{self, OcrQuality};
use jaibird_core::{Error, OcrSettings, Result};

/// Separator placed between recognized pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Renders every page of a document to an image file in `out_dir`,
/// returning the image paths in page order.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Image in, text out.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &Path) -> Result<String>;
}

/// `pdftoppm -r <dpi> -png`.
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(settings: &OcrSettings) -> Self {
        Self {
            binary: settings.pdftoppm_path.clone(),
            dpi: settings.dpi,
        }
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let prefix = out_dir.join("page");
        let output = Command::new(&self.binary)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| Error::Ocr(format!("{} failed to start: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(Error::Ocr(format!(
                "{} failed: {}",
                self.binary,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // Page numbers are zero-padded to a common width, so name order is page order.
        let mut pages: Vec<PathBuf> = std::fs::read_dir(out_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map(|ext| ext == "png").unwrap_or(false))
            .collect();
        pages.sort();
        Ok(pages)
    }
}

/// `tesseract <image> stdout --psm <mode> -l <lang>`.
pub struct TesseractEngine {
    binary: String,
    psm: u8,
    language: String,
}

impl TesseractEngine {
    pub fn new(settings: &OcrSettings) -> Self {
        Self {
            binary: settings.tesseract_path.clone(),
            psm: settings.page_segmentation_mode,
            language: settings.language.clone(),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &Path) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| {
                Error::Ocr(format!(
                    "Failed to run tesseract (is it installed? path='{}'): {}",
                    self.binary, e
                ))
            })?;

        if !output.status.success() {
            return Err(Error::Ocr(format!(
                "tesseract failed on {}: {}",
                image.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Recognized text for a whole document with its quality verdict.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    pub text: String,
    pub quality: OcrQuality,
    /// Sum of trimmed per-page character counts.
    pub char_count: usize,
    pub pages: usize,
}

impl OcrOutput {
    fn failed() -> Self {
        Self {
            text: String::new(),
            quality: OcrQuality::Poor,
            char_count: 0,
            pages: 0,
        }
    }
}

/// Rasterize, recognize, score.
pub struct OcrExtractor {
    rasterizer: Box<dyn PageRasterizer>,
    engine: Box<dyn OcrEngine>,
}

impl OcrExtractor {
    pub fn new(rasterizer: Box<dyn PageRasterizer>, engine: Box<dyn OcrEngine>) -> Self {
        Self { rasterizer, engine }
    }

    /// Extractor backed by the command-line tools.
    pub fn from_settings(settings: &OcrSettings) -> Self {
        Self::new(
            Box::new(PdftoppmRasterizer::new(settings)),
            Box::new(TesseractEngine::new(settings)),
        )
    }

    /// Recognize every page of `pdf`. Never fails: any error yields empty
    /// text scored poor.
    pub fn extract(&self, pdf: &Path) -> OcrOutput {
        match self.try_extract(pdf) {
            Ok(output) => output,
            Err(e) => {
                error!("OCR extraction failed for {}: {}", pdf.display(), e);
                OcrOutput::failed()
            }
        }
    }

    fn try_extract(&self, pdf: &Path) -> Result<OcrOutput> {
        let scratch = TempDir::new()?;
        debug!("Converting PDF to images: {}", pdf.display());
        let images = self.rasterizer.rasterize(pdf, scratch.path())?;

        let mut pages = Vec::with_capacity(images.len());
        let mut char_count = 0;
        for (i, image) in images.iter().enumerate() {
            debug!("OCR processing page {}/{}", i + 1, images.len());
            let text = self.engine.recognize(image)?;
            char_count += text.trim().chars().count();
            pages.push(text);
        }

        let text = pages.join(PAGE_SEPARATOR);
        let report = quality::assess(&text, char_count);
        debug!(
            "OCR extracted {} characters from {} pages, quality: {}{}",
            char_count,
            pages.len(),
            report.quality,
            report
                .reason
                .as_deref()
                .map(|r| format!(" ({})", r))
                .unwrap_or_default()
        );

        Ok(OcrOutput {
            text,
            quality: report.quality,
            char_count,
            pages: pages.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPages(Vec<&'static str>);

    impl PageRasterizer for FixedPages {
        fn rasterize(&self, _pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
            let mut paths = Vec::new();
            for (i, text) in self.0.iter().enumerate() {
                let path = out_dir.join(format!("page-{}.png", i + 1));
                std::fs::write(&path, text)?;
                paths.push(path);
            }
            Ok(paths)
        }
    }

    /// Reads the "image" back as its text.
    struct EchoEngine;

    impl OcrEngine for EchoEngine {
        fn recognize(&self, image: &Path) -> Result<String> {
            Ok(std::fs::read_to_string(image)?)
        }
    }

    struct BrokenEngine;

    impl OcrEngine for BrokenEngine {
        fn recognize(&self, _image: &Path) -> Result<String> {
            Err(Error::Ocr("engine crashed".into()))
        }
    }

    #[test]
    fn test_pages_joined_and_counted() {
        let extractor = OcrExtractor::new(
            Box::new(FixedPages(vec!["  page one  ", "page two"])),
            Box::new(EchoEngine),
        );
        let out = extractor.extract(Path::new("doc.pdf"));
        assert_eq!(out.text, "  page one  \n\npage two");
        assert_eq!(out.char_count, 16);
        assert_eq!(out.pages, 2);
        assert_eq!(out.quality, OcrQuality::Poor);
    }

    #[test]
    fn test_engine_error_is_empty_and_poor() {
        let extractor = OcrExtractor::new(
            Box::new(FixedPages(vec!["text"])),
            Box::new(BrokenEngine),
        );
        let out = extractor.extract(Path::new("doc.pdf"));
        assert!(out.text.is_empty());
        assert_eq!(out.quality, OcrQuality::Poor);
    }

    #[test]
    fn test_missing_binary_is_an_error() {
        let settings = OcrSettings {
            pdftoppm_path: "/nonexistent/pdftoppm".into(),
            tesseract_path: "/nonexistent/tesseract".into(),
            ..Default::default()
        };
        let dir = TempDir::new().unwrap();
        let raster = PdftoppmRasterizer::new(&settings);
        assert!(raster.rasterize(Path::new("doc.pdf"), dir.path()).is_err());

        let engine = TesseractEngine::new(&settings);
        assert!(engine.recognize(Path::new("page-1.png")).is_err());

        let out = OcrExtractor::from_settings(&settings).extract(Path::new("doc.pdf"));
        assert_eq!(out.quality, OcrQuality::Poor);
    }
}
