//! JAIBird Ingest — document text extraction for filings.
//!
//! Recognition first; when its output scores poor, the embedded text layer
//! and a cleanup model take over. Content that survives is summarized.

pub mod fallback;
pub mod ocr;
pub mod parser;
pub mod quality;
pub mod summary;
pub mod text_layer;

pub use fallback::AiFallbackExtractor;
pub use ocr::{OcrEngine, OcrExtractor, OcrOutput, PageRasterizer, PdftoppmRasterizer, TesseractEngine};
pub use parser::PdfParser;
pub use quality::{OcrQuality, QualityReport};
pub use summary::SummaryGenerator;
pub use text_layer::{LopdfTextLayer, PdfExtractTextLayer, TextLayerExtractor};
