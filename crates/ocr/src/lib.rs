pub mod date;
pub mod extract;
pub mod preprocess;
pub mod recognizer;
pub mod rules;
pub mod session;

pub use date::{display_value, format_date, parse_date};
pub use extract::{ExtractionConfig, ExtractionConfigError, Extractor, MAX_CAPTURE_TOKENS};
pub use passcan_core::{validate, PassportData, ValidationResult};
pub use preprocess::{prepare_for_ocr, prepare_for_ocr_from_bytes, PreprocessError, PreprocessOptions};
pub use recognizer::{MockRecognizer, OcrError, RecognitionEngine, StatusSink, UnavailableRecognizer};
pub use rules::{Capture, Rule, RuleChain};
pub use session::{ScanError, ScanOutcome, ScanSession};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
