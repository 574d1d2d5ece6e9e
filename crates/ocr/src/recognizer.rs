use passcan_core::{EngineEvent, EngineStage, Language};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("No file selected")]
    EmptyImage,
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available, build with the `tesseract` feature")]
    NotAvailable,
}

/// Handle through which an engine reports stage progress while it works.
///
/// Reports are fire-and-forget: if nobody is listening they are dropped.
#[derive(Debug, Clone, Default)]
pub struct StatusSink {
    tx: Option<mpsc::UnboundedSender<EngineEvent>>,
}

impl StatusSink {
    pub fn new(tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that drops every report.
    pub fn discard() -> Self {
        Self::default()
    }

    pub fn report(&self, stage: EngineStage, progress: f32) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(EngineEvent::new(stage, progress));
        }
    }

    /// Run `step` bracketed by `stage` reports at 0 and 1. On error only the
    /// opening report is sent.
    pub fn stage<T>(
        &self,
        stage: EngineStage,
        step: impl FnOnce() -> Result<T, OcrError>,
    ) -> Result<T, OcrError> {
        self.report(stage, 0.0);
        let out = step()?;
        self.report(stage, 1.0);
        Ok(out)
    }

    /// Report a raw engine status string. Statuses that aren't one of the
    /// weighted stages are ignored.
    pub fn report_status(&self, status: &str, progress: f32) {
        match EngineStage::from_status(status) {
            Some(stage) => self.report(stage, progress),
            None => tracing::trace!(status, "ignoring unweighted engine status"),
        }
    }
}

/// Abstraction over an OCR engine.
/// Implementations accept raw image bytes and return the recognized text,
/// reporting stage progress through `status` as they go.
pub trait RecognitionEngine: Send + Sync + 'static {
    fn recognize(
        &self,
        image: &[u8],
        language: &Language,
        status: &StatusSink,
    ) -> Result<String, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string after replaying a scripted sequence of stage
/// events, so sessions can be exercised without Tesseract installed.
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    pub text: String,
    /// When set, recognition fails with this reason after the events replay.
    pub failure: Option<String>,
    pub events: Vec<(EngineStage, f32)>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        let events = [
            EngineStage::LoadingCore,
            EngineStage::LoadingLanguage,
            EngineStage::Initializing,
            EngineStage::Recognizing,
        ]
        .into_iter()
        .flat_map(|stage| [(stage, 0.0), (stage, 1.0)])
        .collect();
        Self { text: text.into(), failure: None, events }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self { failure: Some(reason.into()), ..Self::new("") }
    }

    pub fn with_events(mut self, events: Vec<(EngineStage, f32)>) -> Self {
        self.events = events;
        self
    }
}

impl RecognitionEngine for MockRecognizer {
    fn recognize(
        &self,
        _image: &[u8],
        _language: &Language,
        status: &StatusSink,
    ) -> Result<String, OcrError> {
        for (stage, progress) in &self.events {
            status.report(*stage, *progress);
        }
        match &self.failure {
            Some(reason) => Err(OcrError::Engine(reason.clone())),
            None => Ok(self.text.clone()),
        }
    }
}

/// Stand-in used when no real engine was compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRecognizer;

impl RecognitionEngine for UnavailableRecognizer {
    fn recognize(
        &self,
        _image: &[u8],
        _language: &Language,
        _status: &StatusSink,
    ) -> Result<String, OcrError> {
        Err(OcrError::NotAvailable)
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrError, RecognitionEngine, StatusSink};
    use leptess::LepTess;
    use passcan_core::{EngineStage, Language};

    /// Tesseract via leptess. Stage progress is reported at stage
    /// boundaries only; leptess exposes no finer-grained callback.
    pub struct TesseractRecognizer {
        data_path: Option<String>,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>) -> Self {
            Self { data_path }
        }
    }

    impl RecognitionEngine for TesseractRecognizer {
        fn recognize(
            &self,
            image: &[u8],
            language: &Language,
            status: &StatusSink,
        ) -> Result<String, OcrError> {
            // leptess loads the core and the language data in one call.
            let mut lt = status.stage(EngineStage::LoadingCore, || {
                LepTess::new(self.data_path.as_deref(), language.code())
                    .map_err(|e| OcrError::Engine(e.to_string()))
            })?;
            status.stage(EngineStage::LoadingLanguage, || Ok(()))?;
            status.stage(EngineStage::Initializing, || {
                lt.set_image_from_mem(image)
                    .map_err(|e| OcrError::ImageDecode(e.to_string()))
            })?;
            let text = status.stage(EngineStage::Recognizing, || {
                lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
            })?;
            Ok(text)
        }
    }
}
