use std::sync::Arc;

use passcan_core::{
    validate, EngineEvent, Language, PassportData, ProgressEvent, ProgressUpdate,
    RecognitionProgress, RunId, ValidationResult,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::extract::Extractor;
use crate::recognizer::{OcrError, RecognitionEngine, StatusSink};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error("Recognition task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{0} was superseded by a newer run")]
    Superseded(RunId),
}

/// Everything a completed run exposes to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub run: RunId,
    /// Raw recognized text.
    pub text: String,
    pub data: PassportData,
    pub validation: ValidationResult,
}

/// Drives recognition runs and tracks their progress.
///
/// A session holds the state of its latest run: the progress snapshot, the
/// raw text, the extracted record and its validation. Each progress change
/// is pushed to every subscriber as a [`ProgressUpdate`] tagged with the run
/// that produced it.
///
/// [`run`](Self::run) takes `&mut self`, so a session can't have two runs in
/// flight. Callers that drive an engine themselves use
/// [`begin`](Self::begin) / [`handle`](Self::handle) / [`finish`](Self::finish);
/// there, events and results carrying an older [`RunId`] are dropped.
pub struct ScanSession<R: RecognitionEngine> {
    engine: Arc<R>,
    extractor: Extractor,
    run: RunId,
    language: Language,
    progress: RecognitionProgress,
    text: String,
    data: PassportData,
    validation: ValidationResult,
    subscribers: Vec<mpsc::UnboundedSender<ProgressUpdate>>,
}

impl<R: RecognitionEngine> ScanSession<R> {
    pub fn new(engine: R) -> Self {
        Self::with_extractor(engine, Extractor::default())
    }

    pub fn with_extractor(engine: R, extractor: Extractor) -> Self {
        Self {
            engine: Arc::new(engine),
            extractor,
            run: RunId::default(),
            language: Language::default(),
            progress: idle(),
            text: String::new(),
            data: PassportData::default(),
            validation: ValidationResult::default(),
            subscribers: Vec::new(),
        }
    }

    /// Receive every progress snapshot published from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ProgressUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn current_run(&self) -> RunId {
        self.run
    }

    pub fn progress(&self) -> &RecognitionProgress {
        &self.progress
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn data(&self) -> &PassportData {
        &self.data
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    /// Recognize `image`, extract fields from the text and validate them.
    ///
    /// Engine failures are reported as a `failed` snapshot and returned as
    /// an error; a run whose text yields no fields still completes.
    pub async fn run(
        &mut self,
        image: Vec<u8>,
        language: Language,
    ) -> Result<ScanOutcome, ScanError> {
        let run = self.begin(language);
        tracing::info!(%run, language = %self.language, bytes = image.len(), "starting recognition");

        if image.is_empty() {
            return self.finish(run, Err(OcrError::EmptyImage.into()));
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<EngineEvent>();
        let engine = Arc::clone(&self.engine);
        let lang = self.language.clone();
        let task = tokio::task::spawn_blocking(move || {
            let status = StatusSink::new(tx);
            engine.recognize(&image, &lang, &status)
        });

        // The sink is dropped when the engine returns, which closes the channel.
        while let Some(event) = rx.recv().await {
            self.handle(run, &ProgressEvent::Engine(event));
        }

        let recognized = match task.await {
            Ok(result) => result.map_err(ScanError::from),
            Err(e) => Err(ScanError::from(e)),
        };
        self.finish(run, recognized)
    }

    /// Start a new run: clear the previous run's results and publish the
    /// initial snapshot.
    pub fn begin(&mut self, language: Language) -> RunId {
        self.run = self.run.next();
        self.language = language;
        self.text.clear();
        self.data = PassportData::default();
        self.validation = ValidationResult::default();
        self.progress = RecognitionProgress::start();
        self.publish();
        self.run
    }

    /// Apply one progress event. Returns `false` (and changes nothing) when
    /// the event belongs to a run other than the current one.
    pub fn handle(&mut self, run: RunId, event: &ProgressEvent) -> bool {
        if run != self.run {
            tracing::debug!(%run, current = %self.run, "dropping stale progress event");
            return false;
        }
        self.progress = self.progress.apply(event, &self.language);
        self.publish();
        true
    }

    /// Conclude `run` with the engine's result.
    pub fn finish(
        &mut self,
        run: RunId,
        recognized: Result<String, ScanError>,
    ) -> Result<ScanOutcome, ScanError> {
        if run != self.run {
            tracing::debug!(%run, current = %self.run, "dropping stale recognition result");
            return Err(ScanError::Superseded(run));
        }
        match recognized {
            Ok(text) => {
                let data = self.extractor.parse(&text);
                let validation = validate(&data);
                self.text = text;
                self.data = data;
                let valid = validation.is_valid;
                self.validation = validation;
                self.handle(run, &ProgressEvent::Completed { valid });
                tracing::info!(
                    %run,
                    valid,
                    missing = ?self.validation.missing_fields,
                    "recognition completed"
                );
                Ok(ScanOutcome {
                    run,
                    text: self.text.clone(),
                    data: self.data.clone(),
                    validation: self.validation.clone(),
                })
            }
            Err(e) => {
                self.text.clear();
                self.data = PassportData::default();
                self.validation = ValidationResult::default();
                self.handle(run, &ProgressEvent::Failed(e.to_string()));
                tracing::warn!(%run, "recognition failed: {e}");
                Err(e)
            }
        }
    }

    /// Return to the pre-run state. Events for earlier runs stay stale.
    pub fn reset(&mut self) {
        self.run = self.run.next();
        self.text.clear();
        self.data = PassportData::default();
        self.validation = ValidationResult::default();
        self.progress = idle();
    }

    fn publish(&mut self) {
        let update = ProgressUpdate { run: self.run, progress: self.progress.clone() };
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
    }
}

fn idle() -> RecognitionProgress {
    RecognitionProgress { message: None, ..RecognitionProgress::start() }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{MockRecognizer, UnavailableRecognizer};
    use passcan_core::{EngineStage, Field, RunStatus};

    const PAGE: &str = "JOHN SMITH\nA1234567\nDate of Birth 15 JAN 1990\nMALE BRITISH";

    fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressUpdate>) -> Vec<ProgressUpdate> {
        let mut out = Vec::new();
        while let Ok(u) = rx.try_recv() {
            out.push(u);
        }
        out
    }

    #[tokio::test]
    async fn successful_run_reports_monotonic_progress() {
        let mut session = ScanSession::new(MockRecognizer::new(PAGE));
        let mut rx = session.subscribe();

        let outcome = session.run(b"img".to_vec(), Language::Eng).await.unwrap();

        let updates = drain(&mut rx);
        // start + 8 engine events + completion
        assert_eq!(updates.len(), 10);
        assert!(updates.iter().all(|u| u.run == outcome.run));
        for pair in updates.windows(2) {
            assert!(pair[1].progress.fraction >= pair[0].progress.fraction);
        }
        assert_eq!(updates[0].progress, RecognitionProgress::start());

        let last = &updates.last().unwrap().progress;
        assert_eq!(last.status, RunStatus::Completed);
        assert_eq!(last.fraction, 1.0);
        assert_eq!(last.message.as_deref(), Some("Passport data extracted successfully!"));

        assert!(outcome.validation.is_valid);
        assert_eq!(outcome.data.passport_number.as_deref(), Some("A1234567"));
        assert_eq!(outcome.data.gender.as_deref(), Some("Male"));
        assert_eq!(session.text(), PAGE);
        assert_eq!(session.data(), &outcome.data);
    }

    #[tokio::test]
    async fn incomplete_extraction_completes_with_warning() {
        let mut session = ScanSession::new(MockRecognizer::new("illegible"));
        let outcome = session.run(b"img".to_vec(), Language::Fra).await.unwrap();

        assert!(!outcome.validation.is_valid);
        assert_eq!(outcome.validation.missing_fields, Field::REQUIRED.to_vec());
        assert_eq!(session.progress().status, RunStatus::Completed);
        assert_eq!(
            session.progress().message.as_deref(),
            Some("Some fields could not be extracted")
        );
    }

    #[tokio::test]
    async fn failed_run_clears_results() {
        let mut session = ScanSession::new(MockRecognizer::new(PAGE));
        session.run(b"img".to_vec(), Language::Eng).await.unwrap();
        assert!(!session.data().is_empty());

        session.engine = Arc::new(
            MockRecognizer::failing("unreadable image").with_events(vec![
                (EngineStage::LoadingCore, 1.0),
                (EngineStage::Recognizing, 0.5),
            ]),
        );
        let mut rx = session.subscribe();
        let err = session.run(b"img".to_vec(), Language::Eng).await.unwrap_err();

        assert!(matches!(err, ScanError::Ocr(OcrError::Engine(_))));
        assert!(session.text().is_empty());
        assert!(session.data().is_empty());
        assert_eq!(session.validation(), &ValidationResult::default());

        let last = drain(&mut rx).pop().unwrap().progress;
        assert_eq!(last.status, RunStatus::Failed);
        assert_eq!(last.fraction, 0.0);
        assert_eq!(
            last.message.as_deref(),
            Some("Error processing image: OCR engine error: unreadable image")
        );
    }

    #[tokio::test]
    async fn empty_image_fails_without_calling_engine() {
        let mut session = ScanSession::new(MockRecognizer::new(PAGE));
        let mut rx = session.subscribe();
        let err = session.run(Vec::new(), Language::Eng).await.unwrap_err();

        assert!(matches!(err, ScanError::Ocr(OcrError::EmptyImage)));
        let updates = drain(&mut rx);
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].progress.status, RunStatus::Failed);
        assert_eq!(
            updates[1].progress.message.as_deref(),
            Some("Error processing image: No file selected")
        );
    }

    #[tokio::test]
    async fn missing_engine_surfaces_as_failure() {
        let mut session = ScanSession::new(UnavailableRecognizer);
        let err = session.run(b"img".to_vec(), Language::Eng).await.unwrap_err();
        assert!(matches!(err, ScanError::Ocr(OcrError::NotAvailable)));
        assert_eq!(session.progress().status, RunStatus::Failed);
    }

    #[test]
    fn new_run_starts_from_cleared_state() {
        let mut session = ScanSession::new(MockRecognizer::new(PAGE));
        let first = session.begin(Language::Eng);
        session.finish(first, Ok(PAGE.to_string())).unwrap();
        assert!(session.validation().is_valid);

        session.begin(Language::Eng);
        assert!(session.text().is_empty());
        assert!(session.data().is_empty());
        assert!(!session.validation().is_valid);
        assert_eq!(session.progress(), &RecognitionProgress::start());
    }

    #[test]
    fn stale_run_events_are_ignored() {
        let mut session = ScanSession::new(MockRecognizer::new(PAGE));
        let old = session.begin(Language::Eng);
        let current = session.begin(Language::Urd);
        assert!(current > old);

        let late = ProgressEvent::Engine(EngineEvent::new(EngineStage::Recognizing, 1.0));
        assert!(!session.handle(old, &late));
        assert_eq!(session.progress(), &RecognitionProgress::start());

        let err = session.finish(old, Ok(PAGE.to_string())).unwrap_err();
        assert!(matches!(err, ScanError::Superseded(r) if r == old));
        assert!(session.data().is_empty());

        assert!(session.handle(current, &late));
        assert_eq!(session.progress().status, RunStatus::Recognizing);
    }

    #[test]
    fn reset_invalidates_current_run() {
        let mut session = ScanSession::new(MockRecognizer::new(PAGE));
        let run = session.begin(Language::Eng);
        session.reset();
        assert!(!session.handle(run, &ProgressEvent::Completed { valid: true }));
        assert_eq!(session.progress().message, None);
        assert_eq!(session.progress().fraction, 0.0);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut session = ScanSession::new(MockRecognizer::new(PAGE));
        let rx = session.subscribe();
        let mut kept = session.subscribe();
        drop(rx);
        session.begin(Language::Eng);
        assert_eq!(session.subscribers.len(), 1);
        assert_eq!(drain(&mut kept).len(), 1);
    }

    #[test]
    fn outcome_serializes_for_callers() {
        let mut session = ScanSession::new(MockRecognizer::new(PAGE));
        let run = session.begin(Language::Eng);
        let outcome = session.finish(run, Ok(PAGE.to_string())).unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["run"], 1);
        assert_eq!(json["data"]["fullName"], "JOHN SMITH");
        assert_eq!(json["validation"]["isValid"], true);
    }
}
