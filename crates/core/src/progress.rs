//! Recognition progress as an explicit state machine.
//!
//! [`RecognitionProgress::apply`] is the only way a snapshot changes: it maps
//! `(current, event)` to the next snapshot, so the same sequence of events
//! always yields the same sequence of snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::language::Language;

/// Sub-stage reported by the recognition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStage {
    LoadingCore,
    LoadingLanguage,
    Initializing,
    Recognizing,
}

impl EngineStage {
    /// Parse an engine status string. Statuses outside the four weighted
    /// stages return `None` and do not move progress.
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "loading tesseract core" => Some(EngineStage::LoadingCore),
            "loading language traineddata" => Some(EngineStage::LoadingLanguage),
            "initializing tesseract" => Some(EngineStage::Initializing),
            "recognizing text" => Some(EngineStage::Recognizing),
            _ => None,
        }
    }

    /// Overall fraction at which this stage begins.
    pub fn base(self) -> f32 {
        match self {
            EngineStage::LoadingCore => 0.0,
            EngineStage::LoadingLanguage => 0.3,
            EngineStage::Initializing => 0.6,
            EngineStage::Recognizing => 0.8,
        }
    }

    /// Share of the overall fraction this stage owns.
    pub fn span(self) -> f32 {
        match self {
            EngineStage::LoadingCore => 0.3,
            EngineStage::LoadingLanguage => 0.3,
            EngineStage::Initializing => 0.2,
            EngineStage::Recognizing => 0.2,
        }
    }

    pub fn status(self) -> RunStatus {
        match self {
            EngineStage::Recognizing => RunStatus::Recognizing,
            _ => RunStatus::Loading,
        }
    }

    fn message(self, language: &Language) -> String {
        match self {
            EngineStage::LoadingCore => "Loading OCR engine...".to_string(),
            EngineStage::LoadingLanguage => format!("Loading {language} language data..."),
            EngineStage::Initializing => "Initializing recognition...".to_string(),
            EngineStage::Recognizing => "Extracting text from image...".to_string(),
        }
    }
}

/// A single engine status event with its stage-local progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub stage: EngineStage,
    /// Stage-local progress, clamped to 0.0–1.0.
    pub progress: f32,
}

impl EngineEvent {
    pub fn new(stage: EngineStage, progress: f32) -> Self {
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        Self { stage, progress }
    }

    /// Overall fraction this event maps to.
    pub fn fraction(&self) -> f32 {
        self.stage.base() + self.progress * self.stage.span()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Loading,
    Recognizing,
    Completed,
    Failed,
}

impl RunStatus {
    /// Position along `loading → recognizing → completed`. `Failed` sits
    /// outside the ordering and is reachable from any non-terminal state.
    fn rank(self) -> u8 {
        match self {
            RunStatus::Loading => 0,
            RunStatus::Recognizing => 1,
            RunStatus::Completed | RunStatus::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Loading => write!(f, "loading"),
            RunStatus::Recognizing => write!(f, "recognizing"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Everything that can move a run's progress.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Engine(EngineEvent),
    /// Recognition returned text; `valid` is the validator's verdict on the
    /// extracted record.
    Completed { valid: bool },
    Failed(String),
}

/// Observable progress of one recognition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionProgress {
    pub status: RunStatus,
    /// Overall progress, 0.0–1.0.
    pub fraction: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecognitionProgress {
    /// Snapshot published when a run begins.
    pub fn start() -> Self {
        Self {
            status: RunStatus::Loading,
            fraction: 0.0,
            message: Some("Initializing OCR engine...".to_string()),
        }
    }

    /// Compute the snapshot that follows `event`.
    ///
    /// Terminal snapshots are frozen. Engine events never lower the fraction
    /// or move the status backwards, even when the engine repeats a stage.
    pub fn apply(&self, event: &ProgressEvent, language: &Language) -> Self {
        if self.status.is_terminal() {
            return self.clone();
        }
        match event {
            ProgressEvent::Engine(ev) => {
                let target = ev.stage.status();
                let (status, message) = if target.rank() >= self.status.rank() {
                    (target, Some(ev.stage.message(language)))
                } else {
                    (self.status, self.message.clone())
                };
                Self {
                    status,
                    fraction: self.fraction.max(ev.fraction()).min(1.0),
                    message,
                }
            }
            ProgressEvent::Completed { valid } => Self {
                status: RunStatus::Completed,
                fraction: 1.0,
                message: Some(
                    if *valid {
                        "Passport data extracted successfully!"
                    } else {
                        "Some fields could not be extracted"
                    }
                    .to_string(),
                ),
            },
            ProgressEvent::Failed(reason) => Self {
                status: RunStatus::Failed,
                fraction: 0.0,
                message: Some(format!("Error processing image: {reason}")),
            },
        }
    }
}

impl Default for RecognitionProgress {
    fn default() -> Self {
        Self::start()
    }
}

/// Identifies one run of a session. Later runs have larger ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl RunId {
    pub fn next(self) -> Self {
        RunId(self.0 + 1)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// A progress snapshot tagged with the run that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub run: RunId,
    pub progress: RecognitionProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(stage: EngineStage, progress: f32) -> ProgressEvent {
        ProgressEvent::Engine(EngineEvent::new(stage, progress))
    }

    fn run_events(events: &[ProgressEvent]) -> Vec<RecognitionProgress> {
        let lang = Language::Eng;
        let mut state = RecognitionProgress::start();
        let mut seen = vec![state.clone()];
        for ev in events {
            state = state.apply(ev, &lang);
            seen.push(state.clone());
        }
        seen
    }

    #[test]
    fn stage_weights() {
        let cases = [
            (EngineStage::LoadingCore, 0.5, 0.15),
            (EngineStage::LoadingLanguage, 0.5, 0.45),
            (EngineStage::Initializing, 1.0, 0.8),
            (EngineStage::Recognizing, 0.5, 0.9),
            (EngineStage::Recognizing, 1.0, 1.0),
        ];
        for (stage, local, expected) in cases {
            let f = EngineEvent::new(stage, local).fraction();
            assert!((f - expected).abs() < 1e-6, "{stage:?} {local} gave {f}");
        }
    }

    #[test]
    fn local_progress_is_clamped() {
        assert_eq!(EngineEvent::new(EngineStage::LoadingCore, 1.7).progress, 1.0);
        assert_eq!(EngineEvent::new(EngineStage::LoadingCore, -0.2).progress, 0.0);
        assert_eq!(EngineEvent::new(EngineStage::LoadingCore, f32::NAN).progress, 0.0);
    }

    #[test]
    fn fraction_monotonic_through_stages_and_ends_at_one() {
        let seen = run_events(&[
            engine(EngineStage::LoadingCore, 1.0),
            engine(EngineStage::LoadingLanguage, 0.5),
            engine(EngineStage::Initializing, 1.0),
            engine(EngineStage::Recognizing, 0.3),
            engine(EngineStage::Recognizing, 1.0),
            ProgressEvent::Completed { valid: true },
        ]);
        for pair in seen.windows(2) {
            assert!(pair[1].fraction >= pair[0].fraction);
        }
        let last = seen.last().unwrap();
        assert_eq!(last.status, RunStatus::Completed);
        assert_eq!(last.fraction, 1.0);
        assert_eq!(last.message.as_deref(), Some("Passport data extracted successfully!"));
    }

    #[test]
    fn late_loading_event_does_not_move_backwards() {
        let seen = run_events(&[
            engine(EngineStage::Recognizing, 0.5),
            engine(EngineStage::LoadingCore, 1.0),
        ]);
        let last = seen.last().unwrap();
        assert_eq!(last.status, RunStatus::Recognizing);
        assert!((last.fraction - 0.9).abs() < 1e-6);
        assert_eq!(last.message.as_deref(), Some("Extracting text from image..."));
    }

    #[test]
    fn language_stage_message_names_the_code() {
        let p = RecognitionProgress::start()
            .apply(&engine(EngineStage::LoadingLanguage, 0.0), &Language::Urd);
        assert_eq!(p.message.as_deref(), Some("Loading urd language data..."));
    }

    #[test]
    fn failure_resets_fraction_and_freezes() {
        let seen = run_events(&[
            engine(EngineStage::Initializing, 0.5),
            ProgressEvent::Failed("unreadable image".into()),
            engine(EngineStage::Recognizing, 1.0),
            ProgressEvent::Completed { valid: true },
        ]);
        let last = seen.last().unwrap();
        assert_eq!(last.status, RunStatus::Failed);
        assert_eq!(last.fraction, 0.0);
        assert_eq!(last.message.as_deref(), Some("Error processing image: unreadable image"));
    }

    #[test]
    fn incomplete_extraction_still_completes() {
        let p = RecognitionProgress::start()
            .apply(&ProgressEvent::Completed { valid: false }, &Language::Eng);
        assert_eq!(p.status, RunStatus::Completed);
        assert_eq!(p.message.as_deref(), Some("Some fields could not be extracted"));
    }

    #[test]
    fn engine_status_strings() {
        assert_eq!(
            EngineStage::from_status("recognizing text"),
            Some(EngineStage::Recognizing)
        );
        assert_eq!(EngineStage::from_status("initialized api"), None);
    }

    #[test]
    fn run_ids_increase() {
        let first = RunId::default().next();
        assert!(first.next() > first);
        assert_eq!(first.to_string(), "run-1");
    }
}
