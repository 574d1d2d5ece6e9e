pub mod field;
pub mod language;
pub mod progress;
pub mod record;

pub use field::{Field, FieldStatus};
pub use language::Language;
pub use progress::{
    EngineEvent, EngineStage, ProgressEvent, ProgressUpdate, RecognitionProgress, RunId,
    RunStatus,
};
pub use record::{validate, PassportData, ValidationResult};
