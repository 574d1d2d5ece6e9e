use std::fmt::Write;

use passcan_core::{Field, FieldStatus, Language, PassportData, ProgressUpdate, ValidationResult};
use passcan_ocr::display_value;

/// One stderr line per progress snapshot, e.g. `[ 90%] recognizing  Extracting text from image...`.
pub fn progress_line(update: &ProgressUpdate) -> String {
    let p = &update.progress;
    let percent = (p.fraction * 100.0).round() as u32;
    let line = format!("[{percent:>3}%] {:<12} {}", p.status.to_string(), p.message.as_deref().unwrap_or(""));
    line.trim_end().to_string()
}

/// Human-readable results view: every field in display order, then the
/// validation verdict.
pub fn field_report(data: &PassportData, validation: &ValidationResult) -> String {
    let mut out = String::new();
    for field in Field::ALL {
        let marker = match data.status(field) {
            FieldStatus::Found => "",
            FieldStatus::Optional => "  (optional)",
            FieldStatus::Missing => "  (missing)",
        };
        let _ = writeln!(out, "{:<18}{}{marker}", field.label(), display_value(data, field));
    }
    out.push('\n');
    if validation.is_valid {
        out.push_str("All required fields extracted.\n");
    } else {
        let labels: Vec<_> = validation.missing_fields.iter().map(|f| f.label()).collect();
        let _ = writeln!(out, "Missing required fields: {}", labels.join(", "));
    }
    out
}

pub fn language_table() -> String {
    let mut out = String::new();
    for lang in Language::SUPPORTED.iter() {
        let _ = writeln!(out, "{:<9}{:<22}{}", lang.code(), lang.name(), lang.native_name());
    }
    out
}
