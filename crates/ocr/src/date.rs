use std::sync::OnceLock;

use chrono::NaiveDate;
use passcan_core::{Field, PassportData};
use regex::Regex;

/// Date surface forms found on passports, most common first. Each pattern
/// captures day, month and year as groups 1–3.
pub(crate) const DATE_SHAPES: [(&str, &str); 4] = [
    ("dd mmm yyyy", r"\b([0-9]{2})\s+([A-Z]{3})\s+([0-9]{4})\b"),
    ("dd/mm/yyyy", r"\b([0-9]{2})/([0-9]{2})/([0-9]{4})\b"),
    ("dd-mm-yyyy", r"\b([0-9]{2})-([0-9]{2})-([0-9]{4})\b"),
    ("dd.mm.yyyy", r"\b([0-9]{2})\.([0-9]{2})\.([0-9]{4})\b"),
];

/// Rendering used for parsed dates, e.g. `15 January 1990`.
pub const DISPLAY_FORMAT: &str = "%-d %B %Y";

/// Shown for fields extraction could not fill.
pub const NOT_FOUND: &str = "Not found";

const MONTH_CODES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

fn date_shapes() -> &'static [Regex; 4] {
    static R: OnceLock<[Regex; 4]> = OnceLock::new();
    R.get_or_init(|| DATE_SHAPES.map(|(_, p)| Regex::new(p).expect("invalid regex")))
}

/// Parse the first date shape found in `raw`.
///
/// The first shape that matches decides: if its parts don't form a real
/// calendar date the result is `None` rather than a later shape's match.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let upper = raw.to_uppercase();
    let c = date_shapes().iter().find_map(|re| re.captures(&upper))?;
    let day: u32 = c.get(1)?.as_str().parse().ok()?;
    let month = month_to_num(c.get(2)?.as_str())?;
    let year: i32 = c.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Render a raw extracted date for display. Anything that doesn't parse is
/// returned unchanged.
pub fn format_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(d) => d.format(DISPLAY_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// Display text for one field of a record.
pub fn display_value(data: &PassportData, field: Field) -> String {
    match data.get(field).filter(|v| !v.trim().is_empty()) {
        None => NOT_FOUND.to_string(),
        Some(v) if field.is_date() => format_date(v),
        Some(v) => v.to_string(),
    }
}

fn month_to_num(s: &str) -> Option<u32> {
    if let Some(idx) = MONTH_CODES.iter().position(|m| *m == s) {
        return Some(idx as u32 + 1);
    }
    s.parse().ok()
}
