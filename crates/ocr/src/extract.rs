use std::sync::OnceLock;

use passcan_core::{Field, PassportData};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::date::DATE_SHAPES;
use crate::rules::{Capture, Rule, RuleChain};

/// Demonyms recognised as nationality, tested in this order.
pub const NATIONALITIES: [&str; 12] = [
    "PAKISTANI",
    "AMERICAN",
    "BRITISH",
    "CANADIAN",
    "AUSTRALIAN",
    "INDIAN",
    "CHINESE",
    "JAPANESE",
    "GERMAN",
    "FRENCH",
    "SPANISH",
    "ITALIAN",
];

/// Label words that end a keyword-anchored capture.
const LABEL_WORDS: [&str; 18] = [
    "DATE",
    "DOB",
    "SEX",
    "GENDER",
    "NATIONALITY",
    "AUTHORITY",
    "PLACE",
    "ISSUE",
    "ISSUED",
    "EXPIRY",
    "EXPIRES",
    "VALID",
    "NAME",
    "NAMES",
    "SURNAME",
    "GIVEN",
    "BIRTH",
    "SIGNATURE",
];

/// Largest accepted `capture_max_tokens`.
pub const MAX_CAPTURE_TOKENS: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionConfigError {
    #[error("capture_max_tokens must be between 1 and {MAX_CAPTURE_TOKENS}, got {0}")]
    CaptureTokensOutOfRange(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Upper bound on words captured after `BIRTH` / `AUTHORITY`.
    pub capture_max_tokens: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { capture_max_tokens: 4 }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<(), ExtractionConfigError> {
        if (1..=MAX_CAPTURE_TOKENS).contains(&self.capture_max_tokens) {
            Ok(())
        } else {
            Err(ExtractionConfigError::CaptureTokensOutOfRange(self.capture_max_tokens))
        }
    }
}

/// Pattern-based field extractor over raw OCR text.
///
/// Each field owns an ordered [`RuleChain`]; fields are matched independently
/// of each other against the same normalized text.
#[derive(Debug, Clone)]
pub struct Extractor {
    chains: Vec<(Field, RuleChain)>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::with_config(ExtractionConfig::default())
    }
}

impl Extractor {
    /// Extract with the default configuration.
    pub fn extract(ocr_text: &str) -> PassportData {
        static SHARED: OnceLock<Extractor> = OnceLock::new();
        SHARED.get_or_init(Extractor::default).parse(ocr_text)
    }

    pub fn with_config(config: ExtractionConfig) -> Self {
        let chains = Field::ALL
            .into_iter()
            .map(|field| (field, chain_for(field, &config)))
            .collect();
        Self { chains }
    }

    pub fn chain(&self, field: Field) -> Option<&RuleChain> {
        self.chains.iter().find(|(f, _)| *f == field).map(|(_, c)| c)
    }

    /// Extract structured fields from raw OCR text. Never fails; fields
    /// without a match are left absent.
    pub fn parse(&self, ocr_text: &str) -> PassportData {
        let text = normalize(ocr_text);
        self.chains
            .iter()
            .filter_map(|(field, chain)| {
                let (rule, value) = chain.first_hit(&text)?;
                tracing::debug!(field = %field, rule = %rule.label, "field matched");
                Some((*field, value))
            })
            .collect()
    }
}

/// Upper-case and collapse every whitespace run to a single space.
pub fn normalize(text: &str) -> String {
    text.to_uppercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn chain_for(field: Field, config: &ExtractionConfig) -> RuleChain {
    match field {
        Field::PassportNumber => RuleChain::new(vec![
            Rule::new("letter + 7 digits", r"\b[A-Z][0-9]{7}\b", Capture::Whole),
            Rule::new("G + 7 digits", r"\bG[0-9]{7}\b", Capture::Whole),
            Rule::new("2 letters + 7 digits", r"\b[A-Z]{2}[0-9]{7}\b", Capture::Whole),
            Rule::new("9 digits", r"\b[0-9]{9}\b", Capture::Whole),
        ]),
        Field::FullName => RuleChain::new(vec![Rule::new(
            "capitalised words",
            r"\b[A-Z]+(?: [A-Z]+)+\b",
            Capture::Whole,
        )]),
        Field::DateOfBirth => RuleChain::new(
            DATE_SHAPES
                .iter()
                .map(|(label, shape)| Rule::new(*label, shape, Capture::Whole))
                .collect(),
        ),
        Field::Nationality => RuleChain::literals(&NATIONALITIES),
        // FEMALE first: MALE is a substring of it.
        Field::Gender => RuleChain::new(vec![
            Rule::new("female", "FEMALE", Capture::Literal("Female")),
            Rule::new("male", "MALE", Capture::Literal("Male")),
        ]),
        Field::ExpiryDate => RuleChain::keyword_dates(
            &[
                ("EXPIRY", "EXPIRY"),
                ("EXPIRES", "EXPIRES"),
                ("VALID UNTIL", "VALID[: ]*UNTIL"),
            ],
            &DATE_SHAPES,
        ),
        Field::PlaceOfBirth => keyword_capture("BIRTH", config),
        Field::DateOfIssue => RuleChain::keyword_dates(
            &[("ISSUED", "ISSUED"), ("DATE OF ISSUE", "DATE[: ]*OF[: ]*ISSUE")],
            &DATE_SHAPES,
        ),
        Field::Authority => keyword_capture("AUTHORITY", config),
        Field::MrzData => RuleChain::new(vec![Rule::new(
            "44-char MRZ line",
            r"(?:^|[^A-Z0-9<])([A-Z0-9<]{44})(?:[^A-Z0-9<]|$)",
            Capture::Group(1),
        )]),
    }
}

/// Whole words following `keyword`, bounded by the configured token count
/// and cut at the next label word. Out-of-range counts are clamped; use
/// [`ExtractionConfig::validate`] to reject them up front.
fn keyword_capture(keyword: &str, config: &ExtractionConfig) -> RuleChain {
    let extra = config.capture_max_tokens.clamp(1, MAX_CAPTURE_TOKENS) - 1;
    let pattern =
        format!(r"\b{keyword}\b[: ]*([A-Z]+(?: [A-Z]+){{0,{extra}}})(?:[^A-Z0-9<]|$)");
    RuleChain::new(vec![
        Rule::new(keyword, &pattern, Capture::Group(1)).with_refine(cut_at_label)
    ])
}

fn cut_at_label(value: &str) -> Option<String> {
    let words: Vec<&str> = value
        .split(' ')
        .take_while(|w| !LABEL_WORDS.contains(w))
        .collect();
    (!words.is_empty()).then(|| words.join(" "))
}
