use serde::{Deserialize, Serialize};
use std::fmt;

/// Recognition language passed through to the OCR engine.
///
/// Codes outside the catalogue are kept as [`Language::Other`] and handed to
/// the engine unchanged; whether the engine has data for them is its concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    #[default]
    Eng,
    Urd,
    Ara,
    Hin,
    Fra,
    Spa,
    Deu,
    ChiSim,
    Other(String),
}

impl Language {
    pub const SUPPORTED: [Language; 8] = [
        Language::Eng,
        Language::Urd,
        Language::Ara,
        Language::Hin,
        Language::Fra,
        Language::Spa,
        Language::Deu,
        Language::ChiSim,
    ];

    pub fn code(&self) -> &str {
        match self {
            Language::Eng => "eng",
            Language::Urd => "urd",
            Language::Ara => "ara",
            Language::Hin => "hin",
            Language::Fra => "fra",
            Language::Spa => "spa",
            Language::Deu => "deu",
            Language::ChiSim => "chi_sim",
            Language::Other(code) => code,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Language::Eng => "English",
            Language::Urd => "Urdu",
            Language::Ara => "Arabic",
            Language::Hin => "Hindi",
            Language::Fra => "French",
            Language::Spa => "Spanish",
            Language::Deu => "German",
            Language::ChiSim => "Chinese (Simplified)",
            Language::Other(code) => code,
        }
    }

    pub fn native_name(&self) -> &str {
        match self {
            Language::Eng => "English",
            Language::Urd => "اردو",
            Language::Ara => "العربية",
            Language::Hin => "हिन्दी",
            Language::Fra => "Français",
            Language::Spa => "Español",
            Language::Deu => "Deutsch",
            Language::ChiSim => "简体中文",
            Language::Other(code) => code,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Language::Other(_))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Language::from(s.to_string()))
    }
}

impl From<String> for Language {
    fn from(code: String) -> Self {
        Language::SUPPORTED
            .into_iter()
            .find(|lang| lang.code() == code)
            .unwrap_or(Language::Other(code))
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_codes() {
        let codes: Vec<_> = Language::SUPPORTED.iter().map(|l| l.code().to_string()).collect();
        assert_eq!(codes, ["eng", "urd", "ara", "hin", "fra", "spa", "deu", "chi_sim"]);
    }

    #[test]
    fn known_code_parses_to_catalogue_entry() {
        assert_eq!("chi_sim".parse::<Language>().unwrap(), Language::ChiSim);
        assert_eq!(Language::ChiSim.name(), "Chinese (Simplified)");
    }

    #[test]
    fn unknown_code_passes_through() {
        let lang: Language = "eng+urd".parse().unwrap();
        assert_eq!(lang, Language::Other("eng+urd".into()));
        assert_eq!(lang.code(), "eng+urd");
        assert!(!lang.is_supported());
    }

    #[test]
    fn default_is_english() {
        assert_eq!(Language::default(), Language::Eng);
    }

    #[test]
    fn serde_as_plain_code() {
        assert_eq!(serde_json::to_string(&Language::Urd).unwrap(), "\"urd\"");
        let lang: Language = serde_json::from_str("\"deu\"").unwrap();
        assert_eq!(lang, Language::Deu);
    }
}
