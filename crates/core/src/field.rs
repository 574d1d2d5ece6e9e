use serde::{Deserialize, Serialize};
use std::fmt;

/// One named slot of a [`PassportData`](crate::PassportData) record.
///
/// Variants are declared in results-view order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    PassportNumber,
    FullName,
    DateOfBirth,
    Nationality,
    Gender,
    ExpiryDate,
    PlaceOfBirth,
    DateOfIssue,
    Authority,
    MrzData,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::PassportNumber,
        Field::FullName,
        Field::DateOfBirth,
        Field::Nationality,
        Field::Gender,
        Field::ExpiryDate,
        Field::PlaceOfBirth,
        Field::DateOfIssue,
        Field::Authority,
        Field::MrzData,
    ];

    /// Fields a record must carry to be considered complete, in report order.
    pub const REQUIRED: [Field; 3] = [Field::PassportNumber, Field::FullName, Field::DateOfBirth];

    pub fn name(self) -> &'static str {
        match self {
            Field::PassportNumber => "passportNumber",
            Field::FullName => "fullName",
            Field::DateOfBirth => "dateOfBirth",
            Field::Nationality => "nationality",
            Field::Gender => "gender",
            Field::ExpiryDate => "expiryDate",
            Field::PlaceOfBirth => "placeOfBirth",
            Field::DateOfIssue => "dateOfIssue",
            Field::Authority => "authority",
            Field::MrzData => "mrzData",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::PassportNumber => "Passport Number",
            Field::FullName => "Full Name",
            Field::DateOfBirth => "Date of Birth",
            Field::Nationality => "Nationality",
            Field::Gender => "Gender",
            Field::ExpiryDate => "Expiry Date",
            Field::PlaceOfBirth => "Place of Birth",
            Field::DateOfIssue => "Date of Issue",
            Field::Authority => "Authority",
            Field::MrzData => "MRZ Data",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    /// Whether values of this field are rendered through date formatting.
    pub fn is_date(self) -> bool {
        matches!(self, Field::DateOfBirth | Field::ExpiryDate | Field::DateOfIssue)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Field {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("Unknown passport field: '{s}'"))
    }
}

/// Presentation state of a single field after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Found,
    /// Absent, but not part of the required set.
    Optional,
    /// Absent and required.
    Missing,
}

impl fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldStatus::Found => write!(f, "found"),
            FieldStatus::Optional => write!(f, "optional"),
            FieldStatus::Missing => write!(f, "missing"),
        }
    }
}
