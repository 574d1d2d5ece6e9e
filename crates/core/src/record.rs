use serde::{Deserialize, Serialize};

use crate::field::{Field, FieldStatus};

/// Identity fields extracted from one OCR pass. Absent means "not matched".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassportData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passport_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrz_data: Option<String>,
}

impl PassportData {
    pub fn get(&self, field: Field) -> Option<&str> {
        let slot = match field {
            Field::PassportNumber => &self.passport_number,
            Field::FullName => &self.full_name,
            Field::DateOfBirth => &self.date_of_birth,
            Field::Nationality => &self.nationality,
            Field::Gender => &self.gender,
            Field::ExpiryDate => &self.expiry_date,
            Field::PlaceOfBirth => &self.place_of_birth,
            Field::DateOfIssue => &self.date_of_issue,
            Field::Authority => &self.authority,
            Field::MrzData => &self.mrz_data,
        };
        slot.as_deref()
    }

    /// Present fields with non-blank values, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL
            .into_iter()
            .filter_map(|f| self.get(f).filter(|v| !v.trim().is_empty()).map(|v| (f, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    pub fn status(&self, field: Field) -> FieldStatus {
        if has_value(self.get(field)) {
            FieldStatus::Found
        } else if field.is_required() {
            FieldStatus::Missing
        } else {
            FieldStatus::Optional
        }
    }
}

impl FromIterator<(Field, String)> for PassportData {
    /// Collect field values into a record. The first value seen for a field
    /// is kept; later ones are ignored.
    fn from_iter<I: IntoIterator<Item = (Field, String)>>(iter: I) -> Self {
        let mut data = PassportData::default();
        for (field, value) in iter {
            let slot = match field {
                Field::PassportNumber => &mut data.passport_number,
                Field::FullName => &mut data.full_name,
                Field::DateOfBirth => &mut data.date_of_birth,
                Field::Nationality => &mut data.nationality,
                Field::Gender => &mut data.gender,
                Field::ExpiryDate => &mut data.expiry_date,
                Field::PlaceOfBirth => &mut data.place_of_birth,
                Field::DateOfIssue => &mut data.date_of_issue,
                Field::Authority => &mut data.authority,
                Field::MrzData => &mut data.mrz_data,
            };
            slot.get_or_insert(value);
        }
        data
    }
}

/// Outcome of checking a record against [`Field::REQUIRED`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub missing_fields: Vec<Field>,
}

/// Check required-field presence. Blank strings count as missing.
pub fn validate(data: &PassportData) -> ValidationResult {
    let missing_fields: Vec<Field> = Field::REQUIRED
        .into_iter()
        .filter(|f| !has_value(data.get(*f)))
        .collect();
    ValidationResult {
        is_valid: missing_fields.is_empty(),
        missing_fields,
    }
}

fn has_value(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
