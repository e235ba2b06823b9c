use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Raw field map as held by the document store.
pub type DocumentFields = Map<String, Value>;

/// Opaque identifier assigned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document exactly as the store returns it, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: RecordId,
    pub fields: DocumentFields,
}

/// Every editable attribute of an alumni record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Name,
    Program,
    Year,
    Country,
    Nationality,
    Email,
    Role,
    CurrentPosition,
    Institution,
    IsNitagMember,
    Region,
    Language,
    Comments,
}

impl RecordField {
    /// Export column order.
    pub const ALL: [RecordField; 13] = [
        Self::Name,
        Self::Program,
        Self::Year,
        Self::Country,
        Self::Nationality,
        Self::Email,
        Self::Role,
        Self::CurrentPosition,
        Self::Institution,
        Self::IsNitagMember,
        Self::Region,
        Self::Language,
        Self::Comments,
    ];

    /// Key used by the document store.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Program => "Program",
            Self::Year => "Year",
            Self::Country => "Country",
            Self::Nationality => "Nationality",
            Self::Email => "Email",
            Self::Role => "Role",
            Self::CurrentPosition => "CurrentPosition",
            Self::Institution => "Institution",
            Self::IsNitagMember => "IsNITAGMember",
            Self::Region => "Region",
            Self::Language => "Language",
            Self::Comments => "Comments",
        }
    }

    /// Human-readable column header used by spreadsheet exports.
    pub const fn header(self) -> &'static str {
        match self {
            Self::CurrentPosition => "Current Position",
            Self::IsNitagMember => "NITAG Member",
            other => other.key(),
        }
    }
}

/// Sparse set of record attributes. Absent means "no meaningful content"; blank strings
/// never survive normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordFields {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub current_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub institution: Option<String>,
    #[serde(
        rename = "IsNITAGMember",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "normalized"
    )]
    pub is_nitag_member: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "normalized")]
    pub comments: Option<String>,
}

impl RecordFields {
    /// Normalizes a raw store map. Unknown keys are ignored.
    pub fn from_document(fields: &DocumentFields) -> Self {
        let mut normalized = Self::default();
        for field in RecordField::ALL {
            *normalized.slot_mut(field) = fields.get(field.key()).and_then(normalize_value);
        }
        normalized
    }

    pub fn get(&self, field: RecordField) -> Option<&str> {
        let slot = match field {
            RecordField::Name => &self.name,
            RecordField::Program => &self.program,
            RecordField::Year => &self.year,
            RecordField::Country => &self.country,
            RecordField::Nationality => &self.nationality,
            RecordField::Email => &self.email,
            RecordField::Role => &self.role,
            RecordField::CurrentPosition => &self.current_position,
            RecordField::Institution => &self.institution,
            RecordField::IsNitagMember => &self.is_nitag_member,
            RecordField::Region => &self.region,
            RecordField::Language => &self.language,
            RecordField::Comments => &self.comments,
        };
        slot.as_deref()
    }

    fn slot_mut(&mut self, field: RecordField) -> &mut Option<String> {
        match field {
            RecordField::Name => &mut self.name,
            RecordField::Program => &mut self.program,
            RecordField::Year => &mut self.year,
            RecordField::Country => &mut self.country,
            RecordField::Nationality => &mut self.nationality,
            RecordField::Email => &mut self.email,
            RecordField::Role => &mut self.role,
            RecordField::CurrentPosition => &mut self.current_position,
            RecordField::Institution => &mut self.institution,
            RecordField::IsNitagMember => &mut self.is_nitag_member,
            RecordField::Region => &mut self.region,
            RecordField::Language => &mut self.language,
            RecordField::Comments => &mut self.comments,
        }
    }

    pub fn is_empty(&self) -> bool {
        RecordField::ALL
            .into_iter()
            .all(|field| self.get(field).is_none())
    }

    /// Store representation carrying only the fields that are present.
    pub fn to_document(&self) -> DocumentFields {
        RecordField::ALL
            .into_iter()
            .filter_map(|field| {
                self.get(field)
                    .map(|value| (field.key().to_string(), Value::String(value.to_string())))
            })
            .collect()
    }
}

/// Canonical alumni record used by every downstream computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlumniRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: RecordFields,
}

impl AlumniRecord {
    pub fn from_document(document: &StoredDocument) -> Self {
        Self {
            id: document.id.clone(),
            fields: RecordFields::from_document(&document.fields),
        }
    }

    pub fn get(&self, field: RecordField) -> Option<&str> {
        self.fields.get(field)
    }
}

/// Fields submitted from the add/edit form. Blank inputs are dropped while deserializing.
pub type RecordDraft = RecordFields;

/// Coerces a store value into the canonical string form.
pub fn normalize_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => match (number.as_i64(), number.as_u64(), number.as_f64()) {
            (Some(int), _, _) => int.to_string(),
            (None, Some(uint), _) => uint.to_string(),
            (None, None, Some(float)) if float.is_finite() && float.fract() == 0.0 => {
                format!("{float:.0}")
            }
            _ => number.to_string(),
        },
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn normalized<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(normalize_value(&value))
}
