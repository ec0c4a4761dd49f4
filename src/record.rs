//! Employee record types.
//!
//! The persisted shape uses camelCase keys (`firstName`, `lastName`, ...) with the
//! id as a plain number and hobbies as an array of strings.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Store-assigned record identifier
pub type RecordId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            "other" | "o" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

/// Hobby checkbox values; `Ord` follows the form's display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Hobby {
    Reading,
    Traveling,
    Gaming,
    Cooking,
}

impl Hobby {
    pub const ALL: [Hobby; 4] = [Hobby::Reading, Hobby::Traveling, Hobby::Gaming, Hobby::Cooking];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reading" => Some(Self::Reading),
            "traveling" | "travelling" => Some(Self::Traveling),
            "gaming" => Some(Self::Gaming),
            "cooking" => Some(Self::Cooking),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reading => "Reading",
            Self::Traveling => "Traveling",
            Self::Gaming => "Gaming",
            Self::Cooking => "Cooking",
        }
    }
}

/// Parse a comma separated hobby list.
/// Returns the recognized hobbies and the entries that matched nothing.
pub fn parse_hobbies(list: &str) -> (BTreeSet<Hobby>, Vec<String>) {
    let mut hobbies = BTreeSet::new();
    let mut unknown = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match Hobby::from_str(item) {
            Some(h) => {
                hobbies.insert(h);
            }
            None => unknown.push(item.to_string()),
        }
    }
    (hobbies, unknown)
}

/// Every employee attribute except the id
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: u32,
    pub gender: Gender,
    // Older rows may predate these fields or hold null
    #[serde(default, deserialize_with = "null_as_default")]
    pub hobbies: BTreeSet<Hobby>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A stored employee record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Employee {
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: EmployeeFields,
}

impl Employee {
    pub fn new(id: RecordId, fields: EmployeeFields) -> Self {
        Self { id, fields }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.fields.first_name, self.fields.last_name)
    }

    /// Hobbies joined for display, e.g. "Reading, Gaming"
    pub fn hobbies_display(&self) -> String {
        self.fields
            .hobbies
            .iter()
            .map(|h| h.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
pub(crate) fn sample_fields() -> EmployeeFields {
    EmployeeFields {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@x.com".to_string(),
        age: 30,
        gender: Gender::Female,
        hobbies: [Hobby::Reading].into_iter().collect(),
        phone: "1234567890".to_string(),
        address: "123 Main St".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gender_from_str() {
        assert_eq!(Gender::from_str("female"), Some(Gender::Female));
        assert_eq!(Gender::from_str(" Male "), Some(Gender::Male));
        assert_eq!(Gender::from_str("o"), Some(Gender::Other));
        assert_eq!(Gender::from_str(""), None);
        assert_eq!(Gender::from_str("unknown"), None);
    }

    #[test]
    fn test_parse_hobbies() {
        let (hobbies, unknown) = parse_hobbies("gaming, Reading,,knitting");
        assert_eq!(
            hobbies.into_iter().collect::<Vec<_>>(),
            vec![Hobby::Reading, Hobby::Gaming]
        );
        assert_eq!(unknown, vec!["knitting".to_string()]);
    }

    #[test]
    fn test_serialized_shape() {
        let employee = Employee::new(7, sample_fields());
        let value = serde_json::to_value(&employee).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "jane@x.com",
                "age": 30,
                "gender": "Female",
                "hobbies": ["Reading"],
                "phone": "1234567890",
                "address": "123 Main St"
            })
        );
    }

    #[test]
    fn test_deserialize_missing_optional_fields() {
        let raw = r#"{"id":2,"firstName":"Sam","lastName":"Lee","email":"s@l.io","age":41,"gender":"Other"}"#;
        let employee: Employee = serde_json::from_str(raw).unwrap();
        assert_eq!(employee.id, 2);
        assert!(employee.fields.hobbies.is_empty());
        assert_eq!(employee.fields.phone, "");
        assert_eq!(employee.fields.address, "");
    }

    #[test]
    fn test_deserialize_null_optional_fields() {
        let raw = r#"[
            {"id":1,"firstName":"Sam","lastName":"Lee","email":"s@l.io","age":41,"gender":"Other",
             "hobbies":null,"phone":null,"address":null},
            {"id":2,"firstName":"Ana","lastName":"Ruiz","email":"a@r.io","age":29,"gender":"Female",
             "hobbies":["Gaming"],"phone":"1234567890","address":"1 Elm St"}
        ]"#;
        let records: Vec<Employee> = serde_json::from_str(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].fields.hobbies.is_empty());
        assert_eq!(records[0].fields.phone, "");
        assert_eq!(records[0].fields.address, "");
        assert_eq!(records[1].hobbies_display(), "Gaming");
    }

    #[test]
    fn test_hobbies_display() {
        let mut fields = sample_fields();
        fields.hobbies.insert(Hobby::Cooking);
        fields.hobbies.insert(Hobby::Traveling);
        let employee = Employee::new(1, fields);
        assert_eq!(employee.hobbies_display(), "Reading, Traveling, Cooking");
        assert_eq!(employee.full_name(), "Jane Doe");
    }
}
