//! Form validation.
//!
//! `validate` checks every field independently and reports all failures at once,
//! so the caller can show each message next to its field.

use crate::record::{EmployeeFields, Gender, Hobby};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+$").expect("valid regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
// ASCII only; `\d` in this regex engine would also accept other Unicode digits
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("valid regex"));

const MIN_ADDRESS_CHARS: usize = 5;

/// Form fields, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Age,
    Gender,
    Hobbies,
    Phone,
    Address,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::FirstName,
        Field::LastName,
        Field::Email,
        Field::Age,
        Field::Gender,
        Field::Hobbies,
        Field::Phone,
        Field::Address,
    ];

    /// Accepts the persisted camelCase name as well as snake_case and lowercase forms
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['_', '-'], "").as_str() {
            "firstname" | "first" => Some(Self::FirstName),
            "lastname" | "last" => Some(Self::LastName),
            "email" => Some(Self::Email),
            "age" => Some(Self::Age),
            "gender" => Some(Self::Gender),
            "hobbies" | "hobby" => Some(Self::Hobbies),
            "phone" => Some(Self::Phone),
            "address" => Some(Self::Address),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Hobbies => "hobbies",
            Self::Phone => "phone",
            Self::Address => "address",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::Email => "Email",
            Self::Age => "Age",
            Self::Gender => "Gender",
            Self::Hobbies => "Hobbies",
            Self::Phone => "Phone Number",
            Self::Address => "Address",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw form values as typed by the user, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: String,
    pub gender: Option<Gender>,
    pub hobbies: BTreeSet<Hobby>,
    pub phone: String,
    pub address: String,
}

impl FormInput {
    pub fn from_fields(fields: &EmployeeFields) -> Self {
        Self {
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            email: fields.email.clone(),
            age: fields.age.to_string(),
            gender: Some(fields.gender),
            hobbies: fields.hobbies.clone(),
            phone: fields.phone.clone(),
            address: fields.address.clone(),
        }
    }

    /// Text value of a field; gender and hobbies are rendered as text
    pub fn text(&self, field: Field) -> String {
        match field {
            Field::FirstName => self.first_name.clone(),
            Field::LastName => self.last_name.clone(),
            Field::Email => self.email.clone(),
            Field::Age => self.age.clone(),
            Field::Gender => self.gender.map(|g| g.as_str().to_string()).unwrap_or_default(),
            Field::Hobbies => self
                .hobbies
                .iter()
                .map(|h| h.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Field::Phone => self.phone.clone(),
            Field::Address => self.address.clone(),
        }
    }
}

/// Field-to-message mapping; empty means the input is valid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMap(BTreeMap<Field, String>);

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    #[cfg(test)]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn fields(&self) -> Vec<Field> {
        self.0.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

fn check_name(value: &str, label: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some(format!("{} is required.", label))
    } else if !NAME_RE.is_match(value) {
        Some(format!("{} should only contain letters.", label))
    } else {
        None
    }
}

fn parse_age(raw: &str) -> Option<u32> {
    raw.trim().parse::<i64>().ok().filter(|a| *a > 0).and_then(|a| u32::try_from(a).ok())
}

/// Validate a candidate record
pub fn validate(input: &FormInput) -> ErrorMap {
    let mut errors = ErrorMap::new();

    if let Some(msg) = check_name(&input.first_name, "First name") {
        errors.insert(Field::FirstName, msg);
    }
    if let Some(msg) = check_name(&input.last_name, "Last name") {
        errors.insert(Field::LastName, msg);
    }

    if input.email.trim().is_empty() {
        errors.insert(Field::Email, "Email is required.");
    } else if !EMAIL_RE.is_match(&input.email) {
        errors.insert(Field::Email, "Enter a valid email address.");
    }

    if parse_age(&input.age).is_none() {
        errors.insert(Field::Age, "Valid age is required.");
    }

    if input.gender.is_none() {
        errors.insert(Field::Gender, "Please select a gender.");
    }

    if input.hobbies.is_empty() {
        errors.insert(Field::Hobbies, "Select at least one hobby.");
    }

    if input.phone.trim().is_empty() {
        errors.insert(Field::Phone, "Phone number is required.");
    } else if !PHONE_RE.is_match(&input.phone) {
        errors.insert(Field::Phone, "Enter a valid 10-digit phone number.");
    }

    // Empty check is on trimmed text, the length check on the raw text
    if input.address.trim().is_empty() {
        errors.insert(Field::Address, "Address is required.");
    } else if input.address.chars().count() < MIN_ADDRESS_CHARS {
        errors.insert(Field::Address, "Address should be at least 5 characters long.");
    }

    errors
}

/// Validate and convert to typed record fields
pub fn validate_into(input: &FormInput) -> Result<EmployeeFields, ErrorMap> {
    let errors = validate(input);
    if !errors.is_empty() {
        return Err(errors);
    }

    match (parse_age(&input.age), input.gender) {
        (Some(age), Some(gender)) => Ok(EmployeeFields {
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            age,
            gender,
            hobbies: input.hobbies.clone(),
            phone: input.phone.clone(),
            address: input.address.clone(),
        }),
        // validate() already rejected both of these
        _ => Err(errors),
    }
}
