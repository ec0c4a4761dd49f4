//! Employee form state and its transitions.
//!
//! The form is a plain value; `reduce` produces the next state from an action.
//! `submit` is the one transition that touches the store.

use crate::record::{Employee, Gender, Hobby, RecordId};
use crate::store::RecordStore;
use crate::validate::{validate_into, ErrorMap, Field, FormInput};

/// Whether a submission creates a record or updates an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Add,
    Edit(RecordId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub mode: FormMode,
    pub input: FormInput,
    pub errors: ErrorMap,
}

#[derive(Debug, Clone)]
pub enum FormAction {
    /// Set a text field (names, email, age, phone, address)
    SetText(Field, String),
    SelectGender(Option<Gender>),
    ToggleHobby(Hobby, bool),
    /// Load an existing record for editing
    BeginEdit(Employee),
    /// A submission failed validation
    Rejected(ErrorMap),
    Clear,
}

pub fn reduce(state: FormState, action: FormAction) -> FormState {
    match action {
        FormAction::SetText(field, value) => {
            let mut input = state.input;
            match field {
                Field::FirstName => input.first_name = value,
                Field::LastName => input.last_name = value,
                Field::Email => input.email = value,
                Field::Age => input.age = value,
                Field::Phone => input.phone = value,
                Field::Address => input.address = value,
                // Not text inputs
                Field::Gender | Field::Hobbies => {}
            }
            FormState { input, ..state }
        }
        FormAction::SelectGender(gender) => {
            let mut input = state.input;
            input.gender = gender;
            FormState { input, ..state }
        }
        FormAction::ToggleHobby(hobby, checked) => {
            let mut input = state.input;
            if checked {
                input.hobbies.insert(hobby);
            } else {
                input.hobbies.remove(&hobby);
            }
            FormState { input, ..state }
        }
        FormAction::BeginEdit(record) => FormState {
            mode: FormMode::Edit(record.id),
            input: FormInput::from_fields(&record.fields),
            errors: ErrorMap::new(),
        },
        FormAction::Rejected(errors) => FormState { errors, ..state },
        FormAction::Clear => FormState::default(),
    }
}

/// What a submission did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Added(Employee),
    Updated(Employee),
    /// The record being edited no longer exists; nothing changed
    Missing(RecordId),
    /// The store has no ids left to assign; the form is kept
    IdsExhausted,
    Invalid(ErrorMap),
}

/// Validate the form and apply it to the store.
///
/// On success (and on a missing edit target) the returned form is cleared. On
/// validation failure the values are kept and the errors recorded.
pub fn submit(state: FormState, store: &mut RecordStore) -> (FormState, SubmitOutcome) {
    let fields = match validate_into(&state.input) {
        Ok(fields) => fields,
        Err(errors) => {
            let next = reduce(state, FormAction::Rejected(errors.clone()));
            return (next, SubmitOutcome::Invalid(errors));
        }
    };

    let outcome = match state.mode {
        FormMode::Add => match store.append(fields) {
            Some(record) => SubmitOutcome::Added(record),
            None => return (state, SubmitOutcome::IdsExhausted),
        },
        FormMode::Edit(id) => {
            if store.replace_by_id(id, fields) {
                match store.find_by_id(id) {
                    Some(record) => SubmitOutcome::Updated(record),
                    None => SubmitOutcome::Missing(id),
                }
            } else {
                SubmitOutcome::Missing(id)
            }
        }
    };

    (reduce(state, FormAction::Clear), outcome)
}
