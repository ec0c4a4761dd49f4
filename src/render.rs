//! Plain-text rendering of records, forms and error maps.

use crate::form::{FormMode, FormState};
use crate::record::Employee;
use crate::validate::{ErrorMap, Field};

const HEADERS: [&str; 9] = [
    "Id",
    "First Name",
    "Last Name",
    "Email",
    "Age",
    "Phone",
    "Gender",
    "Hobbies",
    "Address",
];

fn row(record: &Employee) -> [String; 9] {
    let f = &record.fields;
    [
        record.id.to_string(),
        f.first_name.clone(),
        f.last_name.clone(),
        f.email.clone(),
        f.age.to_string(),
        f.phone.clone(),
        f.gender.as_str().to_string(),
        record.hobbies_display(),
        f.address.clone(),
    ]
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Render the employee table
pub fn format_table(records: &[Employee]) -> String {
    if records.is_empty() {
        return "No data available.\n".to_string();
    }

    let rows: Vec<[String; 9]> = records.iter().map(row).collect();
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
    for r in &rows {
        for (w, cell) in widths.iter_mut().zip(r.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for r in &rows {
        push_line(&mut out, r, &widths);
    }
    out
}

/// Render one record as labelled lines
pub fn format_record(record: &Employee) -> String {
    let mut out = format!("Employee #{}\n", record.id);
    for (label, value) in HEADERS.iter().zip(row(record)).skip(1) {
        out.push_str(&format!("  {:<11} {}\n", format!("{}:", label), value));
    }
    out
}

/// Render validation errors, one per line, in form order
pub fn format_errors(errors: &ErrorMap) -> String {
    let mut out = String::new();
    for (field, message) in errors.iter() {
        out.push_str(&format!("  {}: {}\n", field.label(), message));
    }
    out
}

/// Render the current form values and any errors beside them
pub fn format_form(state: &FormState) -> String {
    let mut out = match state.mode {
        FormMode::Add => "Employee Form (add)\n".to_string(),
        FormMode::Edit(id) => format!("Employee Form (editing #{})\n", id),
    };
    for field in Field::ALL {
        out.push_str(&format!(
            "  {:<13} {}\n",
            format!("{}:", field.label()),
            state.input.text(field)
        ));
        if let Some(message) = state.errors.get(field) {
            out.push_str(&format!("  {:<13} ! {}\n", "", message));
        }
    }
    out
}
