use crate::form::{reduce, submit, FormAction, FormMode, FormState, SubmitOutcome};
use crate::record::{parse_hobbies, Gender, Hobby, RecordId};
use crate::render;
use crate::store::RecordStore;
use crate::validate::Field;
use anyhow::{anyhow, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

pub struct Context {
    pub store: RefCell<RecordStore>,
    pub form: RefCell<FormState>,
    pub confirm_delete: bool,
    pub history_path: Option<PathBuf>,
}

impl Context {
    pub fn new(store: RecordStore, confirm_delete: bool) -> Self {
        Self {
            store: RefCell::new(store),
            form: RefCell::new(FormState::default()),
            confirm_delete,
            history_path: None,
        }
    }
}

/// Source of answers for form fields and confirmations.
/// `Ok(None)` means the user cancelled (Ctrl-C / Ctrl-D) or no input is available.
pub trait Prompt {
    fn ask(&mut self, label: &str, initial: &str) -> Result<Option<String>>;
}

impl Prompt for DefaultEditor {
    fn ask(&mut self, label: &str, initial: &str) -> Result<Option<String>> {
        match self.readline_with_initial(label, (initial, "")) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Used in one-shot mode: every question is answered with "cancel"
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn ask(&mut self, _label: &str, _initial: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

pub fn run_once(ctx: &Context, command: &str) -> Result<()> {
    let mut out = std::io::stdout();
    let line = command.trim();
    let line = if line.starts_with('/') {
        line.to_string()
    } else {
        format!("/{}", line)
    };
    handle_command(ctx, &line, &mut NoPrompt, &mut out)?;

    let errors = ctx.form.borrow().errors.clone();
    if !errors.is_empty() {
        return Err(anyhow!(
            "record not saved: {} field(s) failed validation",
            errors.len()
        ));
    }
    Ok(())
}

pub fn run_repl(ctx: Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    if let Some(path) = &ctx.history_path {
        // No history yet on first run
        let _ = rl.load_history(path);
    }
    let mut out = std::io::stdout();

    println!(
        "roster - {} employee record(s). Type /help for commands, /exit to quit",
        ctx.store.borrow().len()
    );

    loop {
        match rl.readline("roster> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                let line = if line.starts_with('/') {
                    line.to_string()
                } else {
                    format!("/{}", line)
                };
                match handle_command(&ctx, &line, &mut rl, &mut out) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    if let Some(path) = &ctx.history_path {
        if let Err(e) = rl.save_history(path) {
            debug!(error = %e, "failed to save history");
        }
    }
    Ok(())
}

/// Run one slash command. Returns `true` when the session should end.
pub fn handle_command(
    ctx: &Context,
    cmd: &str,
    prompt: &mut dyn Prompt,
    out: &mut dyn Write,
) -> Result<bool> {
    let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
    let rest = parts.get(1).copied().unwrap_or("").trim();
    debug!(command = parts[0], "handling command");

    match parts[0] {
        "/exit" | "/quit" => return Ok(true),
        "/help" => {
            writeln!(out, "Commands:")?;
            writeln!(out, "  /list                        - show all employees")?;
            writeln!(out, "  /show <id>                   - show one employee")?;
            writeln!(out, "  /add [field=value ...]       - add an employee")?;
            writeln!(out, "  /edit <id> [field=value ...] - edit an employee")?;
            writeln!(out, "  /delete <id>                 - delete an employee")?;
            writeln!(out, "  /form                        - show the form in progress")?;
            writeln!(out, "  /submit                      - continue the form in progress")?;
            writeln!(out, "  /clear                       - discard the form in progress")?;
            writeln!(out, "  /exit                        - quit")?;
            writeln!(out, "Fields: firstName lastName email age gender hobbies phone address")?;
            writeln!(out, "  gender: Male, Female or Other")?;
            writeln!(out, "  hobbies: comma list of Reading, Traveling, Gaming, Cooking")?;
            writeln!(out, "Ctrl-C inside a form keeps it for /submit.")?;
        }
        "/list" => {
            write!(out, "{}", render::format_table(ctx.store.borrow().records()))?;
        }
        "/show" => {
            let Some(id) = parse_id(rest, out)? else {
                return Ok(false);
            };
            match ctx.store.borrow().find_by_id(id) {
                Some(record) => write!(out, "{}", render::format_record(&record))?,
                None => writeln!(out, "No record with id {}", id)?,
            }
        }
        "/add" => {
            let Some(assignments) = parse_assignments(rest, out)? else {
                return Ok(false);
            };
            let state = FormState::default();
            let pending = if assignments.is_empty() {
                Field::ALL.to_vec()
            } else {
                Vec::new()
            };
            let state = apply_assignments(state, &assignments, out)?;
            run_form(ctx, state, pending, prompt, out)?;
        }
        "/edit" => {
            let (id_part, assign_part) = rest.split_once(' ').unwrap_or((rest, ""));
            let Some(id) = parse_id(id_part, out)? else {
                return Ok(false);
            };
            let Some(record) = ctx.store.borrow().find_by_id(id) else {
                writeln!(out, "No record with id {}", id)?;
                return Ok(false);
            };
            let Some(assignments) = parse_assignments(assign_part, out)? else {
                return Ok(false);
            };
            let state = reduce(FormState::default(), FormAction::BeginEdit(record));
            let pending = if assignments.is_empty() {
                Field::ALL.to_vec()
            } else {
                Vec::new()
            };
            let state = apply_assignments(state, &assignments, out)?;
            run_form(ctx, state, pending, prompt, out)?;
        }
        "/delete" => {
            let Some(id) = parse_id(rest, out)? else {
                return Ok(false);
            };
            handle_delete(ctx, id, prompt, out)?;
        }
        "/form" => {
            write!(out, "{}", render::format_form(&ctx.form.borrow()))?;
        }
        "/submit" => {
            let state = ctx.form.borrow().clone();
            let pending = if state.errors.is_empty() {
                Field::ALL.to_vec()
            } else {
                state.errors.fields()
            };
            run_form(ctx, state, pending, prompt, out)?;
        }
        "/clear" => {
            let state = ctx.form.borrow().clone();
            *ctx.form.borrow_mut() = reduce(state, FormAction::Clear);
            writeln!(out, "Form cleared")?;
        }
        _ => writeln!(out, "Unknown command: {}. Type /help for commands.", parts[0])?,
    }
    Ok(false)
}

fn parse_id(arg: &str, out: &mut dyn Write) -> Result<Option<RecordId>> {
    match arg.trim().parse::<RecordId>() {
        Ok(id) => Ok(Some(id)),
        Err(_) => {
            writeln!(out, "Expected a record id, got '{}'", arg.trim())?;
            Ok(None)
        }
    }
}

/// Split `field=value` assignments using shell quoting rules
fn parse_assignments(args: &str, out: &mut dyn Write) -> Result<Option<Vec<(Field, String)>>> {
    let words = match shell_words::split(args) {
        Ok(words) => words,
        Err(e) => {
            writeln!(out, "Could not parse arguments: {}", e)?;
            return Ok(None);
        }
    };

    let mut assignments = Vec::new();
    for word in words {
        let parsed = word
            .split_once('=')
            .and_then(|(name, value)| Field::from_str(name).map(|f| (f, value.to_string())));
        match parsed {
            Some(pair) => assignments.push(pair),
            None => {
                writeln!(out, "Invalid assignment '{}'. Use field=value.", word)?;
                return Ok(None);
            }
        }
    }
    Ok(Some(assignments))
}

/// Translate a typed value into form actions; the second element lists unknown hobbies
fn actions_for(field: Field, value: &str) -> (Vec<FormAction>, Vec<String>) {
    match field {
        Field::Gender => (vec![FormAction::SelectGender(Gender::from_str(value))], Vec::new()),
        Field::Hobbies => {
            let (chosen, unknown) = parse_hobbies(value);
            let actions = Hobby::ALL
                .iter()
                .map(|h| FormAction::ToggleHobby(*h, chosen.contains(h)))
                .collect();
            (actions, unknown)
        }
        _ => (vec![FormAction::SetText(field, value.to_string())], Vec::new()),
    }
}

fn apply_value(
    state: FormState,
    field: Field,
    value: &str,
    out: &mut dyn Write,
) -> Result<FormState> {
    let (actions, unknown) = actions_for(field, value);
    for name in unknown {
        writeln!(out, "Ignoring unknown hobby '{}'", name)?;
    }
    Ok(actions.into_iter().fold(state, reduce))
}

fn apply_assignments(
    state: FormState,
    assignments: &[(Field, String)],
    out: &mut dyn Write,
) -> Result<FormState> {
    let mut state = state;
    for (field, value) in assignments {
        state = apply_value(state, *field, value, out)?;
    }
    Ok(state)
}

fn field_prompt(field: Field) -> String {
    match field {
        Field::Gender => "Gender (Male/Female/Other): ".to_string(),
        Field::Hobbies => "Hobbies (Reading, Traveling, Gaming, Cooking): ".to_string(),
        _ => format!("{}: ", field.label()),
    }
}

/// Prompt for `pending` fields, then submit; rejected fields are asked again.
/// A cancelled prompt keeps the form for `/submit`.
fn run_form(
    ctx: &Context,
    mut state: FormState,
    mut pending: Vec<Field>,
    prompt: &mut dyn Prompt,
    out: &mut dyn Write,
) -> Result<()> {
    loop {
        for field in &pending {
            let initial = state.input.text(*field);
            match prompt.ask(&field_prompt(*field), &initial)? {
                Some(value) => state = apply_value(state, *field, &value, out)?,
                None => {
                    writeln!(out)?;
                    writeln!(out, "Form kept. Use /submit to continue or /clear to discard.")?;
                    *ctx.form.borrow_mut() = state;
                    return Ok(());
                }
            }
        }

        let (next, outcome) = submit(state, &mut ctx.store.borrow_mut());
        match outcome {
            SubmitOutcome::Added(record) => {
                writeln!(out, "Added employee #{} ({})", record.id, record.full_name())?
            }
            SubmitOutcome::Updated(record) => {
                writeln!(out, "Updated employee #{} ({})", record.id, record.full_name())?
            }
            SubmitOutcome::Missing(id) => writeln!(out, "No record with id {}", id)?,
            SubmitOutcome::IdsExhausted => {
                writeln!(out, "No record ids left; the employee was not added.")?;
                writeln!(out, "Form kept. Use /clear to discard.")?;
            }
            SubmitOutcome::Invalid(errors) => {
                writeln!(out, "Please fix the following:")?;
                write!(out, "{}", render::format_errors(&errors))?;
                pending = errors.fields();
                state = next;
                continue;
            }
        }
        *ctx.form.borrow_mut() = next;
        return Ok(());
    }
}

fn handle_delete(
    ctx: &Context,
    id: RecordId,
    prompt: &mut dyn Prompt,
    out: &mut dyn Write,
) -> Result<()> {
    if ctx.store.borrow().find_by_id(id).is_none() {
        writeln!(out, "No record with id {}", id)?;
        return Ok(());
    }

    if ctx.confirm_delete {
        let answer = prompt.ask("Are you sure you want to delete this record? [y/N] ", "")?;
        let confirmed = answer
            .map(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false);
        if !confirmed {
            writeln!(out, "Delete cancelled")?;
            return Ok(());
        }
    }

    if ctx.store.borrow_mut().delete_by_id(id) {
        writeln!(out, "Deleted employee #{}", id)?;
        // A form editing the deleted record can no longer be submitted
        let editing_deleted = ctx.form.borrow().mode == FormMode::Edit(id);
        if editing_deleted {
            *ctx.form.borrow_mut() = FormState::default();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_fields;
    use crate::storage::MemoryStorage;
    use crate::store::DEFAULT_KEY;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<Option<String>>);

    impl Scripted {
        fn new(answers: &[&str]) -> Self {
            Self(answers.iter().map(|a| Some(a.to_string())).collect())
        }
    }

    impl Prompt for Scripted {
        fn ask(&mut self, _label: &str, _initial: &str) -> Result<Option<String>> {
            Ok(self.0.pop_front().flatten())
        }
    }

    fn context(confirm_delete: bool) -> Context {
        let store = RecordStore::open(Box::new(MemoryStorage::new()), DEFAULT_KEY);
        Context::new(store, confirm_delete)
    }

    fn run(ctx: &Context, cmd: &str, prompt: &mut dyn Prompt) -> String {
        let mut out = Vec::new();
        handle_command(ctx, cmd, prompt, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    const JANE: &str = r#"/add firstName=Jane lastName=Doe email=jane@x.com age=30 gender=female hobbies=Reading,Gaming phone=1234567890 address="123 Main St""#;

    #[test]
    fn test_add_inline() {
        let ctx = context(true);
        let output = run(&ctx, JANE, &mut NoPrompt);
        assert!(output.contains("Added employee #1 (Jane Doe)"), "{}", output);

        let store = ctx.store.borrow();
        let record = store.find_by_id(1).unwrap();
        assert_eq!(record.fields.address, "123 Main St");
        assert_eq!(record.hobbies_display(), "Reading, Gaming");
        assert_eq!(ctx.form.borrow().mode, FormMode::Add);
    }

    #[test]
    fn test_add_interactive_reprompts_failing_fields() {
        let ctx = context(true);
        let mut prompt = Scripted::new(&[
            "Jane",
            "Doe",
            "jane@x.com",
            "0",
            "Female",
            "Reading",
            "12345",
            "123 Main St",
            // Second round: only age and phone are asked again
            "31",
            "1234567890",
        ]);
        let output = run(&ctx, "/add", &mut prompt);
        assert!(output.contains("Valid age is required."));
        assert!(output.contains("Enter a valid 10-digit phone number."));
        assert!(output.contains("Added employee #1"));
        assert!(prompt.0.is_empty());
        assert_eq!(ctx.store.borrow().find_by_id(1).unwrap().fields.age, 31);
    }

    #[test]
    fn test_cancelled_form_is_kept_for_submit() {
        let ctx = context(true);
        let mut prompt = Scripted::new(&["Jane", "Doe"]);
        let output = run(&ctx, "/add", &mut prompt);
        assert!(output.contains("Form kept"));
        assert_eq!(ctx.form.borrow().input.last_name, "Doe");
        assert!(ctx.store.borrow().is_empty());

        let mut prompt = Scripted::new(&[
            "Jane",
            "Doe",
            "jane@x.com",
            "30",
            "Other",
            "Cooking",
            "1234567890",
            "123 Main St",
        ]);
        let output = run(&ctx, "/submit", &mut prompt);
        assert!(output.contains("Added employee #1"), "{}", output);

        let output = run(&ctx, "/clear", &mut NoPrompt);
        assert!(output.contains("Form cleared"));
    }

    #[test]
    fn test_inline_add_with_errors_keeps_form() {
        let ctx = context(true);
        let output = run(&ctx, "/add firstName=J4ne hobbies=Knitting", &mut NoPrompt);
        assert!(output.contains("Ignoring unknown hobby 'Knitting'"));
        assert!(output.contains("First name should only contain letters."));
        assert!(output.contains("Select at least one hobby."));

        let form = ctx.form.borrow();
        assert_eq!(form.input.first_name, "J4ne");
        assert!(form.errors.contains(Field::Email));
    }

    #[test]
    fn test_invalid_assignment() {
        let ctx = context(true);
        let output = run(&ctx, "/add salary=100", &mut NoPrompt);
        assert!(output.contains("Invalid assignment 'salary=100'"));
        let output = run(&ctx, "/add address=\"unterminated", &mut NoPrompt);
        assert!(output.contains("Could not parse arguments"));
    }

    #[test]
    fn test_edit_inline() {
        let ctx = context(true);
        run(&ctx, JANE, &mut NoPrompt);
        let output = run(&ctx, "/edit 1 lastName=Roe age=40", &mut NoPrompt);
        assert!(output.contains("Updated employee #1 (Jane Roe)"), "{}", output);

        let record = ctx.store.borrow().find_by_id(1).unwrap();
        assert_eq!(record.fields.age, 40);
        assert_eq!(record.fields.email, "jane@x.com");
    }

    #[test]
    fn test_edit_missing_record() {
        let ctx = context(true);
        let output = run(&ctx, "/edit 9 age=40", &mut NoPrompt);
        assert!(output.contains("No record with id 9"));
        let output = run(&ctx, "/edit abc", &mut NoPrompt);
        assert!(output.contains("Expected a record id"));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let ctx = context(true);
        ctx.store.borrow_mut().append(sample_fields());

        let output = run(&ctx, "/delete 1", &mut Scripted::new(&["n"]));
        assert!(output.contains("Delete cancelled"));
        assert_eq!(ctx.store.borrow().len(), 1);

        let output = run(&ctx, "/delete 1", &mut NoPrompt);
        assert!(output.contains("Delete cancelled"));

        let output = run(&ctx, "/delete 1", &mut Scripted::new(&["y"]));
        assert!(output.contains("Deleted employee #1"));
        assert!(ctx.store.borrow().is_empty());

        let output = run(&ctx, "/delete 1", &mut NoPrompt);
        assert!(output.contains("No record with id 1"));
    }

    #[test]
    fn test_delete_without_confirmation_clears_edit_form() {
        let ctx = context(false);
        ctx.store.borrow_mut().append(sample_fields());
        let record = ctx.store.borrow().find_by_id(1).unwrap();
        *ctx.form.borrow_mut() = reduce(FormState::default(), FormAction::BeginEdit(record));

        let output = run(&ctx, "/delete 1", &mut NoPrompt);
        assert!(output.contains("Deleted employee #1"));
        assert_eq!(*ctx.form.borrow(), FormState::default());
    }

    #[test]
    fn test_list_and_show() {
        let ctx = context(true);
        assert!(run(&ctx, "/list", &mut NoPrompt).contains("No data available."));

        ctx.store.borrow_mut().append(sample_fields());
        assert!(run(&ctx, "/list", &mut NoPrompt).contains("jane@x.com"));
        assert!(run(&ctx, "/show 1", &mut NoPrompt).starts_with("Employee #1"));
        assert!(run(&ctx, "/show 2", &mut NoPrompt).contains("No record with id 2"));
    }

    #[test]
    fn test_exit_and_unknown() {
        let ctx = context(true);
        let mut out = Vec::new();
        assert!(handle_command(&ctx, "/exit", &mut NoPrompt, &mut out).unwrap());
        assert!(run(&ctx, "/bogus", &mut NoPrompt).contains("Unknown command: /bogus"));
    }

    #[test]
    fn test_run_once_reports_rejection() {
        let ctx = context(true);
        assert!(run_once(&ctx, "add firstName=Jane").is_err());
        assert!(ctx.store.borrow().is_empty());

        let ctx = context(true);
        run_once(&ctx, JANE).unwrap();
        assert_eq!(ctx.store.borrow().len(), 1);
    }
}
