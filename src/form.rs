// Form model: the two user inputs plus the outcome of the most recent
// submission. The view owns exactly one `FormState` and threads it through
// its handlers; nothing else keeps a reference to it.

use thiserror::Error;

/// Request lifecycle. There is no terminal success/failure status; once a
/// submission settles the form is `Idle` again and only the message remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Submitting,
}

/// Kind of the last completed submission, used by the view for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Succeeded,
    Failed,
}

/// Why the form cannot be submitted yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Config path is required")]
    EmptyConfigPath,
    #[error("Base directory is required")]
    EmptyBaseDir,
}

#[derive(Debug, Default)]
pub struct FormState {
    config_path: String,
    base_dir: String,
    message: String,
    status: Status,
    last_outcome: Option<OutcomeKind>,
    // Bookkeeping for the submission controller.
    pub(crate) generation: u64,
    pub(crate) pending: Option<u64>,
}

impl FormState {
    /// Fresh form as shown on mount: empty fields, no message, `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the config path verbatim. No trimming happens here.
    pub fn set_config_path(&mut self, value: impl Into<String>) {
        self.config_path = value.into();
    }

    /// Replace the base directory verbatim.
    pub fn set_base_dir(&mut self, value: impl Into<String>) {
        self.base_dir = value.into();
    }

    pub fn config_path(&self) -> &str {
        &self.config_path
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Display text of the most recently completed submission.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn last_outcome(&self) -> Option<OutcomeKind> {
        self.last_outcome
    }

    pub fn is_submitting(&self) -> bool {
        self.status == Status::Submitting
    }

    pub(crate) fn mark_submitting(&mut self, generation: u64) {
        self.generation = generation;
        self.pending = Some(generation);
        self.status = Status::Submitting;
    }

    pub(crate) fn complete(&mut self, message: String, kind: OutcomeKind) {
        self.message = message;
        self.last_outcome = Some(kind);
        self.pending = None;
        self.status = Status::Idle;
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending = None;
        self.status = Status::Idle;
    }
}

/// Validation gate: both fields must be non-empty.
pub fn can_submit(form: &FormState) -> bool {
    validate(form).is_ok()
}

/// Same check as [`can_submit`], naming the first empty field.
pub fn validate(form: &FormState) -> Result<(), ValidationError> {
    if form.config_path.is_empty() {
        return Err(ValidationError::EmptyConfigPath);
    }
    if form.base_dir.is_empty() {
        return Err(ValidationError::EmptyBaseDir);
    }
    Ok(())
}
