use crate::error::{FieldErrors, LedgerError};

/// Collects request-shape violations, at most one per field.
///
/// Create one per request and drop it when the request is answered.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records `message` for `field` unless the field already has an error.
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn check(&mut self, condition: bool, field: &str, message: impl Into<String>) {
        if !condition {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// `Ok(())` when nothing was recorded, otherwise every violation at once.
    pub fn finish(self) -> Result<(), LedgerError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(LedgerError::Validation(self.errors))
        }
    }
}
