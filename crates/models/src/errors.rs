use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

pub(crate) fn require(value: &str, field: &'static str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::MissingField(field));
    }
    Ok(())
}
