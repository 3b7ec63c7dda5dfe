use thiserror::Error;

/// Errors that abort a validation run (distinct from a check failing,
/// which is an ordinary veto outcome).
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("store error during {check} check: {source}")]
    Store {
        check: &'static str,
        #[source]
        source: veps_store::StoreError,
    },

    #[error("internal validator error: {0}")]
    Internal(String),
}

impl ValidatorError {
    pub fn store(check: &'static str, source: veps_store::StoreError) -> Self {
        Self::Store { check, source }
    }
}

pub type ValidatorResult<T> = Result<T, ValidatorError>;
