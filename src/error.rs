//! Error types.
//!
//! - `FitError` is what the fit engine returns (library-level, typed).
//! - `AppError` is what the binary reports: a message plus a process exit code.

use thiserror::Error;

use crate::domain::FitKind;

/// Failure of a single fit call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    /// No shift width in `0..max_shift` satisfies the acceptance criterion.
    #[error("{kind} fit is infeasible: no shift width below {max_shift} satisfies the residual bound")]
    InfeasibleFit { kind: FitKind, max_shift: u32 },

    /// The sample set violates a precondition (length, ordering, group tags).
    #[error("invalid fit input: {0}")]
    InvalidInput(String),
}

pub type FitResult<T> = std::result::Result<T, FitError>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let code = match err {
            FitError::InfeasibleFit { .. } => 4,
            FitError::InvalidInput(_) => 3,
        };
        AppError::new(code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_errors_map_to_exit_codes() {
        let infeasible: AppError = FitError::InfeasibleFit {
            kind: FitKind::Level,
            max_shift: 32,
        }
        .into();
        assert_eq!(infeasible.exit_code(), 4);
        assert!(infeasible.to_string().contains("below 32"));

        let invalid: AppError = FitError::InvalidInput("too short".to_string()).into();
        assert_eq!(invalid.exit_code(), 3);
    }
}
