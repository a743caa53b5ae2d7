//! # Engine Error Types
//!
//! The two-sided error surface of the settlement services.
//!
//! ## Error Flow
//! ```text
//! CoreError ──────────────► EngineError::Domain
//!   (business rejection;       user-facing, caller may correct
//!    message is the answer)    the input and retry
//!
//! DbError ────────────────► EngineError::Support
//!   (storage gave out)         full detail goes to the log, the
//!                              caller gets "contact support"
//! ```
//!
//! Services never leak raw storage errors to their callers. Anything that
//! is not a domain rejection is logged with context and collapsed into
//! [`EngineError::Support`].

use thiserror::Error;
use vero_core::{CoreError, ValidationError};
use vero_db::DbError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// An engine operation failure.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// A business rule rejected the operation. The `Display` text is the
    /// message to put in front of the user.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Storage failed underneath the workflow. The triggering error has
    /// already been logged; `action` names the step that was running.
    #[error("internal failure while trying to {action}, contact support")]
    Support { action: &'static str },
}

impl EngineError {
    /// The domain rejection, if this is one.
    pub fn domain(&self) -> Option<&CoreError> {
        match self {
            EngineError::Domain(core) => Some(core),
            EngineError::Support { .. } => None,
        }
    }

    /// True when the caller can fix the input and retry.
    pub fn is_domain(&self) -> bool {
        matches!(self, EngineError::Domain(_))
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Domain(CoreError::Validation(err))
    }
}

/// Maps a storage error into [`EngineError::Support`], logging the detail.
///
/// Used as `repo_call().await.map_err(support("open the register"))?` so
/// every collapsed storage error names the step it interrupted.
pub(crate) fn support(action: &'static str) -> impl FnOnce(DbError) -> EngineError {
    move |err| {
        tracing::error!(action, error = %err, "storage failure in settlement engine");
        EngineError::Support { action }
    }
}
