//! Error types for the profile editor core
//!
//! Gateway implementations report [`GatewayError`]. Everything the editor
//! returns to its caller is a [`ProfileError`], which carries a fixed
//! user-facing message per backend [`ErrorCode`].

use account_model::ErrorCode;
use thiserror::Error;

use crate::messages;

/// Failure reported by a [`ProfileGateway`](crate::ProfileGateway) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    Authentication(ErrorCode),

    #[error("conflict: {0}")]
    Conflict(ErrorCode),

    /// Backend-side schema rejection
    #[error("rejected by backend: {0}")]
    Validation(String),

    #[error("server failure: {0}")]
    Fatal(ErrorCode),

    #[error("operation not allowed: {0}")]
    Disallowed(ErrorCode),

    #[error("transport error: {0}")]
    Transport(String),

    /// The active session credential is no longer accepted
    #[error("session expired")]
    SessionExpired,
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Which mutation a pending slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    UpdateProfile,
    VerifyPassword,
    DeleteAccount,
    UnlinkAccount,
    AddSecondaryEmail,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::UpdateProfile => "update_profile",
            MutationKind::VerifyPassword => "verify_password",
            MutationKind::DeleteAccount => "delete_account",
            MutationKind::UnlinkAccount => "unlink_account",
            MutationKind::AddSecondaryEmail => "add_secondary_email",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form field a validation failure is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Username,
    DisplayName,
    /// Entry of the edited email list, by position
    Email(usize),
    Bio,
    /// Input of the add-secondary-email dialog
    NewEmail,
    Password,
    TotpCode,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Username => f.write_str("username"),
            Field::DisplayName => f.write_str("display name"),
            Field::Email(index) => write!(f, "email #{}", index + 1),
            Field::Bio => f.write_str("bio"),
            Field::NewEmail => f.write_str("new email"),
            Field::Password => f.write_str("password"),
            Field::TotpCode => f.write_str("two-factor code"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("is required")]
    Required,

    #[error("must be at most {max} characters")]
    TooLong { max: usize },

    #[error("is not a valid email address")]
    InvalidEmail,

    #[error("contains invalid characters")]
    InvalidCharacters,

    /// Rejected by the backend schema, message passed through
    #[error("{0}")]
    Rejected(String),
}

/// Local schema failure. Never reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {issue}")]
pub struct ValidationError {
    pub field: Field,
    pub issue: ValidationIssue,
}

impl ValidationError {
    pub fn new(field: Field, issue: ValidationIssue) -> Self {
        Self { field, issue }
    }

    pub fn required(field: Field) -> Self {
        Self::new(field, ValidationIssue::Required)
    }
}

/// An operation that is not legal in the current session state. Raised before
/// any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("no email entry is marked primary")]
    NoPrimaryEmail,

    #[error("the primary email cannot be removed")]
    PrimaryRemoval,

    #[error("the email list already holds a placeholder entry")]
    DuplicatePlaceholder,

    #[error("email entry {id} is already in the list")]
    DuplicateEntry { id: i64 },

    #[error("no email entry at index {index} (list has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no email entry with id {id}")]
    UnknownEntry { id: i64 },

    #[error("a profile update is already in progress")]
    SubmitInFlight,

    #[error("{0} is already in progress")]
    MutationInFlight(MutationKind),

    #[error("another confirmation is already open")]
    GateAlreadyOpen,

    #[error("no confirmation is open")]
    NoGateOpen,

    #[error("the open confirmation does not accept this action")]
    UnexpectedGate,

    #[error("a password must be set before disconnecting")]
    PasswordNotEstablished,

    #[error("there are no changes to save")]
    NothingToSubmit,

    #[error("the editor session has been closed")]
    SessionClosed,

    #[error("this account has no connected identity to disconnect")]
    DisconnectUnavailable,
}

/// Error surfaced to callers of the editor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("authentication failed: {0}")]
    Authentication(ErrorCode),

    #[error("conflict: {0}")]
    Conflict(ErrorCode),

    #[error("invalid state: {0}")]
    State(#[from] StateError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server failure: {0}")]
    Fatal(ErrorCode),

    #[error("operation not allowed: {0}")]
    Disallowed(ErrorCode),

    #[error("session expired")]
    SessionExpired,
}

impl From<GatewayError> for ProfileError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Authentication(code) => {
                ProfileError::Authentication(code)
            }
            GatewayError::Conflict(code) => ProfileError::Conflict(code),
            GatewayError::Validation(message) => {
                ProfileError::Validation(ValidationError::new(
                    Field::NewEmail,
                    ValidationIssue::Rejected(message),
                ))
            }
            GatewayError::Fatal(code) => ProfileError::Fatal(code),
            GatewayError::Disallowed(code) => ProfileError::Disallowed(code),
            GatewayError::Transport(message) => {
                ProfileError::Transport(message)
            }
            GatewayError::SessionExpired => ProfileError::SessionExpired,
        }
    }
}

impl ProfileError {
    /// Message suitable for showing next to the failed control
    pub fn user_message(&self) -> String {
        match self {
            ProfileError::Validation(err) => err.to_string(),
            ProfileError::Authentication(code)
            | ProfileError::Conflict(code)
            | ProfileError::Fatal(code)
            | ProfileError::Disallowed(code) => {
                messages::for_code(*code).to_string()
            }
            ProfileError::State(err) => err.to_string(),
            ProfileError::Transport(_) => messages::GENERIC_RETRY.to_string(),
            ProfileError::SessionExpired => {
                messages::SESSION_EXPIRED.to_string()
            }
        }
    }

    /// Field the error belongs to, for inline display
    pub fn field(&self) -> Option<Field> {
        match self {
            ProfileError::Validation(err) => Some(err.field),
            ProfileError::Conflict(ErrorCode::EmailAlreadyUsed) => {
                Some(Field::NewEmail)
            }
            ProfileError::Authentication(ErrorCode::IncorrectTwoFactorCode)
            | ProfileError::Authentication(ErrorCode::SecondFactorRequired) => {
                Some(Field::TotpCode)
            }
            ProfileError::Authentication(ErrorCode::IncorrectPassword) => {
                Some(Field::Password)
            }
            _ => None,
        }
    }

    /// Only a lost session forces the user to sign in again
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, ProfileError::SessionExpired)
    }

    /// Whether repeating the same action unchanged could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ProfileError::Transport(_) => true,
            ProfileError::Fatal(ErrorCode::InternalServerError) => true,
            ProfileError::State(StateError::SubmitInFlight)
            | ProfileError::State(StateError::MutationInFlight(_)) => true,
            _ => false,
        }
    }
}
