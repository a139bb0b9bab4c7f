//! Fixed user-facing strings and outcome notices

use account_model::ErrorCode;

pub const GENERIC_RETRY: &str = "Something went wrong. Please try again.";
pub const SESSION_EXPIRED: &str =
    "Your session has expired. Please sign in again.";
pub const SETTINGS_UPDATED: &str = "Settings updated successfully";
pub const VERIFICATION_SENT: &str = "Verification email sent";
pub const ACCOUNT_DISCONNECTED: &str = "Account disconnected";

/// Message shown for a backend error code.
pub fn for_code(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::SecondFactorRequired => {
            "Two-factor authentication is enabled. Enter the six-digit code from your authenticator app."
        }
        ErrorCode::IncorrectPassword => "Incorrect password. Please try again.",
        ErrorCode::IncorrectTwoFactorCode => {
            "Incorrect two-factor code. Please try again."
        }
        ErrorCode::UserNotFound => "No account exists matching that email address.",
        ErrorCode::InternalServerError => {
            "Something went wrong. Please try again and contact us if the issue persists."
        }
        ErrorCode::ThirdPartyIdentityProviderEnabled => {
            "Your account was created using an identity provider. Manage it there instead."
        }
        ErrorCode::EmailAlreadyUsed => "That email address is already in use.",
        ErrorCode::Unknown => GENERIC_RETRY,
    }
}

/// Transient feedback produced by a completed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    SettingsUpdated,
    /// The new primary address must be verified before it takes effect
    EmailChangePendingVerification { new_email: String },
    Disconnected(String),
    /// A secondary address was added and awaits verification
    VerificationPending(String),
    VerificationSent,
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::SettingsUpdated => SETTINGS_UPDATED.to_string(),
            Notice::EmailChangePendingVerification { new_email } => format!(
                "We sent a verification link to {new_email}. Your primary email changes once it is confirmed."
            ),
            Notice::Disconnected(message) if message.trim().is_empty() => {
                ACCOUNT_DISCONNECTED.to_string()
            }
            Notice::Disconnected(message) => message.clone(),
            Notice::VerificationPending(address) => {
                format!("Check {address} for a verification link.")
            }
            Notice::VerificationSent => VERIFICATION_SENT.to_string(),
        }
    }
}
