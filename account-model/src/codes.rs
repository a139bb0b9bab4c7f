/// Machine-readable failure codes reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorCode {
    #[cfg_attr(feature = "serde", serde(rename = "second-factor-required"))]
    SecondFactorRequired,
    #[cfg_attr(feature = "serde", serde(rename = "incorrect-password"))]
    IncorrectPassword,
    #[cfg_attr(feature = "serde", serde(rename = "incorrect-two-factor-code"))]
    IncorrectTwoFactorCode,
    #[cfg_attr(feature = "serde", serde(rename = "user-not-found"))]
    UserNotFound,
    #[cfg_attr(feature = "serde", serde(rename = "internal-server-error"))]
    InternalServerError,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "third-party-identity-provider-enabled")
    )]
    ThirdPartyIdentityProviderEnabled,
    #[cfg_attr(feature = "serde", serde(rename = "email_already_used"))]
    EmailAlreadyUsed,
    /// Any code this client does not recognise
    #[cfg_attr(feature = "serde", serde(rename = "unknown", other))]
    Unknown,
}

impl ErrorCode {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecondFactorRequired => "second-factor-required",
            Self::IncorrectPassword => "incorrect-password",
            Self::IncorrectTwoFactorCode => "incorrect-two-factor-code",
            Self::UserNotFound => "user-not-found",
            Self::InternalServerError => "internal-server-error",
            Self::ThirdPartyIdentityProviderEnabled => {
                "third-party-identity-provider-enabled"
            }
            Self::EmailAlreadyUsed => "email_already_used",
            Self::Unknown => "unknown",
        }
    }

    /// Parse from the wire representation. Unrecognised codes map to
    /// [`ErrorCode::Unknown`] so callers still get the generic message.
    pub fn parse(s: &str) -> Self {
        match s {
            "second-factor-required" => Self::SecondFactorRequired,
            "incorrect-password" => Self::IncorrectPassword,
            "incorrect-two-factor-code" => Self::IncorrectTwoFactorCode,
            "user-not-found" => Self::UserNotFound,
            "internal-server-error" => Self::InternalServerError,
            "third-party-identity-provider-enabled" => {
                Self::ThirdPartyIdentityProviderEnabled
            }
            "email_already_used" => Self::EmailAlreadyUsed,
            _ => Self::Unknown,
        }
    }

    /// Codes caused by the submitted password or second factor
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            Self::SecondFactorRequired
                | Self::IncorrectPassword
                | Self::IncorrectTwoFactorCode
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
