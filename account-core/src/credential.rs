use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A password or one-time code that is zeroed when dropped.
///
/// Confirmation gates hold these for as long as a verification call is in
/// flight; `Debug` and `Display` never print the content.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecureCredential {
    data: String,
}

impl SecureCredential {
    pub fn new(data: String) -> Self {
        Self { data }
    }

    /// Borrow the secret. Do not keep the reference beyond the credential's
    /// lifetime; the backing memory is wiped on drop.
    pub fn expose(&self) -> &str {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Empty or whitespace-only input counts as missing
    pub fn is_blank(&self) -> bool {
        self.data.trim().is_empty()
    }
}

impl Clone for SecureCredential {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

impl From<String> for SecureCredential {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

impl From<&str> for SecureCredential {
    fn from(data: &str) -> Self {
        Self::new(data.to_string())
    }
}

impl fmt::Debug for SecureCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureCredential")
            .field("len", &self.len())
            .field("data", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for SecureCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[SecureCredential: {} bytes]", self.len())
    }
}

impl PartialEq for SecureCredential {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.data.as_bytes() == other.data.as_bytes()
    }
}

impl Eq for SecureCredential {}

/// Credentials bundled into a single account-deletion confirmation.
#[derive(Debug, Clone, Default)]
pub struct DeletionCredentials {
    pub password: Option<SecureCredential>,
    pub totp_code: Option<SecureCredential>,
}

impl DeletionCredentials {
    pub fn new(password: impl Into<SecureCredential>) -> Self {
        Self {
            password: Some(password.into()),
            totp_code: None,
        }
    }

    pub fn with_totp(mut self, code: impl Into<SecureCredential>) -> Self {
        self.totp_code = Some(code.into());
        self
    }

    /// Neither credential supplied; valid only for federated accounts
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn password_present(&self) -> bool {
        self.password.as_ref().is_some_and(|p| !p.is_blank())
    }

    pub(crate) fn totp_present(&self) -> bool {
        self.totp_code.as_ref().is_some_and(|c| !c.is_blank())
    }
}
