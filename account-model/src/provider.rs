/// External identity source a federated account is linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FederatedKind {
    Google,
    Saml,
}

impl FederatedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Saml => "saml",
        }
    }
}

impl std::fmt::Display for FederatedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of truth for an account's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum IdentityProvider {
    /// Credentials are owned by this application
    Local,
    /// Identity is asserted by an external provider
    Federated {
        kind: FederatedKind,
        external_email: Option<String>,
    },
}

impl IdentityProvider {
    pub fn is_local(&self) -> bool {
        matches!(self, IdentityProvider::Local)
    }

    pub fn kind(&self) -> Option<FederatedKind> {
        match self {
            IdentityProvider::Local => None,
            IdentityProvider::Federated { kind, .. } => Some(*kind),
        }
    }

    pub fn external_email(&self) -> Option<&str> {
        match self {
            IdentityProvider::Local => None,
            IdentityProvider::Federated { external_email, .. } => {
                external_email.as_deref()
            }
        }
    }

    /// Whether a disconnect affordance makes sense for an account whose
    /// primary email is `primary_email`.
    pub fn can_disconnect(&self, primary_email: &str) -> bool {
        match self {
            IdentityProvider::Local => false,
            IdentityProvider::Federated { external_email, .. } => {
                external_email.as_deref() != Some(primary_email)
            }
        }
    }
}
