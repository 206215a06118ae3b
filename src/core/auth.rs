// ─── Auth Session ───
// Identity context handed to the launch-plan compiler. The access token is
// sensitive and must never reach logs in clear text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Microsoft,
    Mojang,
}

impl AccountKind {
    /// The `user_type` literal the game expects for this account kind.
    pub fn user_type_arg(&self) -> &'static str {
        match self {
            AccountKind::Microsoft => "msa",
            AccountKind::Mojang => "mojang",
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub display_name: String,
    pub uuid: String,
    pub access_token: String,
    pub kind: AccountKind,
}

impl AuthSession {
    pub fn new(
        display_name: impl Into<String>,
        uuid: impl Into<String>,
        access_token: impl Into<String>,
        kind: AccountKind,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            uuid: uuid.into(),
            access_token: access_token.into(),
            kind,
        }
    }
}

// Redact the token: sessions get logged as part of launch diagnostics.
impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("display_name", &self.display_name)
            .field("uuid", &self.uuid)
            .field("access_token", &"**********")
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_the_token() {
        let session = AuthSession::new("Alex", "uuid-1", "secret-token", AccountKind::Microsoft);
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("Alex"));
    }

    #[test]
    fn user_type_literals() {
        assert_eq!(AccountKind::Microsoft.user_type_arg(), "msa");
        assert_eq!(AccountKind::Mojang.user_type_arg(), "mojang");
    }
}
