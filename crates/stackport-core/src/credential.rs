use std::fmt;

use secrecy::SecretString;

/// A username/password pair for the legacy device CLI.
///
/// The password and enable secret are wrapped in [`SecretString`] and
/// never appear in `Debug` output or logs; use [`Credential::masked`]
/// when an identity has to be printed.
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    pub password: SecretString,
    /// Privileged-mode secret sent when the session is not already enabled.
    pub enable_secret: Option<SecretString>,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            enable_secret: None,
        }
    }

    #[must_use]
    pub fn with_enable_secret(mut self, secret: SecretString) -> Self {
        self.enable_secret = Some(secret);
        self
    }

    /// `username/***`, safe for logs and reports.
    pub fn masked(&self) -> String {
        format!("{}/***", self.username)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .field("enable_secret", &self.enable_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_hides_password() {
        let cred = Credential::new("netops", "hunter2");
        assert_eq!(cred.masked(), "netops/***");
    }

    #[test]
    fn debug_never_prints_secrets() {
        let cred = Credential::new("netops", "hunter2")
            .with_enable_secret(SecretString::from("enable-me".to_owned()));
        let rendered = format!("{cred:?}");
        assert!(rendered.contains("netops"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("enable-me"));
    }
}
