//! Index credentials with memory-safe handling and masking
//!
//! The password is held as a [`SecretString`] so it never shows up in
//! `Debug` output, and any text surfaced to the user (captured upload
//! output, command lines) can be passed through [`IndexCredentials::mask_in_string`].

use regex::{NoExpand, Regex};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Username and password for the package index
///
/// # Examples
///
/// ```
/// use panda_publish::security::IndexCredentials;
///
/// let credentials = IndexCredentials::new("root", "s3cr3t-passw0rd");
/// assert_eq!(credentials.username(), "root");
/// assert_eq!(credentials.masked_password(), "s3c...0rd");
/// ```
#[derive(Clone)]
pub struct IndexCredentials {
    username: String,
    password: SecretString,
}

impl IndexCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let password: String = password.into();
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }

    pub fn from_secret(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// True when no password was supplied (the invocation default)
    pub fn has_password(&self) -> bool {
        !self.password.expose_secret().is_empty()
    }

    /// Masked form of the password for display
    pub fn masked_password(&self) -> String {
        mask_token(self.password.expose_secret())
    }

    /// Replaces every occurrence of the password in `text` with its masked form
    ///
    /// # Examples
    ///
    /// ```
    /// use panda_publish::security::IndexCredentials;
    ///
    /// let credentials = IndexCredentials::new("root", "hunter2-hunter2");
    /// let masked = credentials.mask_in_string("login root --password hunter2-hunter2");
    /// assert_eq!(masked, "login root --password hun...er2");
    /// ```
    pub fn mask_in_string(&self, text: &str) -> String {
        let secret = self.password.expose_secret();
        if secret.is_empty() {
            return text.to_string();
        }

        let masked = mask_token(secret);
        match Regex::new(&regex::escape(secret)) {
            Ok(regex) => regex
                .replace_all(text, NoExpand(&masked))
                .to_string(),
            Err(_) => text.replace(secret, "****"),
        }
    }
}

impl fmt::Debug for IndexCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Masks a token for safe logging
///
/// Shows only the first 3 and last 3 characters for identification purposes.
/// Tokens shorter than 10 characters are fully masked as "****".
pub fn mask_token(token: &str) -> String {
    if token.chars().count() < 10 {
        return "****".to_string();
    }

    let prefix: String = token.chars().take(3).collect();
    let suffix: String = token
        .chars()
        .rev()
        .take(3)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{}...{}", prefix, suffix)
}
