//! Staff login gate: a flat username/password table from configuration.

use std::fmt;

use serde::Deserialize;

use crate::errors::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Default)]
pub struct CredentialTable {
    entries: Vec<(String, String)>,
}

// Never print passwords.
impl fmt::Debug for CredentialTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialTable")
            .field("users", &self.entries.iter().map(|(u, _)| u).collect::<Vec<_>>())
            .finish()
    }
}

impl CredentialTable {
    /// Parses `user:password` pairs separated by commas. Blank input gives an
    /// empty table, which disables the gate.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut entries = Vec::new();

        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (user, password) = pair
                .split_once(':')
                .ok_or_else(|| format!("credential entry '{}' is missing ':'", redact(pair)))?;
            let user = user.trim();
            if user.is_empty() || password.is_empty() {
                return Err("credential entries need a username and a password".to_string());
            }
            entries.push((user.to_string(), password.to_string()));
        }

        Ok(Self { entries })
    }

    pub fn is_enabled(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn user_count(&self) -> usize {
        self.entries.len()
    }

    /// Checks every entry so timing does not depend on which user matched.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let mut matched = false;
        for (user, pass) in &self.entries {
            let user_ok = constant_time_eq(user.as_bytes(), username.as_bytes());
            let pass_ok = constant_time_eq(pass.as_bytes(), password.as_bytes());
            matched |= user_ok & pass_ok;
        }
        matched
    }

    /// Gate used by handlers: passes when disabled, otherwise requires a match.
    pub fn authorize(&self, credentials: Option<&Credentials>) -> Result<(), AppError> {
        if !self.is_enabled() {
            return Ok(());
        }
        match credentials {
            Some(c) if self.verify(&c.username, &c.password) => Ok(()),
            _ => Err(AppError::Unauthorized),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}

fn redact(pair: &str) -> String {
    pair.chars().take(3).chain("…".chars()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CredentialTable {
        CredentialTable::parse("alice:wonder land, bob:hunter2").unwrap()
    }

    #[test]
    fn test_parse_pairs() {
        let t = table();
        assert_eq!(t.user_count(), 2);
        assert!(t.is_enabled());
    }

    #[test]
    fn test_blank_config_disables_gate() {
        let t = CredentialTable::parse("  ").unwrap();
        assert!(!t.is_enabled());
        assert!(t.authorize(None).is_ok());
    }

    #[test]
    fn test_malformed_entry_rejected() {
        assert!(CredentialTable::parse("alice").is_err());
        assert!(CredentialTable::parse(":pw").is_err());
        assert!(CredentialTable::parse("alice:").is_err());
    }

    #[test]
    fn test_password_may_contain_colon() {
        let t = CredentialTable::parse("carol:a:b").unwrap();
        assert!(t.verify("carol", "a:b"));
    }

    #[test]
    fn test_verify() {
        let t = table();
        assert!(t.verify("alice", "wonder land"));
        assert!(t.verify("bob", "hunter2"));
        assert!(!t.verify("bob", "wonder land"));
        assert!(!t.verify("alice", "wonder"));
        assert!(!t.verify("", ""));
        assert!(!t.verify("mallory", "hunter2"));
    }

    #[test]
    fn test_authorize_requires_credentials_when_enabled() {
        let t = table();
        assert!(matches!(t.authorize(None), Err(AppError::Unauthorized)));
        let good = Credentials {
            username: "bob".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(t.authorize(Some(&good)).is_ok());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_debug_hides_passwords() {
        let printed = format!("{:?}", table());
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
    }
}
