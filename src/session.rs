//! Login gate.
//!
//! The rest of the crate only sees [`Authenticator`]; the fixed-credential
//! check lives behind it so a real identity provider can replace it.

use log::info;

use crate::error::Result;
use crate::storage::Storage;

const AUTH_KEY: &str = "auth";

pub trait Authenticator {
    fn is_authenticated(&self) -> bool;

    /// Returns `false` when the credentials are rejected.
    fn login(&mut self, user: &str, password: &str) -> Result<bool>;

    fn logout(&mut self) -> Result<()>;
}

/// Accepts one configured username/password pair and remembers the outcome
/// in local storage. No token, no expiry.
pub struct FixedCredentials {
    storage: Storage,
    username: String,
    password: String,
    authenticated: bool,
}

impl FixedCredentials {
    pub fn new(storage: Storage, username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let authenticated = storage.get(AUTH_KEY)?.as_deref() == Some("1");
        Ok(Self {
            storage,
            username: username.into(),
            password: password.into(),
            authenticated,
        })
    }
}

impl Authenticator for FixedCredentials {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn login(&mut self, user: &str, password: &str) -> Result<bool> {
        if user != self.username || password != self.password {
            return Ok(false);
        }
        self.storage.set(AUTH_KEY, "1")?;
        self.authenticated = true;
        info!("logged in as {user}");
        Ok(true)
    }

    fn logout(&mut self) -> Result<()> {
        self.storage.remove(AUTH_KEY)?;
        self.authenticated = false;
        info!("logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(storage: Storage) -> FixedCredentials {
        FixedCredentials::new(storage, "fullstack", "fullstack").unwrap()
    }

    #[test]
    fn wrong_credentials_leave_session_closed() {
        let mut a = auth(Storage::in_memory().unwrap());
        assert!(!a.login("fullstack", "nope").unwrap());
        assert!(!a.login("FULLSTACK", "fullstack").unwrap());
        assert!(!a.is_authenticated());
    }

    #[test]
    fn login_persists_until_logout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.sqlite");

        let mut a = auth(Storage::open(&path).unwrap());
        assert!(a.login("fullstack", "fullstack").unwrap());
        drop(a);

        let mut a = auth(Storage::open(&path).unwrap());
        assert!(a.is_authenticated());
        a.logout().unwrap();
        drop(a);

        assert!(!auth(Storage::open(&path).unwrap()).is_authenticated());
    }
}
