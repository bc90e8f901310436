use log::warn;

use crate::error::{Error, Result};
use crate::session::Authenticator;

/// Log in with the given credentials, prompting for whichever is missing.
pub fn login<S: Authenticator>(session: &mut S, user: Option<String>, password: Option<String>) -> Result<()> {
    let user = match user {
        Some(u) => u,
        None => super::prompt_line("Username: ")?,
    };
    let password = match password {
        Some(p) => p,
        None => super::prompt_line("Password: ")?,
    };
    if user.is_empty() || password.is_empty() {
        return Err(Error::InvalidCredentials);
    }
    if session.login(&user, &password)? {
        Ok(())
    } else {
        warn!("rejected login for {user:?}");
        Err(Error::InvalidCredentials)
    }
}

pub fn require<S: Authenticator>(session: &S) -> Result<()> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(Error::NotAuthenticated)
    }
}
