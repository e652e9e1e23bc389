//! Session gate.
//!
//! Sits in front of the screen state machine: a signed-out user sees the
//! auth forms, an unverified user sees the verification prompt, and only a
//! verified session reaches the screens in [`super::Screen`].

use crate::account::Session;

/// What the window shows for a given session state.
#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    /// No session — show login/registration.
    SignedOut,
    /// Signed in but the email is not verified — show the verification
    /// prompt for this address.
    Unverified { email: String },
    /// Verified session — show the main screens.
    Active,
}

impl Gate {
    pub fn for_session(session: Option<&Session>) -> Self {
        match session {
            None => Gate::SignedOut,
            Some(s) if !s.email_verified => Gate::Unverified {
                email: s.email.clone(),
            },
            Some(_) => Gate::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(verified: bool) -> Session {
        Session {
            account_id: "uid-1".into(),
            id_token: "token".into(),
            email: "a@b.test".into(),
            display_name: Some("Ada".into()),
            email_verified: verified,
        }
    }

    #[test]
    fn no_session_is_signed_out() {
        assert_eq!(Gate::for_session(None), Gate::SignedOut);
    }

    #[test]
    fn unverified_session_is_gated() {
        let s = session(false);
        assert_eq!(
            Gate::for_session(Some(&s)),
            Gate::Unverified {
                email: "a@b.test".into()
            }
        );
    }

    #[test]
    fn verified_session_is_active() {
        let s = session(true);
        assert_eq!(Gate::for_session(Some(&s)), Gate::Active);
    }
}
