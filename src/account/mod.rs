//! Account service — identity and profile-document adapters.
//!
//! This module provides:
//! * [`Session`] — the signed-in identity for the current connection.
//! * [`UserProfile`] — the profile document keyed by account id.
//! * [`AccountService`] — async trait over registration, login, profile
//!   read/update, verification mail and account deletion.
//! * [`RestAccountService`] — implementation against an identity-toolkit
//!   REST endpoint plus a document-store REST endpoint.
//! * [`AuthError`] — the four user-distinguishable failures plus transport
//!   variants.

pub mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use rest::RestAccountService;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The signed-in identity.  Created on login/registration, destroyed on
/// sign-out; lives exactly as long as the connected session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Opaque account identifier assigned by the provider.
    pub account_id: String,
    /// Bearer token for document-store and identity calls.
    pub id_token: String,
    pub email: String,
    pub display_name: Option<String>,
    /// Whether the account's email address has been verified.  Unverified
    /// sessions are gated away from the main screens.
    pub email_verified: bool,
}

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// Profile document stored per account.  The email is immutable after
/// creation; name and photo file name are editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub photo_file_name: String,
}

// ---------------------------------------------------------------------------
// AuthError
// ---------------------------------------------------------------------------

/// Account-operation failures.
///
/// The first four variants carry the messages shown directly to the user;
/// everything else degrades to a generic failure string in the UI.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User already exists. Sign in?")]
    EmailInUse,

    #[error("Password should be at least 6 characters.")]
    WeakPassword,

    #[error("Password or Email Incorrect")]
    WrongCredentials,

    #[error("Please sign out and sign in again to delete your account.")]
    RequiresRecentLogin,

    /// HTTP transport or connection error.
    #[error("request failed: {0}")]
    Request(String),

    /// The provider's response could not be interpreted.
    #[error("unexpected provider response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Request(e.to_string())
    }
}

impl AuthError {
    /// Map an identity-toolkit error code to the matching variant.
    ///
    /// Codes sometimes arrive suffixed with detail text
    /// (`"WEAK_PASSWORD : Password should be at least 6 characters"`), so
    /// matching is by prefix.
    pub fn from_provider_code(code: &str) -> Self {
        let code = code.trim();
        if code.starts_with("EMAIL_EXISTS") {
            AuthError::EmailInUse
        } else if code.starts_with("WEAK_PASSWORD") {
            AuthError::WeakPassword
        } else if code.starts_with("INVALID_LOGIN_CREDENTIALS")
            || code.starts_with("INVALID_PASSWORD")
            || code.starts_with("EMAIL_NOT_FOUND")
        {
            AuthError::WrongCredentials
        } else if code.starts_with("CREDENTIAL_TOO_OLD_LOGIN_AGAIN") {
            AuthError::RequiresRecentLogin
        } else {
            AuthError::Request(code.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AccountService trait
// ---------------------------------------------------------------------------

/// Async trait for account operations.
///
/// Implementors must be `Send + Sync` so they can be shared across threads
/// (e.g. wrapped in `Arc<dyn AccountService>`).
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create an identity, its parallel profile document, and trigger a
    /// verification message.  Profile-document and mail failures are logged
    /// and do not block registration.
    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, AuthError>;

    /// Authenticate, lazily creating the profile document when it is missing.
    async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Read the profile document, falling back to identity data when the
    /// document is missing.
    async fn load_profile(&self, session: &Session) -> Result<UserProfile, AuthError>;

    /// Update the profile document and mirror the display name onto the
    /// identity.
    async fn update_profile(
        &self,
        session: &Session,
        name: &str,
        photo_file_name: &str,
    ) -> Result<(), AuthError>;

    /// Delete the profile document, then the identity.  Surfaces
    /// [`AuthError::RequiresRecentLogin`] when the provider demands a fresh
    /// login before destructive operations.
    async fn delete_account(&self, session: &Session) -> Result<(), AuthError>;

    /// Re-send the email-verification message for an unverified session.
    async fn resend_verification(&self, session: &Session) -> Result<(), AuthError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
