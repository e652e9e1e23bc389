//! REST implementation of [`AccountService`].
//!
//! Identity operations go to an identity-toolkit endpoint
//! (`accounts:signUp`, `accounts:signInWithPassword`, `accounts:lookup`,
//! `accounts:sendOobCode`, `accounts:update`, `accounts:delete`); the
//! profile record lives in a document-store endpoint as
//! `users/{account_id}` with string fields.  All URLs, the project id and
//! the API key come from [`AccountConfig`] — nothing is hardcoded.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::config::AccountConfig;

use super::{AccountService, AuthError, Session, UserProfile};

// ---------------------------------------------------------------------------
// Document wire format
// ---------------------------------------------------------------------------

/// Serialize a profile into the document store's typed-field format.
fn profile_to_doc(profile: &UserProfile) -> Value {
    json!({
        "fields": {
            "name": { "stringValue": profile.name },
            "email": { "stringValue": profile.email },
            "photoFileName": { "stringValue": profile.photo_file_name },
        }
    })
}

/// Read a profile out of a document; absent fields become empty strings.
fn profile_from_doc(doc: &Value) -> UserProfile {
    let field = |name: &str| {
        doc["fields"][name]["stringValue"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    };
    UserProfile {
        name: field("name"),
        email: field("email"),
        photo_file_name: field("photoFileName"),
    }
}

// ---------------------------------------------------------------------------
// RestAccountService
// ---------------------------------------------------------------------------

/// Account service backed by the provider's REST endpoints.
pub struct RestAccountService {
    http: reqwest::Client,
    config: AccountConfig,
}

impl RestAccountService {
    /// Build the service from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.
    pub fn from_config(config: &AccountConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            config: config.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // URL builders
    // -----------------------------------------------------------------------

    fn identity_url(&self, operation: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            self.config.identity_url, operation, self.config.api_key
        )
    }

    fn profile_doc_url(&self, account_id: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/users/{}",
            self.config.firestore_url, self.config.project_id, account_id
        )
    }

    // -----------------------------------------------------------------------
    // Identity transport
    // -----------------------------------------------------------------------

    /// POST to an identity operation, mapping provider error codes to
    /// [`AuthError`] variants.
    async fn identity_call(&self, operation: &str, body: Value) -> Result<Value, AuthError> {
        let response = self
            .http
            .post(self.identity_url(operation))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let json: Value = response
            .json()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))?;

        if !status.is_success() {
            let code = json["error"]["message"].as_str().unwrap_or("unknown error");
            return Err(AuthError::from_provider_code(code));
        }
        Ok(json)
    }

    /// Fetch verification status and display name for a token.
    async fn lookup(&self, id_token: &str) -> Result<(bool, Option<String>), AuthError> {
        let json = self
            .identity_call("lookup", json!({ "idToken": id_token }))
            .await?;

        let user = &json["users"][0];
        if user.is_null() {
            return Err(AuthError::Parse("lookup returned no users".into()));
        }

        let verified = user["emailVerified"].as_bool().unwrap_or(false);
        let display_name = user["displayName"]
            .as_str()
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        Ok((verified, display_name))
    }

    /// Trigger the verification email for `id_token`.
    async fn send_verification(&self, id_token: &str) -> Result<(), AuthError> {
        self.identity_call(
            "sendOobCode",
            json!({ "requestType": "VERIFY_EMAIL", "idToken": id_token }),
        )
        .await?;
        Ok(())
    }

    /// Mirror `display_name` onto the identity record.
    async fn set_display_name(&self, id_token: &str, name: &str) -> Result<(), AuthError> {
        self.identity_call(
            "update",
            json!({
                "idToken": id_token,
                "displayName": name,
                "returnSecureToken": false
            }),
        )
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Document transport
    // -----------------------------------------------------------------------

    /// Read the profile document.  `Ok(None)` means the document does not
    /// exist (yet).
    async fn read_profile_doc(&self, session: &Session) -> Result<Option<UserProfile>, AuthError> {
        let response = self
            .http
            .get(self.profile_doc_url(&session.account_id))
            .bearer_auth(&session.id_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AuthError::Request(format!(
                "profile read failed with status {}",
                response.status()
            )));
        }

        let doc: Value = response
            .json()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))?;
        Ok(Some(profile_from_doc(&doc)))
    }

    /// Create-or-replace the whole profile document.
    async fn write_profile_doc(
        &self,
        session: &Session,
        profile: &UserProfile,
    ) -> Result<(), AuthError> {
        let response = self
            .http
            .patch(self.profile_doc_url(&session.account_id))
            .bearer_auth(&session.id_token)
            .json(&profile_to_doc(profile))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Request(format!(
                "profile write failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Patch only the editable fields, leaving the immutable email alone.
    async fn patch_profile_fields(
        &self,
        session: &Session,
        name: &str,
        photo_file_name: &str,
    ) -> Result<(), AuthError> {
        let url = format!(
            "{}?updateMask.fieldPaths=name&updateMask.fieldPaths=photoFileName",
            self.profile_doc_url(&session.account_id)
        );

        let body = json!({
            "fields": {
                "name": { "stringValue": name },
                "photoFileName": { "stringValue": photo_file_name },
            }
        });

        let response = self
            .http
            .patch(url)
            .bearer_auth(&session.id_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Request(format!(
                "profile update failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Delete the profile document.  A missing document is fine — deletion
    /// must still proceed to the identity.
    async fn delete_profile_doc(&self, session: &Session) -> Result<(), AuthError> {
        let response = self
            .http
            .delete(self.profile_doc_url(&session.account_id))
            .bearer_auth(&session.id_token)
            .send()
            .await?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(AuthError::Request(format!(
                "profile delete failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Default profile derived from identity data, used for lazy creation
    /// and as the read fallback when the document is missing.
    fn profile_from_session(session: &Session) -> UserProfile {
        UserProfile {
            name: session.display_name.clone().unwrap_or_else(|| "Learner".into()),
            email: session.email.clone(),
            photo_file_name: String::new(),
        }
    }

    /// Create the profile document when it does not exist yet.  Failures are
    /// logged and swallowed — sign-in must not be blocked by the document
    /// store.
    async fn ensure_profile_doc(&self, session: &Session) {
        match self.read_profile_doc(session).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let profile = Self::profile_from_session(session);
                if let Err(e) = self.write_profile_doc(session, &profile).await {
                    log::warn!("account: lazy profile creation failed: {e}");
                }
            }
            Err(e) => log::warn!("account: profile check failed: {e}"),
        }
    }
}

#[async_trait]
impl AccountService for RestAccountService {
    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, AuthError> {
        let json = self
            .identity_call(
                "signUp",
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true
                }),
            )
            .await?;

        let id_token = json["idToken"]
            .as_str()
            .ok_or_else(|| AuthError::Parse("signUp response missing idToken".into()))?;
        let account_id = json["localId"]
            .as_str()
            .ok_or_else(|| AuthError::Parse("signUp response missing localId".into()))?;

        let session = Session {
            account_id: account_id.to_string(),
            id_token: id_token.to_string(),
            email: email.to_string(),
            display_name: (!name.is_empty()).then(|| name.to_string()),
            email_verified: false,
        };

        // Profile document, verification mail and display-name mirroring are
        // all non-fatal: the account exists either way.
        let profile = Self::profile_from_session(&session);
        if let Err(e) = self.write_profile_doc(&session, &profile).await {
            log::warn!("account: profile creation failed after register: {e}");
        }
        if let Err(e) = self.send_verification(&session.id_token).await {
            log::warn!("account: could not send verification email: {e}");
        }
        if !name.is_empty() {
            if let Err(e) = self.set_display_name(&session.id_token, name).await {
                log::warn!("account: could not set display name: {e}");
            }
        }

        Ok(session)
    }

    async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let json = self
            .identity_call(
                "signInWithPassword",
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true
                }),
            )
            .await?;

        let id_token = json["idToken"]
            .as_str()
            .ok_or_else(|| AuthError::Parse("signIn response missing idToken".into()))?
            .to_string();
        let account_id = json["localId"]
            .as_str()
            .ok_or_else(|| AuthError::Parse("signIn response missing localId".into()))?
            .to_string();

        // The sign-in response carries no verification flag; look it up.
        let (email_verified, display_name) = self.lookup(&id_token).await?;

        let session = Session {
            account_id,
            id_token,
            email: email.to_string(),
            display_name,
            email_verified,
        };

        self.ensure_profile_doc(&session).await;

        Ok(session)
    }

    async fn load_profile(&self, session: &Session) -> Result<UserProfile, AuthError> {
        match self.read_profile_doc(session).await? {
            Some(profile) => Ok(profile),
            // Document missing for some reason — fall back to identity data.
            None => Ok(Self::profile_from_session(session)),
        }
    }

    async fn update_profile(
        &self,
        session: &Session,
        name: &str,
        photo_file_name: &str,
    ) -> Result<(), AuthError> {
        self.patch_profile_fields(session, name, photo_file_name)
            .await?;
        // Keep the identity's display name consistent with the document.
        self.set_display_name(&session.id_token, name).await?;
        Ok(())
    }

    async fn delete_account(&self, session: &Session) -> Result<(), AuthError> {
        // Document first, then identity: a failed identity delete leaves a
        // recoverable account; the reverse would strand an orphan document.
        self.delete_profile_doc(session).await?;
        self.identity_call("delete", json!({ "idToken": session.id_token }))
            .await?;
        Ok(())
    }

    async fn resend_verification(&self, session: &Session) -> Result<(), AuthError> {
        self.send_verification(&session.id_token).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        Session {
            account_id: "uid-123".into(),
            id_token: "token".into(),
            email: "a@b.c".into(),
            display_name: Some("Ada".into()),
            email_verified: true,
        }
    }

    // ---- document wire format ---

    #[test]
    fn profile_doc_round_trip() {
        let profile = UserProfile {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            photo_file_name: "ada.jpg".into(),
        };
        let doc = profile_to_doc(&profile);
        assert_eq!(profile_from_doc(&doc), profile);
    }

    #[test]
    fn profile_from_doc_tolerates_missing_fields() {
        let doc = serde_json::json!({
            "fields": { "email": { "stringValue": "x@y.z" } }
        });
        let profile = profile_from_doc(&doc);
        assert_eq!(profile.email, "x@y.z");
        assert!(profile.name.is_empty());
        assert!(profile.photo_file_name.is_empty());
    }

    // ---- URL builders ---

    #[test]
    fn identity_url_includes_operation_and_key() {
        let mut config = AccountConfig::default();
        config.api_key = "KEY".into();
        let svc = RestAccountService::from_config(&config);
        assert_eq!(
            svc.identity_url("signUp"),
            format!("{}/accounts:signUp?key=KEY", config.identity_url)
        );
    }

    #[test]
    fn profile_doc_url_is_keyed_by_account_id() {
        let mut config = AccountConfig::default();
        config.project_id = "snaplearn-dev".into();
        let svc = RestAccountService::from_config(&config);
        assert_eq!(
            svc.profile_doc_url("uid-123"),
            format!(
                "{}/projects/snaplearn-dev/databases/(default)/documents/users/uid-123",
                config.firestore_url
            )
        );
    }

    // ---- identity fallback profile ---

    #[test]
    fn fallback_profile_uses_display_name() {
        let profile = RestAccountService::profile_from_session(&test_session());
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.email, "a@b.c");
        assert!(profile.photo_file_name.is_empty());
    }

    #[test]
    fn fallback_profile_defaults_to_learner() {
        let mut session = test_session();
        session.display_name = None;
        let profile = RestAccountService::profile_from_session(&session);
        assert_eq!(profile.name, "Learner");
    }

    #[test]
    fn service_is_object_safe() {
        let config = AccountConfig::default();
        let _: Box<dyn AccountService> = Box::new(RestAccountService::from_config(&config));
    }
}
