//! Sign-in, sessions and administrator bootstrap

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::domain::{hash_token, Account, Caller, PasswordHash, Role, Session};
use crate::error::{ErrorCode, MarketError, Result};
use crate::storage::MarketplaceStorage;
use crate::validation::{self, Validate, ValidationErrors};

/// Verified against when the email is unknown, so both failure paths cost
/// the same
static DECOY_HASH: Lazy<PasswordHash> = Lazy::new(|| PasswordHash::create("decoy-password"));

#[derive(Debug, Clone, Deserialize)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

impl Validate for SignInInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("email", validation::email(&self.email));
        errors.check("password", validation::required(&self.password));
        errors.into_result()
    }
}

/// A freshly started session. `token` is the only copy of the clear token;
/// it is returned to the caller and set as the session cookie.
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub caller: Caller,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn invalid_credentials() -> MarketError {
    MarketError::auth(
        ErrorCode::AUTH_INVALID_CREDENTIALS,
        "email or password is incorrect",
    )
}

pub async fn sign_in(
    storage: &dyn MarketplaceStorage,
    auth: &AuthConfig,
    input: &SignInInput,
    now: DateTime<Utc>,
) -> Result<SignedIn> {
    let email = validation::normalize_email(&input.email);
    let Some(account) = storage.accounts().find_by_email(&email).await? else {
        DECOY_HASH.verify(&input.password);
        warn!("Sign-in failed: unknown account");
        return Err(invalid_credentials());
    };

    if !account.password.verify(&input.password) {
        warn!(account_id = %account.id, "Sign-in failed: wrong password");
        return Err(invalid_credentials());
    }

    storage.accounts().touch_sign_in(account.id, now).await?;
    start_session(storage, &account, auth, now).await
}

/// Create and persist a session for an already authenticated account
pub async fn start_session(
    storage: &dyn MarketplaceStorage,
    account: &Account,
    auth: &AuthConfig,
    now: DateTime<Utc>,
) -> Result<SignedIn> {
    let (session, token) = Session::start(account.id, auth.session_ttl_chrono(), now);
    storage.sessions().insert(&session).await?;
    info!(account_id = %account.id, role = %account.role, "Session started");
    Ok(SignedIn {
        caller: account.caller(),
        token,
        expires_at: session.expires_at,
    })
}

/// Idempotent; unknown tokens are ignored
pub async fn sign_out(storage: &dyn MarketplaceStorage, token: &str) -> Result<()> {
    storage.sessions().delete(&hash_token(token)).await?;
    debug!("Session ended");
    Ok(())
}

/// Map a clear session token to its caller. Expired sessions are deleted.
pub async fn resolve_session(
    storage: &dyn MarketplaceStorage,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<Caller>> {
    if token.trim().is_empty() {
        return Ok(None);
    }
    let token_hash = hash_token(token);
    let Some(session) = storage.sessions().find(&token_hash).await? else {
        return Ok(None);
    };
    if session.is_expired(now) {
        storage.sessions().delete(&token_hash).await?;
        debug!(account_id = %session.account_id, "Expired session removed");
        return Ok(None);
    }
    let account = storage.accounts().get(session.account_id).await?;
    Ok(account.map(|a| a.caller()))
}

/// Bootstrap an administrator from the command line
pub async fn create_admin(
    storage: &dyn MarketplaceStorage,
    email: &str,
    password: &str,
    display_name: &str,
    now: DateTime<Utc>,
) -> Result<Account> {
    let mut errors = ValidationErrors::new();
    errors.check("email", validation::email(email));
    errors.check("password", validation::password(password));
    errors.check("display_name", validation::length(display_name, 1, 120));
    errors.into_result()?;

    let account = Account::new(email, Role::Admin, display_name, password, now);
    storage.accounts().insert(&account).await?;
    info!(account_id = %account.id, "Administrator created");
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcErrorCode;
    use crate::services::fixtures::{account, now};
    use crate::storage::MemoryBackend;

    fn input(email: &str, password: &str) -> SignInInput {
        SignInInput {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_and_resolve() {
        let storage = MemoryBackend::new();
        let caller = account(&storage, "ada@example.com", Role::Talent).await;

        let signed_in = sign_in(
            &storage,
            &AuthConfig::default(),
            &input(" Ada@Example.com ", "correct horse battery"),
            now(),
        )
        .await
        .unwrap();
        assert_eq!(signed_in.caller, caller);
        assert_eq!(signed_in.token.len(), 64);

        let resolved = resolve_session(&storage, &signed_in.token, now())
            .await
            .unwrap();
        assert_eq!(resolved, Some(caller.clone()));

        let stored = storage.accounts().get(caller.account_id).await.unwrap().unwrap();
        assert_eq!(stored.last_sign_in_at, Some(now()));
    }

    #[tokio::test]
    async fn test_bad_credentials_look_identical() {
        let storage = MemoryBackend::new();
        account(&storage, "ada@example.com", Role::Talent).await;
        let auth = AuthConfig::default();

        let unknown = sign_in(&storage, &auth, &input("bob@example.com", "whatever1"), now())
            .await
            .unwrap_err();
        let wrong = sign_in(&storage, &auth, &input("ada@example.com", "whatever1"), now())
            .await
            .unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(wrong.rpc_code(), RpcErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let storage = MemoryBackend::new();
        account(&storage, "ada@example.com", Role::Founder).await;
        let auth = AuthConfig::default();
        let signed_in = sign_in(
            &storage,
            &auth,
            &input("ada@example.com", "correct horse battery"),
            now(),
        )
        .await
        .unwrap();

        let later = now() + auth.session_ttl_chrono();
        assert_eq!(resolve_session(&storage, &signed_in.token, later).await.unwrap(), None);
        assert!(storage
            .sessions()
            .find(&hash_token(&signed_in.token))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent() {
        let storage = MemoryBackend::new();
        account(&storage, "ada@example.com", Role::Admin).await;
        let signed_in = sign_in(
            &storage,
            &AuthConfig::default(),
            &input("ada@example.com", "correct horse battery"),
            now(),
        )
        .await
        .unwrap();

        sign_out(&storage, &signed_in.token).await.unwrap();
        sign_out(&storage, &signed_in.token).await.unwrap();
        assert_eq!(resolve_session(&storage, &signed_in.token, now()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_admin_validates_and_rejects_duplicates() {
        let storage = MemoryBackend::new();
        let err = create_admin(&storage, "not-an-email", "short", "", now())
            .await
            .unwrap_err();
        assert_eq!(err.issues().len(), 3);

        create_admin(&storage, "root@example.com", "longenough", "Root", now())
            .await
            .unwrap();
        let err = create_admin(&storage, "ROOT@example.com", "longenough", "Root", now())
            .await
            .unwrap_err();
        assert_eq!(err.rpc_code(), RpcErrorCode::Conflict);
    }
}
