//! Accounts, credentials and sessions

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::Role;

const HASH_ROUNDS: u32 = 10_000;
const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub display_name: String,
    pub password: PasswordHash,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(
        email: &str,
        role: Role,
        display_name: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: crate::validation::normalize_email(email),
            role,
            display_name: display_name.trim().to_string(),
            password: PasswordHash::create(password),
            created_at: now,
            last_sign_in_at: None,
        }
    }

    /// The caller identity derived from this account
    pub fn caller(&self) -> Caller {
        Caller {
            account_id: self.id,
            email: self.email.clone(),
            role: self.role,
            display_name: self.display_name.clone(),
        }
    }
}

/// Authenticated identity attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub account_id: Uuid,
    pub email: String,
    pub role: Role,
    pub display_name: String,
}

/// Salted, iterated SHA-256 password digest, both parts hex encoded
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash {
    pub salt: String,
    pub digest: String,
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHash").finish_non_exhaustive()
    }
}

impl PasswordHash {
    pub fn create(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        Self {
            salt: hex::encode(salt),
            digest: hex::encode(stretch(&salt, password)),
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        let (Ok(salt), Ok(expected)) = (hex::decode(&self.salt), hex::decode(&self.digest)) else {
            return false;
        };
        bool::from(stretch(&salt, password).as_slice().ct_eq(&expected))
    }
}

fn stretch(salt: &[u8], password: &str) -> [u8; 32] {
    let mut digest: [u8; 32] = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize()
        .into();
    for _ in 1..HASH_ROUNDS {
        digest = Sha256::new()
            .chain_update(salt)
            .chain_update(digest)
            .finalize()
            .into();
    }
    digest
}

/// `now + ttl`, saturating at the latest representable instant
pub fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Random opaque token, hex encoded. Used for sessions and invites.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Tokens are only ever stored as this digest
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.trim().as_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token_hash: String,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a session; the clear token is returned alongside and never stored
    pub fn start(account_id: Uuid, ttl: Duration, now: DateTime<Utc>) -> (Self, String) {
        let token = generate_token();
        let session = Self {
            token_hash: hash_token(&token),
            account_id,
            created_at: now,
            expires_at: expiry(now, ttl),
        };
        (session, token)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_verify() {
        let hash = PasswordHash::create("correct horse battery");
        assert!(hash.verify("correct horse battery"));
        assert!(!hash.verify("correct horse battery "));
        assert!(!hash.verify(""));
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let a = PasswordHash::create("same password");
        let b = PasswordHash::create("same password");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.digest, b.digest);
    }

    #[test]
    fn test_corrupt_hash_never_verifies() {
        let hash = PasswordHash {
            salt: "zz".to_string(),
            digest: "not-hex".to_string(),
        };
        assert!(!hash.verify("anything"));
    }

    #[test]
    fn test_debug_does_not_leak_digest() {
        let hash = PasswordHash::create("secret-password");
        assert!(!format!("{:?}", hash).contains(&hash.digest));
    }

    #[test]
    fn test_token_shape_and_hash() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(generate_token(), token);
        assert_eq!(hash_token(&token), hash_token(&format!(" {token}\n")));
        assert_ne!(hash_token(&token), token);
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let (session, token) = Session::start(Uuid::new_v4(), Duration::hours(1), now);
        assert_eq!(session.token_hash, hash_token(&token));
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::hours(1)));
    }

    #[test]
    fn test_session_expiry_saturates_on_huge_ttl() {
        let now = Utc::now();
        let (session, _) = Session::start(Uuid::new_v4(), Duration::days(365 * 300_000), now);
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!session.is_expired(now));
    }

    #[test]
    fn test_account_normalizes_email() {
        let account = Account::new(
            "  Ada@Example.COM ",
            Role::Talent,
            " Ada ",
            "password123",
            Utc::now(),
        );
        assert_eq!(account.email, "ada@example.com");
        assert_eq!(account.display_name, "Ada");
        assert_eq!(account.caller().role, Role::Talent);
    }
}
