use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOKEN_LENGTH: usize = 48;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
pub enum TokenKind {
    EmailVerification,
    PasswordReset,
}

impl TokenKind {
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenKind::EmailVerification => Duration::hours(24),
            TokenKind::PasswordReset => Duration::hours(1),
        }
    }
}

/// A one-time token sent by email. Only the SHA-256 of the token is stored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccountToken {
    pub id: String,
    pub user_id: String,
    pub kind: TokenKind,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl AccountToken {
    /// Returns the stored record and the plain token to send to the user.
    pub fn issue(user_id: &str, kind: TokenKind, now: DateTime<Utc>) -> (Self, String) {
        let plain = generate_token();
        let token = AccountToken {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            token_hash: hash_token(&plain),
            expires_at: now + kind.lifetime(),
            created_at: now,
            used_at: None,
        };
        (token, plain)
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }
}

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
