use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

/// TokenData
///
/// The identity carried inside a bearer token. Only the user id is signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    pub id: i32,
}

/// Claims
///
/// Full JWT payload: the signed identity plus issue and expiry timestamps (unix seconds).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Credentials
///
/// Password hashing and token signing primitives, configured once from `AppConfig`
/// and shared through the application state.
pub struct Credentials {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl_secs: u64,
    salt_rounds: u32,
}

pub type CredentialsState = Arc<Credentials>;

impl Credentials {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.token_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.token_secret.as_bytes()),
            token_ttl_secs: config.token_ttl_secs,
            salt_rounds: config.salt_rounds,
        }
    }

    /// Salted bcrypt hash. Runs on the blocking pool so the request task only suspends.
    pub async fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        let password = password.to_owned();
        let cost = self.salt_rounds;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }

    /// True iff `password` produced `password_hash`. A malformed hash is an error, not a mismatch.
    pub async fn check_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, CredentialError> {
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();
        let same =
            tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash)).await??;
        Ok(same)
    }

    pub fn generate_token(&self, data: TokenData) -> Result<String, CredentialError> {
        let iat = unix_now();
        let claims = Claims {
            id: data.id,
            iat,
            exp: iat + self.token_ttl_secs,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        tracing::debug!(user_id = data.id, "token issued");
        Ok(token)
    }

    /// Signature valid and not expired. Never errors.
    pub fn is_valid_token(&self, token: &str) -> bool {
        self.decode_claims(token).is_ok()
    }

    pub fn extract_data_from_token(&self, token: &str) -> Result<TokenData, CredentialError> {
        let claims = self.decode_claims(token)?;
        Ok(TokenData { id: claims.id })
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // Lifetime is exact; no clock-skew allowance.
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(secret: &str) -> Credentials {
        let config = AppConfig {
            token_secret: secret.to_string(),
            ..AppConfig::default()
        };
        Credentials::new(&config)
    }

    #[tokio::test]
    async fn hash_and_check_roundtrip() {
        let creds = credentials("secret");
        let hash = creds.hash_password("testpassword").await.unwrap();
        assert_ne!(hash, "testpassword");
        assert!(creds.check_password("testpassword", &hash).await.unwrap());
        assert!(!creds.check_password("otherpassword", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn hashing_is_salted() {
        let creds = credentials("secret");
        let first = creds.hash_password("testpassword").await.unwrap();
        let second = creds.hash_password("testpassword").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn check_errors_on_malformed_hash() {
        let creds = credentials("secret");
        assert!(creds.check_password("testpassword", "not-a-hash").await.is_err());
    }

    #[test]
    fn token_roundtrip_preserves_id() {
        let creds = credentials("secret");
        let token = creds.generate_token(TokenData { id: 42 }).unwrap();
        assert!(creds.is_valid_token(&token));
        assert_eq!(
            creds.extract_data_from_token(&token).unwrap(),
            TokenData { id: 42 }
        );
    }

    #[test]
    fn token_expires_after_configured_lifetime() {
        let creds = credentials("secret");
        let token = creds.generate_token(TokenData { id: 1 }).unwrap();
        let claims = creds.decode_claims(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 1800);
    }

    #[test]
    fn token_from_other_key_is_invalid() {
        let token = credentials("one").generate_token(TokenData { id: 1 }).unwrap();
        let other = credentials("two");
        assert!(!other.is_valid_token(&token));
        assert!(other.extract_data_from_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_invalid() {
        let creds = credentials("secret");
        let now = unix_now();
        let claims = Claims {
            id: 1,
            iat: now - 3600,
            exp: now - 1,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(!creds.is_valid_token(&token));
    }

    #[test]
    fn malformed_token_is_invalid() {
        let creds = credentials("secret");
        assert!(!creds.is_valid_token(""));
        assert!(!creds.is_valid_token("abc.def.ghi"));
        assert!(!creds.is_valid_token("not a token"));
    }
}
