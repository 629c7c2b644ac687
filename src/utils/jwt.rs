use std::collections::HashSet;

use jsonwebtoken::{
    decode, encode, errors::Error, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::routes::auth::claims::Claims;

/// Minimum acceptable size for the signing secret in bytes.
pub const MIN_TOKEN_SECRET_LENGTH: usize = 32;
/// Minimum number of unique bytes expected to avoid trivially guessable values.
const MIN_UNIQUE_SECRET_BYTES: usize = 8;

// NOT suitable for production. Used only when TOKEN_SECRET is absent so that
// local development works out of the box; deployments must set TOKEN_SECRET.
const DEV_TOKEN_SECRET: &str = "prepdeck-development-secret-change-me-0123456789";

#[derive(Debug, Error)]
pub enum TokenSecretError {
    #[error("TOKEN_SECRET must be at least {required} bytes, but {actual} bytes were provided")]
    TooShort { actual: usize, required: usize },
    #[error(
        "TOKEN_SECRET must contain sufficient entropy (at least {required} unique bytes); only {actual} unique bytes found"
    )]
    LowEntropy { actual: usize, required: usize },
}

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

impl TokenKeys {
    pub fn from_config(config: &Config) -> Result<Self, TokenSecretError> {
        match &config.token_secret {
            Some(secret) => Self::from_secret(secret),
            None => {
                warn!("TOKEN_SECRET not set, falling back to the built-in development secret");
                Self::from_secret(DEV_TOKEN_SECRET)
            }
        }
    }

    pub fn from_secret(secret: impl AsRef<[u8]>) -> Result<Self, TokenSecretError> {
        let bytes = secret.as_ref();
        validate_secret(bytes)?;

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        })
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

fn validate_secret(secret: &[u8]) -> Result<(), TokenSecretError> {
    if secret.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(TokenSecretError::TooShort {
            actual: secret.len(),
            required: MIN_TOKEN_SECRET_LENGTH,
        });
    }

    let unique = secret.iter().copied().collect::<HashSet<_>>().len();
    if unique < MIN_UNIQUE_SECRET_BYTES {
        return Err(TokenSecretError::LowEntropy {
            actual: unique,
            required: MIN_UNIQUE_SECRET_BYTES,
        });
    }

    Ok(())
}

pub fn create_token(claims: &Claims, keys: &TokenKeys) -> Result<String, Error> {
    encode(&Header::default(), claims, keys.encoding_key())
}

/// Checks signature and expiry, returning the embedded payload on success.
/// An invalid token (malformed, tampered, expired) is an expected condition,
/// not a fault: the reason is logged at debug level and `None` comes back.
pub fn verify_token(token: &str, keys: &TokenKeys) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.required_spec_claims.insert("exp".to_string());

    match decode::<Claims>(token, keys.decoding_key(), &validation) {
        Ok(data) => Some(data.claims),
        Err(error) => {
            debug!(reason = ?error.kind(), "Rejected identity token");
            None
        }
    }
}
