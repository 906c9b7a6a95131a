//! HS256 JSON Web Token issuing and verification.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::{AppError, TokenRequest, TokenResponse};

/// Token signing settings
#[derive(Debug)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub issuer: String,
    pub expires_in: Duration,
}

impl JwtConfig {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            issuer: "mkd-duck-ai".to_string(),
            expires_in: Duration::from_secs(3600),
        }
    }
}

/// The single client allowed to exchange credentials for a token.
#[derive(Debug)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
        }
    }

    /// Compares via SHA-256 digests so the check takes the same time
    /// regardless of where the inputs differ.
    pub fn matches(&self, client_id: &str, client_secret: &str) -> bool {
        let id_ok = digest_eq(self.client_id.as_bytes(), client_id.as_bytes());
        let secret_ok = digest_eq(
            self.client_secret.expose_secret().as_bytes(),
            client_secret.as_bytes(),
        );
        id_ok & secret_ok
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn digest_eq(expected: &[u8], provided: &[u8]) -> bool {
    constant_time_eq(
        Sha256::digest(expected).as_slice(),
        Sha256::digest(provided).as_slice(),
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    expires_in: Duration,
    credentials: Option<ClientCredentials>,
}

impl JwtService {
    #[must_use]
    pub fn new(config: JwtConfig, credentials: Option<ClientCredentials>) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 5;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer,
            expires_in: config.expires_in,
            credentials,
        }
    }

    /// Signs a token for `subject`.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.expires_in.as_secs() as i64,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))?;

        Ok(IssuedToken { token, claims })
    }

    /// Checks signature, expiry and issuer.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Exchanges client credentials for an access token.
    ///
    /// # Errors
    ///
    /// `NotSupported` when no client is configured, `Validation` for
    /// malformed input, `Authentication` for wrong credentials.
    #[instrument(skip(self, request), fields(client_id = %request.client_id))]
    pub fn exchange(&self, request: &TokenRequest) -> Result<TokenResponse, AppError> {
        let Some(credentials) = &self.credentials else {
            return Err(AppError::NotSupported(
                "token issuance requires configured client credentials".to_string(),
            ));
        };

        request.validate()?;

        if !credentials.matches(&request.client_id, &request.client_secret) {
            warn!("Token request rejected: invalid client credentials");
            return Err(AppError::Authentication(
                "invalid client credentials".to_string(),
            ));
        }

        let issued = self.issue(&request.client_id)?;
        info!(jti = %issued.claims.jti, "Issued access token");

        Ok(TokenResponse {
            access_token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: self.expires_in.as_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;

    fn service(credentials: Option<ClientCredentials>) -> JwtService {
        JwtService::new(
            JwtConfig::new(SecretString::from("test-secret-with-enough-entropy")),
            credentials,
        )
    }

    fn admin() -> ClientCredentials {
        ClientCredentials::new("duck-admin", SecretString::from("quack-quack"))
    }

    #[test]
    fn test_issue_and_verify() {
        let jwt = service(None);
        let issued = jwt.issue("duck-admin").unwrap();

        let claims = jwt.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "duck-admin");
        assert_eq!(claims.iss, "mkd-duck-ai");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_verify_rejects_foreign_signature() {
        let issued = service(None).issue("duck-admin").unwrap();
        let other = JwtService::new(JwtConfig::new(SecretString::from("another-secret")), None);

        assert!(matches!(
            other.verify(&issued.token),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_issuer() {
        let mut config = JwtConfig::new(SecretString::from("test-secret-with-enough-entropy"));
        config.issuer = "someone-else".to_string();
        let foreign = JwtService::new(config, None);
        let issued = foreign.issue("duck-admin").unwrap();

        assert!(service(None).verify(&issued.token).is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let jwt = service(None);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "duck-admin".to_string(),
            iss: "mkd-duck-ai".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            jti: "expired".to_string(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret-with-enough-entropy"),
        )
        .unwrap();

        assert!(matches!(jwt.verify(&token), Err(AppError::Authentication(_))));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(service(None).verify("not-a-token").is_err());
    }

    #[test]
    fn test_exchange_success() {
        let jwt = service(Some(admin()));
        let response = jwt
            .exchange(&TokenRequest {
                client_id: "duck-admin".to_string(),
                client_secret: "quack-quack".to_string(),
            })
            .unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);
        assert_eq!(jwt.verify(&response.access_token).unwrap().sub, "duck-admin");
    }

    #[test]
    fn test_exchange_wrong_secret() {
        let jwt = service(Some(admin()));
        let result = jwt.exchange(&TokenRequest {
            client_id: "duck-admin".to_string(),
            client_secret: "honk".to_string(),
        });

        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[test]
    fn test_exchange_invalid_request() {
        let jwt = service(Some(admin()));
        let result = jwt.exchange(&TokenRequest {
            client_id: String::new(),
            client_secret: "quack-quack".to_string(),
        });

        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::Multiple(_)))
        ));
    }

    #[test]
    fn test_exchange_without_credentials_is_not_supported() {
        let result = service(None).exchange(&TokenRequest {
            client_id: "duck-admin".to_string(),
            client_secret: "quack-quack".to_string(),
        });

        assert!(matches!(result, Err(AppError::NotSupported(_))));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
