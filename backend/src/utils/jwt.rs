//! JWT token utilities for the identity cookie.
//!
//! The cookie issued at sign-in carries a signed HS256 token naming the user;
//! every request that needs the current user decodes and validates it here.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Claims carried in the identity cookie.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Username of the signed-in user
    pub sub: String,
    /// Database id of the signed-in user
    pub user_id: i64,
    /// Whether the token was issued for a persistent ("remember me") cookie
    pub persistent: bool,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

/// JWT token utility for creating and validating tokens
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtUtils {
    /// Create a new JwtUtils instance from the configured signing secret
    pub fn new(secret: &str) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        JwtUtils {
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Generate a token for the given user valid for `expires_in_seconds`
    pub fn generate_token(
        &self,
        user_id: i64,
        username: String,
        persistent: bool,
        expires_in_seconds: u64,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in_seconds as i64);

        let claims = Claims {
            sub: username,
            user_id,
            persistent,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| ServiceError::authentication(format!("Token validation failed: {}", e)))
    }
}

impl Claims {
    pub fn username(&self) -> &str {
        &self.sub
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_carries_user() {
        let jwt = JwtUtils::new("secret");
        let token = jwt.generate_token(7, "alice".to_string(), true, 60).unwrap();

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.username(), "alice");
        assert_eq!(claims.user_id(), 7);
        assert!(claims.persistent);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = JwtUtils::new("secret")
            .generate_token(7, "alice".to_string(), false, 60)
            .unwrap();

        let result = JwtUtils::new("other-secret").validate_token(&token);
        assert!(matches!(result, Err(ServiceError::Authentication { .. })));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = JwtUtils::new("secret");
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "alice".to_string(),
            user_id: 7,
            persistent: false,
            exp: now - 120,
            iat: now - 240,
        };
        let token = encode(&Header::default(), &claims, &jwt.encoding_key).unwrap();

        assert!(jwt.validate_token(&token).is_err());
    }
}
