//! Bearer authentication: HS256 JWTs, argon2 password hashes and the
//! middleware that guards admin routes.
//!
//! Access tokens are short-lived; refresh tokens carry the same claims with
//! `kind = "refresh"` and are only accepted by `POST /refresh`.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use portfolio_core::config::AuthConfig;

use crate::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed token")]
    Malformed,
    #[error("bad signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("wrong token kind")]
    WrongKind,
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: i64,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
    pub kind: TokenKind,
    /// Random nonce so two tokens issued in the same second differ.
    pub jti: String,
}

/// The caller, as established by [`require_auth`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Signs and verifies tokens with a shared secret.
pub struct JwtKeys {
    secret: Vec<u8>,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

fn generate_nonce() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    hex::encode(bytes)
}

impl JwtKeys {
    pub fn new(secret: &str, access_minutes: i64, refresh_days: i64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            access_ttl_secs: access_minutes * 60,
            refresh_ttl_secs: refresh_days * 86_400,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.access_token_minutes,
            config.refresh_token_days,
        )
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::BadSignature)
    }

    /// Issue a token of `kind` for a user, valid from `now`.
    pub fn issue_at(
        &self,
        user_id: i64,
        username: &str,
        kind: TokenKind,
        now: i64,
    ) -> Result<String, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            user_id,
            username: username.to_string(),
            exp: now + ttl,
            iat: now,
            kind,
            jti: generate_nonce(),
        };
        let payload = serde_json::to_vec(&claims).map_err(|_| AuthError::Malformed)?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(JWT_HEADER),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{}.{}", signing_input, signature))
    }

    /// Access and refresh tokens for a freshly authenticated user.
    pub fn issue_pair(&self, user_id: i64, username: &str) -> Result<TokenPair, AuthError> {
        let now = chrono::Utc::now().timestamp();
        Ok(TokenPair {
            token: self.issue_at(user_id, username, TokenKind::Access, now)?,
            refresh_token: self.issue_at(user_id, username, TokenKind::Refresh, now)?,
        })
    }

    /// Check signature, expiry and kind as of `now`.
    pub fn verify_at(&self, token: &str, expected: TokenKind, now: i64) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Malformed);
        };

        let header_json = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|_| AuthError::Malformed)?;
        let header_value: serde_json::Value =
            serde_json::from_slice(&header_json).map_err(|_| AuthError::Malformed)?;
        if header_value.get("alg").and_then(|a| a.as_str()) != Some("HS256") {
            return Err(AuthError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Malformed)?;
        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }
        if claims.kind != expected {
            return Err(AuthError::WrongKind);
        }
        Ok(claims)
    }

    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        self.verify_at(token, expected, chrono::Utc::now().timestamp())
    }
}

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Compare a password against a stored PHC string.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Token from `Authorization: Bearer <t>`, else from `?token=`.
fn extract_token(req: &Request) -> Option<String> {
    if let Some(value) = req.headers().get(axum::http::header::AUTHORIZATION) {
        if let Some(token) = value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    req.uri()
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Middleware for admin routes.
///
/// On success the request carries an [`AuthUser`] extension.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = extract_token(&req) else {
        return ApiError::Unauthorized("Token is required".into()).into_response();
    };

    match state.jwt.verify(&token, TokenKind::Access) {
        Ok(claims) => {
            req.extensions_mut().insert(AuthUser {
                id: claims.user_id,
                username: claims.username,
            });
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized("Invalid token".into()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret", 60, 7)
    }

    #[test]
    fn test_issue_and_verify_access() {
        let keys = keys();
        let token = keys.issue_at(7, "admin", TokenKind::Access, 1_000).unwrap();
        let claims = keys.verify_at(&token, TokenKind::Access, 1_001).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.exp, 1_000 + 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys();
        let token = keys.issue_at(1, "a", TokenKind::Access, 1_000).unwrap();
        assert_eq!(
            keys.verify_at(&token, TokenKind::Access, 1_000 + 3600),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let keys = keys();
        let token = keys.issue_at(1, "a", TokenKind::Refresh, 1_000).unwrap();
        assert_eq!(
            keys.verify_at(&token, TokenKind::Access, 1_001),
            Err(AuthError::WrongKind)
        );
        let claims = keys.verify_at(&token, TokenKind::Refresh, 1_000 + 6 * 86_400).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_tampered_or_foreign_token_rejected() {
        let keys = keys();
        let token = keys.issue_at(1, "a", TokenKind::Access, 1_000).unwrap();

        let other = JwtKeys::new("other-secret", 60, 7);
        assert_eq!(
            other.verify_at(&token, TokenKind::Access, 1_001),
            Err(AuthError::BadSignature)
        );

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(r#"{"sub":"2","user_id":2}"#);
        parts[1] = &forged;
        assert!(keys.verify_at(&parts.join("."), TokenKind::Access, 1_001).is_err());

        assert_eq!(keys.verify_at("abc", TokenKind::Access, 0), Err(AuthError::Malformed));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }

    #[test]
    fn test_extract_token_sources() {
        let req = Request::builder()
            .uri("/x")
            .header("authorization", "Bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&req).as_deref(), Some("abc.def.ghi"));

        let req = Request::builder()
            .uri("/api/blogs/stream?foo=1&token=t0k")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&req).as_deref(), Some("t0k"));

        let req = Request::builder().uri("/x").body(Body::empty()).unwrap();
        assert_eq!(extract_token(&req), None);
    }
}
