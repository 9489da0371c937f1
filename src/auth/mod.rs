//! Cookie-carried JWT session authentication.
//!
//! Tokens are HS256-signed, stateless and carry the user's email plus an absolute
//! expiry. The middleware rejects a missing cookie with 401 and a bad token with 403.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Environment;
use crate::errors::AppError;
use crate::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// Claim names owned by the issuer.
const RESERVED_CLAIMS: &[&str] = &["email", "iat", "exp"];

/// Body of `POST /jwt`: an email plus any extra fields to embed.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Signs and verifies session tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Sign a token embedding the request payload.
    pub fn issue(&self, request: TokenRequest) -> Result<String, AppError> {
        let now = Utc::now();
        let mut extra = request.extra;
        for claim in RESERVED_CLAIMS {
            extra.remove(*claim);
        }

        let claims = SessionClaims {
            email: request.email,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            extra,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        decode::<SessionClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| AppError::Forbidden(format!("Invalid session token: {}", e)))
    }
}

/// The authenticated user, attached to the request by [`require_session`].
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub email: String,
}

impl SessionUser {
    /// Reject access to another user's resources.
    pub fn ensure_owner(&self, email: &str) -> Result<(), AppError> {
        if self.email == email {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "{} may not access resources of {}",
                self.email, email
            )))
        }
    }
}

/// Session middleware for protected routes.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.verify(&token)?;

    request.extensions_mut().insert(SessionUser {
        email: claims.email,
    });

    Ok(next.run(request).await)
}

/// Build the session cookie carrying `token`.
pub fn session_cookie(token: String, environment: Environment) -> Cookie<'static> {
    with_environment_flags(Cookie::new(SESSION_COOKIE, token), environment)
}

/// Expired cookie with the session cookie's attributes; the browser drops the session.
pub fn cleared_session_cookie(environment: Environment) -> Cookie<'static> {
    let mut cookie = with_environment_flags(Cookie::new(SESSION_COOKIE, ""), environment);
    cookie.make_removal();
    cookie
}

fn with_environment_flags(mut cookie: Cookie<'static>, environment: Environment) -> Cookie<'static> {
    cookie.set_http_only(true);
    cookie.set_path("/");
    if environment.is_production() {
        cookie.set_secure(true);
        cookie.set_same_site(SameSite::None);
    } else {
        cookie.set_secure(false);
        cookie.set_same_site(SameSite::Strict);
    }
    cookie
}
