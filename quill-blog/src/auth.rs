use std::sync::LazyLock;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::Response,
};
use quill_orm::{ModelExt, OrmResult, Pool};
use hmac::{Hmac, Mac};
use regex::Regex;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::Db;
use crate::error::{ApiError, ApiResult};
use crate::models::{User, now};
use crate::state::AppState;

pub static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9\.\-\_]+\@[a-z0-9\-\_]+(\.[a-z0-9\-\_]+){1,4}$").unwrap()
});

/// Clients send passwords pre-hashed as `sha1("<email>:<password>")`.
pub static SHA1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").unwrap());

type HmacSha256 = Hmac<Sha256>;

fn sha256_hex(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

/// Hex HMAC-SHA256 over `"<uid>-<passwd>-<expires>"` keyed by the session secret.
fn session_signature(
    uid: &str,
    passwd: &str,
    expires: u64,
    secret: &str,
) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(format!("{uid}-{passwd}-{expires}").as_bytes());
    Ok(format!("{:x}", mac.finalize().into_bytes()))
}

/// Stored form of a password.
pub fn hash_password(uid: &str, passwd: &str) -> String {
    sha256_hex(&format!("{uid}:{passwd}"))
}

/// Signed session cookie value: `"<uid>-<expires>-<signature>"`.
pub fn user_to_cookie(user: &User, max_age: u64, secret: &str, now: f64) -> ApiResult<String> {
    let uid = user.id.as_deref().unwrap_or_default();
    let expires = now as u64 + max_age;
    let signature = session_signature(uid, &user.passwd, expires, secret)
        .map_err(|err| ApiError::Internal(format!("session signing failed: {err}")))?;
    Ok(format!("{uid}-{expires}-{signature}"))
}

/// Resolves a session cookie to its user, with the password masked.
///
/// Malformed, expired or forged cookies and unknown users all yield `None`;
/// only database failures are errors.
pub async fn cookie_to_user(
    pool: &Pool<Db>,
    cookie: &str,
    secret: &str,
    now: f64,
) -> OrmResult<Option<User>> {
    let mut parts = cookie.split('-');
    let (Some(uid), Some(expires), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Ok(None);
    };
    let Ok(expires) = expires.parse::<u64>() else {
        return Ok(None);
    };
    if (expires as f64) < now {
        return Ok(None);
    }

    let Some(user) = User::find(pool, uid).await? else {
        return Ok(None);
    };
    let Ok(expected) = session_signature(uid, &user.passwd, expires, secret) else {
        return Ok(None);
    };
    if !bool::from(signature.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::info!(uid, "invalid session signature");
        return Ok(None);
    }
    Ok(Some(user.masked()))
}

/// The signed-in user for the current request, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn require_user(&self) -> ApiResult<&User> {
        self.0.as_ref().ok_or_else(ApiError::forbidden)
    }

    pub fn require_admin(&self) -> ApiResult<&User> {
        match &self.0 {
            Some(user) if user.admin => Ok(user),
            _ => Err(ApiError::forbidden()),
        }
    }
}

fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
}

/// Attaches a [`CurrentUser`] extension to every request.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut current = CurrentUser::default();
    if let Some(cookie) = session_cookie(request.headers(), &state.session.cookie_name) {
        match cookie_to_user(state.pool(), &cookie, &state.session.secret, now()).await {
            Ok(user) => current.0 = user,
            Err(err) => tracing::warn!(error = %err, "failed to resolve session cookie"),
        }
    }
    if let Some(user) = &current.0 {
        tracing::debug!(email = %user.email, "set current user");
    }
    request.extensions_mut().insert(current);
    next.run(request).await
}
