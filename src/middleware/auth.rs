use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::database::Db;
use crate::error::ApiError;

/// Cookie consulted when no Authorization header is present
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Authenticated caller plus the data handle acting on their behalf
#[derive(Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub db: Db,
}

/// Resolves the session from the request credentials and injects it into
/// request extensions. Fails closed with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&headers).ok_or_else(|| {
        tracing::debug!("no session credentials presented");
        ApiError::unauthorized()
    })?;

    let user = state.identity.current_user(&token).await.map_err(|e| {
        tracing::debug!("session rejected: {}", e);
        ApiError::unauthorized()
    })?;

    let db = Db::new(state.store.clone(), user.clone());
    request.extensions_mut().insert(AuthSession { user, db });

    Ok(next.run(request).await)
}

/// Bearer token from the Authorization header, falling back to the access token cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let raw = value.to_str().ok()?;
        let token = raw.strip_prefix("Bearer ").map(str::trim)?;
        return if token.is_empty() { None } else { Some(token.to_string()) };
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_non_bearer_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=abc"));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; access_token=tok123; x=y"));
        assert_eq!(extract_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn missing_credentials() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_token(&headers), None);
    }
}
