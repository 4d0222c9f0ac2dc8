use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::server::AppState;
use crate::session::SessionCredentials;

/// Attaches the presented `SessionCredentials` to the request. Nothing is rejected
/// here; each action decides whether it needs a session.
pub async fn session_credentials_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let credentials = extract_credentials(request.headers(), &state.settings.session_cookie);
    request.extensions_mut().insert(credentials);
    next.run(request).await
}

/// Bearer token first, then the session cookie
pub fn extract_credentials(headers: &HeaderMap, cookie_name: &str) -> SessionCredentials {
    bearer_token(headers)
        .or_else(|| cookie_token(headers, cookie_name))
        .map(SessionCredentials::bearer)
        .unwrap_or_default()
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer header-token"),
            (header::COOKIE, "sb-access-token=cookie-token"),
        ]);
        assert_eq!(extract_credentials(&h, "sb-access-token").access_token(), Some("header-token"));
    }

    #[test]
    fn reads_named_cookie() {
        let h = headers(&[(header::COOKIE, "theme=dark; sb-access-token=abc.def; lang=sn")]);
        assert_eq!(extract_credentials(&h, "sb-access-token").access_token(), Some("abc.def"));
        assert_eq!(extract_credentials(&h, "other").access_token(), None);
    }

    #[test]
    fn malformed_headers_mean_anonymous() {
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_credentials(&h, "sb-access-token"), SessionCredentials::anonymous());

        let h = headers(&[(header::AUTHORIZATION, "Bearer   ")]);
        assert_eq!(extract_credentials(&h, "sb-access-token"), SessionCredentials::anonymous());
    }
}
