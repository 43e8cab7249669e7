//! Double-submit CSRF tokens for the HTML forms.
//!
//! A page with a form hands out a random token in the `csrf_token` cookie and
//! repeats it in a hidden `_csrf` field. A form post is accepted only when both
//! are present and equal; another origin can make the browser send the cookie
//! but cannot read it to fill in the field.

use crate::error::AppError;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

pub const CSRF_COOKIE: &str = "csrf_token";

/// Returns the token already held by the client, or a fresh one together with
/// the cookie that carries it.
pub fn issue(jar: CookieJar) -> (CookieJar, String) {
    if let Some(token) = jar.get(CSRF_COOKIE).map(|c| c.value().to_string()) {
        if !token.is_empty() {
            return (jar, token);
        }
    }

    let token = Uuid::new_v4().simple().to_string();
    let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build();
    (jar.add(cookie), token)
}

/// Checks a submitted form token against the cookie.
pub fn verify(jar: &CookieJar, submitted: Option<&str>) -> Result<(), AppError> {
    let expected = jar.get(CSRF_COOKIE).map(Cookie::value);
    match (expected, submitted) {
        (Some(expected), Some(submitted)) if !expected.is_empty() && expected == submitted => {
            Ok(())
        }
        _ => {
            tracing::warn!(
                has_cookie = expected.is_some(),
                has_field = submitted.is_some(),
                "Form post rejected: CSRF token missing or mismatched."
            );
            Err(AppError::Csrf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderMap, HeaderValue};

    fn jar_with(token: &'static str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(token));
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn fresh_clients_get_a_new_token() {
        let (jar, token) = issue(CookieJar::new());

        assert_eq!(token.len(), 32);
        assert_eq!(jar.get(CSRF_COOKIE).map(Cookie::value), Some(token.as_str()));
    }

    #[test]
    fn existing_token_is_reused() {
        let (_, token) = issue(jar_with("csrf_token=abc123"));
        assert_eq!(token, "abc123");
    }

    #[test]
    fn matching_token_passes() {
        assert!(verify(&jar_with("csrf_token=abc123"), Some("abc123")).is_ok());
    }

    #[test]
    fn missing_or_mismatched_tokens_fail() {
        let jar = jar_with("csrf_token=abc123");
        assert!(matches!(verify(&jar, None), Err(AppError::Csrf)));
        assert!(matches!(verify(&jar, Some("other")), Err(AppError::Csrf)));
        assert!(matches!(
            verify(&CookieJar::new(), Some("abc123")),
            Err(AppError::Csrf)
        ));
    }
}
