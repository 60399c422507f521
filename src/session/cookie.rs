//! `Set-Cookie` values for the admin session and lookup in `Cookie` headers.

use chrono::Duration;

/// Session cookie: http-only, strict same-site, whole-site path, expiring
/// with the token. `Secure` is added in production.
pub fn session_cookie(name: &str, token: &str, max_age: Duration, secure: bool) -> String {
    let max_age_secs = max_age.num_seconds().max(0);
    let mut cookie =
        format!("{name}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Overwrites the session cookie with an empty, already-expired one.
pub fn removal_cookie(name: &str, secure: bool) -> String {
    let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Finds `name` in a raw `Cookie` request header.
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
