use axum::http::{HeaderMap, header};

const SCHEME: &str = "bearer";

/// Token from the `authorization` header, if it carries a bearer credential.
pub fn extract(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    parse(value)
}

/// `bearer <token>`, scheme matched case-insensitively, whitespace after it optional.
pub fn parse(value: &str) -> Option<&str> {
    let (scheme, rest) = value.split_at_checked(SCHEME.len())?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return None;
    }

    let token = rest.trim_start();
    (!token.is_empty()).then_some(token)
}
