use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::error::ApiError;

/// Header the upstream authentication layer fills with the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The acting user of an authenticated route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id_from_headers(&parts.headers)
            .map(|id| AuthUser { id })
            .ok_or(ApiError::Unauthorized)
    }
}

fn user_id_from_headers(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};

    use super::{user_id_from_headers, USER_ID_HEADER};

    #[test]
    fn reads_positive_numeric_ids_only() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id_from_headers(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" 42 "));
        assert_eq!(user_id_from_headers(&headers), Some(42));

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("admin"));
        assert_eq!(user_id_from_headers(&headers), None);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("0"));
        assert_eq!(user_id_from_headers(&headers), None);
    }
}
