use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use chorus_core::UserId;
use serde::Deserialize;

use crate::errors::ServerError;

/// The header carrying the user id, verified by whatever sits in front of the server
pub const USER_HEADER: &str = "x-user-id";

const MAX_USER_ID_LENGTH: usize = 128;

/// The user making a request, trusted as verified upstream
#[derive(Debug, Clone, PartialEq)]
pub struct Identity(pub UserId);

#[derive(Debug, Deserialize)]
struct IdentityQuery {
    user: Option<String>,
}

impl Identity {
    pub fn user_id(&self) -> &str {
        &self.0
    }
}

fn usable(user_id: &str) -> Option<UserId> {
    let user_id = user_id.trim();

    if user_id.is_empty() || user_id.len() > MAX_USER_ID_LENGTH {
        return None;
    }

    Some(user_id.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_header = parts
            .headers
            .get(USER_HEADER)
            .and_then(|x| x.to_str().ok())
            .and_then(usable);

        // Browsers can't set headers on websocket upgrades, so the query is accepted too
        let user_id = from_header.or_else(|| {
            Query::<IdentityQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(query)| query.user)
                .and_then(|user| usable(&user))
        });

        user_id.map(Self).ok_or(ServerError::MissingIdentity)
    }
}

#[cfg(test)]
mod test {
    use axum::{extract::FromRequestParts, http::Request};

    use super::Identity;
    use crate::errors::ServerError;

    async fn identify(request: Request<()>) -> Result<Identity, ServerError> {
        let (mut parts, _) = request.into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_header_then_query() {
        let request = Request::builder()
            .uri("/v1/rooms?user=fallback")
            .header("x-user-id", "alice")
            .body(())
            .unwrap();

        assert_eq!(identify(request).await.unwrap().user_id(), "alice");

        let request = Request::builder()
            .uri("/v1/rooms/den/gateway?user=bob")
            .body(())
            .unwrap();

        assert_eq!(identify(request).await.unwrap().user_id(), "bob");
    }

    #[tokio::test]
    async fn rejects_anonymous_requests() {
        let request = Request::builder()
            .uri("/v1/rooms?user=")
            .header("x-user-id", "  ")
            .body(())
            .unwrap();

        assert!(matches!(
            identify(request).await,
            Err(ServerError::MissingIdentity)
        ));
    }
}
