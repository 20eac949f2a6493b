use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chorus_collab::RoomError;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Room(#[from] RoomError),
    #[error("Request body is invalid: {0}")]
    InvalidBody(String),
    #[error("Requests must identify a user with the x-user-id header or the user query parameter")]
    MissingIdentity,
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Room(error) => match error {
                RoomError::Unauthorized | RoomError::Forbidden => StatusCode::FORBIDDEN,
                RoomError::AuthorityLost | RoomError::RoomExists(_) => StatusCode::CONFLICT,
                RoomError::RoomNotFound(_) => StatusCode::NOT_FOUND,
                RoomError::InvalidPosition | RoomError::InvalidSong => StatusCode::BAD_REQUEST,
                RoomError::Queue(_) => StatusCode::CONFLICT,
            },
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::MissingIdentity => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.as_status_code(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod test {
    use axum::{http::StatusCode, response::IntoResponse};
    use chorus_collab::RoomError;
    use chorus_core::{QueueError, SongId};

    use super::ServerError;

    #[test]
    fn room_errors_map_to_status_codes() {
        let status = |error: RoomError| ServerError::from(error).into_response().status();

        assert_eq!(status(RoomError::Unauthorized), StatusCode::FORBIDDEN);
        assert_eq!(status(RoomError::RoomNotFound("den".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(RoomError::RoomExists("den".into())), StatusCode::CONFLICT);
        assert_eq!(status(RoomError::InvalidSong), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(RoomError::Queue(QueueError::AlreadyQueued(SongId::from_value(1)))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServerError::MissingIdentity.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
