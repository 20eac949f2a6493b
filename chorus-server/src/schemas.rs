use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use chorus_core::NewSong;
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewRoomSchema {
    /// A random id is generated if omitted
    #[validate(length(min = 1, max = 64))]
    pub id: Option<String>,
    /// Defaults to the user creating the room
    #[validate(length(min = 1, max = 128))]
    pub authority_id: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSongSchema {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1, max = 256))]
    pub artist: String,
    #[validate(length(max = 256))]
    pub album_name: Option<String>,
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    /// Length of the song in seconds
    #[validate(range(exclusive_min = 0.0))]
    pub duration: f32,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AuthoritySchema {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
}

impl From<NewSongSchema> for NewSong {
    fn from(value: NewSongSchema) -> Self {
        Self {
            title: value.title,
            artist: value.artist,
            album_name: value.album_name,
            url: value.url,
            duration: value.duration,
        }
    }
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(extracted) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ServerError::InvalidBody(e.body_text()))?;

        extracted
            .validate()
            .map_err(|e| ServerError::InvalidBody(e.to_string()))?;

        Ok(Self(extracted))
    }
}

#[cfg(test)]
mod test {
    use validator::Validate;

    use super::{NewRoomSchema, NewSongSchema};

    #[test]
    fn song_duration_must_be_positive() {
        let song: NewSongSchema = serde_json::from_str(
            r#"{"title":"Intro","artist":"Band","url":"https://media.invalid/intro.ogg","duration":0}"#,
        )
        .unwrap();

        assert!(song.validate().is_err());

        let song: NewSongSchema = serde_json::from_str(
            r#"{"title":"Intro","artist":"Band","albumName":"Debut","url":"https://media.invalid/intro.ogg","duration":93.5}"#,
        )
        .unwrap();

        assert!(song.validate().is_ok());
    }

    #[test]
    fn room_fields_are_optional() {
        let room: NewRoomSchema = serde_json::from_str("{}").unwrap();

        assert!(room.id.is_none());
        assert!(room.validate().is_ok());

        let room: NewRoomSchema = serde_json::from_str(r#"{"id":""}"#).unwrap();
        assert!(room.validate().is_err());
    }
}
