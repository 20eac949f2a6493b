use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    auth::USER_HEADER,
    gateway, rooms,
    schemas::{AuthoritySchema, NewRoomSchema, NewSongSchema},
    serialized::{PlaybackState, QueuedSong, Room, Song},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        rooms::list_rooms,
        rooms::room,
        rooms::create_room,
        rooms::remove_room,
        rooms::assign_authority,
        rooms::add_to_queue,
        gateway::gateway,
    ),
    components(schemas(
        Room,
        Song,
        QueuedSong,
        PlaybackState,
        NewRoomSchema,
        NewSongSchema,
        AuthoritySchema
    )),
    modifiers(&Security),
    info(description = "chorus-server exposes rooms with synchronized playback and a voted queue")
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let scheme = ApiKey::Header(ApiKeyValue::new(USER_HEADER));
            components.add_security_scheme("UserId", SecurityScheme::ApiKey(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod test {
    use utoipa::OpenApi;

    use super::ApiDoc;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();

        for path in [
            "/v1/rooms",
            "/v1/rooms/{id}",
            "/v1/rooms/{id}/authority",
            "/v1/rooms/{id}/queue",
            "/v1/rooms/{id}/gateway",
        ] {
            assert!(paths.contains(&path.to_string()), "{path} is undocumented");
        }
    }
}
