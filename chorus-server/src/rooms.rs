use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json,
};
use chorus_collab::{NewRoom, RoomError};
use log::info;

use crate::{
    auth::Identity,
    context::ServerContext,
    errors::ServerResult,
    gateway::gateway,
    schemas::{AuthoritySchema, NewRoomSchema, NewSongSchema, ValidatedJson},
    serialized::{Room, Song, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/rooms",
    tag = "rooms",
    security(
        ("UserId" = [])
    ),
    responses(
        (status = 200, body = Vec<Room>)
    )
)]
pub(crate) async fn list_rooms(
    _identity: Identity,
    State(context): State<ServerContext>,
) -> Json<Vec<Room>> {
    let rooms = context
        .collab
        .rooms
        .list_all()
        .into_iter()
        .map(|r| r.snapshot().to_serialized())
        .collect();

    Json(rooms)
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    params(
        ("id" = String, Path, description = "The room's id")
    ),
    security(
        ("UserId" = [])
    ),
    responses(
        (status = 200, body = Room),
        (status = 404, description = "No such room")
    )
)]
pub(crate) async fn room(
    _identity: Identity,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
) -> ServerResult<Json<Room>> {
    let room = context.collab.rooms.room_by_id(&room_id)?;

    Ok(Json(room.snapshot().to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms",
    tag = "rooms",
    request_body = NewRoomSchema,
    security(
        ("UserId" = [])
    ),
    responses(
        (status = 200, body = Room),
        (status = 409, description = "A room with the id already exists")
    )
)]
pub(crate) async fn create_room(
    identity: Identity,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewRoomSchema>,
) -> ServerResult<Json<Room>> {
    let room = context.collab.rooms.create_room(NewRoom {
        id: body.id,
        authority_id: body.authority_id.unwrap_or(identity.0),
    })?;

    Ok(Json(room.snapshot().to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    params(
        ("id" = String, Path, description = "The room's id")
    ),
    security(
        ("UserId" = [])
    ),
    responses(
        (status = 204, description = "The room was removed"),
        (status = 403, description = "Only the room's authority may remove it")
    )
)]
pub(crate) async fn remove_room(
    identity: Identity,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
) -> ServerResult<StatusCode> {
    let room = context.collab.rooms.room_by_id(&room_id)?;

    if room.authority_id() != identity.user_id() {
        return Err(RoomError::Unauthorized.into());
    }

    context.collab.rooms.remove_room(&room_id)?;

    let closed = context.connections.close_room(room.instance_id());
    info!("Closed {} connection(s) of removed room {}", closed, room_id);

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/v1/rooms/{id}/authority",
    tag = "rooms",
    request_body = AuthoritySchema,
    params(
        ("id" = String, Path, description = "The room's id")
    ),
    security(
        ("UserId" = [])
    ),
    responses(
        (status = 200, body = Room),
        (status = 403, description = "Only the room's authority may hand it over")
    )
)]
pub(crate) async fn assign_authority(
    identity: Identity,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
    ValidatedJson(body): ValidatedJson<AuthoritySchema>,
) -> ServerResult<Json<Room>> {
    context
        .collab
        .rooms
        .assign_authority(&room_id, identity.user_id(), body.user_id)?;

    let room = context.collab.rooms.room_by_id(&room_id)?;
    Ok(Json(room.snapshot().to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/queue",
    tag = "rooms",
    request_body = NewSongSchema,
    params(
        ("id" = String, Path, description = "The room's id")
    ),
    security(
        ("UserId" = [])
    ),
    responses(
        (status = 200, body = Song, description = "The song was added to the queue")
    )
)]
pub(crate) async fn add_to_queue(
    identity: Identity,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
    ValidatedJson(body): ValidatedJson<NewSongSchema>,
) -> ServerResult<Json<Song>> {
    let room = context.collab.rooms.room_by_id(&room_id)?;
    let song = room.enqueue(identity.user_id(), body.into())?;

    info!(
        "{} added {} to the queue of room {}",
        identity.user_id(),
        song.title,
        room_id
    );

    Ok(Json(song.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_rooms).post(create_room))
        .route("/:id", get(room).delete(remove_room))
        .route("/:id/authority", put(assign_authority))
        .route("/:id/queue", post(add_to_queue))
        .route("/:id/gateway", get(gateway))
}
