use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use chorus_collab::{Room, RoomConnectionHandle, RoomConnectionId};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};

use crate::{
    auth::Identity,
    context::ServerContext,
    errors::ServerResult,
    messages::{parse_command, ServerEvent},
};

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}/gateway",
    tag = "rooms",
    params(
        ("id" = String, Path, description = "The room's id")
    ),
    security(
        ("UserId" = [])
    ),
    responses(
        (status = 101, description = "Upgrades to a websocket exchanging room events"),
        (status = 404, description = "No such room")
    )
)]
pub(crate) async fn gateway(
    identity: Identity,
    State(context): State<ServerContext>,
    Path(room_id): Path<String>,
    upgrade: WebSocketUpgrade,
) -> ServerResult<Response> {
    let room = context.collab.rooms.room_by_id(&room_id)?;

    Ok(upgrade.on_upgrade(move |socket| run_connection(socket, context, room, identity)))
}

async fn run_connection(
    socket: WebSocket,
    context: ServerContext,
    room: Arc<Room>,
    identity: Identity,
) {
    let connection_id = RoomConnectionId::new();

    // Register before joining, so the join's room state reaches the socket
    let (guard, mut events) = context
        .connections
        .register(connection_id, room.instance_id(), identity.user_id());
    let handle = room.connect(connection_id, identity.user_id());

    info!(
        "{} connected to room {} ({})",
        identity.user_id(),
        room.id(),
        connection_id
    );

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => handle_text(&context, &handle, &text),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    debug!("Socket of connection {} failed: {}", connection_id, error);
                    break;
                }
            },
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };

                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(error) => {
                        warn!("Failed to serialize event for connection {}: {}", connection_id, error);
                        continue;
                    }
                };

                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    }

    // Leave the room first, so departure events still have somewhere to go
    drop(handle);
    drop(guard);

    info!(
        "{} disconnected from room {} ({})",
        identity.user_id(),
        room.id(),
        connection_id
    );
}

fn handle_text(context: &ServerContext, handle: &RoomConnectionHandle, text: &str) {
    let connection_id = handle.connection().id;

    let command = match parse_command(text) {
        Ok(command) => command,
        Err(error) => {
            debug!("Bad frame from connection {}: {}", connection_id, error);
            context
                .connections
                .send_to(connection_id, ServerEvent::error(error));
            return;
        }
    };

    if let Err(error) = handle.dispatch(command) {
        context
            .connections
            .send_to(connection_id, ServerEvent::error(error));
    }
}
