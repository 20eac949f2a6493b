use std::sync::{Arc, Weak};

use chorus_collab::{Envelope, Recipients, RoomConnectionId, RoomInstanceId, Transport};
use chorus_core::UserId;
use log::debug;
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::messages::ServerEvent;

/// Manages gateway connections, and routes room events to their sockets
pub struct Connections {
    me: Weak<Self>,
    connections: Mutex<Vec<Connection>>,
}

struct Connection {
    id: RoomConnectionId,
    /// Routing is keyed on the instance, so a reused room id never reaches old sockets
    room: RoomInstanceId,
    user_id: UserId,
    sender: UnboundedSender<ServerEvent>,
}

/// Removes its connection from [Connections] when dropped
pub struct ConnectionGuard {
    id: RoomConnectionId,
    manager: Weak<Connections>,
}

impl Connections {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            connections: Default::default(),
        })
    }

    /// Registers a socket. Events for the connection arrive on the returned receiver.
    pub fn register(
        &self,
        id: RoomConnectionId,
        room: RoomInstanceId,
        user_id: impl Into<UserId>,
    ) -> (ConnectionGuard, UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = unbounded_channel();

        self.connections.lock().push(Connection {
            id,
            room,
            user_id: user_id.into(),
            sender,
        });

        let guard = ConnectionGuard {
            id,
            manager: self.me.clone(),
        };

        (guard, receiver)
    }

    /// Sends an event to a single connection, outside of any room
    pub fn send_to(&self, id: RoomConnectionId, event: ServerEvent) {
        let connections = self.connections.lock();

        if let Some(connection) = connections.iter().find(|c| c.id == id) {
            let _ = connection.sender.send(event);
        }
    }

    /// Drops every connection of a room. Their sockets see the event stream end and close.
    pub fn close_room(&self, room: RoomInstanceId) -> usize {
        let mut connections = self.connections.lock();
        let before = connections.len();

        connections.retain(|c| c.room != room);
        before - connections.len()
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unregister(&self, id: RoomConnectionId) {
        self.connections.lock().retain(|c| c.id != id)
    }
}

impl Connection {
    fn receives(&self, room: RoomInstanceId, recipients: &Recipients) -> bool {
        if self.room != room {
            return false;
        }

        match recipients {
            Recipients::All => true,
            Recipients::User(user_id) => &self.user_id == user_id,
            Recipients::Connection(id) => &self.id == id,
        }
    }
}

impl Transport for Connections {
    fn deliver(&self, envelope: Envelope) {
        let Envelope {
            room_id,
            instance_id,
            recipients,
            event,
        } = envelope;

        let name = event.name();
        let event: ServerEvent = event.into();
        let connections = self.connections.lock();

        let mut delivered = 0;
        for connection in connections
            .iter()
            .filter(|c| c.receives(instance_id, &recipients))
        {
            // A closed receiver means the socket is shutting down
            if connection.sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }

        debug!("Delivered {} in room {} to {} connection(s)", name, room_id, delivered);
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.unregister(self.id)
        }
    }
}

#[cfg(test)]
mod test {
    use chorus_collab::{
        Collab, CollabEvent, Envelope, NewRoom, Recipients, RoomCommand, RoomConnectionId,
        RoomInstanceId, Transport,
    };
    use chorus_core::{Config, NewSong, VoteDirection};
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::Connections;
    use crate::messages::ServerEvent;

    fn queue_update(room: RoomInstanceId, recipients: Recipients) -> Envelope {
        Envelope {
            room_id: "den".to_string(),
            instance_id: room,
            recipients,
            event: CollabEvent::QueueUpdate { queue: vec![] },
        }
    }

    fn drain(receiver: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = vec![];
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn routes_by_room_and_recipient() {
        let connections = Connections::new();
        let (den, attic) = (RoomInstanceId::new(), RoomInstanceId::new());

        let host_id = RoomConnectionId::new();
        let guest_id = RoomConnectionId::new();

        let (_host, mut host) = connections.register(host_id, den, "host");
        let (_guest, mut guest) = connections.register(guest_id, den, "guest");
        let (_elsewhere, mut elsewhere) =
            connections.register(RoomConnectionId::new(), attic, "host");

        connections.deliver(queue_update(den, Recipients::All));
        connections.deliver(queue_update(den, Recipients::User("host".to_string())));
        connections.deliver(queue_update(den, Recipients::Connection(guest_id)));

        assert_eq!(drain(&mut host).len(), 2);
        assert_eq!(drain(&mut guest).len(), 2);
        assert!(drain(&mut elsewhere).is_empty());
    }

    #[test]
    fn dropping_guard_unregisters() {
        let connections = Connections::new();

        let id = RoomConnectionId::new();
        let (guard, _receiver) = connections.register(id, RoomInstanceId::new(), "host");
        assert_eq!(connections.len(), 1);

        drop(guard);
        assert!(connections.is_empty());
    }

    #[test]
    fn send_to_targets_one_connection() {
        let connections = Connections::new();
        let den = RoomInstanceId::new();

        let id = RoomConnectionId::new();
        let (_guard, mut receiver) = connections.register(id, den, "host");
        let (_other, mut other) = connections.register(RoomConnectionId::new(), den, "host");

        connections.send_to(id, ServerEvent::error("bad frame"));

        assert!(matches!(
            receiver.try_recv(),
            Ok(ServerEvent::Error { message }) if message == "bad frame"
        ));
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn removed_room_stays_apart_from_its_successor() {
        let connections = Connections::new();
        let collab = Collab::new(Config::default(), connections.clone());

        let new_room = |authority_id: &str| NewRoom {
            id: Some("den".to_string()),
            authority_id: authority_id.to_string(),
        };

        let old = collab.rooms.create_room(new_room("host")).unwrap();
        let old_id = RoomConnectionId::new();
        let (_old_guard, mut old_events) = connections.register(old_id, old.instance_id(), "host");
        let old_host = old.connect(old_id, "host");

        let song = |title: &str| NewSong {
            title: title.to_string(),
            artist: "Band".to_string(),
            album_name: None,
            url: format!("https://media.invalid/{title}.ogg"),
            duration: 120.,
        };

        old.enqueue("host", song("first")).unwrap();
        let queued = old.enqueue("host", song("second")).unwrap();

        collab.rooms.remove_room("den").unwrap();
        let new = collab.rooms.create_room(new_room("alice")).unwrap();

        let alice_id = RoomConnectionId::new();
        let (_alice_guard, mut alice_events) =
            connections.register(alice_id, new.instance_id(), "alice");
        let _alice = new.connect(alice_id, "alice");

        drain(&mut old_events);
        drain(&mut alice_events);

        old_host
            .dispatch(RoomCommand::Vote {
                song_id: queued.id,
                direction: VoteDirection::Up,
            })
            .unwrap();
        old_host.dispatch(RoomCommand::Skip).unwrap();

        assert!(drain(&mut alice_events).is_empty());
        assert!(!drain(&mut old_events).is_empty());
    }

    #[test]
    fn closing_a_room_ends_its_streams() {
        let connections = Connections::new();
        let (den, attic) = (RoomInstanceId::new(), RoomInstanceId::new());

        let (_host, mut host) = connections.register(RoomConnectionId::new(), den, "host");
        let (_other, mut other) = connections.register(RoomConnectionId::new(), attic, "host");

        assert_eq!(connections.close_room(den), 1);

        // The sender is gone, so the socket loop sees the end of its events
        assert!(matches!(
            host.try_recv(),
            Err(tokio::sync::mpsc::error::TryRecvError::Disconnected)
        ));
        assert!(matches!(
            other.try_recv(),
            Err(tokio::sync::mpsc::error::TryRecvError::Empty)
        ));
    }
}
