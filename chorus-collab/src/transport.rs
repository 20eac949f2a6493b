use std::sync::Arc;

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::Envelope;

pub type EventSender = Sender<Envelope>;
pub type EventReceiver = Receiver<Envelope>;

/// Delivers room events to participants.
///
/// Rooms call this while applying an event, so implementors must hand the envelope off
/// without blocking, and must keep the order in which envelopes were delivered.
pub trait Transport
where
    Self: 'static + Sync + Send,
{
    fn deliver(&self, envelope: Envelope);
}

pub type BoxedTransport = Arc<dyn Transport>;

/// A [Transport] that puts every envelope into a channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: EventSender,
    receiver: EventReceiver,
}

impl ChannelTransport {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn receiver(&self) -> EventReceiver {
        self.receiver.clone()
    }

    /// Returns every envelope delivered so far.
    pub fn drain(&self) -> Vec<Envelope> {
        self.receiver.try_iter().collect()
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ChannelTransport {
    fn deliver(&self, envelope: Envelope) {
        // The receiver lives as long as self, so this can't fail
        let _ = self.sender.send(envelope);
    }
}

impl<T> Transport for Arc<T>
where
    T: Transport,
{
    fn deliver(&self, envelope: Envelope) {
        self.as_ref().deliver(envelope)
    }
}
