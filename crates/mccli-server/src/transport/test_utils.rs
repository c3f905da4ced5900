//! Test helpers for the transport module.

use std::io::Write;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use crate::message::{Message, Response};

use super::{ConnectionHandler, ConnectionStream};

/// Handler that acknowledges every message and records what it received.
pub(crate) struct RecordingHandler {
    connections: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Message>>>,
}

impl RecordingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Mutex<Vec<Message>>>, Arc<Self>) {
        let connections = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(Self {
            connections: Arc::clone(&connections),
            received: Arc::clone(&received),
        });
        (connections, received, handler)
    }
}

impl ConnectionHandler for RecordingHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        self.connections.fetch_add(1, Ordering::SeqCst);
        while let Ok(message) = Message::read_from(&mut stream) {
            let reply = format!("ack {}", message.parts().join(" "));
            if let Ok(mut received) = self.received.lock() {
                received.push(message);
            }
            let Ok(bytes) = Response::success(reply).encode() else {
                return;
            };
            if stream.write_all(&bytes).is_err() {
                return;
            }
        }
    }
}
