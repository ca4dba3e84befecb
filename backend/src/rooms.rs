//! The owned room registry
//!
//! One `RoomRegistry` instance is created at startup and handed to the
//! transport; there is no ambient global state. All rooms live behind a
//! single mutex, so each command for a room runs to completion before the
//! next one starts and the expiry sweep can never interleave with an
//! in-flight mutation.

use crate::session::Session;
use parking_lot::Mutex;
use rand::Rng;
use shared::protocol::ConnId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const CODE_LEN: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Default)]
struct RegistryInner {
    rooms: HashMap<String, Session>,
    conn_to_room: HashMap<ConnId, String>,
}

/// Registry of all active rooms plus the connection → room index.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl RoomRegistry {
    pub fn new() -> RoomRegistry {
        RoomRegistry::default()
    }

    /// Create a room under a fresh code and return the code.
    pub fn create_room(&self) -> String {
        let mut inner = self.inner.lock();
        loop {
            let code = generate_room_code();
            if !inner.rooms.contains_key(&code) {
                tracing::info!(room = %code, "room created");
                inner.rooms.insert(code.clone(), Session::new(code.clone()));
                return code;
            }
        }
    }

    /// Run one command against a room's session, serialized with every
    /// other command and with the expiry sweep. `None` when no room has
    /// that code.
    pub fn with_session<T>(&self, code: &str, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        let mut inner = self.inner.lock();
        let session = inner.rooms.get_mut(code)?;
        session.touch();
        Some(f(session))
    }

    /// Remember which room a connection sits in.
    pub fn bind(&self, conn: ConnId, code: &str) {
        self.inner.lock().conn_to_room.insert(conn, code.to_string());
    }

    pub fn room_of(&self, conn: ConnId) -> Option<String> {
        self.inner.lock().conn_to_room.get(&conn).cloned()
    }

    /// Drop the connection → room binding, returning the room code.
    pub fn unbind(&self, conn: ConnId) -> Option<String> {
        self.inner.lock().conn_to_room.remove(&conn)
    }

    pub fn remove_room(&self, code: &str) {
        let mut inner = self.inner.lock();
        if inner.rooms.remove(code).is_some() {
            tracing::info!(room = %code, "room removed");
        }
        inner.conn_to_room.retain(|_, c| c != code);
    }

    /// Remove rooms idle past the inactivity window; returns their codes.
    pub fn sweep_expired(&self, ttl: Duration) -> Vec<String> {
        let mut inner = self.inner.lock();
        let expired: Vec<String> = inner
            .rooms
            .iter()
            .filter(|(_, session)| session.idle_for() > ttl)
            .map(|(code, _)| code.clone())
            .collect();
        for code in &expired {
            tracing::info!(room = %code, "room expired");
            inner.rooms.remove(code);
            inner.conn_to_room.retain(|_, c| c != code);
        }
        expired
    }

    pub fn room_count(&self) -> usize {
        self.inner.lock().rooms.len()
    }
}

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CODE_CHARSET.len());
            CODE_CHARSET[idx] as char
        })
        .collect()
}
