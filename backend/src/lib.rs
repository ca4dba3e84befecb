//! Room server for real-time multiplayer checkers
//!
//! - `session` - the per-room authoritative game state machine
//! - `rooms` - the owned room registry, code generation, expiry sweep
//! - `api` - the axum WebSocket transport and command dispatch

pub mod api;
pub mod rooms;
pub mod session;
