//! Content API access: the [`EditorApi`] seam and its HTTP implementation.
//!
//! - [`client`]: [`EditorClient`], a reqwest-backed client for the four
//!   editor endpoints, plus the [`EditorApi`] trait the session is written
//!   against so tests can swap in a scripted fake.
//! - [`wire`]: request bodies and the `{ success, error }` write envelope.

pub mod client;
pub mod wire;

pub use client::{ApiFuture, EditorApi, EditorClient};
pub use wire::WriteAck;
