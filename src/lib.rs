//! Mailroom: in-memory user and message store.

pub mod config;
pub mod error;
pub mod store;
