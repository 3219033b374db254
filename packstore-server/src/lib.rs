//! Packstore node server: configuration and the HTTP surface over the
//! replicated artifact store.

pub mod config;
pub mod server;
