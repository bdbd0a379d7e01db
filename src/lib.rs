//! Terminal client for the IMS dashboard and assistant endpoints.
//!
//! The [`dashboard`] module keeps one bounded line series per inventory
//! metric in sync with the backend's snapshot history. The [`chat`] module
//! talks to the assistant endpoint and always yields a reply.

pub mod chat;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod eventlog;
pub mod utils;
