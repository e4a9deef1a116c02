//! Job status streaming client for the resume analysis backend.
//!
//! Provides typed message parsing, the subscription state machine, a
//! WebSocket transport, the caller-facing [`manager::JobStreamClient`],
//! REST wrappers for submitting, polling, rewriting and matching, and
//! the rewrite-to-PDF export used by `resumeiq-watch`.

pub mod api;
pub mod client;
pub mod config;
pub mod manager;
pub mod messages;
pub mod processor;
pub mod rewrite_export;
pub mod state;

pub use client::{Connection, Connector, Frame, StreamError, WsConnector};
pub use manager::JobStreamClient;
pub use messages::{JobStatusMessage, Phase};
pub use processor::OnSuccess;
pub use state::{JobSnapshot, StreamState};
