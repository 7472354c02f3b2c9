//! Core types for the axon host/peer backbone.
//!
//! This crate is the bottom of the dependency stack:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  axon-runtime : ComponentScope, SettingsStore        │
//! ├──────────────────────────────────────────────────────┤
//! │  axon-bus     : HostBus, PeerBus, Envelope           │
//! │  axon-router  : PatternRouter                        │
//! ├──────────────────────────────────────────────────────┤
//! │  axon-types   : PeerId, CallId, ErrorCode  ◄── HERE  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! It provides:
//!
//! - [`PeerId`] / [`CallId`] - identifier newtypes used on the wire
//! - [`ErrorCode`] - the unified error-code contract every axon error
//!   enum implements
//! - [`assert_error_code`] / [`assert_error_codes`] - test helpers that
//!   validate code conventions

mod error;
mod id;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{CallId, PeerId};
