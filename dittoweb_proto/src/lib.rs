//! # dittoweb proto
//!
//! Hand-written [`prost`] message types for the Messages for Web wire
//! protocol, organized by protobuf package. Each message also carries its
//! pblite field map ([`dittoweb_pblite::Pblite`]), so every type encodes
//! both as standard binary protobuf and as the sparse JSON-array format.
//!
//! The types are written by hand rather than generated so the crate builds
//! without a protoc toolchain; field numbers are part of the wire contract
//! and must not be renumbered.

pub mod authentication;
pub mod client;
pub mod conversations;
pub mod events;
pub mod rpc;
