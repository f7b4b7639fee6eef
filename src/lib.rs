//! # Simple Edit
//!
//! A small image editor core: load an image, run a handful of pixel
//! transforms, undo the last one, save the result. Every successful change is
//! recorded in an append-only JSON history log.
//!
//! # Architecture
//!
//! ```text
//!   front-end (CLI, shell, GUI)
//!        │  Command / direct calls
//!        ▼
//!   EditSession ──── HistoryStore ──▶ configs/history.json
//!        │
//!        ▼
//!   ImageCodec (RustCodec on the `image` crate)
//! ```
//!
//! The session holds the only mutable state: the current image and one
//! snapshot for undo. Pixel work is delegated to an [`codec::ImageCodec`]
//! implementation, so the session's bookkeeping is tested against a mock
//! codec without touching real pixels.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`codec`] | `ImageCodec` trait, the `image`-crate backed `RustCodec`, formats and color modes |
//! | [`engine`] | `EditSession`: load, save, info, forward transforms, single-level undo |
//! | [`history`] | `HistoryStore`: append-only JSON log with a configurable corruption policy |
//! | [`operation`] | The five forward transforms as data, with their log names and params |
//! | [`command`] | The full caller surface as data, parsed from text and executed on a session |
//! | [`config`] | `simple-edit.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Single-Level Undo
//!
//! Each forward operation overwrites one snapshot slot with the pre-operation
//! image. Undo restores it and clears the slot. There is no redo and no stack;
//! a second undo in a row reports that nothing happened.
//!
//! ## History Is Best-Effort By Default
//!
//! With the default `repair` policy, a history document that no longer parses
//! is replaced by a fresh array holding the new record, and write failures are
//! logged but never fail the edit. Earlier entries are lost in that case. The
//! `fail` policy turns both situations into errors, and the edit that
//! triggered them is not committed.
//!
//! ## Memory State Versus Disk Probe
//!
//! [`engine::EditSession::current_state`] only reports the image in memory.
//! [`engine::EditSession::probe_source_metadata`] reads the remembered source
//! file's header. [`engine::EditSession::info`] is the first, falling back to
//! the second.
//!
//! ## Logging
//!
//! The library emits `tracing` events and never prints. The binary decides
//! where they go.

pub mod codec;
pub mod command;
pub mod config;
pub mod engine;
pub mod history;
pub mod operation;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
