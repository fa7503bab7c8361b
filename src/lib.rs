#![forbid(unsafe_code)]

//! Speech-to-text core for chat and document hosts.
//!
//! Resolves an audio reference (local path, HTTP(S) URL, or base64 data
//! URI) to transcribed text, choosing between a locally resident Whisper
//! model and an OpenAI-compatible cloud endpoint. The local model is
//! cached process-wide and reloaded only when its configuration changes.
//!
//! The host hands [`TranscriptionService::transcribe`] an
//! [`AudioReference`] plus a [`TranscriptionSettings`] snapshot and gets
//! back either text or a classified [`TranscribeError`]; presentation of
//! failures stays on the host side.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use app::TranscriptionService;
pub use domain::{AudioReference, TranscribeError, TranscriptionSettings};
