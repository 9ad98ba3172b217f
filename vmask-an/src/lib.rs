//! # VMask Anonymization Service (vmask-an)
//!
//! Replaces annotated PII speech ranges in a recording with surrogate voice
//! clips and computes inter-session annotation agreement.
//!
//! **Purpose:** Normalize annotation batches, resolve surrogate clips through
//! a deterministic fallback hierarchy, synthesize replacement segments under
//! the direct or fit strategy, stitch the output track, and compare annotation
//! sessions that reference the same recording.
//!
//! **Architecture:** Synchronous audio pipeline (symphonia + rubato + hound)
//! behind a tokio/axum HTTP surface, persisting through vmask-common's SQLite
//! layer.

pub mod agreement;
pub mod annotation;
pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod replace;
pub mod surrogate;

pub use error::{Error, Result};
