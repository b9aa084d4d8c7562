//! OpenSSL acquisition library.
//!
//! This crate acquires the one OpenSSL version a native project vendors:
//! either a verified prebuilt archive, or canonical source that is verified,
//! configured, patched, built, tested, installed, and optionally repackaged.
//! It is used by the `openssl-acquire` binary and can be driven
//! programmatically with substitute HTTP and subprocess collaborators.
//!
//! # Modules
//!
//! - [`artefact`] - Download, verification, extraction, and packaging pipelines
//! - [`builder`] - Platform build strategies and patch application
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Typed acquisition options
//! - [`context`] - Version, host, directories, and URL templates for a run
//! - [`error`] - Semantic error types
//! - [`executor`] - External command execution
//! - [`gate`] - Version probe and existing-install skip
//! - [`pipeline`] - Mode selection and acquisition orchestration
//! - [`platform`] - Supported platforms and architectures
//! - [`wrapper`] - Windows build script generation

pub mod artefact;
pub mod builder;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod gate;
pub mod pipeline;
pub mod platform;
pub mod wrapper;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
