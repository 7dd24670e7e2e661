/*============================================================
  Synavera Project: Syn-Syu
  Module: rpmq_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise rpmq error types so query, configuration, and
    output failures share diagnostics and exit semantics.

  Security / Safety Notes:
    Error contexts carry command lines and file paths only;
    package database contents are never embedded.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate failures unchanged to the
    binary entry point, which owns presentation and exit codes.

  Revision History:
    2025-11-12 COD  Established rpmq error taxonomy.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for rpmq operations.
pub type Result<T> = std::result::Result<T, RpmqError>;

/// Enumerates high-level error domains surfaced by rpmq.
#[derive(Debug, Error)]
pub enum RpmqError {
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Package database unavailable: {0}")]
    DatabaseUnavailable(String),
    #[error("Query: {0}")]
    Query(String),
    #[error("Query helper used after it was closed")]
    UseAfterClose,
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RpmqError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    fn exit_status(&self) -> u8 {
        match self {
            RpmqError::DatabaseUnavailable(_) => 10,
            RpmqError::Query(_) => 11,
            RpmqError::Config(_) => 20,
            RpmqError::Serialization(_) => 31,
            RpmqError::Filesystem(_) => 40,
            RpmqError::Io(_) => 41,
            RpmqError::UseAfterClose => 50,
        }
    }
}
