/*============================================================
  Synavera Project: Syn-Syu
  Module: rpmq_core::package_info
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Shared record describing one installed package as read
    from the host package database (name, version, size).

  Security / Safety Notes:
    Pure data container; no I/O performed in this module.

  Dependencies:
    serde for JSON rendering.

  Operational Scope:
    Produced by database cursors, ordered and capped by the
    query helper, rendered by the output layer.

  Revision History:
    2025-11-12 COD  Introduced shared PackageRecord type.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Serializable structures for machine-readable output
============================================================*/

use serde::Serialize;

/// Snapshot of one installed package. All fields are always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    /// Installed size in bytes.
    pub size: u64,
}

impl PackageRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            size,
        }
    }
}
