/*============================================================
  Synavera Project: Syn-Syu
  Module: rpmq_core::database
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Define the seam between the query helper and the host
    package database so backends can be swapped.

  Security / Safety Notes:
    Read-only contract; implementors must never mutate the
    package database.

  Dependencies:
    None beyond std.

  Operational Scope:
    Implemented by the rpm backend in production and by an
    in-memory stub under test.

  Revision History:
    2025-11-12 COD  Introduced PackageDatabase trait.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit ownership of scoped resources
    - Deterministic fixtures for verification
============================================================*/

use crate::error::Result;
use crate::package_info::PackageRecord;

/// Exclusively owned enumeration over a package database. Dropping the
/// cursor releases every handle it holds.
pub trait RecordCursor: Iterator<Item = Result<PackageRecord>> {
    /// Source rows dropped so far because a field was missing or malformed.
    fn skipped(&self) -> usize {
        0
    }
}

/// Read-only access to an installed-package metadata store.
///
/// `open` acquires a cursor over the installed packages, optionally narrowed
/// by `name` using whatever matching the store natively supports.
pub trait PackageDatabase {
    type Cursor: RecordCursor;

    fn open(&self, name: Option<&str>) -> Result<Self::Cursor>;

    /// Human-readable description used in log entries.
    fn describe(&self) -> String;
}
