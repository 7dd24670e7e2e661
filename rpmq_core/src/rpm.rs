/*============================================================
  Synavera Project: Syn-Syu
  Module: rpmq_core::rpm
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Interface with the rpm utility to stream installed package
    names, versions, and sizes from the host RPM database.

  Security / Safety Notes:
    Executes rpm in query mode with user privileges only; no
    privilege escalation and no database mutation is attempted.

  Dependencies:
    std::process for child process management, std::thread to
    drain rpm diagnostics while rows stream.

  Operational Scope:
    Production PackageDatabase backend for rpmq.

  Revision History:
    2025-11-12 COD  Crafted rpm query integration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic command invocation with explicit checks
    - Structured parsing with clear failure modes
    - Child processes reaped on every exit path
============================================================*/

use std::ffi::{OsStr, OsString};
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

use crate::database::{PackageDatabase, RecordCursor};
use crate::error::{Result, RpmqError};
use crate::package_info::PackageRecord;

const QUERY_FORMAT: &str = "%{NAME}\\t%{VERSION}\\t%{LONGSIZE}\\n";

/// Installed package database reached through the `rpm` command.
#[derive(Debug, Clone)]
pub struct RpmDatabase {
    program: OsString,
    leading_args: Vec<OsString>,
    root: Option<PathBuf>,
    dbpath: Option<PathBuf>,
}

impl Default for RpmDatabase {
    fn default() -> Self {
        Self {
            program: OsString::from("rpm"),
            leading_args: Vec::new(),
            root: None,
            dbpath: None,
        }
    }
}

impl RpmDatabase {
    /// Build a backend from a command vector such as `["rpm"]` or
    /// `["toolbox", "run", "rpm"]`.
    pub fn from_command<I, S>(command: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut parts = command.into_iter().map(Into::into);
        let program = parts
            .next()
            .filter(|program| !program.is_empty())
            .ok_or_else(|| RpmqError::Config("rpm command must not be empty".into()))?;
        Ok(Self {
            program,
            leading_args: parts.collect(),
            ..Self::default()
        })
    }

    pub fn with_root(mut self, root: Option<PathBuf>) -> Self {
        self.root = root;
        self
    }

    pub fn with_dbpath(mut self, dbpath: Option<PathBuf>) -> Self {
        self.dbpath = dbpath;
        self
    }

    fn command_line(&self, name: Option<&str>) -> Vec<OsString> {
        let mut args = self.leading_args.clone();
        if let Some(root) = &self.root {
            args.push("--root".into());
            args.push(root.into());
        }
        if let Some(dbpath) = &self.dbpath {
            args.push("--dbpath".into());
            args.push(dbpath.into());
        }
        args.push("-qa".into());
        args.push("--queryformat".into());
        args.push(QUERY_FORMAT.into());
        if let Some(name) = name {
            args.push(format!("*{name}*").into());
        }
        args
    }
}

impl PackageDatabase for RpmDatabase {
    type Cursor = RpmCursor;

    fn open(&self, name: Option<&str>) -> Result<RpmCursor> {
        let args = self.command_line(name);
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| map_spawn_error(err, &self.program))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let mut cursor = RpmCursor {
            command: self.describe(),
            child: Some(child),
            rows: stdout.map(BufReader::new),
            stderr: None,
            pending: None,
            yielded: 0,
            skipped: 0,
        };
        cursor.stderr = stderr.map(drain_stderr).transpose().map_err(|err| {
            RpmqError::DatabaseUnavailable(format!(
                "Failed to start stderr reader for `{}`: {err}",
                cursor.command
            ))
        })?;
        cursor.prime()?;
        Ok(cursor)
    }

    fn describe(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.command_line(None).iter().map(|arg| arg.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// Streaming cursor over `rpm -qa` output. Dropping it kills and reaps the
/// child if it is still running.
pub struct RpmCursor {
    command: String,
    child: Option<Child>,
    rows: Option<BufReader<ChildStdout>>,
    /// Collects stderr concurrently so a chatty rpm never stalls on a full pipe.
    stderr: Option<JoinHandle<String>>,
    pending: Option<PackageRecord>,
    yielded: usize,
    /// Rows dropped for missing or malformed fields.
    skipped: usize,
}

impl RpmCursor {
    /// Read ahead to the first record so an unreadable database is reported
    /// from `open` rather than from the first iteration step.
    fn prime(&mut self) -> Result<()> {
        match self.read_record() {
            Ok(Some(record)) => {
                self.pending = Some(record);
                Ok(())
            }
            Ok(None) => self.finish(),
            Err(err) => {
                self.release();
                Err(RpmqError::DatabaseUnavailable(format!(
                    "Failed to read from `{}`: {err}",
                    self.command
                )))
            }
        }
    }

    fn read_record(&mut self) -> io::Result<Option<PackageRecord>> {
        let Some(rows) = self.rows.as_mut() else {
            return Ok(None);
        };
        let mut line = Vec::new();
        loop {
            line.clear();
            if rows.read_until(b'\n', &mut line)? == 0 {
                return Ok(None);
            }
            match parse_record_line(&String::from_utf8_lossy(&line)) {
                Some(record) => return Ok(Some(record)),
                None if line.iter().all(u8::is_ascii_whitespace) => {}
                None => self.skipped += 1,
            }
        }
    }

    /// Reap the child after end of output and translate a failing status.
    fn finish(&mut self) -> Result<()> {
        self.rows = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait();
        let stderr = self
            .stderr
            .take()
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        let status = match status {
            Ok(status) => status,
            Err(err) => {
                return Err(self.failure(format!("Failed to wait for `{}`: {err}", self.command)))
            }
        };
        if status.success() {
            return Ok(());
        }
        Err(self.failure(format!(
            "`{}` failed with status {}: {}",
            self.command,
            status.code().unwrap_or(-1),
            stderr.trim()
        )))
    }

    /// Failures before any row was read mean the database never opened.
    fn failure(&self, detail: String) -> RpmqError {
        if self.yielded == 0 && self.pending.is_none() {
            RpmqError::DatabaseUnavailable(detail)
        } else {
            RpmqError::Query(detail)
        }
    }

    fn release(&mut self) {
        self.rows = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        // The reader exits on its own once the killed child's pipe closes.
        self.stderr = None;
    }
}

impl Iterator for RpmCursor {
    type Item = Result<PackageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match self.pending.take() {
            Some(record) => Ok(Some(record)),
            None => self.read_record().map_err(|err| {
                RpmqError::Query(format!("Failed to read from `{}`: {err}", self.command))
            }),
        };
        match next {
            Ok(Some(record)) => {
                self.yielded += 1;
                Some(Ok(record))
            }
            Ok(None) => self.finish().err().map(Err),
            Err(err) => {
                self.release();
                Some(Err(err))
            }
        }
    }
}

impl RecordCursor for RpmCursor {
    fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Drop for RpmCursor {
    fn drop(&mut self) {
        self.release();
    }
}

/// Parse one `NAME\tVERSION\tSIZE` row. Rows with a missing or unparsable
/// field yield `None`.
fn parse_record_line(line: &str) -> Option<PackageRecord> {
    let mut fields = line.trim_end_matches(['\r', '\n']).split('\t');
    let name = fields.next()?.trim();
    let version = fields.next()?.trim();
    let size = fields.next()?.trim().parse::<u64>().ok()?;
    if fields.next().is_some() || name.is_empty() || version.is_empty() || version == "(none)" {
        return None;
    }
    Some(PackageRecord::new(name, version, size))
}

fn drain_stderr(mut pipe: ChildStderr) -> io::Result<JoinHandle<String>> {
    thread::Builder::new()
        .name("rpm-stderr".into())
        .spawn(move || {
            let mut captured = Vec::new();
            // Diagnostics are best effort; the exit status decides.
            let _ = pipe.read_to_end(&mut captured);
            String::from_utf8_lossy(&captured).into_owned()
        })
}

fn map_spawn_error(err: io::Error, program: &OsStr) -> RpmqError {
    let program = program.to_string_lossy();
    match err.kind() {
        io::ErrorKind::NotFound => {
            RpmqError::DatabaseUnavailable(format!("Required command `{program}` not found in PATH"))
        }
        io::ErrorKind::PermissionDenied => {
            RpmqError::DatabaseUnavailable(format!("Permission denied running `{program}`"))
        }
        _ => RpmqError::DatabaseUnavailable(format!("Failed to spawn {program}: {err}")),
    }
}
