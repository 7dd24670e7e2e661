/*============================================================
  Synavera Project: Syn-Syu
  Module: rpmq_core::query
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Present a scoped, filterable, size-sortable and capped
    view over an installed-package database.

  Security / Safety Notes:
    Holds at most one database cursor; the cursor is released
    on close, on exhaustion, on error, and on drop.

  Dependencies:
    None beyond std; backends plug in via PackageDatabase.

  Operational Scope:
    Driven by the rpmq entry point; exercised against a stub
    database under test.

  Revision History:
    2025-11-12 COD  Authored QueryHelper.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Validation before any resource acquisition
    - Guaranteed release of scoped handles
    - Errors surfaced unchanged to the caller
============================================================*/

use crate::database::{PackageDatabase, RecordCursor};
use crate::error::{Result, RpmqError};
use crate::package_info::PackageRecord;

/// Default limit. Any limit at or above this value means "no cap".
pub const MAX_NUMBER_OF_RESULTS: i64 = 10_000;

/// Options recognised by [`QueryHelper::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Name filter, matched by the database's native facility. Empty means none.
    pub name: Option<String>,
    pub limit: i64,
    /// Order by installed size ascending; otherwise keep native order.
    pub sorted: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            name: None,
            limit: MAX_NUMBER_OF_RESULTS,
            sorted: true,
        }
    }
}

impl QueryOptions {
    /// Resolve the configured limit into an optional cap.
    pub fn cap(&self) -> Result<Option<usize>> {
        if self.limit <= 0 {
            return Err(RpmqError::Config(format!(
                "limit must be a positive integer, got {}",
                self.limit
            )));
        }
        if self.limit >= MAX_NUMBER_OF_RESULTS {
            return Ok(None);
        }
        usize::try_from(self.limit)
            .map(Some)
            .map_err(|err| RpmqError::Config(format!("limit {} out of range: {err}", self.limit)))
    }

    pub fn name_filter(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

enum HelperState<C> {
    Streaming(C),
    Buffered(std::vec::IntoIter<PackageRecord>),
    Drained,
    Closed,
}

/// Scoped query over a package database.
///
/// The helper owns the database cursor from [`open`](Self::open) until
/// [`close`](Self::close) or drop. In unsorted mode the cap short-circuits the
/// underlying scan; in sorted mode the whole result set is materialized and
/// sorted before the cap is applied.
pub struct QueryHelper<C> {
    sorted: bool,
    remaining: Option<usize>,
    yielded: usize,
    skipped: usize,
    state: HelperState<C>,
}

impl<C: RecordCursor> QueryHelper<C> {
    /// Validate `options` and acquire a cursor from `database`.
    pub fn open<D>(database: &D, options: &QueryOptions) -> Result<Self>
    where
        D: PackageDatabase<Cursor = C>,
    {
        let remaining = options.cap()?;
        let cursor = database.open(options.name_filter())?;
        Ok(Self {
            sorted: options.sorted,
            remaining,
            yielded: 0,
            skipped: 0,
            state: HelperState::Streaming(cursor),
        })
    }

    /// Lazy view over the remaining results. Not restartable: a later call
    /// continues where the previous one stopped.
    pub fn records(&mut self) -> Result<Records<'_, C>> {
        if self.is_closed() {
            return Err(RpmqError::UseAfterClose);
        }
        Ok(Records { helper: self })
    }

    /// Number of records handed out so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Source rows the database dropped as malformed.
    pub fn skipped(&self) -> usize {
        match &self.state {
            HelperState::Streaming(cursor) => cursor.skipped(),
            _ => self.skipped,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, HelperState::Closed)
    }

    /// Release the cursor. Further calls to [`records`](Self::records) fail.
    pub fn close(&mut self) {
        self.replace_state(HelperState::Closed);
    }

    fn release(&mut self) {
        if !self.is_closed() {
            self.replace_state(HelperState::Drained);
        }
    }

    fn replace_state(&mut self, next: HelperState<C>) {
        if let HelperState::Streaming(cursor) = &self.state {
            self.skipped = cursor.skipped();
        }
        self.state = next;
    }

    fn materialize(&mut self) -> Result<()> {
        let collected = match &mut self.state {
            HelperState::Streaming(cursor) => cursor.by_ref().collect::<Result<Vec<_>>>(),
            _ => return Ok(()),
        };
        match collected {
            Ok(mut records) => {
                records.sort_by_key(|record| record.size);
                self.replace_state(HelperState::Buffered(records.into_iter()));
                Ok(())
            }
            Err(err) => {
                self.replace_state(HelperState::Drained);
                Err(err)
            }
        }
    }

    fn advance(&mut self) -> Option<Result<PackageRecord>> {
        if self.remaining == Some(0) {
            self.release();
            return None;
        }
        if self.sorted {
            if let Err(err) = self.materialize() {
                return Some(Err(err));
            }
        }

        let next = match &mut self.state {
            HelperState::Streaming(cursor) => cursor.next(),
            HelperState::Buffered(buffer) => buffer.next().map(Ok),
            HelperState::Drained | HelperState::Closed => None,
        };

        match next {
            Some(Ok(record)) => {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                }
                self.yielded += 1;
                Some(Ok(record))
            }
            Some(Err(err)) => {
                self.release();
                Some(Err(err))
            }
            None => {
                self.release();
                None
            }
        }
    }
}

/// Iterator returned by [`QueryHelper::records`]. Fused after an error.
pub struct Records<'a, C> {
    helper: &'a mut QueryHelper<C>,
}

impl<C: RecordCursor> Iterator for Records<'_, C> {
    type Item = Result<PackageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.helper.advance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::stub::StubDatabase;

    fn options(name: Option<&str>, limit: i64, sorted: bool) -> QueryOptions {
        QueryOptions {
            name: name.map(str::to_string),
            limit,
            sorted,
        }
    }

    fn names(database: &StubDatabase, options: &QueryOptions) -> Vec<String> {
        let mut helper = QueryHelper::open(database, options).unwrap();
        let names = helper
            .records()
            .unwrap()
            .map(|record| record.unwrap().name)
            .collect();
        helper.close();
        names
    }

    #[test]
    fn sorted_query_orders_by_size_ascending() {
        let database = StubDatabase::shells();
        let mut helper = QueryHelper::open(&database, &QueryOptions::default()).unwrap();
        let records: Vec<PackageRecord> = helper.records().unwrap().map(|record| record.unwrap()).collect();
        assert_eq!(
            records,
            vec![
                PackageRecord::new("ksh", "2020", 524_288),
                PackageRecord::new("bash", "5.1", 1_048_576),
                PackageRecord::new("zsh", "5.8", 2_097_152),
            ]
        );
        assert_eq!(helper.yielded(), 3);
    }

    #[test]
    fn unsorted_name_filter_keeps_native_order() {
        let database = StubDatabase::shells();
        assert_eq!(
            names(&database, &options(Some("sh"), MAX_NUMBER_OF_RESULTS, false)),
            ["bash", "zsh", "ksh"]
        );
    }

    #[test]
    fn name_filter_is_case_sensitive_substring() {
        let database = StubDatabase::shells();
        assert_eq!(names(&database, &options(Some("as"), MAX_NUMBER_OF_RESULTS, true)), ["bash"]);
        assert!(names(&database, &options(Some("SH"), MAX_NUMBER_OF_RESULTS, true)).is_empty());
    }

    #[test]
    fn empty_name_filter_excludes_nothing() {
        let database = StubDatabase::shells();
        assert_eq!(names(&database, &options(Some(""), MAX_NUMBER_OF_RESULTS, false)).len(), 3);
    }

    #[test]
    fn limit_one_sorted_yields_smallest() {
        let database = StubDatabase::shells();
        assert_eq!(names(&database, &options(None, 1, true)), ["ksh"]);
    }

    #[test]
    fn limit_never_exceeded() {
        let database = StubDatabase::shells();
        for limit in 1..=5 {
            for sorted in [true, false] {
                let count = names(&database, &options(None, limit, sorted)).len();
                assert!(count as i64 <= limit);
                assert_eq!(count, (limit as usize).min(3));
            }
        }
    }

    #[test]
    fn limit_above_sentinel_is_unbounded() {
        let database = StubDatabase::shells();
        assert_eq!(names(&database, &options(None, MAX_NUMBER_OF_RESULTS + 1, true)).len(), 3);
        assert_eq!(options(None, i64::MAX, true).cap().unwrap(), None);
    }

    #[test]
    fn non_positive_limit_fails_before_database_access() {
        let database = StubDatabase::shells();
        for limit in [0, -1, i64::MIN] {
            for sorted in [true, false] {
                let result = QueryHelper::open(&database, &options(Some("sh"), limit, sorted));
                assert!(matches!(result, Err(RpmqError::Config(_))));
            }
        }
        assert_eq!(database.opens(), 0);
    }

    #[test]
    fn unavailable_database_surfaces_on_open() {
        let database = StubDatabase::shells().unavailable();
        let result = QueryHelper::open(&database, &QueryOptions::default());
        assert!(matches!(result, Err(RpmqError::DatabaseUnavailable(_))));
    }

    #[test]
    fn records_after_close_fails() {
        let database = StubDatabase::shells();
        let mut helper = QueryHelper::open(&database, &QueryOptions::default()).unwrap();
        helper.close();
        assert!(helper.is_closed());
        assert!(matches!(helper.records(), Err(RpmqError::UseAfterClose)));
        assert_eq!(database.live_cursors(), 0);
    }

    #[test]
    fn unsorted_limit_short_circuits_the_scan() {
        let database = StubDatabase::shells();
        let mut helper = QueryHelper::open(&database, &options(None, 1, false)).unwrap();
        let names: Vec<String> = helper.records().unwrap().map(|r| r.unwrap().name).collect();
        assert_eq!(names, ["bash"]);
        assert_eq!(database.rows_pulled(), 1);
        assert_eq!(database.live_cursors(), 0);
    }

    #[test]
    fn second_pass_continues_instead_of_restarting() {
        let database = StubDatabase::shells();
        let mut helper = QueryHelper::open(&database, &options(None, MAX_NUMBER_OF_RESULTS, false)).unwrap();
        let first = helper.records().unwrap().next().unwrap().unwrap();
        assert_eq!(first.name, "bash");
        let rest: Vec<String> = helper.records().unwrap().map(|r| r.unwrap().name).collect();
        assert_eq!(rest, ["zsh", "ksh"]);
        assert_eq!(helper.records().unwrap().count(), 0);
    }

    #[test]
    fn mid_iteration_failure_propagates_and_releases() {
        let database = StubDatabase::shells().failing_after(1);
        let mut helper = QueryHelper::open(&database, &options(None, MAX_NUMBER_OF_RESULTS, false)).unwrap();
        let mut records = helper.records().unwrap();
        assert!(records.next().unwrap().is_ok());
        assert!(matches!(records.next(), Some(Err(RpmqError::Query(_)))));
        assert!(records.next().is_none());
        assert_eq!(database.live_cursors(), 0);
    }

    #[test]
    fn sorted_failure_surfaces_before_any_record() {
        let database = StubDatabase::shells().failing_after(2);
        let mut helper = QueryHelper::open(&database, &QueryOptions::default()).unwrap();
        let results: Vec<Result<PackageRecord>> = helper.records().unwrap().collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(RpmqError::Query(_))));
        assert_eq!(database.live_cursors(), 0);
    }

    #[test]
    fn abandoned_helper_releases_on_drop() {
        let database = StubDatabase::shells();
        {
            let mut helper = QueryHelper::open(&database, &options(None, MAX_NUMBER_OF_RESULTS, false)).unwrap();
            let _ = helper.records().unwrap().next();
            assert_eq!(database.live_cursors(), 1);
        }
        assert_eq!(database.live_cursors(), 0);
    }

    #[test]
    fn helpers_own_independent_cursors() {
        let database = StubDatabase::shells();
        let mut first = QueryHelper::open(&database, &options(None, MAX_NUMBER_OF_RESULTS, false)).unwrap();
        let mut second = QueryHelper::open(&database, &options(Some("z"), MAX_NUMBER_OF_RESULTS, false)).unwrap();
        assert_eq!(database.live_cursors(), 2);
        assert_eq!(second.records().unwrap().count(), 1);
        assert_eq!(first.records().unwrap().count(), 3);
        assert_eq!(database.opens(), 2);
    }

    #[test]
    fn sorting_is_stable_for_equal_sizes() {
        let database = StubDatabase::new(&[("b", "1", 10), ("a", "1", 5), ("c", "1", 10), ("d", "1", 10)]);
        assert_eq!(names(&database, &options(None, MAX_NUMBER_OF_RESULTS, true)), ["a", "b", "c", "d"]);
    }
}
