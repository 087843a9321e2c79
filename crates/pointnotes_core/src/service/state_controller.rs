//! Application state controller.
//!
//! # Responsibility
//! - Own the in-memory note list and points counter for the process lifetime.
//! - Seed state from the note repository and key-value store on load.
//! - Apply add/delete actions to memory first, then to both stores.
//!
//! # Invariants
//! - The in-memory note list never holds two equal texts after `add_note`.
//! - Points only grow: +1 per effective add, +2 per delete.
//! - No transaction spans the two stores; a failed write leaves them
//!   divergent and is reported through `last_error`, never rolled back.
//! - A failed load keeps the previous in-memory state.

use crate::config::StoreConfig;
use crate::kv::{FileKeyValueStore, KeyValueStore, KvError};
use crate::model::points::{encode_points, parse_points, reward, ADD_REWARD, DELETE_REWARD};
use crate::model::snapshot::StateSnapshot;
use crate::repo::note_repo::{NoteRepository, RepoError, SqliteNoteRepository};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Lifecycle of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    /// Constructed; nothing read from the stores yet.
    Uninitialized,
    /// Reading the stores.
    Loading,
    /// Seeded and accepting actions.
    Ready,
}

impl ControllerPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
        }
    }
}

/// Which store an operation failed against.
#[derive(Debug)]
pub enum StoreFailure {
    Notes(RepoError),
    Points(KvError),
}

impl Display for StoreFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notes(err) => write!(f, "notes store: {err}"),
            Self::Points(err) => write!(f, "points store: {err}"),
        }
    }
}

impl Error for StoreFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Notes(err) => Some(err),
            Self::Points(err) => Some(err),
        }
    }
}

impl From<RepoError> for StoreFailure {
    fn from(value: RepoError) -> Self {
        Self::Notes(value)
    }
}

impl From<KvError> for StoreFailure {
    fn from(value: KvError) -> Self {
        Self::Points(value)
    }
}

/// Controller error surfaced to presentation callers.
#[derive(Debug)]
pub enum ControllerError {
    /// Action attempted before a successful load.
    NotReady(ControllerPhase),
    /// A store could not be opened.
    StoreUnavailable(StoreFailure),
    /// Loading state from a store failed.
    ReadFailed(StoreFailure),
    /// One or both store mutations did not persist.
    WriteFailed(Vec<StoreFailure>),
}

/// Coarse classification of `ControllerError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotReady,
    StoreUnavailable,
    ReadFailed,
    WriteFailed,
}

impl ControllerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotReady(_) => ErrorKind::NotReady,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::ReadFailed(_) => ErrorKind::ReadFailed,
            Self::WriteFailed(_) => ErrorKind::WriteFailed,
        }
    }
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady(phase) => {
                write!(f, "state is not ready (phase: {})", phase.as_str())
            }
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::ReadFailed(err) => write!(f, "failed to load state: {err}"),
            Self::WriteFailed(failures) => {
                write!(f, "failed to persist change: ")?;
                for (index, failure) in failures.iter().enumerate() {
                    if index > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{failure}")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotReady(_) => None,
            Self::StoreUnavailable(err) | Self::ReadFailed(err) => Some(err),
            Self::WriteFailed(failures) => failures.first().map(|err| err as &(dyn Error + 'static)),
        }
    }
}

/// Non-fatal error signal kept for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSignal {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ControllerError> for ErrorSignal {
    fn from(value: &ControllerError) -> Self {
        Self {
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

/// Result of `add_note`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Text appended, points rewarded, stores updated.
    Added,
    /// Text already present; nothing changed.
    Duplicate,
}

/// Result of `delete_note`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// In-memory entries removed.
    pub removed_in_memory: usize,
    /// Store rows removed.
    pub removed_in_store: usize,
}

/// Authoritative in-memory view over a note repository and a points store.
pub struct StateController<R: NoteRepository, K: KeyValueStore> {
    repo: R,
    kv: K,
    points_key: String,
    phase: ControllerPhase,
    notes: Vec<String>,
    points: u64,
    last_error: Option<ErrorSignal>,
}

impl StateController<SqliteNoteRepository, FileKeyValueStore> {
    /// Opens both on-disk stores described by `config`.
    ///
    /// The returned controller is `Uninitialized`; call `load` before acting.
    pub fn open(config: &StoreConfig) -> ControllerResult<Self> {
        let repo = SqliteNoteRepository::open(config.db_path()).map_err(|err| {
            error!(
                "event=store_open module=controller status=error store=notes error={err}"
            );
            ControllerError::StoreUnavailable(err.into())
        })?;
        let kv = FileKeyValueStore::open(config.kv_path()).map_err(|err| {
            error!(
                "event=store_open module=controller status=error store=points error={err}"
            );
            ControllerError::StoreUnavailable(err.into())
        })?;
        Ok(Self::new(repo, kv, config.points_key()))
    }
}

impl<R: NoteRepository, K: KeyValueStore> StateController<R, K> {
    /// Creates an empty, unloaded controller over the given store handles.
    pub fn new(repo: R, kv: K, points_key: impl Into<String>) -> Self {
        Self {
            repo,
            kv,
            points_key: points_key.into(),
            phase: ControllerPhase::Uninitialized,
            notes: Vec::new(),
            points: 0,
            last_error: None,
        }
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    /// Notes in insertion order.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn points(&self) -> u64 {
        self.points
    }

    /// Exact, case-sensitive membership check.
    pub fn contains(&self, text: &str) -> bool {
        self.notes.iter().any(|note| note == text)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            notes: self.notes.clone(),
            points: self.points,
        }
    }

    /// Most recent store failure, if any.
    pub fn last_error(&self) -> Option<&ErrorSignal> {
        self.last_error.as_ref()
    }

    /// Returns and clears the most recent store failure.
    pub fn take_last_error(&mut self) -> Option<ErrorSignal> {
        self.last_error.take()
    }

    /// Releases the store handles.
    pub fn into_stores(self) -> (R, K) {
        (self.repo, self.kv)
    }

    /// Seeds in-memory state from both stores.
    ///
    /// Also used to reload from `Ready`. An absent or malformed counter is
    /// seeded to `0` and written back; failing that write-back does not fail
    /// the load but is recorded in `last_error`.
    pub fn load(&mut self) -> ControllerResult<()> {
        let started_at = Instant::now();
        let previous_phase = self.phase;
        self.phase = ControllerPhase::Loading;
        info!("event=state_load module=controller status=start");

        let loaded = self.read_stores();
        let (notes, stored_points) = match loaded {
            Ok(values) => values,
            Err(failure) => {
                self.phase = previous_phase;
                let err = ControllerError::ReadFailed(failure);
                error!(
                    "event=state_load module=controller status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                self.last_error = Some(ErrorSignal::from(&err));
                return Err(err);
            }
        };

        let points = match stored_points.as_deref().map(parse_points) {
            Some(Some(points)) => points,
            Some(None) => {
                warn!("event=points_seed module=controller status=ok reason=malformed");
                self.seed_points();
                0
            }
            None => {
                debug!("event=points_seed module=controller status=ok reason=absent");
                self.seed_points();
                0
            }
        };

        self.notes = notes;
        self.points = points;
        self.phase = ControllerPhase::Ready;
        info!(
            "event=state_load module=controller status=ok duration_ms={} notes={} points={}",
            started_at.elapsed().as_millis(),
            self.notes.len(),
            self.points
        );
        Ok(())
    }

    /// Appends `text` unless an equal note already exists.
    ///
    /// On success the note is in memory and points are rewarded even when a
    /// store write fails; the failure is returned and kept in `last_error`.
    pub fn add_note(&mut self, text: &str) -> ControllerResult<AddOutcome> {
        self.ensure_ready()?;
        if self.contains(text) {
            debug!(
                "event=note_add module=controller status=ok outcome=duplicate text_len={}",
                text.len()
            );
            return Ok(AddOutcome::Duplicate);
        }

        self.notes.push(text.to_string());
        self.points = reward(self.points, ADD_REWARD);

        let mut failures = Vec::new();
        if let Err(err) = self.persist_points() {
            failures.push(StoreFailure::Points(err));
        }
        if let Err(err) = self.repo.insert(text) {
            failures.push(StoreFailure::Notes(err));
        }

        self.finish_write("note_add", text.len(), failures)?;
        Ok(AddOutcome::Added)
    }

    /// Removes every note equal to `text` and rewards the delete.
    ///
    /// Points are rewarded even when no note matched.
    pub fn delete_note(&mut self, text: &str) -> ControllerResult<DeleteOutcome> {
        self.ensure_ready()?;

        let before = self.notes.len();
        self.notes.retain(|note| note != text);
        let removed_in_memory = before - self.notes.len();
        self.points = reward(self.points, DELETE_REWARD);

        let mut failures = Vec::new();
        if let Err(err) = self.persist_points() {
            failures.push(StoreFailure::Points(err));
        }
        let removed_in_store = match self.repo.delete(text) {
            Ok(count) => count,
            Err(err) => {
                failures.push(StoreFailure::Notes(err));
                0
            }
        };

        self.finish_write("note_delete", text.len(), failures)?;
        Ok(DeleteOutcome {
            removed_in_memory,
            removed_in_store,
        })
    }

    fn read_stores(&mut self) -> Result<(Vec<String>, Option<String>), StoreFailure> {
        self.repo.ensure_schema()?;
        let notes = self.repo.select_all()?;
        let points = self.kv.get(&self.points_key)?;
        Ok((notes, points))
    }

    fn seed_points(&mut self) {
        if let Err(err) = self.kv.set(&self.points_key, &encode_points(0)) {
            let err = ControllerError::WriteFailed(vec![StoreFailure::Points(err)]);
            error!("event=points_seed module=controller status=error error={err}");
            self.last_error = Some(ErrorSignal::from(&err));
        }
    }

    fn persist_points(&mut self) -> Result<(), KvError> {
        self.kv.set(&self.points_key, &encode_points(self.points))
    }

    fn ensure_ready(&self) -> ControllerResult<()> {
        if self.phase == ControllerPhase::Ready {
            Ok(())
        } else {
            Err(ControllerError::NotReady(self.phase))
        }
    }

    fn finish_write(
        &mut self,
        event: &'static str,
        text_len: usize,
        failures: Vec<StoreFailure>,
    ) -> ControllerResult<()> {
        if failures.is_empty() {
            info!(
                "event={} module=controller status=ok text_len={} notes={} points={}",
                event,
                text_len,
                self.notes.len(),
                self.points
            );
            return Ok(());
        }

        let err = ControllerError::WriteFailed(failures);
        error!(
            "event={} module=controller status=error text_len={} error={}",
            event, text_len, err
        );
        self.last_error = Some(ErrorSignal::from(&err));
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::{AddOutcome, ControllerError, ControllerPhase, ErrorKind, StateController};
    use crate::kv::{KeyValueStore, KvError, KvResult, MemoryKeyValueStore};
    use crate::repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;

    const KEY: &str = "test:points";

    struct FailingKv;

    impl KeyValueStore for FailingKv {
        fn get(&self, _key: &str) -> KvResult<Option<String>> {
            Ok(Some("5".to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> KvResult<()> {
            Err(KvError::Io {
                path: PathBuf::from("/unwritable"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    /// Vector-backed repository whose reads fail while `fail_reads` is set.
    struct SwitchableRepo {
        rows: Vec<String>,
        fail_reads: Rc<Cell<bool>>,
    }

    impl NoteRepository for SwitchableRepo {
        fn ensure_schema(&mut self) -> RepoResult<()> {
            Ok(())
        }

        fn insert(&mut self, value: &str) -> RepoResult<()> {
            self.rows.push(value.to_string());
            Ok(())
        }

        fn delete(&mut self, value: &str) -> RepoResult<usize> {
            let before = self.rows.len();
            self.rows.retain(|row| row != value);
            Ok(before - self.rows.len())
        }

        fn select_all(&self) -> RepoResult<Vec<String>> {
            if self.fail_reads.get() {
                return Err(RepoError::InvalidData("read disabled".to_string()));
            }
            Ok(self.rows.clone())
        }
    }

    fn ready_controller() -> StateController<SqliteNoteRepository, MemoryKeyValueStore> {
        let repo = SqliteNoteRepository::in_memory().unwrap();
        let mut controller = StateController::new(repo, MemoryKeyValueStore::new(), KEY);
        controller.load().unwrap();
        controller
    }

    #[test]
    fn actions_before_load_are_rejected() {
        let repo = SqliteNoteRepository::in_memory().unwrap();
        let mut controller = StateController::new(repo, MemoryKeyValueStore::new(), KEY);
        assert_eq!(controller.phase(), ControllerPhase::Uninitialized);

        let err = controller.add_note("A").unwrap_err();
        assert!(matches!(
            err,
            ControllerError::NotReady(ControllerPhase::Uninitialized)
        ));
        assert!(controller.notes().is_empty());
    }

    #[test]
    fn failed_reload_keeps_last_good_state() {
        let fail_reads = Rc::new(Cell::new(false));
        let repo = SwitchableRepo {
            rows: Vec::new(),
            fail_reads: Rc::clone(&fail_reads),
        };
        let mut controller = StateController::new(repo, MemoryKeyValueStore::new(), KEY);
        controller.load().unwrap();
        controller.add_note("A").unwrap();
        controller.add_note("B").unwrap();

        fail_reads.set(true);
        let err = controller.load().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ReadFailed);
        assert_eq!(controller.phase(), ControllerPhase::Ready);
        assert_eq!(controller.notes(), ["A", "B"]);
        assert_eq!(controller.points(), 2);
        let signal = controller.last_error().unwrap();
        assert_eq!(signal.kind, ErrorKind::ReadFailed);
        assert!(signal.message.contains("read disabled"));

        // Actions keep working against the retained state.
        controller.delete_note("A").unwrap();
        assert_eq!(controller.points(), 4);
    }

    #[test]
    fn failed_first_load_stays_uninitialized() {
        let repo = SwitchableRepo {
            rows: vec!["kept".to_string()],
            fail_reads: Rc::new(Cell::new(true)),
        };
        let mut controller = StateController::new(repo, MemoryKeyValueStore::new(), KEY);

        let err = controller.load().unwrap_err();
        assert!(matches!(err, ControllerError::ReadFailed(_)));
        assert_eq!(controller.phase(), ControllerPhase::Uninitialized);
        assert!(controller.notes().is_empty());
        assert_eq!(controller.last_error().unwrap().kind, ErrorKind::ReadFailed);
    }

    #[test]
    fn absent_counter_is_seeded_and_persisted() {
        let controller = ready_controller();
        assert_eq!(controller.points(), 0);
        let (_, kv) = controller.into_stores();
        assert_eq!(kv.get(KEY).unwrap().as_deref(), Some("0"));
    }

    #[test]
    fn malformed_counter_is_treated_as_zero() {
        let repo = SqliteNoteRepository::in_memory().unwrap();
        let kv = MemoryKeyValueStore::with_entries([(KEY, "not-a-number")]);
        let mut controller = StateController::new(repo, kv, KEY);
        controller.load().unwrap();
        assert_eq!(controller.points(), 0);

        controller.add_note("A").unwrap();
        assert_eq!(controller.points(), 1);
    }

    #[test]
    fn duplicate_add_is_a_no_op() {
        let mut controller = ready_controller();
        assert_eq!(controller.add_note("A").unwrap(), AddOutcome::Added);
        assert_eq!(controller.add_note("A").unwrap(), AddOutcome::Duplicate);
        assert_eq!(controller.add_note("a").unwrap(), AddOutcome::Added);
        assert_eq!(controller.notes(), ["A", "a"]);
        assert_eq!(controller.points(), 2);
    }

    #[test]
    fn write_failure_keeps_memory_and_sets_signal() {
        let repo = SqliteNoteRepository::in_memory().unwrap();
        let mut controller = StateController::new(repo, FailingKv, KEY);
        controller.load().unwrap();
        assert_eq!(controller.points(), 5);
        assert!(controller.last_error().is_none());

        let err = controller.add_note("A").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteFailed);
        assert_eq!(controller.notes(), ["A"]);
        assert_eq!(controller.points(), 6);

        let signal = controller.take_last_error().unwrap();
        assert_eq!(signal.kind, ErrorKind::WriteFailed);
        assert!(signal.message.contains("points store"));
        assert!(controller.last_error().is_none());

        // The note row still landed even though the counter did not.
        let (repo, _) = controller.into_stores();
        let stored: i64 = repo
            .connection()
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, 1);
    }
}
