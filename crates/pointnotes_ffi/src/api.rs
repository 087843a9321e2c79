//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose note list actions and the points counter to Dart via FRB.
//! - Keep error semantics simple: envelopes with `ok` and a message.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call opens its own store handles; nothing is shared globally
//!   except the resolved store location.

use log::warn;
use pointnotes_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AddOutcome, FileKeyValueStore, SqliteNoteRepository, StateController, StoreConfig,
};
use std::sync::OnceLock;

static STORE_CONFIG: OnceLock<StoreConfig> = OnceLock::new();

type Controller = StateController<SqliteNoteRepository, FileKeyValueStore>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Current note list and points, as loaded from the stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesStateResponse {
    /// Whether the stores were read successfully.
    pub ok: bool,
    /// Notes in insertion order.
    pub notes: Vec<String>,
    /// Points counter.
    pub points: u64,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

/// Result of an add/delete action, with the state after the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    /// Whether the action fully persisted.
    pub ok: bool,
    /// Whether the in-memory note list or points changed.
    pub changed: bool,
    /// Notes after the action.
    pub notes: Vec<String>,
    /// Points after the action.
    pub points: u64,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl NoteActionResponse {
    fn from_controller(controller: &Controller, ok: bool, changed: bool, message: String) -> Self {
        Self {
            ok,
            changed,
            notes: controller.notes().to_vec(),
            points: controller.points(),
            message,
        }
    }

    fn failure(message: String) -> Self {
        Self {
            ok: false,
            changed: false,
            notes: Vec::new(),
            points: 0,
            message,
        }
    }
}

/// Loads the persisted note list and points.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_load() -> NotesStateResponse {
    load_with(resolve_store_config())
}

/// Adds a note; trimmed empty input is rejected, duplicates are a no-op.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_add(text: String) -> NoteActionResponse {
    add_with(resolve_store_config(), text.as_str())
}

/// Deletes every note equal to the trimmed input and rewards the delete.
/// Trimmed empty input is rejected without touching the stores.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_delete(text: String) -> NoteActionResponse {
    delete_with(resolve_store_config(), text.as_str())
}

fn load_with(config: &StoreConfig) -> NotesStateResponse {
    match open_loaded(config) {
        Ok(controller) => {
            let snapshot = controller.snapshot();
            let message = format!("Loaded {} note(s).", snapshot.notes.len());
            NotesStateResponse {
                ok: true,
                notes: snapshot.notes,
                points: snapshot.points,
                message,
            }
        }
        Err(message) => NotesStateResponse {
            ok: false,
            notes: Vec::new(),
            points: 0,
            message: format!("notes_load failed: {message}"),
        },
    }
}

fn add_with(config: &StoreConfig, text: &str) -> NoteActionResponse {
    let text = text.trim();
    if text.is_empty() {
        return NoteActionResponse::failure("notes_add failed: note text is empty".to_string());
    }

    let mut controller = match open_loaded(config) {
        Ok(controller) => controller,
        Err(message) => {
            return NoteActionResponse::failure(format!("notes_add failed: {message}"));
        }
    };

    match controller.add_note(text) {
        Ok(AddOutcome::Added) => NoteActionResponse::from_controller(
            &controller,
            true,
            true,
            "Note added.".to_string(),
        ),
        Ok(AddOutcome::Duplicate) => NoteActionResponse::from_controller(
            &controller,
            true,
            false,
            "Note already exists.".to_string(),
        ),
        Err(err) => {
            warn!("event=ffi_notes_add module=ffi status=error error={err}");
            NoteActionResponse::from_controller(
                &controller,
                false,
                true,
                format!("notes_add failed: {err}"),
            )
        }
    }
}

fn delete_with(config: &StoreConfig, text: &str) -> NoteActionResponse {
    let text = text.trim();
    if text.is_empty() {
        return NoteActionResponse::failure("notes_delete failed: note text is empty".to_string());
    }

    let mut controller = match open_loaded(config) {
        Ok(controller) => controller,
        Err(message) => {
            return NoteActionResponse::failure(format!("notes_delete failed: {message}"));
        }
    };

    match controller.delete_note(text) {
        Ok(outcome) => NoteActionResponse::from_controller(
            &controller,
            true,
            true,
            format!("Removed {} note(s).", outcome.removed_in_memory),
        ),
        Err(err) => {
            warn!("event=ffi_notes_delete module=ffi status=error error={err}");
            NoteActionResponse::from_controller(
                &controller,
                false,
                true,
                format!("notes_delete failed: {err}"),
            )
        }
    }
}

fn open_loaded(config: &StoreConfig) -> Result<Controller, String> {
    let mut controller = StateController::open(config).map_err(|err| err.to_string())?;
    controller.load().map_err(|err| err.to_string())?;
    Ok(controller)
}

fn resolve_store_config() -> &'static StoreConfig {
    STORE_CONFIG.get_or_init(StoreConfig::from_env)
}

#[cfg(test)]
mod tests {
    use super::{add_with, core_version, delete_with, init_logging, load_with, ping};
    use pointnotes_core::StoreConfig;

    fn temp_config() -> (tempfile::TempDir, StoreConfig) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = StoreConfig::in_dir(dir.path());
        (dir, config)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn load_on_fresh_stores_is_empty() {
        let (_dir, config) = temp_config();
        let response = load_with(&config);
        assert!(response.ok, "{}", response.message);
        assert!(response.notes.is_empty());
        assert_eq!(response.points, 0);
    }

    #[test]
    fn add_trims_input_and_reports_duplicates() {
        let (_dir, config) = temp_config();

        let added = add_with(&config, "  Buy milk ");
        assert!(added.ok, "{}", added.message);
        assert!(added.changed);
        assert_eq!(added.notes, vec!["Buy milk".to_string()]);
        assert_eq!(added.points, 1);

        let duplicate = add_with(&config, "Buy milk");
        assert!(duplicate.ok);
        assert!(!duplicate.changed);
        assert_eq!(duplicate.points, 1);

        let reloaded = load_with(&config);
        assert_eq!(reloaded.notes, vec!["Buy milk".to_string()]);
    }

    #[test]
    fn add_rejects_blank_text() {
        let (_dir, config) = temp_config();
        let response = add_with(&config, "   ");
        assert!(!response.ok);
        assert!(response.message.contains("empty"));
        assert_eq!(load_with(&config).points, 0);
    }

    #[test]
    fn delete_rejects_blank_text_without_rewarding() {
        let (_dir, config) = temp_config();
        add_with(&config, "keep");

        let response = delete_with(&config, "  ");
        assert!(!response.ok);
        assert!(!response.changed);
        assert!(response.message.contains("empty"));

        let reloaded = load_with(&config);
        assert_eq!(reloaded.notes, vec!["keep".to_string()]);
        assert_eq!(reloaded.points, 1);
    }

    #[test]
    fn delete_persists_across_calls() {
        let (_dir, config) = temp_config();
        add_with(&config, "A");
        add_with(&config, "B");

        let deleted = delete_with(&config, "A");
        assert!(deleted.ok, "{}", deleted.message);
        assert_eq!(deleted.notes, vec!["B".to_string()]);
        assert_eq!(deleted.points, 4);

        let reloaded = load_with(&config);
        assert_eq!(reloaded.notes, vec!["B".to_string()]);
        assert_eq!(reloaded.points, 4);
    }
}
