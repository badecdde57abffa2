//! The single authoritative campaign snapshot.
//!
//! Reads hand out independent copies, writes go through one
//! mutate-and-commit path that stamps metadata, persists (best effort) and
//! notifies subscribers in registration order. Everything runs on one thread;
//! listeners may write back into the store, which simply starts another
//! commit and notification pass.
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::constants::{BACKUP_KEY, STATE_VERSION, STORAGE_KEY};
use crate::state::{AppState, StatePatch};
use crate::storage::{NoStorage, StateStorage};

/// Sections an imported snapshot must carry.
const REQUIRED_SECTIONS: [&str; 3] = ["meta", "party", "dungeon"];

type Listener = Rc<dyn Fn(AppState)>;

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Import payload is not an object")]
    NotAnObject,
    #[error("Import payload missing state property")]
    MissingState,
    #[error("Import state missing required section `{0}`")]
    MissingSection(&'static str),
    #[error("Invalid state metadata")]
    InvalidMetadata,
    #[error("Unsupported state version {found} (expected {expected})")]
    VersionMismatch {
        found: String,
        expected: &'static str,
    },
    #[error("Import state is malformed: {0}")]
    MalformedState(#[source] serde_json::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Portable wrapper produced by [`Store::export_state`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub exported_at: String,
    pub schema_version: String,
    pub state: AppState,
}

pub struct Store<S: StateStorage> {
    current: RefCell<AppState>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_listener: Cell<u64>,
    storage: S,
}

impl Store<NoStorage> {
    /// Store with no durable backend, starting from the default snapshot.
    #[must_use]
    pub fn detached() -> Self {
        Self::with_initial(AppState::default(), NoStorage)
    }
}

impl<S: StateStorage> Store<S> {
    /// Open the store, preferring a persisted snapshot of the current schema
    /// version and falling back to the default state.
    pub fn open(storage: S) -> Self {
        let initial = load_persisted(&storage).unwrap_or_default();
        Self::with_initial(initial, storage)
    }

    /// Start from an explicit snapshot without consulting storage.
    pub fn with_initial(initial: AppState, storage: S) -> Self {
        Self {
            current: RefCell::new(initial),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            storage,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Independent copy of the current snapshot.
    #[must_use]
    pub fn get_state(&self) -> AppState {
        self.current.borrow().clone()
    }

    /// Project part of the current snapshot without copying all of it.
    pub fn read<T>(&self, project: impl FnOnce(&AppState) -> T) -> T {
        project(&self.current.borrow())
    }

    /// Apply `mutator` to a copy of the current snapshot and commit it.
    /// If the mutator panics, the draft is dropped and nothing is committed.
    pub fn update<T>(&self, mutator: impl FnOnce(&mut AppState) -> T) -> T {
        let mut draft = self.get_state();
        let out = mutator(&mut draft);
        self.commit(draft);
        out
    }

    /// Fallible [`Store::update`]: an `Err` discards the draft.
    ///
    /// # Errors
    ///
    /// Propagates whatever error the mutator returns.
    pub fn try_update<T, E>(
        &self,
        mutator: impl FnOnce(&mut AppState) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut draft = self.get_state();
        let out = mutator(&mut draft)?;
        self.commit(draft);
        Ok(out)
    }

    /// Replace whole top-level sections.
    pub fn set_state(&self, patch: StatePatch) {
        let mut next = self.get_state();
        patch.apply(&mut next);
        self.commit(next);
    }

    pub fn reset(&self) {
        self.commit(AppState::default());
    }

    pub fn subscribe(&self, listener: impl Fn(AppState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Serialize the current snapshot inside an export envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized.
    pub fn export_state(&self) -> Result<String, StoreError> {
        Self::export_snapshot(&self.current.borrow())
    }

    /// Serialize an arbitrary snapshot inside an export envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized.
    pub fn export_snapshot(snapshot: &AppState) -> Result<String, StoreError> {
        let envelope = ExportEnvelope {
            exported_at: Utc::now().to_rfc3339(),
            schema_version: STATE_VERSION.to_string(),
            state: snapshot.clone(),
        };
        Ok(serde_json::to_string_pretty(&envelope)?)
    }

    /// Validate an exported envelope and commit its snapshot as-is.
    ///
    /// The store is untouched unless validation fully passes; the previous
    /// snapshot is written to the backup key before the import commits.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] describing the first validation failure.
    pub fn import_state(&self, raw: &str) -> Result<(), StoreError> {
        let payload: Value = serde_json::from_str(raw).map_err(StoreError::InvalidJson)?;
        let Value::Object(mut envelope) = payload else {
            return Err(StoreError::NotAnObject);
        };
        let candidate = envelope
            .remove("state")
            .filter(|value| !value.is_null())
            .ok_or(StoreError::MissingState)?;
        let Some(sections) = candidate.as_object() else {
            return Err(StoreError::MissingState);
        };
        for section in REQUIRED_SECTIONS {
            if !sections.contains_key(section) {
                return Err(StoreError::MissingSection(section));
            }
        }
        let version = candidate
            .get("meta")
            .and_then(|meta| meta.get("version"))
            .and_then(Value::as_str)
            .ok_or(StoreError::InvalidMetadata)?;
        if version != STATE_VERSION {
            return Err(StoreError::VersionMismatch {
                found: version.to_string(),
                expected: STATE_VERSION,
            });
        }
        let next: AppState =
            serde_json::from_value(candidate).map_err(StoreError::MalformedState)?;

        match serde_json::to_string(&*self.current.borrow()) {
            Ok(backup) => {
                if let Err(err) = self.storage.write(BACKUP_KEY, &backup) {
                    log::warn!("could not write pre-import backup: {err}");
                }
            }
            Err(err) => log::warn!("could not serialize pre-import backup: {err}"),
        }
        log::info!("importing campaign snapshot (turn {})", next.dungeon.turn);
        self.commit(next);
        Ok(())
    }

    fn commit(&self, mut next: AppState) {
        next.meta.version = STATE_VERSION.to_string();
        next.meta.last_updated = Utc::now().timestamp_millis();

        match serde_json::to_string(&next) {
            Ok(payload) => {
                if let Err(err) = self.storage.write(STORAGE_KEY, &payload) {
                    log::warn!("state not persisted: {err}");
                }
            }
            Err(err) => log::warn!("state not serializable, skipping persistence: {err}"),
        }

        *self.current.borrow_mut() = next;

        // Listeners may subscribe, unsubscribe or commit while we iterate.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        if listeners.is_empty() {
            return;
        }
        let snapshot = self.get_state();
        for listener in listeners {
            listener(snapshot.clone());
        }
    }
}

fn load_persisted<S: StateStorage>(storage: &S) -> Option<AppState> {
    let raw = match storage.read(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            log::warn!("persisted state unreadable: {err}");
            return None;
        }
    };
    let value: Value = serde_json::from_str(&raw)
        .map_err(|err| log::warn!("persisted state is not JSON: {err}"))
        .ok()?;
    let version = value
        .get("meta")
        .and_then(|meta| meta.get("version"))
        .and_then(Value::as_str);
    if version != Some(STATE_VERSION) {
        log::info!("ignoring persisted state with version {version:?}");
        return None;
    }
    serde_json::from_value(value)
        .map_err(|err| log::warn!("persisted state does not match schema: {err}"))
        .ok()
}
