//! Progress store: local durable slots for the in-progress draft and the
//! current registration reference.
//!
//! | Slot         | Contents                                  |
//! |--------------|-------------------------------------------|
//! | `user-state` | JSON-serialized [`RegistrationDraft`]     |
//! | `current-id` | registration reference, as a plain string |
//!
//! The store is local-only state, never a source of truth. A slot that is
//! absent or fails to parse reads back as "no progress"; that is logged and
//! never surfaced to the caller.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::draft::RegistrationDraft;
use crate::errors::Result;
use crate::submitter::RegistrationReference;

pub const DRAFT_SLOT: &str = "user-state";
pub const REFERENCE_SLOT: &str = "current-id";

/// Named string slots plus the funnel operations layered on top of them.
///
/// Implementors only provide the three slot primitives. Writes take
/// `&mut self`: a store belongs to exactly one session.
pub trait ProgressStore {
    fn read_slot(&self, key: &str) -> Option<String>;

    fn write_slot(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removing a slot that does not exist is not an error.
    fn remove_slot(&mut self, key: &str) -> Result<()>;

    /// Persist the whole draft, replacing whatever was stored before.
    fn save(&mut self, draft: &RegistrationDraft) -> Result<()> {
        let json = serde_json::to_string(draft)?;
        self.write_slot(DRAFT_SLOT, &json)
    }

    /// Last saved draft, or an empty draft when none is stored or the
    /// stored value is unreadable.
    fn load(&self) -> RegistrationDraft {
        let Some(raw) = self.read_slot(DRAFT_SLOT) else {
            return RegistrationDraft::default();
        };
        match serde_json::from_str(&raw) {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Discarding unreadable saved progress: {e}");
                RegistrationDraft::default()
            }
        }
    }

    fn save_reference(&mut self, reference: &RegistrationReference) -> Result<()> {
        self.write_slot(REFERENCE_SLOT, reference.as_str())
    }

    fn load_reference(&self) -> Option<RegistrationReference> {
        self.read_slot(REFERENCE_SLOT)
            .and_then(|raw| RegistrationReference::parse(&raw))
    }

    fn clear_reference(&mut self) -> Result<()> {
        self.remove_slot(REFERENCE_SLOT)
    }

    /// Remove both slots. Calling it on an already empty store is a no-op.
    fn clear_all(&mut self) -> Result<()> {
        self.remove_slot(REFERENCE_SLOT)?;
        self.remove_slot(DRAFT_SLOT)
    }
}

// ─────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────

/// Process-local store. Survives nothing; used by tests and embedders that
/// bring their own persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    slots: HashMap<String, String>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn read_slot(&self, key: &str) -> Option<String> {
        self.slots.get(key).cloned()
    }

    fn write_slot(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_slot(&mut self, key: &str) -> Result<()> {
        self.slots.remove(key);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────
// File-backed store
// ─────────────────────────────────────────────────────────

/// One file per slot inside a state directory.
///
/// Writes go to a sibling temp file that is then renamed over the slot, so
/// a crash mid-write leaves either the old value or the new one.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    dir: PathBuf,
}

impl FileProgressStore {
    /// Open (and create if needed) the state directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Progress store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.slot"))
    }
}

impl ProgressStore for FileProgressStore {
    fn read_slot(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Treating unreadable slot {key} as empty: {e}");
                None
            }
        }
    }

    fn write_slot(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key);
        let tmp = self.dir.join(format!(".{key}.tmp"));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_slot(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.slot_path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
