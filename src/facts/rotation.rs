//! Rotation cursor and its persistence.

use crate::models::{RotationState, CYCLE};
use crate::report::writer::write_json_atomic;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Where the rotation cursor lives between runs.
pub trait RotationStore {
    /// The last saved cursor, or `None` if there is no usable one.
    fn load(&self) -> Result<Option<RotationState>>;

    fn save(&self, state: &RotationState) -> Result<()>;
}

/// Cursor stored as a JSON file.
///
/// A missing, unreadable or unparsable file loads as `None`; the run
/// then starts the cycle over instead of failing.
#[derive(Debug, Clone)]
pub struct FileRotationStore {
    path: PathBuf,
}

impl FileRotationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RotationStore for FileRotationStore {
    fn load(&self) -> Result<Option<RotationState>> {
        if !self.path.exists() {
            debug!("No rotation state at {}", self.path.display());
            return Ok(None);
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "Cannot read rotation state {}: {}; restarting cycle",
                    self.path.display(),
                    e
                );
                return Ok(None);
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!(
                    "Corrupt rotation state {}: {}; restarting cycle",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    fn save(&self, state: &RotationState) -> Result<()> {
        write_json_atomic(&self.path, state)
    }
}

/// Compute the cursor that follows `prior`.
///
/// No prior cursor, or one pointing outside the cycle, yields index 0.
pub fn next_state(prior: Option<&RotationState>, now: DateTime<Utc>) -> RotationState {
    let index = match prior {
        Some(p) if p.current_index < CYCLE.len() => (p.current_index + 1) % CYCLE.len(),
        Some(p) => {
            warn!(
                "Rotation index {} outside cycle of {}; restarting",
                p.current_index,
                CYCLE.len()
            );
            0
        }
        None => 0,
    };

    RotationState {
        current_index: index,
        current_category: CYCLE[index],
        last_updated: now,
    }
}

/// Load, advance and save the cursor. Returns the new cursor.
pub fn advance(store: &dyn RotationStore, now: DateTime<Utc>) -> Result<RotationState> {
    let prior = store.load()?;
    let next = next_state(prior.as_ref(), now);
    store.save(&next)?;
    debug!(
        "Rotation advanced to {} ({})",
        next.current_index, next.current_category
    );
    Ok(next)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Category;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Store that keeps the cursor in memory.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub state: RefCell<Option<RotationState>>,
    }

    impl RotationStore for MemoryStore {
        fn load(&self) -> Result<Option<RotationState>> {
            Ok(self.state.borrow().clone())
        }

        fn save(&self, state: &RotationState) -> Result<()> {
            *self.state.borrow_mut() = Some(state.clone());
            Ok(())
        }
    }

    fn state_at(index: usize) -> RotationState {
        RotationState {
            current_index: index,
            current_category: CYCLE[index % CYCLE.len()],
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_missing_state_starts_at_zero() {
        let next = next_state(None, Utc::now());
        assert_eq!(next.current_index, 0);
        assert_eq!(next.current_category, Category::Life);
    }

    #[test]
    fn test_round_robin_from_any_start() {
        for start in 0..CYCLE.len() {
            let store = MemoryStore::default();
            *store.state.borrow_mut() = Some(state_at(start));

            let mut seen = Vec::new();
            for _ in 0..7 {
                seen.push(advance(&store, Utc::now()).unwrap().current_index);
            }

            for (i, index) in seen.iter().enumerate() {
                assert_eq!(*index, (start + 1 + i) % 3);
            }
            // Category repeats every three invocations
            for i in 3..seen.len() {
                assert_eq!(CYCLE[seen[i]], CYCLE[seen[i - 3]]);
            }
        }
    }

    #[test]
    fn test_out_of_range_index_restarts() {
        let mut broken = state_at(0);
        broken.current_index = 9;
        let next = next_state(Some(&broken), Utc::now());
        assert_eq!(next.current_index, 0);
    }

    #[test]
    fn test_file_store_missing_and_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("rotation-state.json");
        let store = FileRotationStore::new(&path);

        assert!(store.load().unwrap().is_none());
        let first = advance(&store, Utc::now()).unwrap();
        assert_eq!(first.current_index, 0);
        assert!(path.exists());

        std::fs::write(&path, "{ not json").unwrap();
        let after_corrupt = advance(&store, Utc::now()).unwrap();
        assert_eq!(after_corrupt.current_index, 0);
    }

    #[test]
    fn test_file_store_persists_between_runs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rotation-state.json");

        advance(&FileRotationStore::new(&path), Utc::now()).unwrap();
        let second = advance(&FileRotationStore::new(&path), Utc::now()).unwrap();
        assert_eq!(second.current_index, 1);
        assert_eq!(second.current_category, Category::People);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["currentIndex"], 1);
        assert_eq!(raw["currentCategory"], "PEOPLE");
    }
}
