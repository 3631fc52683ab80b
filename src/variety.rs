use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{FramefxError, FramefxResult};

/// Durable assignment state persisted as pretty-printed JSON.
///
/// Invariants:
/// - within one cycle no item appears in `used` twice;
/// - a video's entry in `assignments` is immutable once written, even across
///   cycle resets.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AssignmentStore {
    pub assignments: BTreeMap<String, String>,
    pub used: BTreeSet<String>,
    pub cycle_count: u64,
    pub assign_count: u64,
}

impl AssignmentStore {
    /// Load the store from disk.
    ///
    /// A missing, unreadable, or corrupt file falls back to empty defaults
    /// rather than failing the caller. This is deliberate lossy recovery:
    /// previously-stable assignments may become reassignable afterwards.
    pub fn load_or_default(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "assignment store is corrupt; resetting to empty defaults"
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> FramefxResult<()> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| FramefxError::store(format!("failed to serialize store: {e}")))?;
        std::fs::write(path, raw).map_err(|e| {
            FramefxError::store(format!(
                "failed to write store '{}': {e}",
                path.display()
            ))
        })
    }
}

/// Assigns each video id a unique item from a finite pool, rotating the pool
/// once exhausted, with synchronous persistence after every new assignment.
///
/// Not safe to share one store file between concurrent allocator instances:
/// the read-modify-write has no cross-process locking, so racing instances can
/// hand out duplicates or lose updates. Keep one owning allocator per store.
#[derive(Debug)]
pub struct VarietyAllocator {
    path: PathBuf,
    store: AssignmentStore,
    rng: ChaCha8Rng,
}

impl VarietyAllocator {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with_rng(path, ChaCha8Rng::from_entropy())
    }

    /// Deterministic variant for tests.
    pub fn open_seeded(path: impl Into<PathBuf>, seed: u64) -> Self {
        Self::open_with_rng(path, ChaCha8Rng::seed_from_u64(seed))
    }

    fn open_with_rng(path: impl Into<PathBuf>, rng: ChaCha8Rng) -> Self {
        let path = path.into();
        let store = AssignmentStore::load_or_default(&path);
        Self { path, store, rng }
    }

    pub fn store(&self) -> &AssignmentStore {
        &self.store
    }

    /// Return the stable item for `video_id`, assigning one from `pool` if the
    /// video has none yet.
    ///
    /// A recorded assignment is returned unchanged regardless of the pool's
    /// current contents. New assignments are drawn uniformly from the items
    /// not yet used this cycle; an exhausted cycle clears the used set and
    /// makes the whole pool eligible again. The store is persisted before the
    /// new assignment is returned.
    pub fn assign(&mut self, video_id: &str, pool: &[String]) -> FramefxResult<String> {
        if let Some(item) = self.store.assignments.get(video_id) {
            return Ok(item.clone());
        }
        if pool.is_empty() {
            return Err(FramefxError::validation("assignment pool must be non-empty"));
        }

        let mut available: Vec<&String> = pool
            .iter()
            .filter(|item| !self.store.used.contains(*item))
            .collect();
        if available.is_empty() {
            self.store.used.clear();
            self.store.cycle_count += 1;
            available = pool.iter().collect();
        }

        let chosen = available
            .choose(&mut self.rng)
            .ok_or_else(|| FramefxError::validation("assignment pool must be non-empty"))?
            .to_string();

        self.store
            .assignments
            .insert(video_id.to_string(), chosen.clone());
        self.store.used.insert(chosen.clone());
        self.store.assign_count += 1;
        self.store.save(&self.path)?;
        Ok(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "framefx_{name}_{}_{}.json",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    fn pool(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn assign_is_idempotent_per_video_id() {
        let path = temp_store("idempotent");
        let mut alloc = VarietyAllocator::open_seeded(&path, 7);
        let first = alloc.assign("vid-a", &pool(&["x", "y", "z"])).unwrap();
        // Second call with a different pool still returns the recorded item.
        let second = alloc.assign("vid-a", &pool(&["only"])).unwrap();
        assert_eq!(first, second);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_pool_is_rejected() {
        let path = temp_store("empty_pool");
        let mut alloc = VarietyAllocator::open_seeded(&path, 7);
        assert!(alloc.assign("vid-a", &[]).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn corrupt_store_resets_to_defaults() {
        let path = temp_store("corrupt");
        std::fs::write(&path, "{not json").unwrap();
        let alloc = VarietyAllocator::open_seeded(&path, 7);
        assert_eq!(*alloc.store(), AssignmentStore::default());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn partial_store_fills_missing_fields_with_defaults() {
        let path = temp_store("partial");
        std::fs::write(&path, r#"{ "assignments": { "v": "x" } }"#).unwrap();
        let alloc = VarietyAllocator::open_seeded(&path, 7);
        assert_eq!(alloc.store().assignments.len(), 1);
        assert_eq!(alloc.store().cycle_count, 0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn assignments_survive_reopen() {
        let path = temp_store("reopen");
        let items = pool(&["a", "b", "c"]);
        let first = {
            let mut alloc = VarietyAllocator::open_seeded(&path, 1);
            alloc.assign("vid-a", &items).unwrap()
        };
        let mut alloc = VarietyAllocator::open_seeded(&path, 99);
        assert_eq!(alloc.assign("vid-a", &items).unwrap(), first);
        std::fs::remove_file(&path).ok();
    }
}
