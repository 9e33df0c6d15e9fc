// crates/resilience/src/tasks.rs
//! Cancellable background tasks keyed by resource id
//!
//! At most one task runs per key. Spawning under a key that already has a
//! task aborts the old one first. Each spawn gets a fresh `Generation`, which
//! the task's completion message carries back so the owner can tell a current
//! completion from one that raced with a cancel.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use tokio::task::JoinHandle;

/// Monotonic tag identifying one spawn of a keyed task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Returns the raw counter value
    pub fn value(&self) -> u64 {
        self.0
    }
}

struct TaskEntry {
    generation: Generation,
    handle: JoinHandle<()>,
}

/// Registry of abortable tokio tasks, one per key
pub struct KeyedTasks<K> {
    tasks: HashMap<K, TaskEntry>,
    next_generation: u64,
}

impl<K> KeyedTasks<K>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Returns the generation the next spawn will receive
    pub fn next_generation(&self) -> Generation {
        Generation(self.next_generation + 1)
    }

    /// Spawns `future` under `key`, aborting any task already running there
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, key: K, future: F) -> Generation
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel(&key);

        self.next_generation += 1;
        let generation = Generation(self.next_generation);
        let handle = tokio::spawn(future);

        self.tasks.insert(key, TaskEntry { generation, handle });
        generation
    }

    /// Aborts the task under `key`; returns true if one was running
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.tasks.remove(key) {
            Some(entry) => {
                entry.handle.abort();
                log::trace!("Cancelled task {:?} ({:?})", key, entry.generation);
                true
            }
            None => false,
        }
    }

    /// Aborts every task whose key fails `keep`; returns how many were aborted
    pub fn retain<P>(&mut self, mut keep: P) -> usize
    where
        P: FnMut(&K) -> bool,
    {
        let stale: Vec<K> = self.tasks.keys().filter(|k| !keep(k)).cloned().collect();
        for key in &stale {
            self.cancel(key);
        }
        stale.len()
    }

    /// Aborts every task
    pub fn cancel_all(&mut self) {
        for (_, entry) in self.tasks.drain() {
            entry.handle.abort();
        }
    }

    /// Marks the task under `key` as finished if `generation` is current
    ///
    /// Returns false for a completion from a superseded or cancelled spawn,
    /// which the caller should discard.
    pub fn complete(&mut self, key: &K, generation: Generation) -> bool {
        match self.tasks.get(key) {
            Some(entry) if entry.generation == generation => {
                self.tasks.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Returns true if a task is registered under `key`
    pub fn is_running(&self, key: &K) -> bool {
        self.tasks.contains_key(key)
    }

    /// Returns the generation registered under `key`
    pub fn generation(&self, key: &K) -> Option<Generation> {
        self.tasks.get(key).map(|entry| entry.generation)
    }

    /// Returns the number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no tasks are registered
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<K> Default for KeyedTasks<K>
where
    K: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for KeyedTasks<K> {
    fn drop(&mut self) {
        for (_, entry) in self.tasks.drain() {
            entry.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_spawn_and_complete() {
        let mut tasks = KeyedTasks::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let generation = tasks.next_generation();
        let spawned = tasks.spawn("a", async move {
            let _ = tx.send(generation);
        });
        assert_eq!(spawned, generation);
        assert!(tasks.is_running(&"a"));

        let reported = rx.recv().await.unwrap();
        assert!(tasks.complete(&"a", reported));
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_respawn_supersedes_previous() {
        let mut tasks = KeyedTasks::new();
        let first = tasks.spawn("chapter", std::future::pending());
        let second = tasks.spawn("chapter", std::future::pending());

        assert_ne!(first, second);
        assert_eq!(tasks.len(), 1);
        assert!(!tasks.complete(&"chapter", first));
        assert!(tasks.complete(&"chapter", second));
    }

    #[tokio::test]
    async fn test_cancel_aborts_task() {
        let mut tasks = KeyedTasks::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        tasks.spawn(1u32, async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let _ = tx.send(());
        });

        assert!(tasks.cancel(&1));
        assert!(!tasks.cancel(&1));
        // The sender is dropped with the aborted task
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_retain_cancels_unwanted_keys() {
        let mut tasks = KeyedTasks::new();
        for key in ["1-chapter-1", "1-chapter-2", "2-chapter-1"] {
            tasks.spawn(key.to_string(), std::future::pending());
        }

        let cancelled = tasks.retain(|k| k.starts_with("2-"));
        assert_eq!(cancelled, 2);
        assert_eq!(tasks.len(), 1);
        assert!(tasks.is_running(&"2-chapter-1".to_string()));
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let mut tasks = KeyedTasks::new();
        tasks.spawn('a', std::future::pending());
        tasks.spawn('b', std::future::pending());
        tasks.cancel_all();
        assert!(tasks.is_empty());
    }
}
