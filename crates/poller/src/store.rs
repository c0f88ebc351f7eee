//! Last-known notification list for one account.

use std::sync::Arc;

use serde_json::Value;

/// Holds the current notifications. Every update replaces the whole list.
#[derive(Debug, Clone)]
pub struct NotificationStore {
    items: Arc<[Value]>,
}

impl NotificationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            items: Arc::from(Vec::new()),
        }
    }

    /// Replaces the list and returns the previous count.
    pub fn replace(&mut self, items: Vec<Value>) -> usize {
        let previous = self.items.len();
        self.items = Arc::from(items);
        previous
    }

    /// Number of notifications held.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Cheap shared handle to the current list.
    pub fn snapshot(&self) -> Arc<[Value]> {
        Arc::clone(&self.items)
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}
