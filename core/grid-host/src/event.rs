//! FILENAME: core/grid-host/src/event.rs
//! PURPOSE: Grid change events and the listener registry.
//! CONTEXT: The in-process rendition of the host element's bubbling
//! CustomEvents. The single-sort and multi-sort payload shapes stay
//! distinct; consumers know which plugin is active. Dispatch is always
//! synchronous and always happens after the epoch bump, so a listener
//! reacting to a sort change observes a consistent epoch.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sort_engine::SortModel;

/// A change announced by the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GridEvent {
    /// Single-column sort changed; direction `0` means cleared.
    SortChange { field: String, direction: i8 },

    /// The multi-sort model changed; carries the full ordered model.
    MultiSortChange { sort_model: SortModel },
}

pub type GridEventListener = Arc<dyn Fn(&GridEvent) + Send + Sync>;

/// Ordered listener list. Listeners fire synchronously, in subscription
/// order.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Vec<GridEventListener>,
}

impl EventEmitter {
    pub fn new() -> Self {
        EventEmitter::default()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&GridEvent) + Send + Sync + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    pub fn emit(&self, event: &GridEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
