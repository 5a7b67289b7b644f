//! Call accounting shared between a mock loader and its validators.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::validator::ValidatorFlags;

/// Counters for every capability call the mock observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub engaged: u32,
    pub disengaged: u32,
    pub blobs_created: u32,
    pub validations: u32,
    pub conversions: u32,
    /// Flags passed to the most recent validate call
    pub last_flags: Option<ValidatorFlags>,
}

impl CallCounts {
    /// True when every engagement has been released.
    pub fn is_balanced(&self) -> bool {
        self.engaged == self.disengaged
    }
}

/// Cloneable handle onto the shared counters.
#[derive(Debug, Clone, Default)]
pub struct MockCalls {
    inner: Arc<Mutex<CallCounts>>,
}

impl MockCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current counters.
    pub fn snapshot(&self) -> CallCounts {
        self.lock().clone()
    }

    pub(crate) fn record(&self, update: impl FnOnce(&mut CallCounts)) {
        update(&mut self.lock());
    }

    fn lock(&self) -> MutexGuard<'_, CallCounts> {
        // Counters stay usable even if a test panicked while holding them.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
