//! Notifications about algorithm runs

use crate::error::AlgorithmError;
use parking_lot::Mutex;
use std::fmt;
use std::time::Duration;
use ulid::Ulid;

/// Receives lifecycle notifications from running algorithms
///
/// All methods default to doing nothing. Observers are called on the thread
/// running the algorithm and should return quickly.
pub trait AlgorithmObserver: Send + Sync + fmt::Debug {
    /// Execution is about to start
    fn started(&self, _id: Ulid, _name: &str, _version: u32) {}

    /// Progress in `[0, 1]`
    fn progress(&self, _id: Ulid, _name: &str, _fraction: f64, _message: &str) {}

    /// Execution succeeded
    fn finished(&self, _id: Ulid, _name: &str, _elapsed: Duration) {}

    /// Execution failed
    fn error(&self, _id: Ulid, _name: &str, _error: &AlgorithmError) {}
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    /// See [`AlgorithmObserver::started`]
    Started {
        /// Algorithm name
        name: String,
        /// Algorithm version
        version: u32,
    },
    /// See [`AlgorithmObserver::progress`]
    Progress {
        /// Algorithm name
        name: String,
        /// Fraction done
        fraction: f64,
        /// Message
        message: String,
    },
    /// See [`AlgorithmObserver::finished`]
    Finished {
        /// Algorithm name
        name: String,
    },
    /// See [`AlgorithmObserver::error`]
    Error {
        /// Algorithm name
        name: String,
        /// Rendered error
        message: String,
    },
}

/// Observer that keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    /// Empty recorder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the notifications so far
    #[must_use]
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().clone()
    }

    /// Names of algorithms that finished, in order
    #[must_use]
    pub fn finished(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ObserverEvent::Finished { name } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

impl AlgorithmObserver for RecordingObserver {
    fn started(&self, _id: Ulid, name: &str, version: u32) {
        self.events.lock().push(ObserverEvent::Started {
            name: name.to_string(),
            version,
        });
    }

    fn progress(&self, _id: Ulid, name: &str, fraction: f64, message: &str) {
        self.events.lock().push(ObserverEvent::Progress {
            name: name.to_string(),
            fraction,
            message: message.to_string(),
        });
    }

    fn finished(&self, _id: Ulid, name: &str, _elapsed: Duration) {
        self.events.lock().push(ObserverEvent::Finished {
            name: name.to_string(),
        });
    }

    fn error(&self, _id: Ulid, name: &str, error: &AlgorithmError) {
        self.events.lock().push(ObserverEvent::Error {
            name: name.to_string(),
            message: error.to_string(),
        });
    }
}
