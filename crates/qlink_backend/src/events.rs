//! Submission notification hook.
//!
//! Backends publish a [`JobEvent`] for every successfully submitted server
//! job. Subscribers are plain callbacks; the bus is cheaply cloneable so a
//! provider can share one bus across all of its backends.

use std::sync::{Arc, Mutex};

/// Notification payload for a successful submission
#[derive(Debug, Clone)]
pub struct JobEvent {
    /// Id of the submitted job
    pub job_id: String,

    /// Backend the job was submitted to
    pub backend_name: String,

    /// Composite id, when the job is a chunk of a composite submission
    pub composite_id: Option<String>,
}

type Callback = Box<dyn Fn(&JobEvent) + Send + Sync>;

/// Callback registry for submission notifications
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Callback>>>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback fired on every successful submission
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&JobEvent) + Send + Sync + 'static,
    {
        self.subscribers
            .lock()
            .expect("event bus lock poisoned")
            .push(Box::new(callback));
    }

    /// Publish an event to every subscriber
    pub fn publish(&self, event: &JobEvent) {
        for callback in self
            .subscribers
            .lock()
            .expect("event bus lock poisoned")
            .iter()
        {
            callback(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.subscribers.lock().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("EventBus").field("subscribers", &count).finish()
    }
}
