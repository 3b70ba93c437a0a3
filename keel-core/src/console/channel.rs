//! Named console output channels

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Lines a channel keeps before dropping the oldest
pub const HISTORY_LIMIT: usize = 1024;

/// Callback invoked for every line sent to a channel
pub type Watcher = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct ChannelState {
    lines: VecDeque<String>,
    watchers: Vec<Watcher>,
}

/// A named output sink
///
/// Cloning a channel yields another handle to the same buffer.
#[derive(Clone)]
pub struct Channel {
    name: Arc<str>,
    state: Arc<Mutex<ChannelState>>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("lines", &state.lines.len())
            .field("watchers", &state.watchers.len())
            .finish()
    }
}

impl Channel {
    /// Create a new, empty channel
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            state: Arc::new(Mutex::new(ChannelState::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record a line and forward it to watchers
    pub fn send(&self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(channel = %self.name, "{}", line);

        let watchers = {
            let mut state = self.state.lock();
            if state.lines.len() == HISTORY_LIMIT {
                state.lines.pop_front();
            }
            state.lines.push_back(line.clone());
            state.watchers.clone()
        };
        // Watchers run outside the lock so they may send again.
        for watcher in watchers {
            watcher(&line);
        }
    }

    /// Add a watcher for lines sent from now on
    pub fn watch(&self, watcher: impl Fn(&str) + Send + Sync + 'static) {
        self.state.lock().watchers.push(Arc::new(watcher));
    }

    /// Snapshot of the retained lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.state.lock().lines.iter().cloned().collect()
    }

    /// Most recent line, if any
    pub fn last(&self) -> Option<String> {
        self.state.lock().lines.back().cloned()
    }

    /// Drop the recorded lines, keeping watchers
    pub fn clear(&self) {
        self.state.lock().lines.clear();
    }
}
