//! Forward-only stage tracking

use keel_core::{Error, Result};
use keel_plugin::LifecycleStage;

/// Tracks which stage the kernel has reached
///
/// Stages are entered one at a time, in order, exactly once.
#[derive(Debug, Default, Clone)]
pub struct Lifecycle {
    current: Option<LifecycleStage>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last stage entered, `None` before `plugins`
    pub fn current(&self) -> Option<LifecycleStage> {
        self.current
    }

    pub fn has_started(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.current == Some(LifecycleStage::Shutdown)
    }

    /// The stage that would be entered next
    pub fn upcoming(&self) -> Option<LifecycleStage> {
        match self.current {
            None => Some(LifecycleStage::first()),
            Some(stage) => stage.next(),
        }
    }

    /// Stages after the current one, up to and including `target`
    pub fn pending_until(&self, target: LifecycleStage) -> Result<Vec<LifecycleStage>> {
        if let Some(current) = self.current {
            if target <= current {
                return Err(Error::Lifecycle(format!(
                    "cannot advance to {}: already at {}",
                    target, current
                )));
            }
        }

        let start = self.upcoming().map(|s| s.index()).unwrap_or(LifecycleStage::ALL.len());
        Ok(LifecycleStage::ALL[start..=target.index()].to_vec())
    }

    /// Enter `stage`, which must be the upcoming one
    pub fn enter(&mut self, stage: LifecycleStage) -> Result<()> {
        if self.upcoming() != Some(stage) {
            return Err(Error::Lifecycle(format!(
                "stage {} out of order (current: {})",
                stage,
                self.current.map(|s| s.as_str()).unwrap_or("none")
            )));
        }
        self.current = Some(stage);
        Ok(())
    }
}
