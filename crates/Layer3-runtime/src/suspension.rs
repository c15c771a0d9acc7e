//! Suspension coordinator
//!
//! Human tasks park their resume handle here on `wait`; feedback writes the
//! answer into the environment and releases the handle.

use crate::environment::VariableEnvironment;
use crate::metadata::TaskMetadataCache;
use skillflow_foundation::{Error, Result};
use skillflow_task::{ActivityId, ResumeHandle};
use std::collections::HashMap;
use tracing::{debug, warn};

/// One outstanding human task
#[derive(Debug)]
pub struct PendingTask {
    resume: ResumeHandle,
}

impl PendingTask {
    pub fn activity_id(&self) -> &ActivityId {
        self.resume.activity_id()
    }
}

/// Outstanding human tasks of one execution instance
#[derive(Debug, Default)]
pub struct SuspensionCoordinator {
    pending: HashMap<ActivityId, PendingTask>,
}

impl SuspensionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a suspended human task
    ///
    /// A second `wait` for an id that is still outstanding fails the new
    /// handle; the live entry is kept.
    pub fn park(&mut self, resume: ResumeHandle) -> Result<()> {
        let id = resume.activity_id().clone();
        if self.pending.contains_key(&id) {
            warn!("Activity '{}' is already waiting for feedback", id);
            let message = format!("activity '{}' is already suspended", id);
            let _ = resume.fail(Error::Engine(message.clone()));
            return Err(Error::Engine(message));
        }

        debug!("Activity '{}' suspended", id);
        self.pending.insert(id, PendingTask { resume });
        Ok(())
    }

    /// Deliver feedback to a suspended human task
    ///
    /// The entry is removed before anything else, so a second feedback for the
    /// same id always yields `FeedbackMismatch`.
    pub fn handle_feedback(
        &mut self,
        activity_id: &ActivityId,
        text: &str,
        env: &mut VariableEnvironment,
        cache: &TaskMetadataCache,
    ) -> Result<()> {
        let task = self
            .pending
            .remove(activity_id)
            .ok_or_else(|| Error::feedback_mismatch(activity_id.as_str()))?;

        let output = match cache.lookup(activity_id) {
            Ok(descriptor) => descriptor.and_then(|d| d.output.non_empty_name()),
            Err(e) => {
                let message = e.to_string();
                let _ = task.resume.fail(e);
                return Err(Error::Engine(message));
            }
        };

        match output {
            Some(name) => env.set(name, text)?,
            None => debug!("Activity '{}' declares no output; feedback dropped", activity_id),
        }

        task.resume.resume()
    }

    pub fn is_pending(&self, activity_id: &ActivityId) -> bool {
        self.pending.contains_key(activity_id)
    }

    pub fn pending_ids(&self) -> Vec<ActivityId> {
        let mut ids: Vec<_> = self.pending.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Fail every outstanding task (instance teardown)
    pub fn fail_all<F>(&mut self, error: F)
    where
        F: Fn() -> Error,
    {
        for (_, task) in self.pending.drain() {
            let _ = task.resume.fail(error());
        }
    }
}
