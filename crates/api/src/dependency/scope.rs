use std::collections::{HashMap, VecDeque};
use std::fmt;

use tracing::debug;

use super::graph::NodeId;
use super::provider::{Instance, Teardown};

/// The mutable per-request state of dependency resolution.
///
/// Holds the resolution cache, so a provider runs at most once per request, and the pending
/// teardowns of scoped resources. Teardowns are kept newest first and run when the scope is closed
/// or dropped, whichever comes first. Dropping covers every exit path: success, a failed provider,
/// a failed handler and a cancelled request future.
#[derive(Default)]
pub struct RequestScope {
    cache: HashMap<NodeId, Instance>,
    teardowns: VecDeque<(String, Teardown)>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn cached(&self, id: NodeId) -> Option<Instance> {
        self.cache.get(&id).cloned()
    }

    pub(crate) fn store(&mut self, id: NodeId, value: Instance) {
        self.cache.insert(id, value);
    }

    /// Registers a teardown; it runs before every teardown registered earlier.
    pub fn defer(&mut self, owner: impl Into<String>, teardown: Teardown) {
        self.teardowns.push_front((owner.into(), teardown));
    }

    /// Number of teardowns that have not run yet.
    pub fn pending(&self) -> usize {
        self.teardowns.len()
    }

    /// Runs every pending teardown, most recently acquired first.
    pub fn close(mut self) {
        self.run_teardowns();
    }

    fn run_teardowns(&mut self) {
        while let Some((owner, teardown)) = self.teardowns.pop_front() {
            debug!(provider = %owner, "tearing down");
            teardown();
        }
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if !self.teardowns.is_empty() {
            debug!(pending = self.teardowns.len(), "request scope dropped with pending teardowns");
            self.run_teardowns();
        }
    }
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owners: Vec<&str> = self.teardowns.iter().map(|(owner, _)| owner.as_str()).collect();
        f.debug_struct("RequestScope").field("cached", &self.cache.len()).field("teardowns", &owners).finish()
    }
}
