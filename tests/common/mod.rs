//! In-memory fleet used by the integration tests
//!
//! Behaves like one resource kind's control plane: resources are running or
//! stopped, may carry the keep-running tag, and every API call is recorded.

#![allow(dead_code)]

use async_trait::async_trait;
use resource_stopper::error::{Result, StopperError};
use resource_stopper::{ResourceId, ResourceKind, ResourceStopper};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListRunning,
    ListProtected(Vec<ResourceId>),
    Stop(Vec<ResourceId>),
}

#[derive(Debug, Clone)]
struct FakeResource {
    id: ResourceId,
    running: bool,
    keep_running: bool,
}

#[derive(Debug, Default)]
struct State {
    resources: Vec<FakeResource>,
    calls: Vec<Call>,
    fail_on: Option<&'static str>,
}

#[derive(Clone)]
pub struct FakeFleet {
    kind: ResourceKind,
    state: Arc<Mutex<State>>,
}

impl FakeFleet {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn running(self, id: &str) -> Self {
        self.add(id, true, false)
    }

    pub fn stopped(self, id: &str) -> Self {
        self.add(id, false, false)
    }

    pub fn protected(self, id: &str) -> Self {
        self.add(id, true, true)
    }

    /// Make the named operation fail: "list", "tags" or "stop"
    pub fn failing_on(self, operation: &'static str) -> Self {
        self.state.lock().unwrap().fail_on = Some(operation);
        self
    }

    fn add(self, id: &str, running: bool, keep_running: bool) -> Self {
        self.state.lock().unwrap().resources.push(FakeResource {
            id: id.to_string(),
            running,
            keep_running,
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn running_ids(&self) -> Vec<ResourceId> {
        self.state
            .lock()
            .unwrap()
            .resources
            .iter()
            .filter(|r| r.running)
            .map(|r| r.id.clone())
            .collect()
    }

    fn check(&self, operation: &'static str, api: &'static str) -> Result<()> {
        if self.state.lock().unwrap().fail_on == Some(operation) {
            return Err(StopperError::aws(self.kind, api)("simulated outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStopper for FakeFleet {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn list_running(&self) -> Result<Vec<ResourceId>> {
        self.state.lock().unwrap().calls.push(Call::ListRunning);
        self.check("list", "List")?;
        Ok(self.running_ids())
    }

    async fn list_protected(&self, candidates: &[ResourceId]) -> Result<Vec<ResourceId>> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(Call::ListProtected(candidates.to_vec()));
        self.check("tags", "ListTags")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .resources
            .iter()
            .filter(|r| r.keep_running && candidates.contains(&r.id))
            .map(|r| r.id.clone())
            .collect())
    }

    async fn stop(&self, ids: &[ResourceId]) -> Result<()> {
        self.state.lock().unwrap().calls.push(Call::Stop(ids.to_vec()));
        self.check("stop", "Stop")?;
        let mut state = self.state.lock().unwrap();
        for resource in state.resources.iter_mut() {
            if ids.contains(&resource.id) {
                resource.running = false;
            }
        }
        Ok(())
    }
}

pub fn ids(raw: &[&str]) -> Vec<ResourceId> {
    raw.iter().map(|s| s.to_string()).collect()
}
