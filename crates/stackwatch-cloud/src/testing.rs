//! Scripted in-memory provisioning client for tests
//!
//! Replays a fixed list of poll cycles. Each call to `describe_status`
//! advances to the next cycle; `list_events` answers from the cycle the
//! last `describe_status` selected. Once the script is exhausted the last
//! cycle repeats.

use crate::error::{ProvisioningError, Result};
use crate::provider::ProvisioningClient;
use crate::stack::{Capability, StackEvent, StackResource, StackStatus};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend answers for one poll cycle
#[derive(Debug, Clone)]
pub struct PollCycle {
    pub status: std::result::Result<StackStatus, String>,
    pub events: std::result::Result<Vec<StackEvent>, String>,
}

impl PollCycle {
    pub fn ok(status: StackStatus, events: Vec<StackEvent>) -> Self {
        Self {
            status: Ok(status),
            events: Ok(events),
        }
    }

    /// `describe_status` fails on this cycle
    pub fn status_error(message: impl Into<String>) -> Self {
        Self {
            status: Err(message.into()),
            events: Ok(Vec::new()),
        }
    }

    /// `describe_status` succeeds but `list_events` fails
    pub fn events_error(status: StackStatus, message: impl Into<String>) -> Self {
        Self {
            status: Ok(status),
            events: Err(message.into()),
        }
    }
}

/// Stack creation recorded by [`ScriptedProvisioner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub stack_name: String,
    pub template_body: String,
    pub capabilities: Vec<Capability>,
}

/// In-memory [`ProvisioningClient`] driven by a script of poll cycles
#[derive(Debug)]
pub struct ScriptedProvisioner {
    cycles: Vec<PollCycle>,
    resources: std::result::Result<Vec<StackResource>, String>,
    create_error: Option<String>,
    delete_error: Option<String>,

    describe_calls: AtomicUsize,
    event_calls: AtomicUsize,
    resource_calls: AtomicUsize,

    created: Mutex<Vec<CreateRequest>>,
    deleted: Mutex<Vec<String>>,
}

impl ScriptedProvisioner {
    pub fn new(cycles: Vec<PollCycle>) -> Self {
        Self {
            cycles,
            resources: Ok(Vec::new()),
            create_error: None,
            delete_error: None,
            describe_calls: AtomicUsize::new(0),
            event_calls: AtomicUsize::new(0),
            resource_calls: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_resources(mut self, resources: Vec<StackResource>) -> Self {
        self.resources = Ok(resources);
        self
    }

    pub fn with_resource_error(mut self, message: impl Into<String>) -> Self {
        self.resources = Err(message.into());
        self
    }

    pub fn with_create_error(mut self, message: impl Into<String>) -> Self {
        self.create_error = Some(message.into());
        self
    }

    pub fn with_delete_error(mut self, message: impl Into<String>) -> Self {
        self.delete_error = Some(message.into());
        self
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn event_calls(&self) -> usize {
        self.event_calls.load(Ordering::SeqCst)
    }

    pub fn resource_calls(&self) -> usize {
        self.resource_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<CreateRequest> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }

    fn cycle(&self, index: usize) -> Option<&PollCycle> {
        self.cycles
            .get(index)
            .or_else(|| self.cycles.last())
    }
}

#[async_trait]
impl ProvisioningClient for ScriptedProvisioner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn create_stack(
        &self,
        stack_name: &str,
        template_body: &str,
        capabilities: &[Capability],
    ) -> Result<()> {
        if let Some(message) = &self.create_error {
            return Err(ProvisioningError::Api(message.clone()));
        }
        if let Ok(mut created) = self.created.lock() {
            created.push(CreateRequest {
                stack_name: stack_name.to_string(),
                template_body: template_body.to_string(),
                capabilities: capabilities.to_vec(),
            });
        }
        Ok(())
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        if let Some(message) = &self.delete_error {
            return Err(ProvisioningError::Api(message.clone()));
        }
        if let Ok(mut deleted) = self.deleted.lock() {
            deleted.push(stack_name.to_string());
        }
        Ok(())
    }

    async fn describe_status(&self, stack_name: &str) -> Result<StackStatus> {
        let index = self.describe_calls.fetch_add(1, Ordering::SeqCst);
        match self.cycle(index).map(|c| &c.status) {
            Some(Ok(status)) => Ok(status.clone()),
            Some(Err(message)) => Err(ProvisioningError::Api(message.clone())),
            None => Err(ProvisioningError::StackNotFound(stack_name.to_string())),
        }
    }

    async fn list_events(&self, stack_name: &str) -> Result<Vec<StackEvent>> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        let index = self.describe_calls().saturating_sub(1);
        match self.cycle(index).map(|c| &c.events) {
            Some(Ok(events)) => Ok(events.clone()),
            Some(Err(message)) => Err(ProvisioningError::Api(message.clone())),
            None => Err(ProvisioningError::StackNotFound(stack_name.to_string())),
        }
    }

    async fn list_resources(&self, _stack_name: &str) -> Result<Vec<StackResource>> {
        self.resource_calls.fetch_add(1, Ordering::SeqCst);
        self.resources.clone().map_err(ProvisioningError::Api)
    }
}

/// Fixed timestamp used by [`event`]
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Event with the given id; the id doubles as the logical resource id
pub fn event(id: &str) -> StackEvent {
    StackEvent::new(id, base_time(), id, Some("CREATE_IN_PROGRESS".to_string()))
}
