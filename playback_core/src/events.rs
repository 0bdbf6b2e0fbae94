//! Story events and the synchronous event channel.
//!
//! Events are observations for logging and UI layers. They never feed back
//! into playback decisions. Subscribers run in registration order during the
//! emitting call; a subscriber that errors or panics is logged and skipped so
//! the remaining subscribers still see the event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use story_graph::{Condition, GroupOperator, LinkId, NodeId, NodeKind};

use crate::conditions::ConditionOutcome;
use crate::state::OperationRecord;

/// A timestamped story event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: StoryEventKind,
}

impl StoryEvent {
    /// Create an event stamped with the current time.
    pub fn new(kind: StoryEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Everything the engine reports to observers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum StoryEventKind {
    #[serde(rename = "node.visited")]
    NodeVisited {
        node_id: NodeId,
        node_name: String,
        node_type: NodeKind,
    },

    #[serde(rename = "choice.selected")]
    ChoiceSelected { node_id: NodeId, choice: String },

    #[serde(rename = "navigation.back")]
    NavigationBack {
        from_node_id: NodeId,
        to_node_id: Option<NodeId>,
    },

    #[serde(rename = "story.restarted")]
    StoryRestarted { start_node_id: Option<NodeId> },

    #[serde(rename = "operation.executed")]
    OperationExecuted {
        node_id: NodeId,
        record: OperationRecord,
    },

    #[serde(rename = "operations.rolledback")]
    OperationsRolledBack { node_id: NodeId, count: usize },

    #[serde(rename = "condition.evaluated")]
    ConditionEvaluated {
        node_id: Option<NodeId>,
        edge_id: Option<LinkId>,
        condition: Condition,
        result: bool,
        group_operator: GroupOperator,
    },

    #[serde(rename = "condition.group.evaluated")]
    ConditionGroupEvaluated {
        node_id: Option<NodeId>,
        edge_id: Option<LinkId>,
        conditions: Vec<ConditionOutcome>,
        group_operator: GroupOperator,
        group_result: bool,
    },
}

impl StoryEventKind {
    /// Dotted event name, as used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            StoryEventKind::NodeVisited { .. } => "node.visited",
            StoryEventKind::ChoiceSelected { .. } => "choice.selected",
            StoryEventKind::NavigationBack { .. } => "navigation.back",
            StoryEventKind::StoryRestarted { .. } => "story.restarted",
            StoryEventKind::OperationExecuted { .. } => "operation.executed",
            StoryEventKind::OperationsRolledBack { .. } => "operations.rolledback",
            StoryEventKind::ConditionEvaluated { .. } => "condition.evaluated",
            StoryEventKind::ConditionGroupEvaluated { .. } => "condition.group.evaluated",
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Outcome of a subscriber call. Errors are logged, never propagated.
pub type SubscriberResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Handler = Box<dyn Fn(&StoryEvent) -> SubscriberResult>;

/// Synchronous publish/subscribe channel for story events.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
}

impl EventBus {
    /// Create an event bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Subscribers are called in registration order.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&StoryEvent) -> SubscriberResult + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Stamp and publish an event.
    pub fn emit(&self, kind: StoryEventKind) {
        self.publish(StoryEvent::new(kind));
    }

    /// Publish an already-built event to every subscriber.
    pub fn publish(&self, event: StoryEvent) {
        debug!(event = event.name(), timestamp = %event.timestamp, "Story event");

        for (id, handler) in &self.subscribers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(
                        subscriber = id.0,
                        event = event.name(),
                        error = %err,
                        "Event subscriber failed"
                    );
                }
                Err(_) => {
                    warn!(
                        subscriber = id.0,
                        event = event.name(),
                        "Event subscriber panicked"
                    );
                }
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
