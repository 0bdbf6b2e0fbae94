//! Story Engine - the playback state machine.
//!
//! The engine owns the loaded story and the [`GameState`]. Every public
//! operation runs to completion synchronously and hands the state to the
//! resolver and executor by reference for the duration of that call only.
//!
//! Conceptual states:
//! - **Uninitialized**: no story; every operation is a logged no-op
//! - **Idle at node**: waiting for a visit, choice, back or restart
//! - **Restarting**: state reset to defaults, back to idle at the start node
//!
//! Nothing here panics or returns errors during playback: failures are
//! logged with `tracing` and produce `None`, an empty list or no change.

mod display;

pub use display::DisplayMode;

use chrono::Utc;
use rand::RngCore;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use story_graph::{
    ChoiceNode, Link, LinkId, Node, NodeId, StoryData, VariableId, VariableKind, VariableValue,
};

use crate::conditions::strategies::{as_bool, as_number};
use crate::conditions::LinkEvaluation;
use crate::config::EngineConfig;
use crate::error::PlaybackError;
use crate::events::{EventBus, StoryEvent, StoryEventKind, SubscriberResult, SubscriptionId};
use crate::operations::OperationsExecutor;
use crate::resolver::{PathResolution, PathResolver};
use crate::state::{ConditionRecord, GameState};

/// An option the player can pick at a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AvailableChoice {
    /// A real choice node reachable from the current node.
    Choice { node: ChoiceNode, link_id: LinkId },
    /// Synthetic "Continue" standing in for an automatic narrative step.
    Continue { target: NodeId, link_id: LinkId },
}

impl AvailableChoice {
    pub const CONTINUE_LABEL: &'static str = "Continue";

    pub fn label(&self) -> &str {
        match self {
            AvailableChoice::Choice { node, .. } => &node.text,
            AvailableChoice::Continue { .. } => Self::CONTINUE_LABEL,
        }
    }

    /// Node to act on: the choice node, or the continuation target.
    pub fn node_id(&self) -> &NodeId {
        match self {
            AvailableChoice::Choice { node, .. } => &node.id,
            AvailableChoice::Continue { target, .. } => target,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, AvailableChoice::Continue { .. })
    }
}

/// Plays a story graph.
pub struct StoryEngine {
    config: EngineConfig,
    story: Option<StoryData>,

    /// Index: node id -> node.
    nodes: HashMap<NodeId, Node>,
    /// Index: node id -> outgoing links, in authoring order.
    outgoing: HashMap<NodeId, Vec<Link>>,
    /// Nodes that are the target of at least one link.
    has_incoming: HashSet<NodeId>,

    state: GameState,
    rng: Box<dyn RngCore>,
    events: EventBus,
    resolver: PathResolver,
    executor: OperationsExecutor,

    /// Set on initialize/restart, cleared by the first explicit advance.
    awaiting_first_advance: bool,
}

impl Default for StoryEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl StoryEngine {
    /// Create an engine with no story loaded.
    pub fn new(config: EngineConfig) -> Self {
        let rng = config.build_rng();
        Self {
            config,
            story: None,
            nodes: HashMap::new(),
            outgoing: HashMap::new(),
            has_incoming: HashSet::new(),
            state: GameState::new(),
            rng,
            events: EventBus::new(),
            resolver: PathResolver::default(),
            executor: OperationsExecutor::new(),
            awaiting_first_advance: false,
        }
    }

    /// Replace the random source (tests pin outcomes this way).
    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load a story, replacing any previous one and its state.
    pub fn initialize(&mut self, story: StoryData) {
        self.nodes = story
            .nodes
            .iter()
            .map(|n| (n.id().clone(), n.clone()))
            .collect();

        self.outgoing = HashMap::new();
        for link in &story.links {
            self.outgoing
                .entry(link.source.clone())
                .or_default()
                .push(link.clone());
        }
        self.has_incoming = story.links.iter().map(|l| l.target.clone()).collect();

        self.state = GameState::from_defaults(story.variable_defaults());
        self.awaiting_first_advance = true;

        info!(
            title = %story.title,
            nodes = story.nodes.len(),
            links = story.links.len(),
            variables = story.variables.len(),
            "Story initialized"
        );
        self.story = Some(story);
    }

    /// Parse a story from JSON and initialize with it.
    pub fn load_json(&mut self, json: &str) -> Result<(), PlaybackError> {
        let story = StoryData::from_json(json)?;
        self.initialize(story);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.story.is_some()
    }

    pub fn story_data(&self) -> Option<&StoryData> {
        self.story.as_ref()
    }

    /// Get node by ID.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Owned copy of the current state.
    pub fn state_snapshot(&self) -> GameState {
        self.state.clone()
    }

    /// Register an event subscriber.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&StoryEvent) -> SubscriberResult + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// A narrative node with no incoming links, else the first narrative
    /// node, else `None`.
    pub fn start_node(&self) -> Option<&Node> {
        let story = self.story.as_ref()?;
        story
            .narrative_nodes()
            .find(|n| !self.has_incoming.contains(n.id()))
            .or_else(|| story.narrative_nodes().next())
    }

    /// Last narrative in history, or the start node before the first visit.
    pub fn current_node(&self) -> Option<&Node> {
        match self.state.history.last() {
            Some(id) => self.nodes.get(id),
            None => self.start_node(),
        }
    }

    /// Visit a narrative node: run its operations and record it.
    ///
    /// A choice node is returned as is without touching history.
    pub fn visit_node(&mut self, node_id: &NodeId) -> Option<Node> {
        let Some(story) = self.story.as_ref() else {
            warn!(node_id = %node_id, "visit_node called before a story was loaded");
            return None;
        };
        let Some(node) = self.nodes.get(node_id).cloned() else {
            warn!(node_id = %node_id, "visit_node called with unknown node");
            return None;
        };
        if node.is_choice() {
            warn!(node_id = %node_id, "visit_node called on a choice node, not recorded");
            return Some(node);
        }

        self.executor
            .execute(&node, &mut self.state, Some(story), &self.events);

        self.state.history.push(node_id.clone());
        self.state.visited_nodes.insert(node_id.clone());
        self.state.display_history.push(node.clone());

        info!(node_id = %node_id, title = node.display_name(), "Node visited");
        self.events.emit(StoryEventKind::NodeVisited {
            node_id: node_id.clone(),
            node_name: node.display_name().to_string(),
            node_type: node.kind(),
        });

        Some(node)
    }

    /// Where the story would go from `node_id`: the automatically selected
    /// destination, else the first choice, else `None`. Does not modify
    /// the game state.
    pub fn next_node(&mut self, node_id: &NodeId) -> Option<Node> {
        let resolution = self.resolve_paths(node_id)?;
        self.publish_condition_events(node_id, &resolution.evaluations);
        let link = Self::next_link(&resolution)?;
        self.nodes.get(&link.target).cloned()
    }

    /// Pick a choice node and follow it.
    ///
    /// The choice is marked visited but never enters `history`. When the
    /// choice leads to a narrative node that node is visited; a choice
    /// leading to another choice returns that choice untouched.
    pub fn execute_choice(&mut self, choice_id: &NodeId) -> Option<Node> {
        if self.story.is_none() {
            warn!(node_id = %choice_id, "execute_choice called before a story was loaded");
            return None;
        }
        let Some(choice) = self.nodes.get(choice_id).cloned() else {
            warn!(node_id = %choice_id, "execute_choice called with unknown node");
            return None;
        };
        let Node::Choice(choice_node) = &choice else {
            warn!(node_id = %choice_id, "execute_choice called on a narrative node");
            return None;
        };

        self.state.visited_nodes.insert(choice_id.clone());
        self.add_choice_to_display_history(&choice);
        self.awaiting_first_advance = false;

        info!(node_id = %choice_id, choice = %choice_node.text, "Choice selected");
        self.events.emit(StoryEventKind::ChoiceSelected {
            node_id: choice_id.clone(),
            choice: choice_node.text.clone(),
        });

        let resolution = self.resolve_paths(choice_id)?;
        let Some(link) = Self::next_link(&resolution).cloned() else {
            debug!(node_id = %choice_id, "Choice has no valid continuation");
            return None;
        };
        self.record_taken_link(choice_id, &link.id, &resolution);

        let next = self.nodes.get(&link.target).cloned()?;
        if next.is_narrative() {
            self.visit_node(next.id())
        } else {
            debug!(node_id = %choice_id, next = %next.id(), "Choice leads to another choice");
            Some(next)
        }
    }

    /// Follow the automatically selected narrative link from `node_id`, as
    /// if the player had clicked the virtual "Continue".
    pub fn handle_direct_narrative_transition(&mut self, node_id: &NodeId) -> Option<Node> {
        let resolution = self.resolve_paths(node_id)?;
        let Some(selected) = resolution.selected.as_ref() else {
            debug!(node_id = %node_id, "No automatic narrative continuation");
            return None;
        };
        let link = selected.link.clone();

        if !self.nodes.get(&link.target).is_some_and(Node::is_narrative) {
            return None;
        }

        self.record_taken_link(node_id, &link.id, &resolution);
        self.awaiting_first_advance = false;
        self.visit_node(&link.target)
    }

    /// Advance automatically when the next step is a narrative link.
    ///
    /// Right after initialize or restart the first node is held (so the UI
    /// shows a "Continue" once) unless `force_move` is set.
    pub fn move_forward(&mut self, node_id: &NodeId, force_move: bool) -> Option<Node> {
        if self.awaiting_first_advance
            && self.config.exempt_first_node_from_auto_advance
            && !force_move
        {
            debug!(node_id = %node_id, "First node waits for an explicit continue");
            return None;
        }
        self.handle_direct_narrative_transition(node_id)
    }

    /// Step back one narrative node, undoing its operations.
    pub fn go_back(&mut self) -> Option<Node> {
        if self.story.is_none() {
            warn!("go_back called before a story was loaded");
            return None;
        }
        if self.state.history.len() <= 1 {
            debug!("Nothing to go back to");
            return None;
        }

        let from = self.state.history.pop()?;
        let visit_index = self.state.history.len();
        self.executor
            .rollback_visit(&from, visit_index, &mut self.state, &self.events);
        self.update_display_history_on_back(self.config.display_mode);

        let to = self.state.history.last().cloned();
        info!(from = %from, to = ?to.as_ref().map(NodeId::as_str), "Navigated back");
        self.events.emit(StoryEventKind::NavigationBack {
            from_node_id: from,
            to_node_id: to.clone(),
        });

        match to {
            Some(id) => self.nodes.get(&id).cloned(),
            None => self.start_node().cloned(),
        }
    }

    /// Reset all progress and variables. The start node is returned but not
    /// added to history.
    pub fn restart(&mut self) -> Option<Node> {
        let Some(story) = self.story.as_ref() else {
            warn!("restart called before a story was loaded");
            return None;
        };
        self.state = GameState::from_defaults(story.variable_defaults());
        self.awaiting_first_advance = true;

        let start = self.start_node().cloned();
        info!(start = ?start.as_ref().map(|n| n.id().as_str()), "Story restarted");
        self.events.emit(StoryEventKind::StoryRestarted {
            start_node_id: start.as_ref().map(|n| n.id().clone()),
        });
        start
    }

    /// Options to present at `node_id`: a single virtual "Continue" when a
    /// narrative link would be followed automatically, otherwise the valid
    /// choice nodes.
    pub fn available_choices(&mut self, node_id: &NodeId) -> Vec<AvailableChoice> {
        let Some(resolution) = self.resolve_paths(node_id) else {
            return Vec::new();
        };

        if let Some(selected) = resolution.selected {
            return vec![AvailableChoice::Continue {
                target: selected.link.target,
                link_id: selected.link.id,
            }];
        }

        resolution
            .tiers
            .choice
            .into_iter()
            .filter_map(|link| match self.nodes.get(&link.target) {
                Some(Node::Choice(choice)) => Some(AvailableChoice::Choice {
                    node: choice.clone(),
                    link_id: link.id,
                }),
                _ => None,
            })
            .collect()
    }

    /// Run the path resolver over the outgoing links of `node_id`.
    pub fn resolve_paths(&mut self, node_id: &NodeId) -> Option<PathResolution> {
        if self.story.is_none() {
            warn!(node_id = %node_id, "Path resolution requested before a story was loaded");
            return None;
        }
        let Some(node) = self.nodes.get(node_id) else {
            warn!(node_id = %node_id, "Path resolution requested for unknown node");
            return None;
        };
        let links = self
            .outgoing
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        Some(
            self.resolver
                .resolve(node, links, &self.state, &self.nodes, &mut *self.rng),
        )
    }

    /// Set a variable's value directly. Not recorded, so `go_back` does not
    /// undo it.
    pub fn set_variable(&mut self, variable_id: &VariableId, value: VariableValue) -> bool {
        match self.state.variables.get_mut(variable_id) {
            Some(variable) => {
                debug!(variable = %variable_id, value = %value, "Variable set");
                variable.value = value;
                true
            }
            None => {
                warn!(variable = %variable_id, "set_variable called with unknown variable");
                false
            }
        }
    }

    /// Set a variable from UI input, coercing it to the variable's kind.
    pub fn set_variable_manually(
        &mut self,
        variable_id: &VariableId,
        value: VariableValue,
    ) -> bool {
        let Some(kind) = self.state.variable(variable_id).map(|v| v.kind) else {
            warn!(variable = %variable_id, "set_variable_manually called with unknown variable");
            return false;
        };
        match coerce_manual_value(kind, &value) {
            Some(coerced) => self.set_variable(variable_id, coerced),
            None => {
                warn!(
                    variable = %variable_id,
                    kind = kind.as_str(),
                    value = %value,
                    "Value does not fit the variable kind"
                );
                false
            }
        }
    }

    fn next_link(resolution: &PathResolution) -> Option<&Link> {
        resolution
            .selected
            .as_ref()
            .map(|s| &s.link)
            .or_else(|| resolution.tiers.choice.first())
    }

    /// Log the evaluation of the link actually taken, like a real choice.
    fn record_taken_link(
        &mut self,
        node_id: &NodeId,
        link_id: &LinkId,
        resolution: &PathResolution,
    ) {
        let Some(evaluation) = resolution.evaluation(link_id) else {
            return;
        };

        if self.config.record_triggered_conditions {
            let now = Utc::now();
            for group in &evaluation.groups {
                for outcome in &group.conditions {
                    self.state.triggered_conditions.push(ConditionRecord {
                        node_id: node_id.clone(),
                        link_id: evaluation.link_id.clone(),
                        group_id: group.group_id.clone(),
                        group_operator: group.operator,
                        condition: outcome.condition.clone(),
                        result: outcome.result,
                        evaluated_at: now,
                    });
                }
            }
        }

        self.publish_condition_events(node_id, std::slice::from_ref(evaluation));
    }

    fn publish_condition_events(&self, node_id: &NodeId, evaluations: &[LinkEvaluation]) {
        if !self.config.emit_condition_events {
            return;
        }
        for evaluation in evaluations {
            for group in &evaluation.groups {
                for outcome in &group.conditions {
                    self.events.emit(StoryEventKind::ConditionEvaluated {
                        node_id: Some(node_id.clone()),
                        edge_id: Some(evaluation.link_id.clone()),
                        condition: outcome.condition.clone(),
                        result: outcome.result,
                        group_operator: group.operator,
                    });
                }
                self.events.emit(StoryEventKind::ConditionGroupEvaluated {
                    node_id: Some(node_id.clone()),
                    edge_id: Some(evaluation.link_id.clone()),
                    conditions: group.conditions.clone(),
                    group_operator: group.operator,
                    group_result: group.result,
                });
            }
        }
    }
}

/// Fit UI input to a variable kind. Percent input above 1 is read as a
/// whole percent.
fn coerce_manual_value(kind: VariableKind, value: &VariableValue) -> Option<VariableValue> {
    match kind {
        VariableKind::Integer => as_number(value).map(|n| VariableValue::Number(n.round())),
        VariableKind::Float => as_number(value).map(VariableValue::Number),
        VariableKind::Percent => as_number(value).map(|n| {
            VariableValue::Number(if n > 1.0 { n / 100.0 } else { n })
        }),
        VariableKind::Boolean => as_bool(value).map(VariableValue::Bool),
        VariableKind::String => Some(VariableValue::Text(value.to_display_string())),
    }
}
