//! Game state - the single mutable aggregate of one playback session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use story_graph::{
    Condition, GroupId, GroupOperator, LinkId, Node, NodeId, Variable, VariableId,
    VariableOperation, VariableValue,
};

/// One applied variable operation, kept so it can be reversed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    pub operation: VariableOperation,

    /// Node whose visit executed the operation.
    pub executed_in_node_id: NodeId,

    /// Position in `history` of the visit that ran the operation. `None`
    /// only for legacy records.
    #[serde(default)]
    pub visit_index: Option<usize>,

    /// Value before the operation. `None` only for legacy records.
    pub previous_value: Option<VariableValue>,

    pub result_value: VariableValue,

    /// Operand the operation resolved at execution time.
    pub operand: Option<VariableValue>,

    pub executed_at: DateTime<Utc>,
}

/// Audit entry for one evaluated condition on a taken link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRecord {
    pub node_id: NodeId,
    pub link_id: LinkId,
    pub group_id: GroupId,
    pub group_operator: GroupOperator,
    pub condition: Condition,
    pub result: bool,
    pub evaluated_at: DateTime<Utc>,
}

/// The complete runtime state of a playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Variables by id, with their current values.
    pub variables: HashMap<VariableId, Variable>,

    /// Every node visited since the last restart.
    pub visited_nodes: HashSet<NodeId>,

    /// Narrative node ids in traversal order.
    pub history: Vec<NodeId>,

    /// Node snapshots for replay, including choices.
    pub display_history: Vec<Node>,

    pub executed_operations: Vec<OperationRecord>,

    pub triggered_conditions: Vec<ConditionRecord>,
}

impl GameState {
    /// Create a new empty game state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh state with variables set to their defaults.
    pub fn from_defaults(defaults: &[Variable]) -> Self {
        Self {
            variables: defaults
                .iter()
                .map(|v| (v.id.clone(), v.clone()))
                .collect(),
            ..Self::default()
        }
    }

    /// Get variable by ID.
    pub fn variable(&self, id: &VariableId) -> Option<&Variable> {
        self.variables.get(id)
    }

    /// Get the current value of a variable.
    pub fn value_of(&self, id: &VariableId) -> Option<&VariableValue> {
        self.variables.get(id).map(|v| &v.value)
    }

    pub fn has_visited(&self, id: &NodeId) -> bool {
        self.visited_nodes.contains(id)
    }

    /// The narrative node the player is currently on.
    pub fn current_history_entry(&self) -> Option<&NodeId> {
        self.history.last()
    }

    /// Operation records owned by a node, oldest first.
    pub fn operations_for_node<'a>(
        &'a self,
        node_id: &'a NodeId,
    ) -> impl Iterator<Item = &'a OperationRecord> {
        self.executed_operations
            .iter()
            .filter(move |r| &r.executed_in_node_id == node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_defaults() {
        let defaults = vec![
            Variable::integer("score", "Score", 10),
            Variable::boolean("met_guard", "Met guard", false),
        ];
        let state = GameState::from_defaults(&defaults);

        assert_eq!(state.variables.len(), 2);
        assert_eq!(
            state.value_of(&VariableId::from("score")),
            Some(&VariableValue::Number(10.0))
        );
        assert!(state.history.is_empty());
        assert!(state.visited_nodes.is_empty());
    }

    #[test]
    fn test_current_history_entry() {
        let mut state = GameState::new();
        assert!(state.current_history_entry().is_none());

        state.history.push(NodeId::from("a"));
        state.history.push(NodeId::from("b"));
        assert_eq!(state.current_history_entry(), Some(&NodeId::from("b")));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = GameState::from_defaults(&[Variable::integer("score", "Score", 1)]);
        state.visited_nodes.insert(NodeId::from("start"));
        state.history.push(NodeId::from("start"));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["history"][0], "start");
        assert!(json["visitedNodes"].is_array());
    }
}
