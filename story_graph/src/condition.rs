//! Conditions attached to links.
//!
//! A link carries an ordered list of [`ConditionGroup`]s. Each group combines
//! its conditions with a single [`GroupOperator`].

use serde::{Deserialize, Serialize};

use crate::{GroupId, NodeId, VariableId, VariableValue};

/// How the conditions inside a group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    #[default]
    And,
    Or,
}

impl GroupOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupOperator::And => "AND",
            GroupOperator::Or => "OR",
        }
    }
}

/// Comparison operators for variable conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    #[default]
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Right-hand side of a variable comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ComparisonValue {
    /// A literal authored on the condition.
    Literal(VariableValue),
    /// The current value of another variable.
    Variable(VariableId),
}

/// Discriminant of [`Condition`], used to select an evaluation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKind {
    Probability,
    VariableComparison,
    NodeHappened,
    NodeNotHappened,
}

/// A single condition.
///
/// Required fields are optional so that incomplete authoring data can still be
/// loaded; such conditions never pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Condition {
    /// Passes with the given chance (0.0 - 1.0).
    Probability {
        #[serde(default)]
        probability: Option<f64>,
    },

    /// Compares a variable against a literal or another variable.
    VariableComparison {
        #[serde(default)]
        variable_id: Option<VariableId>,
        #[serde(default)]
        comparator: Option<Comparator>,
        #[serde(default)]
        value: Option<ComparisonValue>,
        /// The literal is a whole percent (75 means 0.75).
        #[serde(default)]
        percent_literal: bool,
    },

    /// Passes once the node has been visited.
    NodeHappened {
        #[serde(default)]
        node_id: Option<NodeId>,
    },

    /// Passes while the node has not been visited.
    NodeNotHappened {
        #[serde(default)]
        node_id: Option<NodeId>,
    },
}

impl Condition {
    pub fn probability(probability: f64) -> Self {
        Condition::Probability {
            probability: Some(probability),
        }
    }

    pub fn node_happened(node_id: impl Into<NodeId>) -> Self {
        Condition::NodeHappened {
            node_id: Some(node_id.into()),
        }
    }

    pub fn node_not_happened(node_id: impl Into<NodeId>) -> Self {
        Condition::NodeNotHappened {
            node_id: Some(node_id.into()),
        }
    }

    /// Compare a variable against a literal.
    pub fn compare(
        variable_id: impl Into<VariableId>,
        comparator: Comparator,
        literal: impl Into<VariableValue>,
    ) -> Self {
        Condition::VariableComparison {
            variable_id: Some(variable_id.into()),
            comparator: Some(comparator),
            value: Some(ComparisonValue::Literal(literal.into())),
            percent_literal: false,
        }
    }

    /// Compare a percent variable against a whole-percent literal.
    pub fn compare_percent(
        variable_id: impl Into<VariableId>,
        comparator: Comparator,
        percent: f64,
    ) -> Self {
        Condition::VariableComparison {
            variable_id: Some(variable_id.into()),
            comparator: Some(comparator),
            value: Some(ComparisonValue::Literal(VariableValue::Number(percent))),
            percent_literal: true,
        }
    }

    /// Compare a variable against another variable.
    pub fn compare_variables(
        variable_id: impl Into<VariableId>,
        comparator: Comparator,
        other: impl Into<VariableId>,
    ) -> Self {
        Condition::VariableComparison {
            variable_id: Some(variable_id.into()),
            comparator: Some(comparator),
            value: Some(ComparisonValue::Variable(other.into())),
            percent_literal: false,
        }
    }

    pub fn kind(&self) -> ConditionKind {
        match self {
            Condition::Probability { .. } => ConditionKind::Probability,
            Condition::VariableComparison { .. } => ConditionKind::VariableComparison,
            Condition::NodeHappened { .. } => ConditionKind::NodeHappened,
            Condition::NodeNotHappened { .. } => ConditionKind::NodeNotHappened,
        }
    }
}

/// A bundle of conditions combined with AND or OR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    pub id: GroupId,
    pub operator: GroupOperator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    pub fn new(operator: GroupOperator, conditions: Vec<Condition>) -> Self {
        Self {
            id: GroupId::generate(),
            operator,
            conditions,
        }
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Self::new(GroupOperator::And, conditions)
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Self::new(GroupOperator::Or, conditions)
    }

    pub fn with_id(mut self, id: impl Into<GroupId>) -> Self {
        self.id = id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_kind() {
        assert_eq!(Condition::probability(0.5).kind(), ConditionKind::Probability);
        assert_eq!(
            Condition::node_not_happened("a").kind(),
            ConditionKind::NodeNotHappened
        );
        assert_eq!(
            Condition::compare("x", Comparator::Eq, 1).kind(),
            ConditionKind::VariableComparison
        );
    }

    #[test]
    fn test_group_builders() {
        let group = ConditionGroup::or(vec![Condition::node_happened("a")]).with_id("g1");
        assert_eq!(group.operator, GroupOperator::Or);
        assert_eq!(group.id.as_str(), "g1");
        assert_eq!(group.conditions.len(), 1);
    }

    #[test]
    fn test_condition_json_shape() {
        let json = r#"{
            "type": "variableComparison",
            "variableId": "score",
            "comparator": "gte",
            "value": { "type": "literal", "value": 10 }
        }"#;
        let condition: Condition = serde_json::from_str(json).unwrap();
        assert_eq!(condition, Condition::compare("score", Comparator::Gte, 10));
    }

    #[test]
    fn test_malformed_condition_still_loads() {
        let condition: Condition = serde_json::from_str(r#"{ "type": "nodeHappened" }"#).unwrap();
        assert_eq!(condition, Condition::NodeHappened { node_id: None });
    }
}
