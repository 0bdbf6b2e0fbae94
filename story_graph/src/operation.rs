//! Variable operations attached to nodes.

use serde::{Deserialize, Serialize};

use crate::{NodeId, OperationId, VariableId, VariableValue};

/// What an operation does to its variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Override,
    Addition,
    Subtract,
    Multiply,
    Divide,
    /// Boolean negation. Ignores the target value.
    Invert,
    /// String concatenation.
    Join,
}

impl OperationKind {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            OperationKind::Addition
                | OperationKind::Subtract
                | OperationKind::Multiply
                | OperationKind::Divide
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Override => "override",
            OperationKind::Addition => "addition",
            OperationKind::Subtract => "subtract",
            OperationKind::Multiply => "multiply",
            OperationKind::Divide => "divide",
            OperationKind::Invert => "invert",
            OperationKind::Join => "join",
        }
    }
}

/// Where an operation takes its operand from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum OperationTarget {
    /// A literal authored on the operation.
    Custom(VariableValue),
    /// The current value of another variable.
    Variable(VariableId),
}

/// A variable mutation executed when its owning node is visited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableOperation {
    pub id: OperationId,

    /// Node that owns (and executes) this operation.
    pub node_id: NodeId,

    pub variable_id: VariableId,

    pub kind: OperationKind,

    #[serde(default)]
    pub target: Option<OperationTarget>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Execution order within the owning node.
    #[serde(default)]
    pub order: u32,
}

fn default_enabled() -> bool {
    true
}

impl VariableOperation {
    /// Create an enabled operation without a target.
    pub fn new(
        node_id: impl Into<NodeId>,
        variable_id: impl Into<VariableId>,
        kind: OperationKind,
    ) -> Self {
        Self {
            id: OperationId::generate(),
            node_id: node_id.into(),
            variable_id: variable_id.into(),
            kind,
            target: None,
            enabled: true,
            order: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<OperationId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_target(mut self, target: OperationTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Use a literal operand.
    pub fn with_value(self, value: impl Into<VariableValue>) -> Self {
        self.with_target(OperationTarget::Custom(value.into()))
    }

    /// Read the operand from another variable at execution time.
    pub fn with_variable(self, variable_id: impl Into<VariableId>) -> Self {
        self.with_target(OperationTarget::Variable(variable_id.into()))
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_builder() {
        let op = VariableOperation::new("n1", "score", OperationKind::Addition)
            .with_value(5)
            .with_order(2);

        assert_eq!(op.node_id.as_str(), "n1");
        assert_eq!(op.order, 2);
        assert!(op.enabled);
        assert_eq!(
            op.target,
            Some(OperationTarget::Custom(VariableValue::Number(5.0)))
        );
        assert!(!op.clone().disabled().enabled);
    }

    #[test]
    fn test_operation_defaults_from_json() {
        let json = r#"{
            "id": "op1",
            "nodeId": "n1",
            "variableId": "flag",
            "kind": "invert"
        }"#;
        let op: VariableOperation = serde_json::from_str(json).unwrap();
        assert!(op.enabled);
        assert_eq!(op.order, 0);
        assert!(op.target.is_none());
        assert_eq!(op.kind, OperationKind::Invert);
    }

    #[test]
    fn test_arithmetic_kinds() {
        assert!(OperationKind::Divide.is_arithmetic());
        assert!(!OperationKind::Join.is_arithmetic());
        assert!(!OperationKind::Override.is_arithmetic());
    }
}
