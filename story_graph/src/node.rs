//! Nodes and links of the story graph.

use serde::{Deserialize, Serialize};

use crate::{ConditionGroup, LinkId, NodeId, VariableOperation};

/// Discriminant of [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Narrative,
    Choice,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Narrative => "narrative",
            NodeKind::Choice => "choice",
        }
    }
}

/// A story beat with display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeNode {
    pub id: NodeId,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub operations: Vec<VariableOperation>,
}

/// A decision point offered to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceNode {
    pub id: NodeId,
    pub text: String,
    #[serde(default)]
    pub operations: Vec<VariableOperation>,
}

/// A node of the story graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Narrative(NarrativeNode),
    Choice(ChoiceNode),
}

impl Node {
    pub fn narrative(
        id: impl Into<NodeId>,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Node::Narrative(NarrativeNode {
            id: id.into(),
            title: title.into(),
            text: text.into(),
            operations: Vec::new(),
        })
    }

    pub fn choice(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Node::Choice(ChoiceNode {
            id: id.into(),
            text: text.into(),
            operations: Vec::new(),
        })
    }

    /// Attach an operation. The operation's owner is set to this node.
    pub fn with_operation(mut self, mut operation: VariableOperation) -> Self {
        operation.node_id = self.id().clone();
        match &mut self {
            Node::Narrative(n) => n.operations.push(operation),
            Node::Choice(c) => c.operations.push(operation),
        }
        self
    }

    pub fn id(&self) -> &NodeId {
        match self {
            Node::Narrative(n) => &n.id,
            Node::Choice(c) => &c.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Narrative(_) => NodeKind::Narrative,
            Node::Choice(_) => NodeKind::Choice,
        }
    }

    pub fn is_narrative(&self) -> bool {
        matches!(self, Node::Narrative(_))
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, Node::Choice(_))
    }

    /// Title for narratives, label text for choices.
    pub fn display_name(&self) -> &str {
        match self {
            Node::Narrative(n) => &n.title,
            Node::Choice(c) => &c.text,
        }
    }

    pub fn operations(&self) -> &[VariableOperation] {
        match self {
            Node::Narrative(n) => &n.operations,
            Node::Choice(c) => &c.operations,
        }
    }
}

/// A directed, optionally conditional connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub conditions: Vec<ConditionGroup>,
}

impl Link {
    /// Create an unconditional link with a generated id.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: LinkId::generate(),
            source: source.into(),
            target: target.into(),
            conditions: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<LinkId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_group(mut self, group: ConditionGroup) -> Self {
        self.conditions.push(group);
        self
    }

    pub fn is_conditional(&self) -> bool {
        !self.conditions.is_empty()
    }
}
