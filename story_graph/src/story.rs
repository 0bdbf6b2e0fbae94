//! Story data - the complete, already-flattened graph handed to the player.

use serde::{Deserialize, Serialize};

use crate::{GraphError, Link, Node, NodeId, Variable};

/// A complete story: nodes, links and variable defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoryData {
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
    /// Variables with their default values.
    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl StoryData {
    /// Create an empty story.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Parse a story from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(GraphError::from)
    }

    /// Serialize the story to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(GraphError::from)
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Get node by ID.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Links leaving a node, in authoring order.
    pub fn outgoing_links<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Link> {
        self.links.iter().filter(move |l| &l.source == id)
    }

    /// Links arriving at a node, in authoring order.
    pub fn incoming_links<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Link> {
        self.links.iter().filter(move |l| &l.target == id)
    }

    /// Variables as authored, holding their default values.
    pub fn variable_defaults(&self) -> &[Variable] {
        &self.variables
    }

    pub fn narrative_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_narrative())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_story() -> StoryData {
        StoryData::new("Sample")
            .with_node(Node::narrative("start", "Start", "Hello"))
            .with_node(Node::choice("c1", "Go left"))
            .with_node(Node::narrative("left", "Left", "You went left"))
            .with_link(Link::new("start", "c1").with_id("l1"))
            .with_link(Link::new("c1", "left").with_id("l2"))
            .with_variable(Variable::integer("score", "Score", 0))
    }

    #[test]
    fn test_graph_queries() {
        let story = sample_story();
        let start = NodeId::from("start");
        let left = NodeId::from("left");

        assert!(story.node(&start).is_some());
        assert!(story.node(&NodeId::from("missing")).is_none());
        assert_eq!(story.outgoing_links(&start).count(), 1);
        assert_eq!(story.incoming_links(&start).count(), 0);
        assert_eq!(story.incoming_links(&left).count(), 1);
        assert_eq!(story.narrative_nodes().count(), 2);
        assert_eq!(story.variable_defaults().len(), 1);
    }

    #[test]
    fn test_json_roundtrip_preserves_story() {
        let story = sample_story();
        let json = story.to_json_pretty().unwrap();
        let parsed = StoryData::from_json(&json).unwrap();
        assert_eq!(parsed, story);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let result = StoryData::from_json("{ not json");
        assert!(matches!(result, Err(GraphError::Json(_))));
    }

    #[test]
    fn test_minimal_json() {
        let story = StoryData::from_json(r#"{ "title": "Empty" }"#).unwrap();
        assert_eq!(story.title, "Empty");
        assert!(story.nodes.is_empty());
        assert!(story.links.is_empty());
    }
}
