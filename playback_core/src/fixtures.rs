//! Story fixtures shared by the unit tests.

use story_graph::{
    Condition, ConditionGroup, Link, Node, OperationKind, StoryData, Variable, VariableOperation,
};

use crate::config::EngineConfig;
use crate::engine::StoryEngine;

/// A small branching story:
///
/// ```text
/// start -> hall -> c_left  ("Take the left door")  -> left  -> end
///                                                     left  -> vault (only after `right`)
///               -> c_right ("Take the right door") -> right -> end
/// ```
///
/// `hall` adds 5 to `score`, `left` sets `gold` to 3, `right` doubles
/// `score`.
pub(crate) fn crossroads() -> StoryData {
    StoryData::new("Crossroads")
        .with_variable(Variable::integer("score", "Score", 10))
        .with_variable(Variable::integer("gold", "Gold", 0))
        .with_node(Node::narrative("start", "Start", "You wake up."))
        .with_node(
            Node::narrative("hall", "Hall", "Two doors.").with_operation(
                VariableOperation::new("hall", "score", OperationKind::Addition).with_value(5),
            ),
        )
        .with_node(Node::choice("c_left", "Take the left door"))
        .with_node(Node::choice("c_right", "Take the right door"))
        .with_node(
            Node::narrative("left", "Left", "A dusty room.").with_operation(
                VariableOperation::new("left", "gold", OperationKind::Override).with_value(3),
            ),
        )
        .with_node(
            Node::narrative("right", "Right", "A bright room.").with_operation(
                VariableOperation::new("right", "score", OperationKind::Multiply).with_value(2),
            ),
        )
        .with_node(Node::narrative("vault", "Vault", "Treasure."))
        .with_node(Node::narrative("end", "End", "The end."))
        .with_link(Link::new("start", "hall").with_id("l_start_hall"))
        .with_link(Link::new("hall", "c_left").with_id("l_hall_cleft"))
        .with_link(Link::new("hall", "c_right").with_id("l_hall_cright"))
        .with_link(Link::new("c_left", "left").with_id("l_cleft_left"))
        .with_link(Link::new("c_right", "right").with_id("l_cright_right"))
        .with_link(
            Link::new("left", "vault")
                .with_id("l_left_vault")
                .with_group(
                    ConditionGroup::and(vec![Condition::node_happened("right")])
                        .with_id("g_vault"),
                ),
        )
        .with_link(Link::new("left", "end").with_id("l_left_end"))
        .with_link(Link::new("right", "end").with_id("l_right_end"))
}

/// Engine with a fixed seed and `story` loaded.
pub(crate) fn seeded_engine(story: StoryData) -> StoryEngine {
    let mut engine = StoryEngine::new(EngineConfig::default().with_seed(7));
    engine.initialize(story);
    engine
}
