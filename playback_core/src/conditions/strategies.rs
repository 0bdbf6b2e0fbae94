//! One evaluation strategy per condition kind.
//!
//! Every strategy is a pure function of the condition, the game state and the
//! injected random source. A malformed condition (wrong variant for the
//! strategy, or a missing required field) evaluates to `false`.

use rand::{Rng, RngCore};
use story_graph::{
    Comparator, ComparisonValue, Condition, ConditionKind, Variable, VariableKind, VariableValue,
};

use crate::state::GameState;

/// Signature shared by all strategies.
pub type Strategy = fn(&Condition, &GameState, &mut dyn RngCore) -> bool;

/// Dispatch table keyed on the condition kind.
pub fn strategy_for(kind: ConditionKind) -> Strategy {
    match kind {
        ConditionKind::NodeHappened => node_visited,
        ConditionKind::NodeNotHappened => node_not_visited,
        ConditionKind::Probability => probability,
        ConditionKind::VariableComparison => variable_comparison,
    }
}

/// True iff the referenced node has been visited.
pub fn node_visited(condition: &Condition, state: &GameState, _rng: &mut dyn RngCore) -> bool {
    match condition {
        Condition::NodeHappened { node_id: Some(id) } => state.visited_nodes.contains(id),
        _ => false,
    }
}

/// True iff the referenced node has not been visited. A missing node id is
/// still `false`: it cannot be evaluated in either direction.
pub fn node_not_visited(condition: &Condition, state: &GameState, _rng: &mut dyn RngCore) -> bool {
    match condition {
        Condition::NodeNotHappened { node_id: Some(id) } => !state.visited_nodes.contains(id),
        _ => false,
    }
}

/// Draws one uniform [0, 1) sample and passes if it is strictly below the
/// probability. A missing probability counts as 0.
pub fn probability(condition: &Condition, _state: &GameState, rng: &mut dyn RngCore) -> bool {
    let Condition::Probability { probability } = condition else {
        return false;
    };
    let threshold = probability.unwrap_or(0.0);
    let sample: f64 = rng.gen();
    sample < threshold
}

/// Compares a variable against a literal or another variable.
pub fn variable_comparison(
    condition: &Condition,
    state: &GameState,
    _rng: &mut dyn RngCore,
) -> bool {
    let Condition::VariableComparison {
        variable_id,
        comparator,
        value,
        percent_literal,
    } = condition
    else {
        return false;
    };

    let Some(left) = variable_id.as_ref().and_then(|id| state.variable(id)) else {
        return false;
    };
    let Some(right) = value
        .as_ref()
        .and_then(|value| resolve_right_side(value, left, *percent_literal, state))
    else {
        return false;
    };

    compare(left, &right, comparator.unwrap_or_default())
}

fn resolve_right_side(
    value: &ComparisonValue,
    left: &Variable,
    percent_literal: bool,
    state: &GameState,
) -> Option<VariableValue> {
    match value {
        ComparisonValue::Literal(literal) => {
            if percent_literal && left.kind == VariableKind::Percent {
                if let Some(n) = as_number(literal) {
                    return Some(VariableValue::Number(n / 100.0));
                }
            }
            Some(literal.clone())
        }
        ComparisonValue::Variable(id) => state.value_of(id).cloned(),
    }
}

fn compare(left: &Variable, right: &VariableValue, comparator: Comparator) -> bool {
    match left.kind {
        VariableKind::Integer | VariableKind::Float | VariableKind::Percent => {
            let (Some(l), Some(r)) = (as_number(&left.value), as_number(right)) else {
                return false;
            };
            match comparator {
                Comparator::Eq => (l - r).abs() < f64::EPSILON,
                Comparator::Neq => (l - r).abs() >= f64::EPSILON,
                Comparator::Gt => l > r,
                Comparator::Gte => l >= r,
                Comparator::Lt => l < r,
                Comparator::Lte => l <= r,
            }
        }
        VariableKind::Boolean => {
            let (Some(l), Some(r)) = (left.value.as_bool(), as_bool(right)) else {
                return false;
            };
            equality(l == r, comparator)
        }
        VariableKind::String => {
            let equal = left.value.to_display_string() == right.to_display_string();
            equality(equal, comparator)
        }
    }
}

/// Only `eq` and `neq` are meaningful for non-numeric kinds.
fn equality(equal: bool, comparator: Comparator) -> bool {
    match comparator {
        Comparator::Eq => equal,
        Comparator::Neq => !equal,
        _ => false,
    }
}

/// Numbers, and text that parses as a number (authoring tools often store
/// literals as strings).
pub(crate) fn as_number(value: &VariableValue) -> Option<f64> {
    match value {
        VariableValue::Number(n) => Some(*n),
        VariableValue::Text(s) => s.trim().parse().ok(),
        VariableValue::Bool(_) => None,
    }
}

pub(crate) fn as_bool(value: &VariableValue) -> Option<bool> {
    match value {
        VariableValue::Bool(b) => Some(*b),
        VariableValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        VariableValue::Number(_) => None,
    }
}
