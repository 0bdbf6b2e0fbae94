//! Condition Evaluator - decides whether a link may be followed.
//!
//! Evaluation happens at three levels:
//! 1. **Condition**: dispatched to its strategy by kind (see [`strategies`])
//! 2. **Group**: AND requires every condition, OR requires any
//! 3. **Link**: OR groups are checked first and any passing OR group makes
//!    the link valid on its own. Otherwise every AND group must pass.
//!
//! The `*_detailed` variants evaluate every condition instead of
//! short-circuiting, so callers can report why a link was or was not taken.

pub mod strategies;

use rand::RngCore;
use serde::Serialize;

use story_graph::{Condition, ConditionGroup, GroupId, GroupOperator, Link, LinkId};

use crate::state::GameState;

/// Result of a single condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionOutcome {
    pub condition: Condition,
    pub result: bool,
}

/// Result of a condition group, with every contained condition's result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOutcome {
    pub group_id: GroupId,
    pub operator: GroupOperator,
    pub result: bool,
    pub conditions: Vec<ConditionOutcome>,
}

/// Cached evaluation of one link.
///
/// `groups` only holds the groups that were actually checked: when an OR
/// group passes, the AND groups are never looked at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEvaluation {
    pub link_id: LinkId,
    pub valid: bool,
    pub groups: Vec<GroupOutcome>,
}

/// Evaluates conditions, groups and link-level condition lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate one condition with the strategy registered for its kind.
    pub fn evaluate_condition(
        &self,
        condition: &Condition,
        state: &GameState,
        rng: &mut dyn RngCore,
    ) -> bool {
        strategies::strategy_for(condition.kind())(condition, state, rng)
    }

    /// Evaluate a group, stopping at the first deciding condition.
    pub fn evaluate_group(
        &self,
        group: &ConditionGroup,
        state: &GameState,
        rng: &mut dyn RngCore,
    ) -> bool {
        match group.operator {
            GroupOperator::Or => group
                .conditions
                .iter()
                .any(|c| self.evaluate_condition(c, state, rng)),
            GroupOperator::And => group
                .conditions
                .iter()
                .all(|c| self.evaluate_condition(c, state, rng)),
        }
    }

    /// Evaluate every condition of a group and report each result.
    pub fn evaluate_group_detailed(
        &self,
        group: &ConditionGroup,
        state: &GameState,
        rng: &mut dyn RngCore,
    ) -> GroupOutcome {
        let conditions: Vec<ConditionOutcome> = group
            .conditions
            .iter()
            .map(|condition| ConditionOutcome {
                condition: condition.clone(),
                result: self.evaluate_condition(condition, state, rng),
            })
            .collect();

        let result = match group.operator {
            GroupOperator::Or => conditions.iter().any(|c| c.result),
            GroupOperator::And => conditions.iter().all(|c| c.result),
        };

        GroupOutcome {
            group_id: group.id.clone(),
            operator: group.operator,
            result,
            conditions,
        }
    }

    /// Link-level rule: any passing OR group validates the link; otherwise
    /// all AND groups must pass. No groups at all means valid, and a link
    /// with only failing OR groups is invalid.
    pub fn evaluate_link_conditions(
        &self,
        groups: &[ConditionGroup],
        state: &GameState,
        rng: &mut dyn RngCore,
    ) -> bool {
        if groups.is_empty() {
            return true;
        }

        let (or_groups, and_groups): (Vec<&ConditionGroup>, Vec<&ConditionGroup>) = groups
            .iter()
            .partition(|g| g.operator == GroupOperator::Or);

        if or_groups
            .iter()
            .any(|g| self.evaluate_group(g, state, rng))
        {
            return true;
        }

        !and_groups.is_empty()
            && and_groups
                .iter()
                .all(|g| self.evaluate_group(g, state, rng))
    }

    /// Same rule as [`Self::evaluate_link_conditions`], keeping every
    /// checked group and condition result.
    pub fn evaluate_link_detailed(
        &self,
        link: &Link,
        state: &GameState,
        rng: &mut dyn RngCore,
    ) -> LinkEvaluation {
        if link.conditions.is_empty() {
            return LinkEvaluation {
                link_id: link.id.clone(),
                valid: true,
                groups: Vec::new(),
            };
        }

        let (or_groups, and_groups): (Vec<&ConditionGroup>, Vec<&ConditionGroup>) = link
            .conditions
            .iter()
            .partition(|g| g.operator == GroupOperator::Or);

        let mut groups: Vec<GroupOutcome> = or_groups
            .iter()
            .map(|g| self.evaluate_group_detailed(g, state, rng))
            .collect();

        let valid = if groups.iter().any(|g| g.result) {
            true
        } else if and_groups.is_empty() {
            false
        } else {
            let and_outcomes: Vec<GroupOutcome> = and_groups
                .iter()
                .map(|g| self.evaluate_group_detailed(g, state, rng))
                .collect();
            let all_pass = and_outcomes.iter().all(|g| g.result);
            groups.extend(and_outcomes);
            all_pass
        };

        LinkEvaluation {
            link_id: link.id.clone(),
            valid,
            groups,
        }
    }
}
