//! Path Resolver - picks where the story goes next.
//!
//! The resolution algorithm works as follows:
//! 1. **Evaluate**: run the link-level condition rule on every outgoing link,
//!    caching each link's group and condition results
//! 2. **Classify**: bucket valid links into priority tiers by destination kind
//!    and whether the link carries conditions
//! 3. **Select**: pick one link at random from the highest non-empty tier,
//!    unless that tier is the Choice tier, which waits for the player

use rand::{Rng, RngCore};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use story_graph::{Link, LinkId, Node, NodeId};

use crate::conditions::{ConditionEvaluator, LinkEvaluation};
use crate::state::GameState;

/// Automatic-selection priority of a valid link, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PriorityTier {
    /// Conditional link to a narrative node.
    ConditionalNarrative,
    /// Link to a choice node. Never selected automatically.
    Choice,
    /// Unconditional link to a narrative node.
    DirectNarrative,
}

impl PriorityTier {
    /// Tiers in scan order.
    pub const ALL: [PriorityTier; 3] = [
        PriorityTier::ConditionalNarrative,
        PriorityTier::Choice,
        PriorityTier::DirectNarrative,
    ];

    pub fn is_auto_selectable(&self) -> bool {
        !matches!(self, PriorityTier::Choice)
    }
}

/// Valid links grouped by tier, in authoring order within each tier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorityTiers {
    pub conditional_narrative: Vec<Link>,
    pub choice: Vec<Link>,
    pub direct_narrative: Vec<Link>,
}

impl PriorityTiers {
    pub fn get(&self, tier: PriorityTier) -> &[Link] {
        match tier {
            PriorityTier::ConditionalNarrative => &self.conditional_narrative,
            PriorityTier::Choice => &self.choice,
            PriorityTier::DirectNarrative => &self.direct_narrative,
        }
    }

    fn push(&mut self, tier: PriorityTier, link: Link) {
        match tier {
            PriorityTier::ConditionalNarrative => self.conditional_narrative.push(link),
            PriorityTier::Choice => self.choice.push(link),
            PriorityTier::DirectNarrative => self.direct_narrative.push(link),
        }
    }

    /// Every classified link, highest tier first.
    pub fn all(&self) -> impl Iterator<Item = &Link> {
        self.conditional_narrative
            .iter()
            .chain(self.choice.iter())
            .chain(self.direct_narrative.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.conditional_narrative.is_empty()
            && self.choice.is_empty()
            && self.direct_narrative.is_empty()
    }
}

/// The automatically followed link and the tier it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedPath {
    pub link: Link,
    pub tier: PriorityTier,
}

/// Everything the resolver learned about a node's outgoing links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathResolution {
    pub tiers: PriorityTiers,
    pub selected: Option<SelectedPath>,
    /// One entry per outgoing link, valid or not, in authoring order.
    pub evaluations: Vec<LinkEvaluation>,
}

impl PathResolution {
    /// Cached evaluation for a link.
    pub fn evaluation(&self, link_id: &LinkId) -> Option<&LinkEvaluation> {
        self.evaluations.iter().find(|e| &e.link_id == link_id)
    }

    pub fn has_valid_paths(&self) -> bool {
        !self.tiers.is_empty()
    }
}

/// Resolves the next step from a node.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver {
    evaluator: ConditionEvaluator,
}

impl PathResolver {
    pub fn new(evaluator: ConditionEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &ConditionEvaluator {
        &self.evaluator
    }

    /// Resolve the outgoing links of `node`.
    ///
    /// Links whose destination is missing from `nodes` are evaluated but
    /// left out of every tier.
    pub fn resolve(
        &self,
        node: &Node,
        links: &[Link],
        state: &GameState,
        nodes: &HashMap<NodeId, Node>,
        rng: &mut dyn RngCore,
    ) -> PathResolution {
        if links.is_empty() {
            debug!(node_id = %node.id(), "No outgoing links");
            return PathResolution::default();
        }

        let mut resolution = PathResolution::default();

        for link in links {
            let evaluation = self.evaluator.evaluate_link_detailed(link, state, rng);
            let valid = evaluation.valid;
            resolution.evaluations.push(evaluation);
            if !valid {
                continue;
            }

            match nodes.get(&link.target) {
                Some(destination) => {
                    resolution
                        .tiers
                        .push(Self::classify(link, destination), link.clone());
                }
                None => {
                    warn!(
                        link_id = %link.id,
                        target = %link.target,
                        "Link destination not found, ignoring link"
                    );
                }
            }
        }

        resolution.selected = Self::select(&resolution.tiers, rng);

        debug!(
            node_id = %node.id(),
            conditional = resolution.tiers.conditional_narrative.len(),
            choices = resolution.tiers.choice.len(),
            direct = resolution.tiers.direct_narrative.len(),
            selected = ?resolution.selected.as_ref().map(|s| s.link.id.as_str()),
            "Paths resolved"
        );

        resolution
    }

    /// Tier of a valid link given its destination node.
    pub fn classify(link: &Link, destination: &Node) -> PriorityTier {
        match destination {
            Node::Narrative(_) if link.is_conditional() => PriorityTier::ConditionalNarrative,
            Node::Choice(_) => PriorityTier::Choice,
            Node::Narrative(_) => PriorityTier::DirectNarrative,
        }
    }

    /// Scan tiers from highest priority. The first non-empty tier decides:
    /// an auto-selectable tier yields a uniform pick, the Choice tier yields
    /// nothing.
    fn select(tiers: &PriorityTiers, rng: &mut dyn RngCore) -> Option<SelectedPath> {
        let tier = PriorityTier::ALL
            .into_iter()
            .find(|tier| !tiers.get(*tier).is_empty())?;

        if !tier.is_auto_selectable() {
            return None;
        }

        let candidates = tiers.get(tier);
        let index = if candidates.len() == 1 {
            0
        } else {
            rng.gen_range(0..candidates.len())
        };

        Some(SelectedPath {
            link: candidates[index].clone(),
            tier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use story_graph::{Condition, ConditionGroup};

    fn node_map(nodes: Vec<Node>) -> HashMap<NodeId, Node> {
        nodes.into_iter().map(|n| (n.id().clone(), n)).collect()
    }

    fn graph() -> HashMap<NodeId, Node> {
        node_map(vec![
            Node::narrative("start", "Start", ""),
            Node::narrative("a", "A", ""),
            Node::narrative("b", "B", ""),
            Node::narrative("secret", "Secret", ""),
            Node::choice("c1", "Left"),
            Node::choice("c2", "Right"),
        ])
    }

    fn start() -> Node {
        Node::narrative("start", "Start", "")
    }

    fn always() -> ConditionGroup {
        ConditionGroup::and(vec![Condition::probability(1.0)])
    }

    fn never() -> ConditionGroup {
        ConditionGroup::and(vec![Condition::probability(0.0)])
    }

    #[test]
    fn test_no_links_gives_empty_resolution() {
        let resolution = PathResolver::default().resolve(
            &start(),
            &[],
            &GameState::new(),
            &graph(),
            &mut StdRng::seed_from_u64(1),
        );
        assert!(!resolution.has_valid_paths());
        assert!(resolution.selected.is_none());
        assert!(resolution.evaluations.is_empty());
    }

    #[test]
    fn test_classification() {
        let nodes = graph();
        let narrative = &nodes[&NodeId::from("a")];
        let choice = &nodes[&NodeId::from("c1")];

        assert_eq!(
            PathResolver::classify(&Link::new("start", "a").with_group(always()), narrative),
            PriorityTier::ConditionalNarrative
        );
        assert_eq!(
            PathResolver::classify(&Link::new("start", "c1").with_group(always()), choice),
            PriorityTier::Choice
        );
        assert_eq!(
            PathResolver::classify(&Link::new("start", "a"), narrative),
            PriorityTier::DirectNarrative
        );
    }

    #[test]
    fn test_conditional_narrative_wins() {
        let links = vec![
            Link::new("start", "a").with_id("direct"),
            Link::new("start", "c1").with_id("choice"),
            Link::new("start", "secret").with_id("gated").with_group(always()),
        ];

        for seed in 0..50 {
            let resolution = PathResolver::default().resolve(
                &start(),
                &links,
                &GameState::new(),
                &graph(),
                &mut StdRng::seed_from_u64(seed),
            );
            let selected = resolution.selected.expect("conditional link is selectable");
            assert_eq!(selected.tier, PriorityTier::ConditionalNarrative);
            assert_eq!(selected.link.id.as_str(), "gated");
            // Lower tiers are still reported.
            assert_eq!(resolution.tiers.choice.len(), 1);
            assert_eq!(resolution.tiers.direct_narrative.len(), 1);
        }
    }

    #[test]
    fn test_choice_tier_is_never_auto_selected() {
        let links = vec![Link::new("start", "c1"), Link::new("start", "c2")];

        for seed in 0..100 {
            let resolution = PathResolver::default().resolve(
                &start(),
                &links,
                &GameState::new(),
                &graph(),
                &mut StdRng::seed_from_u64(seed),
            );
            assert!(resolution.selected.is_none());
            assert_eq!(resolution.tiers.choice.len(), 2);
        }
    }

    #[test]
    fn test_choices_shadow_direct_narrative() {
        let links = vec![Link::new("start", "c1"), Link::new("start", "a")];
        let resolution = PathResolver::default().resolve(
            &start(),
            &links,
            &GameState::new(),
            &graph(),
            &mut StdRng::seed_from_u64(7),
        );
        assert!(resolution.selected.is_none());
        assert_eq!(resolution.tiers.direct_narrative.len(), 1);
    }

    #[test]
    fn test_direct_narrative_fallback() {
        let links = vec![
            Link::new("start", "secret").with_group(never()),
            Link::new("start", "a").with_id("plain"),
        ];
        let resolution = PathResolver::default().resolve(
            &start(),
            &links,
            &GameState::new(),
            &graph(),
            &mut StdRng::seed_from_u64(3),
        );
        let selected = resolution.selected.unwrap();
        assert_eq!(selected.tier, PriorityTier::DirectNarrative);
        assert_eq!(selected.link.id.as_str(), "plain");
    }

    #[test]
    fn test_random_tie_break_stays_in_tier() {
        let links = vec![
            Link::new("start", "a").with_id("to-a"),
            Link::new("start", "b").with_id("to-b"),
        ];
        let mut picked = std::collections::HashSet::new();
        for seed in 0..64 {
            let resolution = PathResolver::default().resolve(
                &start(),
                &links,
                &GameState::new(),
                &graph(),
                &mut StdRng::seed_from_u64(seed),
            );
            picked.insert(resolution.selected.unwrap().link.id);
        }
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn test_same_seed_same_pick() {
        let links = vec![Link::new("start", "a"), Link::new("start", "b")];
        let pick = |seed| {
            PathResolver::default()
                .resolve(
                    &start(),
                    &links,
                    &GameState::new(),
                    &graph(),
                    &mut StdRng::seed_from_u64(seed),
                )
                .selected
                .unwrap()
                .link
                .id
        };
        assert_eq!(pick(42), pick(42));
    }

    #[test]
    fn test_dangling_destination_is_dropped() {
        let links = vec![Link::new("start", "nowhere").with_id("dangling")];
        let resolution = PathResolver::default().resolve(
            &start(),
            &links,
            &GameState::new(),
            &graph(),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(!resolution.has_valid_paths());
        assert!(resolution.selected.is_none());
        assert!(resolution.evaluation(&LinkId::from("dangling")).unwrap().valid);
    }

    #[test]
    fn test_evaluations_cached_per_link() {
        let links = vec![
            Link::new("start", "a").with_id("open"),
            Link::new("start", "secret").with_id("closed").with_group(never()),
        ];
        let resolution = PathResolver::default().resolve(
            &start(),
            &links,
            &GameState::new(),
            &graph(),
            &mut StdRng::seed_from_u64(0),
        );

        let open = resolution.evaluation(&LinkId::from("open")).unwrap();
        assert!(open.valid);
        assert!(open.groups.is_empty());

        let closed = resolution.evaluation(&LinkId::from("closed")).unwrap();
        assert!(!closed.valid);
        assert_eq!(closed.groups.len(), 1);
        assert!(!closed.groups[0].conditions[0].result);
    }
}
