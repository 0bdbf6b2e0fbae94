//! Display history - the transcript shown to the player.
//!
//! `history` only ever holds narrative nodes. The stored display history
//! interleaves the choice nodes picked between them, and is rebuilt when
//! the player goes back.

use serde::{Deserialize, Serialize};
use tracing::debug;

use story_graph::{Node, NodeId};

use super::StoryEngine;

/// How the transcript is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayMode {
    /// Narrative nodes only.
    Narrative,
    /// Narrative nodes with the choices taken between them.
    #[default]
    Full,
}

impl StoryEngine {
    /// Transcript to render, ending with `current` if it is not already the
    /// last entry.
    pub fn display_history(&self, mode: DisplayMode, current: Option<&Node>) -> Vec<Node> {
        let mut transcript = match mode {
            DisplayMode::Narrative => self.narrative_transcript(),
            DisplayMode::Full => self.full_transcript(true),
        };

        if let Some(current) = current {
            if transcript.last().map(Node::id) != Some(current.id()) {
                transcript.push(current.clone());
            }
        }
        transcript
    }

    /// Append a picked choice to the stored transcript. Narrative nodes and
    /// an immediate repeat are ignored.
    pub fn add_choice_to_display_history(&mut self, choice: &Node) {
        if !choice.is_choice() {
            return;
        }
        if self.state.display_history.last().map(Node::id) == Some(choice.id()) {
            return;
        }
        self.state.display_history.push(choice.clone());
    }

    /// Rebuild the stored transcript so it agrees with `history` again.
    pub fn update_display_history_on_back(&mut self, mode: DisplayMode) {
        self.state.display_history = match mode {
            DisplayMode::Narrative => self.narrative_transcript(),
            DisplayMode::Full => self.full_transcript(false),
        };
        debug!(
            entries = self.state.display_history.len(),
            narratives = self.state.history.len(),
            "Display history rebuilt"
        );
    }

    fn narrative_transcript(&self) -> Vec<Node> {
        self.state
            .history
            .iter()
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect()
    }

    /// Stored transcript checked against `history`, or a rebuild from the
    /// graph when the two disagree.
    fn full_transcript(&self, keep_trailing: bool) -> Vec<Node> {
        self.truncated_transcript(keep_trailing)
            .unwrap_or_else(|| self.transcript_from_links())
    }

    /// Stored transcript cut back to exactly `history`. Missing choices
    /// between two narratives are filled in from the graph. Choices picked
    /// after the last narrative are kept only with `keep_trailing`.
    fn truncated_transcript(&self, keep_trailing: bool) -> Option<Vec<Node>> {
        let history = &self.state.history;
        let mut kept: Vec<Node> = Vec::new();
        let mut narratives = 0;

        for node in &self.state.display_history {
            if narratives == history.len() && !keep_trailing {
                break;
            }
            if node.is_narrative() {
                if history.get(narratives) != Some(node.id()) {
                    return None;
                }
                let bridge = match kept.last() {
                    Some(Node::Narrative(prev)) => {
                        self.bridging_choice(&prev.id, node.id()).cloned()
                    }
                    _ => None,
                };
                kept.extend(bridge);
                narratives += 1;
            }
            kept.push(node.clone());
        }

        (narratives == history.len()).then_some(kept)
    }

    /// Reconstruct the transcript from `history` and the graph, inserting the
    /// choice that bridges two narratives without a direct link.
    fn transcript_from_links(&self) -> Vec<Node> {
        let mut transcript = Vec::new();
        for (i, id) in self.state.history.iter().enumerate() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            transcript.push(node.clone());
            if let Some(next) = self.state.history.get(i + 1) {
                if let Some(choice) = self.bridging_choice(id, next) {
                    transcript.push(choice.clone());
                }
            }
        }
        transcript
    }

    fn bridging_choice(&self, from: &NodeId, to: &NodeId) -> Option<&Node> {
        let links = self.outgoing.get(from)?;
        if links.iter().any(|l| &l.target == to) {
            return None;
        }

        let candidates: Vec<&Node> = links
            .iter()
            .filter_map(|l| self.nodes.get(&l.target))
            .filter(|n| n.is_choice())
            .filter(|n| {
                self.outgoing
                    .get(n.id())
                    .is_some_and(|out| out.iter().any(|l| &l.target == to))
            })
            .collect();

        candidates
            .iter()
            .find(|n| self.state.visited_nodes.contains(n.id()))
            .or_else(|| candidates.first())
            .copied()
    }
}
