//! # Playback Core
//!
//! Runtime for interactive, branching stories built with `story_graph`.
//! The engine walks a story graph: it visits narrative nodes, offers
//! choices, follows conditional links, applies variable operations and can
//! step back or restart with exact state restoration.
//!
//! ## Core Components
//!
//! - **engine**: `StoryEngine`, the playback state machine and its display history
//! - **resolver**: Classifies outgoing links into priority tiers and picks one
//! - **conditions**: Condition strategies, group and link-level evaluation
//! - **operations**: Applies and rolls back variable operations
//! - **state**: `GameState` and the execution/condition logs
//! - **events**: Typed story events and a synchronous event bus
//! - **config**: `EngineConfig`, loadable from TOML
//!
//! ## Design Philosophy
//!
//! - **Single owner**: the engine owns all state; components borrow it per call
//! - **Never throws during play**: failures are logged and yield `None` or no change
//! - **Reproducible**: all randomness comes from one injectable, seedable source

pub mod conditions;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod operations;
pub mod resolver;
pub mod state;

#[cfg(test)]
mod fixtures;

pub use conditions::{ConditionEvaluator, ConditionOutcome, GroupOutcome, LinkEvaluation};
pub use config::EngineConfig;
pub use engine::{AvailableChoice, DisplayMode, StoryEngine};
pub use error::{OperationError, PlaybackError};
pub use events::{EventBus, StoryEvent, StoryEventKind, SubscriberResult, SubscriptionId};
pub use operations::OperationsExecutor;
pub use resolver::{PathResolution, PathResolver, PriorityTier, PriorityTiers, SelectedPath};
pub use state::{ConditionRecord, GameState, OperationRecord};
