//! # Story Graph
//!
//! The data model of a branching narrative: narrative and choice nodes, the
//! conditional links between them, story variables and the operations nodes
//! apply to those variables.
//!
//! This crate holds no playback logic. It is the read-only input handed to
//! `playback_core`, usually produced by an authoring tool and loaded from JSON.

pub mod condition;
pub mod error;
pub mod ids;
pub mod node;
pub mod operation;
pub mod story;
pub mod variable;

pub use condition::*;
pub use error::*;
pub use ids::*;
pub use node::*;
pub use operation::*;
pub use story::*;
pub use variable::*;
