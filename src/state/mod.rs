//! Node lifecycle states for the tree walk

mod node_state;

pub use node_state::NodeState;
