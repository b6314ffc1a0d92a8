/// Node state definitions for tracking walk progress
///
/// Every node the walker visits moves through these states. Structural
/// nodes route through ChildrenPending; sections route through LeafReady.
use std::fmt;

/// Represents the current state of a node in the tree walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    // ===== Active States =====
    /// Node reference has been discovered on a parent page
    Discovered,

    /// Node's page (or expansion endpoint) is being fetched
    Fetching,

    /// Node's page is loaded and records are being extracted
    Extracting,

    /// Structural node whose children still need visiting
    ChildrenPending,

    /// Leaf node whose payload has been extracted
    LeafReady,

    /// Node's subtree has been folded into the persisted document
    Merged,

    // ===== Terminal States =====
    /// Node fully processed and persisted
    Done,

    /// Fetch or extraction failed after exhausting retries; the node was
    /// recorded with a placeholder payload or its subtree was dropped
    Failed,
}

impl NodeState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the node may still make progress
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this state represents a retry-exhausted failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::ChildrenPending => "children_pending",
            Self::LeafReady => "leaf_ready",
            Self::Merged => "merged",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
