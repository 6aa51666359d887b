// SPDX-License-Identifier: MIT OR Apache-2.0
//! Saved editor layout: node positions only.

use crate::graph::Graph;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current layout format version
pub const LAYOUT_FORMAT_VERSION: u32 = 1;

/// Default layout file name
pub const LAYOUT_FILE_NAME: &str = "editor_state.ron";

/// Error when saving or loading a layout
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// File could not be read or written
    #[error("Layout I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON
    #[error("Layout parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Layout could not be encoded
    #[error("Layout encode error: {0}")]
    Encode(#[from] ron::Error),

    /// File was written by an incompatible version
    #[error("Unsupported layout version {found} (expected {expected})")]
    Version {
        /// Version in the file
        found: u32,
        /// Version this build understands
        expected: u32,
    },
}

/// Position of one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePlacement {
    /// Node ID
    pub node: NodeId,
    /// Position in graph space
    pub position: [f32; 2],
}

/// Positions of every node in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorLayout {
    /// Format version
    pub version: u32,
    /// Node positions in draw order
    pub nodes: Vec<NodePlacement>,
}

impl EditorLayout {
    /// Record the current node positions
    pub fn capture(graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .filter_map(|node| {
                node.id().map(|id| NodePlacement {
                    node: id,
                    position: node.position,
                })
            })
            .collect();
        Self {
            version: LAYOUT_FORMAT_VERSION,
            nodes,
        }
    }

    /// Move nodes to their recorded positions
    ///
    /// Entries for nodes that no longer exist are skipped. Returns the number
    /// of nodes placed.
    pub fn apply(&self, graph: &mut Graph) -> usize {
        let mut placed = 0;
        for placement in &self.nodes {
            if let Some(node) = graph.node_mut(placement.node) {
                node.position = placement.position;
                placed += 1;
            }
        }
        placed
    }

    /// Load a layout from a RON file
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let content = std::fs::read_to_string(path)?;
        let layout: EditorLayout = ron::from_str(&content)?;

        if layout.version != LAYOUT_FORMAT_VERSION {
            return Err(LayoutError::Version {
                found: layout.version,
                expected: LAYOUT_FORMAT_VERSION,
            });
        }

        tracing::info!("Loaded layout of {} nodes from {:?}", layout.nodes.len(), path);
        Ok(layout)
    }

    /// Save the layout to a RON file
    pub fn save(&self, path: &Path) -> Result<(), LayoutError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        tracing::info!("Saved layout of {} nodes to {:?}", self.nodes.len(), path);
        Ok(())
    }
}
