// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use crate::attribute::AttributeId;
use serde::{Deserialize, Serialize};

/// Unique identifier for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub u32);

/// A directed link between two attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Unique link ID
    pub id: LinkId,
    /// Source attribute
    pub start: AttributeId,
    /// Destination attribute
    pub end: AttributeId,
}

impl Link {
    pub(crate) fn new(id: LinkId, start: AttributeId, end: AttributeId) -> Self {
        Self { id, start, end }
    }

    /// Check if this link touches a specific attribute
    pub fn involves(&self, attribute: AttributeId) -> bool {
        self.start == attribute || self.end == attribute
    }
}
