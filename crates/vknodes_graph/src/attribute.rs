// SPDX-License-Identifier: MIT OR Apache-2.0
//! Attribute definitions: the linkable endpoints of a node.

use crate::node::NodeId;
use crate::value::Field;
use serde::{Deserialize, Serialize};

/// Unique identifier for an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeId(pub u32);

/// Which side of a node an attribute's pin is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinSide {
    /// Left edge
    Input,
    /// Right edge
    Output,
}

/// Data-less discriminant of [`AttributeKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    /// Edits a field of the node's object
    Value,
    /// Exposes the node's whole object
    ObjectOutput,
    /// Receives an object from another node
    ObjectInput,
}

impl AttributeRole {
    /// Get the pin side for this role
    pub fn pin_side(&self) -> PinSide {
        match self {
            Self::Value | Self::ObjectInput => PinSide::Input,
            Self::ObjectOutput => PinSide::Output,
        }
    }

    /// Get the pin color for this role (for UI)
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Value => [80, 200, 200],
            Self::ObjectOutput => [255, 200, 100],
            Self::ObjectInput => [200, 100, 200],
        }
    }
}

/// What an attribute is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Editable field of the owning node's object
    Value {
        /// Selected field
        field: Field,
    },
    /// The owning node's whole object
    ObjectOutput,
    /// Optional binding to the node whose output feeds this input
    ObjectInput {
        /// Source node, set only by linking
        source: Option<NodeId>,
    },
}

impl AttributeKind {
    /// Get the role of this kind
    pub fn role(&self) -> AttributeRole {
        match self {
            Self::Value { .. } => AttributeRole::Value,
            Self::ObjectOutput => AttributeRole::ObjectOutput,
            Self::ObjectInput { .. } => AttributeRole::ObjectInput,
        }
    }
}

/// An attribute on a node
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Graph-assigned id, `None` until the node is added
    pub(crate) id: Option<AttributeId>,
    /// Attribute name
    pub name: String,
    /// Binding
    pub(crate) kind: AttributeKind,
}

impl Attribute {
    /// Create a value attribute named after its field
    pub fn value(field: Field) -> Self {
        Self {
            id: None,
            name: field.label().to_string(),
            kind: AttributeKind::Value { field },
        }
    }

    /// Create an object output attribute
    pub fn object_output() -> Self {
        Self {
            id: None,
            name: "out".to_string(),
            kind: AttributeKind::ObjectOutput,
        }
    }

    /// Create an unbound object input attribute
    pub fn object_input() -> Self {
        Self {
            id: None,
            name: "input".to_string(),
            kind: AttributeKind::ObjectInput { source: None },
        }
    }

    /// Get the assigned id
    pub fn id(&self) -> Option<AttributeId> {
        self.id
    }

    /// Get the binding
    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// Get the role
    pub fn role(&self) -> AttributeRole {
        self.kind.role()
    }

    /// Field edited by a value attribute
    pub fn field(&self) -> Option<Field> {
        match self.kind {
            AttributeKind::Value { field } => Some(field),
            _ => None,
        }
    }

    /// Source node of a bound object input
    pub fn source(&self) -> Option<NodeId> {
        match self.kind {
            AttributeKind::ObjectInput { source } => source,
            _ => None,
        }
    }

    /// Check if the roles allow a link from this attribute to `end`
    ///
    /// [`Graph::try_add_link`](crate::graph::Graph::try_add_link) additionally
    /// rejects links between two attributes of the same node.
    pub fn can_link_to(&self, end: &Attribute) -> bool {
        matches!(
            (self.role(), end.role()),
            (AttributeRole::ObjectOutput, AttributeRole::ObjectInput)
        )
    }

    /// Point an object input at a source node; no-op for other kinds
    pub(crate) fn bind(&mut self, node: NodeId) {
        if let AttributeKind::ObjectInput { source } = &mut self.kind {
            *source = Some(node);
        }
    }

    /// Clear an object input's binding, returning the previous source
    pub(crate) fn unbind(&mut self) -> Option<NodeId> {
        match &mut self.kind {
            AttributeKind::ObjectInput { source } => source.take(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_output_to_input_links() {
        let value = Attribute::value(Field::Num);
        let output = Attribute::object_output();
        let input = Attribute::object_input();

        assert!(output.can_link_to(&input));
        assert!(!input.can_link_to(&output));
        assert!(!value.can_link_to(&input));
        assert!(!output.can_link_to(&value));
        assert!(!output.can_link_to(&output));
    }

    #[test]
    fn test_bind_and_unbind() {
        let mut input = Attribute::object_input();
        assert_eq!(input.source(), None);

        input.bind(NodeId(4));
        assert_eq!(input.source(), Some(NodeId(4)));
        assert_eq!(input.unbind(), Some(NodeId(4)));
        assert_eq!(input.source(), None);

        let mut output = Attribute::object_output();
        output.bind(NodeId(4));
        assert_eq!(output.kind(), &AttributeKind::ObjectOutput);
    }

    #[test]
    fn test_pin_sides() {
        assert_eq!(Attribute::value(Field::Format).role().pin_side(), PinSide::Input);
        assert_eq!(Attribute::object_input().role().pin_side(), PinSide::Input);
        assert_eq!(Attribute::object_output().role().pin_side(), PinSide::Output);
        assert_eq!(Attribute::value(Field::LoadOp).name, "load op");
    }
}
