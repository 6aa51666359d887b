// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph.

use crate::attribute::{Attribute, AttributeId, AttributeRole};
use crate::object::{AttachmentDescription, ColorTarget, Object};
use serde::{Deserialize, Serialize};

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// What a node does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Owns an object, edits its fields and exposes it
    ObjectEditor,
    /// Shows whatever object is linked into its input
    ObjectViewer,
}

/// Node template category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    /// Pipeline-state structs
    Object,
    /// Bare numbers
    Scalar,
    /// Read-only inspection
    Viewer,
}

/// A node instance in the graph
#[derive(Debug, Clone)]
pub struct Node {
    /// Graph-assigned id, `None` until added
    pub(crate) id: Option<NodeId>,
    /// Title bar text
    pub title: String,
    /// Position in the graph UI
    pub position: [f32; 2],
    pub(crate) kind: NodeKind,
    pub(crate) object: Option<Object>,
    /// Value attributes first, then the object input/output
    pub(crate) attributes: Vec<Attribute>,
}

impl Node {
    /// Create an editor node owning `object`
    ///
    /// Gets one value attribute per editable field, then an `"out"` output.
    pub fn editor(title: impl Into<String>, object: impl Into<Object>) -> Self {
        let object = object.into();
        let mut attributes: Vec<Attribute> =
            object.fields().iter().copied().map(Attribute::value).collect();
        attributes.push(Attribute::object_output());

        Self {
            id: None,
            title: title.into(),
            position: [0.0, 0.0],
            kind: NodeKind::ObjectEditor,
            object: Some(object),
            attributes,
        }
    }

    /// Create a viewer node with a single unbound input
    pub fn viewer() -> Self {
        Self {
            id: None,
            title: "Viewer".to_string(),
            position: [0.0, 0.0],
            kind: NodeKind::ObjectViewer,
            object: None,
            attributes: vec![Attribute::object_input()],
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Change the title
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Get the assigned id
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    /// Get the node kind
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Get the owned object (editors only)
    pub fn object(&self) -> Option<&Object> {
        self.object.as_ref()
    }

    /// Attributes in draw order
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// Get an attribute by ID
    pub fn attribute(&self, id: AttributeId) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.id == Some(id))
    }

    /// Id of the object output, if any
    pub fn output_id(&self) -> Option<AttributeId> {
        self.attribute_with_role(AttributeRole::ObjectOutput)
    }

    /// Id of the object input, if any
    pub fn input_id(&self) -> Option<AttributeId> {
        self.attribute_with_role(AttributeRole::ObjectInput)
    }

    /// Ids of all attributes, in draw order
    pub fn attribute_ids(&self) -> impl Iterator<Item = AttributeId> + '_ {
        self.attributes.iter().filter_map(Attribute::id)
    }

    fn attribute_with_role(&self, role: AttributeRole) -> Option<AttributeId> {
        self.attributes
            .iter()
            .find(|a| a.role() == role)
            .and_then(Attribute::id)
    }
}

/// Template for nodes offered in the "Add Object" menu
#[derive(Debug, Clone)]
pub struct NodeTemplate {
    /// Unique template identifier
    pub id: String,
    /// Menu label
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Builds a fresh, unassigned node
    pub build: fn() -> Node,
}

/// Registry of available node templates
pub struct NodeRegistry {
    /// Registered templates by ID
    templates: indexmap::IndexMap<String, NodeTemplate>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            templates: indexmap::IndexMap::new(),
        }
    }

    /// Registry with every built-in node
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(NodeTemplate {
            id: "attachment_description".to_string(),
            name: "Attachment Description".to_string(),
            category: NodeCategory::Object,
            description: "Render pass attachment".to_string(),
            build: || Node::editor("Attachment Description", AttachmentDescription::default()),
        });
        registry.register(NodeTemplate {
            id: "color_target".to_string(),
            name: "Color Target".to_string(),
            category: NodeCategory::Object,
            description: "Color output with write mask".to_string(),
            build: || Node::editor("Color Target", ColorTarget::default()),
        });
        registry.register(NodeTemplate {
            id: "int".to_string(),
            name: "Int".to_string(),
            category: NodeCategory::Scalar,
            description: "Integer constant".to_string(),
            build: || Node::editor("Int", Object::Int(0)),
        });
        registry.register(NodeTemplate {
            id: "float".to_string(),
            name: "Float".to_string(),
            category: NodeCategory::Scalar,
            description: "Float constant".to_string(),
            build: || Node::editor("Float", Object::Float(0.0)),
        });
        registry.register(NodeTemplate {
            id: "viewer".to_string(),
            name: "Viewer".to_string(),
            category: NodeCategory::Viewer,
            description: "Shows the linked object".to_string(),
            build: Node::viewer,
        });

        registry
    }

    /// Register a template
    pub fn register(&mut self, template: NodeTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Get a template by ID
    pub fn get(&self, id: &str) -> Option<&NodeTemplate> {
        self.templates.get(id)
    }

    /// Get all registered templates
    pub fn templates(&self) -> impl Iterator<Item = &NodeTemplate> {
        self.templates.values()
    }

    /// Get templates by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeTemplate> {
        self.templates.values().filter(move |t| t.category == category)
    }

    /// Build a node from a template ID
    pub fn create_node(&self, id: &str) -> Option<Node> {
        self.get(id).map(|t| (t.build)())
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Field;

    #[test]
    fn test_editor_attribute_order() {
        let node = Node::editor("Node", AttachmentDescription::default());
        let roles: Vec<_> = node.attributes().map(Attribute::role).collect();
        assert_eq!(roles.len(), 10);
        assert!(roles[..9].iter().all(|r| *r == AttributeRole::Value));
        assert_eq!(roles[9], AttributeRole::ObjectOutput);

        let first = node.attributes().next().unwrap();
        assert_eq!(first.field(), Some(Field::Flags));
        assert_eq!(node.kind(), NodeKind::ObjectEditor);
        assert!(node.id().is_none());
    }

    #[test]
    fn test_attribute_lookup_by_id() {
        let mut graph = crate::graph::Graph::new();
        let id = graph.add_node(Node::editor("Count", Object::Int(3)));
        let node = graph.node(id).unwrap();

        let output = node.output_id().unwrap();
        assert_eq!(node.attribute(output).map(Attribute::role), Some(AttributeRole::ObjectOutput));
        let scalar = node.attribute_ids().next().unwrap();
        assert_eq!(node.attribute(scalar).and_then(Attribute::field), Some(Field::Scalar));
        assert!(node.attribute(AttributeId(999)).is_none());
        assert!(node.input_id().is_none());
    }

    #[test]
    fn test_viewer_has_single_input() {
        let node = Node::viewer();
        assert_eq!(node.title, "Viewer");
        assert!(node.object().is_none());
        assert_eq!(node.attributes().count(), 1);
        assert_eq!(node.attributes().next().unwrap().role(), AttributeRole::ObjectInput);
    }

    #[test]
    fn test_rename() {
        let mut node = Node::editor("Int", Object::Int(3)).with_position(10.0, 20.0);
        node.rename("Count");
        assert_eq!(node.title, "Count");
        assert_eq!(node.position, [10.0, 20.0]);
    }

    #[test]
    fn test_builtin_registry() {
        let registry = NodeRegistry::builtin();
        assert_eq!(registry.templates().count(), 5);
        assert_eq!(registry.types_in_category(NodeCategory::Scalar).count(), 2);

        let node = registry.create_node("color_target").unwrap();
        assert_eq!(node.title, "Color Target");
        assert_eq!(node.attributes().count(), 4);
        assert!(registry.create_node("missing").is_none());
    }
}
