// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure: the authority for ids, nodes and links.

use crate::attribute::{Attribute, AttributeId, AttributeRole};
use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId};
use crate::object::{AttachmentDescription, ColorComponentFlags, ColorTarget, Object};
use crate::value::{Value, ValueError};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Location of an attribute inside its node
#[derive(Debug, Clone, Copy)]
struct AttributeSlot {
    node: NodeId,
    index: usize,
}

/// A node graph
///
/// Nodes, attributes and links share one id counter, so any id is unique
/// across the whole graph and is never handed out twice.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Next id to hand out
    counter: u32,
    /// Nodes in insertion (draw) order
    nodes: IndexMap<NodeId, Node>,
    /// Links between attributes
    links: IndexMap<LinkId, Link>,
    /// Attribute lookup
    attributes: HashMap<AttributeId, AttributeSlot>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph with two editors and a viewer showing the first one
    #[allow(clippy::approx_constant)]
    pub fn demo() -> Self {
        let mut graph = Self::new();

        let attachment = graph.add_node(
            Node::editor("Node1", AttachmentDescription::default()).with_position(-320.0, -120.0),
        );
        graph.add_node(
            Node::editor(
                "Node2",
                ColorTarget {
                    num: 4,
                    magnitude: 3.14,
                    color_components: ColorComponentFlags::R | ColorComponentFlags::G,
                },
            )
            .with_position(-320.0, 180.0),
        );
        let viewer = graph.add_node(Node::viewer().with_position(40.0, -60.0));

        let output = graph.node(attachment).and_then(Node::output_id);
        let input = graph.node(viewer).and_then(Node::input_id);
        if let (Some(output), Some(input)) = (output, input) {
            graph.add_link(output, input);
        }
        graph
    }

    fn next_id(&mut self) -> u32 {
        let id = self.counter;
        self.counter += 1;
        id
    }

    /// Add a node, assigning ids to it and then to each of its attributes
    ///
    /// # Panics
    /// If the node already carries ids, i.e. it was taken from another graph.
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        assert!(node.id.is_none(), "node {:?} already has an id", node.id);
        assert!(
            node.attributes.iter().all(|a| a.id.is_none()),
            "node attributes already have ids"
        );

        let node_id = NodeId(self.next_id());
        node.id = Some(node_id);
        for index in 0..node.attributes.len() {
            let attribute_id = AttributeId(self.next_id());
            node.attributes[index].id = Some(attribute_id);
            node.attributes[index].unbind();
            self.attributes
                .insert(attribute_id, AttributeSlot { node: node_id, index });
        }

        tracing::trace!(
            node = node_id.0,
            attributes = node.attributes.len(),
            title = %node.title,
            "node added"
        );
        self.nodes.insert(node_id, node);
        node_id
    }

    /// Remove a node and every link touching it
    ///
    /// Viewers fed by this node lose their binding.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let attribute_ids: Vec<AttributeId> = self.nodes.get(&node_id)?.attribute_ids().collect();

        let touching: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| attribute_ids.iter().any(|a| l.involves(*a)))
            .map(|l| l.id)
            .collect();
        for link_id in touching {
            self.detach(link_id);
        }

        for attribute_id in &attribute_ids {
            self.attributes.remove(attribute_id);
        }
        tracing::debug!(node = node_id.0, "node removed");
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if an attribute is registered
    pub fn contains_attribute(&self, attribute_id: AttributeId) -> bool {
        self.attributes.contains_key(&attribute_id)
    }

    /// Get an attribute together with its node
    pub fn attribute(&self, attribute_id: AttributeId) -> Option<(&Node, &Attribute)> {
        let slot = self.attributes.get(&attribute_id)?;
        let node = self.nodes.get(&slot.node)?;
        Some((node, &node.attributes[slot.index]))
    }

    /// Get the node owning an attribute
    pub fn node_of(&self, attribute_id: AttributeId) -> Option<NodeId> {
        self.attributes.get(&attribute_id).map(|slot| slot.node)
    }

    fn slot(&self, attribute_id: AttributeId) -> Result<AttributeSlot, LinkError> {
        self.attributes
            .get(&attribute_id)
            .copied()
            .ok_or(LinkError::UnknownAttribute(attribute_id))
    }

    fn attribute_at_mut(&mut self, slot: AttributeSlot) -> Option<&mut Attribute> {
        self.nodes
            .get_mut(&slot.node)
            .and_then(|node| node.attributes.get_mut(slot.index))
    }

    /// Link an object output to an object input
    ///
    /// An input holds at most one incoming link: any earlier link into `end`
    /// is removed (and the binding cleared) before the new one is made.
    /// Pairings other than output -> input are rejected and return `None`.
    ///
    /// # Panics
    /// If either id is not a registered attribute.
    #[track_caller]
    pub fn add_link(&mut self, start: AttributeId, end: AttributeId) -> Option<LinkId> {
        match self.try_add_link(start, end) {
            Ok(link_id) => Some(link_id),
            Err(LinkError::UnknownAttribute(id)) => {
                panic!("link endpoint {id:?} is not a registered attribute")
            }
            Err(err) => {
                tracing::debug!(%err, "link rejected");
                None
            }
        }
    }

    /// Fallible form of [`Graph::add_link`]
    pub fn try_add_link(&mut self, start: AttributeId, end: AttributeId) -> Result<LinkId, LinkError> {
        let start_slot = self.slot(start)?;
        let end_slot = self.slot(end)?;

        let start_attribute = self.attribute_at(start_slot);
        let end_attribute = self.attribute_at(end_slot);
        let supported = matches!(
            (start_attribute, end_attribute),
            (Some(start), Some(end)) if start.can_link_to(end)
        );
        if !supported {
            return Err(LinkError::UnsupportedEndpoints {
                start: start_attribute.map(Attribute::role),
                end: end_attribute.map(Attribute::role),
            });
        }
        // Roles alone allow it, but a node never feeds itself
        if start_slot.node == end_slot.node {
            return Err(LinkError::SelfLink(start_slot.node));
        }

        let stale: Vec<LinkId> = self.links_to(end).map(|l| l.id).collect();
        for link_id in stale {
            self.detach(link_id);
        }

        if let Some(input) = self.attribute_at_mut(end_slot) {
            input.bind(start_slot.node);
        }
        let link_id = LinkId(self.next_id());
        self.links.insert(link_id, Link::new(link_id, start, end));
        tracing::debug!(link = link_id.0, start = start.0, end = end.0, "link added");
        Ok(link_id)
    }

    fn attribute_at(&self, slot: AttributeSlot) -> Option<&Attribute> {
        self.nodes
            .get(&slot.node)
            .and_then(|node| node.attributes.get(slot.index))
    }

    /// Remove a link, clearing the binding of an object input at its end
    ///
    /// # Panics
    /// If the link does not exist.
    #[track_caller]
    pub fn remove_link(&mut self, link_id: LinkId) -> Link {
        match self.try_remove_link(link_id) {
            Ok(link) => link,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible form of [`Graph::remove_link`]
    pub fn try_remove_link(&mut self, link_id: LinkId) -> Result<Link, LinkError> {
        let link = self.detach(link_id).ok_or(LinkError::UnknownLink(link_id))?;
        tracing::debug!(link = link_id.0, "link removed");
        Ok(link)
    }

    fn detach(&mut self, link_id: LinkId) -> Option<Link> {
        let link = self.links.shift_remove(&link_id)?;
        if let Some(slot) = self.attributes.get(&link.end).copied() {
            if let Some(input) = self.attribute_at_mut(slot) {
                input.unbind();
            }
        }
        Some(link)
    }

    /// Get a link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get links starting at an attribute
    pub fn links_from(&self, attribute_id: AttributeId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.start == attribute_id)
    }

    /// Get links ending at an attribute
    pub fn links_to(&self, attribute_id: AttributeId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.end == attribute_id)
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Resolve an object input to the live object of its source node
    pub fn bound_object(&self, input_id: AttributeId) -> Option<&Object> {
        let (_, input) = self.attribute(input_id)?;
        self.nodes.get(&input.source()?)?.object()
    }

    /// Read the field behind a value attribute
    pub fn value(&self, attribute_id: AttributeId) -> Option<Value> {
        let (node, attribute) = self.attribute(attribute_id)?;
        node.object()?.get(attribute.field()?)
    }

    /// Write the field behind a value attribute
    ///
    /// Viewers bound to the owning node see the new value immediately.
    pub fn set_value(&mut self, attribute_id: AttributeId, value: Value) -> Result<(), ValueError> {
        let slot = self
            .attributes
            .get(&attribute_id)
            .copied()
            .ok_or(ValueError::UnknownAttribute(attribute_id))?;
        let node = self
            .nodes
            .get_mut(&slot.node)
            .ok_or(ValueError::UnknownAttribute(attribute_id))?;
        let field = node.attributes[slot.index]
            .field()
            .ok_or(ValueError::NotAValue(attribute_id))?;
        let object = node.object.as_mut().ok_or(ValueError::NotAValue(attribute_id))?;
        object.set(field, value)
    }
}

/// Error when creating or removing a link
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Attribute not registered
    #[error("Attribute not found: {0:?}")]
    UnknownAttribute(AttributeId),

    /// Link not found
    #[error("Link not found: {0:?}")]
    UnknownLink(LinkId),

    /// Only object output -> object input links are supported
    #[error("Cannot link {start:?} to {end:?}")]
    UnsupportedEndpoints {
        /// Role of the start attribute
        start: Option<AttributeRole>,
        /// Role of the end attribute
        end: Option<AttributeRole>,
    },

    /// Node linked to itself
    #[error("Node {0:?} cannot be linked to itself")]
    SelfLink(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{AttachmentLoadOp, ImageLayout};
    use crate::value::Field;

    fn editor(graph: &mut Graph, value: i32) -> (NodeId, AttributeId) {
        let node = graph.add_node(Node::editor("Int", Object::Int(value)));
        let output = graph.node(node).and_then(Node::output_id).unwrap();
        (node, output)
    }

    fn viewer(graph: &mut Graph) -> (NodeId, AttributeId) {
        let node = graph.add_node(Node::viewer());
        let input = graph.node(node).and_then(Node::input_id).unwrap();
        (node, input)
    }

    #[test]
    fn test_ids_follow_counter() {
        let mut graph = Graph::new();
        let node = graph.add_node(Node::editor("Target", ColorTarget::default()));
        assert_eq!(node, NodeId(0));

        let ids: Vec<_> = graph.node(node).unwrap().attribute_ids().collect();
        assert_eq!(ids, vec![AttributeId(1), AttributeId(2), AttributeId(3), AttributeId(4)]);

        let next = graph.add_node(Node::viewer());
        assert_eq!(next, NodeId(5));
        assert_eq!(graph.node_of(AttributeId(6)), Some(next));
    }

    #[test]
    fn test_link_binds_input() {
        let mut graph = Graph::new();
        let (source, output) = editor(&mut graph, 66);
        let (_, input) = viewer(&mut graph);

        let link = graph.add_link(output, input).unwrap();
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.link(link).map(|l| (l.start, l.end)), Some((output, input)));
        assert_eq!(graph.attribute(input).unwrap().1.source(), Some(source));
        assert_eq!(graph.bound_object(input), Some(&Object::Int(66)));
    }

    #[test]
    fn test_relink_replaces_previous() {
        let mut graph = Graph::new();
        let (_, first) = editor(&mut graph, 1);
        let (second_node, second) = editor(&mut graph, 2);
        let (_, input) = viewer(&mut graph);

        let old = graph.add_link(first, input).unwrap();
        let new = graph.add_link(second, input).unwrap();

        assert!(graph.link(old).is_none());
        assert!(graph.link(new).is_some());
        assert_eq!(graph.links_to(input).count(), 1);
        assert_eq!(graph.attribute(input).unwrap().1.source(), Some(second_node));
        assert_eq!(graph.bound_object(input), Some(&Object::Int(2)));
    }

    #[test]
    fn test_remove_link_clears_binding() {
        let mut graph = Graph::new();
        let (_, output) = editor(&mut graph, 1);
        let (_, input) = viewer(&mut graph);

        let link = graph.add_link(output, input).unwrap();
        let removed = graph.remove_link(link);
        assert_eq!(removed.end, input);
        assert_eq!(graph.link_count(), 0);
        assert!(graph.bound_object(input).is_none());
    }

    #[test]
    fn test_unsupported_pairings_are_rejected() {
        let mut graph = Graph::new();
        let (source, output) = editor(&mut graph, 1);
        let (_, input) = viewer(&mut graph);
        let value = graph.node(source).unwrap().attribute_ids().next().unwrap();

        assert!(graph.add_link(input, output).is_none());
        assert!(graph.add_link(value, input).is_none());
        assert!(graph.add_link(output, value).is_none());
        assert!(matches!(
            graph.try_add_link(output, output),
            Err(LinkError::UnsupportedEndpoints { .. })
        ));
        assert_eq!(graph.link_count(), 0);
        assert!(graph.bound_object(input).is_none());
    }

    #[test]
    fn test_self_link_rejected() {
        let mut graph = Graph::new();
        let mut node = Node::editor("Loop", Object::Int(1));
        node.attributes.push(Attribute::object_input());
        let node_id = graph.add_node(node);
        let output = graph.node(node_id).and_then(Node::output_id).unwrap();
        let input = graph.node(node_id).and_then(Node::input_id).unwrap();

        // The roles alone would allow it
        let (_, output_attr) = graph.attribute(output).unwrap();
        let (_, input_attr) = graph.attribute(input).unwrap();
        assert!(output_attr.can_link_to(input_attr));

        assert!(matches!(
            graph.try_add_link(output, input),
            Err(LinkError::SelfLink(id)) if id == node_id
        ));
        assert!(graph.add_link(output, input).is_none());
        assert_eq!(graph.link_count(), 0);
        assert!(graph.bound_object(input).is_none());
    }

    #[test]
    fn test_links_from_output() {
        let mut graph = Graph::new();
        let (_, output) = editor(&mut graph, 1);
        let (_, first) = viewer(&mut graph);
        let (_, second) = viewer(&mut graph);

        let a = graph.add_link(output, first).unwrap();
        let b = graph.add_link(output, second).unwrap();
        let from: Vec<LinkId> = graph.links_from(output).map(|l| l.id).collect();
        assert_eq!(from, vec![a, b]);
        assert_eq!(graph.links_from(first).count(), 0);

        graph.remove_link(a);
        assert_eq!(graph.links_from(output).map(|l| l.end).collect::<Vec<_>>(), vec![second]);
    }

    #[test]
    fn test_rejected_pairing_keeps_existing_binding() {
        let mut graph = Graph::new();
        let (source, output) = editor(&mut graph, 5);
        let (_, input) = viewer(&mut graph);
        let value = graph.node(source).unwrap().attribute_ids().next().unwrap();

        graph.add_link(output, input).unwrap();
        assert!(graph.add_link(value, input).is_none());
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.bound_object(input), Some(&Object::Int(5)));
    }

    #[test]
    #[should_panic(expected = "not a registered attribute")]
    fn test_add_link_unknown_attribute_panics() {
        let mut graph = Graph::new();
        let (_, output) = editor(&mut graph, 1);
        graph.add_link(output, AttributeId(999));
    }

    #[test]
    #[should_panic(expected = "Link not found")]
    fn test_remove_unknown_link_panics() {
        let mut graph = Graph::new();
        graph.remove_link(LinkId(3));
    }

    #[test]
    #[should_panic(expected = "already has an id")]
    fn test_adding_assigned_node_panics() {
        let mut graph = Graph::new();
        let node = graph.add_node(Node::viewer());
        let copy = graph.node(node).unwrap().clone();
        graph.add_node(copy);
    }

    #[test]
    fn test_try_forms_report_errors() {
        let mut graph = Graph::new();
        assert!(matches!(
            graph.try_add_link(AttributeId(0), AttributeId(1)),
            Err(LinkError::UnknownAttribute(AttributeId(0)))
        ));
        assert!(matches!(
            graph.try_remove_link(LinkId(0)),
            Err(LinkError::UnknownLink(LinkId(0)))
        ));
    }

    #[test]
    fn test_remove_node_unbinds_viewers() {
        let mut graph = Graph::new();
        let (source, output) = editor(&mut graph, 1);
        let (_, input) = viewer(&mut graph);
        graph.add_link(output, input).unwrap();

        let removed = graph.remove_node(source).unwrap();
        assert_eq!(removed.title, "Int");
        assert_eq!(graph.link_count(), 0);
        assert!(graph.bound_object(input).is_none());
        assert!(!graph.contains_attribute(output));
        assert!(graph.remove_node(source).is_none());
    }

    #[test]
    fn test_set_value_is_seen_by_viewer() {
        let mut graph = Graph::new();
        let node = graph.add_node(Node::editor("Pass", AttachmentDescription::default()));
        let (_, input) = viewer(&mut graph);
        let load_op = graph
            .node(node)
            .unwrap()
            .attributes()
            .find(|a| a.field() == Some(Field::LoadOp))
            .and_then(Attribute::id)
            .unwrap();
        let output = graph.node(node).and_then(Node::output_id).unwrap();
        graph.add_link(output, input).unwrap();

        graph
            .set_value(load_op, Value::LoadOp(AttachmentLoadOp::Clear))
            .unwrap();
        assert_eq!(graph.value(load_op), Some(Value::LoadOp(AttachmentLoadOp::Clear)));

        let Some(Object::AttachmentDescription(desc)) = graph.bound_object(input) else {
            panic!("viewer not bound");
        };
        assert_eq!(desc.load_op, AttachmentLoadOp::Clear);
        assert_eq!(desc.final_layout, ImageLayout::Undefined);
    }

    #[test]
    fn test_set_value_errors() {
        let mut graph = Graph::new();
        let (_, output) = editor(&mut graph, 1);
        assert!(matches!(
            graph.set_value(output, Value::Int(2)),
            Err(ValueError::NotAValue(_))
        ));
        assert!(matches!(
            graph.set_value(AttributeId(77), Value::Int(2)),
            Err(ValueError::UnknownAttribute(AttributeId(77)))
        ));
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_demo_graph() {
        let graph = Graph::demo();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.link_count(), 1);
        let viewer = graph.nodes().last().unwrap();
        let input = viewer.input_id().unwrap();
        assert!(matches!(
            graph.bound_object(input),
            Some(Object::AttachmentDescription(_))
        ));

        let color_target = graph.nodes().nth(1).and_then(Node::object);
        assert!(matches!(
            color_target,
            Some(Object::ColorTarget(ColorTarget { num: 4, magnitude, .. })) if *magnitude == 3.14
        ));
    }
}
