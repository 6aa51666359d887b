// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end checks of the graph's id, link and binding rules.

use std::collections::HashSet;
use vknodes_graph::{
    AttachmentDescription, AttachmentLoadOp, AttributeId, ColorTarget, EditorLayout, Field, Graph,
    LinkError, LinkId, Node, NodeId, Object, Value,
};

fn output_of(graph: &Graph, node: NodeId) -> AttributeId {
    graph.node(node).and_then(Node::output_id).unwrap()
}

fn input_of(graph: &Graph, node: NodeId) -> AttributeId {
    graph.node(node).and_then(Node::input_id).unwrap()
}

#[test]
fn test_ids_are_unique_across_nodes_attributes_and_links() {
    let mut graph = Graph::new();
    let mut ids = HashSet::new();
    let mut sources = Vec::new();
    let mut viewers = Vec::new();

    for i in 0..8 {
        let editor = graph.add_node(Node::editor(format!("Int{i}"), Object::Int(i)));
        let viewer = graph.add_node(Node::viewer());
        assert!(ids.insert(editor.0));
        assert!(ids.insert(viewer.0));
        for node in [editor, viewer] {
            for attribute in graph.node(node).unwrap().attribute_ids() {
                assert!(ids.insert(attribute.0));
            }
        }
        sources.push(editor);
        viewers.push(viewer);
    }

    // Relinking every viewer to every source hands out fresh link ids each time
    for source in &sources {
        for viewer in &viewers {
            let link = graph
                .add_link(output_of(&graph, *source), input_of(&graph, *viewer))
                .unwrap();
            assert!(ids.insert(link.0));
        }
    }
    assert_eq!(graph.link_count(), viewers.len());
}

#[test]
fn test_relink_replaces_binding() {
    let mut graph = Graph::new();
    let first = graph.add_node(Node::editor("A", Object::Int(1)));
    let second = graph.add_node(Node::editor("B", Object::Float(0.5)));
    let viewer = graph.add_node(Node::viewer());
    let input = input_of(&graph, viewer);

    let old = graph.add_link(output_of(&graph, first), input).unwrap();
    let new = graph.add_link(output_of(&graph, second), input).unwrap();

    assert!(graph.link(old).is_none());
    let into_input: Vec<LinkId> = graph.links_to(input).map(|l| l.id).collect();
    assert_eq!(into_input, vec![new]);
    assert_eq!(graph.bound_object(input), Some(&Object::Float(0.5)));
}

#[test]
fn test_remove_link_unbinds_input() {
    let mut graph = Graph::demo();
    let link = graph.links().next().unwrap();
    let (link_id, input) = (link.id, link.end);
    assert!(graph.bound_object(input).is_some());

    let removed = graph.remove_link(link_id);
    assert_eq!(removed.end, input);
    assert!(graph.bound_object(input).is_none());
    assert_eq!(graph.link_count(), 0);
}

#[test]
#[should_panic(expected = "not a registered attribute")]
fn test_add_link_unknown_attribute_panics() {
    let mut graph = Graph::demo();
    let input = graph.nodes().last().and_then(Node::input_id).unwrap();
    graph.add_link(AttributeId(10_000), input);
}

#[test]
#[should_panic(expected = "Link not found")]
fn test_remove_link_unknown_panics() {
    let mut graph = Graph::demo();
    graph.remove_link(LinkId(10_000));
}

#[test]
fn test_try_forms_return_errors() {
    let mut graph = Graph::demo();
    assert!(matches!(
        graph.try_add_link(AttributeId(10_000), AttributeId(10_001)),
        Err(LinkError::UnknownAttribute(_))
    ));
    assert!(matches!(
        graph.try_remove_link(LinkId(10_000)),
        Err(LinkError::UnknownLink(_))
    ));
}

#[test]
fn test_unsupported_pairings_change_nothing() {
    let mut graph = Graph::new();
    let editor = graph.add_node(Node::editor("Target", ColorTarget::default()));
    let viewer = graph.add_node(Node::viewer());
    let output = output_of(&graph, editor);
    let input = input_of(&graph, viewer);
    let value = graph.node(editor).unwrap().attribute_ids().next().unwrap();

    assert_eq!(graph.add_link(input, output), None);
    assert_eq!(graph.add_link(value, input), None);
    assert_eq!(graph.add_link(output, value), None);
    assert_eq!(graph.add_link(output, output), None);

    assert_eq!(graph.link_count(), 0);
    assert!(graph.bound_object(input).is_none());
}

#[test]
fn test_remove_source_node_unbinds_viewers() {
    let mut graph = Graph::new();
    let editor = graph.add_node(Node::editor("A", Object::Int(1)));
    let viewers: Vec<NodeId> = (0..3).map(|_| graph.add_node(Node::viewer())).collect();
    for viewer in &viewers {
        graph.add_link(output_of(&graph, editor), input_of(&graph, *viewer));
    }
    assert_eq!(graph.link_count(), 3);

    graph.remove_node(editor).unwrap();
    assert_eq!(graph.link_count(), 0);
    for viewer in viewers {
        assert!(graph.bound_object(input_of(&graph, viewer)).is_none());
    }
}

#[test]
fn test_edits_are_visible_through_viewer() {
    let mut graph = Graph::new();
    let editor = graph.add_node(Node::editor("Node1", AttachmentDescription::default()));
    let viewer = graph.add_node(Node::viewer());
    let input = input_of(&graph, viewer);
    graph.add_link(output_of(&graph, editor), input).unwrap();

    let load_op = graph
        .node(editor)
        .unwrap()
        .attributes()
        .find(|a| a.field() == Some(Field::LoadOp))
        .and_then(|a| a.id())
        .unwrap();
    graph
        .set_value(load_op, Value::LoadOp(AttachmentLoadOp::Clear))
        .unwrap();

    let Some(Object::AttachmentDescription(description)) = graph.bound_object(input) else {
        panic!("viewer should see the attachment description");
    };
    assert_eq!(description.load_op, AttachmentLoadOp::Clear);
}

#[test]
fn test_layout_restores_existing_nodes_only() {
    let path = std::env::temp_dir()
        .join("vknodes_graph_properties")
        .join("layout.ron");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    let mut graph = Graph::demo();
    EditorLayout::capture(&graph).save(&path).unwrap();

    let ids: Vec<NodeId> = graph.node_ids().collect();
    graph.remove_node(ids[1]);
    graph.node_mut(ids[0]).unwrap().position = [0.0, 0.0];

    let placed = EditorLayout::load(&path).unwrap().apply(&mut graph);
    assert_eq!(placed, 2);
    assert_eq!(graph.node(ids[0]).unwrap().position, [-320.0, -120.0]);
}
