// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph editor widget.
//!
//! Features:
//! - Node rendering with a title bar and one row per attribute
//! - Inline controls for value attributes (drag values, combo boxes, flag toggles)
//! - Viewer nodes listing the fields of their bound object
//! - Link rendering (bezier curves)
//! - Pan/zoom navigation
//! - Link drag-to-create, drag-off-input and Ctrl+click to detach
//! - "Add Object" popup (A), rename popup (right click), Delete
//! - Layout save/load (Ctrl+S / Ctrl+L)
//! - Minimap
//!
//! Edits made while drawing are queued as [`EditorAction`]s and applied to
//! the graph once the frame's drawing is done.

use crate::attribute::{AttributeId, AttributeRole, PinSide};
use crate::graph::Graph;
use crate::layout::{EditorLayout, LAYOUT_FILE_NAME};
use crate::link::LinkId;
use crate::node::{Node, NodeCategory, NodeId, NodeKind, NodeRegistry};
use crate::object::{
    AttachmentDescriptionFlags, AttachmentLoadOp, AttachmentStoreOp, ColorComponentFlags, Format,
    ImageLayout, SampleCount,
};
use crate::value::Value;
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use std::path::PathBuf;

/// Node visual dimensions
const NODE_WIDTH: f32 = 260.0;
const NODE_HEADER_HEIGHT: f32 = 24.0;
const ATTRIBUTE_HEIGHT: f32 = 22.0;
const VIEWER_LINE_HEIGHT: f32 = 16.0;
const NODE_BOTTOM_PADDING: f32 = 8.0;
const LABEL_WIDTH: f32 = 104.0;
const PIN_RADIUS: f32 = 6.0;
const PIN_PADDING: f32 = 12.0;
const NODE_ROUNDING: f32 = 6.0;
const NODE_SHADOW_OFFSET: f32 = 3.0;

/// Below this zoom value attributes are shown as text instead of controls
const MIN_CONTROL_ZOOM: f32 = 0.6;

/// Link visual parameters
const BEZIER_CURVATURE: f32 = 50.0;
const LINK_THICKNESS: f32 = 2.5;
const LINK_HIT_DISTANCE: f32 = 6.0;
const BEZIER_SEGMENTS: usize = 32;

/// Grid parameters
const GRID_SPACING: f32 = 20.0;

/// Link being dragged out of a pin
#[derive(Debug, Clone)]
pub struct LinkDrag {
    /// Attribute the drag started from
    pub from: AttributeId,
    /// Side of that attribute (decides which end the cursor is)
    pub side: PinSide,
    /// Current mouse position (screen space)
    pub current_pos: Pos2,
}

/// Graph editor interaction mode
#[derive(Debug, Clone, Default)]
pub enum InteractionMode {
    /// Default mode - selecting
    #[default]
    Normal,
    /// Panning the view
    Panning,
    /// Dragging a node
    DraggingNode(NodeId),
    /// Creating a link
    CreatingLink(LinkDrag),
}

/// A deferred graph edit produced while drawing
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    /// Write a value attribute
    SetValue(AttributeId, Value),
    /// Link two attributes
    AddLink {
        /// Source attribute
        start: AttributeId,
        /// Destination attribute
        end: AttributeId,
    },
    /// Remove a link
    RemoveLink(LinkId),
    /// Add a node from a registry template
    AddNode {
        /// Template ID
        template: String,
        /// Position in graph space
        position: [f32; 2],
    },
    /// Remove a node with its links
    RemoveNode(NodeId),
    /// Change a node title
    Rename(NodeId, String),
    /// Write node positions to the layout file
    SaveLayout,
    /// Read node positions from the layout file
    LoadLayout,
}

/// Open rename popup
#[derive(Debug, Clone)]
struct RenamePopup {
    node: NodeId,
    title: String,
    position: Pos2,
}

/// Graph editor UI state
pub struct GraphEditorState {
    /// Current pan offset (graph space)
    pub pan: Vec2,
    /// Current zoom level
    pub zoom: f32,
    /// Selected node
    pub selected_node: Option<NodeId>,
    /// Current interaction mode
    pub mode: InteractionMode,
    /// Show minimap
    pub show_minimap: bool,
    /// Show grid
    pub show_grid: bool,
    /// Snap to grid
    pub snap_to_grid: bool,
    /// Grid size for snapping
    pub snap_size: f32,
    /// Layout file used by Ctrl+S / Ctrl+L
    pub layout_path: PathBuf,
    /// Last status message (layout save/load)
    pub status: Option<String>,
    /// Last mouse position
    last_mouse_pos: Pos2,
    /// Node being hovered
    hovered_node: Option<NodeId>,
    /// Pin being hovered
    hovered_attribute: Option<AttributeId>,
    /// Link being hovered
    hovered_link: Option<LinkId>,
    /// Screen position of the open "Add Object" popup
    add_menu: Option<Pos2>,
    rename: Option<RenamePopup>,
    /// Edits queued during the current frame
    pending: Vec<EditorAction>,
}

impl GraphEditorState {
    /// Create a new graph editor state
    pub fn new() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            selected_node: None,
            mode: InteractionMode::Normal,
            show_minimap: true,
            show_grid: true,
            snap_to_grid: false,
            snap_size: GRID_SPACING,
            layout_path: PathBuf::from(LAYOUT_FILE_NAME),
            status: None,
            last_mouse_pos: Pos2::ZERO,
            hovered_node: None,
            hovered_attribute: None,
            hovered_link: None,
            add_menu: None,
            rename: None,
            pending: Vec::new(),
        }
    }

    /// Set the layout file path
    pub fn with_layout_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.layout_path = path.into();
        self
    }

    /// Convert screen position to graph position
    pub fn screen_to_graph(&self, screen_pos: Pos2, rect: Rect) -> Pos2 {
        let center = rect.center();
        Pos2::new(
            (screen_pos.x - center.x) / self.zoom - self.pan.x,
            (screen_pos.y - center.y) / self.zoom - self.pan.y,
        )
    }

    /// Convert graph position to screen position
    pub fn graph_to_screen(&self, graph_pos: Pos2, rect: Rect) -> Pos2 {
        let center = rect.center();
        Pos2::new(
            (graph_pos.x + self.pan.x) * self.zoom + center.x,
            (graph_pos.y + self.pan.y) * self.zoom + center.y,
        )
    }

    /// Snap position to grid
    pub fn snap_position(&self, pos: [f32; 2]) -> [f32; 2] {
        if self.snap_to_grid {
            [
                (pos[0] / self.snap_size).round() * self.snap_size,
                (pos[1] / self.snap_size).round() * self.snap_size,
            ]
        } else {
            pos
        }
    }

    /// Queue an edit for the end of the frame
    pub fn queue(&mut self, action: EditorAction) {
        self.pending.push(action);
    }

    /// Apply one edit to the graph
    pub fn apply(&mut self, action: EditorAction, graph: &mut Graph, registry: &NodeRegistry) {
        match action {
            EditorAction::SetValue(attribute, value) => {
                if let Err(err) = graph.set_value(attribute, value) {
                    tracing::warn!("Value edit rejected: {err}");
                }
            }
            EditorAction::AddLink { start, end } => {
                // Rejected pairings from the canvas are ignored
                if let Err(err) = graph.try_add_link(start, end) {
                    tracing::debug!(%err, "link not created");
                }
            }
            EditorAction::RemoveLink(link) => {
                if let Err(err) = graph.try_remove_link(link) {
                    tracing::debug!(%err, "link not removed");
                }
            }
            EditorAction::AddNode { template, position } => match registry.create_node(&template) {
                Some(node) => {
                    let [x, y] = self.snap_position(position);
                    let id = graph.add_node(node.with_position(x, y));
                    self.selected_node = Some(id);
                }
                None => tracing::warn!("Unknown node template: {template}"),
            },
            EditorAction::RemoveNode(node) => {
                graph.remove_node(node);
                if self.selected_node == Some(node) {
                    self.selected_node = None;
                }
            }
            EditorAction::Rename(node, title) => {
                if let Some(node) = graph.node_mut(node) {
                    node.rename(title);
                }
            }
            EditorAction::SaveLayout => {
                let layout = EditorLayout::capture(graph);
                self.status = Some(match layout.save(&self.layout_path) {
                    Ok(()) => format!("Saved layout to {}", self.layout_path.display()),
                    Err(err) => {
                        tracing::error!("Failed to save layout: {err}");
                        format!("Save failed: {err}")
                    }
                });
            }
            EditorAction::LoadLayout => {
                self.status = Some(match EditorLayout::load(&self.layout_path) {
                    Ok(layout) => {
                        let placed = layout.apply(graph);
                        format!("Placed {placed} nodes from {}", self.layout_path.display())
                    }
                    Err(err) => {
                        tracing::error!("Failed to load layout: {err}");
                        format!("Load failed: {err}")
                    }
                });
            }
        }
    }

    /// Apply every queued edit
    pub fn apply_pending(&mut self, graph: &mut Graph, registry: &NodeRegistry) {
        for action in std::mem::take(&mut self.pending) {
            self.apply(action, graph, registry);
        }
    }

    /// Render the graph editor
    pub fn ui(&mut self, ui: &mut egui::Ui, graph: &mut Graph, registry: &NodeRegistry) {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let ctx = ui.ctx().clone();

        let mouse_pos = ui.input(|i| i.pointer.hover_pos().unwrap_or(self.last_mouse_pos));
        self.update_hover(mouse_pos, rect, graph);

        if self.show_grid {
            self.draw_grid(&painter, rect);
        }

        self.handle_input(ui, &response, rect, graph, mouse_pos);

        // Links first (below nodes)
        self.draw_links(&painter, rect, graph);
        if let InteractionMode::CreatingLink(ref drag) = self.mode {
            self.draw_link_drag(&painter, rect, graph, drag);
        }

        self.draw_nodes(ui, &painter, rect, graph);
        self.draw_add_menu(&ctx, rect, registry);
        self.draw_rename_popup(&ctx);

        if self.show_minimap {
            self.draw_minimap(&painter, rect, graph);
        }
        self.draw_help(&painter, rect);
        self.draw_status_bar(&painter, rect, graph);

        self.apply_pending(graph, registry);
    }

    fn update_hover(&mut self, mouse_pos: Pos2, rect: Rect, graph: &Graph) {
        self.hovered_attribute = self.find_pin_at(mouse_pos, rect, graph);
        self.hovered_node = self.find_node_at(self.screen_to_graph(mouse_pos, rect), graph);
        self.hovered_link = if self.hovered_attribute.is_none() && self.hovered_node.is_none() {
            self.find_link_at(mouse_pos, rect, graph)
        } else {
            None
        };
    }

    fn draw_grid(&self, painter: &egui::Painter, rect: Rect) {
        let spacing = GRID_SPACING * self.zoom;
        let major_spacing = spacing * 5.0;

        let grid_color_minor = Color32::from_rgba_unmultiplied(60, 60, 60, 100);
        let grid_color_major = Color32::from_rgba_unmultiplied(80, 80, 80, 150);

        let offset_x = (self.pan.x * self.zoom) % major_spacing;
        let offset_y = (self.pan.y * self.zoom) % major_spacing;

        for (step, color) in [(spacing, grid_color_minor), (major_spacing, grid_color_major)] {
            let mut x = rect.left() + offset_x % step;
            while x < rect.right() {
                painter.line_segment(
                    [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                    Stroke::new(1.0, color),
                );
                x += step;
            }

            let mut y = rect.top() + offset_y % step;
            while y < rect.bottom() {
                painter.line_segment(
                    [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
                    Stroke::new(1.0, color),
                );
                y += step;
            }
        }
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        rect: Rect,
        graph: &mut Graph,
        mouse_pos: Pos2,
    ) {
        let delta = mouse_pos - self.last_mouse_pos;
        self.last_mouse_pos = mouse_pos;

        // Zoom with scroll wheel
        ui.input(|i| {
            if rect.contains(mouse_pos) {
                let scroll_delta = i.raw_scroll_delta.y;
                if scroll_delta != 0.0 {
                    let zoom_factor = 1.0 + scroll_delta * 0.001;
                    let old_zoom = self.zoom;
                    self.zoom = (self.zoom * zoom_factor).clamp(0.1, 4.0);

                    // Zoom toward mouse position
                    if self.zoom != old_zoom {
                        let mouse_graph = self.screen_to_graph(mouse_pos, rect);
                        let zoom_ratio = self.zoom / old_zoom;
                        self.pan.x += mouse_graph.x * (1.0 - zoom_ratio);
                        self.pan.y += mouse_graph.y * (1.0 - zoom_ratio);
                    }
                }
            }
        });

        let mode = std::mem::take(&mut self.mode);
        self.mode = match mode {
            InteractionMode::Normal => {
                let command = ui.input(|i| i.modifiers.command);

                if response.clicked() {
                    self.add_menu = None;
                    match (self.hovered_link, self.hovered_node) {
                        (Some(link), _) if command => self.queue(EditorAction::RemoveLink(link)),
                        (_, Some(node)) => self.selected_node = Some(node),
                        _ => self.selected_node = None,
                    }
                }

                if response.secondary_clicked() {
                    if let Some(node) = self.hovered_node.and_then(|id| graph.node(id)) {
                        if let Some(id) = node.id() {
                            self.rename = Some(RenamePopup {
                                node: id,
                                title: node.title.clone(),
                                position: mouse_pos,
                            });
                        }
                    }
                }

                if response.dragged_by(egui::PointerButton::Middle) {
                    InteractionMode::Panning
                } else if response.drag_started_by(egui::PointerButton::Primary) {
                    if let Some(attribute) = self.hovered_attribute {
                        self.begin_link_drag(attribute, graph, mouse_pos)
                    } else if let Some(node) = self.hovered_node {
                        self.selected_node = Some(node);
                        InteractionMode::DraggingNode(node)
                    } else {
                        InteractionMode::Panning
                    }
                } else {
                    InteractionMode::Normal
                }
            }

            InteractionMode::Panning => {
                if response.dragged() {
                    self.pan += delta / self.zoom;
                }
                if response.drag_stopped() {
                    InteractionMode::Normal
                } else {
                    InteractionMode::Panning
                }
            }

            InteractionMode::DraggingNode(node_id) => {
                let snapped = response.drag_stopped();
                if let Some(node) = graph.node_mut(node_id) {
                    if response.dragged() {
                        let graph_delta = delta / self.zoom;
                        node.position[0] += graph_delta.x;
                        node.position[1] += graph_delta.y;
                    }
                    if snapped {
                        node.position = self.snap_position(node.position);
                    }
                }
                if snapped {
                    InteractionMode::Normal
                } else {
                    InteractionMode::DraggingNode(node_id)
                }
            }

            InteractionMode::CreatingLink(mut drag) => {
                drag.current_pos = mouse_pos;
                if response.drag_stopped() {
                    if let Some(target) = self.hovered_attribute.filter(|t| *t != drag.from) {
                        let (start, end) = match drag.side {
                            PinSide::Output => (drag.from, target),
                            PinSide::Input => (target, drag.from),
                        };
                        self.queue(EditorAction::AddLink { start, end });
                    }
                    InteractionMode::Normal
                } else {
                    InteractionMode::CreatingLink(drag)
                }
            }
        };

        if ctx_accepts_shortcuts(ui) {
            let (add, save, load, delete) = ui.input(|i| {
                (
                    i.key_pressed(egui::Key::A) && !i.modifiers.any(),
                    i.modifiers.command && i.key_pressed(egui::Key::S),
                    i.modifiers.command && i.key_pressed(egui::Key::L),
                    i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace),
                )
            });

            if add && response.contains_pointer() {
                self.add_menu = Some(mouse_pos);
            }
            if save {
                self.queue(EditorAction::SaveLayout);
            } else if load {
                self.queue(EditorAction::LoadLayout);
            }
            if delete {
                if let Some(node) = self.selected_node {
                    self.queue(EditorAction::RemoveNode(node));
                }
            }
        }
    }

    /// Start dragging a link out of a pin
    ///
    /// Dragging from an input that already has a link detaches that link and
    /// carries its source end instead.
    fn begin_link_drag(&mut self, attribute: AttributeId, graph: &Graph, mouse_pos: Pos2) -> InteractionMode {
        let Some((_, attr)) = graph.attribute(attribute) else {
            return InteractionMode::Normal;
        };

        if attr.role() == AttributeRole::ObjectInput {
            if let Some(link) = graph.links_to(attribute).next() {
                let start = link.start;
                self.queue(EditorAction::RemoveLink(link.id));
                return InteractionMode::CreatingLink(LinkDrag {
                    from: start,
                    side: PinSide::Output,
                    current_pos: mouse_pos,
                });
            }
        }

        InteractionMode::CreatingLink(LinkDrag {
            from: attribute,
            side: attr.role().pin_side(),
            current_pos: mouse_pos,
        })
    }

    fn find_node_at(&self, graph_pos: Pos2, graph: &Graph) -> Option<NodeId> {
        // Topmost (last drawn) node first
        graph
            .nodes()
            .rev()
            .find(|node| node_rect(node, graph).contains(graph_pos))
            .and_then(Node::id)
    }

    fn find_pin_at(&self, mouse_pos: Pos2, rect: Rect, graph: &Graph) -> Option<AttributeId> {
        let radius = PIN_RADIUS * self.zoom * 1.5;
        graph
            .nodes()
            .rev()
            .flat_map(|node| node.attribute_ids())
            .find(|id| {
                self.pin_position(graph, *id, rect)
                    .is_some_and(|pos| pos.distance(mouse_pos) < radius)
            })
    }

    fn find_link_at(&self, mouse_pos: Pos2, rect: Rect, graph: &Graph) -> Option<LinkId> {
        graph
            .links()
            .find(|link| {
                let from = self.pin_position(graph, link.start, rect);
                let to = self.pin_position(graph, link.end, rect);
                let (Some(from), Some(to)) = (from, to) else {
                    return false;
                };
                self.link_points(from, to)
                    .windows(2)
                    .any(|w| distance_to_segment(mouse_pos, w[0], w[1]) < LINK_HIT_DISTANCE)
            })
            .map(|link| link.id)
    }

    /// Screen position of an attribute's pin
    fn pin_position(&self, graph: &Graph, attribute: AttributeId, rect: Rect) -> Option<Pos2> {
        let (node, attr) = graph.attribute(attribute)?;
        let row = node.attributes().position(|a| a.id() == Some(attribute))?;
        let y = node.position[1] + NODE_HEADER_HEIGHT + row as f32 * ATTRIBUTE_HEIGHT + ATTRIBUTE_HEIGHT / 2.0;
        let x = match attr.role().pin_side() {
            PinSide::Input => node.position[0],
            PinSide::Output => node.position[0] + NODE_WIDTH,
        };
        Some(self.graph_to_screen(Pos2::new(x, y), rect))
    }

    fn link_points(&self, from: Pos2, to: Pos2) -> Vec<Pos2> {
        let distance = (to.x - from.x).abs();
        let curvature = (BEZIER_CURVATURE * self.zoom).min(distance * 0.5).max(BEZIER_CURVATURE * self.zoom * 0.5);

        let ctrl1 = Pos2::new(from.x + curvature, from.y);
        let ctrl2 = Pos2::new(to.x - curvature, to.y);
        bezier_points(from, ctrl1, ctrl2, to, BEZIER_SEGMENTS)
    }

    fn draw_links(&self, painter: &egui::Painter, rect: Rect, graph: &Graph) {
        for link in graph.links() {
            let from = self.pin_position(graph, link.start, rect);
            let to = self.pin_position(graph, link.end, rect);
            let (Some(from), Some(to)) = (from, to) else {
                continue;
            };

            let [r, g, b] = AttributeRole::ObjectOutput.color();
            let color = if self.hovered_link == Some(link.id) {
                Color32::from_rgb(
                    (r as u16 + 50).min(255) as u8,
                    (g as u16 + 50).min(255) as u8,
                    (b as u16 + 50).min(255) as u8,
                )
            } else {
                Color32::from_rgb(r, g, b)
            };
            self.draw_bezier(painter, from, to, color);
        }
    }

    fn draw_bezier(&self, painter: &egui::Painter, from: Pos2, to: Pos2, color: Color32) {
        let points = self.link_points(from, to);
        for pair in points.windows(2) {
            painter.line_segment([pair[0], pair[1]], Stroke::new(LINK_THICKNESS * self.zoom, color));
        }
    }

    fn draw_link_drag(&self, painter: &egui::Painter, rect: Rect, graph: &Graph, drag: &LinkDrag) {
        let Some(from_pos) = self.pin_position(graph, drag.from, rect) else {
            return;
        };
        let color = graph
            .attribute(drag.from)
            .map(|(_, attr)| {
                let [r, g, b] = attr.role().color();
                Color32::from_rgb(r, g, b)
            })
            .unwrap_or(Color32::GRAY);

        match drag.side {
            PinSide::Output => self.draw_bezier(painter, from_pos, drag.current_pos, color),
            PinSide::Input => self.draw_bezier(painter, drag.current_pos, from_pos, color),
        }
    }

    fn draw_nodes(&mut self, ui: &mut egui::Ui, painter: &egui::Painter, rect: Rect, graph: &Graph) {
        for node in graph.nodes() {
            let Some(node_id) = node.id() else {
                continue;
            };
            let is_selected = self.selected_node == Some(node_id);
            let graph_rect = node_rect(node, graph);
            let screen_rect = Rect::from_min_size(
                self.graph_to_screen(graph_rect.min, rect),
                graph_rect.size() * self.zoom,
            );

            if !screen_rect.intersects(rect) {
                continue;
            }

            // Shadow
            let shadow_rect = screen_rect.translate(Vec2::new(NODE_SHADOW_OFFSET, NODE_SHADOW_OFFSET));
            painter.rect_filled(
                shadow_rect,
                NODE_ROUNDING * self.zoom,
                Color32::from_rgba_unmultiplied(0, 0, 0, 60),
            );

            let bg_color = if is_selected {
                Color32::from_rgb(60, 70, 90)
            } else {
                Color32::from_rgb(45, 45, 48)
            };
            painter.rect_filled(screen_rect, NODE_ROUNDING * self.zoom, bg_color);

            // Title bar
            let header_rect = Rect::from_min_size(
                screen_rect.min,
                Vec2::new(screen_rect.width(), NODE_HEADER_HEIGHT * self.zoom),
            );
            let header_color = match node.kind() {
                NodeKind::ObjectEditor => Color32::from_rgb(70, 100, 130),
                NodeKind::ObjectViewer => Color32::from_rgb(110, 80, 120),
            };
            painter.rect_filled(
                header_rect,
                egui::Rounding {
                    nw: NODE_ROUNDING * self.zoom,
                    ne: NODE_ROUNDING * self.zoom,
                    sw: 0.0,
                    se: 0.0,
                },
                header_color,
            );
            painter.text(
                header_rect.center(),
                egui::Align2::CENTER_CENTER,
                &node.title,
                egui::FontId::proportional(12.0 * self.zoom),
                Color32::WHITE,
            );

            if is_selected {
                painter.rect_stroke(
                    screen_rect,
                    NODE_ROUNDING * self.zoom,
                    Stroke::new(2.0, Color32::from_rgb(100, 150, 255)),
                );
            }

            self.draw_attributes(ui, painter, rect, node, screen_rect);

            if node.kind() == NodeKind::ObjectViewer {
                let rows = node.attributes().count() as f32;
                let mut y = screen_rect.top() + (NODE_HEADER_HEIGHT + rows * ATTRIBUTE_HEIGHT) * self.zoom;
                for line in viewer_lines(node, graph) {
                    painter.text(
                        Pos2::new(screen_rect.left() + PIN_PADDING * self.zoom, y),
                        egui::Align2::LEFT_TOP,
                        line,
                        egui::FontId::monospace(10.0 * self.zoom),
                        Color32::from_gray(210),
                    );
                    y += VIEWER_LINE_HEIGHT * self.zoom;
                }
            }
        }
    }

    /// Draw attribute rows in order: pin, label, and control for values
    fn draw_attributes(
        &mut self,
        ui: &mut egui::Ui,
        painter: &egui::Painter,
        rect: Rect,
        node: &Node,
        screen_rect: Rect,
    ) {
        let show_controls = self.zoom >= MIN_CONTROL_ZOOM;

        for (row, attribute) in node.attributes().enumerate() {
            let Some(id) = attribute.id() else {
                continue;
            };
            let row_top = screen_rect.top() + (NODE_HEADER_HEIGHT + row as f32 * ATTRIBUTE_HEIGHT) * self.zoom;
            let center_y = row_top + ATTRIBUTE_HEIGHT * self.zoom / 2.0;
            let side = attribute.role().pin_side();

            let pin_pos = match side {
                PinSide::Input => Pos2::new(screen_rect.left(), center_y),
                PinSide::Output => Pos2::new(screen_rect.right(), center_y),
            };
            self.draw_pin(painter, attribute.role(), pin_pos, self.hovered_attribute == Some(id));

            let font = egui::FontId::proportional(10.0 * self.zoom);
            match side {
                PinSide::Input => painter.text(
                    Pos2::new(pin_pos.x + PIN_PADDING * self.zoom, center_y),
                    egui::Align2::LEFT_CENTER,
                    &attribute.name,
                    font.clone(),
                    Color32::from_gray(200),
                ),
                PinSide::Output => painter.text(
                    Pos2::new(pin_pos.x - PIN_PADDING * self.zoom, center_y),
                    egui::Align2::RIGHT_CENTER,
                    &attribute.name,
                    font.clone(),
                    Color32::from_gray(200),
                ),
            };

            let Some(value) = attribute
                .field()
                .and_then(|field| node.object().and_then(|object| object.get(field)))
            else {
                continue;
            };

            let control_rect = Rect::from_min_max(
                Pos2::new(
                    screen_rect.left() + (PIN_PADDING + LABEL_WIDTH) * self.zoom,
                    row_top + 2.0,
                ),
                Pos2::new(
                    screen_rect.right() - PIN_PADDING * self.zoom,
                    row_top + ATTRIBUTE_HEIGHT * self.zoom - 2.0,
                ),
            );

            if show_controls && rect.contains_rect(control_rect) {
                let edited = ui
                    .allocate_new_ui(
                        egui::UiBuilder::new()
                            .max_rect(control_rect)
                            .id_salt(("vknodes_value", id.0)),
                        |ui| edit_value(ui, id, value),
                    )
                    .inner;
                if let Some(value) = edited {
                    self.queue(EditorAction::SetValue(id, value));
                }
            } else {
                painter.text(
                    control_rect.left_center(),
                    egui::Align2::LEFT_CENTER,
                    value.display(),
                    font,
                    Color32::from_gray(230),
                );
            }
        }
    }

    fn draw_pin(&self, painter: &egui::Painter, role: AttributeRole, pos: Pos2, hovered: bool) {
        let radius = PIN_RADIUS * self.zoom;
        let [r, g, b] = role.color();
        let color = Color32::from_rgb(r, g, b);

        if hovered {
            painter.circle_filled(pos, radius * 1.3, color);
        } else {
            painter.circle_filled(pos, radius, color);
        }
        painter.circle_stroke(pos, radius, Stroke::new(1.0, Color32::from_gray(30)));
    }

    fn draw_add_menu(&mut self, ctx: &egui::Context, rect: Rect, registry: &NodeRegistry) {
        let Some(screen_pos) = self.add_menu else {
            return;
        };
        let graph_pos = self.screen_to_graph(screen_pos, rect);
        let mut chosen = None;

        egui::Area::new(egui::Id::new("vknodes_add_menu"))
            .fixed_pos(screen_pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(egui::RichText::new("Add Object").strong());
                    for category in [NodeCategory::Object, NodeCategory::Scalar, NodeCategory::Viewer] {
                        ui.separator();
                        for template in registry.types_in_category(category) {
                            if ui
                                .button(&template.name)
                                .on_hover_text(&template.description)
                                .clicked()
                            {
                                chosen = Some(template.id.clone());
                            }
                        }
                    }
                });
            });

        if let Some(template) = chosen {
            self.queue(EditorAction::AddNode {
                template,
                position: [graph_pos.x, graph_pos.y],
            });
            self.add_menu = None;
        } else if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.add_menu = None;
        }
    }

    fn draw_rename_popup(&mut self, ctx: &egui::Context) {
        let Some(popup) = &mut self.rename else {
            return;
        };
        let mut commit = false;
        let mut close = false;

        egui::Area::new(egui::Id::new("vknodes_rename"))
            .fixed_pos(popup.position)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label("rename");
                        let edit = ui.text_edit_singleline(&mut popup.title);
                        if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                            commit = true;
                        }
                    });
                    ui.horizontal(|ui| {
                        commit |= ui.button("OK").clicked();
                        close |= ui.button("Cancel").clicked();
                    });
                });
            });

        if commit {
            let action = EditorAction::Rename(popup.node, popup.title.clone());
            self.pending.push(action);
        }
        if commit || close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.rename = None;
        }
    }

    fn draw_minimap(&self, painter: &egui::Painter, rect: Rect, graph: &Graph) {
        let minimap_size = Vec2::new(150.0, 100.0);
        let minimap_rect = Rect::from_min_size(
            Pos2::new(rect.right() - minimap_size.x - 10.0, rect.bottom() - minimap_size.y - 10.0),
            minimap_size,
        );

        painter.rect_filled(
            minimap_rect,
            4.0,
            Color32::from_rgba_unmultiplied(30, 30, 30, 200),
        );
        painter.rect_stroke(minimap_rect, 4.0, Stroke::new(1.0, Color32::from_gray(60)));

        if graph.node_count() == 0 {
            return;
        }

        // Bounds of all nodes
        let bounds = graph
            .nodes()
            .map(|node| node_rect(node, graph))
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::NOTHING)
            .expand(50.0);

        let scale = (minimap_rect.width() / bounds.width()).min(minimap_rect.height() / bounds.height());

        for node in graph.nodes() {
            let node_rect = node_rect(node, graph);
            let min = Pos2::new(
                minimap_rect.left() + (node_rect.min.x - bounds.min.x) * scale,
                minimap_rect.top() + (node_rect.min.y - bounds.min.y) * scale,
            );
            let color = if node.id().is_some() && self.selected_node == node.id() {
                Color32::from_rgb(100, 150, 255)
            } else {
                Color32::from_rgb(80, 80, 100)
            };
            painter.rect_filled(Rect::from_min_size(min, node_rect.size() * scale), 2.0, color);
        }

        // Viewport indicator
        let view_min = Pos2::new(
            minimap_rect.left() + (-self.pan.x - bounds.min.x - rect.width() / (2.0 * self.zoom)) * scale,
            minimap_rect.top() + (-self.pan.y - bounds.min.y - rect.height() / (2.0 * self.zoom)) * scale,
        );
        let view_size = Vec2::new(rect.width() / self.zoom * scale, rect.height() / self.zoom * scale);
        painter.rect_stroke(
            Rect::from_min_size(view_min, view_size).intersect(minimap_rect),
            2.0,
            Stroke::new(1.0, Color32::WHITE),
        );
    }

    fn draw_help(&self, painter: &egui::Painter, rect: Rect) {
        painter.text(
            rect.left_top() + Vec2::new(8.0, 6.0),
            egui::Align2::LEFT_TOP,
            "A: add node. Ctrl+S: save node positions. Ctrl+L: load node positions. Ctrl+click: detach link.",
            egui::FontId::proportional(11.0),
            Color32::from_gray(170),
        );
    }

    fn draw_status_bar(&self, painter: &egui::Painter, rect: Rect, graph: &Graph) {
        let mut text = format!(
            "Nodes: {} | Links: {} | Zoom: {:.0}%",
            graph.node_count(),
            graph.link_count(),
            self.zoom * 100.0,
        );
        if let Some(status) = &self.status {
            text.push_str(" | ");
            text.push_str(status);
        }

        painter.text(
            Pos2::new(rect.left() + 5.0, rect.bottom() - 11.0),
            egui::Align2::LEFT_CENTER,
            text,
            egui::FontId::proportional(11.0),
            Color32::from_gray(150),
        );
    }
}

impl Default for GraphEditorState {
    fn default() -> Self {
        Self::new()
    }
}

fn ctx_accepts_shortcuts(ui: &egui::Ui) -> bool {
    !ui.ctx().wants_keyboard_input()
}

/// Graph-space rectangle of a node
fn node_rect(node: &Node, graph: &Graph) -> Rect {
    let rows = node.attributes().count() as f32;
    let lines = if node.kind() == NodeKind::ObjectViewer {
        viewer_lines(node, graph).len() as f32
    } else {
        0.0
    };
    let height = NODE_HEADER_HEIGHT + rows * ATTRIBUTE_HEIGHT + lines * VIEWER_LINE_HEIGHT + NODE_BOTTOM_PADDING;
    Rect::from_min_size(
        Pos2::new(node.position[0], node.position[1]),
        Vec2::new(NODE_WIDTH, height),
    )
}

/// Text shown in a viewer body: the bound object's fields, or "no input"
pub(crate) fn viewer_lines(node: &Node, graph: &Graph) -> Vec<String> {
    let Some(object) = node.input_id().and_then(|id| graph.bound_object(id)) else {
        return vec!["no input".to_string()];
    };

    let mut lines = vec![object.kind().label().to_string()];
    for field in object.fields() {
        if let Some(value) = object.get(*field) {
            lines.push(format!("{}: {}", field.label(), value.display()));
        }
    }
    lines
}

/// Inline control for one value; returns the new value if it was edited
fn edit_value(ui: &mut egui::Ui, id: AttributeId, value: Value) -> Option<Value> {
    match value {
        Value::Int(mut v) => ui
            .add(egui::DragValue::new(&mut v))
            .changed()
            .then_some(Value::Int(v)),
        Value::Float(mut v) => ui
            .add(egui::DragValue::new(&mut v).speed(0.01))
            .changed()
            .then_some(Value::Float(v)),
        Value::Format(v) => enum_combo(ui, id, v, Format::ALL, Format::label).map(Value::Format),
        Value::SampleCount(v) => {
            enum_combo(ui, id, v, SampleCount::ALL, SampleCount::label).map(Value::SampleCount)
        }
        Value::LoadOp(v) => {
            enum_combo(ui, id, v, AttachmentLoadOp::ALL, AttachmentLoadOp::label).map(Value::LoadOp)
        }
        Value::StoreOp(v) => {
            enum_combo(ui, id, v, AttachmentStoreOp::ALL, AttachmentStoreOp::label).map(Value::StoreOp)
        }
        Value::ImageLayout(v) => {
            enum_combo(ui, id, v, ImageLayout::ALL, ImageLayout::label).map(Value::ImageLayout)
        }
        Value::ColorComponents(v) => {
            flag_toggles(ui, v, ColorComponentFlags::LABELS).map(Value::ColorComponents)
        }
        Value::AttachmentFlags(v) => {
            flag_toggles(ui, v, AttachmentDescriptionFlags::LABELS).map(Value::AttachmentFlags)
        }
    }
}

fn enum_combo<T: Copy + PartialEq>(
    ui: &mut egui::Ui,
    id: AttributeId,
    current: T,
    all: &[T],
    label: fn(&T) -> &'static str,
) -> Option<T> {
    let mut selected = current;
    egui::ComboBox::from_id_salt(("vknodes_combo", id.0))
        .selected_text(label(&current))
        .width(ui.available_width())
        .show_ui(ui, |ui| {
            for option in all {
                ui.selectable_value(&mut selected, *option, label(option));
            }
        });
    (selected != current).then_some(selected)
}

fn flag_toggles<F: bitflags::Flags + Copy + PartialEq>(
    ui: &mut egui::Ui,
    current: F,
    labels: &[(F, &str)],
) -> Option<F> {
    let mut flags = current;
    ui.horizontal(|ui| {
        for (bit, name) in labels {
            let mut on = flags.contains(*bit);
            if ui.checkbox(&mut on, *name).changed() {
                flags.set(*bit, on);
            }
        }
    });
    (flags != current).then_some(flags)
}

/// Distance from `p` to the segment `a`-`b`
fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Generate points along a cubic bezier curve
fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * p0.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * p3.x;
        let y = mt3 * p0.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * p3.y;

        points.push(Pos2::new(x, y));
    }
    points
}
