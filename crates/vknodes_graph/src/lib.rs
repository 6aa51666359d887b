// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph for editing Vulkan pipeline-state objects.
//!
//! Each editor node owns one object (an attachment description, a color
//! target or a bare number) and exposes every field as an editable value
//! attribute, plus an output that hands the whole object downstream. Viewer
//! nodes take one object input and show whatever is linked into it.
//!
//! ## Architecture
//!
//! - Nodes, attributes and links share one id space handed out by the graph
//! - A node owns its object; value attributes name a field of it
//! - An object input stores the id of its source node and is resolved on read
//! - The egui widget in [`ui`] queues edits and applies them after drawing

pub mod attribute;
pub mod graph;
pub mod layout;
pub mod link;
pub mod node;
pub mod object;
pub mod ui;
pub mod value;

pub use attribute::{Attribute, AttributeId, AttributeKind, AttributeRole, PinSide};
pub use graph::{Graph, LinkError};
pub use layout::{EditorLayout, LayoutError, NodePlacement};
pub use link::{Link, LinkId};
pub use node::{Node, NodeCategory, NodeId, NodeKind, NodeRegistry, NodeTemplate};
pub use object::{
    AttachmentDescription, AttachmentDescriptionFlags, AttachmentLoadOp, AttachmentStoreOp,
    ColorComponentFlags, ColorTarget, Format, ImageLayout, Object, ObjectKind, SampleCount,
};
pub use ui::{EditorAction, GraphEditorState};
pub use value::{Field, Value, ValueError, ValueType};
