// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine-side objects edited through the graph.
//!
//! A small slice of Vulkan pipeline state: attachment descriptions plus the
//! enums and flag sets they are built from. Every enum carries the display
//! label used by the editor widgets.

use crate::value::{Field, Value, ValueError};
use bitflags::bitflags;

/// How attachment contents are treated at the start of a subpass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttachmentLoadOp {
    /// Preserve previous contents
    #[default]
    Load,
    /// Clear to a constant
    Clear,
    /// Contents are undefined
    DontCare,
    /// No access at all (`VK_EXT_load_store_op_none`)
    NoneExt,
}

impl AttachmentLoadOp {
    /// All variants in display order
    pub const ALL: &'static [Self] = &[Self::Load, Self::Clear, Self::DontCare, Self::NoneExt];

    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Load => "Load",
            Self::Clear => "Clear",
            Self::DontCare => "Don't Care",
            Self::NoneExt => "None Ext",
        }
    }
}

/// How attachment contents are treated at the end of a subpass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttachmentStoreOp {
    /// Write contents to memory
    #[default]
    Store,
    /// Contents are not needed afterwards
    DontCare,
    /// No access at all
    NoneExt,
}

impl AttachmentStoreOp {
    /// All variants in display order
    pub const ALL: &'static [Self] = &[Self::Store, Self::DontCare, Self::NoneExt];

    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Store => "Store",
            Self::DontCare => "Don't Care",
            Self::NoneExt => "None Ext",
        }
    }
}

/// Texel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(clippy::upper_case_acronyms)]
pub enum Format {
    /// Not specified
    #[default]
    Undefined,
    /// 24-bit depth, 8-bit stencil
    D24UnormS8Uint,
    /// Three 32-bit floats
    R32G32B32Sfloat,
    /// BGRA, sRGB encoded
    B8G8R8A8Srgb,
    /// RGBA, normalized
    R8G8B8A8Unorm,
    /// RGBA, sRGB encoded
    R8G8B8A8Srgb,
}

impl Format {
    /// All variants in display order
    pub const ALL: &'static [Self] = &[
        Self::Undefined,
        Self::D24UnormS8Uint,
        Self::R32G32B32Sfloat,
        Self::B8G8R8A8Srgb,
        Self::R8G8B8A8Unorm,
        Self::R8G8B8A8Srgb,
    ];

    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Undefined => "Undefined",
            Self::D24UnormS8Uint => "D24 Unorm S8 Uint",
            Self::R32G32B32Sfloat => "R32G32B32 Sfloat",
            Self::B8G8R8A8Srgb => "B8G8R8A8 Srgb",
            Self::R8G8B8A8Unorm => "R8G8B8A8 Unorm",
            Self::R8G8B8A8Srgb => "R8G8B8A8 Srgb",
        }
    }
}

/// Image memory layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageLayout {
    /// Contents may be discarded
    #[default]
    Undefined,
    /// Color attachment
    ColorAttachmentOptimal,
    /// Depth/stencil attachment
    DepthStencilAttachmentOptimal,
    /// Read-only stencil
    StencilReadOnlyOptimal,
    /// Transfer source
    TransferSrcOptimal,
    /// Transfer destination
    TransferDstOptimal,
    /// Depth attachment
    DepthAttachmentOptimal,
    /// Presentable swapchain image
    PresentSrcKhr,
}

impl ImageLayout {
    /// All variants in display order
    pub const ALL: &'static [Self] = &[
        Self::Undefined,
        Self::ColorAttachmentOptimal,
        Self::DepthStencilAttachmentOptimal,
        Self::StencilReadOnlyOptimal,
        Self::TransferSrcOptimal,
        Self::TransferDstOptimal,
        Self::DepthAttachmentOptimal,
        Self::PresentSrcKhr,
    ];

    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Undefined => "Undefined",
            Self::ColorAttachmentOptimal => "Color Attachment Optimal",
            Self::DepthStencilAttachmentOptimal => "Depth Stencil Attachment Optimal",
            Self::StencilReadOnlyOptimal => "Stencil Read-Only Optimal",
            Self::TransferSrcOptimal => "Transfer Source Optimal",
            Self::TransferDstOptimal => "Transfer Destination Optimal",
            Self::DepthAttachmentOptimal => "Depth Attachment Optimal",
            Self::PresentSrcKhr => "Present Source Khronos",
        }
    }
}

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleCount {
    /// 1 sample
    #[default]
    X1,
    /// 2 samples
    X2,
    /// 4 samples
    X4,
    /// 8 samples
    X8,
    /// 16 samples
    X16,
    /// 32 samples
    X32,
    /// 64 samples
    X64,
}

impl SampleCount {
    /// All variants in display order
    pub const ALL: &'static [Self] = &[
        Self::X1,
        Self::X2,
        Self::X4,
        Self::X8,
        Self::X16,
        Self::X32,
        Self::X64,
    ];

    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::X1 => "1",
            Self::X2 => "2",
            Self::X4 => "4",
            Self::X8 => "8",
            Self::X16 => "16",
            Self::X32 => "32",
            Self::X64 => "64",
        }
    }

    /// Number of samples per pixel
    pub fn samples(&self) -> u32 {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
            Self::X16 => 16,
            Self::X32 => 32,
            Self::X64 => 64,
        }
    }
}

bitflags! {
    /// Color channels written by a blend attachment
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColorComponentFlags: u32 {
        /// Red
        const R = 0x1;
        /// Green
        const G = 0x2;
        /// Blue
        const B = 0x4;
        /// Alpha
        const A = 0x8;
    }
}

impl ColorComponentFlags {
    /// Named bits in display order
    pub const LABELS: &'static [(Self, &'static str)] =
        &[(Self::R, "R"), (Self::G, "G"), (Self::B, "B"), (Self::A, "A")];

    /// Comma-separated names of the set bits
    pub fn label(&self) -> String {
        flag_label(Self::LABELS, |bit| self.contains(bit))
    }
}

bitflags! {
    /// Extra properties of an attachment
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttachmentDescriptionFlags: u32 {
        /// Attachment aliases memory of other attachments
        const MAY_ALIAS = 0x1;
    }
}

impl AttachmentDescriptionFlags {
    /// Named bits in display order
    pub const LABELS: &'static [(Self, &'static str)] = &[(Self::MAY_ALIAS, "May Alias")];

    /// Comma-separated names of the set bits
    pub fn label(&self) -> String {
        flag_label(Self::LABELS, |bit| self.contains(bit))
    }
}

fn flag_label<F: Copy>(labels: &[(F, &str)], contains: impl Fn(F) -> bool) -> String {
    let names: Vec<&str> = labels
        .iter()
        .filter(|(bit, _)| contains(*bit))
        .map(|(_, name)| *name)
        .collect();
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}

/// Description of a render pass attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttachmentDescription {
    /// Extra properties
    pub flags: AttachmentDescriptionFlags,
    /// Image format
    pub format: Format,
    /// Samples per pixel
    pub samples: SampleCount,
    /// Color/depth load behavior
    pub load_op: AttachmentLoadOp,
    /// Color/depth store behavior
    pub store_op: AttachmentStoreOp,
    /// Stencil load behavior
    pub stencil_load_op: AttachmentLoadOp,
    /// Stencil store behavior
    pub stencil_store_op: AttachmentStoreOp,
    /// Layout when the render pass begins
    pub initial_layout: ImageLayout,
    /// Layout the image transitions to when the render pass ends
    pub final_layout: ImageLayout,
}

/// Color output target
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorTarget {
    /// Target index
    pub num: i32,
    /// Blend weight
    pub magnitude: f32,
    /// Written channels
    pub color_components: ColorComponentFlags,
}

/// Discriminant of [`Object`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// [`AttachmentDescription`]
    AttachmentDescription,
    /// [`ColorTarget`]
    ColorTarget,
    /// Bare integer
    Int,
    /// Bare float
    Float,
}

impl ObjectKind {
    /// Get display name
    pub fn label(&self) -> &'static str {
        match self {
            Self::AttachmentDescription => "Attachment Description",
            Self::ColorTarget => "Color Target",
            Self::Int => "Int",
            Self::Float => "Float",
        }
    }
}

/// Any value a node can own and expose through its output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Object {
    /// Attachment description
    AttachmentDescription(AttachmentDescription),
    /// Color target
    ColorTarget(ColorTarget),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
}

const ATTACHMENT_FIELDS: &[Field] = &[
    Field::Flags,
    Field::Format,
    Field::Samples,
    Field::LoadOp,
    Field::StoreOp,
    Field::StencilLoadOp,
    Field::StencilStoreOp,
    Field::InitialLayout,
    Field::FinalLayout,
];

const COLOR_TARGET_FIELDS: &[Field] = &[Field::Num, Field::Magnitude, Field::ColorComponents];

const SCALAR_FIELDS: &[Field] = &[Field::Scalar];

impl Object {
    /// Get the object kind
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::AttachmentDescription(_) => ObjectKind::AttachmentDescription,
            Self::ColorTarget(_) => ObjectKind::ColorTarget,
            Self::Int(_) => ObjectKind::Int,
            Self::Float(_) => ObjectKind::Float,
        }
    }

    /// Editable fields, in display order
    pub fn fields(&self) -> &'static [Field] {
        match self {
            Self::AttachmentDescription(_) => ATTACHMENT_FIELDS,
            Self::ColorTarget(_) => COLOR_TARGET_FIELDS,
            Self::Int(_) | Self::Float(_) => SCALAR_FIELDS,
        }
    }

    /// Read a field
    pub fn get(&self, field: Field) -> Option<Value> {
        let value = match (self, field) {
            (Self::AttachmentDescription(desc), field) => match field {
                Field::Flags => Value::AttachmentFlags(desc.flags),
                Field::Format => Value::Format(desc.format),
                Field::Samples => Value::SampleCount(desc.samples),
                Field::LoadOp => Value::LoadOp(desc.load_op),
                Field::StoreOp => Value::StoreOp(desc.store_op),
                Field::StencilLoadOp => Value::LoadOp(desc.stencil_load_op),
                Field::StencilStoreOp => Value::StoreOp(desc.stencil_store_op),
                Field::InitialLayout => Value::ImageLayout(desc.initial_layout),
                Field::FinalLayout => Value::ImageLayout(desc.final_layout),
                _ => return None,
            },
            (Self::ColorTarget(target), field) => match field {
                Field::Num => Value::Int(target.num),
                Field::Magnitude => Value::Float(target.magnitude),
                Field::ColorComponents => Value::ColorComponents(target.color_components),
                _ => return None,
            },
            (Self::Int(v), Field::Scalar) => Value::Int(*v),
            (Self::Float(v), Field::Scalar) => Value::Float(*v),
            _ => return None,
        };
        Some(value)
    }

    /// Write a field
    ///
    /// Fails if the object has no such field or the value has the wrong type.
    pub fn set(&mut self, field: Field, value: Value) -> Result<(), ValueError> {
        let current = self.get(field).ok_or(ValueError::NoSuchField {
            field,
            object: self.kind(),
        })?;
        let mismatch = ValueError::TypeMismatch {
            field,
            expected: current.value_type(),
            found: value.value_type(),
        };

        match (self, field, value) {
            (Self::AttachmentDescription(desc), field, value) => match (field, value) {
                (Field::Flags, Value::AttachmentFlags(v)) => desc.flags = v,
                (Field::Format, Value::Format(v)) => desc.format = v,
                (Field::Samples, Value::SampleCount(v)) => desc.samples = v,
                (Field::LoadOp, Value::LoadOp(v)) => desc.load_op = v,
                (Field::StoreOp, Value::StoreOp(v)) => desc.store_op = v,
                (Field::StencilLoadOp, Value::LoadOp(v)) => desc.stencil_load_op = v,
                (Field::StencilStoreOp, Value::StoreOp(v)) => desc.stencil_store_op = v,
                (Field::InitialLayout, Value::ImageLayout(v)) => desc.initial_layout = v,
                (Field::FinalLayout, Value::ImageLayout(v)) => desc.final_layout = v,
                _ => return Err(mismatch),
            },
            (Self::ColorTarget(target), field, value) => match (field, value) {
                (Field::Num, Value::Int(v)) => target.num = v,
                (Field::Magnitude, Value::Float(v)) => target.magnitude = v,
                (Field::ColorComponents, Value::ColorComponents(v)) => target.color_components = v,
                _ => return Err(mismatch),
            },
            (Self::Int(slot), Field::Scalar, Value::Int(v)) => *slot = v,
            (Self::Float(slot), Field::Scalar, Value::Float(v)) => *slot = v,
            _ => return Err(mismatch),
        }
        Ok(())
    }
}

impl From<AttachmentDescription> for Object {
    fn from(desc: AttachmentDescription) -> Self {
        Self::AttachmentDescription(desc)
    }
}

impl From<ColorTarget> for Object {
    fn from(target: ColorTarget) -> Self {
        Self::ColorTarget(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    #[test]
    fn test_flag_labels() {
        assert_eq!(ColorComponentFlags::empty().label(), "None");
        assert_eq!((ColorComponentFlags::R | ColorComponentFlags::B).label(), "R, B");
        assert_eq!(AttachmentDescriptionFlags::MAY_ALIAS.label(), "May Alias");
    }

    #[test]
    fn test_enum_tables_cover_every_variant() {
        assert_eq!(AttachmentLoadOp::ALL.len(), 4);
        assert_eq!(AttachmentStoreOp::ALL.len(), 3);
        assert_eq!(Format::ALL.len(), 6);
        assert_eq!(ImageLayout::ALL.len(), 8);
        assert_eq!(SampleCount::ALL.len(), 7);
        assert_eq!(SampleCount::X16.samples(), 16);
        assert_eq!(ImageLayout::PresentSrcKhr.label(), "Present Source Khronos");
    }

    #[test]
    fn test_get_and_set_attachment_fields() {
        let mut object = Object::from(AttachmentDescription::default());
        assert_eq!(object.fields().len(), 9);
        assert_eq!(object.get(Field::LoadOp), Some(Value::LoadOp(AttachmentLoadOp::Load)));

        object
            .set(Field::FinalLayout, Value::ImageLayout(ImageLayout::PresentSrcKhr))
            .unwrap();
        object
            .set(Field::StencilLoadOp, Value::LoadOp(AttachmentLoadOp::DontCare))
            .unwrap();

        let Object::AttachmentDescription(desc) = object else {
            panic!("object kind changed");
        };
        assert_eq!(desc.final_layout, ImageLayout::PresentSrcKhr);
        assert_eq!(desc.stencil_load_op, AttachmentLoadOp::DontCare);
        assert_eq!(desc.load_op, AttachmentLoadOp::Load);
    }

    #[test]
    fn test_set_rejects_wrong_type() {
        let mut object = Object::from(ColorTarget::default());
        let err = object.set(Field::Magnitude, Value::Int(3)).unwrap_err();
        match err {
            ValueError::TypeMismatch { expected, found, .. } => {
                assert_eq!(expected, ValueType::Float);
                assert_eq!(found, ValueType::Int);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(object, Object::from(ColorTarget::default()));
    }

    #[test]
    fn test_set_rejects_missing_field() {
        let mut object = Object::Int(7);
        assert!(matches!(
            object.set(Field::Format, Value::Format(Format::R8G8B8A8Srgb)),
            Err(ValueError::NoSuchField { object: ObjectKind::Int, .. })
        ));
        object.set(Field::Scalar, Value::Int(9)).unwrap();
        assert_eq!(object, Object::Int(9));
    }
}
