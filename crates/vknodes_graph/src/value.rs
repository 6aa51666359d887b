// SPDX-License-Identifier: MIT OR Apache-2.0
//! Field selectors and the single values read/written through them.

use crate::attribute::AttributeId;
use crate::object::{
    AttachmentDescriptionFlags, AttachmentLoadOp, AttachmentStoreOp, ColorComponentFlags, Format,
    ImageLayout, ObjectKind, SampleCount,
};

/// Selects one editable member of an [`Object`](crate::object::Object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `AttachmentDescription::flags`
    Flags,
    /// `AttachmentDescription::format`
    Format,
    /// `AttachmentDescription::samples`
    Samples,
    /// `AttachmentDescription::load_op`
    LoadOp,
    /// `AttachmentDescription::store_op`
    StoreOp,
    /// `AttachmentDescription::stencil_load_op`
    StencilLoadOp,
    /// `AttachmentDescription::stencil_store_op`
    StencilStoreOp,
    /// `AttachmentDescription::initial_layout`
    InitialLayout,
    /// `AttachmentDescription::final_layout`
    FinalLayout,
    /// `ColorTarget::num`
    Num,
    /// `ColorTarget::magnitude`
    Magnitude,
    /// `ColorTarget::color_components`
    ColorComponents,
    /// The whole value of an `Int` or `Float` object
    Scalar,
}

impl Field {
    /// Attribute name shown next to the control
    pub fn label(&self) -> &'static str {
        match self {
            Self::Flags => "flags",
            Self::Format => "format",
            Self::Samples => "samples",
            Self::LoadOp => "load op",
            Self::StoreOp => "store op",
            Self::StencilLoadOp => "stencil load op",
            Self::StencilStoreOp => "stencil store op",
            Self::InitialLayout => "initial layout",
            Self::FinalLayout => "final layout",
            Self::Num => "num",
            Self::Magnitude => "magnitude",
            Self::ColorComponents => "color components",
            Self::Scalar => "value",
        }
    }
}

/// Type tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Integer
    Int,
    /// Float
    Float,
    /// [`Format`]
    Format,
    /// [`SampleCount`]
    SampleCount,
    /// [`AttachmentLoadOp`]
    LoadOp,
    /// [`AttachmentStoreOp`]
    StoreOp,
    /// [`ImageLayout`]
    ImageLayout,
    /// [`ColorComponentFlags`]
    ColorComponents,
    /// [`AttachmentDescriptionFlags`]
    AttachmentFlags,
}

/// A primitive or enumerated value bound to a value attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// Texel format
    Format(Format),
    /// Sample count
    SampleCount(SampleCount),
    /// Load op
    LoadOp(AttachmentLoadOp),
    /// Store op
    StoreOp(AttachmentStoreOp),
    /// Image layout
    ImageLayout(ImageLayout),
    /// Color write mask
    ColorComponents(ColorComponentFlags),
    /// Attachment flags
    AttachmentFlags(AttachmentDescriptionFlags),
}

impl Value {
    /// Get the type tag for this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Format(_) => ValueType::Format,
            Self::SampleCount(_) => ValueType::SampleCount,
            Self::LoadOp(_) => ValueType::LoadOp,
            Self::StoreOp(_) => ValueType::StoreOp,
            Self::ImageLayout(_) => ValueType::ImageLayout,
            Self::ColorComponents(_) => ValueType::ColorComponents,
            Self::AttachmentFlags(_) => ValueType::AttachmentFlags,
        }
    }

    /// Read-only text used by viewers
    pub fn display(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => format!("{v:.3}"),
            Self::Format(v) => v.label().to_string(),
            Self::SampleCount(v) => v.label().to_string(),
            Self::LoadOp(v) => v.label().to_string(),
            Self::StoreOp(v) => v.label().to_string(),
            Self::ImageLayout(v) => v.label().to_string(),
            Self::ColorComponents(v) => v.label(),
            Self::AttachmentFlags(v) => v.label(),
        }
    }
}

/// Error when reading or writing a bound value
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// Object does not have this field
    #[error("{object:?} has no field {field:?}")]
    NoSuchField {
        /// Requested field
        field: Field,
        /// Kind of the object that was addressed
        object: ObjectKind,
    },

    /// Value has the wrong type for the field
    #[error("Field {field:?} expects {expected:?}, got {found:?}")]
    TypeMismatch {
        /// Addressed field
        field: Field,
        /// Type stored in the field
        expected: ValueType,
        /// Type of the supplied value
        found: ValueType,
    },

    /// Attribute id is not registered
    #[error("Attribute not found: {0:?}")]
    UnknownAttribute(AttributeId),

    /// Attribute is not a value attribute
    #[error("Attribute {0:?} does not edit a value")]
    NotAValue(AttributeId),
}
