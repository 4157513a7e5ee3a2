/// Vertex layout: ordered attribute descriptors and the derived stride

use crate::error::{Error, Result};

/// Data format of one vertex attribute
///
/// Defines the data type and component count of the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum BufferFormat {
    // Float formats
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,

    // Integer formats
    R32_UINT,
    R32G32_UINT,
    R16G16_SINT,
    R16G16_UINT,

    // Byte formats
    R8G8B8A8_UINT,
    /// Normalized bytes, typically a packed RGBA color
    R8G8B8A8_UNORM,
}

impl BufferFormat {
    /// Returns size in bytes for this format
    pub fn size_bytes(&self) -> u32 {
        match self {
            BufferFormat::R32_SFLOAT | BufferFormat::R32_UINT => 4,
            BufferFormat::R32G32_SFLOAT | BufferFormat::R32G32_UINT => 8,
            BufferFormat::R32G32B32_SFLOAT => 12,
            BufferFormat::R32G32B32A32_SFLOAT => 16,
            BufferFormat::R16G16_SINT | BufferFormat::R16G16_UINT => 4,
            BufferFormat::R8G8B8A8_UINT | BufferFormat::R8G8B8A8_UNORM => 4,
        }
    }

    /// Number of components the shader sees
    pub fn component_count(&self) -> u32 {
        match self {
            BufferFormat::R32_SFLOAT | BufferFormat::R32_UINT => 1,
            BufferFormat::R32G32_SFLOAT
            | BufferFormat::R32G32_UINT
            | BufferFormat::R16G16_SINT
            | BufferFormat::R16G16_UINT => 2,
            BufferFormat::R32G32B32_SFLOAT => 3,
            BufferFormat::R32G32B32A32_SFLOAT
            | BufferFormat::R8G8B8A8_UINT
            | BufferFormat::R8G8B8A8_UNORM => 4,
        }
    }

    /// Whether integer data is normalized to [0, 1] when read
    pub fn is_normalized(&self) -> bool {
        matches!(self, BufferFormat::R8G8B8A8_UNORM)
    }
}

/// Attribute as supplied by the caller, before offsets are assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttributeDesc {
    /// Semantic name matched against the shader input (e.g. "position")
    pub semantic: String,
    /// Data format
    pub format: BufferFormat,
}

impl VertexAttributeDesc {
    pub fn new(semantic: impl Into<String>, format: BufferFormat) -> Self {
        Self { semantic: semantic.into(), format }
    }
}

/// Attribute with its resolved position inside a vertex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Semantic name
    pub semantic: String,
    /// Data format
    pub format: BufferFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
    /// Binding slot the attribute is activated at
    pub slot: u32,
}

impl VertexAttribute {
    /// Number of components (1..=4)
    pub fn component_count(&self) -> u32 {
        self.format.component_count()
    }

    /// Size in bytes
    pub fn size_bytes(&self) -> u32 {
        self.format.size_bytes()
    }
}

/// Vertex input layout
///
/// Attributes are tightly packed in declaration order; slots follow the same
/// order. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: u32,
}

impl VertexLayout {
    /// Build a layout, assigning offsets and slots
    ///
    /// # Errors
    ///
    /// `Error::Configuration` if `attributes` is empty or two attributes
    /// share a semantic name.
    pub fn new(attributes: Vec<VertexAttributeDesc>) -> Result<Self> {
        if attributes.is_empty() {
            return Err(Error::Configuration(
                "vertex layout must have at least one attribute".to_string(),
            )
            .logged("galaxy3d::VertexLayout"));
        }

        let mut resolved: Vec<VertexAttribute> = Vec::with_capacity(attributes.len());
        let mut offset = 0u32;
        for (slot, desc) in attributes.into_iter().enumerate() {
            if resolved.iter().any(|a| a.semantic == desc.semantic) {
                return Err(Error::Configuration(format!(
                    "duplicate vertex attribute semantic '{}'",
                    desc.semantic
                ))
                .logged("galaxy3d::VertexLayout"));
            }
            let size = desc.format.size_bytes();
            resolved.push(VertexAttribute {
                semantic: desc.semantic,
                format: desc.format,
                offset,
                slot: slot as u32,
            });
            offset += size;
        }

        Ok(Self { attributes: resolved, stride: offset })
    }

    /// Attributes in slot order
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Per-vertex size in bytes
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Look up an attribute by semantic name
    pub fn attribute(&self, semantic: &str) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Always false for a constructed layout
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
#[path = "vertex_layout_tests.rs"]
mod tests;
