//! Vertex input layout for the mesh pipeline

use std::collections::HashMap;

use vulkano::format::Format;
use vulkano::pipeline::graphics::vertex_input::{VertexBufferDescription, VertexInputRate, VertexMemberInfo};

pub use vrmview_assets::Vertex;

use crate::shader_interface::{ATTRIBUTE_NORMAL, ATTRIBUTE_POSITION, ATTRIBUTE_UV};

/// Attribute name, shader location, byte offset and format for each vertex member.
pub const VERTEX_ATTRIBUTES: [(&str, u32, u32, Format); 3] = [
    ("position", ATTRIBUTE_POSITION, 0, Format::R32G32B32_SFLOAT),
    ("normal", ATTRIBUTE_NORMAL, 12, Format::R32G32B32_SFLOAT),
    ("uv", ATTRIBUTE_UV, 24, Format::R32G32_SFLOAT),
];

/// Vulkano vertex buffer description for [`Vertex`]
pub fn per_vertex() -> VertexBufferDescription {
    let stride = std::mem::size_of::<Vertex>() as u32;
    VertexBufferDescription {
        stride,
        input_rate: VertexInputRate::Vertex,
        members: VERTEX_ATTRIBUTES
            .iter()
            .map(|&(name, _, offset, format)| {
                (
                    name.to_string(),
                    VertexMemberInfo {
                        offset,
                        format,
                        num_elements: 1,
                        stride,
                    },
                )
            })
            .collect::<HashMap<_, _>>(),
    }
}
