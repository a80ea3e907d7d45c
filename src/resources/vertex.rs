//! Vertex formats

use bytemuck::{Pod, Zeroable};

use crate::backend::types::{InputElementDescriptor, VertexFormat};

/// Vertex with a position and an RGB color, the layout the standard shaders expect
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexPositionColor {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl VertexPositionColor {
    /// Byte stride of one vertex in a vertex buffer.
    pub const STRIDE: u32 = std::mem::size_of::<Self>() as u32;

    pub fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }

    /// `POSITION` and `COLOR`, both three floats, in slot 0.
    pub fn input_elements() -> [InputElementDescriptor; 2] {
        [
            InputElementDescriptor {
                semantic_name: "POSITION",
                semantic_index: 0,
                format: VertexFormat::Float32x3,
                input_slot: 0,
                aligned_byte_offset: 0,
                per_instance: false,
                instance_data_step_rate: 0,
            },
            InputElementDescriptor {
                semantic_name: "COLOR",
                semantic_index: 0,
                format: VertexFormat::Float32x3,
                input_slot: 0,
                aligned_byte_offset: VertexFormat::Float32x3.size(),
                per_instance: false,
                instance_data_step_rate: 0,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_struct() {
        assert_eq!(VertexPositionColor::STRIDE, 24);

        let elements = VertexPositionColor::input_elements();
        assert_eq!(elements[0].semantic_name, "POSITION");
        assert_eq!(elements[0].aligned_byte_offset, 0);
        assert_eq!(elements[1].semantic_name, "COLOR");
        assert_eq!(elements[1].aligned_byte_offset, 12);
        assert!(elements.iter().all(|e| e.format == VertexFormat::Float32x3));
        assert!(elements.iter().all(|e| e.input_slot == 0 && !e.per_instance));
    }

    #[test]
    fn test_cast_to_bytes() {
        let vertices = [
            VertexPositionColor::new([0.0, 0.5, 0.0], [1.0, 0.0, 0.0]),
            VertexPositionColor::new([0.5, -0.5, 0.0], [0.0, 1.0, 0.0]),
        ];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 48);
    }
}
