//! Surface material definitions

use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::backend::GpuTexture;

use super::shader::ShaderHandle;

/// Per-surface rendering attributes
///
/// A passive record: texture and shader handles are shared, so a material
/// keeps GPU objects alive but never releases them on its own.
#[derive(Debug, Clone)]
pub struct Material {
    pub color: Vec4,

    /// Texture handles (None means unset)
    pub texture: Option<Rc<GpuTexture>>,
    pub bump_map: Option<Rc<GpuTexture>>,
    pub displacement_map: Option<Rc<GpuTexture>>,

    pub shaders: Rc<Vec<ShaderHandle>>,
    pub specular_power: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            texture: None,
            bump_map: None,
            displacement_map: None,
            shaders: Rc::new(Vec::new()),
            specular_power: 0.0,
        }
    }
}

impl Material {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_texture(mut self, texture: Rc<GpuTexture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_bump_map(mut self, bump_map: Rc<GpuTexture>) -> Self {
        self.bump_map = Some(bump_map);
        self
    }

    pub fn with_displacement_map(mut self, displacement_map: Rc<GpuTexture>) -> Self {
        self.displacement_map = Some(displacement_map);
        self
    }

    pub fn with_shaders(mut self, shaders: Rc<Vec<ShaderHandle>>) -> Self {
        self.shaders = shaders;
        self
    }

    pub fn with_specular_power(mut self, specular_power: f32) -> Self {
        self.specular_power = specular_power;
        self
    }

    /// Create a constant-buffer block for the GPU
    pub fn constants(&self) -> MaterialConstants {
        MaterialConstants {
            color: self.color.to_array(),
            specular_power: self.specular_power,
            _padding: [0.0; 3],
        }
    }
}

/// Material parameters laid out for a constant buffer (16-byte aligned)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialConstants {
    pub color: [f32; 4],
    pub specular_power: f32,
    pub _padding: [f32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material_has_no_maps() {
        let material = Material::default();
        assert_eq!(material.color, Vec4::ONE);
        assert!(material.texture.is_none());
        assert!(material.bump_map.is_none());
        assert!(material.displacement_map.is_none());
        assert!(material.shaders.is_empty());
        assert_eq!(material.specular_power, 0.0);
    }

    #[test]
    fn test_constants_layout() {
        let material = Material::new()
            .with_color(Vec4::new(0.2, 0.4, 0.6, 1.0))
            .with_specular_power(32.0);
        let constants = material.constants();

        assert_eq!(std::mem::size_of::<MaterialConstants>(), 32);
        assert_eq!(constants.color, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(constants.specular_power, 32.0);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_clones_share_textures() {
        use crate::backend::dummy::DummyDevice;
        use crate::backend::types::*;
        use crate::backend::GpuDevice;

        let device = DummyDevice::new();
        let desc = Texture2dDescriptor {
            width: 4,
            height: 4,
            mip_levels: 1,
            array_size: 1,
            format: TextureFormat::Rgba8Unorm,
            sample: SampleDescriptor::SINGLE,
            usage: ResourceUsage::Default,
            bind_flags: BindFlags::SHADER_RESOURCE,
            cpu_access: CpuAccessFlags::empty(),
            misc_flags: 0,
        };
        let texture = Rc::new(device.create_texture_2d(&desc).unwrap());

        let material = Material::new().with_texture(Rc::clone(&texture));
        let copy = material.clone();
        drop(texture);
        drop(material);
        assert_eq!(device.live_objects(), 1);

        drop(copy);
        assert_eq!(device.live_objects(), 0);
    }
}
