//! Descriptor types shared between backends
//!
//! These mirror the Direct3D 11 description structs field for field, so a
//! backend can translate them one to one.

use bitflags::bitflags;
use raw_window_handle::RawWindowHandle;

/// Texture and view formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 24-bit depth with 8-bit stencil.
    Depth24UnormStencil8,
}

impl TextureFormat {
    pub fn is_depth_stencil(&self) -> bool {
        matches!(self, Self::Depth24UnormStencil8)
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::Rgba8Unorm | Self::Depth24UnormStencil8 => 4,
        }
    }
}

/// Vertex attribute formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    pub fn size(&self) -> u32 {
        match self {
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// Index format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOperation {
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthWriteMask {
    Zero,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Wireframe,
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapEffect {
    Discard,
    Sequential,
    FlipSequential,
    FlipDiscard,
}

/// Resource usage, i.e. who may read and write the memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceUsage {
    /// GPU read/write only.
    #[default]
    Default,
    Immutable,
    Dynamic,
    Staging,
}

bitflags! {
    /// Pipeline stages a resource may be bound to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindFlags: u32 {
        const VERTEX_BUFFER = 0x1;
        const INDEX_BUFFER = 0x2;
        const CONSTANT_BUFFER = 0x4;
        const SHADER_RESOURCE = 0x8;
        const RENDER_TARGET = 0x20;
        const DEPTH_STENCIL = 0x40;
    }
}

bitflags! {
    /// CPU access granted to a resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CpuAccessFlags: u32 {
        const WRITE = 0x10000;
        const READ = 0x20000;
    }
}

/// Multisampling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleDescriptor {
    pub count: u32,
    pub quality: u32,
}

impl SampleDescriptor {
    pub const SINGLE: Self = Self {
        count: 1,
        quality: 0,
    };
}

/// Swap chain description
#[derive(Debug, Clone, PartialEq)]
pub struct SwapChainDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Refresh rate as numerator / denominator. 0/1 lets the driver pick.
    pub refresh_rate: (u32, u32),
    pub sample: SampleDescriptor,
    pub buffer_count: u32,
    pub swap_effect: SwapEffect,
    pub output_window: RawWindowHandle,
    pub windowed: bool,
    pub flags: u32,
}

/// 2D texture description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture2dDescriptor {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub array_size: u32,
    pub format: TextureFormat,
    pub sample: SampleDescriptor,
    pub usage: ResourceUsage,
    pub bind_flags: BindFlags,
    pub cpu_access: CpuAccessFlags,
    pub misc_flags: u32,
}

/// Per-face stencil configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilFaceDescriptor {
    pub fail_op: StencilOperation,
    pub depth_fail_op: StencilOperation,
    pub pass_op: StencilOperation,
    pub compare: CompareFunction,
}

/// Depth-stencil state description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilDescriptor {
    pub depth_enable: bool,
    pub depth_write_mask: DepthWriteMask,
    pub depth_compare: CompareFunction,
    pub stencil_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub front_face: StencilFaceDescriptor,
    pub back_face: StencilFaceDescriptor,
}

/// Depth-stencil view over a single mip of a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilViewDescriptor {
    pub format: TextureFormat,
    pub mip_slice: u32,
}

/// Rasterizer state description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerDescriptor {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_counter_clockwise: bool,
    pub depth_bias: i32,
    pub depth_bias_clamp: f32,
    pub slope_scaled_depth_bias: f32,
    pub depth_clip_enable: bool,
    pub scissor_enable: bool,
    pub multisample_enable: bool,
    pub antialiased_line_enable: bool,
}

/// One element of an input layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputElementDescriptor {
    pub semantic_name: &'static str,
    pub semantic_index: u32,
    pub format: VertexFormat,
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
    /// `false` for per-vertex data, `true` for per-instance data.
    pub per_instance: bool,
    pub instance_data_step_rate: u32,
}

/// Options for compiling shader source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderCompileOptions {
    pub entry_point: String,
    pub profile: &'static str,
    pub defines: Vec<(String, String)>,
    pub strict: bool,
    pub debug: bool,
    /// Resolve `#include` directives relative to the source file.
    pub include_standard: bool,
}

/// Vertex buffer binding for the input assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferBinding {
    pub slot: u32,
    pub stride: u32,
    pub offset: u32,
}

/// Buffer description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    pub byte_width: u32,
    pub usage: ResourceUsage,
    pub bind_flags: BindFlags,
    pub cpu_access: CpuAccessFlags,
}

impl BufferDescriptor {
    pub fn new(byte_width: u32, bind_flags: BindFlags) -> Self {
        Self {
            byte_width,
            usage: ResourceUsage::Default,
            bind_flags,
            cpu_access: CpuAccessFlags::empty(),
        }
    }

    pub fn vertex(byte_width: u32) -> Self {
        Self::new(byte_width, BindFlags::VERTEX_BUFFER)
    }

    pub fn index(byte_width: u32) -> Self {
        Self::new(byte_width, BindFlags::INDEX_BUFFER)
    }

    pub fn constant(byte_width: u32) -> Self {
        Self::new(byte_width, BindFlags::CONSTANT_BUFFER)
    }
}

/// Programmable pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Hull,
    Geometry,
    Pixel,
}

impl ShaderStage {
    /// Shader model 5 compile target for this stage.
    pub fn profile(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_5_0",
            ShaderStage::Hull => "hs_5_0",
            ShaderStage::Geometry => "gs_5_0",
            ShaderStage::Pixel => "ps_5_0",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Hull => "hull",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Pixel => "pixel",
        }
    }
}

/// Compiled shader bytecode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderBytecode {
    bytes: Vec<u8>,
}

impl ShaderBytecode {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_profiles() {
        assert_eq!(ShaderStage::Vertex.profile(), "vs_5_0");
        assert_eq!(ShaderStage::Hull.profile(), "hs_5_0");
        assert_eq!(ShaderStage::Geometry.profile(), "gs_5_0");
        assert_eq!(ShaderStage::Pixel.profile(), "ps_5_0");
    }

    #[test]
    fn test_depth_format() {
        assert!(TextureFormat::Depth24UnormStencil8.is_depth_stencil());
        assert!(!TextureFormat::Rgba8Unorm.is_depth_stencil());
        assert_eq!(TextureFormat::Depth24UnormStencil8.bytes_per_pixel(), 4);
    }

    #[test]
    fn test_buffer_descriptor_bind_flags() {
        assert_eq!(BufferDescriptor::vertex(48).bind_flags, BindFlags::VERTEX_BUFFER);
        assert_eq!(BufferDescriptor::index(12).bind_flags, BindFlags::INDEX_BUFFER);
        let constant = BufferDescriptor::constant(64);
        assert_eq!(constant.bind_flags, BindFlags::CONSTANT_BUFFER);
        assert_eq!(constant.usage, ResourceUsage::Default);
        assert!(constant.cpu_access.is_empty());
    }
}
