//! Core backend abstraction traits
//!
//! The device/context split follows Direct3D 11: a [`GpuDevice`] creates
//! objects and may fail, a [`GpuContext`] binds pipeline state and records
//! draws on the immediate context and never reports failure.

use std::path::Path;

use crate::backend::types::*;
use crate::backend::{
    GeometryShader, GpuBuffer, GpuDepthStencilState, GpuDepthStencilView, GpuInputLayout,
    GpuRasterizerState, GpuRenderTargetView, GpuSwapChain, GpuTexture, HullShader, PixelShader,
    VertexShader,
};
use crate::error::GraphicsResult;

/// Object creation half of the GPU API
pub trait GpuDevice {
    /// Get the backend name
    fn name(&self) -> &'static str;

    /// Create a swap chain for the output window in `desc`.
    ///
    /// Backends walk device -> adapter -> factory to find the factory that
    /// owns the device and create the swap chain from it.
    fn create_swap_chain(&self, desc: &SwapChainDescriptor) -> GraphicsResult<GpuSwapChain>;

    fn create_texture_2d(&self, desc: &Texture2dDescriptor) -> GraphicsResult<GpuTexture>;

    fn create_render_target_view(&self, texture: &GpuTexture)
        -> GraphicsResult<GpuRenderTargetView>;

    fn create_depth_stencil_view(
        &self,
        texture: &GpuTexture,
        desc: &DepthStencilViewDescriptor,
    ) -> GraphicsResult<GpuDepthStencilView>;

    fn create_depth_stencil_state(
        &self,
        desc: &DepthStencilDescriptor,
    ) -> GraphicsResult<GpuDepthStencilState>;

    fn create_rasterizer_state(
        &self,
        desc: &RasterizerDescriptor,
    ) -> GraphicsResult<GpuRasterizerState>;

    /// Create a buffer, optionally filled with `initial_data`
    fn create_buffer(
        &self,
        desc: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> GraphicsResult<GpuBuffer>;

    fn create_vertex_shader(&self, bytecode: &ShaderBytecode) -> GraphicsResult<VertexShader>;

    fn create_hull_shader(&self, bytecode: &ShaderBytecode) -> GraphicsResult<HullShader>;

    fn create_geometry_shader(&self, bytecode: &ShaderBytecode)
        -> GraphicsResult<GeometryShader>;

    fn create_pixel_shader(&self, bytecode: &ShaderBytecode) -> GraphicsResult<PixelShader>;

    /// Create an input layout validated against the vertex shader's input signature
    fn create_input_layout(
        &self,
        elements: &[InputElementDescriptor],
        vertex_bytecode: &ShaderBytecode,
    ) -> GraphicsResult<GpuInputLayout>;

    /// Compile HLSL source at `path` into bytecode
    fn compile_shader(
        &self,
        path: &Path,
        options: &ShaderCompileOptions,
    ) -> GraphicsResult<ShaderBytecode>;
}

/// Immediate-context half of the GPU API
pub trait GpuContext {
    /// Copy `data` into `buffer`
    fn update_subresource(&self, buffer: &GpuBuffer, data: &[u8]);

    fn set_vertex_buffer(&self, buffer: &GpuBuffer, binding: VertexBufferBinding);

    fn set_index_buffer(&self, buffer: &GpuBuffer, format: IndexFormat, offset: u32);

    fn set_primitive_topology(&self, topology: PrimitiveTopology);

    fn set_input_layout(&self, layout: &GpuInputLayout);

    fn set_vertex_shader(&self, shader: &VertexShader);

    fn set_pixel_shader(&self, shader: &PixelShader);

    /// Bind render targets and an optional depth-stencil view to the output merger
    fn set_render_targets(
        &self,
        render_targets: &[&GpuRenderTargetView],
        depth_stencil: Option<&GpuDepthStencilView>,
    );

    fn set_depth_stencil_state(&self, state: &GpuDepthStencilState, stencil_ref: u32);

    fn set_rasterizer_state(&self, state: &GpuRasterizerState);

    fn draw_indexed(&self, index_count: u32, start_index: u32, base_vertex: i32);
}
