//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations. It records every
//! device and context call in order, tracks how many objects are alive and
//! lets tests make a named API call fail with a chosen result code.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::backend::types::*;
use crate::backend::{
    GeometryShader, GpuBuffer, GpuContext, GpuDepthStencilState, GpuDepthStencilView, GpuDevice,
    GpuInputLayout, GpuRasterizerState, GpuRenderTargetView, GpuSwapChain, GpuTexture, HullShader,
    PixelShader, VertexShader,
};
use crate::error::{GraphicsError, GraphicsResult};

/// Result code used when a failure is injected without an explicit code (E_FAIL).
pub const E_FAIL: i32 = 0x8000_4005_u32 as i32;

/// A call recorded by the dummy backend
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateSwapChain(SwapChainDescriptor),
    GetBackBuffer { index: u32 },
    CreateTexture2d(Texture2dDescriptor),
    CreateRenderTargetView { texture: u64 },
    CreateDepthStencilView {
        texture: u64,
        desc: DepthStencilViewDescriptor,
    },
    CreateDepthStencilState(DepthStencilDescriptor),
    CreateRasterizerState(RasterizerDescriptor),
    CreateBuffer {
        desc: BufferDescriptor,
        initialized: bool,
    },
    CreateShader {
        stage: ShaderStage,
        bytecode: Vec<u8>,
    },
    CreateInputLayout(Vec<InputElementDescriptor>),
    CompileShader {
        path: PathBuf,
        options: ShaderCompileOptions,
    },
    UpdateSubresource { buffer: u64, len: usize },
    SetVertexBuffer {
        buffer: u64,
        binding: VertexBufferBinding,
    },
    SetIndexBuffer {
        buffer: u64,
        format: IndexFormat,
        offset: u32,
    },
    SetPrimitiveTopology(PrimitiveTopology),
    SetInputLayout { layout: u64 },
    SetVertexShader { shader: u64 },
    SetPixelShader { shader: u64 },
    SetRenderTargets {
        render_targets: Vec<u64>,
        depth_stencil: Option<u64>,
    },
    SetDepthStencilState { state: u64, stencil_ref: u32 },
    SetRasterizerState { state: u64 },
    DrawIndexed {
        index_count: u32,
        start_index: u32,
        base_vertex: i32,
    },
    Present { sync_interval: u32, flags: u32 },
}

impl DeviceCall {
    /// The native API entry point this call stands for.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::CreateSwapChain(_) => "CreateSwapChain",
            Self::GetBackBuffer { .. } => "GetBuffer",
            Self::CreateTexture2d(_) => "CreateTexture2D",
            Self::CreateRenderTargetView { .. } => "CreateRenderTargetView",
            Self::CreateDepthStencilView { .. } => "CreateDepthStencilView",
            Self::CreateDepthStencilState(_) => "CreateDepthStencilState",
            Self::CreateRasterizerState(_) => "CreateRasterizerState",
            Self::CreateBuffer { .. } => "CreateBuffer",
            Self::CreateShader { stage, .. } => match stage {
                ShaderStage::Vertex => "CreateVertexShader",
                ShaderStage::Hull => "CreateHullShader",
                ShaderStage::Geometry => "CreateGeometryShader",
                ShaderStage::Pixel => "CreatePixelShader",
            },
            Self::CreateInputLayout(_) => "CreateInputLayout",
            Self::CompileShader { .. } => "D3DCompileFromFile",
            Self::UpdateSubresource { .. } => "UpdateSubresource",
            Self::SetVertexBuffer { .. } => "IASetVertexBuffers",
            Self::SetIndexBuffer { .. } => "IASetIndexBuffer",
            Self::SetPrimitiveTopology(_) => "IASetPrimitiveTopology",
            Self::SetInputLayout { .. } => "IASetInputLayout",
            Self::SetVertexShader { .. } => "VSSetShader",
            Self::SetPixelShader { .. } => "PSSetShader",
            Self::SetRenderTargets { .. } => "OMSetRenderTargets",
            Self::SetDepthStencilState { .. } => "OMSetDepthStencilState",
            Self::SetRasterizerState { .. } => "RSSetState",
            Self::DrawIndexed { .. } => "DrawIndexed",
            Self::Present { .. } => "Present",
        }
    }
}

/// State shared between the device and every object it hands out.
#[derive(Debug, Default)]
struct DummyShared {
    calls: RefCell<Vec<DeviceCall>>,
    failures: RefCell<HashMap<&'static str, i32>>,
    live_objects: Cell<usize>,
    next_id: Cell<u64>,
}

impl DummyShared {
    /// Record `call`, then fail if a failure was injected for its API name.
    fn record(&self, call: DeviceCall) -> GraphicsResult<()> {
        let name = call.api_name();
        log::trace!("DummyDevice: {:?}", call);
        self.calls.borrow_mut().push(call);
        match self.failures.borrow().get(name) {
            Some(&code) => Err(GraphicsError::Api { call: name, code }),
            None => Ok(()),
        }
    }
}

/// Stand-in for a native GPU object.
///
/// Dropping it decrements the owning device's live-object count.
pub struct DummyObject {
    id: u64,
    kind: &'static str,
    byte_width: Option<u32>,
    shared: Rc<DummyShared>,
}

impl DummyObject {
    fn new(kind: &'static str, shared: &Rc<DummyShared>) -> Self {
        let id = shared.next_id.get() + 1;
        shared.next_id.set(id);
        shared.live_objects.set(shared.live_objects.get() + 1);
        Self {
            id,
            kind,
            byte_width: None,
            shared: Rc::clone(shared),
        }
    }

    /// Identifier unique within the owning device, starting at 1.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Size a buffer was created with. `None` for every other object.
    pub fn byte_width(&self) -> Option<u32> {
        self.byte_width
    }

    pub(crate) fn back_buffer(&self, index: u32) -> GraphicsResult<GpuTexture> {
        self.shared.record(DeviceCall::GetBackBuffer { index })?;
        Ok(GpuTexture::Dummy(DummyObject::new(
            "back buffer",
            &self.shared,
        )))
    }

    pub(crate) fn present(&self, sync_interval: u32, flags: u32) -> GraphicsResult<()> {
        self.shared.record(DeviceCall::Present {
            sync_interval,
            flags,
        })
    }
}

impl std::fmt::Debug for DummyObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DummyObject")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Drop for DummyObject {
    fn drop(&mut self) {
        log::trace!("DummyDevice: releasing {} #{}", self.kind, self.id);
        self.shared
            .live_objects
            .set(self.shared.live_objects.get().saturating_sub(1));
    }
}

/// Recording device and immediate context.
///
/// Clones share the same call log and object count, so a test can keep one
/// clone for inspection while handing another to `DeviceResources`.
#[derive(Debug, Clone, Default)]
pub struct DummyDevice {
    shared: Rc<DummyShared>,
}

impl DummyDevice {
    /// Create a new dummy device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call to `api_name` fail with [`E_FAIL`].
    pub fn fail_call(&self, api_name: &'static str) {
        self.fail_call_with(api_name, E_FAIL);
    }

    /// Make every later call to `api_name` fail with `code`.
    pub fn fail_call_with(&self, api_name: &'static str, code: i32) {
        self.shared.failures.borrow_mut().insert(api_name, code);
    }

    pub fn clear_failures(&self) {
        self.shared.failures.borrow_mut().clear();
    }

    /// All calls recorded so far, oldest first.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.shared.calls.borrow().clone()
    }

    /// API names of all calls recorded so far, oldest first.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.shared
            .calls
            .borrow()
            .iter()
            .map(DeviceCall::api_name)
            .collect()
    }

    /// Number of recorded calls to `api_name`.
    pub fn call_count(&self, api_name: &str) -> usize {
        self.shared
            .calls
            .borrow()
            .iter()
            .filter(|call| call.api_name() == api_name)
            .count()
    }

    pub fn clear_calls(&self) {
        self.shared.calls.borrow_mut().clear();
    }

    /// Number of objects created by this device that have not been dropped.
    pub fn live_objects(&self) -> usize {
        self.shared.live_objects.get()
    }

    fn object(&self, kind: &'static str) -> DummyObject {
        DummyObject::new(kind, &self.shared)
    }
}

/// Id of a dummy object, or 0 for an object owned by another backend.
fn dummy_id(object: Option<&DummyObject>) -> u64 {
    object.map_or(0, DummyObject::id)
}

macro_rules! impl_dummy_access {
    ($($name:ident),* $(,)?) => {
        $(
            impl $name {
                /// The dummy object behind this handle, if it came from a [`DummyDevice`].
                #[allow(unreachable_patterns)]
                pub fn dummy(&self) -> Option<&DummyObject> {
                    match self {
                        Self::Dummy(object) => Some(object),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_dummy_access!(
    GpuSwapChain,
    GpuTexture,
    GpuRenderTargetView,
    GpuDepthStencilView,
    GpuDepthStencilState,
    GpuRasterizerState,
    GpuInputLayout,
    GpuBuffer,
    VertexShader,
    HullShader,
    GeometryShader,
    PixelShader,
);

impl GpuDevice for DummyDevice {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn create_swap_chain(&self, desc: &SwapChainDescriptor) -> GraphicsResult<GpuSwapChain> {
        self.shared.record(DeviceCall::CreateSwapChain(desc.clone()))?;
        Ok(GpuSwapChain::Dummy(self.object("swap chain")))
    }

    fn create_texture_2d(&self, desc: &Texture2dDescriptor) -> GraphicsResult<GpuTexture> {
        self.shared.record(DeviceCall::CreateTexture2d(desc.clone()))?;
        Ok(GpuTexture::Dummy(self.object("texture 2d")))
    }

    fn create_render_target_view(
        &self,
        texture: &GpuTexture,
    ) -> GraphicsResult<GpuRenderTargetView> {
        self.shared.record(DeviceCall::CreateRenderTargetView {
            texture: dummy_id(texture.dummy()),
        })?;
        Ok(GpuRenderTargetView::Dummy(
            self.object("render target view"),
        ))
    }

    fn create_depth_stencil_view(
        &self,
        texture: &GpuTexture,
        desc: &DepthStencilViewDescriptor,
    ) -> GraphicsResult<GpuDepthStencilView> {
        self.shared.record(DeviceCall::CreateDepthStencilView {
            texture: dummy_id(texture.dummy()),
            desc: *desc,
        })?;
        Ok(GpuDepthStencilView::Dummy(
            self.object("depth stencil view"),
        ))
    }

    fn create_depth_stencil_state(
        &self,
        desc: &DepthStencilDescriptor,
    ) -> GraphicsResult<GpuDepthStencilState> {
        self.shared
            .record(DeviceCall::CreateDepthStencilState(*desc))?;
        Ok(GpuDepthStencilState::Dummy(
            self.object("depth stencil state"),
        ))
    }

    fn create_rasterizer_state(
        &self,
        desc: &RasterizerDescriptor,
    ) -> GraphicsResult<GpuRasterizerState> {
        self.shared.record(DeviceCall::CreateRasterizerState(*desc))?;
        Ok(GpuRasterizerState::Dummy(self.object("rasterizer state")))
    }

    fn create_buffer(
        &self,
        desc: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> GraphicsResult<GpuBuffer> {
        self.shared.record(DeviceCall::CreateBuffer {
            desc: *desc,
            initialized: initial_data.is_some(),
        })?;
        let mut buffer = self.object("buffer");
        buffer.byte_width = Some(desc.byte_width);
        Ok(GpuBuffer::Dummy(buffer))
    }

    fn create_vertex_shader(&self, bytecode: &ShaderBytecode) -> GraphicsResult<VertexShader> {
        self.shared.record(DeviceCall::CreateShader {
            stage: ShaderStage::Vertex,
            bytecode: bytecode.as_bytes().to_vec(),
        })?;
        Ok(VertexShader::Dummy(self.object("vertex shader")))
    }

    fn create_hull_shader(&self, bytecode: &ShaderBytecode) -> GraphicsResult<HullShader> {
        self.shared.record(DeviceCall::CreateShader {
            stage: ShaderStage::Hull,
            bytecode: bytecode.as_bytes().to_vec(),
        })?;
        Ok(HullShader::Dummy(self.object("hull shader")))
    }

    fn create_geometry_shader(
        &self,
        bytecode: &ShaderBytecode,
    ) -> GraphicsResult<GeometryShader> {
        self.shared.record(DeviceCall::CreateShader {
            stage: ShaderStage::Geometry,
            bytecode: bytecode.as_bytes().to_vec(),
        })?;
        Ok(GeometryShader::Dummy(self.object("geometry shader")))
    }

    fn create_pixel_shader(&self, bytecode: &ShaderBytecode) -> GraphicsResult<PixelShader> {
        self.shared.record(DeviceCall::CreateShader {
            stage: ShaderStage::Pixel,
            bytecode: bytecode.as_bytes().to_vec(),
        })?;
        Ok(PixelShader::Dummy(self.object("pixel shader")))
    }

    fn create_input_layout(
        &self,
        elements: &[InputElementDescriptor],
        _vertex_bytecode: &ShaderBytecode,
    ) -> GraphicsResult<GpuInputLayout> {
        self.shared
            .record(DeviceCall::CreateInputLayout(elements.to_vec()))?;
        Ok(GpuInputLayout::Dummy(self.object("input layout")))
    }

    /// Produces bytecode of the form `<profile>:<entry point>:<path>`.
    fn compile_shader(
        &self,
        path: &Path,
        options: &ShaderCompileOptions,
    ) -> GraphicsResult<ShaderBytecode> {
        self.shared.record(DeviceCall::CompileShader {
            path: path.to_path_buf(),
            options: options.clone(),
        })?;
        Ok(ShaderBytecode::new(format!(
            "{}:{}:{}",
            options.profile,
            options.entry_point,
            path.display()
        )))
    }
}

// Context calls cannot fail, so injected failures are ignored here.
impl GpuContext for DummyDevice {
    fn update_subresource(&self, buffer: &GpuBuffer, data: &[u8]) {
        let byte_width = buffer.dummy().and_then(DummyObject::byte_width);
        if let Some(byte_width) = byte_width.filter(|&width| width as usize != data.len()) {
            log::warn!(
                "UpdateSubresource: skipping {} bytes for a {}-byte buffer",
                data.len(),
                byte_width
            );
            return;
        }
        let _ = self.shared.record(DeviceCall::UpdateSubresource {
            buffer: dummy_id(buffer.dummy()),
            len: data.len(),
        });
    }

    fn set_vertex_buffer(&self, buffer: &GpuBuffer, binding: VertexBufferBinding) {
        let _ = self.shared.record(DeviceCall::SetVertexBuffer {
            buffer: dummy_id(buffer.dummy()),
            binding,
        });
    }

    fn set_index_buffer(&self, buffer: &GpuBuffer, format: IndexFormat, offset: u32) {
        let _ = self.shared.record(DeviceCall::SetIndexBuffer {
            buffer: dummy_id(buffer.dummy()),
            format,
            offset,
        });
    }

    fn set_primitive_topology(&self, topology: PrimitiveTopology) {
        let _ = self
            .shared
            .record(DeviceCall::SetPrimitiveTopology(topology));
    }

    fn set_input_layout(&self, layout: &GpuInputLayout) {
        let _ = self.shared.record(DeviceCall::SetInputLayout {
            layout: dummy_id(layout.dummy()),
        });
    }

    fn set_vertex_shader(&self, shader: &VertexShader) {
        let _ = self.shared.record(DeviceCall::SetVertexShader {
            shader: dummy_id(shader.dummy()),
        });
    }

    fn set_pixel_shader(&self, shader: &PixelShader) {
        let _ = self.shared.record(DeviceCall::SetPixelShader {
            shader: dummy_id(shader.dummy()),
        });
    }

    fn set_render_targets(
        &self,
        render_targets: &[&GpuRenderTargetView],
        depth_stencil: Option<&GpuDepthStencilView>,
    ) {
        let _ = self.shared.record(DeviceCall::SetRenderTargets {
            render_targets: render_targets
                .iter()
                .map(|view| dummy_id(view.dummy()))
                .collect(),
            depth_stencil: depth_stencil.map(|view| dummy_id(view.dummy())),
        });
    }

    fn set_depth_stencil_state(&self, state: &GpuDepthStencilState, stencil_ref: u32) {
        let _ = self.shared.record(DeviceCall::SetDepthStencilState {
            state: dummy_id(state.dummy()),
            stencil_ref,
        });
    }

    fn set_rasterizer_state(&self, state: &GpuRasterizerState) {
        let _ = self.shared.record(DeviceCall::SetRasterizerState {
            state: dummy_id(state.dummy()),
        });
    }

    fn draw_indexed(&self, index_count: u32, start_index: u32, base_vertex: i32) {
        let _ = self.shared.record(DeviceCall::DrawIndexed {
            index_count,
            start_index,
            base_vertex,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytecode() -> ShaderBytecode {
        ShaderBytecode::new(vec![0x44, 0x58, 0x42, 0x43])
    }

    #[test]
    fn test_records_calls_in_order() {
        let device = DummyDevice::new();
        let shader = device.create_vertex_shader(&bytecode()).unwrap();
        device.set_vertex_shader(&shader);
        device.draw_indexed(3, 0, 0);

        assert_eq!(
            device.call_names(),
            vec!["CreateVertexShader", "VSSetShader", "DrawIndexed"]
        );
        assert_eq!(
            device.calls()[1],
            DeviceCall::SetVertexShader {
                shader: shader.dummy().unwrap().id()
            }
        );
    }

    #[test]
    fn test_injected_failure_returns_code() {
        let device = DummyDevice::new();
        device.fail_call_with("CreatePixelShader", 0x8007_000E_u32 as i32);

        let err = device.create_pixel_shader(&bytecode()).unwrap_err();
        assert_eq!(
            err,
            GraphicsError::Api {
                call: "CreatePixelShader",
                code: 0x8007_000E_u32 as i32
            }
        );
        // The failed call is still recorded and no object leaks.
        assert_eq!(device.call_count("CreatePixelShader"), 1);
        assert_eq!(device.live_objects(), 0);

        device.clear_failures();
        assert!(device.create_pixel_shader(&bytecode()).is_ok());
    }

    #[test]
    fn test_live_objects_follow_drops() {
        let device = DummyDevice::new();
        let first = device.create_buffer(&BufferDescriptor::vertex(24), None).unwrap();
        let second = device
            .create_buffer(&BufferDescriptor::index(6), Some(&[0; 6]))
            .unwrap();
        assert_eq!(device.live_objects(), 2);

        drop(first);
        assert_eq!(device.live_objects(), 1);
        drop(second);
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let device = DummyDevice::new();
        let observer = device.clone();
        let _layout = device.create_input_layout(&[], &bytecode()).unwrap();

        assert_eq!(observer.call_count("CreateInputLayout"), 1);
        assert_eq!(observer.live_objects(), 1);
    }

    #[test]
    fn test_swap_chain_back_buffer_and_present() {
        let device = DummyDevice::new();
        let swap_chain = GpuSwapChain::Dummy(device.object("swap chain"));

        let back_buffer = swap_chain.back_buffer(0).unwrap();
        assert_eq!(back_buffer.dummy().unwrap().kind(), "back buffer");
        swap_chain.present(1, 0).unwrap();

        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::GetBackBuffer { index: 0 },
                DeviceCall::Present {
                    sync_interval: 1,
                    flags: 0
                },
            ]
        );

        device.fail_call("Present");
        assert_eq!(swap_chain.present(1, 0).unwrap_err().code(), Some(E_FAIL));
    }

    #[test]
    fn test_update_subresource_skips_mismatched_data() {
        let device = DummyDevice::new();
        let buffer = device
            .create_buffer(&BufferDescriptor::constant(32), Some(&[0; 32]))
            .unwrap();
        assert_eq!(buffer.dummy().and_then(DummyObject::byte_width), Some(32));
        device.clear_calls();

        device.update_subresource(&buffer, &[0; 4]);
        device.update_subresource(&buffer, &[0; 64]);
        assert!(device.calls().is_empty());

        device.update_subresource(&buffer, &[0; 32]);
        assert_eq!(device.call_names(), vec!["UpdateSubresource"]);
    }

    #[test]
    fn test_compile_shader_embeds_profile() {
        let device = DummyDevice::new();
        let options = ShaderCompileOptions {
            entry_point: "main".into(),
            profile: "ps_5_0",
            defines: Vec::new(),
            strict: true,
            debug: false,
            include_standard: true,
        };
        let bytecode = device
            .compile_shader(Path::new("shaders/color.hlsl"), &options)
            .unwrap();
        assert_eq!(bytecode.as_bytes(), b"ps_5_0:main:shaders/color.hlsl");
    }
}
