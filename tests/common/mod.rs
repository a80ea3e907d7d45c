//! Common utilities for renderer integration tests.
//!
//! Every test runs against the recording dummy backend, so the call log and
//! live-object count stand in for a real GPU.

use std::num::NonZeroIsize;
use std::rc::Rc;

use nshade::backend::dummy::DummyDevice;
use nshade::resources::MemoryBytecodeLoader;
use nshade::{
    DeviceResources, Material, PresentationMode, Renderer, RendererConfig, VertexPositionColor,
};
use raw_window_handle::{RawWindowHandle, Win32WindowHandle};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

pub const VERTEX_SHADER_PATH: &str = "shaders/standard_vs.cso";
pub const PIXEL_SHADER_PATH: &str = "shaders/standard_ps.cso";

pub const TRIANGLE_INDICES: [u16; 3] = [0, 1, 2];

/// Calls made by a successful windowed initialization, in order.
pub const WINDOWED_INIT_CALLS: [&str; 13] = [
    "CreateVertexShader",
    "CreateInputLayout",
    "CreatePixelShader",
    "CreateSwapChain",
    "GetBuffer",
    "CreateRenderTargetView",
    "CreateTexture2D",
    "CreateDepthStencilState",
    "CreateDepthStencilView",
    "OMSetRenderTargets",
    "OMSetDepthStencilState",
    "CreateRasterizerState",
    "RSSetState",
];

pub fn triangle_vertices() -> [VertexPositionColor; 3] {
    [
        VertexPositionColor::new([0.0, 0.5, 0.0], [1.0, 0.0, 0.0]),
        VertexPositionColor::new([0.5, -0.5, 0.0], [0.0, 1.0, 0.0]),
        VertexPositionColor::new([-0.5, -0.5, 0.0], [0.0, 0.0, 1.0]),
    ]
}

/// A Win32 handle that is never dereferenced by the dummy backend.
pub fn test_window() -> RawWindowHandle {
    let hwnd = NonZeroIsize::new(0x0BAD_F00D).expect("non-zero handle");
    RawWindowHandle::Win32(Win32WindowHandle::new(hwnd))
}

/// Loader serving bytecode for both standard shaders.
pub fn standard_loader() -> MemoryBytecodeLoader {
    MemoryBytecodeLoader::new()
        .with_file(VERTEX_SHADER_PATH, b"standard vs".to_vec())
        .with_file(PIXEL_SHADER_PATH, b"standard ps".to_vec())
}

/// A dummy device plus the resources built on it.
pub struct TestContext {
    pub device: DummyDevice,
    pub resources: Rc<DeviceResources>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_size(WIDTH, HEIGHT)
    }

    /// Resources of the given size, with a window attached.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self::build(width, height, Some(test_window()))
    }

    /// Resources without a window handle.
    pub fn headless() -> Self {
        Self::build(WIDTH, HEIGHT, None)
    }

    fn build(width: u32, height: u32, window: Option<RawWindowHandle>) -> Self {
        let device = DummyDevice::new();
        let mut resources = DeviceResources::new(
            Rc::new(device.clone()),
            Rc::new(device.clone()),
            width,
            height,
        )
        .expect("valid screen size");
        if let Some(window) = window {
            resources = resources.with_window(window);
        }
        Self {
            device,
            resources: Rc::new(resources),
        }
    }

    /// Upload a triangle and a material constant buffer, then forget those calls.
    pub fn with_scene(self) -> Self {
        self.resources
            .upload_geometry(&triangle_vertices(), &TRIANGLE_INDICES)
            .expect("geometry upload");
        self.resources
            .create_constant_buffer(&Material::new().constants())
            .expect("constant buffer");
        self.device.clear_calls();
        self
    }

    pub fn renderer(&self, mode: PresentationMode) -> Renderer {
        Renderer::new(Rc::clone(&self.resources), mode, RendererConfig::default())
            .with_loader(standard_loader())
    }

    /// A renderer that has completed `initialize`, with the call log cleared.
    pub fn initialized_renderer(&self, mode: PresentationMode) -> Renderer {
        let mut renderer = self.renderer(mode);
        renderer.initialize().expect("initialize");
        self.device.clear_calls();
        renderer
    }
}
