//! Renderer
//!
//! Configures the pipeline on top of [`DeviceResources`] and submits frames.
//! Initialization is a fixed sequence of fallible steps:
//!
//! 1. Standard vertex shader and its input layout
//! 2. Standard pixel shader
//! 3. Windowed mode only: swap chain, depth buffer, depth-stencil state and
//!    view, rasterizer state
//!
//! The first failing step aborts the sequence and its error is returned
//! unchanged. Whatever was created before it is released on drop.

mod states;
mod target;

pub use states::*;
pub use target::{PresentationMode, WindowedTarget, STENCIL_REFERENCE};

use std::path::Path;
use std::rc::Rc;

use crate::backend::{
    GpuInputLayout, IndexFormat, PrimitiveTopology, ShaderBytecode, ShaderCompileOptions,
    ShaderStage, VertexBufferBinding,
};
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::{
    DeviceResources, FileBytecodeLoader, ShaderBytecodeLoader, ShaderHandle, VertexPositionColor,
};
use crate::RendererConfig;

use target::PresentationTarget;

/// Entry point used for every shader compiled from source.
pub const SHADER_ENTRY_POINT: &str = "main";

/// Draws the scene held by a [`DeviceResources`].
pub struct Renderer {
    resources: Rc<DeviceResources>,
    config: RendererConfig,
    mode: PresentationMode,
    loader: Box<dyn ShaderBytecodeLoader>,
    input_layout: Option<GpuInputLayout>,
    target: Option<PresentationTarget>,
}

impl Renderer {
    /// Create a renderer. Nothing is created on the GPU until
    /// [`Renderer::initialize`].
    pub fn new(
        resources: Rc<DeviceResources>,
        mode: PresentationMode,
        config: RendererConfig,
    ) -> Self {
        Self {
            resources,
            config,
            mode,
            loader: Box::new(FileBytecodeLoader::new()),
            input_layout: None,
            target: None,
        }
    }

    /// Replace the loader used by the `set_*_shader` methods.
    pub fn with_loader(mut self, loader: impl ShaderBytecodeLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Run the initialization sequence.
    ///
    /// Calling it again rebuilds every object. The previous presentation
    /// target is released before the new one is created.
    pub fn initialize(&mut self) -> GraphicsResult<()> {
        self.target = None;
        log::debug!(
            "Initializing renderer ({:?}, {} backend)",
            self.mode,
            self.resources.device().name()
        );

        let target = self.run_initialization().map_err(|err| {
            log::error!("Renderer initialization failed: {}", err);
            err
        })?;
        self.target = Some(target);

        log::info!(
            "Renderer initialized ({:?}, {}x{})",
            self.mode,
            self.resources.screen_width(),
            self.resources.screen_height()
        );
        Ok(())
    }

    fn run_initialization(&mut self) -> GraphicsResult<PresentationTarget> {
        let vertex_shader = self.config.standard_vertex_shader.clone();
        self.set_vertex_shader(&vertex_shader)?;

        let pixel_shader = self.config.standard_pixel_shader.clone();
        self.set_pixel_shader(&pixel_shader)?;

        match self.mode {
            PresentationMode::Windowed => Ok(PresentationTarget::Windowed(
                WindowedTarget::create(&self.resources)?,
            )),
            PresentationMode::Offscreen => {
                log::debug!("Offscreen mode, skipping swap chain setup");
                Ok(PresentationTarget::Offscreen)
            }
        }
    }

    /// Load precompiled bytecode for `stage` and make it the active shader.
    pub fn set_shader(&mut self, stage: ShaderStage, path: impl AsRef<Path>) -> GraphicsResult<()> {
        let path = path.as_ref();
        let bytecode = self.loader.read_file_bytes(path)?;
        log::debug!("Binding {} shader {:?}", stage.name(), path);
        self.bind_shader(stage, &bytecode)
    }

    /// Compile HLSL source for `stage` and make it the active shader.
    pub fn compile_shader(
        &mut self,
        stage: ShaderStage,
        path: impl AsRef<Path>,
    ) -> GraphicsResult<()> {
        let path = path.as_ref();
        let options = ShaderCompileOptions {
            entry_point: SHADER_ENTRY_POINT.to_string(),
            profile: stage.profile(),
            defines: Vec::new(),
            strict: true,
            debug: cfg!(debug_assertions),
            include_standard: true,
        };
        let bytecode = self.resources.device().compile_shader(path, &options)?;
        log::debug!(
            "Compiled {} shader {:?} ({} bytes)",
            stage.name(),
            path,
            bytecode.len()
        );
        self.bind_shader(stage, &bytecode)
    }

    pub fn set_vertex_shader(&mut self, path: impl AsRef<Path>) -> GraphicsResult<()> {
        self.set_shader(ShaderStage::Vertex, path)
    }

    pub fn set_hull_shader(&mut self, path: impl AsRef<Path>) -> GraphicsResult<()> {
        self.set_shader(ShaderStage::Hull, path)
    }

    pub fn set_geometry_shader(&mut self, path: impl AsRef<Path>) -> GraphicsResult<()> {
        self.set_shader(ShaderStage::Geometry, path)
    }

    pub fn set_pixel_shader(&mut self, path: impl AsRef<Path>) -> GraphicsResult<()> {
        self.set_shader(ShaderStage::Pixel, path)
    }

    pub fn compile_vertex_shader(&mut self, path: impl AsRef<Path>) -> GraphicsResult<()> {
        self.compile_shader(ShaderStage::Vertex, path)
    }

    pub fn compile_hull_shader(&mut self, path: impl AsRef<Path>) -> GraphicsResult<()> {
        self.compile_shader(ShaderStage::Hull, path)
    }

    pub fn compile_geometry_shader(&mut self, path: impl AsRef<Path>) -> GraphicsResult<()> {
        self.compile_shader(ShaderStage::Geometry, path)
    }

    pub fn compile_pixel_shader(&mut self, path: impl AsRef<Path>) -> GraphicsResult<()> {
        self.compile_shader(ShaderStage::Pixel, path)
    }

    /// Create the shader object and store it in the active set. The vertex
    /// stage also rebuilds the input layout against the new bytecode.
    fn bind_shader(&mut self, stage: ShaderStage, bytecode: &ShaderBytecode) -> GraphicsResult<()> {
        let resources = Rc::clone(&self.resources);
        let device = resources.device();

        let handle = match stage {
            ShaderStage::Vertex => {
                let shader = device.create_vertex_shader(bytecode)?;
                let layout =
                    device.create_input_layout(&VertexPositionColor::input_elements(), bytecode)?;
                self.input_layout = Some(layout);
                ShaderHandle::Vertex(Rc::new(shader))
            }
            ShaderStage::Hull => ShaderHandle::Hull(Rc::new(device.create_hull_shader(bytecode)?)),
            ShaderStage::Geometry => {
                ShaderHandle::Geometry(Rc::new(device.create_geometry_shader(bytecode)?))
            }
            ShaderStage::Pixel => {
                ShaderHandle::Pixel(Rc::new(device.create_pixel_shader(bytecode)?))
            }
        };

        resources.shaders_mut().set(handle);
        Ok(())
    }

    /// Submit one frame.
    ///
    /// Windowed renderers present the back buffer. Offscreen renderers
    /// re-bind the whole pipeline and draw the scene buffers once.
    pub fn render(&self) -> GraphicsResult<()> {
        match self.target.as_ref().ok_or(GraphicsError::NotInitialized)? {
            PresentationTarget::Windowed(target) => {
                log::trace!("Presenting (sync interval {})", self.config.sync_interval);
                target.swap_chain.present(self.config.sync_interval, 0)
            }
            PresentationTarget::Offscreen => self.draw_offscreen(),
        }
    }

    fn draw_offscreen(&self) -> GraphicsResult<()> {
        let geometry = self.resources.geometry();
        let geometry = geometry
            .as_ref()
            .ok_or(GraphicsError::MissingResource("geometry buffers"))?;
        let constants = self.resources.constant_buffer();
        let constants = constants
            .as_ref()
            .ok_or(GraphicsError::MissingResource("constant buffer"))?;
        let input_layout = self
            .input_layout
            .as_ref()
            .ok_or(GraphicsError::MissingResource("input layout"))?;
        let shaders = self.resources.shaders();
        let vertex_shader = shaders
            .vertex
            .as_ref()
            .ok_or(GraphicsError::MissingResource("vertex shader"))?;
        let pixel_shader = shaders
            .pixel
            .as_ref()
            .ok_or(GraphicsError::MissingResource("pixel shader"))?;

        log::trace!("Drawing {} indices offscreen", geometry.index_count);
        let context = self.resources.context();
        context.update_subresource(constants.buffer(), constants.data());
        context.set_vertex_buffer(
            &geometry.vertex_buffer,
            VertexBufferBinding {
                slot: 0,
                stride: VertexPositionColor::STRIDE,
                offset: 0,
            },
        );
        context.set_index_buffer(&geometry.index_buffer, IndexFormat::Uint16, 0);
        context.set_primitive_topology(PrimitiveTopology::TriangleList);
        context.set_input_layout(input_layout);
        context.set_vertex_shader(vertex_shader);
        context.set_pixel_shader(pixel_shader);
        context.draw_indexed(geometry.index_count, 0, 0);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.target.is_some()
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn resources(&self) -> &Rc<DeviceResources> {
        &self.resources
    }

    /// The input layout built for the current vertex shader
    pub fn input_layout(&self) -> Option<&GpuInputLayout> {
        self.input_layout.as_ref()
    }

    /// Swap chain and output objects, once a windowed renderer is initialized
    pub fn windowed_target(&self) -> Option<&WindowedTarget> {
        match &self.target {
            Some(PresentationTarget::Windowed(target)) => Some(target),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("mode", &self.mode)
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .field("input_layout", &self.input_layout)
            .finish_non_exhaustive()
    }
}
