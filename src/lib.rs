//! NShade - a thin renderer over a Direct3D 11 style device
//!
//! The caller supplies a device and immediate context; NShade configures the
//! swap chain, depth/stencil and rasterizer state, binds shader stages and
//! submits frames, either presenting to a window or drawing offscreen.
//!
//! Two backends are available:
//! - **dummy** (default): records every call without a GPU, for tests and
//!   headless runs
//! - **d3d11**: native Direct3D 11 through the `windows` crate (Windows only)
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "dummy")]
//! # fn main() -> nshade::GraphicsResult<()> {
//! use std::rc::Rc;
//! use nshade::backend::dummy::DummyDevice;
//! use nshade::{DeviceResources, PresentationMode, Renderer, RendererConfig};
//!
//! let device = DummyDevice::new();
//! let resources = DeviceResources::new(Rc::new(device.clone()), Rc::new(device), 1280, 720)?;
//! let mut renderer = Renderer::new(
//!     Rc::new(resources),
//!     PresentationMode::Offscreen,
//!     RendererConfig::default(),
//! );
//! renderer.initialize()?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "dummy"))]
//! # fn main() {}
//! ```

#[cfg(not(any(feature = "dummy", all(windows, feature = "d3d11"))))]
compile_error!("enable the `dummy` feature, or `d3d11` on Windows");

pub mod backend;
pub mod error;
pub mod renderer;
pub mod resources;

use std::path::PathBuf;

pub use error::{GraphicsError, GraphicsResult};
pub use renderer::{PresentationMode, Renderer};
pub use resources::{DeviceResources, Material, ShaderBytecodeLoader, VertexPositionColor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for a [`Renderer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Precompiled vertex shader bound by `initialize`
    pub standard_vertex_shader: PathBuf,
    /// Precompiled pixel shader bound by `initialize`
    pub standard_pixel_shader: PathBuf,
    /// Vertical blanks to wait for on present (0 disables vsync)
    pub sync_interval: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            standard_vertex_shader: PathBuf::from("shaders/standard_vs.cso"),
            standard_pixel_shader: PathBuf::from("shaders/standard_ps.cso"),
            sync_interval: 1,
        }
    }
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vertex_shader(mut self, path: impl Into<PathBuf>) -> Self {
        self.standard_vertex_shader = path.into();
        self
    }

    pub fn with_pixel_shader(mut self, path: impl Into<PathBuf>) -> Self {
        self.standard_pixel_shader = path.into();
        self
    }

    pub fn with_sync_interval(mut self, sync_interval: u32) -> Self {
        self.sync_interval = sync_interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RendererConfig::default();
        assert_eq!(config.standard_vertex_shader, PathBuf::from("shaders/standard_vs.cso"));
        assert_eq!(config.standard_pixel_shader, PathBuf::from("shaders/standard_ps.cso"));
        assert_eq!(config.sync_interval, 1);
        assert_eq!(PresentationMode::default(), PresentationMode::Offscreen);
    }

    #[test]
    fn test_config_builders() {
        let config = RendererConfig::new()
            .with_vertex_shader("vs.cso")
            .with_pixel_shader("ps.cso")
            .with_sync_interval(0);
        assert_eq!(config.standard_vertex_shader, PathBuf::from("vs.cso"));
        assert_eq!(config.standard_pixel_shader, PathBuf::from("ps.cso"));
        assert_eq!(config.sync_interval, 0);
    }
}
