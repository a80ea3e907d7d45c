//! Presentation targets

use crate::backend::{
    GpuDepthStencilState, GpuDepthStencilView, GpuRasterizerState, GpuRenderTargetView,
    GpuSwapChain, GpuTexture,
};
use crate::error::GraphicsResult;
use crate::resources::DeviceResources;

use super::states;

/// Stencil reference value bound with the depth-stencil state.
pub const STENCIL_REFERENCE: u32 = 1;

/// How frames leave the renderer.
///
/// Chosen once at construction and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationMode {
    /// Present through a swap chain on the resources' window.
    Windowed,
    /// Draw the scene buffers with no swap chain.
    #[default]
    Offscreen,
}

/// Swap chain and the output-merger and rasterizer objects that go with it.
///
/// Field order is release order: views go before the textures they view.
#[derive(Debug)]
pub struct WindowedTarget {
    pub rasterizer_state: GpuRasterizerState,
    pub depth_stencil_view: GpuDepthStencilView,
    pub depth_stencil_state: GpuDepthStencilState,
    pub depth_buffer: GpuTexture,
    pub render_target_view: GpuRenderTargetView,
    pub back_buffer: GpuTexture,
    pub swap_chain: GpuSwapChain,
}

impl WindowedTarget {
    /// Create and bind every windowed object in order.
    ///
    /// Stops at the first failing step. Objects created before it are
    /// released when this returns.
    pub fn create(resources: &DeviceResources) -> GraphicsResult<Self> {
        let device = resources.device();
        let context = resources.context();

        let swap_chain = device.create_swap_chain(&states::swap_chain_descriptor(resources)?)?;
        let back_buffer = swap_chain.back_buffer(0)?;
        let render_target_view = device.create_render_target_view(&back_buffer)?;
        log::info!(
            "Swap chain created ({}x{}, {} buffers)",
            resources.screen_width(),
            resources.screen_height(),
            states::SWAP_CHAIN_BUFFER_COUNT
        );

        let depth_buffer = device.create_texture_2d(&states::depth_buffer_descriptor(
            resources.screen_width(),
            resources.screen_height(),
        ))?;
        log::debug!("Depth buffer created");

        let depth_stencil_state =
            device.create_depth_stencil_state(&states::depth_stencil_descriptor())?;
        let depth_stencil_view = device
            .create_depth_stencil_view(&depth_buffer, &states::depth_stencil_view_descriptor())?;
        context.set_render_targets(&[&render_target_view], Some(&depth_stencil_view));
        context.set_depth_stencil_state(&depth_stencil_state, STENCIL_REFERENCE);
        log::debug!("Depth-stencil state and view bound");

        let rasterizer_state = device.create_rasterizer_state(&states::rasterizer_descriptor())?;
        context.set_rasterizer_state(&rasterizer_state);
        log::debug!("Rasterizer state bound");

        Ok(Self {
            rasterizer_state,
            depth_stencil_view,
            depth_stencil_state,
            depth_buffer,
            render_target_view,
            back_buffer,
            swap_chain,
        })
    }
}

/// The presentation side of an initialized renderer
#[derive(Debug)]
pub(crate) enum PresentationTarget {
    Windowed(WindowedTarget),
    Offscreen,
}
