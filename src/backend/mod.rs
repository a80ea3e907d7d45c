//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction over a Direct3D 11 style
//! device and immediate context, plus owning handles for every GPU object the
//! renderer creates.
//!
//! # Available Backends
//!
//! - `dummy` (default): records calls without touching a GPU, for tests and
//!   headless runs
//! - `d3d11`: native Direct3D 11 via the `windows` crate (Windows only)
//!
//! # Ownership
//!
//! Every handle type is an owning value. Dropping it releases the underlying
//! object: the COM reference for Direct3D 11, the live-object count for the
//! dummy backend. A renderer that fails halfway through initialization
//! therefore releases whatever it already created without extra cleanup code.

#[cfg(feature = "dummy")]
pub mod dummy;

#[cfg(all(windows, feature = "d3d11"))]
pub mod d3d11;

pub mod traits;
pub mod types;

pub use traits::*;
pub use types::*;

#[cfg(all(windows, feature = "d3d11"))]
use windows::Win32::Graphics::{Direct3D11::*, Dxgi::IDXGISwapChain};

use crate::error::GraphicsResult;

macro_rules! gpu_objects {
    ($($(#[$meta:meta])* $name:ident => $native:ty;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub enum $name {
                /// Dummy backend (no GPU object)
                #[cfg(feature = "dummy")]
                Dummy(dummy::DummyObject),
                /// Direct3D 11 object
                #[cfg(all(windows, feature = "d3d11"))]
                D3d11($native),
            }

            impl $name {
                #[cfg(all(windows, feature = "d3d11"))]
                #[allow(unreachable_patterns)]
                pub(crate) fn as_d3d11(&self) -> Option<&$native> {
                    match self {
                        Self::D3d11(object) => Some(object),
                        _ => None,
                    }
                }
            }
        )*
    };
}

gpu_objects! {
    /// Handle to a swap chain
    GpuSwapChain => IDXGISwapChain;
    /// Handle to a 2D texture (back buffers, depth buffers, material maps)
    GpuTexture => ID3D11Texture2D;
    /// Handle to a render-target view
    GpuRenderTargetView => ID3D11RenderTargetView;
    /// Handle to a depth-stencil view
    GpuDepthStencilView => ID3D11DepthStencilView;
    /// Handle to a depth-stencil state object
    GpuDepthStencilState => ID3D11DepthStencilState;
    /// Handle to a rasterizer state object
    GpuRasterizerState => ID3D11RasterizerState;
    /// Handle to an input layout
    GpuInputLayout => ID3D11InputLayout;
    /// Handle to a vertex, index or constant buffer
    GpuBuffer => ID3D11Buffer;
    /// Handle to a vertex shader
    VertexShader => ID3D11VertexShader;
    /// Handle to a hull shader
    HullShader => ID3D11HullShader;
    /// Handle to a geometry shader
    GeometryShader => ID3D11GeometryShader;
    /// Handle to a pixel shader
    PixelShader => ID3D11PixelShader;
}

impl GpuSwapChain {
    /// Retrieve back buffer `index` of the swap chain.
    pub fn back_buffer(&self, index: u32) -> GraphicsResult<GpuTexture> {
        match self {
            #[cfg(feature = "dummy")]
            Self::Dummy(object) => object.back_buffer(index),
            #[cfg(all(windows, feature = "d3d11"))]
            Self::D3d11(swap_chain) => d3d11::back_buffer(swap_chain, index),
        }
    }

    /// Present the current back buffer.
    ///
    /// `sync_interval` of 1 waits for one vertical blank.
    pub fn present(&self, sync_interval: u32, flags: u32) -> GraphicsResult<()> {
        match self {
            #[cfg(feature = "dummy")]
            Self::Dummy(object) => object.present(sync_interval, flags),
            #[cfg(all(windows, feature = "d3d11"))]
            Self::D3d11(swap_chain) => d3d11::present(swap_chain, sync_interval, flags),
        }
    }
}
