//! Fixed pipeline state descriptions used by the windowed target

use crate::backend::types::*;
use crate::error::{GraphicsError, GraphicsResult};
use crate::resources::DeviceResources;

pub const SWAP_CHAIN_BUFFER_COUNT: u32 = 2;
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth24UnormStencil8;

/// Swap chain for the resources' window, sized to the screen.
///
/// # Errors
///
/// Returns [`GraphicsError::InvalidParameter`] if the resources have no
/// window to present to.
pub fn swap_chain_descriptor(resources: &DeviceResources) -> GraphicsResult<SwapChainDescriptor> {
    let output_window = resources.window_handle().ok_or_else(|| {
        GraphicsError::InvalidParameter("windowed presentation requires a window handle".into())
    })?;

    Ok(SwapChainDescriptor {
        width: resources.screen_width(),
        height: resources.screen_height(),
        format: TextureFormat::Rgba8Unorm,
        refresh_rate: (0, 1),
        sample: SampleDescriptor {
            count: resources.samples_count(),
            quality: 0,
        },
        buffer_count: SWAP_CHAIN_BUFFER_COUNT,
        swap_effect: SwapEffect::Discard,
        output_window,
        windowed: !resources.full_screen(),
        flags: 0,
    })
}

/// Screen-sized depth buffer. Always single-sampled.
pub fn depth_buffer_descriptor(width: u32, height: u32) -> Texture2dDescriptor {
    Texture2dDescriptor {
        width,
        height,
        mip_levels: 1,
        array_size: 1,
        format: DEPTH_FORMAT,
        sample: SampleDescriptor::SINGLE,
        usage: ResourceUsage::Default,
        bind_flags: BindFlags::DEPTH_STENCIL,
        cpu_access: CpuAccessFlags::empty(),
        misc_flags: 0,
    }
}

/// Depth test LESS with writes, stencil always passing.
///
/// Front faces increment the stencil on depth failure and back faces
/// decrement it.
pub fn depth_stencil_descriptor() -> DepthStencilDescriptor {
    DepthStencilDescriptor {
        depth_enable: true,
        depth_write_mask: DepthWriteMask::All,
        depth_compare: CompareFunction::Less,
        stencil_enable: true,
        stencil_read_mask: 0xFF,
        stencil_write_mask: 0xFF,
        front_face: StencilFaceDescriptor {
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::IncrementWrap,
            pass_op: StencilOperation::Keep,
            compare: CompareFunction::Always,
        },
        back_face: StencilFaceDescriptor {
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::DecrementWrap,
            pass_op: StencilOperation::Keep,
            compare: CompareFunction::Always,
        },
    }
}

pub fn depth_stencil_view_descriptor() -> DepthStencilViewDescriptor {
    DepthStencilViewDescriptor {
        format: DEPTH_FORMAT,
        mip_slice: 0,
    }
}

/// Solid fill, back-face culling, clockwise front faces.
pub fn rasterizer_descriptor() -> RasterizerDescriptor {
    RasterizerDescriptor {
        fill_mode: FillMode::Solid,
        cull_mode: CullMode::Back,
        front_counter_clockwise: false,
        depth_bias: 0,
        depth_bias_clamp: 0.0,
        slope_scaled_depth_bias: 0.0,
        depth_clip_enable: true,
        scissor_enable: false,
        multisample_enable: false,
        antialiased_line_enable: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_buffer_is_always_d24s8() {
        for (width, height) in [(1, 1), (640, 480), (3840, 2160)] {
            let desc = depth_buffer_descriptor(width, height);
            assert_eq!(desc.format, TextureFormat::Depth24UnormStencil8);
            assert_eq!((desc.width, desc.height), (width, height));
            assert_eq!(desc.sample, SampleDescriptor::SINGLE);
            assert_eq!(desc.bind_flags, BindFlags::DEPTH_STENCIL);
            assert!(desc.cpu_access.is_empty());
        }
    }

    #[test]
    fn test_stencil_faces_are_asymmetric() {
        let desc = depth_stencil_descriptor();
        assert_eq!(desc.front_face.depth_fail_op, StencilOperation::IncrementWrap);
        assert_eq!(desc.back_face.depth_fail_op, StencilOperation::DecrementWrap);
        assert_ne!(desc.front_face, desc.back_face);
        assert_eq!(desc.depth_compare, CompareFunction::Less);
        assert_eq!(desc.depth_write_mask, DepthWriteMask::All);
    }

    #[test]
    fn test_rasterizer_culls_back_faces() {
        let desc = rasterizer_descriptor();
        assert_eq!(desc.fill_mode, FillMode::Solid);
        assert_eq!(desc.cull_mode, CullMode::Back);
        assert!(!desc.front_counter_clockwise);
        assert!(desc.depth_clip_enable);
        assert!(!desc.scissor_enable && !desc.multisample_enable);
        assert!(!desc.antialiased_line_enable);
        assert_eq!(desc.depth_bias, 0);
        assert_eq!(desc.depth_bias_clamp, 0.0);
        assert_eq!(desc.slope_scaled_depth_bias, 0.0);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_swap_chain_matches_screen() {
        use std::num::NonZeroIsize;
        use std::rc::Rc;

        use raw_window_handle::{RawWindowHandle, Win32WindowHandle};

        use crate::backend::dummy::DummyDevice;

        let device = DummyDevice::new();
        let window = NonZeroIsize::new(0x1234).map(Win32WindowHandle::new).unwrap();
        let resources =
            DeviceResources::new(Rc::new(device.clone()), Rc::new(device), 1024, 768)
                .unwrap()
                .with_samples_count(4)
                .with_window(RawWindowHandle::Win32(window))
                .with_full_screen(true);

        let desc = swap_chain_descriptor(&resources).unwrap();
        assert_eq!((desc.width, desc.height), (1024, 768));
        assert_eq!(desc.buffer_count, 2);
        assert_eq!(desc.format, TextureFormat::Rgba8Unorm);
        assert_eq!(desc.refresh_rate, (0, 1));
        assert_eq!(desc.sample, SampleDescriptor { count: 4, quality: 0 });
        assert_eq!(desc.swap_effect, SwapEffect::Discard);
        assert!(!desc.windowed);
        assert_eq!(desc.flags, 0);
    }
}
