//! Direct3D 11 backend implementation using the windows crate
//!
//! Wraps a device and immediate context created by the caller. Every failing
//! HRESULT is surfaced as [`GraphicsError::Api`] with the code unchanged.

use std::ffi::{c_void, CString};
use std::mem::ManuallyDrop;
use std::path::Path;

use raw_window_handle::RawWindowHandle;
use windows::core::{Interface, HSTRING, PCSTR};
use windows::Win32::Foundation::{BOOL, E_POINTER, HWND};
use windows::Win32::Graphics::Direct3D::Fxc::{
    D3DCompileFromFile, D3DCOMPILE_DEBUG, D3DCOMPILE_ENABLE_STRICTNESS,
};
use windows::Win32::Graphics::Direct3D::{
    ID3DBlob, ID3DInclude, D3D_PRIMITIVE_TOPOLOGY, D3D_PRIMITIVE_TOPOLOGY_LINELIST,
    D3D_PRIMITIVE_TOPOLOGY_LINESTRIP, D3D_PRIMITIVE_TOPOLOGY_POINTLIST,
    D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST, D3D_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP, D3D_SHADER_MACRO,
};
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::{
    IDXGIAdapter, IDXGIDevice, IDXGIFactory, IDXGISwapChain, DXGI_PRESENT, DXGI_SWAP_CHAIN_DESC,
    DXGI_SWAP_EFFECT, DXGI_SWAP_EFFECT_DISCARD, DXGI_SWAP_EFFECT_FLIP_DISCARD,
    DXGI_SWAP_EFFECT_FLIP_SEQUENTIAL, DXGI_SWAP_EFFECT_SEQUENTIAL, DXGI_USAGE_RENDER_TARGET_OUTPUT,
};

use crate::backend::types::*;
use crate::backend::{
    GeometryShader, GpuBuffer, GpuContext, GpuDepthStencilState, GpuDepthStencilView, GpuDevice,
    GpuInputLayout, GpuRasterizerState, GpuRenderTargetView, GpuSwapChain, GpuTexture, HullShader,
    PixelShader, VertexShader,
};
use crate::error::{GraphicsError, GraphicsResult};

/// Direct3D 11 device and immediate context
#[derive(Debug, Clone)]
pub struct D3d11Device {
    device: ID3D11Device,
    context: ID3D11DeviceContext,
}

/// `D3D_COMPILE_STANDARD_FILE_INCLUDE`: a sentinel pointer, not an object.
const STANDARD_FILE_INCLUDE: usize = 1;

fn api_error(call: &'static str) -> impl FnOnce(windows::core::Error) -> GraphicsError {
    move |err| GraphicsError::Api {
        call,
        code: err.code().0,
    }
}

/// Unwrap an out-parameter that a successful call left empty.
fn created<T>(object: Option<T>, call: &'static str) -> GraphicsResult<T> {
    object.ok_or(GraphicsError::Api {
        call,
        code: E_POINTER.0,
    })
}

/// The native object behind a handle passed to device creation calls.
fn native<'a, T>(object: Option<&'a T>, what: &str) -> GraphicsResult<&'a T> {
    object.ok_or_else(|| {
        GraphicsError::InvalidParameter(format!(
            "{what} was not created by the Direct3D 11 backend"
        ))
    })
}

/// Context calls cannot fail, so foreign handles are skipped with a warning.
fn native_or_skip<'a, T>(object: Option<&'a T>, call: &str) -> Option<&'a T> {
    if object.is_none() {
        log::warn!("{call}: ignoring a handle not created by the Direct3D 11 backend");
    }
    object
}

fn c_string(value: &str) -> GraphicsResult<CString> {
    CString::new(value)
        .map_err(|_| GraphicsError::InvalidParameter(format!("{value:?} contains a NUL byte")))
}

fn blob_text(blob: &ID3DBlob) -> String {
    // SAFETY: the blob owns GetBufferSize() bytes at GetBufferPointer() for its lifetime.
    let bytes = unsafe {
        std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
    };
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

pub(crate) fn back_buffer(swap_chain: &IDXGISwapChain, index: u32) -> GraphicsResult<GpuTexture> {
    let texture: ID3D11Texture2D =
        unsafe { swap_chain.GetBuffer(index) }.map_err(api_error("GetBuffer"))?;
    Ok(GpuTexture::D3d11(texture))
}

pub(crate) fn present(
    swap_chain: &IDXGISwapChain,
    sync_interval: u32,
    flags: u32,
) -> GraphicsResult<()> {
    unsafe { swap_chain.Present(sync_interval, DXGI_PRESENT(flags)) }
        .ok()
        .map_err(api_error("Present"))
}

impl D3d11Device {
    /// Wrap an existing device and its immediate context.
    pub fn new(device: ID3D11Device, context: ID3D11DeviceContext) -> Self {
        Self { device, context }
    }

    pub fn device(&self) -> &ID3D11Device {
        &self.device
    }

    pub fn context(&self) -> &ID3D11DeviceContext {
        &self.context
    }

    fn convert_format(format: TextureFormat) -> DXGI_FORMAT {
        match format {
            TextureFormat::Rgba8Unorm => DXGI_FORMAT_R8G8B8A8_UNORM,
            TextureFormat::Depth24UnormStencil8 => DXGI_FORMAT_D24_UNORM_S8_UINT,
        }
    }

    fn convert_vertex_format(format: VertexFormat) -> DXGI_FORMAT {
        match format {
            VertexFormat::Float32x3 => DXGI_FORMAT_R32G32B32_FLOAT,
            VertexFormat::Float32x4 => DXGI_FORMAT_R32G32B32A32_FLOAT,
        }
    }

    fn convert_index_format(format: IndexFormat) -> DXGI_FORMAT {
        match format {
            IndexFormat::Uint16 => DXGI_FORMAT_R16_UINT,
            IndexFormat::Uint32 => DXGI_FORMAT_R32_UINT,
        }
    }

    fn convert_topology(topology: PrimitiveTopology) -> D3D_PRIMITIVE_TOPOLOGY {
        match topology {
            PrimitiveTopology::PointList => D3D_PRIMITIVE_TOPOLOGY_POINTLIST,
            PrimitiveTopology::LineList => D3D_PRIMITIVE_TOPOLOGY_LINELIST,
            PrimitiveTopology::LineStrip => D3D_PRIMITIVE_TOPOLOGY_LINESTRIP,
            PrimitiveTopology::TriangleList => D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
            PrimitiveTopology::TriangleStrip => D3D_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP,
        }
    }

    fn convert_compare_function(func: CompareFunction) -> D3D11_COMPARISON_FUNC {
        match func {
            CompareFunction::Never => D3D11_COMPARISON_NEVER,
            CompareFunction::Less => D3D11_COMPARISON_LESS,
            CompareFunction::Equal => D3D11_COMPARISON_EQUAL,
            CompareFunction::LessEqual => D3D11_COMPARISON_LESS_EQUAL,
            CompareFunction::Greater => D3D11_COMPARISON_GREATER,
            CompareFunction::NotEqual => D3D11_COMPARISON_NOT_EQUAL,
            CompareFunction::GreaterEqual => D3D11_COMPARISON_GREATER_EQUAL,
            CompareFunction::Always => D3D11_COMPARISON_ALWAYS,
        }
    }

    fn convert_stencil_op(op: StencilOperation) -> D3D11_STENCIL_OP {
        match op {
            StencilOperation::Keep => D3D11_STENCIL_OP_KEEP,
            StencilOperation::Zero => D3D11_STENCIL_OP_ZERO,
            StencilOperation::Replace => D3D11_STENCIL_OP_REPLACE,
            StencilOperation::IncrementClamp => D3D11_STENCIL_OP_INCR_SAT,
            StencilOperation::DecrementClamp => D3D11_STENCIL_OP_DECR_SAT,
            StencilOperation::Invert => D3D11_STENCIL_OP_INVERT,
            StencilOperation::IncrementWrap => D3D11_STENCIL_OP_INCR,
            StencilOperation::DecrementWrap => D3D11_STENCIL_OP_DECR,
        }
    }

    fn convert_stencil_face(face: &StencilFaceDescriptor) -> D3D11_DEPTH_STENCILOP_DESC {
        D3D11_DEPTH_STENCILOP_DESC {
            StencilFailOp: Self::convert_stencil_op(face.fail_op),
            StencilDepthFailOp: Self::convert_stencil_op(face.depth_fail_op),
            StencilPassOp: Self::convert_stencil_op(face.pass_op),
            StencilFunc: Self::convert_compare_function(face.compare),
        }
    }

    fn convert_usage(usage: ResourceUsage) -> D3D11_USAGE {
        match usage {
            ResourceUsage::Default => D3D11_USAGE_DEFAULT,
            ResourceUsage::Immutable => D3D11_USAGE_IMMUTABLE,
            ResourceUsage::Dynamic => D3D11_USAGE_DYNAMIC,
            ResourceUsage::Staging => D3D11_USAGE_STAGING,
        }
    }

    fn convert_swap_effect(effect: SwapEffect) -> DXGI_SWAP_EFFECT {
        match effect {
            SwapEffect::Discard => DXGI_SWAP_EFFECT_DISCARD,
            SwapEffect::Sequential => DXGI_SWAP_EFFECT_SEQUENTIAL,
            SwapEffect::FlipSequential => DXGI_SWAP_EFFECT_FLIP_SEQUENTIAL,
            SwapEffect::FlipDiscard => DXGI_SWAP_EFFECT_FLIP_DISCARD,
        }
    }

    fn convert_sample(sample: SampleDescriptor) -> DXGI_SAMPLE_DESC {
        DXGI_SAMPLE_DESC {
            Count: sample.count,
            Quality: sample.quality,
        }
    }

    fn output_window(handle: RawWindowHandle) -> GraphicsResult<HWND> {
        match handle {
            RawWindowHandle::Win32(handle) => Ok(HWND(handle.hwnd.get() as *mut c_void)),
            other => Err(GraphicsError::InvalidParameter(format!(
                "swap chain output must be a Win32 window, got {other:?}"
            ))),
        }
    }
}

impl GpuDevice for D3d11Device {
    fn name(&self) -> &'static str {
        "Direct3D 11"
    }

    fn create_swap_chain(&self, desc: &SwapChainDescriptor) -> GraphicsResult<GpuSwapChain> {
        let native_desc = DXGI_SWAP_CHAIN_DESC {
            BufferDesc: DXGI_MODE_DESC {
                Width: desc.width,
                Height: desc.height,
                RefreshRate: DXGI_RATIONAL {
                    Numerator: desc.refresh_rate.0,
                    Denominator: desc.refresh_rate.1,
                },
                Format: Self::convert_format(desc.format),
                ScanlineOrdering: DXGI_MODE_SCANLINE_ORDER_UNSPECIFIED,
                Scaling: DXGI_MODE_SCALING_UNSPECIFIED,
            },
            SampleDesc: Self::convert_sample(desc.sample),
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: desc.buffer_count,
            OutputWindow: Self::output_window(desc.output_window)?,
            Windowed: BOOL::from(desc.windowed),
            SwapEffect: Self::convert_swap_effect(desc.swap_effect),
            Flags: desc.flags,
        };

        // The factory that created the device is the one allowed to create its swap chain.
        let dxgi_device: IDXGIDevice = self
            .device
            .cast()
            .map_err(api_error("QueryInterface(IDXGIDevice)"))?;
        let adapter: IDXGIAdapter =
            unsafe { dxgi_device.GetParent() }.map_err(api_error("GetParent(IDXGIAdapter)"))?;
        let factory: IDXGIFactory =
            unsafe { adapter.GetParent() }.map_err(api_error("GetParent(IDXGIFactory)"))?;

        let mut swap_chain = None;
        unsafe { factory.CreateSwapChain(&self.device, &native_desc, &mut swap_chain) }
            .ok()
            .map_err(api_error("CreateSwapChain"))?;
        Ok(GpuSwapChain::D3d11(created(swap_chain, "CreateSwapChain")?))
    }

    fn create_texture_2d(&self, desc: &Texture2dDescriptor) -> GraphicsResult<GpuTexture> {
        let native_desc = D3D11_TEXTURE2D_DESC {
            Width: desc.width,
            Height: desc.height,
            MipLevels: desc.mip_levels,
            ArraySize: desc.array_size,
            Format: Self::convert_format(desc.format),
            SampleDesc: Self::convert_sample(desc.sample),
            Usage: Self::convert_usage(desc.usage),
            BindFlags: desc.bind_flags.bits(),
            CPUAccessFlags: desc.cpu_access.bits(),
            MiscFlags: desc.misc_flags,
        };

        let mut texture = None;
        unsafe { self.device.CreateTexture2D(&native_desc, None, Some(&mut texture)) }
            .map_err(api_error("CreateTexture2D"))?;
        Ok(GpuTexture::D3d11(created(texture, "CreateTexture2D")?))
    }

    fn create_render_target_view(
        &self,
        texture: &GpuTexture,
    ) -> GraphicsResult<GpuRenderTargetView> {
        let texture = native(texture.as_d3d11(), "render target texture")?;

        let mut view = None;
        unsafe { self.device.CreateRenderTargetView(texture, None, Some(&mut view)) }
            .map_err(api_error("CreateRenderTargetView"))?;
        Ok(GpuRenderTargetView::D3d11(created(
            view,
            "CreateRenderTargetView",
        )?))
    }

    fn create_depth_stencil_view(
        &self,
        texture: &GpuTexture,
        desc: &DepthStencilViewDescriptor,
    ) -> GraphicsResult<GpuDepthStencilView> {
        let texture = native(texture.as_d3d11(), "depth stencil texture")?;
        let native_desc = D3D11_DEPTH_STENCIL_VIEW_DESC {
            Format: Self::convert_format(desc.format),
            ViewDimension: D3D11_DSV_DIMENSION_TEXTURE2D,
            Flags: 0,
            Anonymous: D3D11_DEPTH_STENCIL_VIEW_DESC_0 {
                Texture2D: D3D11_TEX2D_DSV {
                    MipSlice: desc.mip_slice,
                },
            },
        };

        let mut view = None;
        unsafe {
            self.device.CreateDepthStencilView(
                texture,
                Some(&native_desc as *const D3D11_DEPTH_STENCIL_VIEW_DESC),
                Some(&mut view),
            )
        }
        .map_err(api_error("CreateDepthStencilView"))?;
        Ok(GpuDepthStencilView::D3d11(created(
            view,
            "CreateDepthStencilView",
        )?))
    }

    fn create_depth_stencil_state(
        &self,
        desc: &DepthStencilDescriptor,
    ) -> GraphicsResult<GpuDepthStencilState> {
        let native_desc = D3D11_DEPTH_STENCIL_DESC {
            DepthEnable: BOOL::from(desc.depth_enable),
            DepthWriteMask: match desc.depth_write_mask {
                DepthWriteMask::Zero => D3D11_DEPTH_WRITE_MASK_ZERO,
                DepthWriteMask::All => D3D11_DEPTH_WRITE_MASK_ALL,
            },
            DepthFunc: Self::convert_compare_function(desc.depth_compare),
            StencilEnable: BOOL::from(desc.stencil_enable),
            StencilReadMask: desc.stencil_read_mask,
            StencilWriteMask: desc.stencil_write_mask,
            FrontFace: Self::convert_stencil_face(&desc.front_face),
            BackFace: Self::convert_stencil_face(&desc.back_face),
        };

        let mut state = None;
        unsafe {
            self.device
                .CreateDepthStencilState(&native_desc, Some(&mut state))
        }
        .map_err(api_error("CreateDepthStencilState"))?;
        Ok(GpuDepthStencilState::D3d11(created(
            state,
            "CreateDepthStencilState",
        )?))
    }

    fn create_rasterizer_state(
        &self,
        desc: &RasterizerDescriptor,
    ) -> GraphicsResult<GpuRasterizerState> {
        let native_desc = D3D11_RASTERIZER_DESC {
            FillMode: match desc.fill_mode {
                FillMode::Wireframe => D3D11_FILL_WIREFRAME,
                FillMode::Solid => D3D11_FILL_SOLID,
            },
            CullMode: match desc.cull_mode {
                CullMode::None => D3D11_CULL_NONE,
                CullMode::Front => D3D11_CULL_FRONT,
                CullMode::Back => D3D11_CULL_BACK,
            },
            FrontCounterClockwise: BOOL::from(desc.front_counter_clockwise),
            DepthBias: desc.depth_bias,
            DepthBiasClamp: desc.depth_bias_clamp,
            SlopeScaledDepthBias: desc.slope_scaled_depth_bias,
            DepthClipEnable: BOOL::from(desc.depth_clip_enable),
            ScissorEnable: BOOL::from(desc.scissor_enable),
            MultisampleEnable: BOOL::from(desc.multisample_enable),
            AntialiasedLineEnable: BOOL::from(desc.antialiased_line_enable),
        };

        let mut state = None;
        unsafe { self.device.CreateRasterizerState(&native_desc, Some(&mut state)) }
            .map_err(api_error("CreateRasterizerState"))?;
        Ok(GpuRasterizerState::D3d11(created(
            state,
            "CreateRasterizerState",
        )?))
    }

    fn create_buffer(
        &self,
        desc: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> GraphicsResult<GpuBuffer> {
        let native_desc = D3D11_BUFFER_DESC {
            ByteWidth: desc.byte_width,
            Usage: Self::convert_usage(desc.usage),
            BindFlags: desc.bind_flags.bits(),
            CPUAccessFlags: desc.cpu_access.bits(),
            MiscFlags: 0,
            StructureByteStride: 0,
        };
        let subresource = initial_data.map(|data| D3D11_SUBRESOURCE_DATA {
            pSysMem: data.as_ptr().cast(),
            SysMemPitch: 0,
            SysMemSlicePitch: 0,
        });

        let mut buffer = None;
        unsafe {
            self.device.CreateBuffer(
                &native_desc,
                subresource
                    .as_ref()
                    .map(|data| data as *const D3D11_SUBRESOURCE_DATA),
                Some(&mut buffer),
            )
        }
        .map_err(api_error("CreateBuffer"))?;
        Ok(GpuBuffer::D3d11(created(buffer, "CreateBuffer")?))
    }

    fn create_vertex_shader(&self, bytecode: &ShaderBytecode) -> GraphicsResult<VertexShader> {
        let mut shader = None;
        unsafe {
            self.device.CreateVertexShader(
                bytecode.as_bytes(),
                None::<&ID3D11ClassLinkage>,
                Some(&mut shader),
            )
        }
        .map_err(api_error("CreateVertexShader"))?;
        Ok(VertexShader::D3d11(created(shader, "CreateVertexShader")?))
    }

    fn create_hull_shader(&self, bytecode: &ShaderBytecode) -> GraphicsResult<HullShader> {
        let mut shader = None;
        unsafe {
            self.device.CreateHullShader(
                bytecode.as_bytes(),
                None::<&ID3D11ClassLinkage>,
                Some(&mut shader),
            )
        }
        .map_err(api_error("CreateHullShader"))?;
        Ok(HullShader::D3d11(created(shader, "CreateHullShader")?))
    }

    fn create_geometry_shader(
        &self,
        bytecode: &ShaderBytecode,
    ) -> GraphicsResult<GeometryShader> {
        let mut shader = None;
        unsafe {
            self.device.CreateGeometryShader(
                bytecode.as_bytes(),
                None::<&ID3D11ClassLinkage>,
                Some(&mut shader),
            )
        }
        .map_err(api_error("CreateGeometryShader"))?;
        Ok(GeometryShader::D3d11(created(
            shader,
            "CreateGeometryShader",
        )?))
    }

    fn create_pixel_shader(&self, bytecode: &ShaderBytecode) -> GraphicsResult<PixelShader> {
        let mut shader = None;
        unsafe {
            self.device.CreatePixelShader(
                bytecode.as_bytes(),
                None::<&ID3D11ClassLinkage>,
                Some(&mut shader),
            )
        }
        .map_err(api_error("CreatePixelShader"))?;
        Ok(PixelShader::D3d11(created(shader, "CreatePixelShader")?))
    }

    fn create_input_layout(
        &self,
        elements: &[InputElementDescriptor],
        vertex_bytecode: &ShaderBytecode,
    ) -> GraphicsResult<GpuInputLayout> {
        // Semantic names must outlive the call.
        let names = elements
            .iter()
            .map(|element| c_string(element.semantic_name))
            .collect::<GraphicsResult<Vec<_>>>()?;
        let native_elements: Vec<D3D11_INPUT_ELEMENT_DESC> = elements
            .iter()
            .zip(&names)
            .map(|(element, name)| D3D11_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(name.as_ptr().cast()),
                SemanticIndex: element.semantic_index,
                Format: Self::convert_vertex_format(element.format),
                InputSlot: element.input_slot,
                AlignedByteOffset: element.aligned_byte_offset,
                InputSlotClass: if element.per_instance {
                    D3D11_INPUT_PER_INSTANCE_DATA
                } else {
                    D3D11_INPUT_PER_VERTEX_DATA
                },
                InstanceDataStepRate: element.instance_data_step_rate,
            })
            .collect();

        let mut layout = None;
        unsafe {
            self.device.CreateInputLayout(
                &native_elements,
                vertex_bytecode.as_bytes(),
                Some(&mut layout),
            )
        }
        .map_err(api_error("CreateInputLayout"))?;
        Ok(GpuInputLayout::D3d11(created(layout, "CreateInputLayout")?))
    }

    fn compile_shader(
        &self,
        path: &Path,
        options: &ShaderCompileOptions,
    ) -> GraphicsResult<ShaderBytecode> {
        let entry_point = c_string(&options.entry_point)?;
        let profile = c_string(options.profile)?;
        let define_strings = options
            .defines
            .iter()
            .map(|(name, value)| Ok((c_string(name)?, c_string(value)?)))
            .collect::<GraphicsResult<Vec<_>>>()?;
        // Null-terminated macro list.
        let mut defines: Vec<D3D_SHADER_MACRO> = define_strings
            .iter()
            .map(|(name, value)| D3D_SHADER_MACRO {
                Name: PCSTR(name.as_ptr().cast()),
                Definition: PCSTR(value.as_ptr().cast()),
            })
            .collect();
        defines.push(D3D_SHADER_MACRO {
            Name: PCSTR::null(),
            Definition: PCSTR::null(),
        });

        let mut flags = 0;
        if options.strict {
            flags |= D3DCOMPILE_ENABLE_STRICTNESS;
        }
        if options.debug {
            flags |= D3DCOMPILE_DEBUG;
        }

        // SAFETY: the compiler recognizes the sentinel and never calls through
        // it. ManuallyDrop keeps it from being released.
        let standard_include = ManuallyDrop::new(unsafe {
            ID3DInclude::from_raw(STANDARD_FILE_INCLUDE as *mut c_void)
        });
        let include = options.include_standard.then_some(&*standard_include);

        let file_name = HSTRING::from(path.as_os_str());
        let mut code: Option<ID3DBlob> = None;
        let mut errors: Option<ID3DBlob> = None;
        let result = unsafe {
            D3DCompileFromFile(
                &file_name,
                Some(defines.as_ptr()),
                include,
                PCSTR(entry_point.as_ptr().cast()),
                PCSTR(profile.as_ptr().cast()),
                flags,
                0,
                &mut code,
                Some(&mut errors),
            )
        };

        if let Err(err) = result {
            let message = errors
                .as_ref()
                .map(blob_text)
                .unwrap_or_else(|| err.to_string());
            log::error!("Shader compilation failed for {:?}: {}", path, message);
            return Err(GraphicsError::ShaderCompilation {
                path: path.to_path_buf(),
                message,
            });
        }
        if let Some(warnings) = errors.as_ref().map(blob_text) {
            if !warnings.is_empty() {
                log::warn!("Shader {:?}: {}", path, warnings);
            }
        }

        let code = created(code, "D3DCompileFromFile")?;
        // SAFETY: the blob owns GetBufferSize() bytes at GetBufferPointer().
        let bytes = unsafe {
            std::slice::from_raw_parts(code.GetBufferPointer() as *const u8, code.GetBufferSize())
        };
        Ok(ShaderBytecode::new(bytes))
    }
}

impl GpuContext for D3d11Device {
    fn update_subresource(&self, buffer: &GpuBuffer, data: &[u8]) {
        if let Some(buffer) = native_or_skip(buffer.as_d3d11(), "UpdateSubresource") {
            // With a null box the whole buffer is read from `data`.
            let mut desc = D3D11_BUFFER_DESC::default();
            unsafe { buffer.GetDesc(&mut desc) };
            if desc.ByteWidth as usize != data.len() {
                log::warn!(
                    "UpdateSubresource: skipping {} bytes for a {}-byte buffer",
                    data.len(),
                    desc.ByteWidth
                );
                return;
            }
            unsafe {
                self.context
                    .UpdateSubresource(buffer, 0, None, data.as_ptr().cast(), 0, 0)
            };
        }
    }

    fn set_vertex_buffer(&self, buffer: &GpuBuffer, binding: VertexBufferBinding) {
        if let Some(buffer) = native_or_skip(buffer.as_d3d11(), "IASetVertexBuffers") {
            let buffers = [Some(buffer.clone())];
            unsafe {
                self.context.IASetVertexBuffers(
                    binding.slot,
                    1,
                    Some(buffers.as_ptr()),
                    Some(&binding.stride as *const u32),
                    Some(&binding.offset as *const u32),
                )
            };
        }
    }

    fn set_index_buffer(&self, buffer: &GpuBuffer, format: IndexFormat, offset: u32) {
        if let Some(buffer) = native_or_skip(buffer.as_d3d11(), "IASetIndexBuffer") {
            unsafe {
                self.context
                    .IASetIndexBuffer(buffer, Self::convert_index_format(format), offset)
            };
        }
    }

    fn set_primitive_topology(&self, topology: PrimitiveTopology) {
        unsafe {
            self.context
                .IASetPrimitiveTopology(Self::convert_topology(topology))
        };
    }

    fn set_input_layout(&self, layout: &GpuInputLayout) {
        if let Some(layout) = native_or_skip(layout.as_d3d11(), "IASetInputLayout") {
            unsafe { self.context.IASetInputLayout(layout) };
        }
    }

    fn set_vertex_shader(&self, shader: &VertexShader) {
        if let Some(shader) = native_or_skip(shader.as_d3d11(), "VSSetShader") {
            unsafe { self.context.VSSetShader(shader, None) };
        }
    }

    fn set_pixel_shader(&self, shader: &PixelShader) {
        if let Some(shader) = native_or_skip(shader.as_d3d11(), "PSSetShader") {
            unsafe { self.context.PSSetShader(shader, None) };
        }
    }

    fn set_render_targets(
        &self,
        render_targets: &[&GpuRenderTargetView],
        depth_stencil: Option<&GpuDepthStencilView>,
    ) {
        let views: Vec<Option<ID3D11RenderTargetView>> = render_targets
            .iter()
            .filter_map(|view| native_or_skip(view.as_d3d11(), "OMSetRenderTargets"))
            .map(|view| Some(view.clone()))
            .collect();
        let depth_stencil = depth_stencil.and_then(GpuDepthStencilView::as_d3d11);
        unsafe { self.context.OMSetRenderTargets(Some(views.as_slice()), depth_stencil) };
    }

    fn set_depth_stencil_state(&self, state: &GpuDepthStencilState, stencil_ref: u32) {
        if let Some(state) = native_or_skip(state.as_d3d11(), "OMSetDepthStencilState") {
            unsafe { self.context.OMSetDepthStencilState(state, stencil_ref) };
        }
    }

    fn set_rasterizer_state(&self, state: &GpuRasterizerState) {
        if let Some(state) = native_or_skip(state.as_d3d11(), "RSSetState") {
            unsafe { self.context.RSSetState(state) };
        }
    }

    fn draw_indexed(&self, index_count: u32, start_index: u32, base_vertex: i32) {
        unsafe {
            self.context
                .DrawIndexed(index_count, start_index, base_vertex)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stencil_ops_map_to_native() {
        assert_eq!(
            D3d11Device::convert_stencil_op(StencilOperation::IncrementWrap),
            D3D11_STENCIL_OP_INCR
        );
        assert_eq!(
            D3d11Device::convert_stencil_op(StencilOperation::DecrementWrap),
            D3D11_STENCIL_OP_DECR
        );
        assert_eq!(
            D3d11Device::convert_stencil_op(StencilOperation::IncrementClamp),
            D3D11_STENCIL_OP_INCR_SAT
        );
    }

    #[test]
    fn test_formats_map_to_native() {
        assert_eq!(
            D3d11Device::convert_format(TextureFormat::Depth24UnormStencil8),
            DXGI_FORMAT_D24_UNORM_S8_UINT
        );
        assert_eq!(
            D3d11Device::convert_vertex_format(VertexFormat::Float32x3),
            DXGI_FORMAT_R32G32B32_FLOAT
        );
        assert_eq!(
            D3d11Device::convert_index_format(IndexFormat::Uint16),
            DXGI_FORMAT_R16_UINT
        );
    }

    #[test]
    fn test_bind_flags_match_native_bits() {
        assert_eq!(
            BindFlags::DEPTH_STENCIL.bits(),
            D3D11_BIND_DEPTH_STENCIL.0 as u32
        );
        assert_eq!(
            BindFlags::VERTEX_BUFFER.bits(),
            D3D11_BIND_VERTEX_BUFFER.0 as u32
        );
        assert_eq!(
            BindFlags::CONSTANT_BUFFER.bits(),
            D3D11_BIND_CONSTANT_BUFFER.0 as u32
        );
        assert_eq!(CpuAccessFlags::WRITE.bits(), D3D11_CPU_ACCESS_WRITE.0 as u32);
    }

    #[test]
    fn test_rejects_non_win32_window() {
        use raw_window_handle::WebWindowHandle;

        let err = D3d11Device::output_window(RawWindowHandle::Web(WebWindowHandle::new(1)))
            .unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
    }
}
