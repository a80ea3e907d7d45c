//! Device, context and per-scene GPU data shared by renderers

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use bytemuck::Pod;
use raw_window_handle::RawWindowHandle;

use crate::backend::{BufferDescriptor, GpuBuffer, GpuContext, GpuDevice};
use crate::error::{GraphicsError, GraphicsResult};

use super::shader::ShaderSet;
use super::vertex::VertexPositionColor;

/// Vertex and index buffers for the offscreen draw
#[derive(Debug)]
pub struct GeometryBuffers {
    pub vertex_buffer: GpuBuffer,
    /// 16-bit indices
    pub index_buffer: GpuBuffer,
    pub index_count: u32,
}

/// A constant buffer and the CPU-side copy uploaded to it every frame.
///
/// Built only by [`DeviceResources::create_constant_buffer`]; `data` always
/// holds exactly the byte width the buffer was created with.
#[derive(Debug)]
pub struct ConstantBuffer {
    buffer: GpuBuffer,
    data: Vec<u8>,
}

impl ConstantBuffer {
    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// The execution context renderers draw with.
///
/// Owns the device and immediate context supplied by the caller, the screen
/// and window configuration, the scene buffers and the active [`ShaderSet`].
/// Renderers hold it through an `Rc` and only read it, except for the shader
/// set which is mutated through [`DeviceResources::shaders_mut`].
///
/// Single-threaded: nothing here is `Send`, and the caller must not hold a
/// [`DeviceResources::shaders_mut`] guard across renderer calls.
pub struct DeviceResources {
    device: Rc<dyn GpuDevice>,
    context: Rc<dyn GpuContext>,
    screen_width: u32,
    screen_height: u32,
    samples_count: u32,
    window_handle: Option<RawWindowHandle>,
    full_screen: bool,
    shaders: RefCell<ShaderSet>,
    geometry: RefCell<Option<GeometryBuffers>>,
    constants: RefCell<Option<ConstantBuffer>>,
}

impl DeviceResources {
    /// Wrap an existing device and context for a screen of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] if either dimension is zero.
    pub fn new(
        device: Rc<dyn GpuDevice>,
        context: Rc<dyn GpuContext>,
        screen_width: u32,
        screen_height: u32,
    ) -> GraphicsResult<Self> {
        if screen_width == 0 || screen_height == 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "screen size must be non-zero, got {screen_width}x{screen_height}"
            )));
        }

        log::debug!(
            "Creating DeviceResources on {} backend ({}x{})",
            device.name(),
            screen_width,
            screen_height
        );

        Ok(Self {
            device,
            context,
            screen_width,
            screen_height,
            samples_count: 1,
            window_handle: None,
            full_screen: false,
            shaders: RefCell::new(ShaderSet::new()),
            geometry: RefCell::new(None),
            constants: RefCell::new(None),
        })
    }

    /// Set the multisample count used for the swap chain.
    pub fn with_samples_count(mut self, samples_count: u32) -> Self {
        self.samples_count = samples_count.max(1);
        self
    }

    /// Set the window the swap chain presents to.
    pub fn with_window(mut self, window_handle: RawWindowHandle) -> Self {
        self.window_handle = Some(window_handle);
        self
    }

    pub fn with_full_screen(mut self, full_screen: bool) -> Self {
        self.full_screen = full_screen;
        self
    }

    pub fn device(&self) -> &dyn GpuDevice {
        self.device.as_ref()
    }

    pub fn context(&self) -> &dyn GpuContext {
        self.context.as_ref()
    }

    pub fn screen_width(&self) -> u32 {
        self.screen_width
    }

    pub fn screen_height(&self) -> u32 {
        self.screen_height
    }

    pub fn samples_count(&self) -> u32 {
        self.samples_count
    }

    pub fn window_handle(&self) -> Option<RawWindowHandle> {
        self.window_handle
    }

    pub fn full_screen(&self) -> bool {
        self.full_screen
    }

    /// Read access to the active shader set.
    pub fn shaders(&self) -> Ref<'_, ShaderSet> {
        self.shaders.borrow()
    }

    /// Write access to the active shader set.
    pub fn shaders_mut(&self) -> RefMut<'_, ShaderSet> {
        self.shaders.borrow_mut()
    }

    pub fn geometry(&self) -> Ref<'_, Option<GeometryBuffers>> {
        self.geometry.borrow()
    }

    pub fn set_geometry(&self, geometry: GeometryBuffers) {
        *self.geometry.borrow_mut() = Some(geometry);
    }

    /// Create vertex and index buffers from `vertices` / `indices` and make
    /// them the geometry drawn by the offscreen path.
    ///
    /// Empty input is rejected with [`GraphicsError::InvalidParameter`]
    /// before any buffer is created.
    pub fn upload_geometry(
        &self,
        vertices: &[VertexPositionColor],
        indices: &[u16],
    ) -> GraphicsResult<()> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(GraphicsError::InvalidParameter(format!(
                "geometry needs vertices and indices, got {} and {}",
                vertices.len(),
                indices.len()
            )));
        }
        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(indices);

        let vertex_buffer = self.device.create_buffer(
            &BufferDescriptor::vertex(byte_width(vertex_bytes)?),
            Some(vertex_bytes),
        )?;
        let index_buffer = self.device.create_buffer(
            &BufferDescriptor::index(byte_width(index_bytes)?),
            Some(index_bytes),
        )?;
        let index_count = u32::try_from(indices.len()).map_err(|_| {
            GraphicsError::InvalidParameter(format!("too many indices: {}", indices.len()))
        })?;

        log::debug!(
            "Uploaded geometry: {} vertices, {} indices",
            vertices.len(),
            index_count
        );
        self.set_geometry(GeometryBuffers {
            vertex_buffer,
            index_buffer,
            index_count,
        });
        Ok(())
    }

    pub fn constant_buffer(&self) -> Ref<'_, Option<ConstantBuffer>> {
        self.constants.borrow()
    }

    /// Create a constant buffer sized for `T` and seed its CPU-side data with `value`.
    pub fn create_constant_buffer<T: Pod>(&self, value: &T) -> GraphicsResult<()> {
        let data = bytemuck::bytes_of(value).to_vec();
        let buffer = self
            .device
            .create_buffer(&BufferDescriptor::constant(byte_width(&data)?), Some(&data))?;
        *self.constants.borrow_mut() = Some(ConstantBuffer { buffer, data });
        Ok(())
    }

    /// Replace the CPU-side constant data uploaded on the next offscreen draw.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::MissingResource`] if no constant buffer was
    /// created and [`GraphicsError::InvalidParameter`] if `T` does not have the
    /// size the buffer was created with.
    pub fn update_constants<T: Pod>(&self, value: &T) -> GraphicsResult<()> {
        let mut constants = self.constants.borrow_mut();
        let constants = constants
            .as_mut()
            .ok_or(GraphicsError::MissingResource("constant buffer"))?;
        let bytes = bytemuck::bytes_of(value);
        if bytes.len() != constants.data.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "constant data is {} bytes, buffer holds {}",
                bytes.len(),
                constants.data.len()
            )));
        }
        constants.data.copy_from_slice(bytes);
        Ok(())
    }
}

impl std::fmt::Debug for DeviceResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceResources")
            .field("backend", &self.device.name())
            .field("screen_width", &self.screen_width)
            .field("screen_height", &self.screen_height)
            .field("samples_count", &self.samples_count)
            .field("window_handle", &self.window_handle)
            .field("full_screen", &self.full_screen)
            .finish_non_exhaustive()
    }
}

fn byte_width(bytes: &[u8]) -> GraphicsResult<u32> {
    u32::try_from(bytes.len())
        .map_err(|_| GraphicsError::InvalidParameter(format!("buffer too large: {} bytes", bytes.len())))
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::backend::dummy::{DeviceCall, DummyDevice};
    use crate::backend::BindFlags;

    fn resources(device: &DummyDevice) -> DeviceResources {
        DeviceResources::new(Rc::new(device.clone()), Rc::new(device.clone()), 800, 600)
            .unwrap()
    }

    #[test]
    fn test_rejects_zero_size() {
        let device = DummyDevice::new();
        let err =
            DeviceResources::new(Rc::new(device.clone()), Rc::new(device), 0, 600).unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
    }

    #[test]
    fn test_defaults() {
        let device = DummyDevice::new();
        let resources = resources(&device).with_samples_count(0);
        assert_eq!(resources.screen_width(), 800);
        assert_eq!(resources.screen_height(), 600);
        assert_eq!(resources.samples_count(), 1);
        assert!(resources.window_handle().is_none());
        assert!(!resources.full_screen());
        assert!(resources.shaders().is_empty());
        assert!(resources.geometry().is_none());
    }

    #[test]
    fn test_upload_geometry() {
        let device = DummyDevice::new();
        let resources = resources(&device);
        let vertices = [VertexPositionColor::new([0.0; 3], [1.0; 3]); 3];

        resources.upload_geometry(&vertices, &[0, 1, 2]).unwrap();

        assert_eq!(resources.geometry().as_ref().unwrap().index_count, 3);
        let calls = device.calls();
        assert_eq!(
            calls[0],
            DeviceCall::CreateBuffer {
                desc: BufferDescriptor::new(72, BindFlags::VERTEX_BUFFER),
                initialized: true,
            }
        );
        assert_eq!(
            calls[1],
            DeviceCall::CreateBuffer {
                desc: BufferDescriptor::new(6, BindFlags::INDEX_BUFFER),
                initialized: true,
            }
        );
    }

    #[test]
    fn test_update_constants_requires_buffer() {
        let device = DummyDevice::new();
        let resources = resources(&device);
        assert_eq!(
            resources.update_constants(&[1.0f32; 4]).unwrap_err(),
            GraphicsError::MissingResource("constant buffer")
        );

        resources.create_constant_buffer(&[0.0f32; 4]).unwrap();
        resources.update_constants(&[2.0f32; 4]).unwrap();
        let constants = resources.constant_buffer();
        let data: &[f32] = bytemuck::cast_slice(constants.as_ref().unwrap().data());
        assert_eq!(data, &[2.0; 4]);
    }

    #[test]
    fn test_update_constants_rejects_size_mismatch() {
        let device = DummyDevice::new();
        let resources = resources(&device);
        resources.create_constant_buffer(&[0.0f32; 8]).unwrap();

        for err in [
            resources.update_constants(&1.0f32).unwrap_err(),
            resources.update_constants(&[1.0f32; 16]).unwrap_err(),
        ] {
            assert!(matches!(err, GraphicsError::InvalidParameter(_)));
        }

        let constants = resources.constant_buffer();
        let data: &[f32] = bytemuck::cast_slice(constants.as_ref().unwrap().data());
        assert_eq!(data, &[0.0; 8]);
    }

    #[test]
    fn test_upload_geometry_rejects_empty_input() {
        let device = DummyDevice::new();
        let resources = resources(&device);
        let vertices = [VertexPositionColor::new([0.0; 3], [1.0; 3]); 3];

        for (vertices, indices) in [(&vertices[..], &[][..]), (&[][..], &[0u16, 1, 2][..])] {
            let err = resources.upload_geometry(vertices, indices).unwrap_err();
            assert!(matches!(err, GraphicsError::InvalidParameter(_)));
        }
        assert!(resources.geometry().is_none());
        assert!(device.calls().is_empty());
    }
}
