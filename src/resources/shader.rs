//! Shader bytecode loading and the active shader set

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::backend::{
    GeometryShader, HullShader, PixelShader, ShaderBytecode, ShaderStage, VertexShader,
};
use crate::error::{GraphicsError, GraphicsResult};

/// Reads compiled shader binaries from storage.
pub trait ShaderBytecodeLoader {
    /// Read the whole file at `path`.
    ///
    /// Fails with [`GraphicsError::ShaderBytecodeRead`] if the file is missing
    /// or unreadable.
    fn read_file_bytes(&self, path: &Path) -> GraphicsResult<ShaderBytecode>;
}

/// Loads bytecode from the filesystem, relative to an optional root directory.
#[derive(Debug, Clone, Default)]
pub struct FileBytecodeLoader {
    root: Option<PathBuf>,
}

impl FileBytecodeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ShaderBytecodeLoader for FileBytecodeLoader {
    fn read_file_bytes(&self, path: &Path) -> GraphicsResult<ShaderBytecode> {
        let resolved = self.resolve(path);
        let bytes = std::fs::read(&resolved).map_err(|err| GraphicsError::ShaderBytecodeRead {
            path: resolved.clone(),
            kind: err.kind(),
        })?;
        log::debug!("Read {} bytes of shader bytecode from {:?}", bytes.len(), resolved);
        Ok(ShaderBytecode::new(bytes))
    }
}

/// Serves bytecode from memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryBytecodeLoader {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryBytecodeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }
}

impl ShaderBytecodeLoader for MemoryBytecodeLoader {
    fn read_file_bytes(&self, path: &Path) -> GraphicsResult<ShaderBytecode> {
        self.files
            .get(path)
            .map(|bytes| ShaderBytecode::new(bytes.clone()))
            .ok_or_else(|| GraphicsError::ShaderBytecodeRead {
                path: path.to_path_buf(),
                kind: std::io::ErrorKind::NotFound,
            })
    }
}

/// A shared handle to a shader of any stage
#[derive(Debug, Clone)]
pub enum ShaderHandle {
    Vertex(Rc<VertexShader>),
    Hull(Rc<HullShader>),
    Geometry(Rc<GeometryShader>),
    Pixel(Rc<PixelShader>),
}

impl ShaderHandle {
    pub fn stage(&self) -> ShaderStage {
        match self {
            ShaderHandle::Vertex(_) => ShaderStage::Vertex,
            ShaderHandle::Hull(_) => ShaderStage::Hull,
            ShaderHandle::Geometry(_) => ShaderStage::Geometry,
            ShaderHandle::Pixel(_) => ShaderStage::Pixel,
        }
    }
}

/// The shaders currently bound for drawing, one optional slot per stage.
///
/// Owned by `DeviceResources`; everything else reaches it through
/// `DeviceResources::shaders` / `DeviceResources::shaders_mut`.
#[derive(Debug, Default)]
pub struct ShaderSet {
    pub vertex: Option<Rc<VertexShader>>,
    pub hull: Option<Rc<HullShader>>,
    pub geometry: Option<Rc<GeometryShader>>,
    pub pixel: Option<Rc<PixelShader>>,
}

impl ShaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `shader` in the slot of its stage, replacing what was there.
    pub fn set(&mut self, shader: ShaderHandle) {
        match shader {
            ShaderHandle::Vertex(shader) => self.vertex = Some(shader),
            ShaderHandle::Hull(shader) => self.hull = Some(shader),
            ShaderHandle::Geometry(shader) => self.geometry = Some(shader),
            ShaderHandle::Pixel(shader) => self.pixel = Some(shader),
        }
    }

    /// Whether a shader is set for `stage`.
    pub fn has(&self, stage: ShaderStage) -> bool {
        match stage {
            ShaderStage::Vertex => self.vertex.is_some(),
            ShaderStage::Hull => self.hull.is_some(),
            ShaderStage::Geometry => self.geometry.is_some(),
            ShaderStage::Pixel => self.pixel.is_some(),
        }
    }

    /// Shared handles to every set shader, in pipeline order.
    pub fn handles(&self) -> Vec<ShaderHandle> {
        let mut handles = Vec::with_capacity(4);
        if let Some(shader) = &self.vertex {
            handles.push(ShaderHandle::Vertex(Rc::clone(shader)));
        }
        if let Some(shader) = &self.hull {
            handles.push(ShaderHandle::Hull(Rc::clone(shader)));
        }
        if let Some(shader) = &self.geometry {
            handles.push(ShaderHandle::Geometry(Rc::clone(shader)));
        }
        if let Some(shader) = &self.pixel {
            handles.push(ShaderHandle::Pixel(Rc::clone(shader)));
        }
        handles
    }

    pub fn is_empty(&self) -> bool {
        self.vertex.is_none() && self.hull.is_none() && self.geometry.is_none() && self.pixel.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyDevice;
    use crate::backend::GpuDevice;

    #[test]
    fn test_memory_loader_missing_file() {
        let loader = MemoryBytecodeLoader::new().with_file("vs.cso", vec![1, 2, 3]);

        assert_eq!(
            loader.read_file_bytes(Path::new("vs.cso")).unwrap().as_bytes(),
            &[1, 2, 3]
        );
        assert_eq!(
            loader.read_file_bytes(Path::new("ps.cso")).unwrap_err(),
            GraphicsError::ShaderBytecodeRead {
                path: PathBuf::from("ps.cso"),
                kind: std::io::ErrorKind::NotFound,
            }
        );
    }

    #[test]
    fn test_file_loader_reads_and_reports_missing() {
        let dir = std::env::temp_dir().join(format!("nshade-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("standard_vs.cso"), [0xDE, 0xAD]).unwrap();

        let loader = FileBytecodeLoader::with_root(&dir);
        let bytecode = loader.read_file_bytes(Path::new("standard_vs.cso")).unwrap();
        assert_eq!(bytecode.as_bytes(), &[0xDE, 0xAD]);

        let err = loader.read_file_bytes(Path::new("missing.cso")).unwrap_err();
        assert_eq!(
            err,
            GraphicsError::ShaderBytecodeRead {
                path: dir.join("missing.cso"),
                kind: std::io::ErrorKind::NotFound,
            }
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_shader_set_slots() {
        let device = DummyDevice::new();
        let bytecode = ShaderBytecode::new(vec![0; 4]);
        let mut set = ShaderSet::new();
        assert!(set.is_empty());

        set.set(ShaderHandle::Pixel(Rc::new(
            device.create_pixel_shader(&bytecode).unwrap(),
        )));
        set.set(ShaderHandle::Vertex(Rc::new(
            device.create_vertex_shader(&bytecode).unwrap(),
        )));

        assert!(set.has(ShaderStage::Vertex));
        assert!(set.has(ShaderStage::Pixel));
        assert!(!set.has(ShaderStage::Hull));
        let stages: Vec<_> = set.handles().iter().map(ShaderHandle::stage).collect();
        assert_eq!(stages, vec![ShaderStage::Vertex, ShaderStage::Pixel]);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(device.live_objects(), 0);
    }
}
