//! Resource management
//!
//! Handles the device resources shared by renderers, shader loading and the
//! active shader set, vertex layout and materials.

mod device_resources;
mod material;
mod shader;
mod vertex;

pub use device_resources::*;
pub use material::*;
pub use shader::*;
pub use vertex::*;
