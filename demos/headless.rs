//! Headless renderer demo
//!
//! Runs the full initialize / render sequence on the dummy backend and
//! prints the GPU calls it would have made.
//!
//! ```bash
//! cargo run --example headless -- --mode windowed --frames 3
//! RUST_LOG=trace cargo run --example headless
//! ```

use std::num::NonZeroIsize;
use std::rc::Rc;

use clap::Parser;
use glam::Vec4;
use nshade::backend::dummy::DummyDevice;
use nshade::resources::MemoryBytecodeLoader;
use nshade::{
    DeviceResources, GraphicsError, GraphicsResult, Material, PresentationMode, Renderer,
    RendererConfig, VertexPositionColor,
};
use raw_window_handle::{RawWindowHandle, Win32WindowHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum CliMode {
    /// Present through a (simulated) swap chain
    Windowed,
    /// Draw the scene buffers without presenting
    #[default]
    Offscreen,
}

impl From<CliMode> for PresentationMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Windowed => PresentationMode::Windowed,
            CliMode::Offscreen => PresentationMode::Offscreen,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "headless", version, about = "Drive the renderer on the dummy backend")]
struct Args {
    /// Presentation mode
    #[arg(long, default_value = "offscreen", value_enum)]
    mode: CliMode,

    /// Screen width in pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Screen height in pixels
    #[arg(long, default_value = "720")]
    height: u32,

    /// Number of frames to render
    #[arg(long, default_value = "1")]
    frames: u32,

    /// Multisample count for the swap chain
    #[arg(long, default_value = "1")]
    samples: u32,

    /// Make the swap chain call fail to show error propagation
    #[arg(long)]
    fail_swap_chain: bool,
}

fn main() -> GraphicsResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("nshade {} headless demo", nshade::VERSION);

    let device = DummyDevice::new();
    if args.fail_swap_chain {
        device.fail_call("CreateSwapChain");
    }

    let hwnd = NonZeroIsize::new(1).ok_or_else(|| {
        GraphicsError::InvalidParameter("window handle must be non-zero".into())
    })?;
    let resources = DeviceResources::new(
        Rc::new(device.clone()),
        Rc::new(device.clone()),
        args.width,
        args.height,
    )?
    .with_samples_count(args.samples)
    .with_window(RawWindowHandle::Win32(Win32WindowHandle::new(hwnd)));
    let resources = Rc::new(resources);

    let vertices = [
        VertexPositionColor::new([0.0, 0.5, 0.0], [1.0, 0.0, 0.0]),
        VertexPositionColor::new([0.5, -0.5, 0.0], [0.0, 1.0, 0.0]),
        VertexPositionColor::new([-0.5, -0.5, 0.0], [0.0, 0.0, 1.0]),
    ];
    resources.upload_geometry(&vertices, &[0, 1, 2])?;
    let material = Material::new()
        .with_color(Vec4::new(1.0, 0.5, 0.25, 1.0))
        .with_specular_power(16.0);
    resources.create_constant_buffer(&material.constants())?;

    let config = RendererConfig::default();
    let loader = MemoryBytecodeLoader::new()
        .with_file(&config.standard_vertex_shader, b"standard vs".to_vec())
        .with_file(&config.standard_pixel_shader, b"standard ps".to_vec());
    let mut renderer =
        Renderer::new(Rc::clone(&resources), args.mode.into(), config).with_loader(loader);

    if let Err(err) = renderer.initialize() {
        print_calls(&device);
        return Err(err);
    }
    for _ in 0..args.frames {
        renderer.render()?;
    }

    print_calls(&device);
    println!("Live GPU objects: {}", device.live_objects());
    Ok(())
}

fn print_calls(device: &DummyDevice) {
    println!("Recorded {} calls:", device.calls().len());
    for (index, name) in device.call_names().iter().enumerate() {
        println!("  {:>3}  {}", index, name);
    }
}
