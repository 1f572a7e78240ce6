//! dynfont demo: draws a CJK paragraph through a dynamic glyph atlas.
//!
//! Uses `winit` 0.30 for windowing and input and `dynfont-render` for
//! GPU rendering.
//!
//! Controls: drag with the middle or right mouse button to pan, scroll
//! to zoom, `+`/`-` to change the font size, `C` to clear the atlas,
//! `A` to toggle the atlas preview, `Esc` to quit.

mod state;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

use dynfont_render::{GpuContext, RenderError};
use dynfont_text::{DynamicFont, FontConfig};
use state::DemoState;

#[derive(Parser, Debug)]
#[command(name = "dynfont-demo", about = "Render CJK text through a dynamic glyph atlas")]
struct Args {
    /// TrueType/OpenType font file.
    font: PathBuf,

    /// Atlas width and height in pixels.
    #[arg(long)]
    atlas_size: Option<u32>,

    /// Font size in points.
    #[arg(long)]
    font_size: Option<f32>,

    /// JSON file with a full font configuration.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    /// Config file first, then command-line overrides.
    fn font_config(&self) -> Result<FontConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => FontConfig::from_json(&std::fs::read_to_string(path)?)?,
            None => FontConfig {
                atlas_size: 2048,
                ..FontConfig::default()
            },
        };
        if let Some(size) = self.atlas_size {
            config.atlas_size = size;
        }
        if let Some(points) = self.font_size {
            config.font_size = points;
        }
        Ok(config)
    }
}

/// Winit 0.30 application handler.
struct App {
    window: Option<Arc<Window>>,
    /// Loaded before the event loop; moved into `state` on first resume.
    font: Option<DynamicFont>,
    state: Option<DemoState>,
    // Mouse tracking for pan gestures.
    mouse_pressed: bool,
    last_mouse: (f64, f64),
    frame_count: u64,
}

impl App {
    fn new(font: DynamicFont) -> Self {
        Self {
            window: None,
            font: Some(font),
            state: None,
            mouse_pressed: false,
            last_mouse: (0.0, 0.0),
            frame_count: 0,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(font) = self.font.take() else {
            return; // Already initialized.
        };

        let attrs = WindowAttributes::default()
            .with_title("dynfont demo")
            .with_inner_size(LogicalSize::new(800, 600));

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("Failed to create window"),
        );

        let size = window.inner_size();
        let gpu = pollster::block_on(GpuContext::new_with_surface(
            window.clone(),
            size.width.max(1),
            size.height.max(1),
        ))
        .expect("Failed to initialize GPU");

        if let Err(e) = gpu.check_atlas_size(font.atlas().size()) {
            error!("{e}");
            event_loop.exit();
            return;
        }

        let demo = DemoState::new(gpu, font, size.width.max(1), size.height.max(1));
        info!(
            "Demo initialized: {}×{}, GPU: {:?}",
            size.width,
            size.height,
            demo.gpu.adapter.get_info().name
        );

        window.request_redraw();
        self.state = Some(demo);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(window), Some(state)) = (self.window.as_ref(), self.state.as_mut()) else {
            return;
        };

        match event {
            // ── Close / keys ────────────────────────────────────
            WindowEvent::CloseRequested => {
                info!("Window closed after {} frames", self.frame_count);
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed =>
            {
                match event.logical_key.as_ref() {
                    Key::Named(NamedKey::Escape) => event_loop.exit(),
                    Key::Character("+" | "=") => state.adjust_font_size(2.0),
                    Key::Character("-") => state.adjust_font_size(-2.0),
                    Key::Character("c" | "C") => state.clear_atlas(),
                    Key::Character("a" | "A") => state.show_atlas = !state.show_atlas,
                    _ => {}
                }
            }

            WindowEvent::Resized(new_size) => {
                state.resize(new_size.width, new_size.height);
                window.request_redraw();
            }

            // ── Mouse: drag to pan, scroll to zoom ──────────────
            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => {
                if self.mouse_pressed {
                    let dx = x - self.last_mouse.0;
                    let dy = y - self.last_mouse.1;
                    state.camera.pan(dx as f32, dy as f32);
                }
                self.last_mouse = (x, y);
            }
            WindowEvent::MouseInput { state: btn_state, button, .. } => {
                if matches!(button, MouseButton::Middle | MouseButton::Right) {
                    self.mouse_pressed = btn_state == ElementState::Pressed;
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                state.camera.zoom_at(
                    self.last_mouse.0 as f32,
                    self.last_mouse.1 as f32,
                    1.1f32.powf(dy),
                );
            }

            // ── Redraw ──────────────────────────────────────────
            WindowEvent::RedrawRequested => {
                match state.render_frame() {
                    Ok(stats) => {
                        self.frame_count += 1;
                        if self.frame_count % 300 == 0 {
                            let atlas = state.atlas_stats();
                            info!(
                                "Frame {}: {} glyphs, {} draw call(s), {} atlas upload(s); \
                                 atlas {} resident, {} evicted, {} reset(s)",
                                self.frame_count,
                                stats.glyph_count,
                                stats.draw_calls,
                                stats.atlas_uploads,
                                atlas.resident,
                                atlas.evictions,
                                atlas.hard_resets
                            );
                        }
                    }
                    Err(RenderError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        let size = window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => error!("Render error: {e}"),
                }
                // Redraw continuously, no fixed time step.
                window.request_redraw();
            }

            _ => {}
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let font = match args
        .font_config()
        .and_then(|config| Ok(DynamicFont::from_path(&args.font, config)?))
    {
        Ok(font) => font,
        Err(e) => {
            error!("Failed to load {}: {e}", args.font.display());
            std::process::exit(1);
        }
    };
    info!("Loaded {}", args.font.display());

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(font);
    event_loop.run_app(&mut app).expect("Event loop error");
}
