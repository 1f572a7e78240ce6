//! GPU context: device, queue, and the optional window surface.
//!
//! `new_headless` backs the renderer tests and `render_to_texture`;
//! `new_with_surface` backs the demo window. Both share one adapter and
//! device request, and both can check a font's atlas against the
//! device's texture limit before the renderer allocates it.

use log::info;
use thiserror::Error;
use wgpu::{
    Adapter, CompositeAlphaMode, Device, DeviceDescriptor, Instance, InstanceDescriptor,
    PowerPreference, PresentMode, Queue, RequestAdapterOptions, Surface, SurfaceCapabilities,
    SurfaceConfiguration, TextureFormat, TextureUsages,
};

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Atlas size {size} exceeds the device texture limit of {max}")]
    AtlasTooLarge { size: u32, max: u32 },
}

/// Format used when there is no surface to ask.
const HEADLESS_FORMAT: TextureFormat = TextureFormat::Bgra8UnormSrgb;

pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    pub adapter: Adapter,
    /// Present only when rendering to a window.
    pub surface: Option<Surface<'static>>,
    pub surface_config: Option<SurfaceConfiguration>,
    pub surface_format: TextureFormat,
}

async fn connect(
    instance: &Instance,
    surface: Option<&Surface<'_>>,
    label: &str,
) -> Result<(Adapter, Device, Queue), GpuError> {
    let adapter = instance
        .request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::NoAdapter)?;
    let descriptor = DeviceDescriptor {
        label: Some(label),
        ..Default::default()
    };
    let (device, queue) = adapter.request_device(&descriptor, None).await?;
    Ok((adapter, device, queue))
}

/// First sRGB format, else the first format offered.
fn pick_format(caps: &SurfaceCapabilities) -> Result<TextureFormat, GpuError> {
    caps.formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| caps.formats.first())
        .copied()
        .ok_or_else(|| GpuError::Surface("surface reports no supported formats".into()))
}

/// Premultiplied when offered, else the first mode offered.
fn pick_alpha_mode(caps: &SurfaceCapabilities) -> CompositeAlphaMode {
    if caps.alpha_modes.contains(&CompositeAlphaMode::PreMultiplied) {
        CompositeAlphaMode::PreMultiplied
    } else {
        caps.alpha_modes.first().copied().unwrap_or(CompositeAlphaMode::Auto)
    }
}

impl GpuContext {
    /// Off-screen context for tests and texture targets.
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::new(&InstanceDescriptor::default());
        let (adapter, device, queue) = connect(&instance, None, "dynfont-headless").await?;
        Ok(Self {
            device,
            queue,
            adapter,
            surface: None,
            surface_config: None,
            surface_format: HEADLESS_FORMAT,
        })
    }

    /// Context presenting to `window`, configured at `width × height`.
    pub async fn new_with_surface<W>(window: W, width: u32, height: u32) -> Result<Self, GpuError>
    where
        W: wgpu::WasmNotSendSync + Into<wgpu::SurfaceTarget<'static>>,
    {
        let instance = Instance::new(&InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::Surface(e.to_string()))?;
        let (adapter, device, queue) =
            connect(&instance, Some(&surface), "dynfont-windowed").await?;

        let caps = surface.get_capabilities(&adapter);
        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: pick_format(&caps)?,
            width,
            height,
            present_mode: PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: pick_alpha_mode(&caps),
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        info!(
            "Surface configured: {width}×{height} {:?} ({:?}) on {}",
            config.format,
            config.alpha_mode,
            adapter.get_info().name
        );

        Ok(Self {
            device,
            queue,
            adapter,
            surface_format: config.format,
            surface: Some(surface),
            surface_config: Some(config),
        })
    }

    /// Reconfigure the surface. Ignored when headless or for a zero size.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (Some(surface), Some(config)) = (&self.surface, &mut self.surface_config) else {
            return;
        };
        if width == 0 || height == 0 {
            return;
        }
        config.width = width;
        config.height = height;
        surface.configure(&self.device, config);
    }

    /// `(0, 0)` when headless.
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_config
            .as_ref()
            .map_or((0, 0), |c| (c.width, c.height))
    }

    /// Largest square atlas texture this device can hold.
    pub fn max_atlas_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Fail early when a font's atlas cannot be mirrored on this device.
    pub fn check_atlas_size(&self, size: u32) -> Result<(), GpuError> {
        let max = self.max_atlas_size();
        if size > max {
            return Err(GpuError::AtlasTooLarge { size, max });
        }
        Ok(())
    }
}

// ===================================================================
// Tests
// ===================================================================
