//! Demo state: owns the GPU renderer, the dynamic font, and the camera.
//!
//! Every frame re-lays out the sample paragraph in 30-character lines.
//! Glyphs stay cached in the atlas between frames, so after the first
//! frame a draw only uploads instances unless the atlas changed.

use std::time::Instant;

use dynfont_render::{CameraUniform, FrameStats, GpuContext, GpuSpriteBatch, RenderError, Renderer};
use dynfont_text::{AtlasRect, AtlasStats, DynamicFont, GlyphSprite, SpriteBatch, SpriteEffects};
use log::{debug, error, info};

/// Traditional Chinese filler text, dense in distinct characters.
pub const SAMPLE_TEXT: &str = "又出學持，流發文續統痛進錢著根等金學，師人有作進出先能到教我資的好好票亞不人放生者，流智把速拉速方變我劇過高正、制傷地切不學就那才告識衣香不預。\n\n洋整書，要什和開女子！有使展覺下時收易個，如說例並備國然吃的治內早通我地重已能作個了的神得！中斷藝：變認力我想成節字電取條商地外苦現除其時立也愛公向。花發上終關空部話充觀友才放舉子局生她是，麼又兒心供我變。\n\n土金下心。滿界理防費家西顯不為，於留有四頭易道中作、務樣主眼以她出驗方臺全問就表造點件；絕型極設不性量由多實此東利那知聽當反風，他保麼經？白形盡計界唱不人道別子四快不聽不一以之門選多體個他業來費，西母示老代然裡是聯雖一上環開只一灣滿更你臺得區？像問同照！學難人！商此麗社少市金未發原他北處有民使格酒去！由結化師企出不水：今靈陸直女兒就便萬；質河聞系科急人以們：不中整和票的口去怎子因、部量家告數。後來說輕：表寫動界立然。不遊對多作想美綠我些。變別時沒字集況有在表把客質造。";

/// Characters per drawn line.
pub const LINE_LENGTH: usize = 30;

const TEXT_ORIGIN: [f32; 2] = [30.0, 10.0];
const LINE_SPACING: f32 = 30.0;
const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// On-screen side length of the atlas preview.
const ATLAS_PREVIEW_SIZE: f32 = 256.0;

/// Split `text` into lines of at most `LINE_LENGTH` characters.
pub fn split_lines(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(LINE_LENGTH)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Camera state: pan and zoom for the viewport.
#[derive(Debug, Clone)]
pub struct Camera {
    pub pan_x: f32,
    pub pan_y: f32,
    pub zoom: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
            viewport_width: width,
            viewport_height: height,
        }
    }

    pub fn screen_to_world(&self, screen_x: f32, screen_y: f32) -> (f32, f32) {
        (
            screen_x / self.zoom + self.pan_x,
            screen_y / self.zoom + self.pan_y,
        )
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform::orthographic(
            self.viewport_width,
            self.viewport_height,
            self.pan_x,
            self.pan_y,
            self.zoom,
        )
    }

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_x -= dx / self.zoom;
        self.pan_y -= dy / self.zoom;
    }

    /// Zoom by `factor`, keeping the world point under (sx, sy) fixed.
    pub fn zoom_at(&mut self, sx: f32, sy: f32, factor: f32) {
        let (wx, wy) = self.screen_to_world(sx, sy);
        self.zoom = (self.zoom * factor).clamp(0.1, 50.0);
        self.pan_x = wx - sx / self.zoom;
        self.pan_y = wy - sy / self.zoom;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport_width = width;
        self.viewport_height = height;
    }
}

/// Owns everything needed to draw a frame.
pub struct DemoState {
    pub gpu: GpuContext,
    pub renderer: Renderer,
    pub camera: Camera,
    pub font: DynamicFont,
    batch: GpuSpriteBatch,
    lines: Vec<String>,
    /// Draw the raw atlas texture in the top-right corner.
    pub show_atlas: bool,
}

impl DemoState {
    pub fn new(gpu: GpuContext, font: DynamicFont, width: u32, height: u32) -> Self {
        let renderer = Renderer::new(&gpu, font.atlas().size());
        let lines = split_lines(SAMPLE_TEXT);
        info!(
            "Sample text: {} lines, {}×{} atlas at {}pt",
            lines.len(),
            font.atlas().size(),
            font.atlas().size(),
            font.size()
        );

        Self {
            gpu,
            renderer,
            camera: Camera::new(width as f32, height as f32),
            font,
            batch: GpuSpriteBatch::with_capacity(SAMPLE_TEXT.len()),
            lines,
            show_atlas: false,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.camera.resize(width as f32, height as f32);
    }

    /// Change the font size by `delta` points. Cached glyphs keep their
    /// old size until they are evicted or the atlas is cleared.
    pub fn adjust_font_size(&mut self, delta: f32) {
        let size = (self.font.size() + delta).max(4.0);
        match self.font.set_size(size) {
            Ok(()) => info!("Font size {size}pt"),
            Err(e) => error!("{e}"),
        }
    }

    pub fn clear_atlas(&mut self) {
        self.font.clear_atlas();
        info!("Glyph atlas cleared");
    }

    pub fn atlas_stats(&self) -> AtlasStats {
        self.font.atlas().stats()
    }

    /// Lay out, batch, and present one frame.
    pub fn render_frame(&mut self) -> Result<FrameStats, RenderError> {
        let start = Instant::now();
        for (i, line) in self.lines.iter().enumerate() {
            let position = [TEXT_ORIGIN[0], TEXT_ORIGIN[1] + i as f32 * LINE_SPACING];
            if let Err(e) = self.font.draw(&mut self.batch, position, line, WHITE) {
                error!("Line {i}: {e}");
            }
        }
        let elapsed = start.elapsed();
        if elapsed.as_millis() >= 1 {
            debug!("Layout took {} ms", elapsed.as_millis());
        }

        if self.show_atlas {
            self.draw_atlas_preview();
        }

        self.renderer
            .prepare(&self.gpu, &mut self.batch, &self.camera.uniform());
        self.renderer.render_to_surface(&self.gpu)
    }

    fn draw_atlas_preview(&mut self) {
        let size = self.font.atlas().size();
        let scale = ATLAS_PREVIEW_SIZE / size as f32;
        self.batch.draw_glyph(&GlyphSprite {
            position: [self.camera.viewport_width - ATLAS_PREVIEW_SIZE - 10.0, 10.0],
            source: AtlasRect::new(0, 0, size, size),
            atlas_size: size,
            color: WHITE,
            rotation: 0.0,
            scale: [scale, scale],
            effects: SpriteEffects::empty(),
            depth: 0.0,
        });
    }
}

// ===================================================================
// Tests
// ===================================================================
