// Renderer: draws the forest onto any surface that can stroke straight lines

use image::{Rgba as Pixel, RgbaImage};
use rayon::prelude::*;
use std::path::Path;

use crate::branch::{visit_forest, Branch};
use crate::config::GrowthConfig;
use crate::error::SnapshotError;
use crate::types::{DrawCommand, Rgba, Vec2};

/// Anything the renderer can draw a frame onto.
pub trait DrawSurface {
    fn size(&self) -> (f32, f32);
    fn resize(&mut self, width: f32, height: f32);
    fn clear(&mut self, background: Rgba);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderStyle {
    pub stroke: Rgba,
    pub background: Rgba,
}

impl RenderStyle {
    pub fn from_config(config: &GrowthConfig) -> Self {
        Self {
            stroke: config.stroke_color,
            background: config.background_color,
        }
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self::from_config(&GrowthConfig::default())
    }
}

/// Clear the surface and draw one segment per visible branch.
/// Branches that have not started growing are skipped.
pub fn render<S: DrawSurface + ?Sized>(forest: &[Branch], surface: &mut S, style: &RenderStyle) {
    surface.clear(style.background);
    visit_forest(forest, &mut |branch| {
        if branch.growth_progress > 0.0 {
            surface.stroke_line(branch.origin, branch.tip(), branch.width, style.stroke);
        }
    });
}

/// Records draw calls instead of drawing them.
#[derive(Clone, Debug, Default)]
pub struct CommandBuffer {
    pub width: f32,
    pub height: f32,
    pub background: Option<Rgba>,
    pub commands: Vec<DrawCommand>,
}

impl CommandBuffer {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }
}

impl DrawSurface for CommandBuffer {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self, background: Rgba) {
        self.background = Some(background);
        self.commands.clear();
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.commands.push(DrawCommand {
            from,
            to,
            width,
            color,
        });
    }
}

/// Software canvas: round-capped anti-aliased strokes into an RGBA image.
pub struct RasterCanvas {
    image: RgbaImage,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return Err(SnapshotError::EmptySurface { width, height });
        }
        self.image
            .save(path)
            .map_err(|source| SnapshotError::Image {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl DrawSurface for RasterCanvas {
    fn size(&self) -> (f32, f32) {
        let (w, h) = self.image.dimensions();
        (w as f32, h as f32)
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.image = RgbaImage::new(width.max(0.0) as u32, height.max(0.0) as u32);
    }

    fn clear(&mut self, background: Rgba) {
        let px = Pixel(background.to_rgba8());
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        let (img_w, img_h) = self.image.dimensions();
        if img_w == 0 || img_h == 0 {
            return;
        }
        let half = (width * 0.5).max(0.5);
        let pad = half + 1.0;

        // Rows and columns touched by the stroke's bounding box
        let y0 = ((from.y.min(to.y) - pad).floor().max(0.0)) as usize;
        let y1 = ((from.y.max(to.y) + pad).ceil().min(img_h as f32)) as usize;
        let x0 = ((from.x.min(to.x) - pad).floor().max(0.0)) as usize;
        let x1 = ((from.x.max(to.x) + pad).ceil().min(img_w as f32)) as usize;
        if y0 >= y1 || x0 >= x1 {
            return;
        }

        let src = color.to_rgba8();
        let row_len = img_w as usize * 4;
        let buf: &mut [u8] = &mut self.image;

        buf.par_chunks_mut(row_len)
            .enumerate()
            .skip(y0)
            .take(y1 - y0)
            .for_each(|(y, row)| {
                for x in x0..x1 {
                    let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    let coverage = (half + 0.5 - distance_to_segment(center, from, to)).clamp(0.0, 1.0);
                    if coverage <= 0.0 {
                        continue;
                    }
                    let alpha = coverage * color.a;
                    let px = &mut row[x * 4..x * 4 + 4];
                    for c in 0..3 {
                        px[c] = blend(px[c], src[c], alpha);
                    }
                    px[3] = blend(px[3], 255, alpha);
                }
            });
    }
}

fn blend(dst: u8, src: u8, alpha: f32) -> u8 {
    (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
