// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/mask.rs
//
// Freehand mask painting over a generated image and export of the binary mask
// at the image's native resolution.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};

use super::geometry::ImageGeometry;
use super::upload::ImageHandle;
use crate::constant::{MASK_THRESHOLD, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
use crate::error::{FusionError, MissingInput};

/// File name given to exported masks.
pub const MASK_FILE_NAME: &str = "mask.png";

const PAINTED: Luma<u8> = Luma([255]);

/// Drawing surface. A pixel is either untouched (0) or painted (255).
#[derive(Debug, Clone)]
pub struct MaskCanvas {
    surface: GrayImage,
    brush_size: f32,
    last_point: Option<(f32, f32)>,
}

impl MaskCanvas {
    pub fn new(width: u32, height: u32, brush_size: f32) -> Self {
        Self {
            surface: GrayImage::new(width.max(1), height.max(1)),
            brush_size: clamp_brush(brush_size),
            last_point: None,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = clamp_brush(size);
    }

    pub fn is_drawing(&self) -> bool {
        self.last_point.is_some()
    }

    /// Start a stroke. A stroke that never moves leaves a round dot.
    pub fn begin_stroke(&mut self, x: f32, y: f32) {
        self.paint_segment((x, y), (x, y));
        self.last_point = Some((x, y));
    }

    pub fn extend_stroke(&mut self, x: f32, y: f32) {
        let Some(last) = self.last_point else {
            return;
        };
        self.paint_segment(last, (x, y));
        self.last_point = Some((x, y));
    }

    pub fn end_stroke(&mut self) {
        self.last_point = None;
    }

    pub fn clear(&mut self) {
        self.surface.pixels_mut().for_each(|p| *p = Luma([0]));
        self.last_point = None;
    }

    pub fn is_blank(&self) -> bool {
        self.surface.pixels().all(|p| p.0[0] == 0)
    }

    /// Resize the surface, scaling what is already painted.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.surface.dimensions() == (width, height) {
            return;
        }
        self.surface = binarize(imageops::resize(
            &self.surface,
            width,
            height,
            FilterType::Nearest,
        ));
        self.last_point = None;
    }

    /// Round-capped segment of brush width. Round joins fall out of the caps.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn paint_segment(&mut self, a: (f32, f32), b: (f32, f32)) {
        let radius = self.brush_size / 2.0;
        let (w, h) = self.surface.dimensions();

        let min_x = (a.0.min(b.0) - radius).floor().max(0.0) as u32;
        let min_y = (a.1.min(b.1) - radius).floor().max(0.0) as u32;
        let max_x = ((a.0.max(b.0) + radius).ceil().max(0.0) as u32).min(w);
        let max_y = ((a.1.max(b.1) + radius).ceil().max(0.0) as u32).min(h);

        for py in min_y..max_y {
            for px in min_x..max_x {
                let centre = (px as f32 + 0.5, py as f32 + 0.5);
                if distance_to_segment(centre, a, b) <= radius {
                    self.surface.put_pixel(px, py, PAINTED);
                }
            }
        }
    }

    /// Mask at `width x height`: black background, painted area white.
    pub fn export(&self, width: u32, height: u32) -> GrayImage {
        if self.surface.dimensions() == (width, height) {
            return self.surface.clone();
        }
        binarize(imageops::resize(
            &self.surface,
            width,
            height,
            FilterType::Triangle,
        ))
    }
}

fn clamp_brush(size: f32) -> f32 {
    size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
}

fn binarize(mut img: GrayImage) -> GrayImage {
    for p in img.pixels_mut() {
        p.0[0] = if p.0[0] >= MASK_THRESHOLD { 255 } else { 0 };
    }
    img
}

fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (abx, aby) = (b.0 - a.0, b.1 - a.1);
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq > 0.0 {
        (((p.0 - a.0) * abx + (p.1 - a.1) * aby) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.0 + t * abx, a.1 + t * aby);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

/// Image, mask and instruction ready to send.
#[derive(Debug, Clone)]
pub struct MaskEdit {
    pub original: ImageHandle,
    pub mask: ImageHandle,
    pub prompt: String,
}

/// Mask editing session over one generated image.
#[derive(Debug, Clone)]
pub struct MaskEditor {
    pub target: ImageHandle,
    pub natural: (u32, u32),
    pub geometry: ImageGeometry,
    pub canvas: MaskCanvas,
    pub prompt: String,
}

impl MaskEditor {
    /// The drawing surface matches the on-screen size of `target` in `container`.
    pub fn open(
        target: ImageHandle,
        container: (f32, f32),
        brush_size: f32,
    ) -> image::ImageResult<Self> {
        let natural = target.dimensions()?;
        let geometry = ImageGeometry::contain(natural, container);
        let (w, h) = geometry.pixel_size();
        Ok(Self {
            target,
            natural,
            geometry,
            canvas: MaskCanvas::new(w, h, brush_size),
            prompt: String::new(),
        })
    }

    pub fn layout(&mut self, container: (f32, f32)) {
        self.geometry = ImageGeometry::contain(self.natural, container);
        let (w, h) = self.geometry.pixel_size();
        self.canvas.resize(w, h);
    }

    /// Start a stroke. Presses in the letterbox around the image are ignored.
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if !self.geometry.contains(x, y) {
            return;
        }
        let (sx, sy) = self.geometry.to_surface(x, y);
        self.canvas.begin_stroke(sx, sy);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if !self.canvas.is_drawing() {
            return;
        }
        let (sx, sy) = self.geometry.to_surface(x, y);
        self.canvas.extend_stroke(sx, sy);
    }

    pub fn pointer_up(&mut self) {
        self.canvas.end_stroke();
    }

    /// Validate the instruction and export the mask at native resolution.
    pub fn build(&self) -> Result<MaskEdit, FusionError> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(MissingInput::MaskPrompt.into());
        }
        if self.canvas.is_blank() {
            return Err(MissingInput::MaskArea.into());
        }

        let (w, h) = self.natural;
        let mask = DynamicImage::ImageLuma8(self.canvas.export(w, h));
        Ok(MaskEdit {
            original: self.target.clone(),
            mask: ImageHandle::from_image(&mask, MASK_FILE_NAME)?,
            prompt: prompt.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    #[test]
    fn brush_size_is_clamped() {
        let mut canvas = MaskCanvas::new(10, 10, 1.0);
        assert_eq!(canvas.brush_size(), MIN_BRUSH_SIZE);
        canvas.set_brush_size(500.0);
        assert_eq!(canvas.brush_size(), MAX_BRUSH_SIZE);
    }

    #[test]
    fn stroke_paints_along_segment_only() {
        let mut canvas = MaskCanvas::new(100, 40, 10.0);
        canvas.begin_stroke(10.0, 20.0);
        canvas.extend_stroke(60.0, 20.0);
        canvas.end_stroke();

        let mask = canvas.export(100, 40);
        assert_eq!(mask.get_pixel(35, 20).0[0], 255);
        assert_eq!(mask.get_pixel(35, 26).0[0], 0);
        assert_eq!(mask.get_pixel(80, 20).0[0], 0);
        // Round cap past the end point.
        assert_eq!(mask.get_pixel(63, 20).0[0], 255);
    }

    #[test]
    fn moves_without_stroke_paint_nothing() {
        let mut canvas = MaskCanvas::new(20, 20, 5.0);
        canvas.extend_stroke(5.0, 5.0);
        assert!(canvas.is_blank());
    }

    #[test]
    fn export_matches_native_size_and_is_binary() {
        let mut canvas = MaskCanvas::new(100, 50, 40.0);
        canvas.begin_stroke(20.0, 25.0);
        canvas.end_stroke();

        let mask = canvas.export(400, 200);
        assert_eq!(mask.dimensions(), (400, 200));
        assert!(mask.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(mask.get_pixel(80, 100).0[0], 255);
        assert_eq!(mask.get_pixel(300, 100).0[0], 0);
        assert_eq!(mask.get_pixel(399, 199).0[0], 0);
    }

    #[test]
    fn clear_wipes_the_surface() {
        let mut canvas = MaskCanvas::new(20, 20, 10.0);
        canvas.begin_stroke(10.0, 10.0);
        assert!(!canvas.is_blank());
        canvas.clear();
        assert!(canvas.is_blank());
        assert!(!canvas.is_drawing());
    }

    fn editor(natural: (u32, u32), container: (f32, f32)) -> MaskEditor {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            natural.0,
            natural.1,
            Rgba([200, 100, 50, 255]),
        ));
        let target = ImageHandle::from_image(&img, "result.png").unwrap();
        MaskEditor::open(target, container, 20.0).unwrap()
    }

    #[test]
    fn surface_follows_rendered_size() {
        // 1000x500 inside 400x400 renders at 400x200.
        let mut ed = editor((1000, 500), (400.0, 400.0));
        assert_eq!(ed.canvas.dimensions(), (400, 200));
        ed.layout((200.0, 400.0));
        assert_eq!(ed.canvas.dimensions(), (200, 100));
    }

    #[test]
    fn build_requires_prompt_and_paint() {
        let mut ed = editor((1000, 500), (400.0, 400.0));
        assert!(matches!(
            ed.build(),
            Err(FusionError::MissingInput(MissingInput::MaskPrompt))
        ));

        ed.prompt = "  a glass building ".to_string();
        assert!(matches!(
            ed.build(),
            Err(FusionError::MissingInput(MissingInput::MaskArea))
        ));

        // Container y=200 is the vertical middle of the letterboxed image.
        ed.pointer_down(100.0, 200.0);
        ed.pointer_move(150.0, 200.0);
        ed.pointer_up();

        let edit = ed.build().unwrap();
        assert_eq!(edit.prompt, "a glass building");
        let mask = edit.mask.decode().unwrap();
        assert_eq!(mask.dimensions(), (1000, 500));
        let luma = mask.to_luma8();
        // Surface (125, 100) maps to native (312.5, 250).
        assert_eq!(luma.get_pixel(312, 250).0[0], 255);
        assert_eq!(luma.get_pixel(900, 50).0[0], 0);
    }

    #[test]
    fn press_outside_the_image_paints_nothing() {
        // 1000x500 inside 400x400 leaves 100px bands above and below.
        let mut ed = editor((1000, 500), (400.0, 400.0));
        ed.pointer_down(200.0, 40.0);
        ed.pointer_move(220.0, 40.0);
        ed.pointer_up();
        assert!(ed.canvas.is_blank());
        assert!(!ed.canvas.is_drawing());

        ed.pointer_down(200.0, 150.0);
        ed.pointer_up();
        assert!(!ed.canvas.is_blank());
    }
}
