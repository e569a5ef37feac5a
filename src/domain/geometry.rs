// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/geometry.rs
//
// Coordinate spaces: container (screen) pixels, percent of the rendered image,
// and native image pixels.

use crate::constant::FULL_PERCENT;

/// Rectangle in percent of the image area (0..=100 on both axes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Width/height ratio in native pixels of an image of size `natural`.
    pub fn pixel_ratio(&self, natural: (u32, u32)) -> f32 {
        (self.width * natural.0 as f32) / (self.height * natural.1 as f32)
    }
}

/// Crop region in native pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Scale a percent rectangle to an image of size `natural`.
    ///
    /// The result lies inside the image and is at least one pixel wide and high.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_percent(rect: &CropRect, natural: (u32, u32)) -> Self {
        let (nw, nh) = natural;
        let sx = nw as f32 / FULL_PERCENT;
        let sy = nh as f32 / FULL_PERCENT;

        let x = ((rect.x * sx).round().max(0.0) as u32).min(nw.saturating_sub(1));
        let y = ((rect.y * sy).round().max(0.0) as u32).min(nh.saturating_sub(1));
        let right = ((rect.right() * sx).round().max(0.0) as u32).min(nw);
        let bottom = ((rect.bottom() * sy).round().max(0.0) as u32).min(nh);

        Self {
            x,
            y,
            width: right.saturating_sub(x).max(1),
            height: bottom.saturating_sub(y).max(1),
        }
    }

    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.x, self.y, self.width, self.height)
    }
}

/// Where an image is drawn inside its container when fitted with "contain".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ImageGeometry {
    /// Fit an image of size `natural` into `container`, keeping its aspect and
    /// centring it on the free axis.
    pub fn contain(natural: (u32, u32), container: (f32, f32)) -> Self {
        let (cw, ch) = container;
        if natural.0 == 0 || natural.1 == 0 || cw <= 0.0 || ch <= 0.0 {
            return Self {
                left: 0.0,
                top: 0.0,
                width: 0.0,
                height: 0.0,
            };
        }

        let image_aspect = natural.0 as f32 / natural.1 as f32;
        let container_aspect = cw / ch;

        if image_aspect > container_aspect {
            let height = cw / image_aspect;
            Self {
                left: 0.0,
                top: (ch - height) / 2.0,
                width: cw,
                height,
            }
        } else {
            let width = ch * image_aspect;
            Self {
                left: (cw - width) / 2.0,
                top: 0.0,
                width,
                height: ch,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether a container point lies on the rendered image.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        !self.is_empty()
            && x >= self.left
            && x <= self.left + self.width
            && y >= self.top
            && y <= self.top + self.height
    }

    /// Container point to percent of the rendered image. Not clamped: a drag
    /// may leave the image.
    pub fn to_percent(&self, x: f32, y: f32) -> (f32, f32) {
        if self.is_empty() {
            return (0.0, 0.0);
        }
        (
            (x - self.left) / self.width * FULL_PERCENT,
            (y - self.top) / self.height * FULL_PERCENT,
        )
    }

    /// Percent of the rendered image to a container point.
    pub fn from_percent(&self, px: f32, py: f32) -> (f32, f32) {
        (
            self.left + px / FULL_PERCENT * self.width,
            self.top + py / FULL_PERCENT * self.height,
        )
    }

    /// Container point to drawing-surface pixels, clamped to the image.
    pub fn to_surface(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.left).clamp(0.0, self.width),
            (y - self.top).clamp(0.0, self.height),
        )
    }

    /// Screen length expressed as percent of the rendered width and height.
    pub fn length_to_percent(&self, len: f32) -> (f32, f32) {
        if self.is_empty() {
            return (0.0, 0.0);
        }
        (
            len / self.width * FULL_PERCENT,
            len / self.height * FULL_PERCENT,
        )
    }

    /// Rendered size rounded to whole pixels, at least 1x1.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width.round() as u32).max(1),
            (self.height.round() as u32).max(1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_is_letterboxed() {
        let g = ImageGeometry::contain((2000, 1000), (800.0, 800.0));
        assert_eq!(g.width, 800.0);
        assert_eq!(g.height, 400.0);
        assert_eq!(g.top, 200.0);
        assert_eq!(g.left, 0.0);
    }

    #[test]
    fn tall_image_is_pillarboxed() {
        let g = ImageGeometry::contain((500, 1000), (1000.0, 500.0));
        assert_eq!(g.width, 250.0);
        assert_eq!(g.height, 500.0);
        assert_eq!(g.left, 375.0);
    }

    #[test]
    fn percent_mapping_inverts() {
        let g = ImageGeometry::contain((2000, 1000), (800.0, 800.0));
        let (px, py) = g.to_percent(400.0, 300.0);
        assert_eq!((px, py), (50.0, 25.0));
        assert_eq!(g.from_percent(px, py), (400.0, 300.0));
    }

    #[test]
    fn surface_points_are_clamped_to_image() {
        let g = ImageGeometry::contain((2000, 1000), (800.0, 800.0));
        assert_eq!(g.to_surface(-5.0, 100.0), (0.0, 0.0));
        assert_eq!(g.to_surface(900.0, 700.0), (800.0, 400.0));
    }

    #[test]
    fn percent_rect_scales_to_native_pixels() {
        let rect = CropRect::new(10.0, 20.0, 50.0, 25.0);
        let region = PixelRegion::from_percent(&rect, (1000, 400));
        assert_eq!(region.as_tuple(), (100, 80, 500, 100));
    }

    #[test]
    fn pixel_region_never_leaves_image() {
        let rect = CropRect::new(99.9, 99.9, 5.0, 5.0);
        let region = PixelRegion::from_percent(&rect, (10, 10));
        assert!(region.x + region.width <= 10);
        assert!(region.y + region.height <= 10);
        assert!(region.width >= 1 && region.height >= 1);
    }
}
