// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/crop.rs
//
// Crop selection in percent coordinates, drag handles, aspect locking and
// rasterizing the selection to a new image.

use std::fmt;
use std::str::FromStr;

use image::{DynamicImage, GenericImageView};

use super::geometry::{CropRect, ImageGeometry, PixelRegion};
use super::upload::{ImageHandle, PhotoSlot};
use crate::constant::{FULL_PERCENT, HANDLE_HIT_SIZE, INITIAL_CROP, MIN_CROP_PERCENT};

/// File name given to cropped images.
pub const CROPPED_FILE_NAME: &str = "cropped_image.png";

// =============================================================================
// Aspect ratio
// =============================================================================

/// Locked width/height ratio, measured in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AspectRatio {
    #[default]
    Free,
    Square,
    FourThree,
    SixteenNine,
    Custom(f32),
}

impl AspectRatio {
    pub fn value(&self) -> Option<f32> {
        match self {
            Self::Free => None,
            Self::Square => Some(1.0),
            Self::FourThree => Some(4.0 / 3.0),
            Self::SixteenNine => Some(16.0 / 9.0),
            Self::Custom(r) => Some(*r),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Square => write!(f, "1:1"),
            Self::FourThree => write!(f, "4:3"),
            Self::SixteenNine => write!(f, "16:9"),
            Self::Custom(r) => write!(f, "{r}"),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    /// Accepts `free`, `W:H` or a positive decimal ratio.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let ratio = match s.as_str() {
            "free" | "none" => return Ok(Self::Free),
            "1:1" | "square" => return Ok(Self::Square),
            "4:3" => return Ok(Self::FourThree),
            "16:9" => return Ok(Self::SixteenNine),
            other => match other.split_once(':') {
                Some((w, h)) => {
                    let w: f32 = w.parse().map_err(|_| format!("invalid aspect ratio: {s}"))?;
                    let h: f32 = h.parse().map_err(|_| format!("invalid aspect ratio: {s}"))?;
                    w / h
                }
                None => other
                    .parse::<f32>()
                    .map_err(|_| format!("invalid aspect ratio: {s}"))?,
            },
        };

        if ratio.is_finite() && ratio > 0.0 {
            Ok(Self::Custom(ratio))
        } else {
            Err(format!("invalid aspect ratio: {s}"))
        }
    }
}

// =============================================================================
// Drag handles
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragHandle {
    #[default]
    None,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    Move,
}

impl DragHandle {
    fn left(self) -> bool {
        matches!(self, Self::Left | Self::TopLeft | Self::BottomLeft)
    }

    fn right(self) -> bool {
        matches!(self, Self::Right | Self::TopRight | Self::BottomRight)
    }

    fn top(self) -> bool {
        matches!(self, Self::Top | Self::TopLeft | Self::TopRight)
    }

    fn bottom(self) -> bool {
        matches!(self, Self::Bottom | Self::BottomLeft | Self::BottomRight)
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Crop rectangle plus drag state. All coordinates are percent of the image.
#[derive(Debug, Clone)]
pub struct CropSelection {
    pub rect: CropRect,
    pub aspect: AspectRatio,
    /// Native width / height of the image being cropped.
    image_ratio: f32,
    pub is_dragging: bool,
    pub drag_handle: DragHandle,
    drag_start: Option<(f32, f32)>,
    drag_start_rect: Option<CropRect>,
}

impl Default for CropSelection {
    fn default() -> Self {
        Self::new((1, 1))
    }
}

impl CropSelection {
    pub fn new(natural: (u32, u32)) -> Self {
        let (x, y, w, h) = INITIAL_CROP;
        let image_ratio = if natural.0 > 0 && natural.1 > 0 {
            natural.0 as f32 / natural.1 as f32
        } else {
            1.0
        };
        Self {
            rect: CropRect::new(x, y, w, h),
            aspect: AspectRatio::Free,
            image_ratio,
            is_dragging: false,
            drag_handle: DragHandle::None,
            drag_start: None,
            drag_start_rect: None,
        }
    }

    /// Locked ratio expressed in percent units (width% / height%).
    fn percent_ratio(&self) -> Option<f32> {
        self.aspect.value().map(|a| a / self.image_ratio)
    }

    /// Handle under `(x, y)`; `tolerance` is half the hit area in percent.
    pub fn hit_test(&self, x: f32, y: f32, tolerance: (f32, f32)) -> DragHandle {
        let r = self.rect;
        let (tx, ty) = tolerance;
        let cx = r.x + r.width / 2.0;
        let cy = r.y + r.height / 2.0;

        let handles = [
            ((r.x, r.y), DragHandle::TopLeft),
            ((r.right(), r.y), DragHandle::TopRight),
            ((r.x, r.bottom()), DragHandle::BottomLeft),
            ((r.right(), r.bottom()), DragHandle::BottomRight),
            ((cx, r.y), DragHandle::Top),
            ((cx, r.bottom()), DragHandle::Bottom),
            ((r.x, cy), DragHandle::Left),
            ((r.right(), cy), DragHandle::Right),
        ];

        for ((hx, hy), handle) in handles {
            if (x - hx).abs() <= tx && (y - hy).abs() <= ty {
                return handle;
            }
        }

        if r.contains(x, y) {
            return DragHandle::Move;
        }

        DragHandle::None
    }

    pub fn start_drag(&mut self, handle: DragHandle, x: f32, y: f32) {
        if handle == DragHandle::None {
            return;
        }
        self.is_dragging = true;
        self.drag_handle = handle;
        self.drag_start = Some((x, y));
        self.drag_start_rect = Some(self.rect);
    }

    pub fn update_drag(&mut self, x: f32, y: f32) {
        if !self.is_dragging {
            return;
        }
        let (Some((start_x, start_y)), Some(start)) = (self.drag_start, self.drag_start_rect)
        else {
            return;
        };
        let dx = x - start_x;
        let dy = y - start_y;

        self.rect = match self.drag_handle {
            DragHandle::None => return,
            DragHandle::Move => CropRect::new(
                (start.x + dx).clamp(0.0, FULL_PERCENT - start.width),
                (start.y + dy).clamp(0.0, FULL_PERCENT - start.height),
                start.width,
                start.height,
            ),
            handle => self.resize(start, handle, dx, dy),
        };
    }

    /// Dragged edges follow the pointer, opposite edges stay put.
    fn resize(&self, start: CropRect, handle: DragHandle, dx: f32, dy: f32) -> CropRect {
        let (left, right, top, bottom) = (handle.left(), handle.right(), handle.top(), handle.bottom());

        let mut w = start.width;
        let mut h = start.height;
        if left {
            w -= dx;
        }
        if right {
            w += dx;
        }
        if top {
            h -= dy;
        }
        if bottom {
            h += dy;
        }

        let ratio = self.percent_ratio();
        if let Some(k) = ratio {
            if left || right {
                h = w / k;
            } else {
                w = h * k;
            }
        }

        let max_w = if left {
            start.right()
        } else {
            FULL_PERCENT - start.x
        };
        let max_h = if top {
            start.bottom()
        } else {
            FULL_PERCENT - start.y
        };
        let (w, h) = fit_size(w, h, max_w, max_h, ratio);

        let x = if left { start.right() - w } else { start.x };
        let y = if top { start.bottom() - h } else { start.y };
        CropRect::new(x, y, w, h)
    }

    pub fn end_drag(&mut self) {
        self.is_dragging = false;
        self.drag_handle = DragHandle::None;
        self.drag_start = None;
        self.drag_start_rect = None;
    }

    /// Lock (or unlock) the ratio. The rect shrinks to the ratio around its centre.
    pub fn set_aspect(&mut self, aspect: AspectRatio) {
        self.aspect = aspect;
        let Some(k) = self.percent_ratio() else {
            return;
        };

        let r = self.rect;
        let w = r.width.min(r.height * k);
        let h = w / k;
        let (w, h) = fit_size(w, h, FULL_PERCENT, FULL_PERCENT, Some(k));
        let x = r.x + (r.width - w) / 2.0;
        let y = r.y + (r.height - h) / 2.0;
        self.rect = place(x, y, w, h);
    }

    /// Set the rect directly, clamped like a drag would be.
    pub fn set_rect(&mut self, rect: CropRect) {
        let ratio = self.percent_ratio();
        let h = match ratio {
            Some(k) => rect.width / k,
            None => rect.height,
        };
        let (w, h) = fit_size(rect.width, h, FULL_PERCENT, FULL_PERCENT, ratio);
        self.rect = place(rect.x, rect.y, w, h);
    }

    /// Back to the initial rect, keeping the current aspect lock.
    pub fn reset(&mut self) {
        let (x, y, w, h) = INITIAL_CROP;
        self.rect = CropRect::new(x, y, w, h);
        self.end_drag();
        self.set_aspect(self.aspect);
    }
}

/// Clamp a size to `[MIN, max]` on both axes, keeping `ratio` (w/h) if given.
fn fit_size(mut w: f32, mut h: f32, max_w: f32, max_h: f32, ratio: Option<f32>) -> (f32, f32) {
    let Some(k) = ratio else {
        return (w.max(MIN_CROP_PERCENT).min(max_w), h.max(MIN_CROP_PERCENT).min(max_h));
    };

    if w > max_w {
        w = max_w;
        h = w / k;
    }
    if h > max_h {
        h = max_h;
        w = h * k;
    }
    if w < MIN_CROP_PERCENT {
        w = MIN_CROP_PERCENT;
        h = w / k;
    }
    if h < MIN_CROP_PERCENT {
        h = MIN_CROP_PERCENT;
        w = h * k;
    }
    // Only an image too narrow for the floor at this ratio reaches here oversize.
    (w.min(max_w), h.min(max_h))
}

/// Keep a rect of size `w x h` inside the image.
fn place(x: f32, y: f32, w: f32, h: f32) -> CropRect {
    let w = w.min(FULL_PERCENT);
    let h = h.min(FULL_PERCENT);
    CropRect::new(
        x.clamp(0.0, FULL_PERCENT - w),
        y.clamp(0.0, FULL_PERCENT - h),
        w,
        h,
    )
}

// =============================================================================
// Session
// =============================================================================

/// Rasterize the percent rect of `img` into a new image.
pub fn apply_crop(img: &DynamicImage, rect: &CropRect) -> DynamicImage {
    let region = PixelRegion::from_percent(rect, img.dimensions());
    img.crop_imm(region.x, region.y, region.width, region.height)
}

/// One crop edit of an uploaded photo.
#[derive(Debug, Clone)]
pub struct CropSession {
    pub slot: PhotoSlot,
    pub source: ImageHandle,
    image: DynamicImage,
    pub natural: (u32, u32),
    pub geometry: ImageGeometry,
    pub selection: CropSelection,
}

impl CropSession {
    /// Decode `source` and lay it out inside `container` (screen pixels).
    pub fn open(
        slot: PhotoSlot,
        source: ImageHandle,
        container: (f32, f32),
    ) -> image::ImageResult<Self> {
        let image = source.decode()?;
        let natural = image.dimensions();
        Ok(Self {
            slot,
            source,
            image,
            natural,
            geometry: ImageGeometry::contain(natural, container),
            selection: CropSelection::new(natural),
        })
    }

    /// The container was resized. The rect is kept, it is resolution independent.
    pub fn layout(&mut self, container: (f32, f32)) {
        self.geometry = ImageGeometry::contain(self.natural, container);
    }

    /// Pointer pressed at a container point. Returns the grabbed handle.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> DragHandle {
        let (px, py) = self.geometry.to_percent(x, y);
        let tolerance = self.geometry.length_to_percent(HANDLE_HIT_SIZE / 2.0);
        let handle = self.selection.hit_test(px, py, tolerance);
        self.selection.start_drag(handle, px, py);
        handle
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let (px, py) = self.geometry.to_percent(x, y);
        self.selection.update_drag(px, py);
    }

    pub fn pointer_up(&mut self) {
        self.selection.end_drag();
    }

    pub fn pixel_region(&self) -> PixelRegion {
        PixelRegion::from_percent(&self.selection.rect, self.natural)
    }

    /// Rasterize the selection as a new PNG handle.
    pub fn save(&self) -> image::ImageResult<ImageHandle> {
        let cropped = apply_crop(&self.image, &self.selection.rect);
        log::debug!(
            "Cropped {} to {:?}",
            self.slot,
            self.pixel_region().as_tuple()
        );
        ImageHandle::from_image(&cropped, CROPPED_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const HANDLES: [DragHandle; 9] = [
        DragHandle::TopLeft,
        DragHandle::TopRight,
        DragHandle::BottomLeft,
        DragHandle::BottomRight,
        DragHandle::Top,
        DragHandle::Bottom,
        DragHandle::Left,
        DragHandle::Right,
        DragHandle::Move,
    ];

    const DELTAS: [f32; 7] = [-250.0, -60.0, -7.5, 0.0, 3.0, 45.0, 300.0];

    fn assert_in_bounds(r: &CropRect) {
        let eps = 1e-3;
        assert!(r.x >= -eps && r.y >= -eps, "{r:?}");
        assert!(r.right() <= FULL_PERCENT + eps, "{r:?}");
        assert!(r.bottom() <= FULL_PERCENT + eps, "{r:?}");
        assert!(r.width >= MIN_CROP_PERCENT - eps, "{r:?}");
        assert!(r.height >= MIN_CROP_PERCENT - eps, "{r:?}");
    }

    fn drag(sel: &mut CropSelection, handle: DragHandle, dx: f32, dy: f32) {
        sel.start_drag(handle, 50.0, 50.0);
        sel.update_drag(50.0 + dx, 50.0 + dy);
        sel.end_drag();
    }

    #[test]
    fn free_drags_stay_inside_image_and_above_floor() {
        for handle in HANDLES {
            for dx in DELTAS {
                for dy in DELTAS {
                    let mut sel = CropSelection::new((1200, 800));
                    drag(&mut sel, handle, dx, dy);
                    assert_in_bounds(&sel.rect);
                    // A second drag starts from the clamped rect.
                    drag(&mut sel, handle, -dy, dx);
                    assert_in_bounds(&sel.rect);
                }
            }
        }
    }

    #[test]
    fn locked_drags_keep_pixel_ratio() {
        let cases = [
            ((1600, 900), AspectRatio::SixteenNine),
            ((1000, 1000), AspectRatio::FourThree),
            ((800, 1200), AspectRatio::Square),
            ((3000, 1000), AspectRatio::Custom(0.5)),
        ];

        for (natural, aspect) in cases {
            let target = aspect.value().unwrap();
            for handle in HANDLES {
                for dx in DELTAS {
                    for dy in DELTAS {
                        let mut sel = CropSelection::new(natural);
                        sel.set_aspect(aspect);
                        drag(&mut sel, handle, dx, dy);
                        assert_in_bounds(&sel.rect);
                        let ratio = sel.rect.pixel_ratio(natural);
                        assert!(
                            (ratio - target).abs() / target < 1e-3,
                            "{aspect:?} {handle:?} ({dx}, {dy}): {ratio} vs {target}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn move_is_clamped_without_resizing() {
        let mut sel = CropSelection::new((100, 100));
        drag(&mut sel, DragHandle::Move, 50.0, -50.0);
        assert_eq!(sel.rect, CropRect::new(20.0, 0.0, 80.0, 80.0));
    }

    #[test]
    fn left_edge_drag_keeps_right_edge() {
        let mut sel = CropSelection::new((100, 100));
        drag(&mut sel, DragHandle::Left, 30.0, 0.0);
        assert_eq!(sel.rect.x, 40.0);
        assert_eq!(sel.rect.right(), 90.0);
        assert_eq!(sel.rect.height, 80.0);
    }

    #[test]
    fn collapsing_drag_stops_at_floor() {
        let mut sel = CropSelection::new((100, 100));
        drag(&mut sel, DragHandle::BottomRight, -200.0, -200.0);
        assert_eq!(sel.rect, CropRect::new(10.0, 10.0, 5.0, 5.0));
    }

    #[test]
    fn set_aspect_shrinks_around_centre() {
        let mut sel = CropSelection::new((100, 100));
        sel.set_aspect(AspectRatio::SixteenNine);
        let r = sel.rect;
        assert!((r.width - 80.0).abs() < 1e-4);
        assert!((r.height - 45.0).abs() < 1e-4);
        assert!((r.y + r.height / 2.0 - 50.0).abs() < 1e-4);
    }

    #[test]
    fn reset_reapplies_aspect() {
        let mut sel = CropSelection::new((200, 100));
        sel.set_aspect(AspectRatio::Square);
        drag(&mut sel, DragHandle::Move, 10.0, 5.0);
        sel.reset();
        assert!((sel.rect.pixel_ratio((200, 100)) - 1.0).abs() < 1e-4);
        assert!(!sel.is_dragging);
    }

    #[test]
    fn typed_rect_is_clamped() {
        let mut sel = CropSelection::new((100, 100));
        sel.set_rect(CropRect::new(90.0, -5.0, 50.0, 1.0));
        assert_in_bounds(&sel.rect);
        assert_eq!(sel.rect.width, 50.0);
        assert_eq!(sel.rect.height, MIN_CROP_PERCENT);
    }

    #[test]
    fn hit_test_finds_corners_edges_and_body() {
        let sel = CropSelection::new((100, 100));
        let tol = (2.0, 2.0);
        assert_eq!(sel.hit_test(10.5, 9.0, tol), DragHandle::TopLeft);
        assert_eq!(sel.hit_test(90.0, 90.0, tol), DragHandle::BottomRight);
        assert_eq!(sel.hit_test(50.0, 10.0, tol), DragHandle::Top);
        assert_eq!(sel.hit_test(89.0, 50.0, tol), DragHandle::Right);
        assert_eq!(sel.hit_test(40.0, 60.0, tol), DragHandle::Move);
        assert_eq!(sel.hit_test(3.0, 3.0, tol), DragHandle::None);
    }

    #[test]
    fn aspect_parsing() {
        assert_eq!("free".parse::<AspectRatio>(), Ok(AspectRatio::Free));
        assert_eq!("16:9".parse::<AspectRatio>(), Ok(AspectRatio::SixteenNine));
        assert_eq!("3:2".parse::<AspectRatio>(), Ok(AspectRatio::Custom(1.5)));
        assert!("0:1".parse::<AspectRatio>().is_err());
        assert!("wide".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn session_pointer_drag_and_save() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 200, Rgba([1, 2, 3, 255])));
        let source = ImageHandle::from_image(&img, "src.png").unwrap();
        // 400x200 in an 800x800 box renders at 800x400, offset 200 from the top.
        let mut session = CropSession::open(PhotoSlot::Group, source, (800.0, 800.0)).unwrap();

        // Bottom-right handle sits at 90% / 90% of the rendered image.
        let handle = session.pointer_down(720.0, 560.0);
        assert_eq!(handle, DragHandle::BottomRight);
        session.pointer_move(800.0, 600.0);
        session.pointer_up();

        let r = session.selection.rect;
        assert!((r.right() - 100.0).abs() < 1e-3);
        assert!((r.bottom() - 100.0).abs() < 1e-3);

        let cropped = session.save().unwrap();
        assert_eq!(cropped.file_name(), CROPPED_FILE_NAME);
        assert_eq!(cropped.dimensions().unwrap(), (360, 180));
    }

    #[test]
    fn apply_crop_uses_native_pixels() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(1000, 500));
        let out = apply_crop(&img, &CropRect::new(10.0, 10.0, 50.0, 50.0));
        assert_eq!(out.dimensions(), (500, 250));
    }
}
