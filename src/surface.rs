//! Drawing surface abstraction
//!
//! Card and overlay drawing goes through [`Surface`] so the same geometry can
//! be written to PDF or recorded for inspection. Coordinates are points with
//! the origin at the bottom-left of the page.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fonts::FontFace;
use crate::units::PageSize;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn grey(level: f32) -> Self {
        Self::rgb(level, level, level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
    /// (dash, gap) in points; `None` is a solid line.
    pub dash: Option<(u16, u16)>,
}

impl StrokeStyle {
    pub const fn solid(color: Color, width: f32) -> Self {
        Self { color, width, dash: None }
    }

    pub const fn dashed(color: Color, width: f32, dash: u16, gap: u16) -> Self {
        Self {
            color,
            width,
            dash: Some((dash, gap)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFit {
    /// Fill the rectangle exactly, ignoring aspect ratio.
    Stretch,
    /// Largest aspect-preserving box centered in the rectangle.
    Contain,
}

/// Where an image of `px_w` x `px_h` pixels lands inside `target`.
pub fn fit_rect(px_w: u32, px_h: u32, target: Rect, fit: ImageFit) -> Rect {
    match fit {
        ImageFit::Stretch => target,
        ImageFit::Contain => {
            if px_w == 0 || px_h == 0 {
                return target;
            }
            let aspect = px_w as f32 / px_h as f32;
            let (w, h) = if target.w / target.h > aspect {
                (target.h * aspect, target.h)
            } else {
                (target.w, target.w / aspect)
            };
            Rect::new(
                target.x + (target.w - w) / 2.0,
                target.y + (target.h - h) / 2.0,
                w,
                h,
            )
        }
    }
}

/// A paged drawing backend.
pub trait Surface {
    fn page_size(&self) -> PageSize;

    /// Start a new page. Every draw call belongs to the most recent page.
    fn begin_page(&mut self);

    /// Commit the current page.
    fn end_page(&mut self);

    /// Draw an image file into `rect`. `opacity` below 1.0 blends toward white.
    fn draw_image(
        &mut self,
        path: &Path,
        rect: Rect,
        fit: ImageFit,
        opacity: f32,
    ) -> Result<(), AssetError>;

    fn stroke_rect(&mut self, rect: Rect, style: &StrokeStyle);

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), style: &StrokeStyle);

    /// Draw `text` with its left baseline point at (`x`, `y`).
    fn draw_text(&mut self, text: &str, font: &FontFace, size: f32, x: f32, y: f32, color: Color);
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    BeginPage,
    EndPage,
    Image {
        path: PathBuf,
        rect: Rect,
        fit: ImageFit,
        opacity: f32,
    },
    StrokeRect {
        rect: Rect,
        style: StrokeStyle,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        style: StrokeStyle,
    },
    Text {
        text: String,
        font: String,
        size: f32,
        x: f32,
        y: f32,
    },
}

/// Surface that records every call. Images succeed when the file exists.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    page_size: PageSize,
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            ops: Vec::new(),
        }
    }

    /// Ops grouped by page, without the page markers.
    pub fn pages(&self) -> Vec<Vec<DrawOp>> {
        let mut pages = Vec::new();
        let mut current: Option<Vec<DrawOp>> = None;
        for op in &self.ops {
            match op {
                DrawOp::BeginPage => current = Some(Vec::new()),
                DrawOp::EndPage => pages.extend(current.take()),
                other => {
                    if let Some(page) = current.as_mut() {
                        page.push(other.clone());
                    }
                }
            }
        }
        pages
    }

    pub fn texts(&self) -> Vec<&DrawOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { .. }))
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn page_size(&self) -> PageSize {
        self.page_size
    }

    fn begin_page(&mut self) {
        self.ops.push(DrawOp::BeginPage);
    }

    fn end_page(&mut self) {
        self.ops.push(DrawOp::EndPage);
    }

    fn draw_image(
        &mut self,
        path: &Path,
        rect: Rect,
        fit: ImageFit,
        opacity: f32,
    ) -> Result<(), AssetError> {
        let meta = fs::metadata(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(AssetError::Decode {
                path: path.to_path_buf(),
                reason: "not a file".to_string(),
            });
        }
        self.ops.push(DrawOp::Image {
            path: path.to_path_buf(),
            rect,
            fit,
            opacity,
        });
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, style: &StrokeStyle) {
        self.ops.push(DrawOp::StrokeRect { rect, style: *style });
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), style: &StrokeStyle) {
        self.ops.push(DrawOp::Line {
            from,
            to,
            style: *style,
        });
    }

    fn draw_text(&mut self, text: &str, font: &FontFace, size: f32, x: f32, y: f32, _color: Color) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            font: font.name.clone(),
            size,
            x,
            y,
        });
    }
}
