//! Debug Overlay - Geometry Calibration
//!
//! Draws the idealized grid, a faded reference raster and rectangles taken
//! from an extracted shape list on top of the page, so computed geometry can
//! be compared against a known-good template. Purely additive: it reads the
//! same [`GridGeometry`] the cards use and never changes it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::card::draw_grid_lines;
use crate::fonts::{BuiltinFace, FontFace};
use crate::layout::GridGeometry;
use crate::render::Warnings;
use crate::surface::{Color, ImageFit, Rect, StrokeStyle, Surface};
use crate::units::{mm_to_pt, PageSize};

pub const DEBUG_GRID_STYLE: StrokeStyle = StrokeStyle::dashed(Color::rgb(0.93, 0.20, 0.20), 0.7, 4, 2);
pub const DEBUG_SHAPE_STYLE: StrokeStyle = StrokeStyle::dashed(Color::rgb(0.20, 0.55, 0.95), 0.5, 2, 2);

const REFERENCE_OPACITY: f32 = 0.35;
const GRID_LABEL: &str = "debug:grid";
const GRID_LABEL_SIZE: f32 = 7.0;
const SHAPE_LABEL_SIZE: f32 = 6.5;
const SHAPE_LABEL_MAX_CHARS: usize = 40;

/// Part of the extracted document that carries the page body.
const MAIN_PART: &str = "word/document.xml";
/// Word's default 1 inch margins, used when the shape list has none.
const DEFAULT_MARGIN_MM: f32 = 25.4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugOverlayOptions {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default)]
    pub show_docx_shapes: bool,
    #[serde(default)]
    pub docx_layout_json: Option<PathBuf>,
    #[serde(default)]
    pub reference_image: Option<PathBuf>,
    #[serde(default = "default_limit")]
    pub limit_shapes: usize,
}

fn default_true() -> bool { true }
fn default_limit() -> usize { 250 }

impl Default for DebugOverlayOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            show_grid: true,
            show_docx_shapes: false,
            docx_layout_json: None,
            reference_image: None,
            limit_shapes: default_limit(),
        }
    }
}

/// How a shape offset is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Page,
    Margin,
}

impl Anchor {
    /// Only `page` and `margin` are understood; anything else is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "page" => Some(Self::Page),
            "margin" => Some(Self::Margin),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    part: Option<String>,
    #[serde(default)]
    sections: Vec<Value>,
    #[serde(default)]
    drawings: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Section {
    #[serde(default)]
    margins_mm: Option<Margins>,
}

#[derive(Debug, Default, Deserialize)]
struct Margins {
    left: Option<f32>,
    top: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct Drawing {
    #[serde(default)]
    position: Option<Position>,
    #[serde(default)]
    extent_mm: Option<Extent>,
    #[serde(default)]
    doc_pr: Option<DocPr>,
}

#[derive(Debug, Default, Deserialize)]
struct Position {
    horizontal_relative_from: Option<String>,
    vertical_relative_from: Option<String>,
    horizontal_offset_mm: Option<f32>,
    vertical_offset_mm: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct Extent {
    w: Option<f32>,
    h: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct DocPr {
    name: Option<String>,
}

/// A reference rectangle in millimeters, top-left anchored as extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceShape {
    pub x_mm: f32,
    pub y_top_mm: f32,
    pub w_mm: f32,
    pub h_mm: f32,
    pub name: String,
}

impl ReferenceShape {
    /// Page rectangle in points with a bottom-left origin.
    pub fn rect(&self, page: PageSize) -> Rect {
        let w = mm_to_pt(self.w_mm);
        let h = mm_to_pt(self.h_mm);
        let x = mm_to_pt(self.x_mm);
        let y = page.height - (mm_to_pt(self.y_top_mm) + h);
        Rect::new(x, y, w, h)
    }
}

/// Parse the extracted shape list. Malformed entries are skipped.
pub fn parse_shapes(data: &Value) -> Vec<ReferenceShape> {
    let Some(parts) = data.get("parts").and_then(Value::as_array) else {
        return Vec::new();
    };
    let main = parts
        .iter()
        .filter_map(|p| serde_json::from_value::<Part>(p.clone()).ok())
        .find(|p| p.part.as_deref() == Some(MAIN_PART));
    let Some(main) = main else {
        return Vec::new();
    };

    let margins = main
        .sections
        .first()
        .and_then(|s| serde_json::from_value::<Section>(s.clone()).ok())
        .and_then(|s| s.margins_mm)
        .unwrap_or_default();
    let margin_left = margins.left.filter(|v| *v != 0.0).unwrap_or(DEFAULT_MARGIN_MM);
    let margin_top = margins.top.filter(|v| *v != 0.0).unwrap_or(DEFAULT_MARGIN_MM);

    main.drawings
        .iter()
        .filter_map(|raw| serde_json::from_value::<Drawing>(raw.clone()).ok())
        .filter_map(|d| resolve_drawing(d, margin_left, margin_top))
        .collect()
}

fn resolve_drawing(drawing: Drawing, margin_left: f32, margin_top: f32) -> Option<ReferenceShape> {
    let pos = drawing.position?;
    let extent = drawing.extent_mm?;
    let (x_off, y_off) = (pos.horizontal_offset_mm?, pos.vertical_offset_mm?);
    let (w, h) = (extent.w?, extent.h?);
    let horizontal = Anchor::parse(pos.horizontal_relative_from.as_deref()?)?;
    let vertical = Anchor::parse(pos.vertical_relative_from.as_deref()?)?;

    let x_mm = match horizontal {
        Anchor::Page => x_off,
        Anchor::Margin => x_off + margin_left,
    };
    let y_top_mm = match vertical {
        Anchor::Page => y_off,
        Anchor::Margin => y_off + margin_top,
    };
    let name = drawing.doc_pr.and_then(|d| d.name).unwrap_or_default();
    Some(ReferenceShape {
        x_mm,
        y_top_mm,
        w_mm: w,
        h_mm: h,
        name,
    })
}

/// Load a shape list file. Failures are reported and yield `None`.
pub fn load_shapes(path: &Path, warnings: &mut Warnings) -> Option<Vec<ReferenceShape>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warnings.push(format!("shape list {} unreadable: {}", path.display(), e));
            return None;
        }
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(data) => Some(parse_shapes(&data)),
        Err(e) => {
            warnings.push(format!("shape list {} is not valid JSON: {}", path.display(), e));
            None
        }
    }
}

/// Overlay prepared once per render; the shape list is parsed up front.
#[derive(Debug)]
pub struct DebugOverlay {
    options: DebugOverlayOptions,
    shapes: Option<Vec<ReferenceShape>>,
}

impl DebugOverlay {
    /// `None` when the overlay is disabled.
    pub fn prepare(options: &DebugOverlayOptions, warnings: &mut Warnings) -> Option<Self> {
        if !options.enabled {
            return None;
        }
        let shapes = match (&options.docx_layout_json, options.show_docx_shapes) {
            (Some(path), true) => load_shapes(path, warnings),
            _ => None,
        };
        Some(Self {
            options: options.clone(),
            shapes,
        })
    }

    pub fn shapes(&self) -> &[ReferenceShape] {
        self.shapes.as_deref().unwrap_or(&[])
    }

    pub fn draw(&self, surface: &mut dyn Surface, grid: &GridGeometry, warnings: &mut Warnings) {
        let page = surface.page_size();
        let label_font = FontFace::builtin(BuiltinFace::TimesRoman);

        if let Some(path) = self.options.reference_image.as_deref() {
            let full = Rect::new(0.0, 0.0, page.width, page.height);
            if let Err(e) = surface.draw_image(path, full, ImageFit::Stretch, REFERENCE_OPACITY) {
                warnings.push(format!("reference image skipped: {}", e));
            }
        }

        if self.options.show_grid {
            draw_grid_lines(surface, grid, &DEBUG_GRID_STYLE);
            let (x, y, _, h) = grid.bounds();
            surface.draw_text(GRID_LABEL, &label_font, GRID_LABEL_SIZE, x + 2.0, y + h + 4.0, DEBUG_GRID_STYLE.color);
        }

        if self.options.show_docx_shapes {
            for shape in self.shapes().iter().take(self.options.limit_shapes) {
                let rect = shape.rect(page);
                surface.stroke_rect(rect, &DEBUG_SHAPE_STYLE);
                if !shape.name.is_empty() {
                    let label: String = shape.name.chars().take(SHAPE_LABEL_MAX_CHARS).collect();
                    surface.draw_text(
                        &label,
                        &label_font,
                        SHAPE_LABEL_SIZE,
                        rect.x + 1.5,
                        rect.y + rect.h + 1.5,
                        DEBUG_SHAPE_STYLE.color,
                    );
                }
            }
        }
    }
}
