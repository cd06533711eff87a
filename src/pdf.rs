//! PDF surface backed by printpdf

use image::{Rgb as PixelRgb, RgbImage};
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef,
    LineDashPattern, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Px,
};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::fonts::{BuiltinFace, FontFace, FontSource};
use crate::surface::{fit_rect, AssetError, Color, ImageFit, Rect, StrokeStyle, Surface};
use crate::units::{pt_to_mm, PageSize};

const LAYER_NAME: &str = "Cards";

fn mm(pt: f32) -> Mm {
    Mm(pt_to_mm(pt))
}

fn pdf_color(color: Color) -> printpdf::Color {
    printpdf::Color::Rgb(printpdf::Rgb::new(color.r, color.g, color.b, None))
}

/// One PDF document under construction. Pages are appended in call order.
pub struct PdfSurface {
    doc: PdfDocumentReference,
    page_size: PageSize,
    layer: PdfLayerReference,
    first_page_used: bool,
    fonts: HashMap<String, IndirectFontRef>,
    pages: usize,
}

impl PdfSurface {
    pub fn new(title: &str, page_size: PageSize) -> Self {
        let (doc, page, layer) = PdfDocument::new(
            title,
            mm(page_size.width),
            mm(page_size.height),
            LAYER_NAME,
        );
        let layer = doc.get_page(page).get_layer(layer);
        Self {
            doc,
            page_size,
            layer,
            first_page_used: false,
            fonts: HashMap::new(),
            pages: 0,
        }
    }

    /// Write the finished document. Bytes go to a sibling `.part` file that
    /// is renamed into place only once fully written.
    pub fn save(self, path: &Path) -> Result<(), SaveError> {
        let partial = partial_path(path);
        let written = write_document(self.doc, &partial);
        if let Err(e) = written {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, path).map_err(|e| {
            let _ = fs::remove_file(&partial);
            SaveError::Io(e)
        })
    }

    fn font_ref(&mut self, face: &FontFace) -> Option<IndirectFontRef> {
        if let Some(font) = self.fonts.get(&face.name) {
            return Some(font.clone());
        }
        let added = match &face.source {
            FontSource::Builtin(builtin) => self.doc.add_builtin_font(match builtin {
                BuiltinFace::TimesRoman => BuiltinFont::TimesRoman,
                BuiltinFace::TimesBold => BuiltinFont::TimesBold,
            }),
            FontSource::External { data, .. } => self.doc.add_external_font(data.as_slice()),
        };
        match added {
            Ok(font) => {
                self.fonts.insert(face.name.clone(), font.clone());
                Some(font)
            }
            Err(e) => {
                tracing::warn!("font {} could not be embedded: {}", face.name, e);
                if face.name == BuiltinFace::TimesRoman.logical_name() {
                    return None;
                }
                self.font_ref(&FontFace::builtin(BuiltinFace::TimesRoman))
            }
        }
    }

    fn apply_stroke(&self, style: &StrokeStyle) {
        self.layer.set_outline_color(pdf_color(style.color));
        self.layer.set_outline_thickness(style.width);
        let pattern = match style.dash {
            Some((dash, gap)) => LineDashPattern {
                dash_1: Some(dash as i64),
                gap_1: Some(gap as i64),
                ..Default::default()
            },
            None => LineDashPattern::default(),
        };
        self.layer.set_line_dash_pattern(pattern);
    }

    fn add_path(&self, points: &[(f32, f32)], closed: bool) {
        let points = points
            .iter()
            .map(|(x, y)| (Point::new(mm(*x), mm(*y)), false))
            .collect();
        self.layer.add_line(printpdf::Line {
            points,
            is_closed: closed,
        });
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

fn write_document(doc: PdfDocumentReference, path: &Path) -> Result<(), SaveError> {
    let file = File::create(path).map_err(SaveError::Io)?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer)
        .map_err(|e| SaveError::Pdf(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| SaveError::Io(e.into_error()))?
        .sync_all()
        .map_err(SaveError::Io)
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Failed to create output file: {0}")]
    Io(#[source] std::io::Error),

    #[error("Failed to write PDF: {0}")]
    Pdf(String),
}

/// Flatten alpha against white, additionally fading by `opacity`.
fn flatten_on_white(path: &Path, opacity: f32) -> Result<RgbImage, AssetError> {
    let decoded = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(source) => AssetError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => AssetError::Decode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let opacity = opacity.clamp(0.0, 1.0);

    let mut rgb = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = (a as f32 / 255.0) * opacity;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)) as u8;
        rgb.put_pixel(x, y, PixelRgb([blend(r), blend(g), blend(b)]));
    }
    Ok(rgb)
}

impl Surface for PdfSurface {
    fn page_size(&self) -> PageSize {
        self.page_size
    }

    fn begin_page(&mut self) {
        if self.first_page_used {
            let (page, layer) = self.doc.add_page(
                mm(self.page_size.width),
                mm(self.page_size.height),
                LAYER_NAME,
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
        }
        self.first_page_used = true;
        self.pages += 1;
    }

    fn end_page(&mut self) {
        tracing::debug!("page {} committed", self.pages);
    }

    fn draw_image(
        &mut self,
        path: &Path,
        rect: Rect,
        fit: ImageFit,
        opacity: f32,
    ) -> Result<(), AssetError> {
        let pixels = flatten_on_white(path, opacity)?;
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::Decode {
                path: path.to_path_buf(),
                reason: "empty image".to_string(),
            });
        }
        let placed = fit_rect(width, height, rect, fit);

        let image = Image::from(ImageXObject {
            width: Px(width as usize),
            height: Px(height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: pixels.into_raw(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // At `dpi`, the natural width is exactly `placed.w`; height is scaled to match.
        let dpi = width as f32 * 72.0 / placed.w;
        let natural_h = height as f32 * 72.0 / dpi;
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(mm(placed.x)),
                translate_y: Some(mm(placed.y)),
                scale_y: Some(placed.h / natural_h),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, style: &StrokeStyle) {
        self.layer.save_graphics_state();
        self.apply_stroke(style);
        self.add_path(
            &[
                (rect.x, rect.y),
                (rect.x + rect.w, rect.y),
                (rect.x + rect.w, rect.y + rect.h),
                (rect.x, rect.y + rect.h),
            ],
            true,
        );
        self.layer.restore_graphics_state();
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), style: &StrokeStyle) {
        self.layer.save_graphics_state();
        self.apply_stroke(style);
        self.add_path(&[from, to], false);
        self.layer.restore_graphics_state();
    }

    fn draw_text(&mut self, text: &str, font: &FontFace, size: f32, x: f32, y: f32, color: Color) {
        let Some(font_ref) = self.font_ref(font) else {
            return;
        };
        self.layer.save_graphics_state();
        self.layer.set_fill_color(pdf_color(color));
        self.layer.use_text(text, size, mm(x), mm(y), &font_ref);
        self.layer.restore_graphics_state();
    }
}
