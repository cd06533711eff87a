//! Card Renderer
//!
//! Draws one item into one grid cell, plus the per-page background and grid
//! lines. Every coordinate comes from [`LayoutConfig`] via [`GridGeometry`],
//! the same geometry the debug overlay draws.

use std::path::Path;

use crate::assets::{icon_triplet, AssetPaths};
use crate::fonts::{FontFace, FontRegistry, ResolvedFonts};
use crate::item::Item;
use crate::layout::{GridGeometry, LayoutConfig};
use crate::render::Warnings;
use crate::shaping::shape_rtl;
use crate::surface::{AssetError, Color, ImageFit, Rect, StrokeStyle, Surface};
use crate::units::mm_to_pt;

pub const GRID_LINE_STYLE: StrokeStyle = StrokeStyle::solid(Color::grey(0.85), 0.6);
pub const PLACEHOLDER_STYLE: StrokeStyle = StrokeStyle::solid(Color::BLACK, 1.0);

const LOGO_W_MM: f32 = 30.0;
const LOGO_H_MM: f32 = 18.0;
const LOGO_PAD_TOP_MM: f32 = 8.0;

/// Everything a card needs that does not change between cells.
pub struct CardContext<'a> {
    pub layout: &'a LayoutConfig,
    pub grid: GridGeometry,
    pub assets: &'a AssetPaths,
    pub fonts: &'a FontRegistry,
    pub resolved: &'a ResolvedFonts,
    /// Call-level logo request, OR-ed with the layout toggle.
    pub draw_logo: bool,
}

impl CardContext<'_> {
    pub fn grid_lines_enabled(&self) -> bool {
        self.layout.draw_grid_lines && !self.assets.has_template_page()
    }

    pub fn logo_enabled(&self) -> bool {
        (self.draw_logo || self.layout.draw_logo) && !self.assets.has_template_page()
    }
}

/// Left x that centers a measured string on `center_x`.
pub fn centered_x(face: &FontFace, text: &str, size: f32, center_x: f32) -> f32 {
    center_x - face.text_width(text, size) / 2.0
}

/// Horizontal center of the title box for a card whose left edge is `x0`.
pub fn title_center_x(layout: &LayoutConfig, x0: f32) -> f32 {
    x0 + mm_to_pt(layout.dish_x_offset_mm) + mm_to_pt(layout.dish_box_width_mm) / 2.0
}

/// Left edges of `count` icons of `size` separated by `gap`, centered on `center_x`.
pub fn icon_lefts(center_x: f32, size: f32, gap: f32, count: usize) -> Vec<f32> {
    let total = count as f32 * size + count.saturating_sub(1) as f32 * gap;
    let start = center_x - total / 2.0;
    (0..count).map(|i| start + i as f32 * (size + gap)).collect()
}

/// Full-page template image, if configured. A missing file is skipped.
pub fn draw_page_background(surface: &mut dyn Surface, assets: &AssetPaths, warnings: &mut Warnings) {
    let Some(path) = assets.template_page.as_deref() else {
        return;
    };
    let page = surface.page_size();
    let full = Rect::new(0.0, 0.0, page.width, page.height);
    if let Err(e) = surface.draw_image(path, full, ImageFit::Stretch, 1.0) {
        warnings.push(format!("page template skipped: {}", e));
    }
}

/// Outer rectangle plus internal dividers.
pub fn draw_grid_lines(surface: &mut dyn Surface, grid: &GridGeometry, style: &StrokeStyle) {
    let (x, y, w, h) = grid.bounds();
    surface.stroke_rect(Rect::new(x, y, w, h), style);
    for (from, to) in grid.dividers() {
        surface.stroke_line(from, to, style);
    }
}

/// Draw one card with its bottom-left corner in cell (`row`, `col`).
pub fn draw_card(
    surface: &mut dyn Surface,
    ctx: &CardContext<'_>,
    item: &Item,
    row: usize,
    col: usize,
    warnings: &mut Warnings,
) {
    let layout = ctx.layout;
    let (x0, y0) = ctx.grid.cell_origin(row, col);

    if ctx.logo_enabled() {
        draw_logo(surface, ctx, x0, y0, warnings);
    }

    // Titles
    let center_x = title_center_x(layout, x0);
    let en_y = y0 + mm_to_pt(layout.dish_en_y_mm);
    let bold = ctx.fonts.face(&ctx.resolved.latin_bold);
    let en_x = centered_x(&bold, &item.name_en, layout.dish_en_size, center_x);
    surface.draw_text(&item.name_en, &bold, layout.dish_en_size, en_x, en_y, Color::BLACK);

    if !item.name_ar.is_empty() {
        let shaped = shape_rtl(&item.name_ar);
        let rtl_bold = ctx.fonts.face(&ctx.resolved.rtl_bold);
        let ar_y = en_y - mm_to_pt(layout.dish_ar_gap_mm);
        let ar_x = centered_x(&rtl_bold, &shaped, layout.dish_ar_size, center_x);
        surface.draw_text(&shaped, &rtl_bold, layout.dish_ar_size, ar_x, ar_y, Color::BLACK);
    }

    // Icons
    let icon_size = mm_to_pt(layout.icon_size_mm);
    let icon_gap = mm_to_pt(layout.icon_gap_mm);
    let icon_y = y0 + mm_to_pt(layout.icon_y_offset_mm);
    let icons = icon_triplet(item, ctx.assets);
    let lefts = icon_lefts(center_x, icon_size, icon_gap, icons.len());
    for (path, x) in icons.iter().zip(lefts) {
        let slot = Rect::new(x, icon_y, icon_size, icon_size);
        if let Err(e) = draw_icon(surface, path, slot) {
            warnings.push(format!("icon replaced by placeholder: {}", e));
            surface.stroke_rect(slot, &PLACEHOLDER_STYLE);
        }
    }

    // Macros
    if layout.show_macros {
        let regular = ctx.fonts.face(&ctx.resolved.latin_regular);
        let macro_x = x0 + mm_to_pt(layout.macro_x_offset_mm);
        let top = y0 + mm_to_pt(layout.macro_y_top_mm);
        let gap = mm_to_pt(layout.macro_line_gap_mm);
        for (n, line) in item.macro_lines().iter().enumerate() {
            let y = top - n as f32 * gap;
            surface.draw_text(line, &regular, layout.macro_size, macro_x, y, Color::BLACK);
        }
    }
}

fn draw_icon(surface: &mut dyn Surface, path: &Path, slot: Rect) -> Result<(), AssetError> {
    surface.draw_image(path, slot, ImageFit::Contain, 1.0)
}

fn draw_logo(surface: &mut dyn Surface, ctx: &CardContext<'_>, x0: f32, y0: f32, warnings: &mut Warnings) {
    let w = mm_to_pt(LOGO_W_MM);
    let h = mm_to_pt(LOGO_H_MM);
    let x = x0 + (ctx.grid.card_w - w) / 2.0;
    let y = y0 + ctx.grid.card_h - mm_to_pt(LOGO_PAD_TOP_MM) - h;
    if let Err(e) = surface.draw_image(&ctx.assets.logo, Rect::new(x, y, w, h), ImageFit::Contain, 1.0) {
        warnings.push(format!("logo skipped: {}", e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::{resolve_fonts, BuiltinFace};
    use crate::surface::{DrawOp, RecordingSurface};
    use crate::units::PageSize;
    use std::fs;

    #[test]
    fn test_centered_x_uses_measured_width() {
        let face = FontFace::builtin(BuiltinFace::TimesBold);
        let w = face.text_width("Mujaddara", 14.0);
        assert!((centered_x(&face, "Mujaddara", 14.0, 100.0) - (100.0 - w / 2.0)).abs() < 1e-4);
        // Same character count, different width
        assert_ne!(
            centered_x(&face, "iiii", 14.0, 100.0),
            centered_x(&face, "WWWW", 14.0, 100.0)
        );
    }

    #[test]
    fn test_icon_lefts_centered() {
        let lefts = icon_lefts(50.0, 10.0, 4.0, 3);
        assert_eq!(lefts, vec![31.0, 45.0, 59.0]);
        // Group spans 3*10 + 2*4 = 38, centered on 50
        assert_eq!(lefts[2] + 10.0 - lefts[0], 38.0);
    }

    #[test]
    fn test_missing_icons_get_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetPaths::from_dir(dir.path());
        fs::create_dir_all(dir.path().join("icons")).unwrap();
        fs::write(&assets.icon_gluten_free, b"png").unwrap();
        fs::write(&assets.icon_dairy_free, b"png").unwrap();

        let layout = LayoutConfig::defaults();
        let mut registry = FontRegistry::new();
        let resolved = resolve_fonts(&mut registry, &assets);
        let ctx = CardContext {
            layout: &layout,
            grid: layout.grid(),
            assets: &assets,
            fonts: &registry,
            resolved: &resolved,
            draw_logo: false,
        };

        let mut surface = RecordingSurface::new(PageSize::a4());
        let mut warnings = Warnings::default();
        draw_card(&mut surface, &ctx, &Item::new("Lentil Soup", ""), 0, 0, &mut warnings);

        let images: Vec<Rect> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        let placeholders: Vec<Rect> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::StrokeRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();

        assert_eq!(images.len(), 2);
        assert_eq!(placeholders.len(), 1);
        // The veg icon sits between the two drawn icons with the same box.
        assert!(images[0].x < placeholders[0].x && placeholders[0].x < images[1].x);
        assert_eq!(placeholders[0].w, images[0].w);
        assert_eq!(placeholders[0].y, images[0].y);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_macros_hidden_when_disabled() {
        let assets = AssetPaths::from_dir(Path::new("/none"));
        let layout = LayoutConfig {
            show_macros: false,
            ..LayoutConfig::defaults()
        };
        let mut registry = FontRegistry::new();
        let resolved = resolve_fonts(&mut registry, &assets);
        let ctx = CardContext {
            layout: &layout,
            grid: layout.grid(),
            assets: &assets,
            fonts: &registry,
            resolved: &resolved,
            draw_logo: false,
        };
        let mut surface = RecordingSurface::new(PageSize::a4());
        draw_card(&mut surface, &ctx, &Item::new("Tabbouleh", ""), 1, 1, &mut Warnings::default());
        assert_eq!(surface.texts().len(), 1);
    }
}
