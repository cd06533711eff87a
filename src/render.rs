//! Render Session - Single Entry Point
//!
//! CRITICAL: `render_document` runs preflight before the first page exists.
//! A blocking violation aborts with nothing drawn and nothing written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::assets::AssetPaths;
use crate::card::{draw_card, draw_grid_lines, draw_page_background, CardContext, GRID_LINE_STYLE};
use crate::fonts::{resolve_fonts, FontRegistry};
use crate::hashing::{compute_job_hash, layout_fingerprint};
use crate::item::Item;
use crate::layout::LayoutConfig;
use crate::overlay::{DebugOverlay, DebugOverlayOptions};
use crate::paginate::paginate;
use crate::pdf::{PdfSurface, SaveError};
use crate::shaping::SHAPING_AVAILABLE;
use crate::surface::Surface;
use crate::units::PageSize;
use crate::validation::{PreflightInput, Validator};
use crate::ENGINE_VERSION;

pub const DEFAULT_TITLE: &str = "Menu Cards";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No items to render")]
    NoItems,

    #[error("Item {index} has an empty primary title")]
    EmptyTitle { index: usize },

    #[error("Preflight failed: {0}")]
    Preflight(String),

    #[error("Failed to prepare output {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Degradations met during one render, in the order they happened.
///
/// Repeats of the same message are kept once; every new one is logged.
#[derive(Debug, Clone, Default)]
pub struct Warnings {
    messages: Vec<String>,
}

impl Warnings {
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.messages.contains(&message) {
            return;
        }
        tracing::warn!("{}", message);
        self.messages.push(message);
    }

    /// Record messages that were already logged where they happened.
    pub fn absorb(&mut self, messages: impl IntoIterator<Item = String>) {
        for message in messages {
            if !self.messages.contains(&message) {
                self.messages.push(message);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.messages
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

/// Per-call options. Everything has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default, deserialize_with = "LayoutConfig::deserialize_lenient")]
    pub layout: LayoutConfig,
    /// OR-ed with `layout.draw_logo`.
    #[serde(default)]
    pub draw_logo: bool,
    #[serde(default)]
    pub debug: DebugOverlayOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: default_title(),
            layout: LayoutConfig::defaults(),
            draw_logo: false,
            debug: DebugOverlayOptions::default(),
        }
    }
}

/// Result of drawing onto a surface.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub pages: usize,
    pub warnings: Warnings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderReport {
    pub output: PathBuf,
    pub pages: usize,
    pub items: usize,
    pub layout_fingerprint: String,
    pub job_hash: String,
    pub engine_version: String,
    /// False when right-to-left titles were drawn unshaped.
    pub shaping: bool,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Run preflight and turn blocking violations into a fatal error.
pub fn preflight(items: &[Item], assets: &AssetPaths, options: &RenderOptions) -> Result<(), RenderError> {
    if items.is_empty() {
        return Err(RenderError::NoItems);
    }
    let result = Validator::new().validate(&PreflightInput {
        items,
        assets,
        logo_enabled: options.draw_logo || options.layout.draw_logo,
    });
    for warning in result.warnings() {
        tracing::debug!("preflight {}: {}", warning.rule, warning.message);
    }
    if result.valid {
        return Ok(());
    }
    if let Some(index) = result.errors().find_map(|v| v.item_index) {
        return Err(RenderError::EmptyTitle { index });
    }
    let messages: Vec<_> = result
        .errors()
        .map(|v| format!("{}: {}", v.rule, v.message))
        .collect();
    Err(RenderError::Preflight(messages.join("; ")))
}

/// Draw every page for `items`. Zero items draw zero pages.
///
/// Per page: background, debug overlay, grid lines, then cards in row-major order.
pub fn render_pages(
    surface: &mut dyn Surface,
    items: &[Item],
    assets: &AssetPaths,
    options: &RenderOptions,
    registry: &mut FontRegistry,
) -> RenderOutcome {
    let mut warnings = Warnings::default();
    let layout = &options.layout;

    let resolved = resolve_fonts(registry, assets);
    warnings.absorb(resolved.warnings());
    let overlay = DebugOverlay::prepare(&options.debug, &mut warnings);

    let ctx = CardContext {
        layout,
        grid: layout.grid(),
        assets,
        fonts: &*registry,
        resolved: &resolved,
        draw_logo: options.draw_logo,
    };

    let mut pages = 0;
    for sheet in paginate(items, ctx.grid.rows, ctx.grid.cols) {
        surface.begin_page();
        draw_page_background(surface, assets, &mut warnings);
        if let Some(overlay) = &overlay {
            overlay.draw(surface, &ctx.grid, &mut warnings);
        }
        if ctx.grid_lines_enabled() {
            draw_grid_lines(surface, &ctx.grid, &GRID_LINE_STYLE);
        }
        for slot in &sheet.slots {
            draw_card(surface, &ctx, slot.item, slot.row, slot.col, &mut warnings);
        }
        surface.end_page();
        pages += 1;
        tracing::debug!("page {} done with {} cards", sheet.number + 1, sheet.slots.len());
    }

    RenderOutcome { pages, warnings }
}

/// Preflight, then draw. Nothing reaches `surface` when preflight fails.
pub fn render_document(
    surface: &mut dyn Surface,
    items: &[Item],
    assets: &AssetPaths,
    options: &RenderOptions,
    registry: &mut FontRegistry,
) -> Result<RenderOutcome, RenderError> {
    preflight(items, assets, options)?;
    Ok(render_pages(surface, items, assets, options, registry))
}

/// Render `items` to a PDF at `out_path`.
///
/// This is the ONLY entry point that writes a document.
pub fn generate_cards_pdf(
    items: &[Item],
    out_path: &Path,
    assets: &AssetPaths,
    options: &RenderOptions,
) -> Result<RenderReport, RenderError> {
    preflight(items, assets, options)?;

    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| RenderError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut registry = FontRegistry::new();
    let mut surface = PdfSurface::new(&options.title, PageSize::a4());
    let outcome = render_pages(&mut surface, items, assets, options, &mut registry);
    surface.save(out_path)?;

    tracing::info!(
        "wrote {} pages for {} items to {}",
        outcome.pages,
        items.len(),
        out_path.display()
    );

    Ok(RenderReport {
        output: out_path.to_path_buf(),
        pages: outcome.pages,
        items: items.len(),
        layout_fingerprint: layout_fingerprint(&options.layout)?,
        job_hash: compute_job_hash(&options.layout, items, ENGINE_VERSION)?,
        engine_version: ENGINE_VERSION.to_string(),
        shaping: SHAPING_AVAILABLE,
        warnings: outcome.warnings.into_vec(),
        generated_at: Utc::now(),
    })
}
