//! Card Sheet Core - Menu Card Layout Engine
//!
//! Fills an A4 page with a 2 x 3 grid of menu cards: a bilingual title,
//! three dietary icons and an optional four-line nutrition block per card.
//!
//! # Ground Rules
//! 1. One layout record drives every coordinate
//! 2. Missing assets degrade, never abort
//! 3. Preflight runs before the first page
//! 4. The debug overlay only reads geometry

pub mod units;
pub mod item;
pub mod assets;
pub mod fonts;
pub mod shaping;
pub mod layout;
pub mod paginate;
pub mod surface;
pub mod pdf;
pub mod card;
pub mod overlay;
pub mod validation;
pub mod hashing;
pub mod render;

pub use item::{format_amount, Dairy, Gluten, Item, Nutrients, ProteinKind};
pub use assets::{icon_triplet, AssetPaths};
pub use fonts::{resolve_fonts, FontFallback, FontRegistry, FontRole, ResolvedFonts};
pub use shaping::shape_rtl;
pub use layout::{GridGeometry, LayoutConfig, LayoutProfile};
pub use paginate::{page_count, paginate, placement};
pub use surface::{DrawOp, RecordingSurface, Surface};
pub use overlay::{DebugOverlay, DebugOverlayOptions};
pub use validation::{PreflightResult, PreflightRule, ValidationViolation, Validator, ViolationSeverity};
pub use hashing::{canonical_json, layout_fingerprint};
pub use render::{
    generate_cards_pdf, render_document, render_pages, RenderError, RenderOptions, RenderReport,
    Warnings,
};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
