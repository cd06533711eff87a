//! Layout Configuration - Tunable Card Geometry
//!
//! All distances are millimeters. A config is built from compiled-in
//! defaults and optionally overridden key by key from a JSON object.
//! Loading never fails: unknown keys are ignored, a value of the wrong shape
//! keeps the default, and an unreadable file yields the defaults.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::units::mm_to_pt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    // Grid
    pub cols: usize,
    pub rows: usize,
    pub grid_x_mm: f32,
    pub grid_y_mm: f32,
    pub card_w_mm: f32,
    pub card_h_mm: f32,
    pub draw_grid_lines: bool,
    pub draw_logo: bool,

    // Title
    pub dish_x_offset_mm: f32,
    pub dish_box_width_mm: f32,
    pub dish_en_y_mm: f32,
    pub dish_ar_gap_mm: f32,
    pub dish_en_size: f32,
    pub dish_ar_size: f32,

    // Icons. `icon_x_offset_mm` is persisted for calibration files but the
    // triplet is always centered under the title.
    pub icon_x_offset_mm: f32,
    pub icon_y_offset_mm: f32,
    pub icon_size_mm: f32,
    pub icon_gap_mm: f32,

    // Macro block
    pub show_macros: bool,
    pub macro_x_offset_mm: f32,
    pub macro_y_top_mm: f32,
    pub macro_line_gap_mm: f32,
    pub macro_size: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cols: 2,
            rows: 3,
            grid_x_mm: 7.2,
            grid_y_mm: 26.0,
            card_w_mm: 98.8,
            card_h_mm: 79.2,
            draw_grid_lines: true,
            draw_logo: false,
            dish_x_offset_mm: 0.0,
            dish_box_width_mm: 51.752,
            dish_en_y_mm: 53.5,
            dish_ar_gap_mm: 8.6,
            dish_en_size: 14.0,
            dish_ar_size: 13.0,
            icon_x_offset_mm: 4.9,
            icon_y_offset_mm: 27.6,
            icon_size_mm: 11.938,
            icon_gap_mm: 4.49,
            show_macros: true,
            macro_x_offset_mm: 49.6,
            macro_y_top_mm: 48.0,
            macro_line_gap_mm: 5.9,
            macro_size: 10.5,
        }
    }
}

/// Named starting points for a tuning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutProfile {
    #[default]
    Full,
    NoMacros,
}

impl std::str::FromStr for LayoutProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "no-macros" => Ok(Self::NoMacros),
            other => Err(format!("unknown layout profile: {}", other)),
        }
    }
}

/// A value an override entry can be coerced into.
trait OverrideValue: Sized {
    fn from_override(value: &Value) -> Option<Self>;
}

impl OverrideValue for f32 {
    fn from_override(value: &Value) -> Option<Self> {
        value.as_f64().map(|v| v as f32).filter(|v| v.is_finite())
    }
}

impl OverrideValue for bool {
    fn from_override(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl OverrideValue for usize {
    fn from_override(value: &Value) -> Option<Self> {
        value
            .as_u64()
            .filter(|v| *v >= 1)
            .and_then(|v| usize::try_from(v).ok())
    }
}

macro_rules! merge_fields {
    ($config:ident, $overrides:ident, $($field:ident),+ $(,)?) => {
        $(
            if let Some(raw) = $overrides.get(stringify!($field)) {
                match OverrideValue::from_override(raw) {
                    Some(value) => $config.$field = value,
                    None => tracing::warn!(
                        "layout override {} has unusable value {}, keeping default",
                        stringify!($field),
                        raw
                    ),
                }
            }
        )+
    };
}

impl LayoutConfig {
    pub fn defaults() -> Self {
        Self::default()
    }

    pub fn for_profile(profile: LayoutProfile) -> Self {
        match profile {
            LayoutProfile::Full => Self::default(),
            LayoutProfile::NoMacros => Self {
                show_macros: false,
                dish_box_width_mm: 98.8,
                dish_en_y_mm: 49.0,
                dish_ar_gap_mm: 10.0,
                dish_en_size: 16.0,
                dish_ar_size: 15.0,
                icon_size_mm: 13.2,
                icon_gap_mm: 5.0,
                icon_y_offset_mm: 24.0,
                ..Self::default()
            },
        }
    }

    /// Merge `overrides` over the defaults.
    pub fn load(overrides: &Map<String, Value>) -> Self {
        Self::default().merged(overrides)
    }

    /// Return a copy with every recognized, well-typed key replaced.
    pub fn merged(&self, overrides: &Map<String, Value>) -> Self {
        let mut config = self.clone();
        merge_fields!(
            config,
            overrides,
            cols,
            rows,
            grid_x_mm,
            grid_y_mm,
            card_w_mm,
            card_h_mm,
            draw_grid_lines,
            draw_logo,
            dish_x_offset_mm,
            dish_box_width_mm,
            dish_en_y_mm,
            dish_ar_gap_mm,
            dish_en_size,
            dish_ar_size,
            icon_x_offset_mm,
            icon_y_offset_mm,
            icon_size_mm,
            icon_gap_mm,
            show_macros,
            macro_x_offset_mm,
            macro_y_top_mm,
            macro_line_gap_mm,
            macro_size,
        );
        config
    }

    /// Load an override file over the defaults.
    pub fn load_file(path: &Path) -> Self {
        Self::default().merged_file(path)
    }

    /// Load an override file over `self`. Missing or corrupt files leave `self` unchanged.
    pub fn merged_file(&self, path: &Path) -> Self {
        if !path.exists() {
            return self.clone();
        }
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("layout file {} unreadable: {}", path.display(), e);
                return self.clone();
            }
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => self.merged(&map),
            Ok(_) => {
                tracing::warn!("layout file {} is not a JSON object", path.display());
                self.clone()
            }
            Err(e) => {
                tracing::warn!("layout file {} is not valid JSON: {}", path.display(), e);
                self.clone()
            }
        }
    }

    /// The full record as a key/value mapping, the shape override files use.
    pub fn to_overrides(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Persist the full record as pretty JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    pub fn cells_per_page(&self) -> usize {
        self.rows.max(1) * self.cols.max(1)
    }

    /// Geometry in points. A zero row or column count is treated as one.
    pub fn grid(&self) -> GridGeometry {
        GridGeometry {
            origin_x: mm_to_pt(self.grid_x_mm),
            origin_y: mm_to_pt(self.grid_y_mm),
            card_w: mm_to_pt(self.card_w_mm),
            card_h: mm_to_pt(self.card_h_mm),
            cols: self.cols.max(1),
            rows: self.rows.max(1),
        }
    }

    /// Serde hook that reads a layout object like an override file: per-field
    /// fallback over the defaults instead of failing the whole record.
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Self::load(&map)),
            Value::Null => Ok(Self::defaults()),
            other => {
                tracing::warn!("layout {} is not an object, using defaults", other);
                Ok(Self::defaults())
            }
        }
    }
}

/// Grid placement in points, shared by the card renderer and the debug overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub origin_x: f32,
    pub origin_y: f32,
    pub card_w: f32,
    pub card_h: f32,
    pub cols: usize,
    pub rows: usize,
}

impl GridGeometry {
    pub fn width(&self) -> f32 {
        self.card_w * self.cols as f32
    }

    pub fn height(&self) -> f32 {
        self.card_h * self.rows as f32
    }

    /// Bottom-left corner of a cell. Row 0 is the top row, so its y is the largest.
    pub fn cell_origin(&self, row: usize, col: usize) -> (f32, f32) {
        let x = self.origin_x + col as f32 * self.card_w;
        let y = self.origin_y + (self.rows - 1 - row) as f32 * self.card_h;
        (x, y)
    }

    /// Outer rectangle as (x, y, w, h).
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (self.origin_x, self.origin_y, self.width(), self.height())
    }

    /// Internal divider segments: `cols - 1` vertical then `rows - 1` horizontal.
    pub fn dividers(&self) -> Vec<((f32, f32), (f32, f32))> {
        let (x, y, w, h) = self.bounds();
        let vertical = (1..self.cols).map(|c| {
            let dx = x + c as f32 * self.card_w;
            ((dx, y), (dx, y + h))
        });
        let horizontal = (1..self.rows).map(|r| {
            let dy = y + r as f32 * self.card_h;
            ((x, dy), (x + w, dy))
        });
        vertical.chain(horizontal).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_unknown_key_ignored() {
        let config = LayoutConfig::load(&object(json!({"bogus_field": 1, "grid_x_mm": 9.5})));
        let expected = LayoutConfig {
            grid_x_mm: 9.5,
            ..LayoutConfig::defaults()
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn test_wrong_type_keeps_default() {
        let config = LayoutConfig::load(&object(json!({
            "card_w_mm": "wide",
            "draw_grid_lines": 0,
            "rows": 0,
            "macro_size": 11
        })));
        assert_eq!(config.card_w_mm, 98.8);
        assert!(config.draw_grid_lines);
        assert_eq!(config.rows, 3);
        assert_eq!(config.macro_size, 11.0);
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout_config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(LayoutConfig::load_file(&path), LayoutConfig::defaults());
    }

    #[test]
    fn test_non_object_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout_config.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert_eq!(LayoutConfig::load_file(&path), LayoutConfig::defaults());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        assert_eq!(
            LayoutConfig::load_file(Path::new("/no/such/layout.json")),
            LayoutConfig::defaults()
        );
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout_no_macros.json");
        let profile = LayoutConfig::for_profile(LayoutProfile::NoMacros);
        profile.save(&path).unwrap();
        assert_eq!(LayoutConfig::load_file(&path), profile);
    }

    #[test]
    fn test_overrides_cover_every_field() {
        let map = LayoutConfig::defaults().to_overrides();
        assert_eq!(map.len(), 23);
        assert_eq!(LayoutConfig::load(&map), LayoutConfig::defaults());
    }

    #[test]
    fn test_row_zero_is_topmost() {
        let grid = LayoutConfig::defaults().grid();
        let (_, top) = grid.cell_origin(0, 0);
        let (_, bottom) = grid.cell_origin(2, 0);
        assert!(top > bottom);
        assert!((bottom - grid.origin_y).abs() < 1e-4);
        assert!((top - (grid.origin_y + 2.0 * grid.card_h)).abs() < 1e-3);
    }

    #[test]
    fn test_dividers_for_two_by_three() {
        let grid = LayoutConfig::defaults().grid();
        let dividers = grid.dividers();
        assert_eq!(dividers.len(), 3);
        let vertical = dividers.iter().filter(|(a, b)| a.0 == b.0).count();
        assert_eq!(vertical, 1);
    }

    #[test]
    fn test_zero_rows_clamped_in_geometry() {
        let config = LayoutConfig {
            rows: 0,
            cols: 0,
            ..LayoutConfig::defaults()
        };
        let grid = config.grid();
        assert_eq!((grid.rows, grid.cols), (1, 1));
        assert_eq!(config.cells_per_page(), 1);
        let (_, y) = grid.cell_origin(0, 0);
        assert!((y - grid.origin_y).abs() < 1e-4);
    }

    #[test]
    fn test_lenient_deserialize_falls_back_per_field() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(deserialize_with = "LayoutConfig::deserialize_lenient")]
            layout: LayoutConfig,
        }
        let wrapper: Wrapper =
            serde_json::from_value(json!({"layout": {"rows": 0, "dish_en_size": 15}})).unwrap();
        assert_eq!(wrapper.layout.rows, 3);
        assert_eq!(wrapper.layout.dish_en_size, 15.0);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!("no-macros".parse::<LayoutProfile>().unwrap(), LayoutProfile::NoMacros);
        assert!("compact".parse::<LayoutProfile>().is_err());
    }
}
