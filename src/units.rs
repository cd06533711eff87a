//! Unit Converter
//!
//! Layout values are declared in millimeters; the PDF surface works in points.

use serde::{Deserialize, Serialize};

/// Points per millimeter (1 pt = 1/72 inch).
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// A4 sheet in millimeters.
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// Convert a millimeter distance into native points.
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// Convert native points back into millimeters.
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / PT_PER_MM
}

/// Page dimensions in native points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn a4() -> Self {
        Self {
            width: mm_to_pt(A4_WIDTH_MM),
            height: mm_to_pt(A4_HEIGHT_MM),
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::a4()
    }
}
