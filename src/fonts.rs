//! Font registry and resolver
//!
//! Logical font names map to either a built-in PDF face or a TrueType file.
//! The registry is owned by the render session and is append-only: a name
//! that is already registered is never re-read or replaced.

use fontdue::{Font, FontSettings};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::assets::AssetPaths;
use crate::hashing::sha256_hex;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("Failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid font data in {path}: {reason}")]
    InvalidFontData { path: PathBuf, reason: String },
}

/// Built-in serif faces every PDF viewer provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFace {
    TimesRoman,
    TimesBold,
}

// Advance widths per 1000 em for ASCII 32..=126 (Adobe core font metrics).
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

const FALLBACK_WIDTH: u16 = 500;

impl BuiltinFace {
    pub fn logical_name(self) -> &'static str {
        match self {
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
        }
    }

    fn advance(self, ch: char) -> u16 {
        let table = match self {
            Self::TimesRoman => &TIMES_ROMAN_WIDTHS,
            Self::TimesBold => &TIMES_BOLD_WIDTHS,
        };
        match ch as u32 {
            c @ 32..=126 => table[(c - 32) as usize],
            _ => FALLBACK_WIDTH,
        }
    }
}

#[derive(Clone)]
pub enum FontSource {
    Builtin(BuiltinFace),
    External {
        path: PathBuf,
        data: Arc<Vec<u8>>,
        metrics: Arc<Font>,
    },
}

impl std::fmt::Debug for FontSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin(face) => write!(f, "Builtin({:?})", face),
            Self::External { path, .. } => write!(f, "External({})", path.display()),
        }
    }
}

/// A registered font: logical name plus where its glyphs come from.
#[derive(Debug, Clone)]
pub struct FontFace {
    pub name: String,
    pub source: FontSource,
}

impl FontFace {
    pub fn builtin(face: BuiltinFace) -> Self {
        Self {
            name: face.logical_name().to_string(),
            source: FontSource::Builtin(face),
        }
    }

    /// Measured width of `text` at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        match &self.source {
            FontSource::Builtin(face) => {
                let units: u32 = text.chars().map(|c| face.advance(c) as u32).sum();
                units as f32 * size / 1000.0
            }
            FontSource::External { metrics, .. } => text
                .chars()
                .map(|c| metrics.metrics(c, size).advance_width)
                .sum(),
        }
    }
}

/// Session-owned font table keyed by logical name.
pub struct FontRegistry {
    faces: HashMap<String, FontFace>,
}

impl FontRegistry {
    pub fn new() -> Self {
        let mut faces = HashMap::new();
        for face in [BuiltinFace::TimesRoman, BuiltinFace::TimesBold] {
            faces.insert(face.logical_name().to_string(), FontFace::builtin(face));
        }
        Self { faces }
    }

    /// Register a TrueType file under `name`. Registering an existing name is a no-op.
    pub fn register_file(&mut self, name: &str, path: &Path) -> Result<(), FontError> {
        if self.faces.contains_key(name) {
            return Ok(());
        }
        let data = fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let metrics = Font::from_bytes(data.as_slice(), FontSettings::default()).map_err(|reason| {
            FontError::InvalidFontData {
                path: path.to_path_buf(),
                reason: reason.to_string(),
            }
        })?;
        self.faces.insert(
            name.to_string(),
            FontFace {
                name: name.to_string(),
                source: FontSource::External {
                    path: path.to_path_buf(),
                    data: Arc::new(data),
                    metrics: Arc::new(metrics),
                },
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FontFace> {
        self.faces.get(name)
    }

    /// Look up a face, falling back to Times-Roman for unknown names.
    pub fn face(&self, name: &str) -> FontFace {
        self.faces
            .get(name)
            .cloned()
            .unwrap_or_else(|| FontFace::builtin(BuiltinFace::TimesRoman))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.faces.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The four font roles a card uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    LatinRegular,
    LatinBold,
    RtlRegular,
    RtlBold,
}

impl FontRole {
    /// Registry name for a custom file in this role, one per file, so a
    /// reused registry never hands back a different file's face.
    pub fn face_name(self, path: &Path) -> String {
        let digest = sha256_hex(path.to_string_lossy().as_bytes());
        format!("{}-{}", self.logical_name(), &digest[..12])
    }

    /// Prefix shared by every custom file registered for this role.
    pub fn logical_name(self) -> &'static str {
        match self {
            Self::LatinRegular => "CardLatinRegular",
            Self::LatinBold => "CardLatinBold",
            Self::RtlRegular => "CardRtlRegular",
            Self::RtlBold => "CardRtlBold",
        }
    }

    /// Built-in face used when nothing better is available.
    pub fn builtin(self) -> BuiltinFace {
        match self {
            Self::LatinRegular | Self::RtlRegular => BuiltinFace::TimesRoman,
            Self::LatinBold | Self::RtlBold => BuiltinFace::TimesBold,
        }
    }
}

/// Why a role did not get its custom font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontFallback {
    NotConfigured,
    Missing(PathBuf),
    Unreadable { path: PathBuf, reason: String },
}

impl FontFallback {
    /// Only configured-but-unusable files are worth reporting.
    pub fn warning(&self, role: FontRole) -> Option<String> {
        match self {
            Self::NotConfigured => None,
            Self::Missing(path) => Some(format!(
                "{:?} font not found at {}, using fallback",
                role,
                path.display()
            )),
            Self::Unreadable { path, reason } => Some(format!(
                "{:?} font at {} unreadable ({}), using fallback",
                role,
                path.display(),
                reason
            )),
        }
    }
}

/// Logical names chosen for each role, plus any fallbacks taken.
#[derive(Debug, Clone)]
pub struct ResolvedFonts {
    pub latin_regular: String,
    pub latin_bold: String,
    pub rtl_regular: String,
    pub rtl_bold: String,
    pub fallbacks: Vec<(FontRole, FontFallback)>,
}

impl ResolvedFonts {
    pub fn warnings(&self) -> Vec<String> {
        self.fallbacks
            .iter()
            .filter_map(|(role, fallback)| fallback.warning(*role))
            .collect()
    }
}

/// Try to register the custom file for one role.
pub fn resolve_face(
    registry: &mut FontRegistry,
    role: FontRole,
    path: Option<&Path>,
) -> Result<String, FontFallback> {
    let path = path.ok_or(FontFallback::NotConfigured)?;
    if !path.is_file() {
        return Err(FontFallback::Missing(path.to_path_buf()));
    }
    let name = role.face_name(path);
    registry
        .register_file(&name, path)
        .map_err(|e| FontFallback::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(name)
}

/// Resolve all four roles. Never fails; fallbacks are recorded and logged.
///
/// Order per script: custom regular, then custom bold falling back to the
/// custom regular, then the built-in face for the role.
pub fn resolve_fonts(registry: &mut FontRegistry, assets: &AssetPaths) -> ResolvedFonts {
    let mut fallbacks = Vec::new();

    let (latin_regular, latin_bold) = resolve_pair(
        registry,
        (FontRole::LatinRegular, assets.font_latin.as_deref()),
        (FontRole::LatinBold, assets.font_latin_bold.as_deref()),
        &mut fallbacks,
    );
    let (rtl_regular, rtl_bold) = resolve_pair(
        registry,
        (FontRole::RtlRegular, assets.font_arabic.as_deref()),
        (FontRole::RtlBold, assets.font_arabic_bold.as_deref()),
        &mut fallbacks,
    );

    for (role, fallback) in &fallbacks {
        if let Some(message) = fallback.warning(*role) {
            tracing::warn!("{}", message);
        }
    }

    ResolvedFonts {
        latin_regular,
        latin_bold,
        rtl_regular,
        rtl_bold,
        fallbacks,
    }
}

fn resolve_pair(
    registry: &mut FontRegistry,
    regular: (FontRole, Option<&Path>),
    bold: (FontRole, Option<&Path>),
    fallbacks: &mut Vec<(FontRole, FontFallback)>,
) -> (String, String) {
    let custom_regular = match resolve_face(registry, regular.0, regular.1) {
        Ok(name) => Some(name),
        Err(fallback) => {
            fallbacks.push((regular.0, fallback));
            None
        }
    };

    let bold_name = match resolve_face(registry, bold.0, bold.1) {
        Ok(name) => name,
        Err(fallback) => {
            fallbacks.push((bold.0, fallback));
            custom_regular
                .clone()
                .unwrap_or_else(|| bold.0.builtin().logical_name().to_string())
        }
    };

    let regular_name =
        custom_regular.unwrap_or_else(|| regular.0.builtin().logical_name().to_string());
    (regular_name, bold_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_builtin_width_from_metrics() {
        let face = FontFace::builtin(BuiltinFace::TimesRoman);
        assert!((face.text_width("A", 10.0) - 7.22).abs() < 1e-4);
        let bold = FontFace::builtin(BuiltinFace::TimesBold);
        assert!((bold.text_width("Wm", 10.0) - 18.33).abs() < 1e-4);
    }

    #[test]
    fn test_width_scales_with_size() {
        let face = FontFace::builtin(BuiltinFace::TimesBold);
        let w10 = face.text_width("Hummus", 10.0);
        let w20 = face.text_width("Hummus", 20.0);
        assert!((w20 - 2.0 * w10).abs() < 1e-4);
    }

    #[test]
    fn test_no_paths_use_builtins() {
        let mut registry = FontRegistry::new();
        let assets = AssetPaths::from_dir(Path::new("/nowhere"));
        let fonts = resolve_fonts(&mut registry, &assets);

        assert_eq!(fonts.latin_regular, "Times-Roman");
        assert_eq!(fonts.latin_bold, "Times-Bold");
        assert_eq!(fonts.rtl_regular, "Times-Roman");
        assert_eq!(fonts.rtl_bold, "Times-Bold");
        assert!(fonts.warnings().is_empty());
    }

    #[test]
    fn test_missing_file_is_reported_not_fatal() {
        let mut registry = FontRegistry::new();
        let mut assets = AssetPaths::from_dir(Path::new("/nowhere"));
        assets.font_arabic = Some(PathBuf::from("/nowhere/fonts/Amiri-Regular.ttf"));

        let fonts = resolve_fonts(&mut registry, &assets);
        assert_eq!(fonts.rtl_regular, "Times-Roman");
        assert_eq!(fonts.warnings().len(), 1);
        assert!(matches!(
            resolve_face(&mut registry, FontRole::RtlRegular, assets.font_arabic.as_deref()),
            Err(FontFallback::Missing(_))
        ));
    }

    #[test]
    fn test_unreadable_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("broken.ttf");
        fs::write(&bogus, b"not a font").unwrap();

        let mut registry = FontRegistry::new();
        let result = resolve_face(&mut registry, FontRole::LatinBold, Some(&bogus));
        assert!(matches!(result, Err(FontFallback::Unreadable { .. })));
        assert!(!registry.contains(&FontRole::LatinBold.face_name(&bogus)));
    }

    #[test]
    fn test_register_same_name_twice_is_noop() {
        let mut registry = FontRegistry::new();
        let before = registry.len();
        // Name already taken by a built-in, so the file is never opened.
        registry
            .register_file("Times-Roman", Path::new("/does/not/exist.ttf"))
            .unwrap();
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn test_face_name_is_per_file() {
        let a = Path::new("/fonts/DejaVuSans-Bold.ttf");
        let b = Path::new("/fonts/Amiri-Bold.ttf");
        let role = FontRole::LatinBold;
        assert_eq!(role.face_name(a), role.face_name(a));
        assert_ne!(role.face_name(a), role.face_name(b));
        assert_ne!(role.face_name(a), FontRole::RtlBold.face_name(a));
        assert!(role.face_name(a).starts_with("CardLatinBold-"));
    }

    #[test]
    fn test_reused_registry_reads_new_file_for_role() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.ttf");
        let second = dir.path().join("second.ttf");
        fs::write(&second, b"not a font").unwrap();

        let mut registry = FontRegistry::new();
        // Stand-in for a face registered by an earlier render for this role.
        registry.faces.insert(
            FontRole::LatinBold.face_name(&first),
            FontFace::builtin(BuiltinFace::TimesBold),
        );
        // The new file gets its own name, so it is actually opened.
        let result = resolve_face(&mut registry, FontRole::LatinBold, Some(&second));
        assert!(matches!(result, Err(FontFallback::Unreadable { .. })));
    }

    #[test]
    fn test_unknown_face_falls_back_to_roman() {
        let registry = FontRegistry::new();
        assert_eq!(registry.face("Nope").name, "Times-Roman");
    }
}
