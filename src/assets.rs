//! Asset paths and icon selection

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::item::{Dairy, Gluten, Item, ProteinKind};

/// File-system assets used by one render call. Never written to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPaths {
    pub logo: PathBuf,
    pub icon_gluten: PathBuf,
    pub icon_gluten_free: PathBuf,
    pub icon_veg: PathBuf,
    pub icon_meat: PathBuf,
    pub icon_dairy: PathBuf,
    pub icon_dairy_free: PathBuf,
    /// Full-page template image. When set, grid lines and logo are suppressed.
    #[serde(default)]
    pub template_page: Option<PathBuf>,
    #[serde(default)]
    pub font_latin: Option<PathBuf>,
    #[serde(default)]
    pub font_latin_bold: Option<PathBuf>,
    #[serde(default)]
    pub font_arabic: Option<PathBuf>,
    #[serde(default)]
    pub font_arabic_bold: Option<PathBuf>,
}

impl AssetPaths {
    /// Conventional layout under one directory: `logo.png`, `icons/*.png`.
    pub fn from_dir(dir: &Path) -> Self {
        let icons = dir.join("icons");
        Self {
            logo: dir.join("logo.png"),
            icon_gluten: icons.join("gluten.png"),
            icon_gluten_free: icons.join("gluten_free.png"),
            icon_veg: icons.join("veg.png"),
            icon_meat: icons.join("meat.png"),
            icon_dairy: icons.join("dairy.png"),
            icon_dairy_free: icons.join("dairy_free.png"),
            template_page: None,
            font_latin: None,
            font_latin_bold: None,
            font_arabic: None,
            font_arabic_bold: None,
        }
    }

    /// Every required image path, for preflight checks.
    pub fn required_images(&self) -> [(&'static str, &Path); 7] {
        [
            ("logo", &self.logo),
            ("icon_gluten", &self.icon_gluten),
            ("icon_gluten_free", &self.icon_gluten_free),
            ("icon_veg", &self.icon_veg),
            ("icon_meat", &self.icon_meat),
            ("icon_dairy", &self.icon_dairy),
            ("icon_dairy_free", &self.icon_dairy_free),
        ]
    }

    pub fn has_template_page(&self) -> bool {
        self.template_page.is_some()
    }
}

/// Pick one icon per attribute, always as [gluten, protein, dairy].
pub fn icon_triplet<'a>(item: &Item, assets: &'a AssetPaths) -> [&'a Path; 3] {
    let gluten = match item.gluten {
        Gluten::Gluten => &assets.icon_gluten,
        Gluten::GlutenFree => &assets.icon_gluten_free,
    };
    let protein = match item.protein_type {
        ProteinKind::Veg => &assets.icon_veg,
        ProteinKind::Meat => &assets.icon_meat,
    };
    let dairy = match item.dairy {
        Dairy::Dairy => &assets.icon_dairy,
        Dairy::DairyFree => &assets.icon_dairy_free,
    };
    [gluten.as_path(), protein.as_path(), dairy.as_path()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_order_fixed() {
        let assets = AssetPaths::from_dir(Path::new("/a"));
        let mut item = Item::new("Kofta", "");
        item.gluten = Gluten::Gluten;
        item.protein_type = ProteinKind::Meat;
        item.dairy = Dairy::Dairy;

        let icons = icon_triplet(&item, &assets);
        assert_eq!(icons[0], Path::new("/a/icons/gluten.png"));
        assert_eq!(icons[1], Path::new("/a/icons/meat.png"));
        assert_eq!(icons[2], Path::new("/a/icons/dairy.png"));
    }

    #[test]
    fn test_icon_defaults_pick_free_variants() {
        let assets = AssetPaths::from_dir(Path::new("/a"));
        let icons = icon_triplet(&Item::new("Salad", ""), &assets);
        assert_eq!(icons[0], Path::new("/a/icons/gluten_free.png"));
        assert_eq!(icons[1], Path::new("/a/icons/veg.png"));
        assert_eq!(icons[2], Path::new("/a/icons/dairy_free.png"));
    }
}
