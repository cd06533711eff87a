//! Item model
//!
//! Items come from the catalog collaborator and are read-only here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gluten {
    Gluten,
    #[default]
    GlutenFree,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProteinKind {
    #[default]
    Veg,
    Meat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dairy {
    Dairy,
    #[default]
    DairyFree,
}

/// Nutrient values per serving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    #[serde(default)]
    pub calories_kcal: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub fat_g: f64,
}

/// One dish rendered onto one card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Latin-script title. Must be non-empty.
    pub name_en: String,
    /// Right-to-left title, may be empty.
    #[serde(default)]
    pub name_ar: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(default)]
    pub gluten: Gluten,
    #[serde(default)]
    pub protein_type: ProteinKind,
    #[serde(default)]
    pub dairy: Dairy,
}

impl Item {
    pub fn new(name_en: impl Into<String>, name_ar: impl Into<String>) -> Self {
        Self {
            name_en: name_en.into(),
            name_ar: name_ar.into(),
            ..Default::default()
        }
    }

    /// Labelled macro lines in fixed order.
    pub fn macro_lines(&self) -> [String; 4] {
        let n = &self.nutrients;
        [
            format!("Calories: {} kcal", format_amount(n.calories_kcal)),
            format!("Carbohydrates: {} g", format_amount(n.carbs_g)),
            format!("Protein: {} g", format_amount(n.protein_g)),
            format!("Fat: {} g", format_amount(n.fat_g)),
        ]
    }
}

/// Integral values print bare, everything else with one decimal.
///
/// The decimal is rounded once, on the exact binary value: ties go to even
/// and values stored just below a half round down.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-9 {
        return format!("{}", rounded as i64);
    }
    format!("{:.1}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_integral() {
        assert_eq!(format_amount(3.0), "3");
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(250.0), "250");
    }

    #[test]
    fn test_format_one_decimal() {
        assert_eq!(format_amount(3.5), "3.5");
        assert_eq!(format_amount(7.04), "7.0");
        assert_eq!(format_amount(2.96), "3.0");
    }

    #[test]
    fn test_format_rounds_binary_value_once() {
        // 12.25 and 0.25 are exact in binary: true ties, to even.
        assert_eq!(format_amount(12.25), "12.2");
        assert_eq!(format_amount(0.25), "0.2");
        // 0.35 is stored slightly below the half.
        assert_eq!(format_amount(0.35), "0.3");
        assert_eq!(format_amount(12.26), "12.3");
    }

    #[test]
    fn test_item_from_flat_json() {
        let item: Item = serde_json::from_value(json!({
            "name_en": "Falafel Wrap",
            "name_ar": "لفافة فلافل",
            "calories_kcal": 420,
            "carbs_g": 51.5,
            "protein_g": 14,
            "fat_g": 17.2,
            "gluten": "gluten",
            "protein_type": "veg",
            "dairy": "dairy_free"
        }))
        .unwrap();

        assert_eq!(item.gluten, Gluten::Gluten);
        assert_eq!(item.dairy, Dairy::DairyFree);
        assert_eq!(item.nutrients.carbs_g, 51.5);
    }

    #[test]
    fn test_macro_lines_order() {
        let mut item = Item::new("Soup", "");
        item.nutrients = Nutrients { calories_kcal: 120.0, carbs_g: 10.5, protein_g: 4.0, fat_g: 2.0 };
        let lines = item.macro_lines();
        assert_eq!(lines[0], "Calories: 120 kcal");
        assert_eq!(lines[1], "Carbohydrates: 10.5 g");
        assert_eq!(lines[2], "Protein: 4 g");
        assert_eq!(lines[3], "Fat: 2 g");
    }
}
