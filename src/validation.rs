//! Preflight Validation - Rule/Policy Separation
//!
//! Rules produce structured violations.
//! Policy: any `Error` blocks the render before a page exists; warnings are
//! reported and rendering continues with fallbacks.

use serde::{Deserialize, Serialize};

use crate::assets::AssetPaths;
use crate::item::Item;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    #[serde(default)]
    pub item_index: Option<usize>,
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl PreflightResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Warning)
    }
}

/// What preflight looks at.
#[derive(Debug, Clone, Copy)]
pub struct PreflightInput<'a> {
    pub items: &'a [Item],
    pub assets: &'a AssetPaths,
    pub logo_enabled: bool,
}

/// Preflight rule trait - produces violations
pub trait PreflightRule {
    fn name(&self) -> &'static str;
    fn check(&self, input: &PreflightInput<'_>) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct SelectionRule;

impl PreflightRule for SelectionRule {
    fn name(&self) -> &'static str { "selection" }

    fn check(&self, input: &PreflightInput<'_>) -> Vec<ValidationViolation> {
        if !input.items.is_empty() {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Error,
            message: "No items selected".to_string(),
            item_index: None,
            remediation: vec!["Select at least one item".to_string()],
        }]
    }
}

pub struct TitleRule;

impl PreflightRule for TitleRule {
    fn name(&self) -> &'static str { "title" }

    fn check(&self, input: &PreflightInput<'_>) -> Vec<ValidationViolation> {
        input
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.name_en.trim().is_empty())
            .map(|(index, _)| ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: format!("Item {} has an empty primary title", index),
                item_index: Some(index),
                remediation: vec!["Fill in name_en before rendering".to_string()],
            })
            .collect()
    }
}

pub struct AssetFilesRule;

impl PreflightRule for AssetFilesRule {
    fn name(&self) -> &'static str { "asset_files" }

    fn check(&self, input: &PreflightInput<'_>) -> Vec<ValidationViolation> {
        let assets = input.assets;
        let mut violations = vec![];

        for (label, path) in assets.required_images() {
            if label == "logo" && !input.logo_enabled {
                continue;
            }
            if !path.is_file() {
                violations.push(ValidationViolation {
                    rule: self.name().to_string(),
                    severity: ViolationSeverity::Warning,
                    message: format!("{} not found at {}", label, path.display()),
                    item_index: None,
                    remediation: vec![if label == "logo" {
                        "Logo will be omitted".to_string()
                    } else {
                        "An outlined placeholder will be drawn instead".to_string()
                    }],
                });
            }
        }

        if let Some(template) = &assets.template_page {
            if !template.is_file() {
                violations.push(ValidationViolation {
                    rule: self.name().to_string(),
                    severity: ViolationSeverity::Warning,
                    message: format!("page template not found at {}", template.display()),
                    item_index: None,
                    remediation: vec!["Pages will render without a background".to_string()],
                });
            }
        }

        violations
    }
}

pub struct FontFilesRule;

impl PreflightRule for FontFilesRule {
    fn name(&self) -> &'static str { "font_files" }

    fn check(&self, input: &PreflightInput<'_>) -> Vec<ValidationViolation> {
        let assets = input.assets;
        [
            ("font_latin", &assets.font_latin),
            ("font_latin_bold", &assets.font_latin_bold),
            ("font_arabic", &assets.font_arabic),
            ("font_arabic_bold", &assets.font_arabic_bold),
        ]
        .into_iter()
        .filter_map(|(label, path)| path.as_ref().map(|p| (label, p)))
        .filter(|(_, path)| !path.is_file())
        .map(|(label, path)| ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Warning,
            message: format!("{} not found at {}", label, path.display()),
            item_index: None,
            remediation: vec!["A built-in serif font will be used".to_string()],
        })
        .collect()
    }
}

/// Validator orchestrates rules and applies policy
pub struct Validator {
    rules: Vec<Box<dyn PreflightRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(SelectionRule),
                Box::new(TitleRule),
                Box::new(AssetFilesRule),
                Box::new(FontFilesRule),
            ],
        }
    }

    pub fn validate(&self, input: &PreflightInput<'_>) -> PreflightResult {
        let violations: Vec<_> = self
            .rules
            .iter()
            .flat_map(|rule| rule.check(input))
            .collect();
        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        PreflightResult { valid, violations }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn assets() -> AssetPaths {
        AssetPaths::from_dir(Path::new("/missing"))
    }

    #[test]
    fn test_empty_title_blocks() {
        let items = vec![Item::new("Hummus", ""), Item::new("  ", "حمص")];
        let assets = assets();
        let result = Validator::new().validate(&PreflightInput {
            items: &items,
            assets: &assets,
            logo_enabled: false,
        });
        assert!(!result.valid);
        let errors: Vec<_> = result.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].item_index, Some(1));
    }

    #[test]
    fn test_missing_icons_only_warn() {
        let items = vec![Item::new("Hummus", "")];
        let assets = assets();
        let result = Validator::new().validate(&PreflightInput {
            items: &items,
            assets: &assets,
            logo_enabled: false,
        });
        assert!(result.valid);
        // six icons, logo skipped because it is not drawn
        assert_eq!(result.warnings().count(), 6);
    }

    #[test]
    fn test_empty_selection_blocks() {
        let assets = assets();
        let result = Validator::new().validate(&PreflightInput {
            items: &[],
            assets: &assets,
            logo_enabled: false,
        });
        assert!(result.has_errors());
    }

    #[test]
    fn test_configured_missing_font_warns() {
        let items = vec![Item::new("Hummus", "")];
        let mut assets = assets();
        assets.font_arabic = Some(PathBuf::from("/missing/fonts/Amiri-Regular.ttf"));
        let violations = FontFilesRule.check(&PreflightInput {
            items: &items,
            assets: &assets,
            logo_enabled: false,
        });
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, ViolationSeverity::Warning);
    }
}
