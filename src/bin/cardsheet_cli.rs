//! Card Sheet CLI - Bridge interface for the catalog tool
//!
//! Commands: render, layout, check
//! Outputs JSON to stdout
//! Returns non-zero on preflight failure

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cardsheet_core::{
    generate_cards_pdf, layout_fingerprint,
    validation::PreflightInput,
    AssetPaths, DebugOverlayOptions, Item, LayoutConfig, LayoutProfile, RenderError,
    RenderOptions, Validator,
};

#[derive(Parser)]
#[command(name = "cardsheet-cli")]
#[command(about = "Card Sheet CLI - Menu card PDF generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render items into a card sheet PDF
    Render {
        /// JSON array of items
        #[arg(short, long)]
        items: PathBuf,

        /// Asset paths JSON, or a directory with logo.png and icons/
        #[arg(short, long)]
        assets: PathBuf,

        /// Output PDF
        #[arg(short, long)]
        out: PathBuf,

        /// Layout override file
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Starting profile: full or no-macros
        #[arg(short, long, default_value = "full")]
        profile: LayoutProfile,

        /// Document title
        #[arg(short, long)]
        title: Option<String>,

        /// Draw the logo on every card
        #[arg(long)]
        draw_logo: bool,

        /// Debug overlay options JSON
        #[arg(long)]
        debug: Option<PathBuf>,
    },

    /// Print the effective layout and its fingerprint
    Layout {
        #[arg(short, long, default_value = "full")]
        profile: LayoutProfile,

        /// Layout override file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Run preflight only
    Check {
        #[arg(short, long)]
        items: PathBuf,

        #[arg(short, long)]
        assets: PathBuf,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Invalid JSON in {}: {}", path.display(), e))
}

fn read_assets(path: &Path) -> Result<AssetPaths, String> {
    if path.is_dir() {
        return Ok(AssetPaths::from_dir(path));
    }
    read_json(path)
}

fn effective_layout(profile: LayoutProfile, file: Option<&Path>) -> LayoutConfig {
    let base = LayoutConfig::for_profile(profile);
    match file {
        Some(path) => base.merged_file(path),
        None => base,
    }
}

fn emit<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => println!(r#"{{"success": false, "error": "Serialization error: {}"}}"#, e),
    }
}

fn fail(error: impl std::fmt::Display) -> ExitCode {
    emit(&serde_json::json!({
        "success": false,
        "error": error.to_string(),
    }));
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { items, assets, out, layout, profile, title, draw_logo, debug } => {
            let items: Vec<Item> = match read_json(&items) {
                Ok(items) => items,
                Err(e) => return fail(e),
            };
            let assets = match read_assets(&assets) {
                Ok(assets) => assets,
                Err(e) => return fail(e),
            };
            let debug: DebugOverlayOptions = match debug.as_deref().map(read_json::<DebugOverlayOptions>).transpose() {
                Ok(debug) => debug.unwrap_or_default(),
                Err(e) => return fail(e),
            };

            let defaults = RenderOptions::default();
            let options = RenderOptions {
                title: title.unwrap_or(defaults.title),
                layout: effective_layout(profile, layout.as_deref()),
                draw_logo,
                debug,
            };

            match generate_cards_pdf(&items, &out, &assets, &options) {
                Ok(report) => {
                    emit(&serde_json::json!({
                        "success": true,
                        "report": report,
                    }));
                    ExitCode::SUCCESS
                }
                Err(e @ (RenderError::NoItems | RenderError::EmptyTitle { .. } | RenderError::Preflight(_))) => {
                    emit(&serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                    }));
                    ExitCode::from(2)  // Preflight failure
                }
                Err(e) => fail(e),
            }
        }

        Commands::Layout { profile, file } => {
            let layout = effective_layout(profile, file.as_deref());
            match layout_fingerprint(&layout) {
                Ok(fingerprint) => {
                    emit(&serde_json::json!({
                        "profile": profile,
                        "fingerprint": fingerprint,
                        "layout": layout,
                    }));
                    ExitCode::SUCCESS
                }
                Err(e) => fail(e),
            }
        }

        Commands::Check { items, assets } => {
            let items: Vec<Item> = match read_json(&items) {
                Ok(items) => items,
                Err(e) => return fail(e),
            };
            let assets = match read_assets(&assets) {
                Ok(assets) => assets,
                Err(e) => return fail(e),
            };

            let result = Validator::new().validate(&PreflightInput {
                items: &items,
                assets: &assets,
                logo_enabled: false,
            });
            emit(&result);
            if result.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)  // Validation failure
            }
        }
    }
}
