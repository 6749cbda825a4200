//! Tera rendering engine: embedded templates plus optional user overrides.
//!
//! # Template mapping
//!
//! | Layout       | Summary        | Detail                   |
//! |--------------|----------------|--------------------------|
//! | Generic      | `summary.tera` | `generic.detail.tera`    |
//! | Tools        | `summary.tera` | `tools.detail.tera`      |
//! | Companies    | `summary.tera` | `companies.detail.tera`  |
//! | Papers       | `summary.tera` | `papers.detail.tera`     |
//! | Experiments  | `summary.tera` | -                        |
//! | ThirdSector  | `summary.tera` | -                        |

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use wikisync_core::StrategyKind;

use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

pub const SUMMARY_TEMPLATE: &str = "summary.tera";

const TPLS: &[(&str, &str)] = &[
    (SUMMARY_TEMPLATE, include_str!("templates/summary.tera")),
    ("generic.detail.tera", include_str!("templates/generic.detail.tera")),
    ("tools.detail.tera", include_str!("templates/tools.detail.tera")),
    ("companies.detail.tera", include_str!("templates/companies.detail.tera")),
    ("papers.detail.tera", include_str!("templates/papers.detail.tera")),
];

/// Detail template name for `kind`, if the layout has detail pages.
pub fn detail_template(kind: StrategyKind) -> Option<&'static str> {
    match kind {
        StrategyKind::Generic => Some("generic.detail.tera"),
        StrategyKind::Tools => Some("tools.detail.tera"),
        StrategyKind::Companies => Some("companies.detail.tera"),
        StrategyKind::Papers => Some("papers.detail.tera"),
        StrategyKind::Experiments | StrategyKind::ThirdSector => None,
    }
}

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    let mut templates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((normalize_template_name(rel), contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert((*name).to_string(), (*content).to_string());
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_templates(templates.into_iter().collect::<Vec<_>>())?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for rendering templates with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files named like the embedded ones
/// (e.g. `tools.detail.tera`); they replace the embedded defaults.
#[derive(Debug)]
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(TemplateEngine {
            tera: build_tera(user_template_dir)?,
        })
    }

    /// Engine with embedded templates only.
    pub fn embedded() -> Result<Self, RenderError> {
        Self::new(None)
    }

    /// Render `template` and normalise line endings to LF.
    pub fn render(&self, template: &str, ctx: &tera::Context) -> Result<String, RenderError> {
        let out = self.tera.render(template, ctx)?;
        Ok(out.replace("\r\n", "\n"))
    }
}
