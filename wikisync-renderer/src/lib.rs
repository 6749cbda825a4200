//! # wikisync-renderer
//!
//! Tera-based document strategies that turn remote records into DokuWiki
//! markup: one summary table per source and, for layouts that have them, one
//! detail page per record.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wikisync_core::{Config, SourceRegistry};
//! use wikisync_renderer::{DocumentStrategy, TemplateEngine, TemplateStrategy};
//!
//! fn render(records: &[wikisync_core::Record]) {
//!     let registry = SourceRegistry::new(&Config::default());
//!     let binding = registry.resolve("papers_mass");
//!     if let Ok(engine) = TemplateEngine::embedded() {
//!         let strategy = TemplateStrategy::for_binding(Arc::new(engine), &binding);
//!         if let Ok(markup) = strategy.render_summary(records) {
//!             println!("{}: {} bytes", binding.summary_document, markup.len());
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod layout;
pub mod links;
pub mod strategy;

pub use engine::TemplateEngine;
pub use error::RenderError;
pub use links::{LinkCache, LinkError, LinkResolver, Unresolved};
pub use strategy::{DocumentStrategy, TemplateStrategy};
