//! The document strategy contract and its template-backed implementation.

use std::fmt;
use std::sync::Arc;

use wikisync_core::{DocumentId, Record, SourceBinding, StrategyKind};

use crate::context::{DetailContext, SummaryContext};
use crate::engine::{detail_template, TemplateEngine, SUMMARY_TEMPLATE};
use crate::error::RenderError;
use crate::layout;
use crate::links::{LinkResolver, Unresolved};

/// Turns records into document markup.
///
/// Implementations must be deterministic and must not mutate their input.
pub trait DocumentStrategy {
    fn kind(&self) -> StrategyKind;

    /// Markup of the summary document covering `records`.
    fn render_summary(&self, records: &[Record]) -> Result<String, RenderError>;

    /// Markup of `record`'s detail document.
    fn render_detail(&self, record: &Record) -> Result<String, RenderError>;

    /// Where `record`'s detail document lives, or `None` if it has none.
    fn detail_document_id(&self, record: &Record) -> Option<DocumentId>;

    /// Whether detail documents are linked from the summary document.
    fn has_linked_documents(&self) -> bool;
}

/// [`DocumentStrategy`] backed by the tera templates of one layout.
///
/// Linked-record columns are rendered as raw ids until a resolver is
/// attached with [`TemplateStrategy::with_links`].
#[derive(Clone)]
pub struct TemplateStrategy {
    engine: Arc<TemplateEngine>,
    kind: StrategyKind,
    detail_namespace: Option<String>,
    links: Arc<dyn LinkResolver>,
}

impl fmt::Debug for TemplateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateStrategy")
            .field("kind", &self.kind)
            .field("detail_namespace", &self.detail_namespace)
            .finish_non_exhaustive()
    }
}

impl TemplateStrategy {
    pub fn new(
        engine: Arc<TemplateEngine>,
        kind: StrategyKind,
        detail_namespace: Option<String>,
    ) -> Self {
        TemplateStrategy {
            engine,
            kind,
            detail_namespace,
            links: Arc::new(Unresolved),
        }
    }

    /// Resolve linked-record columns through `links`.
    pub fn with_links(mut self, links: Arc<dyn LinkResolver>) -> Self {
        self.links = links;
        self
    }

    /// Strategy for a registry-resolved source.
    pub fn for_binding(engine: Arc<TemplateEngine>, binding: &SourceBinding) -> Self {
        Self::new(engine, binding.kind, binding.detail_namespace.clone())
    }
}

impl DocumentStrategy for TemplateStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn render_summary(&self, records: &[Record]) -> Result<String, RenderError> {
        let ctx = SummaryContext::from_records(self.kind, records, self.links.as_ref())?
            .to_tera_context()?;
        self.engine.render(SUMMARY_TEMPLATE, &ctx)
    }

    fn render_detail(&self, record: &Record) -> Result<String, RenderError> {
        let no_layout = || RenderError::NoDetailLayout { kind: self.kind };
        let template = detail_template(self.kind).ok_or_else(no_layout)?;
        let ctx = DetailContext::from_record(self.kind, record, self.links.as_ref())?
            .ok_or_else(no_layout)?
            .to_tera_context()?;
        self.engine.render(template, &ctx)
    }

    fn detail_document_id(&self, record: &Record) -> Option<DocumentId> {
        let namespace = self.detail_namespace.as_deref()?;
        if self.kind == StrategyKind::Generic {
            return Some(DocumentId(format!(
                "{namespace}{}",
                layout::clean_page_name(&record.id.0)
            )));
        }
        let column = layout::page_name_column(self.kind)?;
        if !layout::is_listed(self.kind, record) || record.get(column).is_none() {
            return None;
        }
        Some(DocumentId(format!(
            "{namespace}{}",
            layout::clean_page_name(&record.text(column))
        )))
    }

    fn has_linked_documents(&self) -> bool {
        self.kind.has_linked_documents()
    }
}
