//! Template contexts: serializable rendering payloads built from [`Record`]s.

use serde::Serialize;

use wikisync_core::{Record, StrategyKind};

use crate::error::RenderError;
use crate::layout::{self, external_link, internal_link, reference_link, tool_links};
use crate::links::{self, LinkResolver};

/// Payload of the shared summary template.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryContext {
    /// Header cells; empty means no header row.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SummaryContext {
    pub fn from_records(
        kind: StrategyKind,
        records: &[Record],
        links: &dyn LinkResolver,
    ) -> Result<Self, RenderError> {
        Ok(SummaryContext {
            columns: layout::columns(kind).iter().map(|c| c.to_string()).collect(),
            rows: records
                .iter()
                .filter(|r| layout::is_listed(kind, r))
                .map(|r| layout::row(kind, r, links))
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        Ok(tera::Context::from_serialize(self)?)
    }
}

/// Payload of a detail template. One variant per layout with detail pages.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DetailContext {
    Generic(GenericPage),
    Tool(ToolPage),
    Company(CompanyPage),
    Paper(PaperPage),
}

impl DetailContext {
    /// `Ok(None)` for layouts without detail pages.
    pub fn from_record(
        kind: StrategyKind,
        record: &Record,
        links: &dyn LinkResolver,
    ) -> Result<Option<Self>, RenderError> {
        let ctx = match kind {
            StrategyKind::Generic => DetailContext::Generic(GenericPage::from(record)),
            StrategyKind::Tools => DetailContext::Tool(ToolPage::build(record, links)?),
            StrategyKind::Companies => DetailContext::Company(CompanyPage::from(record)),
            StrategyKind::Papers => DetailContext::Paper(PaperPage::build(record, links)?),
            StrategyKind::Experiments | StrategyKind::ThirdSector => return Ok(None),
        };
        Ok(Some(ctx))
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        Ok(tera::Context::from_serialize(self)?)
    }
}

// ---------------------------------------------------------------------------
// Generic
// ---------------------------------------------------------------------------

/// Every field as an upper-cased heading followed by its value.
#[derive(Debug, Clone, Serialize)]
pub struct GenericPage {
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

impl From<&Record> for GenericPage {
    fn from(record: &Record) -> Self {
        GenericPage {
            entries: record
                .fields
                .iter()
                .map(|(k, v)| Entry {
                    key: k.to_uppercase(),
                    value: wikisync_core::types::value_text(v),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ToolPage {
    pub name: String,
    pub description: String,
    pub aka: String,
    pub variation: String,
    pub categories: String,
    pub subcategories: String,
    pub theories: String,
    pub evidence: String,
    pub strength: String,
    pub findings: String,
    pub discussion: String,
    pub relevance: String,
    pub cases: String,
    pub prevalence: String,
    pub papers: Vec<String>,
    pub secondary_papers: Vec<String>,
    pub contributors: String,
}

impl ToolPage {
    pub fn build(r: &Record, links: &dyn LinkResolver) -> Result<Self, RenderError> {
        Ok(ToolPage {
            name: r.text("Tool name"),
            description: r.text("Description"),
            aka: r.text("AKA"),
            variation: r.text("Tool variation"),
            categories: links::joined_names(links, r, "Category", "(Sub)Category or theme")?,
            subcategories: links::joined_names(links, r, "subcat", "(Sub)Category or theme")?,
            theories: links::joined_names(links, r, "Theories", "Theory")?,
            evidence: r.text("Types of evidence"),
            strength: r.text("Evidence strength"),
            findings: r.text("Findings summarized").trim_end().to_string(),
            discussion: r.text("Full discussion").trim_end().to_string(),
            relevance: r.first_text("Relevance to EA charities").trim_end().to_string(),
            cases: links::joined_names(links, r, "Relevant use cases", "Name")?,
            prevalence: r.text("Prevalence"),
            papers: key_papers(links, r)?,
            secondary_papers: secondary_papers(links, r)?,
            contributors: links::joined_names(links, r, "Contributors", "Name, Institution")?,
        })
    }
}

/// `[[papers:Title|Title]]`, followed by a full-text link when the paper has a URL.
fn key_papers(links: &dyn LinkResolver, r: &Record) -> Result<Vec<String>, RenderError> {
    Ok(links::linked(links, r, "key_papers")?
        .iter()
        .map(|paper| {
            let title = paper.text("Title");
            let url = paper.record.as_ref().map(|p| p.text("URL")).unwrap_or_default();
            let mut parts = Vec::new();
            if !title.is_empty() {
                parts.push(internal_link("papers:", &title, &title));
            }
            if !url.is_empty() {
                parts.push(external_link(&url, "Full text"));
            }
            parts.join(", ")
        })
        .filter(|p| !p.is_empty())
        .collect())
}

/// Secondary papers link straight to their full text; they need a title and a URL.
fn secondary_papers(links: &dyn LinkResolver, r: &Record) -> Result<Vec<String>, RenderError> {
    Ok(links::linked(links, r, "secondary papers")?
        .iter()
        .filter_map(|paper| match &paper.record {
            Some(p) => {
                let (title, url) = (p.text("Title"), p.text("URL"));
                (!title.is_empty() && !url.is_empty()).then(|| external_link(&url, &title))
            }
            None => Some(paper.id.0.clone()),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Companies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CompanyPage {
    pub company: String,
    pub sector: String,
    pub matching: String,
    pub payroll: String,
    pub fees: String,
    pub provider: String,
    pub endorsed: String,
    pub matching_details: String,
    pub payroll_details: String,
    pub other_details: String,
    pub outcomes: String,
    pub sources: Vec<String>,
}

impl From<&Record> for CompanyPage {
    fn from(r: &Record) -> Self {
        let yes = |field: &str| String::from(if r.has(field) { "yes" } else { "" });
        let mut sources = vec![reference_link(r, "Reference", "Reference link")];
        sources.extend(r.text("Other links").split(';').map(|s| s.trim().to_string()));
        sources.retain(|s| !s.is_empty());
        CompanyPage {
            company: r.text("Company"),
            sector: r.text("Sector"),
            matching: yes("Donation Matching"),
            payroll: yes("Payroll Giving"),
            fees: yes("Pays PG fees"),
            provider: r.text("PG: provider name"),
            endorsed: r.text("Endorsed charity(s)"),
            matching_details: r.text("Details: Matching"),
            payroll_details: r.text("Details: Payroll giving"),
            other_details: r.text("Details: Other"),
            outcomes: r.text("Outcomes"),
            sources,
        }
    }
}

// ---------------------------------------------------------------------------
// Papers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PaperPage {
    pub title: String,
    pub reference: String,
    pub keywords: String,
    pub discipline: String,
    pub evidence: String,
    pub tools: String,
    pub theories: String,
    pub critiques: String,
    pub targets: String,
    pub donors: String,
    pub summary: String,
    pub discussion: String,
    pub evaluation: String,
    pub creators: String,
}

impl PaperPage {
    pub fn build(r: &Record, links: &dyn LinkResolver) -> Result<Self, RenderError> {
        let title = r.text("Title");
        let url = r.text("URL");
        let linked_title = if url.is_empty() {
            title.clone()
        } else {
            external_link(&url, &title)
        };
        let reference = format!(
            "{}, ({}). {}. {}, {}.",
            r.text("Authors"),
            r.text("Year"),
            linked_title,
            r.text("Journal"),
            r.text("Pages"),
        );
        Ok(PaperPage {
            title,
            reference,
            keywords: r.text("keywords"),
            discipline: r.text("Discipline/field"),
            evidence: r.first_text("Type of evidence"),
            tools: tool_links(links, r)?,
            theories: links::joined_names(links, r, "Theories", "Theory")?,
            critiques: links::joined_names(links, r, "critiques", "Name")?,
            targets: r.text("Charity-target"),
            donors: r.text("Donor population"),
            summary: r.text("Wiki-notes"),
            discussion: r.text("Discussion/findings"),
            evaluation: r.text("Evaluation"),
            creators: links::joined_names(links, r, "Added by", "Name, Institution")?,
        })
    }
}
