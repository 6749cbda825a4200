//! Per-layout table shape: columns, row cells, publication filter, page naming.
//!
//! | Layout       | Main column  | Page name column | Publication filter |
//! |--------------|--------------|------------------|--------------------|
//! | Generic      | -            | record id        | -                  |
//! | Tools        | `Tool name`  | `Tool name`      | `Wiki?`            |
//! | Companies    | `Company`    | `Company`        | `ftse100`          |
//! | Papers       | `parencite`  | `Title`          | -                  |
//! | Experiments  | `Experiment` | -                | -                  |
//! | ThirdSector  | `Name`       | -                | -                  |
//!
//! Linked-record columns (`Category`, `key_papers`, `tools`) go through a
//! [`LinkResolver`].

use wikisync_core::{Record, StrategyKind};

use crate::error::RenderError;
use crate::links::{self, LinkResolver};

/// Column that must be present for a record to appear in the summary table.
pub fn main_column(kind: StrategyKind) -> Option<&'static str> {
    match kind {
        StrategyKind::Generic => None,
        StrategyKind::Tools => Some("Tool name"),
        StrategyKind::Companies => Some("Company"),
        StrategyKind::Papers => Some("parencite"),
        StrategyKind::Experiments => Some("Experiment"),
        StrategyKind::ThirdSector => Some("Name"),
    }
}

/// Column whose cleaned value names a record's detail page.
pub fn page_name_column(kind: StrategyKind) -> Option<&'static str> {
    match kind {
        StrategyKind::Tools => Some("Tool name"),
        StrategyKind::Companies => Some("Company"),
        StrategyKind::Papers => Some("Title"),
        StrategyKind::Generic | StrategyKind::Experiments | StrategyKind::ThirdSector => None,
    }
}

/// Checkbox column a record must have ticked to be published at all.
pub fn publication_flag(kind: StrategyKind) -> Option<&'static str> {
    match kind {
        StrategyKind::Tools => Some("Wiki?"),
        StrategyKind::Companies => Some("ftse100"),
        _ => None,
    }
}

/// Whether `record` appears in the summary table of this layout.
pub fn is_listed(kind: StrategyKind, record: &Record) -> bool {
    let has_main = main_column(kind).map(|c| record.get(c).is_some()).unwrap_or(true);
    let published = publication_flag(kind).map(|f| record.has(f)).unwrap_or(true);
    has_main && published
}

/// Header cells of the summary table; empty for the generic layout.
pub fn columns(kind: StrategyKind) -> &'static [&'static str] {
    match kind {
        StrategyKind::Generic => &[],
        StrategyKind::Tools => &["Tool name", "Category", "Description", "Main findings", "Key papers"],
        StrategyKind::Companies => &[
            "Company",
            "Sector",
            "Donation Matching",
            "Payroll Giving",
            "DM Details",
            "PG Details",
            "Other Details",
            "Endorsed",
            "Outcomes",
            "Reference",
        ],
        StrategyKind::Papers => &[
            "Reference",
            "Title",
            "Type of evidence",
            "Discussion",
            "Tools",
            "Link",
        ],
        StrategyKind::Experiments => &[
            "Experiment",
            "N",
            "Endowment",
            "Share donating",
            "Share donated",
            "Mean donation",
            "SD",
            "SD/Mean",
            "Effect Size",
            "References",
        ],
        StrategyKind::ThirdSector => &[
            "Name",
            "Whom does it help?",
            "Role",
            "Example activity",
            "Size",
            "Established",
            "CEO/Chairman",
        ],
    }
}

/// Cells of one summary-table row.
pub fn row(
    kind: StrategyKind,
    record: &Record,
    links: &dyn LinkResolver,
) -> Result<Vec<String>, RenderError> {
    let cells: Vec<String> = match kind {
        StrategyKind::Generic => record.fields.values().map(wikisync_core::types::value_text).collect(),
        StrategyKind::Tools => {
            let name = record.text("Tool name");
            vec![
                internal_link("tools:", &name, &name),
                category_popovers(links, record)?,
                flatten(&record.text("Description")),
                flatten(&record.text("Findings summarized")),
                key_paper_links(links, record)?,
            ]
        }
        StrategyKind::Companies => {
            let name = record.text("Company");
            vec![
                internal_link("companies:", &name, &name),
                record.text("Sector"),
                checkbox(record, "Donation Matching"),
                checkbox(record, "Payroll Giving"),
                forced_breaks(&record.text("Details: Matching")),
                forced_breaks(&record.text("Details: Payroll giving")),
                forced_breaks(&record.text("Details: Other")),
                record.text("Endorsed charity(s)"),
                record.text("Outcomes"),
                reference_link(record, "Reference", "Reference link"),
            ]
        }
        StrategyKind::Papers => {
            let title = record.text("Title");
            let url = record.text("URL");
            vec![
                internal_link("papers:", &title, &record.text("parencite")),
                title.clone(),
                record.first_text("Type of evidence"),
                flatten(&record.text("Discussion/findings")),
                tool_links(links, record)?,
                if url.is_empty() {
                    String::new()
                } else {
                    external_link(&url, "Full text")
                },
            ]
        }
        StrategyKind::Experiments => [
            "Experiment",
            "N ",
            "Endowment",
            "Share donating",
            "Share donated",
            "Mean donation",
            "SD",
            "SD/Mean",
            "Effect Size %",
            "References",
        ]
        .iter()
        .map(|f| record.text(f))
        .collect(),
        StrategyKind::ThirdSector => {
            let name = record.text("Name");
            let link = record.text("Link");
            let name_cell = if link.is_empty() {
                name
            } else {
                external_link(&link, &name)
            };
            let mut cells = vec![name_cell];
            cells.extend(
                ["Target", "Role", "Example activity", "Size", "Established", "CEO/Chairman"]
                    .iter()
                    .map(|f| record.text(f)),
            );
            cells
        }
    };
    Ok(cells)
}

// ---------------------------------------------------------------------------
// Markup helpers
// ---------------------------------------------------------------------------

/// Strip ASCII punctuation so a value can be used as a page name.
pub fn clean_page_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}

/// `[[ns:page|label]]`
pub fn internal_link(namespace: &str, page: &str, label: &str) -> String {
    format!("[[{namespace}{}|{label}]]", clean_page_name(page))
}

/// `[[url|label]]`
pub fn external_link(url: &str, label: &str) -> String {
    format!("[[{url}|{label}]]")
}

/// Replace line breaks with spaces so text fits in one table cell.
pub fn flatten(text: &str) -> String {
    text.replace('\r', "").replace('\n', " ").trim_end().to_string()
}

/// Replace line breaks with forced DokuWiki line breaks.
pub fn forced_breaks(text: &str) -> String {
    text.replace('\r', "").replace('\n', " \\\\ ")
}

fn checkbox(record: &Record, field: &str) -> String {
    let mark = if record.has(field) { "X" } else { "" };
    mark.to_string()
}

/// Link built from a citation column and a URL column; the citation loses any
/// `[...]` annotation. Empty unless both columns are present.
pub fn reference_link(record: &Record, text_field: &str, url_field: &str) -> String {
    if record.get(text_field).is_none() || record.get(url_field).is_none() {
        return String::new();
    }
    let text = strip_brackets(&record.text(text_field));
    external_link(&record.text(url_field), text.trim_end())
}

/// Related tools rendered as links into the tools namespace.
pub fn tool_links(links: &dyn LinkResolver, record: &Record) -> Result<String, RenderError> {
    Ok(links::names(links, record, "tools", "Tool name")?
        .iter()
        .map(|t| internal_link("tools:", t, t))
        .collect::<Vec<_>>()
        .join(", "))
}

/// Key papers as `[[papers:Title|parencite]]`; papers missing either are left out.
pub fn key_paper_links(links: &dyn LinkResolver, record: &Record) -> Result<String, RenderError> {
    Ok(links::linked(links, record, "key_papers")?
        .iter()
        .filter_map(|paper| {
            let (title, cite) = (paper.text("Title"), paper.text("parencite"));
            if title.is_empty() || cite.is_empty() {
                None
            } else {
                Some(internal_link("papers:", &title, &cite))
            }
        })
        .collect::<Vec<_>>()
        .join("; "))
}

/// Category names, each with its description shown on hover.
fn category_popovers(links: &dyn LinkResolver, record: &Record) -> Result<String, RenderError> {
    Ok(links::linked(links, record, "Category")?
        .iter()
        .map(|cat| {
            let name = cat.text("(Sub)Category or theme");
            match &cat.record {
                Some(linked) => format!(
                    "<popover content=\"{}\" trigger='hover'>{name}</popover>",
                    linked.text("Description").trim_end()
                ),
                None => name,
            }
        })
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(", "))
}

fn strip_brackets(text: &str) -> String {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => {
            format!("{}{}", &text[..start], &text[end + 1..])
        }
        _ => text.to_string(),
    }
}
