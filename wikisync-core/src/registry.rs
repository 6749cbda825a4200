//! Source registry: name → layout + addressing.
//!
//! Dispatch is an exact, case-sensitive match against [`KNOWN_SOURCES`].
//! Every other name resolves to [`StrategyKind::Generic`] with the configured
//! defaults; resolution itself never fails.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::types::{ContainerId, DocumentId, SourceBinding, SourceName, StrategyKind};

/// A source with a bespoke layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownSource {
    pub name: &'static str,
    pub kind: StrategyKind,
    pub container: &'static str,
    pub summary_document: &'static str,
    pub detail_namespace: Option<&'static str>,
}

/// The allow-list.
pub const KNOWN_SOURCES: &[KnownSource] = &[
    KnownSource {
        name: "tools_public_sample",
        kind: StrategyKind::Tools,
        container: "appBzOSifwBqSuVfH",
        summary_document: "tables:tools",
        detail_namespace: Some("tools:"),
    },
    KnownSource {
        name: "ftse100+givingpolicies",
        kind: StrategyKind::Companies,
        container: "apprleNrkR7dTtW60",
        summary_document: "tables:employee_giving_schemes",
        detail_namespace: Some("companies:"),
    },
    KnownSource {
        name: "Charity experiments",
        kind: StrategyKind::Experiments,
        container: "appBzOSifwBqSuVfH",
        summary_document: "tables:data_experiments",
        detail_namespace: None,
    },
    KnownSource {
        name: "Third sector",
        kind: StrategyKind::ThirdSector,
        container: "appBzOSifwBqSuVfH",
        summary_document: "tables:third_sector_infrastructure_details",
        detail_namespace: None,
    },
    KnownSource {
        name: "papers_mass",
        kind: StrategyKind::Papers,
        container: "appBzOSifwBqSuVfH",
        summary_document: "tables:papers",
        detail_namespace: Some("papers:"),
    },
];

/// Resolves source names against the allow-list and the configured defaults.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    default_container: ContainerId,
    default_summary_document: DocumentId,
    default_detail_namespace: String,
    containers: BTreeMap<String, ContainerId>,
}

impl SourceRegistry {
    pub fn new(config: &Config) -> Self {
        SourceRegistry {
            default_container: config.default_container.clone(),
            default_summary_document: config.default_summary_document.clone(),
            default_detail_namespace: config.default_detail_namespace.clone(),
            containers: config.containers.clone(),
        }
    }

    /// The allow-list in declaration order.
    pub fn known_sources(&self) -> &'static [KnownSource] {
        KNOWN_SOURCES
    }

    pub fn is_known(&self, name: &str) -> bool {
        lookup(name).is_some()
    }

    /// Resolve `name` to a binding. Unknown names get the generic layout.
    pub fn resolve(&self, name: &str) -> SourceBinding {
        let configured = self.containers.get(name).cloned();
        match lookup(name) {
            Some(known) => SourceBinding {
                name: SourceName::from(name),
                kind: known.kind,
                container: configured.unwrap_or_else(|| ContainerId::from(known.container)),
                table: name.to_string(),
                summary_document: DocumentId::from(known.summary_document),
                detail_namespace: known.detail_namespace.map(str::to_string),
                known: true,
            },
            None => SourceBinding {
                name: SourceName::from(name),
                kind: StrategyKind::Generic,
                container: configured.unwrap_or_else(|| self.default_container.clone()),
                table: name.to_string(),
                summary_document: self.default_summary_document.clone(),
                detail_namespace: Some(self.default_detail_namespace.clone()),
                known: false,
            },
        }
    }
}

fn lookup(name: &str) -> Option<&'static KnownSource> {
    KNOWN_SOURCES.iter().find(|k| k.name == name)
}
