use serde::{Deserialize, Serialize};

/// One page to scrape plus the archives wanted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Provenance tag copied into every link found on this page
    pub name: String,
    pub page_url: String,
    /// Matched in order; each term yields at most one link
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// A match term and the filename its archive is saved under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub term: String,
    pub filename: String,
}

impl SourceDefinition {
    pub fn new(name: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page_url: page_url.into(),
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, term: impl Into<String>, filename: impl Into<String>) -> Self {
        self.targets.push(Target {
            term: term.into(),
            filename: filename.into(),
        });
        self
    }
}

/// The IMAC licensing and enforcement pages.
pub fn default_sources() -> Vec<SourceDefinition> {
    vec![
        SourceDefinition::new("LICENCIAMENTO", "https://imac.ac.gov.br/licenciamento/")
            .with_target("SUPRESSAO", "imac_supressao.zip")
            .with_target("USO-ALTERNATIVO", "imac_uso_alternativo.zip"),
        SourceDefinition::new(
            "FISCALIZACAO",
            "https://imac.ac.gov.br/fiscalizacao-autuacoes/",
        )
        .with_target("Embargos_Adm_IMAC_2025", "imac_embargos_2025.zip")
        .with_target("Embargos_adm_IMAC_2024", "imac_embargos_2024.zip"),
    ]
}
