use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpEntry {
    pub path: String,
    pub sha256: String,
    pub province_count: usize,
    pub district_count: usize,
    pub ward_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Resolved,
    ParseFailed,
    ResolveFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub path: String,
    pub reference: String,
    pub sha256: String,
    pub status: DocumentStatus,
    pub legacy_province_hint: Option<String>,
    pub reform_province_hint: Option<String>,
    pub clause_count: usize,
    pub row_count: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub filter_fallback: String,
    pub max_search_nodes: usize,
    pub legacy_dump: DumpEntry,
    pub reform_dump: DumpEntry,
    pub output_path: String,
    pub db_path: Option<String>,
    pub document_count: usize,
    pub failed_document_count: usize,
    pub row_count: usize,
    pub documents: Vec<DocumentEntry>,
}
