use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::numbering::ArticleNumber;

// ---------------------------------------------------------------------------
// Statute corpus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatuteCorpus {
    pub metadata: StatuteMetadata,
    pub articles: Vec<ArticleRecord>,
    pub rate_tables: Vec<RateTableRef>,
    pub topic_index: BTreeMap<String, Vec<TopicIndexEntry>>,
    pub cross_reference_graph: BTreeMap<String, Vec<String>>,
    pub legacy_mapping: BTreeMap<String, Vec<LegacyMappingEntry>>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatuteMetadata {
    pub name: String,
    pub title: String,
    pub publication: Option<String>,
    pub in_force_from: Option<String>,
    pub source_tag: String,
    pub lexicon_version: String,
    pub article_count: usize,
    pub title_count: usize,
    pub chapter_count: usize,
    pub titles: Vec<MarkerRecord>,
    pub chapters: Vec<MarkerRecord>,
    pub body_chars: usize,
    pub trailer_chars: usize,
    pub trailer_anchor: Option<String>,
    pub artifacts_removed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerRecord {
    pub roman: String,
    pub value: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: String,
    pub number: ArticleNumber,
    pub title: String,
    pub statute: String,
    pub structure: ArticleStructure,
    pub legacy_references: LegacyReferences,
    pub text: String,
    pub paragraphs: Vec<ParagraphRecord>,
    pub paragraph_count: usize,
    pub topics: Vec<String>,
    pub cross_references: Vec<ArticleNumber>,
    pub retrieval: ArticleRetrieval,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleStructure {
    pub title: Option<MarkerRecord>,
    pub chapter: Option<MarkerRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyReferences {
    pub full_text: Option<String>,
    pub raw: Vec<String>,
    pub structured: Vec<LegacyReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LegacyReference {
    pub statute: String,
    pub article: ArticleNumber,
}

impl LegacyReference {
    pub fn key(&self) -> String {
        format!("{} art. {}", self.statute, self.article)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    pub number: u32,
    pub preview: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRetrieval {
    pub search_text: String,
    pub citation: String,
    pub citation_short: String,
    pub char_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTableRef {
    pub key: String,
    pub description: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicIndexEntry {
    pub id: String,
    pub reference: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyMappingEntry {
    pub id: String,
    pub article: ArticleNumber,
    pub title: String,
}

// ---------------------------------------------------------------------------
// Rulings corpus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulingSource {
    pub number: u32,
    pub year: i32,
    pub date: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub link_pdf: Option<String>,
    #[serde(default)]
    pub text_path: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulingsCorpus {
    pub metadata: RulingsMetadata,
    pub rulings: Vec<RulingRecord>,
    pub topic_index: BTreeMap<String, Vec<TopicIndexEntry>>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulingsMetadata {
    pub description: String,
    pub source_tag: String,
    pub lexicon_version: String,
    pub ruling_count: usize,
    pub per_year: BTreeMap<String, usize>,
    pub per_tag: BTreeMap<String, usize>,
    pub with_full_text: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulingRecord {
    pub id: String,
    pub number: u32,
    pub year: i32,
    pub date: String,
    pub tag: String,
    pub subject: String,
    pub summary: String,
    pub link_pdf: Option<String>,
    pub sections: RulingSections,
    pub text: Option<String>,
    pub references: NormativeReferences,
    pub topics: Vec<String>,
    pub retrieval: RulingRetrieval,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulingSections {
    pub subject: Option<String>,
    pub question: Option<String>,
    pub taxpayer_solution: Option<String>,
    pub opinion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormativeReferences {
    pub specific: Vec<String>,
    pub cited_articles: Vec<ArticleNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulingRetrieval {
    pub search_text: String,
    pub citation: String,
    pub citation_short: String,
    pub has_full_text: bool,
    pub char_count: usize,
}

// ---------------------------------------------------------------------------
// Chunk export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Flag(bool),
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Flag(value)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(value: Vec<String>) -> Self {
        MetadataValue::List(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedChunk {
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, MetadataValue>,
}

// ---------------------------------------------------------------------------
// Run manifests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CorpusRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub command: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub input_path: String,
    pub input_sha256: String,
    pub output_path: String,
    pub output_sha256: String,
    pub lexicon_version: String,
    pub counts: BTreeMap<String, usize>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub updated_at: String,
    pub budget: usize,
    pub safety_margin: usize,
    pub ledger_path: Option<String>,
    pub namespaces: Vec<NamespaceExportSummary>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamespaceExportSummary {
    pub namespace: String,
    pub path: String,
    pub sha256: String,
    pub chunk_count: usize,
    pub truncated_count: usize,
    pub max_text_chars: usize,
    pub pending_upload: Vec<String>,
    pub stale: Vec<String>,
    pub unchanged_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub manifest_version: u32,
    pub generated_at: String,
    pub checks: Vec<ValidationCheck>,
    pub failed_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}
