use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::util::read_json;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineProfile {
    pub statute: StatuteProfile,
    pub ruling: RulingProfile,
}

impl PipelineProfile {
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let profile: PipelineProfile = read_json(path)?;
        info!(path = %path.display(), "loaded pipeline profile");
        Ok(profile)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatuteProfile {
    pub name: String,
    pub title: String,
    pub publication: Option<String>,
    pub in_force_from: Option<String>,
    pub statute_label: String,
    pub header_label: String,
    pub citation_formal: String,
    pub citation_short: String,
    pub chunk_citation: String,
    pub source_tag: String,
    pub chunk_id_prefix: String,
    pub namespace: String,
    pub title_keyword: String,
    pub chapter_keyword: String,
    pub article_keyword: String,
    pub artifact_patterns: Vec<String>,
    pub table_anchor: String,
    pub notes_anchor: String,
    pub rate_tables: Vec<RateTableSpec>,
    pub labels: ChunkLabels,
}

impl Default for StatuteProfile {
    fn default() -> Self {
        Self {
            name: "Decreto Legislativo 19 gennaio 2026, n. 10".to_string(),
            title: "Testo Unico delle disposizioni legislative in materia di imposta sul valore aggiunto"
                .to_string(),
            publication: Some(
                "Supplemento ordinario n. 4/L alla G.U. Serie generale n. 24 del 30 gennaio 2026"
                    .to_string(),
            ),
            in_force_from: Some("1 gennaio 2027".to_string()),
            statute_label: "D.Lgs. 19 gennaio 2026, n. 10 - Testo Unico IVA".to_string(),
            header_label: "Testo Unico IVA".to_string(),
            citation_formal: "D.Lgs. 10/2026 (Testo Unico IVA)".to_string(),
            citation_short: "TU IVA".to_string(),
            chunk_citation: "D.Lgs. 10/2026 (TU IVA)".to_string(),
            source_tag: "tu_iva".to_string(),
            chunk_id_prefix: "tu".to_string(),
            namespace: "tu-iva".to_string(),
            title_keyword: "Titolo".to_string(),
            chapter_keyword: "Capo".to_string(),
            article_keyword: "Art.".to_string(),
            artifact_patterns: vec![
                r"—\s*\d+\s*—".to_string(),
                r"\d{1,2}-\d{1,2}-\d{4}\s+Supplemento ordinario n\.\s*\d+/L alla GAZZETTA UFFICIALE\s+Serie generale\s*-\s*n\.\s*\d+"
                    .to_string(),
            ],
            table_anchor: r"(?m)^[ \t]*TESTO UNICO IVA[ \t]*\n[ \t]*Tabella A[ \t]*\*".to_string(),
            notes_anchor: r"(?m)^[ \t]*NOTE[ \t]+[Ab]".to_string(),
            rate_tables: default_rate_tables(),
            labels: ChunkLabels::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTableSpec {
    pub key: String,
    pub pattern: String,
    pub description: String,
    pub note: String,
}

fn default_rate_tables() -> Vec<RateTableSpec> {
    let spec = |key: &str, pattern: &str, description: &str, note: &str| RateTableSpec {
        key: key.to_string(),
        pattern: pattern.to_string(),
        description: description.to_string(),
        note: note.to_string(),
    };

    vec![
        spec(
            "Parte I",
            r"(?i)\bParte\s+I\b",
            "Prodotti agricoli e ittici",
            "Vedi Tabella A - Parte I del Testo Unico IVA",
        ),
        spec(
            "Parte II",
            r"(?i)\bParte\s+II\b",
            "Beni e servizi soggetti all'aliquota del 4%",
            "Vedi Tabella A - Parte II del Testo Unico IVA",
        ),
        spec(
            "Parte II-bis",
            r"(?i)\bParte\s+II[\s-]*bis\b",
            "Beni e servizi soggetti all'aliquota del 5%",
            "Vedi Tabella A - Parte II-bis del Testo Unico IVA",
        ),
        spec(
            "Parte III",
            r"(?i)\bParte\s+III\b",
            "Beni e servizi soggetti all'aliquota del 10%",
            "Vedi Tabella A - Parte III del Testo Unico IVA",
        ),
        spec(
            "Tabella B",
            r"(?i)\bTabella\s+B\b",
            "Prodotti e servizi soggetti ad aliquota specifica",
            "Vedi Tabella B del Testo Unico IVA",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkLabels {
    pub paragraph: String,
    pub part: String,
    pub truncation_marker: String,
}

impl Default for ChunkLabels {
    fn default() -> Self {
        Self {
            paragraph: "Comma".to_string(),
            part: "parte".to_string(),
            truncation_marker: " [testo troncato]".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Subject,
    Question,
    TaxpayerSolution,
    Opinion,
}

impl SectionKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::Subject => "subject",
            SectionKey::Question => "question",
            SectionKey::TaxpayerSolution => "taxpayer_solution",
            SectionKey::Opinion => "opinion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionAnchor {
    pub key: SectionKey,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulingProfile {
    pub description: String,
    pub id_prefix: String,
    pub source_tag: String,
    pub chunk_id_prefix: String,
    pub namespace: String,
    pub ruling_label: String,
    pub subject_label: String,
    pub question_label: String,
    pub opinion_label: String,
    pub citation_prefix: String,
    pub citation_short_prefix: String,
    pub artifact_patterns: Vec<String>,
    pub section_anchors: Vec<SectionAnchor>,
    pub excerpt_chars: usize,
    pub labels: ChunkLabels,
}

impl Default for RulingProfile {
    fn default() -> Self {
        let anchor = |key: SectionKey, pattern: &str| SectionAnchor {
            key,
            pattern: pattern.to_string(),
        };

        Self {
            description: "Risposte a interpello dell'Agenzia delle Entrate".to_string(),
            id_prefix: "interpello".to_string(),
            source_tag: "interpello".to_string(),
            chunk_id_prefix: "ip".to_string(),
            namespace: "interpelli".to_string(),
            ruling_label: "Interpello n.".to_string(),
            subject_label: "Oggetto:".to_string(),
            question_label: "Quesito:".to_string(),
            opinion_label: "Parere dell'Agenzia delle Entrate".to_string(),
            citation_prefix: "Risposta a interpello n.".to_string(),
            citation_short_prefix: "Interpello".to_string(),
            artifact_patterns: vec![
                r"(?m)^[ \t]*Divisione [^\n]*\n".to_string(),
                r"(?m)^[ \t]*Direzione [^\n]*\n".to_string(),
                r"_{3,}".to_string(),
                r"-{3,}".to_string(),
            ],
            section_anchors: vec![
                anchor(SectionKey::Subject, r"(?im)^[ \t]*oggetto\b[ \t]*[:.]?[ \t]*"),
                anchor(SectionKey::Question, r"(?im)^[ \t]*quesito\b[ \t]*[:.]?[ \t]*"),
                anchor(
                    SectionKey::TaxpayerSolution,
                    r"(?im)^[ \t]*soluzione interpretativa prospettata dal(?:l['’])?[ \t]*(?:contribuente|istante)[ \t]*[:.]?[ \t]*",
                ),
                anchor(
                    SectionKey::Opinion,
                    r"(?im)^[ \t]*parere dell.agenzia(?: delle entrate)?[ \t]*[:.]?[ \t]*",
                ),
            ],
            excerpt_chars: 500,
            labels: ChunkLabels::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_profile_file_keeps_defaults_for_missing_fields() {
        let raw = r#"{ "statute": { "header_label": "TU IVA 2026" } }"#;
        let profile: PipelineProfile = serde_json::from_str(raw).expect("parse profile");
        assert_eq!(profile.statute.header_label, "TU IVA 2026");
        assert_eq!(profile.statute.chunk_id_prefix, "tu");
        assert_eq!(profile.ruling, RulingProfile::default());
    }

    #[test]
    fn section_keys_serialize_snake_case() {
        let json = serde_json::to_string(&SectionKey::TaxpayerSolution).expect("serialize");
        assert_eq!(json, "\"taxpayer_solution\"");
        assert_eq!(SectionKey::TaxpayerSolution.as_str(), "taxpayer_solution");
    }
}
