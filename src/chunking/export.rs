use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::chunking::{Chunk, ChunkBuilder, ChunkKind, ChunkUnit, METADATA_TEXT_MAX_BYTES};
use crate::model::{
    ArticleRecord, ExportedChunk, LegacyMappingEntry, MetadataValue, RulingRecord,
    RulingsCorpus, StatuteCorpus,
};
use crate::numbering::ArticleNumber;
use crate::profile::{RulingProfile, StatuteProfile};
use crate::text::{take_bytes, take_chars};

type Metadata = BTreeMap<String, MetadataValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceExport {
    pub namespace: String,
    pub chunks: Vec<ExportedChunk>,
}

impl NamespaceExport {
    pub fn truncated_count(&self) -> usize {
        self.chunks
            .iter()
            .filter(|chunk| chunk.metadata.get("truncated") == Some(&MetadataValue::Flag(true)))
            .count()
    }

    pub fn max_text_chars(&self) -> usize {
        self.chunks
            .iter()
            .map(|chunk| chunk.text.chars().count())
            .max()
            .unwrap_or(0)
    }
}

pub fn clamp_text(text: String, marker: &str) -> (String, bool) {
    if text.len() <= METADATA_TEXT_MAX_BYTES {
        return (text, false);
    }
    let head = take_bytes(&text, METADATA_TEXT_MAX_BYTES.saturating_sub(marker.len()));
    (format!("{}{marker}", head.trim_end()), true)
}

fn finish(chunk: Chunk, mut metadata: Metadata, marker: &str) -> ExportedChunk {
    let (text, clamped) = clamp_text(chunk.text, marker);
    metadata.insert("chunk_type".to_string(), chunk.kind.as_str().into());
    metadata.insert("parent_id".to_string(), chunk.parent_id.into());
    metadata.insert("truncated".to_string(), (chunk.truncated || clamped).into());
    if let Some(paragraph) = chunk.paragraph {
        metadata.insert("paragraph".to_string(), i64::from(paragraph).into());
    }
    if let Some(part) = chunk.part {
        metadata.insert("part".to_string(), (part as i64).into());
    }

    ExportedChunk {
        id: chunk.id,
        text,
        metadata,
    }
}

fn insert_list(metadata: &mut Metadata, key: &str, values: Vec<String>) {
    if !values.is_empty() {
        metadata.insert(key.to_string(), values.into());
    }
}

pub fn statute_header(article: &ArticleRecord, profile: &StatuteProfile) -> String {
    let mut segments = vec![profile.header_label.clone()];
    if let Some(title) = &article.structure.title {
        segments.push(format!("{} {} ({})", profile.title_keyword, title.roman, title.name));
    }
    if let Some(chapter) = &article.structure.chapter {
        segments.push(format!(
            "{} {} ({})",
            profile.chapter_keyword, chapter.roman, chapter.name
        ));
    }
    segments.push(format!(
        "{} {}: {}",
        profile.article_keyword, article.number, article.title
    ));
    format!("{}. ", segments.join(" - "))
}

fn statute_metadata(article: &ArticleRecord, profile: &StatuteProfile) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), profile.source_tag.as_str().into());
    metadata.insert("article".to_string(), article.number.to_string().into());
    metadata.insert("article_title".to_string(), article.title.as_str().into());
    if let Some(title) = &article.structure.title {
        metadata.insert(
            "title_section".to_string(),
            format!("{} - {}", title.roman, title.name).into(),
        );
    }
    if let Some(chapter) = &article.structure.chapter {
        metadata.insert(
            "chapter".to_string(),
            format!("{} - {}", chapter.roman, chapter.name).into(),
        );
    }
    metadata.insert("topics".to_string(), article.topics.clone().into());
    metadata.insert(
        "citation".to_string(),
        format!("Art. {} {}", article.number, profile.chunk_citation).into(),
    );
    metadata.insert(
        "citation_short".to_string(),
        format!("Art. {} {}", article.number, profile.citation_short).into(),
    );
    insert_list(
        &mut metadata,
        "legacy_refs",
        article
            .legacy_references
            .structured
            .iter()
            .map(|reference| reference.key())
            .collect(),
    );
    metadata
}

pub fn statute_chunks(
    corpus: &StatuteCorpus,
    profile: &StatuteProfile,
    builder: &ChunkBuilder,
) -> NamespaceExport {
    let mut chunks = Vec::<ExportedChunk>::new();

    for article in &corpus.articles {
        let base_id = format!("{}_{}", profile.chunk_id_prefix, article.id);
        let unit = ChunkUnit {
            parent_id: base_id.clone(),
            base_id,
            header: statute_header(article, profile),
            body: &article.text,
            labels: &profile.labels,
            split_paragraphs: true,
        };
        let metadata = statute_metadata(article, profile);
        let built = builder.build(&unit);
        debug!(article = %article.number, chunks = built.len(), "chunked article");

        chunks.extend(
            built
                .into_iter()
                .map(|chunk| finish(chunk, metadata.clone(), &profile.labels.truncation_marker)),
        );
    }

    NamespaceExport {
        namespace: profile.namespace.clone(),
        chunks,
    }
}

pub fn linked_articles(
    ruling: &RulingRecord,
    legacy_mapping: &BTreeMap<String, Vec<LegacyMappingEntry>>,
) -> Vec<String> {
    ruling
        .references
        .specific
        .iter()
        .filter_map(|key| legacy_mapping.get(key))
        .flatten()
        .map(|entry| entry.article)
        .collect::<BTreeSet<ArticleNumber>>()
        .into_iter()
        .map(|article| article.to_string())
        .collect()
}

fn ruling_metadata(
    ruling: &RulingRecord,
    profile: &RulingProfile,
    legacy_mapping: Option<&BTreeMap<String, Vec<LegacyMappingEntry>>>,
) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), profile.source_tag.as_str().into());
    metadata.insert("number".to_string(), i64::from(ruling.number).into());
    metadata.insert("year".to_string(), i64::from(ruling.year).into());
    metadata.insert("date".to_string(), ruling.date.as_str().into());
    metadata.insert("tag".to_string(), ruling.tag.as_str().into());
    metadata.insert("subject".to_string(), ruling.subject.as_str().into());
    metadata.insert("topics".to_string(), ruling.topics.clone().into());
    metadata.insert(
        "citation".to_string(),
        ruling.retrieval.citation.as_str().into(),
    );
    metadata.insert(
        "citation_short".to_string(),
        ruling.retrieval.citation_short.as_str().into(),
    );
    if let Some(link) = &ruling.link_pdf {
        metadata.insert("link_pdf".to_string(), link.as_str().into());
    }
    insert_list(
        &mut metadata,
        "normative_refs",
        ruling.references.specific.clone(),
    );
    if let Some(mapping) = legacy_mapping {
        insert_list(
            &mut metadata,
            "linked_articles",
            linked_articles(ruling, mapping),
        );
    }
    metadata
}

fn summary_text(ruling: &RulingRecord, profile: &RulingProfile) -> String {
    let mut parts = vec![
        format!("{} {}/{}.", profile.ruling_label, ruling.number, ruling.year),
        format!("{} {}.", profile.subject_label, ruling.subject.trim()),
    ];
    if !ruling.summary.trim().is_empty() {
        parts.push(ruling.summary.trim().to_string());
    }
    if let Some(question) = ruling.sections.question.as_deref() {
        parts.push(format!(
            "{} {}",
            profile.question_label,
            take_chars(question, profile.excerpt_chars).trim_end()
        ));
    }
    parts.join(" ")
}

pub fn ruling_chunks(
    corpus: &RulingsCorpus,
    profile: &RulingProfile,
    builder: &ChunkBuilder,
    legacy_mapping: Option<&BTreeMap<String, Vec<LegacyMappingEntry>>>,
) -> NamespaceExport {
    let mut chunks = Vec::<ExportedChunk>::new();

    for ruling in &corpus.rulings {
        let parent_id = format!("{}_{}", profile.chunk_id_prefix, ruling.id);
        let metadata = ruling_metadata(ruling, profile, legacy_mapping);

        let (text, truncated) = builder.bounded(&summary_text(ruling, profile), &profile.labels);
        let summary = Chunk {
            id: parent_id.clone(),
            parent_id: parent_id.clone(),
            text,
            kind: ChunkKind::Summary,
            paragraph: None,
            part: None,
            truncated,
        };
        chunks.push(finish(
            summary,
            metadata.clone(),
            &profile.labels.truncation_marker,
        ));

        let Some(opinion) = ruling.sections.opinion.as_deref() else {
            continue;
        };
        let unit = ChunkUnit {
            base_id: format!("{parent_id}_parere"),
            parent_id: parent_id.clone(),
            header: format!(
                "{} {}/{} - {}. {}: ",
                profile.ruling_label,
                ruling.number,
                ruling.year,
                ruling.subject.trim(),
                profile.opinion_label
            ),
            body: opinion,
            labels: &profile.labels,
            split_paragraphs: false,
        };
        chunks.extend(
            builder
                .build(&unit)
                .into_iter()
                .map(|chunk| finish(chunk, metadata.clone(), &profile.labels.truncation_marker)),
        );
    }

    NamespaceExport {
        namespace: profile.namespace.clone(),
        chunks,
    }
}
