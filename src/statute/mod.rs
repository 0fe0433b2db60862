mod article;
mod structure;
mod tables;

#[cfg(test)]
mod tests;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::index::CrossReferenceIndexer;
use crate::model::{
    ArticleRecord, ArticleRetrieval, ArticleStructure, StatuteCorpus, StatuteMetadata,
};
use crate::profile::StatuteProfile;
use crate::text::{TextNormalizer, char_len};
use crate::topics::TopicClassifier;

use article::{AnalyzedArticle, ArticleAnalyzer};
use structure::{ArticleSpan, DocumentStructure, StructuralMarker, StructureParser};
use tables::RateTableCatalog;

pub struct StatuteParser<'a> {
    profile: &'a StatuteProfile,
    classifier: &'a TopicClassifier,
    normalizer: TextNormalizer,
    structure: StructureParser,
    analyzer: ArticleAnalyzer<'a>,
    rate_tables: RateTableCatalog,
}

impl<'a> StatuteParser<'a> {
    pub fn new(profile: &'a StatuteProfile, classifier: &'a TopicClassifier) -> Result<Self> {
        Ok(Self {
            profile,
            classifier,
            normalizer: TextNormalizer::new(&profile.artifact_patterns)?,
            structure: StructureParser::new(profile)?,
            analyzer: ArticleAnalyzer::new(classifier)?,
            rate_tables: RateTableCatalog::new(&profile.rate_tables)?,
        })
    }

    pub fn parse(&self, raw_text: &str) -> StatuteCorpus {
        let normalized = self.normalizer.normalize(raw_text);
        let structure = self.structure.parse(&normalized.text);
        let mut warnings = Vec::<String>::new();

        if structure.partition.anchor.is_none() {
            warnings.push(
                "no table or notes section found; whole text treated as statute body".to_string(),
            );
        }
        for duplicate in &structure.duplicate_articles {
            warnings.push(format!("duplicate article {duplicate} dropped"));
        }

        let mut articles = Vec::<ArticleRecord>::with_capacity(structure.articles.len());
        for span in &structure.articles {
            let analyzed = self.analyzer.analyze(structure.article_text(span));
            if analyzed.unterminated_block {
                warnings.push(format!(
                    "article {}: unterminated reference block treated as body",
                    span.number
                ));
            }
            debug!(
                article = %span.number,
                paragraphs = analyzed.paragraphs.len(),
                topics = analyzed.topics.len(),
                "analyzed article"
            );
            articles.push(self.article_record(&structure, span, analyzed));
        }

        for warning in &warnings {
            warn!(warning = %warning, "statute parse warning");
        }

        let indices = CrossReferenceIndexer::statute(&articles);
        let metadata = StatuteMetadata {
            name: self.profile.name.clone(),
            title: self.profile.title.clone(),
            publication: self.profile.publication.clone(),
            in_force_from: self.profile.in_force_from.clone(),
            source_tag: self.profile.source_tag.clone(),
            lexicon_version: self.classifier.version().to_string(),
            article_count: articles.len(),
            title_count: structure.titles.len(),
            chapter_count: structure.chapters.len(),
            titles: structure
                .titles
                .markers()
                .iter()
                .map(StructuralMarker::record)
                .collect(),
            chapters: structure
                .chapters
                .markers()
                .iter()
                .map(StructuralMarker::record)
                .collect(),
            body_chars: char_len(structure.partition.body),
            trailer_chars: char_len(structure.partition.trailer),
            trailer_anchor: structure
                .partition
                .anchor
                .map(|anchor| anchor.as_str().to_string()),
            artifacts_removed: normalized.artifacts_removed,
        };

        info!(
            articles = metadata.article_count,
            titles = metadata.title_count,
            chapters = metadata.chapter_count,
            legacy_keys = indices.legacy_mapping.len(),
            warnings = warnings.len(),
            "parsed statute"
        );

        StatuteCorpus {
            metadata,
            articles,
            rate_tables: self.rate_tables.detect(structure.partition.trailer),
            topic_index: indices.topic_index,
            cross_reference_graph: indices.cross_reference_graph,
            legacy_mapping: indices.legacy_mapping,
            warnings,
        }
    }

    fn article_record(
        &self,
        structure: &DocumentStructure<'_>,
        span: &ArticleSpan,
        analyzed: AnalyzedArticle,
    ) -> ArticleRecord {
        let (title, chapter) = structure.parents(span);
        let number = span.number;

        ArticleRecord {
            id: format!("art_{number}"),
            number,
            title: analyzed.title,
            statute: self.profile.statute_label.clone(),
            structure: ArticleStructure {
                title: title.map(StructuralMarker::record),
                chapter: chapter.map(StructuralMarker::record),
            },
            legacy_references: analyzed.legacy,
            paragraph_count: analyzed.paragraphs.len(),
            paragraphs: analyzed.paragraphs,
            topics: analyzed.topics,
            cross_references: analyzed.cross_references,
            retrieval: ArticleRetrieval {
                search_text: analyzed.search_text,
                citation: format!("Art. {number} {}", self.profile.citation_formal),
                citation_short: format!("Art. {number} {}", self.profile.citation_short),
                char_count: char_len(&analyzed.body),
            },
            text: analyzed.body,
        }
    }
}
