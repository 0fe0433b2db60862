mod references;
mod sections;


use std::collections::BTreeMap;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::index::CrossReferenceIndexer;
use crate::model::{
    NormativeReferences, RulingRecord, RulingRetrieval, RulingSections, RulingSource,
    RulingsCorpus, RulingsMetadata,
};
use crate::profile::RulingProfile;
use crate::text::{TextNormalizer, char_len, take_chars};
use crate::topics::TopicClassifier;

pub use references::NormativeReferenceExtractor;
pub use sections::SectionExtractor;

pub struct RulingParser<'a> {
    profile: &'a RulingProfile,
    classifier: &'a TopicClassifier,
    normalizer: TextNormalizer,
    sections: SectionExtractor,
    references: NormativeReferenceExtractor,
}

impl<'a> RulingParser<'a> {
    pub fn new(
        profile: &'a RulingProfile,
        classifier: &'a TopicClassifier,
        consolidated_label: &str,
    ) -> Result<Self> {
        Ok(Self {
            profile,
            classifier,
            normalizer: TextNormalizer::new(&profile.artifact_patterns)?,
            sections: SectionExtractor::new(&profile.section_anchors)?,
            references: NormativeReferenceExtractor::new(consolidated_label)?,
        })
    }

    pub fn parse(&self, sources: Vec<RulingSource>, mut warnings: Vec<String>) -> RulingsCorpus {
        let mut rulings = Vec::<RulingRecord>::with_capacity(sources.len());
        let mut seen_ids = BTreeMap::<String, usize>::new();

        for source in sources {
            let record = self.ruling_record(source);
            let occurrences = seen_ids.entry(record.id.clone()).or_default();
            *occurrences += 1;
            if *occurrences > 1 {
                warnings.push(format!("duplicate ruling {} dropped", record.id));
                continue;
            }
            debug!(
                ruling = %record.id,
                has_text = record.retrieval.has_full_text,
                topics = record.topics.len(),
                "analyzed ruling"
            );
            rulings.push(record);
        }

        for warning in &warnings {
            warn!(warning = %warning, "rulings parse warning");
        }

        let metadata = self.metadata(&rulings);
        info!(
            rulings = metadata.ruling_count,
            with_full_text = metadata.with_full_text,
            warnings = warnings.len(),
            "parsed rulings"
        );

        RulingsCorpus {
            metadata,
            topic_index: CrossReferenceIndexer::ruling_topics(&rulings),
            rulings,
            warnings,
        }
    }

    fn ruling_record(&self, source: RulingSource) -> RulingRecord {
        let text = source
            .text
            .as_deref()
            .map(|raw| self.normalizer.normalize(raw).text)
            .filter(|text| !text.is_empty());

        let (sections, references) = match text.as_deref() {
            Some(text) => (self.sections.extract(text), self.references.extract(text)),
            None => (RulingSections::default(), NormativeReferences::default()),
        };

        let classified = format!(
            "{} {} {}",
            source.tag,
            source.subject,
            text.as_deref().unwrap_or(source.summary.as_str())
        );
        let topics = self.classifier.classify(&classified);
        let search_text = self.search_text(&source, &sections);
        let label = format!("{}/{}", source.number, source.year);

        RulingRecord {
            id: format!("{}_{}_{}", self.profile.id_prefix, source.year, source.number),
            retrieval: RulingRetrieval {
                search_text,
                citation: format!("{} {label} del {}", self.profile.citation_prefix, source.date),
                citation_short: format!("{} {label}", self.profile.citation_short_prefix),
                has_full_text: text.is_some(),
                char_count: text.as_deref().map(char_len).unwrap_or(0),
            },
            number: source.number,
            year: source.year,
            date: source.date,
            tag: source.tag,
            subject: source.subject,
            summary: source.summary,
            link_pdf: source.link_pdf,
            sections,
            text,
            references,
            topics,
        }
    }

    fn search_text(&self, source: &RulingSource, sections: &RulingSections) -> String {
        fn excerpt(section: &Option<String>, cap: usize) -> &str {
            section
                .as_deref()
                .map(|text| take_chars(text, cap))
                .unwrap_or("")
        }

        let cap = self.profile.excerpt_chars;
        [
            source.subject.trim(),
            source.summary.trim(),
            excerpt(&sections.question, cap),
            excerpt(&sections.opinion, cap),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
    }

    fn metadata(&self, rulings: &[RulingRecord]) -> RulingsMetadata {
        let mut per_year = BTreeMap::<String, usize>::new();
        let mut per_tag = BTreeMap::<String, usize>::new();
        for ruling in rulings {
            *per_year.entry(ruling.year.to_string()).or_default() += 1;
            if !ruling.tag.trim().is_empty() {
                *per_tag.entry(ruling.tag.clone()).or_default() += 1;
            }
        }

        RulingsMetadata {
            description: self.profile.description.clone(),
            source_tag: self.profile.source_tag.clone(),
            lexicon_version: self.classifier.version().to_string(),
            ruling_count: rulings.len(),
            per_year,
            per_tag,
            with_full_text: rulings
                .iter()
                .filter(|ruling| ruling.retrieval.has_full_text)
                .count(),
        }
    }
}
