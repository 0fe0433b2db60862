use std::collections::BTreeMap;

use crate::model::{ArticleRecord, LegacyMappingEntry, RulingRecord, TopicIndexEntry};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatuteIndices {
    pub topic_index: BTreeMap<String, Vec<TopicIndexEntry>>,
    pub cross_reference_graph: BTreeMap<String, Vec<String>>,
    pub legacy_mapping: BTreeMap<String, Vec<LegacyMappingEntry>>,
}

pub struct CrossReferenceIndexer;

impl CrossReferenceIndexer {
    pub fn statute(articles: &[ArticleRecord]) -> StatuteIndices {
        StatuteIndices {
            topic_index: Self::article_topics(articles),
            cross_reference_graph: Self::cross_reference_graph(articles),
            legacy_mapping: Self::legacy_mapping(articles),
        }
    }

    pub fn article_topics(articles: &[ArticleRecord]) -> BTreeMap<String, Vec<TopicIndexEntry>> {
        let mut index = BTreeMap::<String, Vec<TopicIndexEntry>>::new();
        for article in articles {
            for topic in &article.topics {
                index.entry(topic.clone()).or_default().push(TopicIndexEntry {
                    id: article.id.clone(),
                    reference: article.number.to_string(),
                    title: article.title.clone(),
                });
            }
        }
        index
    }

    pub fn cross_reference_graph(articles: &[ArticleRecord]) -> BTreeMap<String, Vec<String>> {
        articles
            .iter()
            .filter(|article| !article.cross_references.is_empty())
            .map(|article| {
                (
                    article.id.clone(),
                    article
                        .cross_references
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                )
            })
            .collect()
    }

    pub fn legacy_mapping(articles: &[ArticleRecord]) -> BTreeMap<String, Vec<LegacyMappingEntry>> {
        let mut mapping = BTreeMap::<String, Vec<LegacyMappingEntry>>::new();
        for article in articles {
            for reference in &article.legacy_references.structured {
                let entries = mapping.entry(reference.key()).or_default();
                if entries.iter().any(|entry| entry.id == article.id) {
                    continue;
                }
                entries.push(LegacyMappingEntry {
                    id: article.id.clone(),
                    article: article.number,
                    title: article.title.clone(),
                });
            }
        }
        mapping
    }

    pub fn ruling_topics(rulings: &[RulingRecord]) -> BTreeMap<String, Vec<TopicIndexEntry>> {
        let mut index = BTreeMap::<String, Vec<TopicIndexEntry>>::new();
        for ruling in rulings {
            for topic in &ruling.topics {
                index.entry(topic.clone()).or_default().push(TopicIndexEntry {
                    id: ruling.id.clone(),
                    reference: format!("{}/{}", ruling.number, ruling.year),
                    title: ruling.subject.clone(),
                });
            }
        }
        index
    }
}
