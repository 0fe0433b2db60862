mod defaults;

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::util::read_json;

pub use defaults::default_lexicon;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicLexicon {
    pub version: String,
    pub topics: Vec<TopicEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEntry {
    pub tag: String,
    pub label: String,
    pub patterns: Vec<String>,
}

impl TopicLexicon {
    pub fn load(path: &Path) -> Result<Self> {
        let lexicon: TopicLexicon = read_json(path)?;
        info!(
            path = %path.display(),
            version = %lexicon.version,
            topics = lexicon.topics.len(),
            "loaded topic lexicon"
        );
        Ok(lexicon)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(default_lexicon()),
        }
    }
}

#[derive(Debug)]
struct CompiledTopic {
    tag: String,
    label: String,
    patterns: Vec<Regex>,
}

#[derive(Debug)]
pub struct TopicClassifier {
    version: String,
    topics: Vec<CompiledTopic>,
}

impl TopicClassifier {
    pub fn new(lexicon: TopicLexicon) -> Result<Self> {
        let mut seen = HashSet::<String>::new();
        let mut topics = Vec::with_capacity(lexicon.topics.len());

        for entry in lexicon.topics {
            let tag = entry.tag.trim().to_string();
            if tag.is_empty() {
                bail!("lexicon {} contains a topic with an empty tag", lexicon.version);
            }
            if !seen.insert(tag.clone()) {
                bail!("lexicon {} defines topic '{}' twice", lexicon.version, tag);
            }
            if entry.patterns.is_empty() {
                bail!("topic '{}' has no patterns", tag);
            }

            let patterns = entry
                .patterns
                .iter()
                .map(|pattern| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .with_context(|| format!("invalid pattern for topic '{tag}': {pattern}"))
                })
                .collect::<Result<Vec<Regex>>>()?;

            topics.push(CompiledTopic {
                tag,
                label: entry.label,
                patterns,
            });
        }

        Ok(Self {
            version: lexicon.version,
            topics,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classify(&self, text: &str) -> Vec<String> {
        self.topics
            .iter()
            .filter(|topic| topic.patterns.iter().any(|pattern| pattern.is_match(text)))
            .map(|topic| topic.tag.clone())
            .collect()
    }

    pub fn label(&self, tag: &str) -> Option<&str> {
        self.topics
            .iter()
            .find(|topic| topic.tag == tag)
            .map(|topic| topic.label.as_str())
    }

    pub fn expand_labels(&self, tags: &[String]) -> String {
        tags.iter()
            .map(|tag| self.label(tag).unwrap_or(tag.as_str()))
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> TopicClassifier {
        TopicClassifier::new(default_lexicon()).expect("default lexicon compiles")
    }

    #[test]
    fn percentage_rate_is_tagged_aliquote() {
        let topics = classifier().classify("si applica l'aliquota del 10%");
        assert!(topics.contains(&"aliquote".to_string()));
    }

    #[test]
    fn classification_is_multi_label_and_case_insensitive() {
        let topics = classifier().classify("REVERSE CHARGE per le Cessioni di beni immobili");
        assert!(topics.contains(&"reverse_charge".to_string()));
        assert!(topics.contains(&"cessioni_beni".to_string()));
        assert!(topics.contains(&"iva_edilizia".to_string()));
    }

    #[test]
    fn ruling_phrasings_reach_the_shared_tags() {
        let classifier = classifier();
        let margin = classifier.classify("beni usati venduti con il margine");
        assert!(margin.contains(&"regime_speciale".to_string()));

        let property = classifier.classify("cessione immobiliare strumentale");
        assert!(property.contains(&"cessioni_beni".to_string()));

        let facade = classifier.classify("spese per il bonus facciate");
        assert!(facade.contains(&"iva_edilizia".to_string()));
    }

    #[test]
    fn tags_follow_lexicon_order() {
        let lexicon = TopicLexicon {
            version: "test".to_string(),
            topics: vec![
                TopicEntry {
                    tag: "secondo".to_string(),
                    label: "Secondo".to_string(),
                    patterns: vec!["beta".to_string()],
                },
                TopicEntry {
                    tag: "primo".to_string(),
                    label: "Primo".to_string(),
                    patterns: vec!["alfa".to_string(), "gamma".to_string()],
                },
            ],
        };
        let classifier = TopicClassifier::new(lexicon).expect("compile");
        assert_eq!(classifier.classify("gamma e beta"), vec!["secondo", "primo"]);
        assert!(classifier.classify("delta").is_empty());
        assert_eq!(
            classifier.expand_labels(&["primo".to_string(), "ignoto".to_string()]),
            "Primo ignoto"
        );
    }

    #[test]
    fn duplicate_tags_and_bad_patterns_are_rejected() {
        let entry = TopicEntry {
            tag: "x".to_string(),
            label: "x".to_string(),
            patterns: vec!["x".to_string()],
        };
        let duplicated = TopicLexicon {
            version: "dup".to_string(),
            topics: vec![entry.clone(), entry.clone()],
        };
        assert!(TopicClassifier::new(duplicated).is_err());

        let broken = TopicLexicon {
            version: "broken".to_string(),
            topics: vec![TopicEntry {
                patterns: vec!["(".to_string()],
                ..entry
            }],
        };
        assert!(TopicClassifier::new(broken).is_err());
    }

    #[test]
    fn lexicon_round_trips_through_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lexicon.json");
        crate::util::write_json_pretty(&path, &default_lexicon()).expect("write");
        let loaded = TopicLexicon::load_or_default(Some(&path)).expect("load");
        assert_eq!(loaded, default_lexicon());
    }
}
