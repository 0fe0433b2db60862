use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;

use crate::legacy::LegacyReferenceExtractor;
use crate::model::{LegacyReferences, ParagraphRecord};
use crate::numbering::{ARTICLE_NUMBER_PATTERN, ArticleNumber};
use crate::text::{ParagraphSplitter, bounded_preview, normalize_whitespace};
use crate::topics::TopicClassifier;

pub const PARAGRAPH_PREVIEW_CHARS: usize = 500;
pub const SEARCH_SENTENCES: usize = 5;
const MIN_SEARCH_SENTENCE_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedArticle {
    pub title: String,
    pub legacy: LegacyReferences,
    pub body: String,
    pub paragraphs: Vec<ParagraphRecord>,
    pub topics: Vec<String>,
    pub cross_references: Vec<ArticleNumber>,
    pub search_text: String,
    pub unterminated_block: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    SeekingBlockStart,
    InBlock { start: usize },
    InBody { start: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BlockLayout {
    block: Option<(usize, usize)>,
    body_start: usize,
    unterminated: bool,
}

// Line 0 is the title. The reference block opens on the first non-blank line after it
// when that line starts with "(" and closes on the first line ending with ")".
fn locate_legacy_block(lines: &[&str]) -> BlockLayout {
    let mut state = BlockState::SeekingBlockStart;

    for (index, line) in lines.iter().enumerate().skip(1) {
        let stripped = line.trim();
        state = match state {
            BlockState::SeekingBlockStart if stripped.is_empty() => BlockState::SeekingBlockStart,
            BlockState::SeekingBlockStart if stripped.starts_with('(') => {
                if stripped.ends_with(')') {
                    return BlockLayout {
                        block: Some((index, index + 1)),
                        body_start: index + 1,
                        unterminated: false,
                    };
                }
                BlockState::InBlock { start: index }
            }
            BlockState::SeekingBlockStart => BlockState::InBody { start: index },
            BlockState::InBlock { start } => {
                if stripped.ends_with(')') {
                    return BlockLayout {
                        block: Some((start, index + 1)),
                        body_start: index + 1,
                        unterminated: false,
                    };
                }
                BlockState::InBlock { start }
            }
            BlockState::InBody { start } => BlockState::InBody { start },
        };
        if matches!(state, BlockState::InBody { .. }) {
            break;
        }
    }

    match state {
        BlockState::SeekingBlockStart => BlockLayout {
            block: None,
            body_start: lines.len(),
            unterminated: false,
        },
        BlockState::InBlock { start } => BlockLayout {
            block: None,
            body_start: start,
            unterminated: true,
        },
        BlockState::InBody { start } => BlockLayout {
            block: None,
            body_start: start,
            unterminated: false,
        },
    }
}

#[derive(Debug)]
pub struct ArticleAnalyzer<'c> {
    classifier: &'c TopicClassifier,
    legacy: LegacyReferenceExtractor,
    paragraphs: ParagraphSplitter,
    cross_reference: Regex,
    reference_separator: Regex,
}

impl<'c> ArticleAnalyzer<'c> {
    pub fn new(classifier: &'c TopicClassifier) -> Result<Self> {
        Ok(Self {
            classifier,
            legacy: LegacyReferenceExtractor::new()?,
            paragraphs: ParagraphSplitter::new()?,
            cross_reference: Regex::new(&format!(
                r"(?i)(?:\barticol[oi]|\bart\.)\s+({ARTICLE_NUMBER_PATTERN})"
            ))
            .context("failed to compile cross-reference regex")?,
            reference_separator: Regex::new(r";\s*")
                .context("failed to compile reference separator regex")?,
        })
    }

    pub fn analyze(&self, article_text: &str) -> AnalyzedArticle {
        let lines = article_text.lines().collect::<Vec<&str>>();
        let title = lines.first().map(|line| line.trim()).unwrap_or("").to_string();
        let layout = locate_legacy_block(&lines);

        let legacy = match layout.block {
            Some((start, end)) => self.legacy_references(&lines[start..end]),
            None => LegacyReferences::default(),
        };
        let body = lines
            .get(layout.body_start..)
            .map(|rest| rest.join("\n"))
            .unwrap_or_default()
            .trim()
            .to_string();

        let paragraphs = self.paragraph_records(&body);
        let topics = self.classifier.classify(&format!("{title} {body}"));
        let cross_references = self.cross_references(&body);
        let search_text = self.search_text(&title, &body, &topics);

        AnalyzedArticle {
            title,
            legacy,
            body,
            paragraphs,
            topics,
            cross_references,
            search_text,
            unterminated_block: layout.unterminated,
        }
    }

    fn legacy_references(&self, block_lines: &[&str]) -> LegacyReferences {
        let joined = normalize_whitespace(&block_lines.join(" "));
        let full_text = joined
            .trim_matches(|character| character == '(' || character == ')')
            .trim()
            .to_string();
        let raw = self
            .reference_separator
            .split(&full_text)
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
            .map(str::to_string)
            .collect();
        let structured = self.legacy.extract(&full_text);

        LegacyReferences {
            full_text: Some(full_text),
            raw,
            structured,
        }
    }

    fn paragraph_records(&self, body: &str) -> Vec<ParagraphRecord> {
        let Some(split) = self.paragraphs.split(body) else {
            return Vec::new();
        };

        split
            .paragraphs
            .into_iter()
            .map(|paragraph| ParagraphRecord {
                number: paragraph.number,
                preview: bounded_preview(paragraph.text, PARAGRAPH_PREVIEW_CHARS),
                text: paragraph.text.to_string(),
            })
            .collect()
    }

    pub fn cross_references(&self, body: &str) -> Vec<ArticleNumber> {
        self.cross_reference
            .captures_iter(body)
            .filter_map(|captures| captures.get(1))
            .filter_map(|number| number.as_str().parse::<ArticleNumber>().ok())
            .collect::<BTreeSet<ArticleNumber>>()
            .into_iter()
            .collect()
    }

    fn search_text(&self, title: &str, body: &str, topics: &[String]) -> String {
        let key_sentences = body
            .split('.')
            .map(normalize_whitespace)
            .filter(|sentence| sentence.chars().count() > MIN_SEARCH_SENTENCE_CHARS)
            .take(SEARCH_SENTENCES)
            .collect::<Vec<String>>()
            .join(" ");

        format!(
            "{title}. {key_sentences}. {}",
            self.classifier.expand_labels(topics)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_on_one_line_is_separated_from_body() {
        let lines = ["Titolo", "(articolo 1 DPR)", "1. Testo."];
        assert_eq!(
            locate_legacy_block(&lines),
            BlockLayout {
                block: Some((1, 2)),
                body_start: 2,
                unterminated: false,
            }
        );
    }

    #[test]
    fn block_may_span_lines_after_blank_line() {
        let lines = ["Titolo", "", "(articolo 1,", "articolo 2)", "Testo."];
        assert_eq!(
            locate_legacy_block(&lines),
            BlockLayout {
                block: Some((2, 4)),
                body_start: 4,
                unterminated: false,
            }
        );
    }

    #[test]
    fn body_without_block_starts_at_first_text_line() {
        let lines = ["Titolo", "1. Testo (con parentesi)."];
        assert_eq!(
            locate_legacy_block(&lines),
            BlockLayout {
                block: None,
                body_start: 1,
                unterminated: false,
            }
        );
    }

    #[test]
    fn unterminated_block_becomes_body() {
        let lines = ["Titolo", "(articolo 1", "1. Testo"];
        assert_eq!(
            locate_legacy_block(&lines),
            BlockLayout {
                block: None,
                body_start: 1,
                unterminated: true,
            }
        );
    }

    #[test]
    fn cross_references_ignore_citation_order_and_repeats() {
        use crate::topics::default_lexicon;

        let classifier = TopicClassifier::new(default_lexicon()).expect("classifier");
        let analyzer = ArticleAnalyzer::new(&classifier).expect("analyzer");
        let forward = analyzer.cross_references(
            "Si applica l'articolo 3, poi l'art. 10 e l'articolo 2-bis; resta fermo l'art. 3.",
        );
        let backward = analyzer.cross_references(
            "Resta fermo l'art. 2-bis; si applica l'articolo 10, l'art. 3 e ancora l'articolo 10.",
        );

        let expected = ["2-bis", "3", "10"]
            .iter()
            .map(|number| number.parse::<ArticleNumber>().expect("number"))
            .collect::<Vec<_>>();
        assert_eq!(forward, expected);
        assert_eq!(backward, expected);
    }
}
