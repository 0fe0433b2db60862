pub mod export;
pub mod ledger;


use anyhow::{Result, bail};

use crate::profile::ChunkLabels;
use crate::text::{
    ELLIPSIS, ParagraphSplitter, char_len, split_sentences, split_words_bounded, take_chars,
    truncate_with_marker,
};

pub const DEFAULT_BUDGET: usize = 6000;
pub const DEFAULT_SAFETY_MARGIN: usize = 500;
// Upper bound imposed by the vector store on a single metadata value.
pub const METADATA_TEXT_MAX_BYTES: usize = 39_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Whole,
    Paragraph,
    Preamble,
    Part,
    Summary,
}

impl ChunkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkKind::Whole => "whole",
            ChunkKind::Paragraph => "paragraph",
            ChunkKind::Preamble => "preamble",
            ChunkKind::Part => "part",
            ChunkKind::Summary => "summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub parent_id: String,
    pub text: String,
    pub kind: ChunkKind,
    pub paragraph: Option<u32>,
    pub part: Option<usize>,
    pub truncated: bool,
}

#[derive(Debug, Clone)]
pub struct ChunkUnit<'a> {
    pub base_id: String,
    pub parent_id: String,
    pub header: String,
    pub body: &'a str,
    pub labels: &'a ChunkLabels,
    pub split_paragraphs: bool,
}

#[derive(Debug)]
pub struct ChunkBuilder {
    budget: usize,
    safety_margin: usize,
    paragraphs: ParagraphSplitter,
}

impl ChunkBuilder {
    pub fn new(budget: usize, safety_margin: usize) -> Result<Self> {
        if budget == 0 {
            bail!("chunk budget must be greater than zero");
        }
        Ok(Self {
            budget,
            safety_margin,
            paragraphs: ParagraphSplitter::new()?,
        })
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn safety_margin(&self) -> usize {
        self.safety_margin
    }

    pub fn check_labels(&self, labels: &ChunkLabels) -> Result<()> {
        let marker_chars = char_len(&labels.truncation_marker);
        if self.budget <= marker_chars {
            bail!(
                "chunk budget {} must exceed the truncation marker ({marker_chars} chars)",
                self.budget
            );
        }
        Ok(())
    }

    pub fn build(&self, unit: &ChunkUnit<'_>) -> Vec<Chunk> {
        let body = unit.body.trim();
        if char_len(&unit.header) + char_len(body) <= self.budget {
            return vec![Chunk {
                id: unit.base_id.clone(),
                parent_id: unit.parent_id.clone(),
                text: format!("{}{body}", unit.header),
                kind: ChunkKind::Whole,
                paragraph: None,
                part: None,
                truncated: false,
            }];
        }

        let header = self.fitted_header(&unit.header);
        if unit.split_paragraphs {
            if let Some(chunks) = self.paragraph_chunks(unit, &header, body) {
                return chunks;
            }
        }

        self.part_chunks(unit, &header, body)
    }

    // A header may take at most half the budget once the unit has to be split.
    fn fitted_header(&self, header: &str) -> String {
        let max_chars = self.budget / 2;
        if char_len(header) <= max_chars {
            return header.to_string();
        }
        let keep = max_chars.saturating_sub(char_len(ELLIPSIS) + 1);
        format!("{}{ELLIPSIS} ", take_chars(header, keep).trim_end())
    }

    pub fn bounded(&self, text: &str, labels: &ChunkLabels) -> (String, bool) {
        truncate_with_marker(text, self.budget, &labels.truncation_marker)
    }

    fn paragraph_chunks(
        &self,
        unit: &ChunkUnit<'_>,
        header: &str,
        body: &str,
    ) -> Option<Vec<Chunk>> {
        let split = self.paragraphs.split(body)?;
        if split.paragraphs.is_empty() {
            return None;
        }

        let mut chunks = Vec::<Chunk>::with_capacity(split.paragraphs.len() + 1);
        if !split.preamble.is_empty() {
            let (text, truncated) =
                self.bounded(&format!("{header}{}", split.preamble), unit.labels);
            chunks.push(Chunk {
                id: format!("{}_pre", unit.base_id),
                parent_id: unit.parent_id.clone(),
                text,
                kind: ChunkKind::Preamble,
                paragraph: None,
                part: None,
                truncated,
            });
        }

        let mut occurrences = Vec::<(u32, usize)>::new();
        for paragraph in &split.paragraphs {
            let seen = match occurrences
                .iter_mut()
                .find(|(number, _)| *number == paragraph.number)
            {
                Some((_, count)) => {
                    *count += 1;
                    *count
                }
                None => {
                    occurrences.push((paragraph.number, 1));
                    1
                }
            };
            let id = if seen == 1 {
                format!("{}_c{}", unit.base_id, paragraph.number)
            } else {
                format!("{}_c{}-{seen}", unit.base_id, paragraph.number)
            };

            let (text, truncated) = self.bounded(
                &format!(
                    "{header}{} {}. {}",
                    unit.labels.paragraph, paragraph.number, paragraph.text
                ),
                unit.labels,
            );
            chunks.push(Chunk {
                id,
                parent_id: unit.parent_id.clone(),
                text,
                kind: ChunkKind::Paragraph,
                paragraph: Some(paragraph.number),
                part: None,
                truncated,
            });
        }

        Some(chunks)
    }

    fn part_chunks(&self, unit: &ChunkUnit<'_>, header: &str, body: &str) -> Vec<Chunk> {
        // Room for "(<label> NNNN) " after the header.
        let prefix_chars = char_len(header) + char_len(&unit.labels.part) + 8;
        let limit = self
            .budget
            .saturating_sub(self.safety_margin.max(prefix_chars))
            .max(1);

        accumulate_sentences(body, limit)
            .into_iter()
            .enumerate()
            .map(|(index, part)| {
                let ordinal = index + 1;
                let (text, truncated) = self.bounded(
                    &format!("{header}({} {ordinal}) {part}", unit.labels.part),
                    unit.labels,
                );
                Chunk {
                    id: format!("{}_p{ordinal}", unit.base_id),
                    parent_id: unit.parent_id.clone(),
                    text,
                    kind: ChunkKind::Part,
                    paragraph: None,
                    part: Some(ordinal),
                    truncated,
                }
            })
            .collect()
    }
}

pub fn accumulate_sentences(text: &str, limit: usize) -> Vec<String> {
    fn flush(current: &mut String, parts: &mut Vec<String>) {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
        current.clear();
    }

    let mut parts = Vec::<String>::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let sentence_chars = char_len(sentence.trim());
        if sentence_chars > limit {
            flush(&mut current, &mut parts);
            parts.extend(split_words_bounded(sentence, limit));
            continue;
        }
        if char_len(&current) + char_len(sentence) > limit {
            flush(&mut current, &mut parts);
            current.push_str(sentence.trim_start());
        } else {
            current.push_str(sentence);
        }
    }
    flush(&mut current, &mut parts);

    parts
}
