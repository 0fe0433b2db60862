use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::model::MarkerRecord;
use crate::numbering::{ARTICLE_NUMBER_PATTERN, ArticleNumber, roman_to_int};
use crate::profile::StatuteProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Title,
    Chapter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralMarker {
    pub kind: MarkerKind,
    pub roman: String,
    pub value: u32,
    pub name: String,
    pub offset: usize,
}

impl StructuralMarker {
    pub fn record(&self) -> MarkerRecord {
        MarkerRecord {
            roman: self.roman.clone(),
            value: self.value,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSpan {
    pub number: ArticleNumber,
    pub offset: usize,
    pub content_start: usize,
    pub content_end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerAnchor {
    Tables,
    Notes,
}

impl TrailerAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            TrailerAnchor::Tables => "tables",
            TrailerAnchor::Notes => "notes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<'a> {
    pub body: &'a str,
    pub trailer: &'a str,
    pub anchor: Option<TrailerAnchor>,
}

#[derive(Debug, Clone, Default)]
pub struct MarkerIndex {
    offsets: Vec<usize>,
    markers: Vec<StructuralMarker>,
}

impl MarkerIndex {
    pub fn new(mut markers: Vec<StructuralMarker>) -> Self {
        markers.sort_by_key(|marker| marker.offset);
        let offsets = markers.iter().map(|marker| marker.offset).collect();
        Self { offsets, markers }
    }

    pub fn nearest_before(&self, offset: usize) -> Option<&StructuralMarker> {
        let position = self.offsets.partition_point(|candidate| *candidate < offset);
        position
            .checked_sub(1)
            .and_then(|index| self.markers.get(index))
    }

    pub fn markers(&self) -> &[StructuralMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }
}

#[derive(Debug)]
pub struct DocumentStructure<'a> {
    pub partition: Partition<'a>,
    pub titles: MarkerIndex,
    pub chapters: MarkerIndex,
    pub articles: Vec<ArticleSpan>,
    pub duplicate_articles: Vec<ArticleNumber>,
}

impl DocumentStructure<'_> {
    pub fn article_text(&self, span: &ArticleSpan) -> &str {
        self.partition.body[span.content_start..span.content_end].trim()
    }

    // Enclosing title and chapter of an article. A chapter that sits before the
    // enclosing title belongs to the previous title and is not returned.
    pub fn parents(&self, span: &ArticleSpan) -> (Option<&StructuralMarker>, Option<&StructuralMarker>) {
        let title = self.titles.nearest_before(span.offset);
        let chapter = self
            .chapters
            .nearest_before(span.offset)
            .filter(|chapter| title.map(|title| chapter.offset > title.offset).unwrap_or(true));
        (title, chapter)
    }
}

#[derive(Debug)]
pub struct StructureParser {
    title_marker: Regex,
    chapter_marker: Regex,
    article_marker: Regex,
    table_anchor: Regex,
    notes_anchor: Regex,
}

impl StructureParser {
    pub fn new(profile: &StatuteProfile) -> Result<Self> {
        Ok(Self {
            title_marker: Regex::new(r"(?m)^[ \t]*TITOLO[ \t]+([IVXLCDM]+)[ \t]*\n\s*([^\n]+)")
                .context("failed to compile title marker regex")?,
            chapter_marker: Regex::new(
                r"(?m)^[ \t]*(?:Capo|CAPO)[ \t]+([IVXLCDM]+)[ \t]*\n\s*([^\n]+)",
            )
            .context("failed to compile chapter marker regex")?,
            article_marker: Regex::new(&format!(
                r"(?im)^[ \t]*ART\.[ \t]*({ARTICLE_NUMBER_PATTERN})[ \t]*$"
            ))
            .context("failed to compile article marker regex")?,
            table_anchor: Regex::new(&profile.table_anchor).with_context(|| {
                format!("failed to compile table anchor: {}", profile.table_anchor)
            })?,
            notes_anchor: Regex::new(&profile.notes_anchor).with_context(|| {
                format!("failed to compile notes anchor: {}", profile.notes_anchor)
            })?,
        })
    }

    pub fn partition<'a>(&self, text: &'a str) -> Partition<'a> {
        let tables = self
            .table_anchor
            .find(text)
            .map(|found| (found.start(), TrailerAnchor::Tables));
        let notes = self
            .notes_anchor
            .find(text)
            .map(|found| (found.start(), TrailerAnchor::Notes));

        let boundary = match (tables, notes) {
            (Some(tables), Some(notes)) => Some(if notes.0 < tables.0 { notes } else { tables }),
            (tables, notes) => tables.or(notes),
        };

        match boundary {
            Some((offset, anchor)) => Partition {
                body: &text[..offset],
                trailer: &text[offset..],
                anchor: Some(anchor),
            },
            None => Partition {
                body: text,
                trailer: "",
                anchor: None,
            },
        }
    }

    fn markers(&self, body: &str, kind: MarkerKind) -> Vec<StructuralMarker> {
        let regex = match kind {
            MarkerKind::Title => &self.title_marker,
            MarkerKind::Chapter => &self.chapter_marker,
        };

        regex
            .captures_iter(body)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let roman = captures.get(1)?.as_str().trim().to_string();
                let name = captures.get(2)?.as_str().trim().to_string();
                Some(StructuralMarker {
                    kind,
                    value: roman_to_int(&roman),
                    roman,
                    name,
                    offset: whole.start(),
                })
            })
            .collect()
    }

    pub fn parse<'a>(&self, text: &'a str) -> DocumentStructure<'a> {
        let partition = self.partition(text);
        let body = partition.body;

        let titles = MarkerIndex::new(self.markers(body, MarkerKind::Title));
        let chapters = MarkerIndex::new(self.markers(body, MarkerKind::Chapter));

        let mut article_markers = Vec::<(usize, usize, ArticleNumber)>::new();
        let mut duplicate_articles = Vec::<ArticleNumber>::new();
        for captures in self.article_marker.captures_iter(body) {
            let (Some(whole), Some(raw_number)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let Ok(number) = raw_number.as_str().parse::<ArticleNumber>() else {
                continue;
            };
            if article_markers.iter().any(|(_, _, seen)| *seen == number) {
                duplicate_articles.push(number);
            }
            article_markers.push((whole.start(), whole.end(), number));
        }

        // Every structural marker closes the span of the article before it.
        let mut boundaries = article_markers
            .iter()
            .map(|(start, _, _)| *start)
            .chain(titles.markers().iter().map(|marker| marker.offset))
            .chain(chapters.markers().iter().map(|marker| marker.offset))
            .collect::<Vec<usize>>();
        boundaries.sort_unstable();

        let mut articles = Vec::<ArticleSpan>::with_capacity(article_markers.len());
        for (offset, content_start, number) in article_markers {
            if articles.iter().any(|span: &ArticleSpan| span.number == number) {
                continue;
            }
            let next = boundaries.partition_point(|boundary| *boundary <= offset);
            let content_end = boundaries.get(next).copied().unwrap_or(body.len());
            articles.push(ArticleSpan {
                number,
                offset,
                content_start,
                content_end: content_end.max(content_start),
            });
        }

        debug!(
            titles = titles.len(),
            chapters = chapters.len(),
            articles = articles.len(),
            "parsed document structure"
        );

        DocumentStructure {
            partition,
            titles,
            chapters,
            articles,
            duplicate_articles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(value: u32, offset: usize) -> StructuralMarker {
        StructuralMarker {
            kind: MarkerKind::Chapter,
            roman: value.to_string(),
            value,
            name: format!("Capo {value}"),
            offset,
        }
    }

    #[test]
    fn nearest_before_finds_the_last_marker_strictly_before_an_offset() {
        let mut markers = (1..=200)
            .map(|value| chapter(value, value as usize * 100))
            .collect::<Vec<_>>();
        markers.reverse();
        let index = MarkerIndex::new(markers);
        assert_eq!(index.len(), 200);

        assert!(index.nearest_before(0).is_none());
        assert!(index.nearest_before(100).is_none());
        assert_eq!(index.nearest_before(101).map(|marker| marker.value), Some(1));
        assert_eq!(index.nearest_before(12_345).map(|marker| marker.value), Some(123));
        assert_eq!(index.nearest_before(12_300).map(|marker| marker.value), Some(122));
        assert_eq!(index.nearest_before(20_000).map(|marker| marker.value), Some(199));
        assert_eq!(index.nearest_before(usize::MAX).map(|marker| marker.value), Some(200));
    }
}
