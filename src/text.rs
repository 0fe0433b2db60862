use anyhow::{Context, Result};
use regex::Regex;

pub const ELLIPSIS: &str = "...";

#[derive(Debug)]
pub struct TextNormalizer {
    artifacts: Vec<Regex>,
    blank_runs: Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub artifacts_removed: usize,
}

impl TextNormalizer {
    pub fn new<S: AsRef<str>>(artifact_patterns: &[S]) -> Result<Self> {
        let artifacts = artifact_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern.as_ref()).with_context(|| {
                    format!("failed to compile artifact pattern: {}", pattern.as_ref())
                })
            })
            .collect::<Result<Vec<Regex>>>()?;

        Ok(Self {
            artifacts,
            blank_runs: Regex::new(r"\n(?:[ \t]*\n){2,}")
                .context("failed to compile blank-line regex")?,
        })
    }

    pub fn normalize(&self, raw: &str) -> NormalizedText {
        let mut text = raw.replace("\r\n", "\n").replace('\r', "\n");
        let mut artifacts_removed = 0usize;

        for artifact in &self.artifacts {
            let hits = artifact.find_iter(&text).count();
            if hits == 0 {
                continue;
            }
            artifacts_removed += hits;
            text = artifact.replace_all(&text, "").into_owned();
        }

        let collapsed = self.blank_runs.replace_all(&text, "\n\n");

        NormalizedText {
            text: collapsed.trim().to_string(),
            artifacts_removed,
        }
    }
}

pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn char_len(input: &str) -> usize {
    input.chars().count()
}

pub fn take_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &input[..byte_index],
        None => input,
    }
}

pub fn take_bytes(input: &str, max_bytes: usize) -> &str {
    if input.len() <= max_bytes {
        return input;
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}

pub fn truncate_with_marker(input: &str, max_chars: usize, marker: &str) -> (String, bool) {
    if char_len(input) <= max_chars {
        return (input.to_string(), false);
    }

    let marker_chars = char_len(marker);
    if marker_chars >= max_chars {
        return (take_chars(input, max_chars).to_string(), true);
    }
    let head = take_chars(input, max_chars - marker_chars).trim_end();
    (format!("{head}{marker}"), true)
}

pub fn bounded_preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let first_line = trimmed.lines().next().unwrap_or("").trim();
    let head = take_chars(first_line, max_chars);

    if head.len() < trimmed.len() {
        format!("{head}{ELLIPSIS}")
    } else {
        head.to_string()
    }
}

pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split_inclusive('.')
        .filter(|sentence| !sentence.trim().is_empty())
        .collect()
}

pub fn split_words_bounded(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::<String>::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let mut word = word;
        while char_len(word) > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            let head = take_chars(word, max_chars);
            pieces.push(head.to_string());
            word = &word[head.len()..];
        }
        if word.is_empty() {
            continue;
        }

        let word_chars = char_len(word);
        let needed = if current.is_empty() {
            word_chars
        } else {
            current_chars + 1 + word_chars
        };
        if needed > max_chars && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphSegment<'a> {
    pub number: u32,
    pub text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphSplit<'a> {
    pub preamble: &'a str,
    pub paragraphs: Vec<ParagraphSegment<'a>>,
}

#[derive(Debug)]
pub struct ParagraphSplitter {
    marker: Regex,
}

impl ParagraphSplitter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            marker: Regex::new(r"(?m)^[ \t]*(\d{1,3})[ \t]*[.)]")
                .context("failed to compile paragraph marker regex")?,
        })
    }

    pub fn split<'a>(&self, text: &'a str) -> Option<ParagraphSplit<'a>> {
        let mut markers = Vec::<(usize, usize, u32)>::new();
        for captures in self.marker.captures_iter(text) {
            let (Some(whole), Some(digits)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            // "1.000 euro" at line start is an amount, not a paragraph.
            if text[whole.end()..]
                .chars()
                .next()
                .map(|character| character.is_ascii_digit())
                .unwrap_or(false)
            {
                continue;
            }
            let Ok(number) = digits.as_str().parse::<u32>() else {
                continue;
            };
            markers.push((whole.start(), whole.end(), number));
        }

        if markers.is_empty() {
            return None;
        }

        let preamble = text[..markers[0].0].trim();
        let mut paragraphs = Vec::with_capacity(markers.len());
        for (index, (_, content_start, number)) in markers.iter().enumerate() {
            let content_end = markers
                .get(index + 1)
                .map(|(next_start, _, _)| *next_start)
                .unwrap_or(text.len());
            let content = text[*content_start..content_end].trim();
            if content.is_empty() {
                continue;
            }
            paragraphs.push(ParagraphSegment {
                number: *number,
                text: content,
            });
        }

        Some(ParagraphSplit {
            preamble,
            paragraphs,
        })
    }
}
