use anyhow::{Context, Result};
use regex::Regex;

use crate::model::LegacyReference;
use crate::numbering::{ARTICLE_NUMBER_PATTERN, ArticleNumber};

#[derive(Debug, Clone, Copy)]
pub struct LegacyStatute {
    pub label: &'static str,
    pub signature: &'static str,
    pub loose_signature: &'static str,
    pub mention: &'static str,
}

pub const LEGACY_STATUTES: [LegacyStatute; 2] = [
    LegacyStatute {
        label: "DPR 633/1972",
        signature: r"decreto\s+del\s+Presidente\s+della\s+Repubblica\s+26\s+ottobre\s+1972\s*,?\s*n\.\s*633\b",
        loose_signature: r"(?:d\.?\s*P\.?\s*R\.?\s*(?:n\.\s*)?633\b|decreto[^;\n]*?\b633\b)",
        mention: r"d\.?\s*P\.?\s*R\.?\s*(?:n\.\s*)?633\b|decreto[^\n]+?(?:26\s+ottobre\s+1972|n\.\s*633\b)",
    },
    LegacyStatute {
        label: "DL 331/1993",
        signature: r"decreto-?\s*legge\s+30\s+agosto\s+1993\s*,?\s*n\.\s*331\b",
        loose_signature: r"(?:d\.?\s*l\.?\s*(?:n\.\s*)?331\b|decreto[^;\n]*?\b331\b)",
        mention: r"d\.?\s*l\.?\s*(?:n\.\s*)?331\b|decreto[^\n]+?(?:30\s+agosto\s+1993|n\.\s*331\b)",
    },
];

pub fn article_list_pattern() -> String {
    format!(r"{ARTICLE_NUMBER_PATTERN}(?:(?:\s*,\s*|\s+ed?\s+){ARTICLE_NUMBER_PATTERN})*")
}

#[derive(Debug)]
struct StatuteMatcher {
    label: &'static str,
    citation: Regex,
}

#[derive(Debug)]
pub struct LegacyReferenceExtractor {
    citation_start: Regex,
    article_token: Regex,
    statutes: Vec<StatuteMatcher>,
}

impl LegacyReferenceExtractor {
    pub fn new() -> Result<Self> {
        let article_list = article_list_pattern();
        let statutes = LEGACY_STATUTES
            .iter()
            .map(|statute| {
                // Anchored at an "articolo" occurrence: article list, optional qualifier
                // (", comma 2", ", lettera a)") and the statute signature.
                let pattern = format!(
                    r"(?i)^articol[oi]\s+(?P<articles>{article_list})(?P<qualifier>\s*,[^;]*?)?\s*,?\s+(?:del\s+)?{}",
                    statute.signature
                );
                Regex::new(&pattern)
                    .with_context(|| format!("failed to compile legacy regex for {}", statute.label))
                    .map(|citation| StatuteMatcher {
                        label: statute.label,
                        citation,
                    })
            })
            .collect::<Result<Vec<StatuteMatcher>>>()?;

        Ok(Self {
            citation_start: Regex::new(r"(?i)\barticol[oi]\s")
                .context("failed to compile legacy citation start regex")?,
            article_token: Regex::new(&format!("(?i){ARTICLE_NUMBER_PATTERN}"))
                .context("failed to compile article token regex")?,
            statutes,
        })
    }

    pub fn extract(&self, reference_text: &str) -> Vec<LegacyReference> {
        let mut references = Vec::<LegacyReference>::new();

        for start in self.citation_start.find_iter(reference_text) {
            let candidate = &reference_text[start.start()..];
            for statute in &self.statutes {
                let Some(captures) = statute.citation.captures(candidate) else {
                    continue;
                };
                // A qualifier that mentions another article belongs to a different citation.
                let qualifier_mentions_article = captures
                    .name("qualifier")
                    .map(|qualifier| qualifier.as_str().to_ascii_lowercase().contains("articol"))
                    .unwrap_or(false);
                if qualifier_mentions_article {
                    continue;
                }
                let Some(articles) = captures.name("articles") else {
                    continue;
                };

                for token in self.article_token.find_iter(articles.as_str()) {
                    let Ok(article) = token.as_str().parse::<ArticleNumber>() else {
                        continue;
                    };
                    let reference = LegacyReference {
                        statute: statute.label.to_string(),
                        article,
                    };
                    if !references.contains(&reference) {
                        references.push(reference);
                    }
                }
            }
        }

        references
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<String> {
        LegacyReferenceExtractor::new()
            .expect("extractor")
            .extract(text)
            .iter()
            .map(LegacyReference::key)
            .collect()
    }

    #[test]
    fn paragraph_qualifier_is_skipped() {
        assert_eq!(
            extract(
                "articolo 1, comma 2 decreto del Presidente della Repubblica 26 ottobre 1972, n. 633"
            ),
            vec!["DPR 633/1972 art. 1"]
        );
    }

    #[test]
    fn article_lists_and_suffixes_become_pairs() {
        assert_eq!(
            extract(
                "articoli 2, 3 e 4 - bis del decreto del Presidente della Repubblica 26 ottobre 1972, n. 633; articolo 38 decreto-legge 30 agosto 1993, n. 331"
            ),
            vec![
                "DPR 633/1972 art. 2",
                "DPR 633/1972 art. 3",
                "DPR 633/1972 art. 4-bis",
                "DL 331/1993 art. 38",
            ]
        );
    }

    #[test]
    fn other_statutes_are_ignored() {
        assert!(extract("articolo 5 legge 27 luglio 2000, n. 212").is_empty());
        assert_eq!(
            extract(
                "articolo 5, legge 212, articolo 7 decreto del Presidente della Repubblica 26 ottobre 1972, n. 633"
            ),
            vec!["DPR 633/1972 art. 7"]
        );
    }

    #[test]
    fn repeated_citations_are_deduplicated() {
        let text = "articolo 10 decreto del Presidente della Repubblica 26 ottobre 1972, n. 633; articolo 10, comma 1, decreto del Presidente della Repubblica 26 ottobre 1972, n. 633";
        assert_eq!(extract(text), vec!["DPR 633/1972 art. 10"]);
    }
}
