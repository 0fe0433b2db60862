use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;

use crate::legacy::LEGACY_STATUTES;
use crate::model::NormativeReferences;
use crate::numbering::{ARTICLE_NUMBER_PATTERN, ArticleNumber};

#[derive(Debug)]
struct CitedStatute {
    label: &'static str,
    mention: Regex,
    citation: Regex,
}

#[derive(Debug)]
pub struct NormativeReferenceExtractor {
    statutes: Vec<CitedStatute>,
    consolidated_mention: Regex,
    consolidated_label: String,
    generic: Regex,
}

impl NormativeReferenceExtractor {
    pub fn new(consolidated_label: &str) -> Result<Self> {
        let statutes = LEGACY_STATUTES
            .iter()
            .map(|statute| {
                let mention = Regex::new(&format!("(?i){}", statute.mention))
                    .with_context(|| format!("failed to compile mention regex for {}", statute.label))?;
                let citation = Regex::new(&format!(
                    r"(?i)(?:articol[oi]|art\.)\s*({ARTICLE_NUMBER_PATTERN})(?:\s*,\s*comma\s+\d+)?\s*,?\s*(?:del\s+)?{}",
                    statute.loose_signature
                ))
                .with_context(|| format!("failed to compile citation regex for {}", statute.label))?;
                Ok(CitedStatute {
                    label: statute.label,
                    mention,
                    citation,
                })
            })
            .collect::<Result<Vec<CitedStatute>>>()?;

        Ok(Self {
            statutes,
            consolidated_mention: Regex::new(
                r"(?i)d\.?\s*lgs\.?\s*(?:n\.\s*)?10\b[^\n]*?2026|testo\s+unico\s+iva",
            )
            .context("failed to compile consolidated act regex")?,
            consolidated_label: consolidated_label.to_string(),
            generic: Regex::new(&format!(
                r"(?i)(?:articol[oi]|art\.)\s*({ARTICLE_NUMBER_PATTERN})"
            ))
            .context("failed to compile generic article regex")?,
        })
    }

    pub fn extract(&self, text: &str) -> NormativeReferences {
        let mut specific = BTreeSet::<String>::new();

        for statute in &self.statutes {
            if !statute.mention.is_match(text) {
                continue;
            }
            for captures in statute.citation.captures_iter(text) {
                let Some(Ok(article)) = captures
                    .get(1)
                    .map(|raw| raw.as_str().parse::<ArticleNumber>())
                else {
                    continue;
                };
                specific.insert(format!("{} art. {article}", statute.label));
            }
        }
        if self.consolidated_mention.is_match(text) {
            specific.insert(self.consolidated_label.clone());
        }

        let cited_articles = self
            .generic
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .filter_map(|raw| raw.as_str().parse::<ArticleNumber>().ok())
            .collect::<BTreeSet<ArticleNumber>>();

        NormativeReferences {
            specific: specific.into_iter().collect(),
            cited_articles: cited_articles.into_iter().collect(),
        }
    }
}
