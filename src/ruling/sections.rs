use anyhow::{Context, Result};
use regex::Regex;

use crate::model::RulingSections;
use crate::profile::{SectionAnchor, SectionKey};

// Splits a ruling into its labelled sections. Each anchor counts once (first hit);
// a section runs until the next anchor found, whatever its kind.
#[derive(Debug)]
pub struct SectionExtractor {
    anchors: Vec<(SectionKey, Regex)>,
}

impl SectionExtractor {
    pub fn new(anchors: &[SectionAnchor]) -> Result<Self> {
        let anchors = anchors
            .iter()
            .map(|anchor| {
                Regex::new(&anchor.pattern)
                    .with_context(|| {
                        format!(
                            "invalid section anchor for {}: {}",
                            anchor.key.as_str(),
                            anchor.pattern
                        )
                    })
                    .map(|regex| (anchor.key, regex))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { anchors })
    }

    pub fn extract(&self, text: &str) -> RulingSections {
        let mut found = self
            .anchors
            .iter()
            .filter_map(|(key, regex)| {
                regex
                    .find(text)
                    .map(|found| (found.start(), found.end(), *key))
            })
            .collect::<Vec<(usize, usize, SectionKey)>>();
        found.sort_by_key(|(start, _, _)| *start);

        let mut sections = RulingSections::default();
        for (index, (_, content_start, key)) in found.iter().enumerate() {
            let end = found
                .get(index + 1)
                .map(|(next_start, _, _)| *next_start)
                .unwrap_or(text.len());
            // Overlapping anchors leave nothing to read.
            let content = text
                .get(*content_start..end.max(*content_start))
                .unwrap_or("")
                .trim();
            if content.is_empty() {
                continue;
            }
            let slot = match key {
                SectionKey::Subject => &mut sections.subject,
                SectionKey::Question => &mut sections.question,
                SectionKey::TaxpayerSolution => &mut sections.taxpayer_solution,
                SectionKey::Opinion => &mut sections.opinion,
            };
            *slot = Some(content.to_string());
        }

        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::RulingProfile;

    fn extractor() -> SectionExtractor {
        SectionExtractor::new(&RulingProfile::default().section_anchors).expect("anchors")
    }

    #[test]
    fn sections_follow_anchor_positions() {
        let text = "Risposta n. 12\nOGGETTO: Aliquota IVA\nQUESITO\nLa società chiede.\nSOLUZIONE INTERPRETATIVA PROSPETTATA DALL'ISTANTE\nRitiene di applicare il 10%.\nPARERE DELL'AGENZIA DELLE ENTRATE\nSi concorda.\n";
        let sections = extractor().extract(text);
        assert_eq!(sections.subject.as_deref(), Some("Aliquota IVA"));
        assert_eq!(sections.question.as_deref(), Some("La società chiede."));
        assert_eq!(
            sections.taxpayer_solution.as_deref(),
            Some("Ritiene di applicare il 10%.")
        );
        assert_eq!(sections.opinion.as_deref(), Some("Si concorda."));
    }

    #[test]
    fn anchors_inside_sentences_are_ignored() {
        let text = "QUESITO\nIl quesito riguarda l'oggetto sociale.\nParere dell'Agenzia\nNegativo.";
        let sections = extractor().extract(text);
        assert_eq!(
            sections.question.as_deref(),
            Some("Il quesito riguarda l'oggetto sociale.")
        );
        assert!(sections.subject.is_none());
        assert_eq!(sections.opinion.as_deref(), Some("Negativo."));
    }

    #[test]
    fn text_without_anchors_has_no_sections() {
        assert_eq!(extractor().extract("Testo libero."), RulingSections::default());
    }
}
