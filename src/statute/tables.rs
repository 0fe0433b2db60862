use anyhow::{Context, Result};
use regex::Regex;

use crate::model::RateTableRef;
use crate::profile::RateTableSpec;

#[derive(Debug)]
pub struct RateTableCatalog {
    entries: Vec<(RateTableSpec, Regex)>,
}

impl RateTableCatalog {
    pub fn new(specs: &[RateTableSpec]) -> Result<Self> {
        let entries = specs
            .iter()
            .map(|spec| {
                Regex::new(&spec.pattern)
                    .with_context(|| {
                        format!("invalid pattern for rate table '{}': {}", spec.key, spec.pattern)
                    })
                    .map(|regex| (spec.clone(), regex))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn detect(&self, trailer: &str) -> Vec<RateTableRef> {
        self.entries
            .iter()
            .filter(|(_, regex)| regex.is_match(trailer))
            .map(|(spec, _)| RateTableRef {
                key: spec.key.clone(),
                description: spec.description.clone(),
                note: spec.note.clone(),
            })
            .collect()
    }
}
