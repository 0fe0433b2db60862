pub mod chunks;
pub mod lexicon;
pub mod rulings;
pub mod statute;
pub mod validate;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::topics::{TopicClassifier, TopicLexicon};

const STATUTE_CORPUS_FILE: &str = "tu_iva_corpus.json";
const RULINGS_CORPUS_FILE: &str = "interpelli_corpus.json";
const LEXICON_FILE: &str = "topic_lexicon.json";
const LEDGER_FILE: &str = "chunk_ledger.sqlite";

pub fn data_dir(cache_root: &Path) -> PathBuf {
    cache_root.join("data")
}

pub fn manifest_dir(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests")
}

pub fn chunk_dir(cache_root: &Path) -> PathBuf {
    data_dir(cache_root).join("chunks")
}

pub fn statute_corpus_path(cache_root: &Path) -> PathBuf {
    data_dir(cache_root).join(STATUTE_CORPUS_FILE)
}

pub fn rulings_corpus_path(cache_root: &Path) -> PathBuf {
    data_dir(cache_root).join(RULINGS_CORPUS_FILE)
}

pub fn lexicon_path(cache_root: &Path) -> PathBuf {
    data_dir(cache_root).join(LEXICON_FILE)
}

pub fn ledger_path(cache_root: &Path) -> PathBuf {
    cache_root.join(LEDGER_FILE)
}

pub fn namespace_export_path(dir: &Path, namespace: &str) -> PathBuf {
    dir.join(format!("{namespace}.json"))
}

pub fn load_classifier(path: Option<&Path>) -> Result<TopicClassifier> {
    TopicClassifier::new(TopicLexicon::load_or_default(path)?)
}
