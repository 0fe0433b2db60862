use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::chunking::METADATA_TEXT_MAX_BYTES;
use crate::cli::ValidateArgs;
use crate::commands::{chunk_dir, manifest_dir, rulings_corpus_path, statute_corpus_path};
use crate::index::CrossReferenceIndexer;
use crate::model::{
    ExportedChunk, MetadataValue, RulingsCorpus, StatuteCorpus, ValidationCheck,
    ValidationReport,
};
use crate::util::{now_utc_string, read_json, utc_compact_string, write_json_pretty};

pub fn run(args: ValidateArgs) -> Result<()> {
    let started_ts = Utc::now();
    let report_path = args.report_path.clone().unwrap_or_else(|| {
        manifest_dir(&args.cache_root).join(format!(
            "validation_report_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(cache_root = %args.cache_root.display(), budget = args.budget, "starting validate");

    let mut checks = Vec::<ValidationCheck>::new();
    let mut inputs = 0usize;

    let statute_path = existing(
        args.statute_corpus.as_deref(),
        &statute_corpus_path(&args.cache_root),
    )?;
    if let Some(path) = statute_path {
        let corpus: StatuteCorpus = read_json(&path)?;
        checks.extend(statute_checks(&corpus));
        inputs += 1;
    }

    let rulings_path = existing(
        args.rulings_corpus.as_deref(),
        &rulings_corpus_path(&args.cache_root),
    )?;
    if let Some(path) = rulings_path {
        let corpus: RulingsCorpus = read_json(&path)?;
        checks.extend(rulings_checks(&corpus));
        inputs += 1;
    }

    let chunk_files = if args.chunk_files.is_empty() {
        discover_chunk_files(&chunk_dir(&args.cache_root))?
    } else {
        args.chunk_files.clone()
    };
    for path in &chunk_files {
        let chunks: Vec<ExportedChunk> = read_json(path)?;
        let label = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("chunks")
            .to_string();
        checks.extend(chunk_checks(&label, &chunks, args.budget));
        inputs += 1;
    }

    if inputs == 0 {
        bail!(
            "nothing to validate under {}; pass --statute-corpus, --rulings-corpus or --chunks",
            args.cache_root.display()
        );
    }

    let report = ValidationReport {
        manifest_version: 1,
        generated_at: now_utc_string(),
        failed_count: checks.iter().filter(|check| !check.passed).count(),
        checks,
    };
    write_json_pretty(&report_path, &report)?;

    for check in report.checks.iter().filter(|check| !check.passed) {
        warn!(check = %check.name, detail = %check.detail, "validation check failed");
    }
    info!(
        path = %report_path.display(),
        checks = report.checks.len(),
        failed = report.failed_count,
        "wrote validation report"
    );

    if report.failed_count > 0 {
        bail!(
            "validation failed: {} of {} checks failed (see {})",
            report.failed_count,
            report.checks.len(),
            report_path.display()
        );
    }

    Ok(())
}

fn existing(explicit: Option<&Path>, default_path: &Path) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
        Some(path) => bail!("corpus not found: {}", path.display()),
        None if default_path.exists() => Ok(Some(default_path.to_path_buf())),
        None => Ok(None),
    }
}

fn discover_chunk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn check(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> ValidationCheck {
    ValidationCheck {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn first_duplicates<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::<&str>::new();
    let mut duplicates = BTreeSet::<String>::new();
    for value in values {
        if !seen.insert(value) {
            duplicates.insert(value.to_string());
        }
    }
    duplicates.into_iter().collect()
}

fn listed(values: &[String]) -> String {
    const SHOWN: usize = 10;
    let mut detail = values
        .iter()
        .take(SHOWN)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if values.len() > SHOWN {
        detail.push_str(&format!(" (+{} more)", values.len() - SHOWN));
    }
    detail
}

pub fn statute_checks(corpus: &StatuteCorpus) -> Vec<ValidationCheck> {
    let mut checks = Vec::new();

    let numbers = corpus
        .articles
        .iter()
        .map(|article| article.number.to_string())
        .collect::<Vec<_>>();
    let duplicates = first_duplicates(numbers.iter().map(String::as_str));
    checks.push(check(
        "statute.article_numbers_unique",
        duplicates.is_empty(),
        if duplicates.is_empty() {
            format!("{} articles", numbers.len())
        } else {
            format!("duplicated: {}", listed(&duplicates))
        },
    ));

    checks.push(check(
        "statute.article_count_matches",
        corpus.metadata.article_count == corpus.articles.len(),
        format!(
            "metadata={} records={}",
            corpus.metadata.article_count,
            corpus.articles.len()
        ),
    ));

    let unsorted = corpus
        .articles
        .iter()
        .filter(|article| {
            article
                .cross_references
                .windows(2)
                .any(|pair| pair[0] >= pair[1])
        })
        .map(|article| article.id.clone())
        .collect::<Vec<_>>();
    checks.push(check(
        "statute.cross_references_sorted_unique",
        unsorted.is_empty(),
        if unsorted.is_empty() {
            "all articles".to_string()
        } else {
            format!("unsorted or repeated in: {}", listed(&unsorted))
        },
    ));

    let paragraph_mismatch = corpus
        .articles
        .iter()
        .filter(|article| article.paragraph_count != article.paragraphs.len())
        .map(|article| article.id.clone())
        .collect::<Vec<_>>();
    checks.push(check(
        "statute.paragraph_counts_match",
        paragraph_mismatch.is_empty(),
        listed(&paragraph_mismatch),
    ));

    let recomputed = CrossReferenceIndexer::statute(&corpus.articles);
    checks.push(check(
        "statute.topic_index_recomputable",
        recomputed.topic_index == corpus.topic_index,
        format!(
            "recomputed={} stored={} tags",
            recomputed.topic_index.len(),
            corpus.topic_index.len()
        ),
    ));
    checks.push(check(
        "statute.cross_reference_graph_recomputable",
        recomputed.cross_reference_graph == corpus.cross_reference_graph,
        format!(
            "recomputed={} stored={} sources",
            recomputed.cross_reference_graph.len(),
            corpus.cross_reference_graph.len()
        ),
    ));
    checks.push(check(
        "statute.legacy_mapping_recomputable",
        recomputed.legacy_mapping == corpus.legacy_mapping,
        format!(
            "recomputed={} stored={} keys",
            recomputed.legacy_mapping.len(),
            corpus.legacy_mapping.len()
        ),
    ));

    checks
}

pub fn rulings_checks(corpus: &RulingsCorpus) -> Vec<ValidationCheck> {
    let mut checks = Vec::new();

    let duplicates = first_duplicates(corpus.rulings.iter().map(|ruling| ruling.id.as_str()));
    checks.push(check(
        "rulings.ids_unique",
        duplicates.is_empty(),
        if duplicates.is_empty() {
            format!("{} rulings", corpus.rulings.len())
        } else {
            format!("duplicated: {}", listed(&duplicates))
        },
    ));

    checks.push(check(
        "rulings.ruling_count_matches",
        corpus.metadata.ruling_count == corpus.rulings.len(),
        format!(
            "metadata={} records={}",
            corpus.metadata.ruling_count,
            corpus.rulings.len()
        ),
    ));

    let recomputed = CrossReferenceIndexer::ruling_topics(&corpus.rulings);
    checks.push(check(
        "rulings.topic_index_recomputable",
        recomputed == corpus.topic_index,
        format!(
            "recomputed={} stored={} tags",
            recomputed.len(),
            corpus.topic_index.len()
        ),
    ));

    checks
}

pub fn chunk_checks(
    label: &str,
    chunks: &[ExportedChunk],
    budget: usize,
) -> Vec<ValidationCheck> {
    let mut checks = Vec::new();

    let duplicates = first_duplicates(chunks.iter().map(|chunk| chunk.id.as_str()));
    checks.push(check(
        format!("chunks.{label}.ids_unique"),
        duplicates.is_empty(),
        if duplicates.is_empty() {
            format!("{} chunks", chunks.len())
        } else {
            format!("duplicated: {}", listed(&duplicates))
        },
    ));

    let over_budget = chunks
        .iter()
        .filter(|chunk| chunk.text.chars().count() > budget)
        .map(|chunk| chunk.id.clone())
        .collect::<Vec<_>>();
    checks.push(check(
        format!("chunks.{label}.within_budget"),
        over_budget.is_empty(),
        if over_budget.is_empty() {
            format!("all chunks <= {budget} chars")
        } else {
            format!("over budget: {}", listed(&over_budget))
        },
    ));

    let over_ceiling = chunks
        .iter()
        .filter(|chunk| chunk.text.len() > METADATA_TEXT_MAX_BYTES)
        .map(|chunk| chunk.id.clone())
        .collect::<Vec<_>>();
    checks.push(check(
        format!("chunks.{label}.metadata_ceiling"),
        over_ceiling.is_empty(),
        listed(&over_ceiling),
    ));

    let orphaned = chunks
        .iter()
        .filter(|chunk| {
            !matches!(
                chunk.metadata.get("parent_id"),
                Some(MetadataValue::Text(parent)) if !parent.is_empty()
            )
        })
        .map(|chunk| chunk.id.clone())
        .collect::<Vec<_>>();
    checks.push(check(
        format!("chunks.{label}.parent_ids_present"),
        orphaned.is_empty(),
        listed(&orphaned),
    ));

    checks
}
