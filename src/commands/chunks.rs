use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::chunking::ChunkBuilder;
use crate::chunking::export::{NamespaceExport, ruling_chunks, statute_chunks};
use crate::chunking::ledger::ChunkLedger;
use crate::cli::ChunksArgs;
use crate::commands::{
    chunk_dir, ledger_path, manifest_dir, namespace_export_path, rulings_corpus_path,
    statute_corpus_path,
};
use crate::model::{ChunkRunManifest, NamespaceExportSummary, RulingsCorpus, StatuteCorpus};
use crate::profile::PipelineProfile;
use crate::util::{
    ensure_directory, now_utc_string, read_json, utc_compact_string, write_json_pretty,
};

pub fn run(args: ChunksArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manifest_dir = manifest_dir(&args.cache_root);
    ensure_directory(&manifest_dir)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| chunk_dir(&args.cache_root));
    ensure_directory(&output_dir)?;
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("chunks_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(
        cache_root = %args.cache_root.display(),
        budget = args.budget,
        safety_margin = args.safety_margin,
        run_id = %run_id,
        "starting chunk export"
    );

    let profile = PipelineProfile::load_or_default(args.profile.as_deref())?;
    if profile.statute.namespace == profile.ruling.namespace {
        bail!(
            "statute and ruling namespaces must differ (both are {})",
            profile.statute.namespace
        );
    }
    let builder = ChunkBuilder::new(args.budget, args.safety_margin)?;
    builder.check_labels(&profile.statute.labels)?;
    builder.check_labels(&profile.ruling.labels)?;

    let statute: Option<StatuteCorpus> = load_corpus(
        args.statute_corpus.as_deref(),
        &statute_corpus_path(&args.cache_root),
        "statute",
    )?;
    let rulings: Option<RulingsCorpus> = load_corpus(
        args.rulings_corpus.as_deref(),
        &rulings_corpus_path(&args.cache_root),
        "rulings",
    )?;
    if statute.is_none() && rulings.is_none() {
        bail!(
            "no corpus to chunk under {}; run `statute` or `rulings` first",
            args.cache_root.display()
        );
    }

    let mut exports = Vec::<NamespaceExport>::new();
    if let Some(corpus) = &statute {
        exports.push(statute_chunks(corpus, &profile.statute, &builder));
    }
    if let Some(corpus) = &rulings {
        let legacy_mapping = statute.as_ref().map(|corpus| &corpus.legacy_mapping);
        exports.push(ruling_chunks(
            corpus,
            &profile.ruling,
            &builder,
            legacy_mapping,
        ));
    }

    let ledger_file = if args.no_ledger {
        None
    } else {
        Some(
            args.db_path
                .clone()
                .unwrap_or_else(|| ledger_path(&args.cache_root)),
        )
    };
    let mut ledger = match &ledger_file {
        Some(path) => Some(ChunkLedger::open(path)?),
        None => None,
    };

    let mut warnings = Vec::<String>::new();
    let mut namespaces = Vec::<NamespaceExportSummary>::with_capacity(exports.len());
    for export in &exports {
        let path = namespace_export_path(&output_dir, &export.namespace);
        let sha256 = write_json_pretty(&path, &export.chunks)?;

        let truncated_count = export.truncated_count();
        if truncated_count > 0 {
            warnings.push(format!(
                "namespace {}: {truncated_count} chunks truncated",
                export.namespace
            ));
        }

        let mut summary = NamespaceExportSummary {
            namespace: export.namespace.clone(),
            path: path.display().to_string(),
            sha256,
            chunk_count: export.chunks.len(),
            truncated_count,
            max_text_chars: export.max_text_chars(),
            pending_upload: export.chunks.iter().map(|chunk| chunk.id.clone()).collect(),
            stale: Vec::new(),
            unchanged_count: 0,
        };
        if let Some(ledger) = ledger.as_mut() {
            let diff = ledger.reconcile(&export.namespace, &export.chunks, &run_id)?;
            summary.pending_upload = diff.pending_upload(&export.chunks);
            summary.stale = diff.removed;
            summary.unchanged_count = diff.unchanged.len();
            let ledger_rows = ledger.count(&export.namespace)?;
            debug!(
                namespace = %export.namespace,
                inserted = diff.inserted.len(),
                updated = diff.updated.len(),
                ledger_rows,
                "reconciled chunk ledger"
            );
        }

        info!(
            namespace = %summary.namespace,
            path = %summary.path,
            chunks = summary.chunk_count,
            truncated = summary.truncated_count,
            pending_upload = summary.pending_upload.len(),
            stale = summary.stale.len(),
            "wrote namespace export"
        );
        namespaces.push(summary);
    }

    for warning in &warnings {
        warn!(warning = %warning, "chunk export warning");
    }

    let manifest = ChunkRunManifest {
        manifest_version: 1,
        run_id,
        started_at,
        updated_at: now_utc_string(),
        budget: builder.budget(),
        safety_margin: builder.safety_margin(),
        ledger_path: ledger_file.map(|path| path.display().to_string()),
        namespaces,
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote chunk run manifest");

    info!(
        namespaces = manifest.namespaces.len(),
        chunks = manifest
            .namespaces
            .iter()
            .map(|summary| summary.chunk_count)
            .sum::<usize>(),
        "chunks completed"
    );

    Ok(())
}

fn load_corpus<T: DeserializeOwned>(
    explicit: Option<&Path>,
    default_path: &Path,
    label: &str,
) -> Result<Option<T>> {
    let path: PathBuf = match explicit {
        Some(path) => path.to_path_buf(),
        None if default_path.exists() => default_path.to_path_buf(),
        None => {
            warn!(path = %default_path.display(), corpus = label, "corpus not found; skipping");
            return Ok(None);
        }
    };
    let corpus = read_json(&path)?;
    info!(path = %path.display(), corpus = label, "loaded corpus");
    Ok(Some(corpus))
}
