use std::collections::BTreeMap;

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::cli::StatuteArgs;
use crate::commands::{load_classifier, manifest_dir, statute_corpus_path};
use crate::model::{CorpusRunManifest, StatuteCorpus};
use crate::profile::PipelineProfile;
use crate::statute::StatuteParser;
use crate::util::{
    ensure_directory, now_utc_string, read_text, sha256_hex, utc_compact_string,
    write_json_pretty,
};

pub fn run(args: StatuteArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manifest_dir = manifest_dir(&args.cache_root);
    ensure_directory(&manifest_dir)?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| statute_corpus_path(&args.cache_root));
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("statute_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(
        input = %args.input.display(),
        cache_root = %args.cache_root.display(),
        run_id = %run_id,
        "starting statute parse"
    );

    let profile = PipelineProfile::load_or_default(args.profile.as_deref())?;
    let classifier = load_classifier(args.lexicon.as_deref())?;
    let parser = StatuteParser::new(&profile.statute, &classifier)?;

    let raw = read_text(&args.input)?;
    let corpus = parser.parse(&raw);

    let output_sha256 = write_json_pretty(&output_path, &corpus)?;
    info!(path = %output_path.display(), "wrote statute corpus");

    let manifest = CorpusRunManifest {
        manifest_version: 1,
        run_id,
        command: "statute".to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        input_path: args.input.display().to_string(),
        input_sha256: sha256_hex(raw.as_bytes()),
        output_path: output_path.display().to_string(),
        output_sha256,
        lexicon_version: classifier.version().to_string(),
        counts: statute_counts(&corpus),
        warnings: corpus.warnings.clone(),
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote statute run manifest");

    info!(
        articles = corpus.metadata.article_count,
        topics = corpus.topic_index.len(),
        legacy_keys = corpus.legacy_mapping.len(),
        warnings = corpus.warnings.len(),
        "statute completed"
    );

    Ok(())
}

fn statute_counts(corpus: &StatuteCorpus) -> BTreeMap<String, usize> {
    BTreeMap::from([
        ("articles".to_string(), corpus.metadata.article_count),
        ("titles".to_string(), corpus.metadata.title_count),
        ("chapters".to_string(), corpus.metadata.chapter_count),
        ("topics".to_string(), corpus.topic_index.len()),
        (
            "cross_reference_sources".to_string(),
            corpus.cross_reference_graph.len(),
        ),
        ("legacy_keys".to_string(), corpus.legacy_mapping.len()),
        ("rate_tables".to_string(), corpus.rate_tables.len()),
        ("warnings".to_string(), corpus.warnings.len()),
    ])
}
