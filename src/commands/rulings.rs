use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::RulingsArgs;
use crate::commands::{load_classifier, manifest_dir, rulings_corpus_path};
use crate::model::{CorpusRunManifest, RulingSource, RulingsCorpus};
use crate::profile::PipelineProfile;
use crate::ruling::RulingParser;
use crate::util::{
    ensure_directory, now_utc_string, sha256_hex, utc_compact_string, write_json_pretty,
};

pub fn run(args: RulingsArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manifest_dir = manifest_dir(&args.cache_root);
    ensure_directory(&manifest_dir)?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| rulings_corpus_path(&args.cache_root));
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("rulings_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(
        sources = %args.sources.display(),
        cache_root = %args.cache_root.display(),
        run_id = %run_id,
        "starting rulings parse"
    );

    let profile = PipelineProfile::load_or_default(args.profile.as_deref())?;
    let classifier = load_classifier(args.lexicon.as_deref())?;
    let parser = RulingParser::new(
        &profile.ruling,
        &classifier,
        &profile.statute.chunk_citation,
    )?;

    let raw_sources = fs::read(&args.sources)
        .with_context(|| format!("failed to read {}", args.sources.display()))?;
    let input_sha256 = sha256_hex(&raw_sources);
    let sources: Vec<RulingSource> = serde_json::from_slice(&raw_sources)
        .with_context(|| format!("failed to parse {}", args.sources.display()))?;
    let base_dir = args.sources.parent().unwrap_or_else(|| Path::new(""));
    let (sources, warnings) = attach_texts(sources, base_dir);

    let corpus = parser.parse(sources, warnings);

    let output_sha256 = write_json_pretty(&output_path, &corpus)?;
    info!(path = %output_path.display(), "wrote rulings corpus");

    let manifest = CorpusRunManifest {
        manifest_version: 1,
        run_id,
        command: "rulings".to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        input_path: args.sources.display().to_string(),
        input_sha256,
        output_path: output_path.display().to_string(),
        output_sha256,
        lexicon_version: classifier.version().to_string(),
        counts: rulings_counts(&corpus),
        warnings: corpus.warnings.clone(),
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote rulings run manifest");

    info!(
        rulings = corpus.metadata.ruling_count,
        with_full_text = corpus.metadata.with_full_text,
        warnings = corpus.warnings.len(),
        "rulings completed"
    );

    Ok(())
}

pub fn attach_texts(
    mut sources: Vec<RulingSource>,
    base_dir: &Path,
) -> (Vec<RulingSource>, Vec<String>) {
    let mut warnings = Vec::<String>::new();

    for source in &mut sources {
        if source.text.is_some() {
            continue;
        }
        let Some(relative) = source.text_path.as_deref() else {
            continue;
        };
        let path = base_dir.join(relative);
        match fs::read_to_string(&path) {
            Ok(text) => source.text = Some(text),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ruling text unavailable");
                warnings.push(format!(
                    "ruling {}/{}: text file {} unavailable; metadata only",
                    source.number,
                    source.year,
                    path.display()
                ));
            }
        }
    }

    (sources, warnings)
}

fn rulings_counts(corpus: &RulingsCorpus) -> BTreeMap<String, usize> {
    BTreeMap::from([
        ("rulings".to_string(), corpus.metadata.ruling_count),
        ("with_full_text".to_string(), corpus.metadata.with_full_text),
        ("topics".to_string(), corpus.topic_index.len()),
        ("warnings".to_string(), corpus.warnings.len()),
    ])
}
