use std::fs;
use std::path::Path;

use serde_json::Value;

use super::*;
use crate::cli::{ChunksArgs, LexiconArgs, RulingsArgs, StatuteArgs, ValidateArgs};
use crate::model::{ExportedChunk, MetadataValue, RulingsCorpus, StatuteCorpus};
use crate::topics::default_lexicon;
use crate::util::read_json;

const STATUTE_TEXT: &str = "\
TESTO UNICO IVA
TITOLO I
DISPOSIZIONI GENERALI
Capo I
PRESUPPOSTO DELL'IMPOSTA
ART. 1
Operazioni imponibili
(articolo 1 decreto del Presidente della Repubblica 26 ottobre 1972, n. 633)
1. L'imposta sul valore aggiunto si applica sulle cessioni di beni effettuate nel territorio dello Stato.
2. Si applica altresì alle importazioni da chiunque effettuate, secondo l'articolo 2.
ART. 2
Esenzioni
(articolo 10 decreto del Presidente della Repubblica 26 ottobre 1972, n. 633)
1. Sono esenti dall'imposta le operazioni indicate nell'articolo 1.
TESTO UNICO IVA
Tabella A *
Parte III
Beni soggetti al 10 per cento
";

const RULING_TEXT: &str = "\
Divisione Contribuenti
OGGETTO: Territorialità delle cessioni di beni
QUESITO
La società chiede se le cessioni rientrino nell'articolo 1 del d.P.R. n. 633.
PARERE DELL'AGENZIA DELLE ENTRATE
Le cessioni sono imponibili ai sensi dell'articolo 1 del d.P.R. n. 633.
";

const SOURCES: &str = r#"[
  {
    "number": 12,
    "year": 2025,
    "date": "10/02/2025",
    "tag": "IVA",
    "subject": "Territorialità delle cessioni",
    "summary": "Le cessioni sono imponibili.",
    "text_path": "testi/12.txt"
  },
  {
    "number": 13,
    "year": 2025,
    "date": "11/02/2025",
    "tag": "IVA",
    "subject": "Esenzioni",
    "summary": "Operazione esente.",
    "text_path": "testi/mancante.txt"
  }
]"#;

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write fixture");
}

fn statute_args(input: &Path, cache_root: &Path) -> StatuteArgs {
    StatuteArgs {
        input: input.to_path_buf(),
        cache_root: cache_root.to_path_buf(),
        output: None,
        profile: None,
        lexicon: None,
        manifest_path: None,
    }
}

fn rulings_args(sources: &Path, cache_root: &Path) -> RulingsArgs {
    RulingsArgs {
        sources: sources.to_path_buf(),
        cache_root: cache_root.to_path_buf(),
        output: None,
        profile: None,
        lexicon: None,
        manifest_path: None,
    }
}

fn chunks_args(cache_root: &Path, manifest_path: &Path) -> ChunksArgs {
    ChunksArgs {
        cache_root: cache_root.to_path_buf(),
        statute_corpus: None,
        rulings_corpus: None,
        output_dir: None,
        budget: crate::chunking::DEFAULT_BUDGET,
        safety_margin: crate::chunking::DEFAULT_SAFETY_MARGIN,
        db_path: None,
        no_ledger: false,
        profile: None,
        manifest_path: Some(manifest_path.to_path_buf()),
    }
}

fn validate_args(cache_root: &Path, report_path: &Path) -> ValidateArgs {
    ValidateArgs {
        cache_root: cache_root.to_path_buf(),
        statute_corpus: None,
        rulings_corpus: None,
        chunk_files: Vec::new(),
        budget: crate::chunking::DEFAULT_BUDGET,
        report_path: Some(report_path.to_path_buf()),
    }
}

#[test]
fn full_pipeline_runs_end_to_end_and_validates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache_root = dir.path().join("cache");

    let input = dir.path().join("tu_iva.txt");
    write(&input, STATUTE_TEXT);
    statute::run(statute_args(&input, &cache_root)).expect("statute");

    let statute: StatuteCorpus = read_json(&statute_corpus_path(&cache_root)).expect("statute");
    assert_eq!(statute.articles.len(), 2);
    assert!(statute.legacy_mapping.contains_key("DPR 633/1972 art. 1"));

    let sources = dir.path().join("interpelli/sources.json");
    write(&sources, SOURCES);
    write(&dir.path().join("interpelli/testi/12.txt"), RULING_TEXT);
    rulings::run(rulings_args(&sources, &cache_root)).expect("rulings");

    let rulings: RulingsCorpus = read_json(&rulings_corpus_path(&cache_root)).expect("rulings");
    assert_eq!(rulings.rulings.len(), 2);
    assert!(rulings.rulings[0].retrieval.has_full_text);
    assert!(!rulings.rulings[1].retrieval.has_full_text);
    assert!(
        rulings
            .warnings
            .iter()
            .any(|warning| warning.contains("ruling 13/2025"))
    );

    let first_manifest = dir.path().join("chunks_first.json");
    chunks::run(chunks_args(&cache_root, &first_manifest)).expect("chunks");

    let statute_chunks: Vec<ExportedChunk> =
        read_json(&namespace_export_path(&chunk_dir(&cache_root), "tu-iva")).expect("tu-iva");
    assert_eq!(
        statute_chunks
            .iter()
            .map(|chunk| chunk.id.as_str())
            .collect::<Vec<_>>(),
        vec!["tu_art_1", "tu_art_2"]
    );

    let ruling_chunks: Vec<ExportedChunk> =
        read_json(&namespace_export_path(&chunk_dir(&cache_root), "interpelli"))
            .expect("interpelli");
    let summary = ruling_chunks
        .iter()
        .find(|chunk| chunk.id == "ip_interpello_2025_12")
        .expect("summary chunk");
    assert_eq!(
        summary.metadata.get("linked_articles"),
        Some(&MetadataValue::List(vec!["1".to_string()]))
    );

    let manifest: Value = read_json(&first_manifest).expect("first manifest");
    let namespaces = manifest["namespaces"].as_array().expect("namespaces");
    assert_eq!(namespaces.len(), 2);
    assert_eq!(namespaces[0]["pending_upload"].as_array().map(Vec::len), Some(2));

    let second_manifest = dir.path().join("chunks_second.json");
    chunks::run(chunks_args(&cache_root, &second_manifest)).expect("chunks again");
    let manifest: Value = read_json(&second_manifest).expect("second manifest");
    for namespace in manifest["namespaces"].as_array().expect("namespaces") {
        assert_eq!(namespace["pending_upload"].as_array().map(Vec::len), Some(0));
        assert_eq!(namespace["unchanged_count"], namespace["chunk_count"]);
    }

    let report_path = dir.path().join("report.json");
    validate::run(validate_args(&cache_root, &report_path)).expect("validate");
    let report: Value = read_json(&report_path).expect("report");
    assert_eq!(report["failed_count"], 0);
}

#[test]
fn validate_fails_on_tampered_corpus_and_still_writes_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache_root = dir.path().join("cache");
    let input = dir.path().join("tu_iva.txt");
    write(&input, STATUTE_TEXT);
    statute::run(statute_args(&input, &cache_root)).expect("statute");

    let path = statute_corpus_path(&cache_root);
    let mut corpus: StatuteCorpus = read_json(&path).expect("corpus");
    let duplicate = corpus.articles[0].clone();
    corpus.articles.push(duplicate);
    crate::util::write_json_pretty(&path, &corpus).expect("rewrite");

    let report_path = dir.path().join("report.json");
    let err = validate::run(validate_args(&cache_root, &report_path)).expect_err("must fail");
    assert!(err.to_string().contains("validation failed"));

    let report: Value = read_json(&report_path).expect("report");
    let failed = report["checks"]
        .as_array()
        .expect("checks")
        .iter()
        .filter(|check| check["passed"] == false)
        .map(|check| check["name"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert!(failed.contains(&"statute.article_numbers_unique".to_string()));
    assert!(failed.contains(&"statute.article_count_matches".to_string()));
}

#[test]
fn chunks_without_any_corpus_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache_root = dir.path().join("cache");
    let manifest = dir.path().join("manifest.json");
    let err = chunks::run(chunks_args(&cache_root, &manifest)).expect_err("no corpus");
    assert!(err.to_string().contains("no corpus to chunk"));
    assert!(!manifest.exists());
}

#[test]
fn explicit_missing_corpus_path_fails_validate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut args = validate_args(dir.path(), &dir.path().join("report.json"));
    args.statute_corpus = Some(dir.path().join("absent.json"));
    let err = validate::run(args).expect_err("missing corpus");
    assert!(err.to_string().contains("corpus not found"));
}

#[test]
fn lexicon_command_writes_a_loadable_default_lexicon() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("lexicon.json");
    lexicon::run(LexiconArgs {
        cache_root: dir.path().to_path_buf(),
        output: Some(output.clone()),
    })
    .expect("lexicon");

    let classifier = load_classifier(Some(&output)).expect("reload");
    assert_eq!(classifier.version(), default_lexicon().version);
}

#[test]
fn attach_texts_keeps_inline_text_and_reports_missing_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir.path().join("a.txt"), "testo A");
    let sources: Vec<crate::model::RulingSource> = serde_json::from_str(
        r#"[
          {"number": 1, "year": 2024, "date": "01/01/2024", "text_path": "a.txt"},
          {"number": 2, "year": 2024, "date": "02/01/2024", "text": "inline", "text_path": "b.txt"},
          {"number": 3, "year": 2024, "date": "03/01/2024", "text_path": "c.txt"}
        ]"#,
    )
    .expect("sources");

    let (sources, warnings) = rulings::attach_texts(sources, dir.path());
    assert_eq!(sources[0].text.as_deref(), Some("testo A"));
    assert_eq!(sources[1].text.as_deref(), Some("inline"));
    assert_eq!(sources[2].text, None);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("ruling 3/2024"));
}

#[test]
fn chunk_checks_flag_duplicates_and_oversized_text() {
    let chunk = |id: &str, text: &str| {
        let mut metadata = std::collections::BTreeMap::new();
        metadata.insert("parent_id".to_string(), MetadataValue::from("tu_art_1"));
        ExportedChunk {
            id: id.to_string(),
            text: text.to_string(),
            metadata,
        }
    };
    let chunks = vec![chunk("a", "breve"), chunk("a", &"x".repeat(20))];
    let checks = validate::chunk_checks("tu-iva", &chunks, 10);

    let failed = checks
        .iter()
        .filter(|check| !check.passed)
        .map(|check| check.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        failed,
        vec!["chunks.tu-iva.ids_unique", "chunks.tu-iva.within_budget"]
    );
}
