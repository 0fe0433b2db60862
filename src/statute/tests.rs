use super::*;
use crate::numbering::ArticleNumber;
use crate::topics::default_lexicon;

const SAMPLE: &str = "\
TESTO UNICO IVA
TITOLO I
DISPOSIZIONI GENERALI
Capo I
PRESUPPOSTO DELL'IMPOSTA
ART. 1
Operazioni imponibili
(articolo 1, comma 2 decreto del Presidente della Repubblica 26 ottobre 1972, n. 633;
articolo 38 decreto-legge 30 agosto 1993, n. 331)
1. L'imposta sul valore aggiunto si applica sulle cessioni di beni e sulle prestazioni di servizi.
2. Si applica l'aliquota del 10 per cento secondo l'articolo 3 e l'art. 2 - bis.
— 2 —
ART. 1 - bis
Definizioni
(articolo 2 decreto del Presidente della Repubblica 26 ottobre 1972, n. 633)
Ai fini del presente decreto si intendono per soggetti passivi coloro che esercitano imprese.
Capo II
ALTRE DISPOSIZIONI
ART. 2
Esenzioni
1. Sono esenti le operazioni indicate nell'articolo 1.
TITOLO II
OBBLIGHI
ART. 3
Fatturazione
(articolo 21 del decreto del Presidente della Repubblica 26 ottobre 1972, n. 633
1. La fattura è emessa al momento dell'operazione.
ART. 2
Duplicato
Testo ripetuto.
TESTO UNICO IVA
Tabella A *
Parte I
Prodotti agricoli
Parte III
Beni soggetti al 10 per cento
";

fn parse(text: &str) -> StatuteCorpus {
    let profile = StatuteProfile::default();
    let classifier = TopicClassifier::new(default_lexicon()).expect("classifier");
    StatuteParser::new(&profile, &classifier)
        .expect("parser")
        .parse(text)
}

fn article<'c>(corpus: &'c StatuteCorpus, number: &str) -> &'c ArticleRecord {
    corpus
        .articles
        .iter()
        .find(|article| article.number.to_string() == number)
        .expect("article present")
}

#[test]
fn articles_are_numbered_once_in_document_order() {
    let corpus = parse(SAMPLE);
    let numbers = corpus
        .articles
        .iter()
        .map(|article| article.number.to_string())
        .collect::<Vec<_>>();
    assert_eq!(numbers, vec!["1", "1-bis", "2", "3"]);
    assert!(
        corpus
            .warnings
            .iter()
            .any(|warning| warning.contains("duplicate article 2"))
    );
    assert_eq!(corpus.metadata.article_count, 4);
    assert_eq!(corpus.metadata.title_count, 2);
    assert_eq!(corpus.metadata.chapter_count, 2);
    assert_eq!(corpus.metadata.artifacts_removed, 1);
}

#[test]
fn parents_are_nearest_preceding_markers() {
    let corpus = parse(SAMPLE);
    let first = article(&corpus, "1");
    assert_eq!(first.structure.title.as_ref().map(|title| title.value), Some(1));
    assert_eq!(
        first.structure.chapter.as_ref().map(|chapter| chapter.name.as_str()),
        Some("PRESUPPOSTO DELL'IMPOSTA")
    );

    let second = article(&corpus, "2");
    assert_eq!(second.structure.chapter.as_ref().map(|chapter| chapter.value), Some(2));

    // Capo II belongs to Titolo I and must not leak into Titolo II.
    let third = article(&corpus, "3");
    assert_eq!(third.structure.title.as_ref().map(|title| title.roman.as_str()), Some("II"));
    assert!(third.structure.chapter.is_none());
}

#[test]
fn article_span_stops_at_chapter_marker() {
    let corpus = parse(SAMPLE);
    let definitions = article(&corpus, "1-bis");
    assert!(!definitions.text.contains("Capo II"));
    assert!(!definitions.text.contains("ALTRE DISPOSIZIONI"));
}

#[test]
fn legacy_block_yields_raw_and_structured_references() {
    let corpus = parse(SAMPLE);
    let first = article(&corpus, "1");
    assert_eq!(first.title, "Operazioni imponibili");
    assert_eq!(first.legacy_references.raw.len(), 2);
    let keys = first
        .legacy_references
        .structured
        .iter()
        .map(|reference| reference.key())
        .collect::<Vec<_>>();
    assert_eq!(keys, vec!["DPR 633/1972 art. 1", "DL 331/1993 art. 38"]);
    assert!(first.text.starts_with("1. L'imposta"));
}

#[test]
fn unterminated_block_is_kept_as_body_with_warning() {
    let corpus = parse(SAMPLE);
    let invoicing = article(&corpus, "3");
    assert!(invoicing.legacy_references.full_text.is_none());
    assert!(invoicing.text.starts_with("(articolo 21"));
    assert!(
        corpus
            .warnings
            .iter()
            .any(|warning| warning.contains("article 3: unterminated"))
    );
}

#[test]
fn paragraphs_keep_order_preview_and_full_text() {
    let corpus = parse(SAMPLE);
    let first = article(&corpus, "1");
    let numbers = first
        .paragraphs
        .iter()
        .map(|paragraph| paragraph.number)
        .collect::<Vec<_>>();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(first.paragraph_count, 2);
    assert!(first.paragraphs[1].text.contains("art. 2 - bis"));
    assert!(article(&corpus, "1-bis").paragraphs.is_empty());
}

#[test]
fn cross_references_are_sorted_unique_article_numbers() {
    let corpus = parse(SAMPLE);
    let first = article(&corpus, "1");
    assert_eq!(
        first.cross_references,
        vec![
            "2-bis".parse::<ArticleNumber>().expect("number"),
            "3".parse::<ArticleNumber>().expect("number"),
        ]
    );
    assert_eq!(
        corpus.cross_reference_graph.get("art_1"),
        Some(&vec!["2-bis".to_string(), "3".to_string()])
    );
    assert!(!corpus.cross_reference_graph.contains_key("art_1-bis"));
}

#[test]
fn indices_and_tables_are_derived() {
    let corpus = parse(SAMPLE);
    let aliquote = corpus.topic_index.get("aliquote").expect("aliquote topic");
    assert!(aliquote.iter().any(|entry| entry.id == "art_1"));

    let mapped = corpus
        .legacy_mapping
        .get("DPR 633/1972 art. 2")
        .expect("legacy key");
    assert_eq!(mapped[0].id, "art_1-bis");

    let tables = corpus
        .rate_tables
        .iter()
        .map(|table| table.key.as_str())
        .collect::<Vec<_>>();
    assert_eq!(tables, vec!["Parte I", "Parte III"]);
    assert_eq!(corpus.metadata.trailer_anchor.as_deref(), Some("tables"));
}

#[test]
fn retrieval_metadata_carries_citations_and_search_text() {
    let corpus = parse(SAMPLE);
    let first = article(&corpus, "1-bis");
    assert_eq!(
        first.retrieval.citation,
        "Art. 1-bis D.Lgs. 10/2026 (Testo Unico IVA)"
    );
    assert_eq!(first.retrieval.citation_short, "Art. 1-bis TU IVA");
    assert!(first.retrieval.search_text.starts_with("Definizioni. Ai fini del presente decreto"));
    assert!(first.retrieval.search_text.contains("soggetto passivo contribuente partita IVA"));
}

#[test]
fn missing_trailer_is_a_warning_not_an_error() {
    let corpus = parse("ART. 1\nTitolo\nTesto unico.\n");
    assert_eq!(corpus.articles.len(), 1);
    assert!(corpus.rate_tables.is_empty());
    assert!(corpus.metadata.trailer_anchor.is_none());
    assert!(
        corpus
            .warnings
            .iter()
            .any(|warning| warning.contains("no table or notes section"))
    );
}

#[test]
fn parsing_is_deterministic() {
    let first = serde_json::to_string(&parse(SAMPLE)).expect("serialize");
    let second = serde_json::to_string(&parse(SAMPLE)).expect("serialize");
    assert_eq!(first, second);
}
