use super::{TopicEntry, TopicLexicon};

pub const DEFAULT_LEXICON_VERSION: &str = "iva-topics-2026.1";

// (tag, label, patterns)
const DEFAULT_TOPICS: &[(&str, &str, &[&str])] = &[
    (
        "aliquote",
        "aliquote IVA percentuali",
        &[r"aliquot[ae]", r"\d+\s*per\s*cento", r"\d+\s*%", r"tabella\s+a", r"tabella\s+b"],
    ),
    (
        "esenzioni",
        "esenzioni IVA operazioni esenti",
        &[r"esent[ei]", r"esenzione", r"esclus[aeiou]", r"non\s+imponibil"],
    ),
    (
        "detrazione",
        "detrazione IVA imposta detraibile",
        &[r"detrazion[ei]", r"detraibil[ei]", r"pro[\s-]*rata", r"rettifica della detrazione"],
    ),
    (
        "base_imponibile",
        "base imponibile corrispettivo valore",
        &[r"base\s+imponibile", r"corrispettivo", r"valore\s+normal"],
    ),
    (
        "fatturazione",
        "fattura fatturazione elettronica documento fiscale",
        &[r"fattur[ae]", r"fatturazione", r"documento\s+fiscal", r"scontrino", r"nota\s+di\s+variazione"],
    ),
    (
        "registrazione",
        "registri IVA registrazione contabile",
        &[r"registr[oi]", r"registrazione", r"libro\s+giornale"],
    ),
    (
        "dichiarazione",
        "dichiarazione IVA annuale comunicazione",
        &[r"dichiarazion[ei]", r"dichiarazione\s+annuale", r"comunicazione"],
    ),
    (
        "liquidazione",
        "liquidazione IVA versamento periodico",
        &[r"liquidazion[ei]", r"versament[oi]", r"accont[oi]"],
    ),
    (
        "rimborsi",
        "rimborso IVA credito eccedenza",
        &[r"rimbors[oi]", r"credito\s+iva", r"eccedenz[ae]"],
    ),
    (
        "operazioni_intra",
        "operazioni intraunionali intracomunitarie",
        &[r"intra(?:unional|comunitari)[aeiou]", r"acquist[oi]\s+intra", r"cession[ei]\s+intra"],
    ),
    (
        "importazioni",
        "importazioni dogana paesi terzi",
        &[r"importazion[ei]", r"dogan[ae]", r"territori\s+terzi"],
    ),
    (
        "esportazioni",
        "esportazioni plafond operazioni con estero",
        &[r"esportazion[ei]", r"operazion[ei]\s+con\s+l.estero", r"plafond"],
    ),
    (
        "regime_speciale",
        "regime speciale forfettario margine agricolo",
        &[
            r"regime\s+special[ei]",
            r"regime\s+forfet",
            r"regime\s+del\s+margine",
            r"\bmargine\b",
            r"regime\s+agricol",
        ],
    ),
    (
        "cessioni_beni",
        "cessione di beni trasferimento proprietà",
        &[
            r"cession[ei]\s+di\s+beni",
            r"cessione\s+immobil",
            r"trasferimento\s+di\s+propriet",
        ],
    ),
    (
        "prestazioni_servizi",
        "prestazione di servizi",
        &[r"prestazion[ei]\s+di\s+servizi", r"obbligazion[ei]\s+di\s+fare"],
    ),
    (
        "soggetti_passivi",
        "soggetto passivo contribuente partita IVA",
        &[r"soggett[oi]\s+passiv", r"contribuent[ei]", r"identificazione\s+diretta"],
    ),
    (
        "territorialita",
        "territorialità luogo operazione",
        &[r"territorialit", r"luogo\s+di\s+imposizione", r"stato\s+membro", r"stabile\s+organizzazione"],
    ),
    (
        "gruppo_iva",
        "gruppo IVA consolidato",
        &[r"gruppo\s+iva", r"consolidat"],
    ),
    (
        "reverse_charge",
        "reverse charge inversione contabile",
        &[r"reverse\s+charge", r"inversione\s+contabile", r"debitore\s+d.imposta"],
    ),
    (
        "split_payment",
        "split payment scissione pagamenti PA",
        &[r"split\s+payment", r"scissione\s+dei\s+pagamenti"],
    ),
    (
        "sanzioni",
        "sanzioni violazioni",
        &[r"sanzion[ei]", r"violazion[ei]", r"irrogazione"],
    ),
    (
        "accertamento",
        "accertamento rettifica verifica fiscale",
        &[r"accertament[oi]", r"rettifica", r"verifica"],
    ),
    (
        "obblighi_contabili",
        "obblighi contabili registri conservazione",
        &[r"obblig[hoi]\s+contabil", r"tenuta\s+dei\s+registri", r"conservazione"],
    ),
    (
        "iva_edilizia",
        "IVA edilizia costruzioni ristrutturazioni immobili",
        &[
            r"ediliz",
            r"costruzion[ei]",
            r"ristrutturazion[ei]",
            r"immobil[ei]",
            r"superbonus",
            r"bonus\s+faccat",
        ],
    ),
    (
        "iva_agevolata",
        "IVA agevolata ridotta beni prima necessità",
        &[r"agevolat[ao]", r"ridott[ao]", r"super[\s-]*ridott"],
    ),
    (
        "franchigia",
        "franchigia piccole imprese regime minori",
        &[r"franchigi[ae]", r"piccol[aei]\s+impres[ae]", r"soglia"],
    ),
    (
        "commercio_elettronico",
        "e-commerce commercio elettronico piattaforme",
        &[r"commercio\s+elettronico", r"e[\s-]*commerce", r"interfaccia\s+elettronica", r"piattaforma"],
    ),
    (
        "esigibilita",
        "esigibilità fatto generatore momento impositivo",
        &[r"esigibilit", r"fatto\s+generatore", r"momento\s+impositivo"],
    ),
    (
        "rivalsa",
        "rivalsa addebito imposta",
        &[r"rivalsa", r"addebitare", r"addebito\s+dell.imposta"],
    ),
    (
        "volume_affari",
        "volume affari attività separate",
        &[r"volume\s+d.affari", r"attivit.\s+separate"],
    ),
    (
        "compensazioni",
        "compensazione crediti IVA",
        &[r"compensazion"],
    ),
    (
        "cessione_credito",
        "cessione del credito sconto in fattura",
        &[r"cessione\s+del?\s+credito", r"sconto\s+in\s+fattura"],
    ),
];

pub fn default_lexicon() -> TopicLexicon {
    TopicLexicon {
        version: DEFAULT_LEXICON_VERSION.to_string(),
        topics: DEFAULT_TOPICS
            .iter()
            .map(|(tag, label, patterns)| TopicEntry {
                tag: (*tag).to_string(),
                label: (*label).to_string(),
                patterns: patterns.iter().map(|pattern| (*pattern).to_string()).collect(),
            })
            .collect(),
    }
}
