use anyhow::Result;
use tracing::info;

use crate::cli::LexiconArgs;
use crate::commands::lexicon_path;
use crate::topics::{TopicClassifier, default_lexicon};
use crate::util::write_json_pretty;

pub fn run(args: LexiconArgs) -> Result<()> {
    let lexicon = default_lexicon();
    // The written file must load back through the classifier.
    TopicClassifier::new(lexicon.clone())?;

    let output_path = args
        .output
        .unwrap_or_else(|| lexicon_path(&args.cache_root));
    let sha256 = write_json_pretty(&output_path, &lexicon)?;

    info!(
        path = %output_path.display(),
        version = %lexicon.version,
        topics = lexicon.topics.len(),
        sha256 = %sha256,
        "wrote topic lexicon"
    );

    Ok(())
}
