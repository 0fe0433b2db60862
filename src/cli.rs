use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::chunking::{DEFAULT_BUDGET, DEFAULT_SAFETY_MARGIN};

pub const DEFAULT_CACHE_ROOT: &str = ".cache/iva-corpus";

#[derive(Parser, Debug)]
#[command(
    name = "iva-corpus",
    version,
    about = "Structured corpus and retrieval chunks for the Italian VAT consolidated act and rulings"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Statute(StatuteArgs),
    Rulings(RulingsArgs),
    Chunks(ChunksArgs),
    Lexicon(LexiconArgs),
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StatuteArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value = DEFAULT_CACHE_ROOT)]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub profile: Option<PathBuf>,

    #[arg(long)]
    pub lexicon: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RulingsArgs {
    #[arg(long)]
    pub sources: PathBuf,

    #[arg(long, default_value = DEFAULT_CACHE_ROOT)]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub profile: Option<PathBuf>,

    #[arg(long)]
    pub lexicon: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ChunksArgs {
    #[arg(long, default_value = DEFAULT_CACHE_ROOT)]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub statute_corpus: Option<PathBuf>,

    #[arg(long)]
    pub rulings_corpus: Option<PathBuf>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_BUDGET)]
    pub budget: usize,

    #[arg(long, default_value_t = DEFAULT_SAFETY_MARGIN)]
    pub safety_margin: usize,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub no_ledger: bool,

    #[arg(long)]
    pub profile: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct LexiconArgs {
    #[arg(long, default_value = DEFAULT_CACHE_ROOT)]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = DEFAULT_CACHE_ROOT)]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub statute_corpus: Option<PathBuf>,

    #[arg(long)]
    pub rulings_corpus: Option<PathBuf>,

    #[arg(long = "chunks")]
    pub chunk_files: Vec<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_BUDGET)]
    pub budget: usize,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}
