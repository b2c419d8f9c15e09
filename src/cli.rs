use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::{
    config::DEFAULT_TOP_K,
    embedding_service::DEFAULT_TIMEOUT_SECS,
    normalize::DEFAULT_FUZZY_THRESHOLD,
};

#[derive(Debug, Parser)]
#[command(
    name = "talentrank",
    about = "Rank candidate profiles against a query by keyword overlap and embedding similarity"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load candidate or query records from a JSON file
    Import {
        #[command(subcommand)]
        kind: ImportKind,
    },
    /// Rank stored candidates against a query
    Rank(RankArgs),
    /// Show a stored candidate record
    Get(GetArgs),
    /// List stored candidates or queries
    List(ListArgs),
    /// Show store statistics
    Status(StatusArgs),
    /// Manage the stored weighting policy
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Import --

#[derive(Debug, Subcommand)]
pub enum ImportKind {
    /// Import candidate profiles (JSON array or JSON lines, `-` for stdin)
    Candidates {
        /// Path to the file
        path: PathBuf,
    },
    /// Import query records (JSON array or JSON lines, `-` for stdin)
    Queries {
        /// Path to the file
        path: PathBuf,
    },
}

// -- Rank --

#[derive(Debug, Parser)]
pub struct RankArgs {
    /// Id of the query to rank against
    pub query_id: String,

    /// Encode this text through the embedding service and store it as the query
    #[arg(long)]
    pub text: Option<String>,

    /// Number of results to return
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Weight of the keyword score (0-1)
    #[arg(long)]
    pub keyword_weight: Option<f64>,

    /// Weight of the vector score (0-1)
    #[arg(long)]
    pub vector_weight: Option<f64>,

    /// Fuzzy keyword similarity threshold (0-100)
    #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
    pub threshold: f64,

    /// Number of shards (defaults to available parallelism)
    #[arg(long)]
    pub shards: Option<usize>,

    /// Worker threads (defaults to available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Only consider the first N stored candidates
    #[arg(long)]
    pub limit: Option<usize>,

    /// Scale scores so the best result reads 100
    #[arg(long)]
    pub relative: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Embedding service URL (used with --text)
    #[arg(long)]
    pub embedding_url: Option<String>,

    /// Embedding service request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Reject encodings whose embedding is not this long (used with --text)
    #[arg(long)]
    pub dimension: Option<usize>,
}

// -- Get --

#[derive(Debug, Parser)]
pub struct GetArgs {
    /// Candidate id
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- List --

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    Candidates,
    Queries,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Which records to list
    #[arg(value_enum)]
    pub kind: RecordKind,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Config --

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the stored weighting policy
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store the weighting policy used when rank gets no weight flags
    SetWeights {
        /// Keyword weight (0-1)
        keyword: f64,
        /// Vector weight (0-1)
        vector: f64,
    },
    /// Remove the stored weighting policy
    Clear,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "talentrank",
            &mut std::io::stdout(),
        );
    }
}
