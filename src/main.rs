use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use template_gen::{Evaluator, Grammar, GrammarConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Probabilistic template generator
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the grammar file
    #[arg(help = "Path to the grammar file")]
    grammar_file: PathBuf,

    /// The class to expand
    #[arg(help = "Class to expand", required_unless_present = "list")]
    class: Option<String>,

    /// Number of samples to generate
    #[arg(help = "Number of samples to generate", default_value = "1")]
    count: usize,

    /// Seed for the random source; overrides the grammar's ^seed
    #[arg(long)]
    seed: Option<u64>,

    /// Text placed between tokens when rendering
    #[arg(long, default_value = "")]
    separator: String,

    /// Print each sample as a JSON array of tokens
    #[arg(long)]
    json: bool,

    /// Print each sample as nested JSON, one array per expanded expression
    #[arg(long, conflicts_with = "json")]
    nested: bool,

    /// List the classes of the grammar and exit
    #[arg(long)]
    list: bool,

    /// Maximum nesting of class expansions
    #[arg(long)]
    max_depth: Option<usize>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Sample<'a> {
    class: &'a str,
    tokens: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = GrammarConfig::default();
    if let Some(depth) = cli.max_depth {
        config.max_expansion_depth = depth;
    }

    let grammar = Grammar::from_file_with_config(&cli.grammar_file, config)?;
    debug!(
        classes = grammar.classes().len(),
        options = grammar.options().len(),
        "loaded grammar"
    );

    if cli.list {
        for name in grammar.classes().keys() {
            println!("{}", name);
        }
        return Ok(());
    }

    let class = cli.class.as_deref().ok_or("Class name required")?;
    let mut evaluator = match cli.seed {
        Some(seed) => Evaluator::from_seed(&grammar, seed),
        None => Evaluator::new(&grammar),
    };

    for _ in 0..cli.count {
        if cli.nested {
            let expansion = evaluator.expand_class(class)?;
            println!("{}", serde_json::to_string(&expansion)?);
        } else if cli.json {
            let tokens = evaluator.eval_class(class)?;
            println!("{}", serde_json::to_string(&Sample { class, tokens })?);
        } else {
            let tokens = evaluator.eval_class(class)?;
            println!("{}", tokens.join(&cli.separator));
        }
    }

    Ok(())
}
