use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use triage::backends::{Backends, DEFAULT_DIMENSIONS};
use triage::chatbot::{Chatbot, DEFAULT_TOP_K};
use triage::store::{FieldMapping, RecordStore};

#[derive(Parser)]
#[command(name = "triage")]
#[command(
  about = "Triage - Issue Corpus Assistant\nSemantic retrieval and analytics over issue-tracker exports"
)]
#[command(version)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

/// Common corpus location arguments
#[derive(Args)]
struct CorpusArgs {
  /// Path to the dataset (JSON array of rows with string-valued columns)
  #[arg(short, long)]
  data: PathBuf,
  /// Optional YAML file mapping canonical field names to dataset columns
  #[arg(short, long)]
  mapping: Option<PathBuf>,
  /// Embedding dimensions for the local hashing embedder
  #[arg(long, default_value_t = DEFAULT_DIMENSIONS)]
  dimensions: usize,
}

#[derive(Subcommand)]
enum Commands {
  /// Ask a single question and print the answer
  Ask {
    #[command(flatten)]
    corpus: CorpusArgs,
    /// Number of similar issues to return
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
    /// The question (space-separated words)
    #[arg(required = true)]
    query: Vec<String>,
  },
  /// Interactive chat loop over the corpus
  Chat {
    #[command(flatten)]
    corpus: CorpusArgs,
    /// Number of similar issues to return per question
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
  },
  /// Print the corpus analytics summary
  Stats {
    #[command(flatten)]
    corpus: CorpusArgs,
  },
}

fn main() -> Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(io::stderr))
    .with(filter)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Ask { corpus, top_k, query } => {
      let bot = build_chatbot(&corpus, top_k)?;
      println!("{}", bot.respond(&query.join(" ")));
    }
    Commands::Chat { corpus, top_k } => {
      let bot = build_chatbot(&corpus, top_k)?;
      chat_loop(&bot)?;
    }
    Commands::Stats { corpus } => {
      let bot = build_chatbot(&corpus, DEFAULT_TOP_K)?;
      println!("{}", bot.analytics_response());
    }
  }

  Ok(())
}

fn build_chatbot(corpus: &CorpusArgs, top_k: usize) -> Result<Chatbot> {
  let mapping = match &corpus.mapping {
    Some(path) => Some(FieldMapping::from_yaml_file(path)?),
    None => None,
  };
  let store = RecordStore::load(&corpus.data, mapping)?;
  let backends = Backends::local(corpus.dimensions);
  Ok(Chatbot::with_top_k(store, backends, top_k)?)
}

fn chat_loop(bot: &Chatbot) -> Result<()> {
  println!(
    "{} Loaded {} issues. Ask a question, or type {} to leave.",
    "✓".green(),
    bot.store().len().to_string().cyan(),
    "quit".yellow()
  );

  let stdin = io::stdin();
  loop {
    print!("{} ", ">".blue().bold());
    io::stdout().flush()?;

    let mut line = String::new();
    if stdin.lock().read_line(&mut line)? == 0 {
      break;
    }
    let query = line.trim();

    if query.is_empty() {
      continue;
    }
    if query == "quit" || query == "exit" {
      break;
    }

    println!("{}\n", bot.respond(query));
  }

  Ok(())
}
