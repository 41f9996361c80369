mod io;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use markov_core::builder::build_parallel;
use markov_core::codec::encode_model;
use markov_core::{Node, State, TextState, UintModel};

/// Builds a word-level Markov chain from a corpus and generates sentences.
#[derive(Parser)]
#[command(name = "markov-exemple", version)]
struct Cli {
    /// Text corpus, one sentence per line.
    #[arg(default_value = "./data/proverbs.txt")]
    corpus: PathBuf,

    /// Number of sentences to generate.
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,

    /// Maximum number of words per generated sentence.
    #[arg(long, default_value_t = 20)]
    max_len: usize,

    /// Seed for reproducible generation.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("markov_exemple={level},markov_core={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Every line is an independent sequence starting from the sentinel
    let lines = io::read_file(&cli.corpus)?;
    let sequences: Vec<Vec<TextState>> = io::word_sequences(&lines)
        .into_iter()
        .map(|words| words.into_iter().map(TextState::from).collect())
        .collect();
    tracing::info!(sequences = sequences.len(), corpus = %cli.corpus.display(), "loaded corpus");

    // Partial models are built on worker threads, then merged
    let mut model = build_parallel(sequences)?;
    println!("{} source states, {} bytes", model.len(), model.size());

    // The size is exactly what an encoder writes
    let encoded = encode_model(&model);
    anyhow::ensure!(encoded.len() as u64 == model.size(), "encoded {} bytes for a model of {}", encoded.len(), model.size());

    // The probability of each first word sums to 1.0
    if let Some(row) = model.row(&Node::Start) {
        for (word, count) in row.iter() {
            println!("P(start -> {}) = {:.3} ({count})", word.value(), row.state_weight(word));
        }
    }

    // A fixed sampling value always yields the same word
    model.set_current_state(Node::Start)?;
    println!("Walk from start with p = 0.5: {}", model.walk(0.5)?.value());

    // Sampling values outside [0, 1] are rejected
    match model.walk(1.5) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("p = 1.5 is invalid: {e}"),
    }

    // Only states that were left at least once can be used as a start
    match model.set_current_state(TextState::from("unknown")) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("{e}"),
    }

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    println!("Generating with seed {seed}");
    for i in 0..cli.count {
        let sentence = model.generate(cli.max_len, &mut rng)?;
        let words: Vec<&str> = sentence.iter().map(TextState::as_str).collect();
        println!("Generated sentence {}: {}", i + 1, words.join(" "));
    }

    // Raw integers: word lengths as a chain of u32
    let mut lengths = UintModel::new();
    for length in io::word_lengths(&lines)? {
        lengths.add_data(length)?;
    }
    println!("Word length chain: {} bytes", lengths.size());

    // Anything else than a fixed-width unsigned integer is refused
    match lengths.add_data("Hello") {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("{e}"),
    }

    Ok(())
}
