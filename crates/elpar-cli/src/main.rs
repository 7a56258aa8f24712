mod scanner;

use crate::scanner::Scanner;
use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use elpar::{CompiledParser, GrammarSet, LLParser, LRTable};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    /// Predictive parsing after left-recursion removal and left factoring.
    Ll,
    /// Shift/reduce parsing over the LR(0) automaton.
    Lr,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The parsing algorithm.
    #[arg(short, long, value_enum, default_value_t = Algorithm::Lr)]
    algorithm: Algorithm,

    /// Print the transformed grammars and the parsing tables.
    #[arg(long)]
    dump: bool,

    /// Write the compiled parser to this file.
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Read GRAMMAR as a compiled parser written by `--save`.
    #[arg(long)]
    load: bool,

    /// The path of grammar definition file.
    grammar: PathBuf,

    /// The source file to parse.
    source: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let parser = if args.load {
        let file = File::open(&args.grammar)
            .with_context(|| format!("failed to open {}", args.grammar.display()))?;
        CompiledParser::load(BufReader::new(file)).with_context(|| {
            format!("failed to load compiled parser from {}", args.grammar.display())
        })?
    } else {
        let grammars = GrammarSet::from_file(&args.grammar)
            .with_context(|| format!("failed to read grammar {}", args.grammar.display()))?;
        match args.algorithm {
            Algorithm::Ll => LLParser::new(grammars).into(),
            Algorithm::Lr => LRTable::new(&grammars).into(),
        }
    };

    let num_conflicts = match &parser {
        CompiledParser::LL(parser) => parser.conflicts().len(),
        CompiledParser::LR(table) => table.conflicts().len(),
    };
    if num_conflicts > 0 {
        let suffix = if num_conflicts == 1 { "" } else { "s" };
        println!(
            "[warning] The parsing table has {} conflict{}. The first entry is used.",
            num_conflicts, suffix
        );
    }

    if args.dump {
        match &parser {
            CompiledParser::LL(parser) => println!("{}", parser),
            CompiledParser::LR(table) => println!("{}", table),
        }
    }

    if let Some(path) = &args.save {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        parser
            .save(BufWriter::new(file))
            .with_context(|| format!("failed to save compiled parser to {}", path.display()))?;
    }

    if let Some(path) = &args.source {
        let source =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let tokens = Scanner::new(&source);
        let tree = match &parser {
            CompiledParser::LL(parser) => parser.parse(tokens),
            CompiledParser::LR(table) => table.parse(tokens),
        }
        .with_context(|| format!("failed to parse {}", path.display()))?;
        println!("{}", tree);
    }

    Ok(())
}
