pub mod ircore;
use std::path::Path;
use std::time::Instant;
use clap::{Parser, Subcommand};
use ircore::cfg::Params;
use ircore::engine::Engine;
use ircore::error::{EvalError, Result};
use ircore::index::{IndexReader, MemoryIndex};
use ircore::index::jsonlines;
use ircore::model::RetrievalModel;

#[derive(Parser)]
#[derive(Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// Batch query evaluation over a positional index
struct Cli {
    #[clap(short, long, value_parser)]
    /// Parameter file (YAML)
    param_file: String,
    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
#[derive(Debug)]
enum Commands {
    /// Build the index named in the parameter file from a JSON-lines corpus
    Build {
        #[clap(short, long, value_parser)]
        /// corpus file, one {"id": .., "<field>": ..} object per line
        corpus: String,
    },
    /// Run every query of the query file and write the run file
    Run,
    /// Search one query
    Search {
        #[clap(value_parser)]
        /// query text
        query: String,
    },
    /// Print the feedback expansion of one query
    Expand {
        #[clap(value_parser)]
        /// query text
        query: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = execute(&cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let start = Instant::now();
    let params = Params::load(Path::new(&cli.param_file))?;
    // configuration problems surface before the index is touched
    let model = RetrievalModel::from_params(&params)?;
    let fb = params.feedback()?;

    match &cli.command {
        Some(Commands::Build { corpus }) => command_build_index(&params, corpus)?,
        command => {
            let index = MemoryIndex::load_from(Path::new(params.index_path()?))?;
            let engine = Engine::new(&index, model, params.default_field());
            log::info!("{} over an index of {} documents", engine.model().name(), engine.doc_count());
            match command {
                Some(Commands::Search { query }) => command_search(&engine, query)?,
                Some(Commands::Expand { query }) => {
                    let fb = fb.ok_or_else(|| EvalError::invalid("fb", "feedback is turned off"))?;
                    let initial = engine.process_query(query)?;
                    println!("{}", engine.expand_query(&initial, &fb)?);
                },
                _ => engine.process_query_file(&params)?,
            }
        },
    }
    log::info!("time: {} ms", start.elapsed().as_millis());
    Ok(())
}

fn command_build_index(params: &Params, corpus: &str) -> Result<()> {
    let index = jsonlines::build_index(Path::new(corpus))?;
    index.save_to(Path::new(params.index_path()?))?;
    println!("{} documents indexed", index.get_document_count());
    Ok(())
}

fn command_search(engine: &Engine, query: &str) -> Result<()> {
    let result = engine.process_query(query)?;
    let result_len = result.len();
    if result_len == 0 {
        println!("no results");
        return Ok(());
    }
    println!("{} results", result_len);
    if result_len > 10 {
        println!("top 10:");
    }
    for (rank, doc) in result.top(10).iter().enumerate() {
        println!("{}:{} {:.6}", rank + 1, engine.external_id(doc.docid)?, doc.score);
    }
    Ok(())
}
