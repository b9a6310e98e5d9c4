use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tfidf_similarity::{
    rank, CborPersist, Corpus, Dictionary, DocumentSource, Error, FileSource, PipelineConfig, Result,
    SimilarityIndex, SimilarityPipeline, TfidfConfig, TfidfModel, TokenFrequency, Tokenizer,
};

const TUTORIAL: [&str; 9] = [
    "Human machine interface for lab abc computer applications",
    "A survey of user opinion of computer system response time",
    "The EPS user interface management system",
    "System and human system engineering testing of EPS",
    "Relation of user perceived response time to error measurement",
    "The generation of random binary unordered trees",
    "The intersection graph of paths in trees",
    "Graph minors IV Widths of trees and well quasi ordering",
    "Graph minors A survey",
];

/// Sparse TF-IDF document similarity.
#[derive(Parser)]
#[command(name = "tfidf-similarity", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through the nine document tutorial corpus step by step
    Demo,

    /// Rank the documents of a file against a query
    Query(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Text file with one document per line
    #[arg(long, required_unless_present = "pipeline")]
    docs: Option<PathBuf>,

    /// Saved pipeline (CBOR) to query instead of fitting one
    #[arg(long, conflicts_with_all = ["docs", "config"])]
    pipeline: Option<PathBuf>,

    /// Query text
    #[arg(long)]
    query: String,

    /// JSON pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of results to print
    #[arg(long, default_value = "10")]
    top: usize,

    /// Save the fitted pipeline (CBOR) to this path
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> Result<()> {
    // logs go to stderr, results to stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tfidf_similarity=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo => demo(),
        Commands::Query(args) => query(args),
    }
}

fn demo() -> Result<()> {
    let tokenizer = Tokenizer::default();
    let texts = tokenizer.tokenize_corpus(TUTORIAL);
    // keep words that appear more than once
    let frequency = TokenFrequency::from_documents(&texts);
    let texts = frequency.retain_frequent(&texts, 1);
    println!("processed corpus:");
    for doc in &texts {
        println!("  {:?}", doc);
    }

    let dictionary = Dictionary::from_documents(&texts);
    println!("\n{}", dictionary);
    println!("token2id:");
    for (token, id) in dictionary.token2id() {
        println!("  {token}: {id}");
    }

    let new_doc = "Human computer interaction";
    let new_vec = dictionary.doc2bow(&tokenizer.tokenize(new_doc));
    println!("\n{new_doc:?} -> {:?}", new_vec.into_pairs());

    let corpus = Corpus::from_token_documents(&dictionary, &texts);
    println!("\nbag-of-words corpus:");
    for (i, bow) in corpus.iter().enumerate() {
        println!("  {i}: {:?}", bow.raw_iter().collect::<Vec<_>>());
    }

    let model: TfidfModel = TfidfModel::fit(corpus.as_slice(), &dictionary, TfidfConfig::default())?;
    let words = "system minors";
    let weights = model.transform(&dictionary.doc2bow(&tokenizer.tokenize(words)));
    println!("\ntf-idf of {words:?}: {:?}", weights.into_pairs());

    let index = SimilarityIndex::build(model.transform_corpus(corpus.as_slice()), dictionary.len())?;
    let query_document = "system engineering";
    let query_vec = model.transform(&dictionary.doc2bow(&tokenizer.tokenize(query_document)));
    let sims = index.query(&query_vec);
    println!("\nsimilarity to {query_document:?}:");
    for (doc, score) in &sims {
        println!("  {doc}: {score:.6}");
    }

    println!("\nranked:");
    print!("{}", rank(sims));
    Ok(())
}

fn query(args: QueryArgs) -> Result<()> {
    let pipeline: SimilarityPipeline = match (&args.pipeline, &args.docs) {
        (Some(path), _) => SimilarityPipeline::load(path)?,
        (None, Some(docs)) => {
            let config = match &args.config {
                Some(path) => PipelineConfig::from_json_file(path)?,
                None => PipelineConfig::default(),
            };
            let documents = FileSource::new(docs).open()?.collect::<Result<Vec<String>>>()?;
            info!("read {} documents from {}", documents.len(), docs.display());
            SimilarityPipeline::fit(documents, &config)?
        }
        (None, None) => {
            return Err(Error::InvalidConfig("either --docs or --pipeline is required".to_string()));
        }
    };

    if let Some(path) = &args.save {
        pipeline.save(path)?;
        info!("saved pipeline to {}", path.display());
    }

    print!("{}", pipeline.rank_top(&args.query, args.top));
    Ok(())
}
