use std::{path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;
use serde_json::{json, Value};
use tf_idf_personalizer::{
    Error, PersonalizeConfig, Personalizer, ProfileStore, ResponseFileBackend, SearchBackend, SearchResult,
    TweetAnalyzer,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Re-rank saved search results for each user", long_about = None)]
struct Args {
    /// Saved Elasticsearch-style search response (JSON)
    #[arg(short, long)]
    response: PathBuf,

    /// Source tweet collection used to build user profiles (repeatable)
    #[arg(short, long = "source")]
    sources: Vec<PathBuf>,

    /// User to personalize for (repeatable, all users when omitted)
    #[arg(short, long = "user")]
    users: Vec<String>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the profile cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Index name handed to the backend
    #[arg(long, default_value = "twitter")]
    index: String,

    /// Query tree handed to the backend, as JSON
    #[arg(long)]
    query: Option<String>,

    /// Maximum number of hits taken from the response
    #[arg(long, default_value_t = 100)]
    max_results: usize,
}

fn run(args: Args) -> Result<(), Error> {
    let mut config = match &args.config {
        Some(path) => PersonalizeConfig::from_json_file(path)?,
        None => PersonalizeConfig::default(),
    };
    if let Some(dir) = args.cache_dir {
        config = config.with_cache_dir(dir);
    }

    let query: Value = match &args.query {
        Some(raw) => serde_json::from_str(raw).map_err(|e| Error::Config(format!("invalid --query: {e}")))?,
        None => json!({ "match_all": {} }),
    };
    let backend = ResponseFileBackend::new(&args.response);
    let hits = backend.search(&args.index, &query, args.max_results)?;
    let results: Vec<SearchResult> = hits.iter().map(SearchResult::from_hit).collect();
    info!(hits = results.len(), "search results loaded");

    let store = ProfileStore::new(config.clone(), args.sources, Arc::new(TweetAnalyzer::new()));
    let personalizer = Personalizer::new(config)?;
    let ranked = personalizer.personalize(&results, &args.users, &store)?;

    for (user, list) in &ranked {
        println!("\nPersonalized results for {user}:");
        for (rank, item) in list.iter().enumerate() {
            let r = item.result;
            println!(
                "{:>2}. [{}] {} ({}) score={:.6}",
                rank + 1,
                r.candidate_id,
                r.field("user_name"),
                r.field("date"),
                item.blended_score
            );
            println!("    {}", r.text.replace('\n', " "));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
