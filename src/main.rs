use std::{io::Read, path::Path, time::Duration};

use clap::Parser;
use serde::de::DeserializeOwned;
use talentrank::{
    Candidate, DataDir, Error, HttpEmbeddingService, ProfileDb, Query, Ranker,
    RankingParams, Result, ShardScheduler, WeightPolicy,
    cli::{
        Cli, Command, ConfigAction, GetArgs, ImportKind, ListArgs, RankArgs,
        RecordKind,
    },
    ranking,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("TALENTRANK_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let db = ProfileDb::open(&data_dir.profiles_db())?;

    match cli.command {
        Command::Import { kind } => match kind {
            ImportKind::Candidates { path } => import_candidates(&db, &path)?,
            ImportKind::Queries { path } => import_queries(&db, &path)?,
        },
        Command::Rank(args) => cmd_rank(db, &args)?,
        Command::Get(args) => cmd_get(&db, &args)?,
        Command::List(args) => cmd_list(&db, &args)?,
        Command::Status(args) => cmd_status(&db, &data_dir, args.json)?,
        Command::Config { action } => match action {
            ConfigAction::Show { json } => config_show(&db, json)?,
            ConfigAction::SetWeights { keyword, vector } => {
                let weights = WeightPolicy::new(keyword, vector)?;
                db.set_weights(&weights)?;
                println!(
                    "Stored weights: keyword {keyword}, vector {vector}"
                );
            }
            ConfigAction::Clear => {
                if db.clear_weights()? {
                    println!("Cleared stored weights");
                } else {
                    println!("No weights were stored.");
                }
            }
        },
        Command::Completions(_) => {}
    }

    Ok(())
}

/// Read records from a file (or stdin for `-`).
///
/// Accepts either a single JSON array or a stream of JSON values, one per
/// line.
fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut content = String::new();
    if path.as_os_str() == "-" {
        std::io::stdin().read_to_string(&mut content)?;
    } else {
        content = std::fs::read_to_string(path)?;
    }

    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(&content)?);
    }

    let records = serde_json::Deserializer::from_str(&content)
        .into_iter::<T>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

fn import_candidates(db: &ProfileDb, path: &Path) -> Result<()> {
    let candidates: Vec<Candidate> = read_records(path)?;
    let stored = db.put_candidates(&candidates)?;
    info!(path = %path.display(), stored, "imported candidates");
    println!("Imported {stored} candidate(s)");
    Ok(())
}

fn import_queries(db: &ProfileDb, path: &Path) -> Result<()> {
    let queries: Vec<Query> = read_records(path)?;
    for query in &queries {
        query.validate()?;
    }
    let stored = db.put_queries(&queries)?;
    info!(path = %path.display(), stored, "imported queries");
    println!("Imported {stored} quer{}", if stored == 1 { "y" } else { "ies" });
    Ok(())
}

/// Pick the weighting policy for a ranking run.
///
/// Flags win over stored settings. A single flag implies its complement.
fn resolve_weights(db: &ProfileDb, args: &RankArgs) -> Result<WeightPolicy> {
    match (args.keyword_weight, args.vector_weight) {
        (Some(keyword), Some(vector)) => WeightPolicy::new(keyword, vector),
        (Some(keyword), None) => WeightPolicy::new(keyword, 1.0 - keyword),
        (None, Some(vector)) => WeightPolicy::new(1.0 - vector, vector),
        (None, None) => db.get_weights()?.ok_or_else(|| {
            Error::InvalidConfiguration(
                "no weights configured; pass --keyword-weight/--vector-weight or run `talentrank config set-weights`".into(),
            )
        }),
    }
}

fn cmd_rank(db: ProfileDb, args: &RankArgs) -> Result<()> {
    let weights = resolve_weights(&db, args)?;

    let mut params = RankingParams::new(weights)
        .with_top_k(args.top_k)
        .with_fuzzy_threshold(args.threshold);
    if let Some(shards) = args.shards {
        params = params.with_shards(shards);
    }
    params.relative_grading = args.relative;
    params.pool_limit = args.limit;
    params.validate()?;

    let scheduler = match args.workers {
        Some(workers) => ShardScheduler::new(workers)?,
        None => ShardScheduler::with_available_parallelism()?,
    };
    let ranker = Ranker::new(db, scheduler);

    let outcome = if let Some(text) = &args.text {
        let mut service = HttpEmbeddingService::resolve(
            args.embedding_url.as_deref(),
            Duration::from_secs(args.timeout_secs),
        )?;
        if let Some(dimension) = args.dimension {
            service = service.with_expected_dimension(dimension);
        }
        info!(endpoint = service.endpoint(), "encoding query text");
        let (query, outcome) =
            ranker.rank_text(&service, &args.query_id, text, &params)?;
        ranker.source().put_query(&query)?;
        info!(query = %query.id, "stored encoded query");
        outcome
    } else {
        ranker.rank_query(&args.query_id, &params)?
    };

    if args.json {
        ranking::format_json(&outcome, &args.query_id)?;
    } else {
        ranking::format_human(&outcome);
    }
    Ok(())
}

fn cmd_get(db: &ProfileDb, args: &GetArgs) -> Result<()> {
    let candidate =
        db.get_candidate(&args.id)?.ok_or_else(|| Error::NotFound {
            kind: "candidate",
            name: args.id.clone(),
        })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&candidate)?);
        return Ok(());
    }

    println!("id: {}", candidate.id);
    println!("name: {}", candidate.display_name);
    if let Some(email) = &candidate.email {
        println!("email: {email}");
    }
    if let Some(contact) = &candidate.contact_no {
        println!("contact: {contact}");
    }
    match &candidate.keywords {
        Some(keywords) => println!("keywords: {}", keywords.join(", ")),
        None => println!("keywords: (none)"),
    }
    match &candidate.embedding {
        Some(embedding) => println!("embedding: {} dimensions", embedding.len()),
        None => println!("embedding: (none)"),
    }
    for (key, value) in &candidate.extra {
        println!("{key}: {value}");
    }
    Ok(())
}

fn cmd_list(db: &ProfileDb, args: &ListArgs) -> Result<()> {
    match args.kind {
        RecordKind::Candidates => {
            let candidates = db.list_candidates(None)?;
            if args.json {
                let rows: Vec<_> = candidates
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "id": c.id,
                            "display_name": c.display_name,
                            "keywords": c.keywords.as_ref().map_or(0, Vec::len),
                            "dimension": c.embedding.as_ref().map(Vec::len),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&rows)?);
            } else if candidates.is_empty() {
                println!("No candidates stored.");
            } else {
                for c in &candidates {
                    let keywords = c.keywords.as_ref().map_or(0, Vec::len);
                    println!("{}\t{}\t{keywords} keyword(s)", c.id, c.display_name);
                }
            }
        }
        RecordKind::Queries => {
            let queries = db.list_queries()?;
            if args.json {
                let rows: Vec<_> = queries
                    .iter()
                    .map(|q| {
                        serde_json::json!({
                            "id": q.id,
                            "keywords": q.keywords,
                            "dimension": q.dimension(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&rows)?);
            } else if queries.is_empty() {
                println!("No queries stored.");
            } else {
                for q in &queries {
                    println!(
                        "{}\t{} keyword(s)\t{} dimensions",
                        q.id,
                        q.keywords.len(),
                        q.dimension()
                    );
                }
            }
        }
    }
    Ok(())
}

fn cmd_status(db: &ProfileDb, data_dir: &DataDir, json: bool) -> Result<()> {
    let candidates = db.candidate_count()?;
    let queries = db.query_count()?;
    let weights = db.get_weights()?;

    if json {
        let value = serde_json::json!({
            "data_dir": data_dir.root().display().to_string(),
            "candidates": candidates,
            "queries": queries,
            "weights": weights,
        });
        println!("{value}");
    } else {
        println!("Data directory: {}", data_dir.root().display());
        println!("Candidates: {candidates}");
        println!("Queries: {queries}");
        match weights {
            Some(w) => {
                println!("Weights: keyword {}, vector {}", w.keyword, w.vector)
            }
            None => println!("Weights: not configured"),
        }
    }
    Ok(())
}

fn config_show(db: &ProfileDb, json: bool) -> Result<()> {
    let weights = db.get_weights()?;
    if json {
        println!("{}", serde_json::json!({ "weights": weights }));
    } else {
        match weights {
            Some(w) => {
                println!("keyword_weight\t{}", w.keyword);
                println!("vector_weight\t{}", w.vector);
            }
            None => println!("No weights configured."),
        }
    }
    Ok(())
}
