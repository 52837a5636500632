use anyhow::Result;
use clap::Parser;
use content_query::probe::{
    canned_cases, compare_runs, http_client, run_cases, DEFAULT_EXTERNAL_SLUG, DEFAULT_POST_SLUG,
};
use serde_json::json;

#[derive(Debug, Parser)]
#[command(about = "Replay canned GraphQL queries against two endpoints and diff the responses")]
struct Args {
    /// Reference GraphQL endpoint
    #[arg(long)]
    target: String,

    /// Endpoint under test
    #[arg(long)]
    candidate: String,

    /// Slug used by the post lookup case
    #[arg(long, default_value = DEFAULT_POST_SLUG)]
    post_slug: String,

    /// Slug used by the external item lookup case
    #[arg(long, default_value = DEFAULT_EXTERNAL_SLUG)]
    external_slug: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    let client = http_client()?;
    let cases = canned_cases(&args.post_slug, &args.external_slug);

    let target = run_cases(&client, &args.target, &cases).await;
    let candidate = run_cases(&client, &args.candidate, &cases).await;
    let results = compare_runs(&target, &candidate);

    let report = json!({
        "target": args.target,
        "candidate": args.candidate,
        "results": results,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
