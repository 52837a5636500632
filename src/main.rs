use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

use content_query::config;
use content_query::db::Page;
use content_query::filter::{ArticleKey, ArticleWhere, ExternalWhere, Filter, TopicKey, TopicWhere};
use content_query::QueryContext;

#[derive(Debug, Parser)]
#[command(author, version, about = "Query published content and print it as JSON")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List articles
    Articles(ListArgs),
    /// Count articles
    ArticlesCount(CountArgs),
    /// Fetch one article by id or slug
    Article(KeyArgs),
    /// List external items
    Externals(ListArgs),
    /// Count external items
    ExternalsCount(CountArgs),
    /// List topics
    Topics(ListArgs),
    /// Count topics
    TopicsCount(CountArgs),
    /// Fetch one topic by id, slug or name
    Topic(KeyArgs),
}

#[derive(Debug, ClapArgs)]
struct ListArgs {
    /// Filter as JSON, e.g. '{"slug": {"equals": "x"}}'
    #[arg(long = "where")]
    filter: Option<String>,
    /// Order as JSON, e.g. '[{"publishedDate": "desc"}]'
    #[arg(long)]
    order_by: Option<String>,
    #[arg(long)]
    take: Option<i64>,
    #[arg(long)]
    skip: Option<i64>,
}

#[derive(Debug, ClapArgs)]
struct CountArgs {
    /// Filter as JSON
    #[arg(long = "where")]
    filter: Option<String>,
}

#[derive(Debug, ClapArgs)]
struct KeyArgs {
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    slug: Option<String>,
    /// Topics only
    #[arg(long)]
    name: Option<String>,
}

fn parse_json(raw: Option<&str>, what: &str) -> Result<Value> {
    match raw {
        Some(raw) => serde_json::from_str(raw).with_context(|| format!("--{what} is not valid JSON")),
        None => Ok(Value::Null),
    }
}

fn decode<F: Filter>(raw: Option<&str>) -> Result<F> {
    Ok(F::from_value(parse_json(raw, "where")?)?)
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
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
    let cfg = config::load(Some(&args.config))?;
    let ctx = QueryContext::from_config(&cfg).await?;
    info!(host = ctx.media().base(), "query context ready");

    match args.command {
        Command::Articles(a) => {
            let filter: ArticleWhere = decode(a.filter.as_deref())?;
            let order = parse_json(a.order_by.as_deref(), "order-by")?;
            print(&ctx.list_articles(filter, &order, Page::new(a.take, a.skip)).await?)
        }
        Command::ArticlesCount(a) => print(&ctx.count_articles(decode(a.filter.as_deref())?).await?),
        Command::Article(k) => {
            let key = ArticleKey {
                id: k.id,
                slug: k.slug,
            };
            print(&ctx.article_by_key(&key).await?)
        }
        Command::Externals(a) => {
            let filter: ExternalWhere = decode(a.filter.as_deref())?;
            let order = parse_json(a.order_by.as_deref(), "order-by")?;
            print(
                &ctx.list_external_items(filter, &order, Page::new(a.take, a.skip))
                    .await?,
            )
        }
        Command::ExternalsCount(a) => {
            print(&ctx.count_external_items(decode(a.filter.as_deref())?).await?)
        }
        Command::Topics(a) => {
            let filter: TopicWhere = decode(a.filter.as_deref())?;
            let order = parse_json(a.order_by.as_deref(), "order-by")?;
            print(&ctx.list_topics(filter, &order, Page::new(a.take, a.skip)).await?)
        }
        Command::TopicsCount(a) => print(&ctx.count_topics(decode(a.filter.as_deref())?).await?),
        Command::Topic(k) => {
            let key = TopicKey {
                id: k.id,
                slug: k.slug,
                name: k.name,
            };
            print(&ctx.topic_by_key(&key).await?)
        }
    }
}
