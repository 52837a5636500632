//! Database module: statement assembly, row records and the content source.
//!
//! This module is split into submodules:
//! - `statement`: predicate builder and parameterized statements.
//! - `schema`: table and join-table names.
//! - `model`: row records returned by content sources.
//! - `repo`: the Postgres-backed content source.
//!
//! The query layer only talks to [`ContentSource`], so tests can substitute a
//! recording fake for the database.

pub mod model;
pub mod repo;
pub mod schema;
pub mod statement;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config;
use crate::error::QueryResult;
use crate::filter::{ArticleWhere, ExternalWhere, KeyMatch, TopicWhere};
use crate::media::ImageRecord;
use crate::model::{Category, Contributor, Section, Tag};
use crate::order::OrderClause;

pub use model::*;
pub use repo::PgSource;
pub use schema::{ContributorRole, TagRelation};
pub use statement::{Page, Predicates, SqlArg, Statement};

pub type Pool = PgPool;

/// Open a bounded pool. Idle connections are closed after
/// `idle_timeout_secs`; acquiring waits at most `acquire_timeout_secs`.
pub async fn init_pool(cfg: &config::Database) -> Result<Pool> {
    let pool = pool_options(cfg)
        .connect(&cfg.url)
        .await
        .context("connecting to postgres")?;
    info!(max_connections = cfg.max_connections, "database pool ready");
    Ok(pool)
}

fn pool_options(cfg: &config::Database) -> PgPoolOptions {
    // sqlx has no idle-count cap: idle connections are bounded by reaping
    // them after `idle_timeout` (min_connections stays 0).
    PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .min_connections(0)
        .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
}

/// Read access to the content tables.
///
/// Primary methods take typed filters and a resolved order; relation methods
/// take a batch of owner or target ids and return every matching row in one
/// round-trip. Implementations must not be called with an empty id slice.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn articles(
        &self,
        filter: &ArticleWhere,
        order: &OrderClause,
        page: Page,
    ) -> QueryResult<Vec<ArticleRow>>;
    async fn count_articles(&self, filter: &ArticleWhere) -> QueryResult<i64>;
    async fn article_by_key(&self, key: &KeyMatch) -> QueryResult<Option<ArticleRow>>;

    async fn external_items(
        &self,
        filter: &ExternalWhere,
        order: &OrderClause,
        page: Page,
    ) -> QueryResult<Vec<ExternalRow>>;
    async fn count_external_items(&self, filter: &ExternalWhere) -> QueryResult<i64>;

    async fn topics(
        &self,
        filter: &TopicWhere,
        order: &OrderClause,
        page: Page,
    ) -> QueryResult<Vec<TopicRow>>;
    async fn count_topics(&self, filter: &TopicWhere) -> QueryResult<i64>;
    async fn topic_by_key(&self, key: &KeyMatch) -> QueryResult<Option<TopicRow>>;

    async fn sections(&self, articles: &[DbId]) -> QueryResult<Vec<Linked<Section>>>;
    async fn categories(&self, articles: &[DbId]) -> QueryResult<Vec<Linked<Category>>>;
    async fn category_sections(&self, categories: &[DbId]) -> QueryResult<Vec<Linked<Section>>>;
    async fn contributors(
        &self,
        role: ContributorRole,
        articles: &[DbId],
    ) -> QueryResult<Vec<Linked<Contributor>>>;
    async fn tags(&self, relation: TagRelation, owners: &[DbId]) -> QueryResult<Vec<Linked<Tag>>>;
    /// Stored edges touching any of `articles`, in either direction.
    async fn related_edges(&self, articles: &[DbId]) -> QueryResult<Vec<RelatedEdge>>;
    async fn article_summaries(&self, ids: &[DbId]) -> QueryResult<Vec<Record<SummaryRecord>>>;
    /// Published articles whose topic is one of `topics`.
    async fn topic_articles(&self, topics: &[DbId]) -> QueryResult<Vec<Linked<SummaryRecord>>>;
    async fn videos(&self, ids: &[DbId]) -> QueryResult<Vec<Record<VideoRecord>>>;
    async fn topic_summaries(&self, ids: &[DbId]) -> QueryResult<Vec<TopicSummaryRecord>>;
    async fn partners(&self, ids: &[DbId]) -> QueryResult<Vec<PartnerRecord>>;
    async fn slideshow_links(&self, topics: &[DbId]) -> QueryResult<Vec<Link>>;
    async fn images(&self, ids: &[DbId]) -> QueryResult<Vec<ImageRecord>>;
}
