//! Public query surface.
//!
//! Every operation follows the same pipeline: decode, apply the published
//! default, consult the cache, run the primary statement under the fetch
//! deadline, hydrate relations under the hydration deadline, then store the
//! result.
pub mod hydrate;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::cache::{cache_key, QueryCache};
use crate::config::{Config, Deadlines};
use crate::db::{self, ContentSource, Page, PgSource};
use crate::error::{QueryError, QueryResult};
use crate::filter::{ArticleKey, ArticleWhere, ExternalWhere, TopicKey, TopicWhere};
use crate::media::MediaHost;
use crate::model::{Article, ExternalItem, Topic};
use crate::order::{OrderClause, ARTICLE_SORTING, EXTERNAL_SORTING, TOPIC_SORTING};
use crate::published::with_published_default;

/// Everything an operation needs, built once and shared by reference.
#[derive(Clone)]
pub struct QueryContext {
    source: Arc<dyn ContentSource>,
    cache: QueryCache,
    media: MediaHost,
    deadlines: Deadlines,
}

#[derive(Serialize)]
struct ListKey<'a, F> {
    #[serde(rename = "where")]
    filter: &'a F,
    order: &'a OrderClause,
    #[serde(skip_serializing_if = "Option::is_none")]
    take: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip: Option<i64>,
}

#[derive(Serialize)]
struct CountKey<'a, F> {
    #[serde(rename = "where")]
    filter: &'a F,
}

async fn within<T>(
    stage: &'static str,
    limit: Duration,
    fut: impl Future<Output = QueryResult<T>>,
) -> QueryResult<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| QueryError::Timeout { stage })?
}

fn list_key<F: Serialize>(op: &str, filter: &F, order: &OrderClause, page: Page) -> Option<String> {
    cache_key(
        op,
        &ListKey {
            filter,
            order,
            take: page.take,
            skip: page.skip,
        },
    )
}

impl QueryContext {
    pub fn new(
        source: Arc<dyn ContentSource>,
        cache: QueryCache,
        media: MediaHost,
        deadlines: Deadlines,
    ) -> Self {
        Self {
            source,
            cache,
            media,
            deadlines,
        }
    }

    /// Connect the pool and cache described by `cfg`.
    pub async fn from_config(cfg: &Config) -> Result<Self> {
        let pool = db::init_pool(&cfg.database).await?;
        let cache = QueryCache::from_config(&cfg.cache).await;
        Ok(Self::new(
            Arc::new(PgSource::new(pool)),
            cache,
            MediaHost::new(&cfg.statics.host),
            cfg.deadlines,
        ))
    }

    pub fn media(&self) -> &MediaHost {
        &self.media
    }

    async fn cached<T: DeserializeOwned>(&self, key: &Option<String>) -> Option<T> {
        match key {
            Some(key) if self.cache.enabled() => self.cache.get(key).await,
            _ => None,
        }
    }

    async fn store<T: Serialize>(&self, key: &Option<String>, value: &T) {
        if let Some(key) = key {
            self.cache.set(key, value).await;
        }
    }

    async fn counted<F: Serialize>(
        &self,
        op: &str,
        filter: &F,
        count: impl Future<Output = QueryResult<i64>>,
    ) -> QueryResult<i64> {
        let key = cache_key(op, &CountKey { filter });
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }
        let n = within("count", self.deadlines.count(), count).await?;
        self.store(&key, &n).await;
        Ok(n)
    }

    #[instrument(skip_all, fields(op = "articles"))]
    pub async fn list_articles(
        &self,
        filter: ArticleWhere,
        order_by: &Value,
        page: Page,
    ) -> QueryResult<Vec<Article>> {
        let filter = with_published_default(filter);
        let order = ARTICLE_SORTING.resolve(order_by)?;
        let page = page.normalized();
        let key = list_key("articles", &filter, &order, page);
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }
        let rows = within(
            "fetch",
            self.deadlines.fetch(),
            self.source.articles(&filter, &order, page),
        )
        .await?;
        let articles = within(
            "hydrate",
            self.deadlines.hydrate(),
            hydrate::hydrate_articles(self.source.as_ref(), &self.media, rows),
        )
        .await?;
        self.store(&key, &articles).await;
        Ok(articles)
    }

    #[instrument(skip_all, fields(op = "articles_count"))]
    pub async fn count_articles(&self, filter: ArticleWhere) -> QueryResult<i64> {
        let filter = with_published_default(filter);
        self.counted("articles_count", &filter, self.source.count_articles(&filter))
            .await
    }

    /// Single article by id or slug. Not subject to the published default.
    #[instrument(skip_all, fields(op = "article"))]
    pub async fn article_by_key(&self, key: &ArticleKey) -> QueryResult<Option<Article>> {
        let Some(lookup) = key.resolve() else {
            return Ok(None);
        };
        let cache_key = cache_key("article", &lookup);
        if let Some(hit) = self.cached(&cache_key).await {
            return Ok(Some(hit));
        }
        let row = within(
            "fetch",
            self.deadlines.fetch(),
            self.source.article_by_key(&lookup),
        )
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let article = within(
            "hydrate",
            self.deadlines.hydrate(),
            hydrate::hydrate_articles(self.source.as_ref(), &self.media, vec![row]),
        )
        .await?
        .pop();
        if let Some(article) = &article {
            self.store(&cache_key, article).await;
        }
        Ok(article)
    }

    #[instrument(skip_all, fields(op = "externals"))]
    pub async fn list_external_items(
        &self,
        filter: ExternalWhere,
        order_by: &Value,
        page: Page,
    ) -> QueryResult<Vec<ExternalItem>> {
        let filter = with_published_default(filter);
        let order = EXTERNAL_SORTING.resolve(order_by)?;
        let page = page.normalized();
        let key = list_key("externals", &filter, &order, page);
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }
        let rows = within(
            "fetch",
            self.deadlines.fetch(),
            self.source.external_items(&filter, &order, page),
        )
        .await?;
        let items = within(
            "hydrate",
            self.deadlines.hydrate(),
            hydrate::hydrate_external_items(self.source.as_ref(), rows),
        )
        .await?;
        self.store(&key, &items).await;
        Ok(items)
    }

    #[instrument(skip_all, fields(op = "externals_count"))]
    pub async fn count_external_items(&self, filter: ExternalWhere) -> QueryResult<i64> {
        let filter = with_published_default(filter);
        self.counted(
            "externals_count",
            &filter,
            self.source.count_external_items(&filter),
        )
        .await
    }

    #[instrument(skip_all, fields(op = "topics"))]
    pub async fn list_topics(
        &self,
        filter: TopicWhere,
        order_by: &Value,
        page: Page,
    ) -> QueryResult<Vec<Topic>> {
        let filter = with_published_default(filter);
        let order = TOPIC_SORTING.resolve(order_by)?;
        let page = page.normalized();
        let key = list_key("topics", &filter, &order, page);
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }
        let rows = within(
            "fetch",
            self.deadlines.fetch(),
            self.source.topics(&filter, &order, page),
        )
        .await?;
        let topics = within(
            "hydrate",
            self.deadlines.hydrate(),
            hydrate::hydrate_topics(self.source.as_ref(), &self.media, rows),
        )
        .await?;
        self.store(&key, &topics).await;
        Ok(topics)
    }

    #[instrument(skip_all, fields(op = "topics_count"))]
    pub async fn count_topics(&self, filter: TopicWhere) -> QueryResult<i64> {
        let filter = with_published_default(filter);
        self.counted("topics_count", &filter, self.source.count_topics(&filter))
            .await
    }

    /// Single topic by id, slug or name. Not subject to the published default.
    #[instrument(skip_all, fields(op = "topic"))]
    pub async fn topic_by_key(&self, key: &TopicKey) -> QueryResult<Option<Topic>> {
        let Some(lookup) = key.resolve() else {
            return Ok(None);
        };
        let cache_key = cache_key("topic", &lookup);
        if let Some(hit) = self.cached(&cache_key).await {
            return Ok(Some(hit));
        }
        let row = within(
            "fetch",
            self.deadlines.fetch(),
            self.source.topic_by_key(&lookup),
        )
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let topic = within(
            "hydrate",
            self.deadlines.hydrate(),
            hydrate::hydrate_topics(self.source.as_ref(), &self.media, vec![row]),
        )
        .await?
        .pop();
        if let Some(topic) = &topic {
            self.store(&cache_key, topic).await;
        }
        Ok(topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_expiry_names_the_stage() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, QueryError>(1)
        };
        let err = within("count", Duration::from_millis(10), slow)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Timeout { stage: "count" }));
    }

    #[test]
    fn list_key_depends_on_resolved_order() {
        let filter = with_published_default(ArticleWhere::default());
        let explicit = ARTICLE_SORTING
            .resolve(&serde_json::json!([{"publishedDate": "DESC"}]))
            .unwrap();
        let fallback = ARTICLE_SORTING
            .resolve(&serde_json::json!([{"bogus": "asc"}]))
            .unwrap();
        let page = Page::new(Some(5), Some(0)).normalized();
        assert_eq!(
            list_key("articles", &filter, &explicit, page),
            list_key("articles", &filter, &fallback, page)
        );
        assert_ne!(
            list_key("articles", &filter, &explicit, page),
            list_key("articles", &filter, &explicit, Page::new(Some(6), None))
        );
    }
}
