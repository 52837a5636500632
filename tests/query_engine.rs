use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use content_query::cache::{CacheBackend, QueryCache};
use content_query::config::Deadlines;
use content_query::db::{
    ArticleLinks, ArticleRow, ContentSource, ContributorRole, DbId, ExternalRow, Link, Linked,
    Page, PartnerRecord, Record, RelatedEdge, SummaryRecord, TagRelation, TopicRow,
    TopicSummaryRecord, VideoRecord,
};
use content_query::filter::{
    ArticleKey, ArticleWhere, ExternalWhere, Filter, KeyMatch, StringFilter, TopicKey, TopicWhere,
};
use content_query::media::{ImageRecord, MediaHost};
use content_query::model::{
    Article, Category, Contributor, ExternalItem, Partner, RelatedArticle, Section, Tag, Topic,
};
use content_query::order::OrderClause;
use content_query::{QueryContext, QueryError, QueryResult};

#[derive(Clone, Default)]
struct RecordingSource {
    calls: Arc<Mutex<Vec<&'static str>>>,
    article_filters: Arc<Mutex<Vec<ArticleWhere>>>,
    external_filters: Arc<Mutex<Vec<ExternalWhere>>>,
    orders: Arc<Mutex<Vec<OrderClause>>>,
    pages: Arc<Mutex<Vec<Page>>>,
    fail_on: Option<&'static str>,
    articles: Vec<ArticleRow>,
    externals: Vec<ExternalRow>,
    topics: Vec<TopicRow>,
    edges: Vec<RelatedEdge>,
    summaries: Vec<Record<SummaryRecord>>,
    members: Vec<Linked<SummaryRecord>>,
    tags: Vec<Linked<Tag>>,
    partners: Vec<PartnerRecord>,
    images: Vec<ImageRecord>,
}

impl RecordingSource {
    async fn record(&self, call: &'static str) -> QueryResult<()> {
        self.calls.lock().await.push(call);
        if self.fail_on == Some(call) {
            return Err(QueryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }

    fn context(&self) -> QueryContext {
        self.context_with(QueryCache::disabled())
    }

    fn context_with(&self, cache: QueryCache) -> QueryContext {
        QueryContext::new(
            Arc::new(self.clone()),
            cache,
            MediaHost::new("https://statics.example.com/images"),
            Deadlines::default(),
        )
    }
}

fn owned_by<T: Clone>(linked: &[Linked<T>], owners: &[DbId]) -> Vec<Linked<T>> {
    linked
        .iter()
        .filter(|l| owners.contains(&l.owner))
        .cloned()
        .collect()
}

#[async_trait]
impl ContentSource for RecordingSource {
    async fn articles(
        &self,
        filter: &ArticleWhere,
        order: &OrderClause,
        page: Page,
    ) -> QueryResult<Vec<ArticleRow>> {
        self.record("articles").await?;
        self.article_filters.lock().await.push(filter.clone());
        self.orders.lock().await.push(order.clone());
        self.pages.lock().await.push(page);
        Ok(self.articles.clone())
    }

    async fn count_articles(&self, filter: &ArticleWhere) -> QueryResult<i64> {
        self.record("count_articles").await?;
        self.article_filters.lock().await.push(filter.clone());
        Ok(self.articles.len() as i64)
    }

    async fn article_by_key(&self, key: &KeyMatch) -> QueryResult<Option<ArticleRow>> {
        self.record("article_by_key").await?;
        Ok(self
            .articles
            .iter()
            .find(|row| match key {
                KeyMatch::Id(id) => row.id == *id,
                KeyMatch::Slug(slug) => &row.article.slug == slug,
                KeyMatch::Name(_) => false,
            })
            .cloned())
    }

    async fn external_items(
        &self,
        filter: &ExternalWhere,
        order: &OrderClause,
        page: Page,
    ) -> QueryResult<Vec<ExternalRow>> {
        self.record("external_items").await?;
        self.external_filters.lock().await.push(filter.clone());
        self.orders.lock().await.push(order.clone());
        self.pages.lock().await.push(page);
        Ok(self.externals.clone())
    }

    async fn count_external_items(&self, filter: &ExternalWhere) -> QueryResult<i64> {
        self.record("count_external_items").await?;
        self.external_filters.lock().await.push(filter.clone());
        Ok(self.externals.len() as i64)
    }

    async fn topics(
        &self,
        _filter: &TopicWhere,
        order: &OrderClause,
        page: Page,
    ) -> QueryResult<Vec<TopicRow>> {
        self.record("topics").await?;
        self.orders.lock().await.push(order.clone());
        self.pages.lock().await.push(page);
        Ok(self.topics.clone())
    }

    async fn count_topics(&self, _filter: &TopicWhere) -> QueryResult<i64> {
        self.record("count_topics").await?;
        Ok(self.topics.len() as i64)
    }

    async fn topic_by_key(&self, key: &KeyMatch) -> QueryResult<Option<TopicRow>> {
        self.record("topic_by_key").await?;
        Ok(self
            .topics
            .iter()
            .find(|row| match key {
                KeyMatch::Id(id) => row.id == *id,
                KeyMatch::Slug(slug) => &row.topic.slug == slug,
                KeyMatch::Name(name) => &row.topic.name == name,
            })
            .cloned())
    }

    async fn sections(&self, _articles: &[DbId]) -> QueryResult<Vec<Linked<Section>>> {
        self.record("sections").await?;
        Ok(Vec::new())
    }

    async fn categories(&self, _articles: &[DbId]) -> QueryResult<Vec<Linked<Category>>> {
        self.record("categories").await?;
        Ok(Vec::new())
    }

    async fn category_sections(&self, _categories: &[DbId]) -> QueryResult<Vec<Linked<Section>>> {
        self.record("category_sections").await?;
        Ok(Vec::new())
    }

    async fn contributors(
        &self,
        _role: ContributorRole,
        _articles: &[DbId],
    ) -> QueryResult<Vec<Linked<Contributor>>> {
        self.record("contributors").await?;
        Ok(Vec::new())
    }

    async fn tags(&self, relation: TagRelation, owners: &[DbId]) -> QueryResult<Vec<Linked<Tag>>> {
        self.record("tags").await?;
        match relation {
            TagRelation::ArticleAlgo => Ok(Vec::new()),
            _ => Ok(owned_by(&self.tags, owners)),
        }
    }

    async fn related_edges(&self, articles: &[DbId]) -> QueryResult<Vec<RelatedEdge>> {
        self.record("related_edges").await?;
        Ok(self
            .edges
            .iter()
            .filter(|e| articles.contains(&e.a) || articles.contains(&e.b))
            .copied()
            .collect())
    }

    async fn article_summaries(&self, ids: &[DbId]) -> QueryResult<Vec<Record<SummaryRecord>>> {
        self.record("article_summaries").await?;
        Ok(self
            .summaries
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn topic_articles(&self, topics: &[DbId]) -> QueryResult<Vec<Linked<SummaryRecord>>> {
        self.record("topic_articles").await?;
        Ok(owned_by(&self.members, topics))
    }

    async fn videos(&self, _ids: &[DbId]) -> QueryResult<Vec<Record<VideoRecord>>> {
        self.record("videos").await?;
        Ok(Vec::new())
    }

    async fn topic_summaries(&self, _ids: &[DbId]) -> QueryResult<Vec<TopicSummaryRecord>> {
        self.record("topic_summaries").await?;
        Ok(Vec::new())
    }

    async fn partners(&self, ids: &[DbId]) -> QueryResult<Vec<PartnerRecord>> {
        self.record("partners").await?;
        Ok(self
            .partners
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn slideshow_links(&self, _topics: &[DbId]) -> QueryResult<Vec<Link>> {
        self.record("slideshow_links").await?;
        Ok(Vec::new())
    }

    async fn images(&self, ids: &[DbId]) -> QueryResult<Vec<ImageRecord>> {
        self.record("images").await?;
        Ok(self
            .images
            .iter()
            .filter(|im| ids.contains(&im.id))
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl MemoryCache {
    fn query_cache(&self) -> QueryCache {
        QueryCache::new(
            Arc::new(self.clone()),
            Duration::from_secs(60),
            Duration::from_secs(1),
        )
    }

    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

fn article(id: DbId, links: ArticleLinks) -> ArticleRow {
    ArticleRow {
        id,
        article: Article {
            id: id.to_string(),
            slug: format!("post-{id}"),
            title: format!("Post {id}"),
            state: "published".into(),
            ..Default::default()
        },
        links,
    }
}

fn summary(id: DbId, hero_image: Option<DbId>) -> Record<SummaryRecord> {
    Record {
        id,
        value: SummaryRecord {
            summary: RelatedArticle {
                id: id.to_string(),
                slug: format!("post-{id}"),
                title: format!("Post {id}"),
                hero_image: None,
            },
            hero_image,
        },
    }
}

fn image(id: DbId) -> ImageRecord {
    ImageRecord {
        id,
        file_id: format!("file-{id}"),
        extension: "jpg".into(),
        width: Some(1200),
        height: Some(800),
    }
}

fn related_ids(article: &Article) -> Vec<&str> {
    article.relateds.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn list_defaults_to_published_when_state_absent() {
    let source = RecordingSource::default();
    let ctx = source.context();

    ctx.list_articles(ArticleWhere::default(), &json!(null), Page::default())
        .await
        .unwrap();
    let explicit = ArticleWhere {
        state: Some(StringFilter::equals("draft")),
        ..Default::default()
    };
    ctx.list_articles(explicit, &json!(null), Page::default())
        .await
        .unwrap();

    let filters = source.article_filters.lock().await.clone();
    assert_eq!(filters[0].state, Some(StringFilter::equals("published")));
    assert_eq!(filters[1].state, Some(StringFilter::equals("draft")));
}

#[tokio::test]
async fn counts_share_the_published_default() {
    let source = RecordingSource {
        externals: vec![ExternalRow::default(), ExternalRow::default()],
        ..Default::default()
    };
    let ctx = source.context();

    let n = ctx
        .count_external_items(ExternalWhere::default())
        .await
        .unwrap();
    assert_eq!(n, 2);
    let filters = source.external_filters.lock().await.clone();
    assert_eq!(filters[0].state, Some(StringFilter::equals("published")));
}

#[tokio::test]
async fn related_articles_are_symmetric() {
    let source = RecordingSource {
        articles: vec![
            article(1, ArticleLinks::default()),
            article(2, ArticleLinks::default()),
        ],
        // 1 lists 3; 4 lists 1; 5 and 6 are unrelated to the batch.
        edges: vec![
            RelatedEdge { a: 1, b: 3 },
            RelatedEdge { a: 4, b: 1 },
            RelatedEdge { a: 5, b: 6 },
        ],
        summaries: vec![summary(3, None), summary(4, None)],
        ..Default::default()
    };
    let articles = source
        .context()
        .list_articles(ArticleWhere::default(), &json!(null), Page::default())
        .await
        .unwrap();

    assert_eq!(related_ids(&articles[0]), vec!["3", "4"]);
    assert!(articles[1].relateds.is_empty());
}

#[tokio::test]
async fn relation_queries_do_not_grow_with_batch_size() {
    fn batch(n: DbId) -> Vec<ArticleRow> {
        (1..=n)
            .map(|id| {
                article(
                    id,
                    ArticleLinks {
                        hero_image: Some(100 + id),
                        relateds_one: Some(1),
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    let small = RecordingSource {
        articles: batch(2),
        ..Default::default()
    };
    let large = RecordingSource {
        articles: batch(40),
        ..Default::default()
    };
    for source in [&small, &large] {
        source
            .context()
            .list_articles(ArticleWhere::default(), &json!(null), Page::default())
            .await
            .unwrap();
    }

    let small_calls = small.calls().await;
    assert_eq!(small_calls.len(), large.calls().await.len());
    let contributor_calls = small_calls.iter().filter(|c| **c == "contributors").count();
    assert_eq!(contributor_calls, ContributorRole::ALL.len());
    assert!(small_calls.contains(&"images"));
    assert!(small_calls.contains(&"article_summaries"));
}

#[tokio::test]
async fn empty_batch_issues_no_relation_queries() {
    let source = RecordingSource::default();
    let articles = source
        .context()
        .list_articles(ArticleWhere::default(), &json!(null), Page::default())
        .await
        .unwrap();

    assert!(articles.is_empty());
    assert_eq!(source.calls().await, vec!["articles"]);
}

#[tokio::test]
async fn failing_relation_fails_the_whole_batch() {
    let source = RecordingSource {
        articles: vec![article(1, ArticleLinks::default())],
        fail_on: Some("tags"),
        ..Default::default()
    };
    let memory = MemoryCache::default();
    let err = source
        .context_with(memory.query_cache())
        .list_articles(ArticleWhere::default(), &json!(null), Page::default())
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Database(_)));
    assert_eq!(memory.len().await, 0);
}

#[tokio::test]
async fn pagination_reaches_the_source_normalized() {
    let source = RecordingSource::default();
    let ctx = source.context();

    ctx.list_topics(TopicWhere::default(), &json!(null), Page::new(Some(5), Some(10)))
        .await
        .unwrap();
    ctx.list_topics(TopicWhere::default(), &json!(null), Page::new(Some(0), Some(-3)))
        .await
        .unwrap();

    let pages = source.pages.lock().await.clone();
    assert_eq!(pages[0], Page::new(Some(5), Some(10)));
    assert_eq!(pages[1], Page::default());
}

#[tokio::test]
async fn unknown_order_field_falls_back_to_default() {
    let source = RecordingSource::default();
    let ctx = source.context();

    ctx.list_articles(
        ArticleWhere::default(),
        &json!([{"popularity": "asc"}]),
        Page::default(),
    )
    .await
    .unwrap();
    ctx.list_topics(TopicWhere::default(), &json!([]), Page::default())
        .await
        .unwrap();

    let orders = source.orders.lock().await.clone();
    assert_eq!(orders[0].field, "publishedDate");
    assert!(orders[0].sql.contains("DESC"));
    assert_eq!(orders[1].field, "sortOrder");
}

#[tokio::test]
async fn malformed_input_is_rejected_before_the_source() {
    let source = RecordingSource::default();
    let err = source
        .context()
        .list_articles(ArticleWhere::default(), &json!("publishedDate"), Page::default())
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::InvalidInput { .. }));
    assert!(source.calls().await.is_empty());
}

#[tokio::test]
async fn cached_list_is_served_without_source_calls() {
    let source = RecordingSource {
        articles: vec![article(1, ArticleLinks::default())],
        ..Default::default()
    };
    let memory = MemoryCache::default();
    let ctx = source.context_with(memory.query_cache());
    let order = json!([{"publishedDate": "desc"}]);

    let first = ctx
        .list_articles(ArticleWhere::default(), &order, Page::new(Some(3), None))
        .await
        .unwrap();
    let calls_after_first = source.calls().await.len();
    let second = ctx
        .list_articles(ArticleWhere::default(), &order, Page::new(Some(3), None))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(source.calls().await.len(), calls_after_first);
    assert_eq!(memory.len().await, 1);
}

#[tokio::test]
async fn reordered_in_list_hits_the_same_cache_entry() {
    let source = RecordingSource {
        articles: vec![article(1, ArticleLinks::default())],
        ..Default::default()
    };
    let memory = MemoryCache::default();
    let ctx = source.context_with(memory.query_cache());

    let first = ArticleWhere::from_value(json!({"slug": {"in": ["post-1", "post-2"]}})).unwrap();
    let second = ArticleWhere::from_value(json!({"slug": {"in": ["post-2", "post-1", "post-2"]}})).unwrap();
    ctx.count_articles(first).await.unwrap();
    ctx.count_articles(second).await.unwrap();

    assert_eq!(source.calls().await, vec!["count_articles"]);
    assert_eq!(memory.len().await, 1);
}

#[tokio::test]
async fn cached_count_is_served_without_source_calls() {
    let source = RecordingSource {
        articles: vec![article(1, ArticleLinks::default())],
        ..Default::default()
    };
    let ctx = source.context_with(MemoryCache::default().query_cache());

    assert_eq!(ctx.count_articles(ArticleWhere::default()).await.unwrap(), 1);
    assert_eq!(ctx.count_articles(ArticleWhere::default()).await.unwrap(), 1);
    assert_eq!(source.calls().await, vec!["count_articles"]);
}

#[tokio::test]
async fn unusable_keys_resolve_to_nothing() {
    let source = RecordingSource {
        articles: vec![article(1, ArticleLinks::default())],
        ..Default::default()
    };
    let ctx = source.context();

    let missing = ctx.article_by_key(&ArticleKey::default()).await.unwrap();
    let non_numeric = ctx
        .article_by_key(&ArticleKey {
            id: Some("abc".into()),
            slug: Some("post-1".into()),
        })
        .await
        .unwrap();
    let empty_slug = ctx
        .topic_by_key(&TopicKey {
            slug: Some(String::new()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(missing.is_none());
    assert!(non_numeric.is_none());
    assert!(empty_slug.is_none());
    assert!(source.calls().await.is_empty());
}

#[tokio::test]
async fn unique_lookup_ignores_the_published_default() {
    let mut draft = article(7, ArticleLinks::default());
    draft.article.state = "draft".into();
    let source = RecordingSource {
        articles: vec![draft],
        ..Default::default()
    };

    let found = source
        .context()
        .article_by_key(&ArticleKey {
            id: None,
            slug: Some("post-7".into()),
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.state, "draft");
    assert!(source.article_filters.lock().await.is_empty());
}

#[tokio::test]
async fn singular_related_carries_only_the_hero_image() {
    let source = RecordingSource {
        articles: vec![article(
            1,
            ArticleLinks {
                relateds_one: Some(9),
                relateds_two: Some(404),
                ..Default::default()
            },
        )],
        summaries: vec![summary(9, Some(90))],
        images: vec![image(90)],
        ..Default::default()
    };
    let found = source
        .context()
        .article_by_key(&ArticleKey {
            id: Some("1".into()),
            slug: None,
        })
        .await
        .unwrap()
        .unwrap();

    let related = found.relateds_one.unwrap();
    assert_eq!(related.slug, "post-9");
    let hero = related.hero_image.unwrap();
    assert_eq!(hero.id, "90");
    assert!(hero.resized.w800.contains("file-90"));
    assert!(found.relateds_two.is_none());
}

#[tokio::test]
async fn external_items_get_partner_and_tags() {
    let source = RecordingSource {
        externals: vec![
            ExternalRow {
                id: 1,
                item: ExternalItem {
                    id: "1".into(),
                    ..Default::default()
                },
                partner: Some(5),
            },
            ExternalRow {
                id: 2,
                item: ExternalItem {
                    id: "2".into(),
                    ..Default::default()
                },
                partner: None,
            },
        ],
        partners: vec![Record {
            id: 5,
            value: Partner {
                id: "5".into(),
                slug: "mirrordaily".into(),
                ..Default::default()
            },
        }],
        tags: vec![Linked {
            owner: 2,
            id: 11,
            value: Tag {
                id: "11".into(),
                name: "news".into(),
                slug: "news".into(),
            },
        }],
        ..Default::default()
    };
    let items = source
        .context()
        .list_external_items(ExternalWhere::default(), &json!(null), Page::default())
        .await
        .unwrap();

    assert_eq!(items[0].partner.as_ref().map(|p| p.slug.as_str()), Some("mirrordaily"));
    assert!(items[0].tags.is_empty());
    assert!(items[1].partner.is_none());
    assert_eq!(items[1].tags[0].slug, "news");
}

#[tokio::test]
async fn topic_members_are_narrow_projections() {
    let source = RecordingSource {
        topics: vec![TopicRow {
            id: 3,
            topic: Topic {
                id: "3".into(),
                slug: "election".into(),
                name: "Election".into(),
                ..Default::default()
            },
            hero_image: Some(30),
            og_image: None,
        }],
        members: vec![Linked {
            owner: 3,
            id: 8,
            value: summary(8, Some(80)).value,
        }],
        images: vec![image(30), image(80)],
        ..Default::default()
    };
    let topic = source
        .context()
        .topic_by_key(&TopicKey {
            name: Some("Election".into()),
            ..Default::default()
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(topic.hero_image.unwrap().id, "30");
    assert_eq!(topic.posts.len(), 1);
    assert_eq!(topic.posts[0].hero_image.as_ref().unwrap().id, "80");
}
