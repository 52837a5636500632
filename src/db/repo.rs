use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};
use tracing::{debug, instrument};

use super::model::{
    ArticleLinks, ArticleRow, DbId, ExternalRow, Link, Linked, PartnerRecord, Record, RelatedEdge,
    SummaryRecord, TopicRow, TopicSummaryRecord, VideoRecord,
};
use super::schema::{
    JoinTable, CATEGORY_SECTIONS, POST_CATEGORIES, POST_RELATEDS, POST_SECTIONS,
    TOPIC_SLIDESHOW_IMAGES,
};
use super::statement::{Page, Predicates, SqlArg, Statement};
use super::{ContentSource, ContributorRole, Pool, TagRelation};
use crate::error::QueryResult;
use crate::filter::{ArticleWhere, ExternalWhere, Filter, KeyMatch, TopicWhere};
use crate::media::ImageRecord;
use crate::model::{
    Article, Category, Contributor, ExternalItem, Partner, RelatedArticle, Section, Tag, Topic,
    TopicSummary, Video,
};
use crate::order::OrderClause;
use crate::published::PUBLISHED;

const ARTICLE_COLUMNS: &str = r#"p.id, COALESCE(p.slug, '') AS slug, COALESCE(p.title, '') AS title, COALESCE(p.subtitle, '') AS subtitle, COALESCE(p.state, '') AS state, COALESCE(p.style, '') AS style, COALESCE(p."isMember", false) AS "isMember", COALESCE(p."isAdult", false) AS "isAdult", p."publishedDate", p."updatedAt", COALESCE(p."heroCaption", '') AS "heroCaption", COALESCE(p.extend_byline, '') AS extend_byline, p."heroImage", p."heroVideo", p.brief, p.content, COALESCE(p.redirect, '') AS redirect, COALESCE(p.og_title, '') AS og_title, COALESCE(p.og_description, '') AS og_description, COALESCE(p."hiddenAdvertised", false) AS "hiddenAdvertised", COALESCE(p."isAdvertised", false) AS "isAdvertised", COALESCE(p."isFeatured", false) AS "isFeatured", p.topics, p.og_image, p."relatedsOne", p."relatedsTwo""#;

const EXTERNAL_COLUMNS: &str = r#"e.id, COALESCE(e.slug, '') AS slug, COALESCE(e.title, '') AS title, COALESCE(e.state, '') AS state, e."publishedDate", COALESCE(e.extend_byline, '') AS extend_byline, COALESCE(e.thumb, '') AS thumb, COALESCE(e."thumbCaption", '') AS "thumbCaption", COALESCE(e.brief, '') AS brief, COALESCE(e.content, '') AS content, e.partner, e."updatedAt""#;

const TOPIC_COLUMNS: &str = r#"t.id, COALESCE(t.name, '') AS name, COALESCE(t.slug, '') AS slug, t."sortOrder", COALESCE(t.state, '') AS state, t.brief, t."heroImage", COALESCE(t."heroUrl", '') AS "heroUrl", COALESCE(t."leading", '') AS "leading", COALESCE(t.og_title, '') AS og_title, COALESCE(t.og_description, '') AS og_description, t.og_image, COALESCE(t."isFeatured", false) AS "isFeatured", COALESCE(t.title_style, '') AS title_style, COALESCE(t.type, '') AS type, COALESCE(t.style, '') AS style, COALESCE(t.javascript, '') AS javascript, COALESCE(t.dfp, '') AS dfp, COALESCE(t.mobile_dfp, '') AS mobile_dfp, t."createdAt", t."updatedAt""#;

const SUMMARY_COLUMNS: &str =
    r#"p.id, COALESCE(p.slug, '') AS slug, COALESCE(p.title, '') AS title, p."heroImage""#;

fn select(columns: &str, from: &str) -> String {
    format!("SELECT {columns} FROM {from}")
}

fn filtered<F: Filter>(filter: &F) -> Predicates {
    let mut p = Predicates::new();
    filter.apply(&mut p);
    p
}

pub fn article_select(filter: &ArticleWhere, order: &OrderClause, page: Page) -> Statement {
    filtered(filter).finish(&select(ARTICLE_COLUMNS, r#""Post" p"#), Some(&order.sql), page)
}

pub fn article_count(filter: &ArticleWhere) -> Statement {
    filtered(filter).finish(r#"SELECT COUNT(*) FROM "Post" p"#, None, Page::default())
}

/// Listing by publish date leaves out rows that were never published.
pub fn external_select(filter: &ExternalWhere, order: &OrderClause, page: Page) -> Statement {
    let mut p = filtered(filter);
    if order.field == "publishedDate" {
        p.raw(r#"e."publishedDate" IS NOT NULL"#);
    }
    p.finish(&select(EXTERNAL_COLUMNS, r#""External" e"#), Some(&order.sql), page)
}

pub fn external_count(filter: &ExternalWhere) -> Statement {
    filtered(filter).finish(r#"SELECT COUNT(*) FROM "External" e"#, None, Page::default())
}

pub fn topic_select(filter: &TopicWhere, order: &OrderClause, page: Page) -> Statement {
    filtered(filter).finish(&select(TOPIC_COLUMNS, r#""Topic" t"#), Some(&order.sql), page)
}

pub fn topic_count(filter: &TopicWhere) -> Statement {
    filtered(filter).finish(r#"SELECT COUNT(*) FROM "Topic" t"#, None, Page::default())
}

fn unique(columns: &str, from: &str, alias: &str, key: &KeyMatch) -> Statement {
    let mut p = Predicates::new();
    key.apply(alias, &mut p);
    p.finish(&select(columns, from), None, Page::new(Some(1), None))
}

/// `SELECT <owner>, <columns> FROM <join> j JOIN <target> <alias>` restricted
/// to a batch of owners bound as `$1`.
fn join_select(join: JoinTable, target: &str, alias: &str, columns: &str) -> String {
    format!(
        r#"SELECT j."{owner}" AS owner, {columns} FROM "{name}" j JOIN "{target}" {alias} ON {alias}.id = j."{tgt}" WHERE j."{owner}" = ANY($1) ORDER BY j."{owner}", {alias}.id"#,
        owner = join.owner,
        name = join.name,
        tgt = join.target,
    )
}

const SECTION_COLUMNS: &str = "s.id, COALESCE(s.name, '') AS name, COALESCE(s.slug, '') AS slug, COALESCE(s.state, '') AS state";
const CATEGORY_COLUMNS: &str = r#"c.id, COALESCE(c.name, '') AS name, COALESCE(c.slug, '') AS slug, COALESCE(c.state, '') AS state, COALESCE(c."isMemberOnly", false) AS "isMemberOnly""#;
const CONTACT_COLUMNS: &str = "c.id, COALESCE(c.name, '') AS name";
const TAG_COLUMNS: &str = "tg.id, COALESCE(tg.name, '') AS name, COALESCE(tg.slug, '') AS slug";

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    args: Vec<SqlArg>,
) -> Query<'q, Postgres, PgArguments> {
    for arg in args {
        query = match arg {
            SqlArg::Text(v) => query.bind(v),
            SqlArg::TextList(v) => query.bind(v),
            SqlArg::Bool(v) => query.bind(v),
            SqlArg::Id(v) => query.bind(v),
            SqlArg::Int(v) => query.bind(v),
            SqlArg::Timestamp(v) => query.bind(v),
        };
    }
    query
}

fn id_string(row: &PgRow) -> Result<(DbId, String), sqlx::Error> {
    let id: DbId = row.try_get("id")?;
    Ok((id, id.to_string()))
}

fn timestamp(row: &PgRow, column: &str) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    Ok(row
        .try_get::<Option<NaiveDateTime>, _>(column)?
        .map(|ts| ts.and_utc()))
}

/// Foreign key column; zero is treated as absent.
fn link(row: &PgRow, column: &str) -> Result<Option<DbId>, sqlx::Error> {
    Ok(row.try_get::<Option<DbId>, _>(column)?.filter(|id| *id > 0))
}

fn json(row: &PgRow, column: &str) -> Result<Option<Value>, sqlx::Error> {
    Ok(row
        .try_get::<Option<Value>, _>(column)?
        .filter(|v| !v.is_null()))
}

fn decode_article(row: &PgRow) -> Result<ArticleRow, sqlx::Error> {
    let (id, id_str) = id_string(row)?;
    let article = Article {
        id: id_str,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        subtitle: row.try_get("subtitle")?,
        state: row.try_get("state")?,
        style: row.try_get("style")?,
        published_date: timestamp(row, "publishedDate")?,
        updated_at: timestamp(row, "updatedAt")?,
        is_member: row.try_get("isMember")?,
        is_adult: row.try_get("isAdult")?,
        extend_byline: row.try_get("extend_byline")?,
        hero_caption: row.try_get("heroCaption")?,
        brief: json(row, "brief")?,
        content: json(row, "content")?,
        redirect: row.try_get("redirect")?,
        og_title: row.try_get("og_title")?,
        og_description: row.try_get("og_description")?,
        hidden_advertised: row.try_get("hiddenAdvertised")?,
        is_advertised: row.try_get("isAdvertised")?,
        is_featured: row.try_get("isFeatured")?,
        ..Default::default()
    };
    let links = ArticleLinks {
        hero_image: link(row, "heroImage")?,
        og_image: link(row, "og_image")?,
        hero_video: link(row, "heroVideo")?,
        topic: link(row, "topics")?,
        relateds_one: link(row, "relatedsOne")?,
        relateds_two: link(row, "relatedsTwo")?,
    };
    Ok(ArticleRow { id, article, links })
}

fn decode_external(row: &PgRow) -> Result<ExternalRow, sqlx::Error> {
    let (id, id_str) = id_string(row)?;
    let item = ExternalItem {
        id: id_str,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        state: row.try_get("state")?,
        published_date: timestamp(row, "publishedDate")?,
        extend_byline: row.try_get("extend_byline")?,
        thumb: row.try_get("thumb")?,
        thumb_caption: row.try_get("thumbCaption")?,
        brief: row.try_get("brief")?,
        content: row.try_get("content")?,
        updated_at: timestamp(row, "updatedAt")?,
        ..Default::default()
    };
    Ok(ExternalRow {
        id,
        item,
        partner: link(row, "partner")?,
    })
}

fn decode_topic(row: &PgRow) -> Result<TopicRow, sqlx::Error> {
    let (id, id_str) = id_string(row)?;
    let topic = Topic {
        id: id_str,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        sort_order: row.try_get("sortOrder")?,
        state: row.try_get("state")?,
        brief: json(row, "brief")?,
        hero_url: row.try_get("heroUrl")?,
        leading: row.try_get("leading")?,
        og_title: row.try_get("og_title")?,
        og_description: row.try_get("og_description")?,
        is_featured: row.try_get("isFeatured")?,
        title_style: row.try_get("title_style")?,
        kind: row.try_get("type")?,
        style: row.try_get("style")?,
        javascript: row.try_get("javascript")?,
        dfp: row.try_get("dfp")?,
        mobile_dfp: row.try_get("mobile_dfp")?,
        created_at: timestamp(row, "createdAt")?,
        updated_at: timestamp(row, "updatedAt")?,
        ..Default::default()
    };
    Ok(TopicRow {
        id,
        topic,
        hero_image: link(row, "heroImage")?,
        og_image: link(row, "og_image")?,
    })
}

fn decode_summary(row: &PgRow) -> Result<Record<SummaryRecord>, sqlx::Error> {
    let (id, id_str) = id_string(row)?;
    Ok(Record {
        id,
        value: SummaryRecord {
            summary: RelatedArticle {
                id: id_str,
                slug: row.try_get("slug")?,
                title: row.try_get("title")?,
                hero_image: None,
            },
            hero_image: link(row, "heroImage")?,
        },
    })
}

fn linked<T>(
    row: &PgRow,
    decode: impl Fn(&PgRow, String) -> Result<T, sqlx::Error>,
) -> Result<Linked<T>, sqlx::Error> {
    let owner: DbId = row.try_get("owner")?;
    let (id, id_str) = id_string(row)?;
    Ok(Linked {
        owner,
        id,
        value: decode(row, id_str)?,
    })
}

fn section(row: &PgRow, id: String) -> Result<Section, sqlx::Error> {
    Ok(Section {
        id,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        state: row.try_get("state")?,
    })
}

fn decode_all<T>(
    rows: &[PgRow],
    decode: impl Fn(&PgRow) -> Result<T, sqlx::Error>,
) -> QueryResult<Vec<T>> {
    Ok(rows.iter().map(decode).collect::<Result<Vec<_>, _>>()?)
}

/// Content source over a Postgres pool.
#[derive(Clone)]
pub struct PgSource {
    pool: Pool,
}

impl PgSource {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, stmt: Statement) -> QueryResult<Vec<PgRow>> {
        debug!(sql = %stmt.sql, args = stmt.args.len(), "primary query");
        let Statement { sql, args, .. } = stmt;
        let rows = bind_all(sqlx::query(&sql), args)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count(&self, stmt: Statement) -> QueryResult<i64> {
        debug!(sql = %stmt.sql, args = stmt.args.len(), "count query");
        let Statement { sql, args, .. } = stmt;
        let row = bind_all(sqlx::query(&sql), args)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    async fn by_ids(&self, sql: &str, ids: &[DbId]) -> QueryResult<Vec<PgRow>> {
        let rows = sqlx::query(sql).bind(ids).fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

#[async_trait]
impl ContentSource for PgSource {
    #[instrument(skip_all)]
    async fn articles(
        &self,
        filter: &ArticleWhere,
        order: &OrderClause,
        page: Page,
    ) -> QueryResult<Vec<ArticleRow>> {
        let rows = self.fetch(article_select(filter, order, page)).await?;
        decode_all(&rows, decode_article)
    }

    #[instrument(skip_all)]
    async fn count_articles(&self, filter: &ArticleWhere) -> QueryResult<i64> {
        self.count(article_count(filter)).await
    }

    #[instrument(skip_all)]
    async fn article_by_key(&self, key: &KeyMatch) -> QueryResult<Option<ArticleRow>> {
        let stmt = unique(ARTICLE_COLUMNS, r#""Post" p"#, "p", key);
        let rows = self.fetch(stmt).await?;
        rows.first()
            .map(decode_article)
            .transpose()
            .map_err(Into::into)
    }

    #[instrument(skip_all)]
    async fn external_items(
        &self,
        filter: &ExternalWhere,
        order: &OrderClause,
        page: Page,
    ) -> QueryResult<Vec<ExternalRow>> {
        let rows = self.fetch(external_select(filter, order, page)).await?;
        decode_all(&rows, decode_external)
    }

    #[instrument(skip_all)]
    async fn count_external_items(&self, filter: &ExternalWhere) -> QueryResult<i64> {
        self.count(external_count(filter)).await
    }

    #[instrument(skip_all)]
    async fn topics(
        &self,
        filter: &TopicWhere,
        order: &OrderClause,
        page: Page,
    ) -> QueryResult<Vec<TopicRow>> {
        let rows = self.fetch(topic_select(filter, order, page)).await?;
        decode_all(&rows, decode_topic)
    }

    #[instrument(skip_all)]
    async fn count_topics(&self, filter: &TopicWhere) -> QueryResult<i64> {
        self.count(topic_count(filter)).await
    }

    #[instrument(skip_all)]
    async fn topic_by_key(&self, key: &KeyMatch) -> QueryResult<Option<TopicRow>> {
        let stmt = unique(TOPIC_COLUMNS, r#""Topic" t"#, "t", key);
        let rows = self.fetch(stmt).await?;
        rows.first()
            .map(decode_topic)
            .transpose()
            .map_err(Into::into)
    }

    #[instrument(skip_all, fields(n = articles.len()))]
    async fn sections(&self, articles: &[DbId]) -> QueryResult<Vec<Linked<Section>>> {
        let sql = join_select(POST_SECTIONS, "Section", "s", SECTION_COLUMNS);
        let rows = self.by_ids(&sql, articles).await?;
        decode_all(&rows, |row| linked(row, section))
    }

    #[instrument(skip_all, fields(n = articles.len()))]
    async fn categories(&self, articles: &[DbId]) -> QueryResult<Vec<Linked<Category>>> {
        let sql = join_select(POST_CATEGORIES, "Category", "c", CATEGORY_COLUMNS);
        let rows = self.by_ids(&sql, articles).await?;
        decode_all(&rows, |row| {
            linked(row, |row, id| {
                Ok(Category {
                    id,
                    name: row.try_get("name")?,
                    slug: row.try_get("slug")?,
                    state: row.try_get("state")?,
                    is_member_only: row.try_get("isMemberOnly")?,
                    sections: Vec::new(),
                })
            })
        })
    }

    #[instrument(skip_all, fields(n = categories.len()))]
    async fn category_sections(&self, categories: &[DbId]) -> QueryResult<Vec<Linked<Section>>> {
        let sql = join_select(CATEGORY_SECTIONS, "Section", "s", SECTION_COLUMNS);
        let rows = self.by_ids(&sql, categories).await?;
        decode_all(&rows, |row| linked(row, section))
    }

    #[instrument(skip_all, fields(role = role.as_str(), n = articles.len()))]
    async fn contributors(
        &self,
        role: ContributorRole,
        articles: &[DbId],
    ) -> QueryResult<Vec<Linked<Contributor>>> {
        let sql = join_select(role.join_table(), "Contact", "c", CONTACT_COLUMNS);
        let rows = self.by_ids(&sql, articles).await?;
        decode_all(&rows, |row| {
            linked(row, |row, id| {
                Ok(Contributor {
                    id,
                    name: row.try_get("name")?,
                })
            })
        })
    }

    #[instrument(skip_all, fields(relation = relation.as_str(), n = owners.len()))]
    async fn tags(&self, relation: TagRelation, owners: &[DbId]) -> QueryResult<Vec<Linked<Tag>>> {
        let sql = join_select(relation.join_table(), "Tag", "tg", TAG_COLUMNS);
        let rows = self.by_ids(&sql, owners).await?;
        decode_all(&rows, |row| {
            linked(row, |row, id| {
                Ok(Tag {
                    id,
                    name: row.try_get("name")?,
                    slug: row.try_get("slug")?,
                })
            })
        })
    }

    #[instrument(skip_all, fields(n = articles.len()))]
    async fn related_edges(&self, articles: &[DbId]) -> QueryResult<Vec<RelatedEdge>> {
        let sql = format!(
            r#"SELECT "A" AS a, "B" AS b FROM "{t}" WHERE "A" = ANY($1) UNION SELECT "A" AS a, "B" AS b FROM "{t}" WHERE "B" = ANY($1)"#,
            t = POST_RELATEDS.name
        );
        let rows = self.by_ids(&sql, articles).await?;
        decode_all(&rows, |row| {
            Ok(RelatedEdge {
                a: row.try_get("a")?,
                b: row.try_get("b")?,
            })
        })
    }

    #[instrument(skip_all, fields(n = ids.len()))]
    async fn article_summaries(&self, ids: &[DbId]) -> QueryResult<Vec<Record<SummaryRecord>>> {
        let sql = format!(
            r#"SELECT {SUMMARY_COLUMNS} FROM "Post" p WHERE p.id = ANY($1) ORDER BY p.id"#
        );
        let rows = self.by_ids(&sql, ids).await?;
        decode_all(&rows, decode_summary)
    }

    #[instrument(skip_all, fields(n = topics.len()))]
    async fn topic_articles(&self, topics: &[DbId]) -> QueryResult<Vec<Linked<SummaryRecord>>> {
        let sql = format!(
            r#"SELECT p.topics AS owner, {SUMMARY_COLUMNS} FROM "Post" p WHERE p.topics = ANY($1) AND p.state = $2 ORDER BY p.topics, p."publishedDate" DESC NULLS LAST, p.id"#
        );
        let rows = sqlx::query(&sql)
            .bind(topics)
            .bind(PUBLISHED)
            .fetch_all(&self.pool)
            .await?;
        decode_all(&rows, |row| {
            let owner: DbId = row.try_get("owner")?;
            let Record { id, value } = decode_summary(row)?;
            Ok(Linked { owner, id, value })
        })
    }

    #[instrument(skip_all, fields(n = ids.len()))]
    async fn videos(&self, ids: &[DbId]) -> QueryResult<Vec<Record<VideoRecord>>> {
        let sql = r#"SELECT v.id, COALESCE(v."urlOriginal", '') AS "urlOriginal", v."heroImage" FROM "Video" v WHERE v.id = ANY($1)"#;
        let rows = self.by_ids(sql, ids).await?;
        decode_all(&rows, |row| {
            let (id, id_str) = id_string(row)?;
            Ok(Record {
                id,
                value: VideoRecord {
                    video: Video {
                        id: id_str,
                        video_src: row.try_get("urlOriginal")?,
                        hero_image: None,
                    },
                    hero_image: link(row, "heroImage")?,
                },
            })
        })
    }

    #[instrument(skip_all, fields(n = ids.len()))]
    async fn topic_summaries(&self, ids: &[DbId]) -> QueryResult<Vec<TopicSummaryRecord>> {
        let sql = r#"SELECT t.id, COALESCE(t.slug, '') AS slug, COALESCE(t.name, '') AS name FROM "Topic" t WHERE t.id = ANY($1)"#;
        let rows = self.by_ids(sql, ids).await?;
        decode_all(&rows, |row| {
            let (id, id_str) = id_string(row)?;
            Ok(Record {
                id,
                value: TopicSummary {
                    id: id_str,
                    slug: row.try_get("slug")?,
                    name: row.try_get("name")?,
                },
            })
        })
    }

    #[instrument(skip_all, fields(n = ids.len()))]
    async fn partners(&self, ids: &[DbId]) -> QueryResult<Vec<PartnerRecord>> {
        let sql = r#"SELECT pa.id, COALESCE(pa.slug, '') AS slug, COALESCE(pa.name, '') AS name, COALESCE(pa."showOnIndex", false) AS "showOnIndex", COALESCE(pa."showThumb", true) AS "showThumb", COALESCE(pa."showBrief", false) AS "showBrief" FROM "Partner" pa WHERE pa.id = ANY($1)"#;
        let rows = self.by_ids(sql, ids).await?;
        decode_all(&rows, |row| {
            let (id, id_str) = id_string(row)?;
            Ok(Record {
                id,
                value: Partner {
                    id: id_str,
                    slug: row.try_get("slug")?,
                    name: row.try_get("name")?,
                    show_on_index: row.try_get("showOnIndex")?,
                    show_thumb: row.try_get("showThumb")?,
                    show_brief: row.try_get("showBrief")?,
                },
            })
        })
    }

    #[instrument(skip_all, fields(n = topics.len()))]
    async fn slideshow_links(&self, topics: &[DbId]) -> QueryResult<Vec<Link>> {
        let join = TOPIC_SLIDESHOW_IMAGES;
        let sql = format!(
            r#"SELECT j."{owner}" AS owner, j."{target}" AS target FROM "{name}" j WHERE j."{owner}" = ANY($1) ORDER BY j."{owner}", j."{target}""#,
            owner = join.owner,
            target = join.target,
            name = join.name,
        );
        let rows = self.by_ids(&sql, topics).await?;
        decode_all(&rows, |row| {
            Ok(Link {
                owner: row.try_get("owner")?,
                target: row.try_get("target")?,
            })
        })
    }

    #[instrument(skip_all, fields(n = ids.len()))]
    async fn images(&self, ids: &[DbId]) -> QueryResult<Vec<ImageRecord>> {
        let sql = r#"SELECT im.id, COALESCE(im."imageFile_id", '') AS file_id, COALESCE(im."imageFile_extension", '') AS extension, im."imageFile_width" AS width, im."imageFile_height" AS height FROM "Image" im WHERE im.id = ANY($1)"#;
        let rows = self.by_ids(sql, ids).await?;
        decode_all(&rows, |row| {
            Ok(ImageRecord {
                id: row.try_get("id")?,
                file_id: row.try_get("file_id")?,
                extension: row.try_get("extension")?,
                width: row.try_get("width")?,
                height: row.try_get("height")?,
            })
        })
    }
}
