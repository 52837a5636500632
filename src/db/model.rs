//! Row records returned by content sources.
//!
//! Primary rows carry their foreign keys in a link record instead of resolved
//! values; the hydration layer turns those keys into batched lookups.

use crate::model::{Article, ExternalItem, Partner, RelatedArticle, Topic, TopicSummary, Video};

/// Integer primary key as stored in the content tables.
pub type DbId = i32;

/// Foreign keys of one article row. `None` means no relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleLinks {
    pub hero_image: Option<DbId>,
    pub og_image: Option<DbId>,
    pub hero_video: Option<DbId>,
    pub topic: Option<DbId>,
    pub relateds_one: Option<DbId>,
    pub relateds_two: Option<DbId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleRow {
    pub id: DbId,
    pub article: Article,
    pub links: ArticleLinks,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalRow {
    pub id: DbId,
    pub item: ExternalItem,
    pub partner: Option<DbId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicRow {
    pub id: DbId,
    pub topic: Topic,
    pub hero_image: Option<DbId>,
    pub og_image: Option<DbId>,
}

/// A related value reached through a join table, tagged with the owner it
/// belongs to and its own id.
#[derive(Debug, Clone, PartialEq)]
pub struct Linked<T> {
    pub owner: DbId,
    pub id: DbId,
    pub value: T,
}

/// A value fetched by its own id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub id: DbId,
    pub value: T,
}

/// Raw join-table pair without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub owner: DbId,
    pub target: DbId,
}

/// One undirected related-article edge, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelatedEdge {
    pub a: DbId,
    pub b: DbId,
}

/// Narrow article projection plus the hero image key still to resolve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryRecord {
    pub summary: RelatedArticle,
    pub hero_image: Option<DbId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoRecord {
    pub video: Video,
    pub hero_image: Option<DbId>,
}

pub type PartnerRecord = Record<Partner>;
pub type TopicSummaryRecord = Record<TopicSummary>;
