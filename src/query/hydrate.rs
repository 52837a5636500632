//! Batched relation loading.
//!
//! Every relation kind is fetched once per batch with the union of the keys
//! its rows need, then re-attached from in-memory maps. The number of
//! round-trips depends on the number of relation kinds, never on batch size.
//! Any failing relation query fails the whole batch.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;

use futures::future::try_join_all;
use futures::try_join;
use tracing::instrument;

use crate::db::{
    ArticleRow, ContentSource, ContributorRole, DbId, ExternalRow, Link, Linked, Record,
    RelatedEdge, SummaryRecord, TagRelation, TopicRow,
};
use crate::error::QueryResult;
use crate::media::{ImageRecord, MediaHost};
use crate::model::{Article, Contributor, ExternalItem, Photo, RelatedArticle, Topic};

/// Distinct positive ids, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet(Vec<DbId>);

impl KeySet {
    pub fn ids(&self) -> &[DbId] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, id: DbId) -> bool {
        self.0.binary_search(&id).is_ok()
    }
}

impl FromIterator<DbId> for KeySet {
    fn from_iter<I: IntoIterator<Item = DbId>>(iter: I) -> Self {
        let set: BTreeSet<DbId> = iter.into_iter().filter(|id| *id > 0).collect();
        KeySet(set.into_iter().collect())
    }
}

/// Run `fetch` for `keys`, skipping the round-trip when there is nothing to
/// look up.
pub async fn load<'a, T, F, Fut>(keys: &'a KeySet, fetch: F) -> QueryResult<Vec<T>>
where
    F: FnOnce(&'a [DbId]) -> Fut,
    Fut: Future<Output = QueryResult<Vec<T>>>,
{
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    fetch(keys.ids()).await
}

/// Owner id to related values, in load order.
#[derive(Debug, Clone)]
pub struct Grouped<T> {
    by_owner: HashMap<DbId, Vec<(DbId, T)>>,
}

impl<T: Clone> Grouped<T> {
    pub fn entries(&self, owner: DbId) -> &[(DbId, T)] {
        self.by_owner.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn values(&self, owner: DbId) -> Vec<T> {
        self.entries(owner).iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn all_values(&self) -> impl Iterator<Item = &T> {
        self.by_owner.values().flatten().map(|(_, v)| v)
    }

    /// Ids of every related value, across owners.
    pub fn targets(&self) -> KeySet {
        self.by_owner
            .values()
            .flat_map(|entries| entries.iter().map(|(id, _)| *id))
            .collect()
    }
}

impl<T> FromIterator<Linked<T>> for Grouped<T> {
    fn from_iter<I: IntoIterator<Item = Linked<T>>>(iter: I) -> Self {
        let mut by_owner: HashMap<DbId, Vec<(DbId, T)>> = HashMap::new();
        for Linked { owner, id, value } in iter {
            by_owner.entry(owner).or_default().push((id, value));
        }
        Grouped { by_owner }
    }
}

/// Id to a single value.
#[derive(Debug, Clone)]
pub struct Indexed<T> {
    by_id: HashMap<DbId, T>,
}

impl<T: Clone> Indexed<T> {
    pub fn get(&self, id: Option<DbId>) -> Option<T> {
        id.and_then(|id| self.by_id.get(&id).cloned())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.by_id.values()
    }
}

impl<T> FromIterator<Record<T>> for Indexed<T> {
    fn from_iter<I: IntoIterator<Item = Record<T>>>(iter: I) -> Self {
        Indexed {
            by_id: iter.into_iter().map(|r| (r.id, r.value)).collect(),
        }
    }
}

/// Neighbours of each batch member under an undirected edge set, deduplicated
/// and ordered by id.
pub fn symmetric_adjacency(edges: &[RelatedEdge], batch: &KeySet) -> BTreeMap<DbId, Vec<DbId>> {
    let mut adjacency: BTreeMap<DbId, BTreeSet<DbId>> = BTreeMap::new();
    for edge in edges {
        if batch.contains(edge.a) {
            adjacency.entry(edge.a).or_default().insert(edge.b);
        }
        if batch.contains(edge.b) {
            adjacency.entry(edge.b).or_default().insert(edge.a);
        }
    }
    adjacency
        .into_iter()
        .map(|(id, neighbours)| (id, neighbours.into_iter().collect()))
        .collect()
}

/// Resolved photos by image id.
struct Photos(HashMap<DbId, Photo>);

impl Photos {
    fn new(media: &MediaHost, images: &[ImageRecord]) -> Self {
        Photos(images.iter().map(|im| (im.id, media.photo(im))).collect())
    }

    fn get(&self, id: Option<DbId>) -> Option<Photo> {
        id.and_then(|id| self.0.get(&id).cloned())
    }
}

fn narrow(record: &SummaryRecord, photos: &Photos) -> RelatedArticle {
    RelatedArticle {
        hero_image: photos.get(record.hero_image),
        ..record.summary.clone()
    }
}

#[instrument(skip_all, fields(n = rows.len()))]
pub async fn hydrate_articles(
    src: &dyn ContentSource,
    media: &MediaHost,
    rows: Vec<ArticleRow>,
) -> QueryResult<Vec<Article>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let owners: KeySet = rows.iter().map(|r| r.id).collect();
    let video_ids: KeySet = rows.iter().filter_map(|r| r.links.hero_video).collect();
    let topic_ids: KeySet = rows.iter().filter_map(|r| r.links.topic).collect();

    let roles = try_join_all(
        ContributorRole::ALL.map(|role| load(&owners, move |ids| src.contributors(role, ids))),
    );
    let (sections, categories, roles, tags, tags_algo, edges, videos, topics) = try_join!(
        load(&owners, |ids| src.sections(ids)),
        load(&owners, |ids| src.categories(ids)),
        roles,
        load(&owners, |ids| src.tags(TagRelation::Article, ids)),
        load(&owners, |ids| src.tags(TagRelation::ArticleAlgo, ids)),
        load(&owners, |ids| src.related_edges(ids)),
        load(&video_ids, |ids| src.videos(ids)),
        load(&topic_ids, |ids| src.topic_summaries(ids)),
    )?;
    let sections: Grouped<_> = sections.into_iter().collect();
    let categories: Grouped<_> = categories.into_iter().collect();
    let contributors: HashMap<ContributorRole, Grouped<Contributor>> = ContributorRole::ALL
        .into_iter()
        .zip(roles)
        .map(|(role, linked)| (role, linked.into_iter().collect()))
        .collect();
    let tags: Grouped<_> = tags.into_iter().collect();
    let tags_algo: Grouped<_> = tags_algo.into_iter().collect();
    let videos: Indexed<_> = videos.into_iter().collect();
    let topics: Indexed<_> = topics.into_iter().collect();
    let neighbours = symmetric_adjacency(&edges, &owners);

    let summary_ids: KeySet = rows
        .iter()
        .flat_map(|r| [r.links.relateds_one, r.links.relateds_two])
        .flatten()
        .chain(neighbours.values().flatten().copied())
        .collect();
    let category_ids = categories.targets();
    let (summaries, category_sections) = try_join!(
        load(&summary_ids, |ids| src.article_summaries(ids)),
        load(&category_ids, |ids| src.category_sections(ids)),
    )?;
    let summaries: Indexed<SummaryRecord> = summaries.into_iter().collect();
    let category_sections: Grouped<_> = category_sections.into_iter().collect();

    let image_ids: KeySet = rows
        .iter()
        .flat_map(|r| [r.links.hero_image, r.links.og_image])
        .flatten()
        .chain(summaries.values().filter_map(|s| s.hero_image))
        .chain(videos.values().filter_map(|v| v.hero_image))
        .collect();
    let images = load(&image_ids, |ids| src.images(ids)).await?;
    let photos = Photos::new(media, &images);

    let role_values = |role: ContributorRole, owner: DbId| {
        contributors
            .get(&role)
            .map(|g| g.values(owner))
            .unwrap_or_default()
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let ArticleRow {
                id,
                mut article,
                links,
            } = row;
            article.sections = sections.values(id);
            article.categories = categories
                .entries(id)
                .iter()
                .map(|(category_id, category)| {
                    let mut category = category.clone();
                    category.sections = category_sections.values(*category_id);
                    category
                })
                .collect();
            article.writers = role_values(ContributorRole::Writer, id);
            article.photographers = role_values(ContributorRole::Photographer, id);
            article.camera_man = role_values(ContributorRole::Camera, id);
            article.designers = role_values(ContributorRole::Designer, id);
            article.engineers = role_values(ContributorRole::Engineer, id);
            article.vocals = role_values(ContributorRole::Vocal, id);
            article.tags = tags.values(id);
            article.tags_algo = tags_algo.values(id);
            article.hero_video = videos.get(links.hero_video).map(|record| {
                let mut video = record.video;
                video.hero_image = photos.get(record.hero_image);
                video
            });
            article.hero_image = photos.get(links.hero_image);
            article.og_image = photos.get(links.og_image);
            article.relateds = neighbours
                .get(&id)
                .into_iter()
                .flatten()
                .filter_map(|n| summaries.get(Some(*n)))
                .map(|s| narrow(&s, &photos))
                .collect();
            article.relateds_one = summaries
                .get(links.relateds_one)
                .map(|s| narrow(&s, &photos));
            article.relateds_two = summaries
                .get(links.relateds_two)
                .map(|s| narrow(&s, &photos));
            article.topics = topics.get(links.topic);
            article
        })
        .collect())
}

#[instrument(skip_all, fields(n = rows.len()))]
pub async fn hydrate_external_items(
    src: &dyn ContentSource,
    rows: Vec<ExternalRow>,
) -> QueryResult<Vec<ExternalItem>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let owners: KeySet = rows.iter().map(|r| r.id).collect();
    let partner_ids: KeySet = rows.iter().filter_map(|r| r.partner).collect();
    let (partners, tags) = try_join!(
        load(&partner_ids, |ids| src.partners(ids)),
        load(&owners, |ids| src.tags(TagRelation::External, ids)),
    )?;
    let partners: Indexed<_> = partners.into_iter().collect();
    let tags: Grouped<_> = tags.into_iter().collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let mut item = row.item;
            item.partner = partners.get(row.partner);
            item.tags = tags.values(row.id);
            item
        })
        .collect())
}

#[instrument(skip_all, fields(n = rows.len()))]
pub async fn hydrate_topics(
    src: &dyn ContentSource,
    media: &MediaHost,
    rows: Vec<TopicRow>,
) -> QueryResult<Vec<Topic>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let owners: KeySet = rows.iter().map(|r| r.id).collect();
    let (tags, slides, members) = try_join!(
        load(&owners, |ids| src.tags(TagRelation::Topic, ids)),
        load(&owners, |ids| src.slideshow_links(ids)),
        load(&owners, |ids| src.topic_articles(ids)),
    )?;
    let tags: Grouped<_> = tags.into_iter().collect();
    let slides: Grouped<()> = slides
        .into_iter()
        .map(|Link { owner, target }| Linked {
            owner,
            id: target,
            value: (),
        })
        .collect();
    let members: Grouped<SummaryRecord> = members.into_iter().collect();

    let image_ids: KeySet = rows
        .iter()
        .flat_map(|r| [r.hero_image, r.og_image])
        .flatten()
        .chain(slides.targets().ids().iter().copied())
        .chain(members.all_values().filter_map(|m| m.hero_image))
        .collect();
    let images = load(&image_ids, |ids| src.images(ids)).await?;
    let photos = Photos::new(media, &images);

    Ok(rows
        .into_iter()
        .map(|row| {
            let mut topic = row.topic;
            topic.hero_image = photos.get(row.hero_image);
            topic.og_image = photos.get(row.og_image);
            topic.tags = tags.values(row.id);
            topic.slideshow_images = slides
                .entries(row.id)
                .iter()
                .filter_map(|(image, _)| photos.get(Some(*image)))
                .collect();
            topic.posts = members
                .entries(row.id)
                .iter()
                .map(|(_, m)| narrow(m, &photos))
                .collect();
            topic
        })
        .collect())
}
