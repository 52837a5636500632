//! Table names and join-table layouts of the content schema.
//!
//! Join tables hold two columns, `A` and `B`, where `A` references the model
//! whose name sorts first. `owner` is the column holding the id we start
//! from, `target` the one we resolve.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinTable {
    pub name: &'static str,
    pub owner: &'static str,
    pub target: &'static str,
}

impl JoinTable {
    const fn new(name: &'static str, owner: &'static str, target: &'static str) -> Self {
        Self {
            name,
            owner,
            target,
        }
    }
}

pub const POST_SECTIONS: JoinTable = JoinTable::new("_Post_sections", "A", "B");
pub const POST_CATEGORIES: JoinTable = JoinTable::new("_Category_posts", "B", "A");
pub const CATEGORY_SECTIONS: JoinTable = JoinTable::new("_Category_sections", "A", "B");
pub const POST_TAGS: JoinTable = JoinTable::new("_Post_tags", "A", "B");
pub const POST_TAGS_ALGO: JoinTable = JoinTable::new("_Post_tags_algo", "A", "B");
/// Self relation: both columns are owners.
pub const POST_RELATEDS: JoinTable = JoinTable::new("_Post_relateds", "A", "B");
pub const EXTERNAL_TAGS: JoinTable = JoinTable::new("_External_tags", "A", "B");
/// Topic relations are stored without the leading underscore and keep the
/// topic in `A`.
pub const TOPIC_TAGS: JoinTable = JoinTable::new("Tag_topics", "A", "B");
pub const TOPIC_SLIDESHOW_IMAGES: JoinTable = JoinTable::new("Topic_slideshow_images", "A", "B");

/// Role-qualified contributor relations of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContributorRole {
    Writer,
    Photographer,
    Camera,
    Designer,
    Engineer,
    Vocal,
}

impl ContributorRole {
    pub const ALL: [ContributorRole; 6] = [
        ContributorRole::Writer,
        ContributorRole::Photographer,
        ContributorRole::Camera,
        ContributorRole::Designer,
        ContributorRole::Engineer,
        ContributorRole::Vocal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContributorRole::Writer => "writers",
            ContributorRole::Photographer => "photographers",
            ContributorRole::Camera => "camera_man",
            ContributorRole::Designer => "designers",
            ContributorRole::Engineer => "engineers",
            ContributorRole::Vocal => "vocals",
        }
    }

    /// `Contact` sorts before `Post`, so the article id sits in `B`.
    pub fn join_table(&self) -> JoinTable {
        let name = match self {
            ContributorRole::Writer => "_Post_writers",
            ContributorRole::Photographer => "_Post_photographers",
            ContributorRole::Camera => "_Post_camera_man",
            ContributorRole::Designer => "_Post_designers",
            ContributorRole::Engineer => "_Post_engineers",
            ContributorRole::Vocal => "_Post_vocals",
        };
        JoinTable::new(name, "B", "A")
    }
}

/// The independent tag relations in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagRelation {
    Article,
    ArticleAlgo,
    External,
    Topic,
}

impl TagRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagRelation::Article => "tags",
            TagRelation::ArticleAlgo => "tags_algo",
            TagRelation::External => "external_tags",
            TagRelation::Topic => "topic_tags",
        }
    }

    pub fn join_table(&self) -> JoinTable {
        match self {
            TagRelation::Article => POST_TAGS,
            TagRelation::ArticleAlgo => POST_TAGS_ALGO,
            TagRelation::External => EXTERNAL_TAGS,
            TagRelation::Topic => TOPIC_TAGS,
        }
    }
}
