//! Hydrated entities returned by the query surface.
//!
//! Field names serialize the way the external API exposes them, which mixes
//! camelCase with a handful of legacy snake_case names.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    pub width: i32,
    pub height: i32,
}

/// Derived variant URLs for one stored image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resized {
    pub original: String,
    pub w480: String,
    pub w800: String,
    pub w1200: String,
    pub w1600: String,
    pub w2400: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub image_file: ImageFile,
    pub resized: Resized,
    pub resized_webp: Resized,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub state: String,
    pub is_member_only: bool,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub video_src: String,
    pub hero_image: Option<Photo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub show_on_index: bool,
    pub show_thumb: bool,
    pub show_brief: bool,
}

/// The slice of a topic attached to an article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub id: String,
    pub slug: String,
    pub name: String,
}

/// Narrow article projection used for related articles and topic members.
/// Never enriched beyond its hero image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedArticle {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub hero_image: Option<Photo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub state: String,
    pub style: String,
    #[serde(with = "timestamp")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    pub is_member: bool,
    pub is_adult: bool,
    pub sections: Vec<Section>,
    pub categories: Vec<Category>,
    pub writers: Vec<Contributor>,
    pub photographers: Vec<Contributor>,
    #[serde(rename = "camera_man")]
    pub camera_man: Vec<Contributor>,
    pub designers: Vec<Contributor>,
    pub engineers: Vec<Contributor>,
    pub vocals: Vec<Contributor>,
    #[serde(rename = "extend_byline")]
    pub extend_byline: String,
    pub tags: Vec<Tag>,
    #[serde(rename = "tags_algo")]
    pub tags_algo: Vec<Tag>,
    pub hero_video: Option<Video>,
    pub hero_image: Option<Photo>,
    pub hero_caption: String,
    pub brief: Option<Value>,
    pub content: Option<Value>,
    pub relateds: Vec<RelatedArticle>,
    pub relateds_one: Option<RelatedArticle>,
    pub relateds_two: Option<RelatedArticle>,
    pub redirect: String,
    #[serde(rename = "og_title")]
    pub og_title: String,
    #[serde(rename = "og_image")]
    pub og_image: Option<Photo>,
    #[serde(rename = "og_description")]
    pub og_description: String,
    pub hidden_advertised: bool,
    pub is_advertised: bool,
    pub is_featured: bool,
    pub topics: Option<TopicSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalItem {
    pub id: String,
    pub slug: String,
    pub partner: Option<Partner>,
    pub title: String,
    pub state: String,
    #[serde(with = "timestamp")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(rename = "extend_byline")]
    pub extend_byline: String,
    pub thumb: String,
    pub thumb_caption: String,
    pub brief: String,
    pub content: String,
    #[serde(with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub sort_order: Option<i32>,
    pub state: String,
    pub brief: Option<Value>,
    pub hero_image: Option<Photo>,
    pub hero_url: String,
    pub leading: String,
    #[serde(rename = "og_title")]
    pub og_title: String,
    #[serde(rename = "og_description")]
    pub og_description: String,
    #[serde(rename = "og_image")]
    pub og_image: Option<Photo>,
    pub is_featured: bool,
    #[serde(rename = "title_style")]
    pub title_style: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub style: String,
    pub tags: Vec<Tag>,
    #[serde(rename = "slideshow_images")]
    pub slideshow_images: Vec<Photo>,
    pub posts: Vec<RelatedArticle>,
    pub javascript: String,
    pub dfp: String,
    #[serde(rename = "mobile_dfp")]
    pub mobile_dfp: String,
    #[serde(with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Optional UTC timestamps rendered with millisecond precision
/// (`2024-05-01T08:30:00.000Z`).
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
