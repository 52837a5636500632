//! Typed filter trees and their translation into SQL predicates.
//!
//! Each `where` input decodes with unknown fields rejected, so a malformed
//! argument fails before any predicate is built. Absent branches add nothing.
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::db::schema::{JoinTable, POST_CATEGORIES, POST_SECTIONS};
use crate::db::statement::{Predicates, SqlArg};
use crate::error::{QueryError, QueryResult};

/// A top-level `where` input for one entity kind.
pub trait Filter: Serialize + DeserializeOwned + Default + Clone + Send + Sync {
    /// Name used in input-shape errors.
    const INPUT: &'static str;

    fn apply(&self, p: &mut Predicates);

    /// The `state` branch, used by published-state defaulting.
    fn state_mut(&mut self) -> &mut Option<StringFilter>;

    /// Decode a raw argument. `null` means no filter.
    fn from_value(value: Value) -> QueryResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| QueryError::invalid(Self::INPUT, e))
    }
}

/// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `in` lists are sets: sorted and deduplicated so equivalent inputs compare
/// (and hash) equal.
fn value_set<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(values.map(|mut values| {
        values.sort();
        values.dedup();
        values
    }))
}

/// Ids are opaque strings; only a (trimmed) integer can name a row.
pub fn parse_id(raw: &str) -> Option<i32> {
    raw.trim().parse().ok()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<String>,
    #[serde(
        default,
        rename = "in",
        deserialize_with = "value_set",
        skip_serializing_if = "Option::is_none"
    )]
    pub any_of: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<StringFilter>>,
}

impl StringFilter {
    pub fn equals(value: impl Into<String>) -> Self {
        Self {
            equals: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn apply(&self, column: &str, p: &mut Predicates) {
        if let Some(value) = &self.equals {
            p.eq(column, SqlArg::Text(value.clone()));
        }
        if let Some(values) = self.any_of.as_ref().filter(|v| !v.is_empty()) {
            p.any(column, SqlArg::TextList(values.clone()));
        }
        if let Some(not) = &self.not {
            let inner = p.scoped(|p| not.apply(column, p));
            if !inner.is_empty() {
                p.raw(format!("NOT ({})", inner.join(" AND ")));
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoolFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<bool>,
}

impl BoolFilter {
    pub fn apply(&self, column: &str, p: &mut Predicates) {
        if let Some(value) = self.equals {
            p.eq(column, SqlArg::Bool(value));
        }
    }
}

/// Filter on a nullable timestamp column. `not` nests the same shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateTimeFilter {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub equals: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub not: Option<Option<Box<DateTimeFilter>>>,
}

impl DateTimeFilter {
    pub fn apply(&self, column: &str, p: &mut Predicates) {
        match &self.equals {
            Some(Some(ts)) => p.eq(column, SqlArg::Timestamp(ts.naive_utc())),
            Some(None) => p.raw(format!("{column} IS NULL")),
            None => {}
        }
        // Only `not.equals` is honoured inside a negation; any other `not`
        // means the column is set.
        match self.not.as_ref().map(|not| not.as_ref().and_then(|f| f.equals.as_ref())) {
            Some(Some(Some(ts))) => p.compare(column, "<>", SqlArg::Timestamp(ts.naive_utc())),
            Some(_) => p.raw(format!("{column} IS NOT NULL")),
            None => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManyRelationFilter<W> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub some: Option<W>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionWhere {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StringFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CategoryWhere {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_member_only: Option<BoolFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicRefWhere {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<IdFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartnerWhere {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<StringFilter>,
}

/// `EXISTS` over `join` from the outer row `outer_id` to `target_table`
/// (aliased `alias`), with `build` adding conditions on the target.
fn exists_via(
    p: &mut Predicates,
    join: JoinTable,
    target_table: &str,
    alias: &str,
    outer_id: &str,
    build: impl FnOnce(&mut Predicates),
) {
    let conds = p.scoped(build);
    let mut sub = format!(
        r#"EXISTS (SELECT 1 FROM "{}" j JOIN "{}" {alias} ON {alias}.id = j."{}" WHERE j."{}" = {outer_id}"#,
        join.name, target_table, join.target, join.owner
    );
    for cond in conds {
        sub.push_str(" AND ");
        sub.push_str(&cond);
    }
    sub.push(')');
    p.raw(sub);
}

fn apply_opt(filter: &Option<StringFilter>, column: &str, p: &mut Predicates) {
    if let Some(f) = filter {
        f.apply(column, p);
    }
}

fn apply_bool(filter: &Option<BoolFilter>, column: &str, p: &mut Predicates) {
    if let Some(f) = filter {
        f.apply(column, p);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ArticleWhere {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_adult: Option<BoolFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_member: Option<BoolFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<BoolFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<ManyRelationFilter<SectionWhere>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<ManyRelationFilter<CategoryWhere>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<TopicRefWhere>,
}

impl Filter for ArticleWhere {
    const INPUT: &'static str = "article filter";

    fn apply(&self, p: &mut Predicates) {
        apply_opt(&self.slug, "p.slug", p);
        apply_opt(&self.state, "p.state", p);
        apply_bool(&self.is_adult, r#"p."isAdult""#, p);
        apply_bool(&self.is_member, r#"p."isMember""#, p);
        apply_bool(&self.is_featured, r#"p."isFeatured""#, p);

        if let Some(some) = self.sections.as_ref().and_then(|f| f.some.as_ref()) {
            exists_via(p, POST_SECTIONS, "Section", "s", "p.id", |p| {
                apply_opt(&some.slug, "s.slug", p);
                apply_opt(&some.state, "s.state", p);
            });
        }
        if let Some(some) = self.categories.as_ref().and_then(|f| f.some.as_ref()) {
            exists_via(p, POST_CATEGORIES, "Category", "c", "p.id", |p| {
                apply_opt(&some.slug, "c.slug", p);
                apply_opt(&some.state, "c.state", p);
                apply_bool(&some.is_member_only, r#"c."isMemberOnly""#, p);
            });
        }
        if let Some(id) = self
            .topics
            .as_ref()
            .and_then(|t| t.id.as_ref())
            .and_then(|f| f.equals.as_ref())
        {
            // A non-numeric id matches nothing.
            match parse_id(id) {
                Some(id) => p.eq("p.topics", SqlArg::Id(id)),
                None => p.raw("FALSE"),
            }
        }
    }

    fn state_mut(&mut self) -> &mut Option<StringFilter> {
        &mut self.state
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ExternalWhere {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<PartnerWhere>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTimeFilter>,
}

impl Filter for ExternalWhere {
    const INPUT: &'static str = "external item filter";

    fn apply(&self, p: &mut Predicates) {
        apply_opt(&self.slug, "e.slug", p);
        apply_opt(&self.state, "e.state", p);
        if let Some(published) = &self.published_date {
            published.apply(r#"e."publishedDate""#, p);
        }
        if let Some(partner) = &self.partner {
            let conds = p.scoped(|p| apply_opt(&partner.slug, "pa.slug", p));
            if !conds.is_empty() {
                p.raw(format!(
                    r#"EXISTS (SELECT 1 FROM "Partner" pa WHERE pa.id = e.partner AND {})"#,
                    conds.join(" AND ")
                ));
            }
        }
    }

    fn state_mut(&mut self) -> &mut Option<StringFilter> {
        &mut self.state
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct TopicWhere {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<BoolFilter>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<StringFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StringFilter>,
}

impl Filter for TopicWhere {
    const INPUT: &'static str = "topic filter";

    fn apply(&self, p: &mut Predicates) {
        apply_opt(&self.slug, "t.slug", p);
        apply_opt(&self.name, "t.name", p);
        apply_opt(&self.state, "t.state", p);
        apply_opt(&self.kind, "t.type", p);
        apply_opt(&self.style, "t.style", p);
        apply_bool(&self.is_featured, r#"t."isFeatured""#, p);
    }

    fn state_mut(&mut self) -> &mut Option<StringFilter> {
        &mut self.state
    }
}

/// Unique lookup for a single article. `id` wins over `slug`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArticleKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Unique lookup for a single topic. `id`, then `slug`, then `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The single key column a unique lookup resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum KeyMatch {
    Id(i32),
    Slug(String),
    Name(String),
}

impl KeyMatch {
    pub fn apply(&self, alias: &str, p: &mut Predicates) {
        match self {
            KeyMatch::Id(id) => p.eq(&format!("{alias}.id"), SqlArg::Id(*id)),
            KeyMatch::Slug(slug) => p.eq(&format!("{alias}.slug"), SqlArg::Text(slug.clone())),
            KeyMatch::Name(name) => p.eq(&format!("{alias}.name"), SqlArg::Text(name.clone())),
        }
    }
}

/// Resolve by precedence. A non-numeric id cannot name a row, so it resolves
/// to nothing rather than falling through to the next key.
fn resolve_key(id: Option<&str>, slug: Option<&str>, name: Option<&str>) -> Option<KeyMatch> {
    if let Some(id) = id {
        return parse_id(id).map(KeyMatch::Id);
    }
    let non_empty = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);
    non_empty(slug)
        .map(KeyMatch::Slug)
        .or_else(|| non_empty(name).map(KeyMatch::Name))
}

impl ArticleKey {
    pub fn from_value(value: Value) -> QueryResult<Self> {
        serde_json::from_value(value).map_err(|e| QueryError::invalid("article key", e))
    }

    pub fn resolve(&self) -> Option<KeyMatch> {
        resolve_key(self.id.as_deref(), self.slug.as_deref(), None)
    }
}

impl TopicKey {
    pub fn from_value(value: Value) -> QueryResult<Self> {
        serde_json::from_value(value).map_err(|e| QueryError::invalid("topic key", e))
    }

    pub fn resolve(&self) -> Option<KeyMatch> {
        resolve_key(self.id.as_deref(), self.slug.as_deref(), self.name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build<F: Filter>(filter: &F) -> Predicates {
        let mut p = Predicates::new();
        filter.apply(&mut p);
        p
    }

    #[test]
    fn empty_filter_is_unconstrained() {
        let f = ArticleWhere::from_value(json!({})).unwrap();
        assert!(build(&f).is_empty());
        assert_eq!(ArticleWhere::from_value(Value::Null).unwrap(), ArticleWhere::default());
    }

    #[test]
    fn string_filter_equals_in_and_not() {
        let f = ArticleWhere::from_value(json!({
            "slug": {"equals": "a", "in": ["b", "c"], "not": {"equals": "d"}}
        }))
        .unwrap();
        let p = build(&f);
        assert_eq!(
            p.fragments(),
            ["p.slug = $1", "p.slug = ANY($2)", "NOT (p.slug = $3)"]
        );
        assert_eq!(p.args()[2], SqlArg::Text("d".into()));
    }

    #[test]
    fn empty_not_adds_nothing() {
        let f = TopicWhere::from_value(json!({"name": {"not": {}}})).unwrap();
        assert!(build(&f).is_empty());
    }

    #[test]
    fn relation_filter_lowers_to_exists() {
        let f = ArticleWhere::from_value(json!({
            "state": {"equals": "published"},
            "categories": {"some": {"slug": {"equals": "news"}, "isMemberOnly": {"equals": false}}}
        }))
        .unwrap();
        let p = build(&f);
        assert_eq!(p.fragments().len(), 2);
        assert_eq!(
            p.fragments()[1],
            r#"EXISTS (SELECT 1 FROM "_Category_posts" j JOIN "Category" c ON c.id = j."A" WHERE j."B" = p.id AND c.slug = $2 AND c."isMemberOnly" = $3)"#
        );
    }

    #[test]
    fn relation_filter_without_some_adds_nothing() {
        let f = ArticleWhere::from_value(json!({"sections": {}})).unwrap();
        assert!(build(&f).is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = ArticleWhere::from_value(json!({"slug": {"contains": "x"}})).unwrap_err();
        assert!(matches!(err, QueryError::InvalidInput { input: "article filter", .. }));

        let err = ExternalWhere::from_value(json!({"bogus": true})).unwrap_err();
        assert!(matches!(err, QueryError::InvalidInput { .. }));

        let err = TopicWhere::from_value(json!({"isFeatured": {"equals": "yes"}})).unwrap_err();
        assert!(matches!(err, QueryError::InvalidInput { .. }));
    }

    #[test]
    fn nullable_date_filter_variants() {
        let f = ExternalWhere::from_value(json!({"publishedDate": {"not": null}})).unwrap();
        assert_eq!(build(&f).fragments(), [r#"e."publishedDate" IS NOT NULL"#]);

        let f = ExternalWhere::from_value(json!({"publishedDate": {"equals": null}})).unwrap();
        assert_eq!(build(&f).fragments(), [r#"e."publishedDate" IS NULL"#]);

        let f = ExternalWhere::from_value(json!({
            "publishedDate": {"not": {"equals": "2024-01-02T03:04:05Z"}}
        }))
        .unwrap();
        let p = build(&f);
        assert_eq!(p.fragments(), [r#"e."publishedDate" <> $1"#]);
        assert!(matches!(p.args()[0], SqlArg::Timestamp(_)));

        let err = ExternalWhere::from_value(json!({"publishedDate": {"equals": "yesterday"}}));
        assert!(err.is_err());
    }

    #[test]
    fn nested_date_negation_means_not_null() {
        let f = ExternalWhere::from_value(json!({"publishedDate": {"not": {"not": null}}})).unwrap();
        assert_eq!(build(&f).fragments(), [r#"e."publishedDate" IS NOT NULL"#]);

        let f = ExternalWhere::from_value(json!({"publishedDate": {"not": {}}})).unwrap();
        assert_eq!(build(&f).fragments(), [r#"e."publishedDate" IS NOT NULL"#]);

        let f = ExternalWhere::from_value(json!({"publishedDate": {"not": {"equals": null}}})).unwrap();
        assert_eq!(build(&f).fragments(), [r#"e."publishedDate" IS NOT NULL"#]);

        let err = ExternalWhere::from_value(json!({"publishedDate": {"not": {"after": "x"}}}));
        assert!(err.is_err());
    }

    #[test]
    fn partner_filter_uses_exists() {
        let f = ExternalWhere::from_value(json!({"partner": {"slug": {"equals": "cna"}}})).unwrap();
        assert_eq!(
            build(&f).fragments(),
            [r#"EXISTS (SELECT 1 FROM "Partner" pa WHERE pa.id = e.partner AND pa.slug = $1)"#]
        );
    }

    #[test]
    fn non_numeric_topic_id_matches_nothing() {
        let f = ArticleWhere::from_value(json!({"topics": {"id": {"equals": "x"}}})).unwrap();
        assert_eq!(build(&f).fragments(), ["FALSE"]);
        let f = ArticleWhere::from_value(json!({"topics": {"id": {"equals": "12"}}})).unwrap();
        assert_eq!(build(&f).args(), [SqlArg::Id(12)]);
    }

    #[test]
    fn topic_id_parses_like_unique_keys() {
        let f = ArticleWhere::from_value(json!({"topics": {"id": {"equals": " 12 "}}})).unwrap();
        assert_eq!(build(&f).args(), [SqlArg::Id(12)]);
        let key = ArticleKey {
            id: Some(" 12 ".into()),
            slug: None,
        };
        assert_eq!(key.resolve(), Some(KeyMatch::Id(12)));
        assert_eq!(parse_id("12x"), None);
    }

    #[test]
    fn in_lists_decode_as_sorted_sets() {
        let a = ArticleWhere::from_value(json!({"slug": {"in": ["b", "a", "b"]}})).unwrap();
        let b = ArticleWhere::from_value(json!({"slug": {"in": ["a", "b"]}})).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.slug.and_then(|f| f.any_of),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn key_precedence() {
        let key = TopicKey {
            id: None,
            slug: Some("s".into()),
            name: Some("n".into()),
        };
        assert_eq!(key.resolve(), Some(KeyMatch::Slug("s".into())));

        let key = ArticleKey {
            id: Some("5".into()),
            slug: Some("s".into()),
        };
        assert_eq!(key.resolve(), Some(KeyMatch::Id(5)));

        assert_eq!(ArticleKey::default().resolve(), None);
        let key = ArticleKey {
            id: Some("five".into()),
            slug: Some("s".into()),
        };
        assert_eq!(key.resolve(), None);
    }
}
