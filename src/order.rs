//! Order-by translation.
//!
//! Callers pass a list of single-key rules such as `[{"publishedDate": "desc"}]`.
//! Only the first rule counts; anything unrecognized resolves to the entity's
//! default order rather than an error.
use serde::Serialize;
use serde_json::Value;

use crate::error::{QueryError, QueryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(Direction::Asc),
            "DESC" => Some(Direction::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// A sortable field exposed by an entity.
#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    pub name: &'static str,
    pub column: &'static str,
    pub nullable: bool,
}

const fn key(name: &'static str, column: &'static str, nullable: bool) -> SortKey {
    SortKey {
        name,
        column,
        nullable,
    }
}

/// Sorting rules of one entity kind.
#[derive(Debug)]
pub struct Sorting {
    input: &'static str,
    keys: &'static [SortKey],
    default: (&'static str, Direction),
    /// Secondary ordering appended to the default only.
    default_tiebreak: Option<&'static str>,
}

pub static ARTICLE_SORTING: Sorting = Sorting {
    input: "article order",
    keys: &[
        key("publishedDate", r#"p."publishedDate""#, true),
        key("updatedAt", r#"p."updatedAt""#, true),
        key("title", "p.title", false),
    ],
    default: ("publishedDate", Direction::Desc),
    default_tiebreak: None,
};

pub static EXTERNAL_SORTING: Sorting = Sorting {
    input: "external item order",
    keys: &[
        key("publishedDate", r#"e."publishedDate""#, true),
        key("updatedAt", r#"e."updatedAt""#, true),
    ],
    default: ("publishedDate", Direction::Desc),
    default_tiebreak: None,
};

pub static TOPIC_SORTING: Sorting = Sorting {
    input: "topic order",
    keys: &[
        key("sortOrder", r#"t."sortOrder""#, true),
        key("createdAt", r#"t."createdAt""#, true),
        key("updatedAt", r#"t."updatedAt""#, true),
        key("name", "t.name", false),
        key("slug", "t.slug", false),
    ],
    default: ("sortOrder", Direction::Asc),
    default_tiebreak: Some(r#"t."createdAt" DESC"#),
};

/// The resolved ordering. This, not the raw input, is what identifies a
/// request in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderClause {
    pub field: &'static str,
    pub direction: Direction,
    pub sql: String,
}

impl Sorting {
    fn clause(&self, key: &SortKey, direction: Direction, tiebreak: Option<&str>) -> OrderClause {
        let mut sql = format!("{} {}", key.column, direction.as_sql());
        if key.nullable {
            sql.push_str(" NULLS LAST");
        }
        if let Some(extra) = tiebreak {
            sql.push_str(", ");
            sql.push_str(extra);
        }
        OrderClause {
            field: key.name,
            direction,
            sql,
        }
    }

    fn lookup(&self, name: &str) -> Option<&SortKey> {
        self.keys.iter().find(|k| k.name == name)
    }

    pub fn default_clause(&self) -> OrderClause {
        let (name, direction) = self.default;
        match self.lookup(name) {
            Some(key) => self.clause(key, direction, self.default_tiebreak),
            None => OrderClause {
                field: name,
                direction,
                sql: String::new(),
            },
        }
    }

    /// Resolve raw `orderBy` input. `null`, an empty list or an empty rule
    /// give the default; a rule naming more than one field is rejected.
    pub fn resolve(&self, raw: &Value) -> QueryResult<OrderClause> {
        let first = match raw {
            Value::Null => return Ok(self.default_clause()),
            Value::Array(rules) => match rules.first() {
                Some(rule) => rule,
                None => return Ok(self.default_clause()),
            },
            Value::Object(_) => raw,
            other => {
                return Err(QueryError::invalid(
                    self.input,
                    format!("expected a list of rules, got {other}"),
                ))
            }
        };
        let rule = match first {
            Value::Object(rule) => rule,
            Value::Null => return Ok(self.default_clause()),
            other => {
                return Err(QueryError::invalid(
                    self.input,
                    format!("expected an object rule, got {other}"),
                ))
            }
        };
        if rule.len() > 1 {
            return Err(QueryError::invalid(
                self.input,
                "each rule must name exactly one field",
            ));
        }
        let Some((field, direction)) = rule.iter().next() else {
            return Ok(self.default_clause());
        };
        let direction = direction.as_str().and_then(Direction::parse);
        match (self.lookup(field), direction) {
            (Some(key), Some(direction)) => Ok(self.clause(key, direction, None)),
            _ => Ok(self.default_clause()),
        }
    }
}
