//! Parameterized statement assembly.
//!
//! `Predicates` is the single place where SQL fragments and their positional
//! placeholders are composed. Every argument pushed gets the next `$n`, so any
//! subset of fragments can be joined with `AND` without renumbering.
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A bound statement argument.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Text(String),
    TextList(Vec<String>),
    Bool(bool),
    Id(i32),
    Int(i64),
    Timestamp(NaiveDateTime),
}

/// `take`/`skip` window. Absent or non-positive values mean no limit / no
/// offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub take: Option<i64>,
    pub skip: Option<i64>,
}

impl Page {
    pub fn new(take: Option<i64>, skip: Option<i64>) -> Self {
        Self { take, skip }
    }

    pub fn limit(&self) -> Option<i64> {
        self.take.filter(|n| *n > 0)
    }

    pub fn offset(&self) -> Option<i64> {
        self.skip.filter(|n| *n > 0)
    }

    /// The window with non-positive values dropped, so equivalent requests
    /// compare equal.
    pub fn normalized(&self) -> Page {
        Page {
            take: self.limit(),
            skip: self.offset(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Predicates {
    fragments: Vec<String>,
    args: Vec<SqlArg>,
}

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an argument and return its placeholder.
    pub fn bind(&mut self, arg: SqlArg) -> String {
        self.args.push(arg);
        format!("${}", self.args.len())
    }

    pub fn compare(&mut self, column: &str, op: &str, arg: SqlArg) {
        let p = self.bind(arg);
        self.fragments.push(format!("{column} {op} {p}"));
    }

    pub fn eq(&mut self, column: &str, arg: SqlArg) {
        self.compare(column, "=", arg);
    }

    pub fn any(&mut self, column: &str, arg: SqlArg) {
        let p = self.bind(arg);
        self.fragments.push(format!("{column} = ANY({p})"));
    }

    pub fn raw(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    /// Run `build` against a fresh fragment list that shares this builder's
    /// arguments, and hand back the fragments it produced. Used for `NOT (…)`
    /// and `EXISTS (…)` bodies.
    pub fn scoped(&mut self, build: impl FnOnce(&mut Self)) -> Vec<String> {
        let outer = std::mem::take(&mut self.fragments);
        build(self);
        std::mem::replace(&mut self.fragments, outer)
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn args(&self) -> &[SqlArg] {
        &self.args
    }

    /// Assemble `select [WHERE …] [ORDER BY …] [LIMIT $n] [OFFSET $m]`.
    pub fn finish(mut self, select: &str, order: Option<&str>, page: Page) -> Statement {
        let mut sql = String::from(select);
        if !self.fragments.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.fragments.join(" AND "));
        }
        if let Some(order) = order {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        let limit = page.limit();
        if let Some(n) = limit {
            let p = self.bind(SqlArg::Int(n));
            sql.push_str(&format!(" LIMIT {p}"));
        }
        let offset = page.offset();
        if let Some(n) = offset {
            let p = self.bind(SqlArg::Int(n));
            sql.push_str(&format!(" OFFSET {p}"));
        }
        Statement {
            sql,
            args: self.args,
            limit,
            offset,
        }
    }
}

/// A fully assembled statement plus the window it was built with.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlArg>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
