//! Job search filters.
//!
//! Each recognized filter is one row of [`JOB_FILTERS`]: a predicate template
//! and a function pulling its bind value out of a [`JobFilter`]. A filter is
//! active when that function returns a value. Active predicates are joined
//! with `AND`; with none active there is no `WHERE` at all.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use jobly_core::SqlValue;

/// Optional criteria for listing jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilter {
    /// Only jobs with `salary >= min_salary`.
    pub min_salary: Option<i32>,
    /// `Some(true)` keeps only jobs with non-zero equity; otherwise ignored.
    pub has_equity: Option<bool>,
    /// Case-insensitive substring of the title.
    pub title_like: Option<String>,
}

impl JobFilter {
    pub fn min_salary(mut self, min_salary: i32) -> Self {
        self.min_salary = Some(min_salary);
        self
    }

    pub fn has_equity(mut self, has_equity: bool) -> Self {
        self.has_equity = Some(has_equity);
        self
    }

    pub fn title_like(mut self, title: impl Into<String>) -> Self {
        self.title_like = Some(title.into());
        self
    }

    /// `WHERE` clause over the `jobs` table aliased as `j`, placeholders from `$1`.
    pub fn where_clause(&self) -> WhereClause {
        WhereClause::build(JOB_FILTERS, self, 1)
    }
}

/// One entry of the filter table.
#[derive(Debug, Clone, Copy)]
pub struct FilterPredicate {
    /// Caller-facing filter name.
    pub name: &'static str,
    /// SQL condition; `{}` is replaced by the placeholder.
    pub template: &'static str,
    /// Bind value, or `None` when the filter is inactive.
    pub param: fn(&JobFilter) -> Option<SqlValue>,
}

/// Filters recognized by job listing, in the order they appear in the query.
pub const JOB_FILTERS: &[FilterPredicate] = &[
    FilterPredicate {
        name: "minSalary",
        template: "j.salary >= {}",
        param: |f| f.min_salary.map(SqlValue::from),
    },
    FilterPredicate {
        name: "hasEquity",
        template: "j.equity > {}",
        param: |f| (f.has_equity == Some(true)).then(|| SqlValue::from(Decimal::ZERO)),
    },
    FilterPredicate {
        name: "titleLike",
        template: "j.title ILIKE {}",
        param: |f| {
            f.title_like
                .as_deref()
                .map(|t| SqlValue::from(format!("%{}%", escape_like(t))))
        },
    },
];

/// Composed `WHERE` clause and its bind values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    /// Empty, or `WHERE <cond> AND <cond> ...`.
    pub sql: String,
    pub values: Vec<SqlValue>,
}

impl WhereClause {
    /// Apply `predicates` to `filter`, numbering placeholders from `first_placeholder`.
    pub fn build(predicates: &[FilterPredicate], filter: &JobFilter, first_placeholder: usize) -> Self {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        for predicate in predicates {
            if let Some(value) = (predicate.param)(filter) {
                let placeholder = format!("${}", first_placeholder + values.len());
                conditions.push(predicate.template.replace("{}", &placeholder));
                values.push(value);
            }
        }

        let sql = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        Self { sql, values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Escape `LIKE` wildcards so the pattern matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
