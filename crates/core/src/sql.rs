//! SQL bind values and the partial-update `SET` fragment builder.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{ModelError, ModelResult};

/// A typed bind parameter.
///
/// Every variant carries an `Option` so a SQL `NULL` keeps a concrete type;
/// the store needs it to resolve the parameter against the target column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Int(Option<i64>),
    Text(Option<String>),
    Decimal(Option<Decimal>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        match self {
            Self::Int(v) => v.is_none(),
            Self::Text(v) => v.is_none(),
            Self::Decimal(v) => v.is_none(),
        }
    }
}

macro_rules! impl_sql_value_from {
    ($variant:ident, $t:ty, $conv:expr) => {
        impl From<$t> for SqlValue {
            fn from(value: $t) -> Self {
                SqlValue::$variant(Some($conv(value)))
            }
        }

        impl From<Option<$t>> for SqlValue {
            fn from(value: Option<$t>) -> Self {
                SqlValue::$variant(value.map($conv))
            }
        }
    };
}

impl_sql_value_from!(Int, i32, i64::from);
impl_sql_value_from!(Int, i64, core::convert::identity);
impl_sql_value_from!(Text, String, core::convert::identity);
impl_sql_value_from!(Text, &str, str::to_string);
impl_sql_value_from!(Decimal, Decimal, core::convert::identity);

/// Field-name to column-name lookup table.
///
/// Fields are named the way callers see them (`numEmployees`), columns the way
/// the store does (`num_employees`). A field missing from the table is used as
/// the column name verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    inner: HashMap<&'static str, &'static str>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&'static str, &'static str)]) -> Self {
        pairs.iter().copied().collect()
    }

    /// Column for `field`, falling back to the field name itself.
    pub fn column<'a>(&self, field: &'a str) -> &'a str {
        self.inner.get(field).copied().unwrap_or(field)
    }
}

impl FromIterator<(&'static str, &'static str)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (&'static str, &'static str)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// Output of [`sql_for_partial_update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialUpdate {
    /// `"col_a"=$1, "col_b"=$2`
    pub set_cols: String,
    /// Bind values; `values[i - 1]` belongs to placeholder `$i`.
    pub values: Vec<SqlValue>,
}

impl PartialUpdate {
    /// Placeholder index for the first parameter appended after the `SET` values.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }

    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.set_cols, self.values)
    }
}

/// Build the `SET` clause and bind values for a partial update.
///
/// Fields are emitted in iteration order, each as `"<column>"=$<n>` with `n`
/// counting from 1, and joined with `", "`. The column name comes from
/// `columns`, or is the field name when the table has no entry for it.
///
/// Fails with [`ModelError::InvalidInput`] when there is nothing to update or
/// when the same field is given twice.
pub fn sql_for_partial_update<K, I>(fields: I, columns: &ColumnMap) -> ModelResult<PartialUpdate>
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, SqlValue)>,
{
    let mut seen = HashSet::new();
    let mut cols = Vec::new();
    let mut values = Vec::new();

    for (idx, (field, value)) in fields.into_iter().enumerate() {
        let field = field.as_ref();
        if !seen.insert(field.to_string()) {
            return Err(ModelError::invalid_input(format!("duplicate field: {field}")));
        }

        cols.push(format!("{}=${}", quote_ident(columns.column(field)), idx + 1));
        values.push(value);
    }

    if values.is_empty() {
        return Err(ModelError::invalid_input("No data"));
    }

    Ok(PartialUpdate {
        set_cols: cols.join(", "),
        values,
    })
}

/// Double-quote an identifier, doubling any embedded quote.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
