//! Company records (read-only from this layer).

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use jobly_core::{ModelError, ModelResult, QueryExecutor, SqlValue, decode_row};

/// A company that jobs can reference by `handle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub num_employees: i32,
    pub description: String,
    pub logo_url: Option<String>,
}

/// Select list producing [`Company`]-shaped rows from `companies`.
pub(crate) const COMPANY_COLUMNS: &str = r#"handle,
                  name,
                  num_employees AS "numEmployees",
                  description,
                  logo_url AS "logoUrl""#;

/// Company lookups.
#[derive(Debug, Clone)]
pub struct CompanyRepository<E> {
    exec: E,
}

impl<E> CompanyRepository<E> {
    pub fn new(exec: E) -> Self {
        Self { exec }
    }
}

impl<E: QueryExecutor> CompanyRepository<E> {
    /// Fetch a company by handle.
    ///
    /// Fails with `NotFound` if no company has that handle.
    #[instrument(skip(self))]
    pub async fn get(&self, handle: &str) -> ModelResult<Company> {
        let sql = format!(
            "SELECT {COMPANY_COLUMNS}
             FROM companies
             WHERE handle = $1"
        );

        let mut rows = self.exec.execute(&sql, vec![SqlValue::from(handle)]).await?;
        if rows.is_empty() {
            debug!(handle, "company not found");
            return Err(ModelError::not_found(format!("No company: {handle}")));
        }

        Ok(decode_row(rows.swap_remove(0))?)
    }
}
