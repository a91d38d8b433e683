//! Job records and the job repository.
//!
//! ## Record shapes
//!
//! - [`Job`]: a single `jobs` row, returned by create and update.
//! - [`JobListing`]: a row plus the owning company's name, returned by
//!   [`JobRepository::find_all`].
//! - [`JobDetail`]: a row with the full owning [`Company`] nested in place of
//!   the handle, returned by [`JobRepository::get`].
//!
//! ## Mutability
//!
//! `id` and `company_handle` are fixed at creation. [`JobUpdate`] only carries
//! `title`, `salary` and `equity`, and rejects anything else when deserialized.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, instrument};

use jobly_core::{
    ColumnMap, JobId, ModelError, ModelResult, QueryExecutor, SqlValue, StoreError, decode_row,
    sql_for_partial_update,
};

use crate::company::{Company, CompanyRepository};
use crate::filter::JobFilter;

/// Input for [`JobRepository::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// A stored job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub salary: Option<i32>,
    /// Fraction in `[0, 1]`; serialized as a decimal string.
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl Job {
    pub fn with_company(self, company: Company) -> JobDetail {
        JobDetail {
            id: self.id,
            title: self.title,
            salary: self.salary,
            equity: self.equity,
            company,
        }
    }
}

/// Listing row: a job with its company's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub id: JobId,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
    pub company_name: String,
}

/// A job with its company nested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub id: JobId,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company: Company,
}

/// Partial update of a job.
///
/// For the nullable fields the outer `Option` is "was it given", the inner
/// one the new value, so `{"salary": null}` clears the salary while a missing
/// `salary` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub equity: Option<Option<Decimal>>,
}

impl JobUpdate {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn salary(mut self, salary: Option<i32>) -> Self {
        self.salary = Some(salary);
        self
    }

    pub fn equity(mut self, equity: Option<Decimal>) -> Self {
        self.equity = Some(equity);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.salary.is_none() && self.equity.is_none()
    }

    /// Given fields as `(field, value)` pairs, in declaration order.
    pub fn fields(&self) -> Vec<(&'static str, SqlValue)> {
        let mut fields = Vec::with_capacity(3);
        if let Some(title) = &self.title {
            fields.push(("title", SqlValue::from(title.as_str())));
        }
        if let Some(salary) = self.salary {
            fields.push(("salary", SqlValue::from(salary)));
        }
        if let Some(equity) = self.equity {
            fields.push(("equity", SqlValue::from(equity)));
        }
        fields
    }
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Columns returned for a bare job row.
const JOB_COLUMNS: &str = r#"id, title, salary, equity, company_handle AS "companyHandle""#;

/// Job CRUD over an injected executor.
#[derive(Debug, Clone)]
pub struct JobRepository<E> {
    exec: E,
    columns: ColumnMap,
}

impl<E> JobRepository<E> {
    pub fn new(exec: E) -> Self {
        Self {
            exec,
            // Update fields already match their column names.
            columns: ColumnMap::new(),
        }
    }
}

impl<E: QueryExecutor> JobRepository<E> {
    /// Insert a job and return it with its generated id.
    ///
    /// A `company_handle` with no matching company is reported by the store
    /// (foreign key violation) and surfaces as `ModelError::Store`.
    #[instrument(
        skip(self, job),
        fields(title = %job.title, company_handle = %job.company_handle)
    )]
    pub async fn create(&self, job: &NewJob) -> ModelResult<Job> {
        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle)
             VALUES ($1, $2, $3, $4)
             RETURNING {JOB_COLUMNS}"
        );
        let params = vec![
            SqlValue::from(job.title.as_str()),
            SqlValue::from(job.salary),
            SqlValue::from(job.equity),
            SqlValue::from(job.company_handle.as_str()),
        ];

        let row = self
            .exec
            .execute(&sql, params)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::decode("insert returned no row"))?;

        let created: Job = decode_row(row)?;
        debug!(id = %created.id, "job created");
        Ok(created)
    }

    /// List jobs matching `filter`, ordered by title.
    #[instrument(skip(self))]
    pub async fn find_all(&self, filter: &JobFilter) -> ModelResult<Vec<JobListing>> {
        let clause = filter.where_clause();
        let sql = format!(
            "SELECT j.id,
                    j.title,
                    j.salary,
                    j.equity,
                    j.company_handle AS \"companyHandle\",
                    c.name AS \"companyName\"
             FROM jobs j
             LEFT JOIN companies AS c ON c.handle = j.company_handle
             {}
             ORDER BY j.title, j.id",
            clause.sql
        );
        debug!(%sql, params = clause.values.len(), "listing jobs");

        let rows = self.exec.execute(&sql, clause.values).await?;
        let jobs = rows
            .into_iter()
            .map(decode_row)
            .collect::<Result<Vec<JobListing>, _>>()?;

        debug!(count = jobs.len(), "jobs listed");
        Ok(jobs)
    }

    /// Fetch a job with its company nested.
    ///
    /// Fails with `NotFound` if no job has that id.
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn get(&self, id: JobId) -> ModelResult<JobDetail> {
        let sql = format!(
            "SELECT {JOB_COLUMNS}
             FROM jobs
             WHERE id = $1"
        );

        let job: Job = match self.exec.execute(&sql, vec![id.into()]).await?.into_iter().next() {
            Some(row) => decode_row(row)?,
            None => {
                debug!("job not found");
                return Err(ModelError::not_found(format!("No job: {id}")));
            }
        };

        let company = CompanyRepository::new(&self.exec).get(&job.company_handle).await?;
        Ok(job.with_company(company))
    }

    /// Apply a partial update and return the updated job.
    ///
    /// Fails with `InvalidInput` if `data` is empty (checked before touching
    /// the store) and with `NotFound` if no job has that id.
    #[instrument(skip(self, id, data), fields(id = %id))]
    pub async fn update(&self, id: JobId, data: &JobUpdate) -> ModelResult<Job> {
        let update = sql_for_partial_update(data.fields(), &self.columns)?;
        let id_idx = update.next_placeholder();
        let (set_cols, mut params) = update.into_parts();
        params.push(id.into());

        let sql = format!(
            "UPDATE jobs
             SET {set_cols}
             WHERE id = ${id_idx}
             RETURNING {JOB_COLUMNS}"
        );
        debug!(%sql, params = params.len(), "updating job");

        match self.exec.execute(&sql, params).await?.into_iter().next() {
            Some(row) => Ok(decode_row(row)?),
            None => {
                debug!("job not found");
                Err(ModelError::not_found(format!("No job: {id}")))
            }
        }
    }

    /// Delete a job.
    ///
    /// Fails with `NotFound` if no job has that id.
    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn remove(&self, id: JobId) -> ModelResult<()> {
        let rows = self
            .exec
            .execute("DELETE FROM jobs WHERE id = $1 RETURNING id", vec![id.into()])
            .await?;

        if rows.is_empty() {
            debug!("job not found");
            return Err(ModelError::not_found(format!("No job: {id}")));
        }
        Ok(())
    }
}
