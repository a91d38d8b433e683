//! `jobly-models` — job and company records and the queries behind them.
//!
//! Every repository is generic over a [`QueryExecutor`](jobly_core::QueryExecutor)
//! injected by the caller; no repository holds a connection of its own.

pub mod company;
pub mod filter;
pub mod job;

pub use company::{Company, CompanyRepository};
pub use filter::{FilterPredicate, JOB_FILTERS, JobFilter, WhereClause};
pub use job::{Job, JobDetail, JobListing, JobRepository, JobUpdate, NewJob};
