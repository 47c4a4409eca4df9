use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use actix_web::web::Bytes;

use super::assembler::{AssembleError, assemble, cache_key};
use super::encoder::encode_csv;
use super::executor::{QueryError, QueryExecutor};
use super::templates::{TemplateError, TemplateStore};
use super::types::{AssembledQuery, FilterSet, ProjectScope, Report};
use crate::cache::ResultCache;
use crate::models::roster::{RosterError, RosterSnapshot, RosterSubset, load_roster};

#[derive(Debug)]
pub enum ReportError {
    Roster(RosterError),
    Template(TemplateError),
    Assemble(AssembleError),
    Query(QueryError),
    Encode(csv::Error),
    /// The background task computing the report panicked or was cancelled.
    Task(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Roster(e) => write!(f, "failed to load directory: {e}"),
            ReportError::Template(e) => write!(f, "failed to load sql template: {e}"),
            ReportError::Assemble(e) => write!(f, "failed to assemble query: {e}"),
            ReportError::Query(e) => write!(f, "query failed: {e}"),
            ReportError::Encode(e) => write!(f, "failed to encode csv: {e}"),
            ReportError::Task(e) => write!(f, "report task failed: {e}"),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<RosterError> for ReportError {
    fn from(e: RosterError) -> Self {
        ReportError::Roster(e)
    }
}

impl From<TemplateError> for ReportError {
    fn from(e: TemplateError) -> Self {
        ReportError::Template(e)
    }
}

impl From<AssembleError> for ReportError {
    fn from(e: AssembleError) -> Self {
        ReportError::Assemble(e)
    }
}

impl From<QueryError> for ReportError {
    fn from(e: QueryError) -> Self {
        ReportError::Query(e)
    }
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::Encode(e)
    }
}

/// Produces report CSV, serving repeats from the cache.
pub struct ReportService<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for ReportService<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<E> {
    cache: ResultCache,
    templates: Box<dyn TemplateStore>,
    executor: E,
    roster_path: PathBuf,
    scope: ProjectScope,
    query_timeout: Duration,
}

impl<E: QueryExecutor> ReportService<E> {
    pub fn new(
        executor: E,
        cache: ResultCache,
        templates: Box<dyn TemplateStore>,
        roster_path: impl Into<PathBuf>,
        scope: ProjectScope,
        query_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                templates,
                executor,
                roster_path: roster_path.into(),
                scope,
                query_timeout,
            }),
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.inner.cache
    }

    pub fn roster_path(&self) -> &Path {
        &self.inner.roster_path
    }

    /// Fresh read of the roster file.
    pub fn load_roster(&self) -> Result<RosterSnapshot, RosterError> {
        load_roster(&self.inner.roster_path)
    }

    /// CSV bytes for `report` under `filters`. Filters the report does not
    /// accept are ignored.
    ///
    /// A miss is computed on a detached task, so the result is still
    /// cached if the caller goes away before it finishes. Failures are
    /// returned and never cached.
    pub async fn generate(&self, report: Report, filters: &FilterSet) -> Result<Bytes, ReportError> {
        let filters = filters.restricted_to(report);
        let key = cache_key(report.name(), &filters);

        if let Some(hit) = self.inner.cache.get(&key).await {
            log::debug!("cache hit: {key}");
            return Ok(hit);
        }
        log::debug!("cache miss: {key}");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.compute(report, &filters, key).await })
            .await
            .map_err(|e| ReportError::Task(e.to_string()))?
    }

    /// The SQL and bound parameters `generate` would run, without running it.
    pub fn prepare(&self, report: Report, filters: &FilterSet) -> Result<AssembledQuery, ReportError> {
        self.inner.prepare(report, &filters.restricted_to(report))
    }
}

impl<E: QueryExecutor> Inner<E> {
    fn prepare(&self, report: Report, filters: &FilterSet) -> Result<AssembledQuery, ReportError> {
        let template = self.templates.load(report.name())?;
        let roster = match report.roster_subset() {
            RosterSubset::None => RosterSnapshot::default(),
            _ => load_roster(&self.roster_path)?,
        };
        Ok(assemble(&template, report, filters, &roster, &self.scope)?)
    }

    async fn compute(&self, report: Report, filters: &FilterSet, key: String) -> Result<Bytes, ReportError> {
        let query = self.prepare(report, filters)?;
        let result = self
            .executor
            .execute(&query.sql, &query.params, self.query_timeout)
            .await?;
        let body = Bytes::from(encode_csv(&result)?);
        log::info!(
            "report {} generated: {} rows, {} bytes",
            report.name(),
            result.rows.len(),
            body.len()
        );
        self.cache.set(key, body.clone()).await;
        Ok(body)
    }
}
