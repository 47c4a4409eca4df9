//! Shared test infrastructure for service and handler tests.
//!
//! - `write_roster()` - roster CSV in a temp dir
//! - `FakeExecutor` - records every query and returns a canned result
//! - `test_service()` - `ReportService` wired to the fake executor
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use serumpun_api::cache::ResultCache;
use serumpun_api::models::report::{
    EmbeddedTemplates, ProjectScope, QueryError, QueryExecutor, ReportService, ResultSet,
};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const WORKSPACE_ID: &str = "11111111-1111-1111-1111-111111111111";
pub const PROJECT_ID: &str = "22222222-2222-2222-2222-222222222222";

pub const ROSTER_HEADER: &str = "No,Nama,Akun Gmail,Asal Instansi,Jabatan Dalam Tim SE2026\n";

/// One provincial subject-area chair and one regional head.
pub const SMALL_ROSTER: &str = "\
1,Ani Provinsi,ani@bps.go.id,BPS Provinsi Kepulauan Riau,Ketua Bidang Sosial
2,Kepala Bintan,kab@bps.go.id,BPS Kabupaten Bintan,Kepala Kab/Kot
";

// ============================================================================
// ROSTER FIXTURES
// ============================================================================

/// Write `body` below the standard header. Keep the `TempDir` alive for as
/// long as the path is used.
pub fn write_roster(body: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("roster.csv");
    std::fs::write(&path, format!("{ROSTER_HEADER}{body}")).expect("Failed to write roster");
    (dir, path)
}

// ============================================================================
// FAKE EXECUTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedQuery {
    pub sql: String,
    pub params: Vec<String>,
}

#[derive(Clone)]
pub struct FakeExecutor {
    calls: Arc<Mutex<Vec<ExecutedQuery>>>,
    failure: Arc<Mutex<Option<String>>>,
    result: ResultSet,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::with_result(sample_result())
    }

    pub fn with_result(result: ResultSet) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            result,
        }
    }

    /// Make every following call fail with `message`, or succeed again on `None`.
    pub fn fail_with(&self, message: Option<&str>) {
        *self.failure.lock().unwrap() = message.map(String::from);
    }

    pub fn calls(&self) -> Vec<ExecutedQuery> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl QueryExecutor for FakeExecutor {
    async fn execute(
        &self,
        sql: &str,
        params: &[String],
        _timeout: Duration,
    ) -> Result<ResultSet, QueryError> {
        self.calls.lock().unwrap().push(ExecutedQuery {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(QueryError::Execution(message)),
            None => Ok(self.result.clone()),
        }
    }
}

pub fn sample_result() -> ResultSet {
    ResultSet {
        columns: vec!["nama".into(), "bidang".into(), "done".into()],
        rows: vec![
            vec![Some("Kepala Bintan".into()), Some("Sosial".into()), Some("4".into())],
            vec![Some("Ani Provinsi".into()), None, Some("0".into())],
        ],
    }
}

// ============================================================================
// SERVICE SETUP
// ============================================================================

pub fn project_scope() -> ProjectScope {
    ProjectScope {
        workspace_id: WORKSPACE_ID.to_string(),
        project_id: PROJECT_ID.to_string(),
    }
}

/// Service over the embedded templates with a 60s cache.
pub fn test_service(executor: FakeExecutor, roster_path: PathBuf) -> ReportService<FakeExecutor> {
    ReportService::new(
        executor,
        ResultCache::new(Duration::from_secs(60)),
        Box::new(EmbeddedTemplates),
        roster_path,
        project_scope(),
        Duration::from_secs(25),
    )
}
