//! Runs against a real Postgres when `TEST_DATABASE_URL` is set; every test
//! is a no-op otherwise.

mod common;

use std::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

use common::{SMALL_ROSTER, project_scope, write_roster};
use serumpun_api::cache::ResultCache;
use serumpun_api::db;
use serumpun_api::models::report::{
    EmbeddedTemplates, FilterSet, PgExecutor, QueryError, QueryExecutor, Report, ReportService,
    encode_csv,
};

const TIMEOUT: Duration = Duration::from_secs(10);

fn executor() -> Option<PgExecutor> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = db::init_pool(&url).expect("Failed to create test pool");
    Some(PgExecutor::new(pool))
}

#[tokio::test]
async fn values_decode_to_text() {
    let Some(exec) = executor() else { return };

    let rs = exec
        .execute(
            "SELECT $1::text AS nama, 7::int4 AS total, 42::int8 AS besar, \
             12.5::float8 AS persen, true AS aktif, DATE '2026-03-01' AS tanggal, \
             NULL::text AS kosong",
            &["Ani".to_string()],
            TIMEOUT,
        )
        .await
        .unwrap();

    assert_eq!(
        rs.columns,
        vec!["nama", "total", "besar", "persen", "aktif", "tanggal", "kosong"]
    );
    assert_eq!(
        rs.rows,
        vec![vec![
            Some("Ani".to_string()),
            Some("7".to_string()),
            Some("42".to_string()),
            Some("12.5".to_string()),
            Some("true".to_string()),
            Some("2026-03-01".to_string()),
            None,
        ]]
    );
    assert_eq!(
        encode_csv(&rs).unwrap(),
        b"nama,total,besar,persen,aktif,tanggal,kosong\nAni,7,42,12.5,true,2026-03-01,\n"
    );
}

#[tokio::test]
async fn empty_result_keeps_header() {
    let Some(exec) = executor() else { return };

    let rs = exec
        .execute("SELECT 1::int4 AS a, 'x'::text AS b WHERE false", &[], TIMEOUT)
        .await
        .unwrap();
    assert_eq!(rs.columns, vec!["a", "b"]);
    assert!(rs.rows.is_empty());
}

#[tokio::test]
async fn slow_query_times_out() {
    let Some(exec) = executor() else { return };

    let err = exec
        .execute("SELECT 1::int4 AS s FROM pg_sleep(5)", &[], Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Timeout(_)), "got {err}");
}

#[tokio::test]
async fn store_error_is_surfaced() {
    let Some(exec) = executor() else { return };

    let err = exec
        .execute("SELECT * FROM no_such_table_here", &[], TIMEOUT)
        .await
        .unwrap_err();
    match err {
        QueryError::Execution(msg) => assert!(msg.contains("no_such_table_here"), "{msg}"),
        other => panic!("expected execution error, got {other}"),
    }
}

#[tokio::test]
async fn unsupported_type_is_reported() {
    let Some(exec) = executor() else { return };

    let err = exec
        .execute("SELECT '1.5'::numeric AS n", &[], TIMEOUT)
        .await
        .unwrap_err();
    match err {
        QueryError::UnsupportedType { column, type_name } => {
            assert_eq!(column, "n");
            assert_eq!(type_name, "NUMERIC");
        }
        other => panic!("expected unsupported type, got {other}"),
    }
}

// ============================================================================
// REPORT SQL AGAINST A MINIMAL TRACKER SCHEMA
// ============================================================================

const TRACKER_TABLES: &str = "
CREATE TABLE workspaces (id uuid PRIMARY KEY);
CREATE TABLE projects (id uuid PRIMARY KEY, workspace_id uuid NOT NULL);
CREATE TABLE states (id uuid PRIMARY KEY, \"group\" text NOT NULL);
CREATE TABLE users (
  id uuid PRIMARY KEY,
  email text NOT NULL,
  display_name text,
  first_name text,
  last_name text
);
CREATE TABLE labels (id uuid PRIMARY KEY, name text NOT NULL);
CREATE TABLE issues (
  id uuid PRIMARY KEY,
  name text NOT NULL,
  project_id uuid NOT NULL,
  state_id uuid NOT NULL,
  start_date date,
  target_date date,
  created_at timestamptz NOT NULL DEFAULT now(),
  completed_at timestamptz,
  deleted_at timestamptz
);
CREATE TABLE issue_assignees (issue_id uuid, assignee_id uuid, deleted_at timestamptz);
CREATE TABLE issue_labels (issue_id uuid, label_id uuid, deleted_at timestamptz);
CREATE TABLE issue_comments (
  issue_id uuid,
  comment_stripped text,
  created_at timestamptz NOT NULL DEFAULT now()
);
";

/// Pool whose connections resolve unqualified names in a fresh schema.
async fn schema_pool(url: &str) -> (PgPool, String) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    let schema = format!("serumpun_test_{}_{nanos}", std::process::id());

    let set_path = format!("SET search_path TO {schema}");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .after_connect(move |conn, _meta| {
            let sql = set_path.clone();
            Box::pin(async move {
                conn.execute(sql.as_str()).await?;
                Ok(())
            })
        })
        .connect(url)
        .await
        .expect("Failed to connect to test database");

    sqlx::raw_sql(&format!("CREATE SCHEMA {schema}; {TRACKER_TABLES}"))
        .execute(&pool)
        .await
        .expect("Failed to create tracker tables");

    (pool, schema)
}

#[tokio::test]
async fn regional_kpi_head_without_issues_has_zero_row() {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else { return };
    let (pool, schema) = schema_pool(&url).await;

    sqlx::raw_sql(
        "INSERT INTO users (id, email, display_name) VALUES
           ('33333333-3333-3333-3333-333333333333', 'Kab@BPS.go.id', 'Kab Display'),
           ('44444444-4444-4444-4444-444444444444', 'ani@bps.go.id', 'Ani Display');",
    )
    .execute(&pool)
    .await
    .expect("Failed to insert users");

    let (_dir, roster) = write_roster(SMALL_ROSTER);
    let service = ReportService::new(
        PgExecutor::new(pool.clone()),
        ResultCache::new(Duration::from_secs(60)),
        Box::new(EmbeddedTemplates),
        roster,
        project_scope(),
        TIMEOUT,
    );

    let body = service
        .generate(Report::KpiRegion, &FilterSet::new())
        .await
        .unwrap();

    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "nama,email,bidang,instansi,jabatan,backlog,todo,in_progress,done,percent\n\
         Kepala Bintan,kab@bps.go.id,Sosial,BPS Kabupaten Bintan,Ketua,0,0,0,0,0\n"
    );

    sqlx::raw_sql(&format!("DROP SCHEMA {schema} CASCADE"))
        .execute(&pool)
        .await
        .ok();
}
