use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use askama::Template;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::report::{FilterSet, QueryExecutor, Report, ReportService};
use crate::templates_structs::{RosterStatusTemplate, SAMPLE_SIZE};

/// GET /api/v1/debug/roster - Plain-text summary of the roster file.
/// A load failure is reported in the body, not as an error status.
pub async fn roster<E: QueryExecutor>(
    service: web::Data<ReportService<E>>,
) -> Result<HttpResponse, AppError> {
    let path = service.roster_path().display().to_string();

    // Blocking file read; keep it off the worker thread.
    let svc = service.clone();
    let loaded = match web::block(move || svc.load_roster()).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    let tmpl = match loaded {
        Ok(snap) => RosterStatusTemplate {
            path,
            error: None,
            provincial_count: snap.provincial.len(),
            regional_count: snap.regional.len(),
            provincial_sample: snap.provincial.iter().take(SAMPLE_SIZE).cloned().collect(),
            regional_sample: snap.regional.iter().take(SAMPLE_SIZE).cloned().collect(),
            subject_areas: snap.subject_areas,
        },
        Err(error) => RosterStatusTemplate {
            path,
            error: Some(error),
            provincial_count: 0,
            regional_count: 0,
            subject_areas: Vec::new(),
            provincial_sample: Vec::new(),
            regional_sample: Vec::new(),
        },
    };

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(tmpl.render()?))
}

#[derive(Serialize)]
pub struct SqlPreview {
    pub report: &'static str,
    pub sql: String,
    pub params: Vec<String>,
}

/// GET /api/v1/debug/sql/{report} - The assembled SQL and its bound
/// parameters for the given filters. Nothing is executed.
pub async fn sql<E: QueryExecutor>(
    service: web::Data<ReportService<E>>,
    path: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let name = path.into_inner();
    let report = Report::from_name(&name).ok_or(AppError::UnknownReport(name))?;
    let filters = FilterSet::from_query(report, &query);

    let assembled = service.prepare(report, &filters)?;

    Ok(HttpResponse::Ok().json(SqlPreview {
        report: report.name(),
        sql: assembled.sql,
        params: assembled.params,
    }))
}
