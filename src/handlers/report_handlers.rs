use std::collections::HashMap;

use actix_web::http::header;
use actix_web::{HttpResponse, web};

use crate::errors::AppError;
use crate::models::report::{FilterSet, QueryExecutor, Report, ReportService};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const CACHE_CONTROL: &str = "public, max-age=30";

/// GET /api/v1/{report}.csv - Report as CSV.
/// Query params: the report's filters (scope, kab_kota, bidang, instansi,
/// jabatan, status); others are ignored.
pub async fn report_csv<E: QueryExecutor>(
    service: web::Data<ReportService<E>>,
    path: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let name = path.into_inner();
    let report = Report::from_name(&name).ok_or(AppError::UnknownReport(name))?;
    let filters = FilterSet::from_query(report, &query);

    let body = service.generate(report, &filters).await?;

    Ok(HttpResponse::Ok()
        .content_type(CSV_CONTENT_TYPE)
        .insert_header((header::CACHE_CONTROL, CACHE_CONTROL))
        .body(body))
}
