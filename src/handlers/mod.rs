pub mod debug_handlers;
pub mod report_handlers;

use actix_web::{HttpResponse, web};

use crate::models::report::QueryExecutor;

async fn healthz() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("ok")
}

/// Register every route. Generic over the executor so tests can swap the
/// database out.
pub fn configure<E: QueryExecutor>(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(healthz));
    cfg.service(
        web::scope("/api/v1")
            .route("/debug/roster", web::get().to(debug_handlers::roster::<E>))
            .route("/debug/sql/{report}", web::get().to(debug_handlers::sql::<E>))
            .route("/{report}.csv", web::get().to(report_handlers::report_csv::<E>)),
    );
}
