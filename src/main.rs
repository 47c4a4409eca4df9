use actix_web::{App, HttpServer, middleware, web};

use serumpun_api::cache::ResultCache;
use serumpun_api::config::AppConfig;
use serumpun_api::db;
use serumpun_api::handlers;
use serumpun_api::models::report::{
    DirTemplates, EmbeddedTemplates, PgExecutor, ReportService, TemplateStore,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Configuration error: {e}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let pool = db::init_pool(&config.database_url).map_err(|e| {
        log::error!("Failed to create DB pool: {e}");
        std::io::Error::other(e)
    })?;

    let templates: Box<dyn TemplateStore> = match &config.queries_dir {
        Some(dir) => {
            log::info!("Loading SQL templates from {}", dir.display());
            Box::new(DirTemplates::new(dir))
        }
        None => Box::new(EmbeddedTemplates),
    };

    let cache = ResultCache::new(config.cache_ttl);
    if let Some(every) = config.sweep_interval {
        cache.spawn_sweeper(every);
    }

    let service = web::Data::new(ReportService::new(
        PgExecutor::new(pool),
        cache,
        templates,
        config.roster_path.clone(),
        config.scope.clone(),
        config.query_timeout,
    ));

    log::info!(
        "Roster {}, cache TTL {}s, query timeout {}s",
        config.roster_path.display(),
        config.cache_ttl.as_secs(),
        config.query_timeout.as_secs()
    );
    log::info!("Starting server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(service.clone())
            .configure(handlers::configure::<PgExecutor>)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
