use actix_cors::Cors;
use actix_web::{
    dev::Server,
    web::{self, Data, Json},
    App, HttpServer,
};

use serde::Serialize;

use domain_db::db::SqliteRepository;

mod cpes;
mod cves;
mod error;
mod telemetry;

pub use error::NOT_FOUND_PAGE;
pub use telemetry::init_logger;

pub struct ApiConfig {
    pub address: String,
    pub port: u16,
    /// Internal errors carry their error chain in the response body.
    pub debug: bool,
    pub repository: SqliteRepository,
}

pub fn run(api_config: ApiConfig) -> Result<Server, anyhow::Error> {
    let application_ctx = Data::new(ApplicationContext::new(
        api_config.repository,
        api_config.debug,
    ));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(application_ctx.clone())
            .configure(routes)
            .wrap(Cors::permissive())
            .wrap(tracing_actix_web::TracingLogger::default())
    })
    .bind((api_config.address, api_config.port))?
    .run();
    Ok(server)
}

/// Registers every route, including the fallback 404 page.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health_check", web::get().to(health_check))
        .service(web::resource("/cpe").route(web::get().to(cpes::search)))
        .service(web::resource("/cve").route(web::get().to(cves::detail)))
        .default_service(web::to(error::not_found));
}

pub struct ApplicationContext {
    repository: SqliteRepository,
    debug: bool,
}

impl ApplicationContext {
    pub fn new(repository: SqliteRepository, debug: bool) -> Self {
        Self { repository, debug }
    }

    pub fn get_repository(&self) -> &SqliteRepository {
        &self.repository
    }

    fn internal_server_error(&self, error: anyhow::Error) -> error::ApplicationError {
        error::internal_server_error(error, self.debug)
    }
}

/// Raw query string pairs, in request order. Repeated keys are kept.
type QueryPairs = Vec<(String, String)>;

/// First non-empty value given for `key`.
fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.to_owned())
}

#[derive(Debug, Serialize)]
struct HealthCheck<'a> {
    version: &'a str,
}

async fn health_check() -> Json<HealthCheck<'static>> {
    Json(HealthCheck {
        version: crate::version(),
    })
}
