use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use clinic_backend::auth::PasswordAuth;
use clinic_backend::config::{CorsConfig, Settings};
use clinic_backend::database::{create_pool, run_migrations};
use clinic_backend::handlers::AppState;
use clinic_backend::middleware::{RequestAudit, RequestId};
use clinic_backend::{logging, metrics, routes};
use tracing::info;
use tracing_actix_web::TracingLogger;

fn build_cors(config: &CorsConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::HeaderName::from_static(
            clinic_backend::middleware::REQUEST_ID_HEADER,
        )])
        .max_age(3600);

    if config.allows_any_origin() {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;

    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Clinic backend starting...");
    info!("Configuration loaded: {}", settings.server.bind_addr);

    metrics::init_metrics()?;

    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&settings.database).await?;

    info!("Running database migrations...");
    run_migrations(&pool).await?;

    let passwords = PasswordAuth::new(&settings.password)?;
    let app_state = web::Data::new(AppState::new(pool, passwords));

    info!("Starting server on {}", settings.server.bind_addr);

    let cors_config = settings.cors.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(RequestAudit)
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .wrap(build_cors(&cors_config))
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .workers(settings.server.workers.unwrap_or(4))
    .bind(&settings.server.bind_addr)?
    .run()
    .await?;

    Ok(())
}
