use actix_cors::Cors;
use actix_files::Files;
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use log::info;

use insurance_predictor::models::ApiResponse;
use insurance_predictor::{load_model, routes, AppState, ServerConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    info!("Starting insurance cost predictor");

    let config = ServerConfig::from_env().context("invalid configuration")?;

    let model = load_model(&config.model_path)
        .with_context(|| format!("cannot load model from {}", config.model_path.display()))?;
    let model_info = model.info();
    info!(
        "Loaded {} model from {}",
        model_info.backend,
        config.model_path.display()
    );
    info!("Categorical policy: {:?}", config.category_policy);

    let state = web::Data::new(AppState::new(model, config.category_policy));
    let bind_address = config.bind_address();
    let allowed_origins = config.allowed_origins();
    let static_dir = config.static_dir.clone();

    info!("Listening on http://{}", bind_address);
    info!("Workers: {}", config.workers);
    info!("Endpoints:");
    info!("   GET  /                - Prediction form");
    info!("   POST /                - Submit form");
    info!("   GET  /api/health      - Liveness");
    info!("   GET  /api/model-info  - Loaded model");
    info!("   POST /api/predict     - JSON prediction");

    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .wrap(cors)
            .app_data(state.clone())
            .configure(routes::configure)
            .service(Files::new("/static", static_dir.clone()).prefer_utf8(true))
            .default_service(web::route().to(|| async {
                HttpResponse::NotFound().json(ApiResponse::<()>::error("endpoint not found"))
            }))
    })
    .workers(config.workers)
    .bind(&bind_address)
    .with_context(|| format!("cannot bind {}", bind_address))?
    .run()
    .await?;

    Ok(())
}
