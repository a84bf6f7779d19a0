use std::sync::Arc;
use std::time::Instant;

use actix_web::error::InternalError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use log::{error, info, warn};

use crate::error::AppError;
use crate::features::{Applicant, ApplicantForm, CategoryPolicy, FeatureVector};
use crate::inference::Predictor;
use crate::models::{ApiResponse, PredictionResult};
use crate::templates::{render_index, PageResult};

/// Shared, read-only state handed to every worker.
pub struct AppState {
    pub model: Arc<dyn Predictor>,
    pub policy: CategoryPolicy,
}

impl AppState {
    pub fn new(model: Arc<dyn Predictor>, policy: CategoryPolicy) -> Self {
        AppState { model, policy }
    }

    async fn predict(&self, features: FeatureVector) -> Result<f32, AppError> {
        let model = Arc::clone(&self.model);
        let prediction = web::block(move || model.predict(&features))
            .await
            .map_err(|e| AppError::Blocking(e.to_string()))??;
        Ok(prediction)
    }
}

/// Registers the form page and the JSON API.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| {
            let response =
                HttpResponse::BadRequest().json(ApiResponse::<()>::error(&err.to_string()));
            InternalError::from_response(err, response).into()
        });

    cfg.service(
        web::resource("/")
            .route(web::get().to(index))
            .route(web::post().to(submit)),
    )
    .service(
        web::scope("/api")
            .app_data(json_config)
            .route("/health", web::get().to(health_check))
            .route("/model-info", web::get().to(model_info))
            .route("/predict", web::post().to(predict)),
    );
}

fn html_page(status: StatusCode, result: PageResult<'_>) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(render_index(result))
}

async fn index() -> impl Responder {
    html_page(StatusCode::OK, PageResult::Empty)
}

async fn submit(state: web::Data<AppState>, form: web::Form<ApplicantForm>) -> impl Responder {
    let features = match form
        .into_inner()
        .into_applicant()
        .and_then(|applicant| applicant.encode(state.policy))
    {
        Ok(features) => features,
        Err(e) => {
            warn!("Rejected form submission: {}", e);
            return html_page(StatusCode::BAD_REQUEST, PageResult::Error(&e.to_string()));
        }
    };

    match state.predict(features).await {
        Ok(cost) => {
            info!("Prediction served: cost={:.2}", cost);
            html_page(StatusCode::OK, PageResult::Prediction(cost))
        }
        Err(e) => {
            error!("Prediction failed: {}", e);
            html_page(
                e.status_code(),
                PageResult::Error("the model could not produce a prediction"),
            )
        }
    }
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success("insurance cost predictor is up"))
}

async fn model_info(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(state.model.info()))
}

async fn predict(
    state: web::Data<AppState>,
    req: web::Json<Applicant>,
) -> Result<HttpResponse, AppError> {
    let start_time = Instant::now();

    let features = req.encode(state.policy).map_err(|e| {
        warn!("Rejected prediction request: {}", e);
        e
    })?;

    let cost = state.predict(features).await.map_err(|e| {
        error!("Prediction failed: {}", e);
        e
    })?;

    info!("Prediction served: cost={:.2}", cost);
    let result = PredictionResult::new(cost, features, &state.model.info().backend);
    Ok(HttpResponse::Ok().json(ApiResponse::success(result).elapsed_since(start_time)))
}
