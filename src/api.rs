//! JSON HTTP surface over one in-memory dataset.

use crate::analytics::StudentAnalyzer;
use crate::error::AnalyticsError;
use crate::model::RiskPredictor;
use crate::record::StudentRecord;
use crate::risk::GRADE_CUTOFF;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError};
use log::info;
use serde::{Deserialize, Serialize};

pub struct AppState {
    pub data: Vec<StudentRecord>,
    pub predictor: Option<RiskPredictor>,
    pub default_top_n: usize,
}

#[derive(Deserialize)]
pub struct ThresholdQuery {
    threshold: Option<f64>,
}

#[derive(Deserialize)]
pub struct TopQuery {
    n: Option<usize>,
}

#[derive(Deserialize)]
pub struct PredictRequest {
    attendance_rate: f64,
    avg_assignment_score: f64,
    avg_quiz_score: f64,
    forum_posts: f64,
    time_on_platform: f64,
    n_late_submissions: f64,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for AnalyticsError {
    fn status_code(&self) -> StatusCode {
        match self {
            AnalyticsError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AnalyticsError::EmptyDataset { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnalyticsError::NotTrained => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

type ApiResult = Result<HttpResponse, AnalyticsError>;

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Student Analytics API is running!")
}

async fn get_summary(state: web::Data<AppState>) -> ApiResult {
    let summary = StudentAnalyzer::new(&state.data).get_summary_statistics()?;
    Ok(HttpResponse::Ok().json(summary))
}

async fn get_at_risk(state: web::Data<AppState>, query: web::Query<ThresholdQuery>) -> ApiResult {
    let threshold = query.threshold.unwrap_or(GRADE_CUTOFF);
    let at_risk = StudentAnalyzer::new(&state.data).identify_at_risk_students(threshold)?;
    Ok(HttpResponse::Ok().json(at_risk))
}

async fn get_top(state: web::Data<AppState>, query: web::Query<TopQuery>) -> ApiResult {
    let n = query.n.unwrap_or(state.default_top_n);
    let top = StudentAnalyzer::new(&state.data).get_top_performers(n)?;
    Ok(HttpResponse::Ok().json(top))
}

async fn get_correlations(state: web::Data<AppState>) -> ApiResult {
    let correlations = StudentAnalyzer::new(&state.data).calculate_correlations()?;
    Ok(HttpResponse::Ok().json(correlations))
}

async fn get_distribution(state: web::Data<AppState>) -> ApiResult {
    let distribution = StudentAnalyzer::new(&state.data).analyze_performance_distribution()?;
    Ok(HttpResponse::Ok().json(distribution))
}

async fn get_engagement(state: web::Data<AppState>) -> ApiResult {
    let engagement = StudentAnalyzer::new(&state.data).get_engagement_metrics()?;
    Ok(HttpResponse::Ok().json(engagement))
}

async fn predict(state: web::Data<AppState>, req: web::Json<PredictRequest>) -> ApiResult {
    let predictor = state.predictor.as_ref().ok_or(AnalyticsError::NotTrained)?;
    let prediction = predictor.predict_features([
        req.attendance_rate,
        req.avg_assignment_score,
        req.avg_quiz_score,
        req.forum_posts,
        req.time_on_platform,
        req.n_late_submissions,
    ])?;
    Ok(HttpResponse::Ok().json(prediction))
}

async fn get_feature_importance(state: web::Data<AppState>) -> ApiResult {
    let predictor = state.predictor.as_ref().ok_or(AnalyticsError::NotTrained)?;
    Ok(HttpResponse::Ok().json(predictor.feature_importance()?))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/summary", web::get().to(get_summary))
        .route("/at-risk", web::get().to(get_at_risk))
        .route("/top", web::get().to(get_top))
        .route("/correlations", web::get().to(get_correlations))
        .route("/distribution", web::get().to(get_distribution))
        .route("/engagement", web::get().to(get_engagement))
        .route("/model/importance", web::get().to(get_feature_importance))
        .route("/predict", web::post().to(predict));
}

pub async fn start_api(state: AppState, bind_address: &str) -> std::io::Result<()> {
    let state = web::Data::new(state);
    info!(
        "Starting Student Analytics API on http://{} ({} students loaded)",
        bind_address,
        state.data.len()
    );

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind(bind_address)?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::StudentDataGenerator;
    use actix_web::test;

    fn state(n: usize, predictor: Option<RiskPredictor>) -> web::Data<AppState> {
        let data = if n == 0 {
            Vec::new()
        } else {
            StudentDataGenerator::new(42).generate_student_data(n).unwrap()
        };
        web::Data::new(AppState {
            data,
            predictor,
            default_top_n: 10,
        })
    }

    #[actix_web::test]
    async fn test_summary_endpoint() {
        let app = test::init_service(App::new().app_data(state(50, None)).configure(routes)).await;
        let req = test::TestRequest::get().uri("/summary").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_students"], 50);
    }

    #[actix_web::test]
    async fn test_top_endpoint_respects_n() {
        let app = test::init_service(App::new().app_data(state(50, None)).configure(routes)).await;
        let req = test::TestRequest::get().uri("/top?n=3").to_request();
        let body: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), 3);
    }

    #[actix_web::test]
    async fn test_error_status_codes() {
        let app = test::init_service(App::new().app_data(state(0, None)).configure(routes)).await;

        let req = test::TestRequest::get().uri("/distribution").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::get().uri("/model/importance").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_invalid_threshold_is_bad_request() {
        let app = test::init_service(App::new().app_data(state(20, None)).configure(routes)).await;
        let req = test::TestRequest::get().uri("/at-risk?threshold=-5").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
