use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::filings::FilingLookup;
use super::incidents::IncidentSource;
use super::service::{VerificationRequest, VerificationService};
use crate::workflows::certification::{
    certification_deduction, CertificationDeduction, CertificationScore, CertificationSet,
};
use crate::workflows::trust::{FleetScoreInputs, TailScoreInputs};

/// Router exposing identity resolution, certification scoring, trust scoring and full
/// verification runs.
pub fn verification_router<I, F>(service: Arc<VerificationService<I, F>>) -> Router
where
    I: IncidentSource + 'static,
    F: FilingLookup + 'static,
{
    Router::new()
        .route("/api/v1/identity/resolve", post(resolve_handler::<I, F>))
        .route(
            "/api/v1/certifications/score",
            post(certification_handler::<I, F>),
        )
        .route("/api/v1/trust-score", post(trust_score_handler::<I, F>))
        .route("/api/v1/verifications", post(verification_handler::<I, F>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolveRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrustScoreRequest {
    fleet: FleetScoreInputs,
    tail: TailScoreInputs,
    #[serde(default)]
    as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct CertificationView {
    #[serde(flatten)]
    score: CertificationScore,
    deduction: CertificationDeduction,
}

fn unprocessable(message: &str) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}

pub(crate) async fn resolve_handler<I, F>(
    State(service): State<Arc<VerificationService<I, F>>>,
    Json(request): Json<ResolveRequest>,
) -> Response
where
    I: IncidentSource + 'static,
    F: FilingLookup + 'static,
{
    let resolution = service.index().resolve(&request.name);
    (StatusCode::OK, Json(resolution)).into_response()
}

pub(crate) async fn certification_handler<I, F>(
    State(service): State<Arc<VerificationService<I, F>>>,
    Json(certs): Json<CertificationSet>,
) -> Response
where
    I: IncidentSource + 'static,
    F: FilingLookup + 'static,
{
    let view = CertificationView {
        score: service.scorer().score(&certs),
        deduction: certification_deduction(&certs),
    };
    (StatusCode::OK, Json(view)).into_response()
}

pub(crate) async fn trust_score_handler<I, F>(
    State(service): State<Arc<VerificationService<I, F>>>,
    Json(request): Json<TrustScoreRequest>,
) -> Response
where
    I: IncidentSource + 'static,
    F: FilingLookup + 'static,
{
    let calculated_at = request.as_of.unwrap_or_else(Utc::now);
    let result = service
        .engine()
        .compute(&request.fleet, &request.tail, calculated_at)
        .await;
    (StatusCode::OK, Json(result)).into_response()
}

pub(crate) async fn verification_handler<I, F>(
    State(service): State<Arc<VerificationService<I, F>>>,
    Json(request): Json<VerificationRequest>,
) -> Response
where
    I: IncidentSource + 'static,
    F: FilingLookup + 'static,
{
    if request.operator_name.trim().is_empty() {
        return unprocessable("operator_name must not be blank");
    }

    let report = service.run(request, Utc::now()).await;
    (StatusCode::OK, Json(report)).into_response()
}
