use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use super::{error::ApiError, AppState};
use crate::domain::ForecastResponse;
use crate::forecast::ChartSpec;

/// Longest forecast horizon accepted, one week.
pub const MAX_HORIZON_HOURS: u32 = 168;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/predict", get(predict))
        .route("/predict/chart", get(predict_chart))
        .with_state(state)
}

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Parking Prediction API is running. See /predict."
    }))
}

#[cfg_attr(
    feature = "swagger",
    utoipa::path(get, path = "/healthz", responses((status = 200, description = "Service is up")), tag = "parking")
)]
pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg_attr(feature = "swagger", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "swagger", into_params(parameter_in = Query))]
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ForecastQuery {
    /// Zone number; empty or absent means all zones
    pub zone: Option<String>,
    /// Forecast horizon in hours
    #[validate(range(min = 1, max = MAX_HORIZON_HOURS))]
    pub hours: Option<u32>,
}

impl ForecastQuery {
    fn horizon(&self, default: usize) -> usize {
        self.hours.map(|h| h as usize).unwrap_or(default)
    }
}

#[cfg_attr(
    feature = "swagger",
    utoipa::path(
        get,
        path = "/predict",
        params(ForecastQuery),
        responses(
            (status = 200, description = "History summary and hourly forecast", body = ForecastResponse),
            (status = 400, description = "Invalid query parameters")
        ),
        tag = "parking"
    )
)]
pub async fn predict(
    State(st): State<AppState>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let Query(q) = query?;
    q.validate()?;
    let hours = q.horizon(st.service.default_horizon());
    Ok(Json(st.service.predict(q.zone.as_deref(), hours).await))
}

#[cfg_attr(
    feature = "swagger",
    utoipa::path(
        get,
        path = "/predict/chart",
        params(ForecastQuery),
        responses(
            (status = 200, description = "Chart presentation model", body = ChartSpec),
            (status = 400, description = "Invalid query parameters")
        ),
        tag = "parking"
    )
)]
pub async fn predict_chart(
    State(st): State<AppState>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> Result<Json<ChartSpec>, ApiError> {
    let Query(q) = query?;
    q.validate()?;
    let hours = q.horizon(st.service.default_horizon());
    Ok(Json(st.service.chart(q.zone.as_deref(), hours).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, true)]
    #[case(Some(1), true)]
    #[case(Some(MAX_HORIZON_HOURS), true)]
    #[case(Some(0), false)]
    #[case(Some(MAX_HORIZON_HOURS + 1), false)]
    fn test_hours_validation(#[case] hours: Option<u32>, #[case] valid: bool) {
        let q = ForecastQuery { zone: None, hours };
        assert_eq!(q.validate().is_ok(), valid);
    }

    #[test]
    fn test_default_horizon() {
        assert_eq!(ForecastQuery::default().horizon(24), 24);
        let q = ForecastQuery {
            zone: None,
            hours: Some(6),
        };
        assert_eq!(q.horizon(24), 6);
    }
}
