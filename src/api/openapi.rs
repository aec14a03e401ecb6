use utoipa::OpenApi;

use crate::domain::{
    DataSource, ForecastPoint, ForecastResponse, HistorySummary, ModelKind, SeriesPoint,
};
use crate::forecast::ChartSpec;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::v1::predict,
        crate::api::v1::predict_chart,
        crate::api::v1::healthz,
    ),
    components(
        schemas(
            ForecastResponse,
            HistorySummary,
            SeriesPoint,
            ForecastPoint,
            ModelKind,
            DataSource,
            ChartSpec
        )
    ),
    tags((name = "parking", description = "Parking bay availability forecasts"))
)]
pub struct ApiDoc;
