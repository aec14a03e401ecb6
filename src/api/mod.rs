#[cfg(feature = "swagger")]
pub mod openapi;
pub mod error;
pub mod v1;

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;
use crate::forecast::ForecastService;
use crate::ingest::{OpenDataClient, RecordSource};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub service: Arc<ForecastService>,
}

impl AppState {
    /// State backed by the live open-data feed.
    pub fn new(cfg: Config) -> anyhow::Result<Self> {
        let source: Arc<dyn RecordSource> = Arc::new(OpenDataClient::new(&cfg.upstream)?);
        Ok(Self::with_source(cfg, source))
    }

    pub fn with_source(cfg: Config, source: Arc<dyn RecordSource>) -> Self {
        let service = Arc::new(ForecastService::new(source, &cfg));
        Self { cfg, service }
    }
}

pub fn router(state: AppState) -> Router {
    let cfg = state.cfg.clone();
    let mut router = v1::router(state);

    if cfg.server.enable_cors {
        use axum::http::{HeaderValue, Method};
        use tower_http::cors::AllowOrigin;
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::exact(HeaderValue::from_static(
                "http://localhost:3000",
            )))
            .allow_methods([Method::GET])
            .allow_headers([axum::http::header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(ServiceBuilder::new().layer(TimeoutLayer::new(Duration::from_secs(
            cfg.server.request_timeout_secs,
        ))))
        .layer(TraceLayer::new_for_http())
}

#[cfg(feature = "swagger")]
pub fn with_swagger(app: Router) -> Router {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;
    app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
}

#[cfg(feature = "metrics")]
pub fn with_metrics(app: Router) -> Router {
    use axum_prometheus::PrometheusMetricLayer;
    let (layer, handle) = PrometheusMetricLayer::pair();

    let metrics_router = Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    );

    app.layer(layer).merge(metrics_router)
}
