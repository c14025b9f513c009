// Presentation layer - HTTP routes over the dashboard view model
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_chart, get_console, get_dashboard, health_check, refresh_vehicle, restart_device,
    set_limit, set_mode, stream_dashboard, toggle_settings,
};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Compression is done in the response builders, so no CompressionLayer here.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/chart", get(get_chart))
        .route("/dashboard/console", get(get_console))
        .route("/dashboard/stream", get(stream_dashboard))
        .route("/dashboard/mode", put(set_mode))
        .route("/dashboard/limit", put(set_limit))
        .route("/dashboard/vehicles/:alias/refresh", post(refresh_vehicle))
        .route("/dashboard/settings/toggle", post(toggle_settings))
        .route("/dashboard/restart", post(restart_device))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::device_service::DeviceService;
    use crate::application::history_service::HistoryService;
    use crate::application::log_sink::{ConsolePanel, LogListener, LogSink};
    use crate::application::testing::{FakeManagerApi, Step};
    use crate::application::vehicle_service::VehicleService;
    use crate::application::view_store::ViewStore;
    use crate::application::wallbox_service::WallboxService;
    use crate::domain::dashboard::{DashboardView, UNKNOWN};
    use crate::domain::vehicle::VehicleDescriptor;
    use crate::domain::wallbox::ChargeMode;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn app(api: Arc<FakeManagerApi>) -> (Router, Arc<AppState>) {
        let view = Arc::new(ViewStore::new(DashboardView::new(UNKNOWN, Vec::new())));
        let console = Arc::new(ConsolePanel::new(60));
        let sink = LogSink::new(vec![console.clone() as Arc<dyn LogListener>]);
        let vehicles = VehicleService::new(
            &[VehicleDescriptor {
                alias: "i32020".to_string(),
                name: "i3".to_string(),
                manufacturer: "bmw".to_string(),
            }],
            api.clone(),
            view.clone(),
            sink.clone(),
            UNKNOWN.to_string(),
            "%Y".to_string(),
        )
        .unwrap();

        let state = Arc::new(AppState {
            view: view.clone(),
            console,
            history: Arc::new(HistoryService::new(api.clone(), view.clone(), sink.clone(), 100)),
            wallbox: Arc::new(WallboxService::new(
                api.clone(),
                view,
                sink.clone(),
                UNKNOWN.to_string(),
                "not connected".to_string(),
            )),
            vehicles: Arc::new(vehicles),
            device: DeviceService::new(api, sink),
        });
        (router(state.clone()), state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = app(Arc::new(FakeManagerApi::default()));

        let response = app.oneshot(request("GET", "/healthz")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_dashboard_snapshot() {
        let (app, _) = app(Arc::new(FakeManagerApi::default()));

        let response = app.oneshot(request("GET", "/dashboard")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let view = body_json(response).await;
        assert_eq!(view["power"]["grid"], UNKNOWN);
        assert_eq!(view["vehicles"][0]["alias"], "i32020");
        assert_eq!(view["settings_visible"], false);
    }

    #[tokio::test]
    async fn test_dashboard_is_brotli_when_accepted() {
        let (app, _) = app(Arc::new(FakeManagerApi::default()));
        let request = Request::builder()
            .uri("/dashboard")
            .header(header::ACCEPT_ENCODING, "br")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.headers()[header::CONTENT_ENCODING], "br");
    }

    #[tokio::test]
    async fn test_set_mode() {
        let api = Arc::new(FakeManagerApi::default());
        let (app, state) = app(api.clone());

        let response = app
            .clone()
            .oneshot(request("PUT", "/dashboard/mode?mode=manual"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(*api.set_modes.lock().unwrap(), vec![ChargeMode::Manual]);
        assert!(state.view.snapshot().mode.manual_menu_visible);

        let response = app
            .oneshot(request("PUT", "/dashboard/mode?mode=turbo"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_negative_limit_is_rejected() {
        let api = Arc::new(FakeManagerApi::default());
        let (app, _) = app(api.clone());

        let response = app
            .oneshot(request("PUT", "/dashboard/limit?limit=-1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(api.power_limits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vehicle_refresh() {
        let api = Arc::new(FakeManagerApi::default());
        api.bmw_state.push(Step::status(500));
        api.bmw_last_update.push(Step::status(500));
        let (app, _) = app(api.clone());

        let response = app
            .clone()
            .oneshot(request("POST", "/dashboard/vehicles/i32020/refresh"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            *api.bmw_state_requests.lock().unwrap(),
            vec![("i32020".to_string(), false)]
        );

        let response = app
            .oneshot(request("POST", "/dashboard/vehicles/model3/refresh"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_toggle_settings() {
        let (app, state) = app(Arc::new(FakeManagerApi::default()));

        let response = app
            .oneshot(request("POST", "/dashboard/settings/toggle"))
            .await
            .unwrap();

        assert_eq!(body_json(response).await["settings_visible"], true);
        assert!(state.view.snapshot().settings_visible);
    }

    #[tokio::test]
    async fn test_restart_failure_is_bad_gateway_and_logged() {
        let api = Arc::new(FakeManagerApi::default());
        api.restart.push(Step::status(500));
        let (app, _) = app(api);

        let response = app
            .clone()
            .oneshot(request("POST", "/dashboard/restart"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = app
            .oneshot(request("GET", "/dashboard/console"))
            .await
            .unwrap();
        let lines = body_json(response).await;
        assert_eq!(lines[0], "> Restarting device...");
        assert!(lines[1].as_str().unwrap().starts_with("> Could not restart device"));
    }
}
