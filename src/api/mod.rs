// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        CreateDeviceRequest, CreatePlatformRequest, DeviceResponse, LoginRequest, LoginResponse,
        MeResponse, PatchDeviceRequest, RefreshRequest, RefreshResponse, UpdateDeviceRequest,
    },
    state::AppState,
    storage::Platform,
};

pub mod admin;
pub mod auth;
pub mod devices;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route(
            "/devices",
            get(devices::list_devices).post(devices::create_device),
        )
        .route(
            "/devices/{device_id}",
            get(devices::get_device)
                .put(devices::update_device)
                .patch(devices::patch_device)
                .delete(devices::delete_device),
        )
        .route("/users/me", get(users::me))
        .route(
            "/admin/platforms",
            get(admin::list_platforms).post(admin::create_platform),
        )
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        auth::login,
        auth::refresh,
        devices::list_devices,
        devices::create_device,
        devices::get_device,
        devices::update_device,
        devices::patch_device,
        devices::delete_device,
        users::me,
        admin::list_platforms,
        admin::create_platform,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            RefreshResponse,
            MeResponse,
            DeviceResponse,
            CreateDeviceRequest,
            UpdateDeviceRequest,
            PatchDeviceRequest,
            CreatePlatformRequest,
            Platform,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Login and token refresh"),
        (name = "Devices", description = "Device management, scoped to the caller"),
        (name = "Users", description = "Authenticated user info"),
        (name = "Admin", description = "Platform registry (staff only)"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

/// Registers the bearer scheme referenced by the `security` attributes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::auth::TokenService;
    use crate::storage::{NewUser, PlatformRepository, Store, UserRepository};
    use axum::body::{to_bytes, Body, Bytes};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Store::open(&temp_dir.path().join("test.redb")).expect("Failed to open store");
        let state = AppState::new(Arc::new(store), TokenService::new(b"test-signing-secret"));
        (state, temp_dir)
    }

    fn seed_user(state: &AppState, email: &str, platform_name: &str, password: &str, staff: bool) {
        let platform = PlatformRepository::new(&state.store)
            .get_or_create(platform_name)
            .unwrap();
        UserRepository::new(&state.store)
            .create(NewUser {
                email: email.to_string(),
                platform_id: platform.id,
                password_hash: hash_password(password).unwrap(),
                is_staff: staff,
                is_superuser: staff,
            })
            .unwrap();
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Bytes) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes)
    }

    async fn login(app: &Router, email: &str, platform: &str, password: &str) -> Value {
        let (status, body) = send(
            app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password, "platform": platform })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _temp_dir) = test_state();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn health_reports_store_status() {
        let (state, _temp_dir) = test_state();
        let app = router(state);

        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["checks"]["store"], "ok");
    }

    #[tokio::test]
    async fn devices_require_bearer_token() {
        let (state, _temp_dir) = test_state();
        let app = router(state);

        let (status, _) = send(&app, "GET", "/devices", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/devices", Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_failures_are_byte_identical_over_http() {
        let (state, _temp_dir) = test_state();
        seed_user(&state, "user@example.com", "Android", "android-pass", false);
        let app = router(state);

        let (bad_platform_status, bad_platform) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "user@example.com", "password": "android-pass", "platform": "Windows" })),
        )
        .await;
        let (bad_password_status, bad_password) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "user@example.com", "password": "wrong", "platform": "Android" })),
        )
        .await;

        assert_eq!(bad_platform_status, StatusCode::UNAUTHORIZED);
        assert_eq!(bad_password_status, StatusCode::UNAUTHORIZED);
        assert_eq!(bad_platform, bad_password);
    }

    #[tokio::test]
    async fn device_crud_stays_inside_the_caller_platform() {
        let (state, _temp_dir) = test_state();
        seed_user(&state, "user@example.com", "Android", "android-pass", false);
        seed_user(&state, "user@example.com", "iOS", "ios-pass", false);
        let app = router(state);

        let android = login(&app, "user@example.com", "Android", "android-pass").await;
        let android_token = android["access"].as_str().unwrap();

        // is_active omitted on purpose: it must default to true
        let (status, body) = send(
            &app,
            "POST",
            "/devices",
            Some(android_token),
            Some(json!({ "name": "Pixel 9", "ip_address": "192.168.1.10" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let device: Value = serde_json::from_slice(&body).unwrap();
        let device_id = device["id"].as_str().unwrap().to_string();
        assert_eq!(device["is_active"], true);

        let (status, body) = send(&app, "GET", "/devices", Some(android_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let listed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);

        // Same email on iOS is a different identity and sees nothing
        let ios = login(&app, "user@example.com", "iOS", "ios-pass").await;
        let ios_token = ios["access"].as_str().unwrap();
        assert_ne!(android["user_id"], ios["user_id"]);

        let (status, body) = send(&app, "GET", "/devices", Some(ios_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let listed: Value = serde_json::from_slice(&body).unwrap();
        assert!(listed.as_array().unwrap().is_empty());

        let (status, _) = send(
            &app,
            "GET",
            &format!("/devices/{device_id}"),
            Some(ios_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/devices/{device_id}"),
            Some(android_token),
            Some(json!({ "is_active": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let patched: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(patched["is_active"], false);
        assert_eq!(patched["name"], "Pixel 9");

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/devices/{device_id}"),
            Some(android_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "GET", "/devices", Some(android_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let listed: Value = serde_json::from_slice(&body).unwrap();
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_ignores_client_supplied_scope_fields() {
        let (state, _temp_dir) = test_state();
        seed_user(&state, "owner@example.com", "Android", "password123", false);
        let app = router(state);

        let owner = login(&app, "owner@example.com", "Android", "password123").await;
        let token = owner["access"].as_str().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            "/devices",
            Some(token),
            Some(json!({
                "name": "Pixel 9",
                "ip_address": "10.0.0.1",
                "user_id": "intruder",
                "platform_id": "forged-platform"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let device: Value = serde_json::from_slice(&body).unwrap();
        let device_id = device["id"].as_str().unwrap();

        // The device landed in the caller's scope, not the forged one
        let (status, _) = send(&app, "GET", &format!("/devices/{device_id}"), Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn refresh_flow_works_end_to_end() {
        let (state, _temp_dir) = test_state();
        seed_user(&state, "user@example.com", "Android", "password123", false);
        let app = router(state);

        let tokens = login(&app, "user@example.com", "Android", "password123").await;
        let refresh_token = tokens["refresh"].as_str().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            "/auth/refresh",
            None,
            Some(json!({ "refresh": refresh_token })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let refreshed: Value = serde_json::from_slice(&body).unwrap();
        let access = refreshed["access"].as_str().unwrap();

        let (status, body) = send(&app, "GET", "/users/me", Some(access), None).await;
        assert_eq!(status, StatusCode::OK);
        let me: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(me["email"], "user@example.com");
        assert_eq!(me["platform"], "Android");
    }

    #[tokio::test]
    async fn admin_platform_registry_is_staff_only() {
        let (state, _temp_dir) = test_state();
        seed_user(&state, "user@example.com", "Android", "password123", false);
        seed_user(&state, "root@example.com", "Admin", "password123", true);
        let app = router(state);

        let user = login(&app, "user@example.com", "Android", "password123").await;
        let staff = login(&app, "root@example.com", "Admin", "password123").await;

        let (status, _) = send(
            &app,
            "POST",
            "/admin/platforms",
            Some(user["access"].as_str().unwrap()),
            Some(json!({ "name": "Web" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let staff_token = staff["access"].as_str().unwrap();
        let (status, _) = send(
            &app,
            "POST",
            "/admin/platforms",
            Some(staff_token),
            Some(json!({ "name": "Web" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(
            &app,
            "POST",
            "/admin/platforms",
            Some(staff_token),
            Some(json!({ "name": "Web" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, "GET", "/admin/platforms", Some(staff_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let platforms: Value = serde_json::from_slice(&body).unwrap();
        let names: Vec<&str> = platforms
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Admin", "Android", "Web"]);
    }
}
