// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Role,
    models::{Image, Ingredient, Instruction, Recipe, User},
    recipes::{FieldError, RecipeRequest},
    state::AppState,
    storage::{AuditEvent, AuditEventType},
    throttle,
};

pub mod admin;
pub mod authentication;
pub mod health;
pub mod recipes;
pub mod users;

/// Build the application router.
///
/// CORS admits only `client_origin`, with credentials.
pub fn router(state: AppState, client_origin: HeaderValue) -> Router {
    let identity_routes = Router::new()
        .route("/authenticate", post(authentication::authenticate))
        .route("/logout", post(authentication::logout))
        .route_layer(middleware::from_fn_with_state(
            state.throttle.clone(),
            throttle::throttle,
        ));

    let v1_routes = Router::new()
        .route(
            "/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/{recipe_id}",
            get(recipes::get_recipe)
                .put(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::get_current_user))
        .route("/users/{user_id}/roles", put(users::update_roles))
        .route("/users/{user_id}/active", put(users::update_active))
        .route("/admin/audit", get(admin::query_audit_logs));

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(client_origin))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .merge(identity_routes)
        .nest("/v1", v1_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        authentication::authenticate,
        authentication::logout,
        recipes::list_recipes,
        recipes::create_recipe,
        recipes::get_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        users::get_current_user,
        users::list_users,
        users::update_roles,
        users::update_active,
        admin::query_audit_logs,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Recipe,
            Ingredient,
            Instruction,
            Image,
            RecipeRequest,
            FieldError,
            User,
            Role,
            AuditEvent,
            AuditEventType,
            authentication::DidTokenRequest,
            users::UpdateRolesRequest,
            users::UpdateActiveRequest,
            admin::AuditLogResponse,
            health::ReadyResponse,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Identity", description = "DID token login and logout"),
        (name = "Recipes", description = "Recipe management"),
        (name = "Users", description = "User records and administration"),
        (name = "Admin", description = "Audit trail"),
        (name = "Health", description = "Probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MagicUserMetadata, MockDidTokenVerifier, VerifierError};
    use crate::state::test_support::{signed_in, state_with, test_state};
    use crate::storage::{AuditRepository, UserStore};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const ORIGIN: &str = "http://localhost:5173";

    fn app(state: AppState) -> Router {
        router(state, HeaderValue::from_static(ORIGIN))
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn recipe_body(name: &str) -> Value {
        json!({
            "name": name,
            "cookTime": 20,
            "prepTime": 10,
            "ingredients": [{ "name": "Flour", "quantity": 2, "unit": "cup" }],
            "instructions": [{ "text": "Mix." }]
        })
    }

    fn did_request(uri: &str) -> Request<Body> {
        request(Method::POST, uri, None, Some(json!({ "didToken": "did-token" })))
    }

    #[tokio::test]
    async fn liveness_is_public() {
        let (state, _temp) = test_state();
        let response = app(state)
            .oneshot(request(Method::GET, "/health/live", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn health_reports_components() {
        let (state, _temp) = test_state();
        let response = app(state)
            .oneshot(request(Method::GET, "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["checks"]["user_db"], "ok");
    }

    #[tokio::test]
    async fn recipes_require_bearer_token() {
        let (state, _temp) = test_state();
        let response = app(state)
            .oneshot(request(Method::GET, "/v1/recipes", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_recipe_list_is_an_array() {
        let (state, _temp) = test_state();
        let (_, token) = signed_in(&state, "cook@example.com", vec![Role::Member]);
        let response = app(state)
            .oneshot(request(Method::GET, "/v1/recipes", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn recipe_lifecycle_enforces_ownership() {
        let (state, _temp) = test_state();
        let (owner, owner_token) = signed_in(&state, "owner@example.com", vec![Role::Member]);
        let (_, other_token) = signed_in(&state, "other@example.com", vec![Role::Member]);
        let app = app(state.clone());

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/v1/recipes", Some(&owner_token), Some(recipe_body("Bread"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["createdBy"], owner.id.as_str());
        let uri = format!("/v1/recipes/{}", created["id"].as_str().unwrap());

        let response = app
            .clone()
            .oneshot(request(Method::PUT, &uri, Some(&other_token), Some(recipe_body("Stolen"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(request(Method::DELETE, &uri, Some(&owner_token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request(Method::GET, &uri, Some(&owner_token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_recipe_returns_field_errors() {
        let (state, _temp) = test_state();
        let (_, token) = signed_in(&state, "cook@example.com", vec![Role::Member]);
        let response = app(state)
            .oneshot(request(Method::POST, "/v1/recipes", Some(&token), Some(json!({}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation failed");
        assert!(!body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn authenticate_returns_plain_jwt() {
        let mut verifier = MockDidTokenVerifier::new();
        verifier.expect_get_metadata().times(1).returning(|_| {
            Ok(Some(MagicUserMetadata {
                email: Some("new@example.com".to_string()),
                issuer: Some("did:ethr:0x01".to_string()),
                public_address: None,
            }))
        });
        verifier.expect_logout().times(0);
        let (state, _temp) = state_with(verifier, 10);

        let response = app(state.clone())
            .oneshot(did_request("/authenticate"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let token = String::from_utf8(bytes.to_vec()).unwrap();

        let claims = state.tokens.verify(&token).unwrap();
        assert_eq!(claims.email, "new@example.com");
        assert!(state.users.find_by_email("new@example.com").unwrap().is_some());
    }

    #[tokio::test]
    async fn rejected_login_is_401_and_audited() {
        let mut verifier = MockDidTokenVerifier::new();
        verifier.expect_get_metadata().returning(|_| Ok(None));
        verifier.expect_logout().times(1).returning(|_| Ok(()));
        let (state, _temp) = state_with(verifier, 10);

        let response = app(state.clone())
            .oneshot(did_request("/authenticate"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let events = AuditRepository::new(&state.storage).read_events(&today).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::AuthFailure);
        assert!(!events[0].success);
    }

    #[tokio::test]
    async fn logout_returns_no_content() {
        let mut verifier = MockDidTokenVerifier::new();
        verifier
            .expect_logout()
            .withf(|token| token == "did-token")
            .times(1)
            .returning(|_| Ok(()));
        let (state, _temp) = state_with(verifier, 10);

        let response = app(state).oneshot(did_request("/logout")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn undecodable_logout_token_is_400() {
        let mut verifier = MockDidTokenVerifier::new();
        verifier
            .expect_logout()
            .returning(|_| Err(VerifierError::MalformedToken("not base64".to_string())));
        let (state, _temp) = state_with(verifier, 10);

        let response = app(state).oneshot(did_request("/logout")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn identity_routes_are_throttled() {
        let mut verifier = MockDidTokenVerifier::new();
        verifier.expect_logout().returning(|_| Ok(()));
        let (state, _temp) = state_with(verifier, 1);
        let app = app(state);

        let first = app.clone().oneshot(did_request("/logout")).await.unwrap();
        assert_eq!(first.status(), StatusCode::NO_CONTENT);

        let second = app.clone().oneshot(did_request("/logout")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(header::RETRY_AFTER));

        // Recipe routes are not throttled.
        let health = app
            .oneshot(request(Method::GET, "/health/live", None, None))
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn user_admin_requires_admin_role() {
        let (state, _temp) = test_state();
        let (_, member_token) = signed_in(&state, "cook@example.com", vec![Role::Member]);
        let response = app(state)
            .oneshot(request(Method::GET, "/v1/users", Some(&member_token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_can_deactivate_user_but_not_self() {
        let (state, _temp) = test_state();
        let (admin, admin_token) = signed_in(&state, "boss@example.com", vec![Role::Admin]);
        let (member, _) = signed_in(&state, "cook@example.com", vec![Role::Member]);
        let app = app(state.clone());
        let body = json!({ "isActive": false });

        let response = app
            .clone()
            .oneshot(request(
                Method::PUT,
                &format!("/v1/users/{}/active", member.id),
                Some(&admin_token),
                Some(body.clone()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!state.users.find_by_id(&member.id).unwrap().unwrap().is_active);

        let response = app
            .oneshot(request(
                Method::PUT,
                &format!("/v1/users/{}/active", admin.id),
                Some(&admin_token),
                Some(body),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_role_set_is_rejected() {
        let (state, _temp) = test_state();
        let (_, admin_token) = signed_in(&state, "boss@example.com", vec![Role::Admin]);
        let (member, _) = signed_in(&state, "cook@example.com", vec![Role::Member]);

        let response = app(state)
            .oneshot(request(
                Method::PUT,
                &format!("/v1/users/{}/roles", member.id),
                Some(&admin_token),
                Some(json!({ "roles": [] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_cannot_drop_own_admin_role() {
        let (state, _temp) = test_state();
        let (admin, admin_token) = signed_in(&state, "boss@example.com", vec![Role::Admin]);
        let app = app(state.clone());
        let uri = format!("/v1/users/{}/roles", admin.id);

        let response = app
            .clone()
            .oneshot(request(
                Method::PUT,
                &uri,
                Some(&admin_token),
                Some(json!({ "roles": ["member"] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let stored = state.users.find_by_id(&admin.id).unwrap().unwrap();
        assert_eq!(stored.roles, vec![Role::Admin]);

        let response = app
            .oneshot(request(
                Method::PUT,
                &uri,
                Some(&admin_token),
                Some(json!({ "roles": ["admin", "member"] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn audit_query_rejects_reversed_range() {
        let (state, _temp) = test_state();
        let (_, admin_token) = signed_in(&state, "boss@example.com", vec![Role::Admin]);

        let response = app(state)
            .oneshot(request(
                Method::GET,
                "/v1/admin/audit?start_date=2026-03-02&end_date=2026-03-01",
                Some(&admin_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_only() {
        let (state, _temp) = test_state();
        let app = app(state);

        let preflight = |origin: &'static str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/v1/recipes")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap()
        };

        let allowed = app.clone().oneshot(preflight(ORIGIN)).await.unwrap();
        assert_eq!(
            allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            ORIGIN
        );
        assert_eq!(
            allowed
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );

        let denied = app.oneshot(preflight("http://evil.example")).await.unwrap();
        assert!(denied
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn openapi_declares_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer"));
        assert!(doc.paths.paths.contains_key("/v1/recipes/{recipe_id}"));
    }
}
