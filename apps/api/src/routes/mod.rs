pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::admin::handlers as admin;
use crate::auth::handlers as auth;
use crate::dashboard::handlers as dashboard;
use crate::profiles::handlers as profiles;
use crate::state::AppState;
use crate::storage::MAX_DOCUMENT_BYTES;
use crate::students::handlers as students;
use crate::tickets::handlers as tickets;

/// Headroom for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Backend proxies
        .route("/api/admin/profiles", post(admin::handle_list_profiles))
        .route("/api/users", get(admin::handle_list_users))
        // Auth
        .route("/api/v1/auth/sign-in", post(auth::handle_sign_in))
        .route("/api/v1/auth/sign-up", post(auth::handle_sign_up))
        .route("/api/v1/auth/sign-out", post(auth::handle_sign_out))
        .route("/api/v1/auth/session", get(auth::handle_get_session))
        // Student profile
        .route(
            "/api/v1/students/me",
            get(students::handle_get_me).patch(students::handle_update_me),
        )
        .route(
            "/api/v1/students/me/documents/:kind",
            post(students::handle_upload_document)
                .layer(DefaultBodyLimit::max(MAX_DOCUMENT_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
        // Accounts
        .route(
            "/api/v1/profiles/:id",
            patch(profiles::handle_update_profile).delete(profiles::handle_delete_profile),
        )
        // Dashboard
        .route("/api/v1/dashboard", get(dashboard::handle_get_dashboard))
        .route(
            "/api/v1/notifications",
            get(dashboard::handle_list_notifications),
        )
        .route(
            "/api/v1/notifications/:id/read",
            patch(dashboard::handle_mark_read),
        )
        .route(
            "/api/v1/notifications/:id",
            delete(dashboard::handle_delete_notification),
        )
        // Support
        .route(
            "/api/v1/tickets",
            get(tickets::handle_list_tickets).post(tickets::handle_create_ticket),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::models::notification::{Notification, NotificationKind};
    use crate::models::profile::Role;
    use crate::store::memory::MemoryStore;
    use crate::store::Store;
    use crate::testing::{harness, profile_with_role, token_for, ADMIN_SECRET, PASSWORD};

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness(MemoryStore::default());
        let (status, body) = send(build_router(h.state), get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");
        assert_eq!(body["admin_proxy_enabled"], true);
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_database() {
        let h = harness(MemoryStore::default());
        h.store.fail_reads.store(true, Ordering::SeqCst);
        let (status, body) = send(build_router(h.state), get_request("/health", None)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["database"], "unreachable");
    }

    #[tokio::test]
    async fn test_admin_proxy_rejects_wrong_secret() {
        let h = harness(MemoryStore::with_profiles(vec![profile_with_role(Role::Student)]));
        let (status, body) = send(
            build_router(h.state),
            json_request(Method::POST, "/api/admin/profiles", None, json!({"secret": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_admin_proxy_lists_profiles() {
        let h = harness(MemoryStore::with_profiles(vec![
            profile_with_role(Role::Student),
            profile_with_role(Role::Company),
        ]));
        let (status, body) = send(
            build_router(h.state),
            json_request(
                Method::POST,
                "/api/admin/profiles",
                None,
                json!({"secret": ADMIN_SECRET}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_admin_proxy_backend_error_is_500() {
        let h = harness(MemoryStore::default());
        h.store.fail_reads.store(true, Ordering::SeqCst);
        let (status, _) = send(
            build_router(h.state),
            json_request(
                Method::POST,
                "/api/admin/profiles",
                None,
                json!({"secret": ADMIN_SECRET}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_user_listing_paginates_for_admin() {
        let admin = profile_with_role(Role::Admin);
        let h = harness(MemoryStore::with_profiles(vec![admin.clone()]));
        for i in 0..3 {
            h.identity
                .register(uuid::Uuid::new_v4(), &format!("user{i}@univ.fr"));
        }
        let (status, body) = send(
            build_router(h.state),
            get_request("/api/users?page=2&limit=2", Some(&token_for(admin.id))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 2);
        assert_eq!(body["users"].as_array().unwrap().len(), 1);
        assert_eq!(body["users"][0]["email"], "user2@univ.fr");
    }

    #[tokio::test]
    async fn test_user_listing_requires_admin_session() {
        let student = profile_with_role(Role::Student);
        let h = harness(MemoryStore::with_profiles(vec![student.clone()]));
        h.identity.register(uuid::Uuid::new_v4(), "someone@univ.fr");

        let (status, _) = send(
            build_router(h.state.clone()),
            get_request("/api/users", None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            build_router(h.state),
            get_request("/api/users", Some(&token_for(student.id))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.get("users").is_none());
    }

    #[tokio::test]
    async fn test_user_listing_provider_error_is_500_with_body() {
        let admin = profile_with_role(Role::Admin);
        let h = harness(MemoryStore::with_profiles(vec![admin.clone()]));
        h.identity.fail_listing.store(true, Ordering::SeqCst);
        let (status, body) = send(
            build_router(h.state),
            get_request("/api/users", Some(&token_for(admin.id))),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "IDENTITY_ERROR");
    }

    #[tokio::test]
    async fn test_sign_in_creates_profile_and_student_on_first_login() {
        let h = harness(MemoryStore::default());
        let id = uuid::Uuid::new_v4();
        h.identity.register(id, "new@univ.fr");

        let (status, body) = send(
            build_router(h.state.clone()),
            json_request(
                Method::POST,
                "/api/v1/auth/sign-in",
                None,
                json!({"email": "new@univ.fr", "password": PASSWORD}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["role"], "student");
        assert!(h.store.fetch_student(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sign_in_bad_password_is_401() {
        let h = harness(MemoryStore::default());
        h.identity.register(uuid::Uuid::new_v4(), "a@univ.fr");
        let (status, body) = send(
            build_router(h.state),
            json_request(
                Method::POST,
                "/api/v1/auth/sign-in",
                None,
                json!({"email": "a@univ.fr", "password": "wrong"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_student_me_requires_bearer() {
        let h = harness(MemoryStore::default());
        let (status, _) =
            send(build_router(h.state), get_request("/api/v1/students/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_new_student_me_reports_zero_completion_with_prompt() {
        let profile = profile_with_role(Role::Student);
        let h = harness(MemoryStore::with_profiles(vec![profile.clone()]));
        let token = token_for(profile.id);

        let (status, body) = send(
            build_router(h.state),
            get_request("/api/v1/students/me", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["completion"]["percentage"], 0);
        assert_eq!(body["completion"]["show_prompt"], true);
    }

    #[tokio::test]
    async fn test_patch_student_me_updates_completion() {
        let profile = profile_with_role(Role::Student);
        let h = harness(MemoryStore::with_profiles(vec![profile.clone()]));
        let token = token_for(profile.id);

        let (status, body) = send(
            build_router(h.state),
            json_request(
                Method::PATCH,
                "/api/v1/students/me",
                Some(&token),
                json!({
                    "education_level": "Licence",
                    "school": "Paris-Saclay",
                    "biography": "Étudiante en L3 informatique",
                    "skills": [{"label": "SQL"}],
                    "languages": []
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["completion"]["percentage"], 60);
        assert_eq!(body["completion"]["show_prompt"], false);
    }

    #[tokio::test]
    async fn test_patch_student_me_invalid_draft_is_400() {
        let profile = profile_with_role(Role::Student);
        let h = harness(MemoryStore::with_profiles(vec![profile.clone()]));
        let token = token_for(profile.id);

        let (status, body) = send(
            build_router(h.state),
            json_request(
                Method::PATCH,
                "/api/v1/students/me",
                Some(&token),
                json!({ "school": "ENS" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("biography"));
    }

    #[tokio::test]
    async fn test_profile_elevation_without_secret_is_403() {
        let profile = profile_with_role(Role::Student);
        let h = harness(MemoryStore::with_profiles(vec![profile.clone()]));
        let token = token_for(profile.id);

        let (status, _) = send(
            build_router(h.state.clone()),
            json_request(
                Method::PATCH,
                &format!("/api/v1/profiles/{}", profile.id),
                Some(&token),
                json!({ "role": "admin" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let stored = h.store.fetch_profile(profile.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Student);
    }

    #[tokio::test]
    async fn test_delete_admin_profile_is_403() {
        let admin = profile_with_role(Role::Admin);
        let h = harness(MemoryStore::with_profiles(vec![admin.clone()]));
        let token = token_for(admin.id);

        let request = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/v1/profiles/{}", admin.id))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(build_router(h.state.clone()), request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(h.store.profile_count(), 1);
    }

    #[tokio::test]
    async fn test_company_dashboard_has_no_student_section() {
        let profile = profile_with_role(Role::Company);
        let h = harness(MemoryStore::with_profiles(vec![profile.clone()]));
        let token = token_for(profile.id);

        let (status, body) = send(
            build_router(h.state.clone()),
            get_request("/api/v1/dashboard", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dashboard"]["selected_tab"], "home");
        assert_eq!(body["dashboard"]["notifications"], json!([]));
        assert!(body["student"].is_null());
    }

    #[tokio::test]
    async fn test_notification_read_and_delete_are_persisted() {
        let profile = profile_with_role(Role::Student);
        let h = harness(MemoryStore::with_profiles(vec![profile.clone()]));
        let token = token_for(profile.id);
        let notification = Notification {
            id: uuid::Uuid::new_v4(),
            profile_id: profile.id,
            kind: NotificationKind::School,
            title: "Inscription".to_string(),
            message: "Votre dossier est complet".to_string(),
            created_at: chrono::Utc::now(),
            read: false,
        };
        h.store.seed_notifications(vec![notification.clone()]);
        let uri = format!("/api/v1/notifications/{}", notification.id);

        let (status, _) = send(
            build_router(h.state.clone()),
            json_request(Method::PATCH, &format!("{uri}/read"), Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let stored = h.store.list_notifications(profile.id).await.unwrap();
        assert!(stored[0].read);

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(build_router(h.state.clone()), delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(h.store.list_notifications(profile.id).await.unwrap().is_empty());

        let (status, body) = send(
            build_router(h.state),
            json_request(Method::PATCH, &format!("{uri}/read"), Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_ticket_create_and_list() {
        let profile = profile_with_role(Role::Student);
        let h = harness(MemoryStore::with_profiles(vec![profile.clone()]));
        let token = token_for(profile.id);

        let (status, body) = send(
            build_router(h.state.clone()),
            json_request(
                Method::POST,
                "/api/v1/tickets",
                Some(&token),
                json!({"subject": "Bug", "message": "Impossible d'envoyer mon CV"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "open");

        let (status, body) = send(
            build_router(h.state),
            get_request("/api/v1/tickets", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
