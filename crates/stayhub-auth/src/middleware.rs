//! Actix-web request extractors
//!
//! `AuthenticatedUser` resolves the caller's [`Principal`] from a JWT;
//! `AdminUser` additionally requires the admin flag. Errors are returned as
//! `AppError` so they render through its `ResponseError` impl.
//!
//! When a `web::Data<Arc<dyn UserRepository>>` is registered, the token's
//! subject is re-read from the store on every request: a deleted account is
//! `401`, a deactivated one `403`, and the stored admin flag replaces the
//! one in the token.

use crate::jwt::JwtService;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use stayhub_core::error::AppError;
use stayhub_core::models::Principal;
use stayhub_core::traits::{Repository, UserRepository};
use std::sync::Arc;
use tracing::{debug, warn};

/// Extract JWT token from request
///
/// Checks the `Authorization: Bearer` header first, then a cookie named "token".
fn extract_token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    req.cookie("token").map(|cookie| cookie.value().to_string())
}

fn authenticate(req: &HttpRequest) -> Result<Principal, AppError> {
    let jwt_service = req
        .app_data::<web::Data<Arc<JwtService>>>()
        .map(|service| service.get_ref().clone())
        .ok_or_else(|| {
            warn!("JwtService not found in app data");
            AppError::Unauthorized("Authentication service not configured".to_string())
        })?;

    let token = extract_token_from_request(req).ok_or_else(|| {
        debug!("No authentication token found in request");
        AppError::Unauthorized("No authentication token provided".to_string())
    })?;

    let principal = jwt_service.validate_token(&token)?.principal()?;
    ensure_active(&principal)?;

    debug!(user_id = %principal.id, "User authenticated successfully");
    Ok(principal)
}

fn ensure_active(principal: &Principal) -> Result<(), AppError> {
    if !principal.is_active {
        warn!(user_id = %principal.id, "Inactive user rejected");
        return Err(AppError::Forbidden("User account is inactive".to_string()));
    }
    Ok(())
}

/// Replace the token's account flags with the stored ones
async fn refresh_from_store(
    users: Arc<dyn UserRepository>,
    principal: Principal,
) -> Result<Principal, AppError> {
    let user = users.find_by_id(principal.id).await?.ok_or_else(|| {
        warn!(user_id = %principal.id, "Token subject no longer exists");
        AppError::Unauthorized("User not found".to_string())
    })?;

    let principal = Principal {
        id: user.id,
        email: user.email,
        is_active: user.is_active,
        is_admin: user.is_admin,
    };
    ensure_active(&principal)?;
    Ok(principal)
}

/// Validate the token now, then consult the user store if one is registered
fn resolve(req: &HttpRequest) -> LocalBoxFuture<'static, Result<Principal, AppError>> {
    let authenticated = authenticate(req);
    let users = req
        .app_data::<web::Data<Arc<dyn UserRepository>>>()
        .map(|users| users.get_ref().clone());

    Box::pin(async move {
        let principal = authenticated?;
        match users {
            Some(users) => refresh_from_store(users, principal).await,
            None => Ok(principal),
        }
    })
}

/// Authenticated user extractor
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use stayhub_auth::AuthenticatedUser;
///
/// async fn protected_handler(user: AuthenticatedUser) -> HttpResponse {
///     HttpResponse::Ok().json(serde_json::json!({ "user_id": user.id }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

impl AuthenticatedUser {
    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let principal = resolve(req);
        Box::pin(async move {
            principal
                .await
                .map(AuthenticatedUser)
                .map_err(actix_web::Error::from)
        })
    }
}

/// Admin user extractor; non-admins get 403
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl std::ops::Deref for AdminUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AdminUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let principal = resolve(req);
        Box::pin(async move {
            let principal = principal.await?;
            if !principal.is_admin {
                warn!(
                    user_id = %principal.id,
                    "User attempted admin access without privileges"
                );
                return Err(AppError::Forbidden("Admin access required".to_string()).into());
            }
            debug!(user_id = %principal.id, "Admin access granted");
            Ok(AdminUser(AuthenticatedUser(principal)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Claims;
    use actix_web::{test, App, HttpResponse};
    use uuid::Uuid;

    fn jwt_service() -> Arc<JwtService> {
        Arc::new(JwtService::new("test-secret-key-12345", 3600))
    }

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.id.to_string())
    }

    async fn admin_only(_admin: AdminUser) -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_bearer_header_authenticates() {
        let jwt = jwt_service();
        let id = Uuid::new_v4();
        let token = jwt.create_token_for_user(id, "guest@example.com", false).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, id.to_string().as_bytes());
    }

    #[actix_web::test]
    async fn test_cookie_authenticates() {
        let jwt = jwt_service();
        let token = jwt
            .create_token_for_user(Uuid::new_v4(), "guest@example.com", false)
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .cookie(actix_web::cookie::Cookie::new("token", token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_missing_or_invalid_token_is_401() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt_service()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", "Bearer invalid.token.here"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn test_inactive_user_is_403() {
        let jwt = jwt_service();
        let mut claims = Claims::new(Uuid::new_v4(), "gone@example.com", false);
        claims.is_active = false;
        let token = jwt.create_token(&claims).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
    }

    #[actix_web::test]
    async fn test_admin_extractor() {
        let jwt = jwt_service();
        let admin = jwt
            .create_token_for_user(Uuid::new_v4(), "admin@example.com", true)
            .unwrap();
        let guest = jwt
            .create_token_for_user(Uuid::new_v4(), "guest@example.com", false)
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt))
                .route("/admin", web::get().to(admin_only)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header(("Authorization", format!("Bearer {}", admin)))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header(("Authorization", format!("Bearer {}", guest)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);
    }

    fn stored_user(id: Uuid, is_active: bool, is_admin: bool) -> stayhub_core::models::UserProfile {
        stayhub_core::models::UserProfile {
            id,
            email: "stored@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            is_active,
            is_admin,
            favorites: Default::default(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[actix_web::test]
    async fn test_store_overrides_token_account_flags() {
        let jwt = jwt_service();
        let store = Arc::new(stayhub_db::MemoryStore::new());

        let deactivated = Uuid::new_v4();
        store.insert_user(stored_user(deactivated, false, false));
        let demoted = Uuid::new_v4();
        store.insert_user(stored_user(demoted, true, false));
        let active = Uuid::new_v4();
        store.insert_user(stored_user(active, true, false));

        let users: Arc<dyn UserRepository> = store;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt.clone()))
                .app_data(web::Data::new(users))
                .route("/me", web::get().to(whoami))
                .route("/admin", web::get().to(admin_only)),
        )
        .await;

        let bearer = |id: Uuid, is_admin: bool| {
            let token = jwt
                .create_token_for_user(id, "token@example.com", is_admin)
                .unwrap();
            format!("Bearer {}", token)
        };

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", bearer(deactivated, false)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header(("Authorization", bearer(demoted, true)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", bearer(Uuid::new_v4(), false)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", bearer(active, false)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, active.to_string().as_bytes());
    }
}
