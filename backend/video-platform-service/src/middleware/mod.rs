/// HTTP middleware for the video platform service
///
/// Provides bearer-token authentication, the `Caller` extractor and request
/// metrics. Authentication is optional at the middleware level: a request without
/// an `Authorization` header continues anonymously and handlers that need a caller
/// reject it through the extractor.
pub mod permissions;

pub use permissions::*;

use crate::error::AppError;
use crate::metrics::HTTP_REQUESTS_TOTAL;
use crate::models::Caller;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

// =====================================================================
// Bearer authentication
// =====================================================================

/// Claims carried by access tokens; `sub` is the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Verifies HS256 access tokens issued by the identity provider.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Caller, AppError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|_| AppError::Unauthenticated("Invalid or expired token".to_string()))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Unauthenticated("Invalid user ID in token".to_string()))?;

        Ok(Caller::new(user_id))
    }
}

/// Sign an access token for `user_id`; used by tooling and tests.
pub fn encode_token(
    user_id: Uuid,
    secret: &str,
    ttl: chrono::Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now() + ttl).timestamp().max(0) as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Actix middleware that resolves the caller from a Bearer token.
#[derive(Clone)]
pub struct BearerAuth {
    verifier: Arc<TokenVerifier>,
}

impl BearerAuth {
    pub fn new(secret: &str) -> Self {
        Self {
            verifier: Arc::new(TokenVerifier::new(secret)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: Rc<S>,
    verifier: Arc<TokenVerifier>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .map(|h| h.to_str().map(str::to_owned));

            if let Some(header) = header {
                let header = header.map_err(|_| {
                    AppError::Unauthenticated("Invalid Authorization header".to_string())
                })?;
                let token = header.strip_prefix("Bearer ").ok_or_else(|| {
                    AppError::Unauthenticated("Invalid Authorization scheme".to_string())
                })?;

                let caller = verifier.verify(token.trim())?;
                req.extensions_mut().insert(caller);
            }

            service.call(req).await
        })
    }
}

impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Caller>()
                .copied()
                .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string())),
        )
    }
}

/// Caller when a valid token was presented, `None` for anonymous requests
#[derive(Debug, Clone, Copy)]
pub struct MaybeCaller(pub Option<Caller>);

impl FromRequest for MaybeCaller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(MaybeCaller(req.extensions().get::<Caller>().copied())))
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let status = match &res {
                Ok(response) => response.status(),
                Err(err) => err.as_response_error().status_code(),
            };

            HTTP_REQUESTS_TOTAL
                .with_label_values(&[method.as_str(), status.as_str()])
                .inc();

            let elapsed = start.elapsed().as_millis();
            tracing::debug!(%method, %path, status = status.as_u16(), %elapsed, "request completed");
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    const SECRET: &str = "test-secret";

    async fn whoami(caller: Caller) -> HttpResponse {
        HttpResponse::Ok().body(caller.user_id.to_string())
    }

    async fn maybe(MaybeCaller(caller): MaybeCaller) -> HttpResponse {
        HttpResponse::Ok().body(if caller.is_some() { "user" } else { "anonymous" })
    }

    #[actix_web::test]
    async fn valid_token_resolves_caller() {
        let app = test::init_service(
            App::new()
                .wrap(BearerAuth::new(SECRET))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let user_id = Uuid::new_v4();
        let token = encode_token(user_id, SECRET, chrono::Duration::minutes(5)).unwrap();
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, user_id.to_string());
    }

    #[actix_web::test]
    async fn missing_header_is_anonymous() {
        let app = test::init_service(
            App::new()
                .wrap(BearerAuth::new(SECRET))
                .route("/maybe", web::get().to(maybe))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let body =
            test::call_and_read_body(&app, test::TestRequest::get().uri("/maybe").to_request())
                .await;
        assert_eq!(body, "anonymous");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let app = test::init_service(
            App::new()
                .wrap(BearerAuth::new(SECRET))
                .route("/maybe", web::get().to(maybe)),
        )
        .await;

        let token =
            encode_token(Uuid::new_v4(), "other-secret", chrono::Duration::minutes(5)).unwrap();
        let req = test::TestRequest::get()
            .uri("/maybe")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::try_call_service(&app, req).await;
        let status = match resp {
            Ok(r) => r.status(),
            Err(e) => e.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[::core::prelude::v1::test]
    fn expired_token_fails_verification() {
        let token = encode_token(Uuid::new_v4(), SECRET, chrono::Duration::minutes(-10)).unwrap();
        assert!(TokenVerifier::new(SECRET).verify(&token).is_err());
    }
}
