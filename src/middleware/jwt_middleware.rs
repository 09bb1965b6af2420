/// JWT Authentication Middleware
///
/// Validates the access token in the Authorization header, checks it against
/// the revocation ledger, and injects the caller's id into request extensions.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{authorize_access, TokenService};
use crate::database::Database;
use crate::error::{AppError, AuthError};

/// Id of the user behind a validated access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub u64);

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    db: web::Data<Database>,
    tokens: web::Data<TokenService>,
}

impl JwtMiddleware {
    pub fn new(db: web::Data<Database>, tokens: web::Data<TokenService>) -> Self {
        Self { db, tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            db: self.db.clone(),
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    db: web::Data<Database>,
    tokens: web::Data<TokenService>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let auth_header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);

        let service = self.service.clone();
        let db = self.db.clone();
        let tokens = self.tokens.clone();

        Box::pin(async move {
            let header = match auth_header {
                Some(header) => header,
                None => {
                    tracing::warn!("Missing Authorization header");
                    return Ok(unauthorized(req, AppError::Auth(AuthError::MissingToken)));
                }
            };

            // The ledger lookup touches the store file
            let authorized = web::block(move || authorize_access(&db, &tokens, &header))
                .await
                .map_err(AppError::from)
                .and_then(|result| result);

            match authorized {
                Ok(user_id) => {
                    tracing::debug!(user_id = user_id, "JWT validated successfully");
                    req.extensions_mut().insert(AuthenticatedUser(user_id));
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(e) => {
                    tracing::warn!("JWT validation failed: {}", e);
                    Ok(unauthorized(req, e))
                }
            }
        })
    }
}

/// Answer the request here so outer middleware still decorates the response
fn unauthorized<B>(req: ServiceRequest, error: AppError) -> ServiceResponse<EitherBody<B>> {
    req.into_response(error.error_response()).map_into_right_body()
}
