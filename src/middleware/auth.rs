use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::services::firebase_service::{self, FirebaseClaims};
use crate::utils::error::AppError;

/// Usuário autenticado, inserido nas extensions da request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
}

impl From<FirebaseClaims> for AuthUser {
    fn from(claims: FirebaseClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            name: claims.name,
            phone_number: claims.phone_number,
        }
    }
}

/// Verifica o bearer token do Firebase
///
/// `required()` responde 401 sem token válido; `optional()` segue adiante
/// sem `AuthUser` quando não há header, mas ainda rejeita token inválido.
#[derive(Clone, Copy)]
pub struct AuthMiddleware {
    required: bool,
}

impl AuthMiddleware {
    pub fn required() -> Self {
        Self { required: true }
    }

    pub fn optional() -> Self {
        Self { required: false }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            required: self.required,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    required: bool,
}

fn reject<B>(req: ServiceRequest, message: &str) -> ServiceResponse<EitherBody<B>> {
    let response = AppError::Unauthorized(message.to_string()).error_response();
    req.into_response(response).map_into_right_body()
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        let service = Rc::clone(&self.service);
        let required = self.required;

        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Box::pin(async move {
            let token = match header.as_deref() {
                Some(value) => match firebase_service::bearer_token(value) {
                    Some(token) => Some(token.to_string()),
                    None => return Ok(reject(req, "Invalid token format")),
                },
                None => None,
            };

            match token {
                Some(token) => match firebase_service::verify_id_token(&token).await {
                    Ok(claims) => {
                        req.extensions_mut().insert(AuthUser::from(claims));
                    }
                    Err(e) => {
                        log::warn!("⚠️  Token rejected on {}: {}", req.path(), e);
                        return Ok(reject(req, "Invalid or expired token"));
                    }
                },
                None if required => return Ok(reject(req, "No token provided")),
                None => {}
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
