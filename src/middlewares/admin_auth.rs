use crate::error::AppError;
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Guards the admin scope with a shared token carried in `X-Admin-Token`.
/// An empty configured token disables the whole scope rather than leaving
/// it open.
pub struct AdminAuth {
    token: String,
}

impl AdminAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthService {
            service,
            token: self.token.clone(),
        }))
    }
}

pub struct AdminAuthService<S> {
    service: S,
    token: String,
}

impl<S, B> Service<ServiceRequest> for AdminAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let presented = req
            .headers()
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        let authorized = !self.token.is_empty() && presented == Some(self.token.as_str());

        if authorized {
            let fut = self.service.call(req);
            Box::pin(fut)
        } else {
            let error = AppError::Unauthorized("Invalid or missing admin token".to_string());
            Box::pin(async move { Err(error.into()) })
        }
    }
}
