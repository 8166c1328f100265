//! Request extractors that reject with the response envelope
//!
//! Thin wrappers over axum's `Json`/`Query` and axum-extra's `Query`. A
//! body or query string that does not decode becomes
//! `AppError::Validation`, so clients always get `{code, date, message}`.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppError;

/// JSON body extractor and responder
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        axum::Json::<T>::from_request(req, state)
            .await
            .map(|axum::Json(value)| Json(value))
            .map_err(|rejection| {
                AppError::Validation(format!("请求参数错误: {}", rejection.body_text()))
            })
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        axum::extract::Query::<T>::from_request_parts(parts, state)
            .await
            .map(|axum::extract::Query(value)| Query(value))
            .map_err(|rejection| {
                AppError::Validation(format!("请求参数错误: {}", rejection.body_text()))
            })
    }
}

/// Query string extractor that collects repeated keys (`?a=1&a=2`) into sequences
#[derive(Debug, Clone, Default)]
pub struct MultiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for MultiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        axum_extra::extract::Query::<T>::from_request_parts(parts, state)
            .await
            .map(|axum_extra::extract::Query(value)| MultiQuery(value))
            .map_err(|rejection| AppError::Validation(format!("请求参数错误: {}", rejection)))
    }
}
