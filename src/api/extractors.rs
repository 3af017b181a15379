use async_trait::async_trait;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use log::debug;
use serde::de::DeserializeOwned;

use super::{failure, ApiError};

/// `Json<T>` that answers a malformed body with the `{status}` envelope
/// instead of axum's plain-text rejection.
pub struct ApiJson<T>(pub T);

/// `Path<T>` with the same error envelope, e.g. for `/recipes/abc`.
pub struct ApiPath<T>(pub T);

/// `Query<T>` with the same error envelope.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(path_rejection(rejection)),
        }
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    debug!("Rejected JSON body: {}", rejection.body_text());
    failure(rejection.status(), rejection.body_text())
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    debug!("Rejected path: {}", rejection.body_text());
    failure(rejection.status(), rejection.body_text())
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    debug!("Rejected query: {}", rejection.body_text());
    failure(rejection.status(), rejection.body_text())
}
