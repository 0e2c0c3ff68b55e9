use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
};

use crate::error::AppError;

/// `Json` extractor whose rejections render as [`AppError`] bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Multipart` extractor whose rejections render as [`AppError`] bodies.
pub struct ApiMultipart(pub Multipart);

#[async_trait]
impl<S> FromRequest<S> for ApiMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state)
            .await
            .map(Self)
            .map_err(AppError::from)
    }
}
