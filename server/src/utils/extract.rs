use axum::extract::FromRequest;

use crate::utils::error::AppError;

/// `Json` extractor whose rejections use the application error envelope
/// (malformed bodies are a 400, never axum's default 422).
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
