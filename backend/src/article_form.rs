use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Create/update payload, read from either a JSON or a multipart body.
///
/// `genre_ids` is kept raw; handlers parse it with
/// [`pressroom_shared::parse_genre_ids`] so a malformed list can be logged
/// and skipped instead of failing the request.
#[derive(Debug, Default)]
pub struct ArticleForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub genre_ids: Option<Value>,
    pub thumbnail: Option<UploadedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleJson {
    title: Option<String>,
    content: Option<String>,
    genre_ids: Option<Value>,
}

#[async_trait]
impl<S> FromRequest<S> for ArticleForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            return read_multipart(multipart).await;
        }

        let Json(body) = Json::<ArticleJson>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ArticleForm {
            title: body.title,
            content: body.content,
            genre_ids: body.genre_ids.filter(|value| !value.is_null()),
            thumbnail: None,
        })
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<ArticleForm, ApiError> {
    let mut form = ArticleForm::default();
    let mut genre_parts = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(field_text(field).await?),
            "content" => form.content = Some(field_text(field).await?),
            "genreIds" | "genreIds[]" => genre_parts.push(field_text(field).await?),
            "thumbnail" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.body_text()))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.thumbnail = Some(UploadedFile { file_name, bytes });
                }
            },
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    form.genre_ids = match genre_parts.len() {
        0 => None,
        1 => genre_parts.pop().map(Value::String),
        _ => Some(Value::Array(genre_parts.into_iter().map(Value::String).collect())),
    };
    Ok(form)
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|err| ApiError::BadRequest(err.body_text()))
}
