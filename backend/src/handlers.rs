use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use pressroom_shared::{
    parse_genre_ids, Article, ArticleChanges, ArticleFilter, Comment, Genre, GenreWithCount,
    NewArticle, PageRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    article_form::{ArticleForm, UploadedFile},
    auth::AuthUser,
    client_ip::ClientIp,
    error::{ApiError, ApiResult},
    media::{image_extension, media_key_from_url},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Comma-separated genre ids.
    pub genre_id: Option<String>,
    pub author_id: Option<i64>,
    pub query: Option<String>,
    pub article_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub article_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelatedQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NewGenreBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewCommentBody {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListResponse {
    pub articles: Vec<Article>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub page_size: i64,
    pub total_items: i64,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub articles: Vec<Article>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct GenresResponse {
    pub genres: Vec<GenreWithCount>,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<Comment>,
}

pub async fn health() -> &'static str {
    "Pressroom API is running"
}

pub async fn list_articles(
    State(state): State<AppState>,
    query: Result<Query<ArticleQuery>, QueryRejection>,
) -> ApiResult<Json<ArticleListResponse>> {
    let Query(query) = query?;
    let filter = ArticleFilter {
        genre_ids: parse_genre_filter(query.genre_id.as_deref())?,
        author_id: query.author_id,
        query: query.query,
        similar_to: query.article_id,
    };

    let page = state
        .store
        .list_articles(&filter, PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(ArticleListResponse {
        current_page: page.page.page(),
        total_pages: page.total_pages(),
        total_items: page.total,
        articles: page.articles,
    }))
}

pub async fn get_article(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    ClientIp(client_ip): ClientIp,
) -> ApiResult<Json<Article>> {
    let Path(id) = id?;
    let article = find_article(&state, id).await?;
    state.store.track_view(article.id, client_ip.as_deref()).await;
    Ok(Json(article))
}

pub async fn create_article(
    State(state): State<AppState>,
    user: AuthUser,
    form: ArticleForm,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let title = required_text(form.title, "title")?;
    let content = required_text(form.content, "content")?;
    if state.store.get_user(user.id).await?.is_none() {
        return Err(ApiError::Unauthorized);
    }

    let genre_ids = genre_ids_or_skip(form.genre_ids.as_ref());
    let thumbnail = match &form.thumbnail {
        Some(file) => Some(upload_thumbnail(&state, file).await?),
        None => None,
    };

    let new_article = NewArticle {
        title,
        content,
        thumbnail: thumbnail.clone(),
        author_id: user.id,
    };
    let article = match state.store.create_article(new_article, genre_ids.as_deref()).await {
        Ok(article) => article,
        Err(err) => {
            if let Some(url) = &thumbnail {
                remove_thumbnail(&state, url).await;
            }
            return Err(err.into());
        },
    };

    tracing::info!(article_id = article.id, author_id = user.id, "article created");
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn update_article(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    user: AuthUser,
    form: ArticleForm,
) -> ApiResult<Json<Article>> {
    let Path(id) = id?;
    let existing = find_article(&state, id).await?;
    ensure_author(&existing, user)?;

    let changes = ArticleChanges {
        title: optional_text(form.title, "title")?,
        content: optional_text(form.content, "content")?,
        thumbnail: None,
    };
    let genre_ids = genre_ids_or_skip(form.genre_ids.as_ref());
    let new_thumbnail = match &form.thumbnail {
        Some(file) => Some(upload_thumbnail(&state, file).await?),
        None => None,
    };
    let changes = ArticleChanges {
        thumbnail: new_thumbnail.clone(),
        ..changes
    };

    let updated = state
        .store
        .update_article(id, changes, genre_ids.as_deref())
        .await;
    let updated = match updated {
        Ok(Some(article)) => article,
        outcome => {
            if let Some(url) = &new_thumbnail {
                remove_thumbnail(&state, url).await;
            }
            return Err(match outcome {
                Err(err) => err.into(),
                _ => article_not_found(id),
            });
        },
    };

    if new_thumbnail.is_some() {
        if let Some(old_url) = &existing.thumbnail {
            remove_thumbnail(&state, old_url).await;
        }
    }

    tracing::info!(article_id = id, author_id = user.id, "article updated");
    Ok(Json(updated))
}

pub async fn delete_article(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    user: AuthUser,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    let existing = find_article(&state, id).await?;
    ensure_author(&existing, user)?;

    if !state.store.delete_article(id).await? {
        return Err(article_not_found(id));
    }
    tracing::info!(article_id = id, author_id = user.id, "article deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recommended_articles(
    State(state): State<AppState>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> ApiResult<Json<RecommendationsResponse>> {
    let Query(query) = query?;
    let page = state
        .store
        .recommended_articles(PageRequest::new(query.page, query.limit), query.article_id)
        .await?;

    Ok(Json(RecommendationsResponse {
        pagination: Pagination {
            current_page: page.page.page(),
            total_pages: page.total_pages(),
            page_size: page.page.limit(),
            total_items: page.total,
        },
        articles: page.articles,
    }))
}

pub async fn related_articles(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<RelatedQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Article>>> {
    let Path(id) = id?;
    let Query(query) = query?;
    let articles = state.store.related_articles(id, query.limit).await?;
    Ok(Json(articles))
}

pub async fn list_genres(State(state): State<AppState>) -> ApiResult<Json<GenresResponse>> {
    let genres = state.store.list_genres().await?;
    Ok(Json(GenresResponse { genres }))
}

pub async fn create_genre(
    State(state): State<AppState>,
    _user: AuthUser,
    body: Result<Json<NewGenreBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Genre>)> {
    let Json(body) = body?;
    let name = required_text(Some(body.name), "name")?;
    match state.store.create_genre(&name).await? {
        Some(genre) => Ok((StatusCode::CREATED, Json(genre))),
        None => Err(ApiError::Conflict(format!("Genre '{name}' already exists"))),
    }
}

pub async fn list_comments(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<CommentsResponse>> {
    let Path(id) = id?;
    find_article(&state, id).await?;
    let comments = state.store.list_comments(id).await?;
    Ok(Json(CommentsResponse { comments }))
}

pub async fn add_comment(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    user: AuthUser,
    body: Result<Json<NewCommentBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let Path(id) = id?;
    let Json(body) = body?;
    let content = required_text(Some(body.content), "content")?;
    find_article(&state, id).await?;
    if state.store.get_user(user.id).await?.is_none() {
        return Err(ApiError::Unauthorized);
    }

    let comment = state.store.add_comment(id, user.id, &content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn find_article(state: &AppState, id: i64) -> ApiResult<Article> {
    state
        .store
        .get_article(id)
        .await?
        .ok_or_else(|| article_not_found(id))
}

fn article_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Article {id} not found"))
}

fn ensure_author(article: &Article, user: AuthUser) -> ApiResult<()> {
    if article.author_id == user.id {
        return Ok(());
    }
    tracing::warn!(article_id = article.id, user_id = user.id, "rejected change by non-author");
    Err(ApiError::Forbidden("Only the author can modify this article".to_string()))
}

fn required_text(value: Option<String>, field: &str) -> ApiResult<String> {
    optional_text(value, field)?.ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

/// `None` stays `None`; a present but blank value is rejected.
fn optional_text(value: Option<String>, field: &str) -> ApiResult<Option<String>> {
    match value.map(|text| text.trim().to_string()) {
        Some(text) if text.is_empty() => Err(ApiError::BadRequest(format!("{field} must not be empty"))),
        other => Ok(other),
    }
}

/// Parsed `genreIds`, or `None` when absent or malformed. A malformed list is
/// logged and the request carries on without touching genres.
fn genre_ids_or_skip(raw: Option<&Value>) -> Option<Vec<i64>> {
    let raw = raw?;
    match parse_genre_ids(raw) {
        Ok(ids) => Some(ids),
        Err(err) => {
            tracing::warn!(payload = %raw, "ignoring malformed genreIds: {err}");
            None
        },
    }
}

fn parse_genre_filter(raw: Option<&str>) -> ApiResult<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("invalid genreId: {part}")))
        })
        .collect()
}

async fn upload_thumbnail(state: &AppState, file: &UploadedFile) -> ApiResult<String> {
    if image_extension(&file.file_name).is_none() {
        return Err(ApiError::BadRequest(format!(
            "unsupported thumbnail type: {}",
            file.file_name
        )));
    }
    Ok(state.media.upload(&file.file_name, &file.bytes).await?)
}

async fn remove_thumbnail(state: &AppState, url: &str) {
    let Some(key) = media_key_from_url(url) else {
        tracing::warn!(url = %url, "cannot derive media key from thumbnail url");
        return;
    };
    if let Err(err) = state.media.delete(&key).await {
        tracing::warn!(key = %key, "failed to delete thumbnail: {err:#}");
    }
}
