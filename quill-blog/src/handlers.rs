use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{
        HeaderMap,
        header::{REFERER, SET_COOKIE},
    },
    response::{IntoResponse, Redirect},
};
use quill_orm::{FindOptions, ModelExt, Pool, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::Db;
use crate::auth::{CurrentUser, EMAIL_RE, SHA1_RE, hash_password, user_to_cookie};
use crate::error::{ApiError, ApiResult};
use crate::humanize::datetime_filter;
use crate::models::{Blog, Comment, User, next_id, now};
use crate::page::{Page, page_index};
use crate::payload::Payload;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BlogRequest {
    pub name: String,
    pub summary: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub passwd: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SigninRequest {
    pub email: String,
    pub passwd: String,
}

/// A blog with its `created_at` rendered for humans.
#[derive(Debug, Serialize)]
pub struct BlogView {
    #[serde(flatten)]
    pub blog: Blog,
    pub created: String,
}

impl BlogView {
    fn new(blog: Blog, now: f64) -> Self {
        let created = blog
            .created_at
            .map(|t| datetime_filter(t, now))
            .unwrap_or_default();
        Self { blog, created }
    }
}

fn page_for(count: Option<Value>, query: &PageQuery) -> Page {
    let count = count.and_then(|v| v.as_i64()).unwrap_or(0).max(0) as u64;
    Page::with_default_size(count, page_index(query.page.as_deref()))
}

fn newest_first(page: &Page) -> FindOptions {
    FindOptions::new()
        .order_by("created_at desc")
        .page(page.offset, page.limit)
}

fn required(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(field, format!("{field} cannot be empty.")));
    }
    Ok(())
}

fn session_header(state: &AppState, user: &User) -> ApiResult<String> {
    let session = &state.session;
    Ok(format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly",
        session.cookie_name,
        user_to_cookie(user, session.max_age, &session.secret, now())?,
        session.max_age
    ))
}

pub async fn list_blogs(
    State(pool): State<Pool<Db>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let count = Blog::find_number(&pool, "count(id)", None, Vec::new()).await?;
    let page = page_for(count, &query);
    if page.limit == 0 {
        return Ok(Json(json!({ "page": page, "blogs": [] })));
    }

    let now = now();
    let blogs: Vec<BlogView> = Blog::find_all(&pool, newest_first(&page))
        .await?
        .into_iter()
        .map(|blog| BlogView::new(blog, now))
        .collect();
    Ok(Json(json!({ "page": page, "blogs": blogs })))
}

pub async fn get_blog(
    State(pool): State<Pool<Db>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let blog = Blog::find(&pool, id.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found("blog"))?;
    let comments = Comment::find_all(
        &pool,
        FindOptions::new()
            .filter("blog_id=?")
            .bind(id)
            .order_by("created_at desc"),
    )
    .await?;
    Ok(Json(json!({
        "blog": BlogView::new(blog, now()),
        "comments": comments,
    })))
}

pub async fn create_blog(
    State(pool): State<Pool<Db>>,
    Extension(current): Extension<CurrentUser>,
    Payload(request): Payload<BlogRequest>,
) -> ApiResult<Json<Blog>> {
    let user = current.require_admin()?;
    required("name", &request.name)?;
    required("summary", &request.summary)?;
    required("content", &request.content)?;

    let mut blog = Blog {
        id: None,
        user_id: user.id.clone().unwrap_or_default(),
        user_name: user.name.clone(),
        user_image: user.image.clone(),
        name: request.name.trim().to_owned(),
        summary: request.summary.trim().to_owned(),
        content: request.content.trim().to_owned(),
        created_at: None,
    };
    blog.save(&pool).await?.ensure_applied("insert", "blogs")?;
    tracing::info!(id = ?blog.id, "blog created");
    Ok(Json(blog))
}

pub async fn update_blog(
    State(pool): State<Pool<Db>>,
    Path(id): Path<String>,
    Extension(current): Extension<CurrentUser>,
    Payload(request): Payload<BlogRequest>,
) -> ApiResult<Json<Blog>> {
    current.require_admin()?;
    required("name", &request.name)?;
    required("summary", &request.summary)?;
    required("content", &request.content)?;

    let mut blog = Blog::find(&pool, id.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found("blog"))?;
    blog.name = request.name.trim().to_owned();
    blog.summary = request.summary.trim().to_owned();
    blog.content = request.content.trim().to_owned();
    blog.update(&pool).await?.ensure_applied("update", "blogs")?;
    Ok(Json(blog))
}

pub async fn delete_blog(
    State(pool): State<Pool<Db>>,
    Path(id): Path<String>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<serde_json::Value>> {
    current.require_admin()?;
    let blog = Blog::find(&pool, id.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found("blog"))?;
    blog.remove(&pool).await?.ensure_applied("delete", "blogs")?;
    tracing::info!(%id, "blog deleted");
    Ok(Json(json!({ "id": id })))
}

pub async fn create_comment(
    State(pool): State<Pool<Db>>,
    Path(id): Path<String>,
    Extension(current): Extension<CurrentUser>,
    Payload(request): Payload<CommentRequest>,
) -> ApiResult<Json<Comment>> {
    let user = current.require_user()?;
    required("content", &request.content)?;
    let blog = Blog::find(&pool, id.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found("blog"))?;

    let mut comment = Comment {
        id: None,
        blog_id: blog.id.unwrap_or_default(),
        user_id: user.id.clone().unwrap_or_default(),
        user_name: user.name.clone(),
        user_image: user.image.clone(),
        content: request.content.trim().to_owned(),
        created_at: None,
    };
    comment
        .save(&pool)
        .await?
        .ensure_applied("insert", "comments")?;
    Ok(Json(comment))
}

pub async fn list_comments(
    State(pool): State<Pool<Db>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    current.require_admin()?;
    let count = Comment::find_number(&pool, "count(id)", None, Vec::new()).await?;
    let page = page_for(count, &query);
    if page.limit == 0 {
        return Ok(Json(json!({ "page": page, "comments": [] })));
    }
    let comments = Comment::find_all(&pool, newest_first(&page)).await?;
    Ok(Json(json!({ "page": page, "comments": comments })))
}

pub async fn delete_comment(
    State(pool): State<Pool<Db>>,
    Path(id): Path<String>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<serde_json::Value>> {
    current.require_admin()?;
    let comment = Comment::find(&pool, id.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found("comment"))?;
    comment
        .remove(&pool)
        .await?
        .ensure_applied("delete", "comments")?;
    Ok(Json(json!({ "id": id })))
}

pub async fn list_users(
    State(pool): State<Pool<Db>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    current.require_admin()?;
    let count = User::find_number(&pool, "count(id)", None, Vec::new()).await?;
    let page = page_for(count, &query);
    if page.limit == 0 {
        return Ok(Json(json!({ "page": page, "users": [] })));
    }
    let users: Vec<User> = User::find_all(&pool, newest_first(&page))
        .await?
        .iter()
        .map(User::masked)
        .collect();
    Ok(Json(json!({ "page": page, "users": users })))
}

async fn find_by_email(pool: &Pool<Db>, email: &str) -> ApiResult<Option<User>> {
    let users = User::find_all(
        pool,
        FindOptions::new()
            .filter("email=?")
            .bind(email)
            .limit(1),
    )
    .await?;
    Ok(users.into_iter().next())
}

pub async fn register(
    State(state): State<AppState>,
    Payload(request): Payload<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = request.name.trim();
    let email = request.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(ApiError::invalid("name", "name cannot be empty."));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(ApiError::invalid("email", "Invalid email."));
    }
    if !SHA1_RE.is_match(&request.passwd) {
        return Err(ApiError::invalid("passwd", "Invalid password."));
    }

    let pool = state.pool();
    if find_by_email(pool, &email).await?.is_some() {
        return Err(ApiError::RegisterFailed {
            field: "email".to_owned(),
            message: "Email is already in use.".to_owned(),
        });
    }

    let uid = next_id();
    let mut user = User {
        passwd: hash_password(&uid, &request.passwd),
        id: Some(uid),
        email,
        admin: false,
        name: name.to_owned(),
        image: "about:blank".to_owned(),
        created_at: None,
    };
    user.save(pool).await?.ensure_applied("insert", "users")?;
    tracing::info!(email = %user.email, "user registered");

    let cookie = session_header(&state, &user)?;
    Ok(([(SET_COOKIE, cookie)], Json(user.masked())))
}

pub async fn authenticate(
    State(state): State<AppState>,
    Payload(request): Payload<SigninRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::invalid("email", "Invalid email."));
    }
    if request.passwd.is_empty() {
        return Err(ApiError::invalid("passwd", "Invalid password."));
    }

    let Some(user) = find_by_email(state.pool(), &email).await? else {
        return Err(ApiError::SigninFailed {
            field: "email".to_owned(),
            message: "Email not exist.".to_owned(),
        });
    };
    let uid = user.id.as_deref().unwrap_or_default();
    if hash_password(uid, &request.passwd) != user.passwd {
        return Err(ApiError::SigninFailed {
            field: "passwd".to_owned(),
            message: "Invalid password.".to_owned(),
        });
    }
    tracing::info!(email = %user.email, "user signed in");

    let cookie = session_header(&state, &user)?;
    Ok(([(SET_COOKIE, cookie)], Json(user.masked())))
}

pub async fn signout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let referer = headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("/")
        .to_owned();
    let cookie = format!(
        "{}=-deleted-; Max-Age=0; Path=/; HttpOnly",
        state.session.cookie_name
    );
    tracing::info!("user signed out");
    ([(SET_COOKIE, cookie)], Redirect::to(&referer))
}
