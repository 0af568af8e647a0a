use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::serde::json::Json;
use rocket::{catch, catchers, delete, get, post, put, routes, Responder, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod db;
pub mod models;
pub mod query;
pub mod schema;
pub mod services;

use db::PgPool;
use models::{
    Category, CreateCategoryRequest, CreateTodoRequest, LoginRequest, LoginResponse,
    RegisterRequest, TodoResponse, UpdateCategoryRequest, UpdateTodoRequest, UserInfo,
};
use query::{SortOptions, TodoFilters};

// Serializable error body shared by responders and catchers
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorDetail {
    pub error: String,
}

#[derive(Responder)]
pub enum ApiError {
    #[response(status = 400)]
    BadRequest(Json<ErrorDetail>),
    #[response(status = 401)]
    Unauthorized(Json<ErrorDetail>),
    #[response(status = 404)]
    NotFound(Json<ErrorDetail>),
    #[response(status = 409)]
    Conflict(Json<ErrorDetail>),
    #[response(status = 500)]
    InternalError(Json<ErrorDetail>),
}

/// Caller identity resolved from a bearer session token. Services receive
/// this explicitly; nothing below the routes reads ambient request state.
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Copy)]
pub enum AuthError {
    MissingOrMalformedHeader,
    InvalidToken,
    NoDatabasePool,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let pool = match req.rocket().state::<PgPool>() {
            Some(pool) => pool,
            None => {
                req.local_cache(|| Some(AuthError::NoDatabasePool));
                return Outcome::Forward(Status::InternalServerError);
            }
        };

        let token = match bearer_token(req) {
            Some(token) => token,
            None => {
                req.local_cache(|| Some(AuthError::MissingOrMalformedHeader));
                return Outcome::Forward(Status::Unauthorized);
            }
        };

        match services::auth::resolve_session(pool, &token) {
            Some(user_id) => Outcome::Success(AuthenticatedUser { user_id }),
            None => {
                req.local_cache(|| Some(AuthError::InvalidToken));
                Outcome::Forward(Status::Unauthorized)
            }
        }
    }
}

// Guard to extract the raw bearer token string (used by logout, which must
// not reject an already-dead session)
pub struct BearerToken(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match bearer_token(req) {
            Some(token) => Outcome::Success(BearerToken(token)),
            None => {
                req.local_cache(|| Some(AuthError::MissingOrMalformedHeader));
                Outcome::Forward(Status::Unauthorized)
            }
        }
    }
}

fn bearer_token(req: &Request<'_>) -> Option<String> {
    let header = req.headers().get_one("Authorization")?;
    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

// --- Auth routes ---

#[post("/register", data = "<register_req>")]
pub async fn register(
    pool: &State<PgPool>,
    register_req: Json<RegisterRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    services::auth::register_user(pool, register_req).map_err(ApiError::from)
}

#[post("/login", data = "<login_req>")]
pub async fn login(
    pool: &State<PgPool>,
    login_req: Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    services::auth::login_user(pool, login_req).map_err(ApiError::from)
}

#[post("/logout")]
pub async fn logout(pool: &State<PgPool>, token: Option<BearerToken>) -> Result<Status, ApiError> {
    services::auth::logout_user(pool, token.map(|bearer| bearer.0)).map_err(ApiError::from)?;
    // Always NoContent; the session is gone either way.
    Ok(Status::NoContent)
}

#[get("/me")]
pub async fn me(pool: &State<PgPool>, user: AuthenticatedUser) -> Result<Json<UserInfo>, ApiError> {
    services::auth::current_user(pool, user).map_err(ApiError::from)
}

// --- User routes ---

#[get("/?<id>&<email>")]
pub async fn list_users(
    pool: &State<PgPool>,
    _user: AuthenticatedUser,
    id: Option<String>,
    email: Option<String>,
) -> Result<Json<Vec<UserInfo>>, ApiError> {
    let id_filter = id.and_then(|raw| Uuid::parse_str(&raw).ok());
    services::auth::list_users(pool, id_filter, email).map_err(ApiError::from)
}

// --- Todo routes ---

#[get("/?<completed>&<priority>&<category_id>&<deadline_status>&<sort_by>&<sort_direction>")]
pub async fn list_todos(
    pool: &State<PgPool>,
    user: Option<AuthenticatedUser>,
    completed: Option<bool>,
    priority: Option<String>,
    category_id: Option<String>,
    deadline_status: Option<String>,
    sort_by: Option<String>,
    sort_direction: Option<String>,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    // An unauthenticated caller sees an empty list, not an error.
    let user = match user {
        Some(user) => user,
        None => return Ok(Json(Vec::new())),
    };

    // Filter and sort parameters normalize once, here at the boundary.
    let filters = TodoFilters::from_params(
        completed,
        priority.as_deref(),
        category_id.as_deref(),
        deadline_status.as_deref(),
    );
    let sort = SortOptions::from_params(sort_by.as_deref(), sort_direction.as_deref());

    services::todos::list_todos(pool, user.user_id, filters, sort).map_err(ApiError::from)
}

#[post("/", data = "<create_req>")]
pub async fn create_todo(
    pool: &State<PgPool>,
    user: AuthenticatedUser,
    create_req: Json<CreateTodoRequest>,
) -> Result<Json<TodoResponse>, ApiError> {
    services::todos::create_todo(pool, user, create_req).map_err(ApiError::from)
}

#[get("/<id>")]
pub async fn get_todo(
    pool: &State<PgPool>,
    user: AuthenticatedUser,
    id: Uuid,
) -> Result<Json<TodoResponse>, ApiError> {
    services::todos::get_todo(pool, user, id).map_err(ApiError::from)
}

#[put("/<id>", data = "<update_req>")]
pub async fn update_todo(
    pool: &State<PgPool>,
    user: AuthenticatedUser,
    id: Uuid,
    update_req: Json<UpdateTodoRequest>,
) -> Result<Json<TodoResponse>, ApiError> {
    services::todos::update_todo(pool, user, id, update_req).map_err(ApiError::from)
}

#[put("/<id>/complete")]
pub async fn complete_todo(
    pool: &State<PgPool>,
    user: AuthenticatedUser,
    id: Uuid,
) -> Result<Json<TodoResponse>, ApiError> {
    services::todos::complete_todo(pool, user, id).map_err(ApiError::from)
}

#[delete("/<id>")]
pub async fn delete_todo(
    pool: &State<PgPool>,
    user: AuthenticatedUser,
    id: Uuid,
) -> Result<Status, ApiError> {
    services::todos::delete_todo(pool, user, id).map_err(ApiError::from)?;
    Ok(Status::NoContent)
}

// --- Category routes ---

#[get("/")]
pub async fn list_categories(pool: &State<PgPool>) -> Result<Json<Vec<Category>>, ApiError> {
    services::categories::list_categories(pool).map_err(ApiError::from)
}

#[get("/<id>")]
pub async fn get_category(pool: &State<PgPool>, id: Uuid) -> Result<Json<Category>, ApiError> {
    services::categories::get_category(pool, id).map_err(ApiError::from)
}

#[post("/", data = "<create_req>")]
pub async fn create_category(
    pool: &State<PgPool>,
    _user: AuthenticatedUser,
    create_req: Json<CreateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    services::categories::create_category(pool, create_req).map_err(ApiError::from)
}

#[put("/<id>", data = "<update_req>")]
pub async fn update_category(
    pool: &State<PgPool>,
    _user: AuthenticatedUser,
    id: Uuid,
    update_req: Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    services::categories::update_category(pool, id, update_req).map_err(ApiError::from)
}

#[delete("/<id>")]
pub async fn delete_category(
    pool: &State<PgPool>,
    _user: AuthenticatedUser,
    id: Uuid,
) -> Result<Status, ApiError> {
    services::categories::delete_category(pool, id).map_err(ApiError::from)?;
    Ok(Status::NoContent)
}

// --- Mounting ---

fn auth_routes() -> Vec<rocket::Route> {
    routes![register, login, logout, me]
}

fn user_routes() -> Vec<rocket::Route> {
    routes![list_users]
}

fn todo_routes() -> Vec<rocket::Route> {
    routes![list_todos, create_todo, get_todo, update_todo, complete_todo, delete_todo]
}

fn category_routes() -> Vec<rocket::Route> {
    routes![list_categories, get_category, create_category, update_category, delete_category]
}

#[catch(401)] // Catches Unauthorized
fn unauthorized_catcher(_status: Status, req: &Request<'_>) -> Json<ErrorDetail> {
    let detail = match req.local_cache(|| None as Option<AuthError>) {
        Some(AuthError::MissingOrMalformedHeader) => {
            "Authorization header is missing or malformed."
        }
        Some(AuthError::InvalidToken) => "Session token is invalid or expired.",
        _ => "Access denied. Valid authentication token required.",
    };
    Json(ErrorDetail {
        error: detail.to_string(),
    })
}

#[catch(500)] // Catches Internal Server Error
fn internal_server_error_catcher(_status: Status, req: &Request<'_>) -> Json<ErrorDetail> {
    let detail = match req.local_cache(|| None as Option<AuthError>) {
        Some(AuthError::NoDatabasePool) => "Critical application state (database pool) not found.",
        _ => "An unexpected error occurred on the server.",
    };
    Json(ErrorDetail {
        error: detail.to_string(),
    })
}

// This function is used by main.rs to launch the server and by tests to get
// a Rocket instance.
pub fn rocket_instance() -> rocket::Rocket<rocket::Build> {
    rocket::build()
        .attach(db::stage())
        .mount("/auth", auth_routes())
        .mount("/api/users", user_routes())
        .mount("/api/todos", todo_routes())
        .mount("/api/categories", category_routes())
        .register("/", catchers![unauthorized_catcher, internal_server_error_catcher])
}
