use crate::db::PgPool;
use crate::models::{LoginRequest, LoginResponse, NewUser, RegisterRequest, User, UserInfo};
use crate::schema::sessions;
use crate::AuthenticatedUser;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use log::info;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use super::error::ServiceError;

pub fn register_user(
    pool: &State<PgPool>,
    register_req: Json<RegisterRequest>,
) -> Result<Json<UserInfo>, ServiceError> {
    use crate::schema::users::dsl::*;

    validate_registration(&register_req)?;

    let mut conn = pool
        .get()
        .map_err(|_| ServiceError::InternalError("Failed to get DB connection".to_string()))?;

    // Check if the email is already taken
    let existing_user = users
        .filter(email.eq(&register_req.email))
        .select(User::as_select())
        .first::<User>(&mut conn)
        .optional()?;
    if existing_user.is_some() {
        return Err(ServiceError::Conflict("Email already registered".to_string()));
    }

    let hashed_password = hash(&register_req.password, DEFAULT_COST)?;

    let new_user = NewUser {
        name: &register_req.name,
        email: &register_req.email,
        password_hash: &hashed_password,
    };

    let user = diesel::insert_into(users)
        .values(&new_user)
        .get_result::<User>(&mut conn)?;
    info!("User registered: {}", user.email);

    Ok(Json(user.into()))
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ServiceError> {
    if req.name.trim().is_empty() || req.name.len() > 255 {
        return Err(ServiceError::InvalidInput(
            "Name is required and must be at most 255 characters".to_string(),
        ));
    }
    if req.email.len() > 255 || !req.email.contains('@') {
        return Err(ServiceError::InvalidInput(
            "A valid email address is required".to_string(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ServiceError::InvalidInput(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if req.password != req.password_confirmation {
        return Err(ServiceError::InvalidInput(
            "Password confirmation does not match".to_string(),
        ));
    }
    Ok(())
}

pub fn login_user(
    pool: &State<PgPool>,
    login_req: Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    use crate::schema::users::dsl::*;

    let mut conn = pool
        .get()
        .map_err(|_| ServiceError::InternalError("Failed to get DB connection".to_string()))?;

    let found_user = users
        .filter(email.eq(&login_req.email))
        .select(User::as_select())
        .first::<User>(&mut conn)
        .optional()?;

    // An unknown email and a wrong password respond identically.
    let user = match found_user {
        Some(user) => user,
        None => return Err(ServiceError::Unauthorized("Invalid credentials".to_string())),
    };
    if !verify(&login_req.password, &user.password_hash)? {
        return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
    }

    let new_session = NewSession {
        user_id: user.id,
        expires_at: Utc::now().naive_utc() + Duration::days(1),
    };

    let session = diesel::insert_into(sessions::table)
        .values(&new_session)
        .get_result::<Session>(&mut conn)?;

    Ok(Json(LoginResponse {
        session_token: session.id.to_string(),
        user: user.into(),
    }))
}

pub fn logout_user(pool: &State<PgPool>, token: Option<String>) -> Result<(), ServiceError> {
    let token = match token {
        Some(token) => token,
        None => return Ok(()),
    };
    // An unparsable token has no session to end.
    let session_id = match Uuid::parse_str(&token) {
        Ok(session_id) => session_id,
        Err(_) => return Ok(()),
    };

    let mut conn = pool
        .get()
        .map_err(|_| ServiceError::InternalError("Failed to get DB connection".to_string()))?;

    diesel::delete(sessions::table.filter(sessions::id.eq(session_id))).execute(&mut conn)?;

    Ok(())
}

/// Resolves a bearer token to its user. `None` for unknown, malformed, or
/// expired tokens; the request guard turns that into a 401.
pub fn resolve_session(pool: &PgPool, token: &str) -> Option<Uuid> {
    let session_id = Uuid::parse_str(token).ok()?;
    let mut conn = pool.get().ok()?;

    sessions::table
        .filter(sessions::id.eq(session_id))
        .filter(sessions::expires_at.gt(Utc::now().naive_utc()))
        .select(Session::as_select())
        .first::<Session>(&mut conn)
        .optional()
        .ok()?
        .map(|session| session.user_id)
}

pub fn current_user(
    pool: &State<PgPool>,
    auth_user: AuthenticatedUser,
) -> Result<Json<UserInfo>, ServiceError> {
    use crate::schema::users::dsl::*;

    let mut conn = pool
        .get()
        .map_err(|_| ServiceError::InternalError("Failed to get DB connection".to_string()))?;

    let user = users
        .filter(id.eq(auth_user.user_id))
        .select(User::as_select())
        .first::<User>(&mut conn)
        .optional()?;

    match user {
        Some(user) => Ok(Json(user.into())),
        None => Err(ServiceError::NotFound("User not found".to_string())),
    }
}

pub fn list_users(
    pool: &State<PgPool>,
    id_filter: Option<Uuid>,
    email_filter: Option<String>,
) -> Result<Json<Vec<UserInfo>>, ServiceError> {
    use crate::schema::users::dsl::*;

    let mut conn = pool
        .get()
        .map_err(|_| ServiceError::InternalError("Failed to get DB connection".to_string()))?;

    let mut query = users.select(User::as_select()).into_boxed();
    if let Some(user_id) = id_filter {
        query = query.filter(id.eq(user_id));
    }
    if let Some(email_value) = email_filter {
        query = query.filter(email.eq(email_value));
    }

    let results = query.order(created_at.asc()).load::<User>(&mut conn)?;

    Ok(Json(results.into_iter().map(UserInfo::from).collect()))
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = sessions)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: chrono::NaiveDateTime,
    pub expires_at: chrono::NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub user_id: Uuid,
    pub expires_at: chrono::NaiveDateTime,
}
