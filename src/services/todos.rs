use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::db::{PgPool, PgPooledConn};
use crate::models::{
    Category, CreateTodoRequest, NewTodo, Todo, TodoChangeset, TodoResponse, UpdateTodoRequest,
};
use crate::query::{self, Priority, SortOptions, TodoFilters};
use crate::schema::{categories, todos};
use crate::AuthenticatedUser;

use super::error::ServiceError;

pub fn create_todo(
    pool: &State<PgPool>,
    auth_user: AuthenticatedUser,
    create_req: Json<CreateTodoRequest>,
) -> Result<Json<TodoResponse>, ServiceError> {
    use todos::dsl::*;

    if create_req.title.trim().is_empty() {
        return Err(ServiceError::InvalidInput("Title is required".to_string()));
    }
    let parsed_deadline = parse_deadline(create_req.deadline.as_deref())?;
    let parsed_priority = match create_req.priority.as_deref() {
        Some(value) => parse_priority(value)?,
        None => Priority::Medium,
    };
    let parsed_category = parse_category_id(create_req.category_id.as_deref())?;

    let mut conn = pool
        .get()
        .map_err(|e| ServiceError::InternalError(format!("DB Connection error: {}", e)))?;

    let new_todo = NewTodo {
        user_id: auth_user.user_id,
        title: create_req.title.clone(),
        description: create_req.description.clone(),
        completed: false,
        deadline: parsed_deadline,
        priority: parsed_priority.as_str().to_string(),
        category_id: parsed_category,
    };

    let todo = diesel::insert_into(todos)
        .values(&new_todo)
        .get_result::<Todo>(&mut conn)?;

    respond_with(todo, &mut conn)
}

pub fn get_todo(
    pool: &State<PgPool>,
    auth_user: AuthenticatedUser,
    todo_id: Uuid,
) -> Result<Json<TodoResponse>, ServiceError> {
    use todos::dsl::*;

    let mut conn = pool
        .get()
        .map_err(|e| ServiceError::InternalError(format!("DB Connection error: {}", e)))?;

    let todo = todos
        .filter(id.eq(todo_id).and(user_id.eq(auth_user.user_id)))
        .select(Todo::as_select())
        .first::<Todo>(&mut conn)
        .optional()?;

    match todo {
        Some(todo) => respond_with(todo, &mut conn),
        None => Err(ServiceError::NotFound("Todo not found".to_string())),
    }
}

pub fn update_todo(
    pool: &State<PgPool>,
    auth_user: AuthenticatedUser,
    todo_id: Uuid,
    update_req: Json<UpdateTodoRequest>,
) -> Result<Json<TodoResponse>, ServiceError> {
    use todos::dsl::*;

    if let Some(ref new_title) = update_req.title {
        if new_title.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Title must not be empty".to_string()));
        }
    }

    let changeset = TodoChangeset {
        title: update_req.title.clone(),
        description: update_req.description.clone().map(Some),
        completed: update_req.completed,
        deadline: match update_req.deadline.as_deref() {
            None => None,
            Some("") => Some(None),
            Some(raw) => Some(parse_deadline(Some(raw))?),
        },
        priority: match update_req.priority.as_deref() {
            None => None,
            Some(value) => Some(parse_priority(value)?.as_str().to_string()),
        },
        category_id: match update_req.category_id.as_deref() {
            None => None,
            Some("") => Some(None),
            Some(raw) => Some(parse_category_id(Some(raw))?),
        },
    };

    let mut conn = pool
        .get()
        .map_err(|e| ServiceError::InternalError(format!("DB Connection error: {}", e)))?;

    // A request with no recognized fields leaves the row untouched.
    if !changeset.has_changes() {
        let todo = todos
            .filter(id.eq(todo_id).and(user_id.eq(auth_user.user_id)))
            .select(Todo::as_select())
            .first::<Todo>(&mut conn)
            .optional()?;
        return match todo {
            Some(todo) => respond_with(todo, &mut conn),
            None => Err(ServiceError::NotFound("Todo not found".to_string())),
        };
    }

    let updated = diesel::update(todos.filter(id.eq(todo_id).and(user_id.eq(auth_user.user_id))))
        .set(&changeset)
        .get_result::<Todo>(&mut conn)
        .optional()?;

    match updated {
        Some(todo) => respond_with(todo, &mut conn),
        None => Err(ServiceError::NotFound("Todo not found or not owned by user".to_string())),
    }
}

pub fn complete_todo(
    pool: &State<PgPool>,
    auth_user: AuthenticatedUser,
    todo_id: Uuid,
) -> Result<Json<TodoResponse>, ServiceError> {
    use todos::dsl::*;

    let mut conn = pool
        .get()
        .map_err(|e| ServiceError::InternalError(format!("DB Connection error: {}", e)))?;

    let updated = diesel::update(todos.filter(id.eq(todo_id).and(user_id.eq(auth_user.user_id))))
        .set(completed.eq(true))
        .get_result::<Todo>(&mut conn)
        .optional()?;

    match updated {
        Some(todo) => respond_with(todo, &mut conn),
        None => Err(ServiceError::NotFound("Todo not found or not owned by user".to_string())),
    }
}

pub fn delete_todo(
    pool: &State<PgPool>,
    auth_user: AuthenticatedUser,
    todo_id: Uuid,
) -> Result<(), ServiceError> {
    use todos::dsl::*;

    let mut conn = pool
        .get()
        .map_err(|e| ServiceError::InternalError(format!("DB Connection error: {}", e)))?;

    let deleted = diesel::delete(todos.filter(id.eq(todo_id).and(user_id.eq(auth_user.user_id))))
        .execute(&mut conn)?;
    if deleted == 0 {
        return Err(ServiceError::NotFound("Todo not found".to_string()));
    }

    Ok(())
}

/// The todos query: load the caller's rows, run them through the pure
/// filter/sort pipeline, and embed referenced categories.
pub fn list_todos(
    pool: &State<PgPool>,
    caller: Uuid,
    filters: TodoFilters,
    sort: SortOptions,
) -> Result<Json<Vec<TodoResponse>>, ServiceError> {
    use todos::dsl::*;

    let mut conn = pool
        .get()
        .map_err(|e| ServiceError::InternalError(format!("DB Connection error: {}", e)))?;

    let rows = todos
        .filter(user_id.eq(caller))
        .select(Todo::as_select())
        .load::<Todo>(&mut conn)?;

    let now = Utc::now().naive_utc();
    let ordered = query::filter_and_sort(rows, &filters, &sort, now);
    let category_index = load_categories(&ordered, &mut conn)?;

    let responses = ordered
        .into_iter()
        .map(|todo| {
            let category = todo.category_id.and_then(|cid| category_index.get(&cid));
            TodoResponse::from_todo(todo, category, now)
        })
        .collect();

    Ok(Json(responses))
}

fn load_categories(
    rows: &[Todo],
    conn: &mut PgPooledConn,
) -> Result<HashMap<Uuid, Category>, ServiceError> {
    let ids: Vec<Uuid> = rows.iter().filter_map(|todo| todo.category_id).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let found = categories::table
        .filter(categories::id.eq_any(&ids))
        .select(Category::as_select())
        .load::<Category>(conn)?;

    Ok(found
        .into_iter()
        .map(|category| (category.id, category))
        .collect())
}

fn respond_with(todo: Todo, conn: &mut PgPooledConn) -> Result<Json<TodoResponse>, ServiceError> {
    let category = match todo.category_id {
        Some(cid) => categories::table
            .filter(categories::id.eq(cid))
            .select(Category::as_select())
            .first::<Category>(conn)
            .optional()?,
        None => None,
    };

    let now = Utc::now().naive_utc();
    Ok(Json(TodoResponse::from_todo(todo, category.as_ref(), now)))
}

fn parse_deadline(value: Option<&str>) -> Result<Option<NaiveDateTime>, ServiceError> {
    let raw = match value {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.naive_utc()));
    }
    // Offset-less timestamps are taken as UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(Some)
        .map_err(|_| {
            ServiceError::InvalidInput(
                "Invalid deadline format. Please use ISO 8601 format (e.g., 2024-12-31T23:59:59Z)"
                    .to_string(),
            )
        })
}

fn parse_priority(value: &str) -> Result<Priority, ServiceError> {
    Priority::parse(value).ok_or_else(|| {
        ServiceError::InvalidInput("Invalid priority. Must be one of: high, medium, low".to_string())
    })
}

fn parse_category_id(value: Option<&str>) -> Result<Option<Uuid>, ServiceError> {
    match value {
        None | Some("") => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| ServiceError::InvalidInput("Invalid category id".to_string())),
    }
}
