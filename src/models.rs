// todo_api/src/models.rs
use crate::query::{DeadlineStatus, Priority};
use crate::schema::{categories, todos, users};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Queryable, Identifiable, Selectable, Serialize, Debug, PartialEq, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)] // Password hash should not be sent to client
    pub password_hash: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

// For returning user info without password hash
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Queryable, Identifiable, Selectable, Associations, Debug, PartialEq, Clone)]
#[diesel(belongs_to(User))]
#[diesel(table_name = todos)]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub deadline: Option<NaiveDateTime>,
    // Stored lowercase; parsed into `Priority` at the boundary.
    pub priority: String,
    pub category_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = todos)]
pub struct NewTodo {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub deadline: Option<NaiveDateTime>,
    pub priority: String,
    pub category_id: Option<Uuid>,
}

// Partial update: a `None` field is left untouched, a `Some(None)` clears a
// nullable column.
#[derive(AsChangeset, Default)]
#[diesel(table_name = todos)]
pub struct TodoChangeset {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub deadline: Option<Option<NaiveDateTime>>,
    pub priority: Option<String>,
    pub category_id: Option<Option<Uuid>>,
}

impl TodoChangeset {
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.completed.is_some()
            || self.deadline.is_some()
            || self.priority.is_some()
            || self.category_id.is_some()
    }
}

#[derive(Queryable, Identifiable, Selectable, Serialize, Deserialize, Debug, PartialEq, Clone)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub name: String,
    pub color: Option<String>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = categories)]
pub struct CategoryChangeset {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl CategoryChangeset {
    pub fn has_changes(&self) -> bool {
        self.name.is_some() || self.color.is_some()
    }
}

// --- Request/response bodies ---

#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub session_token: String,
    pub user: UserInfo,
}

// Used for creating a todo item from a request (user_id comes from auth)
#[derive(Deserialize, Debug)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub priority: Option<String>,
    pub category_id: Option<String>,
}

// Only supplied fields change; an empty-string deadline or category_id
// clears the field.
#[derive(Deserialize, Debug)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub deadline: Option<String>,
    pub priority: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        CategorySummary {
            id: category.id,
            name: category.name.clone(),
            color: category.color.clone(),
        }
    }
}

/// A todo as the client sees it: `deadline_status` derived at read time,
/// referenced category embedded when one is set.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TodoResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub deadline: Option<NaiveDateTime>,
    pub priority: Priority,
    pub deadline_status: DeadlineStatus,
    pub category_id: Option<Uuid>,
    pub category: Option<CategorySummary>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TodoResponse {
    pub fn from_todo(todo: Todo, category: Option<&Category>, now: NaiveDateTime) -> Self {
        TodoResponse {
            id: todo.id,
            user_id: todo.user_id,
            deadline_status: DeadlineStatus::classify(todo.deadline, todo.completed, now),
            priority: Priority::from_stored(&todo.priority),
            category: category.map(CategorySummary::from),
            title: todo.title,
            description: todo.description,
            completed: todo.completed,
            deadline: todo.deadline,
            category_id: todo.category_id,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}
