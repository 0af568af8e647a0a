use diesel::prelude::*;
use log::info;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::db::PgPool;
use crate::models::{
    Category, CategoryChangeset, CreateCategoryRequest, NewCategory, UpdateCategoryRequest,
};
use crate::schema::{categories, todos};

use super::error::ServiceError;

pub fn list_categories(pool: &State<PgPool>) -> Result<Json<Vec<Category>>, ServiceError> {
    use categories::dsl::*;

    let mut conn = pool
        .get()
        .map_err(|e| ServiceError::InternalError(format!("DB Connection error: {}", e)))?;

    let results = categories
        .order(name.asc())
        .select(Category::as_select())
        .load::<Category>(&mut conn)?;

    Ok(Json(results))
}

pub fn get_category(
    pool: &State<PgPool>,
    category_id: Uuid,
) -> Result<Json<Category>, ServiceError> {
    use categories::dsl::*;

    let mut conn = pool
        .get()
        .map_err(|e| ServiceError::InternalError(format!("DB Connection error: {}", e)))?;

    let category = categories
        .filter(id.eq(category_id))
        .select(Category::as_select())
        .first::<Category>(&mut conn)
        .optional()?;

    match category {
        Some(category) => Ok(Json(category)),
        None => Err(ServiceError::NotFound("Category not found".to_string())),
    }
}

pub fn create_category(
    pool: &State<PgPool>,
    create_req: Json<CreateCategoryRequest>,
) -> Result<Json<Category>, ServiceError> {
    use categories::dsl::*;

    if create_req.name.trim().is_empty() {
        return Err(ServiceError::InvalidInput("Name is required".to_string()));
    }

    let mut conn = pool
        .get()
        .map_err(|e| ServiceError::InternalError(format!("DB Connection error: {}", e)))?;

    let new_category = NewCategory {
        name: create_req.name.clone(),
        color: create_req.color.clone(),
    };

    let category = diesel::insert_into(categories)
        .values(&new_category)
        .get_result::<Category>(&mut conn)?;

    Ok(Json(category))
}

pub fn update_category(
    pool: &State<PgPool>,
    category_id: Uuid,
    update_req: Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, ServiceError> {
    use categories::dsl::*;

    if let Some(ref new_name) = update_req.name {
        if new_name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Name must not be empty".to_string()));
        }
    }

    let changeset = CategoryChangeset {
        name: update_req.name.clone(),
        color: update_req.color.clone(),
    };

    let mut conn = pool
        .get()
        .map_err(|e| ServiceError::InternalError(format!("DB Connection error: {}", e)))?;

    if !changeset.has_changes() {
        let category = categories
            .filter(id.eq(category_id))
            .select(Category::as_select())
            .first::<Category>(&mut conn)
            .optional()?;
        return match category {
            Some(category) => Ok(Json(category)),
            None => Err(ServiceError::NotFound("Category not found".to_string())),
        };
    }

    let updated = diesel::update(categories.filter(id.eq(category_id)))
        .set(&changeset)
        .get_result::<Category>(&mut conn)
        .optional()?;

    match updated {
        Some(category) => Ok(Json(category)),
        None => Err(ServiceError::NotFound("Category not found".to_string())),
    }
}

/// Deletes a category. Referencing todos become uncategorized first; nothing
/// cascades.
pub fn delete_category(pool: &State<PgPool>, category_id: Uuid) -> Result<(), ServiceError> {
    let mut conn = pool
        .get()
        .map_err(|e| ServiceError::InternalError(format!("DB Connection error: {}", e)))?;

    conn.transaction::<_, ServiceError, _>(|conn| {
        let detached = diesel::update(todos::table.filter(todos::category_id.eq(category_id)))
            .set(todos::category_id.eq(None::<Uuid>))
            .execute(conn)?;
        if detached > 0 {
            info!("Detached {} todos from category {}", detached, category_id);
        }

        let deleted = diesel::delete(categories::table.filter(categories::id.eq(category_id)))
            .execute(conn)?;
        if deleted == 0 {
            return Err(ServiceError::NotFound("Category not found".to_string()));
        }

        Ok(())
    })
}
