//! Tools for managing categories
//!
//! This module implements category_list, category_create, category_update and
//! category_delete.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{Category, DomainError, Session};
use crate::storage::UserStorage;
use crate::tools::{parse_category_id, ToolError};

/// Parameters for creating a category
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCategoryParams {
    /// Category name, unique per user
    pub name: String,
    /// Hex colour, e.g. "#3b82f6"
    pub color: String,
    /// Emoji or short icon text
    pub icon: String,
}

/// Parameters for editing a category
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCategoryParams {
    pub category_id: String,
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Parameters naming a single category
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CategoryIdParams {
    pub category_id: String,
}

/// Response carrying one category
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: Category,
    pub message: String,
}

/// Response carrying the user's categories
#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
    pub message: String,
}

pub fn list_categories<S: UserStorage>(
    storage: &S,
    session: &Session,
) -> Result<CategoryListResponse, ToolError> {
    let categories = storage.list_categories(&session.user_id)?;
    let message = if categories.is_empty() {
        "No categories yet.".to_string()
    } else {
        categories
            .iter()
            .map(|c| format!("{} {} ({})", c.icon, c.name, c.id))
            .collect::<Vec<_>>()
            .join("\n")
    };
    Ok(CategoryListResponse { categories, message })
}

pub fn create_category<S: UserStorage>(
    storage: &S,
    session: &Session,
    params: CreateCategoryParams,
) -> Result<CategoryResponse, ToolError> {
    let category = Category::new(session.user_id.clone(), &params.name, &params.color, &params.icon)?;
    storage.create_category(&category)?;

    Ok(CategoryResponse {
        message: format!("✅ Created category {} {}", category.icon, category.name),
        category,
    })
}

pub fn update_category<S: UserStorage>(
    storage: &S,
    session: &Session,
    params: UpdateCategoryParams,
) -> Result<CategoryResponse, ToolError> {
    let category_id = parse_category_id(&params.category_id)?;
    let mut category = storage.get_category(&session.user_id, &category_id)?;

    if let Some(name) = params.name {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > 50 {
            return Err(DomainError::Validation {
                message: "Category name must be 1-50 characters".to_string(),
            }
            .into());
        }
        category.name = name.to_string();
    }
    if let Some(color) = params.color {
        category.color = color.trim().to_string();
    }
    if let Some(icon) = params.icon {
        category.icon = icon.trim().to_string();
    }

    storage.update_category(&category)?;

    Ok(CategoryResponse {
        message: format!("✅ Updated category {} {}", category.icon, category.name),
        category,
    })
}

/// Delete a category. Its habits stay, uncategorised.
pub fn delete_category<S: UserStorage>(
    storage: &S,
    session: &Session,
    params: CategoryIdParams,
) -> Result<CategoryResponse, ToolError> {
    let category_id = parse_category_id(&params.category_id)?;
    let category = storage.get_category(&session.user_id, &category_id)?;
    storage.delete_category(&session.user_id, &category_id)?;

    Ok(CategoryResponse {
        message: format!("🗑️ Deleted category {}", category.name),
        category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::storage::{SqliteStorage, StorageError};

    fn setup() -> (SqliteStorage, Session) {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = User::register("Sam", "4821").unwrap();
        storage.create_user(&user).unwrap();
        (storage, user.session())
    }

    #[test]
    fn test_category_lifecycle() {
        let (storage, session) = setup();
        let created = create_category(
            &storage,
            &session,
            CreateCategoryParams {
                name: "Music".to_string(),
                color: "#a855f7".to_string(),
                icon: "🎸".to_string(),
            },
        )
        .unwrap();

        let id = created.category.id.to_string();
        let updated = update_category(
            &storage,
            &session,
            UpdateCategoryParams { category_id: id.clone(), name: Some("Guitar".to_string()), color: None, icon: None },
        )
        .unwrap();
        assert_eq!(updated.category.name, "Guitar");
        assert_eq!(updated.category.color, "#a855f7");

        delete_category(&storage, &session, CategoryIdParams { category_id: id }).unwrap();
        assert!(list_categories(&storage, &session).unwrap().categories.is_empty());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (storage, session) = setup();
        let params = || CreateCategoryParams {
            name: "Music".to_string(),
            color: "#a855f7".to_string(),
            icon: "🎸".to_string(),
        };
        create_category(&storage, &session, params()).unwrap();
        assert!(matches!(
            create_category(&storage, &session, params()),
            Err(ToolError::Storage(StorageError::DuplicateCategory { .. }))
        ));
    }
}
