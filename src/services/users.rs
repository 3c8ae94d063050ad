//! User administration: listing and role changes delegated to the store.

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::user::{UserRecord, UserRole};
use crate::services::aggregation;
use crate::store::StoreClient;

/// Filters for the user list.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UserFilters {
    /// Matches email or display name.
    pub search: Option<String>,
    pub role: Option<UserRole>,
}

pub fn filter_page(
    users: &[UserRecord],
    filters: &UserFilters,
    pagination: &Pagination,
) -> PagedResult<UserRecord> {
    let search = filters.search.as_deref().unwrap_or("");
    let matching: Vec<UserRecord> = aggregation::filter_by_text(
        users,
        search,
        &[UserRecord::email_field, UserRecord::display_name_field],
    )
    .into_iter()
    .filter(|user| filters.role.map_or(true, |role| user.effective_role() == role))
    .cloned()
    .collect();

    PagedResult::from_items(matching, pagination)
}

pub async fn list(
    store: &StoreClient,
    filters: &UserFilters,
    pagination: &Pagination,
) -> Result<PagedResult<UserRecord>, AppError> {
    let users = store.list_users(None).await?;
    Ok(filter_page(&users, filters, pagination))
}

/// Pass a role change through to the store.
pub async fn update_role(
    store: &StoreClient,
    user_id: &str,
    role: UserRole,
    actor_id: &str,
) -> Result<UserRecord, AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::Validation("user id is required".to_string()));
    }
    let user = store.update_user_role(user_id, role).await?;
    tracing::info!(
        user_id = %user.id,
        role = %role,
        actor_id = %actor_id,
        "User role updated"
    );
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, email: &str, name: Option<&str>, role: Option<UserRole>) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            email: email.to_string(),
            display_name: name.map(str::to_string),
            role,
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
        }
    }

    fn users() -> Vec<UserRecord> {
        vec![
            user("u1", "ada@example.com", Some("Ada Admin"), Some(UserRole::Admin)),
            user("u2", "grace@example.com", None, None),
            user("u3", "linus@example.org", Some("Mod Linus"), Some(UserRole::Moderator)),
            user("u4", "ken@example.org", Some("Ken"), Some(UserRole::User)),
        ]
    }

    fn ids(page: &PagedResult<UserRecord>) -> Vec<&str> {
        page.items.iter().map(|u| u.id.as_str()).collect()
    }

    #[test]
    fn search_matches_email_or_display_name() {
        let filters = UserFilters {
            search: Some("mod".to_string()),
            role: None,
        };
        assert_eq!(ids(&filter_page(&users(), &filters, &Pagination::default())), vec!["u3"]);

        let filters = UserFilters {
            search: Some("EXAMPLE.ORG".to_string()),
            role: None,
        };
        assert_eq!(
            ids(&filter_page(&users(), &filters, &Pagination::default())),
            vec!["u3", "u4"]
        );
    }

    #[test]
    fn role_filter_treats_missing_role_as_user() {
        let filters = UserFilters {
            search: None,
            role: Some(UserRole::User),
        };
        assert_eq!(
            ids(&filter_page(&users(), &filters, &Pagination::default())),
            vec!["u2", "u4"]
        );
    }
}
