//! Gallery listing and generation requests.

use serde::Deserialize;
use validator::Validate;

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::models::image::{GenerateImage, ImageQuality, ImageRecord, ImageSize};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::aggregation;
use crate::store::{ImageFilter, StoreClient};

/// Filters for the gallery listing.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GalleryFilters {
    pub search: Option<String>,
    pub size: Option<ImageSize>,
    pub quality: Option<ImageQuality>,
    pub user_id: Option<String>,
}

/// Filter and page an image list; store order (newest first) is kept.
pub fn filter_page(
    images: &[ImageRecord],
    filters: &GalleryFilters,
    pagination: &Pagination,
) -> PagedResult<ImageRecord> {
    let search = filters.search.as_deref().unwrap_or("");
    let matching: Vec<ImageRecord> =
        aggregation::filter_by_text(images, search, &[ImageRecord::prompt_field])
            .into_iter()
            .filter(|image| filters.size.map_or(true, |size| image.size == size))
            .filter(|image| filters.quality.map_or(true, |quality| image.quality == quality))
            .filter(|image| {
                filters
                    .user_id
                    .as_deref()
                    .map_or(true, |user_id| image.user_id == user_id)
            })
            .cloned()
            .collect();

    PagedResult::from_items(matching, pagination)
}

/// List gallery images visible to `viewer`.
///
/// Plain users only ever see their own images; moderators and admins may
/// browse everything or narrow to one owner.
pub async fn list(
    store: &StoreClient,
    viewer: &CurrentUser,
    filters: &GalleryFilters,
    pagination: &Pagination,
) -> Result<PagedResult<ImageRecord>, AppError> {
    let mut filters = filters.clone();
    if !viewer.role.can_view_platform_stats() {
        filters.user_id = Some(viewer.id.clone());
    }

    let store_filter = ImageFilter {
        user_id: filters.user_id.clone(),
        limit: None,
    };
    let images = store.list_images(&store_filter).await?;
    Ok(filter_page(&images, &filters, pagination))
}

/// Validate a generation request and submit it on behalf of `requester`.
pub async fn generate(
    store: &StoreClient,
    requester: &CurrentUser,
    input: &GenerateImage,
) -> Result<ImageRecord, AppError> {
    input.validate()?;
    if input.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt must not be blank".to_string()));
    }

    let image = store.generate_image(&requester.id, input).await?;
    tracing::info!(
        user_id = %requester.id,
        image_id = %image.id,
        size = image.size.as_str(),
        quality = image.quality.as_str(),
        "Image generated"
    );
    Ok(image)
}
