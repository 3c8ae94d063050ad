//! Dashboard statistics assembled from bulk-fetched store records.
//!
//! The `build_*` functions are pure and take the reference instant as an
//! argument; the async wrappers fetch records and delegate to them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{SiteSettings, ALLOWED_WINDOWS};
use crate::errors::AppError;
use crate::models::image::ImageRecord;
use crate::models::user::UserRecord;
use crate::services::aggregation::{self, DailyBucket, MonthlyCount, RankedEntry};
use crate::store::{ImageFilter, StoreClient};

/// Knobs for one stats computation.
#[derive(Debug, Clone)]
pub struct StatsQuery {
    pub window_days: u32,
    /// Restricts images to prompts containing this text.
    pub search: Option<String>,
    pub top_prompts_limit: usize,
    pub prompt_truncate_length: usize,
    pub growth_months: usize,
}

impl StatsQuery {
    /// Build a query from request input, applying site defaults.
    ///
    /// Only the windows offered by the dashboard are accepted here.
    pub fn from_request(
        window_days: Option<u32>,
        search: Option<String>,
        settings: &SiteSettings,
    ) -> Result<Self, AppError> {
        let window_days = window_days.unwrap_or(settings.default_window_days);
        if !ALLOWED_WINDOWS.contains(&window_days) {
            return Err(AppError::Validation(format!(
                "window_days must be one of {ALLOWED_WINDOWS:?}, got {window_days}"
            )));
        }
        Ok(Self {
            window_days,
            search: search.filter(|s| !s.trim().is_empty()),
            top_prompts_limit: settings.top_prompts_limit,
            prompt_truncate_length: settings.prompt_truncate_length,
            growth_months: settings.growth_months,
        })
    }
}

/// Record totals over everything fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub users: usize,
    pub images: usize,
    /// Distinct prompt texts.
    pub prompts: usize,
}

/// Platform-wide statistics for the admin overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub window_days: u32,
    pub generated_at: DateTime<Utc>,
    pub totals: Totals,
    pub images_in_window: usize,
    /// Distinct users with at least one image on any day of `daily`.
    pub active_users: usize,
    pub avg_images_per_day: f64,
    pub daily: Vec<DailyBucket>,
    pub top_prompts: Vec<RankedEntry>,
    pub user_growth: Vec<MonthlyCount>,
    /// Records left out of time-based figures for lacking a usable timestamp.
    pub skipped_records: usize,
}

/// Usage figures for a single user's own images.
///
/// Everything except `total_images` covers the days in `daily`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserUsageStats {
    pub user_id: String,
    pub window_days: u32,
    pub generated_at: DateTime<Utc>,
    pub total_images: usize,
    pub images_in_window: usize,
    pub avg_images_per_day: f64,
    pub daily: Vec<DailyBucket>,
    pub top_prompts: Vec<RankedEntry>,
    pub sizes: Vec<RankedEntry>,
    pub qualities: Vec<RankedEntry>,
    pub skipped_records: usize,
}

fn prompt_key(image: &ImageRecord, max_chars: usize) -> Option<String> {
    let prompt = image.prompt.trim();
    if prompt.is_empty() {
        return None;
    }
    Some(aggregation::truncate_text(prompt, max_chars))
}

/// Compute platform-wide statistics.
pub fn build_stats(
    users: &[UserRecord],
    images: &[ImageRecord],
    query: &StatsQuery,
    now: DateTime<Utc>,
) -> DashboardStats {
    let search = query.search.as_deref().unwrap_or("");
    let images = aggregation::filter_by_text(images, search, &[ImageRecord::prompt_field]);

    let window = aggregation::filter_by_days(
        images.iter().copied(),
        query.window_days,
        ImageRecord::created_at_field,
        now,
    );
    let daily = aggregation::bucket_by_day(
        window.records.iter().copied(),
        query.window_days,
        ImageRecord::created_at_field,
        ImageRecord::user_id_field,
        now,
    );
    let top_prompts = aggregation::top_by_frequency(
        window.records.iter().copied(),
        |image| prompt_key(image, query.prompt_truncate_length),
        query.top_prompts_limit,
    );
    let growth =
        aggregation::monthly_growth(users, UserRecord::created_at_field, query.growth_months);

    let images_in_window = window.records.len();
    let stats = DashboardStats {
        window_days: query.window_days,
        generated_at: now,
        totals: Totals {
            users: users.len(),
            images: images.len(),
            prompts: aggregation::distinct_count(images.iter().copied(), ImageRecord::prompt_field),
        },
        images_in_window,
        active_users: aggregation::distinct_count(
            window.records.iter().copied(),
            ImageRecord::user_id_field,
        ),
        avg_images_per_day: aggregation::mean_per_day(images_in_window, query.window_days),
        daily: daily.buckets,
        top_prompts,
        user_growth: growth.months,
        skipped_records: window.skipped + growth.skipped,
    };

    if stats.skipped_records > 0 {
        tracing::warn!(
            skipped = stats.skipped_records,
            window_days = query.window_days,
            "Records without a usable timestamp were left out of dashboard stats"
        );
    }
    stats
}

/// Compute usage statistics over one user's images.
pub fn build_user_stats(
    user_id: &str,
    images: &[ImageRecord],
    query: &StatsQuery,
    now: DateTime<Utc>,
) -> UserUsageStats {
    let own: Vec<&ImageRecord> = images.iter().filter(|i| i.user_id == user_id).collect();
    let window = aggregation::filter_by_days(
        own.iter().copied(),
        query.window_days,
        ImageRecord::created_at_field,
        now,
    );
    let daily = aggregation::bucket_by_day(
        window.records.iter().copied(),
        query.window_days,
        ImageRecord::created_at_field,
        ImageRecord::user_id_field,
        now,
    );

    UserUsageStats {
        user_id: user_id.to_string(),
        window_days: query.window_days,
        generated_at: now,
        total_images: own.len(),
        images_in_window: window.records.len(),
        avg_images_per_day: aggregation::mean_per_day(window.records.len(), query.window_days),
        daily: daily.buckets,
        top_prompts: aggregation::top_by_frequency(
            window.records.iter().copied(),
            |image| prompt_key(image, query.prompt_truncate_length),
            query.top_prompts_limit,
        ),
        sizes: aggregation::top_by_frequency(
            window.records.iter().copied(),
            |image| Some(image.size.as_str().to_string()),
            usize::MAX,
        ),
        qualities: aggregation::top_by_frequency(
            window.records.iter().copied(),
            |image| Some(image.quality.as_str().to_string()),
            usize::MAX,
        ),
        skipped_records: window.skipped,
    }
}

/// Daily series for the export, as `Date,Users,Images` CSV.
pub fn build_daily_csv(
    images: &[ImageRecord],
    window_days: u32,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let window =
        aggregation::filter_by_days(images, window_days, ImageRecord::created_at_field, now);
    if window.skipped > 0 {
        tracing::warn!(
            skipped = window.skipped,
            window_days,
            "Records without a usable timestamp were left out of the daily export"
        );
    }
    let daily = aggregation::bucket_by_day(
        window.records.iter().copied(),
        window_days,
        ImageRecord::created_at_field,
        ImageRecord::user_id_field,
        now,
    );
    aggregation::export_csv(&daily.buckets)
}

/// Fetch users and images concurrently and compute platform stats.
///
/// Either read failing fails the whole call; no partial stats are returned.
pub async fn get_stats(
    store: &StoreClient,
    query: &StatsQuery,
    now: DateTime<Utc>,
) -> Result<DashboardStats, AppError> {
    let filter = ImageFilter::default();
    let (users, images) = tokio::try_join!(store.list_users(None), store.list_images(&filter))?;
    Ok(build_stats(&users, &images, query, now))
}

/// Fetch one user's images and compute their usage stats.
pub async fn get_user_stats(
    store: &StoreClient,
    user_id: &str,
    query: &StatsQuery,
    now: DateTime<Utc>,
) -> Result<UserUsageStats, AppError> {
    let filter = ImageFilter {
        user_id: Some(user_id.to_string()),
        limit: None,
    };
    let images = store.list_images(&filter).await?;
    Ok(build_user_stats(user_id, &images, query, now))
}

/// Fetch all images and render the daily CSV export.
pub async fn export_daily_csv(
    store: &StoreClient,
    window_days: u32,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let images = store.list_images(&ImageFilter::default()).await?;
    build_daily_csv(&images, window_days, now)
}
