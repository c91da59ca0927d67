//! Repository traits for metadata operations.

pub mod achievements;
pub mod buckets;
pub mod inventory;
pub mod metrics;
pub mod notifications;
pub mod users;

pub use achievements::AchievementRepo;
pub use buckets::{BucketRepo, FinalizeResult};
pub use inventory::InventoryRepo;
pub use metrics::MetricsRepo;
pub use notifications::NotificationRepo;
pub use users::UserRepo;
