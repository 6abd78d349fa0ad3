pub mod capacity;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod phase;
pub mod plan_index;
pub mod progress;
pub mod selector;
pub mod volume;

pub use self::config::{Style, WatchConfig};
pub use dashboard::{build_dashboard, DashboardOptions, MigrationView, VmView};
pub use error::Error;
pub use model::ResourceCollection;
pub use phase::PhaseCategory;
pub use progress::{ProgressEstimate, ProgressResolver, ProgressSource};
pub use volume::{MatchRule, VolumeMatcher};
