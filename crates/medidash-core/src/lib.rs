pub mod cache;
pub mod client;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod model;
pub mod pagination;
pub mod view;

pub use cache::{
    CacheStats, DEFAULT_STALE_TIME, FetchStatus, QueryCache, QueryOptions, QueryState,
    Subscription,
};
pub use client::{ClientConfig, DEFAULT_BASE_URL, DashboardClient, Resource, ResourceKey};
pub use dashboard::{Dashboard, Overview, RECENT_LIMIT};
pub use debounce::{DEFAULT_SEARCH_DEBOUNCE, Debounce, DebounceInput, spawn_debounced};
pub use error::{ErrorCategory, FetchError, Result, ViewError};
pub use filter::{
    Categorized, PATIENT_STATUS_TABS, Searchable, StatusFilter, category_filter, search_filter,
};
pub use model::{
    AdmissionDate, Appointment, ChartData, MetricCard, Metrics, Patient, Status, StatusTone,
};
pub use pagination::{ALLOWED_PAGE_SIZES, PageSize, page_count, paginate};
pub use view::{RowKey, TableState, ViewComposer, ViewPage, compose_view};
