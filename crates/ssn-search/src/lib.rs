//! Find-help search pipeline: distance ranking, filtering, grouping and paging
//! over an in-memory service catalog.
//!
//! Everything here is synchronous and pure. Inputs are borrowed and never
//! mutated; each operation returns a fresh collection.

pub mod distance;
pub mod filter;
pub mod grouping;
pub mod page;

pub use distance::{distance_km, haversine_km, EARTH_RADIUS_KM};
pub use filter::{apply, FilterState, RankedResult, SortOrder};
pub use grouping::{
    group_by_category, group_by_organisation, CategoryBucket, CategoryKey, OrganisationGroup,
};
pub use page::{paginate, Page, DEFAULT_PER_PAGE, MAX_PER_PAGE};
