pub mod database;
pub mod email;
pub mod geocoder;
pub mod jwt;
pub mod policy;
pub mod query;

pub use database::MongoDb;
pub use email::{EmailProvider, EmailService};
pub use geocoder::{
    angular_radius, radius_filter, validate_distance, GeoPoint, Geocoder, HttpGeocoder,
};
pub use jwt::{Claims, JwtService};
pub use policy::{require_owner, require_role, CurrentUser};
pub use query::{run_paged, Comparator, ListQuery, PagedResult, PageRef, Pagination};
