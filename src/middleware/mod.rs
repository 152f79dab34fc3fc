pub mod rate_limit;
pub mod response;

pub use rate_limit::{rate_limit, RateLimiter};
pub use response::{ApiResponse, ApiResult};
