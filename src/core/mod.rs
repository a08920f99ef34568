pub mod extract;
pub mod fields;
pub mod locator;
pub mod normalize;
pub mod service;

pub use crate::domain::model::{ExtractedObject, ProfileRecord};
pub use crate::domain::ports::{ConfigProvider, ProfileCache, ProfileFetcher, RateLimiter};
pub use crate::utils::error::Result;
