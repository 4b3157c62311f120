//! Configuration module

mod site;

pub use site::SiteConfig;
pub use site::CmsConfig;
pub use site::CommentsConfig;
pub use site::ListingConfig;
pub use site::PreviewConfig;
pub use site::ReadingConfig;
pub use site::ServerConfig;
pub use site::{ACCESS_TOKEN_ENV, ENDPOINT_ENV};
