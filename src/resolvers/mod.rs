pub mod fetch;
pub mod pipeline;

pub use fetch::{FetchedPage, HttpFetcher, PageFetcher};
pub use pipeline::{LinkResolver, ResolverOptions};
