pub mod cli;
pub mod config;
pub mod core;
pub mod resolvers;
pub mod utils;

pub use crate::core::{LinkKind, MediaLink, Quality, Resolver, ResolverEngine};
pub use crate::resolvers::{HttpFetcher, LinkResolver, PageFetcher};
