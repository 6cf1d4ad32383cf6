pub mod error;
pub mod link;
pub mod resolver;

pub use error::ResolveError;
pub use link::{LinkKind, MediaLink, Quality, SubtitleTrack, USER_AGENT};
pub use resolver::{CollectSink, LinkSink, Resolver, ResolverEngine};
