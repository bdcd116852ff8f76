// Resolver module - share link to media url/bytes

pub mod errors;
pub mod models;
pub mod http;
pub mod link;
pub mod extractors;
pub mod fetcher;
pub mod cache;
pub mod config;
pub mod encoder;
pub mod tools;
pub mod utils;
pub mod reconstruct;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::ResolveError;
pub use models::{ExtractionResult, NetworkConfig, Resolved, ResolverConfig};
pub use http::{HttpClient, ReqwestClient};
pub use extractors::{ExtractionChain, ExtractionStrategy};
pub use encoder::{Encoder, FfmpegEncoder};
pub use pipeline::ResolutionPipeline;
