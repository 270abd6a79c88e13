//! Feature resolution and composition engine

pub mod cache;
pub mod group;
pub mod merge;
pub mod pipeline;
pub mod registry;

pub use cache::{CacheOutcome, FeatureCache};
pub use group::{FeatureBuilder, FeatureGroup, GroupSettings};
pub use merge::left_merge;
pub use pipeline::Pipeline;
pub use registry::{GroupFactory, GroupRegistry};
