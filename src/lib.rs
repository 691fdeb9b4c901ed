//! # Maze Link
//!
//! Keeps a maze generator's configuration and the page's URL fragment in step,
//! so every maze can be shared and reproduced from its link.
//!
//! The fragment carries the structural part of a configuration:
//!
//! ```text
//! <shape-letter><size>|<algorithm>|<seed>      e.g. R10|GrowingTree|8472910364
//! ```
//!
//! Visual settings (colour, features, stroke width) are not part of the link
//! and survive navigation unchanged.
//!
//! ## Pieces
//! - [`codec`]: decoding and encoding fragments, tolerating malformed input
//! - [`ConfigurationStore`]: the single owner of the current configuration
//! - [`FragmentIo`]: where fragments are read from and written to
//! - [`RenderBridge`]: turns committed configurations into artifacts
//! - [`export`]: multi-page documents with one share link per page

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod constants;
pub mod export;
pub mod features;
pub mod fragment;
pub mod render;
pub mod seed;
pub mod shape;
pub mod store;
mod types;

// Re-export public types and the pieces most hosts need
pub use features::FeatureSet;
pub use fragment::{Delivery, FragmentIo, ListenerId, MemoryFragment};
pub use render::{MazeGenerator, RenderBridge, RenderError, RenderOutput, RenderStatus};
pub use seed::{RandomSeeds, SeedSource, SequenceSeeds};
pub use store::{ConfigurationStore, Observer, SubscriptionId};
pub use types::*;

#[cfg(target_arch = "wasm32")]
pub use fragment::BrowserFragment;
