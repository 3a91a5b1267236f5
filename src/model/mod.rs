//! Cascade model: pixel-comparison features, full binary trees and the
//! staged cascade built from them, plus the binary model format.

pub mod cascade;
pub mod feature;
pub mod io;
pub mod tree;

pub use cascade::{Cascade, Prediction};
pub use feature::{check_patch_dims, Feature, MAX_OFFSET};
pub use io::{load_cascade, load_or_create, read_cascade, save_cascade, write_cascade};
pub use tree::{leaf_count, node_count, Tree, NO_THRESHOLD};
