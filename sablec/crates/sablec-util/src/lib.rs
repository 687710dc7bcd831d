//! sablec-util - Shared utilities for the sable front-end.
//!
//! This crate provides the small building blocks the tokenizer and parser
//! share:
//! - `index_vec` - Typed index vectors backing the flat AST arena and the
//!   token buffer
//! - Hash map aliases over the Fx hasher

pub mod index_vec;

pub use index_vec::{Idx, IndexVec};

pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;

use std::hash::BuildHasherDefault;

/// An insertion-ordered map using the Fx hasher.
///
/// Used where iteration order must match insertion order, e.g. the
/// parser's dependency map.
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<rustc_hash::FxHasher>>;

/// An insertion-ordered set using the Fx hasher.
pub type FxIndexSet<T> = indexmap::IndexSet<T, BuildHasherDefault<rustc_hash::FxHasher>>;
