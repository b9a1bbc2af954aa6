#![deny(missing_docs)]
//! Vectorized, Arrow-native column predicates.
//!
//! The crate evaluates a single-column predicate against one block of rows at
//! a time. Two output shapes are supported: compacting a caller-owned
//! selection list in place, and overwriting a caller-owned flag array. The
//! only predicate kind implemented today is `LIKE` / `NOT LIKE`; the matcher
//! it calls is borrowed from the enclosing scan, and [`LikeState`] is the
//! bundled implementation.
//!
//! NULL never satisfies a predicate: `NULL LIKE p` and `NULL NOT LIKE p` both
//! drop the row.

/// Validated column views over Arrow arrays.
pub mod block;

/// Error types.
pub mod error;

/// Secondary index hook.
pub mod index;

/// Matcher contract and compiled LIKE patterns.
pub mod like;

mod logging;

mod option;

/// Column predicate trait and implementations.
pub mod predicate;

/// Schema binding for predicates.
pub mod resolve;

/// Row identifiers and row sets.
pub mod row_set;

pub use crate::{
    block::ColumnBlock,
    error::{IndexError, PatternError, ResolveError},
    index::{BitmapIndexIterator, MemoryBitmapIndex},
    like::{LikeKind, LikeMatcher, LikeState},
    option::{LikeOption, DEFAULT_ESCAPE},
    predicate::{ColumnPredicate, LikeColumnPredicate, Outcome, PredicateType},
    resolve::{is_like_compatible, resolve_like},
    row_set::{BitmapRowSet, RowId, RowSet},
};
