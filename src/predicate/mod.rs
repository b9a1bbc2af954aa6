//! Column predicates evaluated batch-at-a-time against a [`ColumnBlock`].
//!
//! Every predicate kind implements [`ColumnPredicate`] directly; there is no
//! shared base state. Kinds that cannot take part in a given evaluation
//! strategy say so through [`Outcome::NotApplicable`] instead of guessing a
//! match result.

pub(crate) mod like;

use std::fmt;

pub use like::LikeColumnPredicate;

use crate::{
    block::ColumnBlock,
    error::IndexError,
    index::BitmapIndexIterator,
    row_set::{BitmapRowSet, RowId},
};

/// Comparison class reported to the optimizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PredicateType {
    /// Equals (`=`).
    Eq,
    /// Not equals (`!=`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal to (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal to (`>=`).
    Ge,
    /// Membership in a literal list.
    InList,
    /// Exclusion from a literal list.
    NotInList,
    /// `IS NULL`.
    IsNull,
    /// `IS NOT NULL`.
    IsNotNull,
    /// Bloom filter probe.
    BloomFilter,
}

impl fmt::Display for PredicateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PredicateType::Eq => "=",
            PredicateType::Ne => "!=",
            PredicateType::Lt => "<",
            PredicateType::Le => "<=",
            PredicateType::Gt => ">",
            PredicateType::Ge => ">=",
            PredicateType::InList => "IN",
            PredicateType::NotInList => "NOT IN",
            PredicateType::IsNull => "IS NULL",
            PredicateType::IsNotNull => "IS NOT NULL",
            PredicateType::BloomFilter => "BLOOM FILTER",
        })
    }
}

/// Whether an optional evaluation strategy did anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The predicate updated the caller's state.
    Applied,
    /// The strategy does not apply to this predicate; caller state is
    /// untouched and the caller must fall back to row evaluation.
    NotApplicable,
}

/// A single-column predicate evaluated over blocks of rows.
pub trait ColumnPredicate: Send + Sync {
    /// Comparison class used by the optimizer.
    fn predicate_type(&self) -> PredicateType;

    /// Ordinal of the column this predicate reads.
    fn column_id(&self) -> usize;

    /// Compacts `sel` in place to the rows that satisfy the predicate and
    /// returns how many were kept. Survivors keep their relative order.
    fn evaluate(&self, block: &ColumnBlock<'_>, sel: &mut [RowId]) -> usize;

    /// Writes the verdict for rows `0..flags.len()` into `flags`,
    /// overwriting whatever was there.
    fn evaluate_vec(&self, block: &ColumnBlock<'_>, flags: &mut [bool]);

    /// ORs the verdict for the rows in `sel` into `flags`.
    fn evaluate_or(&self, block: &ColumnBlock<'_>, sel: &[RowId], flags: &mut [bool]) -> Outcome;

    /// ANDs the verdict for the rows in `sel` into `flags`.
    fn evaluate_and(&self, block: &ColumnBlock<'_>, sel: &[RowId], flags: &mut [bool])
        -> Outcome;

    /// Narrows `rows` using secondary indexes instead of reading values.
    fn evaluate_index(
        &self,
        iterators: &mut [&mut dyn BitmapIndexIterator],
        num_rows: RowId,
        rows: &mut BitmapRowSet,
    ) -> Result<Outcome, IndexError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_type_display() {
        assert_eq!(PredicateType::Eq.to_string(), "=");
        assert_eq!(PredicateType::NotInList.to_string(), "NOT IN");
        assert_eq!(PredicateType::IsNotNull.to_string(), "IS NOT NULL");
    }

    #[test]
    fn column_predicate_is_object_safe() {
        fn assert_dyn(_: Option<&dyn ColumnPredicate>) {}
        assert_dyn(None);
    }
}
