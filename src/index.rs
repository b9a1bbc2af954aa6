//! Secondary bitmap index hook.
//!
//! Predicates that can be answered from an index receive one
//! [`BitmapIndexIterator`] per column they read. [`MemoryBitmapIndex`] is a
//! small in-memory index over a single [`ColumnBlock`], mostly useful to
//! drive predicates in tests and benchmarks.

use std::collections::BTreeMap;

use crate::{
    block::ColumnBlock,
    error::IndexError,
    row_set::{BitmapRowSet, RowId, RowSet},
};

/// Cursor over a bitmap index keyed by sorted distinct column values.
pub trait BitmapIndexIterator {
    /// Number of distinct non-null values in the index.
    fn cardinality(&self) -> usize;

    /// Ordinal of `value` when it is present, or `None`.
    fn seek(&mut self, value: &[u8]) -> Result<Option<usize>, IndexError>;

    /// Unions the rows holding the value at `ordinal` into `rows`.
    fn read_bitmap(&mut self, ordinal: usize, rows: &mut BitmapRowSet) -> Result<(), IndexError>;

    /// Unions the rows holding null into `rows`.
    fn read_null_bitmap(&mut self, rows: &mut BitmapRowSet) -> Result<(), IndexError>;
}

/// Bitmap index built from an in-memory block.
#[derive(Clone, Debug, Default)]
pub struct MemoryBitmapIndex {
    values: Vec<Vec<u8>>,
    bitmaps: Vec<BitmapRowSet>,
    nulls: BitmapRowSet,
}

impl MemoryBitmapIndex {
    /// Indexes every row of `block`.
    ///
    /// Only the first `RowId::MAX + 1` rows are addressable.
    pub fn build(block: &ColumnBlock<'_>) -> Self {
        debug_assert!(
            u64::try_from(block.len()).is_ok_and(|len| len <= u64::from(RowId::MAX) + 1),
            "block of {} rows exceeds the row id space",
            block.len()
        );
        let mut by_value: BTreeMap<&[u8], BitmapRowSet> = BTreeMap::new();
        let mut nulls = BitmapRowSet::new();
        for (row, row_id) in (0..block.len()).zip(0..=RowId::MAX) {
            if block.is_null(row) {
                nulls.insert(row_id);
            } else {
                by_value.entry(block.value(row)).or_default().insert(row_id);
            }
        }
        let (values, bitmaps) = by_value
            .into_iter()
            .map(|(value, rows)| (value.to_vec(), rows))
            .unzip();
        Self {
            values,
            bitmaps,
            nulls,
        }
    }

    /// Iterator positioned at the start of the index.
    pub fn iter(&self) -> MemoryBitmapIndexIter<'_> {
        MemoryBitmapIndexIter { index: self }
    }
}

/// [`BitmapIndexIterator`] over a [`MemoryBitmapIndex`].
#[derive(Clone, Copy, Debug)]
pub struct MemoryBitmapIndexIter<'i> {
    index: &'i MemoryBitmapIndex,
}

impl BitmapIndexIterator for MemoryBitmapIndexIter<'_> {
    fn cardinality(&self) -> usize {
        self.index.values.len()
    }

    fn seek(&mut self, value: &[u8]) -> Result<Option<usize>, IndexError> {
        Ok(self
            .index
            .values
            .binary_search_by(|entry| entry.as_slice().cmp(value))
            .ok())
    }

    fn read_bitmap(&mut self, ordinal: usize, rows: &mut BitmapRowSet) -> Result<(), IndexError> {
        let bitmap = self.index.bitmaps.get(ordinal).ok_or_else(|| {
            IndexError::read(format!(
                "ordinal {ordinal} out of range for index with {} values",
                self.index.values.len()
            ))
        })?;
        rows.union_with(bitmap);
        Ok(())
    }

    fn read_null_bitmap(&mut self, rows: &mut BitmapRowSet) -> Result<(), IndexError> {
        rows.union_with(&self.index.nulls);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::StringArray;

    use super::*;

    #[test]
    fn builds_sorted_value_bitmaps() {
        let array = StringArray::from(vec![Some("b"), None, Some("a"), Some("b")]);
        let block = ColumnBlock::new(&array, true).expect("block");
        let index = MemoryBitmapIndex::build(&block);
        let mut iter = index.iter();

        assert_eq!(iter.cardinality(), 2);
        assert_eq!(iter.seek(b"a").expect("seek"), Some(0));
        assert_eq!(iter.seek(b"c").expect("seek"), None);

        let ordinal = iter.seek(b"b").expect("seek").expect("present");
        let mut rows = BitmapRowSet::new();
        iter.read_bitmap(ordinal, &mut rows).expect("read");
        assert_eq!(rows.iter().collect::<Vec<_>>(), vec![0, 3]);

        let mut nulls = BitmapRowSet::new();
        iter.read_null_bitmap(&mut nulls).expect("nulls");
        assert_eq!(nulls.iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn row_ids_follow_positions_past_u16() {
        let rows: Vec<&str> = (0..70_000)
            .map(|row| if row % 7 == 0 { "seven" } else { "other" })
            .collect();
        let array = StringArray::from(rows);
        let block = ColumnBlock::new(&array, false).expect("block");
        let index = MemoryBitmapIndex::build(&block);
        let mut iter = index.iter();

        let ordinal = iter.seek(b"seven").expect("seek").expect("present");
        let mut rows = BitmapRowSet::new();
        iter.read_bitmap(ordinal, &mut rows).expect("read");
        assert_eq!(rows.len(), 10_000);
        assert!(rows.contains(69_993));
        assert!(!rows.contains(69_999));
    }

    #[test]
    fn out_of_range_ordinal_is_an_error() {
        let array = StringArray::from(vec!["a"]);
        let block = ColumnBlock::new(&array, false).expect("block");
        let index = MemoryBitmapIndex::build(&block);
        let mut rows = BitmapRowSet::new();
        let err = index.iter().read_bitmap(7, &mut rows).unwrap_err();
        assert!(err.to_string().contains("ordinal 7 out of range"));
        assert!(rows.is_empty());
    }
}
