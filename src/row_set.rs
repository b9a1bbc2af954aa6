//! Row-set abstractions built on top of roaring bitmaps.

use std::convert::TryFrom;

use roaring::RoaringBitmap;

/// Position of a row within a column block.
pub type RowId = u32;

/// Borrowed iterator that yields [`RowId`] values.
pub type RowIdIter<'a> = Box<dyn Iterator<Item = RowId> + Send + 'a>;

/// Abstract set of row identifiers that supports basic set algebra.
pub trait RowSet: Send + Sync {
    /// Returns the number of rows tracked by the set.
    fn len(&self) -> usize;

    /// Returns true when the set is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over row identifiers.
    fn iter(&self) -> RowIdIter<'_>;

    /// Returns true when `row` is in the set.
    fn contains(&self, row: RowId) -> bool;

    /// Narrows this set to the rows also in `other`.
    fn intersect_with(&mut self, other: &Self)
    where
        Self: Sized;

    /// Widens this set with the rows of `other`.
    fn union_with(&mut self, other: &Self)
    where
        Self: Sized;
}

/// [`RowSet`] implementation backed by a roaring bitmap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BitmapRowSet {
    bitmap: RoaringBitmap,
}

impl BitmapRowSet {
    /// Creates an empty bitmap-backed row set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding every row in `0..num_rows`.
    #[must_use]
    pub fn full(num_rows: RowId) -> Self {
        let mut bitmap = RoaringBitmap::new();
        bitmap.insert_range(0..num_rows);
        Self { bitmap }
    }

    /// Inserts a row identifier into the set.
    pub fn insert(&mut self, row: RowId) {
        self.bitmap.insert(row);
    }

}

impl FromIterator<RowId> for BitmapRowSet {
    fn from_iter<I: IntoIterator<Item = RowId>>(iter: I) -> Self {
        Self {
            bitmap: iter.into_iter().collect(),
        }
    }
}

impl RowSet for BitmapRowSet {
    fn len(&self) -> usize {
        usize::try_from(self.bitmap.len()).unwrap_or(usize::MAX)
    }

    fn iter(&self) -> RowIdIter<'_> {
        Box::new(self.bitmap.iter())
    }

    fn contains(&self, row: RowId) -> bool {
        self.bitmap.contains(row)
    }

    fn intersect_with(&mut self, other: &Self) {
        self.bitmap &= &other.bitmap;
    }

    fn union_with(&mut self, other: &Self) {
        self.bitmap |= &other.bitmap;
    }
}
