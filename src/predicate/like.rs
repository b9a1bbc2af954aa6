use std::fmt;

use arrow::{
    array::{Array, PrimitiveArray},
    datatypes::ArrowPrimitiveType,
};

use super::{ColumnPredicate, Outcome, PredicateType};
use crate::{
    block::{
        dict_key, with_dict_keys, with_value_cells, ByteCells, Cells, ColumnBlock,
        DictionaryCells, ValueCells,
    },
    error::IndexError,
    index::BitmapIndexIterator,
    like::{LikeMatcher, LikeState},
    logging::{vecpred_log, LIKE_CTX},
    row_set::{BitmapRowSet, RowId},
};

/// `column LIKE pattern`, or `NOT LIKE` when `opposite` is set.
///
/// The matcher is borrowed from the scan that compiled it and must outlive
/// the predicate. Null cells of a nullable column never satisfy the
/// predicate, with or without `opposite`.
pub struct LikeColumnPredicate<'a, M: ?Sized> {
    opposite: bool,
    column_id: usize,
    origin: String,
    matcher: &'a M,
    pattern: Box<[u8]>,
}

impl<'a, M> LikeColumnPredicate<'a, M>
where
    M: LikeMatcher + ?Sized,
{
    /// Builds a predicate passing `pattern` to `matcher` for every row.
    pub fn new(
        opposite: bool,
        column_id: usize,
        matcher: &'a M,
        pattern: impl Into<Vec<u8>>,
    ) -> Self {
        let pattern = pattern.into().into_boxed_slice();
        Self {
            opposite,
            column_id,
            origin: String::from_utf8_lossy(&pattern).into_owned(),
            matcher,
            pattern,
        }
    }

    /// True for `NOT LIKE`.
    pub fn opposite(&self) -> bool {
        self.opposite
    }

    /// Pattern text, for diagnostics.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Pattern value handed to the matcher.
    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    #[inline(always)]
    fn accept(&self, value: &[u8]) -> bool {
        self.opposite ^ self.matcher.is_match(value, &self.pattern)
    }

    #[inline(always)]
    fn accept_row<C, const IS_NULLABLE: bool>(&self, cells: &C, row: usize) -> bool
    where
        C: ByteCells,
    {
        (!IS_NULLABLE || cells.is_valid(row)) && self.accept(cells.bytes(row))
    }

    fn base_evaluate<C, const IS_NULLABLE: bool>(&self, cells: &C, sel: &mut [RowId]) -> usize
    where
        C: ByteCells,
    {
        compact(sel, |row| self.accept_row::<C, IS_NULLABLE>(cells, row))
    }

    fn base_evaluate_vec<C, const IS_NULLABLE: bool>(&self, cells: &C, flags: &mut [bool])
    where
        C: ByteCells,
    {
        fill(flags, |row| self.accept_row::<C, IS_NULLABLE>(cells, row))
    }

    fn dictionary_evaluate<K, const IS_NULLABLE: bool>(
        &self,
        keys: &PrimitiveArray<K>,
        values: ValueCells<'_>,
        sel: &mut [RowId],
    ) -> usize
    where
        K: ArrowPrimitiveType,
    {
        let mut verdicts = SlotVerdicts::new(values.len());
        compact(sel, |row| {
            self.accept_dictionary_row::<K, IS_NULLABLE>(keys, values, &mut verdicts, row)
        })
    }

    fn dictionary_evaluate_vec<K, const IS_NULLABLE: bool>(
        &self,
        keys: &PrimitiveArray<K>,
        values: ValueCells<'_>,
        flags: &mut [bool],
    ) where
        K: ArrowPrimitiveType,
    {
        let mut verdicts = SlotVerdicts::new(values.len());
        fill(flags, |row| {
            self.accept_dictionary_row::<K, IS_NULLABLE>(keys, values, &mut verdicts, row)
        })
    }

    #[inline(always)]
    fn accept_dictionary_row<K, const IS_NULLABLE: bool>(
        &self,
        keys: &PrimitiveArray<K>,
        values: ValueCells<'_>,
        verdicts: &mut SlotVerdicts,
        row: usize,
    ) -> bool
    where
        K: ArrowPrimitiveType,
    {
        if IS_NULLABLE && keys.is_null(row) {
            return false;
        }
        let slot = dict_key(keys, row);
        verdicts.get_or_insert(slot, || {
            with_value_cells!(values, |cells| self.accept_row::<_, IS_NULLABLE>(cells, slot))
        })
    }

    fn evaluate_dictionary(
        &self,
        dict: &DictionaryCells<'_>,
        nullable: bool,
        sel: &mut [RowId],
    ) -> usize {
        with_dict_keys!(dict.keys, |keys| if nullable {
            self.dictionary_evaluate::<_, true>(keys, dict.values, sel)
        } else {
            self.dictionary_evaluate::<_, false>(keys, dict.values, sel)
        })
    }

    fn evaluate_dictionary_vec(
        &self,
        dict: &DictionaryCells<'_>,
        nullable: bool,
        flags: &mut [bool],
    ) {
        with_dict_keys!(dict.keys, |keys| if nullable {
            self.dictionary_evaluate_vec::<_, true>(keys, dict.values, flags)
        } else {
            self.dictionary_evaluate_vec::<_, false>(keys, dict.values, flags)
        })
    }
}

impl<'a> LikeColumnPredicate<'a, LikeState> {
    /// Builds a predicate over a compiled [`LikeState`], reusing its pattern.
    pub fn from_state(opposite: bool, column_id: usize, state: &'a LikeState) -> Self {
        Self::new(opposite, column_id, state, state.pattern())
    }
}

/// Stable in-place compaction of `sel` to the rows `accept` keeps.
#[inline(always)]
fn compact(sel: &mut [RowId], mut accept: impl FnMut(usize) -> bool) -> usize {
    let mut new_size = 0;
    let mut prev: Option<RowId> = None;
    for i in 0..sel.len() {
        let idx = sel[i];
        debug_assert!(
            prev.map_or(true, |prev| prev < idx),
            "selection must be strictly increasing"
        );
        prev = Some(idx);
        sel[new_size] = idx;
        new_size += usize::from(accept(idx as usize));
    }
    new_size
}

#[inline(always)]
fn fill(flags: &mut [bool], mut accept: impl FnMut(usize) -> bool) {
    for (row, flag) in flags.iter_mut().enumerate() {
        *flag = accept(row);
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Unknown,
    Accept,
    Reject,
}

/// Per-call verdicts for dictionary slots, filled on first reference.
struct SlotVerdicts {
    slots: Vec<Verdict>,
}

impl SlotVerdicts {
    fn new(len: usize) -> Self {
        Self {
            slots: vec![Verdict::Unknown; len],
        }
    }

    #[inline(always)]
    fn get_or_insert(&mut self, slot: usize, decide: impl FnOnce() -> bool) -> bool {
        match self.slots[slot] {
            Verdict::Accept => true,
            Verdict::Reject => false,
            Verdict::Unknown => {
                let accept = decide();
                self.slots[slot] = if accept {
                    Verdict::Accept
                } else {
                    Verdict::Reject
                };
                accept
            }
        }
    }
}

impl<M> ColumnPredicate for LikeColumnPredicate<'_, M>
where
    M: LikeMatcher + ?Sized,
{
    /// LIKE has no dedicated tag in the optimizer's taxonomy and has always
    /// been reported as an equality-class predicate.
    fn predicate_type(&self) -> PredicateType {
        PredicateType::Eq
    }

    fn column_id(&self) -> usize {
        self.column_id
    }

    fn evaluate(&self, block: &ColumnBlock<'_>, sel: &mut [RowId]) -> usize {
        let input = sel.len();
        let selected = match (block.cells(), block.is_nullable()) {
            (Cells::Plain(values), true) => {
                with_value_cells!(*values, |cells| self.base_evaluate::<_, true>(cells, sel))
            }
            (Cells::Plain(values), false) => {
                with_value_cells!(*values, |cells| self.base_evaluate::<_, false>(cells, sel))
            }
            (Cells::Dictionary(dict), nullable) => self.evaluate_dictionary(dict, nullable, sel),
        };
        vecpred_log!(
            log::Level::Trace,
            ctx: LIKE_CTX,
            "like_evaluated",
            "column_id={} opposite={} input={} selected={}",
            self.column_id,
            self.opposite,
            input,
            selected,
        );
        selected
    }

    fn evaluate_vec(&self, block: &ColumnBlock<'_>, flags: &mut [bool]) {
        debug_assert!(flags.len() <= block.len(), "flags longer than block");
        match (block.cells(), block.is_nullable()) {
            (Cells::Plain(values), true) => with_value_cells!(*values, |cells| {
                self.base_evaluate_vec::<_, true>(cells, flags)
            }),
            (Cells::Plain(values), false) => with_value_cells!(*values, |cells| {
                self.base_evaluate_vec::<_, false>(cells, flags)
            }),
            (Cells::Dictionary(dict), nullable) => {
                self.evaluate_dictionary_vec(dict, nullable, flags)
            }
        }
    }

    fn evaluate_or(
        &self,
        _block: &ColumnBlock<'_>,
        _sel: &[RowId],
        _flags: &mut [bool],
    ) -> Outcome {
        Outcome::NotApplicable
    }

    fn evaluate_and(
        &self,
        _block: &ColumnBlock<'_>,
        _sel: &[RowId],
        _flags: &mut [bool],
    ) -> Outcome {
        Outcome::NotApplicable
    }

    /// Patterns cannot be answered from equality or range bitmaps.
    fn evaluate_index(
        &self,
        _iterators: &mut [&mut dyn BitmapIndexIterator],
        _num_rows: RowId,
        _rows: &mut BitmapRowSet,
    ) -> Result<Outcome, IndexError> {
        Ok(Outcome::NotApplicable)
    }
}

impl<M: ?Sized> PartialEq for LikeColumnPredicate<'_, M> {
    fn eq(&self, other: &Self) -> bool {
        self.opposite == other.opposite
            && self.column_id == other.column_id
            && self.pattern == other.pattern
    }
}

impl<M: ?Sized> fmt::Debug for LikeColumnPredicate<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LikeColumnPredicate")
            .field("opposite", &self.opposite)
            .field("column_id", &self.column_id)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl<M: ?Sized> fmt::Display for LikeColumnPredicate<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = if self.opposite { "NOT " } else { "" };
        write!(f, "col#{} {}LIKE '{}'", self.column_id, not, self.origin)
    }
}
