//! Validated, positional view over one column of an Arrow batch.
//!
//! A [`ColumnBlock`] classifies the Arrow array once, when it is built, so the
//! predicate loops can dispatch to a monomorphic routine per array type and
//! never fail while walking rows.

use arrow::{
    array::{
        Array, AsArray, BinaryArray, BinaryViewArray, GenericByteArray, GenericByteViewArray,
        LargeBinaryArray, LargeStringArray, PrimitiveArray, StringArray, StringViewArray,
    },
    datatypes::{
        ArrowNativeType, ArrowPrimitiveType, ByteArrayType, ByteViewType, DataType, Int16Type,
        Int32Type, Int64Type, Int8Type, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
    },
    record_batch::RecordBatch,
};

use crate::error::ResolveError;

/// Byte access to the cells of a string or binary array.
pub(crate) trait ByteCells: Array {
    fn bytes(&self, idx: usize) -> &[u8];
}

impl<T: ByteArrayType> ByteCells for GenericByteArray<T> {
    #[inline]
    fn bytes(&self, idx: usize) -> &[u8] {
        AsRef::<[u8]>::as_ref(self.value(idx))
    }
}

impl<T: ByteViewType + ?Sized> ByteCells for GenericByteViewArray<T> {
    #[inline]
    fn bytes(&self, idx: usize) -> &[u8] {
        AsRef::<[u8]>::as_ref(self.value(idx))
    }
}

/// Concrete value array of a block.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ValueCells<'b> {
    Utf8(&'b StringArray),
    LargeUtf8(&'b LargeStringArray),
    Utf8View(&'b StringViewArray),
    Binary(&'b BinaryArray),
    LargeBinary(&'b LargeBinaryArray),
    BinaryView(&'b BinaryViewArray),
}

/// Expands `$body` once per concrete value array, binding it to `$cells`.
macro_rules! with_value_cells {
    ($value:expr, |$cells:ident| $body:expr) => {
        match $value {
            $crate::block::ValueCells::Utf8($cells) => $body,
            $crate::block::ValueCells::LargeUtf8($cells) => $body,
            $crate::block::ValueCells::Utf8View($cells) => $body,
            $crate::block::ValueCells::Binary($cells) => $body,
            $crate::block::ValueCells::LargeBinary($cells) => $body,
            $crate::block::ValueCells::BinaryView($cells) => $body,
        }
    };
}

pub(crate) use with_value_cells;

impl<'b> ValueCells<'b> {
    fn try_new(array: &'b dyn Array) -> Option<Self> {
        Some(match array.data_type() {
            DataType::Utf8 => ValueCells::Utf8(array.as_string::<i32>()),
            DataType::LargeUtf8 => ValueCells::LargeUtf8(array.as_string::<i64>()),
            DataType::Utf8View => ValueCells::Utf8View(array.as_string_view()),
            DataType::Binary => ValueCells::Binary(array.as_binary::<i32>()),
            DataType::LargeBinary => ValueCells::LargeBinary(array.as_binary::<i64>()),
            DataType::BinaryView => ValueCells::BinaryView(array.as_binary_view()),
            _ => return None,
        })
    }

    pub(crate) fn len(&self) -> usize {
        with_value_cells!(self, |cells| cells.len())
    }

    fn is_null(&self, idx: usize) -> bool {
        with_value_cells!(self, |cells| cells.is_null(idx))
    }

    fn is_binary(&self) -> bool {
        matches!(
            self,
            ValueCells::Binary(_) | ValueCells::LargeBinary(_) | ValueCells::BinaryView(_)
        )
    }

    fn bytes(&self, idx: usize) -> &'b [u8] {
        with_value_cells!(*self, |cells| cells.bytes(idx))
    }
}

/// Keys of a dictionary-encoded block, one variant per Arrow key type.
#[derive(Clone, Copy, Debug)]
pub(crate) enum DictKeys<'b> {
    Int8(&'b PrimitiveArray<Int8Type>),
    Int16(&'b PrimitiveArray<Int16Type>),
    Int32(&'b PrimitiveArray<Int32Type>),
    Int64(&'b PrimitiveArray<Int64Type>),
    UInt8(&'b PrimitiveArray<UInt8Type>),
    UInt16(&'b PrimitiveArray<UInt16Type>),
    UInt32(&'b PrimitiveArray<UInt32Type>),
    UInt64(&'b PrimitiveArray<UInt64Type>),
}

/// Expands `$body` once per key array type, binding it to `$keys`.
macro_rules! with_dict_keys {
    ($value:expr, |$keys:ident| $body:expr) => {
        match $value {
            $crate::block::DictKeys::Int8($keys) => $body,
            $crate::block::DictKeys::Int16($keys) => $body,
            $crate::block::DictKeys::Int32($keys) => $body,
            $crate::block::DictKeys::Int64($keys) => $body,
            $crate::block::DictKeys::UInt8($keys) => $body,
            $crate::block::DictKeys::UInt16($keys) => $body,
            $crate::block::DictKeys::UInt32($keys) => $body,
            $crate::block::DictKeys::UInt64($keys) => $body,
        }
    };
}

pub(crate) use with_dict_keys;

/// Reads the dictionary slot referenced by row `idx`.
#[inline]
pub(crate) fn dict_key<K: ArrowPrimitiveType>(keys: &PrimitiveArray<K>, idx: usize) -> usize {
    keys.value(idx).as_usize()
}

/// Dictionary-encoded block: per-row keys into a plain value array.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DictionaryCells<'b> {
    pub(crate) keys: DictKeys<'b>,
    pub(crate) values: ValueCells<'b>,
}

impl<'b> DictionaryCells<'b> {
    fn try_new(array: &'b dyn Array, key_type: &DataType) -> Option<Self> {
        macro_rules! dictionary {
            ($variant:ident, $key:ty) => {{
                let dict = array.as_dictionary::<$key>();
                (DictKeys::$variant(dict.keys()), dict.values().as_ref())
            }};
        }

        let (keys, values) = match key_type {
            DataType::Int8 => dictionary!(Int8, Int8Type),
            DataType::Int16 => dictionary!(Int16, Int16Type),
            DataType::Int32 => dictionary!(Int32, Int32Type),
            DataType::Int64 => dictionary!(Int64, Int64Type),
            DataType::UInt8 => dictionary!(UInt8, UInt8Type),
            DataType::UInt16 => dictionary!(UInt16, UInt16Type),
            DataType::UInt32 => dictionary!(UInt32, UInt32Type),
            DataType::UInt64 => dictionary!(UInt64, UInt64Type),
            _ => return None,
        };
        Some(Self {
            keys,
            values: ValueCells::try_new(values)?,
        })
    }

    fn key(&self, idx: usize) -> usize {
        with_dict_keys!(self.keys, |keys| dict_key(keys, idx))
    }

    fn is_key_null(&self, idx: usize) -> bool {
        with_dict_keys!(self.keys, |keys| keys.is_null(idx))
    }
}

/// Classified cells of a block.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Cells<'b> {
    Plain(ValueCells<'b>),
    Dictionary(DictionaryCells<'b>),
}

/// One column of a row batch, together with its declared nullability.
///
/// Null bits are only meaningful when the block is declared nullable; a
/// non-nullable block is read as if every cell were valid. Rows are addressed
/// by [`RowId`](crate::RowId), so a block holds at most `RowId::MAX + 1` rows.
#[derive(Clone, Copy, Debug)]
pub struct ColumnBlock<'b> {
    array: &'b dyn Array,
    nullable: bool,
    cells: Cells<'b>,
}

impl<'b> ColumnBlock<'b> {
    /// Wraps `array`, failing when it does not hold string or binary cells.
    pub fn new(array: &'b dyn Array, nullable: bool) -> Result<Self, ResolveError> {
        let unsupported = || ResolveError::UnsupportedType(array.data_type().clone());
        let cells = match array.data_type() {
            DataType::Dictionary(key_type, _) => Cells::Dictionary(
                DictionaryCells::try_new(array, key_type).ok_or_else(unsupported)?,
            ),
            _ => Cells::Plain(ValueCells::try_new(array).ok_or_else(unsupported)?),
        };
        Ok(Self {
            array,
            nullable,
            cells,
        })
    }

    /// Selects column `column_id` of `batch`, taking nullability from its schema.
    pub fn from_batch(batch: &'b RecordBatch, column_id: usize) -> Result<Self, ResolveError> {
        if column_id >= batch.num_columns() {
            return Err(ResolveError::ColumnOutOfRange {
                column_id,
                num_columns: batch.num_columns(),
            });
        }
        let nullable = batch.schema_ref().field(column_id).is_nullable();
        Self::new(batch.column(column_id).as_ref(), nullable)
    }

    /// Number of rows in the block.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Returns true when the block has no rows.
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Whether the column was declared nullable.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether cells are raw bytes rather than UTF-8 text.
    ///
    /// Patterns evaluated over such a block should be compiled with
    /// [`LikeOption::binary`](crate::LikeOption::binary).
    pub fn is_binary(&self) -> bool {
        match &self.cells {
            Cells::Plain(values) => values.is_binary(),
            Cells::Dictionary(dict) => dict.values.is_binary(),
        }
    }

    /// Arrow type of the underlying array.
    pub fn data_type(&self) -> &DataType {
        self.array.data_type()
    }

    /// Returns true when the cell at `idx` is null.
    ///
    /// Always false for blocks declared non-nullable.
    pub fn is_null(&self, idx: usize) -> bool {
        if !self.nullable {
            return false;
        }
        match &self.cells {
            Cells::Plain(values) => values.is_null(idx),
            Cells::Dictionary(dict) => {
                dict.is_key_null(idx) || dict.values.is_null(dict.key(idx))
            }
        }
    }

    /// Raw bytes of the cell at `idx`.
    pub fn value(&self, idx: usize) -> &'b [u8] {
        match &self.cells {
            Cells::Plain(values) => values.bytes(idx),
            Cells::Dictionary(dict) => dict.values.bytes(dict.key(idx)),
        }
    }

    pub(crate) fn cells(&self) -> &Cells<'b> {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{DictionaryArray, Int32Array},
        datatypes::{Field, Schema},
    };

    use super::*;

    #[test]
    fn plain_string_block() {
        let array = StringArray::from(vec![Some("abc"), None, Some("xyz")]);
        let block = ColumnBlock::new(&array, true).expect("utf8 block");
        assert_eq!(block.len(), 3);
        assert!(block.is_nullable());
        assert!(!block.is_null(0));
        assert!(block.is_null(1));
        assert_eq!(block.value(2), b"xyz");
        assert_eq!(block.data_type(), &DataType::Utf8);
    }

    #[test]
    fn non_nullable_block_ignores_null_bits() {
        let array = StringArray::from(vec![Some("abc"), None]);
        let block = ColumnBlock::new(&array, false).expect("utf8 block");
        assert!(!block.is_null(1));
    }

    #[test]
    fn binary_and_view_blocks() {
        let binary = BinaryArray::from_vec(vec![&b"a"[..], &b"bc"[..]]);
        let block = ColumnBlock::new(&binary, false).expect("binary block");
        assert_eq!(block.value(1), b"bc");
        assert!(block.is_binary());

        let view = StringViewArray::from(vec!["a long string that is not inlined", "s"]);
        let block = ColumnBlock::new(&view, false).expect("view block");
        assert_eq!(block.value(0), b"a long string that is not inlined");
        assert_eq!(block.value(1), b"s");
        assert!(!block.is_binary());
    }

    #[test]
    fn dictionary_block_resolves_keys_and_nulls() {
        let array: DictionaryArray<Int32Type> =
            vec![Some("red"), None, Some("blue"), Some("red")]
                .into_iter()
                .collect();
        let block = ColumnBlock::new(&array, true).expect("dictionary block");
        assert_eq!(block.value(0), b"red");
        assert_eq!(block.value(2), b"blue");
        assert_eq!(block.value(3), b"red");
        assert!(block.is_null(1));
        assert!(!block.is_null(3));
        assert!(!block.is_binary());
    }

    #[test]
    fn rejects_non_string_arrays() {
        let ints = Int32Array::from(vec![1, 2, 3]);
        let err = ColumnBlock::new(&ints, false).unwrap_err();
        assert_eq!(err, ResolveError::UnsupportedType(DataType::Int32));
    }

    #[test]
    fn from_batch_uses_schema_nullability() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("name", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, 2])) as _,
                Arc::new(StringArray::from(vec![Some("a"), None])) as _,
            ],
        )
        .expect("record batch");

        let block = ColumnBlock::from_batch(&batch, 1).expect("name column");
        assert!(block.is_nullable());
        assert!(block.is_null(1));

        let err = ColumnBlock::from_batch(&batch, 2).unwrap_err();
        assert_eq!(
            err,
            ResolveError::ColumnOutOfRange {
                column_id: 2,
                num_columns: 2,
            }
        );
    }
}
