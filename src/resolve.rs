//! Binds LIKE predicates to a schema before any row is scanned.

use arrow::datatypes::{DataType, Schema};

use crate::{
    error::ResolveError,
    like::LikeMatcher,
    logging::{vecpred_log, LIKE_CTX},
    predicate::LikeColumnPredicate,
};

fn is_byte_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Utf8View
            | DataType::Binary
            | DataType::LargeBinary
            | DataType::BinaryView
    )
}

/// Returns true when LIKE can be evaluated over `data_type`.
pub fn is_like_compatible(data_type: &DataType) -> bool {
    match data_type {
        DataType::Dictionary(key, value) => key.is_dictionary_key_type() && is_byte_type(value),
        other => is_byte_type(other),
    }
}

/// Resolves `column` against `schema` and builds `column [NOT] LIKE pattern`.
pub fn resolve_like<'a, M>(
    schema: &Schema,
    column: &str,
    opposite: bool,
    matcher: &'a M,
    pattern: impl Into<Vec<u8>>,
) -> Result<LikeColumnPredicate<'a, M>, ResolveError>
where
    M: LikeMatcher + ?Sized,
{
    let column_id = schema
        .index_of(column)
        .map_err(|_| ResolveError::UnknownColumn(column.to_owned()))?;
    let data_type = schema.field(column_id).data_type();
    if !is_like_compatible(data_type) {
        return Err(ResolveError::UnsupportedOperator {
            column: column.to_owned(),
            data_type: data_type.clone(),
            op: "like",
        });
    }
    let predicate = LikeColumnPredicate::new(opposite, column_id, matcher, pattern);
    vecpred_log!(
        log::Level::Debug,
        ctx: LIKE_CTX,
        "like_resolved",
        "column={} column_id={} opposite={} pattern={:?}",
        column,
        column_id,
        opposite,
        predicate.origin(),
    );
    Ok(predicate)
}
