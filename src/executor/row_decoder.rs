//! Row records.
//!
//! ```text
//! ┌──────────┬──────────────┬──────────────┬─────────────┬─────────────┬───────────┬──────────┐
//! │ cols (1) │ fixed region │ var data ... │ var offsets │ jump table  │ var count │ null mask│
//! │          │              │              │ (reversed)  │ (1 per 256) │    (1)    │ (cols/8) │
//! └──────────┴──────────────┴──────────────┴─────────────┴─────────────┴───────────┴──────────┘
//! ```
//!
//! Variable-length offsets are single bytes. Rows longer than 256 bytes carry
//! a jump table: each entry names the variable column index at which every
//! following offset gains another 256.

use std::io::{Read, Seek};

use crate::{
    executor::value_decoder::decode_value,
    storage::{page_store::PageStore, table_def::TableDefinition},
    types::{
        error::{DatabaseError, Result},
        read_u8, slice,
        value::{DataType, Value},
    },
};

pub const JUMP_SIZE: usize = 256;

pub fn null_mask_size(num_cols: usize) -> usize {
    num_cols.div_ceil(8)
}

fn malformed(reason: impl Into<String>) -> DatabaseError {
    DatabaseError::MalformedRow {
        reason: reason.into(),
    }
}

/// Decodes the `num_var_cols + 1` variable-column boundaries of a row.
///
/// Entry `i` is where variable column `i` starts; entry `i + 1` is where it ends.
pub fn variable_offsets(
    row: &[u8],
    bitmask_size: usize,
    num_var_cols: usize,
) -> Result<Vec<usize>> {
    let len = row.len();
    if len == 0 {
        return Err(malformed("empty row"));
    }
    let mut num_jumps = (len - 1) / JUMP_SIZE;
    let col_ptr = len
        .checked_sub(bitmask_size + num_jumps + 2)
        .ok_or_else(|| malformed(format!("row of {} bytes too short for its trailer", len)))?;
    if col_ptr < num_var_cols {
        return Err(malformed(format!(
            "{} variable offsets do not fit in a row of {} bytes",
            num_var_cols + 1,
            len
        )));
    }
    // The last jump entry may be padding rather than a real jump.
    if (col_ptr - num_var_cols) / JUMP_SIZE < num_jumps {
        num_jumps -= 1;
    }

    let mut jumps_used = 0;
    let mut offsets = Vec::with_capacity(num_var_cols + 1);
    for i in 0..=num_var_cols {
        if jumps_used < num_jumps && i == row[len - bitmask_size - jumps_used - 2] as usize {
            jumps_used += 1;
        }
        offsets.push(row[col_ptr - i] as usize + jumps_used * JUMP_SIZE);
    }
    Ok(offsets)
}

/// Decodes a raw row record into one value per column, in ordinal order.
pub fn decode_row<R: Read + Seek>(
    store: &PageStore<R>,
    def: &TableDefinition,
    row: &[u8],
) -> Result<Vec<Value>> {
    let num_cols = def.num_cols as usize;
    let actual = read_u8(row, 0)? as usize;
    if actual != num_cols {
        return Err(DatabaseError::ColumnCountMismatch {
            expected: num_cols,
            actual,
        });
    }

    let bitmask_size = null_mask_size(num_cols);
    if row.len() < bitmask_size + 1 {
        return Err(malformed(format!(
            "row of {} bytes cannot hold a {} byte null mask",
            row.len(),
            bitmask_size
        )));
    }
    let null_mask = &row[row.len() - bitmask_size..];

    let (row_var_cols, offsets) = if def.num_var_cols > 0 {
        let count = read_u8(row, row.len() - bitmask_size - 1)? as usize;
        (count, variable_offsets(row, bitmask_size, count)?)
    } else {
        (0, Vec::new())
    };

    let num_fixed_cols = num_cols.saturating_sub(row_var_cols);
    let mut fixed_found = 0;
    let mut values = Vec::with_capacity(def.columns.len());

    for column in &def.columns {
        let num = column.num as usize;
        let mask_byte = null_mask
            .get(num / 8)
            .ok_or_else(|| malformed(format!("column {} is outside the null mask", num)))?;
        let present = mask_byte & (1 << (num % 8)) != 0;

        let value = if column.data_type == DataType::Bool {
            // Booleans live in the null mask itself: a clear bit reads as true.
            Value::Bool(!present)
        } else if !present {
            Value::Null
        } else if column.is_fixed && fixed_found < num_fixed_cols {
            let start = column.fixed_offset as usize + 1;
            let end = start + column.size as usize;
            fixed_found += 1;
            decode_value(store, column.data_type, slice(row, start, end)?)?
        } else if !column.is_fixed && (column.var_index as usize) < row_var_cols {
            let index = column.var_index as usize;
            let (start, end) = (offsets[index], offsets[index + 1]);
            decode_value(store, column.data_type, slice(row, start, end)?)?
        } else {
            Value::Null
        };
        values.push(value);
    }

    Ok(values)
}
