//! Bounds-checked views over the caller's flat row-major buffers.
//!
//! All parameter, gradient and moment storage is owned externally as
//! contiguous f32 buffers; keys are dense unsigned integers used as direct
//! row offsets. These views validate shape once at construction and key
//! ranges once per kernel entry, so the inner loops can hand out plain row
//! slices without ever reading out of bounds.

use skipgrad_core::{Result, SkipgradError};

pub use skipgrad_core::config::DEFAULT_EXHAUSTED_KEY;

/// Read-only `rows x dim` embedding table view.
#[derive(Clone, Copy)]
pub struct Table<'a> {
    data: &'a [f32],
    rows: usize,
    dim: usize,
}

impl<'a> Table<'a> {
    pub fn new(data: &'a [f32], rows: usize, dim: usize) -> Result<Self> {
        if dim == 0 || data.len() != rows * dim {
            return Err(SkipgradError::BadTableShape {
                len: data.len(),
                rows,
                dim,
            });
        }
        Ok(Self { data, rows, dim })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Row slice for `key`. Callers must have range-checked `key` already;
    /// the slice indexing still panics rather than reads out of bounds if
    /// they have not.
    pub fn row(&self, key: u32) -> &'a [f32] {
        let off = key as usize * self.dim;
        &self.data[off..off + self.dim]
    }

    /// Validate that every key addresses a row of this table.
    pub fn check_keys(&self, keys: &[u32]) -> Result<()> {
        check_key_range(keys, self.rows)
    }
}

/// Mutable `rows x dim` table view (gradient accumulators, parameters,
/// moment buffers).
pub struct TableMut<'a> {
    data: &'a mut [f32],
    rows: usize,
    dim: usize,
}

impl<'a> TableMut<'a> {
    pub fn new(data: &'a mut [f32], rows: usize, dim: usize) -> Result<Self> {
        if dim == 0 || data.len() != rows * dim {
            return Err(SkipgradError::BadTableShape {
                len: data.len(),
                rows,
                dim,
            });
        }
        Ok(Self { data, rows, dim })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, key: u32) -> &[f32] {
        let off = key as usize * self.dim;
        &self.data[off..off + self.dim]
    }

    pub fn row_mut(&mut self, key: u32) -> &mut [f32] {
        let off = key as usize * self.dim;
        &mut self.data[off..off + self.dim]
    }

    /// Validate that every key addresses a row of this table.
    pub fn check_keys(&self, keys: &[u32]) -> Result<()> {
        check_key_range(keys, self.rows)
    }
}

/// `N x cols` matrix of prediction-target keys.
#[derive(Clone, Copy)]
pub struct KeyMatrix<'a> {
    keys: &'a [u32],
    rows: usize,
    cols: usize,
}

impl<'a> KeyMatrix<'a> {
    pub fn new(keys: &'a [u32], rows: usize, cols: usize) -> Result<Self> {
        if cols == 0 || keys.len() != rows * cols {
            return Err(SkipgradError::LengthMismatch {
                what: "prediction-target keys",
                expected: rows * cols,
                actual: keys.len(),
            });
        }
        Ok(Self { keys, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, i: usize) -> &'a [u32] {
        let off = i * self.cols;
        &self.keys[off..off + self.cols]
    }

    pub fn as_flat(&self) -> &'a [u32] {
        self.keys
    }
}

/// `N x cols` matrix of {+1, -1} target signs, parallel to a [`KeyMatrix`].
#[derive(Clone, Copy)]
pub struct SignMatrix<'a> {
    signs: &'a [f32],
    rows: usize,
    cols: usize,
}

impl<'a> SignMatrix<'a> {
    pub fn new(signs: &'a [f32], rows: usize, cols: usize) -> Result<Self> {
        if cols == 0 || signs.len() != rows * cols {
            return Err(SkipgradError::LengthMismatch {
                what: "target signs",
                expected: rows * cols,
                actual: signs.len(),
            });
        }
        Ok(Self { signs, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, i: usize) -> &'a [f32] {
        let off = i * self.cols;
        &self.signs[off..off + self.cols]
    }
}

/// Explicit row-exhaustion predicate for variable-length target rows.
///
/// Any key at or above the threshold marks its slot (and semantically the
/// rest of the row) as exhausted; exhausted slots are skipped without
/// touching loss, gradient or bias state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowExhaustion {
    threshold: u32,
}

impl RowExhaustion {
    pub const DEFAULT: Self = Self {
        threshold: DEFAULT_EXHAUSTED_KEY,
    };

    /// Exhaustion at a caller-chosen threshold.
    pub fn at(threshold: u32) -> Self {
        Self { threshold }
    }

    #[inline]
    pub fn is_exhausted(&self, key: u32) -> bool {
        key >= self.threshold
    }
}

impl Default for RowExhaustion {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Range-check a whole key array against a table's row count.
pub(crate) fn check_key_range(keys: &[u32], rows: usize) -> Result<()> {
    for &key in keys {
        if key as usize >= rows {
            return Err(SkipgradError::KeyOutOfRange { key, rows });
        }
    }
    Ok(())
}

/// Range-check only non-exhausted keys.
pub(crate) fn check_key_range_filtered(
    keys: &[u32],
    rows: usize,
    exhaustion: RowExhaustion,
) -> Result<()> {
    for &key in keys {
        if !exhaustion.is_exhausted(key) && key as usize >= rows {
            return Err(SkipgradError::KeyOutOfRange { key, rows });
        }
    }
    Ok(())
}

/// Length agreement between two parallel arrays.
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(SkipgradError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Dim agreement between interacting tables.
pub(crate) fn check_dim(left: usize, right: usize) -> Result<()> {
    if left != right {
        return Err(SkipgradError::DimMismatch { left, right });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shape_validation() {
        let buf = vec![0.0f32; 12];
        assert!(Table::new(&buf, 3, 4).is_ok());
        assert!(Table::new(&buf, 3, 5).is_err());
        assert!(Table::new(&buf, 12, 0).is_err());
    }

    #[test]
    fn test_row_offsets() {
        let buf: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let t = Table::new(&buf, 4, 3).unwrap();
        assert_eq!(t.row(0), &[0.0, 1.0, 2.0]);
        assert_eq!(t.row(3), &[9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_key_range_check() {
        let buf = vec![0.0f32; 12];
        let t = Table::new(&buf, 4, 3).unwrap();
        assert!(t.check_keys(&[0, 3, 1]).is_ok());
        let err = t.check_keys(&[0, 4]).unwrap_err();
        assert!(err.to_string().contains("key 4"));
    }

    #[test]
    fn test_exhaustion_predicate() {
        let ex = RowExhaustion::default();
        assert!(ex.is_exhausted(DEFAULT_EXHAUSTED_KEY));
        assert!(!ex.is_exhausted(0));

        let low = RowExhaustion::at(100);
        assert!(low.is_exhausted(100));
        assert!(low.is_exhausted(101));
        assert!(!low.is_exhausted(99));
    }

    #[test]
    fn test_filtered_range_check_skips_sentinels() {
        let ex = RowExhaustion::at(1000);
        // 5000 is above the threshold: exhausted, not an error
        assert!(check_key_range_filtered(&[1, 2, 5000], 10, ex).is_ok());
        // 500 is below the threshold but past the table: error
        assert!(check_key_range_filtered(&[1, 500], 10, ex).is_err());
    }

    #[test]
    fn test_key_matrix_rows() {
        let keys: Vec<u32> = (0..6).collect();
        let m = KeyMatrix::new(&keys, 2, 3).unwrap();
        assert_eq!(m.row(0), &[0, 1, 2]);
        assert_eq!(m.row(1), &[3, 4, 5]);
        assert!(KeyMatrix::new(&keys, 2, 4).is_err());
    }
}
