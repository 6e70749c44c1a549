//! Sparse adaptive parameter updates and lookup-table gradient plumbing.
//!
//! The update kernels fold accumulated gradients into live parameters with
//! an RMSProp-style squared-gradient moving average, and zero the gradient
//! rows they consume in the same pass. The consume-and-reset fusion is a
//! contract with the caller's scheduler: while an update touches a row, no
//! other call may be writing that row's gradient.
//!
//! [`gather_rows`] and [`scatter_accumulate`] are the forward and backward
//! halves of an embedding lookup: gather copies table rows out by key,
//! scatter adds per-item gradient rows back into the shared accumulator
//! through the same indirection.

use crate::ops::VecOps;
use crate::table::{check_key_range, check_len, Table, TableMut};
use skipgrad_core::Result;

/// Decay of the squared-gradient moving average.
pub const MOMENT_DECAY: f32 = 0.98;
/// Denominator smoothing of the adaptive step.
pub const ADA_EPS: f32 = 0.001;

#[inline]
fn ada_step(param: &mut f32, grad: &mut f32, moment: &mut f32, learn_rate: f32) {
    let g = *grad;
    *moment = MOMENT_DECAY * *moment + (1.0 - MOMENT_DECAY) * g * g;
    *param -= learn_rate * g / (moment.sqrt() + ADA_EPS);
    *grad = 0.0;
}

/// Per-row adaptive update (2D variant).
///
/// `subset` selects minibatch rows; `row_index` maps each minibatch row to
/// its actual table row, so tied parameters can share rows. For every
/// addressed element: `moment = 0.98*moment + 0.02*grad^2`,
/// `param -= lr * grad / (sqrt(moment) + 0.001)`, then `grad = 0`.
///
/// A row reached twice through tied indices is updated once; the second
/// visit reads the already-zeroed gradient and leaves the parameters alone.
pub fn adagrad_update_rows(
    subset: &[u32],
    row_index: &[u32],
    params: &mut TableMut,
    grads: &mut TableMut,
    moments: &mut TableMut,
    learn_rate: f32,
) -> Result<()> {
    check_key_range(subset, row_index.len())?;
    check_key_range(row_index, params.rows())?;
    check_len("gradient rows", params.rows(), grads.rows())?;
    check_len("moment rows", params.rows(), moments.rows())?;
    check_len("gradient dim", params.dim(), grads.dim())?;
    check_len("moment dim", params.dim(), moments.dim())?;

    for &s in subset {
        let row = row_index[s as usize];
        let p_row = params.row_mut(row);
        let g_row = grads.row_mut(row);
        let m_row = moments.row_mut(row);
        for ((p, g), m) in p_row.iter_mut().zip(g_row.iter_mut()).zip(m_row.iter_mut()) {
            ada_step(p, g, m, learn_rate);
        }
    }
    Ok(())
}

/// Per-scalar adaptive update (1D variant, bias vectors).
///
/// Same recurrence as [`adagrad_update_rows`] with one element per
/// addressed row.
pub fn adagrad_update_scalars(
    subset: &[u32],
    row_index: &[u32],
    params: &mut [f32],
    grads: &mut [f32],
    moments: &mut [f32],
    learn_rate: f32,
) -> Result<()> {
    check_key_range(subset, row_index.len())?;
    check_key_range(row_index, params.len())?;
    check_len("gradient scalars", params.len(), grads.len())?;
    check_len("moment scalars", params.len(), moments.len())?;

    for &s in subset {
        let e = row_index[s as usize] as usize;
        ada_step(&mut params[e], &mut grads[e], &mut moments[e], learn_rate);
    }
    Ok(())
}

/// Zero a moment buffer, restarting the adaptive denominator from scratch.
///
/// Trainers periodically reset the squared-gradient average (for example at
/// epoch boundaries) so stale magnitudes stop damping the step size. Works
/// on both the flat 2D row buffers and the 1D scalar buffers.
pub fn reset_moments(moments: &mut [f32]) {
    moments.fill(0.0);
}

/// Lookup-table backprop: add each row of `d_y` into the gradient
/// accumulator row selected by `row_index`.
///
/// Pure accumulation — destination rows are never overwritten, `d_y` is
/// never touched, and items sharing a row-index entry sum their
/// contributions.
pub fn scatter_accumulate(
    ops: &VecOps,
    d_y: &Table,
    row_index: &[u32],
    d_w: &mut TableMut,
) -> Result<()> {
    check_len("row index", d_y.rows(), row_index.len())?;
    check_len("gradient dim", d_y.dim(), d_w.dim())?;
    check_key_range(row_index, d_w.rows())?;

    for (i, &row) in row_index.iter().enumerate() {
        ops.axpy(1.0, d_y.row(i as u32), d_w.row_mut(row));
    }
    Ok(())
}

/// Lookup-table forward: `out[i] = w[keys[i]]`.
pub fn gather_rows(ops: &VecOps, w: &Table, keys: &[u32], out: &mut TableMut) -> Result<()> {
    check_len("output rows", keys.len(), out.rows())?;
    check_len("output dim", w.dim(), out.dim())?;
    w.check_keys(keys)?;

    for (i, &key) in keys.iter().enumerate() {
        ops.copy(w.row(key), out.row_mut(i as u32));
    }
    Ok(())
}
