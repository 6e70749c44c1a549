//! Pairwise logistic forward/backward kernels.
//!
//! Two variants of the same loss:
//!
//! - [`two_table_logistic`] scores anchor rows from one embedding table
//!   against context rows from a second table plus a shared bias — the
//!   skip-gram negative-sampling layer with its own input embeddings.
//! - [`shared_table_logistic`] scores pre-computed input vectors against
//!   rows of one learned table. It serves both negative-sampling output
//!   layers and hierarchical-softmax code layers; the only behavioral
//!   difference is the row-exhaustion predicate that lets hierarchical-
//!   softmax rows end early, and the per-slot loss matrix the caller needs
//!   to inspect variable-depth codes.
//!
//! For a score `y` and target sign `s` in {+1, -1}, both compute
//! `loss = ln(1 + exp(-s*y))` and gradient scale
//! `g = -s / (1 + exp(s*y))`, scattered through axpy into the gradient
//! accumulators. Both forms are evaluated so that a large `|y|` saturates
//! instead of overflowing `exp` — the gradient goes to `0` or `-s`, never
//! NaN. Kernels only add into loss/gradient buffers; resetting them belongs
//! to the adaptive update.

use crate::ops::VecOps;
use crate::table::{
    check_dim, check_key_range, check_key_range_filtered, check_len, KeyMatrix, RowExhaustion,
    SignMatrix, Table, TableMut,
};
use skipgrad_core::Result;

/// ln(1 + exp(z)) without overflow for large positive `z`.
#[inline]
fn softplus(z: f32) -> f32 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// One minibatch of anchor/target work shared by the pairwise kernels.
///
/// `subset` selects which minibatch rows this call processes — the caller
/// partitions a minibatch into disjoint subsets to parallelize without the
/// kernels knowing about threads. `targets` and `signs` are parallel
/// `N x pn_size` matrices.
#[derive(Clone, Copy)]
pub struct PairBatch<'a> {
    pub subset: &'a [u32],
    pub targets: KeyMatrix<'a>,
    pub signs: SignMatrix<'a>,
}

impl<'a> PairBatch<'a> {
    fn validate(&self) -> Result<()> {
        check_len("sign matrix rows", self.targets.rows(), self.signs.rows())?;
        check_len("sign matrix cols", self.targets.cols(), self.signs.cols())?;
        // Subset entries address minibatch rows of the target matrix.
        check_key_range(self.subset, self.targets.rows())
    }
}

/// Two-table pairwise logistic kernel: anchor embeddings vs. context
/// embeddings with a context-side bias.
///
/// For each selected minibatch row `i` with anchor key `anchor_keys[i]` and
/// each of the `pn_size` (target, sign) pairs, accumulates the logistic
/// loss into the scalar `loss` and, when `do_grad`, the gradients into
/// `d_anchors`, `d_contexts` and `d_bias`.
///
/// Preconditions (checked before any mutation): all shapes agree, every
/// anchor and target key is in range. Index arrays are read-only; only the
/// gradient accumulators and `loss` are mutated, additively.
#[allow(clippy::too_many_arguments)]
pub fn two_table_logistic(
    ops: &VecOps,
    batch: &PairBatch,
    anchor_keys: &[u32],
    anchors: &Table,
    contexts: &Table,
    bias: &[f32],
    d_anchors: &mut TableMut,
    d_contexts: &mut TableMut,
    d_bias: &mut [f32],
    loss: &mut f32,
    do_grad: bool,
) -> Result<()> {
    batch.validate()?;
    check_len("anchor keys", batch.targets.rows(), anchor_keys.len())?;
    check_dim(anchors.dim(), contexts.dim())?;
    check_dim(anchors.dim(), d_anchors.dim())?;
    check_dim(contexts.dim(), d_contexts.dim())?;
    check_len("anchor gradient rows", anchors.rows(), d_anchors.rows())?;
    check_len("context gradient rows", contexts.rows(), d_contexts.rows())?;
    check_len("context bias", contexts.rows(), bias.len())?;
    check_len("context bias gradient", contexts.rows(), d_bias.len())?;
    anchors.check_keys(anchor_keys)?;
    contexts.check_keys(batch.targets.as_flat())?;

    for &s in batch.subset {
        let i = s as usize;
        let a_key = anchor_keys[i];
        let a_row = anchors.row(a_key);
        let t_keys = batch.targets.row(i);
        let t_signs = batch.signs.row(i);

        for (&t_key, &sign) in t_keys.iter().zip(t_signs.iter()) {
            let c_row = contexts.row(t_key);
            let y = ops.dot(a_row, c_row) + bias[t_key as usize];
            *loss += softplus(-sign * y);

            if do_grad {
                let g = -sign / (1.0 + (sign * y).exp());
                ops.axpy(g, a_row, d_contexts.row_mut(t_key));
                ops.axpy(g, c_row, d_anchors.row_mut(a_key));
                d_bias[t_key as usize] += g;
            }
        }
    }
    Ok(())
}

/// Shared-table pairwise logistic kernel: minibatch input vectors vs. rows
/// of one learned output table.
///
/// The selected minibatch row `i` supplies both the input vector `x[i]` and
/// the target row of the key/sign matrices; losses land per (row, slot) in
/// the `loss` matrix so callers with variable-depth code sequences can
/// inspect individual slots. Slots whose key satisfies `exhaustion` are
/// skipped without touching loss, gradient or bias state.
#[allow(clippy::too_many_arguments)]
pub fn shared_table_logistic(
    ops: &VecOps,
    batch: &PairBatch,
    x: &Table,
    w: &Table,
    bias: &[f32],
    exhaustion: RowExhaustion,
    d_x: &mut TableMut,
    d_w: &mut TableMut,
    d_bias: &mut [f32],
    loss: &mut [f32],
    do_grad: bool,
) -> Result<()> {
    let (n, pn) = (batch.targets.rows(), batch.targets.cols());
    batch.validate()?;
    check_len("input rows", n, x.rows())?;
    check_dim(x.dim(), w.dim())?;
    check_dim(x.dim(), d_x.dim())?;
    check_dim(w.dim(), d_w.dim())?;
    check_len("input gradient rows", x.rows(), d_x.rows())?;
    check_len("output gradient rows", w.rows(), d_w.rows())?;
    check_len("output bias", w.rows(), bias.len())?;
    check_len("output bias gradient", w.rows(), d_bias.len())?;
    check_len("per-slot loss", n * pn, loss.len())?;
    check_key_range_filtered(batch.targets.as_flat(), w.rows(), exhaustion)?;

    for &s in batch.subset {
        let i = s as usize;
        let x_row = x.row(s);
        let t_keys = batch.targets.row(i);
        let t_signs = batch.signs.row(i);

        for (j, (&t_key, &sign)) in t_keys.iter().zip(t_signs.iter()).enumerate() {
            if exhaustion.is_exhausted(t_key) {
                continue;
            }
            let w_row = w.row(t_key);
            let y = ops.dot(x_row, w_row) + bias[t_key as usize];
            loss[i * pn + j] += softplus(-sign * y);

            if do_grad {
                let g = -sign / (1.0 + (sign * y).exp());
                ops.axpy(g, x_row, d_w.row_mut(t_key));
                ops.axpy(g, w_row, d_x.row_mut(s));
                d_bias[t_key as usize] += g;
            }
        }
    }
    Ok(())
}
