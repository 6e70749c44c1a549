//! Auto-contrastive ratio kernel.
//!
//! Scores one positive target against each negative through a softmax-like
//! ratio instead of independent logistic losses. Column 0 of the target
//! matrix is always the positive key; it seeds `f_pos` once per anchor row
//! and produces no loss or gradient of its own. For each negative slot j:
//!
//! ```text
//! f_pos   = exp(a * dot(x, w_pos) + b_pos)          (computed once, reused)
//! f_neg_j = k * exp(a * dot(x, w_neg_j) + b_neg_j)
//! denom   = f_pos + f_neg_j + c
//! loss_j  = -ln(f_pos / denom)
//! ```
//!
//! The floor constant `c` keeps the ratio away from 1 even when the
//! negative score vanishes, so every pair contributes gradient.

use crate::ops::VecOps;
use crate::table::{check_dim, check_key_range, check_len, KeyMatrix, Table, TableMut};
use skipgrad_core::Result;

/// Constants of the ratio loss. Defaults match the production trainer.
#[derive(Debug, Clone, Copy)]
pub struct ContrastiveParams {
    /// Score scale applied inside the exponent.
    pub scale_a: f32,
    /// Multiplier on the negative partition term.
    pub neg_weight_k: f32,
    /// Additive floor in the denominator.
    pub floor_c: f32,
}

impl Default for ContrastiveParams {
    fn default() -> Self {
        Self {
            scale_a: 1.0,
            neg_weight_k: 1.0,
            floor_c: 0.1,
        }
    }
}

/// Contrastive-ratio forward/backward over one subproblem subset.
///
/// `targets` is `N x pn_size` with the positive key in column 0 and
/// negative keys in columns 1..; `loss` is the matching `N x pn_size`
/// matrix and only columns >= 1 ever receive loss. Gradients accumulate
/// into `d_x`, `d_w` and `d_bias` when `do_grad` is set.
#[allow(clippy::too_many_arguments)]
pub fn contrastive_ratio(
    ops: &VecOps,
    subset: &[u32],
    targets: &KeyMatrix,
    x: &Table,
    w: &Table,
    bias: &[f32],
    d_x: &mut TableMut,
    d_w: &mut TableMut,
    d_bias: &mut [f32],
    loss: &mut [f32],
    params: &ContrastiveParams,
    do_grad: bool,
) -> Result<()> {
    let (n, pn) = (targets.rows(), targets.cols());
    check_key_range(subset, n)?;
    check_len("input rows", n, x.rows())?;
    check_dim(x.dim(), w.dim())?;
    check_dim(x.dim(), d_x.dim())?;
    check_dim(w.dim(), d_w.dim())?;
    check_len("input gradient rows", x.rows(), d_x.rows())?;
    check_len("output gradient rows", w.rows(), d_w.rows())?;
    check_len("output bias", w.rows(), bias.len())?;
    check_len("output bias gradient", w.rows(), d_bias.len())?;
    check_len("per-slot loss", n * pn, loss.len())?;
    w.check_keys(targets.as_flat())?;

    let (a, k, c) = (params.scale_a, params.neg_weight_k, params.floor_c);

    for &s in subset {
        let i = s as usize;
        let x_row = x.row(s);
        let t_keys = targets.row(i);

        // Slot 0 seeds the positive partition term for the whole row.
        let pos_key = t_keys[0];
        let w_pos = w.row(pos_key);
        let f_pos = (a * ops.dot(x_row, w_pos) + bias[pos_key as usize]).exp();

        for (j, &neg_key) in t_keys.iter().enumerate().skip(1) {
            let w_neg = w.row(neg_key);
            let f_neg = k * (a * ops.dot(x_row, w_neg) + bias[neg_key as usize]).exp();
            let denom = f_pos + f_neg + c;
            loss[i * pn + j] += -(f_pos / denom).ln();

            if do_grad {
                let g_pos = -a * (c + f_neg) / denom;
                let g_neg = a * f_neg / denom;
                ops.axpy(g_pos, w_pos, d_x.row_mut(s));
                ops.axpy(g_pos, x_row, d_w.row_mut(pos_key));
                ops.axpy(g_neg, w_neg, d_x.row_mut(s));
                ops.axpy(g_neg, x_row, d_w.row_mut(neg_key));
                d_bias[pos_key as usize] += -(c + f_neg) / denom;
                d_bias[neg_key as usize] += f_neg / denom;
            }
        }
    }
    Ok(())
}
