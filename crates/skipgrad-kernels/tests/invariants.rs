//! Property-based tests for the update and scatter kernels using proptest.
//!
//! Validates invariants that must hold for all inputs:
//! - Scatter-accumulate is additive and linear in its source buffer
//! - The adaptive update zeroes exactly the gradient rows it consumes
//! - Rows outside the subproblem subset are never touched

use proptest::prelude::*;
use skipgrad_kernels::{
    adagrad_update_rows, scatter_accumulate, Table, TableMut, VecOps, MOMENT_DECAY,
};

const DIM: usize = 4;

fn finite_f32() -> impl Strategy<Value = f32> {
    -100.0f32..100.0
}

proptest! {
    #[test]
    fn scatter_twice_equals_double(src in prop::collection::vec(finite_f32(), DIM)) {
        let ops = VecOps::native().unwrap();
        let d_y = src.clone();

        let mut once = vec![0.0f32; DIM];
        let mut twice = vec![0.0f32; DIM];
        let y = Table::new(&d_y, 1, DIM).unwrap();

        scatter_accumulate(&ops, &y, &[0], &mut TableMut::new(&mut once, 1, DIM).unwrap())
            .unwrap();
        for _ in 0..2 {
            scatter_accumulate(&ops, &y, &[0], &mut TableMut::new(&mut twice, 1, DIM).unwrap())
                .unwrap();
        }

        for d in 0..DIM {
            prop_assert!((twice[d] - 2.0 * once[d]).abs() <= 1e-4 * once[d].abs().max(1.0));
        }
    }

    #[test]
    fn scatter_shared_row_sums_contributions(
        a in prop::collection::vec(finite_f32(), DIM),
        b in prop::collection::vec(finite_f32(), DIM),
    ) {
        let ops = VecOps::native().unwrap();
        let mut d_y = a.clone();
        d_y.extend_from_slice(&b);
        let mut d_w = vec![0.0f32; DIM];

        // Two minibatch items share one destination row.
        scatter_accumulate(
            &ops,
            &Table::new(&d_y, 2, DIM).unwrap(),
            &[0, 0],
            &mut TableMut::new(&mut d_w, 1, DIM).unwrap(),
        )
        .unwrap();

        for d in 0..DIM {
            let expected = a[d] + b[d];
            prop_assert!((d_w[d] - expected).abs() <= 1e-4 * expected.abs().max(1.0));
        }
    }

    #[test]
    fn update_touches_only_subset_rows(
        g0 in 0.01f32..10.0,
        p0 in finite_f32(),
    ) {
        let rows = 3;
        let mut params = vec![p0; rows * DIM];
        let mut grads = vec![g0; rows * DIM];
        let mut moments = vec![0.0f32; rows * DIM];

        adagrad_update_rows(
            &[1],
            &[0, 2, 1],
            &mut TableMut::new(&mut params, rows, DIM).unwrap(),
            &mut TableMut::new(&mut grads, rows, DIM).unwrap(),
            &mut TableMut::new(&mut moments, rows, DIM).unwrap(),
            0.01,
        )
        .unwrap();

        // Subset row 1 maps to table row 2: only that row changes.
        for d in 0..DIM {
            prop_assert_eq!(params[d], p0);
            prop_assert_eq!(params[DIM + d], p0);
            prop_assert!(params[2 * DIM + d] != p0);
            prop_assert_eq!(grads[d], g0);
            prop_assert_eq!(grads[DIM + d], g0);
            prop_assert_eq!(grads[2 * DIM + d], 0.0);
        }
    }

    #[test]
    fn update_moment_matches_recurrence(g0 in 0.01f32..10.0, m0 in 0.0f32..5.0) {
        let mut params = vec![1.0f32; DIM];
        let mut grads = vec![g0; DIM];
        let mut moments = vec![m0; DIM];

        adagrad_update_rows(
            &[0],
            &[0],
            &mut TableMut::new(&mut params, 1, DIM).unwrap(),
            &mut TableMut::new(&mut grads, 1, DIM).unwrap(),
            &mut TableMut::new(&mut moments, 1, DIM).unwrap(),
            0.01,
        )
        .unwrap();

        let expected = MOMENT_DECAY * m0 + (1.0 - MOMENT_DECAY) * g0 * g0;
        for d in 0..DIM {
            prop_assert!((moments[d] - expected).abs() <= 1e-5 * expected.max(1.0));
        }
    }
}
