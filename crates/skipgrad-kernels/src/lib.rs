//! Numerical core of the skipgrad sparse embedding trainer.
//!
//! Batched forward/backward kernels over flat, caller-owned, row-major f32
//! embedding tables, plus the sparse adaptive-gradient update that folds
//! accumulated gradients back into the live parameters. Everything above
//! this crate — corpus processing, negative-sample and hierarchical-softmax
//! tree construction, minibatch scheduling, thread partitioning, model
//! lifecycle — supplies pre-built flat index/label arrays and owns parallel
//! dispatch; the kernels here only process the subproblem subset they are
//! handed.
//!
//! All kernels route their vector arithmetic through a [`VecOps`] handle
//! whose dot-product return precision is resolved once at startup
//! ([`VecOps::resolve`]) and pinned for the life of the process.

pub mod contrastive;
pub mod ops;
pub mod pairwise;
pub mod table;
pub mod update;

pub use contrastive::{contrastive_ratio, ContrastiveParams};
pub use ops::{DotPrimitive, NativeDot, Precision, VecOps};
pub use pairwise::{shared_table_logistic, two_table_logistic, PairBatch};
pub use table::{
    KeyMatrix, RowExhaustion, SignMatrix, Table, TableMut, DEFAULT_EXHAUSTED_KEY,
};
pub use update::{
    adagrad_update_rows, adagrad_update_scalars, gather_rows, reset_moments, scatter_accumulate,
    ADA_EPS, MOMENT_DECAY,
};
