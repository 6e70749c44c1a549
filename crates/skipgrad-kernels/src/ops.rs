//! Vector primitives adapter and the one-time precision-dispatch bootstrap.
//!
//! The kernels never touch the dot-product primitive directly: depending on
//! how the linked numerical library was built, its dot routine returns its
//! result as either a single- or a double-precision value in the same
//! 8-byte return register. [`VecOps::resolve`] probes the primitive once
//! with a known input and pins the matching interpretation for the lifetime
//! of the handle. Every kernel call goes through the resolved [`VecOps`],
//! so no downstream code performs precision-dependent math.

use std::fmt;
use std::sync::Arc;

use skipgrad_core::{Result, SkipgradError};
use tracing::info;

/// Probe operands: dot([10.0], [0.01]) must come back as 0.1.
const PROBE_A: f32 = 10.0;
const PROBE_B: f32 = 0.01;
const PROBE_EXPECTED: f32 = 0.1;
/// Absolute tolerance for classifying the probe result.
const PROBE_TOL: f64 = 1e-4;

/// Return convention of the bound dot-product primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// The primitive returns an f32 in the low 32 bits of the register.
    Single,
    /// The primitive returns an f64 occupying the full register.
    Double,
}

/// The three external vector primitives the kernels are built on.
///
/// `dot_raw` hands back the primitive's raw 8-byte return register; its
/// interpretation is deliberately unresolved at this boundary and belongs
/// to [`VecOps`]. Implementations must not interpret it themselves.
pub trait DotPrimitive: Send + Sync {
    /// Raw register bits of `sum(a[i] * b[i])`. Slices have equal length.
    fn dot_raw(&self, a: &[f32], b: &[f32]) -> u64;

    /// dst = src, element-wise. Slices have equal length.
    fn copy(&self, src: &[f32], dst: &mut [f32]);

    /// y += alpha * x, element-wise. Slices have equal length.
    fn axpy(&self, alpha: f32, x: &[f32], y: &mut [f32]);
}

/// Default primitive: accumulates the dot product in f64 and returns the
/// double-precision register image, like a BLAS `dsdot` build.
pub struct NativeDot;

impl DotPrimitive for NativeDot {
    fn dot_raw(&self, a: &[f32], b: &[f32]) -> u64 {
        debug_assert_eq!(a.len(), b.len());
        let mut acc = 0.0f64;
        for (&x, &y) in a.iter().zip(b.iter()) {
            acc += f64::from(x) * f64::from(y);
        }
        acc.to_bits()
    }

    fn copy(&self, src: &[f32], dst: &mut [f32]) {
        dst.copy_from_slice(src);
    }

    fn axpy(&self, alpha: f32, x: &[f32], y: &mut [f32]) {
        debug_assert_eq!(x.len(), y.len());
        for (yi, &xi) in y.iter_mut().zip(x.iter()) {
            *yi += alpha * xi;
        }
    }
}

/// Resolved vector-operation context: the bound primitive plus the pinned
/// return-precision interpretation for its dot routine.
///
/// Resolved once, then immutable — safe to share across the caller's worker
/// threads for the life of the process.
pub struct VecOps {
    prim: Arc<dyn DotPrimitive>,
    precision: Precision,
}

impl fmt::Debug for VecOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecOps")
            .field("precision", &self.precision)
            .finish_non_exhaustive()
    }
}

impl VecOps {
    /// Run the one-time self-test against `prim` and pin the matching
    /// interpretation of its dot return register.
    ///
    /// The raw result of dot([10.0], [0.01]) is reinterpreted first as f64,
    /// then as f32; whichever lands within 1e-4 of 0.1 wins. If neither
    /// does, no subsequent arithmetic can be trusted and this returns the
    /// fatal [`SkipgradError::PrecisionUndetermined`].
    pub fn resolve(prim: Arc<dyn DotPrimitive>) -> Result<Self> {
        let bits = prim.dot_raw(&[PROBE_A], &[PROBE_B]);

        let as_double = f64::from_bits(bits);
        let as_single = f32::from_bits((bits & 0xffff_ffff) as u32);

        let precision = if (as_double - f64::from(PROBE_EXPECTED)).abs() < PROBE_TOL {
            Precision::Double
        } else if (f64::from(as_single) - f64::from(PROBE_EXPECTED)).abs() < PROBE_TOL {
            Precision::Single
        } else {
            return Err(SkipgradError::PrecisionUndetermined {
                bits,
                expected: PROBE_EXPECTED,
            });
        };

        info!(?precision, "dot primitive return convention resolved");
        Ok(Self { prim, precision })
    }

    /// Resolve against the built-in [`NativeDot`] primitive.
    pub fn native() -> Result<Self> {
        Self::resolve(Arc::new(NativeDot))
    }

    /// The pinned return convention.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Dot product through the bound primitive, decoded per the pinned
    /// convention.
    pub fn dot(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        let bits = self.prim.dot_raw(a, b);
        match self.precision {
            Precision::Double => f64::from_bits(bits) as f32,
            Precision::Single => f32::from_bits((bits & 0xffff_ffff) as u32),
        }
    }

    /// dst = src through the bound primitive.
    pub fn copy(&self, src: &[f32], dst: &mut [f32]) {
        self.prim.copy(src, dst);
    }

    /// y += alpha * x through the bound primitive.
    pub fn axpy(&self, alpha: f32, x: &[f32], y: &mut [f32]) {
        self.prim.axpy(alpha, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mock primitive with a single-precision return convention.
    struct SingleDot;

    impl DotPrimitive for SingleDot {
        fn dot_raw(&self, a: &[f32], b: &[f32]) -> u64 {
            let mut acc = 0.0f32;
            for (&x, &y) in a.iter().zip(b.iter()) {
                acc += x * y;
            }
            u64::from(acc.to_bits())
        }

        fn copy(&self, src: &[f32], dst: &mut [f32]) {
            dst.copy_from_slice(src);
        }

        fn axpy(&self, alpha: f32, x: &[f32], y: &mut [f32]) {
            for (yi, &xi) in y.iter_mut().zip(x.iter()) {
                *yi += alpha * xi;
            }
        }
    }

    /// Mock primitive whose return matches neither convention.
    struct BrokenDot;

    impl DotPrimitive for BrokenDot {
        fn dot_raw(&self, _a: &[f32], _b: &[f32]) -> u64 {
            0xdead_beef_dead_beef
        }

        fn copy(&self, src: &[f32], dst: &mut [f32]) {
            dst.copy_from_slice(src);
        }

        fn axpy(&self, _alpha: f32, _x: &[f32], _y: &mut [f32]) {}
    }

    #[test]
    fn test_resolve_double_convention() {
        let ops = VecOps::resolve(Arc::new(NativeDot)).unwrap();
        assert_eq!(ops.precision(), Precision::Double);
        let d = ops.dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert!((d - 32.0).abs() < 1e-6, "dot = {d}");
    }

    #[test]
    fn test_resolve_single_convention() {
        let ops = VecOps::resolve(Arc::new(SingleDot)).unwrap();
        assert_eq!(ops.precision(), Precision::Single);
        let d = ops.dot(&[0.5, 0.5], &[2.0, 2.0]);
        assert!((d - 2.0).abs() < 1e-6, "dot = {d}");
    }

    #[test]
    fn test_resolve_fails_on_unclassifiable_primitive() {
        let err = VecOps::resolve(Arc::new(BrokenDot)).unwrap_err();
        assert!(err.is_fatal_init());
    }

    #[test]
    fn test_debug_shows_pinned_precision() {
        let ops = VecOps::native().unwrap();
        assert!(format!("{ops:?}").contains("Double"));
    }

    #[test]
    fn test_axpy_accumulates() {
        let ops = VecOps::native().unwrap();
        let x = [1.0, 2.0, 3.0];
        let mut y = [10.0, 10.0, 10.0];
        ops.axpy(0.5, &x, &mut y);
        assert_eq!(y, [10.5, 11.0, 11.5]);
    }

    #[test]
    fn test_copy() {
        let ops = VecOps::native().unwrap();
        let src = [1.0, -2.0, 3.5];
        let mut dst = [0.0; 3];
        ops.copy(&src, &mut dst);
        assert_eq!(dst, src);
    }
}
