//! Conditional parallel iteration.
//!
//! With the `parallel` feature the per-start and per-row loops run on rayon;
//! without it they fall back to sequential iteration. Every parallel loop
//! collects into an index-ordered `Vec`, so output does not depend on thread
//! scheduling.
//!
//! ```ignore
//! use crate::iter_maybe_parallel;
//!
//! let results: Vec<_> = iter_maybe_parallel!(0..n)
//!     .map(|i| expensive_computation(i))
//!     .collect();
//! ```

/// Iterate a range (or any `IntoIterator`) in parallel when the `parallel`
/// feature is enabled, sequentially otherwise.
#[macro_export]
macro_rules! iter_maybe_parallel {
    ($expr:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::iter::IntoParallelIterator;

            IntoParallelIterator::into_par_iter($expr)
        }
        #[cfg(not(feature = "parallel"))]
        {
            IntoIterator::into_iter($expr)
        }
    }};
}
