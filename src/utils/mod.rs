//! Utility functions and helpers

pub mod formats;

pub use formats::{from_sprs, to_sprs};

use crate::error::{Error, Result};

/// Computes an exclusive prefix sum (scan) for a vector
///
/// The result has one more element than the input; its last element is
/// the total.
pub fn exclusive_scan(input: &[usize]) -> Vec<usize> {
    let mut result = Vec::with_capacity(input.len() + 1);
    let mut sum = 0;

    result.push(0); // First element is always 0

    for &val in input {
        sum += val;
        result.push(sum);
    }

    result
}

/// Gathers `x[k] = b[p[k]]` for `k < n`; `p = None` is the identity
pub fn permute<T: Copy>(p: Option<&[usize]>, b: &[T], x: &mut [T], n: usize) -> Result<()> {
    if x.len() < n {
        return Err(Error::invalid(format!(
            "permute: destination holds {} of {} elements",
            x.len(),
            n
        )));
    }
    match p {
        None => {
            if b.len() < n {
                return Err(Error::invalid(format!(
                    "permute: source holds {} of {} elements",
                    b.len(),
                    n
                )));
            }
            x[..n].copy_from_slice(&b[..n]);
        }
        Some(p) => {
            if p.len() < n {
                return Err(Error::invalid(format!(
                    "permute: permutation holds {} of {} elements",
                    p.len(),
                    n
                )));
            }
            for (xk, &pk) in x[..n].iter_mut().zip(&p[..n]) {
                *xk = *b.get(pk).ok_or_else(|| {
                    Error::invalid(format!("permute: entry {} outside source", pk))
                })?;
            }
        }
    }
    Ok(())
}

/// Empty vector with `capacity` reserved, reporting allocation failure
pub(crate) fn try_with_capacity<T>(capacity: usize, what: &'static str) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity).map_err(|_| Error::OutOfMemory {
        what,
        elements: capacity,
    })?;
    Ok(buf)
}

/// Vector of `len` copies of `fill`, reporting allocation failure
pub(crate) fn try_filled<T: Clone>(len: usize, fill: T, what: &'static str) -> Result<Vec<T>> {
    let mut buf = try_with_capacity(len, what)?;
    buf.resize(len, fill);
    Ok(buf)
}
