//! Numeric phase: values written into pre-sized output slices
//!
//! Replays the symbolic walk with values. Each product `a(i,k) ⊗ b(k,j)`
//! whose position the mask permits is formed once and folded into the
//! column's accumulator with the additive monoid. The output arrays are
//! split along the symbolic column offsets into disjoint write units
//! (one per coarse task, one per fine group) that run in parallel. Fine
//! tasks first produce partial columns, which their group then merges
//! pairwise in task order.

use std::ops::Range;

use rayon::prelude::*;
use tracing::trace;

use crate::accumulator::{Accumulator, Strategy, Workspace};
use crate::error::Result;
use crate::mask::{Mask, MaskColumn};
use crate::matrix::Matrix;
use crate::schedule::{MergeGroup, Task, TaskPlan};
use crate::semiring::{BinaryOp, Scalar, Semiring};
use crate::symbolic::SymbolicAnalysis;
use crate::utils::try_filled;

/// Sorted partial column produced by a fine task
#[derive(Debug, Clone, PartialEq)]
pub struct Partial<T> {
    pub indices: Vec<usize>,
    pub values: Vec<T>,
}

impl<T: Copy> Partial<T> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Union of two partials; `combine(self, other)` where both hold an index
    pub fn merge(&self, other: &Partial<T>, combine: impl Fn(T, T) -> T) -> Partial<T> {
        let capacity = self.len() + other.len();
        let mut indices = Vec::with_capacity(capacity);
        let mut values = Vec::with_capacity(capacity);
        let (mut p, mut q) = (0, 0);

        while p < self.len() && q < other.len() {
            let (i, j) = (self.indices[p], other.indices[q]);
            if i < j {
                indices.push(i);
                values.push(self.values[p]);
                p += 1;
            } else if j < i {
                indices.push(j);
                values.push(other.values[q]);
                q += 1;
            } else {
                indices.push(i);
                values.push(combine(self.values[p], other.values[q]));
                p += 1;
                q += 1;
            }
        }
        indices.extend_from_slice(&self.indices[p..]);
        values.extend_from_slice(&self.values[p..]);
        indices.extend_from_slice(&other.indices[q..]);
        values.extend_from_slice(&other.values[q..]);

        Partial { indices, values }
    }
}

/// Disjoint piece of the output owned by one parallel unit
enum WriteUnit<'o, T> {
    Columns {
        columns: Range<usize>,
        idx: &'o mut [usize],
        values: &'o mut [T],
    },
    Group {
        group: usize,
        idx: &'o mut [usize],
        values: &'o mut [T],
    },
}

/// Valued walk of one column, or one range of its `B` entries
struct ColumnProduct<'p, T, A, M> {
    a: &'p Matrix<T>,
    b: &'p Matrix<T>,
    semiring: &'p Semiring<T, A, M>,
    mask: MaskColumn<'p>,
    column: usize,
    entries: Range<usize>,
}

impl<T, A, M> ColumnProduct<'_, T, A, M>
where
    T: Scalar,
    A: BinaryOp<T>,
    M: BinaryOp<T>,
{
    /// Accumulates every permitted product, then writes the sorted column
    fn run<Acc: Accumulator<T>>(&self, acc: &mut Acc, idx: &mut [usize], values: &mut [T]) {
        let Range { start, end } = self.entries;
        let semiring = self.semiring;
        for (k, bkj) in self.b.vector_iter(self.column).skip(start).take(end - start) {
            for (i, aik) in self.a.vector_iter(k) {
                if self.mask.permits(i) {
                    acc.accumulate(i, semiring.multiply(aik, bkj), |x, y| semiring.combine(x, y));
                }
            }
        }
        debug_assert_eq!(acc.len(), idx.len(), "symbolic and numeric counts differ");
        acc.drain_into(idx, values);
    }

    fn run_with(
        &self,
        ws: &mut Workspace<T>,
        strategy: Strategy,
        count: usize,
        idx: &mut [usize],
        values: &mut [T],
    ) -> Result<()> {
        match strategy {
            Strategy::DenseGather => self.run(ws.dense()?, idx, values),
            Strategy::Hash => self.run(ws.hash(count)?, idx, values),
        }
        Ok(())
    }
}

/// Fills the output arrays laid out by `ptr`
///
/// # Arguments
///
/// * `a` - Left operand, by column
/// * `b` - Right operand, by column
/// * `semiring` - Multiply operator and additive monoid
/// * `mask` - Optional mask over the result
/// * `plan` - Task plan the symbolic phase ran
/// * `analysis` - Symbolic counts and strategies
/// * `ptr` - Column offsets, the exclusive scan of the column counts
/// * `idx`, `values` - Output arrays of length `ptr[ncols]`
#[allow(clippy::too_many_arguments)]
pub fn compute<T, A, M>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    semiring: &Semiring<T, A, M>,
    mask: Option<&Mask<'_>>,
    plan: &TaskPlan,
    analysis: &SymbolicAnalysis,
    ptr: &[usize],
    idx: &mut [usize],
    values: &mut [T],
) -> Result<()>
where
    T: Scalar,
    A: BinaryOp<T>,
    M: BinaryOp<T>,
{
    let partials: Vec<Option<Partial<T>>> = plan
        .tasks
        .par_iter()
        .enumerate()
        .map(|(t, task)| match task {
            Task::Fine {
                column, entries, ..
            } => {
                let product = ColumnProduct {
                    a,
                    b,
                    semiring,
                    mask: MaskColumn::of(mask, *column),
                    column: *column,
                    entries: entries.clone(),
                };
                fine_partial(&product, analysis.strategies[*column], analysis.task_counts[t])
                    .map(Some)
            }
            Task::Coarse { .. } => Ok(None),
        })
        .collect::<Result<_>>()?;

    let units = split_units(plan, ptr, idx, values);
    units.into_par_iter().try_for_each(|unit| match unit {
        WriteUnit::Columns {
            columns,
            idx,
            values,
        } => fill_columns(a, b, semiring, mask, analysis, ptr, columns, idx, values),
        WriteUnit::Group { group, idx, values } => {
            merge_group(&plan.groups[group], &partials, semiring, idx, values);
            Ok(())
        }
    })
}

fn fine_partial<T, A, M>(
    product: &ColumnProduct<'_, T, A, M>,
    strategy: Strategy,
    count: usize,
) -> Result<Partial<T>>
where
    T: Scalar,
    A: BinaryOp<T>,
    M: BinaryOp<T>,
{
    let mut indices = try_filled(count, 0, "partial column indices")?;
    let mut values = try_filled(count, T::default(), "partial column values")?;
    let mut ws = Workspace::new(product.a.vlen());
    product.run_with(&mut ws, strategy, count, &mut indices, &mut values)?;
    Ok(Partial { indices, values })
}

/// Cuts the output arrays into one write unit per coarse task and fine group
fn split_units<'o, T>(
    plan: &TaskPlan,
    ptr: &[usize],
    mut idx: &'o mut [usize],
    mut values: &'o mut [T],
) -> Vec<WriteUnit<'o, T>> {
    let mut units = Vec::with_capacity(plan.tasks.len());
    for (t, task) in plan.tasks.iter().enumerate() {
        let columns = match task {
            Task::Coarse { columns } => columns.clone(),
            Task::Fine { column, group, .. } if plan.groups[*group].tasks.start == t => {
                *column..*column + 1
            }
            Task::Fine { .. } => continue,
        };
        let len = ptr[columns.end] - ptr[columns.start];
        let (head_idx, rest_idx) = std::mem::take(&mut idx).split_at_mut(len);
        let (head_values, rest_values) = std::mem::take(&mut values).split_at_mut(len);
        idx = rest_idx;
        values = rest_values;

        units.push(match task {
            Task::Coarse { .. } => WriteUnit::Columns {
                columns,
                idx: head_idx,
                values: head_values,
            },
            Task::Fine { group, .. } => WriteUnit::Group {
                group: *group,
                idx: head_idx,
                values: head_values,
            },
        });
    }
    units
}

#[allow(clippy::too_many_arguments)]
fn fill_columns<T, A, M>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    semiring: &Semiring<T, A, M>,
    mask: Option<&Mask<'_>>,
    analysis: &SymbolicAnalysis,
    ptr: &[usize],
    columns: Range<usize>,
    idx: &mut [usize],
    values: &mut [T],
) -> Result<()>
where
    T: Scalar,
    A: BinaryOp<T>,
    M: BinaryOp<T>,
{
    let base = ptr[columns.start];
    let mut ws = Workspace::new(a.vlen());
    for j in columns {
        let count = analysis.column_counts[j];
        if count == 0 {
            continue;
        }
        let lo = ptr[j] - base;
        let hi = ptr[j + 1] - base;
        let product = ColumnProduct {
            a,
            b,
            semiring,
            mask: MaskColumn::of(mask, j),
            column: j,
            entries: 0..usize::MAX,
        };
        product.run_with(
            &mut ws,
            analysis.strategies[j],
            count,
            &mut idx[lo..hi],
            &mut values[lo..hi],
        )?;
    }
    Ok(())
}

/// Folds a group's partial columns in task order into its output slice
fn merge_group<T, A, M>(
    group: &MergeGroup,
    partials: &[Option<Partial<T>>],
    semiring: &Semiring<T, A, M>,
    idx: &mut [usize],
    values: &mut [T],
) where
    T: Scalar,
    A: BinaryOp<T>,
    M: BinaryOp<T>,
{
    let mut parts = partials[group.tasks.clone()].iter().flatten();
    let Some(first) = parts.next() else {
        return;
    };
    trace!(
        column = group.column,
        tasks = group.tasks.len(),
        nvals = idx.len(),
        "merging fine partials"
    );
    let merged = parts.fold(first.clone(), |acc, next| {
        acc.merge(next, |x, y| semiring.combine(x, y))
    });
    debug_assert_eq!(merged.len(), idx.len(), "merged column has the wrong size");
    idx.copy_from_slice(&merged.indices);
    values.copy_from_slice(&merged.values);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_merge_keeps_order() {
        let left = Partial {
            indices: vec![0, 3, 5],
            values: vec![1, 2, 3],
        };
        let right = Partial {
            indices: vec![3, 4],
            values: vec![10, 20],
        };
        // second(x, y) = y: the later task wins on shared indices
        let merged = left.merge(&right, |_, y| y);
        assert_eq!(merged.indices, vec![0, 3, 4, 5]);
        assert_eq!(merged.values, vec![1, 10, 20, 3]);

        let sum = left.merge(&right, |x, y| x + y);
        assert_eq!(sum.values, vec![1, 12, 20, 3]);
    }

    #[test]
    fn test_merge_with_empty() {
        let left = Partial::<f32> {
            indices: vec![],
            values: vec![],
        };
        let right = Partial {
            indices: vec![2],
            values: vec![1.5],
        };
        assert_eq!(left.merge(&right, |x, y| x + y), right);
        assert!(left.is_empty());
    }
}
