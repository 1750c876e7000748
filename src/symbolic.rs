//! Symbolic phase: exact output pattern sizes
//!
//! Walks every task of the plan over the operand patterns only, choosing
//! an accumulation strategy per column and counting the distinct row
//! indices the mask lets through. Coarse tasks count whole columns. Fine
//! tasks keep their sorted partial index lists so that the group's column
//! count is the size of their union.

use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use crate::accumulator::{Accumulator, Strategy, Workspace};
use crate::error::Result;
use crate::mask::{Mask, MaskColumn};
use crate::matrix::config::MultiplyConfig;
use crate::matrix::storage::PatternView;
use crate::schedule::{Task, TaskPlan};

/// Result of the symbolic phase
#[derive(Debug, Clone)]
pub struct SymbolicAnalysis {
    /// Exact entry count of every output column
    pub column_counts: Vec<usize>,
    /// Accumulation strategy of every output column
    pub strategies: Vec<Strategy>,
    /// Entry count of each fine task's partial column; zero for coarse tasks
    pub task_counts: Vec<usize>,
}

impl SymbolicAnalysis {
    /// Entry count of the whole result
    pub fn nvals(&self) -> usize {
        self.column_counts.iter().sum()
    }
}

/// What one task learned about its columns
enum TaskPattern {
    Coarse {
        start: usize,
        found: Vec<(Strategy, usize)>,
    },
    Fine {
        column: usize,
        strategy: Strategy,
        indices: Vec<usize>,
    },
}

/// Pattern walk of one column, or one range of its `B` entries
struct ColumnScan<'p> {
    a: &'p PatternView<'p>,
    b: &'p PatternView<'p>,
    mask: MaskColumn<'p>,
    column: usize,
    entries: Range<usize>,
}

impl ColumnScan<'_> {
    /// Records every permitted candidate row; returns the distinct count
    fn count<A: Accumulator<()>>(&self, acc: &mut A) -> usize {
        let Range { start, end } = self.entries;
        for k in self.b.vector(self.column).skip(start).take(end - start) {
            for i in self.a.vector(k) {
                if self.mask.permits(i) {
                    acc.insert(i);
                }
            }
        }
        acc.len()
    }

    /// Sorted distinct permitted rows
    fn indices<A: Accumulator<()>>(&self, acc: &mut A) -> Vec<usize> {
        let n = self.count(acc);
        let mut indices = vec![0; n];
        acc.drain_indices(&mut indices);
        indices
    }
}

/// Strategy and distinct-count bound for a column with estimated `work`
fn column_strategy(work: usize, vlen: usize, config: &MultiplyConfig) -> (Strategy, usize) {
    let estimate = work.min(vlen);
    (Strategy::select(estimate, vlen, config.dense_fraction), estimate)
}

/// Counts the output pattern of every column
///
/// # Arguments
///
/// * `a` - Pattern of `A`, by column
/// * `b` - Pattern of `B`, by column
/// * `mask` - Optional mask over the result
/// * `plan` - Task plan built for the same operands
/// * `config` - Strategy selection threshold
pub fn analyze(
    a: &PatternView<'_>,
    b: &PatternView<'_>,
    mask: Option<&Mask<'_>>,
    plan: &TaskPlan,
    config: &MultiplyConfig,
) -> Result<SymbolicAnalysis> {
    let per_task: Vec<TaskPattern> = plan
        .tasks
        .par_iter()
        .map(|task| analyze_task(a, b, mask, plan, task, config))
        .collect::<Result<_>>()?;

    let ncols = b.vdim;
    let mut column_counts = vec![0; ncols];
    let mut strategies = vec![Strategy::Hash; ncols];
    let mut task_counts = vec![0; plan.tasks.len()];

    for (t, pattern) in per_task.iter().enumerate() {
        match pattern {
            TaskPattern::Coarse { start, found } => {
                for (j, &(strategy, count)) in (*start..).zip(found) {
                    strategies[j] = strategy;
                    column_counts[j] = count;
                }
            }
            TaskPattern::Fine {
                column,
                strategy,
                indices,
            } => {
                strategies[*column] = *strategy;
                task_counts[t] = indices.len();
            }
        }
    }

    for group in &plan.groups {
        let lists: Vec<&[usize]> = per_task[group.tasks.clone()]
            .iter()
            .filter_map(|p| match p {
                TaskPattern::Fine { indices, .. } => Some(indices.as_slice()),
                TaskPattern::Coarse { .. } => None,
            })
            .collect();
        column_counts[group.column] = union_len(&lists);
    }

    let analysis = SymbolicAnalysis {
        column_counts,
        strategies,
        task_counts,
    };
    debug!(
        nvals = analysis.nvals(),
        dense = analysis
            .strategies
            .iter()
            .filter(|&&s| s == Strategy::DenseGather)
            .count(),
        "symbolic phase done"
    );
    Ok(analysis)
}

fn analyze_task(
    a: &PatternView<'_>,
    b: &PatternView<'_>,
    mask: Option<&Mask<'_>>,
    plan: &TaskPlan,
    task: &Task,
    config: &MultiplyConfig,
) -> Result<TaskPattern> {
    let vlen = a.vlen;
    let mut ws = Workspace::<()>::new(vlen);

    match task {
        Task::Coarse { columns } => {
            let mut found = Vec::with_capacity(columns.len());
            for j in columns.clone() {
                let (strategy, bound) = column_strategy(plan.column_work[j], vlen, config);
                if bound == 0 {
                    found.push((strategy, 0));
                    continue;
                }
                let scan = ColumnScan {
                    a,
                    b,
                    mask: MaskColumn::of(mask, j),
                    column: j,
                    entries: 0..usize::MAX,
                };
                let count = match strategy {
                    Strategy::DenseGather => scan.count(ws.dense()?),
                    Strategy::Hash => scan.count(ws.hash(bound)?),
                };
                found.push((strategy, count));
            }
            Ok(TaskPattern::Coarse {
                start: columns.start,
                found,
            })
        }
        Task::Fine {
            column,
            entries,
            work,
            ..
        } => {
            let (strategy, _) = column_strategy(plan.column_work[*column], vlen, config);
            let scan = ColumnScan {
                a,
                b,
                mask: MaskColumn::of(mask, *column),
                column: *column,
                entries: entries.clone(),
            };
            let indices = match strategy {
                Strategy::DenseGather => scan.indices(ws.dense()?),
                Strategy::Hash => scan.indices(ws.hash((*work).min(vlen))?),
            };
            Ok(TaskPattern::Fine {
                column: *column,
                strategy,
                indices,
            })
        }
    }
}

/// Size of the union of ascending index lists
pub fn union_len(lists: &[&[usize]]) -> usize {
    match lists {
        [] => 0,
        [only] => only.len(),
        [first, rest @ ..] => {
            let mut union = first.to_vec();
            for list in rest {
                union = merge_union(&union, list);
            }
            union.len()
        }
    }
}

fn merge_union(x: &[usize], y: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(x.len() + y.len());
    let (mut p, mut q) = (0, 0);
    while p < x.len() && q < y.len() {
        match x[p].cmp(&y[q]) {
            std::cmp::Ordering::Less => {
                out.push(x[p]);
                p += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(y[q]);
                q += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(x[p]);
                p += 1;
                q += 1;
            }
        }
    }
    out.extend_from_slice(&x[p..]);
    out.extend_from_slice(&y[q..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;
    use crate::schedule::plan_tasks;

    fn config(n_threads: usize) -> MultiplyConfig {
        MultiplyConfig {
            min_task_work: 1,
            ..MultiplyConfig::with_threads(n_threads)
        }
    }

    #[test]
    fn test_union_len() {
        assert_eq!(union_len(&[]), 0);
        assert_eq!(union_len(&[&[1, 4]]), 2);
        assert_eq!(union_len(&[&[1, 4, 9], &[0, 4], &[9, 10]]), 5);
    }

    #[test]
    fn test_counts_small_product() {
        // A = [1 0; 3 4], B = [0 2; 1 0]
        let a = Matrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 0, 3.0), (1, 1, 4.0)]).unwrap();
        let b = Matrix::from_triplets(2, 2, &[(1, 0, 1.0), (0, 1, 2.0)]).unwrap();
        let cfg = config(1);
        let plan = plan_tasks(&a.pattern(), &b.pattern(), None, &cfg);
        let analysis = analyze(&a.pattern(), &b.pattern(), None, &plan, &cfg).unwrap();
        assert_eq!(analysis.column_counts, vec![1, 2]);
        assert_eq!(analysis.nvals(), 3);
    }

    #[test]
    fn test_mask_limits_counts() {
        let a = Matrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 0, 3.0), (1, 1, 4.0)]).unwrap();
        let b = Matrix::from_triplets(2, 2, &[(1, 0, 1.0), (0, 1, 2.0)]).unwrap();
        let eye = Matrix::identity(2, true);
        let mask = Mask::new(&eye).unwrap();
        let cfg = config(1);
        let plan = plan_tasks(&a.pattern(), &b.pattern(), Some(&mask), &cfg);
        let analysis = analyze(&a.pattern(), &b.pattern(), Some(&mask), &plan, &cfg).unwrap();
        assert_eq!(analysis.column_counts, vec![0, 1]);
    }

    #[test]
    fn test_fine_groups_count_union() {
        // Every entry of B's only column reaches the same rows of A
        let a = Matrix::from_dense(&ndarray::Array2::from_elem((16, 6), 1u32));
        let b = Matrix::from_dense(&ndarray::Array2::from_elem((6, 1), 1u32));
        let cfg = config(3);
        let plan = plan_tasks(&a.pattern(), &b.pattern(), None, &cfg);
        assert!(plan.n_fine() > 1);

        let analysis = analyze(&a.pattern(), &b.pattern(), None, &plan, &cfg).unwrap();
        assert_eq!(analysis.column_counts, vec![16]);
        assert!(plan
            .tasks
            .iter()
            .enumerate()
            .all(|(t, _)| analysis.task_counts[t] == 16));
    }

    #[test]
    fn test_strategy_follows_density() {
        let a = Matrix::identity(100, 1i64);
        // Column 0 hits 50 rows, column 1 a single row
        let mut triplets: Vec<_> = (0..50).map(|k| (k, 0, 1i64)).collect();
        triplets.push((7, 1, 1));
        let b = Matrix::from_triplets(100, 2, &triplets).unwrap();
        let cfg = config(1);
        let plan = plan_tasks(&a.pattern(), &b.pattern(), None, &cfg);
        let analysis = analyze(&a.pattern(), &b.pattern(), None, &plan, &cfg).unwrap();
        assert_eq!(
            analysis.strategies,
            vec![Strategy::DenseGather, Strategy::Hash]
        );
        assert_eq!(analysis.column_counts, vec![50, 1]);
    }
}
