//! Task planning for the saxpy kernel
//!
//! Work is estimated per output column before any parallel execution:
//!
//! ```text
//! work(j) = Σ_{k ∈ B(:,j)} min(nnz(A(:,k)), permitted(j))
//! ```
//!
//! where `permitted(j)` is the number of rows the mask lets through in
//! column `j` (all rows without a mask). Columns are then grouped into
//! coarse tasks of roughly the per-thread target, while a column heavier
//! than `fine_split_factor` targets is split by ranges of its `B` entries
//! into fine tasks whose partial results are merged afterwards.

pub mod coarse;
pub mod fine;

use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use crate::mask::Mask;
use crate::matrix::config::MultiplyConfig;
use crate::matrix::storage::PatternView;

/// A unit of parallel work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// A contiguous range of output columns computed whole
    Coarse { columns: Range<usize> },
    /// A range of one column's `B` entries, producing a partial column
    Fine {
        column: usize,
        entries: Range<usize>,
        work: usize,
        group: usize,
    },
}

/// Fine tasks whose partial results are merged into one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeGroup {
    pub column: usize,
    /// Indices into [`TaskPlan::tasks`], in merge order
    pub tasks: Range<usize>,
}

/// Ordered task list covering every output column exactly once
#[derive(Debug, Clone)]
pub struct TaskPlan {
    pub tasks: Vec<Task>,
    pub groups: Vec<MergeGroup>,
    /// Estimated work of every output column
    pub column_work: Vec<usize>,
    pub total_work: usize,
    /// Per-task work target the grouping aimed for
    pub target: usize,
}

impl TaskPlan {
    pub fn n_coarse(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| matches!(t, Task::Coarse { .. }))
            .count()
    }

    pub fn n_fine(&self) -> usize {
        self.tasks.len() - self.n_coarse()
    }
}

/// Rows the mask permits in each of `ncols` columns of an `nrows`-row result
pub fn permitted_rows(nrows: usize, ncols: usize, mask: Option<&Mask<'_>>) -> Vec<usize> {
    mask.map_or_else(|| vec![nrows; ncols], |m| m.permitted_counts())
}

/// Estimated multiply-add work of every output column
///
/// # Arguments
///
/// * `a` - Pattern of `A`, by column
/// * `b` - Pattern of `B`, by column
/// * `mask` - Optional mask over the result
pub fn estimate_work(a: &PatternView<'_>, b: &PatternView<'_>, mask: Option<&Mask<'_>>) -> Vec<usize> {
    let a_counts = a.vector_counts();
    let caps = permitted_rows(a.vlen, b.vdim, mask);
    column_work(&a_counts, &caps, b)
}

fn column_work(a_counts: &[usize], caps: &[usize], b: &PatternView<'_>) -> Vec<usize> {
    (0..b.vdim)
        .into_par_iter()
        .map(|j| b.vector(j).map(|k| a_counts[k].min(caps[j])).sum::<usize>())
        .collect()
}

/// Builds the task list for `C = A ⊕.⊗ B`
///
/// # Arguments
///
/// * `a` - Pattern of `A`, by column
/// * `b` - Pattern of `B`, by column
/// * `mask` - Optional mask over the result
/// * `config` - Thread count and splitting thresholds
///
/// # Returns
///
/// A plan whose tasks are ordered by column. Coarse column ranges and
/// fine-task groups partition `0..ncols(B)`.
pub fn plan_tasks(
    a: &PatternView<'_>,
    b: &PatternView<'_>,
    mask: Option<&Mask<'_>>,
    config: &MultiplyConfig,
) -> TaskPlan {
    let ncols = b.vdim;
    let a_counts = a.vector_counts();
    let caps = permitted_rows(a.vlen, ncols, mask);
    let column_work = column_work(&a_counts, &caps, b);
    let total_work: usize = column_work.iter().sum();

    let n_threads = config.system_params.n_threads.max(1);
    let target = (total_work / n_threads).max(config.min_task_work).max(1);

    let mut plan = TaskPlan {
        tasks: Vec::new(),
        groups: Vec::new(),
        column_work,
        total_work,
        target,
    };

    if total_work == 0 {
        plan.tasks.push(Task::Coarse { columns: 0..ncols });
        debug!(ncols, "no work, single task");
        return plan;
    }

    let split_limit = target.saturating_mul(config.fine_split_factor);
    let mut run = coarse::CoarseRun::new(target);

    for j in 0..ncols {
        let work = plan.column_work[j];
        if work > split_limit {
            let entry_work: Vec<usize> = b.vector(j).map(|k| a_counts[k].min(caps[j])).collect();
            let parts = ((work + target - 1) / target).min(entry_work.len());
            let ranges = fine::partition(&entry_work, parts);
            if ranges.len() > 1 {
                run.close(j, &mut plan.tasks);
                fine::push_group(&mut plan, j, &entry_work, ranges);
                run.resume(j + 1);
                continue;
            }
        }
        run.add(j, work, &mut plan.tasks);
    }
    run.close(ncols, &mut plan.tasks);

    debug!(
        ncols,
        total_work,
        target,
        coarse = plan.n_coarse(),
        fine = plan.n_fine(),
        groups = plan.groups.len(),
        "planned tasks"
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    fn config(n_threads: usize, min_task_work: usize) -> MultiplyConfig {
        MultiplyConfig {
            min_task_work,
            ..MultiplyConfig::with_threads(n_threads)
        }
    }

    /// Every column is covered once, in order
    fn assert_covers(plan: &TaskPlan, ncols: usize) {
        let mut next = 0;
        for (t, task) in plan.tasks.iter().enumerate() {
            match task {
                Task::Coarse { columns } => {
                    assert_eq!(columns.start, next);
                    next = columns.end;
                }
                Task::Fine { column, group, .. } => {
                    let g = &plan.groups[*group];
                    assert_eq!(g.column, *column);
                    assert!(g.tasks.contains(&t));
                    if t == g.tasks.start {
                        assert_eq!(*column, next);
                        next += 1;
                    }
                }
            }
        }
        assert_eq!(next, ncols);
    }

    fn dense_a() -> Matrix<f64> {
        Matrix::from_dense(&ndarray::Array2::from_elem((64, 8), 1.0))
    }

    fn skewed_b() -> Matrix<f64> {
        // Column 0 holds every row, the rest one entry each
        let mut triplets: Vec<_> = (0..8).map(|k| (k, 0, 1.0)).collect();
        triplets.extend([(1, 1, 1.0), (2, 2, 1.0), (3, 3, 1.0)]);
        Matrix::from_triplets(8, 4, &triplets).unwrap()
    }

    #[test]
    fn test_work_estimate() {
        let a = dense_a();
        let b = skewed_b();
        let work = estimate_work(&a.pattern(), &b.pattern(), None);
        assert_eq!(work, vec![512, 64, 64, 64]);
    }

    #[test]
    fn test_mask_caps_work() {
        let a = dense_a();
        let b = skewed_b();
        let m = Matrix::from_triplets(64, 4, &[(0, 0, ()), (5, 0, ()), (9, 2, ())]).unwrap();

        let mask = Mask::new(&m).unwrap();
        let work = estimate_work(&a.pattern(), &b.pattern(), Some(&mask));
        assert_eq!(work, vec![16, 0, 1, 0]);

        let mask = Mask::complement(&m).unwrap();
        let work = estimate_work(&a.pattern(), &b.pattern(), Some(&mask));
        assert_eq!(work, vec![8 * 62, 64, 63, 64]);
    }

    #[test]
    fn test_heavy_column_is_split() {
        let a = dense_a();
        let b = skewed_b();
        let plan = plan_tasks(&a.pattern(), &b.pattern(), None, &config(4, 1));

        assert_eq!(plan.total_work, 704);
        assert_eq!(plan.target, 176);
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].column, 0);
        assert_eq!(plan.n_fine(), 3);
        assert_eq!(
            plan.tasks[..3]
                .iter()
                .map(|t| match t {
                    Task::Fine { entries, .. } => entries.clone(),
                    Task::Coarse { .. } => unreachable!(),
                })
                .collect::<Vec<_>>(),
            vec![0..3, 3..6, 6..8]
        );
        assert_eq!(plan.tasks[3], Task::Coarse { columns: 1..4 });
        assert_covers(&plan, 4);
    }

    #[test]
    fn test_single_thread_keeps_columns_whole() {
        let a = dense_a();
        let b = skewed_b();
        let plan = plan_tasks(&a.pattern(), &b.pattern(), None, &config(1, 1));
        assert_eq!(plan.n_fine(), 0);
        assert_covers(&plan, 4);
    }

    #[test]
    fn test_zero_work_plans() {
        let a = dense_a();
        let b = Matrix::<f64>::empty(8, 5);
        let plan = plan_tasks(&a.pattern(), &b.pattern(), None, &config(4, 1));
        assert_eq!(plan.tasks, vec![Task::Coarse { columns: 0..5 }]);

        let b = Matrix::<f64>::empty(8, 0);
        let plan = plan_tasks(&a.pattern(), &b.pattern(), None, &config(4, 1));
        assert_eq!(plan.tasks, vec![Task::Coarse { columns: 0..0 }]);
    }

    #[test]
    fn test_coarse_grouping_covers_columns() {
        let a = Matrix::identity(30, 1.0);
        let triplets: Vec<_> = (0..30).map(|j| ((j * 7) % 30, j, 1.0)).collect();
        let b = Matrix::from_triplets(30, 30, &triplets).unwrap();
        let plan = plan_tasks(&a.pattern(), &b.pattern(), None, &config(3, 4));

        assert_eq!(plan.total_work, 30);
        assert_eq!(plan.target, 10);
        assert_eq!(plan.n_coarse(), 3);
        assert_covers(&plan, 30);
    }
}
