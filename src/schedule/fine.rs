//! Splitting a heavy column into fine tasks
//!
//! A fine task owns a contiguous range of the column's `B` entries. The
//! ranges are cut where the running work crosses multiples of
//! `total / parts`, so each task gets a similar share.

use std::ops::Range;

use crate::schedule::{MergeGroup, Task, TaskPlan};

/// Cuts `entry_work` into at most `parts` non-empty contiguous ranges
///
/// # Arguments
///
/// * `entry_work` - Work contributed by each `B` entry of the column
/// * `parts` - Desired number of ranges
///
/// # Returns
///
/// Ranges covering `0..entry_work.len()` in order. Fewer than `parts`
/// come back when the work is concentrated in the last entries.
pub fn partition(entry_work: &[usize], parts: usize) -> Vec<Range<usize>> {
    let n = entry_work.len();
    let parts = parts.clamp(1, n.max(1));
    let total: u128 = entry_work.iter().map(|&w| w as u128).sum();

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    let mut cumulative: u128 = 0;

    for (p, &w) in entry_work.iter().enumerate() {
        cumulative += w as u128;
        let cut = ranges.len() + 1;
        if cut < parts
            && cumulative * parts as u128 >= cut as u128 * total
            && n - (p + 1) >= parts - cut
        {
            ranges.push(start..p + 1);
            start = p + 1;
        }
    }
    ranges.push(start..n);
    ranges
}

/// Appends one fine task per range and their merge group to `plan`
pub(crate) fn push_group(
    plan: &mut TaskPlan,
    column: usize,
    entry_work: &[usize],
    ranges: Vec<Range<usize>>,
) {
    let group = plan.groups.len();
    let first = plan.tasks.len();
    for entries in ranges {
        let work = entry_work[entries.clone()].iter().sum();
        plan.tasks.push(Task::Fine {
            column,
            entries,
            work,
            group,
        });
    }
    plan.groups.push(MergeGroup {
        column,
        tasks: first..plan.tasks.len(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        assert_eq!(partition(&[64; 8], 3), vec![0..3, 3..6, 6..8]);
        assert_eq!(partition(&[1; 4], 4), vec![0..1, 1..2, 2..3, 3..4]);
    }

    #[test]
    fn test_parts_clamped_to_entries() {
        assert_eq!(partition(&[5, 5], 10), vec![0..1, 1..2]);
        assert_eq!(partition(&[5, 5], 0), vec![0..2]);
    }

    #[test]
    fn test_back_loaded_work() {
        assert_eq!(partition(&[0, 0, 0, 100], 2), vec![0..4]);
        assert_eq!(partition(&[100, 0, 0, 0], 2), vec![0..1, 1..4]);
    }

    #[test]
    fn test_push_group_records_work() {
        let mut plan = TaskPlan {
            tasks: vec![Task::Coarse { columns: 0..2 }],
            groups: Vec::new(),
            column_work: vec![0, 0, 30],
            total_work: 30,
            target: 10,
        };
        push_group(&mut plan, 2, &[10, 5, 15], vec![0..2, 2..3]);
        assert_eq!(plan.groups, vec![MergeGroup { column: 2, tasks: 1..3 }]);
        assert_eq!(
            plan.tasks[1],
            Task::Fine {
                column: 2,
                entries: 0..2,
                work: 15,
                group: 0
            }
        );
    }
}
