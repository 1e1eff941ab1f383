//! Greedy batch planning against a freshly sampled space budget.
//!
//! Batches are formed lazily: free space is sampled when a batch is requested,
//! after the previous batch has been converted, so space released (or
//! consumed) by earlier batches is taken into account. Tasks keep their order.

use crate::budget::{BudgetPolicy, StorageBudget};
use crate::error::RequestError;
use crate::task::FileTask;
use std::collections::VecDeque;

/// Tasks converted together under one budget reading.
#[derive(Debug, Clone)]
pub struct Batch {
    pub tasks: Vec<FileTask>,
    /// Usable bytes sampled when the batch was formed.
    pub budget: u64,
    /// Sum of the tasks' estimated footprints; never above `budget`.
    pub footprint: u64,
}

pub struct BatchPlanner<'a> {
    pending: VecDeque<FileTask>,
    budget: &'a dyn StorageBudget,
    policy: BudgetPolicy,
}

impl<'a> BatchPlanner<'a> {
    pub fn new(tasks: Vec<FileTask>, budget: &'a dyn StorageBudget, policy: BudgetPolicy) -> Self {
        Self {
            pending: tasks.into(),
            budget,
            policy,
        }
    }

    /// Tasks not yet handed out in a batch.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Form the next batch, or `Ok(None)` when every task was planned.
    ///
    /// Fails with [`RequestError::InsufficientSpaceForItem`] when the next
    /// task alone does not fit into the current budget.
    pub fn next_batch(&mut self) -> Result<Option<Batch>, RequestError> {
        let Some(first) = self.pending.front() else {
            return Ok(None);
        };

        let available = self.policy.sample(self.budget);
        let first_footprint = self.policy.footprint(first.size);
        if first_footprint > available {
            return Err(RequestError::InsufficientSpaceForItem {
                file: first.name.clone(),
                footprint: first_footprint,
                available,
            });
        }

        let mut tasks = Vec::new();
        let mut footprint: u64 = 0;
        while let Some(next) = self.pending.front().map(|t| self.policy.footprint(t.size)) {
            if footprint.saturating_add(next) > available {
                break;
            }
            footprint += next;
            if let Some(task) = self.pending.pop_front() {
                tasks.push(task);
            }
        }

        tracing::debug!(
            "Planned batch of {} task(s): {} of {} bytes",
            tasks.len(),
            footprint,
            available
        );

        Ok(Some(Batch {
            tasks,
            budget: available,
            footprint,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::FixedBudget;
    use assert_matches::assert_matches;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn task(name: &str, size: u64) -> FileTask {
        FileTask {
            path: PathBuf::from(format!("/tmp/{name}")),
            size,
            extension: "png".into(),
            name: name.into(),
        }
    }

    /// Returns the scripted readings in order, then repeats the last one.
    struct Scripted(Mutex<Vec<u64>>);

    impl StorageBudget for Scripted {
        fn free_bytes(&self) -> u64 {
            let mut readings = self.0.lock().unwrap();
            if readings.len() > 1 {
                readings.remove(0)
            } else {
                readings[0]
            }
        }
    }

    #[test]
    fn packs_greedily_in_order() {
        let budget = FixedBudget(100);
        let policy = BudgetPolicy::new(0, 2.0);
        let mut planner = BatchPlanner::new(
            vec![task("a", 20), task("b", 20), task("c", 15), task("d", 5)],
            &budget,
            policy,
        );

        let first = planner.next_batch().unwrap().unwrap();
        let names: Vec<_> = first.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(first.footprint, 80);
        assert_eq!(first.budget, 100);

        let second = planner.next_batch().unwrap().unwrap();
        let names: Vec<_> = second.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["c", "d"]);

        assert!(planner.next_batch().unwrap().is_none());
    }

    #[test]
    fn resamples_budget_for_every_batch() {
        let budget = Scripted(Mutex::new(vec![40, 200]));
        let policy = BudgetPolicy::new(0, 2.0);
        let mut planner =
            BatchPlanner::new(vec![task("a", 20), task("b", 20), task("c", 20)], &budget, policy);

        let first = planner.next_batch().unwrap().unwrap();
        assert_eq!(first.tasks.len(), 1);
        assert_eq!(first.budget, 40);

        let second = planner.next_batch().unwrap().unwrap();
        assert_eq!(second.tasks.len(), 2);
        assert_eq!(second.budget, 200);
    }

    #[test]
    fn oversized_item_fails_the_plan() {
        let budget = FixedBudget(1_000);
        let policy = BudgetPolicy::new(100, 2.0);
        let mut planner = BatchPlanner::new(vec![task("movie.mov", 500)], &budget, policy);

        assert_matches!(
            planner.next_batch(),
            Err(RequestError::InsufficientSpaceForItem { file, footprint: 1_000, available: 900 })
                if file == "movie.mov"
        );
        assert_eq!(planner.remaining(), 1);
    }

    #[test]
    fn batches_never_exceed_their_budget() {
        let budget = FixedBudget(97);
        let policy = BudgetPolicy::new(0, 1.5);
        let tasks: Vec<_> = (1..=20).map(|i| task(&format!("t{i}"), i)).collect();
        let mut planner = BatchPlanner::new(tasks, &budget, policy);

        let mut planned = 0;
        while let Some(batch) = planner.next_batch().unwrap() {
            let sum: u64 = batch.tasks.iter().map(|t| policy.footprint(t.size)).sum();
            assert_eq!(sum, batch.footprint);
            assert!(batch.footprint <= batch.budget);
            assert!(!batch.tasks.is_empty());
            planned += batch.tasks.len();
        }
        assert_eq!(planned, 20);
    }

    #[test]
    fn zero_sized_tasks_fit_an_empty_budget() {
        let budget = FixedBudget(0);
        let mut planner = BatchPlanner::new(vec![task("empty", 0)], &budget, BudgetPolicy::new(0, 2.0));
        assert_eq!(planner.next_batch().unwrap().unwrap().tasks.len(), 1);
    }
}
