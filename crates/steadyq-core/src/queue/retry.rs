//! Retry policy: the failure worker's gate.

use std::time::Duration;

use crate::domain::Task;

/// What the failure worker does with a task that failed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Give the task another full worker attempt.
    Requeue,

    /// Attempts are exhausted; hand the task to the escalation handler.
    Escalate,
}

/// Retry policy for failed tasks.
///
/// `attempts` is only ever incremented by workers, so with `max_attempts = m`
/// a task gets `m` worker attempts before it is escalated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempt ceiling before escalation.
    pub max_attempts: u32,

    /// Delay applied before each failed task is evaluated.
    pub cooldown: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
    pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(10_000);

    pub fn new(max_attempts: u32, cooldown: Duration) -> Self {
        Self {
            max_attempts,
            cooldown,
        }
    }

    pub fn decide(&self, task: &Task) -> Decision {
        if task.attempts < self.max_attempts {
            Decision::Requeue
        } else {
            Decision::Escalate
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn task_with_attempts(attempts: u32) -> Task {
        Task {
            attempts,
            ..Task::default()
        }
    }

    #[test]
    fn default_policy_has_reasonable_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.cooldown, Duration::from_secs(10));
    }

    #[rstest]
    #[case::first_failure(1, 2, Decision::Requeue)]
    #[case::at_ceiling(2, 2, Decision::Escalate)]
    #[case::past_ceiling(5, 2, Decision::Escalate)]
    #[case::never_attempted(0, 1, Decision::Requeue)]
    #[case::single_attempt_budget(1, 1, Decision::Escalate)]
    #[case::zero_budget(0, 0, Decision::Escalate)]
    fn decision_compares_attempts_to_ceiling(
        #[case] attempts: u32,
        #[case] max_attempts: u32,
        #[case] expected: Decision,
    ) {
        let policy = RetryPolicy::new(max_attempts, Duration::ZERO);
        assert_eq!(policy.decide(&task_with_attempts(attempts)), expected);
    }
}
