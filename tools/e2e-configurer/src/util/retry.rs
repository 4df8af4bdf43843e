/*!
   Utilities for waiting on containers and chains to reach a state.
*/

use core::time::Duration;
use std::thread::sleep;
use tracing::{debug, trace};

use crate::error::Error;

/**
   How many times, and how often, an eventually consistent condition is
   polled before giving up.
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u16,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u16, interval: Duration) -> Self {
        Self { attempts, interval }
    }
}

/**
   A simplified version of retry logic. Chains and relayers are expected
   to reach their target state within a bounded number of polls, so a
   fixed interval is enough.
*/
pub fn assert_eventually_succeed<R>(
    task_name: &str,
    policy: RetryPolicy,
    task: impl Fn() -> Result<R, Error>,
) -> Result<R, Error> {
    for attempt in 0..policy.attempts {
        match task() {
            Ok(res) => return Ok(res),
            Err(e) => {
                trace!(
                    "attempt {} of task `{}` failed with error: {}",
                    attempt + 1,
                    task_name,
                    e
                );
                sleep(policy.interval)
            }
        }
    }

    debug!(
        "giving up on task `{}` after {} attempts",
        task_name, policy.attempts
    );

    Err(Error::retry(task_name.to_string(), policy.attempts))
}

#[cfg(test)]
mod tests {
    use super::*;

    use core::cell::Cell;
    use eyre::eyre;
    use test_log::test;

    #[test]
    fn returns_first_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(5, Duration::ZERO);

        let res = assert_eventually_succeed("third time lucky", policy, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(Error::generic(eyre!("not yet")))
            } else {
                Ok(calls.get())
            }
        });

        assert_eq!(res.unwrap(), 3);
    }

    #[test]
    fn gives_up_after_attempts() {
        let calls = Cell::new(0u16);
        let policy = RetryPolicy::new(4, Duration::ZERO);

        let res: Result<(), Error> = assert_eventually_succeed("never", policy, || {
            calls.set(calls.get() + 1);
            Err(Error::generic(eyre!("still not")))
        });

        assert!(res.is_err());
        assert_eq!(calls.get(), 4);
    }
}
