//! Per-call deadline helpers.

use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};

/// Return the remaining time budget until the provided deadline.
pub fn remaining_budget(deadline: Instant) -> Result<Duration> {
    let remaining = deadline
        .checked_duration_since(Instant::now())
        .unwrap_or(Duration::from_secs(0));
    if remaining.is_zero() {
        return Err(anyhow!("run deadline exceeded"));
    }
    Ok(remaining)
}

/// Timeout for one generation call: the per-call limit, capped by the run
/// deadline when one is set.
pub fn call_timeout(per_call: Duration, run_deadline: Option<Instant>) -> Result<Duration> {
    match run_deadline {
        Some(deadline) => Ok(remaining_budget(deadline)?.min(per_call)),
        None => Ok(per_call),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_deadline_is_an_error() {
        let err = remaining_budget(Instant::now()).unwrap_err();
        assert!(err.to_string().contains("deadline"));
    }

    #[test]
    fn call_timeout_without_deadline_is_per_call() {
        let timeout = call_timeout(Duration::from_secs(7), None).expect("timeout");
        assert_eq!(timeout, Duration::from_secs(7));
    }

    #[test]
    fn call_timeout_is_capped_by_deadline() {
        let deadline = Instant::now() + Duration::from_secs(2);
        let timeout = call_timeout(Duration::from_secs(60), Some(deadline)).expect("timeout");
        assert!(timeout <= Duration::from_secs(2));
    }
}
