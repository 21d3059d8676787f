//! Queue wait estimation from historical job durations.

use std::fmt;

/// Expected wait before a queued job begins processing.
///
/// `Unknown` is returned when there is no history to estimate from; never
/// a fabricated number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    Seconds(u64),
    Unknown,
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Seconds(sec) => write!(f, "{sec} sec"),
            Eta::Unknown => f.write_str("unknown"),
        }
    }
}

/// Estimate the wait for a job at 1-based `position` in the queue.
///
/// The next job in line waits zero. Otherwise the estimate is the truncated
/// mean of the recent per-job durations times the number of jobs ahead;
/// integer arithmetic throughout.
pub fn estimate_eta(durations: &[u64], position: usize) -> Eta {
    if position <= 1 {
        return Eta::Seconds(0);
    }
    if durations.is_empty() {
        return Eta::Unknown;
    }
    let avg = durations.iter().sum::<u64>() / durations.len() as u64;
    Eta::Seconds(avg * (position as u64 - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_of_queue_waits_zero() {
        assert_eq!(estimate_eta(&[], 0), Eta::Seconds(0));
        assert_eq!(estimate_eta(&[], 1), Eta::Seconds(0));
        assert_eq!(estimate_eta(&[300, 600], 1), Eta::Seconds(0));
    }

    #[test]
    fn test_no_history_is_unknown() {
        assert_eq!(estimate_eta(&[], 2), Eta::Unknown);
        assert_eq!(estimate_eta(&[], 5), Eta::Unknown);
    }

    #[test]
    fn test_mean_times_jobs_ahead() {
        // mean = 90, two jobs ahead
        assert_eq!(estimate_eta(&[60, 120, 90], 3), Eta::Seconds(180));
    }

    #[test]
    fn test_mean_truncates() {
        // mean of [10, 11] truncates to 10
        assert_eq!(estimate_eta(&[10, 11], 2), Eta::Seconds(10));
    }

    #[test]
    fn test_display() {
        assert_eq!(Eta::Seconds(120).to_string(), "120 sec");
        assert_eq!(Eta::Unknown.to_string(), "unknown");
    }
}
