//! Server health score and TPS grade.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

/// Health scores kept for the status report.
pub const HEALTH_HISTORY_LEN: usize = 60;

/// Health score (0-100) for a TPS reading.
///
/// 100 at 19.5 and above, 80 at 18, 60 at 15, 40 below that.
pub fn health_score(tps: f64) -> u8 {
    if tps >= 19.5 {
        100
    } else if tps >= 18.0 {
        80
    } else if tps >= 15.0 {
        60
    } else {
        40
    }
}

/// Coarse label for a TPS reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TpsGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl TpsGrade {
    pub fn from_tps(tps: f64) -> Self {
        if tps >= 19.0 {
            TpsGrade::Excellent
        } else if tps >= 18.0 {
            TpsGrade::Good
        } else if tps >= 15.0 {
            TpsGrade::Fair
        } else {
            TpsGrade::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TpsGrade::Excellent => "Excellent",
            TpsGrade::Good => "Good",
            TpsGrade::Fair => "Fair",
            TpsGrade::Poor => "Poor",
        }
    }
}

impl fmt::Display for TpsGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rolling record of health scores.
#[derive(Debug, Clone, Default)]
pub struct HealthHistory {
    scores: VecDeque<u8>,
}

impl HealthHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score `tps` and record it. Returns the score.
    pub fn record(&mut self, tps: f64) -> u8 {
        let score = health_score(tps);
        if self.scores.len() == HEALTH_HISTORY_LEN {
            self.scores.pop_front();
        }
        self.scores.push_back(score);
        score
    }

    pub fn latest(&self) -> Option<u8> {
        self.scores.back().copied()
    }

    /// Mean of the recorded scores.
    pub fn average(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        let sum: u32 = self.scores.iter().map(|s| u32::from(*s)).sum();
        Some(f64::from(sum) / self.scores.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_score_bands() {
        assert_eq!(health_score(20.0), 100);
        assert_eq!(health_score(19.5), 100);
        assert_eq!(health_score(19.4), 80);
        assert_eq!(health_score(18.0), 80);
        assert_eq!(health_score(15.0), 60);
        assert_eq!(health_score(14.9), 40);
        assert_eq!(health_score(0.0), 40);
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(TpsGrade::from_tps(19.0), TpsGrade::Excellent);
        assert_eq!(TpsGrade::from_tps(18.5), TpsGrade::Good);
        assert_eq!(TpsGrade::from_tps(15.0), TpsGrade::Fair);
        assert_eq!(TpsGrade::from_tps(12.0), TpsGrade::Poor);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = HealthHistory::new();
        for _ in 0..HEALTH_HISTORY_LEN + 10 {
            history.record(20.0);
        }
        assert_eq!(history.len(), HEALTH_HISTORY_LEN);
        assert_eq!(history.average(), Some(100.0));
    }

    #[test]
    fn test_history_average() {
        let mut history = HealthHistory::new();
        assert_eq!(history.average(), None);
        history.record(20.0);
        history.record(10.0);
        assert_eq!(history.latest(), Some(40));
        assert_eq!(history.average(), Some(70.0));
    }
}
