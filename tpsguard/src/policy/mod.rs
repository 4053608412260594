//! Control policies.
//!
//! Pure decision logic. Policies never call the host; the control loop
//! applies their decisions.

pub mod emergency;
pub mod health;
pub mod view_distance;

pub use emergency::{EmergencyDecision, EmergencyPolicy, EmergencyState, MetricReading};
pub use health::{health_score, HealthHistory, TpsGrade};
pub use view_distance::{ViewDistancePolicy, ViewDistanceState};
