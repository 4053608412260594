//! Simulated game server for `tpsguard run`.
//!
//! Each reading advances a tick counter and derives TPS from the selected
//! load profile, then adjusts it for the current view distance and the
//! entity and chunk backlog. Cleanup effectors shrink the backlog, so the
//! control loop's actions feed back into later readings.

use std::collections::BTreeSet;

use clap::ValueEnum;
use console::style;
use parking_lot::Mutex;

use tpsguard::host::{
    ActorId, CleanupEffector, CleanupMode, MetricSource, PermissionCheck, SubscriberId,
    SubscriberSink, ViewDistanceEffector,
};
use tpsguard::EffectorError;

/// View distance the simulated load is calibrated against.
const NEUTRAL_VIEW_DISTANCE: i32 = 8;
/// TPS cost of each chunk of view distance above neutral.
const VIEW_DISTANCE_COST: f64 = 0.25;
/// TPS gained per chunk below neutral.
const VIEW_DISTANCE_RELIEF: f64 = 0.2;
/// Entities spawned per reading.
const ENTITY_GROWTH: u64 = 40;
/// Entities that cost one TPS.
const ENTITIES_PER_TPS: f64 = 2000.0;
/// Chunks loaded per reading.
const CHUNK_GROWTH: u64 = 5;
/// Tick after which the flatline profile stops reporting.
const FLATLINE_AFTER: u64 = 10;

/// Load profile for the simulated server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Healthy server hovering just under 20 TPS
    Steady,
    /// Load climbs until the server is in trouble
    Degrading,
    /// Healthy with a short lag spike every 15 ticks
    Spiky,
    /// Healthy for 10 ticks, then the tick counter stops reporting
    Flatline,
}

impl Profile {
    pub fn name(self) -> &'static str {
        match self {
            Profile::Steady => "steady",
            Profile::Degrading => "degrading",
            Profile::Spiky => "spiky",
            Profile::Flatline => "flatline",
        }
    }

    /// Baseline TPS at `tick` before backlog and view distance effects.
    fn base_tps(self, tick: u64) -> Option<f64> {
        match self {
            Profile::Steady => Some(19.9 - 0.025 * (tick % 5) as f64),
            Profile::Degrading => Some((20.0 - 0.1 * tick as f64).max(8.0)),
            Profile::Spiky if tick % 15 == 0 => Some(11.0),
            Profile::Spiky => Some(19.7),
            Profile::Flatline if tick > FLATLINE_AFTER => None,
            Profile::Flatline => Some(19.5),
        }
    }
}

#[derive(Debug)]
struct SimState {
    tick: u64,
    view_distance: i32,
    entities: u64,
    chunks: u64,
    online: BTreeSet<SubscriberId>,
}

/// A fake server that prints what the control loop does to it.
pub struct SimulatedHost {
    profile: Profile,
    state: Mutex<SimState>,
}

impl SimulatedHost {
    pub fn new(profile: Profile, view_distance: i32) -> Self {
        Self {
            profile,
            state: Mutex::new(SimState {
                tick: 0,
                view_distance,
                entities: 0,
                chunks: 0,
                online: BTreeSet::new(),
            }),
        }
    }

    /// Bring a player online.
    pub fn join(&self, id: SubscriberId) -> bool {
        self.state.lock().online.insert(id)
    }

    /// Take a player offline. Returns whether they were online.
    pub fn leave(&self, id: &SubscriberId) -> bool {
        self.state.lock().online.remove(id)
    }

    /// Online players, sorted by name.
    pub fn online(&self) -> Vec<SubscriberId> {
        self.state.lock().online.iter().cloned().collect()
    }
}

impl MetricSource for SimulatedHost {
    fn current_tps(&self) -> Result<f64, EffectorError> {
        let mut state = self.state.lock();
        state.tick += 1;
        state.entities += ENTITY_GROWTH;
        state.chunks += CHUNK_GROWTH;

        let base = self
            .profile
            .base_tps(state.tick)
            .ok_or_else(|| EffectorError::Unavailable("tick counter stalled".to_string()))?;

        let over = (state.view_distance - NEUTRAL_VIEW_DISTANCE).max(0) as f64;
        let under = (NEUTRAL_VIEW_DISTANCE - state.view_distance).max(0) as f64;
        let tps = base - over * VIEW_DISTANCE_COST + under * VIEW_DISTANCE_RELIEF
            - state.entities as f64 / ENTITIES_PER_TPS;
        Ok(tps.clamp(0.0, 20.0))
    }
}

impl ViewDistanceEffector for SimulatedHost {
    fn set_view_distance(&self, chunks: i32) -> Result<(), EffectorError> {
        self.state.lock().view_distance = chunks;
        println!("{}", style(format!("  [server] view distance -> {}", chunks)).cyan());
        Ok(())
    }
}

impl CleanupEffector for SimulatedHost {
    fn clear_entities(&self, mode: CleanupMode) -> Result<u64, EffectorError> {
        let mut state = self.state.lock();
        let removed = match mode {
            CleanupMode::Standard => state.entities / 2,
            CleanupMode::Aggressive => state.entities * 9 / 10,
        };
        state.entities -= removed;
        Ok(removed)
    }

    fn clear_chunks(&self, mode: CleanupMode) -> Result<u64, EffectorError> {
        let mut state = self.state.lock();
        let cleared = match mode {
            CleanupMode::Standard => state.chunks / 4,
            CleanupMode::Aggressive => state.chunks * 3 / 4,
        };
        state.chunks -= cleared;
        Ok(cleared)
    }

    fn reclaim_memory(&self) -> Result<(), EffectorError> {
        Ok(())
    }
}

impl SubscriberSink for SimulatedHost {
    fn send(&self, id: &SubscriberId, text: &str) -> Result<(), EffectorError> {
        if !self.is_online(id) {
            return Err(EffectorError::Unavailable(format!("{} is offline", id)));
        }
        println!("{}", style(format!("  [to {}] {}", id, text)).dim());
        Ok(())
    }

    fn is_online(&self, id: &SubscriberId) -> bool {
        self.state.lock().online.contains(id)
    }

    fn notify_admins(&self, text: &str) {
        println!("{}", style(format!("  [admins] {}", text)).yellow());
    }
}

/// Only the console operator holds permissions in the simulation.
impl PermissionCheck for SimulatedHost {
    fn has_permission(&self, actor: &ActorId, _node: &str) -> bool {
        matches!(actor, ActorId::Console)
    }
}
