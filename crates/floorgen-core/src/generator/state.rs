//! Generation state, phases and the read-only diagnostics views.

use hecs::Entity;
use serde::Serialize;

use crate::socket::SocketRef;

/// Where the generator is in a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenerationPhase {
    Idle,
    Seeding,
    Clearing,
    PlacingStart,
    Growing,
    PlacingExit,
    SealingDeadEnds,
    CachingOrReplaying,
    Done { success: bool },
}

/// Per-floor working state. Reset at the start of every attempt.
#[derive(Debug, Clone, Default)]
pub struct GenerationState {
    pub floor: u32,
    pub budget: u32,
    pub credits_remaining: u32,
    /// Open sockets waiting to be grown from
    pub frontier: Vec<SocketRef>,
    /// Placed rooms in placement order; the first is the start room
    pub rooms: Vec<Entity>,
    pub blockades: Vec<Entity>,
    pub connections_made: u32,
    pub exit_placed: bool,
    /// Zero-based attempt index
    pub attempt: u32,
    pub active_seed: u64,
    pub replayed: bool,
}

impl GenerationState {
    /// Reset for a new attempt
    pub fn begin(&mut self, floor: u32, budget: u32, attempt: u32, seed: u64) {
        *self = Self {
            floor,
            budget,
            credits_remaining: budget,
            attempt,
            active_seed: seed,
            ..Default::default()
        };
    }

    /// Fraction of the budget turned into connections
    pub fn used_fraction(&self) -> f32 {
        if self.budget == 0 {
            return 0.0;
        }
        1.0 - self.credits_remaining as f32 / self.budget as f32
    }

    pub fn start_room(&self) -> Option<Entity> {
        self.rooms.first().copied()
    }
}

/// Read-only view of the generator for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratorSnapshot {
    pub phase: GenerationPhase,
    pub floor: u32,
    pub budget: u32,
    pub credits_remaining: u32,
    pub connections_made: u32,
    pub frontier_len: usize,
    pub room_count: usize,
    pub blockade_count: usize,
    pub registered_footprints: usize,
    pub exit_placed: bool,
    pub attempt: u32,
    pub active_seed: u64,
    pub rng_draws: u64,
}

/// Outcome of a successful `generate` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub floor: u32,
    /// Seed of the accepted attempt
    pub seed: u64,
    /// Attempts used (0 for a replayed layout)
    pub attempts: u32,
    pub room_count: usize,
    pub connections_made: u32,
    pub credits_remaining: u32,
    pub used_fraction: f32,
    pub replayed: bool,
    /// Accepted below the minimum budget fraction
    pub under_budget: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_resets() {
        let mut state = GenerationState::default();
        state.connections_made = 7;
        state.exit_placed = true;
        state.begin(2, 20, 1, 99);
        assert_eq!(state.credits_remaining, 20);
        assert_eq!(state.connections_made, 0);
        assert!(!state.exit_placed);
        assert_eq!(state.active_seed, 99);
        assert_eq!(state.floor, 2);
    }

    #[test]
    fn test_used_fraction() {
        let mut state = GenerationState::default();
        state.begin(0, 20, 0, 1);
        assert_eq!(state.used_fraction(), 0.0);
        state.credits_remaining = 4;
        assert!((state.used_fraction() - 0.8).abs() < 1e-6);
        state.credits_remaining = 0;
        assert_eq!(state.used_fraction(), 1.0);
    }
}
