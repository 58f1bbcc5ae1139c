//! Rotation selector state machine
//!
//! Builds the weekly menu one dish per round:
//!
//! ```text
//! Seeding ──► Selecting ──► ... ──► Done
//!    │             │
//!    └─────────────┴──► Aborted (pool exhausted)
//! ```
//!
//! Seeding picks uniformly at random among the least recently used dishes.
//! Every later round picks the pool dish with the lowest diversity score,
//! breaking ties by corpus order. The random source is injected so runs are
//! reproducible under a fixed seed.

use chrono::{DateTime, Utc};
use rand::Rng;
use shared::{Dish, DishId};
use std::collections::BTreeSet;

use super::scorer::{DiversityScorer, PickedProfile, ScoreBreakdown};

/// Where the selector is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorPhase {
    Seeding,
    Selecting,
    Done,
    Aborted,
}

impl SelectorPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SelectorPhase::Done | SelectorPhase::Aborted)
    }
}

/// Dish plus its distinctive ingredients, normalized once per run
#[derive(Debug, Clone)]
struct Candidate {
    dish: Dish,
    distinctive: BTreeSet<String>,
}

/// Owned, mutable state of one selection run
///
/// `picked` and `pool` partition the dishes the run started with; dishes only
/// ever move from the pool to the end of `picked`.
#[derive(Debug, Clone)]
pub struct SelectionState {
    picked: Vec<Candidate>,
    pool: Vec<Candidate>,
    profile: PickedProfile,
    phase: SelectorPhase,
}

impl SelectionState {
    /// Start a run over `dishes`, keeping their order as the tie-break order
    pub fn new(dishes: Vec<Dish>, scorer: &DiversityScorer) -> Self {
        let pool = dishes
            .into_iter()
            .map(|dish| Candidate {
                distinctive: scorer.normalizer().normalize(&dish.ingredients),
                dish,
            })
            .collect();

        Self {
            picked: Vec::new(),
            pool,
            profile: PickedProfile::default(),
            phase: SelectorPhase::Seeding,
        }
    }

    pub fn phase(&self) -> SelectorPhase {
        self.phase
    }

    pub fn picked(&self) -> impl Iterator<Item = &Dish> {
        self.picked.iter().map(|candidate| &candidate.dish)
    }

    pub fn pool(&self) -> impl Iterator<Item = &Dish> {
        self.pool.iter().map(|candidate| &candidate.dish)
    }

    pub fn picked_len(&self) -> usize {
        self.picked.len()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn into_picked(self) -> Vec<Dish> {
        self.picked.into_iter().map(|candidate| candidate.dish).collect()
    }

    fn take_from_pool(&mut self, index: usize) -> &Dish {
        let candidate = self.pool.remove(index);
        self.profile.absorb(&candidate.distinctive, &candidate.dish.tags);
        self.picked.push(candidate);
        &self.picked[self.picked.len() - 1].dish
    }
}

/// Record of one round, seeding included
#[derive(Debug, Clone, PartialEq)]
pub struct RoundPick {
    pub dish_id: DishId,
    /// Size of the LRU tie set for the seed round, 0 otherwise
    pub lru_ties: usize,
    /// Winning score; `None` for the seed round
    pub score: Option<ScoreBreakdown>,
}

/// Finished selection: the ordered menu candidates and how the run ended
#[derive(Debug, Clone)]
pub struct MenuSelection {
    pub picked: Vec<Dish>,
    pub phase: SelectorPhase,
    pub rounds: Vec<RoundPick>,
}

impl MenuSelection {
    pub fn is_complete(&self) -> bool {
        self.phase == SelectorPhase::Done
    }
}

/// Drives [`SelectionState`] from seeding to a terminal phase
#[derive(Debug, Clone)]
pub struct RotationSelector {
    scorer: DiversityScorer,
    target: usize,
}

impl RotationSelector {
    pub fn new(scorer: DiversityScorer, target: usize) -> Self {
        Self { scorer, target }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn start(&self, dishes: Vec<Dish>) -> SelectionState {
        SelectionState::new(dishes, &self.scorer)
    }

    /// Seeding round: random pick among the dishes with the oldest `last_used`
    ///
    /// A missing `last_used` sorts before any timestamp, so never-cooked dishes
    /// are the LRU set whenever any exist.
    pub fn seed<R: Rng + ?Sized>(&self, state: &mut SelectionState, rng: &mut R) -> Option<RoundPick> {
        if state.phase != SelectorPhase::Seeding {
            return None;
        }
        if self.target == 0 {
            state.phase = SelectorPhase::Done;
            return None;
        }

        let oldest = state.pool.iter().map(|candidate| candidate.dish.last_used).min()?;
        let ties: Vec<usize> = state
            .pool
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.dish.last_used == oldest)
            .map(|(index, _)| index)
            .collect();

        let chosen = ties[rng.gen_range(0..ties.len())];
        let dish = state.take_from_pool(chosen);
        let pick = RoundPick {
            dish_id: dish.id.clone(),
            lru_ties: ties.len(),
            score: None,
        };

        state.phase = self.next_phase(state);
        Some(pick)
    }

    /// One selecting round: move the lowest-scoring pool dish to the menu
    pub fn select_next(&self, state: &mut SelectionState, now: DateTime<Utc>) -> Option<RoundPick> {
        if state.phase != SelectorPhase::Selecting {
            return None;
        }

        let mut best: Option<(usize, ScoreBreakdown)> = None;
        for (index, candidate) in state.pool.iter().enumerate() {
            let breakdown =
                self.scorer
                    .breakdown_against(&candidate.distinctive, &candidate.dish, &state.profile, now);
            // strict comparison keeps the earliest dish on ties
            if best.map_or(true, |(_, current)| breakdown.total < current.total) {
                best = Some((index, breakdown));
            }
        }

        let (index, breakdown) = best?;
        let dish = state.take_from_pool(index);
        let pick = RoundPick {
            dish_id: dish.id.clone(),
            lru_ties: 0,
            score: Some(breakdown),
        };

        state.phase = self.next_phase(state);
        Some(pick)
    }

    /// Run seeding and every selecting round to completion
    pub fn run<R: Rng + ?Sized>(&self, dishes: Vec<Dish>, now: DateTime<Utc>, rng: &mut R) -> MenuSelection {
        let mut state = self.start(dishes);
        let mut rounds = Vec::with_capacity(self.target);

        match self.seed(&mut state, rng) {
            Some(pick) => rounds.push(pick),
            None if state.phase == SelectorPhase::Seeding => state.phase = SelectorPhase::Aborted,
            None => {}
        }

        while state.phase == SelectorPhase::Selecting {
            match self.select_next(&mut state, now) {
                Some(pick) => rounds.push(pick),
                None => break,
            }
        }

        let phase = state.phase;
        MenuSelection {
            picked: state.into_picked(),
            phase,
            rounds,
        }
    }

    fn next_phase(&self, state: &SelectionState) -> SelectorPhase {
        if state.picked.len() >= self.target {
            SelectorPhase::Done
        } else if state.pool.is_empty() {
            SelectorPhase::Aborted
        } else {
            SelectorPhase::Selecting
        }
    }
}
