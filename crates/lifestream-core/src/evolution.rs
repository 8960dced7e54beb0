//! Evolution driver: the periodic task that advances the board.
//!
//! [`EvolutionDriver::run`] steps the automaton once per interval and
//! publishes each finished generation through its [`BoardWriter`]. It is the
//! only writer of the board. The loop ends when the [`StopSignal`] fires or,
//! if configured, when the generation limit is reached.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, trace};

use crate::board::BoardWriter;
use crate::engine::{Automaton, Generation};
use crate::signal::StopSignal;

/// Shortest accepted evolution period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Why the evolution loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvolutionEnd {
    /// The stop signal fired.
    Stopped,
    /// The configured `max_generations` was reached.
    MaxGenerationsReached,
}

/// Result of an evolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolutionReport {
    /// Why the loop ended.
    pub end_reason: EvolutionEnd,
    /// Steps taken during this run.
    pub steps: u64,
    /// Counter of the last published generation.
    pub last_generation: u64,
    /// Alive cells in the last published generation.
    pub alive: usize,
}

/// Periodic stepper owning the board's write handle.
#[derive(Debug)]
pub struct EvolutionDriver {
    automaton: Automaton,
    writer: BoardWriter,
    interval: Duration,
    max_generations: u64,
}

impl EvolutionDriver {
    /// Create a driver that steps every `interval` without a generation limit.
    pub fn new(automaton: Automaton, writer: BoardWriter, interval: Duration) -> Self {
        Self {
            automaton,
            writer,
            interval: interval.max(MIN_INTERVAL),
            max_generations: 0,
        }
    }

    /// Stop once the published generation reaches `max` (0 = unlimited).
    #[must_use]
    pub const fn with_max_generations(mut self, max: u64) -> Self {
        self.max_generations = max;
        self
    }

    /// Step once and publish the result.
    pub fn step_once(&mut self) -> Arc<Generation> {
        let next = self.automaton.step(&self.writer.current());
        self.writer.publish(next)
    }

    const fn limit_reached(&self, generation: u64) -> bool {
        self.max_generations > 0 && generation >= self.max_generations
    }

    /// Run until stopped or the generation limit is reached.
    ///
    /// The first step happens one interval after the call.
    pub async fn run(mut self, stop: StopSignal) -> EvolutionReport {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately.
        ticker.tick().await;

        info!(
            interval = ?self.interval,
            max_generations = self.max_generations,
            "Evolution driver starting"
        );

        let mut steps: u64 = 0;
        let mut current = self.writer.current();
        let end_reason = if self.limit_reached(current.number()) {
            EvolutionEnd::MaxGenerationsReached
        } else {
            loop {
                tokio::select! {
                    biased;
                    () = stop.stopped() => break EvolutionEnd::Stopped,
                    _ = ticker.tick() => {
                        current = self.step_once();
                        steps = steps.saturating_add(1);
                        trace!(
                            generation = current.number(),
                            alive = current.alive_count(),
                            "Generation published"
                        );
                        if self.limit_reached(current.number()) {
                            break EvolutionEnd::MaxGenerationsReached;
                        }
                    }
                }
            }
        };

        let report = EvolutionReport {
            end_reason,
            steps,
            last_generation: current.number(),
            alive: current.alive_count(),
        };
        info!(
            end_reason = ?report.end_reason,
            steps = report.steps,
            last_generation = report.last_generation,
            alive = report.alive,
            "Evolution driver stopped"
        );
        report
    }
}
