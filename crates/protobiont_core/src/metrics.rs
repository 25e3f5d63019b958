//! Run statistics and logging setup.
//!
//! Counters accumulate across the run and surface through periodic
//! structured log lines plus a final summary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::automaton::TickReport;

/// Accumulated counters for one simulation run.
pub struct Metrics {
    tick_count: AtomicU64,
    particle_count: AtomicU64,
    collision_count: AtomicU64,
    reaction_count: AtomicU64,
    bonds_broken: AtomicU64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            particle_count: AtomicU64::new(0),
            collision_count: AtomicU64::new(0),
            reaction_count: AtomicU64::new(0),
            bonds_broken: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a completed tick. Logs at info level every 1000 ticks.
    pub fn record_tick(&self, report: TickReport, particles: usize) {
        let tick = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.particle_count.store(particles as u64, Ordering::Relaxed);
        self.collision_count
            .fetch_add(report.collisions as u64, Ordering::Relaxed);
        self.reaction_count
            .fetch_add(report.reactions as u64, Ordering::Relaxed);
        self.bonds_broken
            .fetch_add(report.bonds_broken as u64, Ordering::Relaxed);

        if tick.is_multiple_of(1000) {
            tracing::info!(
                tick = tick,
                particles = particles,
                collisions = self.collision_count.load(Ordering::Relaxed),
                reactions = self.reaction_count.load(Ordering::Relaxed),
                "simulation tick"
            );
        }
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn particle_count(&self) -> u64 {
        self.particle_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn reaction_count(&self) -> u64 {
        self.reaction_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Final run summary at info level.
    pub fn log_summary(&self) {
        let ticks = self.tick_count();
        let seconds = self.elapsed().as_secs_f64();
        let rate = if seconds > 0.0 {
            ticks as f64 / seconds
        } else {
            0.0
        };
        tracing::info!(
            ticks = ticks,
            particles = self.particle_count.load(Ordering::Relaxed),
            collisions = self.collision_count.load(Ordering::Relaxed),
            reactions = self.reaction_count.load(Ordering::Relaxed),
            bonds_broken = self.bonds_broken.load(Ordering::Relaxed),
            ticks_per_second = format!("{rate:.0}"),
            "run complete"
        );
    }
}

/// Initialize the tracing subscriber, honoring `RUST_LOG` when set.
pub fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();
}
