//! Fixed-interval re-execution of the pipeline and the single-instance guard.

pub mod lock;

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::AppError;

pub use lock::InstanceGuard;

pub const DEFAULT_INTERVAL_MINUTES: u64 = 60;

/// Granularity of the wait between cycles, so a stop request is seen quickly.
const POLL_STEP: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Schedule {
    pub interval: Duration,
    /// Stop after this many cycles; None runs until stopped.
    pub max_cycles: Option<usize>,
}

impl Schedule {
    pub fn every_minutes(minutes: u64) -> Self {
        Schedule {
            interval: Duration::from_secs(minutes * 60),
            max_cycles: None,
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::every_minutes(DEFAULT_INTERVAL_MINUTES)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleSummary {
    pub ciclos: usize,
    pub sucessos: usize,
    pub falhas: usize,
}

/// Run `cycle` right away, then once per interval. A failed cycle is logged
/// and the loop goes on.
pub fn run_scheduled<F>(schedule: &Schedule, stop: &AtomicBool, mut cycle: F) -> ScheduleSummary
where
    F: FnMut(usize) -> Result<(), AppError>,
{
    let mut summary = ScheduleSummary::default();
    log::info!(
        "Agendador iniciado: intervalo de {} min",
        schedule.interval.as_secs() / 60
    );

    loop {
        let numero = summary.ciclos + 1;
        log::info!("Ciclo {} iniciado", numero);
        match cycle(numero) {
            Ok(()) => {
                summary.sucessos += 1;
                log::info!("Ciclo {} concluído", numero);
            }
            Err(e) => {
                summary.falhas += 1;
                log::error!("Ciclo {} falhou: {}", numero, e);
            }
        }
        summary.ciclos = numero;

        if schedule.max_cycles.is_some_and(|max| summary.ciclos >= max) {
            break;
        }
        if !wait(schedule.interval, stop) {
            break;
        }
    }

    log::info!(
        "Agendador finalizado: {} ciclos ({} falhas)",
        summary.ciclos,
        summary.falhas
    );
    summary
}

/// Sleep for `interval`; false when `stop` was raised meanwhile.
fn wait(interval: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(POLL_STEP.min(deadline - now));
    }
}
