use serde::Serialize;
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Timing and memory of one pipeline phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseStats {
    pub phase: String,
    pub elapsed_ms: u128,
    pub memory_mb: Option<u64>,
    pub cpu_usage: Option<f32>,
}

/// Records per-phase statistics. Elapsed time is always tracked; process
/// memory and CPU are sampled only when enabled (and built with `cli`).
pub struct PhaseMonitor {
    enabled: bool,
    current: Option<(String, Instant)>,
    completed: Vec<PhaseStats>,
    peak_memory_mb: u64,
    started: Instant,
    #[cfg(feature = "cli")]
    probe: Option<(System, Pid)>,
}

impl PhaseMonitor {
    pub fn new(enabled: bool) -> Self {
        #[cfg(feature = "cli")]
        let probe = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some((System::new(), pid)),
                Err(e) => {
                    tracing::warn!("System monitoring unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            enabled,
            current: None,
            completed: Vec::new(),
            peak_memory_mb: 0,
            started: Instant::now(),
            #[cfg(feature = "cli")]
            probe,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn start_phase(&mut self, phase: &str) {
        if let Some((previous, _)) = &self.current {
            tracing::warn!("Phase '{}' was never finished", previous);
        }
        self.current = Some((phase.to_string(), Instant::now()));
    }

    pub fn finish_phase(&mut self) {
        let Some((phase, began)) = self.current.take() else {
            return;
        };

        let (memory_mb, cpu_usage) = self.sample();
        if let Some(memory) = memory_mb {
            self.peak_memory_mb = self.peak_memory_mb.max(memory);
        }

        let stats = PhaseStats {
            phase,
            elapsed_ms: began.elapsed().as_millis(),
            memory_mb,
            cpu_usage,
        };

        match (stats.memory_mb, stats.cpu_usage) {
            (Some(memory), Some(cpu)) => tracing::info!(
                "📊 {} - {} ms, CPU: {:.1}%, Memory: {}MB",
                stats.phase,
                stats.elapsed_ms,
                cpu,
                memory
            ),
            _ => tracing::debug!("{} took {} ms", stats.phase, stats.elapsed_ms),
        }

        self.completed.push(stats);
    }

    pub fn phases(&self) -> &[PhaseStats] {
        &self.completed
    }

    pub fn total_elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn log_final_stats(&self) {
        if self.enabled {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                self.total_elapsed(),
                self.peak_memory_mb
            );
        }
    }

    #[cfg(feature = "cli")]
    fn sample(&mut self) -> (Option<u64>, Option<f32>) {
        let Some((system, pid)) = self.probe.as_mut() else {
            return (None, None);
        };
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[*pid]),
            true,
            ProcessRefreshKind::everything(),
        );
        match system.process(*pid) {
            Some(process) => (Some(process.memory() / 1024 / 1024), Some(process.cpu_usage())),
            None => (None, None),
        }
    }

    #[cfg(not(feature = "cli"))]
    fn sample(&mut self) -> (Option<u64>, Option<f32>) {
        (None, None)
    }
}

impl Default for PhaseMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_recorded_in_order() {
        let mut monitor = PhaseMonitor::new(false);
        monitor.start_phase("extract");
        monitor.finish_phase();
        monitor.start_phase("transform");
        monitor.finish_phase();

        let names: Vec<&str> = monitor.phases().iter().map(|p| p.phase.as_str()).collect();
        assert_eq!(names, vec!["extract", "transform"]);
        assert!(monitor.phases().iter().all(|p| p.memory_mb.is_none()));
    }

    #[test]
    fn test_finish_without_start_is_ignored() {
        let mut monitor = PhaseMonitor::default();
        monitor.finish_phase();
        assert!(monitor.phases().is_empty());
        assert!(!monitor.is_enabled());
    }
}
