// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local resource sampling, abstracted so tests can script a sequence of
//! readings rather than depending on the live host's CPU/memory load.

use sysinfo::System;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

pub trait Sampler: Send + Sync + 'static {
    fn sample(&mut self) -> ResourceSample;
}

/// Real sampler backed by `sysinfo`.
pub struct SystemSampler {
    system: System,
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self { system }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SystemSampler {
    fn sample(&mut self) -> ResourceSample {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let cpu_percent = self.system.global_cpu_usage();
        let memory_percent = if self.system.total_memory() == 0 {
            0.0
        } else {
            (self.system.used_memory() as f64 / self.system.total_memory() as f64 * 100.0) as f32
        };

        ResourceSample {
            cpu_percent,
            memory_percent,
        }
    }
}

/// Test sampler: returns a scripted sequence of readings, repeating the
/// last one once the script is exhausted.
#[cfg(any(test, feature = "test-support"))]
pub struct ScriptedSampler {
    readings: Vec<ResourceSample>,
    cursor: usize,
}

#[cfg(any(test, feature = "test-support"))]
impl ScriptedSampler {
    pub fn new(readings: Vec<ResourceSample>) -> Self {
        Self { readings, cursor: 0 }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Sampler for ScriptedSampler {
    fn sample(&mut self) -> ResourceSample {
        #[allow(clippy::expect_used)]
        let reading = self
            .readings
            .get(self.cursor)
            .copied()
            .unwrap_or_else(|| *self.readings.last().expect("script must have at least one reading"));
        if self.cursor < self.readings.len() {
            self.cursor += 1;
        }
        reading
    }
}
