//! Scoped, nested performance marks with frame aggregation.
//!
//! Marks stack per name: a nested `begin_mark("x")` inside an already-open
//! `"x"` is legal, and `end_mark` pops the innermost. A disabled profiler
//! short-circuits every operation to a no-op so instrumentation can stay in
//! the hot path without cost when profiling isn't wanted.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ProfilerConfig {
    pub enabled: bool,
    /// Number of most-recent frames retained before older ones are evicted.
    pub max_frames: usize,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_frames: 120,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarkRecord {
    pub name: String,
    pub duration: Duration,
    pub meta: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub frame: u64,
    pub marks: Vec<MarkRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfilerReport {
    pub frames: Vec<FrameReport>,
    /// Total and average duration per mark name, across all retained frames.
    pub totals: HashMap<String, Duration>,
    pub counts: HashMap<String, u32>,
}

impl ProfilerReport {
    pub fn average(&self, name: &str) -> Option<Duration> {
        let total = *self.totals.get(name)?;
        let count = *self.counts.get(name)?;
        if count == 0 {
            None
        } else {
            Some(total / count)
        }
    }
}

struct OpenMark {
    started_at: Instant,
    meta: Option<Value>,
}

pub struct Profiler {
    config: ProfilerConfig,
    frames: VecDeque<FrameReport>,
    current_frame: Option<FrameReport>,
    open_marks: HashMap<String, Vec<OpenMark>>,
}

impl Profiler {
    pub fn new(config: ProfilerConfig) -> Self {
        Self {
            config,
            frames: VecDeque::new(),
            current_frame: None,
            open_marks: HashMap::new(),
        }
    }

    pub fn begin_frame(&mut self, frame: u64) {
        if !self.config.enabled {
            return;
        }
        self.current_frame = Some(FrameReport {
            frame,
            marks: Vec::new(),
        });
    }

    /// Close the current frame, auto-closing any marks left open (with a
    /// warning) and evicting the oldest retained frame if over capacity.
    pub fn end_frame(&mut self) {
        if !self.config.enabled {
            return;
        }
        let Some(mut report) = self.current_frame.take() else {
            return;
        };

        let leftover: Vec<String> = self
            .open_marks
            .iter()
            .filter(|(_, stack)| !stack.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        for name in leftover {
            while self.open_marks.get(&name).is_some_and(|s| !s.is_empty()) {
                warn!(mark = %name, frame = report.frame, "profiler mark left open at endFrame, auto-closing");
                self.close_mark_into(&name, &mut report);
            }
        }

        if self.frames.len() >= self.config.max_frames {
            self.frames.pop_front();
        }
        self.frames.push_back(report);
    }

    pub fn begin_mark(&mut self, name: &str, meta: Option<Value>) {
        if !self.config.enabled {
            return;
        }
        self.open_marks
            .entry(name.to_owned())
            .or_default()
            .push(OpenMark { started_at: Instant::now(), meta });
    }

    pub fn end_mark(&mut self, name: &str) {
        if !self.config.enabled {
            return;
        }
        let Some(frame) = self.current_frame.as_mut() else {
            return;
        };
        self.close_mark_into(name, frame);
    }

    fn close_mark_into(&mut self, name: &str, frame: &mut FrameReport) {
        let Some(stack) = self.open_marks.get_mut(name) else {
            return;
        };
        let Some(open) = stack.pop() else {
            return;
        };
        frame.marks.push(MarkRecord {
            name: name.to_owned(),
            duration: open.started_at.elapsed(),
            meta: open.meta,
        });
    }

    /// Run `f`, recording its wall-clock duration as a mark.
    pub fn measure<R>(&mut self, name: &str, f: impl FnOnce() -> R) -> R {
        self.begin_mark(name, None);
        let result = f();
        self.end_mark(name);
        result
    }

    pub fn create_scope(&self, prefix: impl Into<String>) -> ProfilerScope {
        ProfilerScope { prefix: prefix.into() }
    }

    pub fn generate_report(&self) -> ProfilerReport {
        let mut totals: HashMap<String, Duration> = HashMap::new();
        let mut counts: HashMap<String, u32> = HashMap::new();
        for frame in &self.frames {
            for mark in &frame.marks {
                *totals.entry(mark.name.clone()).or_insert(Duration::ZERO) += mark.duration;
                *counts.entry(mark.name.clone()).or_insert(0) += 1;
            }
        }
        ProfilerReport {
            frames: self.frames.iter().cloned().collect(),
            totals,
            counts,
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.current_frame = None;
        self.open_marks.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// A prefix-scoped handle returned by [`Profiler::create_scope`]. Marks
/// opened through a scope are recorded under `"{prefix}.{name}"`.
pub struct ProfilerScope {
    prefix: String,
}

impl ProfilerScope {
    pub fn begin_mark(&self, profiler: &mut Profiler, name: &str) {
        profiler.begin_mark(&self.qualify(name), None);
    }

    pub fn end_mark(&self, profiler: &mut Profiler, name: &str) {
        profiler.end_mark(&self.qualify(name));
    }

    fn qualify(&self, name: &str) -> String {
        format!("{}.{}", self.prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_marks_of_the_same_name_stack_and_pop_innermost_first() {
        let mut profiler = Profiler::new(ProfilerConfig::default());
        profiler.begin_frame(1);
        profiler.begin_mark("x", None);
        profiler.begin_mark("x", None);
        profiler.end_mark("x");
        profiler.end_mark("x");
        profiler.end_frame();

        let report = profiler.generate_report();
        assert_eq!(report.frames[0].marks.len(), 2);
    }

    #[test]
    fn unclosed_mark_is_auto_closed_at_end_frame() {
        let mut profiler = Profiler::new(ProfilerConfig::default());
        profiler.begin_frame(1);
        profiler.begin_mark("leaky", None);
        profiler.end_frame();

        let report = profiler.generate_report();
        assert_eq!(report.frames[0].marks.len(), 1);
        assert_eq!(report.frames[0].marks[0].name, "leaky");
    }

    #[test]
    fn disabled_profiler_records_nothing() {
        let mut profiler = Profiler::new(ProfilerConfig {
            enabled: false,
            max_frames: 10,
        });
        profiler.begin_frame(1);
        profiler.begin_mark("x", None);
        profiler.end_mark("x");
        profiler.end_frame();

        let report = profiler.generate_report();
        assert!(report.frames.is_empty());
    }

    #[test]
    fn frames_beyond_capacity_evict_fifo() {
        let mut profiler = Profiler::new(ProfilerConfig {
            enabled: true,
            max_frames: 2,
        });
        for frame in 0..5 {
            profiler.begin_frame(frame);
            profiler.end_frame();
        }
        let report = profiler.generate_report();
        assert_eq!(report.frames.len(), 2);
        assert_eq!(report.frames[0].frame, 3);
        assert_eq!(report.frames[1].frame, 4);
    }

    #[test]
    fn scope_prefixes_mark_names() {
        let mut profiler = Profiler::new(ProfilerConfig::default());
        let scope = profiler.create_scope("physics");
        profiler.begin_frame(1);
        scope.begin_mark(&mut profiler, "broadphase");
        scope.end_mark(&mut profiler, "broadphase");
        profiler.end_frame();

        let report = profiler.generate_report();
        assert_eq!(report.frames[0].marks[0].name, "physics.broadphase");
    }
}
