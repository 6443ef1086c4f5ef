//! Scheduling Pattern Analyzer
//!
//! Pairs each `Scheduled` event with the execution start it led to, then
//! compares dispatch delays across scheduling options (deferred begin date,
//! network or power requirements) to suggest configuration changes.
//!
//! Pairing is 1:1 in timestamp order: a scheduled event claims the earliest
//! unclaimed start at or after it and strictly before the next scheduled
//! event. Scheduled events without such a start only count toward the
//! scheduled total.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rayon::prelude::*;

use crate::event_store::EventStore;
use crate::types::{
    metadata_keys, OptimizationRecommendation, RecommendationKind, RecommendationPriority,
    SchedulingAnalysis, SegmentStats, TaskEvent, TaskEventType,
};
use crate::utils::{parse_timestamp, seconds_between};

/// Samples each compared segment needs before a recommendation is made
pub const MIN_SEGMENT_SAMPLES: usize = 2;

/// Worse segment must be at least this many times slower
pub const DELAY_RATIO_THRESHOLD: f64 = 1.5;

/// ...and at least this many seconds slower
pub const MIN_DELAY_DIFFERENCE_SECS: f64 = 1.0;

/// Scheduled requests needed before judging the execution rate
pub const MIN_SCHEDULED_FOR_RATE: usize = 3;

pub const LOW_EXECUTION_RATE: f64 = 0.5;

/// A scheduled event and the delay until its paired start
#[derive(Debug, Clone, Copy)]
struct PairedExecution<'a> {
    scheduled: &'a TaskEvent,
    delay: f64,
}

impl PairedExecution<'_> {
    /// Whether the request asked for a begin date in the future
    fn is_delayed(&self) -> bool {
        self.scheduled
            .metadata
            .get(metadata_keys::EARLIEST_BEGIN_DATE)
            .and_then(|raw| parse_timestamp(raw))
            .map(|begin| begin > self.scheduled.timestamp)
            .unwrap_or(false)
    }

    fn requires_network(&self) -> bool {
        self.scheduled.metadata_flag(metadata_keys::REQUIRES_NETWORK)
    }

    fn requires_power(&self) -> bool {
        self.scheduled.metadata_flag(metadata_keys::REQUIRES_EXTERNAL_POWER)
    }
}

fn sorted_by_time<'a>(events: &[&'a TaskEvent], event_type: TaskEventType) -> Vec<&'a TaskEvent> {
    let mut matching: Vec<&TaskEvent> = events
        .iter()
        .copied()
        .filter(|e| e.event_type == event_type)
        .collect();
    matching.sort_by_key(|e| e.timestamp);
    matching
}

fn pair_executions<'a>(scheduled: &[&'a TaskEvent], started: &[&'a TaskEvent]) -> Vec<PairedExecution<'a>> {
    let mut pairs = Vec::new();
    let mut next_start = 0;

    for (i, sched) in scheduled.iter().enumerate() {
        // Starts before this request belong to nothing we can see
        while next_start < started.len() && started[next_start].timestamp < sched.timestamp {
            next_start += 1;
        }

        let Some(start) = started.get(next_start) else {
            break;
        };

        let before_next_request = scheduled
            .get(i + 1)
            .map_or(true, |next| start.timestamp < next.timestamp);

        if before_next_request {
            pairs.push(PairedExecution {
                scheduled: sched,
                delay: seconds_between(sched.timestamp, start.timestamp),
            });
            next_start += 1;
        }
    }

    pairs
}

fn segment<'a, F>(pairs: &[PairedExecution<'a>], include: F) -> SegmentStats
where
    F: Fn(&PairedExecution<'a>) -> bool,
{
    let delays: Vec<f64> = pairs.iter().filter(|p| include(*p)).map(|p| p.delay).collect();
    SegmentStats::from_delays(&delays)
}

fn priority_for_ratio(ratio: f64) -> RecommendationPriority {
    if ratio >= 3.0 {
        RecommendationPriority::High
    } else if ratio >= 2.0 {
        RecommendationPriority::Medium
    } else {
        RecommendationPriority::Low
    }
}

/// Compare a constrained segment against its baseline
///
/// Returns a recommendation only when both have enough samples and the
/// constrained one is materially slower.
fn compare_segments(
    kind: RecommendationKind,
    constrained: SegmentStats,
    baseline: SegmentStats,
    advice: &str,
) -> Option<OptimizationRecommendation> {
    if constrained.task_count < MIN_SEGMENT_SAMPLES || baseline.task_count < MIN_SEGMENT_SAMPLES {
        return None;
    }

    let difference = constrained.average_delay - baseline.average_delay;
    if difference < MIN_DELAY_DIFFERENCE_SECS {
        return None;
    }

    // Baseline of zero delay: any qualifying difference is an unbounded ratio
    let ratio = if baseline.average_delay > 0.0 {
        constrained.average_delay / baseline.average_delay
    } else {
        f64::INFINITY
    };
    if ratio < DELAY_RATIO_THRESHOLD {
        return None;
    }

    Some(OptimizationRecommendation {
        kind,
        priority: priority_for_ratio(ratio),
        description: format!(
            "{} (average delay {:.1}s vs {:.1}s)",
            advice, constrained.average_delay, baseline.average_delay
        ),
        observed: constrained.average_delay,
        baseline: baseline.average_delay,
    })
}

fn recommendations(analysis: &SchedulingAnalysis) -> Vec<OptimizationRecommendation> {
    let mut out = Vec::new();

    out.extend(compare_segments(
        RecommendationKind::Timing,
        analysis.delayed,
        analysis.immediate,
        "Deferred begin dates delay execution; schedule immediately where possible",
    ));
    out.extend(compare_segments(
        RecommendationKind::NetworkRequirement,
        analysis.network_required,
        analysis.unconstrained,
        "Requiring network connectivity delays execution; drop the requirement if the task can run offline",
    ));
    out.extend(compare_segments(
        RecommendationKind::PowerRequirement,
        analysis.power_required,
        analysis.unconstrained,
        "Requiring external power delays execution; drop the requirement for lightweight work",
    ));

    if analysis.total_scheduled_tasks >= MIN_SCHEDULED_FOR_RATE
        && analysis.execution_rate < LOW_EXECUTION_RATE
    {
        let priority = if analysis.execution_rate < LOW_EXECUTION_RATE / 2.0 {
            RecommendationPriority::High
        } else {
            RecommendationPriority::Medium
        };
        out.push(OptimizationRecommendation {
            kind: RecommendationKind::ExecutionRate,
            priority,
            description: format!(
                "Only {} of {} scheduled requests started; relax constraints or schedule less often",
                analysis.total_executed_tasks, analysis.total_scheduled_tasks
            ),
            observed: analysis.execution_rate,
            baseline: LOW_EXECUTION_RATE,
        });
    }

    out
}

fn analyze_group(task_identifier: &str, events: &[&TaskEvent]) -> Option<SchedulingAnalysis> {
    let scheduled = sorted_by_time(events, TaskEventType::Scheduled);
    if scheduled.is_empty() {
        return None;
    }
    let started = sorted_by_time(events, TaskEventType::ExecutionStarted);
    let pairs = pair_executions(&scheduled, &started);

    let all_delays: Vec<f64> = pairs.iter().map(|p| p.delay).collect();
    let overall = SegmentStats::from_delays(&all_delays);

    let mut analysis = SchedulingAnalysis {
        task_identifier: task_identifier.to_string(),
        total_scheduled_tasks: scheduled.len(),
        total_executed_tasks: started.len(),
        execution_rate: started.len() as f64 / scheduled.len() as f64,
        average_execution_delay: overall.average_delay,
        paired_executions: pairs.len(),
        immediate: segment(&pairs, |p| !p.is_delayed()),
        delayed: segment(&pairs, |p| p.is_delayed()),
        network_required: segment(&pairs, |p| p.requires_network()),
        power_required: segment(&pairs, |p| p.requires_power()),
        unconstrained: segment(&pairs, |p| !p.requires_network() && !p.requires_power()),
        optimization_recommendations: Vec::new(),
        generated_at: Utc::now(),
    };
    analysis.optimization_recommendations = recommendations(&analysis);

    Some(analysis)
}

/// Analyze one task; `None` when it has no scheduled events
pub fn analyze_task(events: &[TaskEvent], task_identifier: &str) -> Option<SchedulingAnalysis> {
    let task_events: Vec<&TaskEvent> = events
        .iter()
        .filter(|e| e.task_identifier == task_identifier)
        .collect();
    analyze_group(task_identifier, &task_events)
}

/// Analyze every task with scheduled events, ordered by identifier
pub fn analyze_all(events: &[TaskEvent]) -> Vec<SchedulingAnalysis> {
    let mut groups: BTreeMap<&str, Vec<&TaskEvent>> = BTreeMap::new();
    for event in events.iter().filter(|e| {
        matches!(
            e.event_type,
            TaskEventType::Scheduled | TaskEventType::ExecutionStarted
        )
    }) {
        groups
            .entry(event.task_identifier.as_str())
            .or_default()
            .push(event);
    }

    let groups: Vec<(&str, Vec<&TaskEvent>)> = groups.into_iter().collect();
    groups
        .par_iter()
        .filter_map(|(task_identifier, task_events)| analyze_group(task_identifier, task_events))
        .collect()
}

/// Scheduling analysis over an injected store
pub struct SchedulingAnalyzer {
    store: Arc<EventStore>,
}

impl SchedulingAnalyzer {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }

    pub fn analyze_scheduling_patterns(&self, task_identifier: &str) -> Option<SchedulingAnalysis> {
        analyze_task(&self.store.get_events_for(task_identifier), task_identifier)
    }

    pub fn analyze_all_tasks(&self) -> Vec<SchedulingAnalysis> {
        analyze_all(&self.store.get_all_events())
    }
}
