//! Trace grouping and the canonical orderings used across the pipeline.

use crate::parser::{NormalizedEvent, RecordValue};
use crate::LogFlowParser;
use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Events bucketed by trace id, in presentation order
///
/// **Public** - returned by grouping; iterates as
/// `(trace_id, events)` pairs, largest bucket first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceGroups {
    groups: Vec<(String, Vec<NormalizedEvent>)>,
}

impl TraceGroups {
    /// Number of trace buckets
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total events across all buckets
    pub fn event_count(&self) -> usize {
        self.groups.iter().map(|(_, events)| events.len()).sum()
    }

    /// Look up one trace's events by id
    pub fn get(&self, trace_id: &str) -> Option<&[NormalizedEvent]> {
        self.groups
            .iter()
            .find(|(id, _)| id == trace_id)
            .map(|(_, events)| events.as_slice())
    }

    /// Iterate buckets in presentation order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NormalizedEvent])> {
        self.groups
            .iter()
            .map(|(id, events)| (id.as_str(), events.as_slice()))
    }
}

impl IntoIterator for TraceGroups {
    type Item = (String, Vec<NormalizedEvent>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Chronological ordering within one trace
///
/// Sort key first, then function name, then module. `total_cmp` keeps the
/// ordering total, and the surrounding sorts are stable, so events with
/// unparsable timestamps hold their input order at the front.
pub(crate) fn chronological_cmp(a: &NormalizedEvent, b: &NormalizedEvent) -> Ordering {
    a.sort_key
        .total_cmp(&b.sort_key)
        .then_with(|| a.function_name.cmp(&b.function_name))
        .then_with(|| a.module.cmp(&b.module))
}

/// Presentation ranking across traces: busiest first, ties by id
///
/// The grouper and the graph's trace list share this single ordering.
pub(crate) fn trace_rank_cmp(a: (&str, usize), b: (&str, usize)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

impl LogFlowParser {
    /// Group records by trace id and sort each bucket chronologically
    ///
    /// **Public** - main entry point for trace correlation
    ///
    /// # Arguments
    /// * `records` - Anything convertible into admitted records
    ///
    /// # Returns
    /// Buckets ranked by size (descending), ties broken by trace id
    pub fn group_by_trace<I, R>(&self, records: I) -> TraceGroups
    where
        I: IntoIterator<Item = R>,
        R: Into<RecordValue>,
    {
        let mut buckets: HashMap<String, Vec<NormalizedEvent>> = HashMap::new();

        for record in records {
            let event = self.normalize(&record.into());
            buckets.entry(event.trace_id.clone()).or_default().push(event);
        }

        let mut groups: Vec<(String, Vec<NormalizedEvent>)> = buckets.into_iter().collect();
        for (_, events) in &mut groups {
            events.sort_by(chronological_cmp);
        }
        groups.sort_by(|a, b| trace_rank_cmp((a.0.as_str(), a.1.len()), (b.0.as_str(), b.1.len())));

        let grouped = TraceGroups { groups };
        debug!(
            "Grouped {} events into {} traces",
            grouped.event_count(),
            grouped.len()
        );
        grouped
    }
}
