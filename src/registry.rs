use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::ApplyError;
use crate::event::Event;
use crate::metrics::{Metric, MetricValue};

/// Maps metric identity to live metric state.
///
/// Metrics are registered lazily by the first event that names them, with
/// the metric kind inferred from that event. Events are only applied from
/// the consumer thread; reads may come from anywhere.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    metrics: DashMap<Arc<str>, Metric>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event's effect to its target metric, creating the metric
    /// on first sight.
    pub fn apply(&self, event: &Event) -> Result<(), ApplyError> {
        if let Some(metric) = self.metrics.get(event.key.as_ref()) {
            return metric.apply(&event.key, &event.kind);
        }

        self.metrics
            .entry(Arc::clone(&event.key))
            .or_insert_with(|| Metric::new_for(&event.kind))
            .apply(&event.key, &event.kind)
    }

    /// Materialize every metric's externally visible value, ordered by
    /// name.
    pub fn collect(&self) -> BTreeMap<String, MetricValue> {
        self.metrics
            .iter()
            .map(|entry| (entry.key().to_string(), entry.value().value()))
            .collect()
    }

    /// Current value of a single metric, if registered.
    pub fn value(&self, name: &str) -> Option<MetricValue> {
        self.metrics.get(name).map(|metric| metric.value().value())
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Drop all registered metrics.
    pub fn clear(&self) {
        self.metrics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Timestamp;
    use crate::event::EventKind;

    fn event(key: &str, kind: EventKind) -> Event {
        Event::new(Timestamp::ZERO, Arc::from(key), kind)
    }

    #[test]
    fn test_apply_registers_metric_on_first_event() {
        let registry = MetricRegistry::new();
        assert!(registry.is_empty());

        registry
            .apply(&event("requests", EventKind::IncrementCounter(3)))
            .expect("apply");

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.value("requests"), Some(MetricValue::Counter(3)));
    }

    #[test]
    fn test_apply_accumulates_across_events() {
        let registry = MetricRegistry::new();

        for _ in 0..10 {
            registry
                .apply(&event("requests", EventKind::IncrementCounter(1)))
                .expect("apply");
        }
        registry
            .apply(&event("requests", EventKind::DecrementCounter(4)))
            .expect("apply");

        assert_eq!(registry.value("requests"), Some(MetricValue::Counter(6)));
    }

    #[test]
    fn test_kind_mismatch_is_reported_not_applied() {
        let registry = MetricRegistry::new();

        registry
            .apply(&event("depth", EventKind::SetGauge(2.0)))
            .expect("apply");
        let err = registry
            .apply(&event("depth", EventKind::IncrementCounter(1)))
            .expect_err("mismatch");

        assert!(matches!(err, ApplyError::KindMismatch { .. }));
        assert_eq!(registry.value("depth"), Some(MetricValue::Gauge(2.0)));
    }

    #[test]
    fn test_collect_orders_by_name() {
        let registry = MetricRegistry::new();

        registry
            .apply(&event("zeta", EventKind::IncrementCounter(1)))
            .expect("apply");
        registry
            .apply(&event("alpha", EventKind::SetGauge(1.0)))
            .expect("apply");

        let names: Vec<String> = registry.collect().keys().cloned().collect();
        assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn test_clear_removes_everything() {
        let registry = MetricRegistry::new();

        registry
            .apply(&event("requests", EventKind::IncrementCounter(1)))
            .expect("apply");
        registry.clear();

        assert!(registry.is_empty());
        assert_eq!(registry.value("requests"), None);
    }
}
