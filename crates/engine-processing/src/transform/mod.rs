use crate::error::TransformError;
use chrono::{DateTime, Utc};
use engine_config::settings::entity::{EntityKind, EntityPlan, RecordRule};
use engine_core::metrics::Metrics;
use model::records::{row::RowData, source::SourceRecord};
use tracing::{debug, info, warn};

pub mod mapping;
pub mod rules;

/// Rows ready for the writer, plus what was left out.
#[derive(Debug, Default)]
pub struct TransformOutcome {
    pub rows: Vec<RowData>,
    /// Records excluded by a business rule.
    pub skipped: usize,
    /// Records rejected as malformed.
    pub dropped: usize,
}

/// Applies an entity plan's rules and column mapping to source records.
pub struct Transformer {
    entity: String,
    kind: EntityKind,
    table: String,
    rules: Vec<RecordRule>,
    synced_at: DateTime<Utc>,
    metrics: Metrics,
}

impl Transformer {
    pub fn new(plan: &EntityPlan, synced_at: DateTime<Utc>, metrics: Metrics) -> Self {
        Self {
            entity: plan.name.clone(),
            kind: plan.kind,
            table: plan.table.clone(),
            rules: plan.rules.clone(),
            synced_at,
            metrics,
        }
    }

    /// `Ok(None)` means a rule excluded the record.
    pub fn transform(&self, record: &SourceRecord) -> Result<Option<RowData>, TransformError> {
        let id = record.id().ok_or_else(|| TransformError::MissingId {
            entity: self.entity.clone(),
        })?;

        if let Some(rule) = rules::first_violation(&self.rules, record) {
            debug!(entity = %self.entity, id, ?rule, "Record excluded by rule");
            return Ok(None);
        }

        Ok(Some(mapping::map_record(
            self.kind,
            &self.table,
            id,
            record,
            self.synced_at,
        )))
    }

    pub fn transform_all(&self, records: &[SourceRecord]) -> TransformOutcome {
        let mut outcome = TransformOutcome {
            rows: Vec::with_capacity(records.len()),
            ..Default::default()
        };

        for record in records {
            match self.transform(record) {
                Ok(Some(row)) => outcome.rows.push(row),
                Ok(None) => outcome.skipped += 1,
                Err(e) => {
                    warn!(entity = %self.entity, error = %e, "Dropping record");
                    outcome.dropped += 1;
                }
            }
        }

        self.metrics.increment_transformed(outcome.rows.len() as u64);
        self.metrics.increment_skipped(outcome.skipped as u64);
        self.metrics.increment_dropped(outcome.dropped as u64);

        info!(
            entity = %self.entity,
            rows = outcome.rows.len(),
            skipped = outcome.skipped,
            dropped = outcome.dropped,
            "Records transformed"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_config::settings::defaults::default_plans;
    use model::core::value::Value;
    use serde_json::json;

    fn orders() -> EntityPlan {
        default_plans()
            .into_iter()
            .find(|p| p.kind == EntityKind::SalesOrders)
            .unwrap()
    }

    fn record(value: serde_json::Value) -> SourceRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_negative_total_skipped_zero_kept() {
        let metrics = Metrics::new();
        let transformer = Transformer::new(&orders(), Utc::now(), metrics.clone());
        let outcome = transformer.transform_all(&[
            record(json!({"id": 1, "amount_total": -50})),
            record(json!({"id": 2, "amount_total": 0})),
            record(json!({"id": 3, "amount_total": 120.0})),
        ]);

        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].get_value("aumet_id"), Value::Int(2));
        assert_eq!(metrics.snapshot().records_skipped, 1);
    }

    #[test]
    fn test_missing_id_is_dropped() {
        let metrics = Metrics::new();
        let transformer = Transformer::new(&orders(), Utc::now(), metrics.clone());

        assert_eq!(
            transformer.transform(&record(json!({"name": "orphan"}))),
            Err(TransformError::MissingId {
                entity: "sales_orders".into()
            })
        );

        let outcome = transformer.transform_all(&[
            record(json!({"name": "orphan"})),
            record(json!({"id": 4, "amount_total": 1})),
        ]);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(metrics.snapshot().records_dropped, 1);
    }

    #[test]
    fn test_rules_only_apply_when_declared() {
        let customers = default_plans()
            .into_iter()
            .find(|p| p.kind == EntityKind::Customers)
            .unwrap();
        let transformer = Transformer::new(&customers, Utc::now(), Metrics::new());
        let outcome = transformer.transform_all(&[record(json!({"id": 1, "amount_total": -5}))]);
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.skipped, 0);
    }
}
