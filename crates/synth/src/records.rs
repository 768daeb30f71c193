use chrono::{DateTime, Duration, Utc};
use tracedeck_core::model::record::{AlertRecord, EvaluationRecord, WorkflowRecord};

use crate::rng::Lcg64;
use crate::trace::SynthConfig;

// fixed per-kind stream seeds so the three batches stay independent
const ALERTS_SEED: u64 = 0x9c0f_2d11;
const EVALUATIONS_SEED: u64 = 0x5b8e_44a7;
const WORKFLOWS_SEED: u64 = 0x17d3_9f63;

const ENTITIES: &[&str] = &[
    "churn-model",
    "fraud-scorer",
    "pricing-engine",
    "support-router",
];
const DRIFT_TYPES: &[&str] = &["psi", "spc", "custom", "llm"];
const EVALUATION_NAMES: &[&str] = &["nightly-regression", "prompt-suite", "canary-batch"];
const EVALUATION_TYPES: &[&str] = &["llm_judge", "classification", "regression"];
const WORKFLOW_NAMES: &[&str] = &["reprofile-baseline", "score-backlog", "export-report"];
const WORKFLOW_STATUSES: &[&str] = &["pending", "running", "completed", "failed"];

fn spread(cfg: &SynthConfig, index: usize, rng: &mut Lcg64) -> DateTime<Utc> {
    let slots = cfg.count.max(1) as i64;
    let slot_ms = (cfg.window.num_milliseconds() / slots).max(1);
    let jitter_ms = rng.next_range(0, (slot_ms / 2).max(1) as u64) as i64;
    cfg.start + Duration::milliseconds(index as i64 * slot_ms + jitter_ms)
}

pub fn generate_alerts(cfg: &SynthConfig) -> Vec<AlertRecord> {
    let mut rng = Lcg64::new(ALERTS_SEED);
    (0..cfg.count)
        .map(|i| AlertRecord {
            id: (i + 1) as i64,
            created_at: spread(cfg, i, &mut rng),
            entity: rng.pick(ENTITIES).to_string(),
            drift_type: rng.pick(DRIFT_TYPES).to_string(),
            active: rng.chance(0.6),
        })
        .collect()
}

pub fn generate_evaluations(cfg: &SynthConfig) -> Vec<EvaluationRecord> {
    let mut rng = Lcg64::new(EVALUATIONS_SEED);
    (0..cfg.count)
        .map(|i| EvaluationRecord {
            id: (i + 1) as i64,
            created_at: spread(cfg, i, &mut rng),
            name: format!("{}-{}", rng.pick(EVALUATION_NAMES), i + 1),
            evaluation_type: rng.pick(EVALUATION_TYPES).to_string(),
        })
        .collect()
}

pub fn generate_workflows(cfg: &SynthConfig) -> Vec<WorkflowRecord> {
    let mut rng = Lcg64::new(WORKFLOWS_SEED);
    (0..cfg.count)
        .map(|i| WorkflowRecord {
            id: (i + 1) as i64,
            created_at: spread(cfg, i, &mut rng),
            name: format!("{}-{}", rng.pick(WORKFLOW_NAMES), i + 1),
            status: rng.pick(WORKFLOW_STATUSES).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn cfg() -> SynthConfig {
        SynthConfig {
            count: 12,
            start: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            window: Duration::hours(6),
        }
    }

    #[test]
    fn batches_are_deterministic() {
        let cfg = cfg();
        assert_eq!(generate_alerts(&cfg), generate_alerts(&cfg));
        assert_eq!(generate_evaluations(&cfg), generate_evaluations(&cfg));
        assert_eq!(generate_workflows(&cfg), generate_workflows(&cfg));
    }

    #[test]
    fn ids_are_unique_and_ascending() {
        let alerts = generate_alerts(&cfg());
        let ids = alerts.iter().map(|a| a.id).collect::<Vec<_>>();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn records_land_inside_the_window() {
        let cfg = cfg();
        let end = cfg.start + cfg.window;
        for alert in generate_alerts(&cfg) {
            assert!(alert.created_at >= cfg.start && alert.created_at <= end);
        }
        for workflow in generate_workflows(&cfg) {
            assert!(workflow.created_at >= cfg.start && workflow.created_at <= end);
        }
    }

    #[test]
    fn values_come_from_known_pools() {
        let cfg = cfg();
        for alert in generate_alerts(&cfg) {
            assert!(ENTITIES.contains(&alert.entity.as_str()));
            assert!(DRIFT_TYPES.contains(&alert.drift_type.as_str()));
        }
        for evaluation in generate_evaluations(&cfg) {
            assert!(
                EVALUATION_TYPES.contains(&evaluation.evaluation_type.as_str())
            );
        }
        for workflow in generate_workflows(&cfg) {
            assert!(WORKFLOW_STATUSES.contains(&workflow.status.as_str()));
        }
    }
}
