//! Rule-based repositioning guidance and the guided completion flow.
//!
//! Technique selection is a fixed rule table over resident weight and
//! mobility. The guided flow walks a caregiver through three safety-checked
//! steps; its state persists in the key-value store so a flow survives
//! process restarts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, ValidationError};
use crate::resident::Mobility;
use crate::store::KeyValueStore;

/// kv key holding the in-progress guided flow, if any.
pub const GUIDE_STATE_KEY: &str = "mGuideState";

/// A recommended technique plus step-by-step instructions. Attached to
/// reposition events as an immutable payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guidance {
    pub technique: String,
    pub steps: Vec<String>,
}

/// Select a repositioning technique for a resident.
///
/// The heavy/low-mobility rule wins over the light/agile rule when both
/// match.
pub fn recommend(weight_kg: f64, mobility: Mobility, pain_points: &[String]) -> Guidance {
    let mut technique = "Two-person log roll with knee support";
    if weight_kg < 60.0 && mobility == Mobility::High {
        technique = "Single caregiver assist with slide sheet";
    }
    if weight_kg > 100.0 || mobility == Mobility::Low {
        technique = "Use mechanical lift; avoid twisting; neutral spine.";
    }

    let pain = if pain_points.is_empty() {
        "none reported".to_string()
    } else {
        pain_points.join(", ")
    };

    Guidance {
        technique: technique.to_string(),
        steps: vec![
            "Prepare area, lock bed brakes, adjust height to hips level".to_string(),
            "Use slide sheet; keep back neutral; bend at knees".to_string(),
            format!("Address pain points: {pain}"),
        ],
    }
}

/// A named safety check within a guide step.
#[derive(Debug, Clone, Copy)]
pub struct GuideCheck {
    pub id: &'static str,
    pub label: &'static str,
}

/// A fixed step of the guided flow.
#[derive(Debug, Clone, Copy)]
pub struct GuideStep {
    pub id: &'static str,
    pub title: &'static str,
    pub text: &'static str,
    pub checks: &'static [GuideCheck],
}

/// The three-step guided repositioning procedure.
pub const GUIDE_STEPS: &[GuideStep] = &[
    GuideStep {
        id: "prep",
        title: "Preparation",
        text: "Prepare area and confirm safety.",
        checks: &[
            GuideCheck { id: "brakes", label: "Bed or chair brakes locked" },
            GuideCheck { id: "height", label: "Bed height at caregiver hip level" },
            GuideCheck { id: "clear", label: "Environment clear of obstacles" },
        ],
    },
    GuideStep {
        id: "body_mech",
        title: "Body Mechanics",
        text: "Use neutral spine and bend at knees.",
        checks: &[
            GuideCheck { id: "slide", label: "Slide sheet or draw sheet in place" },
            GuideCheck { id: "neutral", label: "Back neutral; avoid twisting" },
        ],
    },
    GuideStep {
        id: "complete",
        title: "Completion",
        text: "Confirm comfort and document.",
        checks: &[
            GuideCheck { id: "comfort", label: "Resident comfortable and supported" },
            GuideCheck { id: "pain", label: "Any pain reported is addressed" },
        ],
    },
];

/// Persistent state of an in-progress guided flow.
///
/// Advancing past a step requires all of its safety checks to be confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideFlow {
    pub resident_id: String,
    pub step_index: usize,
    /// step id -> check id -> confirmed
    #[serde(default)]
    checks: BTreeMap<String, BTreeMap<String, bool>>,
}

impl GuideFlow {
    /// Begin a flow for a resident, at the first step with nothing checked.
    pub fn start(resident_id: &str) -> Self {
        Self {
            resident_id: resident_id.to_string(),
            step_index: 0,
            checks: BTreeMap::new(),
        }
    }

    pub fn current_step(&self) -> &'static GuideStep {
        let idx = self.step_index.min(GUIDE_STEPS.len() - 1);
        &GUIDE_STEPS[idx]
    }

    pub fn is_last_step(&self) -> bool {
        self.step_index + 1 >= GUIDE_STEPS.len()
    }

    /// Confirm (or unconfirm) a safety check on the current step.
    ///
    /// # Errors
    /// Rejects check ids that do not belong to the current step.
    pub fn set_check(&mut self, check_id: &str, confirmed: bool) -> Result<(), ValidationError> {
        let step = self.current_step();
        if !step.checks.iter().any(|c| c.id == check_id) {
            return Err(ValidationError::InvalidValue {
                field: "check".to_string(),
                message: format!("no check '{check_id}' in step '{}'", step.id),
            });
        }
        self.checks
            .entry(step.id.to_string())
            .or_default()
            .insert(check_id.to_string(), confirmed);
        Ok(())
    }

    /// Whether a check on the current step is confirmed.
    pub fn is_checked(&self, check_id: &str) -> bool {
        self.checks
            .get(self.current_step().id)
            .and_then(|m| m.get(check_id))
            .copied()
            .unwrap_or(false)
    }

    /// Whether every check of the current step is confirmed.
    pub fn step_complete(&self) -> bool {
        let step = self.current_step();
        let confirmed = self.checks.get(step.id);
        step.checks.iter().all(|c| {
            confirmed
                .and_then(|m| m.get(c.id))
                .copied()
                .unwrap_or(false)
        })
    }

    /// Advance to the next step.
    ///
    /// # Errors
    /// Refuses while the current step has unconfirmed checks or when already
    /// on the final step.
    pub fn advance(&mut self) -> Result<(), ValidationError> {
        let step = self.current_step();
        if !self.step_complete() {
            return Err(ValidationError::ChecksIncomplete {
                step: step.id.to_string(),
            });
        }
        if self.is_last_step() {
            return Err(ValidationError::InvalidValue {
                field: "step".to_string(),
                message: "already on the final step".to_string(),
            });
        }
        self.step_index += 1;
        Ok(())
    }

    /// Step back (no check requirements).
    pub fn back(&mut self) {
        self.step_index = self.step_index.saturating_sub(1);
    }

    /// Finish the flow, producing the guidance payload for the logged event:
    /// the confirmed check labels of every step.
    ///
    /// # Errors
    /// Refuses unless on the final step with all of its checks confirmed.
    pub fn finish(&self) -> Result<Guidance, ValidationError> {
        if !self.is_last_step() || !self.step_complete() {
            return Err(ValidationError::ChecksIncomplete {
                step: self.current_step().id.to_string(),
            });
        }
        let mut steps = Vec::new();
        for step in GUIDE_STEPS {
            let confirmed = self.checks.get(step.id);
            for check in step.checks {
                if confirmed
                    .and_then(|m| m.get(check.id))
                    .copied()
                    .unwrap_or(false)
                {
                    steps.push(format!("{}: {}", step.title, check.label));
                }
            }
        }
        Ok(Guidance {
            technique: "Guided flow".to_string(),
            steps,
        })
    }

    // ── kv persistence ───────────────────────────────────────────────

    /// Load the in-progress flow, if any. Corrupt state reads as absent.
    pub fn load(kv: &dyn KeyValueStore) -> Result<Option<Self>, DatabaseError> {
        let Some(json) = kv.kv_get(GUIDE_STATE_KEY)? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&json).ok())
    }

    pub fn save(&self, kv: &dyn KeyValueStore) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        kv.kv_set(GUIDE_STATE_KEY, &json)
    }

    pub fn clear(kv: &dyn KeyValueStore) -> Result<(), DatabaseError> {
        kv.kv_delete(GUIDE_STATE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommend_default_technique() {
        let g = recommend(80.0, Mobility::Medium, &[]);
        assert_eq!(g.technique, "Two-person log roll with knee support");
        assert!(g.steps[2].contains("none reported"));
    }

    #[test]
    fn recommend_light_agile_resident() {
        let g = recommend(55.0, Mobility::High, &[]);
        assert_eq!(g.technique, "Single caregiver assist with slide sheet");
    }

    #[test]
    fn recommend_heavy_or_low_mobility_wins() {
        let g = recommend(110.0, Mobility::High, &[]);
        assert!(g.technique.contains("mechanical lift"));

        // Low mobility overrides even a light resident
        let g = recommend(55.0, Mobility::Low, &["left hip".to_string()]);
        assert!(g.technique.contains("mechanical lift"));
        assert!(g.steps[2].contains("left hip"));
    }

    #[test]
    fn flow_refuses_advance_with_unchecked_items() {
        let mut flow = GuideFlow::start("resident:1");
        assert!(matches!(
            flow.advance().unwrap_err(),
            ValidationError::ChecksIncomplete { .. }
        ));

        flow.set_check("brakes", true).unwrap();
        flow.set_check("height", true).unwrap();
        assert!(!flow.step_complete());
        flow.set_check("clear", true).unwrap();
        assert!(flow.step_complete());
        flow.advance().unwrap();
        assert_eq!(flow.current_step().id, "body_mech");
    }

    #[test]
    fn flow_rejects_unknown_check() {
        let mut flow = GuideFlow::start("resident:1");
        assert!(flow.set_check("slide", true).is_err()); // belongs to step 2
    }

    #[test]
    fn flow_finish_collects_confirmed_labels() {
        let mut flow = GuideFlow::start("resident:1");
        for step in GUIDE_STEPS {
            for check in step.checks {
                flow.set_check(check.id, true).unwrap();
            }
            if !flow.is_last_step() {
                flow.advance().unwrap();
            }
        }
        let guidance = flow.finish().unwrap();
        assert_eq!(guidance.technique, "Guided flow");
        assert_eq!(guidance.steps.len(), 7);
        assert!(guidance.steps[0].starts_with("Preparation:"));
    }

    #[test]
    fn flow_finish_refuses_before_final_step() {
        let flow = GuideFlow::start("resident:1");
        assert!(flow.finish().is_err());
    }

    #[test]
    fn flow_back_saturates_at_first_step() {
        let mut flow = GuideFlow::start("resident:1");
        flow.back();
        assert_eq!(flow.step_index, 0);
    }
}
