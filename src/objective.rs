//! Weighted minimization objective (spec §4.5): trades off capacity
//! violations, medium-priority availability violations, and late endings.
//! Grounded on the teacher's `objective` assembly in `solver.rs`
//! (`morning_preference_weight * ... - back_to_back_penalty_weight * ...`),
//! sign flipped since this objective is minimized rather than maximized.

use crate::config::Config;
use crate::constraints::CompiledConstraints;
use good_lp::Expression;

/// `W_capacity · Σ p_capacity + W_late · Σ p_late + W_medium · Σ p_medium`.
pub fn build(compiled: &CompiledConstraints, config: &Config) -> Expression {
    let mut objective = Expression::from(0.0);

    for &penalty in compiled.capacity_penalty.values() {
        objective = objective + (config.capacity_weight as f64) * penalty;
    }
    for &penalty in compiled.late_penalty.values() {
        objective = objective + (config.late_weight as f64) * penalty;
    }
    for &penalty in compiled.medium_penalty.values() {
        objective = objective + (config.medium_weight as f64) * penalty;
    }

    objective
}
