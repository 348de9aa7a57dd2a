use crate::domain::profile::{Experience, Profile, RiskTolerance, TimeHorizon};

// Committing more than this share of annual income signals reduced capacity
// for loss.
const INCOME_COMMITMENT_THRESHOLD: f64 = 0.20;

/// Holistic risk score on a 1-10 scale.
///
/// Starts from the self-reported tolerance and applies additive adjustments
/// for risk capacity: age, time horizon, share of income being invested,
/// and investing experience. Deterministic; the same profile always yields
/// the same score.
pub fn risk_score(profile: &Profile) -> f64 {
    let base: f64 = match profile.risk_tolerance {
        RiskTolerance::Conservative => 3.0,
        RiskTolerance::Moderate => 6.0,
        RiskTolerance::Aggressive => 9.0,
    };

    let mut adjustment = 0.0;

    if profile.age < 30 {
        adjustment += 1.0;
    } else if profile.age > 50 {
        adjustment -= 1.0;
    }

    match profile.time_horizon {
        TimeHorizon::Long => adjustment += 1.0,
        TimeHorizon::Short => adjustment -= 1.0,
        TimeHorizon::Medium => {}
    }

    if profile.income > 0.0
        && profile.investment_amount / profile.income > INCOME_COMMITMENT_THRESHOLD
    {
        adjustment -= 1.0;
    }

    match profile.experience {
        Experience::Advanced => adjustment += 0.5,
        Experience::Beginner => adjustment -= 0.5,
        Experience::Intermediate => {}
    }

    (base + adjustment).clamp(1.0, 10.0)
}
