use serde::{Deserialize, Serialize};

/// Investor profile collected during onboarding. Immutable input to the
/// recommendation pipeline; the HTTP edge rejects malformed profiles before
/// they reach any of the calculations here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub age: u32,
    pub income: f64,
    pub investment_amount: f64,
    pub time_horizon: TimeHorizon,
    pub risk_tolerance: RiskTolerance,
    pub experience: Experience,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeHorizon {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Experience {
    Beginner,
    Intermediate,
    Advanced,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_lowercase_enum_values() {
        let v = json!({
            "age": 30,
            "income": 75000.0,
            "investment_amount": 10000.0,
            "time_horizon": "long",
            "risk_tolerance": "moderate",
            "experience": "intermediate"
        });

        let profile: Profile = serde_json::from_value(v).unwrap();
        assert_eq!(profile.time_horizon, TimeHorizon::Long);
        assert_eq!(profile.risk_tolerance, RiskTolerance::Moderate);
        assert_eq!(profile.experience, Experience::Intermediate);
    }

    #[test]
    fn rejects_unknown_risk_tolerance() {
        let v = json!({
            "age": 30,
            "income": 75000.0,
            "investment_amount": 10000.0,
            "time_horizon": "long",
            "risk_tolerance": "yolo",
            "experience": "intermediate"
        });

        assert!(serde_json::from_value::<Profile>(v).is_err());
    }
}
