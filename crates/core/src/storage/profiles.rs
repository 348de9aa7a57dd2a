use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Onboarding payload as persisted. Income is captured as a bracket string
/// during onboarding; the exact figure used for scoring arrives with the
/// recommendation request itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub age: i32,
    pub income_range: String,
    pub investment_amount: f64,
    pub time_horizon: String,
    pub risk_tolerance: String,
    pub investment_goals: String,
    pub experience: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredProfile {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub income_range: String,
    pub investment_amount: f64,
    pub time_horizon: String,
    pub risk_tolerance: String,
    pub investment_goals: String,
    pub experience: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create_profile(pool: &sqlx::PgPool, profile: &NewProfile) -> anyhow::Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO profiles \
           (name, age, income_range, investment_amount, time_horizon, risk_tolerance, investment_goals, experience) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(&profile.name)
    .bind(profile.age)
    .bind(&profile.income_range)
    .bind(profile.investment_amount)
    .bind(&profile.time_horizon)
    .bind(&profile.risk_tolerance)
    .bind(&profile.investment_goals)
    .bind(&profile.experience)
    .fetch_one(pool)
    .await
    .context("insert profiles failed")?;

    Ok(id)
}

pub async fn get_profile(pool: &sqlx::PgPool, id: i64) -> anyhow::Result<Option<StoredProfile>> {
    sqlx::query_as::<_, StoredProfile>(
        "SELECT id, name, age, income_range, investment_amount, time_horizon, \
                risk_tolerance, investment_goals, experience, created_at \
         FROM profiles \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("select profiles failed")
}

pub async fn delete_profile(pool: &sqlx::PgPool, id: i64) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM profiles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("delete profiles failed")?;

    Ok(res.rows_affected() > 0)
}
