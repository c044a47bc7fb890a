//! sqlx read/write layer between the SQLite schema and the scheduling core.
//!
//! Assembles the plan/run read models the pure modules consume and performs
//! the multi-row writes (run materialization, day completion) inside
//! transactions. Nothing here makes scheduling decisions.

use anyhow::{Context, Result, anyhow};
use chrono::{Days, NaiveDate};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::PlanError;
use crate::models::{
    DaySlot, ExerciseSet, ExerciseTemplate, MesocyclePlan, MesocycleRun, PreviousRunSet,
    RepRange, SessionExercise, TrainingDay, TrainingDayTemplate,
};

pub async fn plan_names(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM plans ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(n,)| n).collect())
}

/// Resolves a `plan list` row number or an exact name to a plan id.
pub async fn plan_id(pool: &SqlitePool, selector: &str) -> Result<Option<String>> {
    if let Ok(idx) = selector.parse::<i64>() {
        let id = sqlx::query_scalar(
            r#"
            SELECT id
            FROM (
              SELECT id, ROW_NUMBER() OVER (ORDER BY name) AS rn
              FROM plans
            ) t
            WHERE t.rn = ?
            "#,
        )
        .bind(idx)
        .fetch_optional(pool)
        .await?;
        return Ok(id);
    }

    let id = sqlx::query_scalar("SELECT id FROM plans WHERE name = ?")
        .bind(selector)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

pub async fn load_plan(pool: &SqlitePool, plan_id: &str) -> Result<MesocyclePlan> {
    let (name, count, length): (String, i64, i64) = sqlx::query_as(
        "SELECT name, microcycle_count, microcycle_length FROM plans WHERE id = ?",
    )
    .bind(plan_id)
    .fetch_one(pool)
    .await
    .with_context(|| format!("plan `{plan_id}` not found"))?;

    // Positions without a plan_slots row are rest days.
    let mut day_slots = vec![DaySlot::Rest; length.max(0) as usize];

    let slots: Vec<(String, i64, String)> = sqlx::query_as(
        "SELECT id, position, label FROM plan_slots WHERE plan_id = ? ORDER BY position",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await?;

    for (slot_id, position, label) in slots {
        let exercises: Vec<(String, i64, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT name, sets, rep_lower, rep_upper, rir
            FROM plan_exercises
            WHERE slot_id = ?
            ORDER BY order_index
            "#,
        )
        .bind(&slot_id)
        .fetch_all(pool)
        .await?;

        let exercises = exercises
            .into_iter()
            .map(|(name, sets, lower, upper, rir)| {
                Ok(ExerciseTemplate {
                    name,
                    sets: sets as u32,
                    rep_range: RepRange::new(lower as u32, upper as u32)?,
                    rir: rir as u32,
                })
            })
            .collect::<Result<Vec<_>, PlanError>>()?;

        let idx = position as usize - 1;
        if idx >= day_slots.len() {
            return Err(PlanError::DayOutOfBounds {
                day: position as u32,
                length: length as u32,
            }
            .into());
        }
        day_slots[idx] = DaySlot::Training(TrainingDayTemplate { label, exercises });
    }

    let plan = MesocyclePlan {
        id: plan_id.to_string(),
        name,
        microcycle_count: count as u32,
        microcycle_length: length as u32,
        day_slots,
    };
    plan.validate()?;
    Ok(plan)
}

pub async fn active_run(pool: &SqlitePool) -> Result<Option<MesocycleRun>> {
    let row: Option<(String, String, NaiveDate, NaiveDate)> = sqlx::query_as(
        "SELECT id, plan_id, start_date, end_date FROM runs WHERE active = 1 LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    let Some((id, plan_id, start_date, end_date)) = row else {
        return Ok(None);
    };

    Ok(Some(MesocycleRun {
        id,
        plan: load_plan(pool, &plan_id).await?,
        start_date,
        end_date,
    }))
}

/// Instantiates `plan` against `start`, materializing one run_day per
/// training slot per microcycle (rest slots get no rows) with its prescribed
/// exercises and empty sets.
pub async fn create_run(
    pool: &SqlitePool,
    plan: &MesocyclePlan,
    start: NaiveDate,
) -> Result<MesocycleRun> {
    plan.validate()?;

    let end = start
        .checked_add_days(Days::new(plan.total_days() - 1))
        .ok_or(PlanError::DateOverflow)?;

    let mut tx = pool.begin().await?;

    let run_id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"INSERT INTO runs (id, plan_id, start_date, end_date, active, created_at)
           VALUES (?1, ?2, ?3, ?4, 1, datetime('now'))"#,
    )
    .bind(&run_id)
    .bind(&plan.id)
    .bind(start)
    .bind(end)
    .execute(&mut *tx)
    .await?;

    for microcycle in 1..=plan.microcycle_count {
        for (idx, slot) in plan.day_slots.iter().enumerate() {
            let DaySlot::Training(template) = slot else {
                continue;
            };
            let position = idx as u32 + 1;
            let offset =
                u64::from(microcycle - 1) * u64::from(plan.microcycle_length) + idx as u64;
            let date = start
                .checked_add_days(Days::new(offset))
                .ok_or(PlanError::DateOverflow)?;

            let day_id = Uuid::new_v4().to_string();
            sqlx::query(
                r#"INSERT INTO run_days (id, run_id, microcycle, slot_position, date)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
            )
            .bind(&day_id)
            .bind(&run_id)
            .bind(microcycle as i64)
            .bind(position as i64)
            .bind(date)
            .execute(&mut *tx)
            .await?;

            for (order_idx, ex) in template.exercises.iter().enumerate() {
                let ex_id = Uuid::new_v4().to_string();
                sqlx::query(
                    r#"INSERT INTO day_exercises (id, run_day_id, name, order_index)
                       VALUES (?1, ?2, ?3, ?4)"#,
                )
                .bind(&ex_id)
                .bind(&day_id)
                .bind(&ex.name)
                .bind(order_idx as i64)
                .execute(&mut *tx)
                .await?;

                for number in 1..=ex.sets {
                    sqlx::query(
                        r#"INSERT INTO exercise_sets
                             (id, day_exercise_id, number, rep_lower, rep_upper, rir)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                    )
                    .bind(Uuid::new_v4().to_string())
                    .bind(&ex_id)
                    .bind(number as i64)
                    .bind(ex.rep_range.lower as i64)
                    .bind(ex.rep_range.upper as i64)
                    .bind(ex.rir as i64)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }
    }

    tx.commit().await?;

    Ok(MesocycleRun {
        id: run_id,
        plan: plan.clone(),
        start_date: start,
        end_date: end,
    })
}

/// Loads the realized training day at (microcycle, slot position), with its
/// exercises and sets. `None` when no row was materialized there.
pub async fn training_day(
    pool: &SqlitePool,
    run_id: &str,
    microcycle: u32,
    slot_position: u32,
) -> Result<Option<TrainingDay>> {
    let row: Option<(String, NaiveDate, bool)> = sqlx::query_as(
        r#"
        SELECT id, date, completed
        FROM run_days
        WHERE run_id = ? AND microcycle = ? AND slot_position = ?
        "#,
    )
    .bind(run_id)
    .bind(microcycle as i64)
    .bind(slot_position as i64)
    .fetch_optional(pool)
    .await?;

    let Some((day_id, date, completed)) = row else {
        return Ok(None);
    };

    let ex_rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT id, name FROM day_exercises WHERE run_day_id = ? ORDER BY order_index",
    )
    .bind(&day_id)
    .fetch_all(pool)
    .await?;

    let mut exercises = Vec::with_capacity(ex_rows.len());
    for (ex_id, name) in ex_rows {
        let set_rows: Vec<(i64, f64, i64, i64, i64, Option<i64>, bool)> = sqlx::query_as(
            r#"
            SELECT number, weight, rep_lower, rep_upper, rir, reps_completed, completed
            FROM exercise_sets
            WHERE day_exercise_id = ?
            ORDER BY number
            "#,
        )
        .bind(&ex_id)
        .fetch_all(pool)
        .await?;

        let sets = set_rows
            .into_iter()
            .map(|(number, weight, lower, upper, rir, reps, done)| ExerciseSet {
                number: number as u32,
                weight,
                rep_range: RepRange {
                    lower: lower as u32,
                    upper: upper as u32,
                },
                rir: rir as u32,
                reps_completed: reps.map(|r| r as u32),
                completed: done,
            })
            .collect();

        exercises.push(SessionExercise { id: ex_id, name, sets });
    }

    Ok(Some(TrainingDay {
        id: day_id,
        microcycle,
        slot_position,
        date,
        exercises,
        completed,
    }))
}

/// The matching sets from the most recent earlier realization of the same
/// slot position for `exercise_name`, one row per set number. This is what
/// the performance comparator reads; it is never written back.
pub async fn previous_sets(
    pool: &SqlitePool,
    plan_id: &str,
    slot_position: u32,
    before: NaiveDate,
    exercise_name: &str,
) -> Result<Vec<PreviousRunSet>> {
    let rows: Vec<(i64, f64, Option<i64>, i64)> = sqlx::query_as(
        r#"
        WITH prior AS (
            SELECT
                es.number,
                es.weight,
                es.reps_completed,
                es.rir,
                ROW_NUMBER() OVER (PARTITION BY es.number ORDER BY rd.date DESC) AS rn
            FROM exercise_sets es
            JOIN day_exercises de ON de.id = es.day_exercise_id
            JOIN run_days rd ON rd.id = de.run_day_id
            JOIN runs r ON r.id = rd.run_id
            WHERE r.plan_id = ?
              AND rd.slot_position = ?
              AND rd.date < ?
              AND de.name = ?
              AND es.completed = 1
        )
        SELECT number, weight, reps_completed, rir
        FROM prior
        WHERE rn = 1
        ORDER BY number
        "#,
    )
    .bind(plan_id)
    .bind(slot_position as i64)
    .bind(before)
    .bind(exercise_name)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(number, weight, reps, rir)| PreviousRunSet {
            number: number as u32,
            weight,
            reps_completed: reps.map(|r| r as u32),
            rir: rir as u32,
        })
        .collect())
}

/// Returned by `complete_day`. "The run just finished" is a fact handed
/// back to the caller, not ambient session state.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOutcome {
    pub date: NaiveDate,
    pub run_completed: bool,
}

/// Marks a training day completed; when it was the last open day of the
/// run, the run itself completes and is detached.
pub async fn complete_day(
    pool: &SqlitePool,
    run_id: &str,
    day_id: &str,
) -> Result<CompletionOutcome> {
    let mut tx = pool.begin().await?;

    let date: NaiveDate = sqlx::query_scalar("SELECT date FROM run_days WHERE id = ?")
        .bind(day_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| anyhow!("no training day with id `{day_id}`"))?;

    sqlx::query("UPDATE run_days SET completed = 1 WHERE id = ?")
        .bind(day_id)
        .execute(&mut *tx)
        .await?;

    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM run_days WHERE run_id = ? AND completed = 0")
            .bind(run_id)
            .fetch_one(&mut *tx)
            .await?;

    let run_completed = remaining == 0;
    if run_completed {
        sqlx::query(
            "UPDATE runs SET active = 0, completed_at = datetime('now') WHERE id = ?",
        )
        .bind(run_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(CompletionOutcome { date, run_completed })
}

pub async fn abandon_run(pool: &SqlitePool, run_id: &str) -> Result<()> {
    sqlx::query("UPDATE runs SET active = 0 WHERE id = ?")
        .bind(run_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Outcome of a plan delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanDeletion {
    Deleted,
    /// Run history references the plan, so it stays.
    HasRuns(i64),
}

/// Deletes a plan unless runs reference it. `runs.plan_id` carries no
/// `ON DELETE` action, so an unconditional delete would trip the foreign
/// key; history wins over deletion.
pub async fn delete_plan(pool: &SqlitePool, plan_id: &str) -> Result<PlanDeletion> {
    let mut tx = pool.begin().await?;

    let runs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM runs WHERE plan_id = ?")
        .bind(plan_id)
        .fetch_one(&mut *tx)
        .await?;
    if runs > 0 {
        tx.rollback().await?;
        return Ok(PlanDeletion::HasRuns(runs));
    }

    sqlx::query("DELETE FROM plans WHERE id = ?")
        .bind(plan_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(PlanDeletion::Deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn sample_plan() -> MesocyclePlan {
        MesocyclePlan {
            id: "p1".into(),
            name: "push-pull".into(),
            microcycle_count: 1,
            microcycle_length: 2,
            day_slots: vec![
                DaySlot::Training(TrainingDayTemplate {
                    label: "push".into(),
                    exercises: Vec::new(),
                }),
                DaySlot::Rest,
            ],
        }
    }

    async fn insert_plan_row(pool: &SqlitePool, plan: &MesocyclePlan) {
        sqlx::query(
            r#"INSERT INTO plans (id, name, microcycle_count, microcycle_length, created_at)
               VALUES (?1, ?2, ?3, ?4, datetime('now'))"#,
        )
        .bind(&plan.id)
        .bind(&plan.name)
        .bind(plan.microcycle_count as i64)
        .bind(plan.microcycle_length as i64)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn delete_refuses_plans_with_run_history() {
        let pool = db::open_memory().await.unwrap();
        let plan = sample_plan();
        insert_plan_row(&pool, &plan).await;

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let run = create_run(&pool, &plan, start).await.unwrap();
        abandon_run(&pool, &run.id).await.unwrap();

        assert_eq!(
            delete_plan(&pool, &plan.id).await.unwrap(),
            PlanDeletion::HasRuns(1)
        );

        // The plan row survives untouched.
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plans WHERE id = ?")
            .bind(&plan.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn delete_removes_plans_without_runs() {
        let pool = db::open_memory().await.unwrap();
        let plan = sample_plan();
        insert_plan_row(&pool, &plan).await;

        assert_eq!(
            delete_plan(&pool, &plan.id).await.unwrap(),
            PlanDeletion::Deleted
        );

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plans")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
