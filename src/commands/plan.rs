use std::fs::read_to_string;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::{
    cli::PlanCmd,
    models::{DaySlot, ExerciseTemplate, MesocyclePlan, RepRange, TrainingDayTemplate},
    schedule,
    storage,
    types::{OutputFmt, best_name_suggestion, emit},
};

#[derive(Debug, Deserialize)]
struct PlanToml {
    name: String,
    microcycles: u32,
    day: Vec<DayToml>,
}

#[derive(Debug, Deserialize)]
struct DayToml {
    #[serde(default)]
    rest: bool,
    label: Option<String>,
    #[serde(default)]
    exercise: Vec<ExerciseToml>,
}

#[derive(Debug, Deserialize)]
struct ExerciseToml {
    name: String,
    sets: u32,
    reps: [u32; 2],
    rir: u32,
}

#[derive(Serialize)]
struct PlanJson {
    idx: i64,
    name: String,
    microcycles: i64,
    microcycle_length: i64,
    training_days: i64,
    created_at: String,
}

pub async fn handle(cmd: PlanCmd, pool: &SqlitePool, fmt: OutputFmt) -> Result<()> {
    match cmd {
        PlanCmd::Import { files } => {
            if files.is_empty() {
                println!("{} no plan file provided", "warning:".yellow().bold());
            }
            for f in files {
                import_single_plan(pool, &f).await?;
            }
        }

        PlanCmd::List => {
            let rows = sqlx::query(
                r#"
                SELECT ROW_NUMBER() OVER (ORDER BY name) AS idx,
                       id, name, microcycle_count, microcycle_length, created_at,
                       (SELECT COUNT(*) FROM plan_slots ps WHERE ps.plan_id = plans.id)
                           AS training_days
                FROM   plans
                ORDER  BY idx
                "#,
            )
            .fetch_all(pool)
            .await?;

            let plans: Vec<PlanJson> = rows
                .iter()
                .map(|r| PlanJson {
                    idx: r.get("idx"),
                    name: r.get("name"),
                    microcycles: r.get("microcycle_count"),
                    microcycle_length: r.get("microcycle_length"),
                    training_days: r.get("training_days"),
                    created_at: r.get("created_at"),
                })
                .collect();

            emit(fmt, &plans, || {
                if plans.is_empty() {
                    println!("{}", "  (no plans found)".dimmed());
                    return;
                }
                println!("{}", "Plans:".cyan().bold());
                for p in &plans {
                    let idx = format!("{}", p.idx).yellow();
                    println!(
                        " {} • {} — {} microcycles × {} days ({} training) {}",
                        idx,
                        p.name.bold(),
                        p.microcycles,
                        p.microcycle_length,
                        p.training_days,
                        format!("added {}", &p.created_at[..10]).dimmed(),
                    );
                }
            });
        }

        PlanCmd::Show { plan } => {
            let Some(id) = resolve_or_suggest(pool, &plan).await? else {
                return Ok(());
            };
            let plan = storage::load_plan(pool, &id).await?;
            let ordinals = schedule::training_ordinals(&plan)?;

            emit(fmt, &plan, || {
                println!(
                    "{} {} — {} microcycles × {} days",
                    "Plan:".cyan().bold(),
                    plan.name.bold(),
                    plan.microcycle_count,
                    plan.microcycle_length
                );
                for (idx, slot) in plan.day_slots.iter().enumerate() {
                    let position = idx as u32 + 1;
                    match slot {
                        DaySlot::Rest => {
                            println!("   {} {}", format!("{:>2}", position).yellow(), "rest".dimmed());
                        }
                        DaySlot::Training(t) => {
                            // Slot position is canonical; "Day N" is derived.
                            let ordinal = ordinals[idx]
                                .map(|n| format!("(day {n})"))
                                .unwrap_or_default();
                            println!(
                                "   {} {} {}",
                                format!("{:>2}", position).yellow(),
                                t.label.bold(),
                                ordinal.dimmed()
                            );
                            for ex in &t.exercises {
                                println!(
                                    "        {} — {} × {}-{} @RIR {}",
                                    ex.name,
                                    ex.sets,
                                    ex.rep_range.lower,
                                    ex.rep_range.upper,
                                    ex.rir
                                );
                            }
                        }
                    }
                }
            });
        }

        PlanCmd::Delete { plan } => {
            let Some(id) = resolve_or_suggest(pool, &plan).await? else {
                return Ok(());
            };
            let name: String = sqlx::query_scalar("SELECT name FROM plans WHERE id = ?")
                .bind(&id)
                .fetch_one(pool)
                .await?;
            match storage::delete_plan(pool, &id).await? {
                storage::PlanDeletion::Deleted => {
                    println!("{} deleted `{}`", "ok:".green().bold(), name);
                }
                storage::PlanDeletion::HasRuns(n) => {
                    let runs = if n == 1 { "run" } else { "runs" };
                    println!(
                        "{} plan `{}` has {} recorded {} – not deleted",
                        "warning:".yellow().bold(),
                        name,
                        n,
                        runs
                    );
                }
            }
        }
    }
    Ok(())
}

/// Resolves a plan selector, printing a "did you mean" hint on misses.
pub async fn resolve_or_suggest(pool: &SqlitePool, selector: &str) -> Result<Option<String>> {
    if let Some(id) = storage::plan_id(pool, selector).await? {
        return Ok(Some(id));
    }

    let names = storage::plan_names(pool).await?;
    match best_name_suggestion(selector, &names) {
        Some(sug) => println!(
            "{} no plan `{}` -- did you mean: `{}`?",
            "error:".red().bold(),
            selector,
            sug.green()
        ),
        None => println!("{} no plan `{}`", "error:".red().bold(), selector),
    }
    Ok(None)
}

async fn import_single_plan(pool: &SqlitePool, file: &str) -> Result<()> {
    let toml_str = match read_to_string(file) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!(
                "{} cannot open file `{}` – file not found",
                "error:".red().bold(),
                file
            );
            return Ok(());
        }
        Err(e) => return Err(e).with_context(|| format!("reading `{file}`")),
    };
    let parsed: PlanToml =
        toml::from_str(&toml_str).with_context(|| format!("parsing `{file}`"))?;

    // Build the in-memory plan first so the scheduling invariants are
    // checked before anything touches the database.
    let day_slots = parsed
        .day
        .iter()
        .map(|d| {
            if d.rest {
                return Ok(DaySlot::Rest);
            }
            let exercises = d
                .exercise
                .iter()
                .map(|e| {
                    Ok(ExerciseTemplate {
                        name: e.name.clone(),
                        sets: e.sets,
                        rep_range: RepRange::new(e.reps[0], e.reps[1])?,
                        rir: e.rir,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(DaySlot::Training(TrainingDayTemplate {
                label: d.label.clone().unwrap_or_else(|| "training".to_string()),
                exercises,
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    let plan = MesocyclePlan {
        id: Uuid::new_v4().to_string(),
        name: parsed.name,
        microcycle_count: parsed.microcycles,
        microcycle_length: day_slots.len() as u32,
        day_slots,
    };
    if let Err(e) = plan.validate() {
        println!(
            "{} cannot import plan `{}` – {}",
            "warning:".yellow().bold(),
            plan.name,
            e
        );
        return Ok(());
    }

    // Transactional import.
    let mut tx = pool.begin().await?;

    let res = sqlx::query(
        r#"INSERT INTO plans (id, name, microcycle_count, microcycle_length, created_at)
           VALUES (?1, ?2, ?3, ?4, datetime('now'))"#,
    )
    .bind(&plan.id)
    .bind(&plan.name)
    .bind(plan.microcycle_count as i64)
    .bind(plan.microcycle_length as i64)
    .execute(&mut *tx)
    .await;

    if let Err(sqlx::Error::Database(db_err)) = &res {
        // 2067 = SQLITE_CONSTRAINT_UNIQUE
        if db_err.code() == Some("2067".into()) {
            println!(
                "{} plan `{}` already exists – skipping",
                "warning:".yellow().bold(),
                plan.name
            );
            tx.rollback().await?;
            return Ok(());
        }
    }
    res?;

    for (idx, slot) in plan.day_slots.iter().enumerate() {
        let DaySlot::Training(template) = slot else {
            continue;
        };
        let slot_id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"INSERT INTO plan_slots (id, plan_id, position, label)
               VALUES (?1, ?2, ?3, ?4)"#,
        )
        .bind(&slot_id)
        .bind(&plan.id)
        .bind(idx as i64 + 1)
        .bind(&template.label)
        .execute(&mut *tx)
        .await?;

        for (order_idx, ex) in template.exercises.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO plan_exercises
                     (id, slot_id, name, sets, rep_lower, rep_upper, rir, order_index)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&slot_id)
            .bind(&ex.name)
            .bind(ex.sets as i64)
            .bind(ex.rep_range.lower as i64)
            .bind(ex.rep_range.upper as i64)
            .bind(ex.rir as i64)
            .bind(order_idx as i64)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    println!("{} `{}`", "ok:".green().bold(), plan.name);
    Ok(())
}
