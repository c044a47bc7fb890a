use anyhow::Result;
use colored::Colorize;
use sqlx::SqlitePool;

use crate::{
    cli::SessionCmd,
    models::{MesocycleRun, TrainingDay},
    performance::{self, SetPerformance},
    schedule::{self, Resolution, RunState},
    storage,
};

pub async fn handle(cmd: SessionCmd, pool: &SqlitePool) -> Result<()> {
    match cmd {
        SessionCmd::Show => {
            let Some((run, day)) = todays_training(pool).await? else {
                return Ok(());
            };

            let ordinal = schedule::training_ordinal(&run.plan, day.slot_position)?
                .unwrap_or_default();
            let label = run
                .plan
                .day_slots
                .get(day.slot_position as usize - 1)
                .and_then(|s| match s {
                    crate::models::DaySlot::Training(t) => Some(t.label.as_str()),
                    crate::models::DaySlot::Rest => None,
                })
                .unwrap_or("training");

            println!(
                "{} M{} day {} — {} ({}){}",
                "Session:".cyan().bold(),
                day.microcycle,
                ordinal,
                label.bold(),
                day.date,
                if day.completed {
                    " ✓ completed".green().to_string()
                } else {
                    String::new()
                }
            );

            for (i, exercise) in day.exercises.iter().enumerate() {
                let idx = format!("{}", i + 1).yellow();
                println!("\n{} • {}", idx, exercise.name.bold());

                // Matching sets from the previous realization of this slot.
                let previous = storage::previous_sets(
                    pool,
                    &run.plan.id,
                    day.slot_position,
                    day.date,
                    &exercise.name,
                )
                .await?;

                for set in &exercise.sets {
                    let prev = previous.iter().find(|p| p.number == set.number);

                    let prev_column = prev
                        .and_then(|p| {
                            p.reps_completed
                                .map(|r| format!("prev {}kg × {} @{}", p.weight, r, p.rir))
                        })
                        .unwrap_or_else(|| "prev —".to_string());

                    let current = if set.completed {
                        let reps = set.reps_completed.unwrap_or_default();
                        format!("{}kg × {} @{}", set.weight, reps, set.rir)
                    } else {
                        String::new()
                    };

                    let badge = match performance::compare_sets(prev, set) {
                        SetPerformance::Increased => "increased".green().bold().to_string(),
                        SetPerformance::Declined => "declined".red().bold().to_string(),
                        SetPerformance::Maintained => "maintained".yellow().to_string(),
                        SetPerformance::Unknown => String::new(),
                    };

                    println!(
                        "    {} • {}-{} reps @RIR {} {} {} {}",
                        format!("{}", set.number).yellow(),
                        set.rep_range.lower,
                        set.rep_range.upper,
                        set.rir,
                        format!("{:<24}", prev_column).dimmed(),
                        current,
                        badge
                    );
                }
            }
            println!();
        }

        SessionCmd::Log { exercise, weight, reps, rir, set } => {
            let Some((_, day)) = todays_training(pool).await? else {
                return Ok(());
            };
            if day.completed {
                println!("{} today's session is already completed", "error:".red().bold());
                return Ok(());
            }

            let Some(ex) = exercise.checked_sub(1).and_then(|i| day.exercises.get(i)) else {
                println!("{} no exercise at index {}", "error:".red().bold(), exercise);
                return Ok(());
            };

            // Explicit set number, or the next one still open.
            let target = match set {
                Some(n) => ex.sets.iter().find(|s| s.number == n),
                None => ex.sets.iter().find(|s| !s.completed),
            };
            let Some(target) = target else {
                match set {
                    Some(n) => println!(
                        "{} `{}` has no set {}",
                        "error:".red().bold(),
                        ex.name,
                        n
                    ),
                    None => println!(
                        "{} all sets of `{}` are logged — use `--set` to overwrite one",
                        "warning:".yellow().bold(),
                        ex.name
                    ),
                }
                return Ok(());
            };

            sqlx::query(
                r#"
                UPDATE exercise_sets
                SET weight = ?, reps_completed = ?, rir = ?, completed = 1
                WHERE day_exercise_id = ? AND number = ?
                "#,
            )
            .bind(weight)
            .bind(reps as i64)
            .bind(rir.unwrap_or(target.rir) as i64)
            .bind(&ex.id)
            .bind(target.number as i64)
            .execute(pool)
            .await?;

            println!(
                "{} {} set {} — {}kg × {}",
                "ok:".green().bold(),
                ex.name,
                target.number,
                weight,
                reps
            );
        }

        SessionCmd::Complete => {
            let Some((run, day)) = todays_training(pool).await? else {
                return Ok(());
            };
            if day.completed {
                println!("{} today's session is already completed", "error:".red().bold());
                return Ok(());
            }

            let open: usize = day
                .exercises
                .iter()
                .map(|e| e.sets.iter().filter(|s| !s.completed).count())
                .sum();
            if open > 0 {
                println!(
                    "{} {} sets still unlogged — log them before completing",
                    "error:".red().bold(),
                    open
                );
                return Ok(());
            }

            let outcome = storage::complete_day(pool, &run.id, &day.id).await?;
            println!(
                "{} session of {} completed",
                "ok:".green().bold(),
                outcome.date
            );
            if outcome.run_completed {
                println!(
                    "{} `{}` is done — every training day finished 🏁",
                    "Mesocycle complete:".green().bold(),
                    run.plan.name.bold()
                );
            }
        }
    }
    Ok(())
}

/// Today's realized training day, or a printed explanation of why there is
/// none (no run, future start, rest day, span over).
async fn todays_training(pool: &SqlitePool) -> Result<Option<(MesocycleRun, TrainingDay)>> {
    let today = chrono::Local::now().date_naive();
    let run = storage::active_run(pool).await?;

    let position = match schedule::run_state(run.as_ref(), today)? {
        RunState::NotFound => {
            println!("{} no active run — start one with `run start`", "error:".red().bold());
            None
        }
        RunState::StartsInTheFuture { start } => {
            println!(
                "{} the run starts {} — nothing to train yet",
                "info:".blue().bold(),
                start
            );
            None
        }
        RunState::Started { resolution: Resolution::OutOfRange, .. } => {
            println!("{} the run span is over — start a new run", "info:".blue().bold());
            None
        }
        RunState::Started { resolution: Resolution::InRange(pos), slot: None, .. } => {
            println!(
                "{} rest day (M{} day {}) — nothing scheduled",
                "info:".blue().bold(),
                pos.microcycle,
                pos.day
            );
            None
        }
        RunState::Started { resolution: Resolution::InRange(pos), slot: Some(_), .. } => Some(pos),
    };
    let Some(pos) = position else {
        return Ok(None);
    };
    let Some(run) = run else {
        return Ok(None);
    };

    match storage::training_day(pool, &run.id, pos.microcycle, pos.day).await? {
        Some(day) => Ok(Some((run, day))),
        None => {
            println!(
                "{} no realized training day at M{} slot {}",
                "error:".red().bold(),
                pos.microcycle,
                pos.day
            );
            Ok(None)
        }
    }
}
