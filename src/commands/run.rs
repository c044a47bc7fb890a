use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    cli::RunCmd,
    schedule::{self, Resolution, RunState},
    storage,
    types::{OutputFmt, emit},
};

use super::plan::resolve_or_suggest;

#[derive(Serialize)]
struct StatusJson {
    state: &'static str,
    date: NaiveDate,
    plan: Option<String>,
    microcycle: Option<u32>,
    day: Option<u32>,
    training_day: Option<u32>,
    label: Option<String>,
}

pub async fn handle(cmd: RunCmd, pool: &SqlitePool, fmt: OutputFmt) -> Result<()> {
    match cmd {
        RunCmd::Start(args) => {
            // One active run at a time.
            if let Some(run) = storage::active_run(pool).await? {
                println!(
                    "{} a run of `{}` is already active (started {})",
                    "error:".red().bold(),
                    run.plan.name,
                    run.start_date
                );
                return Ok(());
            }

            let Some(plan_id) = resolve_or_suggest(pool, &args.plan).await? else {
                return Ok(());
            };
            let plan = storage::load_plan(pool, &plan_id).await?;
            let start = args.date.unwrap_or_else(|| chrono::Local::now().date_naive());

            let run = storage::create_run(pool, &plan, start).await?;
            println!(
                "{} started `{}` — {} to {} ({} microcycles × {} days)",
                "ok:".green().bold(),
                plan.name.bold(),
                run.start_date,
                run.end_date,
                plan.microcycle_count,
                plan.microcycle_length
            );
        }

        RunCmd::Status { date } => {
            let today = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let run = storage::active_run(pool).await?;

            match schedule::run_state(run.as_ref(), today)? {
                RunState::NotFound => {
                    emit(fmt, &status_json("not-found", today, None), || {
                        println!("{} no active run — start one with `run start`", "info:".blue().bold());
                    });
                }

                RunState::StartsInTheFuture { start } => {
                    let Some(run) = run.as_ref() else { return Ok(()) };
                    let mut js = status_json("starts-in-the-future", today, Some(run.plan.name.as_str()));
                    js.date = start;
                    emit(fmt, &js, || {
                        println!(
                            "{} `{}` starts {} — nothing scheduled yet",
                            "info:".blue().bold(),
                            run.plan.name.bold(),
                            start
                        );
                    });
                }

                RunState::Started { resolution, slot, training_ordinal } => {
                    let Some(run) = run.as_ref() else { return Ok(()) };
                    match resolution {
                        Resolution::OutOfRange => {
                            emit(fmt, &status_json("ended", today, Some(run.plan.name.as_str())), || {
                                println!(
                                    "{} `{}` ended {} — abandon it or start a new run",
                                    "info:".blue().bold(),
                                    run.plan.name.bold(),
                                    run.end_date
                                );
                            });
                        }
                        Resolution::InRange(pos) => {
                            let mut js = status_json("started", today, Some(run.plan.name.as_str()));
                            js.microcycle = Some(pos.microcycle);
                            js.day = Some(pos.day);
                            js.training_day = training_ordinal;
                            js.label = slot.map(|t| t.label.clone());
                            emit(fmt, &js, || {
                                let where_at = format!(
                                    "M{}/{} day {}/{}",
                                    pos.microcycle,
                                    run.plan.microcycle_count,
                                    pos.day,
                                    run.plan.microcycle_length
                                );
                                match (slot, training_ordinal) {
                                    (Some(t), Some(n)) => println!(
                                        "{} {} — {} ({}): `session show` to train",
                                        "Today:".cyan().bold(),
                                        where_at,
                                        t.label.green().bold(),
                                        format!("day {n}").dimmed()
                                    ),
                                    _ => println!(
                                        "{} {} — {}",
                                        "Today:".cyan().bold(),
                                        where_at,
                                        "rest day".dimmed()
                                    ),
                                }
                            });
                        }
                    }
                }
            }
        }

        RunCmd::Abandon => {
            match storage::active_run(pool).await? {
                Some(run) => {
                    storage::abandon_run(pool, &run.id).await?;
                    println!(
                        "{} abandoned run of `{}`",
                        "ok:".green().bold(),
                        run.plan.name
                    );
                }
                None => println!("{} no active run to abandon", "error:".red().bold()),
            }
        }
    }
    Ok(())
}

fn status_json(state: &'static str, date: NaiveDate, plan: Option<&str>) -> StatusJson {
    StatusJson {
        state,
        date,
        plan: plan.map(str::to_string),
        microcycle: None,
        day: None,
        training_day: None,
        label: None,
    }
}
