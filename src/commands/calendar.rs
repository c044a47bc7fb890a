use std::collections::HashSet;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use colored::Colorize;
use itertools::Itertools;
use sqlx::SqlitePool;

use crate::{
    schedule::{self, CalendarScope},
    storage,
    types::{OutputFmt, emit},
};

pub async fn handle(
    pool: &SqlitePool,
    fmt: OutputFmt,
    full: bool,
    date: Option<NaiveDate>,
) -> Result<()> {
    let Some(run) = storage::active_run(pool).await? else {
        println!("{} no active run — start one with `run start`", "error:".red().bold());
        return Ok(());
    };

    let query = date.unwrap_or_else(|| chrono::Local::now().date_naive());
    let scope = if full {
        CalendarScope::FullRun
    } else {
        CalendarScope::Microcycle
    };

    let cells = schedule::build_calendar(&run.plan, run.start_date, query, scope)?;

    // Completed training days, for the checkmark overlay.
    let done: HashSet<(u32, u32)> = sqlx::query_as::<_, (i64, i64)>(
        "SELECT microcycle, slot_position FROM run_days WHERE run_id = ? AND completed = 1",
    )
    .bind(&run.id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(m, p)| (m as u32, p as u32))
    .collect();

    emit(fmt, &cells, || {
        println!(
            "\n{} {} — {} to {}",
            run.plan.name.bold().cyan(),
            format!(
                "({} microcycles × {} days)",
                run.plan.microcycle_count, run.plan.microcycle_length
            )
            .dimmed(),
            run.start_date,
            run.end_date
        );

        for (microcycle, row) in &cells.iter().chunk_by(|c| c.position.microcycle) {
            let row: Vec<_> = row.collect();
            print!("{} ", format!("M{}", microcycle).bold());
            for cell in &row {
                let text = format!("{:>2}/{:<2}", cell.date.day(), cell.date.month());
                let text = if done.contains(&(cell.position.microcycle, cell.position.day)) {
                    format!("{text}✓").green().to_string()
                } else if cell.is_training {
                    text.green().bold().to_string()
                } else {
                    text.dimmed().to_string()
                };
                if cell.is_current {
                    print!("[{}] ", text);
                } else {
                    print!(" {}  ", text);
                }
            }
            println!();
        }
        println!(
            "{}",
            "training days green, ✓ completed, [..] today".dimmed()
        );
    });

    Ok(())
}
