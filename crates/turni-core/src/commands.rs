use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, info, instrument, warn};

use crate::calendar::{day_for, jump_to_month, month_grid, week_schedule};
use crate::cli::{Command, DateArg, MonthArgs, SetDayArgs};
use crate::clock::parse_date_expr;
use crate::config::Config;
use crate::format::format_date_range;
use crate::hours::{format_duration, week_hours};
use crate::locale::{Caption, CalendarLabels};
use crate::render::Renderer;
use crate::schedule::{AnalysisEntry, DaySchedule, merge_days};
use crate::store::HistoryStore;
use crate::summary::WeekSummary;

/// Everything a command needs; `now` is the local wall-clock time read once
/// at startup.
pub struct CommandContext<'a> {
    pub store: &'a HistoryStore,
    pub cfg: &'a Config,
    pub renderer: &'a mut Renderer,
    pub labels: &'static dyn CalendarLabels,
    pub now: NaiveDateTime,
}

#[instrument(skip(ctx, command))]
pub fn dispatch(ctx: &mut CommandContext<'_>, command: Option<Command>) -> anyhow::Result<()> {
    let command = command.unwrap_or(Command::Week(DateArg::default()));
    debug!(?command, now = %ctx.now, "dispatching command");

    match command {
        Command::Week(arg) => cmd_week(ctx, &arg),
        Command::Month(arg) => cmd_month(ctx, &arg),
        Command::Day { date } => cmd_day(ctx, &date),
        Command::Range(arg) => cmd_range(ctx, &arg),
        Command::Hours(arg) => cmd_hours(ctx, &arg),
        Command::Summary(arg) => cmd_summary(ctx, &arg),
        Command::Import { file } => cmd_import(ctx, &file),
        Command::History => cmd_history(ctx),
        Command::Delete { id } => cmd_delete(ctx, id),
        Command::SetDay(args) => cmd_set_day(ctx, args),
        Command::Export { id } => cmd_export(ctx, id),
        Command::Config => cmd_config(ctx),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn resolve_date(ctx: &CommandContext<'_>, raw: Option<&str>) -> anyhow::Result<NaiveDate> {
    let today = ctx.now.date();
    match raw {
        Some(expr) => parse_date_expr(expr, today),
        None => Ok(today),
    }
}

fn all_days(ctx: &CommandContext<'_>) -> anyhow::Result<Vec<DaySchedule>> {
    let entries = ctx.store.load()?;
    Ok(merge_days(&entries))
}

fn load_week(ctx: &CommandContext<'_>, arg: &DateArg) -> anyhow::Result<Vec<DaySchedule>> {
    let date = resolve_date(ctx, arg.date.as_deref())?;
    let days = all_days(ctx)?;
    Ok(week_schedule(date, &days))
}

fn cmd_week(ctx: &mut CommandContext<'_>, arg: &DateArg) -> anyhow::Result<()> {
    let week = load_week(ctx, arg)?;
    ctx.renderer.print_week(&week, ctx.labels, ctx.now)
}

/// The anchor date for `month`: DATE, moved to `--month`/`--year` when
/// given, keeping the day clamped to the target month.
fn month_anchor(date: NaiveDate, args: &MonthArgs) -> NaiveDate {
    if args.month.is_none() && args.year.is_none() {
        return date;
    }
    jump_to_month(
        date,
        args.year.unwrap_or(date.year()),
        args.month.unwrap_or(date.month()),
    )
}

fn cmd_month(ctx: &mut CommandContext<'_>, arg: &MonthArgs) -> anyhow::Result<()> {
    let date = month_anchor(resolve_date(ctx, arg.date.as_deref())?, arg);
    let days = all_days(ctx)?;
    let grid = month_grid(date);
    ctx.renderer.print_month(&grid, &days, ctx.labels, ctx.now)
}

fn cmd_day(ctx: &mut CommandContext<'_>, raw: &str) -> anyhow::Result<()> {
    let date = resolve_date(ctx, Some(raw))?;
    let days = all_days(ctx)?;
    let day = day_for(&days, date)
        .cloned()
        .unwrap_or_else(|| DaySchedule::empty(date));
    ctx.renderer.print_day(&day, ctx.labels, ctx.now)
}

fn cmd_range(ctx: &mut CommandContext<'_>, arg: &DateArg) -> anyhow::Result<()> {
    let date = resolve_date(ctx, arg.date.as_deref())?;
    println!("{}", format_date_range(date, ctx.labels));
    Ok(())
}

fn cmd_hours(ctx: &mut CommandContext<'_>, arg: &DateArg) -> anyhow::Result<()> {
    let week = load_week(ctx, arg)?;
    println!("{}", format_duration(week_hours(&week)));
    Ok(())
}

fn cmd_summary(ctx: &mut CommandContext<'_>, arg: &DateArg) -> anyhow::Result<()> {
    let week = load_week(ctx, arg)?;
    let summary = WeekSummary::from_days(&week);
    println!("{}", summary.describe(ctx.labels));
    if summary.uncertain_days > 0 {
        warn!(days = summary.uncertain_days, "week contains days flagged for review");
    }
    Ok(())
}

#[instrument(skip(ctx))]
fn cmd_import(ctx: &mut CommandContext<'_>, file: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;

    let id = ctx.now.and_utc().timestamp_millis();
    let mut entry = AnalysisEntry::from_json(&raw, id, ctx.labels)
        .with_context(|| format!("failed to import {}", file.display()))?;
    if entry.summary.is_empty() {
        entry.summary = WeekSummary::from_days(&entry.schedule).describe(ctx.labels);
    }

    let stored = ctx.store.add(entry)?;
    info!(id = stored.id, range = %stored.date_range, "imported schedule");
    println!(
        "{} {} ({})",
        ctx.labels.caption(Caption::Imported),
        stored.id,
        stored.date_range
    );

    let review: Vec<String> = stored
        .schedule
        .iter()
        .filter(|day| day.needs_review())
        .map(|day| day.date.to_string())
        .collect();
    if !review.is_empty() {
        println!("{}: {}", ctx.labels.caption(Caption::NeedsReview), review.join(", "));
    }
    Ok(())
}

fn cmd_history(ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
    let entries = ctx.store.load()?;
    ctx.renderer.print_history(&entries, ctx.labels)
}

fn cmd_delete(ctx: &mut CommandContext<'_>, id: i64) -> anyhow::Result<()> {
    if !ctx.store.delete(id)? {
        return Err(anyhow!("history entry not found: {id}"));
    }
    println!("{} {id}", ctx.labels.caption(Caption::Deleted));
    Ok(())
}

#[instrument(skip(ctx, args), fields(entry = args.entry, date = %args.date))]
fn cmd_set_day(ctx: &mut CommandContext<'_>, args: SetDayArgs) -> anyhow::Result<()> {
    let date = resolve_date(ctx, Some(&args.date))?;

    let mut day = if args.empty {
        DaySchedule::empty(date)
    } else if args.rest {
        DaySchedule::rest(date)
    } else {
        DaySchedule::empty(date).with_shifts(args.shifts)
    };
    day.is_uncertain = args.uncertain;
    let day = day.normalized();

    let updated = ctx.store.update_day(args.entry, day.clone())?;
    info!(entry = updated.id, kind = %day.kind, "updated day");
    ctx.renderer.print_day(&day, ctx.labels, ctx.now)
}

fn cmd_export(ctx: &mut CommandContext<'_>, id: i64) -> anyhow::Result<()> {
    let entry = ctx
        .store
        .get(id)?
        .ok_or_else(|| anyhow!("history entry not found: {id}"))?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

fn cmd_config(ctx: &mut CommandContext<'_>) -> anyhow::Result<()> {
    for (key, value) in ctx.cfg.entries() {
        println!("{key}={value}");
    }
    for file in &ctx.cfg.loaded_files {
        println!("# loaded {}", file.display());
    }
    Ok(())
}
