//! Scheduled tasks.
//!
//! Every compile is a full replace: all tasks carrying [`TASK_PREFIX`] and
//! all previously generated launchers are removed before anything new is
//! installed.

use std::collections::HashMap;

use biosis_core::{Carrier, RegisteredFunction, Schedule, Surface, When};
use chrono::{Local, NaiveDateTime, TimeDelta};

use crate::command::{DEFAULT_TIMEOUT, run_command};
use crate::compile::{SurfaceCompiler, print_function_header, print_key};
use crate::error::{CompileError, Result, require_windows};
use crate::files::clear_dir;
use crate::launcher::CompileContext;

pub const TASK_PREFIX: &str = "BIOSIS_";

/// Minutes added to the compile time for `start = "now"`.
const START_NOW_DELAY: i64 = 2;

const ACCESS_DENIED: &str = "Access is denied";

/// A task ready to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: String,
    /// Command the scheduler runs.
    pub action: String,
    /// `(flag, value)` pairs such as `("/sc", "daily")`.
    pub flags: Vec<(&'static str, String)>,
}

/// The host task scheduler.
pub trait TaskScheduler {
    /// Fails with [`CompileError::Environment`] when this backend cannot run
    /// here.
    fn available(&self) -> Result<()> {
        Ok(())
    }

    fn list_tasks(&mut self) -> Result<Vec<String>>;

    fn delete_task(&mut self, name: &str) -> Result<()>;

    fn create_task(&mut self, task: &TaskSpec) -> Result<()>;
}

/// Scheduler flags for a schedule carrier. `now` resolves against `now`.
pub fn task_flags(schedule: &Schedule, now: NaiveDateTime) -> Vec<(&'static str, String)> {
    let split = |when: &Option<When>| -> (Option<String>, Option<String>) {
        match when {
            None => (None, None),
            Some(When::Now) => {
                let at = now + TimeDelta::minutes(START_NOW_DELAY);
                (
                    Some(at.format("%Y/%m/%d").to_string()),
                    Some(at.format("%H:%M").to_string()),
                )
            }
            Some(When::At { date, time }) => (date.clone(), time.clone()),
        }
    };
    let (start_date, start_time) = split(&schedule.start);
    let (end_date, end_time) = split(&schedule.end);

    let candidates = [
        ("/sc", Some(schedule.trigger().as_str().to_string())),
        ("/mo", schedule.modifier.clone()),
        ("/sd", start_date),
        ("/st", start_time),
        ("/ed", end_date),
        ("/et", end_time),
        ("/m", schedule.month.clone()),
        ("/d", schedule.day.clone()),
        ("/i", schedule.idle_minutes().map(|i| i.to_string())),
    ];
    candidates
        .into_iter()
        .filter_map(|(flag, value)| value.map(|v| (flag, v)))
        .collect()
}

pub struct ScheduleCompiler<S> {
    scheduler: S,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl<S: TaskScheduler> ScheduleCompiler<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            clock: local_now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Delete every task this tool installed plus the old launchers.
    pub fn clear(&mut self, ctx: &CompileContext) -> Result<()> {
        let owned: Vec<String> = self
            .scheduler
            .list_tasks()?
            .into_iter()
            .filter(|name| name.starts_with(TASK_PREFIX))
            .collect();
        for name in &owned {
            self.scheduler.delete_task(name)?;
            tracing::info!("deleted task {name}");
        }
        clear_dir(&ctx.surface_dir(Surface::Schedule))?;
        Ok(())
    }
}

impl<S: TaskScheduler> SurfaceCompiler for ScheduleCompiler<S> {
    fn surface(&self) -> Surface {
        Surface::Schedule
    }

    fn compile(&mut self, ctx: &CompileContext, entries: &[RegisteredFunction]) -> Result<()> {
        self.scheduler.available()?;
        self.clear(ctx)?;

        let now = (self.clock)();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            let Carrier::Schedule(schedule) = &entry.carrier else {
                continue;
            };
            let count = seen.entry(entry.name.as_str()).or_insert(0);
            *count += 1;
            let name = if *count == 1 {
                format!("{TASK_PREFIX}{}", entry.name)
            } else {
                format!("{TASK_PREFIX}{}_{count}", entry.name)
            };

            let flags = task_flags(schedule, now);
            print_function_header(ctx, i, entry);
            print_key("Task", &name);
            for (flag, value) in &flags {
                print_key(flag, value);
            }
            println!();

            let action = ctx.write_launcher(Surface::Schedule, entry)?;
            let task = TaskSpec {
                name,
                action,
                flags,
            };
            self.scheduler.create_task(&task)?;
            tracing::info!("installed task {}", task.name);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// schtasks
// ---------------------------------------------------------------------------

/// Windows Task Scheduler through `schtasks.exe`.
#[derive(Debug, Default, Clone)]
pub struct Schtasks;

impl Schtasks {
    const EXE: &'static str = "schtasks";

    fn run(&self, args: &[String]) -> Result<crate::command::CommandOutput> {
        let output = run_command(Self::EXE, args, DEFAULT_TIMEOUT)?;
        if output.stderr.contains(ACCESS_DENIED) {
            return Err(CompileError::AccessDenied {
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Task names from `schtasks /query /fo CSV /nh` output, without the
/// leading backslash.
pub fn parse_task_list(csv: &str) -> Vec<String> {
    csv.lines()
        .filter_map(|line| line.split(',').next())
        .map(|field| field.trim().trim_matches('"').trim_start_matches('\\').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

impl TaskScheduler for Schtasks {
    fn available(&self) -> Result<()> {
        require_windows("the task scheduler")
    }

    fn list_tasks(&mut self) -> Result<Vec<String>> {
        let output = self.run(&strings(&["/query", "/fo", "CSV", "/nh"]))?;
        Ok(parse_task_list(&output.stdout))
    }

    fn delete_task(&mut self, name: &str) -> Result<()> {
        let output = self.run(&strings(&["/delete", "/f", "/tn", name]))?;
        if output.success {
            Ok(())
        } else {
            Err(CompileError::Command {
                program: Self::EXE.to_string(),
                message: output.stderr.trim().to_string(),
            })
        }
    }

    fn create_task(&mut self, task: &TaskSpec) -> Result<()> {
        let mut args = strings(&["/create", "/tn", &task.name, "/tr", &task.action, "/f"]);
        for (flag, value) in &task.flags {
            args.push(flag.to_string());
            args.push(value.clone());
        }
        let output = self.run(&args)?;
        if output.stdout.trim_start().starts_with("SUCCESS") {
            Ok(())
        } else {
            let message = if output.stderr.trim().is_empty() {
                output.stdout.trim().to_string()
            } else {
                output.stderr.trim().to_string()
            };
            Err(CompileError::TaskInstall {
                task: task.name.clone(),
                message,
            })
        }
    }
}
