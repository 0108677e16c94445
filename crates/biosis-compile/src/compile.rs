//! Orchestration across surfaces.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use biosis_core::{Registry, RegisteredFunction, Surface};
use biosis_store::unit_file;

use crate::deck::{DeckApp, DeckCompiler, DeckSettings};
use crate::error::{CompileError, Result};
use crate::launcher::CompileContext;
use crate::schedule::{ScheduleCompiler, Schtasks};
use crate::voice::VoiceCompiler;

/// Turns the canonical entries of one surface into that surface's external
/// artifact. Compiling twice with the same entries leaves the same state as
/// compiling once.
pub trait SurfaceCompiler {
    fn surface(&self) -> Surface;

    fn compile(&mut self, ctx: &CompileContext, entries: &[RegisteredFunction]) -> Result<()>;
}

/// The real compilers for every surface, optionally limited to `only`.
pub fn standard_compilers(deck: DeckSettings, only: &[Surface]) -> Vec<Box<dyn SurfaceCompiler>> {
    let all: Vec<Box<dyn SurfaceCompiler>> = vec![
        Box::new(DeckCompiler::new(deck, DeckApp::default())),
        Box::new(ScheduleCompiler::new(Schtasks)),
        Box::new(VoiceCompiler::new()),
    ];
    all.into_iter()
        .filter(|c| only.is_empty() || only.contains(&c.surface()))
        .collect()
}

/// Print the shared per-function block every compiler starts with.
pub fn print_function_header(ctx: &CompileContext, index: usize, entry: &RegisteredFunction) {
    let header = &entry.header;
    let pad = " ".repeat(index.to_string().len());
    let description = header.description.trim();
    let description = if description.is_empty() {
        String::new()
    } else {
        format!(" - {description}")
    };
    println!(
        "\t\t{index}) Compiling: {}{description}",
        header.title.replace('\n', " ")
    );
    println!(
        "\t\t{pad}  Executes: {} from file://{}",
        entry.address(),
        unit_file(&ctx.root, &entry.module_path).display()
    );
    println!(
        "\t\t{pad}  Settings: show={}, pause={}",
        header.show, header.pause
    );
    println!("\t\t{pad}  {}", "-".repeat(80));
}

pub(crate) fn print_key(key: &str, value: impl fmt::Display) {
    println!("\t\t\t{key}: {value}");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOutcome {
    Compiled,
    /// The surface cannot run on this machine.
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SurfaceReport {
    pub surface: Surface,
    pub functions: usize,
    pub outcome: SurfaceOutcome,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    pub surfaces: Vec<SurfaceReport>,
    pub function_count: usize,
    pub elapsed: Duration,
}

impl CompileReport {
    pub fn has_failures(&self) -> bool {
        self.surfaces
            .iter()
            .any(|s| matches!(s.outcome, SurfaceOutcome::Failed(_)))
    }

    pub fn outcome(&self, surface: Surface) -> Option<&SurfaceOutcome> {
        self.surfaces
            .iter()
            .find(|s| s.surface == surface)
            .map(|s| &s.outcome)
    }
}

impl fmt::Display for CompileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Finished Compiling in {:.1} Seconds. There were {} Surfaces with {} Functions: ",
            self.elapsed.as_secs_f32(),
            self.surfaces.len(),
            self.function_count
        )?;
        let counts: Vec<String> = self
            .surfaces
            .iter()
            .map(|s| format!("{}: {}", s.surface, s.functions))
            .collect();
        write!(f, "{}.", counts.join(", "))?;
        for s in &self.surfaces {
            match &s.outcome {
                SurfaceOutcome::Compiled => {}
                SurfaceOutcome::Skipped(why) => write!(f, "\n  {} skipped: {why}", s.surface)?,
                SurfaceOutcome::Failed(why) => write!(f, "\n  {} FAILED: {why}", s.surface)?,
            }
        }
        Ok(())
    }
}

/// Reconcile once, then run every compiler on its surface's entries.
///
/// Surfaces run by descending `priority`, then in order of first
/// registration, then in the order given. One surface failing does not stop
/// the others. A name collision fails before any surface runs.
pub fn compile_all(
    registry: &Registry,
    compilers: &mut [Box<dyn SurfaceCompiler>],
    ctx: &CompileContext,
    priority: &HashMap<Surface, u32>,
) -> Result<CompileReport> {
    let reconciled = registry.reconcile()?;
    let mut groups = reconciled.by_surface();

    let mut order: Vec<usize> = (0..compilers.len()).collect();
    order.sort_by_key(|&i| {
        let surface = compilers[i].surface();
        (
            Reverse(priority.get(&surface).copied()),
            groups.get_index_of(&surface).unwrap_or(usize::MAX),
            i,
        )
    });

    println!("Compiling {} Surface(s)", compilers.len());
    let started = Instant::now();
    let mut report = CompileReport {
        function_count: reconciled.function_count(),
        ..CompileReport::default()
    };

    for i in order {
        let compiler = &mut compilers[i];
        let surface = compiler.surface();
        let entries = groups.swap_remove(&surface).unwrap_or_default();
        println!("\t{surface}: {} Function(s)", entries.len());
        tracing::info!("compiling {surface} ({} entries)", entries.len());

        let surface_started = Instant::now();
        let outcome = match compiler.compile(ctx, &entries) {
            Ok(()) => SurfaceOutcome::Compiled,
            Err(CompileError::Environment { message, hint }) => {
                println!("Could not load {surface} compiler due to: {message} ({hint})");
                tracing::warn!("{surface} skipped: {message}");
                SurfaceOutcome::Skipped(message)
            }
            Err(e) => {
                tracing::error!("{surface} compile failed: {e}");
                SurfaceOutcome::Failed(e.to_string())
            }
        };
        println!();
        report.surfaces.push(SurfaceReport {
            surface,
            functions: entries.len(),
            outcome,
            elapsed: surface_started.elapsed(),
        });
    }

    report.elapsed = started.elapsed();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use biosis_core::{Deck, Function, Meta, Schedule, Voice};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Probe {
        surface: Surface,
        seen: Rc<RefCell<Vec<(Surface, Vec<String>)>>>,
        result: fn() -> Result<()>,
    }

    impl SurfaceCompiler for Probe {
        fn surface(&self) -> Surface {
            self.surface
        }

        fn compile(&mut self, _ctx: &CompileContext, entries: &[RegisteredFunction]) -> Result<()> {
            self.seen.borrow_mut().push((
                self.surface,
                entries.iter().map(|e| e.header.title.clone()).collect(),
            ));
            (self.result)()
        }
    }

    fn ok() -> Result<()> {
        Ok(())
    }

    fn env() -> Result<()> {
        Err(CompileError::environment("not here", "go elsewhere"))
    }

    fn broken() -> Result<()> {
        Err(CompileError::MissingFolder {
            folder: "Nope".into(),
            function: "m.f".into(),
        })
    }

    fn probes(
        spec: &[(Surface, fn() -> Result<()>)],
    ) -> (Vec<Box<dyn SurfaceCompiler>>, Rc<RefCell<Vec<(Surface, Vec<String>)>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let compilers = spec
            .iter()
            .map(|&(surface, result)| {
                Box::new(Probe {
                    surface,
                    seen: seen.clone(),
                    result,
                }) as Box<dyn SurfaceCompiler>
            })
            .collect();
        (compilers, seen)
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(
            "m",
            Function::new("f", || Ok(()))
                .with(Voice::new("eff").unwrap())
                .with(Deck::at("1,1").unwrap())
                .with(Meta::new().title("Canonical")),
        );
        registry.register(
            "m",
            Function::new("g", || Ok(())).with(Schedule::daily_at("08:00").unwrap()),
        );
        registry
    }

    fn ctx() -> CompileContext {
        CompileContext::new("/tmp/biosis-root", "biosis")
    }

    #[test]
    fn surfaces_get_canonical_entries_in_registration_order() {
        let (mut compilers, seen) = probes(&[
            (Surface::Deck, ok),
            (Surface::Schedule, ok),
            (Surface::Voice, ok),
        ]);
        let report = compile_all(&registry(), &mut compilers, &ctx(), &HashMap::new()).unwrap();
        let seen = seen.borrow();
        let order: Vec<_> = seen.iter().map(|(s, _)| *s).collect();
        assert_eq!(order, vec![Surface::Voice, Surface::Deck, Surface::Schedule]);
        assert_eq!(seen[0].1, vec!["Canonical"]);
        assert_eq!(seen[1].1, vec!["Canonical"]);
        assert_eq!(report.function_count, 2);
        assert!(!report.has_failures());
    }

    #[test]
    fn priority_runs_first() {
        let (mut compilers, seen) = probes(&[(Surface::Voice, ok), (Surface::Schedule, ok)]);
        let priority = HashMap::from([(Surface::Schedule, 5)]);
        compile_all(&registry(), &mut compilers, &ctx(), &priority).unwrap();
        assert_eq!(seen.borrow()[0].0, Surface::Schedule);
    }

    #[test]
    fn surfaces_are_independent() {
        let (mut compilers, seen) = probes(&[
            (Surface::Voice, broken),
            (Surface::Deck, env),
            (Surface::Schedule, ok),
        ]);
        let report = compile_all(&registry(), &mut compilers, &ctx(), &HashMap::new()).unwrap();
        assert_eq!(seen.borrow().len(), 3);
        assert!(matches!(
            report.outcome(Surface::Voice),
            Some(SurfaceOutcome::Failed(_))
        ));
        assert!(matches!(
            report.outcome(Surface::Deck),
            Some(SurfaceOutcome::Skipped(_))
        ));
        assert_eq!(report.outcome(Surface::Schedule), Some(&SurfaceOutcome::Compiled));
        assert!(report.has_failures());
        assert!(report.to_string().contains("voice FAILED"));
    }

    #[test]
    fn unused_surface_still_compiles_empty() {
        let mut registry = Registry::new();
        registry.register("m", Function::new("f", || Ok(())).with(Meta::new()));
        let (mut compilers, seen) = probes(&[(Surface::Schedule, ok)]);
        compile_all(&registry, &mut compilers, &ctx(), &HashMap::new()).unwrap();
        assert_eq!(seen.borrow()[0], (Surface::Schedule, vec![]));
    }

    #[test]
    fn standard_compilers_filter() {
        assert_eq!(standard_compilers(DeckSettings::default(), &[]).len(), 3);
        let only = standard_compilers(DeckSettings::default(), &[Surface::Voice]);
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].surface(), Surface::Voice);
    }

    #[test]
    fn name_collision_stops_before_any_surface() {
        let mut registry = Registry::new();
        registry.register("a", Function::new("f", || Ok(())).with(Voice::new("x").unwrap()));
        registry.register("b", Function::new("f", || Ok(())).with(Voice::new("y").unwrap()));
        let (mut compilers, seen) = probes(&[(Surface::Voice, ok)]);
        let err = compile_all(&registry, &mut compilers, &ctx(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, CompileError::Reconcile(_)));
        assert!(seen.borrow().is_empty());
    }
}
