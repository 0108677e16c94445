use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::carrier::{Carrier, Surface};
use crate::constants::ADDRESS_SEPARATOR;
use crate::header::{Header, Meta};

type ActionFn = dyn Fn(&[String]) -> anyhow::Result<()> + Send + Sync;

/// The opaque callable behind a registered function.
#[derive(Clone)]
pub struct Action(Arc<ActionFn>);

impl Action {
    /// An action that ignores any arguments it is called with.
    pub fn new(f: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static) -> Self {
        Self(Arc::new(move |_: &[String]| f()))
    }

    /// An action that receives trailing arguments, such as the words spoken
    /// after a voice phrase.
    pub fn with_args(f: impl Fn(&[String]) -> anyhow::Result<()> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Call the action without isolation. Prefer [`RegisteredFunction::invoke`].
    pub fn call(&self) -> anyhow::Result<()> {
        (self.0)(&[])
    }

    pub fn call_with(&self, args: &[String]) -> anyhow::Result<()> {
        (self.0)(args)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

/// A function declaration: the callable plus the carriers applied to it, in
/// application order (the first carrier sits closest to the function).
#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    pub doc: Option<String>,
    pub action: Action,
    pub carriers: Vec<Carrier>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        f: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::from_action(name, Action::new(f))
    }

    pub fn from_action(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            doc: None,
            action,
            carriers: Vec::new(),
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Apply one more carrier on the outside of the stack.
    pub fn with(mut self, carrier: impl Into<Carrier>) -> Self {
        self.carriers.push(carrier.into());
        self
    }

    /// Fold the carrier stack into one log entry per carrier.
    ///
    /// Base carriers accumulate (outer fields override inner ones) and every
    /// entry carries the base attributes applied at or below it. A function
    /// with no carriers still yields one base entry so it stays addressable.
    pub fn fold(&self, module_path: &str) -> Vec<RegisteredFunction> {
        let implicit = [Carrier::Meta(Meta::new())];
        let carriers = if self.carriers.is_empty() {
            &implicit[..]
        } else {
            &self.carriers[..]
        };
        let mut inherited = Meta::default();
        carriers
            .iter()
            .map(|carrier| {
                if let Carrier::Meta(meta) = carrier {
                    inherited = inherited.overlay(meta);
                }
                RegisteredFunction {
                    name: self.name.clone(),
                    module_path: module_path.to_string(),
                    header: inherited.resolve(&self.name, self.doc.as_deref()),
                    carrier: carrier.clone(),
                    action: self.action.clone(),
                }
            })
            .collect()
    }
}

/// One entry of the registry log.
#[derive(Clone, Debug)]
pub struct RegisteredFunction {
    pub name: String,
    pub module_path: String,
    pub header: Header,
    /// The carrier that produced this entry; holds the surface payload.
    pub carrier: Carrier,
    pub action: Action,
}

impl RegisteredFunction {
    pub fn surface(&self) -> Option<Surface> {
        self.carrier.surface()
    }

    /// Dot-syntax address: `module.path.name`.
    pub fn address(&self) -> String {
        if self.module_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}{ADDRESS_SEPARATOR}{}", self.module_path, self.name)
        }
    }

    /// Call the function with failure isolation: errors and panics are
    /// reported through `alert` and never escape.
    pub fn invoke(&self, alert: &dyn Alert) -> Outcome {
        self.invoke_with(alert, &[])
    }

    /// [`RegisteredFunction::invoke`] with trailing arguments.
    pub fn invoke_with(&self, alert: &dyn Alert, args: &[String]) -> Outcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.action.call_with(args)));
        let message = match result {
            Ok(Ok(())) => return Outcome::Completed,
            Ok(Err(e)) => format!("{e:#}"),
            Err(payload) => panic_message(payload.as_ref()),
        };
        let title = format!(
            "Biosis Function {} Failed",
            self.header.title.replace('\n', " ")
        );
        tracing::error!("{} ({}): {message}", title, self.address());
        alert.raise(&title, &message);
        Outcome::Failed(message)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Result of an isolated invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed(String),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

/// Out-of-band channel used to tell the user an action failed.
pub trait Alert {
    fn raise(&self, title: &str, detail: &str);
}

/// Rings the terminal bell twice and prints a banner on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalAlert;

impl Alert for TerminalAlert {
    fn raise(&self, title: &str, detail: &str) {
        let rule = "=".repeat(30);
        eprintln!("\x07\x07{title}\n{rule}\n{detail}\n{rule}");
    }
}
