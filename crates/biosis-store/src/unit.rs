//! Unit manifest format.
//!
//! A unit is a TOML file under the user root declaring the programs it
//! needs and the functions it contributes:
//!
//! ```toml
//! requires = ["ddcutil"]
//!
//! [[function]]
//! name = "brightness_up"
//! doc = "Raise the brightness of every monitor."
//! run = ["ddcutil", "setvcp", "10", "+", "10"]
//!
//! [[function.carrier]]
//! kind = "deck"
//! location = "Monitors/1,2"
//! image = "sun.png"
//! ```
//!
//! Carriers apply in file order, the first one closest to the function.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use biosis_core::{
    Action, Carrier, Deck, Function, Meta, PhraseSpec, RegistrationError, Schedule, Trigger, Voice,
};
use serde::Deserialize;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitManifest {
    /// Programs that must be on `PATH` for the unit to load.
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default, rename = "function")]
    pub functions: Vec<FunctionSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    /// argv run with the user root as working directory.
    pub run: Vec<String>,
    #[serde(default, rename = "carrier")]
    pub carriers: Vec<CarrierSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CarrierSpec {
    Meta {
        title: Option<String>,
        description: Option<String>,
        show: Option<bool>,
        pause: Option<bool>,
    },
    Deck {
        location: OneOrMany,
        image: Option<String>,
        label: Option<String>,
    },
    Schedule {
        trigger: String,
        modifier: Option<Scalar>,
        start: Option<String>,
        end: Option<String>,
        day: Option<Scalar>,
        month: Option<Scalar>,
        idle: Option<u32>,
    },
    Voice {
        phrase: PhraseForm,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Accepts `modifier = 5` as well as `modifier = "5"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(i64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PhraseForm {
    Single(String),
    Variants(Vec<String>),
    Words(Vec<Vec<String>>),
}

impl From<PhraseForm> for PhraseSpec {
    fn from(form: PhraseForm) -> Self {
        match form {
            PhraseForm::Single(s) => PhraseSpec::Single(s),
            PhraseForm::Variants(v) => PhraseSpec::Variants(v),
            PhraseForm::Words(w) => PhraseSpec::Words(w),
        }
    }
}

impl CarrierSpec {
    pub fn into_carrier(self) -> std::result::Result<Carrier, RegistrationError> {
        Ok(match self {
            CarrierSpec::Meta {
                title,
                description,
                show,
                pause,
            } => Carrier::Meta(Meta {
                title,
                description,
                show,
                pause,
            }),
            CarrierSpec::Deck {
                location,
                image,
                label,
            } => {
                let mut deck = Deck::at_all(location.into_vec())?;
                if let Some(image) = image {
                    deck = deck.icon(&image);
                }
                if let Some(label) = label {
                    deck = deck.label(label);
                }
                Carrier::Deck(deck)
            }
            CarrierSpec::Schedule {
                trigger,
                modifier,
                start,
                end,
                day,
                month,
                idle,
            } => {
                let mut schedule = Schedule::from_parts(trigger.parse::<Trigger>()?, idle)?;
                if let Some(modifier) = modifier {
                    schedule = schedule.modifier(modifier.to_string());
                }
                if let Some(start) = start {
                    schedule = schedule.start(&start)?;
                }
                if let Some(end) = end {
                    schedule = schedule.end(&end)?;
                }
                if let Some(day) = day {
                    schedule = schedule.day(day.to_string());
                }
                if let Some(month) = month {
                    schedule = schedule.month(month.to_string());
                }
                Carrier::Schedule(schedule)
            }
            CarrierSpec::Voice { phrase } => Carrier::Voice(Voice::new(PhraseSpec::from(phrase))?),
        })
    }
}

impl FunctionSpec {
    /// Build the function declaration; `root` becomes the action's working
    /// directory.
    pub fn into_function(self, root: &Path, unit: &str) -> Result<Function> {
        if self.run.is_empty() {
            return Err(StoreError::InvalidUnit {
                unit: unit.to_string(),
                message: format!("function '{}' has an empty `run` command", self.name),
            });
        }
        if self.name.is_empty() || self.name.contains('.') {
            return Err(StoreError::InvalidUnit {
                unit: unit.to_string(),
                message: format!("'{}' is not a valid function name", self.name),
            });
        }

        let mut function = Function::from_action(&self.name, command_action(self.run, root));
        if let Some(doc) = self.doc {
            function = function.doc(doc);
        }
        for spec in self.carriers {
            let carrier = spec
                .into_carrier()
                .map_err(|source| StoreError::Registration {
                    unit: unit.to_string(),
                    function: self.name.clone(),
                    source,
                })?;
            function = function.with(carrier);
        }
        Ok(function)
    }
}

/// Wrap an argv as an [`Action`]; call arguments are appended to it. A
/// non-zero exit status is a failure.
fn command_action(argv: Vec<String>, root: &Path) -> Action {
    let cwd: PathBuf = root.to_path_buf();
    Action::with_args(move |extra| {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("empty command"))?;
        tracing::debug!("spawning {program} {args:?} {extra:?} in {}", cwd.display());
        let status = Command::new(program)
            .args(args)
            .args(extra)
            .current_dir(&cwd)
            .status()
            .map_err(|e| anyhow::anyhow!("failed to start '{program}': {e}"))?;
        if !status.success() {
            anyhow::bail!("'{program}' exited with {status}");
        }
        Ok(())
    })
}
