//! Metadata carriers.
//!
//! A carrier is an immutable delta attached to a function declaration. The
//! generic [`Meta`] carrier contributes shared attributes; every other
//! carrier is tagged with the [`Surface`] it targets and holds that
//! surface's payload.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::constants::{DEFAULT_ICON, RESERVED_SLOT};
use crate::error::RegistrationError;
use crate::header::Meta;
use crate::phrase::PhraseSpec;

/// An external control medium functions are compiled into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Surface {
    Deck,
    Schedule,
    Voice,
}

impl Surface {
    pub const ALL: [Surface; 3] = [Surface::Deck, Surface::Schedule, Surface::Voice];

    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Deck => "deck",
            Surface::Schedule => "schedule",
            Surface::Voice => "voice",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Surface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deck" => Ok(Surface::Deck),
            "schedule" => Ok(Surface::Schedule),
            "voice" => Ok(Surface::Voice),
            other => Err(format!(
                "unknown surface '{other}' (expected deck, schedule or voice)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Deck
// ---------------------------------------------------------------------------

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<folder>.*)/)?\s*(?P<row>\d+)\s*,\s*(?P<col>\d+)\s*$").unwrap()
});

/// A button slot: an optional folder path plus a `(row, col)` coordinate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    /// Folder path joined with `/`; `None` targets the top-level page.
    pub folder: Option<String>,
    pub row: u32,
    pub col: u32,
}

impl Location {
    /// Parse `"[folder/path/]row,col"`, rejecting the reserved slot.
    pub fn parse(raw: &str) -> Result<Self, RegistrationError> {
        let caps = LOCATION_RE
            .captures(raw)
            .ok_or_else(|| RegistrationError::InvalidLocation(raw.to_string()))?;
        let row = caps["row"]
            .parse()
            .map_err(|_| RegistrationError::InvalidLocation(raw.to_string()))?;
        let col = caps["col"]
            .parse()
            .map_err(|_| RegistrationError::InvalidLocation(raw.to_string()))?;
        if (row, col) == RESERVED_SLOT {
            return Err(RegistrationError::ReservedSlot {
                location: raw.to_string(),
            });
        }
        let folder = caps
            .name("folder")
            .map(|m| m.as_str().trim_matches('/').to_string())
            .filter(|f| !f.is_empty());
        Ok(Self { folder, row, col })
    }

    /// Coordinate key as used in profile manifests.
    pub fn coords(&self) -> String {
        format!("{},{}", self.row, self.col)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.folder {
            Some(folder) => write!(f, "{folder}/{},{}", self.row, self.col),
            None => write!(f, "{},{}", self.row, self.col),
        }
    }
}

/// Button icon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Icon {
    /// File name under the user's `Images` directory.
    File(String),
    /// Remove whatever custom icon the slot had.
    Default,
}

impl Icon {
    pub fn parse(raw: &str) -> Self {
        if raw == DEFAULT_ICON {
            Icon::Default
        } else {
            Icon::File(raw.to_string())
        }
    }
}

/// Grid-button carrier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    pub locations: Vec<Location>,
    pub icon: Option<Icon>,
    /// Replaces the title on the button face only.
    pub label: Option<String>,
}

impl Deck {
    pub fn at(location: &str) -> Result<Self, RegistrationError> {
        Self::at_all([location])
    }

    pub fn at_all<I, S>(locations: I) -> Result<Self, RegistrationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let locations = locations
            .into_iter()
            .map(|l| Location::parse(l.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if locations.is_empty() {
            return Err(RegistrationError::NoLocation);
        }
        Ok(Self {
            locations,
            icon: None,
            label: None,
        })
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(Icon::parse(icon));
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Minute,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Once,
    OnStart,
    OnLogon,
    OnIdle,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Minute => "minute",
            Trigger::Hourly => "hourly",
            Trigger::Daily => "daily",
            Trigger::Weekly => "weekly",
            Trigger::Monthly => "monthly",
            Trigger::Once => "once",
            Trigger::OnStart => "onstart",
            Trigger::OnLogon => "onlogon",
            Trigger::OnIdle => "onidle",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trigger {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "minute" => Trigger::Minute,
            "hourly" => Trigger::Hourly,
            "daily" => Trigger::Daily,
            "weekly" => Trigger::Weekly,
            "monthly" => Trigger::Monthly,
            "once" => Trigger::Once,
            "onstart" => Trigger::OnStart,
            "onlogon" => Trigger::OnLogon,
            "onidle" => Trigger::OnIdle,
            other => {
                return Err(RegistrationError::InvalidSchedule(format!(
                    "unknown trigger '{other}'"
                )));
            }
        })
    }
}

const DATE_FORMAT: &str = "%Y/%m/%d";
const TIME_FORMAT: &str = "%H:%M";

/// A real calendar date, normalized to `yyyy/MM/dd`.
fn parse_date(raw: &str) -> Option<String> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .map(|d| d.format(DATE_FORMAT).to_string())
}

/// A real wall-clock time, normalized to `hh:mm`.
fn parse_time(raw: &str) -> Option<String> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .ok()
        .map(|t| t.format(TIME_FORMAT).to_string())
}

/// A start or end point for a schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum When {
    /// Resolved to a moment shortly after compilation.
    Now,
    /// `yyyy/MM/dd` and/or `hh:mm`.
    At {
        date: Option<String>,
        time: Option<String>,
    },
}

impl When {
    /// Accepts `now`, `yyyy/MM/dd-hh:mm`, `yyyy/MM/dd`, or `hh:mm`.
    pub fn parse(raw: &str) -> Result<Self, RegistrationError> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("now") {
            return Ok(When::Now);
        }
        let invalid =
            || RegistrationError::InvalidSchedule(format!("'{raw}' is not a date, time or date-time"));
        if let Some((date, time)) = raw.split_once('-') {
            return match (parse_date(date), parse_time(time)) {
                (Some(date), Some(time)) => Ok(When::At {
                    date: Some(date),
                    time: Some(time),
                }),
                _ => Err(invalid()),
            };
        }
        if let Some(date) = parse_date(raw) {
            Ok(When::At {
                date: Some(date),
                time: None,
            })
        } else if let Some(time) = parse_time(raw) {
            Ok(When::At {
                date: None,
                time: Some(time),
            })
        } else {
            Err(invalid())
        }
    }
}

/// Scheduled-task carrier.
///
/// The trigger and idle time are fixed at construction so an `onidle`
/// schedule always has an idle time and no other trigger ever does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    trigger: Trigger,
    pub modifier: Option<String>,
    pub start: Option<When>,
    pub end: Option<When>,
    pub day: Option<String>,
    pub month: Option<String>,
    idle: Option<u32>,
}

impl Schedule {
    /// Any trigger but `onidle`, which needs [`Schedule::on_idle`].
    pub fn new(trigger: Trigger) -> Result<Self, RegistrationError> {
        if trigger == Trigger::OnIdle {
            return Err(RegistrationError::InvalidSchedule(
                "onidle needs an idle time in minutes".to_string(),
            ));
        }
        Ok(Self::with_trigger(trigger, None))
    }

    /// Run after the machine has been idle for `minutes`.
    pub fn on_idle(minutes: u32) -> Result<Self, RegistrationError> {
        if minutes == 0 {
            return Err(RegistrationError::InvalidSchedule(
                "idle time must be at least one minute".to_string(),
            ));
        }
        Ok(Self::with_trigger(Trigger::OnIdle, Some(minutes)))
    }

    /// Build from a trigger and an optional idle time, as read from a unit
    /// file.
    pub fn from_parts(trigger: Trigger, idle: Option<u32>) -> Result<Self, RegistrationError> {
        match (trigger, idle) {
            (Trigger::OnIdle, Some(minutes)) => Self::on_idle(minutes),
            (Trigger::OnIdle, None) => Self::new(trigger),
            (trigger, Some(_)) => Err(RegistrationError::InvalidSchedule(format!(
                "idle time only applies to onidle, not {trigger}"
            ))),
            (trigger, None) => Self::new(trigger),
        }
    }

    fn with_trigger(trigger: Trigger, idle: Option<u32>) -> Self {
        Self {
            trigger,
            modifier: None,
            start: None,
            end: None,
            day: None,
            month: None,
            idle,
        }
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    pub fn idle_minutes(&self) -> Option<u32> {
        self.idle
    }

    pub fn daily_at(time: &str) -> Result<Self, RegistrationError> {
        Self::new(Trigger::Daily)?.start(time)
    }

    pub fn modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = Some(modifier.into());
        self
    }

    pub fn start(mut self, start: &str) -> Result<Self, RegistrationError> {
        self.start = Some(When::parse(start)?);
        Ok(self)
    }

    pub fn end(mut self, end: &str) -> Result<Self, RegistrationError> {
        let when = When::parse(end)?;
        if when == When::Now {
            return Err(RegistrationError::InvalidSchedule(
                "'now' is only valid as a start".to_string(),
            ));
        }
        self.end = Some(when);
        Ok(self)
    }

    pub fn day(mut self, day: impl Into<String>) -> Self {
        self.day = Some(day.into());
        self
    }

    pub fn month(mut self, month: impl Into<String>) -> Self {
        self.month = Some(month.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Voice
// ---------------------------------------------------------------------------

/// Voice-phrase carrier; holds the fully expanded literal phrases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voice {
    pub phrases: Vec<String>,
}

impl Voice {
    pub fn new(spec: impl Into<PhraseSpec>) -> Result<Self, RegistrationError> {
        Ok(Self {
            phrases: spec.into().expand()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Carrier
// ---------------------------------------------------------------------------

/// One metadata delta applied to a function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Carrier {
    Meta(Meta),
    Deck(Deck),
    Schedule(Schedule),
    Voice(Voice),
}

impl Carrier {
    /// The surface this carrier targets; `None` for the generic base carrier.
    pub fn surface(&self) -> Option<Surface> {
        match self {
            Carrier::Meta(_) => None,
            Carrier::Deck(_) => Some(Surface::Deck),
            Carrier::Schedule(_) => Some(Surface::Schedule),
            Carrier::Voice(_) => Some(Surface::Voice),
        }
    }
}

impl From<Meta> for Carrier {
    fn from(meta: Meta) -> Self {
        Carrier::Meta(meta)
    }
}

impl From<Deck> for Carrier {
    fn from(deck: Deck) -> Self {
        Carrier::Deck(deck)
    }
}

impl From<Schedule> for Carrier {
    fn from(schedule: Schedule) -> Self {
        Carrier::Schedule(schedule)
    }
}

impl From<Voice> for Carrier {
    fn from(voice: Voice) -> Self {
        Carrier::Voice(voice)
    }
}
