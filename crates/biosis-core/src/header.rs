//! Shared function attributes and the generic base carrier.

/// The canonical attribute tuple every registered function carries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Header {
    pub title: String,
    pub description: String,
    pub show: bool,
    pub pause: bool,
}

/// Generic base carrier. Every field is optional; unset fields fall back to
/// values derived from the function itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Meta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub show: Option<bool>,
    pub pause: Option<bool>,
}

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn show(mut self, show: bool) -> Self {
        self.show = Some(show);
        self
    }

    pub fn pause(mut self, pause: bool) -> Self {
        self.pause = Some(pause);
        self
    }

    /// Layer `outer` on top of `self`: fields set by `outer` win, gaps keep
    /// the inner value.
    pub fn overlay(&self, outer: &Meta) -> Meta {
        Meta {
            title: outer.title.clone().or_else(|| self.title.clone()),
            description: outer
                .description
                .clone()
                .or_else(|| self.description.clone()),
            show: outer.show.or(self.show),
            pause: outer.pause.or(self.pause),
        }
    }

    /// Resolve to a full header.
    ///
    /// Description priority: explicit, then doc comment, then empty.
    pub fn resolve(&self, name: &str, doc: Option<&str>) -> Header {
        Header {
            title: self.title.clone().unwrap_or_else(|| derive_title(name)),
            description: self
                .description
                .clone()
                .or_else(|| doc.map(str::to_string))
                .unwrap_or_default(),
            show: self.show.unwrap_or(false),
            pause: self.pause.unwrap_or(false),
        }
    }
}

/// Human label from a callable name: `__` becomes a line break, `_` a space,
/// then every alphabetic run is title-cased.
pub fn derive_title(name: &str) -> String {
    let spaced = name.replace("__", "\n").replace('_', " ");
    title_case(&spaced)
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }
    out
}
