//! The function registry: an append-only log of carrier applications plus
//! the reconciliation pass that yields one canonical header per name.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::carrier::Surface;
use crate::error::ReconcileError;
use crate::function::{Function, RegisteredFunction};
use crate::header::Header;

/// Append-only registry log. Created empty, filled during a single discovery
/// pass, then only read.
#[derive(Debug, Default)]
pub struct Registry {
    log: Vec<RegisteredFunction>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single prebuilt entry.
    pub fn record(&mut self, entry: RegisteredFunction) {
        tracing::debug!(
            "registered {} for {}",
            entry.address(),
            entry
                .surface()
                .map_or("base", |s| s.as_str())
        );
        self.log.push(entry);
    }

    /// Register a declared function under `module_path`, appending one entry
    /// per applied carrier (a bare base entry when there are none). Returns
    /// how many entries were appended.
    pub fn register(&mut self, module_path: &str, function: Function) -> usize {
        let entries = function.fold(module_path);
        let count = entries.len();
        for entry in entries {
            self.record(entry);
        }
        count
    }

    pub fn entries(&self) -> &[RegisteredFunction] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Merge every entry of a name onto the header of its last entry.
    ///
    /// Pure: reconciling twice without new registrations yields identical
    /// results. Fails if one name is declared from two different modules.
    pub fn reconcile(&self) -> Result<Reconciled, ReconcileError> {
        let mut canonical: IndexMap<String, (String, Header)> = IndexMap::new();
        for entry in &self.log {
            match canonical.entry(entry.name.clone()) {
                Entry::Occupied(mut slot) => {
                    let (module, header) = slot.get_mut();
                    if *module != entry.module_path {
                        return Err(ReconcileError::NameCollision {
                            name: entry.name.clone(),
                            first: module.clone(),
                            second: entry.module_path.clone(),
                        });
                    }
                    *header = entry.header.clone();
                }
                Entry::Vacant(slot) => {
                    slot.insert((entry.module_path.clone(), entry.header.clone()));
                }
            }
        }

        let entries = self
            .log
            .iter()
            .map(|entry| {
                let mut entry = entry.clone();
                if let Some((_, header)) = canonical.get(&entry.name) {
                    entry.header = header.clone();
                }
                entry
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "reconciled {} log entries into {} functions",
            entries.len(),
            canonical.len()
        );

        Ok(Reconciled {
            headers: canonical
                .into_iter()
                .map(|(name, (_, header))| (name, header))
                .collect(),
            entries,
        })
    }

    /// Entries for one surface, in insertion order, with canonical headers.
    pub fn all_entries_for(
        &self,
        surface: Surface,
    ) -> Result<Vec<RegisteredFunction>, ReconcileError> {
        Ok(self.reconcile()?.all_entries_for(surface))
    }
}

/// Output of [`Registry::reconcile`].
#[derive(Debug, Clone)]
pub struct Reconciled {
    headers: IndexMap<String, Header>,
    entries: Vec<RegisteredFunction>,
}

impl Reconciled {
    /// Canonical header for a function name.
    pub fn canonical(&self, name: &str) -> Option<&Header> {
        self.headers.get(name)
    }

    /// Canonical headers in first-registration order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &Header)> {
        self.headers.iter().map(|(name, h)| (name.as_str(), h))
    }

    /// Every log entry, in insertion order, with canonical headers.
    pub fn entries(&self) -> &[RegisteredFunction] {
        &self.entries
    }

    pub fn all_entries_for(&self, surface: Surface) -> Vec<RegisteredFunction> {
        self.entries
            .iter()
            .filter(|e| e.surface() == Some(surface))
            .cloned()
            .collect()
    }

    /// Entries grouped by surface; surfaces appear in the order they were
    /// first registered.
    pub fn by_surface(&self) -> IndexMap<Surface, Vec<RegisteredFunction>> {
        let mut groups: IndexMap<Surface, Vec<RegisteredFunction>> = IndexMap::new();
        for entry in &self.entries {
            if let Some(surface) = entry.surface() {
                groups.entry(surface).or_default().push(entry.clone());
            }
        }
        groups
    }

    pub fn function_count(&self) -> usize {
        self.headers.len()
    }
}
