use std::path::PathBuf;

use biosis_core::{AddressTree, LookupError, RegisteredFunction, Resolve, split_address};

use crate::loader::load_unit;

/// Resolves an address by loading only the unit its module part names.
#[derive(Debug, Clone)]
pub struct UnitResolver {
    root: PathBuf,
}

impl UnitResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Resolve for UnitResolver {
    fn resolve(&self, address: &str) -> Result<RegisteredFunction, LookupError> {
        let (module, name) = split_address(address)?;
        let registry = load_unit(&self.root, module).map_err(|e| {
            if e.is_skippable() {
                tracing::debug!("{e}");
            } else {
                tracing::warn!("loading {module} failed: {e}");
            }
            LookupError::ModuleNotFound(module.to_string())
        })?;
        let reconciled = registry
            .reconcile()
            .map_err(|_| LookupError::ModuleNotFound(module.to_string()))?;
        // The unit loaded, so the module exists even if it declares nothing.
        AddressTree::build(reconciled.entries())
            .resolve(address)
            .map_err(|e| match e {
                LookupError::ModuleNotFound(module) => LookupError::FunctionNotFound {
                    module,
                    name: name.to_string(),
                },
                other => other,
            })
    }
}
