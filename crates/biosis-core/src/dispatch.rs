//! Invocation by dot-syntax address.

use crate::address::{AddressTree, split_address};
use crate::error::{ListError, LookupError};
use crate::function::{Alert, Outcome, RegisteredFunction};

/// Anything that can turn an address into a callable function.
pub trait Resolve {
    fn resolve(&self, address: &str) -> Result<RegisteredFunction, LookupError>;
}

impl Resolve for AddressTree {
    fn resolve(&self, address: &str) -> Result<RegisteredFunction, LookupError> {
        let (module, name) = split_address(address)?;
        if let Some(found) = self.get(address.trim()) {
            return Ok(found.clone());
        }
        let module_known = self.addresses().any(|a| {
            a.strip_prefix(module)
                .is_some_and(|rest| rest.starts_with('.'))
        });
        if module_known {
            Err(LookupError::FunctionNotFound {
                module: module.to_string(),
                name: name.to_string(),
            })
        } else {
            Err(LookupError::ModuleNotFound(module.to_string()))
        }
    }
}

/// What happened when an address was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Completed { address: String },
    Failed { address: String, message: String },
    NotFound(LookupError),
}

/// Resolves addresses and calls them in-process, synchronously.
pub struct Dispatcher<'a> {
    resolver: &'a dyn Resolve,
    alert: &'a dyn Alert,
}

impl<'a> Dispatcher<'a> {
    pub fn new(resolver: &'a dyn Resolve, alert: &'a dyn Alert) -> Self {
        Self { resolver, alert }
    }

    /// Neither a lookup failure nor a failing function is an error here;
    /// both come back as a [`Dispatch`] value.
    pub fn run(&self, address: &str) -> Dispatch {
        self.run_with(address, &[])
    }

    /// [`Dispatcher::run`] passing `args` through to the function.
    pub fn run_with(&self, address: &str, args: &[String]) -> Dispatch {
        let function = match self.resolver.resolve(address) {
            Ok(function) => function,
            Err(e) => {
                tracing::warn!("{e}");
                return Dispatch::NotFound(e);
            }
        };
        let address = function.address();
        tracing::info!("calling {address}");
        match function.invoke_with(self.alert, args) {
            Outcome::Completed => Dispatch::Completed { address },
            Outcome::Failed(message) => Dispatch::Failed { address, message },
        }
    }

    /// Fallback when no verb matched: the sole remaining argument is taken
    /// as an address.
    pub fn run_unknown(&self, args: &[String]) -> Result<Dispatch, ListError> {
        match args {
            [address] => Ok(self.run(address)),
            other => Err(ListError::ExpectedOneAddress(other.to_vec())),
        }
    }
}
