//! Function registry for personal automation.
//!
//! Functions are declared once, decorated with carriers (base attributes, a
//! deck button, a schedule, voice phrases) and reconciled into one canonical
//! header per name. Addresses use dot syntax: `module.path.function`.
//!
//! No filesystem I/O here; discovery and surface compilation live in the
//! store and compile crates.

pub mod address;
pub mod carrier;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod function;
pub mod header;
pub mod phrase;
pub mod registry;

pub use address::{AddressTree, module_path_from_file, split_address, truncate};
pub use carrier::{Carrier, Deck, Icon, Location, Schedule, Surface, Trigger, Voice, When};
pub use constants::{ADDRESS_SEPARATOR, DEFAULT_ICON, MATCH_ALL_PREFIXES, RESERVED_SLOT};
pub use dispatch::{Dispatch, Dispatcher, Resolve};
pub use error::{ListError, LookupError, ReconcileError, RegistrationError};
pub use function::{Action, Alert, Function, Outcome, RegisteredFunction, TerminalAlert};
pub use header::{Header, Meta, derive_title};
pub use phrase::{PhraseSpec, multi_phrase};
pub use registry::{Reconciled, Registry};
