/// Reserved deck slot: the back button inside every folder.
pub const RESERVED_SLOT: (u32, u32) = (0, 0);

/// Separator between module path segments and the function name.
pub const ADDRESS_SEPARATOR: char = '.';

/// Deck icon value that removes a previously set icon.
pub const DEFAULT_ICON: &str = "default";

/// Literal list prefixes that mean "everything" (an empty quoted string).
pub const MATCH_ALL_PREFIXES: [&str; 2] = ["''", "\"\""];
