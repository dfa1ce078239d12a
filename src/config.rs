// ABOUTME: Crate-wide constants for the CLI, REPL, and parser limits

/// Version shown by `--version` and the REPL banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const WELCOME_MESSAGE: &str = "loxide - a Lox-flavored scripting language";
pub const WELCOME_FOOTER: &str = "Enter statements ending with ';'. Ctrl-D exits.";

pub const PROMPT: &str = "lox> ";
pub const HISTORY_FILE: &str = ".loxide_history";

/// Where `build` mode writes the emitted LLVM module.
pub const IR_OUTPUT_FILE: &str = "./output.ll";

/// Parameter and argument lists are capped at this many entries.
pub const MAX_PARAMETERS: usize = 255;
/// List literals are capped at this many items.
pub const MAX_LIST_ITEMS: usize = 100;

// Process exit codes, following the sysexits convention.
pub const EXIT_COMPILE_ERROR: u8 = 65;
pub const EXIT_RUNTIME_ERROR: u8 = 70;
pub const EXIT_IO_ERROR: u8 = 74;
