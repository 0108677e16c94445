//! Surface compilers: turn reconciled registry entries into deck profile
//! slots, scheduled tasks and a voice-phrase table.

pub mod command;
pub mod compile;
pub mod deck;
pub mod error;
pub mod files;
pub mod launcher;
pub mod schedule;
pub mod voice;

pub use command::{CommandOutput, DEFAULT_TIMEOUT, run_command};
pub use compile::{
    CompileReport, SurfaceCompiler, SurfaceOutcome, SurfaceReport, compile_all,
    print_function_header, standard_compilers,
};
pub use deck::{AppControl, DeckApp, DeckCompiler, DeckProfile, DeckSettings};
pub use error::{CompileError, Result, require_windows};
pub use launcher::{CompileContext, ScriptFlavor};
pub use schedule::{ScheduleCompiler, Schtasks, TASK_PREFIX, TaskScheduler, TaskSpec, task_flags};
pub use voice::{PhraseRecord, VoiceCompiler};
