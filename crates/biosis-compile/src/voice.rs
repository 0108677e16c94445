//! Voice-phrase table.

use std::path::PathBuf;

use biosis_core::{Carrier, RegisteredFunction, Surface};
use serde::{Deserialize, Serialize};

use crate::compile::{SurfaceCompiler, print_function_header, print_key};
use crate::error::{CompileError, Result};
use crate::files::write_atomic;
use crate::launcher::CompileContext;

pub const PHRASE_FILE: &str = "biosis.json";

/// Trailing phrase marker: whatever is spoken after the phrase is passed to
/// the function.
pub const ARGUMENT_MARKER: char = '$';

/// One row of the phrase table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseRecord {
    pub title: String,
    pub phrase: String,
    pub command: String,
    pub start: String,
    /// `command` ends with a `$` placeholder for the spoken remainder.
    #[serde(default)]
    pub takes_argument: bool,
}

/// Split the argument marker off a phrase.
fn strip_marker(phrase: &str) -> (&str, bool) {
    match phrase.trim_end().strip_suffix(ARGUMENT_MARKER) {
        Some(rest) => (rest.trim_end(), true),
        None => (phrase, false),
    }
}

/// Writes `<root>/.compilers/voice/biosis.json`, replacing it entirely on
/// every run.
#[derive(Debug, Default)]
pub struct VoiceCompiler;

impl VoiceCompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn output_path(ctx: &CompileContext) -> PathBuf {
        ctx.surface_dir(Surface::Voice).join(PHRASE_FILE)
    }
}

impl SurfaceCompiler for VoiceCompiler {
    fn surface(&self) -> Surface {
        Surface::Voice
    }

    fn compile(&mut self, ctx: &CompileContext, entries: &[RegisteredFunction]) -> Result<()> {
        let start = ctx.root.display().to_string();
        let mut records = Vec::new();
        for (i, entry) in entries.iter().enumerate() {
            let Carrier::Voice(voice) = &entry.carrier else {
                continue;
            };
            let command = format!("\"{}\" run {}", ctx.launcher.display(), entry.address());

            print_function_header(ctx, i, entry);
            print_key("Command", &command);
            match voice.phrases.as_slice() {
                [only] => print_key("Phrases", only),
                many => {
                    let width = many.iter().map(String::len).max().unwrap_or(0);
                    print_key("Phrases", format!("v{}v", "=".repeat(width)));
                    for phrase in many {
                        println!("\t\t\t\t {phrase}");
                    }
                }
            }
            println!();

            records.extend(voice.phrases.iter().map(|phrase| {
                let (phrase, takes_argument) = strip_marker(phrase);
                let command = if takes_argument {
                    format!("{command} --arg \"{ARGUMENT_MARKER}\"")
                } else {
                    command.clone()
                };
                PhraseRecord {
                    title: entry.header.title.clone(),
                    phrase: phrase.to_string(),
                    command,
                    start: start.clone(),
                    takes_argument,
                }
            }));
        }

        let path = Self::output_path(ctx);
        let json =
            serde_json::to_vec_pretty(&records).map_err(|e| CompileError::json(&path, e))?;
        write_atomic(&path, &json)?;
        tracing::info!("wrote {} phrases to {}", records.len(), path.display());
        Ok(())
    }
}
