//! Memory sources feeding prompt variables.

/// Template variable filled by the snippet window.
pub const SNIPPETS_KEY: &str = "snippets";
/// Template variable filled by the message history window.
pub const HISTORY_KEY: &str = "history";
/// Template variable filled by the current user input.
pub const INPUT_KEY: &str = "input";

/// A piece of conversation state that renders into one prompt variable.
///
/// The prompt assembler collects the value of every source under its key
/// before filling the template.
pub trait MemorySource {
    /// Name of the template variable this source fills.
    fn memory_key(&self) -> &'static str;

    /// Render the current state as prompt text.
    fn load(&self) -> String;
}
