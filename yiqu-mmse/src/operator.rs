//! The I/O seam between the engine and whoever administers the test.

use crate::Result;

/// The person administering the assessment.
///
/// Every prompt, answer and judgment passes through this trait, so the engine never
/// touches the terminal directly.
pub trait Operator {
    /// Show a line of text.
    fn show(&mut self, message: &str) -> Result<()>;

    /// Show `prompt` and read one line of input, without the trailing newline.
    ///
    /// Returns [`Error::InputClosed`](crate::Error::InputClosed) when input has ended.
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Wait until the operator is ready to continue.
    fn pause(&mut self, prompt: &str) -> Result<()> {
        self.ask(prompt).map(|_| ())
    }
}
