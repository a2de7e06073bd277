//! Line-based terminal I/O for the operator.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use yiqu_mmse::{Error, Operator, Result};

/// Reads operator input one line at a time and writes prompts to `W`.
///
/// Works on plain pipes as well as terminals, so a whole session can be scripted.
pub struct LineOperator<R, W> {
    input: R,
    output: W,
}

impl LineOperator<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LineOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.output
    }

    /// Write streamed text without a newline.
    pub fn write_fragment(&mut self, text: &str) -> io::Result<()> {
        write!(self.output, "{}", text)?;
        self.output.flush()
    }

    /// Ask a yes/no question; only `y` or `yes` counts as yes.
    pub fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.ask(prompt)?;
        Ok(matches!(
            answer.trim().to_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Operator for LineOperator<R, W> {
    fn show(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::InputClosed);
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(line)
    }
}
