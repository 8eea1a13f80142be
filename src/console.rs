//! Operator console
//! All interactive input and operator-facing output goes through [`Console`]

use std::io::{self, BufRead, Write};

/// Interactive terminal seam
pub trait Console {
    /// Print a line for the operator
    fn say(&mut self, line: &str);

    /// Show `message` and read one line, trimmed. End of input is an `UnexpectedEof` error.
    fn prompt(&mut self, message: &str) -> io::Result<String>;

    fn clear(&mut self);

    /// Block until the operator presses Enter
    fn pause(&mut self, message: &str) -> io::Result<()> {
        self.prompt(message).map(|_| ())
    }

    /// Ask a yes/no question; only `y` (any case) counts as yes
    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        Ok(self.prompt(message)?.eq_ignore_ascii_case("y"))
    }
}

/// Console over the process's stdin/stdout
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl Terminal<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Console for Terminal<R, W> {
    fn say(&mut self, line: &str) {
        let _ = writeln!(self.output, "{}", line);
    }

    fn prompt(&mut self, message: &str) -> io::Result<String> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"));
        }
        Ok(line.trim().to_string())
    }

    fn clear(&mut self) {
        let _ = write!(self.output, "\x1B[2J\x1B[1;1H");
        let _ = self.output.flush();
    }
}
