//! Line-based console the procedures talk to the user with.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// A console made from an input to read answers from and an output to print to.
///
/// [`Console::stdio`] gives the terminal, tests usually use a byte slice as input and a
/// `Vec<u8>` as output. Output is written with the [`write!`] and [`writeln!`] macros.
pub struct Console<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl Console<StdinLock<'static>, Stdout> {
    /// A console on standard input and standard output.
    pub fn stdio() -> Self {
        Console::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Create a new console from the given input and output.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print the message, followed by a space, and read one line of input.
    ///
    /// The answer is returned with leading and trailing whitespace removed. At the end of the
    /// input an empty answer is returned.
    pub fn prompt(&mut self, msg: &str) -> io::Result<String> {
        write!(self.output, "{msg} ")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Consume the console and return its output.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Write for Console<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}
