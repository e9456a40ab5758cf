/// Accumulates operator-facing diagnostic lines for one dispatch request.
///
/// Printer environments vary wildly, so every branch of the dispatcher records
/// what it saw and the full trace is handed back to the caller regardless of
/// outcome.
#[derive(Debug, Default)]
pub struct DebugTrace {
    lines: Vec<String>,
}

impl DebugTrace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    #[must_use]
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}
