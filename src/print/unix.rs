use super::{CommandError, DebugTrace, PrintDispatcher, PrintError};
use std::path::Path;

impl PrintDispatcher {
    /// Unix-family strategy: hand the file to the line-printer command,
    /// `-d <printer>` when a target was named. Non-zero exit or timeout is a
    /// failed dispatch carrying whatever the command wrote to stderr.
    pub(crate) async fn print_unix(
        &self,
        path: &Path,
        printer_name: Option<&str>,
        trace: &mut DebugTrace,
    ) -> Result<String, PrintError> {
        let lp = &self.config().lp_program;

        let mut args: Vec<String> = Vec::new();
        if let Some(name) = printer_name {
            args.push("-d".to_string());
            args.push(name.to_string());
        }
        args.push(path.display().to_string());

        trace.push(format!("Print command: {} {}", lp, args.join(" ")));

        match self.run_command(lp, &args).await {
            Ok(output) if output.success() => {
                trace.push(format!("Print job ID: {}", output.stdout));
                Ok("Print job sent successfully".to_string())
            }
            Ok(output) => {
                trace.push(format!("Command failed: {}", output.stderr));
                let detail = if output.stderr.is_empty() {
                    format!("{} exited with status {:?}", lp, output.status)
                } else {
                    output.stderr
                };
                Err(PrintError::CommandFailed(detail))
            }
            Err(CommandError::Spawn(e)) => {
                trace.push(format!("Failed to run {lp}: {e}"));
                Err(PrintError::CommandFailed(format!("could not run {lp}: {e}")))
            }
            Err(CommandError::Timeout(secs)) => {
                trace.push(format!("Print command timed out after {secs}s"));
                Err(PrintError::CommandFailed(format!("print command timed out after {secs}s")))
            }
        }
    }
}
