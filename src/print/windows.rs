use super::{CommandError, CommandOutput, DebugTrace, PrintDispatcher, PrintError};
use std::path::Path;

const ENUMERATE_PRINTERS: &str = "Get-Printer | Select-Object -ExpandProperty Name";
const DEFAULT_PRINTER: &str = "(Get-CimInstance -ClassName Win32_Printer -Filter 'Default=TRUE').Name";

impl PrintDispatcher {
    /// Windows primary strategy: enumerate printers through the shell host,
    /// validate or resolve the target, then invoke the shell print verb.
    ///
    /// The fallback helper is used only when the shell host itself cannot be
    /// spawned; a print failure from a working shell is reported as-is.
    pub(crate) async fn print_windows(
        &self,
        path: &Path,
        printer_name: Option<&str>,
        trace: &mut DebugTrace,
    ) -> Result<String, PrintError> {
        let enumerated = match self.run_shell(ENUMERATE_PRINTERS).await {
            Ok(output) => output,
            Err(CommandError::Spawn(e)) => {
                trace.push(format!(
                    "Print shell '{}' unavailable ({e}), using fallback method",
                    self.config().windows_shell_program
                ));
                return self.print_windows_fallback(path, printer_name, trace).await;
            }
            Err(CommandError::Timeout(secs)) => {
                trace.push(format!("Printer enumeration timed out after {secs}s"));
                return Err(PrintError::CommandFailed(format!("printer enumeration timed out after {secs}s")));
            }
        };

        if !enumerated.success() {
            trace.push(format!("Printer enumeration failed: {}", enumerated.stderr));
            return Err(PrintError::CommandFailed(format!("printer enumeration failed: {}", enumerated.stderr)));
        }

        let printers: Vec<String> =
            enumerated.stdout.lines().map(str::trim).filter(|l| !l.is_empty()).map(ToString::to_string).collect();
        trace.push(format!("Available printers: {}", printers.join(", ")));

        let resolved = match printer_name {
            Some(name) => {
                if !printers.iter().any(|p| p == name) {
                    return Err(PrintError::PrinterNotFound {
                        name: name.to_string(),
                        available: printers.join(", "),
                    });
                }
                name.to_string()
            }
            None => {
                let default = self.query_default_printer(trace).await?;
                trace.push(format!("Using default printer: {default}"));
                default
            }
        };

        trace.push(format!("Attempting to print to: {resolved}"));

        let print_command = format!("Start-Process -FilePath '{}' -Verb Print", path.display());
        trace.push(format!("Print command: {} -NoProfile -Command {}", self.config().windows_shell_program, print_command));

        match self.run_shell(&print_command).await {
            Ok(output) if output.success() => Ok("Print job sent successfully".to_string()),
            Ok(output) => {
                trace.push(format!("Windows print error: {}", output.stderr));
                Err(PrintError::CommandFailed(format!("print command failed: {}", output.stderr)))
            }
            Err(CommandError::Spawn(e)) => {
                trace.push(format!("Windows print error: {e}"));
                Err(PrintError::CommandFailed(format!("could not run print command: {e}")))
            }
            Err(CommandError::Timeout(secs)) => {
                trace.push(format!("Print command timed out after {secs}s"));
                Err(PrintError::CommandFailed(format!("print command timed out after {secs}s")))
            }
        }
    }

    async fn query_default_printer(&self, trace: &mut DebugTrace) -> Result<String, PrintError> {
        match self.run_shell(DEFAULT_PRINTER).await {
            Ok(output) if output.success() && !output.stdout.is_empty() => Ok(output.stdout),
            Ok(output) => {
                trace.push(format!("Default printer query failed: {}", output.stderr));
                Err(PrintError::CommandFailed("no default printer configured".to_string()))
            }
            Err(e) => {
                trace.push(format!("Default printer query failed: {e}"));
                Err(PrintError::CommandFailed(format!("default printer query failed: {e}")))
            }
        }
    }

    /// Fallback strategy: invoke the configured helper directly with the file
    /// and optional printer. Entered only when the shell host is missing.
    pub(crate) async fn print_windows_fallback(
        &self,
        path: &Path,
        printer_name: Option<&str>,
        trace: &mut DebugTrace,
    ) -> Result<String, PrintError> {
        let helper = &self.config().windows_fallback_program;

        let mut args = vec!["mshtml.dll,PrintHTML".to_string(), path.display().to_string()];
        if let Some(name) = printer_name {
            args.push(format!("/d:{name}"));
        }
        trace.push(format!("Fallback command: {} {}", helper, args.join(" ")));

        match self.run_command(helper, &args).await {
            Ok(output) => {
                trace.push(format!("Exit code: {}", output.status.map_or_else(|| "unknown".to_string(), |c| c.to_string())));
                trace.push(format!("Output: {}", output.stdout));
                trace.push(format!("Error: {}", output.stderr));
                if output.success() {
                    Ok("Print job sent via fallback method".to_string())
                } else {
                    Err(PrintError::CommandFailed(format!("fallback print command failed: {}", output.stderr)))
                }
            }
            Err(CommandError::Spawn(e)) => {
                trace.push(format!("Failed to run fallback {helper}: {e}"));
                Err(PrintError::CommandFailed(format!("could not run fallback {helper}: {e}")))
            }
            Err(CommandError::Timeout(secs)) => {
                trace.push(format!("Fallback command timed out after {secs}s"));
                Err(PrintError::CommandFailed(format!("fallback command timed out after {secs}s")))
            }
        }
    }

    async fn run_shell(&self, command: &str) -> Result<CommandOutput, CommandError> {
        let args = vec!["-NoProfile".to_string(), "-Command".to_string(), command.to_string()];
        self.run_command(&self.config().windows_shell_program, &args).await
    }
}
