use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::commands::parse_command;
use crate::report;
use crate::workspace::{Step, Workspace};

/// Read commands line by line until `quit` or end of input.
///
/// Command and save errors are printed and the loop continues; only I/O errors on
/// `reader`/`writer` end it early.
pub async fn run_interactive<R, W>(workspace: &mut Workspace, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let snapshot = workspace.settled().await;
    writer.write_all(report::render(&snapshot).as_bytes()).await?;
    writer.flush().await?;

    let mut lines = reader.lines();
    let mut handled = 0u64;
    let reason = loop {
        let Some(line) = lines.next_line().await? else {
            break "end_of_input";
        };
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writer.write_all(format!("error: {e}\n").as_bytes()).await?;
                writer.flush().await?;
                continue;
            }
        };
        handled += 1;
        match workspace.execute(command).await {
            Ok(Step::Continue(out)) => {
                writer.write_all(out.as_bytes()).await?;
                writer.write_all(b"\n").await?;
            }
            Ok(Step::Quit) => break "quit",
            Err(e) => {
                warn!(target: "runtime", error = %e, "command_failed");
                writer.write_all(format!("error: {e:#}\n").as_bytes()).await?;
            }
        }
        writer.flush().await?;
    };
    info!(target: "runtime", reason, handled, "interactive_finished");
    Ok(())
}
