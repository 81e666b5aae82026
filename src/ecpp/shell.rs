//! Line-oriented interactive front end for the [`Orchestrator`].

use crate::ecpp::orchestrator::Orchestrator;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub const BANNER: &str = "\nMCP Client Started!\nType your queries or 'quit' to exit.\n";
pub const PROMPT: &str = "\nQuery: ";

/// `quit` in any letter case, surrounding whitespace ignored.
pub fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("quit")
}

/// Read queries from `input` until `quit` or end of input, writing each
/// answer (or error) to `output`. Query failures do not end the session.
pub async fn run_shell<R, W>(
    orchestrator: &mut Orchestrator,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(BANNER.as_bytes()).await?;
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        if is_quit(&line) {
            break;
        }

        let reply = match orchestrator.process_query(&line).await {
            Ok(answer) => format!("\n{}\n", answer),
            Err(e) => format!("\nError: {}\n", e),
        };
        output.write_all(reply.as_bytes()).await?;
    }

    output.flush().await?;
    Ok(())
}
