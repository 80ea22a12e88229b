//! The interactive query loop.

use std::future::Future;
use std::io::{BufRead, Write};

use runtime::{Backend, Conversation, ToolHost};

use crate::error::Result;

/// Anything that can answer a query.
pub trait Responder {
    fn respond(&self, query: &str) -> impl Future<Output = runtime::Result<String>>;
}

impl<B: Backend, T: ToolHost> Responder for Conversation<B, T> {
    async fn respond(&self, query: &str) -> runtime::Result<String> {
        self.process_query(query).await
    }
}

/// Read queries line by line until `quit` or end of input.
///
/// Per-query errors are printed and the loop continues; a lost tool
/// server connection ends it with an error.
pub async fn run<R, W>(responder: &impl Responder, mut input: R, mut output: W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "\nMCP Client Started!")?;
    writeln!(output, "Type your queries or 'quit' to exit.")?;

    loop {
        write!(output, "\nQuery: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let query = line.trim_end_matches(['\r', '\n']);
        if query.trim().is_empty() {
            continue;
        }
        if query.trim().eq_ignore_ascii_case("quit") {
            break;
        }

        match responder.respond(query).await {
            Ok(response) => writeln!(output, "\n{response}")?,
            Err(e) if e.is_transport() => {
                tracing::error!(error = %e, "tool server connection lost");
                return Err(e.into());
            }
            Err(e) => {
                tracing::warn!(error = %e, "query failed");
                writeln!(output, "\nError: {e}")?;
            }
        }
    }

    Ok(())
}
