//! Engine client and the line-mode REPL on top of it.

use std::time::{Duration, Instant};

use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::DEFAULT_MAX_QUERY_BYTES;
use crate::error::{JobdexError, Result};
use crate::query::projector::NOT_AVAILABLE;
use crate::transport::{GREETING, read_text_frame, write_frame};

pub const PROMPT: &str = "jobdex> ";

/// Shown instead of the bare `NA` sentinel.
pub const NO_MATCH_MESSAGE: &str = "no postings match all criteria";

const RETRY_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct Client {
    stream: TcpStream,
    max_query_bytes: usize,
    max_response_bytes: usize,
}

impl Client {
    /// Connect and wait for the engine greeting, all within `timeout`.
    pub async fn connect(addr: &str, timeout: Duration, max_response_bytes: usize) -> Result<Self> {
        tokio::time::timeout(timeout, Self::handshake(addr, max_response_bytes))
            .await
            .map_err(|_| {
                JobdexError::Transport(format!(
                    "engine at {addr} did not answer within {}",
                    humantime_serde::re::humantime::format_duration(timeout)
                ))
            })?
    }

    /// Keep trying to connect until the engine answers or `timeout` passes.
    /// Used while an engine process is still starting.
    pub async fn connect_with_retry(
        addr: &str,
        timeout: Duration,
        max_response_bytes: usize,
    ) -> Result<Self> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match Self::connect(addr, remaining.max(RETRY_INTERVAL), max_response_bytes).await {
                Ok(client) => return Ok(client),
                Err(err) if Instant::now() + RETRY_INTERVAL < deadline => {
                    debug!(%addr, error = %err, "engine not ready yet");
                    tokio::time::sleep(RETRY_INTERVAL).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn handshake(addr: &str, max_response_bytes: usize) -> Result<Self> {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|err| JobdexError::Transport(format!("connect {addr}: {err}")))?;
        match read_text_frame(&mut stream, GREETING.len()).await? {
            Some(greeting) if greeting == GREETING => {}
            other => {
                return Err(JobdexError::Transport(format!(
                    "unexpected greeting from {addr}: {other:?}"
                )));
            }
        }
        info!(%addr, "connected to engine");
        Ok(Self {
            stream,
            max_query_bytes: DEFAULT_MAX_QUERY_BYTES,
            max_response_bytes,
        })
    }

    /// Largest query the engine accepts; longer ones are refused locally.
    #[must_use]
    pub const fn with_max_query_bytes(mut self, max_query_bytes: usize) -> Self {
        self.max_query_bytes = max_query_bytes;
        self
    }

    #[must_use]
    pub const fn max_query_bytes(&self) -> usize {
        self.max_query_bytes
    }

    /// Send one query and wait for its response text. A query over the
    /// engine limit is rejected without being sent.
    pub async fn query(&mut self, query: &str) -> Result<String> {
        if query.len() > self.max_query_bytes {
            return Err(JobdexError::Transport(format!(
                "query of {} bytes exceeds the engine limit of {}",
                query.len(),
                self.max_query_bytes
            )));
        }
        write_frame(&mut self.stream, query.as_bytes()).await?;
        read_text_frame(&mut self.stream, self.max_response_bytes)
            .await?
            .ok_or_else(|| JobdexError::Transport("engine closed the connection".to_string()))
    }
}

/// Outcome of one REPL session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplSummary {
    pub queries: u64,
    pub no_match: u64,
}

/// Read queries line by line from `input` until EOF, `quit` or `exit`.
/// A transport failure ends the session with that error.
pub async fn run_repl<R, W>(client: &mut Client, input: R, output: &mut W) -> Result<ReplSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut summary = ReplSummary::default();
    write_help(output).await?;

    loop {
        output.write_all(PROMPT.bold().to_string().as_bytes()).await?;
        output.flush().await?;
        let Some(line) = lines.next_line().await? else {
            output.write_all(b"\n").await?;
            break;
        };

        match line.trim() {
            "" => {
                let hint = "enter up to three skills separated by ';' (help for usage)";
                writeln(output, &hint.dimmed().to_string()).await?;
            }
            "quit" | "exit" => break,
            "help" => write_help(output).await?,
            query if query.len() > client.max_query_bytes() => {
                let hint = format!(
                    "query is {} bytes, the engine accepts at most {}",
                    query.len(),
                    client.max_query_bytes()
                );
                writeln(output, &hint.yellow().to_string()).await?;
            }
            query => {
                let response = client.query(query).await?;
                summary.queries += 1;
                if response == NOT_AVAILABLE {
                    summary.no_match += 1;
                    writeln(output, &NO_MATCH_MESSAGE.yellow().to_string()).await?;
                } else {
                    writeln(output, &response).await?;
                }
            }
        }
    }

    output.flush().await?;
    Ok(summary)
}

async fn write_help<W: AsyncWrite + Unpin>(output: &mut W) -> Result<()> {
    let help = [
        "Query up to three skills at once, separated by ';'.".to_string(),
        format!("  {}   exact, then case-insensitive, then sub-term match", "Java".cyan()),
        format!("  {}   quoted terms match exactly", "\"C++\"".cyan()),
        format!("  {}   records having every skill", "Go;Rust;Docker".cyan()),
        "Type help for this message, quit or exit to leave.".to_string(),
    ];
    for line in help {
        writeln(output, &line).await?;
    }
    Ok(())
}

async fn writeln<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Minimal engine stand-in: greets, then echoes queries in upper case
    /// and answers `NA` to `none`.
    async fn fake_engine() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            write_frame(&mut stream, GREETING.as_bytes()).await.unwrap();
            while let Ok(Some(query)) = read_text_frame(&mut stream, 1024).await {
                let reply = if query == "none" {
                    NOT_AVAILABLE.to_string()
                } else {
                    query.to_uppercase()
                };
                write_frame(&mut stream, reply.as_bytes()).await.unwrap();
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_query_roundtrip() {
        let addr = fake_engine().await;
        let mut client = Client::connect(&addr, Duration::from_secs(5), 1024)
            .await
            .unwrap();
        assert_eq!(client.query("go;rust").await.unwrap(), "GO;RUST");
    }

    #[tokio::test]
    async fn test_repl_session() {
        let addr = fake_engine().await;
        let mut client = Client::connect(&addr, Duration::from_secs(5), 1024)
            .await
            .unwrap();
        let input: &[u8] = b"java\n\nnone\nhelp\nquit\nignored\n";
        let mut output = Vec::new();
        let summary = run_repl(&mut client, input, &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(summary.queries, 2);
        assert_eq!(summary.no_match, 1);
        assert!(text.contains("JAVA"));
        assert!(text.contains(NO_MATCH_MESSAGE));
        assert!(text.contains("separated by ';'"));
        assert!(!text.contains("IGNORED"));
    }

    #[tokio::test]
    async fn test_long_line_keeps_session_open() {
        let addr = fake_engine().await;
        let client = Client::connect(&addr, Duration::from_secs(5), 1024)
            .await
            .unwrap();
        let mut client = client.with_max_query_bytes(16);
        let input = format!("{}\njava\n", "x".repeat(2000));
        let mut output = Vec::new();
        let summary = run_repl(&mut client, input.as_bytes(), &mut output)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(summary.queries, 1);
        assert!(text.contains("2000 bytes"));
        assert!(text.contains("JAVA"));
    }

    #[tokio::test]
    async fn test_oversized_query_not_sent() {
        let addr = fake_engine().await;
        let mut client = Client::connect(&addr, Duration::from_secs(5), 1024)
            .await
            .unwrap()
            .with_max_query_bytes(4);
        assert!(matches!(
            client.query("Java;Go").await,
            Err(JobdexError::Transport(_))
        ));
        assert_eq!(client.query("Go").await.unwrap(), "GO");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        let err = Client::connect(&addr, Duration::from_secs(1), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, JobdexError::Transport(_)));
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        let started = Instant::now();
        let result = Client::connect_with_retry(&addr, Duration::from_millis(300), 1024).await;
        assert!(result.is_err());
        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}
