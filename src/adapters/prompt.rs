//! Interactive confirmation on the terminal

use crate::domain::ports::Confirmer;
use crate::error::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// Asks `[y/N]` on a writer and reads the answer from a reader
pub struct PromptConfirmer<R, W> {
    io: Mutex<(R, W)>,
}

/// Prompt bound to the process's stdin/stdout
pub type StdinConfirmer = PromptConfirmer<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

impl StdinConfirmer {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> PromptConfirmer<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }
}

/// Only an explicit yes counts
fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl<R, W> Confirmer for PromptConfirmer<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn confirm(&self, prompt: &str) -> Result<bool> {
        let mut io = self.io.lock().await;
        let (reader, writer) = &mut *io;

        writer.write_all(format!("{} [y/N] ", prompt).as_bytes()).await?;
        writer.flush().await?;

        let mut input = String::new();
        reader.read_line(&mut input).await?;
        Ok(is_yes(&input))
    }
}
