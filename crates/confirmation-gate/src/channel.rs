//! Operator-facing speech I/O
//!
//! Transcription and playback live outside this crate. A channel hands the
//! gate finished utterances and answers as text and speaks whatever the gate
//! gives it.

use crate::{GateError, Result};
use async_trait::async_trait;
use confirm_composer::ConfirmationText;
use intent_parser::Utterance;
use std::collections::VecDeque;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};

#[async_trait]
pub trait OperatorChannel: Send {
    /// Next command from the operator
    async fn capture_utterance(&mut self) -> Result<Utterance>;

    /// Speak the read-back of an interpreted command
    async fn present_confirmation(&mut self, text: &ConfirmationText) -> Result<()>;

    /// The operator's answer to the last confirmation
    async fn capture_response(&mut self) -> Result<String>;

    /// Speak a status message
    async fn notify(&mut self, message: &str) -> Result<()>;
}

/// Line-oriented channel: one utterance or answer per input line
pub struct ConsoleChannel<R, W> {
    lines: Lines<R>,
    out: W,
}

impl ConsoleChannel<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsoleChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
        }
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        self.out.write_all(format!("robot> {}\n", text).as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self, prompt: &str) -> Result<String> {
        self.out.write_all(prompt.as_bytes()).await?;
        self.out.flush().await?;
        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(GateError::ChannelClosed),
        }
    }
}

#[async_trait]
impl<R, W> OperatorChannel for ConsoleChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn capture_utterance(&mut self) -> Result<Utterance> {
        let line = self.read_line("you> ").await?;
        Ok(Utterance::new(line))
    }

    async fn present_confirmation(&mut self, text: &ConfirmationText) -> Result<()> {
        self.say(text.as_str()).await
    }

    async fn capture_response(&mut self) -> Result<String> {
        self.read_line("you (yes/no)> ").await
    }

    async fn notify(&mut self, message: &str) -> Result<()> {
        self.say(message).await
    }
}

/// Who said a line of a scripted transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Operator(String),
    Robot(String),
}

/// Replays queued utterances and answers and records everything said
///
/// Running out of queued input closes the channel.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    utterances: VecDeque<String>,
    responses: VecDeque<String>,
    transcript: Vec<Line>,
}

impl ScriptedChannel {
    pub fn new<U, R>(utterances: U, responses: R) -> Self
    where
        U: IntoIterator,
        U::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            utterances: utterances.into_iter().map(Into::into).collect(),
            responses: responses.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[Line] {
        &self.transcript
    }

    /// Everything the robot said, in order
    pub fn spoken(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter_map(|line| match line {
                Line::Robot(text) => Some(text.as_str()),
                Line::Operator(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl OperatorChannel for ScriptedChannel {
    async fn capture_utterance(&mut self) -> Result<Utterance> {
        let text = self.utterances.pop_front().ok_or(GateError::ChannelClosed)?;
        self.transcript.push(Line::Operator(text.clone()));
        Ok(Utterance::new(text))
    }

    async fn present_confirmation(&mut self, text: &ConfirmationText) -> Result<()> {
        self.transcript.push(Line::Robot(text.to_string()));
        Ok(())
    }

    async fn capture_response(&mut self) -> Result<String> {
        let text = self.responses.pop_front().ok_or(GateError::ChannelClosed)?;
        self.transcript.push(Line::Operator(text.clone()));
        Ok(text)
    }

    async fn notify(&mut self, message: &str) -> Result<()> {
        self.transcript.push(Line::Robot(message.to_string()));
        Ok(())
    }
}
