//! Line-oriented terminal front end.
//!
//! Reads one command per line, keeps the draft in a [`Composer`] and drives the
//! [`ChatSession`] through its two send phases so the typing indicator can be
//! shown while the gateway is working.

use std::path::PathBuf;
use std::sync::Arc;

use legends_llm::{Attachment, create_gateway};
use snafu::{ResultExt, Snafu};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::attachments::load_attachments;
use crate::chat::{
    BeginRejection, ChatSession, Composer, EXAMPLE_PROMPTS, Role, SendOutcome, Submit,
    TextSegment, Turn, example_prompt, split_links,
};
use crate::settings::SettingsStore;

pub const ASSISTANT_NAME: &str = "Two Legends Pro";
pub const TYPING_INDICATOR: &str = "Two Legends Pro is typing...";
pub const ERROR_HEADING: &str = "Oops! Something went wrong.";

const HELP: &str = "\
commands:
  <text>            send a message with any queued attachments
  /attach <path>..  queue images, PDFs or text files
  /drop <n>         remove queued attachment n
  /examples         list example prompts
  /<n>              send example prompt n
  /key <api-key>    save an API key to the settings file
  /help             show this help
  /quit             leave";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AppError {
    #[snafu(display("terminal i/o failed on `{stage}`: {source}"))]
    Terminal {
        stage: &'static str,
        source: std::io::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum CommandError {
    #[snafu(display("unknown command '/{name}', try /help"))]
    UnknownCommand { name: String },
    #[snafu(display("/{command} needs an argument"))]
    MissingArgument { command: &'static str },
    #[snafu(display("'{value}' is not a valid number"))]
    InvalidIndex { value: String },
}

/// One parsed input line. Indices are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Message(String),
    Attach(Vec<PathBuf>),
    Drop(usize),
    Examples,
    Example(usize),
    SaveKey(String),
    Help,
    Quit,
    Blank,
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Blank);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Message(line.to_string()));
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };

    match name {
        "attach" => {
            if argument.is_empty() {
                return MissingArgumentSnafu { command: "attach" }.fail();
            }
            Ok(Command::Attach(
                argument.split_whitespace().map(PathBuf::from).collect(),
            ))
        }
        "drop" => {
            if argument.is_empty() {
                return MissingArgumentSnafu { command: "drop" }.fail();
            }
            parse_index(argument).map(Command::Drop)
        }
        "key" => {
            if argument.is_empty() {
                return MissingArgumentSnafu { command: "key" }.fail();
            }
            Ok(Command::SaveKey(argument.to_string()))
        }
        "examples" => Ok(Command::Examples),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        digits if digits.chars().all(|c| c.is_ascii_digit()) => {
            parse_index(digits).map(Command::Example)
        }
        other => UnknownCommandSnafu { name: other }.fail(),
    }
}

/// Parses a one-based index as typed by the user.
fn parse_index(value: &str) -> Result<usize, CommandError> {
    value
        .parse::<usize>()
        .ok()
        .and_then(|index| index.checked_sub(1))
        .ok_or_else(|| CommandError::InvalidIndex {
            value: value.to_string(),
        })
}

pub fn speaker_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Model => ASSISTANT_NAME,
    }
}

/// Renders turn text with bare links set off in angle brackets.
pub fn render_text(text: &str) -> String {
    split_links(text)
        .into_iter()
        .map(|segment| match segment {
            TextSegment::Plain(plain) => plain.to_string(),
            TextSegment::Link(link) => format!("<{link}>"),
        })
        .collect()
}

fn render_attachment(attachment: &Attachment) -> String {
    format!("{} ({})", attachment.name, attachment.mime_type)
}

pub fn render_turn(turn: &Turn) -> String {
    let mut rendered = format!("{}:", speaker_label(turn.role));

    if !turn.text.is_empty() {
        rendered.push(' ');
        rendered.push_str(&render_text(&turn.text));
    }

    for attachment in &turn.attachments {
        rendered.push_str("\n  [attached] ");
        rendered.push_str(&render_attachment(attachment));
    }

    if !turn.sources.is_empty() {
        rendered.push_str("\n  Sources:");
        for (position, source) in turn.sources.iter().enumerate() {
            rendered.push_str(&format!("\n  {}. {} <{}>", position + 1, source.title, source.uri));
        }
    }

    rendered
}

pub fn render_error_banner(message: &str) -> String {
    format!("{ERROR_HEADING}\n{message}")
}

pub fn render_examples() -> String {
    EXAMPLE_PROMPTS
        .iter()
        .enumerate()
        .map(|(position, prompt)| format!("  /{} {prompt}", position + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_draft(composer: &Composer) -> String {
    if composer.attachments().is_empty() {
        return "no attachments queued".to_string();
    }

    composer
        .attachments()
        .iter()
        .enumerate()
        .map(|(position, attachment)| {
            format!("  {}. {}", position + 1, render_attachment(attachment))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether the read loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    session: ChatSession,
    composer: Composer,
    settings: Option<SettingsStore>,
}

impl App {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session,
            composer: Composer::new(),
            settings: None,
        }
    }

    /// An app that can persist settings changes made with `/key`.
    pub fn with_settings(session: ChatSession, settings: SettingsStore) -> Self {
        Self {
            settings: Some(settings),
            ..Self::new(session)
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub async fn run<R, W>(&mut self, input: R, output: &mut W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        emit(
            output,
            &format!("{ASSISTANT_NAME}. Ask anything, or try one of these:\n{}", render_examples()),
        )
        .await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await.context(TerminalSnafu {
            stage: "read-input-line",
        })? {
            let flow = match parse_command(&line) {
                Ok(command) => self.handle(command, output).await?,
                Err(error) => {
                    emit(output, &error.to_string()).await?;
                    Flow::Continue
                }
            };

            if flow == Flow::Quit {
                break;
            }
        }

        tracing::info!(turns = self.session.store().len(), "terminal session closed");
        Ok(())
    }

    pub async fn handle<W>(&mut self, command: Command, output: &mut W) -> AppResult<Flow>
    where
        W: AsyncWrite + Unpin,
    {
        match command {
            Command::Blank => {}
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => emit(output, HELP).await?,
            Command::Examples => {
                if self.session.shows_example_prompts() {
                    emit(output, &render_examples()).await?;
                } else {
                    emit(output, "example prompts are only offered on a new conversation").await?;
                }
            }
            Command::Example(index) => {
                let prompt = example_prompt(index).filter(|_| self.session.shows_example_prompts());
                match prompt {
                    Some(prompt) => self.submit(Submit::prompt_only(prompt), output).await?,
                    None => emit(output, "no such example prompt").await?,
                }
            }
            Command::Attach(paths) => match load_attachments(paths).await {
                Ok(attachments) => {
                    self.composer.add_attachments(attachments);
                    emit(output, &render_draft(&self.composer)).await?;
                }
                Err(error) => emit(output, &format!("could not attach: {error}")).await?,
            },
            Command::SaveKey(api_key) => self.save_api_key(&api_key, output).await?,
            Command::Drop(index) => match self.composer.remove_attachment(index) {
                Some(removed) => {
                    emit(output, &format!("removed {}", removed.name)).await?;
                    emit(output, &render_draft(&self.composer)).await?;
                }
                None => emit(output, "no such attachment").await?,
            },
            Command::Message(text) => {
                self.composer.set_prompt(text);
                match self.composer.submit(self.session.store().is_busy()) {
                    Some(submit) => self.submit(submit, output).await?,
                    None => emit(output, "nothing to send").await?,
                }
            }
        }

        Ok(Flow::Continue)
    }

    async fn submit<W>(&mut self, submit: Submit, output: &mut W) -> AppResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let in_flight = match self.session.begin_send(submit) {
            Ok(in_flight) => in_flight,
            Err(BeginRejection::Busy) => return emit(output, "still waiting on the last answer").await,
            Err(BeginRejection::EmptyTurn) => return emit(output, "nothing to send").await,
        };

        if let Some(turn) = self.session.store().last() {
            emit(output, &render_turn(turn)).await?;
        }
        if self.session.is_waiting_for_model() {
            emit(output, TYPING_INDICATOR).await?;
        }

        let gateway = Arc::clone(self.session.gateway());
        let result = gateway.run_query(in_flight.request).await;

        match self.session.settle(in_flight.pending, result) {
            SendOutcome::Answered { .. } => {
                if let Some(turn) = self.session.store().last() {
                    emit(output, &render_turn(turn)).await?;
                }
            }
            SendOutcome::Failed { message } => {
                emit(output, &render_error_banner(&message)).await?
            }
            SendOutcome::Ignored(_) => {}
        }

        Ok(())
    }

    async fn save_api_key<W>(&mut self, api_key: &str, output: &mut W) -> AppResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let Some(settings) = &self.settings else {
            return emit(output, "settings cannot be saved in this session").await;
        };

        let saved = match settings.save_api_key(api_key).await {
            Ok(saved) => saved,
            Err(error) => return emit(output, &format!("could not save API key: {error}")).await,
        };

        match create_gateway(saved.to_provider_config()) {
            Ok(gateway) => {
                self.session.set_gateway(gateway);
                let notice = format!("API key saved to {}", settings.config_path().display());
                emit(output, &notice).await
            }
            Err(error) => emit(output, &format!("API key saved but not applied: {error}")).await,
        }
    }
}

async fn emit<W>(output: &mut W, text: &str) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    output
        .write_all(format!("{text}\n").as_bytes())
        .await
        .context(TerminalSnafu {
            stage: "write-output",
        })?;
    output.flush().await.context(TerminalSnafu {
        stage: "flush-output",
    })
}
