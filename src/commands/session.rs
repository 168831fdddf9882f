use crate::commands::results_view;
use crate::error::{AppError, ClassifyError};
use crate::models::classify_types::{ClassifyRequest, ImageId, Phase, PredictionResult};
use crate::services::classifier::client::PredictionClient;
use crate::services::controller::{ClassificationController, ResponseOutcome};
use crate::services::image_picker::{FileInput, ImagePicker};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const HELP: &str = "\
Commands:
  open <path>   pick an image and classify it (PNG, JPEG, GIF, WebP, BMP,
                TIFF...; SVG and unknown extensions are ignored)
  redraw        show the current image again
  reset         clear the image and its predictions
  status        show where the current classification stands
  health        ask the inference service whether it is up
  help          show this list
  quit          leave immediately";

/// An answer from the inference service, delivered back to the loop.
enum Response {
    Classified(ImageId, Result<Vec<PredictionResult>, ClassifyError>),
    Health(Result<String, ClassifyError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// `None` is a dismissed picker.
    Open(Option<PathBuf>),
    Redraw,
    Reset,
    Status,
    Health,
    Help,
    Quit,
}

/// `Ok(None)` for blank lines.
pub fn parse_command(line: &str) -> Result<Option<SessionCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "open" if rest.is_empty() => SessionCommand::Open(None),
        "open" => SessionCommand::Open(Some(PathBuf::from(rest))),
        "redraw" => SessionCommand::Redraw,
        "reset" => SessionCommand::Reset,
        "status" => SessionCommand::Status,
        "health" => SessionCommand::Health,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        other => return Err(format!("Unknown command `{}`. Type `help` for a list.", other)),
    };

    Ok(Some(command))
}

fn dispatch<'a, C: PredictionClient>(client: &'a C, request: ClassifyRequest) -> LocalBoxFuture<'a, Response> {
    let image_id = request.image_id;
    async move { Response::Classified(image_id, client.classify(request).await) }.boxed_local()
}

fn dispatch_health<C: PredictionClient>(client: &C) -> LocalBoxFuture<'_, Response> {
    async move { Response::Health(client.health().await) }.boxed_local()
}

/// Hosts the classification lifecycle on one thread: user commands and
/// inference responses are handled strictly one at a time.
pub struct Session<W> {
    controller: ClassificationController,
    picker: ImagePicker,
    file_input: FileInput,
    out: W,
}

impl<W: Write> Session<W> {
    pub fn new(out: W) -> Self {
        Self {
            controller: ClassificationController::new(),
            picker: ImagePicker::new(),
            file_input: FileInput::new(),
            out,
        }
    }

    pub fn controller(&self) -> &ClassificationController {
        &self.controller
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Runs until `quit`, or until the command stream ends and every request
    /// already sent has been answered.
    pub async fn run<C, S>(&mut self, client: &C, mut commands: S) -> Result<(), AppError>
    where
        C: PredictionClient,
        S: Stream<Item = std::io::Result<String>> + Unpin,
    {
        let mut pending: FuturesUnordered<LocalBoxFuture<'_, Response>> = FuturesUnordered::new();
        let mut input_open = true;

        loop {
            if !input_open && pending.is_empty() {
                break;
            }

            tokio::select! {
                line = commands.next(), if input_open => {
                    let Some(line) = line else {
                        debug!(pending = pending.len(), "command input closed");
                        input_open = false;
                        continue;
                    };

                    let command = match parse_command(&line?) {
                        Ok(Some(command)) => command,
                        Ok(None) => continue,
                        Err(message) => {
                            writeln!(self.out, "{}", message)?;
                            continue;
                        }
                    };

                    match command {
                        SessionCommand::Quit => break,
                        SessionCommand::Health => pending.push(dispatch_health(client)),
                        command => {
                            if let Some(request) = self.handle(command).await? {
                                writeln!(self.out, "Analyzing image...")?;
                                pending.push(dispatch(client, request));
                            }
                        }
                    }
                }
                Some(response) = pending.next(), if !pending.is_empty() => match response {
                    Response::Classified(image_id, outcome) => self.on_response(image_id, outcome)?,
                    Response::Health(outcome) => self.report_health(outcome)?,
                },
                else => break,
            }
        }

        Ok(())
    }

    async fn handle(&mut self, command: SessionCommand) -> Result<Option<ClassifyRequest>, AppError> {
        match command {
            SessionCommand::Open(path) => self.open(path).await,
            SessionCommand::Redraw => {
                let request = self.render_current()?;
                if self.controller.phase() == Phase::Displayed {
                    write!(self.out, "{}", results_view::render_results(self.controller.results()))?;
                }
                Ok(request)
            }
            SessionCommand::Reset => {
                self.controller.reset();
                self.file_input.clear();
                writeln!(self.out, "Cleared.")?;
                Ok(None)
            }
            SessionCommand::Status => {
                self.print_status()?;
                Ok(None)
            }
            SessionCommand::Help => {
                writeln!(self.out, "{}", HELP)?;
                Ok(None)
            }
            SessionCommand::Health | SessionCommand::Quit => Ok(None),
        }
    }

    async fn open(&mut self, path: Option<PathBuf>) -> Result<Option<ClassifyRequest>, AppError> {
        let Some(path) = self.file_input.changed(path) else {
            debug!("file input unchanged, no selection");
            return Ok(None);
        };

        let picked = self.picker.select_path(Some(&path)).await;
        match picked {
            Ok(Some(image)) => {
                self.file_input.commit(path);
                self.controller.select(image);
                self.render_current()
            }
            Ok(None) => Ok(None),
            Err(e) => {
                info!(path = %path.display(), "selection ignored: {}", e);
                Ok(None)
            }
        }
    }

    /// Draws the preview of the current image and, once it is on screen,
    /// signals the controller.
    fn render_current(&mut self) -> Result<Option<ClassifyRequest>, AppError> {
        let Some(image) = self.controller.image() else {
            return Ok(None);
        };

        let image_id = image.id;
        match results_view::render_preview(image) {
            Ok(preview) => {
                writeln!(self.out, "{}", preview)?;
                Ok(self.controller.render_complete(image_id))
            }
            Err(e) => {
                warn!(image = %image_id, file = %image.file_name, "preview failed: {}", e);
                writeln!(self.out, "Could not display {}.", image.file_name)?;
                Ok(None)
            }
        }
    }

    fn on_response(
        &mut self,
        image_id: ImageId,
        outcome: Result<Vec<PredictionResult>, ClassifyError>,
    ) -> Result<(), AppError> {
        match self.controller.apply_response(image_id, outcome) {
            ResponseOutcome::Displayed => {
                writeln!(self.out, "AI Predictions:")?;
                write!(self.out, "{}", results_view::render_results(self.controller.results()))?;
            }
            ResponseOutcome::Failed => writeln!(self.out, "{}", results_view::NO_PREDICTIONS)?,
            ResponseOutcome::Stale => {}
        }
        Ok(())
    }

    fn print_status(&mut self) -> Result<(), AppError> {
        let status = self.controller.status();
        match &status.file_name {
            Some(file_name) => writeln!(self.out, "Status: {} ({})", status.phase, file_name)?,
            None => writeln!(self.out, "Status: {}", status.phase)?,
        }
        write!(self.out, "{}", results_view::render_results(&status.results))?;
        Ok(())
    }

    fn report_health(&mut self, outcome: Result<String, ClassifyError>) -> Result<(), AppError> {
        match outcome {
            Ok(status) => writeln!(self.out, "Inference service: {}", status)?,
            Err(e) => {
                warn!(kind = e.kind(), "health check failed: {}", e);
                writeln!(self.out, "Inference service unreachable.")?;
            }
        }
        Ok(())
    }
}
