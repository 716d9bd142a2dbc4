//! Terminal front-end
//!
//! Parses console lines into workflow events and renders a [`Projection`]
//! as text, writing the live preview image to the output directory.

use crate::controller::WorkflowController;
use crate::host::{load_file, MediaHost};
use crate::projector::{ObjectsView, Projection, NO_OBJECTS_TEXT};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const HELP_TEXT: &str = "\
Commands:
  open <path>        select an image file
  drop <path>...     drop files on the upload area (first one is used)
  camera             open the camera
  capture            capture the current camera frame
  close              close the camera
  detect             detect objects in the current image
  recipe             generate a recipe from the detected objects
  reset              start over
  show               print the current screen
  help               print this help
  quit               exit";

/// One console line, already parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Open(PathBuf),
    Drop(Vec<PathBuf>),
    Camera,
    Capture,
    Close,
    Detect,
    Recipe,
    Reset,
    Show,
    Help,
    Quit,
}

/// Parse a console line; blank lines yield `Ok(None)`
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "open" | "select" => {
            if rest.is_empty() {
                return Err("usage: open <path>".to_string());
            }
            ConsoleCommand::Open(PathBuf::from(rest))
        }
        "drop" => ConsoleCommand::Drop(rest.split_whitespace().map(PathBuf::from).collect()),
        "camera" => ConsoleCommand::Camera,
        "capture" => ConsoleCommand::Capture,
        "close" => ConsoleCommand::Close,
        "detect" => ConsoleCommand::Detect,
        "recipe" => ConsoleCommand::Recipe,
        "reset" => ConsoleCommand::Reset,
        "show" => ConsoleCommand::Show,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

/// Deliver a command to the controller; returns false on `quit`
///
/// Workflow errors are already in the status line, so they are only logged.
pub fn apply_command(controller: &mut WorkflowController, command: ConsoleCommand) -> bool {
    let result = match command {
        ConsoleCommand::Open(path) => controller.select_file(read_selection(&path)),
        ConsoleCommand::Drop(paths) => {
            controller.drag_over();
            let files = paths.iter().filter_map(|p| read_selection(p)).collect();
            controller.drop_files(files)
        }
        ConsoleCommand::Camera => controller.start_camera(),
        ConsoleCommand::Capture => controller.capture_frame(),
        ConsoleCommand::Close => {
            controller.close_camera();
            Ok(())
        }
        ConsoleCommand::Detect => controller.detect(),
        ConsoleCommand::Recipe => {
            controller.generate_recipe();
            Ok(())
        }
        ConsoleCommand::Reset => {
            controller.reset();
            Ok(())
        }
        ConsoleCommand::Show => Ok(()),
        ConsoleCommand::Help => {
            println!("{}", HELP_TEXT);
            Ok(())
        }
        ConsoleCommand::Quit => return false,
    };

    if let Err(e) = result {
        debug!(error = %e, "Command reported an error");
    }
    true
}

fn read_selection(path: &Path) -> Option<crate::host::SelectedFile> {
    match load_file(path) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!(error = %e, "Could not read file");
            None
        }
    }
}

/// Renders projections to text and the preview to disk
pub struct TerminalRenderer {
    output_dir: PathBuf,
}

impl TerminalRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render `projection`; the preview bytes are written to
    /// `<output_dir>/preview.<ext>` when a preview is visible
    pub fn render(&self, projection: &Projection, host: &dyn MediaHost) -> std::io::Result<String> {
        let mut out = String::new();
        let _ = writeln!(out, "── state: {} ──", projection.state);

        if projection.upload_area_visible {
            let active = if projection.drop_zone_active { " (drop here)" } else { "" };
            let _ = writeln!(out, "upload area{}", active);
        }
        if let Some(info) = &projection.file_info {
            let _ = writeln!(out, "file: {}", info);
        }
        if projection.camera_area_visible {
            if projection.camera_controls_visible {
                let _ = writeln!(out, "camera: live  [capture] [close]");
            } else {
                let _ = writeln!(out, "camera: waiting for access...");
            }
        }

        if let Some(url) = &projection.preview {
            match host.resolve_object_url(url) {
                Some(image) => {
                    std::fs::create_dir_all(&self.output_dir)?;
                    let path = self.output_dir.join(format!("preview.{}", image.extension()));
                    std::fs::write(&path, &image.bytes)?;
                    let tag = if projection.preview_annotated { " (annotated)" } else { "" };
                    let _ = writeln!(out, "preview{}: {}", tag, path.display());
                }
                None => {
                    warn!(url = %url, "Preview URL no longer resolves");
                }
            }
        }

        match &projection.detected_objects {
            Some(ObjectsView::Labels(labels)) => {
                let _ = writeln!(out, "detected objects:");
                for label in labels {
                    let _ = writeln!(out, "  - {}", label);
                }
            }
            Some(ObjectsView::NoneDetected) => {
                let _ = writeln!(out, "detected objects: {}", NO_OBJECTS_TEXT);
            }
            None => {}
        }

        let _ = writeln!(
            out,
            "[{}]{}  [{}]{}",
            projection.detect_button.label,
            if projection.detect_button.enabled { "" } else { " (disabled)" },
            projection.recipe_button.label,
            if projection.recipe_button.enabled { "" } else { " (disabled)" },
        );

        if let Some(recipe) = &projection.recipe {
            let _ = writeln!(out, "recipe:\n{}", recipe.display_text());
        }
        if let Some(status) = &projection.status {
            let _ = writeln!(out, "status ({}): {}", status.severity, status.text);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(
            parse_command("open /tmp/fridge.jpg").unwrap(),
            Some(ConsoleCommand::Open(PathBuf::from("/tmp/fridge.jpg")))
        );
        assert_eq!(
            parse_command("drop a.png b.png").unwrap(),
            Some(ConsoleCommand::Drop(vec![
                PathBuf::from("a.png"),
                PathBuf::from("b.png")
            ]))
        );
        assert_eq!(parse_command("DETECT").unwrap(), Some(ConsoleCommand::Detect));
        assert_eq!(parse_command("exit").unwrap(), Some(ConsoleCommand::Quit));
    }

    #[test]
    fn test_parse_command_errors() {
        assert!(parse_command("open").is_err());
        assert!(parse_command("bake 180").is_err());
    }

    #[test]
    fn test_empty_drop_parses_to_no_files() {
        assert_eq!(
            parse_command("drop").unwrap(),
            Some(ConsoleCommand::Drop(Vec::new()))
        );
    }
}
