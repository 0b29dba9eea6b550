use std::path::Path;
use std::process::Command;

use crate::acquisition::domain::camera::{Camera, CaptureOutcome};

/// Placeholder replaced by the capture target path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Drives an external capture program, e.g. `fswebcam -r 1280x720 {output}`.
///
/// Arguments are split on whitespace. When no `{output}` placeholder is
/// present the target path is appended. A non-zero exit status is a camera
/// failure; exiting cleanly without writing the file counts as backing out.
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
}

impl CommandCamera {
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn command_for(&self, target: &Path) -> Command {
        let target = target.to_string_lossy();
        let mut command = Command::new(&self.program);
        let mut substituted = false;
        for arg in &self.args {
            if arg.contains(OUTPUT_PLACEHOLDER) {
                substituted = true;
                command.arg(arg.replace(OUTPUT_PLACEHOLDER, &target));
            } else {
                command.arg(arg);
            }
        }
        if !substituted {
            command.arg(&*target);
        }
        command
    }
}

impl Camera for CommandCamera {
    fn capture(&mut self, target: &Path) -> std::io::Result<CaptureOutcome> {
        log::info!("Running camera command: {}", self.program);
        let status = self.command_for(target).status()?;
        if !status.success() {
            return Err(std::io::Error::other(format!(
                "camera command `{}` exited with {status}",
                self.program
            )));
        }
        Ok(CaptureOutcome::Captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(command: &Command) -> Vec<String> {
        command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_parse_empty_is_none() {
        assert!(CommandCamera::parse("   ").is_none());
    }

    #[test]
    fn test_placeholder_is_substituted() {
        let camera = CommandCamera::parse("snap -q --out={output} -v").unwrap();
        let command = camera.command_for(Path::new("/tmp/image1.jpg"));
        assert_eq!(command.get_program(), "snap");
        assert_eq!(
            args_of(&command),
            vec!["-q", "--out=/tmp/image1.jpg", "-v"]
        );
    }

    #[test]
    fn test_target_appended_without_placeholder() {
        let camera = CommandCamera::parse("snap -q").unwrap();
        let command = camera.command_for(Path::new("/tmp/image1.jpg"));
        assert_eq!(args_of(&command), vec!["-q", "/tmp/image1.jpg"]);
    }

    #[test]
    fn test_missing_program_is_error() {
        let mut camera = CommandCamera::parse("definitely-not-a-camera-binary-xyz").unwrap();
        assert!(camera.capture(Path::new("/tmp/unused.jpg")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_command_captures() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();
        let target = dir.path().join("image1.jpg");

        let mut camera = CommandCamera::parse(&format!("cp {}", source.display())).unwrap();
        assert_eq!(camera.capture(&target).unwrap(), CaptureOutcome::Captured);
        assert_eq!(std::fs::read(&target).unwrap(), b"jpeg bytes");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_error() {
        let mut camera = CommandCamera::parse("false").unwrap();
        let err = camera.capture(Path::new("/tmp/unused.jpg")).unwrap_err();
        assert!(err.to_string().contains("`false` exited with"));
    }
}
