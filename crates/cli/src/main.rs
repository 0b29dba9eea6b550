#[cfg(feature = "file-dialog")]
mod dialog_picker;
mod settings;
mod terminal_surface;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use agetally_core::acquisition::domain::camera::Camera;
use agetally_core::acquisition::domain::file_picker::FilePicker;
use agetally_core::acquisition::domain::image_source::ImageSource;
use agetally_core::acquisition::infrastructure::capture_source::CaptureSource;
use agetally_core::acquisition::infrastructure::command_camera::CommandCamera;
use agetally_core::acquisition::infrastructure::file_camera::FileCamera;
use agetally_core::acquisition::infrastructure::fixed_path_picker::FixedPathPicker;
use agetally_core::acquisition::infrastructure::select_source::SelectSource;
use agetally_core::classification::domain::age_estimator::AgeEstimator;
use agetally_core::classification::infrastructure::onnx_age_estimator::OnnxAgeEstimator;
use agetally_core::detection::domain::face_detector::FaceDetector;
use agetally_core::detection::infrastructure::onnx_blazeface_detector::OnnxBlazefaceDetector;
use agetally_core::pipeline::classification_session::ClassificationSession;
use agetally_core::pipeline::classify_faces_use_case::{AgeModelGate, ClassifyFacesUseCase};
use agetally_core::pipeline::model_gate::ModelGate;
use agetally_core::pipeline::output_surface::{present, ClassifyMessage, OutputSurface};
use agetally_core::shared::model_resolver::{self, ModelLocation};

use settings::Settings;
use terminal_surface::{SurfaceOptions, TerminalSurface};

/// Count the adults and kids in a photo.
#[derive(Parser)]
#[command(name = "agetally")]
struct Cli {
    #[command(subcommand)]
    source: Source,

    /// Age estimation model file name.
    #[arg(long, global = true)]
    age_model: Option<String>,

    /// Face detection model file name.
    #[arg(long, global = true)]
    detector_model: Option<String>,

    /// Directory holding bundled model files.
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Download URL for the age model if it is not found locally.
    #[arg(long, global = true)]
    age_model_url: Option<String>,

    /// Download URL for the face detection model if it is not found locally.
    #[arg(long, global = true)]
    detector_model_url: Option<String>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, global = true, value_parser = parse_confidence)]
    confidence: Option<f64>,

    /// Save the photo here once the faces are counted.
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Open the photo in the default viewer once the faces are counted.
    #[arg(long, global = true)]
    show: bool,

    /// Print the counts as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Remember the given options for later runs.
    #[arg(long, global = true)]
    save_settings: bool,
}

#[derive(Subcommand)]
enum Source {
    /// Take a new photo with a camera.
    Capture {
        /// Camera command; `{output}` is replaced by the capture file path.
        #[arg(long, conflicts_with = "from")]
        camera_command: Option<String>,

        /// Use an existing photo as the camera shot.
        #[arg(long)]
        from: Option<PathBuf>,

        /// Directory for captured photos (defaults to the pictures folder).
        #[arg(long)]
        target_dir: Option<PathBuf>,
    },
    /// Use an existing photo.
    Select {
        /// Photo to classify. Opens a file dialog when omitted and available.
        path: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Returns whether the run ended without a reported error.
fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = Settings::load();
    apply_overrides(&mut settings, &cli);
    validate(&settings)?;
    if cli.save_settings {
        settings.save();
    }

    // The age model loads while the photo is being taken or picked.
    let age_model = spawn_age_model(&settings);
    let detector = build_detector(&settings)?;
    let mut source = build_source(&cli.source, &settings)?;

    let photo = match source.acquire() {
        Ok(photo) => photo,
        Err(e) if e.is_cancelled() => {
            log::info!("{} cancelled", source.mode());
            return Ok(true);
        }
        Err(e) => return Err(e.into()),
    };

    let mut surface = TerminalSurface::new(
        io::stdout(),
        SurfaceOptions {
            json: cli.json,
            output: cli.output,
            show: cli.show,
            interactive: !cli.json && io::stdin().is_terminal(),
        },
    );

    let mut session = ClassificationSession::new(ClassifyFacesUseCase::new(detector, age_model));
    let messages = session.submit(photo)?;

    Ok(consume(messages.iter(), &mut surface))
}

/// Presents messages until the final one. Returns false if the run failed
/// or ended without a final message.
fn consume(
    messages: impl IntoIterator<Item = ClassifyMessage>,
    surface: &mut dyn OutputSurface,
) -> bool {
    for message in messages {
        let last = message.is_final();
        let failed = matches!(message, ClassifyMessage::Error(_));
        present(message, surface);
        if last {
            return !failed;
        }
    }
    surface.report_error("classification stopped without a result");
    false
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(name) = &cli.age_model {
        settings.age_model = name.clone();
    }
    if let Some(name) = &cli.detector_model {
        settings.detector_model = name.clone();
    }
    if let Some(dir) = &cli.model_dir {
        settings.model_dir = Some(dir.clone());
    }
    if let Some(url) = &cli.age_model_url {
        settings.age_model_url = Some(url.clone());
    }
    if let Some(url) = &cli.detector_model_url {
        settings.detector_model_url = Some(url.clone());
    }
    if let Some(confidence) = cli.confidence {
        settings.confidence = (confidence * 100.0).round() as u32;
    }
    if let Source::Capture {
        camera_command: Some(command),
        ..
    } = &cli.source
    {
        settings.camera_command = Some(command.clone());
    }
}

fn parse_confidence(value: &str) -> Result<f64, String> {
    let confidence: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if (0.0..=1.0).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(format!("confidence must be between 0.0 and 1.0, got {value}"))
    }
}

fn validate(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if settings.age_model.trim().is_empty() || settings.detector_model.trim().is_empty() {
        return Err("Model file names must not be empty".into());
    }
    if let Some(dir) = &settings.model_dir {
        if !dir.is_dir() {
            return Err(format!("Model directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn model_location(name: &str, url: Option<&String>, settings: &Settings) -> ModelLocation {
    ModelLocation {
        url: url.cloned(),
        bundled_dir: settings.model_dir.clone(),
        ..ModelLocation::named(name)
    }
}

fn spawn_age_model(settings: &Settings) -> Arc<AgeModelGate> {
    let location = model_location(
        &settings.age_model,
        settings.age_model_url.as_ref(),
        settings,
    );
    ModelGate::spawn(move || {
        log::info!("Resolving model: {}", location.name);
        let path = model_resolver::resolve(
            &location,
            Some(Box::new(|downloaded: u64, total: u64| {
                download_progress("age estimation", downloaded, total)
            })),
        )
        .map_err(|e| e.to_string())?;
        let estimator = OnnxAgeEstimator::new(&path).map_err(|e| e.to_string())?;
        Ok(Box::new(estimator) as Box<dyn AgeEstimator>)
    })
}

fn build_detector(settings: &Settings) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let location = model_location(
        &settings.detector_model,
        settings.detector_model_url.as_ref(),
        settings,
    );
    log::info!("Resolving model: {}", location.name);
    let model_path = model_resolver::resolve(
        &location,
        Some(Box::new(|downloaded: u64, total: u64| {
            download_progress("face detection", downloaded, total)
        })),
    )?;
    Ok(Box::new(OnnxBlazefaceDetector::new(
        &model_path,
        settings.confidence_threshold(),
    )?))
}

fn build_source(
    source: &Source,
    settings: &Settings,
) -> Result<Box<dyn ImageSource>, Box<dyn std::error::Error>> {
    match source {
        Source::Capture {
            from, target_dir, ..
        } => {
            let camera: Box<dyn Camera> = match (from, &settings.camera_command) {
                (Some(photo), _) => {
                    if !photo.is_file() {
                        return Err(format!("Photo not found: {}", photo.display()).into());
                    }
                    Box::new(FileCamera::new(photo.clone()))
                }
                (None, Some(command)) => Box::new(
                    CommandCamera::parse(command).ok_or("Camera command is empty")?,
                ),
                (None, None) => {
                    return Err("No camera configured: pass --camera-command or --from".into())
                }
            };
            Ok(Box::new(match target_dir {
                Some(dir) => CaptureSource::new(camera, dir.clone()),
                None => CaptureSource::in_pictures_dir(camera),
            }))
        }
        Source::Select { path } => Ok(Box::new(SelectSource::new(build_picker(path.clone())?))),
    }
}

#[cfg(feature = "file-dialog")]
fn build_picker(path: Option<PathBuf>) -> Result<Box<dyn FilePicker>, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => Box::new(FixedPathPicker::new(path)),
        None => Box::new(dialog_picker::DialogFilePicker),
    })
}

#[cfg(not(feature = "file-dialog"))]
fn build_picker(path: Option<PathBuf>) -> Result<Box<dyn FilePicker>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Box::new(FixedPathPicker::new(path))),
        None => Err("No photo given (build with the `file-dialog` feature for a picker)".into()),
    }
}

fn download_progress(label: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {label} model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {label} model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agetally_core::classification::domain::age_estimator::AgeEstimate;
    use agetally_core::classification::domain::tally::Tally;
    use agetally_core::pipeline::output_surface::{ClassifiedPhoto, Notice};
    use agetally_core::shared::photo::Photo;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("agetally").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = parse(&[
            "select",
            "photo.jpg",
            "--age-model",
            "age.onnx",
            "--confidence",
            "0.65",
        ]);
        let mut settings = Settings::default();
        apply_overrides(&mut settings, &cli);

        assert_eq!(settings.age_model, "age.onnx");
        assert_eq!(settings.confidence, 65);
        assert_eq!(settings, Settings {
            age_model: "age.onnx".into(),
            confidence: 65,
            ..Settings::default()
        });
    }

    #[test]
    fn test_camera_command_from_flag() {
        let cli = parse(&["capture", "--camera-command", "snap {output}"]);
        let mut settings = Settings::default();
        apply_overrides(&mut settings, &cli);
        assert_eq!(settings.camera_command.as_deref(), Some("snap {output}"));
    }

    #[test]
    fn test_camera_command_conflicts_with_from() {
        let result = Cli::try_parse_from([
            "agetally",
            "capture",
            "--camera-command",
            "snap",
            "--from",
            "a.jpg",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_capture_without_camera_is_rejected() {
        let cli = parse(&["capture"]);
        let err = build_source(&cli.source, &Settings::default()).err().unwrap();
        assert!(err.to_string().contains("No camera configured"));
    }

    #[test]
    fn test_select_with_path_uses_select_mode() {
        let cli = parse(&["select", "photo.jpg"]);
        let source = build_source(&cli.source, &Settings::default()).unwrap();
        assert_eq!(source.mode().to_string(), "select");
    }

    #[test]
    fn test_missing_model_dir_is_rejected() {
        let settings = Settings {
            model_dir: Some(PathBuf::from("/definitely/not/here")),
            ..Settings::default()
        };
        assert!(validate(&settings).is_err());
        assert!(validate(&Settings::default()).is_ok());
    }

    #[rstest::rstest]
    #[case::nan("NaN")]
    #[case::above_one("1.5")]
    #[case::negative("-0.1")]
    #[case::not_a_number("high")]
    fn test_out_of_range_confidence_is_rejected(#[case] value: &str) {
        let result = Cli::try_parse_from(["agetally", "select", "a.jpg", "--confidence", value]);
        assert!(result.is_err());
    }

    #[test]
    fn test_confidence_bounds_are_accepted() {
        assert_eq!(parse(&["select", "--confidence", "0", "a.jpg"]).confidence, Some(0.0));
        assert_eq!(parse(&["select", "--confidence", "1.0", "a.jpg"]).confidence, Some(1.0));
    }

    #[derive(Default)]
    struct Recorded {
        counts: Vec<(u32, u32)>,
        errors: Vec<String>,
    }

    impl OutputSurface for Recorded {
        fn show_counts(&mut self, adults: u32, kids: u32) {
            self.counts.push((adults, kids));
        }

        fn show_photo(&mut self, _photo: &Photo) {}

        fn notify(&mut self, _notice: Notice) {}

        fn report_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    fn complete() -> ClassifyMessage {
        ClassifyMessage::Complete(ClassifiedPhoto {
            photo: Photo::new(vec![0; 2 * 2 * 3], 2, 2),
            tally: Tally { adults: 1, kids: 0 },
            age: AgeEstimate::from_years(22.0),
            face_count: 1,
        })
    }

    #[test]
    fn test_completed_run_succeeds() {
        let mut surface = Recorded::default();
        assert!(consume(vec![complete()], &mut surface));
        assert_eq!(surface.counts, vec![(1, 0)]);
        assert!(surface.errors.is_empty());
    }

    #[test]
    fn test_error_message_fails_run() {
        let mut surface = Recorded::default();
        assert!(!consume(vec![ClassifyMessage::Error("boom".into())], &mut surface));
        assert_eq!(surface.errors, vec!["boom".to_string()]);
    }

    #[test]
    fn test_disconnect_before_final_message_fails_run() {
        let mut surface = Recorded::default();
        let messages = vec![ClassifyMessage::Notice(Notice::MoreThanOneFace)];
        assert!(!consume(messages, &mut surface));
        assert_eq!(
            surface.errors,
            vec!["classification stopped without a result".to_string()]
        );
    }
}
