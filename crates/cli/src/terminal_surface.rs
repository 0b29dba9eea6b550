use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use agetally_core::classification::domain::tally::Tally;
use agetally_core::pipeline::output_surface::{Notice, OutputSurface};
use agetally_core::shared::photo::Photo;

pub struct SurfaceOptions {
    /// Print counts as a JSON object instead of text.
    pub json: bool,
    /// Where to save the published photo.
    pub output: Option<PathBuf>,
    /// Open the published photo in the platform viewer.
    pub show: bool,
    /// Wait for Enter on blocking notices.
    pub interactive: bool,
}

/// Terminal rendition of the output surface: counts on `out`, notices and
/// errors on stderr.
pub struct TerminalSurface<W: Write> {
    out: W,
    options: SurfaceOptions,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, options: SurfaceOptions) -> Self {
        Self { out, options }
    }

    fn write_counts(&mut self, tally: Tally) -> Result<(), Box<dyn std::error::Error>> {
        if self.options.json {
            writeln!(self.out, "{}", serde_json::to_string(&tally)?)?;
        } else {
            writeln!(self.out, "Adults: {}", tally.adults)?;
            writeln!(self.out, "Kids: {}", tally.kids)?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Saves and/or opens the photo. Returns where it ended up, if anywhere.
    fn publish_photo(&self, photo: &Photo) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
        let saved = match &self.options.output {
            Some(path) => {
                save_photo(photo, path)?;
                log::info!("Saved photo to {}", path.display());
                Some(path.clone())
            }
            None => None,
        };

        if self.options.show {
            let path = match saved {
                Some(path) => path,
                None => {
                    let file = tempfile::Builder::new()
                        .prefix("agetally")
                        .suffix(".jpg")
                        .tempfile()?;
                    let (_, path) = file.keep().map_err(|e| e.error)?;
                    save_photo(photo, &path)?;
                    path
                }
            };
            log::debug!("Opening {}", path.display());
            open::that(&path)?;
            return Ok(Some(path));
        }
        Ok(saved)
    }
}

impl<W: Write> OutputSurface for TerminalSurface<W> {
    fn show_counts(&mut self, adults: u32, kids: u32) {
        if let Err(e) = self.write_counts(Tally { adults, kids }) {
            log::error!("Failed to print counts: {e}");
        }
    }

    fn show_photo(&mut self, photo: &Photo) {
        match self.publish_photo(photo) {
            Ok(Some(_)) => {}
            Ok(None) => eprintln!(
                "Photo ({}x{}) not kept; pass --output or --show to see it",
                photo.width(),
                photo.height()
            ),
            Err(e) => eprintln!("Could not display photo: {e}"),
        }
    }

    fn notify(&mut self, notice: Notice) {
        eprintln!("{notice}");
        if notice.is_blocking() && self.options.interactive {
            eprint!("Press Enter to continue...");
            let mut line = String::new();
            let _ = io::stdin().lock().read_line(&mut line);
        }
    }

    fn report_error(&mut self, message: &str) {
        eprintln!("Error: {message}");
    }
}

fn save_photo(photo: &Photo, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    photo.to_rgb_image().save(path)?;
    Ok(())
}
