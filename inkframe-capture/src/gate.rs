//! Change-gated atomic frame persistence.
//!
//! ## `offer` — decision protocol
//!
//! 1. SHA-256 hash the incoming frame.
//! 2. No previous frame → save (first run).
//! 3. Digest matches the previous frame → skip without decoding.
//! 4. Pixel-diff against the previous frame → save iff the changed ratio
//!    exceeds the threshold; a comparison failure saves conservatively.
//! 5. Save = write `<path>.inkframe.tmp`, rename over the canonical path.
//! 6. Replace the retained previous frame only after a successful rename.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use inkframe_renderer::Frame;

use crate::diff::{change_ratio, CHANGE_RATIO_THRESHOLD};
use crate::error::{io_err, CaptureError};

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Outcome of offering one frame to the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Nothing to compare against yet; saved.
    SavedFirst,
    /// Changed beyond the threshold; saved.
    Saved { change_ratio: f64 },
    /// The frames could not be compared; saved conservatively.
    SavedUncomparable { reason: String },
    /// Byte-identical to the previous frame; skipped without decoding.
    Identical,
    /// Changed below the threshold; skipped.
    Unchanged { change_ratio: f64 },
}

impl CaptureOutcome {
    /// Whether this outcome wrote the canonical file.
    pub fn saved(&self) -> bool {
        matches!(
            self,
            CaptureOutcome::SavedFirst
                | CaptureOutcome::Saved { .. }
                | CaptureOutcome::SavedUncomparable { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// CaptureGate
// ---------------------------------------------------------------------------

struct PreviousFrame {
    digest: String,
    png: Vec<u8>,
}

/// Owns the previous accepted frame and the canonical output path.
pub struct CaptureGate {
    output_path: PathBuf,
    previous: Option<PreviousFrame>,
    frames_saved: u64,
    last_saved_at: Option<DateTime<Utc>>,
}

impl CaptureGate {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            previous: None,
            frames_saved: 0,
            last_saved_at: None,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn frames_saved(&self) -> u64 {
        self.frames_saved
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    /// Offer one captured frame; persist it iff it meaningfully changed.
    ///
    /// On error the previous frame is retained, so the next tick retries
    /// the same comparison and write naturally.
    pub fn offer(&mut self, frame: &Frame) -> Result<CaptureOutcome, CaptureError> {
        let digest = {
            let mut h = Sha256::new();
            h.update(frame.bytes());
            hex::encode(h.finalize())
        };

        let outcome = match &self.previous {
            None => {
                tracing::info!("first frame, saving");
                CaptureOutcome::SavedFirst
            }
            Some(prev) if prev.digest == digest => {
                tracing::debug!("frame byte-identical, skipping");
                return Ok(CaptureOutcome::Identical);
            }
            Some(prev) => match change_ratio(&prev.png, frame.bytes()) {
                Ok(ratio) if ratio > CHANGE_RATIO_THRESHOLD => {
                    tracing::info!("change detected ({:.2}%), saving", ratio * 100.0);
                    CaptureOutcome::Saved {
                        change_ratio: ratio,
                    }
                }
                Ok(ratio) => {
                    tracing::debug!("change below threshold ({:.2}%)", ratio * 100.0);
                    return Ok(CaptureOutcome::Unchanged {
                        change_ratio: ratio,
                    });
                }
                Err(err) => {
                    tracing::warn!("frame comparison failed, saving: {err}");
                    CaptureOutcome::SavedUncomparable {
                        reason: err.to_string(),
                    }
                }
            },
        };

        self.write_atomic(frame.bytes())?;
        self.previous = Some(PreviousFrame {
            digest,
            png: frame.bytes().to_vec(),
        });
        self.frames_saved += 1;
        self.last_saved_at = Some(Utc::now());
        Ok(outcome)
    }

    /// Write to `<path>.inkframe.tmp`, then rename over the canonical path
    /// (atomic on POSIX).
    fn write_atomic(&self, bytes: &[u8]) -> Result<(), CaptureError> {
        let path = &self.output_path;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let tmp = PathBuf::from(format!("{}.inkframe.tmp", path.display()));
        std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;

        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(path, e));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_of(img: &RgbImage) -> Frame {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).expect("encode");
        Frame(out.into_inner())
    }

    fn solid(color: [u8; 3]) -> Frame {
        png_of(&RgbImage::from_pixel(100, 100, Rgb(color)))
    }

    /// A frame with exactly `pixels` out of 10 000 changed far past the
    /// channel delta.
    fn with_changed_pixels(pixels: u32) -> Frame {
        let mut img = RgbImage::from_pixel(100, 100, Rgb([80, 80, 80]));
        for i in 0..pixels {
            img.put_pixel(i % 100, i / 100, Rgb([255, 255, 255]));
        }
        png_of(&img)
    }

    fn gate_in(dir: &TempDir) -> CaptureGate {
        CaptureGate::new(dir.path().join("current_view.png"))
    }

    #[test]
    fn first_frame_always_saves() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = TempDir::new().unwrap();
        let mut gate = gate_in(&dir);
        let frame = solid([80, 80, 80]);

        let outcome = gate.offer(&frame).expect("offer");
        assert_eq!(outcome, CaptureOutcome::SavedFirst);
        assert_eq!(gate.frames_saved(), 1);
        assert!(gate.last_saved_at().is_some());

        let on_disk = fs::read(gate.output_path()).expect("read canonical");
        assert_eq!(on_disk, frame.bytes(), "canonical file holds the full frame");
    }

    #[test]
    fn identical_frame_skips_without_saving() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate_in(&dir);
        let frame = solid([80, 80, 80]);

        gate.offer(&frame).expect("first");
        let outcome = gate.offer(&frame).expect("second");
        assert_eq!(outcome, CaptureOutcome::Identical);
        assert_eq!(gate.frames_saved(), 1);
    }

    #[test]
    fn change_below_threshold_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate_in(&dir);

        gate.offer(&with_changed_pixels(0)).expect("first");
        // 40 of 10 000 pixels = 0.4 % < 0.5 %.
        let outcome = gate.offer(&with_changed_pixels(40)).expect("second");
        assert!(
            matches!(outcome, CaptureOutcome::Unchanged { .. }),
            "got {outcome:?}"
        );
        assert_eq!(gate.frames_saved(), 1);
    }

    #[test]
    fn change_above_threshold_saves() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate_in(&dir);

        gate.offer(&with_changed_pixels(0)).expect("first");
        // 60 of 10 000 pixels = 0.6 % > 0.5 %.
        let changed = with_changed_pixels(60);
        let outcome = gate.offer(&changed).expect("second");
        assert!(outcome.saved(), "got {outcome:?}");
        assert_eq!(gate.frames_saved(), 2);

        let on_disk = fs::read(gate.output_path()).expect("read canonical");
        assert_eq!(on_disk, changed.bytes());
    }

    #[test]
    fn skipped_frame_does_not_replace_the_baseline() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate_in(&dir);

        gate.offer(&with_changed_pixels(0)).expect("first");
        // Two consecutive 0.4 % nudges relative to the baseline: if the
        // baseline advanced on skip, the second offer would read as 0 %.
        gate.offer(&with_changed_pixels(40)).expect("second");
        let outcome = gate.offer(&with_changed_pixels(40)).expect("third");
        assert!(
            matches!(outcome, CaptureOutcome::Unchanged { .. }),
            "baseline must still be the first frame, got {outcome:?}"
        );
    }

    #[test]
    fn malformed_frame_saves_conservatively() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate_in(&dir);

        gate.offer(&solid([80, 80, 80])).expect("first");
        let garbage = Frame(b"definitely not a png".to_vec());
        let outcome = gate.offer(&garbage).expect("second");
        assert!(
            matches!(outcome, CaptureOutcome::SavedUncomparable { .. }),
            "got {outcome:?}"
        );
        let on_disk = fs::read(gate.output_path()).expect("read canonical");
        assert_eq!(on_disk, garbage.bytes());
    }

    #[test]
    fn dimension_mismatch_saves_conservatively() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate_in(&dir);

        gate.offer(&solid([80, 80, 80])).expect("first");
        let resized = png_of(&RgbImage::from_pixel(50, 100, Rgb([80, 80, 80])));
        let outcome = gate.offer(&resized).expect("second");
        assert!(
            matches!(outcome, CaptureOutcome::SavedUncomparable { .. }),
            "got {outcome:?}"
        );
    }

    #[test]
    fn tmp_file_removed_after_save() {
        let dir = TempDir::new().unwrap();
        let mut gate = gate_in(&dir);
        gate.offer(&solid([80, 80, 80])).expect("offer");

        let tmp = PathBuf::from(format!("{}.inkframe.tmp", gate.output_path().display()));
        assert!(!tmp.exists(), ".inkframe.tmp must be cleaned up");
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let mut gate = CaptureGate::new(dir.path().join("nested").join("shared").join("view.png"));
        gate.offer(&solid([80, 80, 80])).expect("offer");
        assert!(gate.output_path().exists());
    }

    #[test]
    #[cfg(unix)]
    fn failed_write_keeps_canonical_file_and_baseline() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mut gate = gate_in(&dir);
        let first = solid([80, 80, 80]);
        gate.offer(&first).expect("first");

        // Make the directory read-only so the tmp write fails.
        let mut perms = fs::metadata(dir.path()).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(dir.path(), perms).unwrap();

        let changed = with_changed_pixels(200);
        let err = gate.offer(&changed).expect_err("write should fail");
        assert!(matches!(err, CaptureError::Io { .. }));

        let mut perms = fs::metadata(dir.path()).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(dir.path(), perms).unwrap();

        let on_disk = fs::read(gate.output_path()).expect("read canonical");
        assert_eq!(on_disk, first.bytes(), "canonical file must be intact");

        // The baseline was not replaced, so the same frame still saves.
        let outcome = gate.offer(&changed).expect("retry");
        assert!(outcome.saved(), "got {outcome:?}");
    }
}
