//! The editing session: current image, one-step undo, audit trail.
//!
//! An [`EditSession`] owns exactly two image slots and a history store:
//!
//! ```text
//!              load                 op (resize, blur, ...)
//!   Empty ─────────────▶ Loaded ──────────────────────▶ Loaded
//!                     (previous = current)            (previous = pre-op state)
//!                            ▲                              │
//!                            └───────────── undo ───────────┘
//!                                   (previous cleared)
//! ```
//!
//! - Every forward operation snapshots `current` into `previous` (overwriting
//!   whatever was there), replaces `current` with the codec's result, and
//!   appends exactly one [`HistoryRecord`].
//! - [`undo`](EditSession::undo) restores `previous` and clears it, so only
//!   one step can ever be undone.
//! - A failed call changes nothing: preconditions are checked and the codec
//!   result computed before any slot is touched, and the history record is
//!   written before commit.
//!
//! `undo` is not written to the history log; the log describes forward
//! operations only.
//!
//! Sessions are single-owner values. Nothing here is global; front-ends hold
//! one session per editing context and serialize their own calls.

use crate::codec::{CodecError, FileFormat, ImageCodec, supported_extensions};
pub use crate::codec::ImageInfo;
use crate::history::{HistoryError, HistoryRecord, HistoryStore, Params};
use crate::operation::Operation;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Unsupported format: {0} (supported: {list})", list = supported_list())]
    UnsupportedFormat(String),
    #[error("No image loaded")]
    NoImageLoaded,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("History write failed: {0}")]
    History(#[from] HistoryError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn supported_list() -> String {
    supported_extensions().collect::<Vec<_>>().join(", ")
}

/// Extension of `path` as the user wrote it, for error messages.
fn describe_extension(path: &Path) -> String {
    match path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()),
        None => path.display().to_string(),
    }
}

/// Stateful editor over one image at a time.
pub struct EditSession<C: ImageCodec> {
    codec: C,
    history: HistoryStore,
    current: Option<C::Image>,
    previous: Option<C::Image>,
    source_path: Option<PathBuf>,
}

impl<C: ImageCodec> EditSession<C> {
    /// An empty session. Nothing is loaded.
    pub fn new(codec: C, history: HistoryStore) -> Self {
        Self {
            codec,
            history,
            current: None,
            previous: None,
            source_path: None,
        }
    }

    /// Remember `path` as the source without decoding it. [`info`](Self::info)
    /// will probe it on disk until something is loaded.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// The current image, for rendering.
    pub fn image(&self) -> Option<&C::Image> {
        self.current.as_ref()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn can_undo(&self) -> bool {
        self.previous.is_some()
    }

    fn record(&self, operation: &str, params: Params) -> Result<(), EngineError> {
        self.history
            .append(HistoryRecord::now(operation, params))
            .map_err(EngineError::from)
    }

    /// Decode `path` into the current slot. `previous` becomes a copy of the
    /// loaded image, so an immediate undo is a visual no-op.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EngineError::NotFound(path.to_path_buf()));
        }
        if FileFormat::from_path(path).is_none() {
            return Err(EngineError::UnsupportedFormat(describe_extension(path)));
        }

        let image = self.codec.decode(path)?;

        let mut params = Params::new();
        params.insert("path".into(), path.display().to_string().into());
        self.record("load", params)?;

        self.previous = Some(image.clone());
        self.current = Some(image);
        self.source_path = Some(path.to_path_buf());

        tracing::debug!(path = %path.display(), "Image loaded");
        Ok(())
    }

    /// Encode the current image to `path`.
    ///
    /// The format is `format` if given, otherwise the one implied by the
    /// extension. Formats without an alpha channel get an alpha-free copy.
    /// Missing parent directories are created.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        format: Option<FileFormat>,
    ) -> Result<(), EngineError> {
        let path = path.as_ref();
        let image = self.current.as_ref().ok_or(EngineError::NoImageLoaded)?;
        let format = format
            .or_else(|| FileFormat::from_path(path))
            .ok_or_else(|| EngineError::UnsupportedFormat(describe_extension(path)))?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        // Either the chosen format or the extension ruling out alpha flattens.
        let alpha_free = !format.supports_alpha()
            || FileFormat::from_path(path).is_some_and(|ext| !ext.supports_alpha());
        if alpha_free && self.codec.describe(image).mode.has_alpha() {
            let flattened = self.codec.remove_alpha(image)?;
            self.codec.encode(&flattened, path, format)?;
        } else {
            self.codec.encode(image, path, format)?;
        }

        let mut params = Params::new();
        params.insert("path".into(), path.display().to_string().into());
        params.insert("format".into(), format.name().into());
        self.record("save", params)?;

        tracing::debug!(path = %path.display(), %format, "Image saved");
        Ok(())
    }

    /// Metadata of the in-memory image, if any. Never touches disk.
    pub fn current_state(&self) -> Option<ImageInfo> {
        self.current.as_ref().map(|image| self.codec.describe(image))
    }

    /// Metadata of the remembered source file, read from disk. Loaded state
    /// is not affected.
    pub fn probe_source_metadata(&self) -> Result<Option<ImageInfo>, EngineError> {
        match &self.source_path {
            Some(path) if !path.exists() => Err(EngineError::NotFound(path.clone())),
            Some(path) => Ok(Some(self.codec.probe(path)?)),
            None => Ok(None),
        }
    }

    /// [`current_state`](Self::current_state), falling back to
    /// [`probe_source_metadata`](Self::probe_source_metadata). `None` when
    /// there is neither an image nor a source path.
    pub fn info(&self) -> Result<Option<ImageInfo>, EngineError> {
        match self.current_state() {
            Some(info) => Ok(Some(info)),
            None => self.probe_source_metadata(),
        }
    }

    /// Run one forward operation.
    pub fn apply(&mut self, op: Operation) -> Result<(), EngineError> {
        let current = self.current.as_ref().ok_or(EngineError::NoImageLoaded)?;
        op.validate().map_err(EngineError::InvalidArgument)?;

        let next = match op {
            Operation::Resize { width, height } => self.codec.resize(current, width, height),
            Operation::Grayscale => self.codec.grayscale(current),
            Operation::Blur { radius } => self.codec.blur(current, radius),
            Operation::Brightness { factor } => self.codec.adjust_brightness(current, factor),
            Operation::Contrast { factor } => self.codec.adjust_contrast(current, factor),
        }?;

        self.record(op.name(), op.params())?;
        self.previous = self.current.replace(next);

        tracing::debug!(%op, "Operation applied");
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.apply(Operation::Resize { width, height })
    }

    pub fn to_grayscale(&mut self) -> Result<(), EngineError> {
        self.apply(Operation::Grayscale)
    }

    pub fn blur(&mut self, radius: f32) -> Result<(), EngineError> {
        self.apply(Operation::Blur { radius })
    }

    pub fn brightness(&mut self, factor: f32) -> Result<(), EngineError> {
        self.apply(Operation::Brightness { factor })
    }

    pub fn contrast(&mut self, factor: f32) -> Result<(), EngineError> {
        self.apply(Operation::Contrast { factor })
    }

    /// Restore the state before the last operation. Returns `false`, changing
    /// nothing, when there is no snapshot to restore.
    pub fn undo(&mut self) -> bool {
        match self.previous.take() {
            Some(previous) => {
                self.current = Some(previous);
                tracing::debug!("Undo applied");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ColorMode;
    use crate::codec::backend::tests::{MockCodec, MockImage, RecordedOp};
    use crate::history::CorruptionPolicy;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        source: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let source = tmp.path().join("photo.png");
            // The mock never reads it; load only checks that it exists.
            fs::write(&source, b"png").unwrap();
            Self { tmp, source }
        }

        fn history_path(&self) -> PathBuf {
            self.tmp.path().join("configs/history.json")
        }

        fn session_with(
            &self,
            codec: MockCodec,
            policy: CorruptionPolicy,
        ) -> EditSession<MockCodec> {
            let history = HistoryStore::open(self.history_path(), policy).unwrap();
            EditSession::new(codec, history)
        }

        fn session(&self) -> EditSession<MockCodec> {
            self.session_with(
                MockCodec::with_image(MockImage::new(200, 150, ColorMode::RGBA)),
                CorruptionPolicy::Repair,
            )
        }

        fn history_ops(&self) -> Vec<String> {
            let raw = fs::read_to_string(self.history_path()).unwrap();
            let records: Vec<HistoryRecord> = serde_json::from_str(&raw).unwrap();
            records.into_iter().map(|r| r.operation).collect()
        }
    }

    fn dims(session: &EditSession<MockCodec>) -> (u32, u32) {
        let info = session.current_state().unwrap();
        (info.width, info.height)
    }

    // =========================================================================
    // load
    // =========================================================================

    #[test]
    fn load_sets_current_and_self_snapshot() {
        let fx = Fixture::new();
        let mut session = fx.session();

        session.load(&fx.source).unwrap();

        assert_eq!(dims(&session), (200, 150));
        assert!(session.can_undo());
        assert_eq!(session.source_path(), Some(fx.source.as_path()));
        assert_eq!(fx.history_ops(), vec!["load"]);
    }

    #[test]
    fn load_records_path_param() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();

        let records = session.history().records().unwrap();
        assert_eq!(
            records[0].params["path"].to_string(),
            fx.source.display().to_string()
        );
    }

    #[test]
    fn undo_right_after_load_keeps_image() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();

        assert!(session.undo());
        assert_eq!(dims(&session), (200, 150));
        assert_eq!(session.image().unwrap().generation, 0);
        assert!(!session.undo());
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let fx = Fixture::new();
        let mut session = fx.session();

        let result = session.load(fx.tmp.path().join("missing.png"));

        assert!(matches!(result, Err(EngineError::NotFound(_))));
        assert!(session.image().is_none());
        assert!(fx.history_ops().is_empty());
    }

    #[test]
    fn load_unsupported_extension() {
        let fx = Fixture::new();
        let webp = fx.tmp.path().join("photo.webp");
        fs::write(&webp, b"webp").unwrap();
        let mut session = fx.session();

        let result = session.load(&webp);

        assert!(matches!(result, Err(EngineError::UnsupportedFormat(ext)) if ext == ".webp"));
        assert!(session.image().is_none());
        assert!(fx.history_ops().is_empty());
    }

    #[test]
    fn unsupported_format_message_lists_extensions() {
        let message = EngineError::UnsupportedFormat(".webp".into()).to_string();
        assert_eq!(
            message,
            "Unsupported format: .webp (supported: png, jpg, jpeg, bmp, gif, tiff)"
        );
    }

    #[test]
    fn load_accepts_uppercase_extension() {
        let fx = Fixture::new();
        let upper = fx.tmp.path().join("PHOTO.JPEG");
        fs::write(&upper, b"jpeg").unwrap();
        let mut session = fx.session();

        session.load(&upper).unwrap();
        assert!(session.image().is_some());
    }

    #[test]
    fn failed_load_keeps_previous_image() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();
        session.resize(10, 10).unwrap();

        assert!(session.load(fx.tmp.path().join("missing.png")).is_err());

        assert_eq!(dims(&session), (10, 10));
        assert_eq!(session.source_path(), Some(fx.source.as_path()));
        assert!(session.undo());
        assert_eq!(dims(&session), (200, 150));
    }

    // =========================================================================
    // forward operations and undo
    // =========================================================================

    #[test]
    fn operations_before_load_are_rejected_without_history() {
        let fx = Fixture::new();
        let mut session = fx.session();

        assert!(matches!(session.resize(5, 5), Err(EngineError::NoImageLoaded)));
        assert!(matches!(session.to_grayscale(), Err(EngineError::NoImageLoaded)));
        assert!(matches!(session.blur(1.0), Err(EngineError::NoImageLoaded)));
        assert!(matches!(session.brightness(1.0), Err(EngineError::NoImageLoaded)));
        assert!(matches!(session.contrast(1.0), Err(EngineError::NoImageLoaded)));
        assert!(matches!(
            session.save(fx.tmp.path().join("out.png"), None),
            Err(EngineError::NoImageLoaded)
        ));
        assert!(!session.undo());

        let raw = fs::read_to_string(fx.history_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!([]));
    }

    #[test]
    fn resize_then_undo_restores_dimensions() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();

        session.resize(50, 50).unwrap();
        assert_eq!(dims(&session), (50, 50));

        assert!(session.undo());
        assert_eq!(dims(&session), (200, 150));
    }

    #[test]
    fn undo_is_exactly_one_level() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();

        session.resize(100, 75).unwrap();
        session.blur(2.0).unwrap();

        assert!(session.undo());
        assert_eq!(dims(&session), (100, 75));
        assert_eq!(session.image().unwrap().generation, 1);

        assert!(!session.undo());
        assert_eq!(dims(&session), (100, 75));
        assert_eq!(session.image().unwrap().generation, 1);
    }

    #[test]
    fn operation_after_undo_snapshots_again() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();
        session.resize(20, 20).unwrap();
        assert!(session.undo());

        session.contrast(1.5).unwrap();
        assert!(session.can_undo());
        assert!(session.undo());
        assert_eq!(dims(&session), (200, 150));
    }

    #[test]
    fn each_success_appends_exactly_one_record() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();

        session.resize(10, 20).unwrap();
        session.to_grayscale().unwrap();
        session.blur(0.5).unwrap();
        session.brightness(1.2).unwrap();
        session.contrast(0.8).unwrap();
        session.undo();

        assert_eq!(
            fx.history_ops(),
            vec!["load", "resize", "grayscale", "blur", "brightness", "contrast"]
        );
    }

    #[test]
    fn invalid_arguments_change_nothing() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();
        assert!(session.undo());

        assert!(matches!(session.resize(0, 10), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(session.blur(-2.0), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(
            session.brightness(f32::NAN),
            Err(EngineError::InvalidArgument(_))
        ));

        assert_eq!(dims(&session), (200, 150));
        assert!(!session.can_undo());
        assert_eq!(fx.history_ops(), vec!["load"]);
    }

    #[test]
    fn codec_failure_leaves_state_and_history() {
        let fx = Fixture::new();
        let mut session = fx.session_with(
            MockCodec::failing(MockImage::new(30, 30, ColorMode::RGBA)),
            CorruptionPolicy::Repair,
        );
        session.load(&fx.source).unwrap();
        assert!(session.undo());

        let result = session.blur(1.0);

        assert!(matches!(result, Err(EngineError::Codec(CodecError::Processing(_)))));
        assert_eq!(dims(&session), (30, 30));
        assert!(!session.can_undo());
        assert_eq!(fx.history_ops(), vec!["load"]);
    }

    #[test]
    fn apply_passes_arguments_to_codec() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();

        session.apply(Operation::Blur { radius: 3.0 }).unwrap();
        session.apply(Operation::Brightness { factor: 0.25 }).unwrap();

        let ops = session.codec().get_operations();
        assert!(ops.contains(&RecordedOp::Blur(3.0)));
        assert!(ops.contains(&RecordedOp::Brightness(0.25)));
    }

    // =========================================================================
    // save
    // =========================================================================

    #[test]
    fn save_to_jpeg_removes_alpha_first() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();
        let out = fx.tmp.path().join("out.jpg");

        session.save(&out, None).unwrap();

        let ops = session.codec().get_operations();
        let tail = &ops[ops.len() - 2..];
        assert_eq!(tail[0], RecordedOp::RemoveAlpha);
        assert_eq!(
            tail[1],
            RecordedOp::Encode {
                path: out.to_string_lossy().to_string(),
                format: FileFormat::Jpeg,
                mode: ColorMode::RGB,
            }
        );
        // The in-memory image keeps its alpha.
        assert_eq!(session.current_state().unwrap().mode, ColorMode::RGBA);
    }

    #[test]
    fn save_to_png_keeps_alpha() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();

        session.save(fx.tmp.path().join("out.png"), None).unwrap();

        let ops = session.codec().get_operations();
        assert!(!ops.contains(&RecordedOp::RemoveAlpha));
        assert!(matches!(
            ops.last(),
            Some(RecordedOp::Encode {
                format: FileFormat::Png,
                mode: ColorMode::RGBA,
                ..
            })
        ));
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();

        session
            .save(fx.tmp.path().join("out.png"), Some(FileFormat::Jpeg))
            .unwrap();

        let ops = session.codec().get_operations();
        assert!(ops.contains(&RecordedOp::RemoveAlpha));
        let records = session.history().records().unwrap();
        let save = records.last().unwrap();
        assert_eq!(save.operation, "save");
        assert_eq!(save.params["format"].to_string(), "JPEG");
    }

    #[test]
    fn jpeg_extension_removes_alpha_even_with_png_format() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();
        let out = fx.tmp.path().join("out.jpg");

        session.save(&out, Some(FileFormat::Png)).unwrap();

        let ops = session.codec().get_operations();
        let tail = &ops[ops.len() - 2..];
        assert_eq!(tail[0], RecordedOp::RemoveAlpha);
        assert_eq!(
            tail[1],
            RecordedOp::Encode {
                path: out.to_string_lossy().to_string(),
                format: FileFormat::Png,
                mode: ColorMode::RGB,
            }
        );
        let records = session.history().records().unwrap();
        assert_eq!(records.last().unwrap().params["format"].to_string(), "PNG");
    }

    #[test]
    fn save_unknown_extension_without_format() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();

        let result = session.save(fx.tmp.path().join("out.xyz"), None);
        assert!(matches!(result, Err(EngineError::UnsupportedFormat(_))));
        assert_eq!(fx.history_ops(), vec!["load"]);
    }

    #[test]
    fn save_creates_parent_directories() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();
        let out = fx.tmp.path().join("exports/2026/out.bmp");

        session.save(&out, None).unwrap();

        assert!(out.parent().unwrap().is_dir());
        assert_eq!(fx.history_ops(), vec!["load", "save"]);
    }

    #[test]
    fn save_does_not_touch_undo_snapshot() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();
        session.resize(8, 8).unwrap();

        session.save(fx.tmp.path().join("out.png"), None).unwrap();

        assert!(session.undo());
        assert_eq!(dims(&session), (200, 150));
    }

    // =========================================================================
    // info
    // =========================================================================

    #[test]
    fn info_is_none_for_fresh_session() {
        let fx = Fixture::new();
        let session = fx.session();
        assert_eq!(session.info().unwrap(), None);
        assert!(session.codec().get_operations().is_empty());
    }

    #[test]
    fn info_prefers_memory_over_disk() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();
        session.resize(40, 30).unwrap();

        let info = session.info().unwrap().unwrap();
        assert_eq!((info.width, info.height), (40, 30));
        assert!(
            !session
                .codec()
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Probe(_)))
        );
    }

    #[test]
    fn info_probes_remembered_source_without_loading() {
        let fx = Fixture::new();
        let session = fx.session().with_source(&fx.source);

        let info = session.info().unwrap().unwrap();

        assert_eq!((info.width, info.height), (200, 150));
        assert!(session.image().is_none());
        assert_eq!(
            session.codec().get_operations(),
            vec![RecordedOp::Probe(fx.source.to_string_lossy().to_string())]
        );
        assert!(fx.history_ops().is_empty());
    }

    #[test]
    fn probe_missing_source_is_not_found() {
        let fx = Fixture::new();
        let session = fx.session().with_source(fx.tmp.path().join("gone.png"));
        assert!(matches!(
            session.probe_source_metadata(),
            Err(EngineError::NotFound(_))
        ));
        assert!(session.codec().get_operations().is_empty());
    }

    #[test]
    fn current_state_never_probes() {
        let fx = Fixture::new();
        let session = fx.session().with_source(&fx.source);
        assert_eq!(session.current_state(), None);
        assert!(session.codec().get_operations().is_empty());
    }

    // =========================================================================
    // history policy
    // =========================================================================

    #[test]
    fn repair_policy_hides_corrupt_history() {
        let fx = Fixture::new();
        let mut session = fx.session();
        session.load(&fx.source).unwrap();
        fs::write(fx.history_path(), "[{").unwrap();

        session.resize(5, 5).unwrap();

        assert_eq!(fx.history_ops(), vec!["resize"]);
    }

    #[test]
    fn fail_policy_rolls_back_operation() {
        let fx = Fixture::new();
        let mut session = fx.session_with(
            MockCodec::with_image(MockImage::new(200, 150, ColorMode::RGBA)),
            CorruptionPolicy::Fail,
        );
        session.load(&fx.source).unwrap();
        assert!(session.undo());
        fs::write(fx.history_path(), "garbage").unwrap();

        let result = session.resize(5, 5);

        assert!(matches!(result, Err(EngineError::History(HistoryError::Corrupt { .. }))));
        assert_eq!(dims(&session), (200, 150));
        assert!(!session.can_undo());
        assert_eq!(fs::read_to_string(fx.history_path()).unwrap(), "garbage");
    }
}
