pub mod types;
pub mod geometry;
pub mod objects;
pub mod scene;
pub mod history;
pub mod clipboard;
pub mod fonts;
pub mod io;
pub mod import;
pub mod widgets;
pub mod ease;
pub mod effects;
pub mod animation;
pub mod config;
pub mod host;
pub mod error;
pub mod editor;
pub mod commands;

pub use animation::{AnimationError, AnimationScheduler, Completion, FinishedQueue};
pub use clipboard::Clipboard;
pub use config::EditorConfig;
pub use editor::{ImportMode, SceneEditor};
pub use effects::Effect;
pub use error::{EditorError, EditorResult};
pub use history::{Snapshot, SnapshotHistory};
pub use host::{ExportRequest, HostBridge, HostEvent, NullHost, RecordingHost, ToastLevel};
pub use import::{import_svg, ImportOptions, ImportedScene};
pub use objects::*;
pub use scene::Scene;
pub use types::*;
pub use widgets::{WidgetCatalog, WidgetSpec};
