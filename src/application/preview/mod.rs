//! Live preview: document composition, refresh control and isolated surfaces.

pub mod composer;
pub mod controller;
pub mod scheduler;
pub mod sessions;
pub mod surface;

pub use composer::{Composer, DocumentTemplate, compose};
pub use controller::{ControllerState, PreviewController, PreviewPolicy, RenderVersion};
pub use scheduler::{ManualScheduler, Scheduler, TimerHandle, TokioScheduler};
pub use sessions::{PreviewSessionConfig, PreviewSessionError, PreviewSessions, SessionSnapshot};
pub use surface::{DocumentSurfaces, IsolationHost, SurfaceHandle, SurfaceMount};
