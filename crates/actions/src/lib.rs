//! `actions` crate — the `Action` model and the `ActionExecutor` seam.
//!
//! The engine never renders anything itself: every fired step hands its
//! actions to an [`ActionExecutor`] supplied by the host session.

pub mod error;
pub mod model;
pub mod traits;
pub mod render;
pub mod mock;

pub use error::ActionError;
pub use model::{Action, AgentArgs, TextReturn};
pub use traits::{ActionExecutor, StepContext};
pub use render::{ConsoleRenderer, OutputFormat};
