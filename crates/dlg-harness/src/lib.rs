#![forbid(unsafe_code)]

//! Test harness for the dialog stack.
//!
//! - [`FakeAnchor`] / [`FakeSurface`]: an in-memory mount point whose
//!   surfaces record every configuration event, class tag and focus call.
//! - [`ScriptedContent`]: dialog content with a programmable pre-close
//!   answer that records what the dialog did to it.
//! - [`RecordingFocus`]: a focus-return target that counts calls and can
//!   pretend to be detached.
//! - [`Harness`]: a `LocalPool`, a private tracker, a service and an
//!   anchored fake, wired together.
//! - [`strategies`]: proptest strategies for random dialog activity.

pub mod anchor;
pub mod content;
pub mod focus;
pub mod harness;
pub mod strategies;

pub use anchor::{FakeAnchor, FakeSurface, ViewReadyMode};
pub use content::ScriptedContent;
pub use focus::RecordingFocus;
pub use harness::Harness;
