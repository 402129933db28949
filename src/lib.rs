#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod action;
mod error;
mod graph;
mod history;
pub mod loading;
mod registry;
pub mod resolver;
mod session;
mod snapshot;
mod task;
mod utils;
mod value;

pub use crate::action::{Action, RemoveArtifact, RemoveZombies, UpdateStep, kill_zombies};
pub use crate::error::*;
pub use crate::graph::Workflow;
pub use crate::history::{History, HistoryOptions, Outcome};
pub use crate::registry::{ArtifactKind, Operation, Registry};
pub use crate::session::{MemorySession, Session};
pub use crate::snapshot::Snapshot;
pub use crate::task::{Head, Task};
#[cfg(feature = "logging")]
pub use crate::utils::init_logging;
pub use crate::value::{Arg, ArrayData, Literal, Param};
