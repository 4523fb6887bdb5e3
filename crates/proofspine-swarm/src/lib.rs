//! Proofspine swarm: worker templates, deterministic dispatch, and
//! isolated task executors.
//!
//! Workers are cheap clones of registered templates with predictable
//! identities. The dispatcher maps a batch of tasks onto a roster
//! using a pure placement function, so a replayed dispatch reproduces
//! the original allocation bit for bit. Each executor drains only its
//! own queue and proves every task it touches on the ledger.

#![deny(unsafe_code)]

pub mod dispatch;
pub mod error;
pub mod executor;
pub mod template;

pub use dispatch::{stable_task_slot, DispatchStrategy, Dispatcher};
pub use error::SwarmError;
pub use executor::{TaskFailure, TaskHandler, WorkerExecutor, WorkerReport};
pub use template::TemplateRegistry;
