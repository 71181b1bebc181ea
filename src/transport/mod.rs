//! Typed in-process channel boundaries standing in for the out-of-scope
//! transport layer (TCP, JSON-RPC, socket event bus). The core speaks only
//! in these typed values; wiring them to an actual wire protocol is a
//! deployment-binary concern outside this crate.

pub mod command;
pub mod event;

pub use command::{CommandChannel, CommandTask, VehicleCommand};
pub use event::EventChannel;
