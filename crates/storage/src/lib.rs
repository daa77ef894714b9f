//! Object storage backend and command language for the executor.
//!
//! A local directory plays the role of the object store. Each worker gets its
//! own [`WorkerResources`]: a store client plus an uploader and a downloader
//! configured with the pool's chunk size.
//!
//! Commands (`cp`, `mv`, `rm`, `ls`) are parsed by [`CommandParser`] into job
//! chains; `&&` and `||` attach success and failure continuations.

pub mod client;
pub mod command;
pub mod location;
pub mod parser;
pub mod resources;
pub mod transfer;

pub use client::{StoreClient, StoreError};
pub use command::Command;
pub use location::Location;
pub use parser::{CommandParser, parse_command};
pub use resources::WorkerResources;
pub use transfer::{Downloader, Uploader};
