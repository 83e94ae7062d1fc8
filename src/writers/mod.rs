//! Writer implementations

pub mod console;
pub mod file;
pub mod memory;
pub mod network;

pub use console::{ConsoleConfig, ConsoleWriter};
pub use file::{DirEntryInfo, FileConfig, FileSystem, FileWriter, StdFileSystem};
pub use memory::MemoryWriter;
#[cfg(feature = "network")]
pub use network::HttpTransport;
pub use network::{HostEvent, NetworkConfig, NetworkWriter, PostOutcome, Transport};

pub use crate::core::{NoopWriter, Writer};
