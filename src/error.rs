use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProvisionError>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The external command could not be started at all (missing binary,
    /// insufficient permissions to spawn).
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The external command ran and reported failure.
    #[error("command `{command}` exited with {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The bus listing contained no stub-driver entry after a nominally
    /// successful module load. Usually an environment mismatch (wrong
    /// kernel, missing permissions) rather than a bad command.
    #[error("SMBus stub driver not found in bus listing")]
    StubNotFound,

    #[error("cannot publish bus alias {}: {source}", .path.display())]
    Alias {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open bus device {}: {source}", .path.display())]
    Transport {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("a fake bus is already open on this instance")]
    AlreadyOpen,
}
