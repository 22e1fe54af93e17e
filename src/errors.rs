use std::{error, fmt, io};

use crate::config::ConfigKey;

/// Error constructing a frame from its parts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConstructionError {
    /// The payload is longer than the frame kind allows (8 bytes for a
    /// classic frame, 64 for an FD frame).
    TooMuchData,

    /// The id does not fit into 29 bits.
    IDTooLarge,
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConstructionError::TooMuchData => write!(f, "payload too long for frame kind"),
            ConstructionError::IDTooLarge => write!(f, "CAN id does not fit into 29 bits"),
        }
    }
}

impl error::Error for ConstructionError {}

/// Error binding the transport to a named CAN interface.
///
/// Each variant names the stage of `connect` that failed. Any of these
/// leaves the transport closed; there is no partial binding.
#[derive(Debug)]
pub enum ConnectError {
    /// Creating the raw CAN socket failed.
    SocketCreate(io::Error),

    /// The interface name could not be resolved to a kernel interface
    /// index. Usually the interface does not exist.
    InterfaceLookup(nix::Error),

    /// Binding the socket to the interface index failed.
    Bind(io::Error),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConnectError::SocketCreate(ref e) => write!(f, "cannot open CAN socket: {}", e),
            ConnectError::InterfaceLookup(ref e) => {
                write!(f, "failed to retrieve the interface index: {}", e)
            }
            ConnectError::Bind(ref e) => write!(f, "cannot bind CAN socket: {}", e),
        }
    }
}

impl error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ConnectError::SocketCreate(ref e) => Some(e),
            ConnectError::InterfaceLookup(ref e) => Some(e),
            ConnectError::Bind(ref e) => Some(e),
        }
    }
}

/// Non-fatal error applying a configuration parameter.
///
/// The requested value is committed to the configuration store in every
/// case, so the store always reflects the last requested state.
#[derive(Debug)]
pub enum ConfigError {
    /// The kernel rejected the socket option.
    OptionApply { key: ConfigKey, source: io::Error },

    /// The key is not a recognized configuration parameter. The value is
    /// stored but never applied to the socket.
    UnknownKey(String),

    /// The value type does not match the key (e.g. a filter list passed
    /// for `Loopback`). Nothing is applied to the socket.
    InvalidValue { key: ConfigKey },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConfigError::OptionApply { ref key, ref source } => {
                write!(f, "setsockopt for {} failed: {}", key, source)
            }
            ConfigError::UnknownKey(ref key) => {
                write!(f, "no such configuration parameter: {}", key)
            }
            ConfigError::InvalidValue { ref key } => {
                write!(f, "value type does not match configuration parameter {}", key)
            }
        }
    }
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ConfigError::OptionApply { ref source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Error decoding an encoded frame from a byte buffer.
#[derive(Debug)]
pub enum DecodeError {
    /// The buffer ends before the fixed-size header is complete.
    Truncated,

    /// The payload length prefix disagrees with the number of bytes that
    /// actually follow it.
    LengthMismatch { prefixed: usize, actual: usize },

    /// The decoded parts do not form a valid frame.
    Frame(ConstructionError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DecodeError::Truncated => write!(f, "encoded frame is truncated"),
            DecodeError::LengthMismatch { prefixed, actual } => write!(
                f,
                "payload length prefix is {} but {} bytes follow",
                prefixed, actual
            ),
            DecodeError::Frame(ref e) => write!(f, "malformed frame: {}", e),
        }
    }
}

impl error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            DecodeError::Frame(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConstructionError> for DecodeError {
    fn from(e: ConstructionError) -> DecodeError {
        DecodeError::Frame(e)
    }
}

/// Error transmitting a frame.
///
/// A write failure does not change the transport state; the caller may
/// retry on the still-open socket.
#[derive(Debug)]
pub enum WriteError {
    /// The transport is not connected.
    NotOpen,

    /// The byte buffer handed to the stream surface did not decode to a
    /// frame.
    Decode(DecodeError),

    /// The kernel accepted fewer bytes than one full frame.
    Incomplete { written: usize, expected: usize },

    /// The underlying write failed.
    Io(io::Error),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            WriteError::NotOpen => write!(f, "cannot write frame: transport is closed"),
            WriteError::Decode(ref e) => write!(f, "cannot decode frame for transmission: {}", e),
            WriteError::Incomplete { written, expected } => {
                write!(f, "short frame write: {} of {} bytes", written, expected)
            }
            WriteError::Io(ref e) => write!(f, "cannot write frame to socket: {}", e),
        }
    }
}

impl error::Error for WriteError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            WriteError::Decode(ref e) => Some(e),
            WriteError::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for WriteError {
    fn from(e: DecodeError) -> WriteError {
        WriteError::Decode(e)
    }
}

impl From<io::Error> for WriteError {
    fn from(e: io::Error) -> WriteError {
        WriteError::Io(e)
    }
}

/// Check an error return value for timeouts.
///
/// Due to the fact that timeouts are reported as errors, calling a read
/// on a socket with a timeout that does not receive a frame in time will
/// result in an error being returned. This trait adds a `should_retry`
/// method to `Error` and `Result` to check for this condition. The
/// transport itself never retries; retry policy belongs to the caller.
pub trait ShouldRetry {
    /// Check for timeout
    ///
    /// If `true`, the error is probably due to a timeout.
    fn should_retry(&self) -> bool;
}

impl ShouldRetry for io::Error {
    fn should_retry(&self) -> bool {
        match self.kind() {
            // EAGAIN, EINPROGRESS and EWOULDBLOCK are the three possible codes
            // returned when a timeout occurs. the stdlib already maps EAGAIN
            // and EWOULDBLOCK to WouldBlock
            io::ErrorKind::WouldBlock => true,
            // however, EINPROGRESS is also valid
            io::ErrorKind::Other => {
                if let Some(i) = self.raw_os_error() {
                    i == libc::EINPROGRESS
                } else {
                    false
                }
            }
            _ => false,
        }
    }
}

impl<T: fmt::Debug> ShouldRetry for io::Result<T> {
    fn should_retry(&self) -> bool {
        if let Err(ref e) = *self {
            e.should_retry()
        } else {
            false
        }
    }
}
