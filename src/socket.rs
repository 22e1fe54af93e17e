use std::io;
use std::mem;
use std::os::unix::io::RawFd;

use log::warn;

use crate::codec::{self, DATA_STREAM_V1};
use crate::config::{ConfigKey, ConfigStore, ConfigValue};
use crate::constants::*;
use crate::errors::{ConfigError, ConnectError, WriteError};
use crate::frame::{CanFdFrame, Timestamp};
use crate::notifier::ReadNotifier;
use crate::util::{pending_bytes, receive_timestamp, set_socket_option, set_socket_option_mult};

/// A transport bound to one named CAN adapter interface.
///
/// Owns the raw socket descriptor and the adapter's configuration store.
/// Construction is side-effect free; the socket is only created and bound
/// by [`connect`](CanSocket::connect). State machine:
/// `Closed -> connect -> Open -> close -> Closed`, with no automatic
/// reconnect.
///
/// All operations are synchronous and meant to be driven from a single
/// thread; `read_frame` never blocks (zero-timeout poll), `write_frame`
/// and `connect` use the kernel's default blocking semantics.
#[derive(Debug)]
pub struct CanSocket {
    fd: Option<RawFd>,
    notifier: Option<ReadNotifier>,
    config: ConfigStore,
    stream_version: u8,
}

impl CanSocket {
    /// A closed transport with the default configuration (loopback on,
    /// own-message reception off, no error reporting, no filters).
    pub fn new() -> CanSocket {
        CanSocket {
            fd: None,
            notifier: None,
            config: ConfigStore::with_defaults(),
            stream_version: DATA_STREAM_V1,
        }
    }

    /// Whether the transport currently owns an adapter-bound socket.
    pub fn is_open(&self) -> bool {
        self.fd.is_some()
    }

    /// Create a raw CAN socket, resolve `ifname` to a kernel interface
    /// index and bind to it.
    ///
    /// On success the transport is Open, FD framing is enabled on the
    /// socket (a driver rejecting that is logged, not fatal) and the
    /// stored configuration is pushed onto the fresh socket. Any failure
    /// releases the partial socket and leaves the transport Closed; the
    /// caller may simply call `connect` again.
    pub fn connect(&mut self, ifname: &str) -> Result<(), ConnectError> {
        self.close();

        let fd = unsafe { libc::socket(libc::PF_CAN, libc::SOCK_RAW, CAN_RAW) };
        if fd < 0 {
            return Err(ConnectError::SocketCreate(io::Error::last_os_error()));
        }

        let if_index = match nix::net::if_::if_nametoindex(ifname) {
            Ok(idx) => idx,
            Err(e) => {
                unsafe { libc::close(fd) };
                return Err(ConnectError::InterfaceLookup(e));
            }
        };

        let mut addr: libc::sockaddr_can = unsafe { mem::zeroed() };
        addr.can_family = libc::AF_CAN as libc::sa_family_t;
        addr.can_ifindex = if_index as libc::c_int;

        let bind_rv = unsafe {
            libc::bind(
                fd,
                &addr as *const libc::sockaddr_can as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_can>() as libc::socklen_t,
            )
        };
        if bind_rv < 0 {
            let e = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(ConnectError::Bind(e));
        }

        if let Err(e) = set_socket_option(fd, SOL_CAN_RAW, CAN_RAW_FD_FRAMES, &(1 as libc::c_int)) {
            warn!("setsockopt CAN_RAW_FD_FRAMES failed on {}: {}", ifname, e);
        }

        // the store holds the last requested state, which may predate this
        // connect; replay it so the socket matches
        for (key, value) in self.config.iter() {
            if let Err(e) = apply_option(fd, key, value) {
                warn!("could not apply stored configuration on {}: {}", ifname, e);
            }
        }

        self.notifier = Some(ReadNotifier::new(fd));
        self.fd = Some(fd);
        Ok(())
    }

    /// Release the socket and the readiness registration. Idempotent;
    /// also runs on drop.
    pub fn close(&mut self) {
        // dropping the notifier first guarantees no further readiness
        // events are observed for the dying descriptor
        self.notifier = None;
        if let Some(fd) = self.fd.take() {
            unsafe { libc::close(fd) };
        }
    }

    /// The readiness notifier for the open socket, for integration with
    /// the host's event loop. `None` while Closed.
    pub fn notifier(&self) -> Option<&ReadNotifier> {
        self.notifier.as_ref()
    }

    /// Store `value` under `key` and, when Open, apply it to the live
    /// socket.
    ///
    /// The store is updated in every case, so it always reflects the last
    /// requested value even when the kernel rejects it; the returned
    /// error tells the caller what went wrong. Unrecognized keys yield
    /// [`ConfigError::UnknownKey`] but are stored anyway. While Closed,
    /// recognized options are applied at the next `connect`.
    pub fn set_configuration_parameter(
        &mut self,
        key: ConfigKey,
        value: ConfigValue,
    ) -> Result<(), ConfigError> {
        let result = match self.fd {
            Some(fd) => apply_option(fd, &key, &value),
            None => check_value(&key, &value),
        };

        self.config.set(key, value);
        result
    }

    /// The stored value for `key`, if any.
    pub fn configuration_parameter(&self, key: &ConfigKey) -> Option<&ConfigValue> {
        self.config.get(key)
    }

    /// All configured keys, in store order.
    pub fn configuration_keys(&self) -> Vec<ConfigKey> {
        self.config.keys()
    }

    /// Set the codec version tag used by the byte-stream surface. Must
    /// match whatever decodes the produced bytes.
    pub fn set_data_stream_version(&mut self, version: u8) {
        self.stream_version = version;
    }

    /// The codec version tag currently in use.
    pub fn data_stream_version(&self) -> u8 {
        self.stream_version
    }

    /// Single-attempt, non-blocking read of one raw frame.
    ///
    /// Polls the socket with zero timeout; `Ok(None)` when nothing is
    /// pending (or the transport is Closed). Otherwise performs exactly
    /// one read of the maximum frame size and returns the frame together
    /// with its best-effort kernel receive timestamp; a failed timestamp
    /// query substitutes [`Timestamp::ZERO`] with a logged warning.
    pub fn read_frame(&self) -> io::Result<Option<(CanFdFrame, Timestamp)>> {
        let (fd, notifier) = match (self.fd, self.notifier.as_ref()) {
            (Some(fd), Some(n)) => (fd, n),
            _ => return Ok(None),
        };

        if !notifier.poll_ready()? {
            return Ok(None);
        }

        let mut frame: CanFdFrame = unsafe { mem::zeroed() };
        let nbytes = unsafe {
            libc::read(fd, &mut frame as *mut CanFdFrame as *mut libc::c_void, CANFD_MTU)
        };
        if nbytes < 0 {
            return Err(io::Error::last_os_error());
        }

        match nbytes as usize {
            CAN_MTU => {}
            CANFD_MTU => frame.mark_fd(),
            n => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("read {} bytes, expected one CAN(FD) frame", n),
                ));
            }
        }

        let timestamp = match receive_timestamp(fd) {
            Ok(ts) => ts,
            Err(e) => {
                warn!("couldn't get receive timestamp: {}", e);
                Timestamp::ZERO
            }
        };

        Ok(Some((frame, timestamp)))
    }

    /// Transmit one frame.
    ///
    /// Writes `CAN_MTU` bytes for a classic frame and `CANFD_MTU` for an
    /// FD frame, so classic traffic stays compatible with classic-only
    /// peers. A short write or OS error yields a [`WriteError`] and
    /// leaves the transport Open; retrying is the caller's decision.
    pub fn write_frame(&self, frame: &CanFdFrame) -> Result<(), WriteError> {
        let fd = self.fd.ok_or(WriteError::NotOpen)?;

        let mtu = frame.mtu();
        let rv = unsafe {
            libc::write(fd, frame as *const CanFdFrame as *const libc::c_void, mtu)
        };
        if rv < 0 {
            return Err(WriteError::Io(io::Error::last_os_error()));
        }
        if rv as usize != mtu {
            return Err(WriteError::Incomplete {
                written: rv as usize,
                expected: mtu,
            });
        }

        Ok(())
    }

    /// Number of bytes pending in the socket receive queue; 0 while
    /// Closed.
    pub fn bytes_available(&self) -> usize {
        match self.fd {
            Some(fd) => pending_bytes(fd).unwrap_or_else(|e| {
                warn!("FIONREAD failed: {}", e);
                0
            }),
            None => 0,
        }
    }

    /// Byte-stream surface: copy one encoded frame (see [`codec`]) into
    /// `buf`, returning 0 when no frame is pending.
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let (frame, timestamp) = match self.read_frame()? {
            Some(pair) => pair,
            None => return Ok(0),
        };

        let encoded = codec::encode(&frame, timestamp, self.stream_version);
        if buf.len() < encoded.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("buffer of {} bytes cannot hold encoded frame of {}", buf.len(), encoded.len()),
            ));
        }

        buf[..encoded.len()].copy_from_slice(&encoded);
        Ok(encoded.len())
    }

    /// Byte-stream surface: decode exactly one encoded frame from `buf`
    /// and transmit it. Returns the number of bytes put on the wire.
    pub fn write(&self, buf: &[u8]) -> Result<usize, WriteError> {
        let (frame, _timestamp) = codec::decode(buf, self.stream_version)?;
        self.write_frame(&frame)?;
        Ok(frame.mtu())
    }
}

impl Default for CanSocket {
    fn default() -> CanSocket {
        CanSocket::new()
    }
}

impl Drop for CanSocket {
    fn drop(&mut self) {
        self.close();
    }
}

/// Validate that `value`'s type matches what `key` expects, without
/// touching a socket.
fn check_value(key: &ConfigKey, value: &ConfigValue) -> Result<(), ConfigError> {
    let matches = match (key, value) {
        (ConfigKey::Loopback, ConfigValue::Bool(_)) => true,
        (ConfigKey::ReceiveOwnMessages, ConfigValue::Bool(_)) => true,
        (ConfigKey::ErrorMask, ConfigValue::Integer(_)) => true,
        (ConfigKey::CanFilter, ConfigValue::Filters(_)) => true,
        (ConfigKey::Other(name), _) => {
            return Err(ConfigError::UnknownKey(name.clone()));
        }
        _ => false,
    };

    if matches {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { key: key.clone() })
    }
}

/// Push one typed option onto a socket descriptor.
///
/// Pure in the sense that all state it touches is behind `fd`, so each
/// option can be exercised against any descriptor in tests.
fn apply_option(fd: RawFd, key: &ConfigKey, value: &ConfigValue) -> Result<(), ConfigError> {
    check_value(key, value)?;

    let applied = match (key, value) {
        (ConfigKey::Loopback, ConfigValue::Bool(on)) => {
            set_socket_option(fd, SOL_CAN_RAW, CAN_RAW_LOOPBACK, &(*on as libc::c_int))
        }
        (ConfigKey::ReceiveOwnMessages, ConfigValue::Bool(on)) => {
            set_socket_option(fd, SOL_CAN_RAW, CAN_RAW_RECV_OWN_MSGS, &(*on as libc::c_int))
        }
        (ConfigKey::ErrorMask, ConfigValue::Integer(mask)) => {
            set_socket_option(fd, SOL_CAN_RAW, CAN_RAW_ERR_FILTER, mask)
        }
        (ConfigKey::CanFilter, ConfigValue::Filters(rules)) => {
            if rules.is_empty() {
                // the kernel takes an empty filter list to mean "deliver
                // nothing", which is rarely what a caller wants
                warn!("applying empty CanFilter list: all reception is disabled");
            }
            set_socket_option_mult(fd, SOL_CAN_RAW, CAN_RAW_FILTER, rules)
        }
        _ => unreachable!("check_value admits only matching key/value pairs"),
    };

    applied.map_err(|e| ConfigError::OptionApply {
        key: key.clone(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CanFdFrame;

    #[test]
    fn fresh_transport_is_closed() {
        let socket = CanSocket::new();
        assert!(!socket.is_open());
        assert!(socket.notifier().is_none());
        assert_eq!(socket.bytes_available(), 0);
        assert!(socket.read_frame().unwrap().is_none());

        let mut buf = [0u8; codec::MAX_ENCODED_LEN];
        assert_eq!(socket.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn write_on_closed_transport_is_rejected() {
        let socket = CanSocket::new();
        let frame = CanFdFrame::new(0x42, &[1, 2, 3], false, false).unwrap();

        assert!(matches!(socket.write_frame(&frame), Err(WriteError::NotOpen)));

        let encoded = codec::encode(&frame, Timestamp::ZERO, socket.data_stream_version());
        assert!(matches!(socket.write(&encoded), Err(WriteError::NotOpen)));
    }

    #[test]
    fn stream_write_rejects_malformed_buffers() {
        let socket = CanSocket::new();
        assert!(matches!(
            socket.write(&[0u8; 3]),
            Err(WriteError::Decode(_))
        ));
    }

    #[test]
    fn close_is_idempotent() {
        let mut socket = CanSocket::new();
        socket.close();
        socket.close();
        assert!(!socket.is_open());
    }

    #[test]
    fn default_configuration_is_present() {
        let socket = CanSocket::new();
        assert_eq!(
            socket.configuration_keys(),
            vec![
                ConfigKey::Loopback,
                ConfigKey::ReceiveOwnMessages,
                ConfigKey::ErrorMask,
                ConfigKey::CanFilter,
            ]
        );
        assert_eq!(
            socket.configuration_parameter(&ConfigKey::Loopback),
            Some(&ConfigValue::Bool(true))
        );
    }

    #[test]
    fn unknown_keys_are_reported_but_stored() {
        let mut socket = CanSocket::new();
        let key = ConfigKey::from_name("BitRate");

        let result = socket.set_configuration_parameter(key.clone(), ConfigValue::Integer(500_000));
        assert!(matches!(result, Err(ConfigError::UnknownKey(ref name)) if name == "BitRate"));

        // last-requested semantics: the store reflects the attempt
        assert_eq!(
            socket.configuration_parameter(&key),
            Some(&ConfigValue::Integer(500_000))
        );
    }

    #[test]
    fn mistyped_values_are_reported_but_stored() {
        let mut socket = CanSocket::new();

        let result = socket
            .set_configuration_parameter(ConfigKey::Loopback, ConfigValue::Integer(1));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: ConfigKey::Loopback })
        ));
        assert_eq!(
            socket.configuration_parameter(&ConfigKey::Loopback),
            Some(&ConfigValue::Integer(1))
        );
    }

    #[test]
    fn recognized_options_are_accepted_while_closed() {
        let mut socket = CanSocket::new();
        socket
            .set_configuration_parameter(ConfigKey::ErrorMask, ConfigValue::Integer(0xFF))
            .unwrap();
        assert_eq!(
            socket.configuration_parameter(&ConfigKey::ErrorMask),
            Some(&ConfigValue::Integer(0xFF))
        );
    }

    #[test]
    fn stream_version_is_settable() {
        let mut socket = CanSocket::new();
        assert_eq!(socket.data_stream_version(), DATA_STREAM_V1);
        socket.set_data_stream_version(7);
        assert_eq!(socket.data_stream_version(), 7);
    }
}
