use std::fmt;
use std::time;

use itertools::Itertools;

use crate::constants::*;
use crate::errors::ConstructionError;

/// CanFdFrame
///
/// A single bus message, classic or flexible-data-rate. Uses the same
/// memory layout as the underlying kernel `canfd_frame` struct so one raw
/// read or write moves a whole frame; a classic `can_frame` is a prefix of
/// this layout, with the flags byte as padding.
///
/// Whether the frame is FD is carried in the `CANFD_FDF` flag bit, mirroring
/// what recent kernels report on receive.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct CanFdFrame {
    /// 32 bit CAN_ID + EFF/RTR/ERR flags
    _id: u32,
    /// data length. Bytes beyond are not valid
    _len: u8,
    /// FD flags (CANFD_FDF/BRS/ESI); padding on classic frames
    _flags: u8,
    /// reserved
    _res0: u8,
    /// reserved
    _res1: u8,
    /// buffer for data
    _data: [u8; CANFD_MAX_DLEN],
}

impl CanFdFrame {
    /// Construct a classic frame. The payload is limited to 8 bytes.
    pub fn new(id: u32, data: &[u8], rtr: bool, err: bool) -> Result<CanFdFrame, ConstructionError> {
        if data.len() > CAN_MAX_DLEN {
            return Err(ConstructionError::TooMuchData);
        }

        let mut _id = Self::checked_id(id)?;

        if rtr {
            _id |= RTR_FLAG;
        }

        if err {
            _id |= ERR_FLAG;
        }

        Ok(Self::assemble(_id, 0, data))
    }

    /// Construct a flexible-data-rate frame with a payload of up to
    /// 64 bytes. `brs` requests the bit rate switch for the data phase.
    pub fn new_fd(id: u32, data: &[u8], brs: bool) -> Result<CanFdFrame, ConstructionError> {
        if data.len() > CANFD_MAX_DLEN {
            return Err(ConstructionError::TooMuchData);
        }

        let _id = Self::checked_id(id)?;

        let mut flags = CANFD_FDF;
        if brs {
            flags |= CANFD_BRS;
        }

        Ok(Self::assemble(_id, flags, data))
    }

    /// Reassemble a frame from its raw header words and payload, as found
    /// on the wire or in an encoded frame. `id_word` keeps its EFF/RTR/ERR
    /// flag bits.
    pub(crate) fn from_raw_parts(
        id_word: u32,
        flags: u8,
        data: &[u8],
    ) -> Result<CanFdFrame, ConstructionError> {
        let max = if flags & CANFD_FDF != 0 {
            CANFD_MAX_DLEN
        } else {
            CAN_MAX_DLEN
        };

        if data.len() > max {
            return Err(ConstructionError::TooMuchData);
        }

        Ok(Self::assemble(id_word, flags, data))
    }

    fn checked_id(id: u32) -> Result<u32, ConstructionError> {
        if id > EFF_MASK {
            return Err(ConstructionError::IDTooLarge);
        }

        // set EFF_FLAG on large message
        if id > SFF_MASK {
            Ok(id | EFF_FLAG)
        } else {
            Ok(id)
        }
    }

    fn assemble(id_word: u32, flags: u8, data: &[u8]) -> CanFdFrame {
        let mut full_data = [0; CANFD_MAX_DLEN];
        full_data[..data.len()].copy_from_slice(data);

        CanFdFrame {
            _id: id_word,
            _len: data.len() as u8,
            _flags: flags,
            _res0: 0,
            _res1: 0,
            _data: full_data,
        }
    }

    /// Tag a frame read with the FD layout. Kernels older than 5.14 leave
    /// the flag unset on receive, so the transport sets it from the read
    /// size.
    #[inline]
    pub(crate) fn mark_fd(&mut self) {
        self._flags |= CANFD_FDF;
    }

    /// Return the actual CAN ID (without EFF/RTR/ERR flags)
    #[inline]
    pub fn id(&self) -> u32 {
        if self.is_extended() {
            self._id & EFF_MASK
        } else {
            self._id & SFF_MASK
        }
    }

    /// The raw 32 bit id word including EFF/RTR/ERR flag bits.
    #[inline]
    pub fn id_word(&self) -> u32 {
        self._id
    }

    /// The FD flags byte (CANFD_FDF/BRS/ESI).
    #[inline]
    pub fn flags(&self) -> u8 {
        self._flags
    }

    /// Check if frame uses 29 bit extended frame format
    #[inline]
    pub fn is_extended(&self) -> bool {
        self._id & EFF_FLAG != 0
    }

    /// Check if frame is an error message
    #[inline]
    pub fn is_error(&self) -> bool {
        self._id & ERR_FLAG != 0
    }

    /// Check if frame is a remote transmission request
    #[inline]
    pub fn is_rtr(&self) -> bool {
        self._id & RTR_FLAG != 0
    }

    /// Check if frame uses the flexible-data-rate layout
    #[inline]
    pub fn is_fd(&self) -> bool {
        self._flags & CANFD_FDF != 0
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self._len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self._len == 0
    }

    /// A slice into the actual data. Always <= 64 bytes, <= 8 for classic
    /// frames.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self._data[..(self._len as usize)]
    }

    /// Wire size of this frame: `CAN_MTU` for classic, `CANFD_MTU` for FD.
    #[inline]
    pub fn mtu(&self) -> usize {
        if self.is_fd() {
            CANFD_MTU
        } else {
            CAN_MTU
        }
    }
}

impl fmt::UpperHex for CanFdFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{:X}#", self.id())?;

        let mut parts = self.data().iter().map(|v| format!("{:02X}", v));

        let sep = if f.alternate() { " " } else { "" };
        write!(f, "{}", parts.join(sep))
    }
}

/// Kernel receive time of a frame, microsecond accuracy.
///
/// All zero when the kernel could not supply one; a missing timestamp is
/// never fatal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub sec: i64,
    pub usec: i64,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { sec: 0, usec: 0 };

    pub fn new(sec: i64, usec: i64) -> Timestamp {
        Timestamp { sec, usec }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.sec == 0 && self.usec == 0
    }

    /// The timestamp as a `SystemTime` relative to the unix epoch.
    pub fn system_time(&self) -> time::SystemTime {
        time::UNIX_EPOCH
            + time::Duration::new(self.sec as u64, (self.usec as u32) * 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_frame_caps_payload_at_8() {
        let data = [0u8; 12];
        assert_eq!(
            CanFdFrame::new(0x123, &data, false, false),
            Err(ConstructionError::TooMuchData)
        );
        assert!(CanFdFrame::new(0x123, &data[..8], false, false).is_ok());
    }

    #[test]
    fn fd_frame_caps_payload_at_64() {
        let data = [0u8; 65];
        assert_eq!(
            CanFdFrame::new_fd(0x123, &data, false),
            Err(ConstructionError::TooMuchData)
        );

        let frame = CanFdFrame::new_fd(0x123, &data[..64], false).unwrap();
        assert_eq!(frame.len(), 64);
        assert!(frame.is_fd());
        assert_eq!(frame.mtu(), CANFD_MTU);
    }

    #[test]
    fn large_ids_get_the_eff_flag() {
        let frame = CanFdFrame::new(0x12345, &[], false, false).unwrap();
        assert!(frame.is_extended());
        assert_eq!(frame.id(), 0x12345);

        let frame = CanFdFrame::new(0x123, &[], false, false).unwrap();
        assert!(!frame.is_extended());
        assert_eq!(frame.id(), 0x123);

        assert_eq!(
            CanFdFrame::new(0x2000_0000, &[], false, false),
            Err(ConstructionError::IDTooLarge)
        );
    }

    #[test]
    fn data_slice_covers_exactly_len_bytes() {
        let frame = CanFdFrame::new(1, &[0xDE, 0xAD], false, false).unwrap();
        assert_eq!(frame.data(), &[0xDE, 0xAD]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.mtu(), CAN_MTU);
    }

    #[test]
    fn upper_hex_renders_id_and_payload() {
        let frame = CanFdFrame::new(0x1A2, &[0xDE, 0xAD, 0xBE, 0xEF], false, false).unwrap();
        assert_eq!(format!("{:X}", frame), "1A2#DEADBEEF");
        assert_eq!(format!("{:#X}", frame), "1A2#DE AD BE EF");
    }

    #[test]
    fn zero_timestamp_is_the_epoch() {
        assert!(Timestamp::ZERO.is_zero());
        assert_eq!(Timestamp::ZERO.system_time(), time::UNIX_EPOCH);

        let ts = Timestamp::new(5, 250_000);
        assert_eq!(
            ts.system_time(),
            time::UNIX_EPOCH + time::Duration::from_micros(5_250_000)
        );
    }
}
