// Protocol of the PF_CAN family: raw sockets
pub const CAN_RAW: libc::c_int = 1;

pub const SOL_CAN_BASE: libc::c_int = 100;
pub const SOL_CAN_RAW: libc::c_int = SOL_CAN_BASE + CAN_RAW;
pub const CAN_RAW_FILTER: libc::c_int = 1;
pub const CAN_RAW_ERR_FILTER: libc::c_int = 2;
pub const CAN_RAW_LOOPBACK: libc::c_int = 3;
pub const CAN_RAW_RECV_OWN_MSGS: libc::c_int = 4;
pub const CAN_RAW_FD_FRAMES: libc::c_int = 5;
pub const CAN_RAW_JOIN_FILTERS: libc::c_int = 6;

// get the receive timestamp of the last frame in a struct timeval (us accuracy)
pub const SIOCGSTAMP: libc::c_ulong = 0x8906;

// number of bytes pending in the socket receive queue
pub const FIONREAD: libc::c_ulong = 0x541B;

/// Size of one classic frame on the wire: 8 byte header + 8 data bytes.
pub const CAN_MTU: usize = 16;
/// Size of one FD frame on the wire: 8 byte header + 64 data bytes.
pub const CANFD_MTU: usize = 72;

/// Maximum payload length of a classic frame.
pub const CAN_MAX_DLEN: usize = 8;
/// Maximum payload length of an FD frame.
pub const CANFD_MAX_DLEN: usize = 64;

/// Special address description flags for the CAN_ID
///
/// EFF/SFF is set in the MSB
pub const EFF_FLAG: u32 = 0x80000000;
/// remote transmission request
pub const RTR_FLAG: u32 = 0x40000000;
/// error message frame
pub const ERR_FLAG: u32 = 0x20000000;

/// valid bits in CAN ID for frame formats
/// standard frame format (SFF)
pub const SFF_MASK: u32 = 0x000007ff;
/// extended frame format (EFF)
pub const EFF_MASK: u32 = 0x1fffffff;
/// omit EFF, RTR, ERR flags
pub const ERR_MASK: u32 = 0x1fffffff;

// FD frame flags, the `flags` byte of the FD frame header.

/// bit rate switch (second bitrate for payload data)
pub const CANFD_BRS: u8 = 0x01;
/// error state indicator of the transmitting node
pub const CANFD_ESI: u8 = 0x02;
/// frame uses the FD layout
pub const CANFD_FDF: u8 = 0x04;
