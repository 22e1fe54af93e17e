use std::{io, mem, ptr};

use crate::constants::{FIONREAD, SIOCGSTAMP};
use crate::frame::Timestamp;

/// `setsockopt` wrapper
///
/// The libc `setsockopt` function is used to set various options on a
/// socket. `set_socket_option` offers a somewhat type-safe wrapper that
/// does not require messing around with `*const c_void`s.
///
/// A proper `std::io::Error` will be returned on failure.
///
/// Example use:
///
/// ```text
/// let fd = ...;  // some file descriptor, this will be stdout
/// set_socket_option(fd, SOL_TCP, TCP_NO_DELAY, &(1 as c_int))
/// ```
///
/// Note that the `val` parameter must be specified correctly; if an option
/// expects an integer, it is advisable to pass in a `c_int`, not the default
/// of `i32`.
pub fn set_socket_option<T>(
    fd: libc::c_int,
    level: libc::c_int,
    name: libc::c_int,
    val: &T,
) -> io::Result<()> {
    let r = unsafe {
        let val_ptr: *const T = val as *const T;
        libc::setsockopt(
            fd,
            level,
            name,
            val_ptr as *const libc::c_void,
            mem::size_of::<T>() as libc::socklen_t,
        )
    };

    if r != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Like `set_socket_option`, but for options taking a whole slice of
/// values, e.g. the acceptance filter list.
pub fn set_socket_option_mult<T>(
    fd: libc::c_int,
    level: libc::c_int,
    name: libc::c_int,
    values: &[T],
) -> io::Result<()> {
    let r = if values.is_empty() {
        // can't pass in a pointer to the first element of a 0-length slice,
        // pass a nullpointer instead
        unsafe { libc::setsockopt(fd, level, name, ptr::null(), 0) }
    } else {
        unsafe {
            let val_ptr = &values[0] as *const T;

            libc::setsockopt(
                fd,
                level,
                name,
                val_ptr as *const libc::c_void,
                (mem::size_of::<T>() * values.len()) as libc::socklen_t,
            )
        }
    };

    if r != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Number of bytes pending in the socket receive queue (`FIONREAD`).
pub fn pending_bytes(fd: libc::c_int) -> io::Result<usize> {
    let mut count: libc::c_int = 0;

    let r = unsafe { libc::ioctl(fd, FIONREAD, &mut count as *mut libc::c_int) };
    if r != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(count as usize)
}

/// Kernel receive timestamp of the last frame read from the socket
/// (`SIOCGSTAMP`).
pub fn receive_timestamp(fd: libc::c_int) -> io::Result<Timestamp> {
    let mut tv: libc::timeval = unsafe { mem::zeroed() };

    let r = unsafe { libc::ioctl(fd, SIOCGSTAMP, &mut tv as *mut libc::timeval) };
    if r != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(Timestamp::new(tv.tv_sec as i64, tv.tv_usec as i64))
}
