/// CanFilter
///
/// Contains an internal id and mask. Frames are considered to be matched by
/// a filter if `received_id & mask == filter_id & mask` holds true. A list
/// of these is handed to the kernel as the socket's acceptance filter set.
///
/// Uses the same memory layout as the kernel `can_filter` struct so a
/// filter slice can be passed to `setsockopt` directly.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct CanFilter {
    _id: u32,
    _mask: u32,
}

impl CanFilter {
    /// Construct a new CAN filter.
    pub fn new(id: u32, mask: u32) -> CanFilter {
        CanFilter {
            _id: id,
            _mask: mask,
        }
    }

    /// The filter id the kernel compares received ids against.
    #[inline]
    pub fn id(&self) -> u32 {
        self._id
    }

    /// The mask selecting which id bits take part in the comparison.
    #[inline]
    pub fn mask(&self) -> u32 {
        self._mask
    }

    /// Check whether a received id would pass this filter.
    #[inline]
    pub fn matches(&self, id: u32) -> bool {
        id & self._mask == self._id & self._mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_is_masked_comparison() {
        let filter = CanFilter::new(0x100, 0x7FF);
        assert!(filter.matches(0x100));
        assert!(!filter.matches(0x200));
        assert!(!filter.matches(0x101));
    }

    #[test]
    fn zero_mask_matches_everything() {
        let filter = CanFilter::new(0x100, 0);
        assert!(filter.matches(0x0));
        assert!(filter.matches(0x7FF));
        assert!(filter.matches(0x1FFFFFFF));
    }
}
