use super::frame::Address;

/// A peer device and the frame counter expected from it next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceEntry {
    pub(crate) pan_id: u16,
    pub(crate) short_addr: u16,
    pub(crate) long_addr: [u8; 8],
    pub(crate) frame_counter: u32,
}

impl DeviceEntry {
    /// Creates an entry with a zero counter.
    ///
    /// The long address is in network byte order.
    pub(crate) fn new(
        pan_id: u16,
        short_addr: u16,
        long_addr: &[u8; 8],
    ) -> DeviceEntry {
        DeviceEntry {
            pan_id,
            short_addr,
            long_addr: *long_addr,
            frame_counter: 0,
        }
    }

    pub fn pan_id(&self) -> u16 {
        self.pan_id
    }

    pub fn short_addr(&self) -> u16 {
        self.short_addr
    }

    pub fn long_addr(&self) -> &[u8; 8] {
        &self.long_addr
    }

    /// Returns the lowest frame counter accepted from this device.
    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    /// Whether this device has the same identity as `other`.
    pub(crate) fn same_identity(&self, other: &DeviceEntry) -> bool {
        self.pan_id == other.pan_id
            && self.short_addr == other.short_addr
            && self.long_addr == other.long_addr
    }

    /// Whether the device is `addr` in PAN `pan`.
    pub fn matches(&self, pan: u16, addr: &Address) -> bool {
        self.pan_id == pan
            && match addr {
                Address::Short(short) => self.short_addr == *short,
                Address::Long(long) => self.long_addr == *long,
            }
    }
}
