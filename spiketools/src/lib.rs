pub mod cfg;
pub mod de;
pub mod img;
pub mod link;
pub mod ring;
pub mod ser;

/// The basic representation of a spike reported by the board
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug, Default)]
pub struct Event {
    /// Device timestamp, wraps at 16 bits
    pub time: u16,
    /// Address of the neuron that fired
    pub address: u8,
}

/// Bytes per event record on the wire: big-endian timestamp, then address
pub const EVENT_SIZE: usize = 3;

/// Sentinel asking the board to start streaming events
pub const START_STREAMING: u8 = 0x01;
/// Sentinel asking the board to stop streaming events
pub const STOP_STREAMING: u8 = 0xFF;

/// Side length of the input neuron array
pub const GRID_SIDE: usize = 16;
/// Linear address that is never transmitted when loading an image
pub const SKIPPED_ADDRESS: u8 = 255;

pub const BAUD_DEFAULT: u32 = 115_200;
