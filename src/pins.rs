//! GPIO / peripheral pin assignments for the door controller board.
//!
//! Single source of truth; the binary references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// DPDT latching relay coils
// ---------------------------------------------------------------------------

/// Digital output: a HIGH pulse latches the relay into the "open" position.
pub const OPEN_LINE_GPIO: i32 = 4;
/// Digital output: a HIGH pulse latches the relay into the "close" position.
pub const CLOSE_LINE_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// INA219 current monitor (I2C0)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// Standard-mode bus clock.
pub const I2C_BAUD_HZ: u32 = 100_000;
