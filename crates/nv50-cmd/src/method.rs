//! # Method Headers
//!
//! Every command is a header word followed by `count` payload words:
//!
//! ```text
//!  31 30 29        18 17   13 12          0
//! ┌──┬──┬────────────┬───────┬─────────────┐
//! │0 │NI│   count    │ subc  │   method    │
//! └──┴──┴────────────┴───────┴─────────────┘
//! ```
//!
//! With NI clear the method address increments after each payload word;
//! with NI set every word goes to the same method (data streams).

/// Maximum payload words per header
pub const MAX_COUNT: u32 = 0x7ff;

/// Non-incrementing flag
pub const NON_INCREMENTING: u32 = 0x4000_0000;

const COUNT_SHIFT: u32 = 18;
const SUBC_SHIFT: u32 = 13;
const METHOD_MASK: u32 = 0x1ffc;

/// Subchannel an engine object is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subchannel(pub u8);

/// A decoded or to-be-encoded command header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    /// Target subchannel
    pub subc: Subchannel,
    /// Method byte offset
    pub method: u32,
    /// Payload word count
    pub count: u32,
    /// Whether all payload words hit the same method
    pub non_incrementing: bool,
}

impl Header {
    /// Incrementing header
    pub const fn new(subc: Subchannel, method: u32, count: u32) -> Self {
        Self {
            subc,
            method,
            count,
            non_incrementing: false,
        }
    }

    /// Non-incrementing header
    pub const fn non_incrementing(subc: Subchannel, method: u32, count: u32) -> Self {
        Self {
            subc,
            method,
            count,
            non_incrementing: true,
        }
    }

    /// Encode to a wire word
    pub const fn encode(self) -> u32 {
        let ni = if self.non_incrementing {
            NON_INCREMENTING
        } else {
            0
        };
        ni | (self.count << COUNT_SHIFT) | ((self.subc.0 as u32) << SUBC_SHIFT) | (self.method & METHOD_MASK)
    }

    /// Decode a wire word
    pub const fn decode(word: u32) -> Self {
        Self {
            subc: Subchannel(((word >> SUBC_SHIFT) & 0x7) as u8),
            method: word & METHOD_MASK,
            count: (word >> COUNT_SHIFT) & MAX_COUNT,
            non_incrementing: word & NON_INCREMENTING != 0,
        }
    }
}
