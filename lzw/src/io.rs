//! Least significant bit first packing of variable width codes.

/// Rebuilds codes from bytes, keeping leftover bits between calls.
///
/// A code straddling two input blocks is completed by the next block.
#[derive(Debug, Default)]
pub(crate) struct BitReader {
    cursor: u8,
    byte_buffer: u32,
}

impl BitReader {
    pub(crate) fn reset(&mut self) {
        self.cursor = 0;
        self.byte_buffer = 0;
    }

    /// Reads a code of `amount` bits, taking bytes from the front of `data` as needed.
    ///
    /// Returns `None` once `data` is exhausted before the code is complete; the bits read so far
    /// are kept for the next call.
    #[inline]
    pub(crate) fn read(&mut self, amount: u8, data: &mut &[u8]) -> Option<u16> {
        while self.cursor < amount {
            let (&byte, rest) = data.split_first()?;
            *data = rest;
            self.byte_buffer |= (byte as u32) << self.cursor;
            self.cursor += 8;
        }

        let mask = (1 << amount) - 1;
        let code = (self.byte_buffer & mask) as u16;
        self.byte_buffer >>= amount;
        self.cursor -= amount;
        Some(code)
    }
}

/// Packs codes into bytes, keeping the incomplete last byte between calls.
#[derive(Debug, Default)]
pub(crate) struct BitWriter {
    cursor: u8,
    byte_buffer: u32,
}

impl BitWriter {
    pub(crate) fn reset(&mut self) {
        self.cursor = 0;
        self.byte_buffer = 0;
    }

    #[inline]
    pub(crate) fn write(&mut self, amount: u8, data: u16, into: &mut Vec<u8>) {
        let mask = (1 << amount) - 1;
        self.byte_buffer |= (data as u32 & mask) << self.cursor;
        self.cursor += amount;

        while self.cursor >= 8 {
            into.push(self.byte_buffer as u8);
            self.byte_buffer >>= 8;
            self.cursor -= 8;
        }
    }

    /// Pads the pending bits with zeroes up to a byte boundary.
    pub(crate) fn fill(&mut self, into: &mut Vec<u8>) {
        if self.cursor > 0 {
            into.push(self.byte_buffer as u8);
            self.reset();
        }
    }
}
