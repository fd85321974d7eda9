//! Payload generation
//!
//! Each data channel owns one fixed-capacity buffer filled with a circular
//! ascending byte ramp. The ramp continues across regenerations: the first
//! byte of a new message is the successor of the last byte of the previous
//! one, so the receiver can verify continuity of the whole stream.

/// Capacity of each channel's payload buffer
pub const DATA_CAPACITY: usize = 255;

// ----------------------------------------------------------------------------
// Payload Buffer
// ----------------------------------------------------------------------------

/// Fixed-capacity payload buffer with an active length
#[derive(Debug, Clone)]
pub struct PayloadBuffer {
    data: [u8; DATA_CAPACITY],
    len: usize,
}

impl PayloadBuffer {
    pub fn new() -> Self {
        Self {
            data: [0; DATA_CAPACITY],
            len: 0,
        }
    }

    /// Set the active message length. Clamped to capacity; the size
    /// negotiator keeps lengths within the limit by construction.
    pub fn set_len(&mut self, len: u16) {
        self.len = (len as usize).min(DATA_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Active payload contents
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Fill the active region with the next stretch of the byte ramp:
    /// `data[0]` continues from the previous last byte, and every following
    /// byte increments by one, wrapping at 256.
    pub fn regenerate(&mut self) {
        if self.len == 0 {
            return;
        }
        self.data[0] = self.data[self.len - 1].wrapping_add(1);
        for i in 1..self.len {
            self.data[i] = self.data[i - 1].wrapping_add(1);
        }
    }

    /// Zero the buffer and drop the active length, as done on session reset
    pub fn clear(&mut self) {
        self.data = [0; DATA_CAPACITY];
        self.len = 0;
    }
}

impl Default for PayloadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ramp_is_continuous_within_a_message() {
        let mut buffer = PayloadBuffer::new();
        buffer.set_len(10);
        buffer.regenerate();
        for i in 1..10 {
            assert_eq!(
                buffer.bytes()[i],
                buffer.bytes()[i - 1].wrapping_add(1),
                "ramp broken at {i}"
            );
        }
    }

    #[test]
    fn ramp_continues_across_messages() {
        let mut buffer = PayloadBuffer::new();
        buffer.set_len(7);
        buffer.regenerate();
        let last = *buffer.bytes().last().unwrap();
        buffer.regenerate();
        assert_eq!(buffer.bytes()[0], last.wrapping_add(1));
    }

    #[test]
    fn ramp_wraps_at_256() {
        let mut buffer = PayloadBuffer::new();
        buffer.set_len(DATA_CAPACITY as u16);
        buffer.regenerate();
        buffer.regenerate();
        // 255 bytes per message, so byte values drift by 255 each call and
        // every value must still be consistent with its predecessor.
        for pair in buffer.bytes().windows(2) {
            assert_eq!(pair[1], pair[0].wrapping_add(1));
        }
    }

    #[test]
    fn clear_resets_contents_and_length() {
        let mut buffer = PayloadBuffer::new();
        buffer.set_len(16);
        buffer.regenerate();
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.data.iter().all(|&b| b == 0));
    }

    proptest! {
        #[test]
        fn ramp_property_holds_for_any_length_and_repetition(
            len in 1u16..=DATA_CAPACITY as u16,
            rounds in 1usize..8,
        ) {
            let mut buffer = PayloadBuffer::new();
            buffer.set_len(len);
            let mut previous_last: u8 = 0;
            for round in 0..rounds {
                buffer.regenerate();
                if round > 0 {
                    prop_assert_eq!(buffer.bytes()[0], previous_last.wrapping_add(1));
                }
                for pair in buffer.bytes().windows(2) {
                    prop_assert_eq!(pair[1], pair[0].wrapping_add(1));
                }
                previous_last = *buffer.bytes().last().unwrap();
            }
        }
    }
}
