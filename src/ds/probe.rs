//! Key hashing and the linear probe sequence.
//!
//! The home slot of an address is `fnv1a_32(address) % capacity`. Collisions
//! are resolved by walking forward one slot at a time, wrapping at the end,
//! for at most `capacity` steps.
//!
//! ```text
//!   capacity = 5, home = 3
//!
//!   step:   0   1   2   3   4
//!   slot:   3   4   0   1   2
//! ```
//!
//! Placement therefore depends only on the address bytes, the capacity and
//! the current slot states, never on process state.

use crate::address::MacAddress;

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the six address octets.
#[inline]
pub fn hash_address(address: &MacAddress) -> u32 {
    address
        .as_bytes()
        .iter()
        .fold(FNV_OFFSET_BASIS, |hash, &octet| {
            (hash ^ u32::from(octet)).wrapping_mul(FNV_PRIME)
        })
}

/// Home slot of `address` in a table of `capacity` slots.
///
/// `capacity` must be non-zero.
#[inline]
pub fn home_slot(address: &MacAddress, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    hash_address(address) as usize % capacity
}

/// Slot indices visited when probing for one address.
///
/// Yields exactly `capacity` indices, each slot once, starting at the home
/// slot.
#[derive(Debug, Clone)]
pub struct ProbeSeq {
    next: usize,
    remaining: usize,
    capacity: usize,
}

impl ProbeSeq {
    pub fn new(address: &MacAddress, capacity: usize) -> Self {
        Self::starting_at(home_slot(address, capacity), capacity)
    }

    pub fn starting_at(start: usize, capacity: usize) -> Self {
        Self {
            next: start,
            remaining: capacity,
            capacity,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.next;
        self.remaining -= 1;
        self.next = (self.next + 1) % self.capacity;
        Some(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ProbeSeq {}
