pub mod expiry_heap;
pub mod probe;
pub mod slot_table;

pub use expiry_heap::{ExpiryHeap, HeapEntry};
pub use probe::{ProbeSeq, hash_address, home_slot};
pub use slot_table::{Entry, InsertProbe, SlotState, SlotTable};
