use super::shm_region::ShmRegion;
use crate::error::{WhillError, WhillResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Minimum number of slots in a ring; larger history depths grow the ring
pub const RING_SLOTS: usize = 64;

/// Largest encoded message a slot can hold
pub const SLOT_PAYLOAD_BYTES: usize = 4096;

const RING_MAGIC: u64 = 0x5748_494c_4c52_4e47;
const INIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Ring header at the start of the region
#[repr(C, align(64))]
struct RingHeader {
    magic: AtomicU64,
    type_hash: AtomicU64,
    capacity: AtomicU64,
    slot_payload: AtomicU64,
    /// Sequence number the next writer will claim
    head: AtomicU64,
    _padding: [u8; 24],
}

/// Per-slot header; the payload bytes follow it
///
/// `stamp` is a sequence lock: `2 * seq + 1` while message `seq` is being
/// written, `2 * seq + 2` once it is complete.
#[repr(C)]
struct SlotHeader {
    stamp: AtomicU64,
    sender: AtomicU64,
    len: AtomicU64,
}

const HEADER_SIZE: usize = mem::size_of::<RingHeader>();

fn slot_stride(payload: usize) -> usize {
    (mem::size_of::<SlotHeader>() + payload).div_ceil(8) * 8
}

/// FNV-1a of the type name, so two processes agree on a topic's message type
fn type_fingerprint<T>() -> u64 {
    std::any::type_name::<T>()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
        })
}

fn next_sender_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    ((std::process::id() as u64) << 32) | (NEXT.fetch_add(1, Ordering::Relaxed) & 0xffff_ffff)
}

/// Ring of serialized messages in a shared memory region
///
/// Any number of writers and readers, in any number of processes, may map
/// the same ring. Each `ShmTopic` reads with its own cursor, starting at the
/// ring head when it is opened, and skips the messages it sent itself. A
/// reader that falls more than `depth` messages behind jumps forward and
/// counts the skipped messages.
pub struct ShmTopic<T> {
    region: ShmRegion,
    base: NonNull<u8>,
    capacity: u64,
    slot_payload: usize,
    depth: u64,
    sender_id: u64,
    cursor: AtomicU64,
    skipped: AtomicU64,
    _phantom: PhantomData<fn() -> T>,
}

// SAFETY: all shared state is accessed through atomics or the slot sequence lock
unsafe impl<T> Send for ShmTopic<T> {}
unsafe impl<T> Sync for ShmTopic<T> {}

impl<T> ShmTopic<T> {
    /// Map the ring for `name`, creating it if no process has yet
    pub fn open(name: &str, depth: usize) -> WhillResult<Self> {
        if depth == 0 {
            return Err(WhillError::config(format!(
                "History depth for '{}' must be at least 1",
                name
            )));
        }

        let capacity = depth.max(RING_SLOTS);
        let size = HEADER_SIZE + capacity * slot_stride(SLOT_PAYLOAD_BYTES);
        let mut region = ShmRegion::open_or_create(name, size)?;
        if region.len() < HEADER_SIZE {
            return Err(WhillError::communication(format!(
                "Shared memory for '{}' is too small for a ring header",
                name
            )));
        }

        let base = NonNull::new(region.as_mut_ptr())
            .ok_or_else(|| WhillError::Internal(format!("Null mapping for '{}'", name)))?;
        // SAFETY: the mapping is page aligned and at least HEADER_SIZE long
        let header = unsafe { &*(base.as_ptr() as *const RingHeader) };

        if region.is_owner() {
            header.type_hash.store(type_fingerprint::<T>(), Ordering::Relaxed);
            header.capacity.store(capacity as u64, Ordering::Relaxed);
            header
                .slot_payload
                .store(SLOT_PAYLOAD_BYTES as u64, Ordering::Relaxed);
            header.head.store(0, Ordering::Relaxed);
            header.magic.store(RING_MAGIC, Ordering::Release);
        } else {
            wait_for_magic(header, name)?;
        }

        if header.type_hash.load(Ordering::Relaxed) != type_fingerprint::<T>() {
            return Err(WhillError::communication(format!(
                "Shared topic '{}' carries a different message type than {}",
                name,
                std::any::type_name::<T>()
            )));
        }

        let capacity = header.capacity.load(Ordering::Relaxed);
        let slot_payload = header.slot_payload.load(Ordering::Relaxed) as usize;
        let required = HEADER_SIZE + capacity as usize * slot_stride(slot_payload);
        if capacity == 0 || region.len() < required {
            return Err(WhillError::communication(format!(
                "Shared memory for '{}' is {} bytes, ring needs {}; remove {}",
                name,
                region.len(),
                required,
                region.path().display()
            )));
        }

        let cursor = header.head.load(Ordering::Acquire);
        Ok(Self {
            region,
            base,
            capacity,
            slot_payload,
            depth: (depth as u64).min(capacity),
            sender_id: next_sender_id(),
            cursor: AtomicU64::new(cursor),
            skipped: AtomicU64::new(0),
            _phantom: PhantomData,
        })
    }

    fn header(&self) -> &RingHeader {
        // SAFETY: validated in `open`; the region outlives `self`
        unsafe { &*(self.base.as_ptr() as *const RingHeader) }
    }

    fn slot(&self, seq: u64) -> (&SlotHeader, *mut u8) {
        let index = (seq % self.capacity) as usize;
        let offset = HEADER_SIZE + index * slot_stride(self.slot_payload);
        // SAFETY: index < capacity and the region holds `capacity` slots
        unsafe {
            let slot_ptr = self.base.as_ptr().add(offset);
            let header = &*(slot_ptr as *const SlotHeader);
            (header, slot_ptr.add(mem::size_of::<SlotHeader>()))
        }
    }

    /// Append an encoded message to the ring
    pub fn push_bytes(&self, bytes: &[u8]) -> WhillResult<()> {
        if bytes.len() > self.slot_payload {
            return Err(WhillError::communication(format!(
                "Encoded message is {} bytes, slot holds {}",
                bytes.len(),
                self.slot_payload
            )));
        }

        let seq = self.header().head.fetch_add(1, Ordering::AcqRel);
        let (slot, payload) = self.slot(seq);

        slot.stamp.store(seq * 2 + 1, Ordering::Relaxed);
        fence(Ordering::Release);
        slot.sender.store(self.sender_id, Ordering::Relaxed);
        slot.len.store(bytes.len() as u64, Ordering::Relaxed);
        // SAFETY: the payload area is `slot_payload` bytes and bytes.len() fits
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), payload, bytes.len());
        }
        slot.stamp.store(seq * 2 + 2, Ordering::Release);
        Ok(())
    }

    /// Next encoded message from another sender, if a complete one is waiting
    pub fn pop_bytes(&self) -> Option<Vec<u8>> {
        loop {
            let head = self.header().head.load(Ordering::Acquire);
            let mut next = self.cursor.load(Ordering::Relaxed);
            if next >= head {
                return None;
            }

            if head - next > self.depth {
                let oldest_kept = head - self.depth;
                self.skipped.fetch_add(oldest_kept - next, Ordering::Relaxed);
                next = oldest_kept;
                self.cursor.store(next, Ordering::Relaxed);
            }

            let (slot, payload) = self.slot(next);
            let ready = next * 2 + 2;
            let stamp = slot.stamp.load(Ordering::Acquire);
            if stamp < ready {
                // Writer has claimed the slot but not finished
                return None;
            }
            if stamp > ready {
                self.skip(next);
                continue;
            }

            let sender = slot.sender.load(Ordering::Relaxed);
            let len = (slot.len.load(Ordering::Relaxed) as usize).min(self.slot_payload);
            let mut bytes = vec![0u8; len];
            // SAFETY: len is clamped to the payload area
            unsafe {
                std::ptr::copy_nonoverlapping(payload, bytes.as_mut_ptr(), len);
            }
            fence(Ordering::Acquire);
            if slot.stamp.load(Ordering::Relaxed) != ready {
                // Overwritten while copying
                self.skip(next);
                continue;
            }

            self.cursor.store(next + 1, Ordering::Relaxed);
            if sender == self.sender_id {
                continue;
            }
            return Some(bytes);
        }
    }

    fn skip(&self, seq: u64) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.cursor.store(seq + 1, Ordering::Relaxed);
    }

    pub fn send(&self, msg: &T) -> WhillResult<()>
    where
        T: Serialize,
    {
        let bytes = bincode::serialize(msg)
            .map_err(|e| WhillError::communication(format!("Failed to encode message: {}", e)))?;
        self.push_bytes(&bytes)
    }

    /// Decode the next message; undecodable entries are counted as skipped
    pub fn recv(&self) -> Option<T>
    where
        T: DeserializeOwned,
    {
        loop {
            let bytes = self.pop_bytes()?;
            match bincode::deserialize(&bytes) {
                Ok(msg) => return Some(msg),
                Err(e) => {
                    log::warn!(
                        "Dropping undecodable message on {}: {}",
                        self.region.path().display(),
                        e
                    );
                    self.skipped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Messages waiting for this reader, including its own
    pub fn pending(&self) -> usize {
        let head = self.header().head.load(Ordering::Acquire);
        let unread = head.saturating_sub(self.cursor.load(Ordering::Relaxed));
        unread.min(self.depth) as usize
    }

    /// Number of messages skipped since the last call
    pub fn take_skipped(&self) -> u64 {
        self.skipped.swap(0, Ordering::Relaxed)
    }

    pub fn depth(&self) -> usize {
        self.depth as usize
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }
}

fn wait_for_magic(header: &RingHeader, name: &str) -> WhillResult<()> {
    let deadline = Instant::now() + INIT_TIMEOUT;
    while header.magic.load(Ordering::Acquire) != RING_MAGIC {
        if Instant::now() >= deadline {
            return Err(WhillError::communication(format!(
                "Shared topic '{}' was never initialized by its creator",
                name
            )));
        }
        thread::sleep(Duration::from_millis(1));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Status {
        code: u32,
        note: String,
    }

    impl Status {
        fn new(code: u32) -> Self {
            Self {
                code,
                note: format!("status {}", code),
            }
        }
    }

    fn unique(name: &str) -> String {
        format!("/shm_topic_test/{}/{}", std::process::id(), name)
    }

    #[test]
    fn test_delivers_between_mappings() {
        let name = unique("deliver");
        let writer = ShmTopic::<Status>::open(&name, 10).unwrap();
        let reader = ShmTopic::<Status>::open(&name, 10).unwrap();

        writer.send(&Status::new(1)).unwrap();
        writer.send(&Status::new(2)).unwrap();

        assert_eq!(reader.recv(), Some(Status::new(1)));
        assert_eq!(reader.recv(), Some(Status::new(2)));
        assert_eq!(reader.recv(), None);
    }

    #[test]
    fn test_own_messages_are_skipped() {
        let name = unique("own");
        let topic = ShmTopic::<Status>::open(&name, 10).unwrap();
        let other = ShmTopic::<Status>::open(&name, 10).unwrap();

        topic.send(&Status::new(1)).unwrap();
        other.send(&Status::new(2)).unwrap();

        assert_eq!(topic.recv(), Some(Status::new(2)));
        assert_eq!(topic.recv(), None);
        assert_eq!(other.recv(), Some(Status::new(1)));
    }

    #[test]
    fn test_late_reader_sees_no_history() {
        let name = unique("late");
        let writer = ShmTopic::<Status>::open(&name, 10).unwrap();
        writer.send(&Status::new(1)).unwrap();

        let reader = ShmTopic::<Status>::open(&name, 10).unwrap();
        assert_eq!(reader.recv(), None);
        writer.send(&Status::new(2)).unwrap();
        assert_eq!(reader.recv(), Some(Status::new(2)));
    }

    #[test]
    fn test_slow_reader_keeps_newest_depth() {
        let name = unique("depth");
        let writer = ShmTopic::<Status>::open(&name, 10).unwrap();
        let reader = ShmTopic::<Status>::open(&name, 3).unwrap();

        for code in 0..5 {
            writer.send(&Status::new(code)).unwrap();
        }

        assert_eq!(reader.pending(), 3);
        assert_eq!(reader.recv(), Some(Status::new(2)));
        assert_eq!(reader.take_skipped(), 2);
        assert_eq!(reader.take_skipped(), 0);
    }

    #[test]
    fn test_ring_wraps_around() {
        let name = unique("wrap");
        let writer = ShmTopic::<Status>::open(&name, 10).unwrap();
        let reader = ShmTopic::<Status>::open(&name, 10).unwrap();

        for code in 0..(RING_SLOTS as u32 * 3) {
            writer.send(&Status::new(code)).unwrap();
            assert_eq!(reader.recv(), Some(Status::new(code)));
        }
    }

    #[test]
    fn test_oversized_message_is_rejected() {
        let name = unique("oversized");
        let topic = ShmTopic::<Status>::open(&name, 10).unwrap();
        let huge = Status {
            code: 0,
            note: "x".repeat(SLOT_PAYLOAD_BYTES + 1),
        };

        assert!(matches!(
            topic.send(&huge),
            Err(WhillError::Communication(_))
        ));
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let name = unique("mismatch");
        let _status = ShmTopic::<Status>::open(&name, 10).unwrap();
        assert!(matches!(
            ShmTopic::<f64>::open(&name, 10),
            Err(WhillError::Communication(_))
        ));
    }

    #[test]
    fn test_large_depth_grows_ring() {
        let topic = ShmTopic::<Status>::open(&unique("grow"), RING_SLOTS * 2).unwrap();
        assert_eq!(topic.capacity(), RING_SLOTS * 2);
        assert_eq!(topic.depth(), RING_SLOTS * 2);
    }
}
