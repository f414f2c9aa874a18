use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Deque;

use crate::types::Message;

/// Bounded FIFO of inbound messages, shared between the transport callback
/// context (producer) and the single consumer task.
///
/// Every operation holds the mutex for its full duration, so no caller can
/// observe a partially updated queue. Nothing here blocks: a full queue drops
/// the incoming message, an empty queue returns `None`.
pub struct MessageQueue<M: RawMutex, const N: usize> {
    inner: Mutex<M, RefCell<Deque<Message, N>>>,
    dropped: AtomicU32,
}

impl<M: RawMutex, const N: usize> MessageQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
            dropped: AtomicU32::new(0),
        }
    }

    /// Appends a message at the tail. On a full queue the message is
    /// discarded and `false` is returned; the producer has no recovery path,
    /// so the drop is only counted and logged.
    pub fn enqueue(&self, msg: Message) -> bool {
        let stored = self.inner.lock(|q| q.borrow_mut().push_back(msg).is_ok());
        if !stored {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("message queue full, dropping message");
        }
        stored
    }

    /// Whether at least one message awaits processing.
    pub fn has_pending(&self) -> bool {
        self.inner.lock(|q| !q.borrow().is_empty())
    }

    /// Pops the head message, oldest first.
    pub fn dequeue(&self) -> Option<Message> {
        self.inner.lock(|q| q.borrow_mut().pop_front())
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|q| q.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_pending()
    }

    /// Messages discarded because the queue was full, since startup.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    use super::*;
    use crate::types::{Message, OTA_DATA};

    fn msg(tag: u8) -> Message {
        Message::from_slice(OTA_DATA, &[tag]).unwrap()
    }

    #[test]
    fn fifo_order_is_preserved() {
        let queue: MessageQueue<CriticalSectionRawMutex, 8> = MessageQueue::new();

        for tag in [1, 2, 3] {
            assert!(queue.enqueue(msg(tag)));
        }

        assert!(queue.has_pending());
        assert_eq!(queue.dequeue().unwrap().payload[0], 1);
        assert_eq!(queue.dequeue().unwrap().payload[0], 2);
        assert_eq!(queue.dequeue().unwrap().payload[0], 3);
        assert!(queue.dequeue().is_none());
        assert!(!queue.has_pending());
    }

    #[test]
    fn full_queue_drops_and_keeps_contents() {
        let queue: MessageQueue<CriticalSectionRawMutex, 4> = MessageQueue::new();

        for tag in 0..4 {
            assert!(queue.enqueue(msg(tag)));
        }
        // At capacity: further enqueues are no-ops.
        assert!(!queue.enqueue(msg(10)));
        assert!(!queue.enqueue(msg(11)));

        assert_eq!(queue.len(), 4);
        assert_eq!(queue.dropped(), 2);
        for tag in 0..4 {
            assert_eq!(queue.dequeue().unwrap().payload[0], tag);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn dequeue_on_empty_never_blocks() {
        let queue: MessageQueue<CriticalSectionRawMutex, 4> = MessageQueue::new();
        assert!(queue.dequeue().is_none());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.dropped(), 0);
    }

    #[test]
    fn concurrent_producer_and_consumer() {
        static QUEUE: MessageQueue<CriticalSectionRawMutex, 16> = MessageQueue::new();
        const COUNT: u8 = 200;

        let producer = std::thread::spawn(|| {
            for tag in 0..COUNT {
                QUEUE.enqueue(msg(tag));
            }
        });

        let mut received = Vec::new();
        loop {
            while let Some(m) = QUEUE.dequeue() {
                received.push(m.payload[0]);
            }
            if producer.is_finished() && !QUEUE.has_pending() {
                break;
            }
            std::thread::yield_now();
        }
        producer.join().unwrap();

        // Whatever survived the backpressure drops must come out in order.
        assert_eq!(received.len() as u32, COUNT as u32 - QUEUE.dropped());
        assert!(received.windows(2).all(|w| w[0] < w[1]));
    }
}
