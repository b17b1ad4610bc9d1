//! Multi-producer/single-consumer event transport.
//!
//! The queue decouples producer latency from processing cost: `push` is
//! callable from any number of threads, never blocks, and never surfaces
//! a failure to the caller. In bounded mode a push against a full queue
//! drops the event and bumps a counter instead of stalling the producer.
//!
//! Producers link nodes through an atomic head swap (an intrusive MPSC
//! list in the style of the Vyukov queue); the single consumer chases
//! `next` pointers from a stub node. The only lock in the structure is a
//! mutex around the consumer's tail cursor, held for pointer relinkage
//! only and never across event processing, which also keeps `pop` safe if
//! it is ever called off the consumer thread.

use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::event::Event;

struct Node {
    next: AtomicPtr<Node>,
    value: Option<Event>,
}

impl Node {
    fn new(value: Option<Event>) -> *mut Node {
        Box::into_raw(Box::new(Node {
            next: AtomicPtr::new(ptr::null_mut()),
            value,
        }))
    }
}

/// Unbounded or bounded-with-drop FIFO channel between producer threads
/// and the processor.
///
/// Per-producer FIFO order is preserved; cross-producer interleaving
/// follows arrival order at the head swap with no further guarantee.
pub struct EventQueue {
    /// Most recently pushed node. Producers swap this.
    head: AtomicPtr<Node>,
    /// Consumer cursor, pointing at the current stub node.
    tail: Mutex<*mut Node>,
    /// Approximate number of queued events. Bounded-mode admission reads
    /// this before allocating, so the bound can overshoot by at most the
    /// number of concurrently pushing producers.
    len: AtomicUsize,
    capacity: Option<usize>,
    dropped: AtomicU64,
}

// Safety: `head`/`len`/`dropped` are atomics, `tail` is behind a mutex,
// and node payloads are `Event` (Send). Raw pointers are only ever
// dereferenced by the pushing producer (its own fresh node) or under the
// tail mutex.
unsafe impl Send for EventQueue {}
unsafe impl Sync for EventQueue {}

impl EventQueue {
    /// Create a queue. `capacity: None` is unbounded.
    pub fn new(capacity: Option<usize>) -> Self {
        let stub = Node::new(None);
        Self {
            head: AtomicPtr::new(stub),
            tail: Mutex::new(stub),
            len: AtomicUsize::new(0),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue one event. Never blocks and never fails visibly: when the
    /// queue is bounded and full the event is dropped and counted.
    pub fn push(&self, event: Event) {
        if let Some(capacity) = self.capacity {
            if self.len.load(Ordering::Relaxed) >= capacity {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        let node = Node::new(Some(event));

        // Count before publishing: the increment is sequenced before the
        // link store, so the consumer can never decrement past zero and
        // `len` over-approximates by at most the number of in-flight
        // pushes.
        self.len.fetch_add(1, Ordering::Relaxed);

        // Swap ourselves in as the newest node, then link the previous
        // head to us. Between the swap and the link store the consumer
        // sees a null `next` and treats the queue as empty, which is
        // within the non-blocking pop contract.
        let prev = self.head.swap(node, Ordering::AcqRel);
        // Safety: `prev` is either the stub or a node a producer fully
        // initialized before publishing it through `head`; it is not
        // freed until the consumer has followed its `next` link.
        unsafe {
            (*prev).next.store(node, Ordering::Release);
        }
    }

    /// Dequeue one event, or `None` if the queue is observed empty.
    ///
    /// Intended for the single consumer thread; the tail mutex keeps the
    /// operation well-defined regardless of the caller.
    pub fn pop(&self) -> Option<Event> {
        let mut tail = self.tail.lock().unwrap_or_else(|e| e.into_inner());
        let stub = *tail;

        // Safety: the node under the tail cursor is owned by the consumer
        // side until it is freed below, after the cursor moves past it.
        let next = unsafe { (*stub).next.load(Ordering::Acquire) };
        if next.is_null() {
            return None;
        }

        // Safety: `next` was published with release ordering by the
        // producer that completed its push, so the payload write is
        // visible here. Taking the value turns `next` into the new stub.
        let value = unsafe { (*next).value.take() };
        *tail = next;
        // Safety: no other reference to the old stub can exist; producers
        // only ever hold the node they are currently linking.
        unsafe {
            drop(Box::from_raw(stub));
        }

        self.len.fetch_sub(1, Ordering::Relaxed);
        value
    }

    /// Best-effort emptiness hint for the consumer's idle decision.
    pub fn is_empty(&self) -> bool {
        self.len.load(Ordering::Relaxed) == 0
    }

    /// Approximate queue depth.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Events discarded by the bounded-capacity drop policy.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for EventQueue {
    fn drop(&mut self) {
        while self.pop().is_some() {}

        let stub = *self.tail.lock().unwrap_or_else(|e| e.into_inner());
        // Safety: the queue is quiescent under `&mut self`; only the stub
        // node remains.
        unsafe {
            drop(Box::from_raw(stub));
        }
    }
}
