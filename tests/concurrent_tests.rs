//! Concurrent access tests for a shared `LiveStore`.
//!
//! These tests drive one store from several threads and check that the
//! backend, the cell and the last emission every subscriber saw end up in
//! agreement, with emissions delivered in the order values were written.
//!
//! Tests include:
//! - A write that stalls inside the backend while another thread writes
//! - A subscriber that stalls on one value while another thread writes
//! - Many threads hammering the same key

use anyhow::Result;
use livekv::LiveStore;
use livekv::kv::{Backend, MemoryBackend, StorageBackend};
use parking_lot::Mutex;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

/// Memory backend that parks the writer of one specific value.
///
/// The writer meets `barrier` right after storing `stall_on`, then sleeps,
/// so another thread is guaranteed to run while the first write is still in
/// flight.
struct StallingBackend {
    inner: MemoryBackend,
    stall_on: &'static str,
    barrier: Arc<Barrier>,
}

impl StorageBackend for StallingBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set_item(key, value)?;
        if value == self.stall_on {
            self.barrier.wait();
            thread::sleep(Duration::from_millis(50));
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.inner.remove_item(key)
    }

    fn clear(&self) -> Result<()> {
        self.inner.clear()
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys()
    }
}

#[test]
fn test_stalled_write_does_not_reorder_cell() {
    let physical = MemoryBackend::new();
    let barrier = Arc::new(Barrier::new(2));
    let store = LiveStore::new(Backend::present(StallingBackend {
        inner: physical.clone(),
        stall_on: "1",
        barrier: Arc::clone(&barrier),
    }));
    let _ = store.get::<i32>("k");

    let writer = {
        let store = store.clone();
        thread::spawn(move || store.set("k", &1).unwrap())
    };

    // The first write is now inside the backend
    barrier.wait();
    store.set("k", &2).unwrap();
    writer.join().unwrap();

    assert_eq!(physical.get_item("k").unwrap().as_deref(), Some("2"));
    assert_eq!(store.get::<i32>("k").value().unwrap(), Some(2));
}

#[test]
fn test_slow_subscriber_sees_publish_order() {
    let store = LiveStore::memory();
    let barrier = Arc::new(Barrier::new(2));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let _sub = {
        let barrier = Arc::clone(&barrier);
        let seen = Arc::clone(&seen);
        store.get::<i32>("k").subscribe(move |emission| {
            let value = emission.unwrap();
            seen.lock().push(value);
            if value == Some(1) {
                barrier.wait();
                thread::sleep(Duration::from_millis(50));
            }
        })
    };

    let writer = {
        let store = store.clone();
        thread::spawn(move || store.set("k", &1).unwrap())
    };

    // The subscriber is now handling 1
    barrier.wait();
    store.set("k", &2).unwrap();
    writer.join().unwrap();

    assert_eq!(*seen.lock(), vec![None, Some(1), Some(2)]);
    assert_eq!(store.get::<i32>("k").value().unwrap(), Some(2));
}

#[test]
fn test_many_writers_agree_on_final_value() {
    const THREADS: usize = 8;
    const WRITES: usize = 200;

    let physical = MemoryBackend::new();
    let store = LiveStore::new(Backend::present(physical.clone()));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let _sub = {
        let seen = Arc::clone(&seen);
        store
            .get::<usize>("counter")
            .subscribe(move |emission| seen.lock().push(emission.unwrap()))
    };

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..WRITES {
                    store.set("counter", &(t * WRITES + i)).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let last = *seen.lock().last().unwrap();
    let cell = store.get::<usize>("counter").value().unwrap();
    let persisted = physical.get_item("counter").unwrap();

    assert_eq!(last, cell);
    assert_eq!(persisted, cell.map(|v| v.to_string()));
    // Every distinct write reached the subscriber exactly once
    assert_eq!(seen.lock().len(), 1 + THREADS * WRITES);
}

#[test]
fn test_subscriber_write_back_across_threads() {
    let store = LiveStore::memory();

    // Mirror "a" into "b" from inside a subscriber while other threads write
    let _mirror = {
        let writer = store.clone();
        store.get::<i32>("a").subscribe(move |emission| {
            if let Ok(Some(v)) = emission {
                writer.set("b", &v).unwrap();
            }
        })
    };

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    store.set("a", &(t * 100 + i)).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        store.get::<i32>("a").value().unwrap(),
        store.get::<i32>("b").value().unwrap()
    );
}
