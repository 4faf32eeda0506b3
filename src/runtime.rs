//! The task-runtime surface the networking core is written against.
//!
//! Tasks are native threads with blocking I/O; the suspension points of
//! the protocol layers (connect, accept, recv, send) simply block their
//! own thread, and per-operation timeouts are socket options. Synchronous
//! calls that should not tie up a protocol task (DNS, disk metadata) go
//! through `blocking`, which hands the closure to a bounded worker pool
//! and waits for the result.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use error::{Error, Result};

/// Number of threads serving `blocking` calls.
const DEFAULT_BLOCKING_WORKERS: usize = 4;

/// Capacity of the worker-pool handoff queue.
const BLOCKING_QUEUE_SIZE: usize = 64;

lazy_static! {
    static ref BLOCKING_POOL: WorkerPool = WorkerPool::new(DEFAULT_BLOCKING_WORKERS);
}

/// Schedules a new task.
pub fn spawn<F>(name: &str, f: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new().name(name.to_owned()).spawn(f)
}

/// Voluntarily reschedules the current task.
pub fn yield_now() {
    thread::yield_now();
}

/// Runs `f` on the blocking worker pool and waits for its result.
///
/// This is the bracket around synchronous system calls that should not
/// occupy a protocol task: the closure migrates to a worker for the
/// duration of the call.
pub fn blocking<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    BLOCKING_POOL.execute(move || {
        let _ = tx.send(f());
    });
    match rx.recv() {
        Ok(value) => value,
        Err(_) => panic!("A blocking call panicked on the worker pool."),
    }
}

/// Resolves `host:port` into candidate socket addresses. The lookup is a
/// blocking call and runs on the worker pool.
pub fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let host = host.to_owned();
    let addrs = blocking(move || -> io::Result<Vec<SocketAddr>> {
        Ok((&host[..], port).to_socket_addrs()?.collect())
    })?;
    if addrs.is_empty() {
        return Err(Error::OperationError(String::from(
            "Host resolution returned no addresses.",
        )));
    }
    Ok(addrs)
}

fn relock<'a, T>(result: ::std::sync::LockResult<MutexGuard<'a, T>>) -> MutexGuard<'a, T> {
    // A poisoned queue is still structurally sound; keep going.
    match result {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A bounded FIFO handoff queue.
///
/// Items are stored in a fixed ring tracked by head and count; the
/// capacity must be a power of two so the ring index is a mask. Producers
/// block while the queue is full and consumers block while it is empty,
/// each on its own condition variable.
#[derive(Debug)]
pub struct BlockingQueue<T> {
    inner: Mutex<Ring<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

#[derive(Debug)]
struct Ring<T> {
    items: Vec<Option<T>>,
    head: usize,
    count: usize,
    mask: usize,
}

impl<T> BlockingQueue<T> {
    /// Creates a queue holding at most `capacity` items. The capacity
    /// must be a nonzero power of two.
    pub fn with_capacity(capacity: usize) -> Result<BlockingQueue<T>> {
        if capacity == 0 || capacity & (capacity - 1) != 0 {
            return Err(Error::ArgumentError(String::from(
                "The queue capacity must be a nonzero power of two.",
            )));
        }

        let mut items = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            items.push(None);
        }

        Ok(BlockingQueue {
            inner: Mutex::new(Ring {
                items: items,
                head: 0,
                count: 0,
                mask: capacity - 1,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        })
    }

    /// Appends `item`, blocking while the queue is full.
    pub fn push(&self, item: T) {
        let mut ring = relock(self.inner.lock());
        while ring.count == ring.items.len() {
            ring = relock(self.not_full.wait(ring));
        }

        let index = (ring.head + ring.count) & ring.mask;
        ring.items[index] = Some(item);
        ring.count += 1;

        self.not_empty.notify_one();
    }

    /// Removes the oldest item, blocking while the queue is empty.
    pub fn pop(&self) -> T {
        let mut ring = relock(self.inner.lock());
        while ring.count == 0 {
            ring = relock(self.not_empty.wait(ring));
        }

        let head = ring.head;
        let item = ring.items[head].take().unwrap();
        ring.head = (ring.head + 1) & ring.mask;
        ring.count -= 1;

        self.not_full.notify_one();
        item
    }

    pub fn len(&self) -> usize {
        relock(self.inner.lock()).count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker threads draining a `BlockingQueue` of closures.
pub struct WorkerPool {
    queue: Arc<BlockingQueue<Job>>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> WorkerPool {
        let queue = Arc::new(BlockingQueue::with_capacity(BLOCKING_QUEUE_SIZE).unwrap());

        for i in 0..workers {
            let queue = queue.clone();
            let name = format!("blocking-worker-{}", i);
            let _ = thread::Builder::new().name(name).spawn(move || loop {
                let job: Job = queue.pop();
                job();
            });
        }

        WorkerPool { queue: queue }
    }

    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(f));
    }
}
