//! Client registry: peer IP -> control-channel writer
//!
//! The registry is the one piece of shared mutable state in the daemon.
//! The control server registers a writer when a control client connects and
//! unregisters it on disconnect; the frame server only looks writers up
//! (and evicts one when a dispatch write fails).
//!
//! Identity is the peer IP alone - the frame and control connections from
//! one robot arrive on different ephemeral ports. At most one writer is
//! registered per IP; a newer control connection supersedes the older one.
//!
//! Each registration carries a generation token. Unregistering requires the
//! matching token, so a superseded handler's late cleanup can never evict
//! its successor's registration.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Write;
use std::net::{IpAddr, Shutdown, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A cheap handle to one registered control writer.
///
/// Cloned out of the registry under the registry lock; the actual socket
/// write happens after that lock is released so a stalled client cannot
/// block other connections' registry operations. Writes themselves are
/// serialized per registration through the entry's write lock: several
/// frame handlers can hold senders for the same identity, and a framed
/// message must land on the wire in one piece or the client's
/// length-prefixed stream desyncs.
#[derive(Clone)]
pub struct ControlSender {
    stream: Arc<TcpStream>,
    write_lock: Arc<Mutex<()>>,
    generation: u64,
}

impl ControlSender {
    /// Write one complete framed message to the control client
    pub fn send(&self, bytes: &[u8]) -> std::io::Result<()> {
        let _guard = self.write_lock.lock();
        (&*self.stream).write_all(bytes)
    }

    /// Registration generation this handle belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct Entry {
    stream: Arc<TcpStream>,
    write_lock: Arc<Mutex<()>>,
    generation: u64,
}

/// Shared map of client identity to control writer
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<IpAddr, Entry>>,
    next_generation: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or atomically replace the writer for `ip`.
    ///
    /// A superseded writer's socket is shut down so its handler thread
    /// notices promptly. Returns the generation token the caller must
    /// present to [`unregister`](Self::unregister).
    pub fn register(&self, ip: IpAddr, stream: TcpStream) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let entry = Entry {
            stream: Arc::new(stream),
            write_lock: Arc::new(Mutex::new(())),
            generation,
        };
        let old = self.clients.lock().insert(ip, entry);
        if let Some(old) = old {
            log::info!("Superseding control registration for {}", ip);
            let _ = old.stream.shutdown(Shutdown::Both);
        }
        generation
    }

    /// Remove the entry for `ip` if it still belongs to `generation`.
    ///
    /// Returns true when an entry was removed. A stale token (the entry was
    /// already superseded) is a no-op, as is an absent identity.
    pub fn unregister(&self, ip: IpAddr, generation: u64) -> bool {
        let mut clients = self.clients.lock();
        match clients.get(&ip) {
            Some(entry) if entry.generation == generation => {
                clients.remove(&ip);
                true
            }
            _ => false,
        }
    }

    /// Look up the current control writer for `ip`
    pub fn lookup(&self, ip: &IpAddr) -> Option<ControlSender> {
        let clients = self.clients.lock();
        clients.get(ip).map(|entry| ControlSender {
            stream: Arc::clone(&entry.stream),
            write_lock: Arc::clone(&entry.write_lock),
            generation: entry.generation,
        })
    }

    /// Number of registered clients
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
