//! In-memory device and local-source fakes shared by the synchronization
//! tests. The device fake models the parts of the Web API the engine
//! touches: a flat path-keyed filesystem, ticket slots with open/close
//! accounting, and configurable failure injection.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};

use s7web_core::domain::newtypes::{ResourcePath, TicketId};
use s7web_core::domain::resource::{FileAttrs, ResourceTree};
use s7web_core::domain::ticket::{Ticket, TicketProvider, TicketState};
use s7web_core::ports::local_source::{IgnoreConfig, ILocalSource};
use s7web_core::ports::rpc_transport::{IRpcTransport, ResourceMeta, TransportError};

pub fn mtime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

// ============================================================================
// FakeDevice
// ============================================================================

#[derive(Debug, Clone)]
pub enum Entry {
    Dir,
    File { data: Vec<u8>, meta: ResourceMeta },
}

struct PendingTicket {
    path: String,
    meta: ResourceMeta,
    state: TicketState,
}

/// Device fake with a path-keyed filesystem and ticket accounting
#[derive(Default)]
pub struct FakeDevice {
    fs: Mutex<BTreeMap<String, Entry>>,
    exists: Mutex<bool>,
    tickets: Mutex<HashMap<String, PendingTicket>>,
    next_ticket: AtomicU64,
    pub opened: AtomicU64,
    pub closed: AtomicU64,
    /// Path whose `create_resource` always fails
    pub reject_create: Mutex<Option<String>>,
    /// Path whose payload upload always fails
    pub reject_upload: Mutex<Option<String>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device fake with an already existing, possibly populated application
    pub fn with_app() -> Self {
        let device = Self::new();
        *device.exists.lock().unwrap() = true;
        device
    }

    pub fn seed_file(&self, path: &str, data: &[u8], last_modified: DateTime<Utc>) {
        let meta = ResourceMeta {
            media_type: None,
            last_modified,
            visibility: Default::default(),
            etag: None,
        };
        self.fs.lock().unwrap().insert(
            path.to_string(),
            Entry::File { data: data.to_vec(), meta },
        );
        *self.exists.lock().unwrap() = true;
    }

    pub fn seed_dir(&self, path: &str) {
        self.fs.lock().unwrap().insert(path.to_string(), Entry::Dir);
        *self.exists.lock().unwrap() = true;
    }

    pub fn open_tickets(&self) -> usize {
        self.tickets.lock().unwrap().len()
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.fs.lock().unwrap().contains_key(path)
    }

    pub fn file_data(&self, path: &str) -> Option<Vec<u8>> {
        match self.fs.lock().unwrap().get(path) {
            Some(Entry::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    fn mint_ticket(&self) -> TicketId {
        let n = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        TicketId::new(format!("t{n:027}")).unwrap()
    }
}

#[async_trait::async_trait]
impl IRpcTransport for FakeDevice {
    async fn create_resource(
        &self,
        path: &ResourcePath,
        meta: &ResourceMeta,
    ) -> Result<TicketId> {
        if self.reject_create.lock().unwrap().as_deref() == Some(path.as_str()) {
            return Err(anyhow::Error::new(TransportError::PermissionDenied(
                path.to_string(),
            )));
        }
        let id = self.mint_ticket();
        self.tickets.lock().unwrap().insert(
            id.to_string(),
            PendingTicket {
                path: path.to_string(),
                meta: meta.clone(),
                state: TicketState::Created,
            },
        );
        *self.exists.lock().unwrap() = true;
        Ok(id)
    }

    async fn download_resource(&self, path: &ResourcePath) -> Result<TicketId> {
        if !self.has_path(path.as_str()) {
            return Err(anyhow::Error::new(TransportError::NotFound(
                path.to_string(),
            )));
        }
        let id = self.mint_ticket();
        self.tickets.lock().unwrap().insert(
            id.to_string(),
            PendingTicket {
                path: path.to_string(),
                meta: ResourceMeta {
                    media_type: None,
                    last_modified: mtime(0),
                    visibility: Default::default(),
                    etag: None,
                },
                state: TicketState::Completed,
            },
        );
        Ok(id)
    }

    async fn delete_resource(&self, path: &ResourcePath) -> Result<()> {
        match self.fs.lock().unwrap().remove(path.as_str()) {
            Some(_) => Ok(()),
            None => Err(anyhow::Error::new(TransportError::NotFound(
                path.to_string(),
            ))),
        }
    }

    async fn create_directory(&self, path: &ResourcePath) -> Result<()> {
        self.fs
            .lock()
            .unwrap()
            .insert(path.to_string(), Entry::Dir);
        *self.exists.lock().unwrap() = true;
        Ok(())
    }

    async fn delete_directory(&self, path: &ResourcePath) -> Result<()> {
        let prefix = format!("{path}/");
        let mut fs = self.fs.lock().unwrap();
        if fs.keys().any(|k| k.starts_with(&prefix)) {
            return Err(anyhow::Error::new(TransportError::EntityInUse(
                path.to_string(),
            )));
        }
        match fs.remove(path.as_str()) {
            Some(_) => Ok(()),
            None => Err(anyhow::Error::new(TransportError::NotFound(
                path.to_string(),
            ))),
        }
    }

    async fn browse_resource_tree(
        &self,
        _path: Option<&ResourcePath>,
    ) -> Result<ResourceTree> {
        if !*self.exists.lock().unwrap() {
            return Err(anyhow::Error::new(TransportError::NotFound(
                "app".to_string(),
            )));
        }
        let fs = self.fs.lock().unwrap();
        let mut tree = ResourceTree::new("app");
        // BTreeMap iteration is lexicographic, parents come before children
        for (path, entry) in fs.iter() {
            let rp = ResourcePath::new(path)?;
            let parent = match rp.parent() {
                Some(p) => tree
                    .find(&p)
                    .ok_or_else(|| anyhow::anyhow!("orphan path {path}"))?,
                None => tree.root(),
            };
            match entry {
                Entry::Dir => {
                    tree.add_directory(parent, rp.name())?;
                }
                Entry::File { data, meta } => {
                    let mut attrs = FileAttrs::new(data.len() as u64, meta.last_modified);
                    attrs.media_type = meta.media_type.clone();
                    attrs.etag = meta.etag.clone();
                    attrs.visibility = meta.visibility;
                    tree.add_file(parent, rp.name(), attrs)?;
                }
            }
        }
        Ok(tree)
    }

    async fn browse_ticket(&self, id: &TicketId) -> Result<Ticket> {
        let tickets = self.tickets.lock().unwrap();
        let pending = tickets.get(id.as_str()).ok_or_else(|| {
            anyhow::Error::new(TransportError::TicketNotFound(id.to_string()))
        })?;
        Ok(Ticket {
            id: id.clone(),
            state: pending.state,
            provider: TicketProvider::WebAppCreateResource,
            created: Utc::now(),
            data: None,
        })
    }

    async fn close_ticket(&self, id: &TicketId) -> Result<()> {
        self.tickets.lock().unwrap().remove(id.as_str());
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn download_ticket_content(&self, id: &TicketId) -> Result<Vec<u8>> {
        let tickets = self.tickets.lock().unwrap();
        let pending = tickets.get(id.as_str()).ok_or_else(|| {
            anyhow::Error::new(TransportError::TicketNotFound(id.to_string()))
        })?;
        Ok(self.file_data(&pending.path).unwrap_or_default())
    }

    async fn upload_ticket_content(&self, id: &TicketId, data: &[u8]) -> Result<()> {
        let mut tickets = self.tickets.lock().unwrap();
        let pending = tickets.get_mut(id.as_str()).ok_or_else(|| {
            anyhow::Error::new(TransportError::TicketNotFound(id.to_string()))
        })?;
        if self.reject_upload.lock().unwrap().as_deref() == Some(pending.path.as_str()) {
            pending.state = TicketState::Failed;
            return Err(anyhow::Error::new(TransportError::Device {
                code: 1,
                message: format!("payload rejected for {}", pending.path),
            }));
        }
        self.fs.lock().unwrap().insert(
            pending.path.clone(),
            Entry::File {
                data: data.to_vec(),
                meta: pending.meta.clone(),
            },
        );
        pending.state = TicketState::Completed;
        Ok(())
    }
}

// ============================================================================
// MemorySource
// ============================================================================

/// In-memory local source; paths map to (bytes, mtime)
#[derive(Default)]
pub struct MemorySource {
    files: BTreeMap<String, (Vec<u8>, DateTime<Utc>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: &str, data: &[u8], mtime_secs: i64) -> Self {
        self.files
            .insert(path.to_string(), (data.to_vec(), mtime(mtime_secs)));
        self
    }
}

#[async_trait::async_trait]
impl ILocalSource for MemorySource {
    async fn scan(&self, _root: &Path, _ignore: &IgnoreConfig) -> Result<ResourceTree> {
        let mut tree = ResourceTree::new("app");
        for (path, (data, modified)) in &self.files {
            let rp = ResourcePath::new(path)?;
            let segments: Vec<&str> = rp.segments().collect();
            let mut parent = tree.root();
            for segment in &segments[..segments.len() - 1] {
                parent = match tree.child_by_name(parent, segment) {
                    Some(idx) => idx,
                    None => tree.add_directory(parent, *segment)?,
                };
            }
            let name = segments[segments.len() - 1];
            tree.add_file(parent, name, FileAttrs::new(data.len() as u64, *modified))?;
        }
        Ok(tree)
    }

    async fn read(&self, _root: &Path, path: &ResourcePath) -> Result<Vec<u8>> {
        self.files
            .get(path.as_str())
            .map(|(data, _)| data.clone())
            .ok_or_else(|| anyhow::anyhow!("no such local file: {path}"))
    }
}
