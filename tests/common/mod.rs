//! Shared helpers for the integration tests.

#![allow(dead_code)]

use spark_fiber::{Host, HostError, Listener, MemoryHost, NodeId, PropValue, Renderer};

/// Install a test-friendly subscriber once. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh renderer over a memory host with one container.
pub fn setup() -> (Renderer<MemoryHost>, NodeId) {
    init_tracing();
    let mut host = MemoryHost::new();
    let root = host.create_root();
    (Renderer::new(host), root)
}

/// Memory host that also logs every listener call as `"add click"` or
/// `"remove click"`, in call order.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub inner: MemoryHost,
    pub log: Vec<String>,
}

impl Host for RecordingHost {
    type Handle = NodeId;

    fn create_element(&mut self, kind: &str) -> Result<NodeId, HostError> {
        self.inner.create_element(kind)
    }

    fn create_text(&mut self) -> Result<NodeId, HostError> {
        self.inner.create_text()
    }

    fn set_property(
        &mut self,
        handle: &NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        self.inner.set_property(handle, name, value)
    }

    fn remove_property(&mut self, handle: &NodeId, name: &str) -> Result<(), HostError> {
        self.inner.remove_property(handle, name)
    }

    fn add_listener(
        &mut self,
        handle: &NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        self.log.push(format!("add {event}"));
        self.inner.add_listener(handle, event, listener)
    }

    fn remove_listener(
        &mut self,
        handle: &NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        self.log.push(format!("remove {event}"));
        self.inner.remove_listener(handle, event, listener)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.inner.append_child(parent, child)
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        before: &NodeId,
    ) -> Result<(), HostError> {
        self.inner.insert_before(parent, child, before)
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.inner.remove_child(parent, child)
    }

    fn destroy(&mut self, handle: &NodeId) -> Result<(), HostError> {
        self.inner.destroy(handle)
    }
}

/// Fresh renderer over a recording host with one container.
pub fn setup_recording() -> (Renderer<RecordingHost>, NodeId) {
    init_tracing();
    let mut host = RecordingHost::default();
    let root = host.inner.create_root();
    (Renderer::new(host), root)
}
