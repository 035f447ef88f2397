use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use smallvec::SmallVec;

use crate::dataset::DataObject;
use crate::foundation::core::next_stamp;
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::pipeline::algorithm::{Algorithm, InputPortSpec, OutputPortSpec};
use crate::pipeline::executive::{Executive, ExecutiveOpts, PortState, UpdateRequest};
use crate::pipeline::fingerprint::{Fingerprint, StableHasher};
use crate::pipeline::information::Information;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// One upstream connection of an input port.
#[derive(Clone)]
pub struct Connection {
    /// Producing node (held strongly: ownership runs downstream to upstream).
    pub producer: Arc<Node>,
    /// Output port of the producer.
    pub port: usize,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.producer.name(), self.port)
    }
}

type Connections = SmallVec<[Connection; 1]>;

/// An algorithm placed in the pipeline graph, together with its executive.
///
/// Nodes are always handled through `Arc<Node>`. Input connections hold their producers
/// strongly; producers see their consumers only through weak references.
pub struct Node {
    id: u64,
    name: String,
    input_specs: Vec<InputPortSpec>,
    output_specs: Vec<OutputPortSpec>,
    algorithm: Mutex<Box<dyn Algorithm>>,
    inputs: Mutex<Vec<Connections>>,
    consumers: Mutex<Vec<(Weak<Node>, usize)>>,
    mtime: AtomicU64,
    executive: Executive,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("inputs", &*self.lock_inputs())
            .finish()
    }
}

impl Node {
    /// Wrap an algorithm with default executive options.
    pub fn new(algorithm: impl Algorithm) -> Arc<Self> {
        Self::with_opts(algorithm, ExecutiveOpts::default())
    }

    /// Wrap an algorithm with explicit executive options.
    pub fn with_opts(algorithm: impl Algorithm, opts: ExecutiveOpts) -> Arc<Self> {
        Self::from_boxed(Box::new(algorithm), opts)
    }

    /// Wrap an already boxed algorithm.
    pub fn from_boxed(algorithm: Box<dyn Algorithm>, opts: ExecutiveOpts) -> Arc<Self> {
        let input_specs = algorithm.input_ports();
        let output_specs = algorithm.output_ports();
        let name = algorithm.name().to_owned();
        let n_in = input_specs.len();
        let n_out = output_specs.len();
        Arc::new_cyclic(|weak| Self {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            name,
            input_specs,
            output_specs,
            algorithm: Mutex::new(algorithm),
            inputs: Mutex::new(vec![Connections::new(); n_in]),
            consumers: Mutex::new(Vec::new()),
            mtime: AtomicU64::new(next_stamp()),
            executive: Executive::new(opts, weak.clone(), n_out),
        })
    }

    /// Process-unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Algorithm name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input port declarations.
    pub fn input_specs(&self) -> &[InputPortSpec] {
        &self.input_specs
    }

    /// Output port declarations.
    pub fn output_specs(&self) -> &[OutputPortSpec] {
        &self.output_specs
    }

    /// The executive driving this node.
    pub fn executive(&self) -> &Executive {
        &self.executive
    }

    /// Mark the algorithm as modified; downstream caches become stale.
    pub fn modified(&self) {
        self.mtime.store(next_stamp(), Ordering::Release);
    }

    /// Stamp of this node's own configuration (including external dependencies).
    pub fn mtime(&self) -> u64 {
        let own = self.mtime.load(Ordering::Acquire);
        own.max(self.lock_algorithm().dependency_mtime())
    }

    /// Latest stamp of this node and everything upstream of it.
    pub fn pipeline_mtime(&self) -> u64 {
        self.connections()
            .iter()
            .flatten()
            .map(|c| c.producer.pipeline_mtime())
            .fold(self.mtime(), u64::max)
    }

    /// Mutate the algorithm as concrete type `A`; marks the node modified.
    pub fn configure<A: Algorithm, R>(&self, f: impl FnOnce(&mut A) -> R) -> VoxflowResult<R> {
        let r = {
            let mut g = self.lock_algorithm();
            let alg: &mut dyn Algorithm = &mut **g;
            let any: &mut dyn std::any::Any = alg;
            let a = any.downcast_mut::<A>().ok_or_else(|| {
                VoxflowError::validation(format!(
                    "node '{}' does not hold a {}",
                    self.name,
                    std::any::type_name::<A>()
                ))
            })?;
            f(a)
        };
        self.modified();
        Ok(r)
    }

    /// Read the algorithm as concrete type `A`.
    pub fn inspect<A: Algorithm, R>(&self, f: impl FnOnce(&A) -> R) -> VoxflowResult<R> {
        let g = self.lock_algorithm();
        let alg: &dyn Algorithm = &**g;
        let any: &dyn std::any::Any = alg;
        let a = any.downcast_ref::<A>().ok_or_else(|| {
            VoxflowError::validation(format!(
                "node '{}' does not hold a {}",
                self.name,
                std::any::type_name::<A>()
            ))
        })?;
        Ok(f(a))
    }

    /// Connect `producer:out_port` to input `port`, replacing existing connections.
    pub fn set_input_connection(
        self: &Arc<Self>,
        port: usize,
        producer: &Arc<Node>,
        out_port: usize,
    ) -> VoxflowResult<()> {
        self.check_connection(port, producer, out_port)?;
        let old = {
            let mut inputs = self.lock_inputs();
            std::mem::replace(
                &mut inputs[port],
                smallvec::smallvec![Connection {
                    producer: Arc::clone(producer),
                    port: out_port,
                }],
            )
        };
        for c in old {
            c.producer.unregister_consumer(self, c.port);
        }
        producer.register_consumer(self, out_port);
        self.modified();
        Ok(())
    }

    /// Add a connection to a repeatable input `port`.
    pub fn add_input_connection(
        self: &Arc<Self>,
        port: usize,
        producer: &Arc<Node>,
        out_port: usize,
    ) -> VoxflowResult<()> {
        self.check_connection(port, producer, out_port)?;
        {
            let mut inputs = self.lock_inputs();
            if !self.input_specs[port].repeatable && !inputs[port].is_empty() {
                return Err(VoxflowError::bad_input(format!(
                    "input port {port} ('{}') of '{}' takes a single connection",
                    self.input_specs[port].name, self.name
                )));
            }
            inputs[port].push(Connection {
                producer: Arc::clone(producer),
                port: out_port,
            });
        }
        producer.register_consumer(self, out_port);
        self.modified();
        Ok(())
    }

    /// Remove one `producer:out_port` connection from input `port`. Returns whether one
    /// was found.
    pub fn remove_input_connection(
        self: &Arc<Self>,
        port: usize,
        producer: &Arc<Node>,
        out_port: usize,
    ) -> bool {
        let removed = {
            let mut inputs = self.lock_inputs();
            let Some(conns) = inputs.get_mut(port) else {
                return false;
            };
            match conns
                .iter()
                .position(|c| Arc::ptr_eq(&c.producer, producer) && c.port == out_port)
            {
                Some(i) => {
                    conns.remove(i);
                    true
                }
                None => false,
            }
        };
        if removed {
            producer.unregister_consumer(self, out_port);
            self.modified();
        }
        removed
    }

    /// Drop every connection of input `port`.
    pub fn remove_all_input_connections(self: &Arc<Self>, port: usize) {
        let old = {
            let mut inputs = self.lock_inputs();
            match inputs.get_mut(port) {
                Some(conns) => std::mem::take(conns),
                None => return,
            }
        };
        if old.is_empty() {
            return;
        }
        for c in old {
            c.producer.unregister_consumer(self, c.port);
        }
        self.modified();
    }

    /// Connections on input `port`.
    pub fn number_of_input_connections(&self, port: usize) -> usize {
        self.lock_inputs().get(port).map_or(0, SmallVec::len)
    }

    /// Producer of connection `idx` on input `port`.
    pub fn input_algorithm(&self, port: usize, idx: usize) -> Option<Arc<Node>> {
        self.input_connection(port, idx).map(|c| c.producer)
    }

    /// Connection `idx` on input `port`.
    pub fn input_connection(&self, port: usize, idx: usize) -> Option<Connection> {
        self.lock_inputs().get(port).and_then(|c| c.get(idx)).cloned()
    }

    /// Live consumers of output `port`.
    pub fn consumers(&self, port: usize) -> Vec<Arc<Node>> {
        self.lock_consumers()
            .iter()
            .filter(|(_, p)| *p == port)
            .filter_map(|(w, _)| w.upgrade())
            .collect()
    }

    pub(crate) fn consumer_count(&self, port: usize) -> usize {
        self.lock_consumers()
            .iter()
            .filter(|(w, p)| *p == port && w.strong_count() > 0)
            .count()
    }

    /// Snapshot of all input connections.
    pub(crate) fn connections(&self) -> Vec<Connections> {
        self.lock_inputs().clone()
    }

    /// `true` when `other` is this node or lies upstream of it.
    pub fn depends_on(&self, other: &Node) -> bool {
        if self.id == other.id {
            return true;
        }
        self.connections()
            .iter()
            .flatten()
            .any(|c| c.producer.depends_on(other))
    }

    /// Fingerprint of this node's configuration and everything upstream, if every
    /// algorithm on the way provides one.
    pub fn pipeline_fingerprint(&self) -> Option<Fingerprint> {
        let own = self.lock_algorithm().fingerprint()?;
        let mut h = StableHasher::new();
        h.write_str(&self.name);
        h.write_fingerprint(own);
        for (p, conns) in self.connections().iter().enumerate() {
            h.write_u64(p as u64);
            h.write_u64(conns.len() as u64);
            for c in conns {
                h.write_fingerprint(c.producer.pipeline_fingerprint()?);
                h.write_u64(c.port as u64);
            }
        }
        Some(h.finish())
    }

    /// Bring output 0 up to date for the whole extent.
    pub fn update(self: &Arc<Self>) -> VoxflowResult<Arc<DataObject>> {
        self.update_port(0, &UpdateRequest::default())
    }

    /// Bring output `port` up to date for `request`.
    pub fn update_port(
        self: &Arc<Self>,
        port: usize,
        request: &UpdateRequest,
    ) -> VoxflowResult<Arc<DataObject>> {
        crate::pipeline::executive::update(self, port, request)
    }

    /// Run the information pass only; returns the output information objects.
    pub fn update_information(self: &Arc<Self>) -> VoxflowResult<Vec<Information>> {
        crate::pipeline::executive::information_pass(self)
    }

    /// State of output `port`.
    pub fn port_state(&self, port: usize) -> PortState {
        self.executive.port_state(port)
    }

    pub(crate) fn lock_algorithm(&self) -> MutexGuard<'_, Box<dyn Algorithm>> {
        self.algorithm.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_inputs(&self) -> MutexGuard<'_, Vec<Connections>> {
        self.inputs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_consumers(&self) -> MutexGuard<'_, Vec<(Weak<Node>, usize)>> {
        self.consumers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn register_consumer(&self, consumer: &Arc<Node>, port: usize) {
        let mut g = self.lock_consumers();
        g.retain(|(w, _)| w.strong_count() > 0);
        g.push((Arc::downgrade(consumer), port));
    }

    fn unregister_consumer(&self, consumer: &Arc<Node>, port: usize) {
        let mut g = self.lock_consumers();
        if let Some(i) = g
            .iter()
            .position(|(w, p)| *p == port && w.as_ptr() == Arc::as_ptr(consumer))
        {
            g.remove(i);
        }
    }

    fn check_connection(&self, port: usize, producer: &Arc<Node>, out_port: usize) -> VoxflowResult<()> {
        let spec = self.input_specs.get(port).ok_or_else(|| {
            VoxflowError::bad_input(format!(
                "'{}' has {} input ports, got port {port}",
                self.name,
                self.input_specs.len()
            ))
        })?;
        let out = producer.output_specs.get(out_port).ok_or_else(|| {
            VoxflowError::bad_input(format!(
                "'{}' has {} output ports, got port {out_port}",
                producer.name,
                producer.output_specs.len()
            ))
        })?;
        if !spec.accepts(out.kind) {
            return Err(VoxflowError::port_mismatch(format!(
                "'{}' output {out_port} produces {}, input {port} ('{}') of '{}' accepts {:?}",
                producer.name, out.kind, spec.name, self.name, spec.accepts
            )));
        }
        if producer.depends_on(self) {
            return Err(VoxflowError::cycle(format!(
                "connecting '{}' into '{}' would close a loop",
                producer.name, self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/node.rs"]
mod tests;
