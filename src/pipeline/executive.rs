//! Demand-driven executive: information, update-extent and data passes.
//!
//! `update` walks the graph depth first. Every node first publishes information (cached
//! against the pipeline stamp), then the requested output is looked up in the per-port
//! cache keyed by `(update extent, piece, ghost levels, time, upstream stamp)`. On a miss
//! the node declares its input requests, pulls its inputs and runs `request_data`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::dataset::DataObject;
use crate::foundation::abort::AbortFlag;
use crate::foundation::config::RuntimeConfig;
use crate::foundation::core::Extent;
use crate::foundation::diagnostics::{self, Severity};
use crate::foundation::error::{VoxflowError, VoxflowResult};
use crate::pipeline::disk_cache::DiskCache;
use crate::pipeline::fingerprint::{Fingerprint, StableHasher};
use crate::pipeline::information::Information;
use crate::pipeline::keys::{
    DATA_OBJECT, DATA_TYPE_NAME, REQUEST_KEYS, UPDATE_EXTENT, UPDATE_NUMBER_OF_GHOST_LEVELS,
    UPDATE_NUMBER_OF_PIECES, UPDATE_PIECE_NUMBER, UPDATE_TIME_STEP, WHOLE_EXTENT,
};
use crate::pipeline::node::Node;
use crate::pipeline::streaming::{ExtentTranslator, StreamedPiece};

/// Options for one node's executive.
#[derive(Clone, Debug)]
pub struct ExecutiveOpts {
    /// Directory of the persistent image cache (`VTK_CACHE_PATH`).
    pub cache_path: Option<PathBuf>,
    /// Abort flag polled before every `request_data`.
    pub abort: AbortFlag,
    /// Cached requests kept per output port.
    pub max_cached_requests: usize,
}

impl Default for ExecutiveOpts {
    fn default() -> Self {
        let cache_path = match RuntimeConfig::from_env() {
            Ok(cfg) => cfg.cache_path,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring invalid runtime configuration");
                None
            }
        };
        Self {
            cache_path,
            abort: AbortFlag::global().clone(),
            max_cached_requests: 16,
        }
    }
}

impl ExecutiveOpts {
    /// Defaults without the persistent cache, independent of the environment.
    pub fn in_memory() -> Self {
        Self {
            cache_path: None,
            abort: AbortFlag::global().clone(),
            max_cached_requests: 16,
        }
    }
}

/// A downstream request for one output port.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateRequest {
    /// Requested extent; `None` selects the whole extent (split by piece).
    pub extent: Option<Extent>,
    /// Piece number (0-based).
    pub piece: usize,
    /// Number of pieces; `0` and `1` both mean "no split".
    pub pieces: usize,
    /// Ghost layers around the piece.
    pub ghost_levels: usize,
    /// Requested time value.
    pub time: Option<f64>,
}

impl UpdateRequest {
    /// Request the whole extent.
    pub fn whole() -> Self {
        Self::default()
    }

    /// Request a specific extent.
    pub fn extent(extent: Extent) -> Self {
        Self {
            extent: Some(extent),
            ..Self::default()
        }
    }

    /// Builder: piece `piece` of `pieces`.
    pub fn with_piece(mut self, piece: usize, pieces: usize) -> Self {
        self.piece = piece;
        self.pieces = pieces;
        self
    }

    /// Builder: ghost layers.
    pub fn with_ghost_levels(mut self, n: usize) -> Self {
        self.ghost_levels = n;
        self
    }

    /// Builder: time value.
    pub fn at_time(mut self, t: f64) -> Self {
        self.time = Some(t);
        self
    }

    /// Reconstruct a request from the `UPDATE_*` keys of an input information object.
    pub fn from_info(info: &Information) -> Self {
        let as_usize = |v: Option<i64>| v.and_then(|v| usize::try_from(v).ok()).unwrap_or(0);
        Self {
            extent: info.get(&UPDATE_EXTENT),
            piece: as_usize(info.get(&UPDATE_PIECE_NUMBER)),
            pieces: as_usize(info.get(&UPDATE_NUMBER_OF_PIECES)),
            ghost_levels: as_usize(info.get(&UPDATE_NUMBER_OF_GHOST_LEVELS)),
            time: info.get(&UPDATE_TIME_STEP),
        }
    }
}

/// Lifecycle of an output port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortState {
    /// No consumer and never requested.
    Unconnected,
    /// Has a consumer, nothing requested yet.
    Connected,
    /// Information pass done.
    Informed,
    /// Update-extent pass done.
    Scheduled,
    /// Data produced and current.
    Executed,
    /// Data produced, but something upstream changed since.
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Informed,
    Scheduled,
    Executed,
}

/// Cache key of one produced output.
#[derive(Clone, Debug, PartialEq)]
struct CacheKey {
    extent: Option<Extent>,
    piece: i64,
    pieces: i64,
    ghost_levels: i64,
    time_bits: Option<u64>,
    upstream: u64,
}

impl CacheKey {
    fn new(request: &Information, upstream: u64) -> Self {
        Self {
            extent: request.get(&UPDATE_EXTENT),
            piece: request.get(&UPDATE_PIECE_NUMBER).unwrap_or(0),
            pieces: request.get(&UPDATE_NUMBER_OF_PIECES).unwrap_or(1),
            ghost_levels: request.get(&UPDATE_NUMBER_OF_GHOST_LEVELS).unwrap_or(0),
            time_bits: request.get(&UPDATE_TIME_STEP).map(f64::to_bits),
            upstream,
        }
    }

    /// Part of the key that identifies the request independent of in-process stamps.
    fn write_request(&self, h: &mut StableHasher) {
        match self.extent {
            Some(e) => {
                h.write_u8(1);
                for v in e.0 {
                    h.write_i64(i64::from(v));
                }
            }
            None => h.write_u8(0),
        }
        h.write_i64(self.piece);
        h.write_i64(self.pieces);
        h.write_i64(self.ghost_levels);
        match self.time_bits {
            Some(t) => {
                h.write_u8(1);
                h.write_u64(t);
            }
            None => h.write_u8(0),
        }
    }
}

struct CacheEntry {
    key: CacheKey,
    data: Arc<DataObject>,
}

struct ExecState {
    info_stamp: u64,
    output_info: Vec<Information>,
    phase: Vec<Phase>,
    executed_at: Vec<u64>,
    caches: Vec<Vec<CacheEntry>>,
    request_information_count: usize,
    request_data_count: usize,
}

/// Per-node executive: request bookkeeping and output caches.
pub struct Executive {
    opts: ExecutiveOpts,
    node: Weak<Node>,
    disk: Option<DiskCache>,
    state: Mutex<ExecState>,
}

impl std::fmt::Debug for Executive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executive")
            .field("opts", &self.opts)
            .field("request_data_count", &self.request_data_count())
            .finish()
    }
}

impl Executive {
    pub(crate) fn new(opts: ExecutiveOpts, node: Weak<Node>, outputs: usize) -> Self {
        let disk = opts.cache_path.as_ref().and_then(|p| match DiskCache::open(p) {
            Ok(d) => Some(d),
            Err(e) => {
                diagnostics::emit(
                    Severity::Warning,
                    "executive",
                    format!("persistent cache disabled: {e}"),
                );
                None
            }
        });
        Self {
            opts,
            node,
            disk,
            state: Mutex::new(ExecState {
                info_stamp: 0,
                output_info: vec![Information::new(); outputs],
                phase: vec![Phase::Idle; outputs],
                executed_at: vec![0; outputs],
                caches: (0..outputs).map(|_| Vec::new()).collect(),
                request_information_count: 0,
                request_data_count: 0,
            }),
        }
    }

    /// Options in effect.
    pub fn opts(&self) -> &ExecutiveOpts {
        &self.opts
    }

    fn lock(&self) -> MutexGuard<'_, ExecState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Lifecycle state of output `port`.
    pub fn port_state(&self, port: usize) -> PortState {
        let Some(node) = self.node.upgrade() else {
            return PortState::Unconnected;
        };
        let (phase, executed_at) = {
            let st = self.lock();
            match (st.phase.get(port), st.executed_at.get(port)) {
                (Some(&p), Some(&e)) => (p, e),
                _ => return PortState::Unconnected,
            }
        };
        match phase {
            Phase::Idle if node.consumer_count(port) > 0 => PortState::Connected,
            Phase::Idle => PortState::Unconnected,
            Phase::Informed => PortState::Informed,
            Phase::Scheduled => PortState::Scheduled,
            Phase::Executed if node.pipeline_mtime() > executed_at => PortState::Stale,
            Phase::Executed => PortState::Executed,
        }
    }

    /// How many times `request_data` ran.
    pub fn request_data_count(&self) -> usize {
        self.lock().request_data_count
    }

    /// How many times `request_information` ran.
    pub fn request_information_count(&self) -> usize {
        self.lock().request_information_count
    }

    /// Cached outputs held for `port`.
    pub fn cache_len(&self, port: usize) -> usize {
        self.lock().caches.get(port).map_or(0, Vec::len)
    }

    /// Drop every cached output (information stays).
    pub fn clear_cache(&self) {
        for c in &mut self.lock().caches {
            c.clear();
        }
    }

    /// Output information published by the last information pass.
    pub fn output_information(&self, port: usize) -> Option<Information> {
        self.lock().output_info.get(port).cloned()
    }

    /// Run the per-piece protocol on `node:port`. See [`crate::pipeline::streaming`].
    pub fn update_pieces(
        node: &Arc<Node>,
        port: usize,
        pieces: usize,
        ghost_levels: usize,
    ) -> VoxflowResult<Vec<StreamedPiece>> {
        crate::pipeline::streaming::update_pieces(node, port, pieces, ghost_levels)
    }

    fn lookup(&self, port: usize, key: &CacheKey) -> Option<Arc<DataObject>> {
        let mut st = self.lock();
        let hit = st.caches[port]
            .iter()
            .find(|e| &e.key == key)
            .map(|e| Arc::clone(&e.data))?;
        st.phase[port] = Phase::Executed;
        st.executed_at[port] = key.upstream;
        Some(hit)
    }

    fn store(&self, port: usize, key: &CacheKey, data: Arc<DataObject>) {
        let cap = self.opts.max_cached_requests.max(1);
        let mut st = self.lock();
        let cache = &mut st.caches[port];
        cache.retain(|e| e.key.upstream == key.upstream && &e.key != key);
        if cache.len() >= cap {
            cache.remove(0);
        }
        cache.push(CacheEntry {
            key: key.clone(),
            data,
        });
        st.phase[port] = Phase::Executed;
        st.executed_at[port] = key.upstream;
    }

    fn set_phase(&self, port: usize, phase: Phase) {
        if let Some(p) = self.lock().phase.get_mut(port) {
            *p = phase;
        }
    }
}

fn wrap_failure(node: &Node, port: usize) -> impl Fn(VoxflowError) -> VoxflowError + '_ {
    move |e| match e {
        VoxflowError::Aborted => e,
        other => other.producer_failed(node.name(), port),
    }
}

/// Information pass for `node` and everything upstream. Cached against the pipeline stamp.
pub(crate) fn information_pass(node: &Arc<Node>) -> VoxflowResult<Vec<Information>> {
    let stamp = node.pipeline_mtime();
    {
        let st = node.executive().lock();
        if st.info_stamp == stamp {
            return Ok(st.output_info.clone());
        }
    }

    for conn in node.connections().iter().flatten() {
        information_pass(&conn.producer)?;
    }
    let inputs = gather_inputs(node)?;

    let mut outputs: Vec<Information> = node
        .output_specs()
        .iter()
        .map(|spec| {
            let mut info = Information::new();
            info.set(&DATA_TYPE_NAME, spec.kind.as_str().to_owned());
            info
        })
        .collect();

    node.lock_algorithm()
        .request_information(&inputs, &mut outputs)
        .map_err(wrap_failure(node, 0))?;
    tracing::trace!(algorithm = node.name(), "request_information");

    let mut st = node.executive().lock();
    st.info_stamp = stamp;
    st.output_info = outputs.clone();
    st.request_information_count += 1;
    for p in &mut st.phase {
        if *p == Phase::Idle {
            *p = Phase::Informed;
        }
    }
    Ok(outputs)
}

/// Input information objects: each producer's published output information.
fn gather_inputs(node: &Arc<Node>) -> VoxflowResult<Vec<Vec<Information>>> {
    let conns = node.connections();
    let mut inputs = Vec::with_capacity(conns.len());
    for (p, (spec, port_conns)) in node.input_specs().iter().zip(&conns).enumerate() {
        if port_conns.is_empty() && !spec.optional {
            return Err(VoxflowError::bad_input(format!(
                "input port {p} ('{}') of '{}' requires a connection",
                spec.name,
                node.name()
            )));
        }
        inputs.push(
            port_conns
                .iter()
                .map(|c| {
                    c.producer
                        .executive()
                        .output_information(c.port)
                        .unwrap_or_default()
                })
                .collect(),
        );
    }
    Ok(inputs)
}

/// Stamp the request onto an output information object.
fn apply_request(info: &mut Information, req: &UpdateRequest) -> VoxflowResult<()> {
    let pieces = req.pieces.max(1);
    if req.piece >= pieces {
        return Err(VoxflowError::bad_input(format!(
            "piece {} out of range for {pieces} pieces",
            req.piece
        )));
    }
    info.set(&UPDATE_PIECE_NUMBER, req.piece as i64);
    info.set(&UPDATE_NUMBER_OF_PIECES, pieces as i64);
    info.set(&UPDATE_NUMBER_OF_GHOST_LEVELS, req.ghost_levels as i64);
    match req.time {
        Some(t) => info.set(&UPDATE_TIME_STEP, t),
        None => info.remove(&UPDATE_TIME_STEP),
    }

    // An explicit extent was already translated from the piece request downstream.
    let ue = match (req.extent, info.get(&WHOLE_EXTENT)) {
        (Some(e), Some(w)) if !w.contains(e) => {
            return Err(VoxflowError::bad_input(format!(
                "requested extent {e} exceeds whole extent {w}"
            )));
        }
        (Some(e), _) => e,
        (None, Some(w)) => {
            let ghost = i32::try_from(req.ghost_levels).unwrap_or(i32::MAX);
            ExtentTranslator::piece_extent(w, req.piece, pieces, ghost)
        }
        (None, None) => {
            info.remove(&UPDATE_EXTENT);
            return Ok(());
        }
    };
    info.set(&UPDATE_EXTENT, ue);
    Ok(())
}

fn disk_key(node: &Node, port: usize, key: &CacheKey) -> Option<Fingerprint> {
    let base = node.pipeline_fingerprint()?;
    let mut h = StableHasher::new();
    h.write_fingerprint(base);
    h.write_u64(port as u64);
    key.write_request(&mut h);
    Some(h.finish())
}

/// Bring `node:port` up to date for `req` and return the produced data.
#[tracing::instrument(level = "debug", skip_all, fields(algorithm = %node.name(), port = port))]
pub(crate) fn update(
    node: &Arc<Node>,
    port: usize,
    req: &UpdateRequest,
) -> VoxflowResult<Arc<DataObject>> {
    let n_out = node.output_specs().len();
    if port >= n_out {
        return Err(VoxflowError::bad_input(format!(
            "'{}' has {n_out} output ports, got port {port}",
            node.name()
        )));
    }
    let exec = node.executive();

    let mut outputs = information_pass(node)?;
    let upstream = node.pipeline_mtime();

    let mut request = outputs[port].clone();
    apply_request(&mut request, req)?;
    let key = CacheKey::new(&request, upstream);

    if let Some(hit) = exec.lookup(port, &key) {
        tracing::debug!("cache hit");
        return Ok(hit);
    }

    let persist = exec
        .disk
        .as_ref()
        .and_then(|d| disk_key(node, port, &key).map(|k| (d, k)));
    if let Some((disk, fp)) = &persist
        && let Some(img) = disk.load(*fp)
    {
        tracing::debug!(key = %fp.to_hex(), "persistent cache hit");
        let data = Arc::new(DataObject::Image(img));
        exec.store(port, &key, Arc::clone(&data));
        return Ok(data);
    }

    for out in outputs.iter_mut() {
        for k in REQUEST_KEYS {
            match request.get_raw(k) {
                Some(v) => out.set_raw(k, v.clone()),
                None => out.remove_raw(k),
            }
        }
    }

    let mut inputs = gather_inputs(node)?;
    node.lock_algorithm()
        .request_update_extent(&mut inputs, &outputs)
        .map_err(wrap_failure(node, port))?;
    exec.set_phase(port, Phase::Scheduled);

    let conns = node.connections();
    for (p, infos) in inputs.iter_mut().enumerate() {
        for (c, info) in infos.iter_mut().enumerate() {
            let Some(conn) = conns.get(p).and_then(|cs| cs.get(c)) else {
                continue;
            };
            let data = update(&conn.producer, conn.port, &UpdateRequest::from_info(info))?;
            info.set(&DATA_OBJECT, data);
        }
    }

    exec.opts.abort.check()?;
    node.lock_algorithm()
        .request_data(&inputs, &mut outputs)
        .map_err(wrap_failure(node, port))?;

    let mut produced = Vec::with_capacity(n_out);
    for (p, (info, spec)) in outputs.iter().zip(node.output_specs()).enumerate() {
        let data = info.get(&DATA_OBJECT).ok_or_else(|| {
            VoxflowError::bad_input(format!("no data object produced on output {p}"))
                .producer_failed(node.name(), p)
        })?;
        if data.kind() != spec.kind {
            return Err(VoxflowError::bad_input(format!(
                "output {p} declared {}, produced {}",
                spec.kind,
                data.kind()
            ))
            .producer_failed(node.name(), p));
        }
        produced.push(data);
    }

    {
        let mut st = exec.lock();
        st.request_data_count += 1;
    }
    for (p, data) in produced.iter().enumerate() {
        exec.store(p, &key, Arc::clone(data));
    }
    tracing::debug!(extent = ?key.extent, "request_data");

    let out = Arc::clone(&produced[port]);
    if let (Some((disk, fp)), DataObject::Image(img)) = (&persist, out.as_ref())
        && let Err(e) = disk.store(*fp, img)
    {
        diagnostics::emit(
            Severity::Warning,
            node.name(),
            format!("failed to persist output: {e}"),
        );
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/executive.rs"]
mod tests;
