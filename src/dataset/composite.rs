use std::sync::Arc;

use crate::dataset::object::DataObject;
use crate::foundation::core::TimeStamp;
use crate::pipeline::Information;

/// One child of a composite dataset.
#[derive(Clone, Debug)]
pub enum BlockNode {
    /// A dataset (or an empty slot).
    Leaf(Option<Arc<DataObject>>),
    /// A nested composite.
    Tree(CompositeDataSet),
}

/// A child together with its metadata.
#[derive(Clone, Debug)]
pub struct Block {
    /// Per-block metadata (name, time, …).
    pub meta: Information,
    /// Payload.
    pub node: BlockNode,
}

/// A visited leaf: depth-first leaf index, metadata and payload.
#[derive(Clone, Copy, Debug)]
pub struct LeafRef<'a> {
    /// Position among all leaves in depth-first order (empty slots included).
    pub index: usize,
    /// Metadata of the leaf's block.
    pub meta: &'a Information,
    /// Payload.
    pub data: Option<&'a Arc<DataObject>>,
}

/// Ordered tree of datasets with per-block metadata.
#[derive(Clone, Debug, Default)]
pub struct CompositeDataSet {
    blocks: Vec<Block>,
    mtime: TimeStamp,
}

impl CompositeDataSet {
    /// No blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a leaf; returns its block index.
    pub fn push_leaf(&mut self, data: Option<Arc<DataObject>>, meta: Information) -> usize {
        self.blocks.push(Block {
            meta,
            node: BlockNode::Leaf(data),
        });
        self.mtime.modified();
        self.blocks.len() - 1
    }

    /// Append a nested composite; returns its block index.
    pub fn push_tree(&mut self, tree: CompositeDataSet, meta: Information) -> usize {
        self.blocks.push(Block {
            meta,
            node: BlockNode::Tree(tree),
        });
        self.mtime.modified();
        self.blocks.len() - 1
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// `true` without children.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Direct child `i`.
    pub fn block(&self, i: usize) -> Option<&Block> {
        self.blocks.get(i)
    }

    /// Leaves in depth-first order.
    pub fn leaves(&self) -> Vec<LeafRef<'_>> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<LeafRef<'a>>) {
        for b in &self.blocks {
            match &b.node {
                BlockNode::Leaf(data) => out.push(LeafRef {
                    index: out.len(),
                    meta: &b.meta,
                    data: data.as_ref(),
                }),
                BlockNode::Tree(t) => t.collect_leaves(out),
            }
        }
    }

    /// Same tree shape and metadata with every leaf replaced by `f(leaf)`.
    pub fn map_leaves<E>(
        &self,
        f: &mut impl FnMut(LeafRef<'_>) -> Result<Option<Arc<DataObject>>, E>,
    ) -> Result<Self, E> {
        let mut next = 0;
        self.map_inner(&mut next, f)
    }

    fn map_inner<E>(
        &self,
        next: &mut usize,
        f: &mut impl FnMut(LeafRef<'_>) -> Result<Option<Arc<DataObject>>, E>,
    ) -> Result<Self, E> {
        let mut out = Self::new();
        for b in &self.blocks {
            let node = match &b.node {
                BlockNode::Leaf(data) => {
                    let leaf = LeafRef {
                        index: *next,
                        meta: &b.meta,
                        data: data.as_ref(),
                    };
                    *next += 1;
                    BlockNode::Leaf(f(leaf)?)
                }
                BlockNode::Tree(t) => BlockNode::Tree(t.map_inner(next, f)?),
            };
            out.blocks.push(Block {
                meta: b.meta.clone(),
                node,
            });
        }
        Ok(out)
    }

    /// Same shape and metadata with empty leaves.
    pub fn clone_empty(&self) -> Self {
        let r: Result<Self, std::convert::Infallible> = self.map_leaves(&mut |_| Ok(None));
        match r {
            Ok(s) => s,
            Err(e) => match e {},
        }
    }

    /// Sum over present leaves.
    pub fn number_of_points(&self) -> usize {
        self.leaves()
            .iter()
            .filter_map(|l| l.data)
            .map(|d| d.number_of_points())
            .sum()
    }

    /// Sum over present leaves.
    pub fn number_of_cells(&self) -> usize {
        self.leaves()
            .iter()
            .filter_map(|l| l.data)
            .map(|d| d.number_of_cells())
            .sum()
    }

    /// Latest stamp of the tree and its leaves.
    pub fn mtime(&self) -> u64 {
        self.leaves()
            .iter()
            .filter_map(|l| l.data)
            .map(|d| d.mtime())
            .fold(self.mtime.get(), u64::max)
    }
}
