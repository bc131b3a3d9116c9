//! The score graph (spec §3.1): a directed multigraph, arena-allocated
//! with stable indices per spec §9 ("implementations should represent
//! nodes as arena-allocated values identified by stable indices;
//! cross-references use indices, never owning pointers").

pub mod builder;
pub mod edge;
pub mod iter;
pub mod label;
pub mod node;
pub mod validate;

pub use edge::{Edge, EdgeIndex, EdgeKind, SpanKind};
pub use label::{AttributeValue, ConceptValue, Label};
pub use node::{FloatKind, Node, NodeIndex, NodeKind, TokenKind};

/// The score graph itself: arenas of nodes and edges, plus an
/// adjacency index built as edges are added.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeIndex>>,
    incoming: Vec<Vec<EdgeIndex>>,
    root: Option<NodeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    pub fn add_node(&mut self, kind: NodeKind) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        idx
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) -> EdgeIndex {
        let idx = EdgeIndex(self.edges.len() as u32);
        self.edges.push(Edge { from, to, kind, label: Label::new() });
        self.outgoing[from.index()].push(idx);
        self.incoming[to.index()].push(idx);
        idx
    }

    /// Removes an edge by index. `O(degree)`: callers (e.g.
    /// [`crate::autocorrect`]) don't run this in hot loops.
    pub fn remove_edge(&mut self, edge: EdgeIndex) {
        let e = self.edges[edge.index()].clone();
        self.outgoing[e.from.index()].retain(|&ix| ix != edge);
        self.incoming[e.to.index()].retain(|&ix| ix != edge);
    }

    pub fn set_root(&mut self, root: NodeIndex) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx.index()]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.nodes[idx.index()]
    }

    pub fn edge(&self, idx: EdgeIndex) -> &Edge {
        &self.edges[idx.index()]
    }

    pub fn edge_mut(&mut self, idx: EdgeIndex) -> &mut Edge {
        &mut self.edges[idx.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.nodes.len() as u32).map(NodeIndex)
    }

    pub fn outgoing(&self, node: NodeIndex) -> &[EdgeIndex] {
        &self.outgoing[node.index()]
    }

    pub fn incoming(&self, node: NodeIndex) -> &[EdgeIndex] {
        &self.incoming[node.index()]
    }

    /// The single outgoing edge of `kind` from `node`, if any. Several
    /// edge kinds are functional (a chord has at most one `Voice`
    /// successor, an island at most one `Partwise` successor).
    pub fn outgoing_of_kind(&self, node: NodeIndex, pred: impl Fn(&EdgeKind) -> bool) -> Option<&Edge> {
        self.outgoing(node).iter().map(|&ix| self.edge(ix)).find(|e| pred(&e.kind))
    }

    pub fn outgoing_all_of_kind<'g>(
        &'g self,
        node: NodeIndex,
        pred: impl Fn(&EdgeKind) -> bool + 'g,
    ) -> impl Iterator<Item = &'g Edge> + 'g {
        self.outgoing(node).iter().map(move |&ix| self.edge(ix)).filter(move |e| pred(&e.kind))
    }

    pub fn incoming_of_kind(&self, node: NodeIndex, pred: impl Fn(&EdgeKind) -> bool) -> Option<&Edge> {
        self.incoming(node).iter().map(|&ix| self.edge(ix)).find(|e| pred(&e.kind))
    }
}
