pub(crate) mod filter_graph;
pub(crate) mod negotiate;
pub(crate) mod node;
pub(crate) mod nodes;
pub(crate) mod topology;
