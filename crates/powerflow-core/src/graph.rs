//! Bus-level topology queries.
//!
//! The network graph mixes buses with attached elements, so topological questions
//! (distance from the slack, islanding) are answered on a derived graph holding only
//! buses and in-service branches.

use std::collections::HashMap;

use petgraph::algo::{connected_components, dijkstra};
use petgraph::graph::{NodeIndex, UnGraph};

use crate::{BranchId, BusId, Edge, Network, Node, PowerflowError, PowerflowResult};

/// Buses as nodes, in-service branches as edges.
#[derive(Debug)]
pub struct BusTopology {
    pub graph: UnGraph<BusId, BranchId>,
    index: HashMap<BusId, NodeIndex>,
}

impl BusTopology {
    pub fn node(&self, bus: BusId) -> Option<NodeIndex> {
        self.index.get(&bus).copied()
    }
}

/// Derive the bus topology, skipping out-of-service branches.
pub fn bus_topology(network: &Network) -> BusTopology {
    let mut graph = UnGraph::new_undirected();
    let mut index = HashMap::new();

    for node in network.graph.node_weights() {
        if let Node::Bus(bus) = node {
            index.insert(bus.id, graph.add_node(bus.id));
        }
    }

    for edge in network.graph.edge_weights() {
        let Edge::Branch(branch) = edge;
        if !branch.status {
            continue;
        }
        if let (Some(&from), Some(&to)) = (index.get(&branch.from_bus), index.get(&branch.to_bus))
        {
            graph.add_edge(from, to, branch.id);
        }
    }

    BusTopology { graph, index }
}

/// Number of branch hops from `source` to every reachable bus.
///
/// Unreachable buses are absent from the returned map.
pub fn hop_distances(network: &Network, source: BusId) -> PowerflowResult<HashMap<BusId, usize>> {
    let topology = bus_topology(network);
    let start = topology
        .node(source)
        .ok_or_else(|| PowerflowError::Network(format!("{source} does not exist")))?;

    let costs = dijkstra(&topology.graph, start, None, |_| 1usize);
    Ok(costs
        .into_iter()
        .map(|(node, hops)| (topology.graph[node], hops))
        .collect())
}

/// Number of electrically separate islands.
pub fn count_islands(network: &Network) -> usize {
    connected_components(&bus_topology(network).graph)
}
