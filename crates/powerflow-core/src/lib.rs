//! # powerflow-core: network model for the power-flow tool server
//!
//! Networks are modeled as **undirected multigraphs**:
//! - **Nodes**: buses, generators, loads, shunts and external grids
//! - **Edges**: branches (lines and transformers), parallel branches allowed
//!
//! Every element carries a typed ID, so a bus number can never be confused with a
//! generator number. Solved networks carry a [`PowerFlowResults`] table with one
//! [`BusResult`] per bus, in the same order as [`Network::buses`].
//!
//! ```
//! use powerflow_core::*;
//!
//! let mut network = Network::named("two-bus");
//! let b1 = network.add_bus(Bus::new(BusId::new(1), "Bus 1", Kilovolts(138.0)));
//! let b2 = network.add_bus(Bus::new(BusId::new(2), "Bus 2", Kilovolts(138.0)));
//! network.graph.add_node(Node::ExtGrid(ExtGrid::new(ExtGridId::new(1), BusId::new(1))));
//! network.graph.add_node(Node::Load(Load::new(
//!     LoadId::new(1),
//!     BusId::new(2),
//!     Megawatts(50.0),
//!     Megavars(10.0),
//! )));
//! network.graph.add_edge(
//!     b1,
//!     b2,
//!     Edge::Branch(Branch::new(BranchId::new(1), BusId::new(1), BusId::new(2), 0.01, 0.1)),
//! );
//!
//! assert_eq!(network.bus_count(), 2);
//! assert_eq!(network.ext_grid_buses(), vec![BusId::new(1)]);
//! ```

use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod solver;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{PowerflowError, PowerflowResult};
pub use graph::{bus_topology, count_islands, hop_distances, BusTopology};
pub use petgraph::graph::NodeIndex;
pub use solver::{FaerSolver, GaussSolver, LinearSolverKind, LinearSystemBackend};
pub use units::{Degrees, Kilovolts, Megavars, MegavoltAmperes, Megawatts, PerUnit, Radians};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub fn new(value: usize) -> Self {
                $name(value)
            }
            #[inline]
            pub fn value(&self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} {}", $label, self.0)
            }
        }
    };
}

id_type!(
    /// External bus number (as written in the case file, usually 1-based)
    BusId,
    "Bus"
);
id_type!(BranchId, "Branch");
id_type!(GenId, "Gen");
id_type!(LoadId, "Load");
id_type!(ShuntId, "Shunt");
id_type!(ExtGridId, "ExtGrid");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    /// Base voltage in kilovolts
    pub base_kv: Kilovolts,
    /// Voltage magnitude in per-unit (initial guess, then solved value)
    pub voltage_pu: PerUnit,
    /// Voltage angle in radians (initial guess, then solved value)
    pub angle_rad: Radians,
    pub vmin_pu: Option<PerUnit>,
    pub vmax_pu: Option<PerUnit>,
    pub area_id: Option<i64>,
    pub zone_id: Option<i64>,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            id: BusId(0),
            name: String::new(),
            base_kv: Kilovolts(0.0),
            voltage_pu: PerUnit(1.0),
            angle_rad: Radians(0.0),
            vmin_pu: None,
            vmax_pu: None,
            area_id: None,
            zone_id: None,
        }
    }
}

impl Bus {
    pub fn new(id: BusId, name: impl Into<String>, base_kv: Kilovolts) -> Self {
        Self {
            id,
            name: name.into(),
            base_kv,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchKind {
    #[default]
    Line,
    Transformer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub from_bus: BusId,
    pub to_bus: BusId,
    /// Series resistance (per-unit)
    pub resistance: f64,
    /// Series reactance (per-unit)
    pub reactance: f64,
    /// Total line charging susceptance (per-unit, split half/half)
    pub charging_b: PerUnit,
    /// Off-nominal tap magnitude on the from side
    pub tap_ratio: f64,
    pub phase_shift: Radians,
    /// Normal rating (Rate A)
    pub rating_a: Option<MegavoltAmperes>,
    pub status: bool,
    pub kind: BranchKind,
}

impl Default for Branch {
    fn default() -> Self {
        Self {
            id: BranchId(0),
            name: String::new(),
            from_bus: BusId(0),
            to_bus: BusId(0),
            resistance: 0.0,
            reactance: 0.0,
            charging_b: PerUnit(0.0),
            tap_ratio: 1.0,
            phase_shift: Radians(0.0),
            rating_a: None,
            status: true,
            kind: BranchKind::Line,
        }
    }
}

impl Branch {
    pub fn new(
        id: BranchId,
        from_bus: BusId,
        to_bus: BusId,
        resistance: f64,
        reactance: f64,
    ) -> Self {
        Self {
            id,
            name: format!("Line {}-{}", from_bus.value(), to_bus.value()),
            from_bus,
            to_bus,
            resistance,
            reactance,
            ..Self::default()
        }
    }

    pub fn with_charging(mut self, b_pu: f64) -> Self {
        self.charging_b = PerUnit(b_pu);
        self
    }

    /// Turn the branch into a transformer with the given off-nominal ratio and shift.
    pub fn with_tap(mut self, ratio: f64, shift: Radians) -> Self {
        self.tap_ratio = ratio;
        self.phase_shift = shift;
        self.kind = BranchKind::Transformer;
        self
    }

    pub fn out_of_service(mut self) -> Self {
        self.status = false;
        self
    }
}

/// Voltage-controlled (PV) generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gen {
    pub id: GenId,
    pub name: String,
    pub bus: BusId,
    /// Scheduled active power output (MW)
    pub active_power: Megawatts,
    /// Reactive power output (Mvar); solved value after a power flow
    pub reactive_power: Megavars,
    #[serde(with = "units::limit_serde::upper")]
    pub pmax: Megawatts,
    #[serde(with = "units::limit_serde::lower")]
    pub qmin: Megavars,
    #[serde(with = "units::limit_serde::upper")]
    pub qmax: Megavars,
    pub voltage_setpoint: PerUnit,
    pub status: bool,
}

impl Default for Gen {
    fn default() -> Self {
        Self {
            id: GenId(0),
            name: String::new(),
            bus: BusId(0),
            active_power: Megawatts(0.0),
            reactive_power: Megavars(0.0),
            pmax: Megawatts(f64::INFINITY),
            qmin: Megavars(f64::NEG_INFINITY),
            qmax: Megavars(f64::INFINITY),
            voltage_setpoint: PerUnit(1.0),
            status: true,
        }
    }
}

impl Gen {
    pub fn new(id: GenId, bus: BusId, active_power: Megawatts, voltage_setpoint: PerUnit) -> Self {
        Self {
            id,
            name: format!("Gen {}", id.value()),
            bus,
            active_power,
            voltage_setpoint,
            ..Self::default()
        }
    }

    /// Set reactive power limits (in Mvar)
    pub fn with_q_limits(mut self, qmin: f64, qmax: f64) -> Self {
        self.qmin = Megavars(qmin);
        self.qmax = Megavars(qmax);
        self
    }
}

/// Constant-power load (positive = consumption)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub id: LoadId,
    pub name: String,
    pub bus: BusId,
    pub active_power: Megawatts,
    pub reactive_power: Megavars,
    pub status: bool,
}

impl Load {
    pub fn new(id: LoadId, bus: BusId, active_power: Megawatts, reactive_power: Megavars) -> Self {
        Self {
            id,
            name: format!("Load {}", id.value()),
            bus,
            active_power,
            reactive_power,
            status: true,
        }
    }
}

/// Shunt element connected to a bus
///
/// Admittance is stored in per-unit on the system base; it enters the Y-bus
/// diagonal as `gs + j*bs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shunt {
    pub id: ShuntId,
    pub name: String,
    pub bus: BusId,
    pub gs_pu: f64,
    /// Positive = capacitor, negative = reactor
    pub bs_pu: f64,
    pub status: bool,
}

/// Infinite source that fixes voltage magnitude and angle at its bus (slack).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtGrid {
    pub id: ExtGridId,
    pub name: String,
    pub bus: BusId,
    pub vm_pu: PerUnit,
    pub va: Radians,
    pub status: bool,
}

impl ExtGrid {
    pub fn new(id: ExtGridId, bus: BusId) -> Self {
        Self {
            id,
            name: format!("External grid {}", id.value()),
            bus,
            vm_pu: PerUnit::ONE,
            va: Radians::ZERO,
            status: true,
        }
    }

    pub fn with_voltage(mut self, vm_pu: PerUnit, va: Radians) -> Self {
        self.vm_pu = vm_pu;
        self.va = va;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Bus(Bus),
    Gen(Gen),
    Load(Load),
    Shunt(Shunt),
    ExtGrid(ExtGrid),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Edge {
    Branch(Branch),
}

/// Solved state of one bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusResult {
    pub bus: BusId,
    pub vm_pu: PerUnit,
    pub va_degree: Degrees,
    /// Net active power at the bus, load convention (positive = consumption)
    pub p_mw: Megawatts,
    /// Net reactive power at the bus, load convention
    pub q_mvar: Megavars,
}

/// Power supplied by an external grid after the solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtGridResult {
    pub ext_grid: ExtGridId,
    pub bus: BusId,
    pub p_mw: Megawatts,
    pub q_mvar: Megavars,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerFlowResults {
    pub converged: bool,
    pub iterations: usize,
    /// Largest absolute power mismatch at the final iterate (per-unit)
    pub max_mismatch: f64,
    /// One entry per bus, in [`Network::buses`] order
    pub bus: Vec<BusResult>,
    #[serde(default)]
    pub ext_grid: Vec<ExtGridResult>,
}

fn default_base_mva() -> f64 {
    100.0
}

/// The power network: an undirected graph of elements plus optional solve results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    #[serde(default = "default_base_mva")]
    pub base_mva: f64,
    pub graph: Graph<Node, Edge, Undirected>,
    #[serde(default)]
    pub results: Option<PowerFlowResults>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

// Buses, generators, loads, shunts and external grids are all nodes so that element
// attachment stays visible in the graph; only buses take part in branch edges.

impl Network {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            base_mva: default_base_mva(),
            graph: Graph::new_undirected(),
            results: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new()
        }
    }

    pub fn add_bus(&mut self, bus: Bus) -> NodeIndex {
        self.graph.add_node(Node::Bus(bus))
    }

    /// Node index of the bus with the given ID
    pub fn bus_index(&self, id: BusId) -> Option<NodeIndex> {
        self.graph.node_indices().find(|&idx| match &self.graph[idx] {
            Node::Bus(bus) => bus.id == id,
            _ => false,
        })
    }

    /// All buses in insertion order
    pub fn buses(&self) -> Vec<&Bus> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Bus(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    pub fn bus_count(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|n| matches!(n, Node::Bus(_)))
            .count()
    }

    pub fn branches(&self) -> Vec<&Branch> {
        self.graph
            .edge_weights()
            .map(|e| match e {
                Edge::Branch(b) => b,
            })
            .collect()
    }

    pub fn generators(&self) -> Vec<&Gen> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Gen(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    pub fn loads(&self) -> Vec<&Load> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Load(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn shunts(&self) -> Vec<&Shunt> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Shunt(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn ext_grids(&self) -> Vec<&ExtGrid> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::ExtGrid(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    /// Buses of in-service external grids, in declaration order
    pub fn ext_grid_buses(&self) -> Vec<BusId> {
        self.ext_grids()
            .into_iter()
            .filter(|e| e.status)
            .map(|e| e.bus)
            .collect()
    }

    /// Total in-service active power load (MW)
    pub fn total_load_mw(&self) -> f64 {
        self.loads()
            .into_iter()
            .filter(|l| l.status)
            .map(|l| l.active_power.value())
            .sum()
    }

    /// Total scheduled in-service PV generation (MW), excluding external grids
    pub fn total_generation_mw(&self) -> f64 {
        self.generators()
            .into_iter()
            .filter(|g| g.status)
            .map(|g| g.active_power.value())
            .sum()
    }

    /// Solved voltage magnitude of a bus, if the network carries results
    pub fn bus_voltage(&self, bus: BusId) -> Option<PerUnit> {
        self.results
            .as_ref()?
            .bus
            .iter()
            .find(|r| r.bus == bus)
            .map(|r| r.vm_pu)
    }

    pub fn is_solved(&self) -> bool {
        self.results.as_ref().is_some_and(|r| r.converged)
    }

    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats::default();

        for node in self.graph.node_weights() {
            match node {
                Node::Bus(_) => stats.num_buses += 1,
                Node::Gen(_) => stats.num_gens += 1,
                Node::Load(l) => {
                    stats.num_loads += 1;
                    if l.status {
                        stats.total_load_mw += l.active_power.value();
                        stats.total_load_mvar += l.reactive_power.value();
                    }
                }
                Node::Shunt(_) => stats.num_shunts += 1,
                Node::ExtGrid(_) => stats.num_ext_grids += 1,
            }
        }

        stats.num_branches = self.graph.edge_count();
        stats
    }

    /// Validate network data for issues that make the power flow unsolvable.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let stats = self.stats();

        if stats.num_buses == 0 {
            diag.add_error("structure", "Network has no buses");
            return;
        }

        if self.ext_grid_buses().is_empty() {
            diag.add_error("structure", "Network has no in-service external grid");
        }

        if stats.num_branches == 0 && stats.num_buses > 1 {
            diag.add_error("structure", "Network has multiple buses but no branches");
        }

        if stats.num_loads == 0 {
            diag.add_warning("structure", "Network has no loads");
        }

        let known: std::collections::HashSet<BusId> =
            self.buses().iter().map(|b| b.id).collect();
        let mut check = |bus: BusId, entity: String| {
            if !known.contains(&bus) {
                diag.add_error_with_entity(
                    "reference",
                    &format!("refers to unknown bus {}", bus.value()),
                    &entity,
                );
            }
        };
        for node in self.graph.node_weights() {
            match node {
                Node::Bus(_) => {}
                Node::Gen(g) => check(g.bus, g.id.to_string()),
                Node::Load(l) => check(l.bus, l.id.to_string()),
                Node::Shunt(s) => check(s.bus, s.id.to_string()),
                Node::ExtGrid(e) => check(e.bus, e.id.to_string()),
            }
        }

        for branch in self.branches() {
            if branch.status && branch.resistance == 0.0 && branch.reactance == 0.0 {
                diag.add_error_with_entity(
                    "impedance",
                    "in-service branch has zero impedance",
                    &branch.id.to_string(),
                );
            }
        }
    }
}

/// Statistics about a network's size and load
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_gens: usize,
    pub num_loads: usize,
    pub num_shunts: usize,
    pub num_ext_grids: usize,
    pub num_branches: usize,
    pub total_load_mw: f64,
    pub total_load_mvar: f64,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} buses, {} branches, {} gens, {} ext grids, {} loads ({:.0} MW)",
            self.num_buses,
            self.num_branches,
            self.num_gens,
            self.num_ext_grids,
            self.num_loads,
            self.total_load_mw
        )
    }
}

impl Node {
    pub fn label(&self) -> &str {
        match self {
            Node::Bus(bus) => &bus.name,
            Node::Gen(gen) => &gen.name,
            Node::Load(load) => &load.name,
            Node::Shunt(shunt) => &shunt.name,
            Node::ExtGrid(grid) => &grid.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bus() -> Network {
        let mut network = Network::named("two-bus");
        let b1 = network.add_bus(Bus::new(BusId::new(1), "Bus 1", Kilovolts(138.0)));
        let b2 = network.add_bus(Bus::new(BusId::new(2), "Bus 2", Kilovolts(138.0)));
        network
            .graph
            .add_node(Node::ExtGrid(ExtGrid::new(ExtGridId::new(1), BusId::new(1))));
        network.graph.add_node(Node::Load(Load::new(
            LoadId::new(1),
            BusId::new(2),
            Megawatts(50.0),
            Megavars(10.0),
        )));
        network.graph.add_edge(
            b1,
            b2,
            Edge::Branch(Branch::new(
                BranchId::new(1),
                BusId::new(1),
                BusId::new(2),
                0.01,
                0.1,
            )),
        );
        network
    }

    #[test]
    fn test_network_creation() {
        let network = two_bus();
        assert_eq!(network.graph.node_count(), 4);
        assert_eq!(network.graph.edge_count(), 1);
        assert_eq!(network.bus_count(), 2);
        assert_eq!(network.buses()[0].name, "Bus 1");
        assert_eq!(network.branches()[0].name, "Line 1-2");
    }

    #[test]
    fn test_bus_index_lookup() {
        let network = two_bus();
        let idx = network.bus_index(BusId::new(2)).unwrap();
        assert_eq!(network.graph[idx].label(), "Bus 2");
        assert!(network.bus_index(BusId::new(99)).is_none());
    }

    #[test]
    fn test_network_validation_empty() {
        let network = Network::new();
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(diag.has_errors());
        assert!(diag.errors().any(|i| i.message.contains("no buses")));
    }

    #[test]
    fn test_network_validation_missing_ext_grid() {
        let mut network = Network::new();
        network.add_bus(Bus::new(BusId::new(1), "Bus 1", Kilovolts(138.0)));

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(diag.errors().any(|i| i.message.contains("external grid")));
        assert!(diag.warnings().any(|i| i.message.contains("no loads")));
    }

    #[test]
    fn test_network_validation_dangling_reference() {
        let mut network = two_bus();
        network.graph.add_node(Node::Load(Load::new(
            LoadId::new(7),
            BusId::new(42),
            Megawatts(1.0),
            Megavars(0.0),
        )));

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.error_summary().contains("Load 7"));
    }

    #[test]
    fn test_network_stats() {
        let network = two_bus();
        let stats = network.stats();
        assert_eq!(stats.num_buses, 2);
        assert_eq!(stats.num_ext_grids, 1);
        assert_eq!(stats.num_loads, 1);
        assert_eq!(stats.num_branches, 1);
        assert!((stats.total_load_mw - 50.0).abs() < 1e-9);

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(!diag.has_errors());
    }

    #[test]
    fn test_out_of_service_load_excluded_from_total() {
        let mut network = two_bus();
        let mut load = Load::new(LoadId::new(2), BusId::new(2), Megawatts(30.0), Megavars(0.0));
        load.status = false;
        network.graph.add_node(Node::Load(load));
        assert!((network.total_load_mw() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_bus_voltage_from_results() {
        let mut network = two_bus();
        assert_eq!(network.bus_voltage(BusId::new(2)), None);
        assert!(!network.is_solved());

        network.results = Some(PowerFlowResults {
            converged: true,
            iterations: 3,
            max_mismatch: 1e-10,
            bus: vec![
                BusResult {
                    bus: BusId::new(1),
                    vm_pu: PerUnit(1.0),
                    va_degree: Degrees(0.0),
                    p_mw: Megawatts(-50.2),
                    q_mvar: Megavars(-11.0),
                },
                BusResult {
                    bus: BusId::new(2),
                    vm_pu: PerUnit(0.97),
                    va_degree: Degrees(-2.8),
                    p_mw: Megawatts(50.0),
                    q_mvar: Megavars(10.0),
                },
            ],
            ext_grid: Vec::new(),
        });

        assert_eq!(network.bus_voltage(BusId::new(2)), Some(PerUnit(0.97)));
        assert!(network.is_solved());
    }

    #[test]
    fn test_network_json_round_trip_keeps_topology_and_results() {
        let mut network = two_bus();
        network.results = Some(PowerFlowResults {
            converged: true,
            ..PowerFlowResults::default()
        });

        let json = serde_json::to_string(&network).unwrap();
        let back: Network = serde_json::from_str(&json).unwrap();

        assert_eq!(back.name, "two-bus");
        assert_eq!(back.bus_count(), 2);
        assert_eq!(back.graph.edge_count(), 1);
        assert_eq!(back.ext_grid_buses(), vec![BusId::new(1)]);
        assert!(back.is_solved());
    }

    #[test]
    fn test_transformer_builder() {
        let branch = Branch::new(BranchId::new(3), BusId::new(4), BusId::new(7), 0.0, 0.2)
            .with_tap(0.978, Radians::ZERO);
        assert_eq!(branch.kind, BranchKind::Transformer);
        assert!((branch.tap_ratio - 0.978).abs() < 1e-12);
        assert!(branch.status);
        assert!(!branch.out_of_service().status);
    }

    #[test]
    fn test_unlimited_generator_survives_json() {
        let gen = Gen::new(GenId::new(1), BusId::new(2), Megawatts(10.0), PerUnit(1.02));
        let json = serde_json::to_string(&gen).unwrap();
        let back: Gen = serde_json::from_str(&json).unwrap();
        assert_eq!(back.qmin.value(), f64::NEG_INFINITY);
        assert_eq!(back.qmax.value(), f64::INFINITY);
        assert_eq!(back.pmax.value(), f64::INFINITY);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(BusId::new(14).to_string(), "Bus 14");
        assert_eq!(ExtGridId::new(1).to_string(), "ExtGrid 1");
    }
}
