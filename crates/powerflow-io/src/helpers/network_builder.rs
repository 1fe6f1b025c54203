//! Incremental construction of a [`Network`] from imported rows.
//!
//! The builder owns the external-bus-number to node-index map, hands out sequential
//! element IDs and refuses elements that reference a bus it has not seen.
//!
//! ```
//! use powerflow_core::{Branch, BranchId, Bus, BusId, Kilovolts, Megavars, Megawatts, PerUnit, Radians};
//! use powerflow_io::helpers::NetworkBuilder;
//!
//! let mut builder = NetworkBuilder::new("demo", 100.0);
//! builder.add_bus(Bus::new(BusId::new(1), "Bus 1", Kilovolts(11.0))).unwrap();
//! builder.add_bus(Bus::new(BusId::new(2), "Bus 2", Kilovolts(11.0))).unwrap();
//! builder.add_ext_grid(BusId::new(1), PerUnit(1.0), Radians(0.0)).unwrap();
//! builder.add_load(BusId::new(2), Megawatts(5.0), Megavars(1.0)).unwrap();
//! builder
//!     .add_branch(Branch::new(BranchId::new(0), BusId::new(1), BusId::new(2), 0.01, 0.05))
//!     .unwrap();
//! let network = builder.build();
//! assert_eq!(network.bus_count(), 2);
//! ```

use std::collections::HashMap;

use powerflow_core::{
    Branch, BranchId, Bus, BusId, Edge, ExtGrid, ExtGridId, Gen, GenId, Load, LoadId, Megavars,
    Megawatts, Network, Node, NodeIndex, PerUnit, PowerflowError, PowerflowResult, Radians,
    Shunt, ShuntId,
};

pub struct NetworkBuilder {
    network: Network,
    bus_map: HashMap<BusId, NodeIndex>,
    next_load_id: usize,
    next_gen_id: usize,
    next_branch_id: usize,
    next_shunt_id: usize,
    next_ext_grid_id: usize,
}

impl NetworkBuilder {
    pub fn new(name: impl Into<String>, base_mva: f64) -> Self {
        Self::with_capacity(name, base_mva, 0)
    }

    /// Pre-size the bus map when the bus count is known.
    pub fn with_capacity(name: impl Into<String>, base_mva: f64, buses: usize) -> Self {
        let mut network = Network::named(name);
        network.base_mva = base_mva;
        Self {
            network,
            bus_map: HashMap::with_capacity(buses),
            next_load_id: 1,
            next_gen_id: 1,
            next_branch_id: 1,
            next_shunt_id: 1,
            next_ext_grid_id: 1,
        }
    }

    pub fn has_bus(&self, bus: BusId) -> bool {
        self.bus_map.contains_key(&bus)
    }

    pub fn add_bus(&mut self, bus: Bus) -> PowerflowResult<NodeIndex> {
        if self.bus_map.contains_key(&bus.id) {
            return Err(PowerflowError::Network(format!(
                "duplicate bus number {}",
                bus.id.value()
            )));
        }
        let id = bus.id;
        let idx = self.network.add_bus(bus);
        self.bus_map.insert(id, idx);
        Ok(idx)
    }

    fn require_bus(&self, bus: BusId, element: &str) -> PowerflowResult<NodeIndex> {
        self.bus_map.get(&bus).copied().ok_or_else(|| {
            PowerflowError::Network(format!(
                "{element} refers to unknown bus {}",
                bus.value()
            ))
        })
    }

    pub fn add_load(
        &mut self,
        bus: BusId,
        p: Megawatts,
        q: Megavars,
    ) -> PowerflowResult<LoadId> {
        let id = LoadId::new(self.next_load_id);
        self.require_bus(bus, &id.to_string())?;
        self.next_load_id += 1;
        self.network
            .graph
            .add_node(Node::Load(Load::new(id, bus, p, q)));
        Ok(id)
    }

    /// Add a shunt with admittance already in per-unit on the system base.
    pub fn add_shunt(&mut self, bus: BusId, gs_pu: f64, bs_pu: f64) -> PowerflowResult<ShuntId> {
        let id = ShuntId::new(self.next_shunt_id);
        self.require_bus(bus, &id.to_string())?;
        self.next_shunt_id += 1;
        self.network.graph.add_node(Node::Shunt(Shunt {
            id,
            name: format!("Shunt {}", bus.value()),
            bus,
            gs_pu,
            bs_pu,
            status: true,
        }));
        Ok(id)
    }

    /// Add a PV generator; the ID is assigned by the builder.
    pub fn add_gen(&mut self, mut gen: Gen) -> PowerflowResult<GenId> {
        let id = GenId::new(self.next_gen_id);
        self.require_bus(gen.bus, &id.to_string())?;
        self.next_gen_id += 1;
        gen.id = id;
        if gen.name.is_empty() {
            gen.name = format!("Gen {}", id.value());
        }
        self.network.graph.add_node(Node::Gen(gen));
        Ok(id)
    }

    pub fn add_ext_grid(
        &mut self,
        bus: BusId,
        vm_pu: PerUnit,
        va: Radians,
    ) -> PowerflowResult<ExtGridId> {
        let id = ExtGridId::new(self.next_ext_grid_id);
        self.require_bus(bus, &id.to_string())?;
        self.next_ext_grid_id += 1;
        self.network.graph.add_node(Node::ExtGrid(
            ExtGrid::new(id, bus).with_voltage(vm_pu, va),
        ));
        Ok(id)
    }

    /// Add a branch between two known buses; the ID is assigned by the builder.
    pub fn add_branch(&mut self, mut branch: Branch) -> PowerflowResult<BranchId> {
        let id = BranchId::new(self.next_branch_id);
        let from = self.require_bus(branch.from_bus, &id.to_string())?;
        let to = self.require_bus(branch.to_bus, &id.to_string())?;
        self.next_branch_id += 1;
        branch.id = id;
        self.network.graph.add_edge(from, to, Edge::Branch(branch));
        Ok(id)
    }

    pub fn build(self) -> Network {
        self.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powerflow_core::Kilovolts;

    fn builder_with_bus() -> NetworkBuilder {
        let mut builder = NetworkBuilder::new("t", 100.0);
        builder
            .add_bus(Bus::new(BusId::new(7), "Bus 7", Kilovolts(20.0)))
            .unwrap();
        builder
    }

    #[test]
    fn rejects_duplicate_bus() {
        let mut builder = builder_with_bus();
        let err = builder
            .add_bus(Bus::new(BusId::new(7), "again", Kilovolts(20.0)))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate bus number 7"));
    }

    #[test]
    fn rejects_dangling_element() {
        let mut builder = builder_with_bus();
        let err = builder
            .add_load(BusId::new(8), Megawatts(1.0), Megavars(0.0))
            .unwrap_err();
        assert!(err.to_string().contains("Load 1 refers to unknown bus 8"));

        let err = builder
            .add_branch(Branch::new(BranchId::new(0), BusId::new(7), BusId::new(9), 0.0, 0.1))
            .unwrap_err();
        assert!(err.to_string().contains("unknown bus 9"));
    }

    #[test]
    fn assigns_sequential_ids() {
        let mut builder = builder_with_bus();
        builder
            .add_bus(Bus::new(BusId::new(8), "Bus 8", Kilovolts(20.0)))
            .unwrap();
        let first = builder
            .add_branch(Branch::new(BranchId::new(0), BusId::new(7), BusId::new(8), 0.0, 0.1))
            .unwrap();
        let second = builder
            .add_branch(Branch::new(BranchId::new(0), BusId::new(8), BusId::new(7), 0.0, 0.2))
            .unwrap();
        assert_eq!(first, BranchId::new(1));
        assert_eq!(second, BranchId::new(2));

        let gen = builder
            .add_gen(Gen::new(GenId::new(0), BusId::new(8), Megawatts(10.0), PerUnit(1.02)))
            .unwrap();
        assert_eq!(gen, GenId::new(1));

        let network = builder.build();
        assert_eq!(network.branches().len(), 2);
        assert_eq!(network.generators()[0].id, GenId::new(1));
    }
}
