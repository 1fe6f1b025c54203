use std::collections::{HashMap, HashSet};
use std::path::Path;

use powerflow_core::{
    Branch, BranchId, Bus, BusId, Gen, GenId, Kilovolts, Megavars, MegavoltAmperes, Megawatts,
    Network, PerUnit, PowerflowResult, Radians,
};
use tracing::{debug, warn};

use super::matpower_parser::{parse_matpower_file, MatpowerCase, BUS_ISOLATED, BUS_REF};
use crate::helpers::NetworkBuilder;

/// Parse a `.m` file and build the network, named after the file stem.
pub fn load_matpower_network(path: &Path) -> PowerflowResult<Network> {
    let case = parse_matpower_file(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    build_network(&case, &name)
}

/// Convert a parsed MATPOWER case into a [`Network`].
///
/// - every reference bus gets one external grid at the voltage setpoint of its first
///   in-service generator (the bus voltage when it has none); further generators at
///   a reference bus are kept as ordinary generators
/// - other in-service generators become voltage-controlled generators
/// - `Pd`/`Qd` become loads, `Gs`/`Bs` become shunts converted to per-unit
/// - out-of-service branches are kept with `status = false`; a zero tap means 1.0
/// - isolated buses (type 4) are dropped together with everything attached to them
pub fn build_network(case: &MatpowerCase, name: &str) -> PowerflowResult<Network> {
    let mut builder = NetworkBuilder::with_capacity(name, case.base_mva, case.bus.len());

    let isolated: HashSet<usize> = case
        .bus
        .iter()
        .filter(|b| b.bus_type == BUS_ISOLATED)
        .map(|b| b.bus_i)
        .collect();
    if !isolated.is_empty() {
        warn!(case = name, count = isolated.len(), "dropping isolated buses");
    }

    for bus in case.bus.iter().filter(|b| !isolated.contains(&b.bus_i)) {
        builder.add_bus(Bus {
            id: BusId::new(bus.bus_i),
            name: format!("Bus {}", bus.bus_i),
            base_kv: Kilovolts(bus.base_kv),
            voltage_pu: PerUnit(bus.vm),
            angle_rad: Radians(bus.va.to_radians()),
            vmin_pu: Some(PerUnit(bus.vmin)),
            vmax_pu: Some(PerUnit(bus.vmax)),
            area_id: Some(bus.area as i64),
            zone_id: Some(bus.zone as i64),
        })?;
    }

    // First in-service generator at each reference bus drives the external grid.
    let mut slack_setpoint: HashMap<usize, f64> = HashMap::new();
    let mut slack_gen_consumed: HashSet<usize> = HashSet::new();
    let ref_buses: HashSet<usize> = case
        .bus
        .iter()
        .filter(|b| b.bus_type == BUS_REF)
        .map(|b| b.bus_i)
        .collect();
    for gen in case.gen.iter().filter(|g| g.gen_status > 0) {
        if ref_buses.contains(&gen.gen_bus) {
            slack_setpoint.entry(gen.gen_bus).or_insert(gen.vg);
        }
    }

    for bus in case.bus.iter().filter(|b| b.bus_type == BUS_REF) {
        let vm = slack_setpoint.get(&bus.bus_i).copied().unwrap_or(bus.vm);
        builder.add_ext_grid(
            BusId::new(bus.bus_i),
            PerUnit(vm),
            Radians(bus.va.to_radians()),
        )?;
    }

    for bus in case.bus.iter().filter(|b| !isolated.contains(&b.bus_i)) {
        if bus.pd != 0.0 || bus.qd != 0.0 {
            builder.add_load(BusId::new(bus.bus_i), Megawatts(bus.pd), Megavars(bus.qd))?;
        }
        if bus.gs != 0.0 || bus.bs != 0.0 {
            builder.add_shunt(
                BusId::new(bus.bus_i),
                bus.gs / case.base_mva,
                bus.bs / case.base_mva,
            )?;
        }
    }

    let mut skipped_gens = 0usize;
    for gen in &case.gen {
        if gen.gen_status <= 0 || isolated.contains(&gen.gen_bus) {
            skipped_gens += 1;
            continue;
        }
        if ref_buses.contains(&gen.gen_bus) && slack_gen_consumed.insert(gen.gen_bus) {
            continue;
        }
        builder.add_gen(Gen {
            id: GenId::new(0),
            name: String::new(),
            bus: BusId::new(gen.gen_bus),
            active_power: Megawatts(gen.pg),
            reactive_power: Megavars(gen.qg),
            pmax: Megawatts(gen.pmax),
            qmin: Megavars(gen.qmin),
            qmax: Megavars(gen.qmax),
            voltage_setpoint: PerUnit(gen.vg),
            status: true,
        })?;
    }

    let mut skipped_branches = 0usize;
    for br in &case.branch {
        if isolated.contains(&br.f_bus) || isolated.contains(&br.t_bus) {
            skipped_branches += 1;
            continue;
        }
        let mut branch = Branch::new(
            BranchId::new(0),
            BusId::new(br.f_bus),
            BusId::new(br.t_bus),
            br.br_r,
            br.br_x,
        )
        .with_charging(br.br_b);
        if br.tap != 0.0 || br.shift != 0.0 {
            let ratio = if br.tap == 0.0 { 1.0 } else { br.tap };
            branch = branch.with_tap(ratio, Radians(br.shift.to_radians()));
            branch.name = format!("Trafo {}-{}", br.f_bus, br.t_bus);
        }
        branch.rating_a = (br.rate_a > 0.0).then_some(MegavoltAmperes(br.rate_a));
        branch.status = br.br_status > 0;
        builder.add_branch(branch)?;
    }

    let network = builder.build();
    debug!(
        case = name,
        stats = %network.stats(),
        scheduled_gen_mw = network.total_generation_mw(),
        skipped_gens,
        skipped_branches,
        "built network from MATPOWER case"
    );
    Ok(network)
}
