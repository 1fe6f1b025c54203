//! AC Power Flow Solver using Newton-Raphson Method
//!
//! Solves the nonlinear power flow equations in polar form:
//!
//! ```text
//! P_i = Σ_j |V_i||V_j| (G_ij cos θ_ij + B_ij sin θ_ij)
//! Q_i = Σ_j |V_i||V_j| (G_ij sin θ_ij - B_ij cos θ_ij)
//! ```
//!
//! Bus types:
//! - **Slack**: every bus carrying an in-service external grid; V and θ fixed
//! - **PV**: buses with an in-service generator; P and |V| fixed
//! - **PQ**: everything else; P and Q fixed
//!
//! The Jacobian is formed from the complex derivatives
//!
//! ```text
//! ∂S/∂θ   = j·diag(V)·conj(diag(I) - Y·diag(V))
//! ∂S/∂|V| = diag(V)·conj(Y·diag(V/|V|)) + conj(diag(I))·diag(V/|V|)
//! ```
//!
//! and each Newton step is solved through the configured
//! [`LinearSystemBackend`](powerflow_core::LinearSystemBackend).
//!
//! With Q-limit enforcement enabled, a PV bus whose generators would have to exceed
//! their combined reactive range is switched to PQ with Q held at the violated limit,
//! and the power flow is solved again.

use std::collections::{HashMap, HashSet};

use num_complex::Complex64;
use powerflow_core::{
    hop_distances, BusId, BusResult, Diagnostics, ExtGridResult, LinearSolverKind,
    LinearSystemBackend, Megavars, Megawatts, Network, Node, PerUnit, PowerFlowResults,
    PowerflowError, PowerflowResult, Radians,
};
use tracing::{debug, info, warn};

use super::admittance::YBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    Slack,
    PV,
    PQ,
}

/// Newton-Raphson AC power flow solver.
#[derive(Debug, Clone)]
pub struct AcPowerFlowSolver {
    /// Convergence tolerance on the largest per-unit power mismatch
    pub tolerance: f64,
    pub max_iterations: usize,
    pub enforce_q_limits: bool,
    /// Upper bound on PV→PQ switching rounds
    pub max_q_rounds: usize,
    pub linear_solver: LinearSolverKind,
}

impl Default for AcPowerFlowSolver {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 10,
            enforce_q_limits: false,
            max_q_rounds: 10,
            linear_solver: LinearSolverKind::default(),
        }
    }
}

/// Solver output before it is written back onto the network.
#[derive(Debug, Clone)]
pub struct AcPowerFlowSolution {
    pub converged: bool,
    /// Newton steps taken, summed over Q-limit rounds
    pub iterations: usize,
    pub max_mismatch: f64,
    /// Bus order of every per-bus vector, same as [`Network::buses`]
    pub bus_ids: Vec<BusId>,
    pub bus_types: Vec<BusType>,
    pub voltage_magnitude: Vec<f64>,
    pub voltage_angle: Vec<f64>,
    /// Net injections in per unit (generation minus load)
    pub injection: Vec<Complex64>,
    /// Load demand per bus in per unit
    pub demand: Vec<Complex64>,
}

impl AcPowerFlowSolution {
    pub fn bus_position(&self, bus: BusId) -> Option<usize> {
        self.bus_ids.iter().position(|&id| id == bus)
    }
}

/// Per-bus setpoints gathered from the network's elements.
struct BusData {
    ids: Vec<BusId>,
    positions: HashMap<BusId, usize>,
    types: Vec<BusType>,
    /// Specified net injection, per unit
    p_spec: Vec<f64>,
    q_spec: Vec<f64>,
    /// Start values; setpoints for slack and PV buses
    vm: Vec<f64>,
    va: Vec<f64>,
    /// Combined reactive range of the generators at each bus, per unit
    q_min: Vec<f64>,
    q_max: Vec<f64>,
    demand: Vec<Complex64>,
}

impl BusData {
    fn gather(network: &Network) -> PowerflowResult<Self> {
        let ids: Vec<BusId> = network.buses().iter().map(|b| b.id).collect();
        let positions: HashMap<BusId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let n = ids.len();
        let base = network.base_mva;

        let mut data = Self {
            ids,
            positions,
            types: vec![BusType::PQ; n],
            p_spec: vec![0.0; n],
            q_spec: vec![0.0; n],
            vm: vec![1.0; n],
            va: vec![0.0; n],
            q_min: vec![0.0; n],
            q_max: vec![0.0; n],
            demand: vec![Complex64::new(0.0, 0.0); n],
        };

        for node in network.graph.node_weights() {
            match node {
                Node::Load(load) if load.status => {
                    let i = data.position(load.bus, &load.name)?;
                    let demand = Complex64::new(
                        load.active_power.value() / base,
                        load.reactive_power.value() / base,
                    );
                    data.demand[i] += demand;
                    data.p_spec[i] -= demand.re;
                    data.q_spec[i] -= demand.im;
                }
                Node::Gen(gen) if gen.status => {
                    let i = data.position(gen.bus, &gen.name)?;
                    data.p_spec[i] += gen.active_power.value() / base;
                    data.q_min[i] += gen.qmin.value() / base;
                    data.q_max[i] += gen.qmax.value() / base;
                    if data.types[i] == BusType::PQ {
                        data.types[i] = BusType::PV;
                        data.vm[i] = gen.voltage_setpoint.value();
                    }
                }
                _ => {}
            }
        }

        let mut slack_seen = HashSet::new();
        for grid in network.ext_grids() {
            if !grid.status {
                continue;
            }
            let i = data.position(grid.bus, &grid.name)?;
            if slack_seen.insert(i) {
                data.types[i] = BusType::Slack;
                data.vm[i] = grid.vm_pu.value();
                data.va[i] = grid.va.value();
            } else if (data.vm[i] - grid.vm_pu.value()).abs() > 1e-9 {
                warn!(
                    bus = grid.bus.value(),
                    "external grids at one bus disagree on voltage; using the first"
                );
            }
        }
        if slack_seen.is_empty() {
            return Err(PowerflowError::NoSlack);
        }

        Ok(data)
    }

    fn position(&self, bus: BusId, element: &str) -> PowerflowResult<usize> {
        self.positions.get(&bus).copied().ok_or_else(|| {
            PowerflowError::Network(format!("{element} refers to unknown bus {}", bus.value()))
        })
    }
}

/// Result of one Newton-Raphson run with fixed bus types.
struct NewtonOutcome {
    iterations: usize,
    max_mismatch: f64,
}

fn polar(vm: &[f64], va: &[f64]) -> Vec<Complex64> {
    vm.iter()
        .zip(va)
        .map(|(&m, &a)| Complex64::from_polar(m, a))
        .collect()
}

impl AcPowerFlowSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Enable or disable reactive power limit enforcement
    pub fn with_q_limit_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_q_limits = enforce;
        self
    }

    pub fn with_linear_solver(mut self, kind: LinearSolverKind) -> Self {
        self.linear_solver = kind;
        self
    }

    /// Solve the power flow without touching the network.
    pub fn solve(&self, network: &Network) -> PowerflowResult<AcPowerFlowSolution> {
        if network.ext_grid_buses().is_empty() {
            return Err(PowerflowError::NoSlack);
        }
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        if diag.has_errors() {
            return Err(PowerflowError::Network(diag.error_summary()));
        }

        let data = BusData::gather(network)?;
        check_energized(network, &data)?;

        let ybus = YBus::build(network, &data.positions);
        let backend = self.linear_solver.build_solver();

        let mut types = data.types.clone();
        let mut q_spec = data.q_spec.clone();
        let mut vm = data.vm.clone();
        let mut va = data.va.clone();
        let mut iterations = 0;
        let mut max_mismatch;

        let mut round = 0;
        loop {
            let outcome = self.newton(
                &ybus,
                backend.as_ref(),
                &types,
                &data.p_spec,
                &q_spec,
                &mut vm,
                &mut va,
            )?;
            iterations += outcome.iterations;
            max_mismatch = outcome.max_mismatch;

            if !self.enforce_q_limits {
                break;
            }
            let switched = switch_violated_pv_buses(&ybus, &data, &mut types, &mut q_spec, &vm, &va);
            if switched == 0 {
                break;
            }
            round += 1;
            info!(round, switched, "switched PV buses to PQ at reactive limits");
            if round >= self.max_q_rounds {
                return Err(PowerflowError::Solver(format!(
                    "reactive limit enforcement did not settle after {round} rounds"
                )));
            }
        }

        let injection = ybus.injections(&polar(&vm, &va));
        debug!(
            buses = data.ids.len(),
            iterations,
            max_mismatch,
            solver = self.linear_solver.as_str(),
            "AC power flow converged"
        );

        Ok(AcPowerFlowSolution {
            converged: true,
            iterations,
            max_mismatch,
            bus_ids: data.ids,
            bus_types: types,
            voltage_magnitude: vm,
            voltage_angle: va,
            injection,
            demand: data.demand,
        })
    }

    /// Solve and write the results onto the network.
    ///
    /// On success the network carries a [`PowerFlowResults`] table, bus voltages are
    /// updated to the solved state and generator reactive outputs are filled in. On
    /// failure the network is left untouched.
    pub fn solve_in_place(&self, network: &mut Network) -> PowerflowResult<PowerFlowResults> {
        let solution = self.solve(network)?;
        let results = apply_solution(network, &solution);
        network.results = Some(results.clone());
        Ok(results)
    }

    #[allow(clippy::too_many_arguments)]
    fn newton(
        &self,
        ybus: &YBus,
        backend: &dyn LinearSystemBackend,
        types: &[BusType],
        p_spec: &[f64],
        q_spec: &[f64],
        vm: &mut [f64],
        va: &mut [f64],
    ) -> PowerflowResult<NewtonOutcome> {
        let n = ybus.size();
        let pvpq: Vec<usize> = (0..n).filter(|&i| types[i] != BusType::Slack).collect();
        let pq: Vec<usize> = (0..n).filter(|&i| types[i] == BusType::PQ).collect();

        // P rows and angle columns share an index, as do Q rows and magnitude columns.
        let mut col_va = vec![None; n];
        let mut col_vm = vec![None; n];
        for (k, &i) in pvpq.iter().enumerate() {
            col_va[i] = Some(k);
        }
        for (k, &i) in pq.iter().enumerate() {
            col_vm[i] = Some(pvpq.len() + k);
        }
        let dim = pvpq.len() + pq.len();

        let mut iter = 0;
        loop {
            let v = polar(vm, va);
            let currents = ybus.currents(&v);
            let s: Vec<Complex64> = v.iter().zip(&currents).map(|(v, i)| v * i.conj()).collect();

            let mut mismatch = vec![0.0; dim];
            for &i in &pvpq {
                if let Some(r) = col_va[i] {
                    mismatch[r] = p_spec[i] - s[i].re;
                }
                if let Some(r) = col_vm[i] {
                    mismatch[r] = q_spec[i] - s[i].im;
                }
            }
            // f64::max skips NaN, so check every entry before folding
            if mismatch.iter().any(|m| !m.is_finite()) {
                return Err(PowerflowError::Solver(format!(
                    "power flow diverged at iteration {iter}: non-finite power mismatch"
                )));
            }
            let max_mismatch = mismatch.iter().fold(0.0_f64, |acc, m| acc.max(m.abs()));
            debug!(iter, max_mismatch, "Newton-Raphson iteration");
            if max_mismatch < self.tolerance {
                return Ok(NewtonOutcome {
                    iterations: iter,
                    max_mismatch,
                });
            }
            if iter == self.max_iterations {
                return Err(PowerflowError::Solver(format!(
                    "power flow did not converge after {} iterations (max mismatch {:.3e} p.u.)",
                    self.max_iterations, max_mismatch
                )));
            }

            let jacobian = build_jacobian(ybus, &v, &currents, &col_va, &col_vm, dim);
            let dx = backend.solve(&jacobian, &mismatch)?;

            for i in 0..n {
                if let Some(c) = col_va[i] {
                    va[i] += dx[c];
                }
                if let Some(c) = col_vm[i] {
                    vm[i] += dx[c];
                }
            }
            iter += 1;
        }
    }
}

fn build_jacobian(
    ybus: &YBus,
    v: &[Complex64],
    currents: &[Complex64],
    col_va: &[Option<usize>],
    col_vm: &[Option<usize>],
    dim: usize,
) -> Vec<Vec<f64>> {
    let j = Complex64::new(0.0, 1.0);
    let mut jac = vec![vec![0.0; dim]; dim];

    for i in 0..ybus.size() {
        let (p_row, q_row) = (col_va[i], col_vm[i]);
        if p_row.is_none() && q_row.is_none() {
            continue;
        }
        let vn_i = v[i] / v[i].norm();

        for &(k, y) in ybus.row(i) {
            let vn_k = v[k] / v[k].norm();
            let mut ds_dva = j * v[i] * (-(y * v[k])).conj();
            let mut ds_dvm = v[i] * (y * vn_k).conj();
            if i == k {
                ds_dva += j * v[i] * currents[i].conj();
                ds_dvm += currents[i].conj() * vn_i;
            }

            for (col, ds) in [(col_va[k], ds_dva), (col_vm[k], ds_dvm)] {
                let Some(c) = col else { continue };
                if let Some(r) = p_row {
                    jac[r][c] = ds.re;
                }
                if let Some(r) = q_row {
                    jac[r][c] = ds.im;
                }
            }
        }
    }

    jac
}

/// Every bus must be reachable from some slack bus through in-service branches.
fn check_energized(network: &Network, data: &BusData) -> PowerflowResult<()> {
    let mut reached = HashSet::new();
    for (i, &bus) in data.ids.iter().enumerate() {
        if data.types[i] == BusType::Slack {
            reached.extend(hop_distances(network, bus)?.into_keys());
        }
    }
    let dead: Vec<String> = data
        .ids
        .iter()
        .filter(|id| !reached.contains(id))
        .map(|id| id.value().to_string())
        .collect();
    if dead.is_empty() {
        Ok(())
    } else {
        Err(PowerflowError::Network(format!(
            "buses not connected to any external grid: {}",
            dead.join(", ")
        )))
    }
}

/// Switch PV buses whose generator Q lies outside its range to PQ at the limit.
///
/// Returns the number of buses switched.
fn switch_violated_pv_buses(
    ybus: &YBus,
    data: &BusData,
    types: &mut [BusType],
    q_spec: &mut [f64],
    vm: &[f64],
    va: &[f64],
) -> usize {
    let s = ybus.injections(&polar(vm, va));
    let mut switched = 0;
    for i in 0..types.len() {
        if types[i] != BusType::PV {
            continue;
        }
        let q_gen = s[i].im + data.demand[i].im;
        let limit = if q_gen > data.q_max[i] {
            data.q_max[i]
        } else if q_gen < data.q_min[i] {
            data.q_min[i]
        } else {
            continue;
        };
        debug!(
            bus = data.ids[i].value(),
            q_gen, limit, "generator reactive limit hit"
        );
        types[i] = BusType::PQ;
        q_spec[i] = limit - data.demand[i].im;
        switched += 1;
    }
    switched
}

/// Build the result table and update voltages and generator outputs.
fn apply_solution(network: &mut Network, solution: &AcPowerFlowSolution) -> PowerFlowResults {
    let base = network.base_mva;
    let positions: HashMap<BusId, usize> = solution
        .bus_ids
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i))
        .collect();

    let bus = solution
        .bus_ids
        .iter()
        .enumerate()
        .map(|(i, &id)| BusResult {
            bus: id,
            vm_pu: PerUnit(solution.voltage_magnitude[i]),
            va_degree: Radians(solution.voltage_angle[i]).to_degrees(),
            p_mw: Megawatts(-solution.injection[i].re * base),
            q_mvar: Megavars(-solution.injection[i].im * base),
        })
        .collect();

    // Generator output seen at each bus: net injection plus local demand.
    let mut gen_count = vec![0usize; positions.len()];
    let mut gen_p = vec![0.0; positions.len()];
    let mut gen_q = vec![0.0; positions.len()];
    let mut grid_count = vec![0usize; positions.len()];
    for node in network.graph.node_weights() {
        match node {
            Node::Gen(gen) if gen.status => {
                if let Some(&i) = positions.get(&gen.bus) {
                    gen_count[i] += 1;
                    gen_p[i] += gen.active_power.value();
                    gen_q[i] += gen.reactive_power.value();
                }
            }
            Node::ExtGrid(grid) if grid.status => {
                if let Some(&i) = positions.get(&grid.bus) {
                    grid_count[i] += 1;
                }
            }
            _ => {}
        }
    }
    let bus_output = |i: usize| (solution.injection[i] + solution.demand[i]) * base;

    let mut ext_grid = Vec::new();
    for node in network.graph.node_weights_mut() {
        match node {
            Node::Bus(bus) => {
                if let Some(&i) = positions.get(&bus.id) {
                    bus.voltage_pu = PerUnit(solution.voltage_magnitude[i]);
                    bus.angle_rad = Radians(solution.voltage_angle[i]);
                }
            }
            // Generators at a slack bus keep their scheduled output; the grid takes the rest.
            Node::Gen(gen) if gen.status => {
                if let Some(&i) = positions.get(&gen.bus) {
                    if solution.bus_types[i] != BusType::Slack {
                        gen.reactive_power = Megavars(bus_output(i).im / gen_count[i] as f64);
                    }
                }
            }
            Node::ExtGrid(grid) if grid.status => {
                if let Some(&i) = positions.get(&grid.bus) {
                    let share = grid_count[i] as f64;
                    let output = bus_output(i);
                    ext_grid.push(ExtGridResult {
                        ext_grid: grid.id,
                        bus: grid.bus,
                        p_mw: Megawatts((output.re - gen_p[i]) / share),
                        q_mvar: Megavars((output.im - gen_q[i]) / share),
                    });
                }
            }
            _ => {}
        }
    }
    ext_grid.sort_by_key(|r| r.ext_grid);

    PowerFlowResults {
        converged: solution.converged,
        iterations: solution.iterations,
        max_mismatch: solution.max_mismatch,
        bus,
        ext_grid,
    }
}
