//! Bus admittance matrix in sparse-row form.

use num_complex::Complex64;
use powerflow_core::{BusId, Edge, Network, Node};
use std::collections::HashMap;

/// Row-compressed Y-bus: `rows[i]` holds `(j, Y_ij)` for every non-zero entry,
/// sorted by column.
#[derive(Debug, Clone)]
pub struct YBus {
    rows: Vec<Vec<(usize, Complex64)>>,
}

impl YBus {
    /// Build the admittance matrix over `positions` (bus ID → matrix index).
    ///
    /// In-service branches use the π model with the tap on the from side:
    ///
    /// ```text
    /// Yff = (ys + j b/2) / |t|²    Yft = -ys / conj(t)
    /// Ytf = -ys / t                Ytt =  ys + j b/2
    /// ```
    ///
    /// In-service shunts add `gs + j bs` on the diagonal. Zero-impedance branches
    /// are skipped.
    pub fn build(network: &Network, positions: &HashMap<BusId, usize>) -> Self {
        let n = positions.len();
        let mut rows: Vec<HashMap<usize, Complex64>> = vec![HashMap::new(); n];
        let mut add = |i: usize, j: usize, y: Complex64| {
            *rows[i].entry(j).or_insert(Complex64::new(0.0, 0.0)) += y;
        };

        for edge in network.graph.edge_weights() {
            let Edge::Branch(branch) = edge;
            if !branch.status {
                continue;
            }
            let (Some(&f), Some(&t)) = (
                positions.get(&branch.from_bus),
                positions.get(&branch.to_bus),
            ) else {
                continue;
            };

            let z = Complex64::new(branch.resistance, branch.reactance);
            if z.norm_sqr() < 1e-24 {
                continue;
            }
            let ys = z.inv();
            let half_b = Complex64::new(0.0, branch.charging_b.value() / 2.0);
            let ratio = if branch.tap_ratio > 0.0 {
                branch.tap_ratio
            } else {
                1.0
            };
            let tap = Complex64::from_polar(ratio, branch.phase_shift.value());

            add(f, f, (ys + half_b) / (ratio * ratio));
            add(t, t, ys + half_b);
            add(f, t, -ys / tap.conj());
            add(t, f, -ys / tap);
        }

        for node in network.graph.node_weights() {
            if let Node::Shunt(shunt) = node {
                if !shunt.status {
                    continue;
                }
                if let Some(&i) = positions.get(&shunt.bus) {
                    add(i, i, Complex64::new(shunt.gs_pu, shunt.bs_pu));
                }
            }
        }

        let rows = rows
            .into_iter()
            .map(|row| {
                let mut entries: Vec<_> = row.into_iter().collect();
                entries.sort_by_key(|&(j, _)| j);
                entries
            })
            .collect();
        Self { rows }
    }

    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, i: usize) -> &[(usize, Complex64)] {
        &self.rows[i]
    }

    pub fn get(&self, i: usize, j: usize) -> Complex64 {
        self.rows[i]
            .binary_search_by_key(&j, |&(col, _)| col)
            .map(|k| self.rows[i][k].1)
            .unwrap_or_default()
    }

    /// Current injections `I = Y V`
    pub fn currents(&self, v: &[Complex64]) -> Vec<Complex64> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|&(j, y)| y * v[j]).sum())
            .collect()
    }

    /// Complex power injections `S = V conj(Y V)`
    pub fn injections(&self, v: &[Complex64]) -> Vec<Complex64> {
        self.currents(v)
            .iter()
            .zip(v)
            .map(|(i, v)| v * i.conj())
            .collect()
    }
}
