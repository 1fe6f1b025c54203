//! Voltage profile along the network: solved bus voltage against topological
//! distance (branch hops) from the slack bus.

use serde::Serialize;

use powerflow_core::{hop_distances, BusId, Network, PowerflowError, PowerflowResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfilePoint {
    pub bus: BusId,
    /// Branch hops from the slack bus
    pub distance: usize,
    pub vm_pu: f64,
}

/// One point per bus, in the order of [`Network::buses`].
#[derive(Debug, Clone, Serialize)]
pub struct VoltageProfile {
    pub network: String,
    pub slack: BusId,
    pub points: Vec<ProfilePoint>,
}

impl VoltageProfile {
    /// Distances and voltages as parallel series, ready for plotting.
    pub fn series(&self) -> (Vec<f64>, Vec<f64>) {
        self.points
            .iter()
            .map(|p| (p.distance as f64, p.vm_pu))
            .unzip()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_distance(&self) -> usize {
        self.points.iter().map(|p| p.distance).max().unwrap_or(0)
    }
}

/// Pair every bus's solved voltage with its hop distance from the slack bus.
///
/// The slack bus is the bus of the first in-service external grid. Fails with
/// [`PowerflowError::UnreachableBus`] if any bus is cut off from it, so the
/// profile always covers every bus.
pub fn voltage_profile(network: &Network) -> PowerflowResult<VoltageProfile> {
    let results = network.results.as_ref().ok_or_else(|| {
        PowerflowError::Network(format!("network '{}' carries no power flow results", network.name))
    })?;
    let slack = network
        .ext_grid_buses()
        .first()
        .copied()
        .ok_or(PowerflowError::NoSlack)?;
    let distances = hop_distances(network, slack)?;

    let points = network
        .buses()
        .iter()
        .map(|bus| {
            let distance =
                distances
                    .get(&bus.id)
                    .copied()
                    .ok_or(PowerflowError::UnreachableBus {
                        bus: bus.id.value(),
                        slack: slack.value(),
                    })?;
            let vm_pu = results
                .bus
                .iter()
                .find(|r| r.bus == bus.id)
                .map(|r| r.vm_pu.value())
                .ok_or_else(|| {
                    PowerflowError::Network(format!("no result for {}", bus.id))
                })?;
            Ok(ProfilePoint {
                bus: bus.id,
                distance,
                vm_pu,
            })
        })
        .collect::<PowerflowResult<Vec<_>>>()?;

    Ok(VoltageProfile {
        network: network.name.clone(),
        slack,
        points,
    })
}
