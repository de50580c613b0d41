//! Fixtures for exercising the topology matcher.
//!
//! Provides the calibration template, deterministic fake nodes, the three
//! calibration scenarios, and a reorder helper for checking that verification
//! does not depend on the order of the actual collections.

use derive_more::Display;
use rand_chacha::{
    ChaCha20Rng,
    rand_core::{Rng, SeedableRng},
};
use topocheck_core::{ActualCall, ActualNode, ActualTopology};

/// Template with one user node calling two instances of the same service.
pub const CALIBRATION_TEMPLATE: &str = include_str!("../fixtures/calibration.toml");

/// JSON snapshot that satisfies [`CALIBRATION_TEMPLATE`].
pub const CALIBRATION_SNAPSHOT: &str = include_str!("../fixtures/snapshot.json");

///
/// Fake
///
/// Deterministic dummy-value generator for tests.
///
/// Values are derived from a numeric seed so tests stay reproducible without
/// hardcoding collector output.
///

pub struct Fake;

impl Fake {
    const BASE_PID: u32 = 27_960;

    /// Host name in the collector's `skywalking-server-NNNN` form.
    #[must_use]
    pub fn host(seed: u32) -> String {
        format!("skywalking-server-{seed:04}")
    }

    #[must_use]
    pub const fn pid(seed: u32) -> u32 {
        Self::BASE_PID + seed
    }

    /// Service instance name: `{project}-pid:{pid}@{host}`.
    #[must_use]
    pub fn instance_name(project: &str, seed: u32) -> String {
        format!("{project}-pid:{}@{}", Self::pid(seed), Self::host(1))
    }

    /// The user entry-point node.
    #[must_use]
    pub fn user(id: &str) -> ActualNode {
        ActualNode::new(id)
            .with_name("User")
            .with_type("USER")
            .with_real(false)
    }

    /// A real Tomcat instance of `project`.
    #[must_use]
    pub fn service(id: &str, project: &str, seed: u32) -> ActualNode {
        ActualNode::new(id)
            .with_name(Self::instance_name(project, seed))
            .with_type("Tomcat")
            .with_real(true)
    }

    /// A user node fanning out to `services` instances of one project.
    ///
    /// Node ids are `"1"` for the user and `"2"..` for the services; each
    /// service gets a call `"1-{id}"`.
    #[must_use]
    pub fn fan_out(project: &str, services: u32) -> ActualTopology {
        let mut nodes = vec![Self::user("1")];
        let mut calls = Vec::new();

        for seed in 0..services {
            let id = (seed + 2).to_string();
            calls.push(ActualCall::between("1", id.as_str()));
            nodes.push(Self::service(&id, project, seed));
        }

        ActualTopology::new(nodes, calls)
    }
}

///
/// Scenario
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Scenario {
    /// Both instances report the same project.
    Consistent,
    /// The instances disagree on project.
    ProjectConflict,
    /// The second instance is absent.
    MissingNode,
}

impl Scenario {
    pub const ALL: [Self; 3] = [Self::Consistent, Self::ProjectConflict, Self::MissingNode];

    /// Actual topology for this scenario, to verify against
    /// [`CALIBRATION_TEMPLATE`].
    #[must_use]
    pub fn topology(self) -> ActualTopology {
        match self {
            Self::Consistent => Fake::fan_out("projectB", 2),
            Self::ProjectConflict => {
                let mut topology = Fake::fan_out("projectB", 2);
                topology.nodes[1] = Fake::service("2", "projectA", 0);
                topology
            }
            Self::MissingNode => {
                let mut topology = Fake::fan_out("projectB", 2);
                topology.nodes.retain(|node| node.id != "3");
                topology
            }
        }
    }
}

/// Shuffle both actual collections with a seeded Fisher-Yates pass.
///
/// The same seed always yields the same order; every permutation is
/// reachable from some seed.
#[must_use]
pub fn reorder(mut topology: ActualTopology, seed: u64) -> ActualTopology {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    let mut rng = ChaCha20Rng::from_seed(bytes);

    shuffle(&mut topology.nodes, &mut rng);
    shuffle(&mut topology.calls, &mut rng);

    topology
}

fn shuffle<T>(items: &mut [T], rng: &mut ChaCha20Rng) {
    for i in (1..items.len()).rev() {
        let bound = i as u64 + 1;
        let j = usize::try_from(rng.next_u64() % bound).unwrap_or(i);
        items.swap(i, j);
    }
}

///
/// TESTS
///
