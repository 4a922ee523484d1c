//! MapReduce applications that can be run by name.

use common::Workload;

pub mod ii;
pub mod vertex_degree;
pub mod wc;

const WORKLOADS: &[Workload] = &[
    Workload {
        name: "wc",
        map_fn: wc::map,
        reduce_fn: wc::reduce,
    },
    Workload {
        name: "ii",
        map_fn: ii::map,
        reduce_fn: ii::reduce,
    },
    Workload {
        name: "vertex-degree",
        map_fn: vertex_degree::map,
        reduce_fn: vertex_degree::reduce,
    },
];

/// Look up a workload by name.
pub fn try_named(name: &str) -> Option<Workload> {
    WORKLOADS.iter().find(|w| w.name == name).copied()
}

/// Names of every known workload.
pub fn names() -> impl Iterator<Item = &'static str> {
    WORKLOADS.iter().map(|w| w.name)
}

/// Look up a workload by name, failing with the list of known names.
pub fn named(name: &str) -> anyhow::Result<Workload> {
    try_named(name).ok_or_else(|| {
        anyhow::anyhow!(
            "The workload `{}` is not a known workload (known: {})",
            name,
            names().collect::<Vec<_>>().join(", ")
        )
    })
}
