//! metricschedd — the scheduling daemon.
//!
//! Assembles the telemetry client, ranking engine, node lister and binder
//! into an `Extender` and drives it from a polling loop.
//!
//! ```text
//! Extender::run
//!   └── every poll_interval
//!       ├── refresh ready nodes when node_refresh_interval elapsed
//!       └── for each pending pod (one at a time)
//!           ├── ReadyNodeLister::ready_nodes
//!           ├── RankingEngine::best_node
//!           └── Binder::bind
//! ```

pub mod extender;

pub use extender::{Extender, ExtenderSettings, ScheduleError, ScheduleOutcome, build_extender};
