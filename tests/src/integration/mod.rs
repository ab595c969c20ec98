//! Cross-subsystem pipeline flows.

mod e2e_traci;
mod flows;
