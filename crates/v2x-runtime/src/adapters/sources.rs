//! Vehicle feed and broadcast transport selection.

use std::sync::Arc;
use tracing::info;

use vx_01_simulation::{SumoRunner, TraceReplaySource, VehicleSource};
use vx_05_messaging::{
    BroadcastTransport, MessagingConfig, MessagingError, NoOpTransport, UdpBroadcastTransport,
};

use crate::container::SimulationSettings;

/// A trace replay when `trace_file` is set, SUMO otherwise.
pub fn build_source(settings: &SimulationSettings) -> Box<dyn VehicleSource> {
    let source: Box<dyn VehicleSource> = match &settings.trace_file {
        Some(path) => Box::new(TraceReplaySource::new(path.clone())),
        None => Box::new(SumoRunner::new(settings.sumo.clone())),
    };
    info!(source = %source.describe(), "Vehicle source selected");
    source
}

/// UDP when `udp_target` is set, a no-op transport otherwise.
pub async fn build_transport(
    config: &MessagingConfig,
) -> Result<Arc<dyn BroadcastTransport>, MessagingError> {
    let transport: Arc<dyn BroadcastTransport> = match &config.udp_target {
        Some(target) => Arc::new(UdpBroadcastTransport::connect(target).await?),
        None => Arc::new(NoOpTransport::new()),
    };
    info!(transport = %transport.describe(), "Broadcast transport selected");
    Ok(transport)
}
