//! # TraCI End-to-End
//!
//! Runs the whole pipeline against a scripted TraCI server, exercising the
//! wire client, the runner and every downstream stage together.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use tokio::sync::watch;

    use shared_bus::InMemoryEventBus;
    use v2x_runtime::adapters::build_source;
    use v2x_runtime::{EndReason, NodeConfig, SubsystemContainer, V2xPipeline};
    use vx_01_simulation::testing::MockTraciServer;
    use vx_01_simulation::SumoConfig;
    use vx_05_messaging::NoOpTransport;

    use crate::fixtures::convoy;

    async fn run_against(server: &MockTraciServer, max_frames: u64) -> (V2xPipeline, EndReason) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::default();
        config.simulation.sumo = SumoConfig::default().attach_to("127.0.0.1", server.port());
        config.output.output_dir = dir.path().to_path_buf();
        config.output.max_frames = max_frames;
        config.validate().unwrap();

        let subsystems = SubsystemContainer::new(&config).unwrap();
        let source = build_source(&config.simulation);
        let mut pipeline = V2xPipeline::new(
            config,
            subsystems,
            source,
            Arc::new(NoOpTransport::new()),
            Arc::new(InMemoryEventBus::new()),
        );
        let report = pipeline.run(watch::channel(false).1).await.unwrap();
        (pipeline, report.end_reason)
    }

    fn script(frames: u64) -> Vec<Vec<shared_types::VehicleState>> {
        convoy(frames).into_iter().map(|f| f.vehicles).collect()
    }

    #[tokio::test]
    async fn test_pipeline_over_traci() {
        let server = MockTraciServer::spawn(script(6), 0.1).await.unwrap();
        let (pipeline, reason) = run_against(&server, 0).await;

        assert_eq!(reason, EndReason::SimulationEnded);
        assert_eq!(pipeline.frame_count(), 6);
        assert_eq!(pipeline.archive().len(), 2);
        assert_eq!(pipeline.subsystems().twin.len(), 3);

        let last = &pipeline.archive().messages()[1];
        assert_eq!(last.total_vehicles, 3);
        let classes: Vec<&str> = last.vehicles.iter().map(|v| v.class.as_str()).collect();
        assert_eq!(classes.iter().filter(|c| **c == "car").count(), 2);
        assert_eq!(classes.iter().filter(|c| **c == "truck").count(), 1);
    }

    #[tokio::test]
    async fn test_frame_limit_closes_connection() {
        let server = MockTraciServer::spawn(script(20), 0.1).await.unwrap();
        let (pipeline, reason) = run_against(&server, 4).await;

        assert_eq!(reason, EndReason::FrameLimit);
        assert_eq!(pipeline.frame_count(), 4);
        assert!(server.commands_seen() > 0);
    }
}
