//! # Pipeline Flows
//!
//! Whole runs over scripted frames: source → perception → tracking → twin →
//! messaging, with the event bus and output files checked afterwards.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use tokio::net::UdpSocket;
    use tokio::sync::watch;

    use shared_bus::{EventFilter, InMemoryEventBus, V2xEvent};
    use shared_types::{MessageType, SimulationFrame, V2xMessage, VehicleId, VehicleState};
    use v2x_runtime::{EndReason, MetricsHandler, NodeConfig, SubsystemContainer, V2xPipeline};
    use vx_01_simulation::{InMemoryVehicleSource, TraceReplaySource};
    use vx_05_messaging::{BroadcastTransport, NoOpTransport, UdpBroadcastTransport};

    use crate::fixtures::convoy;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn config(dir: &Path) -> NodeConfig {
        let mut config = NodeConfig::default();
        config.output.output_dir = dir.to_path_buf();
        config.output.max_frames = 0;
        config
    }

    fn pipeline(
        config: NodeConfig,
        frames: Vec<SimulationFrame>,
        transport: Arc<dyn BroadcastTransport>,
    ) -> (V2xPipeline, Arc<InMemoryEventBus>) {
        let bus = Arc::new(InMemoryEventBus::new());
        let subsystems = SubsystemContainer::new(&config).unwrap();
        let source = Box::new(InMemoryVehicleSource::new(frames));
        let pipeline = V2xPipeline::new(config, subsystems, source, transport, Arc::clone(&bus));
        (pipeline, bus)
    }

    fn running() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }

    // =============================================================================
    // FULL RUNS
    // =============================================================================

    #[tokio::test]
    async fn test_full_run_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, _bus) =
            pipeline(config(dir.path()), convoy(10), Arc::new(NoOpTransport::new()));

        let report = pipeline.run(running()).await.unwrap();
        assert_eq!(report.frames, 10);
        assert_eq!(report.messages, 2);
        assert_eq!(report.end_reason, EndReason::SimulationEnded);

        let summary = read_json(&dir.path().join("v2x_summary.json"));
        assert_eq!(summary["total_messages"], 2);
        assert_eq!(summary["message_types"]["V2X_BROADCAST"], 2);
        assert_eq!(summary["total_unique_vehicles"], 3);

        let messages = read_json(&dir.path().join("v2x_messages_complete.json"));
        assert_eq!(messages.as_array().unwrap().len(), 2);

        let state = read_json(&dir.path().join("pipeline_state.json"));
        assert_eq!(state["frame_count"], 10);
        assert_eq!(state["v2x_messages"].as_array().unwrap().len(), 2);
        assert_eq!(state["config"]["messaging"]["broadcast_interval"], 5);

        assert!(dir.path().join("tracks_000000.json").exists());
        assert!(dir.path().join("tracks_000009.json").exists());
        assert!(!dir.path().join("tracks_000010.json").exists());
        assert!(dir.path().join("tracks_frame_10.json").exists());

        let svg = std::fs::read_to_string(dir.path().join("live_view.svg")).unwrap();
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(!dir.path().join("frame_000000.svg").exists());
    }

    #[tokio::test]
    async fn test_broadcast_from_ego_perspective() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, _bus) =
            pipeline(config(dir.path()), convoy(6), Arc::new(NoOpTransport::new()));
        pipeline.run(running()).await.unwrap();

        let messages = pipeline.archive().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].pipeline_frame, Some(0));
        assert_eq!(messages[1].pipeline_frame, Some(5));

        let last = &messages[1];
        assert_eq!(last.message_type, MessageType::V2xBroadcast);
        assert_eq!(last.ego_vehicle, Some(VehicleId::new("veh_0")));
        assert_eq!(last.range_km, Some(0.3));
        assert_eq!(last.total_vehicles, 3);

        // veh_1 is 50 m away, veh_2 about 412 m
        let nearby = last.nearby_vehicles.as_ref().unwrap();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].sumo_id, Some(VehicleId::new("veh_1")));
        assert_eq!(nearby[0].class, "car");

        let truck = last
            .vehicles
            .iter()
            .find(|v| v.sumo_id == Some(VehicleId::new("veh_2")))
            .unwrap();
        assert_eq!(truck.class, "truck");
        assert!(truck.speed.is_some());
    }

    #[tokio::test]
    async fn test_frame_limit_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.output.max_frames = 3;
        let (mut pipeline, _bus) = pipeline(config, convoy(10), Arc::new(NoOpTransport::new()));

        let report = pipeline.run(running()).await.unwrap();
        assert_eq!(report.frames, 3);
        assert_eq!(report.messages, 1);
        assert_eq!(report.end_reason, EndReason::FrameLimit);
    }

    #[tokio::test]
    async fn test_shutdown_still_saves_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, _bus) =
            pipeline(config(dir.path()), convoy(10), Arc::new(NoOpTransport::new()));

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let report = pipeline.run(rx).await.unwrap();

        assert_eq!(report.frames, 0);
        assert_eq!(report.end_reason, EndReason::Shutdown);
        assert!(dir.path().join("pipeline_state.json").exists());
        // Nothing was broadcast, so no archive
        assert!(!dir.path().join("v2x_messages_complete.json").exists());
    }

    #[tokio::test]
    async fn test_disabled_outputs_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.output.save_output = false;
        config.output.show_visualization = false;
        config.output.save_v2x_messages = false;
        let (mut pipeline, _bus) = pipeline(config, convoy(4), Arc::new(NoOpTransport::new()));
        pipeline.run(running()).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["pipeline_state.json".to_string()]);
    }

    #[tokio::test]
    async fn test_per_frame_views() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.output.save_frames = true;
        let (mut pipeline, _bus) = pipeline(config, convoy(2), Arc::new(NoOpTransport::new()));
        pipeline.run(running()).await.unwrap();

        assert!(dir.path().join("frame_000000.svg").exists());
        assert!(dir.path().join("frame_000001.svg").exists());
    }

    #[tokio::test]
    async fn test_empty_steps_are_processed() {
        let dir = tempfile::tempdir().unwrap();
        let mut frames = vec![
            SimulationFrame::new(0, 0.1, Vec::new()),
            SimulationFrame::new(1, 0.2, Vec::new()),
        ];
        frames.extend(convoy(3).into_iter().map(|mut f| {
            f.step += 2;
            f
        }));
        let (mut pipeline, _bus) =
            pipeline(config(dir.path()), frames, Arc::new(NoOpTransport::new()));

        let report = pipeline.run(running()).await.unwrap();
        assert_eq!(report.frames, 5);
        // Broadcast at frame 0 carries no vehicles
        assert_eq!(pipeline.archive().messages()[0].total_vehicles, 0);
        assert_eq!(pipeline.subsystems().twin.len(), 3);
    }

    // =============================================================================
    // EVENT BUS
    // =============================================================================

    #[tokio::test]
    async fn test_events_published_in_stage_order() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, bus) =
            pipeline(config(dir.path()), convoy(1), Arc::new(NoOpTransport::new()));
        let mut subscription = bus.subscribe(EventFilter::all());

        pipeline.run(running()).await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(Some(event)) = subscription.try_recv() {
            kinds.push(match event {
                V2xEvent::FrameCaptured { .. } => "frame",
                V2xEvent::DetectionsProduced { count, .. } => {
                    assert_eq!(count, 3);
                    "detections"
                }
                V2xEvent::TracksUpdated { .. } => "tracks",
                V2xEvent::TwinUpdated { links, .. } => {
                    assert_eq!(links, 1);
                    "twin"
                }
                V2xEvent::MessageBroadcast(_) => "message",
                V2xEvent::SimulationEnded { .. } => "end",
                V2xEvent::CriticalError { .. } => "error",
            });
        }
        assert_eq!(
            kinds,
            vec!["frame", "detections", "tracks", "twin", "message", "end"]
        );
    }

    #[tokio::test]
    async fn test_metrics_handler_follows_run() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, bus) =
            pipeline(config(dir.path()), convoy(10), Arc::new(NoOpTransport::new()));
        let handler = MetricsHandler::new(&bus);
        let status = handler.status();
        let task = tokio::spawn(handler.run());

        pipeline.run(running()).await.unwrap();
        task.await.unwrap();

        let status = status.read();
        assert_eq!(status.frames, 10);
        assert_eq!(status.last_step, 9);
        assert_eq!(status.detections, 30);
        assert_eq!(status.messages["V2X_BROADCAST"], 2);
        assert_eq!(status.errors, 0);
        assert_eq!(status.end_reason.as_deref(), Some("simulation ended"));
    }

    #[tokio::test]
    async fn test_projection_failure_aborts_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        // Zero margin around a single vehicle gives an empty world
        config.perception.bounds_margin_m = 0.0;
        let frames = vec![SimulationFrame::new(
            0,
            0.1,
            vec![VehicleState::new("veh_0", 5.0, 5.0, 1.0, 0.0)],
        )];
        let (mut pipeline, bus) = pipeline(config, frames, Arc::new(NoOpTransport::new()));
        let mut subscription = bus.subscribe(EventFilter::all());

        assert!(pipeline.run(running()).await.is_err());
        assert!(dir.path().join("pipeline_state.json").exists());

        let mut saw_error = false;
        while let Ok(Some(event)) = subscription.try_recv() {
            if let V2xEvent::CriticalError { error, .. } = event {
                assert!(error.contains("Perception"));
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    // =============================================================================
    // TRACES AND TRANSPORT
    // =============================================================================

    #[tokio::test]
    async fn test_recorded_trace_replays_identically() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("run.jsonl");

        let mut first = config(&dir.path().join("first"));
        first.simulation.record_file = Some(trace.clone());
        let (mut recording, _bus) = pipeline(first, convoy(7), Arc::new(NoOpTransport::new()));
        let recorded = recording.run(running()).await.unwrap();

        let mut second = config(&dir.path().join("second"));
        second.simulation.trace_file = Some(trace.clone());
        let subsystems = SubsystemContainer::new(&second).unwrap();
        let mut replay = V2xPipeline::new(
            second,
            subsystems,
            Box::new(TraceReplaySource::new(trace)),
            Arc::new(NoOpTransport::new()),
            Arc::new(InMemoryEventBus::new()),
        );
        let replayed = replay.run(running()).await.unwrap();

        assert_eq!(replayed.frames, recorded.frames);
        assert_eq!(replayed.messages, recorded.messages);
        let ids = |p: &V2xPipeline| -> Vec<(u64, Option<VehicleId>)> {
            p.archive().messages()[1]
                .vehicles
                .iter()
                .map(|v| (v.id, v.sumo_id.clone()))
                .collect()
        };
        assert_eq!(ids(&recording), ids(&replay));
    }

    #[tokio::test]
    async fn test_udp_broadcasts_reach_listener() {
        let dir = tempfile::tempdir().unwrap();
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap().to_string();
        let transport = UdpBroadcastTransport::connect(&target).await.unwrap();

        let (mut pipeline, _bus) = pipeline(config(dir.path()), convoy(6), Arc::new(transport));
        pipeline.run(running()).await.unwrap();

        let mut buf = vec![0u8; 65536];
        for expected_frame in [0, 5] {
            let (len, _) = listener.recv_from(&mut buf).await.unwrap();
            let message: V2xMessage = serde_json::from_slice(&buf[..len]).unwrap();
            assert_eq!(message.message_type, MessageType::V2xBroadcast);
            assert_eq!(message.pipeline_frame, Some(expected_frame));
        }
    }
}
