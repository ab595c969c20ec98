//! Prometheus metrics for the V2X pipeline.
//!
//! All metrics follow the naming convention: `v2x_<stage>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: frames processed, messages broadcast
//! - **Gauge**: vehicles, tracks and links currently alive
//! - **Histogram**: time spent per pipeline stage

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts,
    HistogramVec, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SIMULATION (vx-01)
    // =========================================================================

    /// Frames pulled from the vehicle source
    pub static ref FRAMES_PROCESSED: Counter = Counter::new(
        "v2x_simulation_frames_processed_total",
        "Total number of simulation frames processed"
    ).expect("metric creation failed");

    /// Vehicles present in the latest frame
    pub static ref VEHICLES_ACTIVE: Gauge = Gauge::new(
        "v2x_simulation_vehicles_active",
        "Vehicles present in the latest simulation step"
    ).expect("metric creation failed");

    // =========================================================================
    // PERCEPTION / TRACKING (vx-02, vx-03)
    // =========================================================================

    /// Detections produced
    pub static ref DETECTIONS_PRODUCED: Counter = Counter::new(
        "v2x_perception_detections_total",
        "Total detections produced"
    ).expect("metric creation failed");

    /// Confirmed tracks in the latest frame
    pub static ref TRACKS_ACTIVE: Gauge = Gauge::new(
        "v2x_tracking_tracks_active",
        "Confirmed tracks output for the latest frame"
    ).expect("metric creation failed");

    // =========================================================================
    // DIGITAL TWIN (vx-04)
    // =========================================================================

    /// Links in the communication graph
    pub static ref LINKS_ACTIVE: Gauge = Gauge::new(
        "v2x_twin_links_active",
        "Communication links in the latest twin snapshot"
    ).expect("metric creation failed");

    // =========================================================================
    // MESSAGING (vx-05)
    // =========================================================================

    /// Messages generated, by message type
    pub static ref MESSAGES_BROADCAST: CounterVec = CounterVec::new(
        Opts::new("v2x_messaging_messages_total", "V2X messages generated"),
        &["message_type"]  // CAM / V2X_BROADCAST
    ).expect("metric creation failed");

    // =========================================================================
    // PIPELINE
    // =========================================================================

    /// Stage duration histogram
    pub static ref STAGE_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "v2x_pipeline_stage_duration_seconds",
            "Time spent in each pipeline stage"
        ).buckets(exponential_buckets(0.00005, 2.0, 16).expect("valid buckets")),
        &["stage"]  // simulation/perception/tracking/twin/messaging
    ).expect("metric creation failed");

    /// Whole-frame processing time
    pub static ref FRAME_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "v2x_pipeline_frame_duration_seconds",
            "Time spent processing one frame end to end"
        ).buckets(exponential_buckets(0.0005, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Subsystem errors by type
    pub static ref SUBSYSTEM_ERRORS: CounterVec = CounterVec::new(
        Opts::new("v2x_subsystem_errors_total", "Errors by subsystem and type"),
        &["subsystem", "error_type"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling it twice is an error (`AlreadyReg`), as with any registry.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(FRAMES_PROCESSED.clone()),
        Box::new(VEHICLES_ACTIVE.clone()),
        Box::new(DETECTIONS_PRODUCED.clone()),
        Box::new(TRACKS_ACTIVE.clone()),
        Box::new(LINKS_ACTIVE.clone()),
        Box::new(MESSAGES_BROADCAST.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(FRAME_DURATION.clone()),
        Box::new(SUBSYSTEM_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }

    /// Start a timer for one pipeline stage.
    pub fn stage(stage: &str) -> Self {
        Self::new(&STAGE_DURATION.with_label_values(&[stage]))
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
