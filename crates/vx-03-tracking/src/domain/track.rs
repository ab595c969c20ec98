//! A single tracked object and its lifecycle.

use shared_types::{BoundingBox, Detection, TrackSnapshot};

use crate::domain::kalman::{KalmanBoxFilter, StateCovariance, StateVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    New,
    Tracked,
    Lost,
    Removed,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: u64,
    pub state: TrackState,
    pub is_activated: bool,
    pub score: f64,
    pub class_id: u8,
    /// Frames matched since (re)activation.
    pub tracklet_len: u32,
    /// Last frame this track was matched.
    pub frame_id: u64,
    pub start_frame: u64,
    detection_box: BoundingBox,
    filter: Option<(StateVector, StateCovariance)>,
}

impl Track {
    /// Candidate track from a detection; gets an id on activation.
    pub fn from_detection(detection: &Detection) -> Self {
        Self {
            track_id: 0,
            state: TrackState::New,
            is_activated: false,
            score: detection.confidence,
            class_id: detection.class_id,
            tracklet_len: 0,
            frame_id: 0,
            start_frame: 0,
            detection_box: detection.bbox,
            filter: None,
        }
    }

    /// Current box: the filter estimate, or the raw detection before activation.
    pub fn bbox(&self) -> BoundingBox {
        match &self.filter {
            Some((mean, _)) => BoundingBox::from_xyah([mean[0], mean[1], mean[2], mean[3]]),
            None => self.detection_box,
        }
    }

    pub fn end_frame(&self) -> u64 {
        self.frame_id
    }

    pub fn predict(&mut self, kf: &KalmanBoxFilter) {
        if let Some((mean, cov)) = &self.filter {
            let mut mean = *mean;
            if self.state != TrackState::Tracked {
                mean[7] = 0.0;
            }
            self.filter = Some(kf.predict(&mean, cov));
        }
    }

    pub fn activate(&mut self, kf: &KalmanBoxFilter, track_id: u64, frame_id: u64) {
        self.track_id = track_id;
        self.filter = Some(kf.initiate(self.detection_box.to_xyah()));
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        self.is_activated = frame_id == 1;
        self.frame_id = frame_id;
        self.start_frame = frame_id;
    }

    pub fn re_activate(&mut self, kf: &KalmanBoxFilter, detection: &Detection, frame_id: u64) {
        self.correct(kf, detection);
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;
        self.is_activated = true;
        self.frame_id = frame_id;
    }

    pub fn update(&mut self, kf: &KalmanBoxFilter, detection: &Detection, frame_id: u64) {
        self.frame_id = frame_id;
        self.tracklet_len += 1;
        self.correct(kf, detection);
        self.state = TrackState::Tracked;
        self.is_activated = true;
    }

    fn correct(&mut self, kf: &KalmanBoxFilter, detection: &Detection) {
        let measurement = detection.bbox.to_xyah();
        self.filter = Some(match &self.filter {
            Some((mean, cov)) => kf.update(mean, cov, measurement),
            None => kf.initiate(measurement),
        });
        self.detection_box = detection.bbox;
        self.score = detection.confidence;
        self.class_id = detection.class_id;
    }

    pub fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
    }

    pub fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    pub fn snapshot(&self, frame: u64) -> TrackSnapshot {
        let mut snapshot =
            TrackSnapshot::new(self.track_id, self.bbox(), self.score, self.class_id, frame);
        snapshot.is_confirmed = self.is_activated;
        snapshot.track_len = self.tracklet_len;
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f64, score: f64) -> Detection {
        Detection::new(BoundingBox::new(x, 0.0, x + 20.0, 10.0), score, 1)
    }

    #[test]
    fn test_activation_on_first_frame_only() {
        let kf = KalmanBoxFilter::new();
        let mut first = Track::from_detection(&det(0.0, 0.9));
        first.activate(&kf, 1, 1);
        assert!(first.is_activated);

        let mut later = Track::from_detection(&det(0.0, 0.9));
        later.activate(&kf, 2, 5);
        assert!(!later.is_activated);
        assert_eq!(later.state, TrackState::Tracked);
        assert_eq!(later.start_frame, 5);
    }

    #[test]
    fn test_update_counts_and_snapshot() {
        let kf = KalmanBoxFilter::new();
        let mut track = Track::from_detection(&det(0.0, 0.9));
        track.activate(&kf, 7, 1);
        track.predict(&kf);
        track.update(&kf, &det(2.0, 0.8), 2);

        let snap = track.snapshot(2);
        assert_eq!(snap.track_id, 7);
        assert_eq!(snap.track_len, 1);
        assert_eq!(snap.score, 0.8);
        assert!(snap.is_confirmed);
        assert!(snap.bbox.x1 > 0.0 && snap.bbox.x1 < 2.0);
    }

    #[test]
    fn test_bbox_before_activation_is_detection() {
        let track = Track::from_detection(&det(3.0, 0.9));
        assert_eq!(track.bbox(), BoundingBox::new(3.0, 0.0, 23.0, 10.0));
    }
}
