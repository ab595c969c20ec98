//! ByteTrack: two-pass association of high- and low-score detections.

use shared_types::{BoundingBox, Detection, TrackSnapshot};
use std::collections::HashSet;
use tracing::trace;

use crate::domain::assignment::{fuse_score, iou_distance, linear_assignment};
use crate::domain::config::TrackerConfig;
use crate::domain::kalman::KalmanBoxFilter;
use crate::domain::track::{Track, TrackState};

/// Cost limit when matching low-score detections to tracked tracks.
const SECOND_PASS_THRESH: f64 = 0.5;
/// Cost limit when confirming tentative tracks.
const UNCONFIRMED_THRESH: f64 = 0.7;
/// IoU distance below which a tracked and a lost track are duplicates.
const DUPLICATE_THRESH: f64 = 0.15;

#[derive(Debug)]
pub struct ByteTracker {
    config: TrackerConfig,
    kalman: KalmanBoxFilter,
    tracked: Vec<Track>,
    lost: Vec<Track>,
    frame_id: u64,
    next_id: u64,
}

impl ByteTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            kalman: KalmanBoxFilter::new(),
            tracked: Vec::new(),
            lost: Vec::new(),
            frame_id: 0,
            next_id: 1,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Frames processed so far.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn lost_count(&self) -> usize {
        self.lost.len()
    }

    /// Whether a track is still tracked or waiting to be re-found.
    pub fn is_alive(&self, track_id: u64) -> bool {
        self.tracked
            .iter()
            .chain(self.lost.iter())
            .any(|t| t.track_id == track_id)
    }

    /// Process one frame of detections.
    ///
    /// Returns the activated tracked tracks, ordered by id.
    pub fn update(&mut self, detections: &[Detection]) -> Vec<TrackSnapshot> {
        self.frame_id += 1;
        let frame = self.frame_id;
        let kf = self.kalman;

        let (high, low): (Vec<Detection>, Vec<Detection>) = detections
            .iter()
            .copied()
            .filter(|d| d.confidence > self.config.low_score_thresh)
            .partition(|d| d.confidence >= self.config.track_thresh);

        let (mut unconfirmed, confirmed): (Vec<Track>, Vec<Track>) =
            std::mem::take(&mut self.tracked)
                .into_iter()
                .partition(|t| !t.is_activated);
        let lost_before: HashSet<u64> = self.lost.iter().map(|t| t.track_id).collect();

        let mut pool: Vec<Track> = confirmed;
        pool.append(&mut self.lost);
        for track in pool.iter_mut() {
            track.predict(&kf);
        }

        // First pass: high detections against tracked and lost
        let cost = fuse_score(
            iou_distance(&boxes(&pool), &det_boxes(&high)),
            &high.iter().map(|d| d.confidence).collect::<Vec<_>>(),
        );
        let first = linear_assignment(&cost, high.len(), self.config.match_thresh);
        for &(i, j) in &first.matches {
            match pool[i].state {
                TrackState::Tracked => pool[i].update(&kf, &high[j], frame),
                _ => pool[i].re_activate(&kf, &high[j], frame),
            }
        }

        // Second pass: low detections against still-unmatched tracked tracks
        let remaining: Vec<usize> = first
            .unmatched_rows
            .iter()
            .copied()
            .filter(|&i| pool[i].state == TrackState::Tracked)
            .collect();
        let remaining_boxes: Vec<BoundingBox> = remaining.iter().map(|&i| pool[i].bbox()).collect();
        let second = linear_assignment(
            &iou_distance(&remaining_boxes, &det_boxes(&low)),
            low.len(),
            SECOND_PASS_THRESH,
        );
        for &(r, j) in &second.matches {
            pool[remaining[r]].update(&kf, &low[j], frame);
        }
        for &r in &second.unmatched_rows {
            let track = &mut pool[remaining[r]];
            if track.state != TrackState::Lost {
                track.mark_lost();
            }
        }

        // Tentative tracks get one chance at the leftover high detections
        let leftover: Vec<Detection> = first.unmatched_cols.iter().map(|&j| high[j]).collect();
        let cost = fuse_score(
            iou_distance(&boxes(&unconfirmed), &det_boxes(&leftover)),
            &leftover.iter().map(|d| d.confidence).collect::<Vec<_>>(),
        );
        let third = linear_assignment(&cost, leftover.len(), UNCONFIRMED_THRESH);
        for &(i, j) in &third.matches {
            unconfirmed[i].update(&kf, &leftover[j], frame);
        }
        for &i in &third.unmatched_rows {
            unconfirmed[i].mark_removed();
        }

        let mut fresh = Vec::new();
        for &j in &third.unmatched_cols {
            let detection = &leftover[j];
            if detection.confidence < self.config.new_track_thresh() {
                continue;
            }
            let mut track = Track::from_detection(detection);
            track.activate(&kf, self.next_id, frame);
            self.next_id += 1;
            fresh.push(track);
        }

        let max_lost = self.config.max_time_lost();
        for track in pool.iter_mut() {
            if track.state == TrackState::Lost
                && lost_before.contains(&track.track_id)
                && frame.saturating_sub(track.end_frame()) > max_lost
            {
                trace!(track_id = track.track_id, "Lost track expired");
                track.mark_removed();
            }
        }

        let mut tracked = Vec::new();
        let mut lost = Vec::new();
        for track in pool.into_iter().chain(unconfirmed).chain(fresh) {
            match track.state {
                TrackState::Tracked => tracked.push(track),
                TrackState::Lost => lost.push(track),
                TrackState::New | TrackState::Removed => {}
            }
        }
        let (tracked, lost) = remove_duplicates(tracked, lost);
        self.tracked = tracked;
        self.lost = lost;

        let mut output: Vec<TrackSnapshot> = self
            .tracked
            .iter()
            .filter(|t| t.is_activated)
            .map(|t| t.snapshot(frame))
            .collect();
        output.sort_by_key(|s| s.track_id);
        output
    }
}

fn boxes(tracks: &[Track]) -> Vec<BoundingBox> {
    tracks.iter().map(Track::bbox).collect()
}

fn det_boxes(detections: &[Detection]) -> Vec<BoundingBox> {
    detections.iter().map(|d| d.bbox).collect()
}

/// Drop overlapping tracked/lost pairs, keeping whichever has lived longer.
fn remove_duplicates(tracked: Vec<Track>, lost: Vec<Track>) -> (Vec<Track>, Vec<Track>) {
    let distances = iou_distance(&boxes(&tracked), &boxes(&lost));
    let mut drop_tracked = HashSet::new();
    let mut drop_lost = HashSet::new();
    for (p, row) in distances.iter().enumerate() {
        for (q, &d) in row.iter().enumerate() {
            if d >= DUPLICATE_THRESH {
                continue;
            }
            let age_p = tracked[p].frame_id.saturating_sub(tracked[p].start_frame);
            let age_q = lost[q].frame_id.saturating_sub(lost[q].start_frame);
            if age_p > age_q {
                drop_lost.insert(q);
            } else {
                drop_tracked.insert(p);
            }
        }
    }

    let tracked = tracked
        .into_iter()
        .enumerate()
        .filter_map(|(i, t)| (!drop_tracked.contains(&i)).then_some(t))
        .collect();
    let lost = lost
        .into_iter()
        .enumerate()
        .filter_map(|(i, t)| (!drop_lost.contains(&i)).then_some(t))
        .collect();
    (tracked, lost)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f64, y: f64, score: f64) -> Detection {
        Detection::new(BoundingBox::new(x, y, x + 24.0, y + 12.0), score, 1)
    }

    fn track(detection: Detection, id: u64, start: u64, last_seen: u64) -> Track {
        let kf = KalmanBoxFilter::new();
        let mut track = Track::from_detection(&detection);
        track.activate(&kf, id, start);
        if last_seen > start {
            track.update(&kf, &detection, last_seen);
        }
        track
    }

    #[test]
    fn test_duplicate_keeps_older_lost_track() {
        let mut lost = track(det(10.0, 10.0, 1.0), 1, 1, 5);
        lost.mark_lost();
        let tentative = track(det(11.0, 10.0, 1.0), 2, 6, 6);
        let elsewhere = track(det(300.0, 10.0, 1.0), 3, 6, 6);

        let (tracked, lost) = remove_duplicates(vec![tentative, elsewhere], vec![lost]);
        assert_eq!(tracked.iter().map(|t| t.track_id).collect::<Vec<_>>(), vec![3]);
        assert_eq!(lost.iter().map(|t| t.track_id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_duplicate_keeps_older_tracked_track() {
        let tracked = track(det(10.0, 10.0, 1.0), 1, 1, 8);
        let mut lost = track(det(11.0, 10.0, 1.0), 2, 4, 5);
        lost.mark_lost();

        let (tracked, lost) = remove_duplicates(vec![tracked], vec![lost]);
        assert_eq!(tracked.iter().map(|t| t.track_id).collect::<Vec<_>>(), vec![1]);
        assert!(lost.is_empty());
    }

    #[test]
    fn test_first_frame_tracks_confirmed_immediately() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        let out = tracker.update(&[det(10.0, 10.0, 1.0), det(200.0, 10.0, 1.0)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].track_id, 1);
        assert_eq!(out[1].track_id, 2);
        assert!(out.iter().all(|t| t.is_confirmed && t.frame == 1));
    }

    #[test]
    fn test_ids_stable_under_motion() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        for step in 0..20 {
            let dx = step as f64 * 2.0;
            let out = tracker.update(&[det(10.0 + dx, 10.0, 1.0), det(300.0 - dx, 100.0, 1.0)]);
            assert_eq!(out.len(), 2);
            assert_eq!(out[0].track_id, 1);
            assert_eq!(out[1].track_id, 2);
        }
        assert_eq!(tracker.frame_id(), 20);
    }

    #[test]
    fn test_later_track_needs_second_frame_to_confirm() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        tracker.update(&[det(10.0, 10.0, 1.0)]);

        let out = tracker.update(&[det(10.0, 10.0, 1.0), det(400.0, 400.0, 1.0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(tracker.tracked_count(), 2);

        let out = tracker.update(&[det(10.0, 10.0, 1.0), det(400.0, 400.0, 1.0)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].track_id, 2);
    }

    #[test]
    fn test_unconfirmed_track_removed_when_missed() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        tracker.update(&[det(10.0, 10.0, 1.0)]);
        tracker.update(&[det(10.0, 10.0, 1.0), det(400.0, 400.0, 1.0)]);
        tracker.update(&[det(10.0, 10.0, 1.0)]);
        assert_eq!(tracker.tracked_count(), 1);
        assert_eq!(tracker.lost_count(), 0);
        assert!(!tracker.is_alive(2));
    }

    #[test]
    fn test_lost_track_refound_with_same_id() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        tracker.update(&[det(10.0, 10.0, 1.0)]);
        tracker.update(&[det(10.0, 10.0, 1.0)]);

        let out = tracker.update(&[]);
        assert!(out.is_empty());
        assert_eq!(tracker.lost_count(), 1);

        let out = tracker.update(&[det(10.0, 10.0, 1.0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track_id, 1);
        assert_eq!(out[0].track_len, 0);
    }

    #[test]
    fn test_lost_track_expires() {
        let config = TrackerConfig::default();
        let max_lost = config.max_time_lost();
        let mut tracker = ByteTracker::new(config);
        tracker.update(&[det(10.0, 10.0, 1.0)]);
        for _ in 0..max_lost {
            tracker.update(&[]);
        }
        assert!(tracker.is_alive(1));
        tracker.update(&[]);
        assert!(!tracker.is_alive(1));

        let out = tracker.update(&[det(10.0, 10.0, 1.0)]);
        assert!(out.is_empty());
        assert_eq!(tracker.tracked_count(), 1);
    }

    #[test]
    fn test_low_score_detection_keeps_track_alive_but_never_starts_one() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        tracker.update(&[det(10.0, 10.0, 1.0)]);

        let out = tracker.update(&[det(11.0, 10.0, 0.3), det(400.0, 400.0, 0.3)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track_id, 1);
        assert_eq!(out[0].score, 0.3);
        assert_eq!(tracker.tracked_count(), 1);
    }

    #[test]
    fn test_scores_below_new_track_threshold_ignored() {
        let mut tracker = ByteTracker::new(TrackerConfig::default());
        // High enough to associate, too low to start a track
        let out = tracker.update(&[det(10.0, 10.0, 0.65), det(100.0, 10.0, 0.05)]);
        assert!(out.is_empty());
        assert_eq!(tracker.tracked_count(), 0);
    }
}
