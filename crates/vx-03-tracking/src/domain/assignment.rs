//! Optimal linear assignment with a cost limit.
//!
//! Solves the rectangular problem by padding it to a square one where
//! leaving a row or a column unassigned costs half the limit. A pair is
//! therefore only matched when its cost does not exceed the limit.

use shared_types::BoundingBox;

/// Stand-in for forbidden cells; costs here are IoU distances in `[0, 1]`.
const FORBIDDEN: f64 = 1.0e6;

/// Outcome of [`linear_assignment`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    /// `(row, column)` pairs, sorted by row.
    pub matches: Vec<(usize, usize)>,
    pub unmatched_rows: Vec<usize>,
    pub unmatched_cols: Vec<usize>,
}

/// Assign rows to columns minimising total cost, never pairing above `cost_limit`.
pub fn linear_assignment(cost: &[Vec<f64>], cols: usize, cost_limit: f64) -> Assignment {
    let rows = cost.len();
    if rows == 0 || cols == 0 {
        return Assignment {
            matches: Vec::new(),
            unmatched_rows: (0..rows).collect(),
            unmatched_cols: (0..cols).collect(),
        };
    }

    let n = rows + cols;
    let half = cost_limit / 2.0;
    let mut square = vec![vec![0.0; n]; n];
    for (i, row) in square.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = match (i < rows, j < cols) {
                (true, true) => cost[i][j],
                (true, false) => {
                    if j - cols == i {
                        half
                    } else {
                        FORBIDDEN
                    }
                }
                (false, true) => {
                    if i - rows == j {
                        half
                    } else {
                        FORBIDDEN
                    }
                }
                (false, false) => 0.0,
            };
        }
    }

    let row_to_col = hungarian(&square);

    let mut result = Assignment::default();
    let mut col_used = vec![false; cols];
    for (i, &j) in row_to_col.iter().enumerate().take(rows) {
        if j < cols && cost[i][j] <= cost_limit {
            result.matches.push((i, j));
            col_used[j] = true;
        } else {
            result.unmatched_rows.push(i);
        }
    }
    result.unmatched_cols = (0..cols).filter(|&j| !col_used[j]).collect();
    result
}

/// Minimum-cost perfect matching on a square matrix (row → column).
fn hungarian(a: &[Vec<f64>]) -> Vec<usize> {
    let n = a.len();
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; n + 1];
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = a[i0 - 1][j - 1] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![0; n];
    for j in 1..=n {
        if p[j] > 0 {
            row_to_col[p[j] - 1] = j - 1;
        }
    }
    row_to_col
}

/// `1 - IoU` for every (track box, detection box) pair.
pub fn iou_distance(tracks: &[BoundingBox], detections: &[BoundingBox]) -> Vec<Vec<f64>> {
    tracks
        .iter()
        .map(|t| detections.iter().map(|d| 1.0 - t.iou(d)).collect())
        .collect()
}

/// Blend IoU similarity with detection confidence: `1 - (1 - d) * score`.
pub fn fuse_score(mut cost: Vec<Vec<f64>>, scores: &[f64]) -> Vec<Vec<f64>> {
    for row in cost.iter_mut() {
        for (cell, score) in row.iter_mut().zip(scores) {
            *cell = 1.0 - (1.0 - *cell) * score;
        }
    }
    cost
}
