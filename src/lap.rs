//! Dense Jonker–Volgenant linear assignment solver.
//!
//! Ported from the reference `lapjv` three-phase algorithm (column
//! reduction + reduction transfer, augmenting row reduction, shortest
//! augmenting path) onto safe Rust over flat row-major `Vec<f64>` cost
//! matrices. The phase split, tie-breaking policy, and the
//! `rr_cnt < current*n` runaway guard all mirror the reference
//! implementation exactly; only the memory-unsafety (raw pointers,
//! `malloc`/`free`) is replaced with ordinary `Vec`s.

use crate::error::TrackerError;

/// Cost assigned to a padding row/column introduced to square up a
/// rectangular assignment problem. Any real pairing a caller cares about
/// is expected to cost far less than this.
pub const NO_MATCH_SENTINEL: f64 = 1.0e5;

const LARGE: f64 = 1.0e6;

/// Solves the square assignment problem `n x n` (`cost` is row-major,
/// length `n*n`), returning `(x, y)` with `x[i] == j <=> y[j] == i`,
/// minimizing `sum(cost[i, x[i]])`.
pub fn lapjv(n: usize, cost: &[f64]) -> Result<(Vec<usize>, Vec<usize>), TrackerError> {
    if n == 0 {
        return Ok((Vec::new(), Vec::new()));
    }
    debug_assert_eq!(cost.len(), n * n);

    let mut x = vec![-1isize; n];
    let mut y = vec![-1isize; n];
    let mut v = vec![0.0f64; n];

    let mut free_rows = ccrrt_dense(n, cost, &mut x, &mut y, &mut v);

    let mut pass = 0;
    while !free_rows.is_empty() && pass < 2 {
        free_rows = carr_dense(n, cost, free_rows, &mut x, &mut y, &mut v);
        pass += 1;
    }

    if !free_rows.is_empty() {
        ca_dense(n, cost, &free_rows, &mut x, &mut y, &mut v)?;
    }

    let x = x.into_iter().map(|j| j as usize).collect();
    let y = y.into_iter().map(|i| i as usize).collect();
    Ok((x, y))
}

/// Solves an `rows x cols` assignment by padding to a square matrix with
/// [`NO_MATCH_SENTINEL`], then dropping any pairing whose real cost
/// exceeds `threshold` (spec.md §4.1's "sentinel such that any real match
/// beats it" convention).
pub fn rectangular_assign(
    rows: usize,
    cols: usize,
    cost: &[Vec<f64>],
    threshold: f64,
) -> Result<(Vec<(usize, usize)>, Vec<usize>, Vec<usize>), TrackerError> {
    if rows == 0 || cols == 0 {
        return Ok((Vec::new(), (0..rows).collect(), (0..cols).collect()));
    }

    let n = rows.max(cols);
    let mut flat = vec![NO_MATCH_SENTINEL; n * n];
    for (i, row) in cost.iter().enumerate().take(rows) {
        flat[i * n..i * n + cols].copy_from_slice(&row[..cols]);
    }

    let (x, y) = lapjv(n, &flat)?;

    let mut matches = Vec::new();
    let mut unmatched_rows = Vec::new();
    for i in 0..rows {
        let j = x[i];
        if j < cols && cost[i][j] <= threshold {
            matches.push((i, j));
        } else {
            unmatched_rows.push(i);
        }
    }

    let mut unmatched_cols = Vec::new();
    for j in 0..cols {
        let i = y[j];
        if i >= rows || cost[i][j] > threshold {
            unmatched_cols.push(j);
        }
    }

    Ok((matches, unmatched_rows, unmatched_cols))
}

/// Column reduction + reduction transfer. Initializes the dual `v` and a
/// tentative assignment, returning the rows left unassigned.
fn ccrrt_dense(n: usize, cost: &[f64], x: &mut [isize], y: &mut [isize], v: &mut [f64]) -> Vec<usize> {
    for j in 0..n {
        x[j] = -1;
        v[j] = LARGE;
        y[j] = 0;
    }

    for i in 0..n {
        for j in 0..n {
            let c = cost[i * n + j];
            if c < v[j] {
                v[j] = c;
                y[j] = i as isize;
            }
        }
    }

    let mut unique = vec![true; n];
    for j in (0..n).rev() {
        let i = y[j] as usize;
        if x[i] < 0 {
            x[i] = j as isize;
        } else {
            unique[i] = false;
            y[j] = -1;
        }
    }

    let mut free_rows = Vec::new();
    for i in 0..n {
        if x[i] < 0 {
            free_rows.push(i);
        } else if unique[i] {
            let j = x[i] as usize;
            let mut min = LARGE;
            for (j2, &v_j2) in v.iter().enumerate() {
                if j2 == j {
                    continue;
                }
                let c = cost[i * n + j2] - v_j2;
                if c < min {
                    min = c;
                }
            }
            v[j] -= min;
        }
    }

    free_rows
}

/// Augmenting row reduction: up to two passes over the free-row list,
/// tightening `v` via the gap between each free row's two smallest
/// reduced costs.
fn carr_dense(
    n: usize,
    cost: &[f64],
    free_rows: Vec<usize>,
    x: &mut [isize],
    y: &mut [isize],
    v: &mut [f64],
) -> Vec<usize> {
    let n_free_rows = free_rows.len();
    let mut current = 0usize;
    let mut new_free_rows = Vec::new();
    let mut requeued = free_rows;
    let mut rr_cnt = 0usize;

    while current < n_free_rows {
        rr_cnt += 1;
        let free_i = requeued[current];
        current += 1;

        let mut j1 = 0usize;
        let mut v1 = cost[free_i * n] - v[0];
        let mut j2: isize = -1;
        let mut v2 = LARGE;

        for j in 1..n {
            let c = cost[free_i * n + j] - v[j];
            if c < v2 {
                if c >= v1 {
                    v2 = c;
                    j2 = j as isize;
                } else {
                    v2 = v1;
                    v1 = c;
                    j2 = j1 as isize;
                    j1 = j;
                }
            }
        }

        let mut i0 = y[j1];
        let v1_new = v[j1] - (v2 - v1);
        let v1_lowers = v1_new < v[j1];

        if rr_cnt < current * n {
            if v1_lowers {
                v[j1] = v1_new;
            } else if i0 >= 0 && j2 >= 0 {
                j1 = j2 as usize;
                i0 = y[j2 as usize];
            }
            if i0 >= 0 {
                if v1_lowers {
                    current -= 1;
                    requeued[current] = i0 as usize;
                } else {
                    new_free_rows.push(i0 as usize);
                }
            }
        } else if i0 >= 0 {
            new_free_rows.push(i0 as usize);
        }

        x[free_i] = j1 as isize;
        y[j1] = free_i as isize;
    }

    new_free_rows
}

/// Finds and moves the minimum-cost column(s) at or after `lo` to the
/// front of the `[lo, hi)` scan band, preferring the lower index on ties.
fn find_dense(n: usize, lo: usize, d: &[f64], cols: &mut [usize]) -> usize {
    let mut hi = lo + 1;
    let mut mind = d[cols[lo]];

    for k in hi..n {
        let j = cols[k];
        if d[j] <= mind {
            if d[j] < mind {
                hi = lo;
                mind = d[j];
            }
            cols.swap(k, hi);
            hi += 1;
        }
    }

    hi
}

/// Relaxes tentative distances for columns outside `[lo, hi)` given the
/// row reachable through column `cols[lo]`, returning the first newly
/// discovered unassigned column, if any.
#[allow(clippy::too_many_arguments)]
fn scan_dense(
    n: usize,
    cost: &[f64],
    lo: &mut usize,
    hi: &mut usize,
    d: &mut [f64],
    cols: &mut [usize],
    pred: &mut [isize],
    y: &[isize],
    v: &[f64],
) -> isize {
    while *lo != *hi {
        let j = cols[*lo];
        *lo += 1;
        let i = y[j] as usize;
        let mind = d[j];
        let h = cost[i * n + j] - v[j] - mind;

        for k in *hi..n {
            let j2 = cols[k];
            let cred_ij = cost[i * n + j2] - v[j2] - h;
            if cred_ij < d[j2] {
                d[j2] = cred_ij;
                pred[j2] = i as isize;
                if cred_ij == mind {
                    if y[j2] < 0 {
                        return j2 as isize;
                    }
                    cols.swap(k, *hi);
                    *hi += 1;
                }
            }
        }
    }
    -1
}

/// Shortest augmenting path search (Dijkstra-like) from `start_i`, returning
/// the free column reached and tightening `v` along the way.
fn find_path_dense(
    n: usize,
    cost: &[f64],
    start_i: usize,
    y: &[isize],
    v: &mut [f64],
    pred: &mut [isize],
) -> isize {
    let mut lo = 0usize;
    let mut hi = 0usize;
    let mut final_j: isize = -1;
    let mut n_ready = 0usize;
    let mut cols: Vec<usize> = (0..n).collect();
    let mut d: Vec<f64> = (0..n).map(|j| cost[start_i * n + j] - v[j]).collect();
    pred.iter_mut().for_each(|p| *p = start_i as isize);

    while final_j == -1 {
        if lo == hi {
            n_ready = lo;
            hi = find_dense(n, lo, &d, &mut cols);
            for &j in &cols[lo..hi] {
                if y[j] < 0 {
                    final_j = j as isize;
                }
            }
        }
        if final_j == -1 {
            final_j = scan_dense(n, cost, &mut lo, &mut hi, &mut d, &mut cols, pred, y, v);
        }
    }

    let mind = d[cols[lo]];
    for &j in &cols[..n_ready] {
        v[j] += d[j] - mind;
    }

    final_j
}

/// Augmenting path phase: for each remaining free row, finds a shortest
/// augmenting path to a free column and flips the alternating path along it.
fn ca_dense(
    n: usize,
    cost: &[f64],
    free_rows: &[usize],
    x: &mut [isize],
    y: &mut [isize],
    v: &mut [f64],
) -> Result<(), TrackerError> {
    let mut pred = vec![0isize; n];

    for &free_row in free_rows {
        let free_i = free_row as isize;
        let mut i: isize = -1;
        let mut j = find_path_dense(n, cost, free_row, y, v, &mut pred);
        if j < 0 || j as usize >= n {
            return Err(TrackerError::LapDidNotConverge { n });
        }

        let mut steps = 0usize;
        while i != free_i {
            i = pred[j as usize];
            y[j as usize] = i;
            let tmp = j;
            j = x[i as usize];
            x[i as usize] = tmp;

            steps += 1;
            if steps >= n {
                return Err(TrackerError::LapDidNotConverge { n });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_cost(n: usize) -> Vec<f64> {
        let mut c = vec![1.0; n * n];
        for i in 0..n {
            c[i * n + i] = 0.0;
        }
        c
    }

    fn anti_diagonal_cost(n: usize) -> Vec<f64> {
        let mut c = vec![1.0; n * n];
        for i in 0..n {
            c[i * n + (n - 1 - i)] = 0.0;
        }
        c
    }

    #[test]
    fn test_lap_identity_cost_matches_identity_assignment() {
        let n = 4;
        let (x, y) = lapjv(n, &identity_cost(n)).unwrap();
        assert_eq!(x, vec![0, 1, 2, 3]);
        assert_eq!(y, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_lap_anti_diagonal_cost_reverses_assignment() {
        let n = 4;
        let (x, _y) = lapjv(n, &anti_diagonal_cost(n)).unwrap();
        assert_eq!(x, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_lap_assignment_is_consistent() {
        let n = 5;
        let cost = anti_diagonal_cost(n);
        let (x, y) = lapjv(n, &cost).unwrap();
        for i in 0..n {
            assert_eq!(y[x[i]], i);
        }
    }

    #[test]
    fn test_lap_empty_is_trivial() {
        let (x, y) = lapjv(0, &[]).unwrap();
        assert!(x.is_empty());
        assert!(y.is_empty());
    }

    #[test]
    fn test_lap_single_element() {
        let (x, y) = lapjv(1, &[42.0]).unwrap();
        assert_eq!(x, vec![0]);
        assert_eq!(y, vec![0]);
    }

    #[test]
    fn test_rectangular_assign_drops_pairs_above_threshold() {
        let cost = vec![vec![0.1, 0.9], vec![0.9, 0.2]];
        let (matches, unmatched_rows, unmatched_cols) =
            rectangular_assign(2, 2, &cost, 0.5).unwrap();
        assert_eq!(matches.len(), 2);
        assert!(unmatched_rows.is_empty());
        assert!(unmatched_cols.is_empty());
    }

    #[test]
    fn test_rectangular_assign_handles_empty_sides() {
        let (matches, unmatched_rows, unmatched_cols) =
            rectangular_assign(0, 3, &[], 0.5).unwrap();
        assert!(matches.is_empty());
        assert!(unmatched_rows.is_empty());
        assert_eq!(unmatched_cols, vec![0, 1, 2]);
    }

    #[test]
    fn test_rectangular_assign_more_rows_than_cols() {
        let cost = vec![vec![0.1], vec![0.2], vec![0.9]];
        let (matches, unmatched_rows, _unmatched_cols) =
            rectangular_assign(3, 1, &cost, 0.5).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0], (0, 0));
        assert_eq!(unmatched_rows.len(), 2);
    }
}

// Property tests exercising optimality (invariant 4) and consistency
// (invariant 5) against randomly generated cost matrices live in
// `tests/lap_properties.rs`.
