//! Midnight rollover handling for departure tables.
//!
//! Some night lines publish their hours in service order, e.g.
//! `22, 23, 0, 1`. Departure lookups compare hours numerically, so tables
//! that wrap are rotated once to read `0, 1, 22, 23`.

use crate::domain::{Stop, Times};

/// Rotate a stop's tables so its hours ascend.
///
/// The pivot is the first `23 -> 0` step in the hour table; every non-empty
/// table is rotated at the same index. Stops without such a step are
/// returned unchanged, which also makes the operation idempotent.
pub fn normalize(stop: Stop) -> Stop {
    let Some(pivot) = rollover_pivot(&stop.times.hours) else {
        return stop;
    };

    Stop {
        times: rotate_times(stop.times, pivot),
        ..stop
    }
}

/// Normalize every stop in place.
pub fn normalize_all(stops: &mut [Stop]) {
    for stop in stops.iter_mut() {
        if let Some(pivot) = rollover_pivot(&stop.times.hours) {
            let times = std::mem::take(&mut stop.times);
            stop.times = rotate_times(times, pivot);
        }
    }
}

/// Index of the first hour following a `23 -> 0` step.
fn rollover_pivot(hours: &[u32]) -> Option<usize> {
    hours
        .windows(2)
        .position(|pair| pair[0] == 23 && pair[1] == 0)
        .map(|j| j + 1)
}

fn rotate_times(mut times: Times, pivot: usize) -> Times {
    times.hours.rotate_left(pivot);
    for cells in [&mut times.work, &mut times.saturday, &mut times.holiday] {
        if !cells.is_empty() {
            cells.rotate_left(pivot);
        }
    }
    times
}
