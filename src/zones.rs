//! Zone time estimation
//!
//! Splits an activity's moving time across effort zones with a fixed weight table
//! per zone model. Buckets are rounded individually and the rounding residue is
//! folded into the largest bucket, so the total always equals the moving time.

use crate::types::ZoneTime;

/// Power zone weights (Coggan 7-zone model)
pub const POWER_ZONE_WEIGHTS: [f64; 7] = [0.10, 0.35, 0.25, 0.15, 0.10, 0.04, 0.01];

/// Heart rate zone weights (5-zone model)
pub const HR_ZONE_WEIGHTS: [f64; 5] = [0.15, 0.40, 0.25, 0.15, 0.05];

/// Weight table for a zone count; unknown models split evenly
fn weights_for(zone_count: usize) -> Vec<f64> {
    match zone_count {
        7 => POWER_ZONE_WEIGHTS.to_vec(),
        5 => HR_ZONE_WEIGHTS.to_vec(),
        0 => Vec::new(),
        n => vec![1.0 / n as f64; n],
    }
}

/// Seconds per zone, summing exactly to `moving_time`
pub fn estimate_seconds(moving_time: u32, zone_count: usize) -> Vec<u32> {
    let weights = weights_for(zone_count);
    if weights.is_empty() {
        return Vec::new();
    }

    let mut seconds: Vec<i64> = weights
        .iter()
        .map(|w| (w * f64::from(moving_time)).round() as i64)
        .collect();

    let residue = i64::from(moving_time) - seconds.iter().sum::<i64>();
    if residue != 0 {
        let largest = seconds
            .iter()
            .enumerate()
            .max_by_key(|(_, s)| **s)
            .map_or(0, |(i, _)| i);
        seconds[largest] += residue;
    }

    seconds.into_iter().map(|s| s.max(0) as u32).collect()
}

/// Named zone breakdown (`Z1`, `Z2`, ...)
pub fn estimate(moving_time: u32, zone_count: usize) -> Vec<ZoneTime> {
    estimate_seconds(moving_time, zone_count)
        .into_iter()
        .enumerate()
        .map(|(i, secs)| ZoneTime {
            id: format!("Z{}", i + 1),
            secs,
        })
        .collect()
}
