//! Sensor stream synthesis
//!
//! Produces the parallel channels of one activity from its summary numbers. All
//! noise comes from a stream seeded by the activity id, so the same activity always
//! renders the same charts.
//!
//! Distance is integrated from the velocity channel and then rescaled so the last
//! sample equals the declared activity distance. The pace profile stays organic and
//! the total stays exact.

use crate::random::RandomStream;
use crate::types::{round_to, Activity, ActivityType, StreamSet};
use std::f64::consts::PI;

/// Fewest samples emitted for a non-empty activity
pub const MIN_SAMPLES: usize = 100;

/// Most samples emitted for any activity
pub const MAX_SAMPLES: usize = 1000;

/// Nominal seconds between samples before clamping
pub const SAMPLE_INTERVAL_SECS: u32 = 5;

/// Absolute grade limit in percent
pub const MAX_GRADE: f64 = 25.0;

/// Sample count for a moving time
pub fn sample_count(moving_time: u32) -> usize {
    ((moving_time / SAMPLE_INTERVAL_SECS) as usize).clamp(MIN_SAMPLES, MAX_SAMPLES)
}

/// Everything the synthesizer needs to know about one activity
#[derive(Debug, Clone)]
pub struct StreamRequest<'a> {
    pub seed: &'a str,
    pub activity_type: ActivityType,
    pub moving_time: u32,
    pub distance: f64,
    pub elevation_gain: f64,
    pub average_speed: f64,
    pub average_hr: Option<f64>,
    pub average_watts: Option<f64>,
    pub is_hard: bool,
    pub route: Option<&'a [[f64; 2]]>,
}

impl<'a> StreamRequest<'a> {
    pub fn from_activity(
        activity: &'a Activity,
        route: Option<&'a [[f64; 2]]>,
        is_hard: bool,
    ) -> Self {
        Self {
            seed: &activity.id,
            activity_type: activity.activity_type,
            moving_time: activity.moving_time,
            distance: activity.distance,
            elevation_gain: activity.total_elevation_gain,
            average_speed: activity.average_speed,
            average_hr: activity.average_heartrate.map(f64::from),
            average_watts: activity.icu_average_watts.map(f64::from),
            is_hard,
            route,
        }
    }
}

/// Cadence band `(baseline, min, max)` for a sport
fn cadence_band(activity_type: ActivityType) -> Option<(f64, f64, f64)> {
    match activity_type {
        ActivityType::Ride | ActivityType::VirtualRide => Some((86.0, 60.0, 110.0)),
        ActivityType::Run | ActivityType::TrailRun => Some((172.0, 150.0, 195.0)),
        ActivityType::Hike | ActivityType::Walk => Some((105.0, 90.0, 125.0)),
        ActivityType::Swim | ActivityType::WeightTraining => None,
    }
}

/// Oscillating effort phase in `[-1, 1]`: many short reps when hard, slow surges otherwise
fn interval_phase(fraction: f64, is_hard: bool) -> f64 {
    let reps = if is_hard { 6.0 } else { 2.0 };
    (2.0 * PI * fraction * reps).sin()
}

/// Generate every channel the activity supports
pub fn synthesize(request: &StreamRequest<'_>) -> StreamSet {
    if request.moving_time == 0 {
        return StreamSet::default();
    }

    let mut rng = RandomStream::new(&format!("{}-streams", request.seed));
    let n = sample_count(request.moving_time);
    let dt = f64::from(request.moving_time) / n as f64;
    let fractions: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();

    let time: Vec<u32> = (0..n).map(|i| (i as f64 * dt).floor() as u32).collect();

    let latlng = request
        .route
        .filter(|coords| !coords.is_empty())
        .map(|coords| resample_route(coords, &fractions));

    let altitude = synthesize_altitude(request, &fractions, &mut rng);
    let heartrate = request
        .average_hr
        .map(|hr| synthesize_heartrate(hr, request, &fractions, &mut rng));
    let watts = request
        .average_watts
        .filter(|_| request.activity_type.is_ride())
        .map(|watts| synthesize_watts(watts, request.is_hard, &fractions, &mut rng));
    let cadence = cadence_band(request.activity_type)
        .map(|band| synthesize_cadence(band, &fractions, &mut rng));

    let moving = request.distance > 0.0 && request.average_speed > 0.0;
    let velocity = if moving {
        Some(synthesize_velocity(request, altitude.as_deref(), &mut rng))
    } else {
        None
    };
    let distance = velocity
        .as_deref()
        .map(|v| integrate_distance(v, dt, request.distance));
    let grade = match (&altitude, moving) {
        (Some(alt), true) => Some(grade_from_altitude(alt, request.distance)),
        _ => None,
    };

    StreamSet {
        time,
        latlng,
        heartrate,
        watts,
        fixed_altitude: altitude.clone(),
        altitude,
        cadence,
        velocity_smooth: velocity,
        distance,
        grade_smooth: grade,
    }
}

/// Channel names [`synthesize`] will emit for a request, without generating samples
pub fn available_types(request: &StreamRequest<'_>) -> Vec<String> {
    if request.moving_time == 0 {
        return vec!["time".to_string()];
    }

    let has_route = request.route.map_or(false, |coords| !coords.is_empty());
    let has_altitude = !matches!(
        request.activity_type,
        ActivityType::Swim | ActivityType::WeightTraining
    );
    let moving = request.distance > 0.0 && request.average_speed > 0.0;

    let channels = [
        ("time", true),
        ("latlng", has_route),
        ("heartrate", request.average_hr.is_some()),
        ("watts", request.average_watts.is_some() && request.activity_type.is_ride()),
        ("altitude", has_altitude),
        ("fixed_altitude", has_altitude),
        ("cadence", cadence_band(request.activity_type).is_some()),
        ("velocity_smooth", moving),
        ("distance", moving),
        ("grade_smooth", has_altitude && moving),
    ];
    channels
        .iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Nearest-index mapping from time fraction to coordinate fraction
fn resample_route(coords: &[[f64; 2]], fractions: &[f64]) -> Vec<[f64; 2]> {
    let last = coords.len() - 1;
    fractions
        .iter()
        .map(|f| coords[((f * last as f64).round() as usize).min(last)])
        .collect()
}

fn synthesize_altitude(
    request: &StreamRequest<'_>,
    fractions: &[f64],
    rng: &mut RandomStream,
) -> Option<Vec<f64>> {
    if matches!(
        request.activity_type,
        ActivityType::Swim | ActivityType::WeightTraining
    ) {
        return None;
    }

    let base = rng.range(20.0, 180.0);
    let phases = [
        rng.range(0.0, 2.0 * PI),
        rng.range(0.0, 2.0 * PI),
        rng.range(0.0, 2.0 * PI),
    ];
    let profile: Vec<f64> = fractions
        .iter()
        .map(|&x| {
            0.6 * (2.0 * PI * x + phases[0]).sin()
                + 0.3 * (2.0 * PI * x * 3.0 + phases[1]).sin()
                + 0.1 * (2.0 * PI * x * 7.0 + phases[2]).sin()
                + rng.jitter(0.01)
        })
        .collect();

    let raw_gain: f64 = profile
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).max(0.0))
        .sum();
    let scale = if raw_gain > 0.0 && request.elevation_gain > 0.0 {
        request.elevation_gain / raw_gain
    } else {
        0.0
    };
    let floor = profile.iter().copied().fold(f64::INFINITY, f64::min);

    Some(
        profile
            .iter()
            .map(|p| round_to(base + (p - floor) * scale, 1))
            .collect(),
    )
}

fn synthesize_heartrate(
    average_hr: f64,
    request: &StreamRequest<'_>,
    fractions: &[f64],
    rng: &mut RandomStream,
) -> Vec<f64> {
    let surges = request.average_watts.is_some() && request.activity_type.is_ride();
    fractions
        .iter()
        .map(|&x| {
            let warmup = if x < 0.2 { 0.8 + x } else { 1.0 };
            let drift = 6.0 * x - 3.0;
            let surge = if surges {
                interval_phase(x, request.is_hard) * if request.is_hard { 8.0 } else { 3.0 }
            } else {
                0.0
            };
            (average_hr * warmup + drift + surge + rng.jitter(3.0))
                .clamp(80.0, 200.0)
                .round()
        })
        .collect()
}

fn synthesize_watts(
    average_watts: f64,
    is_hard: bool,
    fractions: &[f64],
    rng: &mut RandomStream,
) -> Vec<f64> {
    let amplitude = if is_hard { 0.30 } else { 0.08 };
    fractions
        .iter()
        .map(|&x| {
            (average_watts * (1.0 + amplitude * interval_phase(x, is_hard))
                + rng.jitter(average_watts * 0.06))
            .max(0.0)
            .round()
        })
        .collect()
}

fn synthesize_cadence(
    (baseline, min, max): (f64, f64, f64),
    fractions: &[f64],
    rng: &mut RandomStream,
) -> Vec<f64> {
    fractions
        .iter()
        .map(|&x| {
            (baseline + 3.0 * (2.0 * PI * x * 5.0).sin() + rng.jitter(2.5))
                .clamp(min, max)
                .round()
        })
        .collect()
}

/// Average speed slowed on climbs and quickened on descents
fn synthesize_velocity(
    request: &StreamRequest<'_>,
    altitude: Option<&[f64]>,
    rng: &mut RandomStream,
) -> Vec<f64> {
    let n = sample_count(request.moving_time);
    let step = request.distance / n as f64;
    let floor = (request.average_speed * 0.2).max(0.1);

    (0..n)
        .map(|i| {
            let gradient = match altitude {
                Some(alt) if i > 0 && step > 0.0 => (alt[i] - alt[i - 1]) / step,
                _ => 0.0,
            };
            let hill = (1.0 - 3.0 * gradient).clamp(0.4, 1.6);
            let v = request.average_speed * hill * (1.0 + rng.jitter(0.06));
            round_to(v.max(floor), 2)
        })
        .collect()
}

/// Trapezoidal integration of velocity, rescaled to end exactly at `total`
pub fn integrate_distance(velocity: &[f64], dt: f64, total: f64) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(velocity.len());
    let mut acc = 0.0;
    for (i, v) in velocity.iter().enumerate() {
        if i > 0 {
            acc += (v + velocity[i - 1]) / 2.0 * dt;
        }
        cumulative.push(acc);
    }

    let scale = if acc > 0.0 { total / acc } else { 0.0 };
    let mut distance: Vec<f64> = cumulative.iter().map(|d| round_to(d * scale, 1)).collect();
    if let Some(last) = distance.last_mut() {
        *last = total;
    }
    distance
}

/// Percent grade from altitude over the nominal horizontal step
pub fn grade_from_altitude(altitude: &[f64], total_distance: f64) -> Vec<f64> {
    if altitude.is_empty() {
        return Vec::new();
    }
    let step = total_distance / altitude.len() as f64;
    let mut grade = Vec::with_capacity(altitude.len());
    grade.push(0.0);
    for pair in altitude.windows(2) {
        let g = if step > 0.0 {
            (pair[1] - pair[0]) / step * 100.0
        } else {
            0.0
        };
        grade.push(round_to(g.clamp(-MAX_GRADE, MAX_GRADE), 1));
    }
    grade
}
