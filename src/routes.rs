//! Route library and route assignment
//!
//! Routes are immutable coordinate tracks keyed by id. An activity is drawn on a
//! route whose type is acceptable for its sport and whose length is close to the
//! activity distance. Outdoor activities that find no route get a seeded synthetic
//! loop instead, so every GPS-bearing activity has a track.

use crate::random::RandomStream;
use crate::types::ActivityType;
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Meters per degree of latitude
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Home area used for synthetic fallback loops
pub const HOME_CENTER: [f64; 2] = [-41.2865, 174.7762];

/// Coordinate track with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTemplate {
    pub id: String,
    #[serde(rename = "type")]
    pub route_type: ActivityType,
    /// `[lat, lng]` in travel order
    pub coordinates: Vec<[f64; 2]>,
    /// Meters along the track
    pub distance: f64,
    /// Meters climbed
    pub elevation: f64,
    pub region: String,
}

/// Start/end position and locality derived from a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLocation {
    pub start_latlng: Option<[f64; 2]>,
    pub end_latlng: Option<[f64; 2]>,
    pub locality: String,
}

impl RouteTemplate {
    pub fn location(&self) -> RouteLocation {
        RouteLocation {
            start_latlng: self.coordinates.first().copied(),
            end_latlng: self.coordinates.last().copied(),
            locality: self.region.clone(),
        }
    }
}

/// Great-circle length of a track in meters
pub fn track_length(coordinates: &[[f64; 2]]) -> f64 {
    coordinates
        .windows(2)
        .map(|pair| {
            let a = Point::new(pair[0][1], pair[0][0]);
            let b = Point::new(pair[1][1], pair[1][0]);
            Haversine::distance(a, b)
        })
        .sum()
}

/// Track shapes the generator can lay out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Closed loop with `lobes` bulges
    Loop { lobes: u32 },
    /// Out to a turnaround and back on the same line
    OutAndBack,
}

/// Offset `center` by metric `(north, east)` meters
fn offset(center: [f64; 2], north: f64, east: f64) -> [f64; 2] {
    let lat = center[0] + north / METERS_PER_DEGREE;
    let lng = center[1] + east / (METERS_PER_DEGREE * center[0].to_radians().cos().max(0.01));
    [lat, lng]
}

/// Lay out a track of roughly `target_distance` meters. Deterministic in `seed`.
fn layout(seed: &str, center: [f64; 2], target_distance: f64, shape: Shape) -> Vec<[f64; 2]> {
    let mut rng = RandomStream::new(&format!("{seed}-shape"));
    let points = 120usize;

    // Metric offsets first, rescaled to the target length below
    let offsets: Vec<(f64, f64)> = match shape {
        Shape::Loop { lobes } => {
            let radius = target_distance / (2.0 * PI);
            let amplitude = rng.range(0.08, 0.22);
            let phase = rng.range(0.0, 2.0 * PI);
            let rotation = rng.range(0.0, 2.0 * PI);
            let mut ring: Vec<(f64, f64)> = (0..points)
                .map(|k| {
                    let theta = 2.0 * PI * k as f64 / points as f64;
                    let r = radius * (1.0 + amplitude * (f64::from(lobes) * theta + phase).sin());
                    let angle = theta + rotation;
                    (r * angle.cos(), r * angle.sin())
                })
                .collect();
            ring.push(ring[0]);
            ring
        }
        Shape::OutAndBack => {
            let half = points / 2;
            let leg = target_distance / 2.0;
            let heading = rng.range(0.0, 2.0 * PI);
            let mut outbound: Vec<(f64, f64)> = (0..=half)
                .map(|k| {
                    let along = leg * k as f64 / half as f64;
                    let lateral =
                        (along / leg * 3.0 * PI).sin() * leg * 0.04 + rng.jitter(leg * 0.005);
                    (
                        along * heading.cos() - lateral * heading.sin(),
                        along * heading.sin() + lateral * heading.cos(),
                    )
                })
                .collect();
            if let Some(first) = outbound.first_mut() {
                *first = (0.0, 0.0);
            }
            let back: Vec<(f64, f64)> = outbound.iter().rev().skip(1).copied().collect();
            outbound.extend(back);
            outbound
        }
    };

    let raw: Vec<[f64; 2]> = offsets
        .iter()
        .map(|&(north, east)| offset(center, north, east))
        .collect();
    let measured = track_length(&raw);
    if measured <= 0.0 {
        return raw;
    }

    let scale = target_distance / measured;
    offsets
        .iter()
        .map(|&(north, east)| offset(center, north * scale, east * scale))
        .collect()
}

fn build_route(
    id: &str,
    route_type: ActivityType,
    region: &str,
    center: [f64; 2],
    distance: f64,
    elevation: f64,
    shape: Shape,
) -> RouteTemplate {
    let coordinates = layout(id, center, distance, shape);
    RouteTemplate {
        id: id.to_string(),
        route_type,
        distance: track_length(&coordinates).round(),
        coordinates,
        elevation,
        region: region.to_string(),
    }
}

/// Seeded circular fallback route sized to an activity
pub fn synthetic_loop(seed: &str, route_type: ActivityType, distance: f64) -> RouteTemplate {
    let mut rng = RandomStream::new(&format!("{seed}-loop-center"));
    let center = offset(HOME_CENTER, rng.jitter(4_000.0), rng.jitter(4_000.0));
    let lobes = rng.int_range(2, 5) as u32;
    let coordinates = layout(seed, center, distance.max(500.0), Shape::Loop { lobes });
    RouteTemplate {
        id: format!("synthetic-{seed}"),
        route_type,
        distance: track_length(&coordinates).round(),
        coordinates,
        elevation: 0.0,
        region: "Wellington".to_string(),
    }
}

/// Route library with distance-band matching
#[derive(Debug, Clone)]
pub struct RouteAssigner {
    routes: Vec<RouteTemplate>,
    band: [f64; 2],
}

impl Default for RouteAssigner {
    fn default() -> Self {
        Self::builtin([0.5, 2.0])
    }
}

impl RouteAssigner {
    /// Assigner over an explicit route set
    pub fn new(routes: Vec<RouteTemplate>, band: [f64; 2]) -> Self {
        Self { routes, band }
    }

    /// The built-in demo route library
    pub fn builtin(band: [f64; 2]) -> Self {
        use ActivityType::*;
        let routes = vec![
            build_route(
                "coastal-loop",
                Ride,
                "Wellington",
                [-41.31, 174.80],
                46_000.0,
                420.0,
                Shape::Loop { lobes: 3 },
            ),
            build_route(
                "hill-country-century",
                Ride,
                "Wairarapa",
                [-41.12, 175.40],
                98_000.0,
                1_150.0,
                Shape::Loop { lobes: 4 },
            ),
            build_route(
                "summit-climb",
                Ride,
                "Makara",
                [-41.25, 174.70],
                36_000.0,
                880.0,
                Shape::OutAndBack,
            ),
            build_route(
                "virtual-volcano",
                VirtualRide,
                "Watopia",
                [-11.64, 166.95],
                30_000.0,
                240.0,
                Shape::Loop { lobes: 2 },
            ),
            build_route(
                "virtual-flat",
                VirtualRide,
                "Watopia",
                [-11.66, 166.94],
                40_000.0,
                120.0,
                Shape::Loop { lobes: 5 },
            ),
            build_route(
                "riverside-run",
                Run,
                "Lower Hutt",
                [-41.21, 174.90],
                8_000.0,
                40.0,
                Shape::OutAndBack,
            ),
            build_route(
                "harbour-half",
                Run,
                "Wellington",
                HOME_CENTER,
                21_100.0,
                150.0,
                Shape::Loop { lobes: 2 },
            ),
            build_route(
                "city-tempo",
                Run,
                "Wellington",
                [-41.30, 174.77],
                10_000.0,
                70.0,
                Shape::Loop { lobes: 3 },
            ),
            build_route(
                "forest-trails",
                TrailRun,
                "Karori",
                [-41.30, 174.73],
                12_000.0,
                430.0,
                Shape::Loop { lobes: 4 },
            ),
            build_route(
                "ridge-track",
                Hike,
                "Tararua",
                [-41.05, 175.20],
                14_000.0,
                980.0,
                Shape::OutAndBack,
            ),
            build_route(
                "botanic-garden",
                Walk,
                "Wellington",
                [-41.28, 174.77],
                4_500.0,
                50.0,
                Shape::Loop { lobes: 2 },
            ),
        ];
        Self { routes, band }
    }

    pub fn routes(&self) -> &[RouteTemplate] {
        &self.routes
    }

    pub fn get(&self, id: &str) -> Option<&RouteTemplate> {
        self.routes.iter().find(|r| r.id == id)
    }

    /// Choose a route for an activity.
    ///
    /// Routes of an acceptable type whose length lies within the distance band are
    /// preferred; otherwise any acceptable route is used. With a seed the pick is a
    /// seeded draw, without one the first match. `None` only when no route of an
    /// acceptable type exists.
    pub fn assign(
        &self,
        activity_type: ActivityType,
        expected_distance: f64,
        date_seed: Option<&str>,
    ) -> Option<&RouteTemplate> {
        let acceptable = activity_type.acceptable_route_types();
        let typed: Vec<&RouteTemplate> = self
            .routes
            .iter()
            .filter(|r| acceptable.contains(&r.route_type))
            .collect();
        if typed.is_empty() {
            return None;
        }

        let [low, high] = self.band;
        let banded: Vec<&RouteTemplate> = if expected_distance > 0.0 {
            typed
                .iter()
                .copied()
                .filter(|r| {
                    let ratio = r.distance / expected_distance;
                    ratio >= low && ratio <= high
                })
                .collect()
        } else {
            Vec::new()
        };
        let matches = if banded.is_empty() { typed } else { banded };

        match date_seed {
            Some(seed) => {
                let mut rng = RandomStream::new(&format!("{seed}-route"));
                rng.pick(&matches).copied()
            }
            None => matches.first().copied(),
        }
    }
}
