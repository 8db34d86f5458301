//! Activity archetypes and daily template selection
//!
//! Each simulated training day picks one archetype from a weekday-conditioned
//! candidate set. Consecutive days never reuse the same GPS route when any other
//! candidate is available, since repeated identical tracks look synthetic.

use crate::config::AthleteProfile;
use crate::error::FixtureError;
use crate::random::RandomStream;
use crate::types::ActivityType;
use chrono::{NaiveDate, NaiveTime, Weekday};

/// Fixed activity archetype
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityTemplate {
    pub activity_type: ActivityType,
    pub name: &'static str,
    /// Meters
    pub base_distance: f64,
    /// Seconds, used when the archetype has no distance
    pub base_duration: f64,
    /// Meters climbed
    pub base_elevation: f64,
    /// Meters per second
    pub base_speed: f64,
    pub base_hr: f64,
    /// Reference watts at a 250 W FTP
    pub base_watts: Option<f64>,
    pub base_tss: f64,
    pub route_id: Option<&'static str>,
    pub is_long: bool,
    pub is_hard: bool,
}

/// Built-in archetype catalog
pub const CATALOG: &[ActivityTemplate] = &[
    ActivityTemplate {
        activity_type: ActivityType::Ride,
        name: "Morning Ride",
        base_distance: 45_000.0,
        base_duration: 5_400.0,
        base_elevation: 450.0,
        base_speed: 8.3,
        base_hr: 138.0,
        base_watts: Some(175.0),
        base_tss: 75.0,
        route_id: Some("coastal-loop"),
        is_long: false,
        is_hard: false,
    },
    ActivityTemplate {
        activity_type: ActivityType::Ride,
        name: "Long Ride",
        base_distance: 95_000.0,
        base_duration: 12_600.0,
        base_elevation: 1_100.0,
        base_speed: 7.6,
        base_hr: 135.0,
        base_watts: Some(165.0),
        base_tss: 170.0,
        route_id: Some("hill-country-century"),
        is_long: true,
        is_hard: false,
    },
    ActivityTemplate {
        activity_type: ActivityType::Ride,
        name: "Hill Repeats",
        base_distance: 38_000.0,
        base_duration: 5_400.0,
        base_elevation: 850.0,
        base_speed: 7.0,
        base_hr: 150.0,
        base_watts: Some(215.0),
        base_tss: 105.0,
        route_id: Some("summit-climb"),
        is_long: false,
        is_hard: true,
    },
    ActivityTemplate {
        activity_type: ActivityType::VirtualRide,
        name: "Zwift - Volcano Intervals",
        base_distance: 32_000.0,
        base_duration: 3_600.0,
        base_elevation: 250.0,
        base_speed: 8.9,
        base_hr: 152.0,
        base_watts: Some(225.0),
        base_tss: 85.0,
        route_id: Some("virtual-volcano"),
        is_long: false,
        is_hard: true,
    },
    ActivityTemplate {
        activity_type: ActivityType::VirtualRide,
        name: "Zwift - Endurance",
        base_distance: 40_000.0,
        base_duration: 4_500.0,
        base_elevation: 300.0,
        base_speed: 8.9,
        base_hr: 135.0,
        base_watts: Some(180.0),
        base_tss: 60.0,
        route_id: None,
        is_long: false,
        is_hard: false,
    },
    ActivityTemplate {
        activity_type: ActivityType::Run,
        name: "Easy Run",
        base_distance: 8_000.0,
        base_duration: 2_700.0,
        base_elevation: 60.0,
        base_speed: 2.95,
        base_hr: 142.0,
        base_watts: None,
        base_tss: 45.0,
        route_id: Some("riverside-run"),
        is_long: false,
        is_hard: false,
    },
    ActivityTemplate {
        activity_type: ActivityType::Run,
        name: "Tempo Run",
        base_distance: 10_000.0,
        base_duration: 2_900.0,
        base_elevation: 80.0,
        base_speed: 3.45,
        base_hr: 162.0,
        base_watts: None,
        base_tss: 75.0,
        route_id: None,
        is_long: false,
        is_hard: true,
    },
    ActivityTemplate {
        activity_type: ActivityType::Run,
        name: "Long Run",
        base_distance: 21_000.0,
        base_duration: 6_600.0,
        base_elevation: 220.0,
        base_speed: 3.2,
        base_hr: 148.0,
        base_watts: None,
        base_tss: 120.0,
        route_id: Some("harbour-half"),
        is_long: true,
        is_hard: false,
    },
    ActivityTemplate {
        activity_type: ActivityType::Swim,
        name: "Pool Swim",
        base_distance: 2_500.0,
        base_duration: 3_000.0,
        base_elevation: 0.0,
        base_speed: 0.83,
        base_hr: 128.0,
        base_watts: None,
        base_tss: 40.0,
        route_id: None,
        is_long: false,
        is_hard: false,
    },
    ActivityTemplate {
        activity_type: ActivityType::Hike,
        name: "Mountain Hike",
        base_distance: 14_000.0,
        base_duration: 12_700.0,
        base_elevation: 950.0,
        base_speed: 1.1,
        base_hr: 118.0,
        base_watts: None,
        base_tss: 90.0,
        route_id: Some("ridge-track"),
        is_long: true,
        is_hard: false,
    },
    ActivityTemplate {
        activity_type: ActivityType::TrailRun,
        name: "Trail Run",
        base_distance: 12_000.0,
        base_duration: 4_800.0,
        base_elevation: 420.0,
        base_speed: 2.5,
        base_hr: 152.0,
        base_watts: None,
        base_tss: 85.0,
        route_id: Some("forest-trails"),
        is_long: false,
        is_hard: false,
    },
    ActivityTemplate {
        activity_type: ActivityType::Walk,
        name: "Evening Walk",
        base_distance: 5_000.0,
        base_duration: 3_600.0,
        base_elevation: 40.0,
        base_speed: 1.4,
        base_hr: 98.0,
        base_watts: None,
        base_tss: 15.0,
        route_id: None,
        is_long: false,
        is_hard: false,
    },
    ActivityTemplate {
        activity_type: ActivityType::WeightTraining,
        name: "Strength Session",
        base_distance: 0.0,
        base_duration: 2_700.0,
        base_elevation: 0.0,
        base_speed: 0.0,
        base_hr: 112.0,
        base_watts: None,
        base_tss: 30.0,
        route_id: None,
        is_long: false,
        is_hard: false,
    },
];

/// Whether a template belongs to a weekday's candidate set
fn is_candidate(template: &ActivityTemplate, weekday: Weekday) -> bool {
    match weekday {
        Weekday::Sun => template.is_long,
        Weekday::Sat => template.activity_type.is_outdoor(),
        Weekday::Tue | Weekday::Fri => {
            !template.is_long
                && matches!(
                    template.activity_type,
                    ActivityType::Run | ActivityType::Swim | ActivityType::VirtualRide
                )
        }
        _ => true,
    }
}

/// Weekday-conditioned template chooser over a non-empty pool
#[derive(Debug, Clone)]
pub struct TemplateSelector<'a> {
    pool: &'a [ActivityTemplate],
}

impl Default for TemplateSelector<'static> {
    fn default() -> Self {
        Self { pool: CATALOG }
    }
}

impl<'a> TemplateSelector<'a> {
    /// Create a selector over a custom pool
    pub fn new(pool: &'a [ActivityTemplate]) -> Result<Self, FixtureError> {
        if pool.is_empty() {
            return Err(FixtureError::Config("template pool is empty".to_string()));
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &'a [ActivityTemplate] {
        self.pool
    }

    /// Choose the template for a day.
    ///
    /// Candidates whose route equals `last_route_id` are removed unless that would
    /// leave nothing, in which case the unfiltered candidates are used.
    pub fn select(
        &self,
        date: NaiveDate,
        weekday: Weekday,
        last_route_id: Option<&str>,
    ) -> &'a ActivityTemplate {
        let mut candidates: Vec<&'a ActivityTemplate> = self
            .pool
            .iter()
            .filter(|t| is_candidate(t, weekday))
            .collect();
        if candidates.is_empty() {
            candidates = self.pool.iter().collect();
        }

        let fresh: Vec<&'a ActivityTemplate> = candidates
            .iter()
            .copied()
            .filter(|t| last_route_id.is_none() || t.route_id != last_route_id)
            .collect();
        let choices = if fresh.is_empty() { candidates } else { fresh };

        let mut rng = RandomStream::new(&format!("{}-template", date.format("%Y-%m-%d")));
        choices[rng.index(choices.len())]
    }
}

/// Concrete effort numbers for one day's activity
#[derive(Debug, Clone, PartialEq)]
pub struct Effort {
    pub start_time: NaiveTime,
    pub distance: f64,
    pub moving_time: u32,
    pub elapsed_time: u32,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
    pub average_speed: f64,
    pub average_hr: f64,
    pub average_watts: Option<f64>,
    pub tss: f64,
}

impl ActivityTemplate {
    /// Vary the archetype into a concrete effort, seeded by `seed`
    pub fn realize(&self, seed: &str, athlete: &AthleteProfile) -> Effort {
        let mut rng = RandomStream::new(&format!("{seed}-effort"));

        let scale = rng.range(0.85, 1.15);
        let pace = rng.range(0.95, 1.05);

        let (distance, moving_time) = if self.base_distance > 0.0 && self.base_speed > 0.0 {
            let distance = (self.base_distance * scale).round();
            let speed = self.base_speed * pace;
            (distance, (distance / speed).round().max(1.0))
        } else {
            (0.0, (self.base_duration * scale).round().max(1.0))
        };
        let moving_time = moving_time as u32;
        let elapsed_time =
            moving_time + (f64::from(moving_time) * rng.range(0.02, 0.10)).round() as u32;

        let elevation_gain = (self.base_elevation * scale * rng.range(0.9, 1.1)).round();
        let elevation_loss = (elevation_gain * rng.range(0.95, 1.0)).round();

        let hr_scale = f64::from(athlete.max_hr) / 190.0;
        let average_hr = ((self.base_hr + rng.jitter(5.0)) * hr_scale).round();

        let ftp_scale = f64::from(athlete.ftp) / 250.0;
        let intensity = rng.range(0.95, 1.05);
        let average_watts = self
            .base_watts
            .map(|watts| (watts * ftp_scale * intensity).round());

        let duration_ratio = if self.base_duration > 0.0 {
            f64::from(moving_time) / self.base_duration
        } else {
            1.0
        };
        let tss = (self.base_tss * duration_ratio * intensity * intensity).round();

        let start_minutes = if self.is_long {
            rng.int_range(6 * 60, 9 * 60)
        } else {
            rng.int_range(6 * 60, 19 * 60)
        };
        let start_time =
            NaiveTime::from_hms_opt((start_minutes / 60) as u32, (start_minutes % 60) as u32, 0)
                .unwrap_or_default();

        let average_speed = if moving_time > 0 {
            distance / f64::from(moving_time)
        } else {
            0.0
        };

        Effort {
            start_time,
            distance,
            moving_time,
            elapsed_time,
            elevation_gain,
            elevation_loss,
            average_speed,
            average_hr,
            average_watts,
            tss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_sunday_prefers_long_sessions() {
        let selector = TemplateSelector::default();
        let mut sunday = date("2024-01-07");
        for _ in 0..20 {
            assert_eq!(sunday.weekday(), Weekday::Sun);
            let template = selector.select(sunday, Weekday::Sun, None);
            assert!(template.is_long, "{} is not long", template.name);
            sunday += Duration::days(7);
        }
    }

    #[test]
    fn test_tuesday_candidates() {
        let selector = TemplateSelector::default();
        let template = selector.select(date("2024-01-09"), Weekday::Tue, None);
        assert!(matches!(
            template.activity_type,
            ActivityType::Run | ActivityType::Swim | ActivityType::VirtualRide
        ));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let selector = TemplateSelector::default();
        let d = date("2024-05-15");
        assert_eq!(
            selector.select(d, Weekday::Wed, Some("coastal-loop")),
            selector.select(d, Weekday::Wed, Some("coastal-loop"))
        );
    }

    #[test]
    fn test_never_repeats_route_on_consecutive_days() {
        let selector = TemplateSelector::default();
        let start = date("2024-03-01");
        let mut last_route: Option<&str> = None;

        for offset in 0..60 {
            let d = start + Duration::days(offset);
            let template = selector.select(d, d.weekday(), last_route);
            if let (Some(prev), Some(route)) = (last_route, template.route_id) {
                assert_ne!(prev, route, "route repeated on {d}");
            }
            last_route = template.route_id;
        }
    }

    #[test]
    fn test_single_member_pool_falls_back() {
        let pool = [CATALOG[0].clone()];
        let selector = TemplateSelector::new(&pool).unwrap();
        let template = selector.select(date("2024-01-10"), Weekday::Wed, Some("coastal-loop"));
        assert_eq!(template.route_id, Some("coastal-loop"));
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(TemplateSelector::new(&[]).is_err());
    }

    #[test]
    fn test_realize_distance_and_duration_consistent() {
        let athlete = AthleteProfile::default();
        for template in CATALOG {
            let effort = template.realize("2024-02-02", &athlete);
            assert!(effort.moving_time > 0);
            assert!(effort.elapsed_time >= effort.moving_time);
            if template.base_distance > 0.0 {
                assert!(effort.distance > 0.0);
                let implied = effort.distance / f64::from(effort.moving_time);
                assert!((implied - effort.average_speed).abs() < 1e-9);
            } else {
                assert_eq!(effort.distance, 0.0);
                assert_eq!(effort.average_speed, 0.0);
            }
            assert_eq!(effort.average_watts.is_some(), template.activity_type.is_ride());
        }
    }
}
