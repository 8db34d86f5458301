//! Fixture repository
//!
//! Builds the whole demo dataset in one oldest-to-newest sweep and then serves
//! read-only queries over it. Per day the sweep:
//! 1. decides whether the athlete rests
//! 2. picks a template (avoiding yesterday's route) and realizes an effort
//! 3. resolves a route and derives zones, skyline and stream types
//! 4. folds the day's stress into the load state and emits a wellness row
//!
//! Streams and intervals are not stored; they are re-synthesized on request from
//! the activity id, which makes them identical on every call.

use crate::config::{FixtureConfig, MAX_DAYS};
use crate::error::{parse_date, FixtureError};
use crate::intervals;
use crate::load::{is_rest_day, wellness_for_day, TrainingLoadSimulator, INITIAL_LOAD};
use crate::random::RandomStream;
use crate::routes::{synthetic_loop, RouteAssigner, RouteTemplate};
use crate::skyline::{self, SkylineBasis};
use crate::streams::{self, StreamRequest};
use crate::templates::{ActivityTemplate, Effort, TemplateSelector};
use crate::types::{round_to, Activity, DateRange, IntervalsReport, StreamSet, Wellness};
use crate::zones::{self, HR_ZONE_WEIGHTS, POWER_ZONE_WEIGHTS};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::HashMap;
use tracing::{debug, info};

/// Stable activity id for a day and per-day index
pub fn activity_id(date: NaiveDate, index: usize) -> String {
    format!("demo-{}-{}", date.format("%Y%m%d"), index)
}

/// Generated activity plus what is needed to re-render its streams
#[derive(Debug, Clone)]
struct Entry {
    activity: Activity,
    track: Option<Vec<[f64; 2]>>,
    is_hard: bool,
}

impl Entry {
    fn stream_request(&self) -> StreamRequest<'_> {
        StreamRequest::from_activity(&self.activity, self.track.as_deref(), self.is_hard)
    }
}

/// Read-only demo dataset
#[derive(Debug, Clone)]
pub struct FixtureRepository {
    reference_date: NaiveDate,
    config: FixtureConfig,
    /// Oldest first
    entries: Vec<Entry>,
    by_id: HashMap<String, usize>,
    /// Oldest first, one per day
    wellness: Vec<Wellness>,
}

impl FixtureRepository {
    /// Build the default dataset ending on `reference_date`
    pub fn initialize(reference_date: NaiveDate) -> Self {
        Self::with_config(reference_date, FixtureConfig::default())
    }

    /// Build from a `YYYY-MM-DD` reference date
    pub fn from_reference_str(reference_date: &str) -> Result<Self, FixtureError> {
        Ok(Self::initialize(parse_date(reference_date)?))
    }

    /// Build a dataset with explicit settings
    pub fn with_config(reference_date: NaiveDate, config: FixtureConfig) -> Self {
        let builder = DatasetBuilder::new(&config);
        let (entries, wellness) = builder.sweep(reference_date);

        let by_id = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.activity.id.clone(), i))
            .collect();

        info!(
            reference_date = %reference_date,
            days = wellness.len(),
            activities = entries.len(),
            "built demo fixture dataset"
        );

        Self {
            reference_date,
            config,
            entries,
            by_id,
            wellness,
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// Number of generated activities
    pub fn activity_count(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, id: &str) -> Option<&Entry> {
        self.by_id.get(id).and_then(|&i| self.entries.get(i))
    }

    pub fn get_activity(&self, id: &str) -> Option<&Activity> {
        self.entry(id).map(|entry| &entry.activity)
    }

    /// Like [`get_activity`](Self::get_activity) but with an error for unknown ids
    pub fn require_activity(&self, id: &str) -> Result<&Activity, FixtureError> {
        self.get_activity(id)
            .ok_or_else(|| FixtureError::UnknownActivity(id.to_string()))
    }

    /// Activities in the range, newest first
    pub fn get_activities(&self, range: &DateRange) -> Vec<&Activity> {
        self.entries
            .iter()
            .rev()
            .map(|entry| &entry.activity)
            .filter(|activity| range.contains(activity.date()))
            .collect()
    }

    /// Wellness rows in the range, oldest first
    pub fn get_wellness(&self, range: &DateRange) -> Vec<&Wellness> {
        self.wellness.iter().filter(|row| range.contains(row.id)).collect()
    }

    /// Sensor streams for an activity, synthesized on each call
    pub fn get_activity_streams(&self, id: &str) -> Option<StreamSet> {
        self.entry(id)
            .map(|entry| streams::synthesize(&entry.stream_request()))
    }

    /// Interval analysis derived from the activity's streams
    pub fn get_activity_intervals(&self, id: &str) -> Option<IntervalsReport> {
        let entry = self.entry(id)?;
        let streams = streams::synthesize(&entry.stream_request());
        Some(intervals::segment(&entry.activity, &streams, entry.is_hard))
    }
}

/// Collaborators shared by every day of the sweep
struct DatasetBuilder<'a> {
    config: &'a FixtureConfig,
    selector: TemplateSelector<'static>,
    assigner: RouteAssigner,
}

impl<'a> DatasetBuilder<'a> {
    fn new(config: &'a FixtureConfig) -> Self {
        Self {
            config,
            selector: TemplateSelector::default(),
            assigner: RouteAssigner::builtin(config.route_distance_band),
        }
    }

    /// Generate every day from `reference_date - days` through `reference_date`,
    /// starting no earlier than the first representable date
    fn sweep(&self, reference_date: NaiveDate) -> (Vec<Entry>, Vec<Wellness>) {
        let days = self.config.days.min(MAX_DAYS);
        let first_day = reference_date
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        let day_count = reference_date.signed_duration_since(first_day).num_days() as usize + 1;

        let mut simulator = TrainingLoadSimulator::new();
        let mut ctl_history: Vec<f64> = Vec::with_capacity(day_count);
        let mut last_route_id: Option<String> = None;
        let mut entries = Vec::new();
        let mut wellness = Vec::with_capacity(day_count);

        let dates = (0..day_count as u64).filter_map(|i| first_day.checked_add_days(Days::new(i)));
        for date in dates {
            let entry = if is_rest_day(date) {
                None
            } else {
                Some(self.build_day(date, last_route_id.as_deref()))
            };

            let tss = entry
                .as_ref()
                .map_or(0.0, |e| f64::from(e.activity.icu_training_load));
            let state = simulator.step(date, tss);
            let ctl_week_ago = ctl_history
                .len()
                .checked_sub(7)
                .and_then(|i| ctl_history.get(i))
                .copied()
                .unwrap_or(INITIAL_LOAD);
            ctl_history.push(state.ctl);
            wellness.push(wellness_for_day(date, state, ctl_week_ago, &self.config.athlete));

            match entry {
                Some(entry) => {
                    debug!(
                        date = %date,
                        id = %entry.activity.id,
                        activity_type = entry.activity.activity_type.as_str(),
                        tss,
                        ctl = state.ctl,
                        atl = state.atl,
                        "generated activity"
                    );
                    last_route_id = entry.activity.route_id.clone();
                    entries.push(entry);
                }
                None => debug!(date = %date, ctl = state.ctl, atl = state.atl, "rest day"),
            }
        }

        (entries, wellness)
    }

    fn build_day(&self, date: NaiveDate, last_route_id: Option<&str>) -> Entry {
        let template = self.selector.select(date, date.weekday(), last_route_id);
        let id = activity_id(date, 0);
        let effort = template.realize(&id, &self.config.athlete);
        let route = self.resolve_route(template, &effort, &id, last_route_id);
        let activity = self.build_activity(date, id, template, &effort, route.as_ref());

        let mut entry = Entry {
            activity,
            track: route.map(|r| r.coordinates),
            is_hard: template.is_hard,
        };
        entry.activity.stream_types = streams::available_types(&entry.stream_request());
        entry
    }

    /// Template route, then a matched library route, then a synthetic loop for
    /// outdoor sports. A library route equal to yesterday's is not reused.
    fn resolve_route(
        &self,
        template: &ActivityTemplate,
        effort: &Effort,
        id: &str,
        last_route_id: Option<&str>,
    ) -> Option<RouteTemplate> {
        let activity_type = template.activity_type;
        if activity_type.acceptable_route_types().is_empty() {
            return None;
        }

        let library = template
            .route_id
            .and_then(|route_id| self.assigner.get(route_id))
            .or_else(|| self.assigner.assign(activity_type, effort.distance, Some(id)))
            .filter(|route| Some(route.id.as_str()) != last_route_id);

        match library {
            Some(route) => Some(route.clone()),
            None if activity_type.is_outdoor() && effort.distance > 0.0 => {
                Some(synthetic_loop(id, activity_type, effort.distance))
            }
            None => None,
        }
    }

    fn build_activity(
        &self,
        date: NaiveDate,
        id: String,
        template: &ActivityTemplate,
        effort: &Effort,
        route: Option<&RouteTemplate>,
    ) -> Activity {
        let athlete = &self.config.athlete;
        let mut rng = RandomStream::new(&format!("{id}-summary"));

        let activity_type = template.activity_type;
        let average_hr = effort.average_hr.round().max(0.0) as u32;
        let max_hr = (average_hr + rng.int_range(12, 30) as u32).min(athlete.max_hr);
        let max_speed = round_to(effort.average_speed * rng.range(1.3, 1.8), 2);

        let power = effort.average_watts.filter(|_| activity_type.is_ride());
        let power_zones =
            power.map(|_| zones::estimate(effort.moving_time, POWER_ZONE_WEIGHTS.len()));
        let hr_zones = zones::estimate_seconds(effort.moving_time, HR_ZONE_WEIGHTS.len());

        let skyline_chart_bytes = match &power_zones {
            Some(zone_times) => {
                let secs: Vec<u32> = zone_times.iter().map(|z| z.secs).collect();
                skyline::encode(&secs, SkylineBasis::Power, &id)
            }
            None => skyline::encode(&hr_zones, SkylineBasis::HeartRate, &id),
        };

        // Synthetic loops are one-off tracks, not library routes
        let library_route = route.filter(|r| !r.id.starts_with("synthetic-"));
        let location = route.map(|r| r.location());

        Activity {
            start_date_local: date.and_time(effort.start_time),
            activity_type,
            name: template.name.to_string(),
            distance: effort.distance,
            moving_time: effort.moving_time,
            elapsed_time: effort.elapsed_time,
            total_elevation_gain: effort.elevation_gain,
            total_elevation_loss: effort.elevation_loss,
            average_speed: round_to(effort.average_speed, 2),
            max_speed,
            average_heartrate: Some(average_hr),
            max_heartrate: Some(max_hr),
            icu_average_watts: power.map(|w| w.round() as u32),
            icu_ftp: power.map(|_| athlete.ftp),
            icu_training_load: effort.tss.round().max(0.0) as u32,
            icu_zone_times: power_zones,
            icu_hr_zone_times: Some(hr_zones),
            skyline_chart_bytes,
            stream_types: Vec::new(),
            start_latlng: location.as_ref().and_then(|l| l.start_latlng),
            end_latlng: location.as_ref().and_then(|l| l.end_latlng),
            locality: location.map(|l| l.locality),
            route_id: library_route.map(|r| r.id.clone()),
            id,
        }
    }
}
