//! Core record types served by the fixture repository
//!
//! Field names and nesting follow the REST API the fixtures stand in for, so a
//! consumer cannot tell generated records from live ones.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Sport type of an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Ride,
    VirtualRide,
    Run,
    TrailRun,
    Swim,
    Hike,
    Walk,
    WeightTraining,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Ride => "Ride",
            ActivityType::VirtualRide => "VirtualRide",
            ActivityType::Run => "Run",
            ActivityType::TrailRun => "TrailRun",
            ActivityType::Swim => "Swim",
            ActivityType::Hike => "Hike",
            ActivityType::Walk => "Walk",
            ActivityType::WeightTraining => "WeightTraining",
        }
    }

    /// Ride types carry a power meter
    pub fn is_ride(&self) -> bool {
        matches!(self, ActivityType::Ride | ActivityType::VirtualRide)
    }

    /// Outdoor types recorded with GPS. Virtual rides get coordinates only from a
    /// virtual route; pool swims and gym sessions never do.
    pub fn is_outdoor(&self) -> bool {
        matches!(
            self,
            ActivityType::Ride
                | ActivityType::Run
                | ActivityType::TrailRun
                | ActivityType::Hike
                | ActivityType::Walk
        )
    }

    /// Route types this activity may be drawn on
    pub fn acceptable_route_types(&self) -> &'static [ActivityType] {
        match self {
            ActivityType::Ride => &[ActivityType::Ride, ActivityType::VirtualRide],
            ActivityType::VirtualRide => &[ActivityType::VirtualRide],
            ActivityType::Run => &[ActivityType::Run, ActivityType::TrailRun],
            ActivityType::TrailRun => &[ActivityType::TrailRun, ActivityType::Run],
            ActivityType::Hike => &[ActivityType::Hike, ActivityType::Walk],
            ActivityType::Walk => &[ActivityType::Walk, ActivityType::Hike],
            ActivityType::Swim | ActivityType::WeightTraining => &[],
        }
    }
}

/// Seconds spent in one named zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneTime {
    pub id: String,
    pub secs: u32,
}

/// Generated activity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub start_date_local: NaiveDateTime,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub name: String,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub moving_time: u32,
    pub elapsed_time: u32,
    pub total_elevation_gain: f64,
    pub total_elevation_loss: f64,
    /// Meters per second
    pub average_speed: f64,
    pub max_speed: f64,
    pub average_heartrate: Option<u32>,
    pub max_heartrate: Option<u32>,
    pub icu_average_watts: Option<u32>,
    pub icu_ftp: Option<u32>,
    pub icu_training_load: u32,
    /// Power zone times, ride types only
    pub icu_zone_times: Option<Vec<ZoneTime>>,
    /// Heart rate zone seconds indexed by zone
    pub icu_hr_zone_times: Option<Vec<u32>>,
    /// Base64 skyline payload
    pub skyline_chart_bytes: Option<String>,
    pub stream_types: Vec<String>,
    pub start_latlng: Option<[f64; 2]>,
    pub end_latlng: Option<[f64; 2]>,
    pub locality: Option<String>,
    pub route_id: Option<String>,
}

impl Activity {
    /// Calendar date the activity started on
    pub fn date(&self) -> NaiveDate {
        self.start_date_local.date()
    }
}

/// Daily wellness row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wellness {
    /// Calendar date, `YYYY-MM-DD`
    pub id: NaiveDate,
    pub ctl: f64,
    pub atl: f64,
    pub ramp_rate: f64,
    pub weight: f64,
    #[serde(rename = "restingHR")]
    pub resting_hr: u32,
    pub hrv: f64,
    pub sleep_secs: u32,
    pub sleep_score: u32,
}

/// Inclusive calendar-date filter. Open ends match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub oldest: Option<NaiveDate>,
    pub newest: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(oldest: Option<NaiveDate>, newest: Option<NaiveDate>) -> Self {
        Self { oldest, newest }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.oldest.map_or(true, |oldest| date >= oldest)
            && self.newest.map_or(true, |newest| date <= newest)
    }
}

/// Parallel sensor channels for one activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSet {
    /// Seconds from start
    pub time: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latlng: Option<Vec<[f64; 2]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartrate: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watts: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_altitude: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_smooth: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_smooth: Option<Vec<f64>>,
}

/// One stream object as the API serves it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiStream {
    #[serde(rename = "type")]
    pub stream_type: String,
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data2: Option<Vec<f64>>,
}

impl StreamSet {
    /// Scalar channels in API order, paired with their type names
    fn scalar_channels(&self) -> [(&'static str, Option<&Vec<f64>>); 8] {
        [
            ("heartrate", self.heartrate.as_ref()),
            ("watts", self.watts.as_ref()),
            ("altitude", self.altitude.as_ref()),
            ("fixed_altitude", self.fixed_altitude.as_ref()),
            ("cadence", self.cadence.as_ref()),
            ("velocity_smooth", self.velocity_smooth.as_ref()),
            ("distance", self.distance.as_ref()),
            ("grade_smooth", self.grade_smooth.as_ref()),
        ]
    }

    /// Names of every present channel, `time` first
    pub fn stream_types(&self) -> Vec<String> {
        let mut types = vec!["time".to_string()];
        if self.latlng.is_some() {
            types.push("latlng".to_string());
        }
        for (name, channel) in self.scalar_channels() {
            if channel.is_some() {
                types.push(name.to_string());
            }
        }
        types
    }

    /// True when every present channel has as many samples as `time`
    pub fn is_aligned(&self) -> bool {
        let n = self.time.len();
        self.latlng.as_ref().map_or(true, |v| v.len() == n)
            && self
                .scalar_channels()
                .iter()
                .all(|(_, channel)| channel.map_or(true, |v| v.len() == n))
    }

    /// Convert to the API's list of `{type, data, data2}` stream objects
    pub fn to_api_streams(&self) -> Vec<ApiStream> {
        let mut streams = vec![ApiStream {
            stream_type: "time".to_string(),
            data: self.time.iter().map(|&t| f64::from(t)).collect(),
            data2: None,
        }];

        if let Some(latlng) = &self.latlng {
            streams.push(ApiStream {
                stream_type: "latlng".to_string(),
                data: latlng.iter().map(|p| p[0]).collect(),
                data2: Some(latlng.iter().map(|p| p[1]).collect()),
            });
        }

        for (name, channel) in self.scalar_channels() {
            if let Some(values) = channel {
                streams.push(ApiStream {
                    stream_type: name.to_string(),
                    data: values.clone(),
                    data2: None,
                });
            }
        }

        streams
    }
}

/// Interval classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntervalType {
    Work,
    Recovery,
}

/// One segment of an activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub id: u32,
    #[serde(rename = "type")]
    pub interval_type: IntervalType,
    pub label: String,
    pub start_index: usize,
    pub end_index: usize,
    pub start_time: u32,
    pub end_time: u32,
    pub moving_time: u32,
    pub distance: f64,
    pub average_watts: Option<f64>,
    pub average_heartrate: Option<f64>,
    pub average_speed: Option<f64>,
    pub zone: Option<u8>,
    pub group_id: Option<String>,
}

/// Summary over a set of similar work intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalGroup {
    pub id: String,
    pub count: u32,
    pub start_index: usize,
    pub moving_time: u32,
    pub distance: f64,
    pub average_watts: Option<f64>,
    pub average_heartrate: Option<f64>,
    pub average_speed: Option<f64>,
}

/// Interval analysis of one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalsReport {
    pub id: String,
    pub analyzed: NaiveDateTime,
    pub icu_intervals: Vec<Interval>,
    pub icu_groups: Vec<IntervalGroup>,
}

/// Round to `places` decimal places
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
