//! Interval segmentation
//!
//! Splits an activity's synthesized streams into work and recovery segments:
//! - a warm-up and a cool-down at either end
//! - repeated work/recovery pairs for hard sessions
//! - one steady work block otherwise
//!
//! Segment averages are read back from the streams, so intervals always agree with
//! the charts. Work segments are summarised in a single group.

use crate::random::RandomStream;
use crate::types::{
    round_to, Activity, Interval, IntervalGroup, IntervalType, IntervalsReport, StreamSet,
};
use chrono::Duration;

/// Streams shorter than this are reported without intervals
pub const MIN_SEGMENT_SAMPLES: usize = 20;

/// Power zone upper bounds as a fraction of FTP (Z1..Z6; Z7 is everything above)
const POWER_ZONE_BOUNDS: [f64; 6] = [0.55, 0.75, 0.90, 1.05, 1.20, 1.50];

/// Heart rate zone upper bounds as a fraction of max HR (Z1..Z4; Z5 above)
const HR_ZONE_BOUNDS: [f64; 4] = [0.60, 0.70, 0.80, 0.90];

/// Segment plan in time fractions before it is mapped onto sample indices
struct Segment {
    interval_type: IntervalType,
    label: String,
    start: f64,
    end: f64,
}

fn plan(is_hard: bool, rng: &mut RandomStream) -> Vec<Segment> {
    let warmup_end = rng.range(0.12, 0.18);
    let cooldown_start = rng.range(0.88, 0.92);
    let mut segments = vec![Segment {
        interval_type: IntervalType::Recovery,
        label: "Warmup".to_string(),
        start: 0.0,
        end: warmup_end,
    }];

    if is_hard {
        let reps = rng.int_range(4, 8) as usize;
        let work_share = rng.range(0.45, 0.65);
        let pair = (cooldown_start - warmup_end) / reps as f64;
        for rep in 0..reps {
            let start = warmup_end + pair * rep as f64;
            let split = start + pair * work_share;
            let end = if rep + 1 == reps {
                cooldown_start
            } else {
                warmup_end + pair * (rep + 1) as f64
            };
            segments.push(Segment {
                interval_type: IntervalType::Work,
                label: format!("Rep {}", rep + 1),
                start,
                end: split,
            });
            segments.push(Segment {
                interval_type: IntervalType::Recovery,
                label: format!("Recovery {}", rep + 1),
                start: split,
                end,
            });
        }
    } else {
        segments.push(Segment {
            interval_type: IntervalType::Work,
            label: "Steady".to_string(),
            start: warmup_end,
            end: cooldown_start,
        });
    }

    segments.push(Segment {
        interval_type: IntervalType::Recovery,
        label: "Cooldown".to_string(),
        start: cooldown_start,
        end: 1.0,
    });
    segments
}

/// Mean of `values[start..=end]`
fn mean(values: Option<&Vec<f64>>, start: usize, end: usize) -> Option<f64> {
    let slice = values?.get(start..=end)?;
    if slice.is_empty() {
        return None;
    }
    Some(round_to(slice.iter().sum::<f64>() / slice.len() as f64, 1))
}

fn zone_for(
    activity: &Activity,
    average_watts: Option<f64>,
    average_hr: Option<f64>,
) -> Option<u8> {
    let by_bounds = |ratio: f64, bounds: &[f64]| {
        bounds.iter().position(|&bound| ratio < bound).unwrap_or(bounds.len()) as u8 + 1
    };

    match (average_watts, activity.icu_ftp) {
        (Some(watts), Some(ftp)) if ftp > 0 => {
            Some(by_bounds(watts / f64::from(ftp), &POWER_ZONE_BOUNDS))
        }
        _ => match (average_hr, activity.max_heartrate) {
            (Some(hr), Some(max)) if max > 0 => {
                Some(by_bounds(hr / f64::from(max), &HR_ZONE_BOUNDS))
            }
            _ => None,
        },
    }
}

/// Time-weighted mean over intervals that carry the value
fn weighted(intervals: &[&Interval], value: impl Fn(&Interval) -> Option<f64>) -> Option<f64> {
    let (sum, weight) = intervals
        .iter()
        .filter_map(|i| value(i).map(|v| (v * f64::from(i.moving_time), f64::from(i.moving_time))))
        .fold((0.0, 0.0), |(s, w), (vs, vw)| (s + vs, w + vw));
    if weight > 0.0 {
        Some(round_to(sum / weight, 1))
    } else {
        None
    }
}

fn summarize(intervals: &mut [Interval]) -> Vec<IntervalGroup> {
    let group = {
        let work: Vec<&Interval> = intervals
            .iter()
            .filter(|i| i.interval_type == IntervalType::Work)
            .collect();
        let Some(first) = work.first() else {
            return Vec::new();
        };

        let count = work.len() as u32;
        let moving_time: u32 = work.iter().map(|i| i.moving_time).sum();
        IntervalGroup {
            id: format!("{}x{}m", count, (moving_time / count / 60).max(1)),
            count,
            start_index: first.start_index,
            moving_time,
            distance: round_to(work.iter().map(|i| i.distance).sum(), 1),
            average_watts: weighted(&work, |i| i.average_watts),
            average_heartrate: weighted(&work, |i| i.average_heartrate),
            average_speed: weighted(&work, |i| i.average_speed),
        }
    };

    for interval in intervals.iter_mut() {
        if interval.interval_type == IntervalType::Work {
            interval.group_id = Some(group.id.clone());
        }
    }
    vec![group]
}

/// Segment an activity's streams into intervals, seeded by the activity id
pub fn segment(activity: &Activity, streams: &StreamSet, is_hard: bool) -> IntervalsReport {
    let analyzed = activity
        .start_date_local
        .checked_add_signed(Duration::seconds(i64::from(activity.elapsed_time)))
        .unwrap_or(activity.start_date_local);
    let n = streams.time.len();
    if n < MIN_SEGMENT_SAMPLES || !streams.is_aligned() {
        return IntervalsReport {
            id: activity.id.clone(),
            analyzed,
            icu_intervals: Vec::new(),
            icu_groups: Vec::new(),
        };
    }

    let mut rng = RandomStream::new(&format!("{}-intervals", activity.id));
    let last = n - 1;
    let to_index = |fraction: f64| ((fraction * last as f64).round() as usize).min(last);

    let mut intervals = Vec::new();
    for segment in plan(is_hard, &mut rng) {
        let start = to_index(segment.start);
        let end = to_index(segment.end);
        if end <= start {
            continue;
        }

        let distance = streams
            .distance
            .as_ref()
            .map_or(0.0, |d| round_to(d[end] - d[start], 1));
        let average_watts = mean(streams.watts.as_ref(), start, end);
        let average_heartrate = mean(streams.heartrate.as_ref(), start, end);

        intervals.push(Interval {
            id: intervals.len() as u32 + 1,
            interval_type: segment.interval_type,
            label: segment.label,
            start_index: start,
            end_index: end,
            start_time: streams.time[start],
            end_time: streams.time[end],
            moving_time: streams.time[end] - streams.time[start],
            distance,
            average_watts,
            average_heartrate,
            average_speed: mean(streams.velocity_smooth.as_ref(), start, end),
            zone: zone_for(activity, average_watts, average_heartrate),
            group_id: None,
        });
    }

    let icu_groups = summarize(&mut intervals);
    tracing::debug!(
        activity = %activity.id,
        intervals = intervals.len(),
        "segmented activity"
    );

    IntervalsReport {
        id: activity.id.clone(),
        analyzed,
        icu_intervals: intervals,
        icu_groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::{synthesize, StreamRequest};
    use crate::types::ActivityType;
    use chrono::NaiveDate;

    fn ride(id: &str, moving_time: u32) -> Activity {
        Activity {
            id: id.to_string(),
            start_date_local: NaiveDate::from_ymd_opt(2024, 1, 10)
                .unwrap()
                .and_hms_opt(7, 30, 0)
                .unwrap(),
            activity_type: ActivityType::Ride,
            name: "Hill Repeats".to_string(),
            distance: 35_000.0,
            moving_time,
            elapsed_time: moving_time + 300,
            total_elevation_gain: 600.0,
            total_elevation_loss: 590.0,
            average_speed: 35_000.0 / f64::from(moving_time),
            max_speed: 14.0,
            average_heartrate: Some(150),
            max_heartrate: Some(180),
            icu_average_watts: Some(230),
            icu_ftp: Some(250),
            icu_training_load: 95,
            icu_zone_times: None,
            icu_hr_zone_times: None,
            skyline_chart_bytes: None,
            stream_types: Vec::new(),
            start_latlng: None,
            end_latlng: None,
            locality: None,
            route_id: None,
        }
    }

    fn report(activity: &Activity, is_hard: bool) -> IntervalsReport {
        let streams = synthesize(&StreamRequest::from_activity(activity, None, is_hard));
        segment(activity, &streams, is_hard)
    }

    #[test]
    fn test_hard_session_alternates() {
        let activity = ride("demo-20240110-0", 4_200);
        let report = report(&activity, true);
        let intervals = &report.icu_intervals;

        assert_eq!(intervals.first().unwrap().label, "Warmup");
        assert_eq!(intervals.last().unwrap().label, "Cooldown");

        let work: Vec<_> = intervals
            .iter()
            .filter(|i| i.interval_type == IntervalType::Work)
            .collect();
        assert!((4..=8).contains(&work.len()), "{} reps", work.len());
        for pair in intervals[1..intervals.len() - 1].chunks(2) {
            assert_eq!(pair[0].interval_type, IntervalType::Work);
            assert_eq!(pair[1].interval_type, IntervalType::Recovery);
        }

        assert_eq!(report.icu_groups.len(), 1);
        let group = &report.icu_groups[0];
        assert_eq!(group.count as usize, work.len());
        assert!(work.iter().all(|i| i.group_id.as_deref() == Some(group.id.as_str())));
    }

    #[test]
    fn test_segments_are_contiguous_and_cover_activity() {
        let activity = ride("demo-20240111-0", 3_600);
        let report = report(&activity, true);
        let intervals = &report.icu_intervals;

        assert_eq!(intervals[0].start_index, 0);
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].end_index, pair[1].start_index);
        }
        let total: u32 = intervals.iter().map(|i| i.moving_time).sum();
        let last_time = intervals.last().unwrap().end_time;
        assert_eq!(total, last_time);

        let ids: Vec<u32> = intervals.iter().map(|i| i.id).collect();
        assert_eq!(ids, (1..=intervals.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_steady_session_single_block() {
        let activity = ride("demo-20240112-0", 5_400);
        let report = report(&activity, false);
        let labels: Vec<&str> = report.icu_intervals.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Warmup", "Steady", "Cooldown"]);
        assert_eq!(report.icu_groups[0].count, 1);
        assert!(report.icu_intervals[1].average_watts.is_some());
        assert!(report.icu_intervals[1].zone.is_some());
    }

    #[test]
    fn test_empty_streams_have_no_intervals() {
        let activity = ride("demo-20240113-0", 3_600);
        let report = segment(&activity, &StreamSet::default(), true);
        assert!(report.icu_intervals.is_empty());
        assert!(report.icu_groups.is_empty());
        assert_eq!(report.analyzed, activity.start_date_local + Duration::seconds(3_900));
    }

    #[test]
    fn test_analyzed_saturates_at_calendar_end() {
        let mut activity = ride("demo-20240115-0", 3_600);
        activity.start_date_local = NaiveDate::MAX.and_hms_opt(23, 30, 0).unwrap();
        let report = report(&activity, true);
        assert_eq!(report.analyzed, activity.start_date_local);
        assert!(!report.icu_intervals.is_empty());
    }

    #[test]
    fn test_zone_lookup() {
        let activity = ride("z", 3_600);
        assert_eq!(zone_for(&activity, Some(100.0), None), Some(1));
        assert_eq!(zone_for(&activity, Some(250.0), None), Some(4));
        assert_eq!(zone_for(&activity, Some(500.0), None), Some(7));
        assert_eq!(zone_for(&activity, None, Some(171.0)), Some(5));
        assert_eq!(zone_for(&activity, None, None), None);
    }

    #[test]
    fn test_deterministic() {
        let activity = ride("demo-20240114-0", 3_000);
        assert_eq!(report(&activity, true), report(&activity, true));
    }
}
