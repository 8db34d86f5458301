use chrono::NaiveDate;
use demo_fixtures::load::is_rest_day;
use demo_fixtures::{ActivityType, DateRange, FixtureConfig, FixtureRepository};
use pretty_assertions::assert_eq;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn year_repo() -> FixtureRepository {
    FixtureRepository::initialize(date("2024-01-12"))
}

#[test]
fn test_query_window_activities() {
    let repo = year_repo();
    let range = DateRange::new(Some(date("2024-01-10")), Some(date("2024-01-12")));
    let activities = repo.get_activities(&range);

    let expected_days: Vec<NaiveDate> = date("2024-01-10")
        .iter_days()
        .take(3)
        .filter(|d| !is_rest_day(*d))
        .collect();
    assert_eq!(activities.len(), expected_days.len());

    let mut days: Vec<NaiveDate> = activities.iter().map(|a| a.date()).collect();
    days.reverse();
    assert_eq!(days, expected_days);

    for activity in &activities {
        assert!(range.contains(activity.date()));
        assert_eq!(
            activity.id,
            format!("demo-{}-0", activity.date().format("%Y%m%d"))
        );
    }
}

#[test]
fn test_query_window_wellness() {
    let repo = year_repo();
    let range = DateRange::new(Some(date("2024-01-10")), Some(date("2024-01-12")));
    let ids: Vec<NaiveDate> = repo.get_wellness(&range).iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![date("2024-01-10"), date("2024-01-11"), date("2024-01-12")]);
}

#[test]
fn test_full_year_is_contiguous_and_non_negative() {
    let repo = year_repo();
    let rows = repo.get_wellness(&DateRange::default());

    assert_eq!(rows.len(), 366);
    assert_eq!(rows.first().unwrap().id, date("2023-01-12"));
    assert_eq!(rows.last().unwrap().id, date("2024-01-12"));
    for pair in rows.windows(2) {
        assert_eq!(pair[1].id.signed_duration_since(pair[0].id).num_days(), 1);
    }
    for row in &rows {
        assert!(row.ctl >= 0.0 && row.atl >= 0.0, "{}", row.id);
    }
}

#[test]
fn test_distance_exact_for_every_activity() {
    let repo = year_repo();
    for activity in repo.get_activities(&DateRange::default()) {
        let streams = repo.get_activity_streams(&activity.id).unwrap();
        assert!(streams.is_aligned(), "{}", activity.id);

        match &streams.distance {
            Some(distance) => {
                let last = *distance.last().unwrap();
                assert!((last - activity.distance).abs() <= 1.0, "{}", activity.id);
                assert!(distance.windows(2).all(|w| w[1] >= w[0]), "{}", activity.id);
            }
            None => assert_eq!(activity.distance, 0.0, "{}", activity.id),
        }
    }
}

#[test]
fn test_zone_times_conserved() {
    let repo = year_repo();
    for activity in repo.get_activities(&DateRange::default()) {
        let hr: u32 = activity.icu_hr_zone_times.as_ref().unwrap().iter().sum();
        assert_eq!(hr, activity.moving_time);

        if let Some(zones) = &activity.icu_zone_times {
            assert_eq!(zones.len(), 7);
            assert_eq!(zones.iter().map(|z| z.secs).sum::<u32>(), activity.moving_time);
        }
    }
}

#[test]
fn test_no_route_on_consecutive_activities() {
    let repo = year_repo();
    let activities = repo.get_activities(&DateRange::default());

    let last_ten = DateRange::new(Some(date("2024-01-03")), Some(date("2024-01-12")));
    assert!(!repo.get_activities(&last_ten).is_empty());

    for pair in activities.windows(2) {
        if pair[0].route_id.is_some() {
            assert_ne!(pair[0].route_id, pair[1].route_id, "{} / {}", pair[0].id, pair[1].id);
        }
    }
}

#[test]
fn test_rebuild_is_identical() {
    let a = FixtureRepository::initialize(date("2024-06-30"));
    let b = FixtureRepository::initialize(date("2024-06-30"));

    let all = DateRange::default();
    assert_eq!(a.get_activities(&all), b.get_activities(&all));
    assert_eq!(a.get_wellness(&all), b.get_wellness(&all));

    let id = a.get_activities(&all)[0].id.clone();
    assert_eq!(a.get_activity_streams(&id), b.get_activity_streams(&id));
    assert_eq!(a.get_activity_intervals(&id), b.get_activity_intervals(&id));

    let json_a = serde_json::to_string(&a.get_activities(&all)).unwrap();
    let json_b = serde_json::to_string(&b.get_activities(&all)).unwrap();
    assert_eq!(json_a, json_b);
}

#[test]
fn test_gps_only_for_outdoor_and_virtual() {
    let repo = year_repo();
    for activity in repo.get_activities(&DateRange::default()) {
        match activity.activity_type {
            ActivityType::Swim | ActivityType::WeightTraining => {
                assert!(activity.start_latlng.is_none(), "{}", activity.id);
                assert!(activity.route_id.is_none());
            }
            t if t.is_outdoor() => {
                assert!(activity.start_latlng.is_some(), "{}", activity.id);
                assert!(activity.locality.is_some());
            }
            _ => {}
        }
    }
}

#[test]
fn test_api_field_names() {
    let repo = year_repo();
    let activity = repo.get_activities(&DateRange::default())[0];
    let value = serde_json::to_value(activity).unwrap();

    for field in [
        "id",
        "start_date_local",
        "type",
        "moving_time",
        "icu_training_load",
        "icu_hr_zone_times",
        "stream_types",
    ] {
        assert!(value.get(field).is_some(), "missing {field}");
    }

    let wellness = repo.get_wellness(&DateRange::default())[0];
    let value = serde_json::to_value(wellness).unwrap();
    for field in ["id", "ctl", "atl", "rampRate", "restingHR", "sleepSecs", "sleepScore"] {
        assert!(value.get(field).is_some(), "missing {field}");
    }
}

#[test]
fn test_custom_config_scales_efforts() {
    let config = FixtureConfig::from_json(r#"{"days": 30, "athlete": {"ftp": 300}}"#).unwrap();
    let repo = FixtureRepository::with_config(date("2024-01-12"), config);

    assert_eq!(repo.get_wellness(&DateRange::default()).len(), 31);
    for activity in repo.get_activities(&DateRange::default()) {
        if activity.icu_average_watts.is_some() {
            assert_eq!(activity.icu_ftp, Some(300));
        }
    }
}

#[test]
fn test_intervals_follow_streams() {
    let repo = year_repo();
    let activity = repo
        .get_activities(&DateRange::default())
        .into_iter()
        .find(|a| a.activity_type.is_ride())
        .unwrap();

    let streams = repo.get_activity_streams(&activity.id).unwrap();
    let report = repo.get_activity_intervals(&activity.id).unwrap();

    assert_eq!(report.id, activity.id);
    assert!(!report.icu_intervals.is_empty());
    let last = report.icu_intervals.last().unwrap();
    assert_eq!(last.end_index, streams.time.len() - 1);
    assert_eq!(report.icu_groups.len(), 1);
}
