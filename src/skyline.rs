//! Skyline chart payload
//!
//! Compresses a zone-time breakdown into the small binary "skyline" blob the
//! activity list renders as a bar strip. Each zone becomes one to three blocks with
//! a duration and an intensity; the blocks are shuffled so the strip looks like a
//! real ride rather than a sorted histogram.
//!
//! Layout (tagged varints, see [`crate::wire`]):
//! - field 1: zone count
//! - field 2: packed block durations (seconds)
//! - field 3: packed block intensities (percent of threshold)
//! - field 4: packed block zone indices (0-based)
//! - field 5: basis (1 power, 2 heart rate)
//!
//! The result is base64 with the standard padded alphabet.

use crate::random::RandomStream;
use crate::wire::ProtoWriter;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Zones with less time than this are left out of the strip
pub const MIN_ZONE_SECS: u32 = 10;

/// Nominal block length in seconds
pub const BLOCK_SECS: u32 = 600;

/// Most blocks one zone is split into
pub const MAX_BLOCKS_PER_ZONE: u32 = 3;

/// Power intensity per zone, percent of FTP
const POWER_INTENSITY: [u32; 7] = [50, 68, 83, 98, 113, 135, 170];

/// Heart rate intensity per zone, percent of threshold HR
const HR_INTENSITY: [u32; 5] = [60, 70, 80, 88, 95];

/// Intensity jitter in percent
const INTENSITY_JITTER: i64 = 3;

/// What the zones were measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkylineBasis {
    Power = 1,
    HeartRate = 2,
}

impl SkylineBasis {
    fn intensity_table(self) -> &'static [u32] {
        match self {
            SkylineBasis::Power => &POWER_INTENSITY,
            SkylineBasis::HeartRate => &HR_INTENSITY,
        }
    }
}

/// One bar of the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    secs: u32,
    intensity: u32,
    zone: u32,
}

/// Split a zone's seconds into blocks: even shares, remainder on the last
fn split_zone(secs: u32) -> Vec<u32> {
    let count = (secs / BLOCK_SECS).clamp(1, MAX_BLOCKS_PER_ZONE);
    let share = secs / count;
    let mut parts = vec![share; count as usize];
    if let Some(last) = parts.last_mut() {
        *last += secs - share * count;
    }
    parts
}

fn build_blocks(zone_seconds: &[u32], basis: SkylineBasis, rng: &mut RandomStream) -> Vec<Block> {
    let table = basis.intensity_table();
    let mut blocks = Vec::new();

    for (zone, &secs) in zone_seconds.iter().enumerate() {
        if secs < MIN_ZONE_SECS {
            continue;
        }
        let base = table
            .get(zone)
            .or_else(|| table.last())
            .copied()
            .unwrap_or(100);
        for part in split_zone(secs) {
            let jitter = rng.int_range(-INTENSITY_JITTER, INTENSITY_JITTER);
            let intensity = (i64::from(base) + jitter).max(1) as u32;
            blocks.push(Block {
                secs: part,
                intensity,
                zone: zone as u32,
            });
        }
    }

    blocks
}

/// In-place Fisher-Yates, walking down from the last index
fn shuffle(blocks: &mut [Block], rng: &mut RandomStream) {
    for i in (1..blocks.len()).rev() {
        let j = ((rng.next_f64() * (i + 1) as f64).floor() as usize).min(i);
        blocks.swap(i, j);
    }
}

/// Encode a zone breakdown (seconds per zone, Z1 first) as a base64 skyline payload.
///
/// Returns `None` when no zone reaches [`MIN_ZONE_SECS`].
pub fn encode(zone_seconds: &[u32], basis: SkylineBasis, seed: &str) -> Option<String> {
    let mut rng = RandomStream::new(&format!("{seed}-skyline"));
    let mut blocks = build_blocks(zone_seconds, basis, &mut rng);
    if blocks.is_empty() {
        return None;
    }
    shuffle(&mut blocks, &mut rng);

    let durations: Vec<u64> = blocks.iter().map(|b| u64::from(b.secs)).collect();
    let intensities: Vec<u64> = blocks.iter().map(|b| u64::from(b.intensity)).collect();
    let zones: Vec<u64> = blocks.iter().map(|b| u64::from(b.zone)).collect();

    let mut writer = ProtoWriter::new();
    writer.write_uint_field(1, zone_seconds.len() as u64);
    writer.write_packed_field(2, &durations);
    writer.write_packed_field(3, &intensities);
    writer.write_packed_field(4, &zones);
    writer.write_uint_field(5, basis as u64);

    Some(STANDARD.encode(writer.into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::reader::{read_fields, Field};
    use crate::zones::estimate_seconds;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn decode(payload: &str) -> Vec<Field> {
        let bytes = STANDARD.decode(payload).unwrap();
        read_fields(&bytes).unwrap()
    }

    fn packed(fields: &[Field], number: u32) -> Vec<u64> {
        fields
            .iter()
            .find_map(|f| match f {
                Field::Packed(n, values) if *n == number => Some(values.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Seconds per zone index, summed over the decoded blocks
    fn zone_totals(fields: &[Field]) -> BTreeMap<u64, u64> {
        let mut totals = BTreeMap::new();
        for (zone, secs) in packed(fields, 4).into_iter().zip(packed(fields, 2)) {
            *totals.entry(zone).or_insert(0) += secs;
        }
        totals
    }

    /// Input seconds per zone index, skipping zones too short to draw
    fn drawn_zones(zone_seconds: &[u32]) -> BTreeMap<u64, u64> {
        zone_seconds
            .iter()
            .enumerate()
            .filter(|(_, secs)| **secs >= MIN_ZONE_SECS)
            .map(|(zone, &secs)| (zone as u64, u64::from(secs)))
            .collect()
    }

    #[test]
    fn test_decoding_recovers_time_per_zone() {
        let cases = [
            (vec![360, 1_260, 900, 540, 360, 7, 36], SkylineBasis::Power),
            (estimate_seconds(5_423, 7), SkylineBasis::Power),
            (vec![2_100, 4, 1_850, 640, 12], SkylineBasis::HeartRate),
            (estimate_seconds(3_917, 5), SkylineBasis::HeartRate),
        ];

        for (zone_seconds, basis) in cases {
            let payload = encode(&zone_seconds, basis, "demo-20240301-0").unwrap();
            let fields = decode(&payload);

            assert_eq!(fields.first(), Some(&Field::Varint(1, zone_seconds.len() as u64)));
            assert_eq!(zone_totals(&fields), drawn_zones(&zone_seconds));
        }
    }

    #[test]
    fn test_split_zone() {
        assert_eq!(split_zone(10), vec![10]);
        assert_eq!(split_zone(599), vec![599]);
        assert_eq!(split_zone(1_200), vec![600, 600]);
        assert_eq!(split_zone(1_801), vec![600, 600, 601]);
        assert_eq!(split_zone(10_000), vec![3_333, 3_333, 3_334]);
    }

    #[test]
    fn test_payload_shape() {
        // Z1 1800 s (3 blocks), Z2 900 s (1 block), Z3 5 s (skipped)
        let payload =
            encode(&[1_800, 900, 5], SkylineBasis::HeartRate, "demo-20240110-0").unwrap();
        let fields = decode(&payload);

        assert_eq!(fields.first(), Some(&Field::Varint(1, 3)));
        assert_eq!(fields.last(), Some(&Field::Varint(5, 2)));

        let durations = packed(&fields, 2);
        let intensities = packed(&fields, 3);
        let zones = packed(&fields, 4);
        assert_eq!(durations.len(), 4);
        assert_eq!(intensities.len(), 4);
        assert_eq!(zones.len(), 4);
        assert_eq!(durations.iter().sum::<u64>(), 2_700);

        let mut sorted_zones = zones.clone();
        sorted_zones.sort_unstable();
        assert_eq!(sorted_zones, vec![0, 0, 0, 1]);

        for (zone, intensity) in zones.iter().zip(&intensities) {
            let base = i64::from(HR_INTENSITY[*zone as usize]);
            assert!((*intensity as i64 - base).abs() <= INTENSITY_JITTER);
        }
    }

    #[test]
    fn test_power_basis_flag() {
        let zones = [360, 1_260, 900, 540, 360, 144, 36];
        let payload = encode(&zones, SkylineBasis::Power, "x").unwrap();
        let fields = decode(&payload);
        assert_eq!(fields.first(), Some(&Field::Varint(1, 7)));
        assert_eq!(fields.last(), Some(&Field::Varint(5, 1)));
        assert_eq!(packed(&fields, 2).iter().sum::<u64>(), 3_600);
    }

    #[test]
    fn test_deterministic() {
        let zones = [600, 2_400, 1_200, 300, 60];
        assert_eq!(
            encode(&zones, SkylineBasis::HeartRate, "seed"),
            encode(&zones, SkylineBasis::HeartRate, "seed")
        );
    }

    #[test]
    fn test_nothing_to_draw() {
        assert_eq!(encode(&[], SkylineBasis::Power, "x"), None);
        assert_eq!(encode(&[9, 0, 3], SkylineBasis::HeartRate, "x"), None);
    }

    #[test]
    fn test_standard_padded_alphabet() {
        let payload = encode(&[3_000, 3_000], SkylineBasis::HeartRate, "pad").unwrap();
        assert_eq!(payload.len() % 4, 0);
        assert!(payload
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='));
    }
}
