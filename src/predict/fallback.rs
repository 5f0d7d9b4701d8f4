// src/predict/fallback.rs

use chrono::{DateTime, Utc};
use rand::Rng;
use std::ops::Range;

use super::PredictionRecord;
use crate::{ingest::RawRow, search::positional_batch_id};

const DEFECT_RANGE: Range<f64> = 2.0..17.0;
const PARTICLE_SIZE_RANGE: Range<f64> = 100.0..150.0;
const CONDUCTIVITY_RANGE: Range<f64> = 80.0..100.0;
const TEMPERATURE_RANGE: Range<f64> = 20.0..30.0;
const HUMIDITY_RANGE: Range<f64> = 40.0..60.0;
const PRECURSOR_TEMP_RANGE: Range<f64> = 40.0..50.0;
const PRECURSOR_HUMIDITY_RANGE: Range<f64> = 40.0..60.0;
const PROCESSING_TIME_RANGE: Range<f64> = 100.0..200.0;

/// Plausible stand-in predictions for when the service cannot be used.
///
/// Measurements present in the row are echoed back; everything else is
/// drawn from a fixed band. Batch ids come from row position, never from
/// the row's own `batch_id`.
pub fn synthesize<R: Rng + ?Sized>(
    rows: &[RawRow],
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<PredictionRecord> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let defect = rng.gen_range(DEFECT_RANGE);
            PredictionRecord {
                defect_rate: defect,
                defect_probability: defect,
                avg_particle_size: row
                    .number("particle_size_d50")
                    .unwrap_or_else(|| rng.gen_range(PARTICLE_SIZE_RANGE)),
                conductivity: rng.gen_range(CONDUCTIVITY_RANGE),
                temperature: rng.gen_range(TEMPERATURE_RANGE),
                humidity: rng.gen_range(HUMIDITY_RANGE),
                precursor_room_temp: Some(
                    row.number("precursor_room_temp")
                        .unwrap_or_else(|| rng.gen_range(PRECURSOR_TEMP_RANGE)),
                ),
                precursor_room_humidity: Some(
                    row.number("precursor_room_humidity")
                        .unwrap_or_else(|| rng.gen_range(PRECURSOR_HUMIDITY_RANGE)),
                ),
                precursor_processing_time_min: Some(
                    row.number("precursor_processing_time_min")
                        .unwrap_or_else(|| rng.gen_range(PROCESSING_TIME_RANGE)),
                ),
                batch_id: positional_batch_id(idx),
                timestamp: now,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_csv_text;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_one_record_per_row_with_positional_ids() {
        let table = parse_csv_text("batch_id,particle_size_d50\nB1,120\nB2,130\n");
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc::now();

        let records = synthesize(table.rows(), &mut rng, now);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].batch_id, "BATCH_00001");
        assert_eq!(records[1].batch_id, "BATCH_00002");
        assert_eq!(records[0].avg_particle_size, 120.0);
        assert_eq!(records[1].avg_particle_size, 130.0);
        assert!(records.iter().all(|r| r.timestamp == now));
    }

    #[test]
    fn test_values_stay_in_band() {
        let table = parse_csv_text("x\n1\n2\n3\n4\n5\n6\n7\n8\n");
        let mut rng = StdRng::seed_from_u64(42);
        for record in synthesize(table.rows(), &mut rng, Utc::now()) {
            assert!(DEFECT_RANGE.contains(&record.defect_probability));
            assert_eq!(record.defect_rate, record.defect_probability);
            assert!(PARTICLE_SIZE_RANGE.contains(&record.avg_particle_size));
            assert!(CONDUCTIVITY_RANGE.contains(&record.conductivity));
            assert!(TEMPERATURE_RANGE.contains(&record.temperature));
            assert!(HUMIDITY_RANGE.contains(&record.humidity));
            assert!(PRECURSOR_TEMP_RANGE.contains(&record.precursor_room_temp.unwrap()));
            assert!(PROCESSING_TIME_RANGE.contains(&record.precursor_processing_time_min.unwrap()));
        }
    }

    #[test]
    fn test_zero_and_blank_readings_are_replaced() {
        let table = parse_csv_text("particle_size_d50,precursor_room_temp\n0,\n");
        let mut rng = StdRng::seed_from_u64(1);
        let record = &synthesize(table.rows(), &mut rng, Utc::now())[0];
        assert!(PARTICLE_SIZE_RANGE.contains(&record.avg_particle_size));
        assert!(PRECURSOR_TEMP_RANGE.contains(&record.precursor_room_temp.unwrap()));
    }
}
