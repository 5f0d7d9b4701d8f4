use batchpredict::{
    export::export_rows,
    history::{HistoryBuffer, HISTORY_CAPACITY},
    ingest::parse_csv_text,
    predict::PredictionRecord,
    search::{search, BatchCursor, SEARCH_RESULT_LIMIT},
};
use chrono::{NaiveDate, Utc};
use proptest::prelude::*;

fn cell() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.]{1,8}"
}

/// Header width and ragged data lines (each 0..=width+2 values).
fn ragged_csv() -> impl Strategy<Value = (usize, Vec<Vec<String>>)> {
    (1usize..8).prop_flat_map(|width| {
        (
            Just(width),
            prop::collection::vec(prop::collection::vec(cell(), 1..=width + 2), 0..20),
        )
    })
}

fn header(width: usize) -> String {
    (0..width).map(|i| format!("col{}", i)).collect::<Vec<_>>().join(",")
}

fn record(batch_id: String) -> PredictionRecord {
    PredictionRecord {
        defect_rate: 5.0,
        defect_probability: 5.0,
        avg_particle_size: 125.0,
        conductivity: 85.0,
        temperature: 25.0,
        humidity: 50.0,
        precursor_room_temp: None,
        precursor_room_humidity: None,
        precursor_processing_time_min: None,
        batch_id,
        timestamp: Utc::now(),
    }
}

proptest! {
    #[test]
    fn parse_yields_one_row_per_line_with_full_width((width, lines) in ragged_csv()) {
        let mut text = header(width);
        for line in &lines {
            text.push('\n');
            text.push_str(&line.join(","));
        }

        let table = parse_csv_text(&text);
        prop_assert_eq!(table.len(), lines.len());
        for row in table.rows() {
            prop_assert_eq!(row.len(), width);
            prop_assert_eq!(row.iter().count(), width);
        }
    }

    #[test]
    fn export_then_parse_roundtrips((width, lines) in ragged_csv()) {
        let mut text = header(width);
        for line in &lines {
            text.push_str("\n ");
            text.push_str(&line.join(" , "));
        }
        let table = parse_csv_text(&text);
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        match export_rows(&table, today) {
            None => prop_assert!(lines.is_empty()),
            Some(export) => {
                let reparsed = parse_csv_text(&export.contents);
                prop_assert_eq!(reparsed.columns(), table.columns());
                prop_assert_eq!(reparsed.len(), table.len());
                for (a, b) in table.rows().iter().zip(reparsed.rows()) {
                    prop_assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
                }
            }
        }
    }

    #[test]
    fn history_keeps_most_recent_fifty(runs in prop::collection::vec(1usize..30, 1..10)) {
        let mut history = HistoryBuffer::new();
        let mut appended = Vec::new();
        for (r, size) in runs.iter().enumerate() {
            let batch: Vec<PredictionRecord> =
                (0..*size).map(|i| record(format!("r{}-{}", r, i))).collect();
            appended.extend(batch.iter().map(|p| p.batch_id.clone()));
            history.append(&batch);
        }

        let expected: Vec<String> = appended
            .iter()
            .skip(appended.len().saturating_sub(HISTORY_CAPACITY))
            .cloned()
            .collect();
        let actual: Vec<String> = history.iter().map(|e| e.batch_id.clone()).collect();
        prop_assert_eq!(history.len(), appended.len().min(HISTORY_CAPACITY));
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn cursor_never_leaves_range(len in 0usize..6, ops in prop::collection::vec(0u8..3, 0..40), picks in prop::collection::vec(0usize..10, 40)) {
        let mut cursor = BatchCursor::default();
        cursor.reset(len);
        for (op, pick) in ops.iter().zip(picks) {
            match op {
                0 => { cursor.next(len); }
                1 => { cursor.previous(len); }
                _ => { cursor.select(pick, len); }
            }
            match cursor.get() {
                Some(i) => prop_assert!(i < len),
                None => prop_assert_eq!(len, 0),
            }
        }
    }

    #[test]
    fn empty_term_returns_everything_up_to_cap(n in 0usize..260) {
        let mut text = String::from("batch_id\n");
        for i in 0..n {
            text.push_str(&format!("LOT{}\n", i));
        }
        let table = parse_csv_text(&text);

        let all = search(table.rows(), "");
        prop_assert_eq!(all.hits.len(), n.min(SEARCH_RESULT_LIMIT));
        prop_assert_eq!(all.remaining, n.saturating_sub(SEARCH_RESULT_LIMIT));

        let none = search(table.rows(), "zzz");
        prop_assert!(none.hits.is_empty());
        prop_assert_eq!(none.remaining, 0);
    }
}
