use crate::core::{ArrayValues, DataTyped, SimpleValues};
use crate::utils::error::{HostError, Result};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct DataTypedService;

impl DataTypedService {
    pub fn new() -> Self {
        Self
    }
}

fn join_items<T: Display>(items: &[T]) -> String {
    let parts: Vec<String> = items.iter().map(|item| item.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

fn clamp_i32(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl DataTyped for DataTypedService {
    fn to_simple_text(&self, v: &SimpleValues) -> String {
        format!(
            "y={}, s={}, i={}, l={}, f={}, d={}, b={}, c={}, t={}",
            v.y, v.s, v.i, v.l, v.f, v.d, v.b, v.c, v.t
        )
    }

    fn to_array_text(&self, v: &ArrayValues) -> String {
        format!(
            "y={}, s={}, i={}, l={}, f={}, d={}, b={}, c={}, t={}",
            join_items(&v.y),
            join_items(&v.s),
            join_items(&v.i),
            join_items(&v.l),
            join_items(&v.f),
            join_items(&v.d),
            join_items(&v.b),
            join_items(&v.c),
            join_items(&v.t)
        )
    }

    fn get_line_count(&self, lines: &[String]) -> usize {
        lines.len()
    }

    fn get_file_size(&self, path: &Path) -> Result<u64> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(HostError::invalid_argument(
                "GetFileSize",
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(metadata.len())
    }

    fn allocate_bytes(&self, size: usize, value: u8) -> Vec<u8> {
        vec![value; size]
    }

    fn get_unique(&self, lines: &[String], with_trim: bool) -> BTreeSet<String> {
        if !with_trim {
            return lines.iter().cloned().collect();
        }
        lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn get_double(&self, lines: &BTreeSet<String>) -> Vec<String> {
        lines.iter().chain(lines.iter()).cloned().collect()
    }

    fn get_system_variables(
        &self,
        dts: NaiveDateTime,
        dur: Duration,
        parent: &BTreeMap<String, i32>,
    ) -> BTreeMap<String, i32> {
        let mut vars = parent.clone();

        // Datelike/Timelike 的欄位都在 i32 範圍內
        vars.insert("year".to_string(), dts.year());
        vars.insert("month".to_string(), dts.month() as i32);
        vars.insert("day".to_string(), dts.day() as i32);
        vars.insert("hour".to_string(), dts.hour() as i32);
        vars.insert("minute".to_string(), dts.minute() as i32);
        vars.insert("second".to_string(), dts.second() as i32);
        vars.insert("day_of_year".to_string(), dts.ordinal() as i32);
        vars.insert(
            "weekday".to_string(),
            dts.weekday().number_from_monday() as i32,
        );

        let secs = dur.as_secs();
        vars.insert("duration_days".to_string(), clamp_i32(secs / 86_400));
        vars.insert("duration_hours".to_string(), ((secs / 3_600) % 24) as i32);
        vars.insert("duration_minutes".to_string(), ((secs / 60) % 60) as i32);
        vars.insert("duration_seconds".to_string(), (secs % 60) as i32);
        vars.insert("duration_total_seconds".to_string(), clamp_i32(secs));

        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_to_simple_text() {
        let service = DataTypedService::new();
        let values = SimpleValues {
            y: -3,
            s: 1200,
            i: 42,
            l: 9_000_000_000,
            f: 1.5,
            d: 2.25,
            b: true,
            c: 'x',
            t: "hello".to_string(),
        };
        assert_eq!(
            service.to_simple_text(&values),
            "y=-3, s=1200, i=42, l=9000000000, f=1.5, d=2.25, b=true, c=x, t=hello"
        );
    }

    #[test]
    fn test_to_array_text_with_empty_arrays() {
        let service = DataTypedService::new();
        let values = ArrayValues {
            y: vec![1, 255],
            i: vec![7],
            b: vec![false, true],
            c: vec!['a', 'b'],
            t: lines(&["one", "two"]),
            ..Default::default()
        };
        assert_eq!(
            service.to_array_text(&values),
            "y=[1, 255], s=[], i=[7], l=[], f=[], d=[], b=[false, true], c=[a, b], t=[one, two]"
        );
    }

    #[test]
    fn test_get_line_count_counts_empty_lines() {
        let service = DataTypedService::new();
        assert_eq!(service.get_line_count(&lines(&["a", "", "c"])), 3);
        assert_eq!(service.get_line_count(&[]), 0);
    }

    #[test]
    fn test_get_file_size() {
        let service = DataTypedService::new();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();
        file.flush().unwrap();

        assert_eq!(service.get_file_size(file.path()).unwrap(), 10);
    }

    #[test]
    fn test_get_file_size_rejects_missing_and_directories() {
        let service = DataTypedService::new();
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            service.get_file_size(&dir.path().join("missing.txt")),
            Err(HostError::IoError(_))
        ));
        assert!(matches!(
            service.get_file_size(dir.path()),
            Err(HostError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_allocate_bytes() {
        let service = DataTypedService::new();
        assert_eq!(service.allocate_bytes(4, 0xAB), vec![0xAB; 4]);
        assert!(service.allocate_bytes(0, 1).is_empty());
    }

    #[test]
    fn test_get_unique_with_and_without_trim() {
        let service = DataTypedService::new();
        let input = lines(&[" b", "a", "b", "  ", "a "]);

        let raw = service.get_unique(&input, false);
        assert_eq!(raw.len(), 5);

        let trimmed = service.get_unique(&input, true);
        assert_eq!(trimmed.into_iter().collect::<Vec<_>>(), lines(&["a", "b"]));
    }

    #[test]
    fn test_get_double_repeats_sorted_sequence() {
        let service = DataTypedService::new();
        let set: BTreeSet<String> = lines(&["z", "m"]).into_iter().collect();
        assert_eq!(service.get_double(&set), lines(&["m", "z", "m", "z"]));
    }

    #[test]
    fn test_get_system_variables_overlays_parent() {
        let service = DataTypedService::new();
        let dts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(13, 45, 30)
            .unwrap();
        let dur = Duration::from_secs(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5);
        let mut parent = BTreeMap::new();
        parent.insert("custom".to_string(), 99);
        parent.insert("year".to_string(), 1);

        let vars = service.get_system_variables(dts, dur, &parent);

        assert_eq!(vars["custom"], 99);
        assert_eq!(vars["year"], 2024);
        assert_eq!(vars["month"], 2);
        assert_eq!(vars["day"], 29);
        assert_eq!(vars["hour"], 13);
        assert_eq!(vars["minute"], 45);
        assert_eq!(vars["second"], 30);
        assert_eq!(vars["day_of_year"], 60);
        // 2024-02-29 是星期四
        assert_eq!(vars["weekday"], 4);
        assert_eq!(vars["duration_days"], 2);
        assert_eq!(vars["duration_hours"], 3);
        assert_eq!(vars["duration_minutes"], 4);
        assert_eq!(vars["duration_seconds"], 5);
        assert_eq!(vars["duration_total_seconds"], 183_845);
    }

    #[test]
    fn test_total_seconds_saturates() {
        let service = DataTypedService::new();
        let dts = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let vars = service.get_system_variables(dts, Duration::from_secs(u64::MAX), &BTreeMap::new());
        assert_eq!(vars["duration_total_seconds"], i32::MAX);
        assert_eq!(vars["duration_days"], i32::MAX);
    }
}
