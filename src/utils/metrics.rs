use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

use crate::model::schedule::WeeklySchedule;

/// Attendance row reduced to what the aggregations need.
#[derive(Debug, Clone)]
pub struct ShiftRow {
    pub cleaner_id: u64,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
}

/// One selection row flattened to its parsed id list.
#[derive(Debug, Clone)]
pub struct SelectionAgg {
    pub cleaner_id: u64,
    pub qr_code: String,
    pub selected: Vec<u64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PhotoStub {
    pub cleaner_id: u64,
    pub qr_code: String,
    pub task_id: u64,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DayCompliance {
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = 12)]
    pub total: u64,
    #[schema(example = 10)]
    pub completed: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DayHours {
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = 37.5)]
    pub hours: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CleanerOnTime {
    #[schema(example = 7)]
    pub cleaner_id: u64,
    /// Shifts that had a schedule entry to compare against
    #[schema(example = 5)]
    pub considered: u64,
    #[schema(example = 4)]
    pub on_time: u64,
    /// Null when the cleaner has no matching schedule entries, never zero
    #[schema(example = 0.8, nullable = true)]
    pub rate: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoCompliance {
    #[schema(example = 18)]
    pub with_photo: u64,
    #[schema(example = 4)]
    pub without_photo: u64,
}

/// Hours contributed by one shift, clamped to zero and to the query's end
/// boundary. An open shift is approximated with `now` only when it started
/// today; an open shift from an earlier day contributes nothing.
pub fn shift_hours(shift: &ShiftRow, range_end: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let end = match shift.clock_out {
        Some(t) => t,
        None if shift.clock_in.date_naive() == now.date_naive() => now,
        None => return 0.0,
    };

    let end = end.min(range_end);
    let secs = (end - shift.clock_in).num_seconds();
    if secs <= 0 {
        return 0.0;
    }
    secs as f64 / 3600.0
}

/// Total hours per day over the range, a shift attributed to its clock-in day.
pub fn daily_hours(
    shifts: &[ShiftRow],
    from: NaiveDate,
    to: NaiveDate,
    range_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<DayHours> {
    days(from, to)
        .map(|date| {
            let hours = shifts
                .iter()
                .filter(|s| s.clock_in.date_naive() == date)
                .map(|s| shift_hours(s, range_end, now))
                .sum();
            DayHours { date, hours }
        })
        .collect()
}

/// Completed vs total attendance rows per day; a row is completed once it
/// has a clock-out.
pub fn compliance_trend(shifts: &[ShiftRow], from: NaiveDate, to: NaiveDate) -> Vec<DayCompliance> {
    days(from, to)
        .map(|date| {
            let day: Vec<_> = shifts
                .iter()
                .filter(|s| s.clock_in.date_naive() == date)
                .collect();
            DayCompliance {
                date,
                total: day.len() as u64,
                completed: day.iter().filter(|s| s.clock_out.is_some()).count() as u64,
            }
        })
        .collect()
}

/// On-time rate per roster cleaner. Each shift is matched against the
/// closest schedule entry for its weekday; a shift with no entry for that
/// weekday is excluded from the rate rather than counted late. Roster
/// cleaners with nothing to compare report a null rate.
pub fn on_time_rates(
    roster: &[u64],
    shifts: &[ShiftRow],
    schedules: &[WeeklySchedule],
    grace: Duration,
) -> Vec<CleanerOnTime> {
    roster
        .iter()
        .map(|&cleaner_id| {
            let mut considered = 0u64;
            let mut on_time = 0u64;

            for shift in shifts.iter().filter(|s| s.cleaner_id == cleaner_id) {
                let weekday = shift.clock_in.date_naive().weekday().num_days_from_monday() as u8;
                let lateness = schedules
                    .iter()
                    .filter(|e| e.cleaner_id == cleaner_id && e.weekday == weekday)
                    .map(|e| shift.clock_in.time().signed_duration_since(e.start_time))
                    .min_by_key(|late| late.num_seconds().abs());

                if let Some(late) = lateness {
                    considered += 1;
                    if late <= grace {
                        on_time += 1;
                    }
                }
            }

            CleanerOnTime {
                cleaner_id,
                considered,
                on_time,
                rate: (considered > 0).then(|| on_time as f64 / considered as f64),
            }
        })
        .collect()
}

/// Partitions every selected-task instance into with/without a matching
/// photo (same cleaner, QR code, task id and day). The two counts always
/// sum to the number of selected instances.
pub fn photo_compliance(selections: &[SelectionAgg], photos: &[PhotoStub]) -> PhotoCompliance {
    let photographed: HashSet<(u64, &str, u64, NaiveDate)> = photos
        .iter()
        .map(|p| (p.cleaner_id, p.qr_code.as_str(), p.task_id, p.taken_at.date_naive()))
        .collect();

    let mut with_photo = 0u64;
    let mut without_photo = 0u64;

    for sel in selections {
        let day = sel.created_at.date_naive();
        for &task_id in &sel.selected {
            if photographed.contains(&(sel.cleaner_id, sel.qr_code.as_str(), task_id, day)) {
                with_photo += 1;
            } else {
                without_photo += 1;
            }
        }
    }

    PhotoCompliance { with_photo, without_photo }
}

fn days(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d <= to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveTime, TimeZone, Weekday};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn shift(cleaner_id: u64, clock_in: DateTime<Utc>, clock_out: Option<DateTime<Utc>>) -> ShiftRow {
        ShiftRow { cleaner_id, clock_in, clock_out }
    }

    fn entry(cleaner_id: u64, weekday: u8, hms: (u32, u32)) -> WeeklySchedule {
        WeeklySchedule {
            id: 0,
            cleaner_id,
            weekday,
            start_time: NaiveTime::from_hms_opt(hms.0, hms.1, 0).unwrap(),
        }
    }

    #[test]
    fn closed_shift_is_clock_out_minus_clock_in() {
        let s = shift(1, at(2024, 1, 1, 9, 0), Some(at(2024, 1, 1, 17, 0)));
        let range_end = at(2024, 1, 2, 0, 0);
        assert_eq!(shift_hours(&s, range_end, at(2024, 1, 10, 0, 0)), 8.0);
    }

    #[test]
    fn hours_clamp_to_range_end() {
        let s = shift(1, at(2024, 1, 1, 20, 0), Some(at(2024, 1, 2, 4, 0)));
        let range_end = at(2024, 1, 2, 0, 0);
        assert_eq!(shift_hours(&s, range_end, at(2024, 1, 10, 0, 0)), 4.0);
    }

    #[test]
    fn hours_never_negative() {
        // clock_in after range end
        let s = shift(1, at(2024, 1, 3, 9, 0), Some(at(2024, 1, 3, 17, 0)));
        let range_end = at(2024, 1, 2, 0, 0);
        assert_eq!(shift_hours(&s, range_end, at(2024, 1, 10, 0, 0)), 0.0);
    }

    #[test]
    fn open_shift_counts_only_today() {
        let now = at(2024, 1, 2, 12, 0);
        let range_end = at(2024, 1, 3, 0, 0);

        let today = shift(1, at(2024, 1, 2, 9, 0), None);
        assert_eq!(shift_hours(&today, range_end, now), 3.0);

        let stale = shift(1, at(2024, 1, 1, 9, 0), None);
        assert_eq!(shift_hours(&stale, range_end, now), 0.0);
    }

    #[test]
    fn daily_hours_covers_every_day_in_range() {
        let shifts = vec![
            shift(1, at(2024, 1, 1, 9, 0), Some(at(2024, 1, 1, 17, 0))),
            shift(2, at(2024, 1, 1, 10, 0), Some(at(2024, 1, 1, 14, 0))),
            shift(1, at(2024, 1, 3, 9, 0), Some(at(2024, 1, 3, 10, 30))),
        ];
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let out = daily_hours(&shifts, from, to, at(2024, 1, 4, 0, 0), at(2024, 2, 1, 0, 0));

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].hours, 12.0);
        assert_eq!(out[1].hours, 0.0);
        assert_eq!(out[2].hours, 1.5);
    }

    #[test]
    fn trend_counts_completed_vs_total() {
        let shifts = vec![
            shift(1, at(2024, 1, 1, 9, 0), Some(at(2024, 1, 1, 17, 0))),
            shift(2, at(2024, 1, 1, 10, 0), None),
        ];
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let trend = compliance_trend(&shifts, day, day);
        assert_eq!(trend[0].total, 2);
        assert_eq!(trend[0].completed, 1);
    }

    #[test]
    fn no_schedule_means_null_rate_not_zero() {
        // 2024-01-01 is a Monday
        let shifts = vec![shift(1, at(2024, 1, 1, 9, 0), None)];
        let rates = on_time_rates(&[1], &shifts, &[], Duration::minutes(5));
        assert_eq!(rates[0].considered, 0);
        assert_eq!(rates[0].rate, None);
    }

    #[test]
    fn five_minute_grace_is_inclusive() {
        assert_eq!(at(2024, 1, 1, 9, 0).date_naive().weekday(), Weekday::Mon);
        let schedules = vec![entry(1, 0, (9, 0))];
        let shifts = vec![
            shift(1, at(2024, 1, 1, 9, 5), None),  // exactly 5 late: on time
            shift(1, at(2024, 1, 8, 9, 6), None),  // 6 late: late
            shift(1, at(2024, 1, 15, 8, 50), None), // early: on time
        ];
        let rates = on_time_rates(&[1], &shifts, &schedules, Duration::minutes(5));
        assert_eq!(rates[0].considered, 3);
        assert_eq!(rates[0].on_time, 2);
    }

    #[test]
    fn matches_closest_schedule_entry() {
        // Two Monday entries; a 14:02 clock-in must compare against the
        // 14:00 entry, not be marked late against the 06:00 one.
        let schedules = vec![entry(1, 0, (6, 0)), entry(1, 0, (14, 0))];
        let shifts = vec![shift(1, at(2024, 1, 1, 14, 2), None)];
        let rates = on_time_rates(&[1], &shifts, &schedules, Duration::minutes(5));
        assert_eq!(rates[0].on_time, 1);
    }

    #[test]
    fn shift_on_unscheduled_weekday_is_excluded() {
        // Schedule only for Monday; a Tuesday shift must not drag the rate down.
        let schedules = vec![entry(1, 0, (9, 0))];
        let shifts = vec![
            shift(1, at(2024, 1, 1, 9, 0), None), // Monday, on time
            shift(1, at(2024, 1, 2, 13, 0), None), // Tuesday, no entry
        ];
        let rates = on_time_rates(&[1], &shifts, &schedules, Duration::minutes(5));
        assert_eq!(rates[0].considered, 1);
        assert_eq!(rates[0].rate, Some(1.0));
    }

    #[test]
    fn roster_cleaner_without_shifts_reports_zero_counts() {
        let rates = on_time_rates(&[1, 2], &[], &[], Duration::minutes(5));
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[1].considered, 0);
        assert_eq!(rates[1].rate, None);
    }

    #[test]
    fn photo_compliance_partitions_selected_instances() {
        let selections = vec![SelectionAgg {
            cleaner_id: 1,
            qr_code: "QR-1".into(),
            selected: vec![10, 11, 12],
            created_at: at(2024, 1, 1, 9, 0),
        }];
        let photos = vec![
            PhotoStub { cleaner_id: 1, qr_code: "QR-1".into(), task_id: 10, taken_at: at(2024, 1, 1, 9, 30) },
            // same task, wrong day: no match
            PhotoStub { cleaner_id: 1, qr_code: "QR-1".into(), task_id: 11, taken_at: at(2024, 1, 2, 9, 30) },
            // unselected task: ignored
            PhotoStub { cleaner_id: 1, qr_code: "QR-1".into(), task_id: 99, taken_at: at(2024, 1, 1, 9, 30) },
        ];
        let pc = photo_compliance(&selections, &photos);
        assert_eq!(pc.with_photo, 1);
        assert_eq!(pc.without_photo, 2);
        assert_eq!(pc.with_photo + pc.without_photo, 3);
    }
}
