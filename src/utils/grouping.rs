use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

/// One photo row joined with its area/customer names, ready for review.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewPhoto {
    #[schema(example = 500)]
    pub id: u64,
    #[schema(example = 7)]
    pub cleaner_id: u64,
    #[schema(example = "Maria Kovacs")]
    pub cleaner_name: String,
    #[schema(example = "QR-0012")]
    pub qr_code: String,
    #[schema(example = "3rd Floor Kitchen")]
    pub area_name: String,
    #[schema(example = "Riverside Business Park")]
    pub customer_name: String,
    #[schema(example = 40)]
    pub task_id: u64,
    #[schema(example = "http://localhost:9000/media/photos/abc.jpg")]
    pub url: String,
    #[schema(example = "2026-01-05T09:15:00Z", value_type = String, format = "date-time")]
    pub taken_at: DateTime<Utc>,
}

/// Task selection reduced to what anchoring needs.
#[derive(Debug, Clone)]
pub struct SessionRef {
    pub cleaner_id: u64,
    pub qr_code: String,
    pub created_at: DateTime<Utc>,
}

/// Photos for one task within one cleaning session.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskGroup {
    #[schema(example = "QR-0012")]
    pub qr_code: String,
    #[schema(example = 40)]
    pub task_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub day: NaiveDate,
    #[schema(example = "2026-01-05T09:10:00Z", value_type = String, format = "date-time")]
    pub session_start: DateTime<Utc>,
    #[schema(example = "2026-01-05T09:15:00Z", value_type = String, format = "date-time")]
    pub latest: DateTime<Utc>,
    pub photos: Vec<ReviewPhoto>,
}

/// Task groups nested under the area their QR code belongs to.
#[derive(Debug, Serialize, ToSchema)]
pub struct AreaGroup {
    #[schema(example = "QR-0012")]
    pub qr_code: String,
    #[schema(example = "3rd Floor Kitchen")]
    pub area_name: String,
    #[schema(example = "Riverside Business Park")]
    pub customer_name: String,
    #[schema(example = "2026-01-05T09:15:00Z", value_type = String, format = "date-time")]
    pub latest: DateTime<Utc>,
    pub tasks: Vec<TaskGroup>,
}

/// Session anchor for a photo: the latest selection by the same cleaner for
/// the same QR code at or before the photo, falling back to midnight of the
/// photo's day. Derived from data only, so grouping does not depend on the
/// order photos arrive in.
pub fn session_anchor(photo: &ReviewPhoto, sessions: &[SessionRef]) -> DateTime<Utc> {
    sessions
        .iter()
        .filter(|s| {
            s.cleaner_id == photo.cleaner_id
                && s.qr_code == photo.qr_code
                && s.created_at <= photo.taken_at
        })
        .map(|s| s.created_at)
        .max()
        .unwrap_or_else(|| {
            photo
                .taken_at
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
        })
}

/// Groups photos by derived task identity (qr_code, task_id, day, session
/// anchor), then nests those groups under their area, both levels sorted by
/// latest photo timestamp descending. Groups are disjoint and cover every
/// input photo exactly once.
pub fn group_photos(photos: Vec<ReviewPhoto>, sessions: &[SessionRef]) -> Vec<AreaGroup> {
    let mut by_task: HashMap<(String, u64, NaiveDate, DateTime<Utc>), Vec<ReviewPhoto>> =
        HashMap::new();

    for photo in photos {
        let anchor = session_anchor(&photo, sessions);
        let key = (photo.qr_code.clone(), photo.task_id, photo.taken_at.date_naive(), anchor);
        by_task.entry(key).or_default().push(photo);
    }

    let mut by_area: HashMap<String, AreaGroup> = HashMap::new();

    for ((qr_code, task_id, day, session_start), mut group) in by_task {
        group.sort_by(|a, b| b.taken_at.cmp(&a.taken_at).then(b.id.cmp(&a.id)));
        let latest = group[0].taken_at;

        let area = by_area.entry(qr_code.clone()).or_insert_with(|| AreaGroup {
            qr_code: qr_code.clone(),
            area_name: group[0].area_name.clone(),
            customer_name: group[0].customer_name.clone(),
            latest,
            tasks: Vec::new(),
        });
        area.latest = area.latest.max(latest);
        area.tasks.push(TaskGroup { qr_code, task_id, day, session_start, latest, photos: group });
    }

    let mut areas: Vec<AreaGroup> = by_area.into_values().collect();
    for area in &mut areas {
        area.tasks.sort_by(|a, b| {
            b.latest
                .cmp(&a.latest)
                .then(a.task_id.cmp(&b.task_id))
                .then(a.session_start.cmp(&b.session_start))
        });
    }
    areas.sort_by(|a, b| b.latest.cmp(&a.latest).then(a.qr_code.cmp(&b.qr_code)));
    areas
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, min, 0).unwrap()
    }

    fn photo(id: u64, qr: &str, task_id: u64, taken_at: DateTime<Utc>) -> ReviewPhoto {
        ReviewPhoto {
            id,
            cleaner_id: 1,
            cleaner_name: "Maria".into(),
            qr_code: qr.into(),
            area_name: format!("Area {qr}"),
            customer_name: "Riverside".into(),
            task_id,
            url: format!("http://media/{id}.jpg"),
            taken_at,
        }
    }

    fn session(qr: &str, created_at: DateTime<Utc>) -> SessionRef {
        SessionRef { cleaner_id: 1, qr_code: qr.into(), created_at }
    }

    fn count_photos(areas: &[AreaGroup]) -> usize {
        areas.iter().flat_map(|a| &a.tasks).map(|t| t.photos.len()).sum()
    }

    #[test]
    fn groups_cover_every_photo_exactly_once() {
        let photos = vec![
            photo(1, "QR-1", 10, at(1, 9, 5)),
            photo(2, "QR-1", 10, at(1, 9, 10)),
            photo(3, "QR-1", 11, at(1, 9, 15)),
            photo(4, "QR-2", 20, at(1, 10, 0)),
        ];
        let sessions = vec![session("QR-1", at(1, 9, 0)), session("QR-2", at(1, 9, 55))];

        let areas = group_photos(photos, &sessions);
        assert_eq!(count_photos(&areas), 4);
        assert_eq!(areas.len(), 2);
    }

    #[test]
    fn reordering_input_does_not_change_membership() {
        let mut photos = vec![
            photo(1, "QR-1", 10, at(1, 9, 5)),
            photo(2, "QR-1", 10, at(1, 9, 10)),
            photo(3, "QR-1", 11, at(1, 9, 15)),
            photo(4, "QR-2", 20, at(1, 10, 0)),
        ];
        let sessions = vec![session("QR-1", at(1, 9, 0))];

        let forward = group_photos(photos.clone(), &sessions);
        photos.reverse();
        let backward = group_photos(photos, &sessions);

        let ids = |areas: &[AreaGroup]| -> Vec<Vec<u64>> {
            areas
                .iter()
                .flat_map(|a| &a.tasks)
                .map(|t| t.photos.iter().map(|p| p.id).collect())
                .collect()
        };
        assert_eq!(ids(&forward), ids(&backward));
    }

    #[test]
    fn separate_sessions_split_same_task_same_day() {
        // Morning and afternoon visits to the same area/task.
        let photos = vec![
            photo(1, "QR-1", 10, at(1, 9, 5)),
            photo(2, "QR-1", 10, at(1, 14, 5)),
        ];
        let sessions = vec![session("QR-1", at(1, 9, 0)), session("QR-1", at(1, 14, 0))];

        let areas = group_photos(photos, &sessions);
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].tasks.len(), 2);
    }

    #[test]
    fn anchor_falls_back_to_midnight_without_a_selection() {
        let p = photo(1, "QR-1", 10, at(1, 9, 5));
        let anchor = session_anchor(&p, &[]);
        assert_eq!(anchor, at(1, 0, 0));

        // a later selection must not anchor an earlier photo
        let anchor = session_anchor(&p, &[session("QR-1", at(1, 9, 30))]);
        assert_eq!(anchor, at(1, 0, 0));
    }

    #[test]
    fn latest_activity_sorts_first() {
        let photos = vec![
            photo(1, "QR-1", 10, at(1, 9, 0)),
            photo(2, "QR-2", 20, at(1, 12, 0)),
        ];
        let areas = group_photos(photos, &[]);
        assert_eq!(areas[0].qr_code, "QR-2");
        assert_eq!(areas[1].qr_code, "QR-1");
    }

    #[test]
    fn photos_within_a_group_sort_newest_first() {
        let photos = vec![
            photo(1, "QR-1", 10, at(1, 9, 0)),
            photo(2, "QR-1", 10, at(1, 9, 20)),
            photo(3, "QR-1", 10, at(1, 9, 10)),
        ];
        let sessions = vec![session("QR-1", at(1, 8, 55))];
        let areas = group_photos(photos, &sessions);
        let ids: Vec<u64> = areas[0].tasks[0].photos.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
