mod common;

use chrono::Duration;
use serde_json::json;

use attendance_tracker::error::AppError;
use attendance_tracker::model::attendance::{AttendancePatch, AttendanceStatus};
use attendance_tracker::model::pagination::PageRequest;
use attendance_tracker::model::role::Role;
use attendance_tracker::service::report_aggregator::DateRange;

use common::{TestContext, at, caller, date};

fn range(start: u32, end: u32) -> DateRange {
    DateRange {
        start_date: Some(date(start)),
        end_date: Some(date(end)),
    }
}

#[actix_web::test]
async fn third_page_of_twenty_five_holds_five_records() {
    let ctx = TestContext::new();
    let jane = ctx.seed_user("Jane", Role::User).await;
    for day in 1..=25 {
        ctx.seed_session(&jane, at(day, 9, 0), 8.0).await;
    }

    let page = ctx
        .reports()
        .user_attendance(
            &caller(&jane),
            DateRange::default(),
            PageRequest::new(Some(3), Some(10), 10),
        )
        .await
        .unwrap();

    assert_eq!(page.attendance.len(), 5);
    assert_eq!(page.pagination.total_pages, 3);
    assert_eq!(page.pagination.total_records, 25);
    assert_eq!(page.pagination.current_page, 3);
    // newest first, so the last page ends with the first day
    assert_eq!(page.attendance.last().unwrap().record.work_date, date(1));
}

#[actix_web::test]
async fn own_history_only_shows_callers_records_in_range() {
    let ctx = TestContext::new();
    let jane = ctx.seed_user("Jane", Role::User).await;
    let amy = ctx.seed_user("Amy", Role::User).await;
    ctx.seed_session(&jane, at(2, 9, 0), 8.0).await;
    ctx.seed_session(&jane, at(3, 9, 0), 8.0).await;
    ctx.seed_session(&jane, at(9, 9, 0), 8.0).await;
    ctx.seed_session(&amy, at(3, 9, 0), 8.0).await;

    let page = ctx
        .reports()
        .user_attendance(&caller(&jane), range(2, 3), PageRequest::new(None, None, 10))
        .await
        .unwrap();

    let days: Vec<_> = page.attendance.iter().map(|e| e.record.work_date).collect();
    assert_eq!(days, vec![date(3), date(2)]);
    assert!(page.attendance.iter().all(|e| e.record.user_id == jane.id));
    assert_eq!(page.pagination.records_per_page, 10);
}

#[actix_web::test]
async fn roster_orders_by_day_then_name_and_filters_by_user() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("Root", Role::Admin).await;
    let zoe = ctx.seed_user("Zoe", Role::User).await;
    let amy = ctx.seed_user("Amy", Role::User).await;
    ctx.seed_session(&zoe, at(2, 8, 0), 8.0).await;
    ctx.seed_session(&amy, at(2, 10, 0), 6.0).await;
    ctx.seed_session(&zoe, at(3, 9, 0), 7.0).await;

    let page = ctx
        .reports()
        .all_users_attendance(
            &caller(&admin),
            DateRange::default(),
            None,
            PageRequest::new(None, None, 20),
        )
        .await
        .unwrap();
    let order: Vec<_> = page
        .attendance
        .iter()
        .map(|e| (e.record.work_date, e.name.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![(date(3), "Zoe"), (date(2), "Amy"), (date(2), "Zoe")]
    );
    assert_eq!(page.pagination.records_per_page, 20);

    let only_amy = ctx
        .reports()
        .all_users_attendance(
            &caller(&admin),
            DateRange::default(),
            Some(amy.id),
            PageRequest::new(None, None, 20),
        )
        .await
        .unwrap();
    assert_eq!(only_amy.pagination.total_records, 1);
}

#[actix_web::test]
async fn admin_operations_are_forbidden_to_users() {
    let ctx = TestContext::new();
    let jane = ctx.seed_user("Jane", Role::User).await;
    let record = ctx.seed_session(&jane, at(2, 9, 0), 8.0).await;
    let who = caller(&jane);

    let roster = ctx
        .reports()
        .all_users_attendance(&who, DateRange::default(), None, PageRequest::new(None, None, 20))
        .await;
    assert!(matches!(roster, Err(AppError::Forbidden(_))));

    let report = ctx.reports().generate_report(&who, range(1, 31), None).await;
    assert!(matches!(report, Err(AppError::Forbidden(_))));

    let update = ctx
        .reports()
        .update_record(&who, record.id, AttendancePatch::default())
        .await;
    assert!(matches!(update, Err(AppError::Forbidden(_))));
}

#[actix_web::test]
async fn report_needs_an_ordered_date_range() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("Root", Role::Admin).await;

    let missing = ctx
        .reports()
        .generate_report(
            &caller(&admin),
            DateRange {
                start_date: Some(date(1)),
                end_date: None,
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(
        missing.to_string(),
        "Start date and end date are required for report generation"
    );

    let inverted = ctx
        .reports()
        .generate_report(&caller(&admin), range(10, 1), None)
        .await;
    assert!(matches!(inverted, Err(AppError::Validation(_))));
}

#[actix_web::test]
async fn empty_range_yields_zero_rows_for_every_user() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("Root", Role::Admin).await;
    let jane = ctx.seed_user("Jane", Role::User).await;
    ctx.seed_session(&jane, at(20, 9, 0), 8.0).await;

    let report = ctx
        .reports()
        .generate_report(&caller(&admin), range(1, 10), None)
        .await
        .unwrap();
    let body = serde_json::to_value(&report).unwrap();

    assert_eq!(body["report"].as_array().unwrap().len(), 2);
    for row in body["report"].as_array().unwrap() {
        assert_eq!(row["total_days_worked"], 0);
        assert_eq!(row["total_hours_worked"], "0.00");
        assert_eq!(row["average_hours_per_day"], "0.00");
    }
    assert_eq!(body["statistics"]["totalUsers"], 2);
    assert_eq!(body["statistics"]["totalHoursAllUsers"], "0.00");
    assert_eq!(body["statistics"]["mostActiveUser"], json!(null));
    assert_eq!(
        body["statistics"]["dateRange"],
        json!({"startDate": "2026-01-01", "endDate": "2026-01-10"})
    );
}

#[actix_web::test]
async fn report_for_unknown_user_has_zero_statistics() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("Root", Role::Admin).await;
    let jane = ctx.seed_user("Jane", Role::User).await;
    ctx.seed_session(&jane, at(5, 9, 0), 8.0).await;

    let report = ctx
        .reports()
        .generate_report(&caller(&admin), range(1, 31), Some(999))
        .await
        .unwrap();
    let body = serde_json::to_value(&report).unwrap();

    assert_eq!(body["report"], json!([]));
    assert_eq!(body["statistics"]["totalUsers"], 0);
    assert_eq!(body["statistics"]["totalHoursAllUsers"], "0.00");
    assert_eq!(body["statistics"]["averageHoursPerUser"], "0.00");
    assert_eq!(body["statistics"]["mostActiveUser"], json!(null));
}

#[actix_web::test]
async fn report_totals_and_most_active_user() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("Root", Role::Admin).await;
    let jane = ctx.seed_user("Jane", Role::User).await;
    let amy = ctx.seed_user("Amy", Role::User).await;
    ctx.seed_session(&jane, at(5, 9, 0), 8.5).await;
    ctx.seed_session(&jane, at(6, 9, 0), 7.25).await;
    ctx.seed_session(&amy, at(5, 9, 0), 4.0).await;
    // still open, counts as a day but adds no hours
    ctx.seed_open_session(&amy, at(6, 9, 0)).await;

    let report = ctx
        .reports()
        .generate_report(&caller(&admin), range(1, 31), None)
        .await
        .unwrap();

    // one row per user, ordered by name
    let names: Vec<_> = report.report.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Amy", "Jane", "Root"]);

    let amy_row = &report.report[0];
    assert_eq!(amy_row.total_days_worked, 2);
    assert_eq!(amy_row.total_hours_worked, "4.00");
    assert_eq!(amy_row.average_hours_per_day, "4.00");
    assert_eq!(amy_row.incomplete_days, 1);

    let jane_row = &report.report[1];
    assert_eq!(jane_row.total_hours_worked, "15.75");
    assert_eq!(jane_row.average_hours_per_day, "7.88");

    let stats = &report.statistics;
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.total_hours_all_users, "19.75");
    assert_eq!(stats.average_hours_per_user, "6.58");
    assert_eq!(stats.most_active_user.as_ref().unwrap().id, jane.id);

    let single = ctx
        .reports()
        .generate_report(&caller(&admin), range(1, 31), Some(amy.id))
        .await
        .unwrap();
    assert_eq!(single.report.len(), 1);
    assert_eq!(single.statistics.most_active_user.unwrap().id, amy.id);
}

#[actix_web::test]
async fn admin_correction_keeps_total_hours() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("Root", Role::Admin).await;
    let jane = ctx.seed_user("Jane", Role::User).await;
    let record = ctx.seed_session(&jane, at(5, 9, 0), 8.0).await;
    ctx.advance(Duration::days(1));

    let patch = AttendancePatch {
        clock_in_time: Some(at(5, 8, 0)),
        notes: Some("Badge reader was down".into()),
        ..Default::default()
    };
    let updated = ctx
        .reports()
        .update_record(&caller(&admin), record.id, patch)
        .await
        .unwrap();

    assert_eq!(updated.clock_in_time, at(5, 8, 0));
    assert_eq!(updated.clock_out_time, record.clock_out_time);
    assert_eq!(updated.notes.as_deref(), Some("Badge reader was down"));
    assert_eq!(updated.status, AttendanceStatus::Completed);
    assert_eq!(updated.total_hours, Some(8.0));
    assert_eq!(updated.updated_at, at(6, 9, 0));
}

#[actix_web::test]
async fn admin_correction_rejects_bad_input() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("Root", Role::Admin).await;
    let jane = ctx.seed_user("Jane", Role::User).await;
    let record = ctx.seed_session(&jane, at(5, 9, 0), 8.0).await;

    let missing = ctx
        .reports()
        .update_record(&caller(&admin), 999, AttendancePatch::default())
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let inverted = AttendancePatch {
        clock_out_time: Some(at(5, 8, 0)),
        ..Default::default()
    };
    let err = ctx
        .reports()
        .update_record(&caller(&admin), record.id, inverted)
        .await;
    assert!(matches!(err, Err(AppError::Validation(_))));
}

#[actix_web::test]
async fn reopening_a_session_next_to_an_active_one_conflicts() {
    let ctx = TestContext::new();
    let admin = ctx.seed_user("Root", Role::Admin).await;
    let jane = ctx.seed_user("Jane", Role::User).await;
    let closed = ctx.seed_session(&jane, at(5, 7, 0), 1.0).await;
    ctx.seed_open_session(&jane, at(5, 9, 0)).await;

    let reopen = AttendancePatch {
        status: Some(AttendanceStatus::Active),
        ..Default::default()
    };
    let err = ctx
        .reports()
        .update_record(&caller(&admin), closed.id, reopen)
        .await
        .unwrap_err();

    assert!(err.is_conflict());
}
