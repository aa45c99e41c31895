use mydesk_sync::{
    keys, AttendanceKind, AttendanceMap, AttendanceRecord, Collection, LocalStore,
    LocalStoreExt, MemoryLocalStore, MemoryRemoteStore, MigrationFlag, OfficeChangeDetection,
    Profile, Reconciler, RegisterEntry, RegisterKind, RemoteCall, Task,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::watch;

const PDF: &str = "data:application/pdf;base64,JVBERi0xLjQK";

fn local_with(entries: &[(&str, Value)]) -> Arc<MemoryLocalStore> {
    let store = MemoryLocalStore::new();
    for (key, value) in entries {
        store.set(key, value);
    }
    Arc::new(store)
}

fn remote_entry(file_no: &str) -> RegisterEntry {
    RegisterEntry {
        id: Some(format!("srv-{file_no}")),
        file_no: file_no.to_string(),
        from_office: Some("HR".to_string()),
        ..RegisterEntry::default()
    }
}

fn remote_task(id: &str, title: &str, due: &str) -> Task {
    Task {
        id: Some(id.to_string()),
        title: title.to_string(),
        due_date: due.to_string(),
        ..Task::default()
    }
}

fn reconciler(local: &Arc<MemoryLocalStore>, remote: &Arc<MemoryRemoteStore>) -> Reconciler {
    Reconciler::new(local.clone(), remote.clone())
}

fn creates(remote: &MemoryRemoteStore) -> usize {
    remote
        .write_calls()
        .iter()
        .filter(|c| matches!(c, RemoteCall::CreateRegister { .. } | RemoteCall::CreateTask { .. }))
        .count()
}

#[tokio::test]
async fn test_inward_entry_migrated_once() {
    let local = local_with(&[(
        keys::INWARD,
        json!([{
            "id": 1,
            "fileNo": "101/GA/2025",
            "fromOffice": "HR",
            "document": { "name": "scan.pdf", "type": "application/pdf", "size": 9, "data": PDF }
        }]),
    )]);
    let remote = Arc::new(MemoryRemoteStore::new());

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.inward.created, 1);

    let stored = remote.registers(RegisterKind::Inward);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].file_no, "101/GA/2025");
    assert_eq!(stored[0].from_office.as_deref(), Some("HR"));

    remote.clear_calls();
    let second = reconciler(&local, &remote).reconcile().await;
    assert_eq!(second.inward.created, 0);
    assert_eq!(second.inward.skipped, 1);
    assert_eq!(creates(&remote), 0);
}

#[tokio::test]
async fn test_register_file_numbers_compared_case_insensitively() {
    let local = local_with(&[(
        keys::INWARD,
        json!([{ "fileNo": "ab/12", "fromOffice": "HR", "document": { "name": "a.pdf", "data": PDF } }]),
    )]);
    let remote = Arc::new(
        MemoryRemoteStore::new().with_registers(RegisterKind::Inward, vec![remote_entry("AB/12")]),
    );

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.inward.created, 0);
    assert_eq!(report.inward.skipped, 1);
    assert_eq!(creates(&remote), 0);
}

#[tokio::test]
async fn test_register_skip_rules() {
    let local = local_with(&[(
        keys::OUTWARD,
        json!([
            { "fileNo": "", "toOffice": "HR", "document": { "name": "a.pdf", "data": PDF } },
            { "fileNo": "2", "toOffice": "HR", "document": { "name": "a.pdf", "size": 3 } },
            { "fileNo": "3", "document": { "name": "a.pdf", "data": PDF } },
            { "fileNo": "4", "to": "Accounts Section", "document": { "name": "b.pdf", "data": PDF } }
        ]),
    )]);
    let remote = Arc::new(MemoryRemoteStore::new());

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.outward.created, 1);
    assert_eq!(report.outward.skipped, 3);

    let stored = remote.registers(RegisterKind::Outward);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].to_office.as_deref(), Some("Accounts Section"));
}

#[tokio::test]
async fn test_failed_create_is_counted_and_run_continues() {
    let local = local_with(&[(
        keys::INWARD,
        json!([
            { "fileNo": "1", "fromOffice": "HR", "document": { "name": "a.pdf", "data": PDF } },
            { "fileNo": "2", "fromOffice": "HR", "document": { "name": "b.pdf", "data": PDF } }
        ]),
    )]);
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.fail_create("1");

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.inward.failed, 1);
    assert_eq!(report.inward.created, 1);
    assert_eq!(report.inward.errors.len(), 1);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn test_duplicated_local_entries_create_once() {
    let entry = json!({ "fileNo": "7", "fromOffice": "HR", "document": { "name": "a.pdf", "data": PDF } });
    let local = local_with(&[(keys::INWARD, json!([entry, entry]))]);
    let remote = Arc::new(MemoryRemoteStore::new());

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.inward.created, 1);
    assert_eq!(report.inward.skipped, 1);
    assert_eq!(creates(&remote), 1);
}

#[tokio::test]
async fn test_attendance_upserted_only_when_different() {
    let local = local_with(&[(
        keys::ATTENDANCE,
        json!({
            "2025-01-05": { "type": "present" },
            "2025-01-06": { "type": "casual_leave", "reason": "family" },
            "2025-01-07": { "type": "present" }
        }),
    )]);
    let mut existing = AttendanceMap::new();
    existing.insert(
        "2025-01-06".to_string(),
        AttendanceRecord {
            reason: Some("family".to_string()),
            ..AttendanceRecord::new(AttendanceKind::CasualLeave)
        }
        .to_value(),
    );
    existing.insert(
        "2025-01-07".to_string(),
        AttendanceRecord::new(AttendanceKind::OfficialTravel).to_value(),
    );
    let remote = Arc::new(MemoryRemoteStore::new().with_attendance(existing));

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.attendance.created, 1);
    assert_eq!(report.attendance.updated, 1);
    assert_eq!(report.attendance.skipped, 1);

    let upserts: Vec<RemoteCall> = remote
        .write_calls()
        .into_iter()
        .filter(|c| matches!(c, RemoteCall::UpsertAttendance(_)))
        .collect();
    assert_eq!(
        upserts,
        vec![
            RemoteCall::UpsertAttendance("2025-01-05".to_string()),
            RemoteCall::UpsertAttendance("2025-01-07".to_string()),
        ]
    );
    assert_eq!(remote.attendance()["2025-01-07"], json!({ "type": "present" }));
}

#[tokio::test]
async fn test_identical_attendance_makes_no_calls() {
    let local = local_with(&[(keys::ATTENDANCE, json!({ "2025-01-05": { "type": "present" } }))]);
    let mut existing = AttendanceMap::new();
    existing.insert(
        "2025-01-05".to_string(),
        AttendanceRecord::new(AttendanceKind::Present).to_value(),
    );
    let remote = Arc::new(MemoryRemoteStore::new().with_attendance(existing));

    reconciler(&local, &remote).reconcile().await;
    assert!(remote.write_calls().is_empty());
}

#[tokio::test]
async fn test_attendance_compared_as_written() {
    let local = local_with(&[(
        keys::ATTENDANCE,
        json!({
            "2025-01-05": { "type": "present", "reason": null },
            "2025-01-06": { "type": "present", "updatedAt": 1736121600000u64 },
            "2025-01-07": null,
            "2025-01-08": { "in": "09:00", "out": "17:30" }
        }),
    )]);
    let mut existing = AttendanceMap::new();
    existing.insert("2025-01-05".to_string(), json!({ "type": "present" }));
    let remote = Arc::new(MemoryRemoteStore::new().with_attendance(existing));

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.attendance.updated, 1);
    assert_eq!(report.attendance.created, 2);
    assert_eq!(report.attendance.skipped, 1);
    assert_eq!(report.attendance.failed, 0);

    let stored = remote.attendance();
    assert_eq!(stored["2025-01-05"], json!({ "type": "present", "reason": null }));
    assert_eq!(stored["2025-01-06"]["updatedAt"], json!(1736121600000u64));
    assert_eq!(stored["2025-01-08"], json!({ "in": "09:00", "out": "17:30" }));
    assert!(!stored.contains_key("2025-01-07"));

    // Everything now matches
    remote.clear_calls();
    let second = reconciler(&local, &remote).reconcile().await;
    assert_eq!(second.attendance.writes(), 0);
    assert!(remote.write_calls().is_empty());
}

#[tokio::test]
async fn test_register_entries_with_null_text_fields_are_pushed() {
    let local = local_with(&[
        (
            keys::INWARD,
            json!([{
                "fileNo": "5/A",
                "fromOffice": "HR",
                "subject": null,
                "note": null,
                "document": { "name": "a.pdf", "type": null, "data": PDF }
            }]),
        ),
        (
            keys::OUTWARD,
            json!([{
                "fileNo": 77,
                "to": "Accounts Section",
                "subject": "",
                "note": null,
                "date": null,
                "document": { "name": "b.pdf", "size": "9", "data": PDF }
            }]),
        ),
    ]);
    let remote = Arc::new(MemoryRemoteStore::new());

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.inward.created, 1);
    assert_eq!(report.outward.created, 1);

    let inward = remote.registers(RegisterKind::Inward);
    assert_eq!(inward[0].subject, "");
    assert_eq!(inward[0].note, "");
    let outward = remote.registers(RegisterKind::Outward);
    assert_eq!(outward[0].file_no, "77");
    assert_eq!(outward[0].to_office.as_deref(), Some("Accounts Section"));
}

#[tokio::test]
async fn test_tasks_with_empty_optional_fields_are_created() {
    let local = local_with(&[(
        keys::TASKS,
        json!([
            { "id": "a", "title": "Dispatch letters", "dueDate": "2025-01-10", "relatedDocId": null },
            { "id": "b", "title": "Stock check", "dueDate": "2025-01-11", "priority": "" },
            { "id": "c", "title": "Leave file", "dueDate": "2025-01-12", "description": null, "status": "" },
            { "id": 4, "title": "Audit", "dueDate": "2025-01-13", "priority": "Urgent", "updatedAt": 1736121600000u64 }
        ]),
    )]);
    let remote = Arc::new(MemoryRemoteStore::new());

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.tasks.created, 4);
    assert_eq!(report.tasks.skipped, 0);

    for task in remote.tasks() {
        assert_eq!(task.priority, mydesk_sync::TaskPriority::Medium, "{}", task.title);
        assert_eq!(task.status, mydesk_sync::TaskStatus::Pending, "{}", task.title);
        assert_eq!(task.description, "");
        assert_eq!(task.related_doc_id, "");
    }
}

#[tokio::test]
async fn test_profile_with_numeric_timestamp() {
    let remote_profile: Profile =
        serde_json::from_value(json!({ "name": "Server", "updatedAt": "2025-01-01T00:00:00Z" }))
            .unwrap();
    // 2025-01-06 in epoch millis
    let local = local_with(&[(
        keys::PROFILE,
        json!({ "name": "Local", "updatedAt": 1736121600000u64 }),
    )]);
    let remote = Arc::new(MemoryRemoteStore::new().with_profile(remote_profile));

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.profile.updated, 1);
    assert_eq!(remote.profile().fields["name"], "Local");
}

#[tokio::test]
async fn test_tasks_deduplicated_by_id_and_signature() {
    let local = local_with(&[(
        keys::TASKS,
        json!([
            { "id": "t1", "title": "Anything", "dueDate": "2025-02-01" },
            { "id": "local-2", "title": "FILE RETURNS", "dueDate": "2025-03-01" },
            { "id": "local-3", "title": "File returns", "dueDate": "2025-04-01", "priority": "High" }
        ]),
    )]);
    let remote = Arc::new(MemoryRemoteStore::new().with_tasks(vec![
        remote_task("t1", "Something else", "2025-01-01"),
        remote_task("t2", "file returns", "2025-03-01"),
    ]));

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.tasks.created, 1);
    assert_eq!(report.tasks.skipped, 2);

    let tasks = remote.tasks();
    let created = tasks
        .iter()
        .find(|t| t.due_date == "2025-04-01")
        .unwrap();
    assert_ne!(created.id.as_deref(), Some("local-3"));
    assert_eq!(created.priority, mydesk_sync::TaskPriority::High);
    assert_eq!(created.status, mydesk_sync::TaskStatus::Pending);
    assert_eq!(created.description, "");
}

#[tokio::test]
async fn test_profile_only_pushed_when_strictly_newer() {
    let remote_profile: Profile =
        serde_json::from_value(json!({ "name": "Server", "updatedAt": "2025-02-01T00:00:00Z" }))
            .unwrap();

    let older = local_with(&[(
        keys::PROFILE,
        json!({ "name": "Local", "updatedAt": "2025-01-01T00:00:00Z" }),
    )]);
    let remote = Arc::new(MemoryRemoteStore::new().with_profile(remote_profile.clone()));
    let report = reconciler(&older, &remote).reconcile().await;
    assert_eq!(report.profile.updated, 0);
    assert!(remote.write_calls().is_empty());

    let newer = local_with(&[(
        keys::PROFILE,
        json!({ "name": "Local", "updatedAt": "2025-03-01T00:00:00Z" }),
    )]);
    let report = reconciler(&newer, &remote).reconcile().await;
    assert_eq!(report.profile.updated, 1);
    assert_eq!(remote.profile().fields["name"], "Local");

    let garbage = local_with(&[(keys::PROFILE, json!({ "name": "X", "updatedAt": "yesterday" }))]);
    let remote = Arc::new(MemoryRemoteStore::new());
    let report = reconciler(&garbage, &remote).reconcile().await;
    assert_eq!(report.profile.updated, 0);
    assert_eq!(report.profile.skipped, 1);
}

#[tokio::test]
async fn test_offices_length_heuristic() {
    let remote_offices = vec!["Accounts Section".to_string(), "HR Department".to_string()];

    // Same length after merge: nothing pushed
    let local = local_with(&[(keys::OFFICES, json!(["hr department", " Accounts Section "]))]);
    let remote = Arc::new(MemoryRemoteStore::new().with_offices(remote_offices.clone()));
    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.offices.updated, 0);
    assert!(remote.write_calls().is_empty());

    // New office: merged list pushed
    let local = local_with(&[(keys::OFFICES, json!(["Dispatch", "", null]))]);
    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.offices.updated, 1);
    assert_eq!(
        remote.offices(),
        vec!["Accounts Section", "Dispatch", "HR Department"]
    );
}

#[tokio::test]
async fn test_offices_full_equality_detects_reordering() {
    let remote = Arc::new(
        MemoryRemoteStore::new().with_offices(vec!["b".to_string(), "a".to_string()]),
    );
    let local = local_with(&[]);

    let report = reconciler(&local, &remote).reconcile().await;
    assert_eq!(report.offices.updated, 0);

    let report = reconciler(&local, &remote)
        .with_office_detection(OfficeChangeDetection::FullEquality)
        .reconcile()
        .await;
    assert_eq!(report.offices.updated, 1);
    assert_eq!(remote.offices(), vec!["a", "b"]);
}

#[tokio::test]
async fn test_fetch_failure_skips_only_that_collection() {
    let local = local_with(&[
        (
            keys::INWARD,
            json!([{ "fileNo": "1", "fromOffice": "HR", "document": { "name": "a.pdf", "data": PDF } }]),
        ),
        (keys::TASKS, json!([{ "title": "Call", "dueDate": "2025-01-01" }])),
    ]);
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.fail_fetch(Collection::Inward);

    let report = reconciler(&local, &remote).reconcile().await;
    assert!(report.inward.fetch_failed);
    assert_eq!(report.inward.created, 0);
    assert!(remote.registers(RegisterKind::Inward).is_empty());
    assert_eq!(report.tasks.created, 1);
}

#[tokio::test]
async fn test_second_run_creates_nothing() {
    let local = local_with(&[
        (
            keys::INWARD,
            json!([{ "fileNo": "IN-1", "fromOffice": "HR", "document": { "name": "a.pdf", "data": PDF } }]),
        ),
        (
            keys::OUTWARD,
            json!([{ "fileNo": "OUT-1", "toOffice": "HR", "document": { "name": "a.pdf", "data": PDF } }]),
        ),
        (keys::TASKS, json!([{ "id": 5, "title": "Call", "dueDate": "2025-01-01" }])),
    ]);
    let remote = Arc::new(MemoryRemoteStore::new());

    let first = reconciler(&local, &remote).reconcile().await;
    assert_eq!(first.total_created(), 3);

    remote.clear_calls();
    let second = reconciler(&local, &remote).reconcile().await;
    assert_eq!(second.inward.created + second.outward.created + second.tasks.created, 0);
    assert_eq!(creates(&remote), 0);
}

#[tokio::test]
async fn test_run_respects_flag_and_signals_busy() {
    let local = local_with(&[(keys::TASKS, json!([{ "title": "Call", "dueDate": "2025-01-01" }]))]);
    let remote = Arc::new(MemoryRemoteStore::new());
    let (tx, mut rx) = watch::channel(false);

    let reconciler = reconciler(&local, &remote).with_busy_signal(tx);

    let skipped = reconciler.run(MigrationFlag::MIGRATED).await;
    assert!(skipped.report.is_none());
    assert!(remote.calls().is_empty());
    assert!(!rx.has_changed().unwrap());

    let outcome = reconciler.run(MigrationFlag::PENDING).await;
    assert!(outcome.flag.is_set());
    assert_eq!(outcome.report.unwrap().tasks.created, 1);
    assert!(rx.has_changed().unwrap());
    assert!(!*rx.borrow_and_update());
}

#[tokio::test]
async fn test_run_persisted_sets_flag_even_after_failures() {
    let local = local_with(&[(
        keys::INWARD,
        json!([{ "fileNo": "1", "fromOffice": "HR", "document": { "name": "a.pdf", "data": PDF } }]),
    )]);
    let remote = Arc::new(MemoryRemoteStore::new());
    remote.fail_create("1");

    let first = reconciler(&local, &remote).run_persisted().await;
    assert_eq!(first.report.unwrap().inward.failed, 1);
    assert_eq!(local.get_raw(keys::MIGRATED).unwrap().as_deref(), Some("1"));

    remote.clear_calls();
    let second = reconciler(&local, &remote).run_persisted().await;
    assert!(second.report.is_none());
    assert!(remote.calls().is_empty());
}
