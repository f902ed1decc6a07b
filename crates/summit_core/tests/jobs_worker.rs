use rusqlite::Connection;
use summit_core::db::open_db;
use summit_core::{
    execute_job, CacheMaintainer, ConferenceInput, ConferenceService, Job, JobQueue, NullJobQueue,
    StaticUser, UserIdentity, WorkerJobQueue,
};

#[test]
fn worker_drains_enqueued_jobs_into_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("jobs.db");

    let conn = open_db(&db_path).unwrap();
    seed_nearly_sold_out_conference(&conn, "Almost Gone");

    let queue = WorkerJobQueue::start(&db_path);
    queue.enqueue(Job::RecomputeAnnouncement);
    queue.shutdown();

    let maintainer = CacheMaintainer::new(&conn);
    let announcement = maintainer.announcement().unwrap().unwrap();
    assert!(announcement.contains("Almost Gone"));
}

#[test]
fn duplicate_deliveries_converge_to_the_same_state() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("dupes.db");

    let conn = open_db(&db_path).unwrap();
    seed_nearly_sold_out_conference(&conn, "Almost Gone");

    let queue = WorkerJobQueue::start(&db_path);
    // At-least-once delivery: the same trigger may arrive several times.
    queue.enqueue(Job::RecomputeAnnouncement);
    queue.enqueue(Job::RecomputeAnnouncement);
    queue.enqueue(Job::RecomputeAnnouncement);
    queue.shutdown();

    let maintainer = CacheMaintainer::new(&conn);
    let announcement = maintainer.announcement().unwrap().unwrap();
    assert!(announcement.contains("Almost Gone"));
}

#[test]
fn execute_job_handles_featured_speaker_refreshes() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("featured.db");

    let conn = open_db(&db_path).unwrap();
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(&conn, &jobs).unwrap();
    let organizer = StaticUser(UserIdentity::new(
        "organizer",
        "organizer",
        "organizer@example.com",
    ));
    let conference = service
        .create_conference(
            &organizer,
            &ConferenceInput {
                name: "RustConf".to_string(),
                max_attendees: Some(10),
                ..ConferenceInput::default()
            },
        )
        .unwrap();

    let sessions = summit_core::SessionService::try_new(&conn, &jobs).unwrap();
    for name in ["Talk A", "Talk B"] {
        sessions
            .create_session(
                &organizer,
                conference.conference_id,
                &summit_core::SessionInput {
                    name: name.to_string(),
                    speaker: Some("Niko".to_string()),
                    ..summit_core::SessionInput::default()
                },
            )
            .unwrap();
    }

    execute_job(
        &conn,
        &Job::RecomputeFeaturedSpeaker {
            speaker: "Niko".to_string(),
            conference_id: conference.conference_id,
        },
    )
    .unwrap();

    let entry = CacheMaintainer::new(&conn)
        .featured_speaker(
            conference.conference_id,
            chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        )
        .unwrap()
        .unwrap();
    assert_eq!(entry.speaker, "Niko");
    assert_eq!(entry.session_names, "Talk A, Talk B");
}

fn seed_nearly_sold_out_conference(conn: &Connection, name: &str) {
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(conn, &jobs).unwrap();
    let organizer = StaticUser(UserIdentity::new(
        "organizer",
        "organizer",
        "organizer@example.com",
    ));
    let conference = service
        .create_conference(
            &organizer,
            &ConferenceInput {
                name: name.to_string(),
                max_attendees: Some(10),
                ..ConferenceInput::default()
            },
        )
        .unwrap();
    conn.execute(
        "UPDATE conferences SET seats_available = 2 WHERE conference_id = ?1;",
        [conference.conference_id],
    )
    .unwrap();
}
