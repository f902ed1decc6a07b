use chrono::NaiveDate;
use rusqlite::Connection;
use summit_core::db::open_db_in_memory;
use summit_core::{
    featured_speaker_key, CacheMaintainer, CacheStore, ConferenceId, ConferenceInput,
    ConferenceService, NullJobQueue, SessionInput, SessionService, StaticUser, UserIdentity,
};

#[test]
fn speaker_with_two_sessions_is_published_under_the_conference_key() {
    let conn = open_db_in_memory().unwrap();
    let conference_id = seed_conference(&conn, "RustConf");
    seed_session(&conn, conference_id, "Borrowck Deep Dive", Some("Niko"), None);
    seed_session(&conn, conference_id, "Async Deep Dive", Some("Niko"), None);

    let maintainer = CacheMaintainer::new(&conn);
    maintainer
        .recompute_featured_speaker("Niko", conference_id)
        .unwrap();

    let entry = maintainer
        .featured_speaker(conference_id, past_date())
        .unwrap()
        .unwrap();
    assert_eq!(entry.speaker, "Niko");
    assert_eq!(entry.session_names, "Async Deep Dive, Borrowck Deep Dive");
}

#[test]
fn speaker_with_one_session_publishes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let conference_id = seed_conference(&conn, "RustConf");
    seed_session(&conn, conference_id, "Solo Talk", Some("Ada"), None);

    let maintainer = CacheMaintainer::new(&conn);
    maintainer
        .recompute_featured_speaker("Ada", conference_id)
        .unwrap();

    let stored = CacheStore::new(&conn)
        .get(&featured_speaker_key(conference_id))
        .unwrap();
    assert_eq!(stored, None);
}

#[test]
fn single_session_speaker_leaves_an_existing_entry_untouched() {
    let conn = open_db_in_memory().unwrap();
    let conference_id = seed_conference(&conn, "RustConf");
    seed_session(&conn, conference_id, "Talk A", Some("Niko"), None);
    seed_session(&conn, conference_id, "Talk B", Some("Niko"), None);
    seed_session(&conn, conference_id, "Solo Talk", Some("Ada"), None);

    let maintainer = CacheMaintainer::new(&conn);
    maintainer
        .recompute_featured_speaker("Niko", conference_id)
        .unwrap();
    maintainer
        .recompute_featured_speaker("Ada", conference_id)
        .unwrap();

    let entry = maintainer
        .featured_speaker(conference_id, past_date())
        .unwrap()
        .unwrap();
    assert_eq!(entry.speaker, "Niko", "Ada must not displace Niko's entry");
}

#[test]
fn later_featured_speaker_wins_the_conference_slot() {
    let conn = open_db_in_memory().unwrap();
    let conference_id = seed_conference(&conn, "RustConf");
    seed_session(&conn, conference_id, "Talk A", Some("Niko"), None);
    seed_session(&conn, conference_id, "Talk B", Some("Niko"), None);
    seed_session(&conn, conference_id, "Lecture A", Some("Grace"), None);
    seed_session(&conn, conference_id, "Lecture B", Some("Grace"), None);

    let maintainer = CacheMaintainer::new(&conn);
    maintainer
        .recompute_featured_speaker("Niko", conference_id)
        .unwrap();
    maintainer
        .recompute_featured_speaker("Grace", conference_id)
        .unwrap();

    let entry = maintainer
        .featured_speaker(conference_id, past_date())
        .unwrap()
        .unwrap();
    assert_eq!(entry.speaker, "Grace");
    assert_eq!(entry.session_names, "Lecture A, Lecture B");
}

#[test]
fn absent_entry_falls_back_to_the_next_upcoming_session_system_wide() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_conference(&conn, "RustConf");
    let second = seed_conference(&conn, "OpsConf");

    // All dated sessions live in the first conference; the second has none.
    seed_session(
        &conn,
        first,
        "Opening Keynote",
        Some("Grace"),
        Some("2026-09-01"),
    );
    seed_session(
        &conn,
        first,
        "Closing Keynote",
        Some("Grace"),
        Some("2026-09-03"),
    );

    let maintainer = CacheMaintainer::new(&conn);
    let today = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();

    // The fallback scans all conferences, not the requested one; asking for
    // the second conference still surfaces the first one's speaker.
    let entry = maintainer.featured_speaker(second, today).unwrap().unwrap();
    assert_eq!(entry.speaker, "Grace");
    assert_eq!(entry.session_names, "Closing Keynote, Opening Keynote");
}

#[test]
fn fallback_returns_none_when_no_upcoming_session_exists() {
    let conn = open_db_in_memory().unwrap();
    let conference_id = seed_conference(&conn, "RustConf");
    seed_session(
        &conn,
        conference_id,
        "Past Talk",
        Some("Ada"),
        Some("2020-01-15"),
    );

    let maintainer = CacheMaintainer::new(&conn);
    let today = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
    assert!(maintainer
        .featured_speaker(conference_id, today)
        .unwrap()
        .is_none());
}

fn organizer() -> StaticUser {
    StaticUser(UserIdentity::new(
        "organizer",
        "organizer",
        "organizer@example.com",
    ))
}

fn past_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
}

fn seed_conference(conn: &Connection, name: &str) -> ConferenceId {
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(conn, &jobs).unwrap();
    service
        .create_conference(
            &organizer(),
            &ConferenceInput {
                name: name.to_string(),
                max_attendees: Some(100),
                ..ConferenceInput::default()
            },
        )
        .unwrap()
        .conference_id
}

fn seed_session(
    conn: &Connection,
    conference_id: ConferenceId,
    name: &str,
    speaker: Option<&str>,
    date: Option<&str>,
) {
    let jobs = NullJobQueue;
    let service = SessionService::try_new(conn, &jobs).unwrap();
    service
        .create_session(
            &organizer(),
            conference_id,
            &SessionInput {
                name: name.to_string(),
                speaker: speaker.map(str::to_string),
                date: date.map(str::to_string),
                ..SessionInput::default()
            },
        )
        .unwrap();
}
