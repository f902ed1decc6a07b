use rusqlite::Connection;
use summit_core::db::open_db_in_memory;
use summit_core::{
    Anonymous, ConferenceId, ConferenceInput, ConferenceService, ConferenceServiceError,
    NullJobQueue, RegistrationService, StaticUser, UserIdentity,
};

#[test]
fn create_applies_documented_defaults() {
    let conn = open_db_in_memory().unwrap();
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(&conn, &jobs).unwrap();

    let conference = service
        .create_conference(
            &organizer(),
            &ConferenceInput {
                name: "Minimal".to_string(),
                ..ConferenceInput::default()
            },
        )
        .unwrap();

    assert_eq!(conference.city, "Default City");
    assert_eq!(conference.topics, vec!["Default", "Topic"]);
    assert_eq!(conference.month, 0);
    assert_eq!(conference.max_attendees, 0);
    assert_eq!(conference.seats_available, 0);
}

#[test]
fn create_derives_month_and_initializes_seats_from_max_attendees() {
    let conn = open_db_in_memory().unwrap();
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(&conn, &jobs).unwrap();

    let conference = service
        .create_conference(
            &organizer(),
            &ConferenceInput {
                name: "June Conf".to_string(),
                start_date: Some("2026-06-15".to_string()),
                end_date: Some("2026-06-17".to_string()),
                max_attendees: Some(120),
                ..ConferenceInput::default()
            },
        )
        .unwrap();

    assert_eq!(conference.month, 6);
    assert_eq!(conference.seats_available, 120);

    let stored = service.conference(conference.conference_id).unwrap();
    assert_eq!(stored.conference, conference);
}

#[test]
fn create_accepts_datetime_strings_by_truncating_to_the_date() {
    let conn = open_db_in_memory().unwrap();
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(&conn, &jobs).unwrap();

    let conference = service
        .create_conference(
            &organizer(),
            &ConferenceInput {
                name: "Timestamped".to_string(),
                start_date: Some("2026-11-02T09:00:00".to_string()),
                ..ConferenceInput::default()
            },
        )
        .unwrap();

    assert_eq!(conference.month, 11);
}

#[test]
fn create_rejects_blank_name_and_malformed_dates() {
    let conn = open_db_in_memory().unwrap();
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(&conn, &jobs).unwrap();

    let name_err = service
        .create_conference(
            &organizer(),
            &ConferenceInput {
                name: "   ".to_string(),
                ..ConferenceInput::default()
            },
        )
        .unwrap_err();
    assert!(matches!(name_err, ConferenceServiceError::NameRequired));

    let date_err = service
        .create_conference(
            &organizer(),
            &ConferenceInput {
                name: "Bad Date".to_string(),
                start_date: Some("June 1st".to_string()),
                ..ConferenceInput::default()
            },
        )
        .unwrap_err();
    assert!(matches!(date_err, ConferenceServiceError::InvalidDate(_)));
}

#[test]
fn create_requires_authentication() {
    let conn = open_db_in_memory().unwrap();
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(&conn, &jobs).unwrap();

    let err = service
        .create_conference(
            &Anonymous,
            &ConferenceInput {
                name: "Nope".to_string(),
                ..ConferenceInput::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ConferenceServiceError::NotAuthenticated));
}

#[test]
fn conference_view_carries_the_organizer_display_name() {
    let conn = open_db_in_memory().unwrap();
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(&conn, &jobs).unwrap();

    let conference_id = create_named(&service, "Viewable");
    let view = service.conference(conference_id).unwrap();
    assert_eq!(view.organizer_display_name, "organizer");

    let missing = service.conference(conference_id + 100).unwrap_err();
    assert!(matches!(
        missing,
        ConferenceServiceError::ConferenceNotFound(_)
    ));
}

#[test]
fn conferences_created_lists_only_the_callers_conferences_by_name() {
    let conn = open_db_in_memory().unwrap();
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(&conn, &jobs).unwrap();

    create_named(&service, "Zulu");
    create_named(&service, "Alpha");

    let other = StaticUser(UserIdentity::new("other", "other", "other@example.com"));
    service
        .create_conference(
            &other,
            &ConferenceInput {
                name: "Foreign".to_string(),
                ..ConferenceInput::default()
            },
        )
        .unwrap();

    let created = service.conferences_created(&organizer()).unwrap();
    let names: Vec<_> = created
        .iter()
        .map(|view| view.conference.name.as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "Zulu"]);
}

#[test]
fn last_chance_lists_conferences_with_one_or_two_seats() {
    let conn = open_db_in_memory().unwrap();
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(&conn, &jobs).unwrap();

    for (name, seats) in [("Gone", 0), ("Almost", 1), ("Close", 2), ("Roomy", 3)] {
        let conference = service
            .create_conference(
                &organizer(),
                &ConferenceInput {
                    name: name.to_string(),
                    max_attendees: Some(10),
                    ..ConferenceInput::default()
                },
            )
            .unwrap();
        force_seats(&conn, conference.conference_id, seats);
    }

    let last_chance = service.last_chance_conferences().unwrap();
    let names: Vec<_> = last_chance
        .iter()
        .map(|conference| conference.name.as_str())
        .collect();
    assert_eq!(names, vec!["Almost", "Close"]);
}

#[test]
fn conferences_to_attend_follow_registration_order() {
    let conn = open_db_in_memory().unwrap();
    let jobs = NullJobQueue;
    let service = ConferenceService::try_new(&conn, &jobs).unwrap();

    let zulu = create_with_seats(&service, "Zulu", 10);
    let alpha = create_with_seats(&service, "Alpha", 10);

    let registration = RegistrationService::try_new(&conn, &jobs).unwrap();
    let attendee = StaticUser(UserIdentity::new("alice", "alice", "alice@example.com"));
    registration.register(&attendee, zulu).unwrap();
    registration.register(&attendee, alpha).unwrap();

    let attending = service.conferences_to_attend(&attendee).unwrap();
    let names: Vec<_> = attending
        .iter()
        .map(|view| view.conference.name.as_str())
        .collect();
    assert_eq!(names, vec!["Zulu", "Alpha"], "list order, not name order");
}

fn organizer() -> StaticUser {
    StaticUser(UserIdentity::new(
        "organizer",
        "organizer",
        "organizer@example.com",
    ))
}

fn create_named(service: &ConferenceService<'_>, name: &str) -> ConferenceId {
    create_with_seats(service, name, 0)
}

fn create_with_seats(
    service: &ConferenceService<'_>,
    name: &str,
    max_attendees: i64,
) -> ConferenceId {
    service
        .create_conference(
            &organizer(),
            &ConferenceInput {
                name: name.to_string(),
                max_attendees: Some(max_attendees),
                ..ConferenceInput::default()
            },
        )
        .unwrap()
        .conference_id
}

fn force_seats(conn: &Connection, conference_id: ConferenceId, seats_available: i64) {
    conn.execute(
        "UPDATE conferences SET seats_available = ?2 WHERE conference_id = ?1;",
        rusqlite::params![conference_id, seats_available],
    )
    .unwrap();
}
