use summit_core::db::open_db_in_memory;
use summit_core::{
    Anonymous, ProfileService, ProfileServiceError, ProfileUpdate, ShirtSize,
    SqliteProfileRepository, StaticUser, UserIdentity,
};

#[test]
fn first_access_creates_a_default_profile() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    let profile = service.profile(&wesley()).unwrap();
    assert_eq!(profile.user_id, "wesley");
    assert_eq!(profile.display_name, "Wesley");
    assert_eq!(profile.main_email, "wesley@example.com");
    assert_eq!(profile.shirt_size, ShirtSize::NotSpecified);
    assert!(profile.conferences_to_attend.is_empty());
    assert!(profile.sessions_to_attend.is_empty());
}

#[test]
fn repeated_access_returns_the_same_profile() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    let first = service.profile(&wesley()).unwrap();
    let second = service.profile(&wesley()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn save_updates_display_name_and_shirt_size() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    let updated = service
        .save_profile(
            &wesley(),
            &ProfileUpdate {
                display_name: Some("Wes".to_string()),
                shirt_size: Some("XL_M".to_string()),
            },
        )
        .unwrap();
    assert_eq!(updated.display_name, "Wes");
    assert_eq!(updated.shirt_size, ShirtSize::XlM);

    let reloaded = service.profile(&wesley()).unwrap();
    assert_eq!(reloaded.display_name, "Wes");
    assert_eq!(reloaded.shirt_size, ShirtSize::XlM);
}

#[test]
fn save_skips_blank_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    service
        .save_profile(
            &wesley(),
            &ProfileUpdate {
                display_name: Some("Wes".to_string()),
                shirt_size: Some("M_W".to_string()),
            },
        )
        .unwrap();

    let unchanged = service
        .save_profile(
            &wesley(),
            &ProfileUpdate {
                display_name: Some("   ".to_string()),
                shirt_size: None,
            },
        )
        .unwrap();
    assert_eq!(unchanged.display_name, "Wes");
    assert_eq!(unchanged.shirt_size, ShirtSize::MW);
}

#[test]
fn save_rejects_unknown_shirt_size_tokens() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    let err = service
        .save_profile(
            &wesley(),
            &ProfileUpdate {
                display_name: None,
                shirt_size: Some("GIGANTIC".to_string()),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ProfileServiceError::InvalidShirtSize(token) if token == "GIGANTIC"
    ));
}

#[test]
fn profile_access_requires_authentication() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    let err = service.profile(&Anonymous).unwrap_err();
    assert!(matches!(err, ProfileServiceError::NotAuthenticated));
}

#[test]
fn malformed_identity_email_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    let bad = StaticUser(UserIdentity::new("bad", "Bad", "not-an-email"));
    let err = service.profile(&bad).unwrap_err();
    assert!(matches!(
        err,
        ProfileServiceError::InvalidEmail(value) if value == "not-an-email"
    ));
}

fn wesley() -> StaticUser {
    StaticUser(UserIdentity::new("wesley", "Wesley", "wesley@example.com"))
}
