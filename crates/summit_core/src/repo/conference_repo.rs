//! Conference repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, organizer-scoped, and plan-driven queries over the
//!   conference aggregate and its topic set.
//! - Render abstract query plans into SQL; the plan itself stays pure.
//!
//! # Invariants
//! - Conference ids are allocated from the shared sequence before insert.
//! - Topic filters compare against any element of the topic set.
//! - Seat-counter writes are connection-level helpers so the registration
//!   transaction can own them.

use crate::model::conference::{Conference, ConferenceId};
use crate::query::filter::{FilterField, FilterValue};
use crate::query::plan::{ConferenceQueryPlan, SortKey};
use crate::repo::{
    allocate_id, date_to_db, ensure_connection_ready, parse_db_date, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const CONFERENCE_SELECT_SQL: &str = "SELECT
    c.conference_id AS conference_id,
    c.organizer_id AS organizer_id,
    c.name AS name,
    c.city AS city,
    c.start_date AS start_date,
    c.end_date AS end_date,
    c.month AS month,
    c.max_attendees AS max_attendees,
    c.seats_available AS seats_available
FROM conferences c";

const CONFERENCE_REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "conferences",
        &[
            "conference_id",
            "organizer_id",
            "name",
            "city",
            "start_date",
            "end_date",
            "month",
            "max_attendees",
            "seats_available",
        ],
    ),
    ("conference_topics", &["conference_id", "topic"]),
    ("id_allocations", &["kind", "next_id"]),
];

/// Repository interface for conference aggregate operations.
pub trait ConferenceRepository {
    /// Allocates the next conference id before first write.
    fn allocate_conference_id(&self) -> RepoResult<ConferenceId>;
    /// Persists a new conference and its topic set.
    fn create_conference(&self, conference: &Conference) -> RepoResult<()>;
    /// Loads one conference, `None` when absent.
    fn get_conference(&self, conference_id: ConferenceId) -> RepoResult<Option<Conference>>;
    /// Multi-get preserving input order; absent ids are skipped.
    fn get_conferences(&self, conference_ids: &[ConferenceId]) -> RepoResult<Vec<Conference>>;
    /// Organizer-scoped range scan, ordered by name.
    fn conferences_by_organizer(&self, organizer_id: &str) -> RepoResult<Vec<Conference>>;
    /// Executes a validated query plan.
    fn query(&self, plan: &ConferenceQueryPlan) -> RepoResult<Vec<Conference>>;
    /// Conferences with `0 < seats_available <= max_seats`, ordered by name.
    fn nearly_sold_out(&self, max_seats: i64) -> RepoResult<Vec<Conference>>;
}

/// SQLite-backed conference repository.
pub struct SqliteConferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConferenceRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, CONFERENCE_REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl ConferenceRepository for SqliteConferenceRepository<'_> {
    fn allocate_conference_id(&self) -> RepoResult<ConferenceId> {
        allocate_id(self.conn, "conference")
    }

    fn create_conference(&self, conference: &Conference) -> RepoResult<()> {
        conference.validate()?;

        self.conn.execute(
            "INSERT INTO conferences (
                conference_id,
                organizer_id,
                name,
                city,
                start_date,
                end_date,
                month,
                max_attendees,
                seats_available
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                conference.conference_id,
                conference.organizer_id,
                conference.name,
                conference.city,
                date_to_db(conference.start_date),
                date_to_db(conference.end_date),
                conference.month,
                conference.max_attendees,
                conference.seats_available,
            ],
        )?;

        for topic in &conference.topics {
            self.conn.execute(
                "INSERT OR IGNORE INTO conference_topics (conference_id, topic)
                 VALUES (?1, ?2);",
                params![conference.conference_id, topic],
            )?;
        }

        Ok(())
    }

    fn get_conference(&self, conference_id: ConferenceId) -> RepoResult<Option<Conference>> {
        load_conference(self.conn, conference_id)
    }

    fn get_conferences(&self, conference_ids: &[ConferenceId]) -> RepoResult<Vec<Conference>> {
        let mut conferences = Vec::with_capacity(conference_ids.len());
        for conference_id in conference_ids {
            if let Some(conference) = load_conference(self.conn, *conference_id)? {
                conferences.push(conference);
            }
        }
        Ok(conferences)
    }

    fn conferences_by_organizer(&self, organizer_id: &str) -> RepoResult<Vec<Conference>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONFERENCE_SELECT_SQL}
             WHERE c.organizer_id = ?1
             ORDER BY c.name ASC, c.conference_id ASC;"
        ))?;
        let mut rows = stmt.query([organizer_id])?;
        collect_conferences(self.conn, &mut rows)
    }

    fn query(&self, plan: &ConferenceQueryPlan) -> RepoResult<Vec<Conference>> {
        let (sql, bind_values) = render_plan(plan);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        collect_conferences(self.conn, &mut rows)
    }

    fn nearly_sold_out(&self, max_seats: i64) -> RepoResult<Vec<Conference>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONFERENCE_SELECT_SQL}
             WHERE c.seats_available > 0
               AND c.seats_available <= ?1
             ORDER BY c.name ASC, c.conference_id ASC;"
        ))?;
        let mut rows = stmt.query([max_seats])?;
        collect_conferences(self.conn, &mut rows)
    }
}

/// Loads one conference with its topic set from the given connection.
///
/// Exposed at connection level so transactional callers can reuse it.
pub fn load_conference(
    conn: &Connection,
    conference_id: ConferenceId,
) -> RepoResult<Option<Conference>> {
    let mut stmt = conn.prepare(&format!(
        "{CONFERENCE_SELECT_SQL} WHERE c.conference_id = ?1;"
    ))?;
    let mut rows = stmt.query([conference_id])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let mut conference = parse_conference_row(row)?;
    conference.topics = load_topics(conn, conference_id)?;
    Ok(Some(conference))
}

/// Overwrites the seat counter for one conference.
///
/// The caller owns the surrounding transaction and the seat invariants;
/// this helper only persists the decided value.
pub fn set_seats_available(
    conn: &Connection,
    conference_id: ConferenceId,
    seats_available: i64,
) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE conferences
         SET seats_available = ?2,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE conference_id = ?1;",
        params![conference_id, seats_available],
    )?;
    if changed == 0 {
        return Err(RepoError::ConferenceNotFound(conference_id));
    }
    Ok(())
}

fn render_plan(plan: &ConferenceQueryPlan) -> (String, Vec<Value>) {
    let mut sql = format!("{CONFERENCE_SELECT_SQL} WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    for predicate in &plan.predicates {
        let operator = predicate.operator.sql();
        match predicate.field {
            FilterField::City => sql.push_str(&format!(" AND c.city {operator} ?")),
            FilterField::Month => sql.push_str(&format!(" AND c.month {operator} ?")),
            FilterField::MaxAttendees => {
                sql.push_str(&format!(" AND c.max_attendees {operator} ?"));
            }
            FilterField::Topic => sql.push_str(&format!(
                " AND EXISTS (
                    SELECT 1
                    FROM conference_topics t
                    WHERE t.conference_id = c.conference_id
                      AND t.topic {operator} ?
                )"
            )),
        }
        bind_values.push(match &predicate.value {
            FilterValue::Text(text) => Value::Text(text.clone()),
            FilterValue::Integer(number) => Value::Integer(*number),
        });
    }

    sql.push_str(" ORDER BY ");
    let order_terms: Vec<String> = plan
        .ordering
        .iter()
        .map(|key| sort_key_sql(*key).to_string())
        .collect();
    sql.push_str(&order_terms.join(", "));
    sql.push_str(", c.conference_id ASC;");

    (sql, bind_values)
}

fn sort_key_sql(key: SortKey) -> &'static str {
    match key {
        SortKey::Name => "c.name ASC",
        SortKey::Field(FilterField::City) => "c.city ASC",
        SortKey::Field(FilterField::Month) => "c.month ASC",
        SortKey::Field(FilterField::MaxAttendees) => "c.max_attendees ASC",
        // Repeated-property sort: order rows by their smallest topic value.
        SortKey::Field(FilterField::Topic) => {
            "(SELECT MIN(t.topic)
              FROM conference_topics t
              WHERE t.conference_id = c.conference_id) ASC"
        }
    }
}

fn collect_conferences(
    conn: &Connection,
    rows: &mut rusqlite::Rows<'_>,
) -> RepoResult<Vec<Conference>> {
    let mut conferences = Vec::new();
    while let Some(row) = rows.next()? {
        conferences.push(parse_conference_row(row)?);
    }
    for conference in &mut conferences {
        conference.topics = load_topics(conn, conference.conference_id)?;
    }
    Ok(conferences)
}

fn load_topics(conn: &Connection, conference_id: ConferenceId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT topic
         FROM conference_topics
         WHERE conference_id = ?1
         ORDER BY topic ASC;",
    )?;
    let mut rows = stmt.query([conference_id])?;
    let mut topics = Vec::new();
    while let Some(row) = rows.next()? {
        topics.push(row.get(0)?);
    }
    Ok(topics)
}

fn parse_conference_row(row: &Row<'_>) -> RepoResult<Conference> {
    let start_date = row
        .get::<_, Option<String>>("start_date")?
        .map(|value| parse_db_date(&value, "conferences.start_date"))
        .transpose()?;
    let end_date = row
        .get::<_, Option<String>>("end_date")?
        .map(|value| parse_db_date(&value, "conferences.end_date"))
        .transpose()?;

    Ok(Conference {
        conference_id: row.get("conference_id")?,
        organizer_id: row.get("organizer_id")?,
        name: row.get("name")?,
        city: row.get("city")?,
        topics: Vec::new(),
        start_date,
        end_date,
        month: row.get("month")?,
        max_attendees: row.get("max_attendees")?,
        seats_available: row.get("seats_available")?,
    })
}
