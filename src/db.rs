//! Database schema and profile operations

use log::info;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::{FlockError, Result};
use crate::models::{
    Breed, Environment, FeedType, FlockParameters, Health, Profile, ProfileSummary, Purpose,
    Season, StressLevel, Vaccination,
};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per saved flock profile
        CREATE TABLE IF NOT EXISTS profiles (
            name TEXT PRIMARY KEY,
            breed TEXT NOT NULL,
            age_weeks INTEGER NOT NULL,
            weight_kg REAL NOT NULL,
            quantity INTEGER NOT NULL,
            health TEXT NOT NULL,
            environment TEXT NOT NULL,
            season TEXT NOT NULL,
            purpose TEXT NOT NULL,
            stress_level TEXT NOT NULL,
            feed_type TEXT NOT NULL,
            light_hours REAL NOT NULL,
            molting INTEGER NOT NULL DEFAULT 0,
            vaccination TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_profiles_updated ON profiles(updated_at);
        "#,
    )?;
    Ok(())
}

/// Trimmed profile name, rejecting blanks
pub(crate) fn check_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FlockError::EmptyProfileName);
    }
    Ok(name)
}

/// Insert or update a profile, keeping its original creation time
pub fn upsert_profile(conn: &Connection, profile: &Profile) -> Result<()> {
    let name = check_name(&profile.name)?;
    let p = &profile.params;
    conn.execute(
        "INSERT INTO profiles (name, breed, age_weeks, weight_kg, quantity, health, environment,
                               season, purpose, stress_level, feed_type, light_hours, molting, vaccination)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         ON CONFLICT(name) DO UPDATE SET
            breed = excluded.breed,
            age_weeks = excluded.age_weeks,
            weight_kg = excluded.weight_kg,
            quantity = excluded.quantity,
            health = excluded.health,
            environment = excluded.environment,
            season = excluded.season,
            purpose = excluded.purpose,
            stress_level = excluded.stress_level,
            feed_type = excluded.feed_type,
            light_hours = excluded.light_hours,
            molting = excluded.molting,
            vaccination = excluded.vaccination,
            updated_at = datetime('now')",
        rusqlite::params![
            name,
            p.breed.as_str(),
            p.age_weeks,
            p.weight_kg,
            p.quantity,
            p.health.as_str(),
            p.environment.as_str(),
            p.season.as_str(),
            p.purpose.as_str(),
            p.stress_level.as_str(),
            p.feed_type.as_str(),
            p.light_hours,
            p.molting,
            p.vaccination.as_str(),
        ],
    )?;
    info!("saved profile '{}'", name);
    Ok(())
}

fn params_from_row(row: &Row<'_>) -> rusqlite::Result<FlockParameters> {
    Ok(FlockParameters {
        breed: Breed::parse(&row.get::<_, String>("breed")?),
        age_weeks: row.get("age_weeks")?,
        weight_kg: row.get("weight_kg")?,
        quantity: row.get("quantity")?,
        health: Health::parse(&row.get::<_, String>("health")?),
        environment: Environment::parse(&row.get::<_, String>("environment")?),
        season: Season::parse(&row.get::<_, String>("season")?),
        purpose: Purpose::parse(&row.get::<_, String>("purpose")?),
        stress_level: StressLevel::parse(&row.get::<_, String>("stress_level")?),
        feed_type: FeedType::parse(&row.get::<_, String>("feed_type")?),
        light_hours: row.get("light_hours")?,
        molting: row.get("molting")?,
        vaccination: Vaccination::parse(&row.get::<_, String>("vaccination")?),
    })
}

/// Load a profile by name
pub fn get_profile(conn: &Connection, name: &str) -> Result<Profile> {
    let name = check_name(name)?;
    let mut stmt = conn.prepare("SELECT * FROM profiles WHERE name = ?1")?;

    let params = stmt
        .query_row([name], params_from_row)
        .optional()?
        .ok_or_else(|| FlockError::ProfileNotFound(name.to_string()))?;

    Ok(Profile {
        name: name.to_string(),
        params,
    })
}

/// List all profiles, most recently updated first
pub fn list_profiles(conn: &Connection) -> Result<Vec<ProfileSummary>> {
    let mut stmt = conn.prepare(
        "SELECT name, breed, age_weeks, quantity, updated_at
         FROM profiles
         ORDER BY updated_at DESC, name",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(ProfileSummary {
            name: row.get(0)?,
            breed: Breed::parse(&row.get::<_, String>(1)?),
            age_weeks: row.get(2)?,
            quantity: row.get(3)?,
            updated_at: row.get(4)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Delete a profile by name
pub fn delete_profile(conn: &Connection, name: &str) -> Result<()> {
    let name = check_name(name)?;
    let deleted = conn.execute("DELETE FROM profiles WHERE name = ?1", [name])?;
    if deleted == 0 {
        return Err(FlockError::ProfileNotFound(name.to_string()));
    }
    info!("deleted profile '{}'", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::FlockInput;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn profile(name: &str, quantity: f64) -> Profile {
        let params = FlockInput {
            breed: "orpington".to_string(),
            age: 22.0,
            weight: 2.6,
            quantity,
            environment: Some("free_range".to_string()),
            molting: Some("yes".to_string()),
            feed_type: Some("corn mash".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        Profile {
            name: name.to_string(),
            params,
        }
    }

    #[test]
    fn save_and_load_round_trips_every_field() {
        let conn = conn();
        let saved = profile("north barn", 40.0);
        upsert_profile(&conn, &saved).unwrap();

        let loaded = get_profile(&conn, "north barn").unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.params.feed_type, FeedType::Other("corn mash".to_string()));
    }

    #[test]
    fn upsert_replaces_existing() {
        let conn = conn();
        upsert_profile(&conn, &profile("coop", 10.0)).unwrap();
        upsert_profile(&conn, &profile("coop", 25.0)).unwrap();

        let all = list_profiles(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].quantity, 25);
        assert!(all[0].updated_at.is_some());
    }

    #[test]
    fn missing_profile_is_an_error() {
        let conn = conn();
        assert!(matches!(
            get_profile(&conn, "ghost"),
            Err(FlockError::ProfileNotFound(name)) if name == "ghost"
        ));
        assert!(matches!(
            delete_profile(&conn, "ghost"),
            Err(FlockError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn delete_removes_profile() {
        let conn = conn();
        upsert_profile(&conn, &profile("a", 5.0)).unwrap();
        upsert_profile(&conn, &profile("b", 6.0)).unwrap();
        delete_profile(&conn, "a").unwrap();

        let names: Vec<_> = list_profiles(&conn).unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn blank_names_are_rejected() {
        let conn = conn();
        assert!(matches!(
            upsert_profile(&conn, &profile("  ", 5.0)),
            Err(FlockError::EmptyProfileName)
        ));
    }
}
