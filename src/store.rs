//! Profile storage port
//!
//! Callers hold a `dyn ProfileStore` and never know whether profiles live in
//! the local SQLite database or behind the remote CRUD API.

use std::path::Path;

use reqwest::Method;
use rusqlite::Connection;

use crate::db;
use crate::error::{FlockError, Result};
use crate::models::{Profile, ProfileSummary};
use crate::remote::HttpClient;

pub trait ProfileStore {
    fn save(&self, profile: &Profile) -> Result<()>;
    fn load(&self, name: &str) -> Result<Profile>;
    fn list(&self) -> Result<Vec<ProfileSummary>>;
    fn delete(&self, name: &str) -> Result<()>;
}

/// Profiles in a local SQLite file
pub struct SqliteProfileStore {
    conn: Connection,
}

impl SqliteProfileStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        db::init_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl ProfileStore for SqliteProfileStore {
    fn save(&self, profile: &Profile) -> Result<()> {
        db::upsert_profile(&self.conn, profile)
    }

    fn load(&self, name: &str) -> Result<Profile> {
        db::get_profile(&self.conn, name)
    }

    fn list(&self) -> Result<Vec<ProfileSummary>> {
        db::list_profiles(&self.conn)
    }

    fn delete(&self, name: &str) -> Result<()> {
        db::delete_profile(&self.conn, name)
    }
}

/// Profiles under `/profiles` on the remote CRUD API
pub struct RemoteProfileStore {
    http: HttpClient,
}

impl RemoteProfileStore {
    pub const SERVICE: &'static str = "crud";

    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

fn not_found_as_missing<T>(name: &str, result: Result<T>) -> Result<T> {
    match result {
        Err(FlockError::Status { status: 404, .. }) => {
            Err(FlockError::ProfileNotFound(name.to_string()))
        }
        other => other,
    }
}

impl ProfileStore for RemoteProfileStore {
    fn save(&self, profile: &Profile) -> Result<()> {
        let name = db::check_name(&profile.name)?;
        let body = serde_json::to_value(Profile {
            name: name.to_string(),
            params: profile.params.clone(),
        })?;
        self.http
            .execute(Method::PUT, &["profiles", name], Some(&body))
            .map(drop)
    }

    fn load(&self, name: &str) -> Result<Profile> {
        let name = db::check_name(name)?;
        not_found_as_missing(name, self.http.fetch(Method::GET, &["profiles", name], None))
    }

    fn list(&self) -> Result<Vec<ProfileSummary>> {
        self.http.fetch(Method::GET, &["profiles"], None)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let name = db::check_name(name)?;
        not_found_as_missing(
            name,
            self.http
                .execute(Method::DELETE, &["profiles", name], None)
                .map(drop),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::remote::test_support::{api_base, blocking};
    use crate::remote::RetryPolicy;
    use crate::validate::FlockInput;

    fn profile(name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            params: FlockInput {
                breed: "sussex".to_string(),
                age: 12.0,
                weight: 1.5,
                quantity: 30.0,
                ..Default::default()
            }
            .validate()
            .unwrap(),
        }
    }

    fn remote(base: &str) -> RemoteProfileStore {
        let retry = RetryPolicy {
            max_attempts: 1,
            base_backoff_ms: 1,
            ..Default::default()
        };
        RemoteProfileStore::new(
            HttpClient::new("crud", base, Some("t0k".to_string()), Duration::from_secs(5), retry)
                .unwrap(),
        )
    }

    #[test]
    fn sqlite_store_behaves_as_port() {
        let store: Box<dyn ProfileStore> = Box::new(SqliteProfileStore::in_memory().unwrap());
        store.save(&profile("hens")).unwrap();
        assert_eq!(store.load("hens").unwrap(), profile("hens"));
        assert_eq!(store.list().unwrap().len(), 1);
        store.delete("hens").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn sqlite_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("profiles.db");
        let store = SqliteProfileStore::open(&path).unwrap();
        store.save(&profile("a")).unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn remote_store_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/profiles/north%20barn"))
            .and(header("authorization", "Bearer t0k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/profiles/north%20barn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile("north barn")))
            .expect(1)
            .mount(&server)
            .await;

        let base = api_base(&server);
        let loaded = blocking(move || {
            let store = remote(&base);
            store.save(&profile("north barn"))?;
            store.load("north barn")
        })
        .await
        .unwrap();

        assert_eq!(loaded, profile("north barn"));
        server.verify().await;
    }

    #[tokio::test]
    async fn remote_404_is_profile_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/profiles/ghost"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "missing"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let base = api_base(&server);
        let err = blocking(move || remote(&base).load("ghost")).await.unwrap_err();
        assert!(matches!(err, FlockError::ProfileNotFound(name) if name == "ghost"));
        server.verify().await;
    }
}
