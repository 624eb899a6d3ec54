//! Cache entry CRUD operations.
//!
//! An entry is a captured response snapshot stored under a request key
//! inside one namespace. Writes are upserts, so concurrent writers for the
//! same request resolve as last-write-wins.

use super::connection::CacheDb;
use crate::Error;
use crate::http::{Request, Response, ResponseType, host_matches};
use bytes::Bytes;
use chrono::SecondsFormat;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored (request identity, response snapshot) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub request_key: String,
    pub url: String,
    pub method: String,
    pub status: u16,
    pub status_text: String,
    pub response_type: ResponseType,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: String,
}

impl CacheEntry {
    /// Capture a response for storage, consuming its body.
    ///
    /// Callers that still owe the response to someone else must pass a
    /// clone taken with [`Response::try_clone`].
    pub fn capture(request: &Request, mut response: Response) -> Result<Self, Error> {
        let body = response.bytes()?;
        Ok(Self {
            request_key: request.cache_key(),
            url: request.url.to_string(),
            method: request.method.clone(),
            status: response.status,
            status_text: response.status_text,
            response_type: response.kind,
            headers: response.headers,
            body,
            stored_at: chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
        })
    }

    /// Rebuild a fresh, unread response from the snapshot.
    pub fn into_response(self) -> Response {
        let mut response =
            Response::new(self.url, self.status, self.response_type, self.body).with_status_text(self.status_text);
        response.headers = self.headers;
        response
    }
}

fn insert_entry(conn: &rusqlite::Connection, namespace: &str, entry: &CacheEntry) -> Result<(), Error> {
    let headers_json =
        serde_json::to_string(&entry.headers).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;

    conn.execute(
        "INSERT OR IGNORE INTO cache_namespaces (name, created_at) VALUES (?1, ?2)",
        params![namespace, chrono::Utc::now().to_rfc3339()],
    )?;
    conn.execute(
        "INSERT INTO cache_entries (
            namespace, request_key, url, method, status, status_text,
            response_type, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(namespace, request_key) DO UPDATE SET
            url = excluded.url,
            method = excluded.method,
            status = excluded.status,
            status_text = excluded.status_text,
            response_type = excluded.response_type,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            namespace,
            &entry.request_key,
            &entry.url,
            &entry.method,
            entry.status as i64,
            &entry.status_text,
            entry.response_type.as_str(),
            headers_json,
            entry.body.as_ref(),
            &entry.stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Insert or replace a single entry.
    ///
    /// Creates the namespace if it does not exist yet. The namespace
    /// creation and the entry write commit together.
    pub async fn put_entry(&self, namespace: &str, entry: &CacheEntry) -> Result<(), Error> {
        let namespace = namespace.to_string();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                insert_entry(&tx, &namespace, &entry)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a batch of entries in one transaction.
    ///
    /// Either every entry is committed or none is.
    pub async fn put_entries(&self, namespace: &str, entries: &[CacheEntry]) -> Result<(), Error> {
        let namespace = namespace.to_string();
        let entries = entries.to_vec();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for entry in &entries {
                    insert_entry(&tx, &namespace, entry)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by request key.
    ///
    /// Returns None if the namespace or the key doesn't exist.
    pub async fn get_entry(&self, namespace: &str, request_key: &str) -> Result<Option<CacheEntry>, Error> {
        let namespace = namespace.to_string();
        let request_key = request_key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT request_key, url, method, status, status_text,
                            response_type, headers_json, body, stored_at
                     FROM cache_entries WHERE namespace = ?1 AND request_key = ?2",
                )?;

                let result = stmt.query_row(params![namespace, request_key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Vec<u8>>(7)?,
                        row.get::<_, String>(8)?,
                    ))
                });

                let (request_key, url, method, status, status_text, response_type, headers_json, body, stored_at) =
                    match result {
                        Ok(row) => row,
                        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                        Err(e) => return Err(e.into()),
                    };

                let response_type = ResponseType::parse(&response_type)
                    .ok_or_else(|| Error::CorruptEntry(format!("unknown response type: {response_type}")))?;
                let headers: Vec<(String, String)> =
                    serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
                let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status}")))?;

                Ok(Some(CacheEntry {
                    request_key,
                    url,
                    method,
                    status,
                    status_text,
                    response_type,
                    headers,
                    body: Bytes::from(body),
                    stored_at,
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// URLs of all entries in a namespace, oldest first.
    pub async fn entry_urls(&self, namespace: &str) -> Result<Vec<String>, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url FROM cache_entries WHERE namespace = ?1 ORDER BY stored_at ASC, rowid ASC",
                )?;
                let urls = stmt
                    .query_map(params![namespace], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries whose URL host is `domain` or one of its subdomains.
    ///
    /// Query strings and paths never match. Returns the number of deleted entries.
    pub async fn purge_entries_by_domain(&self, namespace: &str, domain: &str) -> Result<u64, Error> {
        let namespace = namespace.to_string();
        let domain = domain.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let keys = {
                    let mut stmt = tx.prepare("SELECT request_key, url FROM cache_entries WHERE namespace = ?1")?;
                    stmt.query_map(params![namespace], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                        .collect::<Result<Vec<_>, _>>()?
                        .into_iter()
                        .filter(|(_, url)| {
                            url::Url::parse(url)
                                .ok()
                                .and_then(|u| u.host_str().map(|host| host_matches(host, &domain)))
                                .unwrap_or(false)
                        })
                        .map(|(key, _)| key)
                        .collect::<Vec<_>>()
                };

                let mut deleted = 0u64;
                for key in &keys {
                    deleted += tx.execute(
                        "DELETE FROM cache_entries WHERE namespace = ?1 AND request_key = ?2",
                        params![namespace, key],
                    )? as u64;
                }
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .map_err(Error::from)
    }

    /// Purge oldest entries until count <= max_entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_lru_entries(&self, namespace: &str, max_entries: usize) -> Result<u64, Error> {
        let namespace = namespace.to_string();
        let max = i64::try_from(max_entries).unwrap_or(i64::MAX);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries WHERE namespace = ?1",
                    params![namespace],
                    |row| row.get(0),
                )?;
                if count <= max {
                    return Ok(0);
                }

                let to_delete = count - max;
                let deleted = conn.execute(
                    "DELETE FROM cache_entries WHERE namespace = ?1 AND request_key IN (
                        SELECT request_key FROM cache_entries WHERE namespace = ?1
                        ORDER BY stored_at ASC, rowid ASC LIMIT ?2
                    )",
                    params![namespace, to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
