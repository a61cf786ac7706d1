use rusqlite::Connection;

use atelier_types::models::FriendStatus;

use crate::error::OptionalExt;
use crate::models::{FriendRequestRow, UserRow};
use crate::users::{map_user_row, query_user_by_id};
use crate::{Database, Result, StoreError};

impl Database {
    /// Create a PENDING request. Any existing record between the two
    /// users — either direction, any status — blocks a new one, so a
    /// rejected request cannot be retried.
    pub fn send_friend_request(
        &self,
        requestor_uid: &str,
        recipient_uid: &str,
    ) -> Result<FriendRequestRow> {
        if requestor_uid == recipient_uid {
            return Err(StoreError::InvalidArgument(
                "cannot send a friend request to yourself",
            ));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_user_by_id(&tx, recipient_uid)?.is_none() {
                return Err(StoreError::NotFound("user"));
            }
            if query_request_either_direction(&tx, requestor_uid, recipient_uid)?.is_some() {
                return Err(StoreError::Conflict(
                    "a friend request already exists between these users",
                ));
            }

            tx.execute(
                "INSERT INTO friend_requests (requestor_uid, recipient_uid, status)
                 VALUES (?1, ?2, ?3)",
                (requestor_uid, recipient_uid, FriendStatus::Pending.as_str()),
            )
            .map_err(|e| {
                StoreError::conflict_on_unique(e, "a friend request already exists between these users")
            })?;

            let row = query_request(&tx, requestor_uid, recipient_uid)?
                .ok_or(StoreError::NotFound("friend request"))?;
            tx.commit()?;
            Ok(row)
        })
    }

    /// Acceptance is keyed by the original direction; accepting with the
    /// endpoints reversed is NotFound.
    pub fn accept_friend_request(
        &self,
        requestor_uid: &str,
        recipient_uid: &str,
    ) -> Result<FriendRequestRow> {
        self.set_request_status(requestor_uid, recipient_uid, FriendStatus::Accepted)
    }

    pub fn reject_friend_request(
        &self,
        requestor_uid: &str,
        recipient_uid: &str,
    ) -> Result<FriendRequestRow> {
        self.set_request_status(requestor_uid, recipient_uid, FriendStatus::Rejected)
    }

    fn set_request_status(
        &self,
        requestor_uid: &str,
        recipient_uid: &str,
        status: FriendStatus,
    ) -> Result<FriendRequestRow> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE friend_requests SET status = ?1
                 WHERE requestor_uid = ?2 AND recipient_uid = ?3",
                (status.as_str(), requestor_uid, recipient_uid),
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("friend request"));
            }
            query_request(conn, requestor_uid, recipient_uid)?
                .ok_or(StoreError::NotFound("friend request"))
        })
    }

    /// Counterpart users of every ACCEPTED request touching `uid`. The
    /// unordered-pair invariant means each friend appears exactly once.
    pub fn get_friends(&self, uid: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.uid, u.email, u.username, u.password, u.created_at
                 FROM users u
                 JOIN friend_requests fr
                   ON (u.uid = fr.recipient_uid AND fr.requestor_uid = ?1)
                   OR (u.uid = fr.requestor_uid AND fr.recipient_uid = ?1)
                 WHERE fr.status = ?2",
            )?;
            let rows = stmt
                .query_map((uid, FriendStatus::Accepted.as_str()), map_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Incoming PENDING requests, oldest first.
    pub fn pending_requests_for(&self, uid: &str) -> Result<Vec<FriendRequestRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT requestor_uid, recipient_uid, status, created_at
                 FROM friend_requests
                 WHERE recipient_uid = ?1 AND status = ?2
                 ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map((uid, FriendStatus::Pending.as_str()), map_request_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_request(
    conn: &Connection,
    requestor_uid: &str,
    recipient_uid: &str,
) -> Result<Option<FriendRequestRow>> {
    let mut stmt = conn.prepare(
        "SELECT requestor_uid, recipient_uid, status, created_at
         FROM friend_requests
         WHERE requestor_uid = ?1 AND recipient_uid = ?2",
    )?;
    stmt.query_row((requestor_uid, recipient_uid), map_request_row)
        .optional()
}

fn query_request_either_direction(
    conn: &Connection,
    a: &str,
    b: &str,
) -> Result<Option<FriendRequestRow>> {
    let mut stmt = conn.prepare(
        "SELECT requestor_uid, recipient_uid, status, created_at
         FROM friend_requests
         WHERE (requestor_uid = ?1 AND recipient_uid = ?2)
            OR (requestor_uid = ?2 AND recipient_uid = ?1)",
    )?;
    stmt.query_row((a, b), map_request_row).optional()
}

fn map_request_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FriendRequestRow> {
    Ok(FriendRequestRow {
        requestor_uid: row.get(0)?,
        recipient_uid: row.get(1)?,
        status: row.get(2)?,
        created_at: row.get(3)?,
    })
}
