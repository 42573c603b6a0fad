//! Exclusive ownership of an open connection.

use crate::library::Connection;

/// Owns an open connection and releases it when closed or dropped.
///
/// Whichever comes first, `close` or `Drop`, releases the connection; the
/// other one finds nothing left to do.
pub struct Session<C: Connection> {
    conn: Option<C>,
}

impl<C: Connection> Session<C> {
    pub fn new(conn: C) -> Self {
        Self { conn: Some(conn) }
    }

    /// Return the open connection.
    pub fn connection(&self) -> &C {
        // Only `release` takes the connection, and it runs from `close(self)`
        // or `drop`, after which the session can't be used anymore.
        self.conn.as_ref().expect("connection is open while the session exists")
    }

    /// Release the connection now.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            log::debug!("releasing connection");
            conn.close();
        }
    }
}

impl<C: Connection> Drop for Session<C> {
    fn drop(&mut self) {
        self.release();
    }
}
