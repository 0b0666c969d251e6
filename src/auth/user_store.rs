//! User Storage
//! Mission: SQLite-backed identity collaborator for login and admin lookups

use crate::auth::{
    identity::IdentityProvider,
    models::{Principal, Role, User},
};
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{info, warn};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, password_hash, role, active, created_at";

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
    hash_cost: u32,
}

impl UserStore {
    /// Open (or create) the store and seed a default admin with `admin_password`
    pub fn new(db_path: &str, admin_password: &str) -> Result<Self> {
        Self::with_hash_cost(db_path, admin_password, DEFAULT_COST)
    }

    pub fn with_hash_cost(db_path: &str, admin_password: &str, hash_cost: u32) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
            hash_cost,
        };
        store.init_db(admin_password)?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open user database at {}", self.db_path))
    }

    /// Initialize database schema
    fn init_db(&self, admin_password: &str) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        self.create_default_admin(&conn, admin_password)?;

        Ok(())
    }

    /// Create default admin user for initial setup
    fn create_default_admin(&self, conn: &Connection, admin_password: &str) -> Result<()> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'admin'",
                [],
                |row| row.get(0),
            )
            .context("Failed to check for admin users")?;

        if count == 0 {
            let admin = self.new_user("admin", admin_password, Role::Admin, true)?;
            Self::insert(conn, &admin).context("Failed to insert admin user")?;

            info!("Default admin user created (username: admin)");
            warn!("Change the default admin password outside of development");
        }

        Ok(())
    }

    fn new_user(&self, username: &str, password: &str, role: Role, active: bool) -> Result<User> {
        let password_hash = hash(password, self.hash_cost).context("Failed to hash password")?;
        Ok(User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
            role,
            active,
            created_at: Utc::now().to_rfc3339(),
        })
    }

    fn insert(conn: &Connection, user: &User) -> Result<()> {
        conn.execute(
            "INSERT INTO users (id, username, password_hash, role, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.username,
                user.password_hash,
                user.role.as_str(),
                user.active,
                user.created_at,
            ],
        )?;
        Ok(())
    }

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
        let role_str: String = row.get(3)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            role: Role::parse(&role_str).unwrap_or(Role::Observer),
            active: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    /// Get user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.connect()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by id
    pub fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let conn = self.connect()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Create a new user
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        active: bool,
    ) -> Result<User> {
        let user = self.new_user(username, password, role, active)?;
        let conn = self.connect()?;
        Self::insert(&conn, &user).context("Failed to insert user")?;

        info!(
            username = %user.username,
            role = user.role.as_str(),
            active = user.active,
            "Created user"
        );

        Ok(user)
    }
}

impl IdentityProvider for UserStore {
    fn authenticate(&self, username: &str, password: &str) -> Result<Option<Principal>> {
        let Some(user) = self.get_user_by_username(username)? else {
            return Ok(None);
        };

        let valid = verify(password, &user.password_hash).context("Failed to verify password")?;
        Ok(valid.then(|| user.principal()))
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Principal>> {
        Ok(self.get_user_by_id(id)?.map(|u| u.principal()))
    }
}
