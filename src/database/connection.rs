/*!
 * SQLite connection shared by the cache repository.
 *
 * rusqlite is blocking; every async caller goes through `spawn_blocking`.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::schema;

const CACHE_FILENAME: &str = "translation_cache.db";

/// Directory below the user's local data directory
const CACHE_DIRNAME: &str = "rstlate";

const IN_MEMORY: &str = ":memory:";

/// Another `rstlate` process may hold the write lock while it stores a translation
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Cloneable handle to one SQLite connection
#[derive(Clone)]
pub struct DatabaseConnection {
    db_path: PathBuf,
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection").field("db_path", &self.db_path).finish()
    }
}

impl DatabaseConnection {
    /// Open the cache in the user's data directory
    pub fn new_default() -> Result<Self> {
        Self::new(Self::default_database_path()?)
    }

    /// Open or create the cache file at `db_path`, creating parent directories
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory: {:?}", parent))?;
        }

        info!("Opening translation cache at: {:?}", db_path);
        let conn = Connection::open(&db_path).with_context(|| format!("Failed to open cache: {:?}", db_path))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Self::prepared(db_path, conn)
    }

    /// Throwaway cache for tests and `--no-cache` style runs
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory translation cache");
        let conn = Connection::open_in_memory().context("Failed to create in-memory cache")?;
        Self::prepared(PathBuf::from(IN_MEMORY), conn)
    }

    fn prepared(db_path: PathBuf, conn: Connection) -> Result<Self> {
        schema::initialize_schema(&conn).with_context(|| format!("Failed to prepare cache schema in {:?}", db_path))?;
        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// `<data dir>/rstlate/translation_cache.db`
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow!("Could not determine data directory for the translation cache"))?;

        Ok(base_dir.join(CACHE_DIRNAME).join(CACHE_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run `f` against the connection on a blocking thread
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || f(&connection.lock()))
            .await
            .context("Cache task panicked")?
    }

    /// Run `f` inside one transaction on a blocking thread; rolled back when `f` fails
    pub async fn transaction_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let mut conn = connection.lock();
            let tx = conn.transaction()?;
            let result = f(&tx)?;
            tx.commit()?;
            Ok(result)
        })
        .await
        .context("Cache transaction task panicked")?
    }

    /// Reclaim the space of deleted entries
    pub async fn vacuum(&self) -> Result<()> {
        self.execute_async(|conn| {
            conn.execute_batch("VACUUM")?;
            Ok(())
        })
        .await
    }

    /// Size of the cache file in bytes; zero for in-memory databases
    pub fn file_size(&self) -> u64 {
        if self.db_path.as_os_str() == IN_MEMORY {
            return 0;
        }
        std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0)
    }
}
