use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use hapcfg_cache::{Cache, CacheScope, Keyed};
use hapcfg_parser::{ConfigEngine, TextConfig};
use hapcfg_txn::{Coordinator, FileTransactionStore, Scope, TransactionStore};
use hapcfg_types::{Bind, Transaction, TransactionId, TransactionStatus, Version, Versioned};
use tracing::{debug, info, warn};

use crate::accessor;
use crate::config::ClientConfig;
use crate::error::{ConfError, ConfResult, ErrorKind};
use crate::object::ConfigObject;

/// Transactional client over one configuration file.
///
/// Every request loads a fresh engine of type `E` from the file its scope
/// resolves to; engines are never shared between requests. The client
/// itself is `Send + Sync`.
pub struct Client<E = TextConfig> {
    config: ClientConfig,
    coordinator: Coordinator,
    cache: Cache,
    engine: PhantomData<fn() -> E>,
}

impl Client {
    /// A client over the file-backed transaction store described by
    /// `config`.
    pub fn new(config: ClientConfig) -> Self {
        let store = FileTransactionStore::new(config.config_file.clone(), config.transaction_dir());
        Self::with_store(config, Arc::new(store))
    }
}

impl<E: ConfigEngine + Default> Client<E> {
    pub fn with_store(config: ClientConfig, store: Arc<dyn TransactionStore>) -> Self {
        Self {
            cache: Cache::new(config.use_cache),
            coordinator: Coordinator::new(store),
            config,
            engine: PhantomData,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Switch the cache on or off. Switching it off empties it.
    pub fn set_cache_enabled(&self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    fn store(&self) -> &dyn TransactionStore {
        self.coordinator.store()
    }

    // ---- Reads ----

    /// Version of the committed file, or the base version of a transaction.
    pub fn version(&self, transaction: Option<&TransactionId>) -> ConfResult<Version> {
        let scope = CacheScope::of(transaction);
        if let Some(version) = self.cache.versions().get(&scope) {
            return Ok(version);
        }
        let version = match transaction {
            Some(id) => self.store().transaction_version(id)?,
            None => self.store().version()?,
        };
        self.cache.versions().set(&scope, version);
        Ok(version)
    }

    fn load(&self, transaction: Option<&TransactionId>) -> ConfResult<E> {
        let path = self.store().file_path(transaction)?;
        let mut engine = E::default();
        engine.load_data(&path)?;
        Ok(engine)
    }

    /// All objects of kind `K` in a section, in file order. A section that
    /// does not exist has no objects.
    pub fn list<K: ConfigObject>(
        &self,
        section: &str,
        transaction: Option<&TransactionId>,
    ) -> ConfResult<Versioned<Vec<K>>> {
        let scope = CacheScope::of(transaction);
        let version = self.version(transaction)?;
        if let Some(objects) = K::cache(&self.cache).get_all(section, &scope) {
            return Ok(Versioned::new(version, objects));
        }

        let engine = self.load(transaction)?;
        let objects: Vec<K> = accessor::list(&engine, section)?;
        K::cache(&self.cache).set_all(section, &scope, objects.clone());
        Ok(Versioned::new(version, objects))
    }

    pub fn get<K: ConfigObject>(
        &self,
        name: &str,
        section: &str,
        transaction: Option<&TransactionId>,
    ) -> ConfResult<Versioned<K>> {
        let scope = CacheScope::of(transaction);
        let version = self.version(transaction)?;
        if let Some(object) = K::cache(&self.cache).get_one(section, name, &scope) {
            return Ok(Versioned::new(version, object));
        }

        let engine = self.load(transaction)?;
        let (object, _) = accessor::find_by_name::<K, E>(&engine, name, section)?
            .ok_or_else(|| accessor::not_found::<K, E>(&engine, name, section))?;
        K::cache(&self.cache).set(section, &scope, object.clone());
        Ok(Versioned::new(version, object))
    }

    // ---- Writes ----

    fn validate<K: ConfigObject>(&self, object: &K) -> ConfResult<()> {
        if self.config.use_validation {
            object.validate()?;
        }
        Ok(())
    }

    /// Run one edit inside a change scope. Any failure aborts the scope, so
    /// an implicit edit never leaves a staged snapshot behind.
    fn apply_change<F>(&self, scope: &Scope, edit: F) -> ConfResult<Version>
    where
        F: FnOnce(&mut E) -> ConfResult<()>,
    {
        let change = match self.coordinator.open(scope) {
            Ok(change) => change,
            Err(err) => return Err(self.failed(scope, err.into())),
        };

        if let Err(err) = edit_file(change.path(), edit) {
            if let Err(abort) = change.abort() {
                warn!(error = %abort, "failed to abort change scope");
            }
            return Err(err);
        }

        change.commit().map_err(|err| self.failed(scope, err.into()))
    }

    /// A conflict on an implicit write means the committed file moved on
    /// without this client, so its committed cache is stale.
    fn failed(&self, scope: &Scope, err: ConfError) -> ConfError {
        if matches!(scope, Scope::Version(_)) && err.kind() == ErrorKind::VersionConflict {
            debug!(error = %err, "dropping committed cache");
            self.cache.invalidate_committed();
        }
        err
    }

    /// Cache scope a successful write lands in. Implicit writes also move
    /// the committed version forward.
    fn written(&self, scope: &Scope, version: Version) -> CacheScope {
        match scope {
            Scope::Transaction(id) => CacheScope::Transaction(id.clone()),
            Scope::Version(_) => {
                self.cache.versions().set(&CacheScope::Committed, version);
                CacheScope::Committed
            }
        }
    }

    /// Add an object to a section. Its name must be free in that section.
    pub fn create<K: ConfigObject>(
        &self,
        section: &str,
        object: &K,
        scope: &Scope,
    ) -> ConfResult<Version> {
        self.validate(object)?;
        let stored = object.stored();

        let version = self.apply_change(scope, |engine| {
            if accessor::find_by_name::<K, E>(engine, stored.key(), section)?.is_some() {
                return Err(already_exists::<K>(stored.key(), section));
            }
            accessor::insert(engine, section, object, None)
        })?;

        info!(kind = K::LABEL, name = stored.key(), section, %version, "created");
        let cache_scope = self.written(scope, version);
        K::cache(&self.cache).set(section, &cache_scope, stored);
        Ok(version)
    }

    /// Replace the object `name` in place. The replacement may carry a new
    /// name as long as no other object in the section holds it.
    pub fn edit<K: ConfigObject>(
        &self,
        name: &str,
        section: &str,
        object: &K,
        scope: &Scope,
    ) -> ConfResult<Version> {
        self.validate(object)?;
        let stored = object.stored();
        let renamed = stored.key() != name;

        let version = self.apply_change(scope, |engine| {
            let (_, index) = accessor::find_by_name::<K, E>(engine, name, section)?
                .ok_or_else(|| accessor::not_found::<K, E>(engine, name, section))?;
            if renamed && accessor::find_by_name::<K, E>(engine, stored.key(), section)?.is_some() {
                return Err(already_exists::<K>(stored.key(), section));
            }
            accessor::set_at(engine, section, object, index)
        })?;

        info!(kind = K::LABEL, name, section, %version, "edited");
        let cache_scope = self.written(scope, version);
        let cache = K::cache(&self.cache);
        if renamed {
            cache.delete(section, name, &cache_scope);
        }
        cache.set(section, &cache_scope, stored);
        Ok(version)
    }

    pub fn delete<K: ConfigObject>(
        &self,
        name: &str,
        section: &str,
        scope: &Scope,
    ) -> ConfResult<Version> {
        let version = self.apply_change(scope, |engine| {
            let (_, index) = accessor::find_by_name::<K, E>(engine, name, section)?
                .ok_or_else(|| accessor::not_found::<K, E>(engine, name, section))?;
            accessor::delete_at::<K, E>(engine, section, name, index)
        })?;

        info!(kind = K::LABEL, name, section, %version, "deleted");
        let cache_scope = self.written(scope, version);
        K::cache(&self.cache).delete(section, name, &cache_scope);
        Ok(version)
    }

    // ---- Binds ----

    pub fn get_binds(
        &self,
        frontend: &str,
        transaction: Option<&TransactionId>,
    ) -> ConfResult<Versioned<Vec<Bind>>> {
        self.list(frontend, transaction)
    }

    pub fn get_bind(
        &self,
        name: &str,
        frontend: &str,
        transaction: Option<&TransactionId>,
    ) -> ConfResult<Versioned<Bind>> {
        self.get(name, frontend, transaction)
    }

    pub fn create_bind(&self, frontend: &str, bind: &Bind, scope: &Scope) -> ConfResult<Version> {
        self.create(frontend, bind, scope)
    }

    pub fn edit_bind(
        &self,
        name: &str,
        frontend: &str,
        bind: &Bind,
        scope: &Scope,
    ) -> ConfResult<Version> {
        self.edit(name, frontend, bind, scope)
    }

    pub fn delete_bind(&self, name: &str, frontend: &str, scope: &Scope) -> ConfResult<Version> {
        self.delete::<Bind>(name, frontend, scope)
    }

    // ---- Transactions ----

    /// Open an explicit transaction on top of `version`.
    pub fn start_transaction(&self, version: Version) -> ConfResult<Transaction> {
        let transaction = self.store().start(version)?;
        self.cache
            .versions()
            .set(&CacheScope::Transaction(transaction.id.clone()), transaction.version);
        Ok(transaction)
    }

    pub fn get_transaction(&self, id: &TransactionId) -> ConfResult<Transaction> {
        Ok(self.store().get(id)?)
    }

    pub fn get_transactions(
        &self,
        status: Option<TransactionStatus>,
    ) -> ConfResult<Vec<Transaction>> {
        Ok(self.store().list(status)?)
    }

    /// Commit an explicit transaction. Returns it with the new committed
    /// version.
    pub fn commit_transaction(&self, id: &TransactionId) -> ConfResult<Transaction> {
        let committed = self.store().commit(id);
        self.cache.invalidate_transaction(id);
        self.cache.invalidate_committed();
        let version = committed?;
        self.cache.versions().set(&CacheScope::Committed, version);
        Ok(Transaction {
            id: id.clone(),
            version,
            status: TransactionStatus::Success,
        })
    }

    /// Discard a transaction in any status.
    pub fn delete_transaction(&self, id: &TransactionId) -> ConfResult<()> {
        self.store().delete(id)?;
        self.cache.invalidate_transaction(id);
        Ok(())
    }
}

impl<E> std::fmt::Debug for Client<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Load, edit, and save one staged file.
fn edit_file<E, F>(path: &Path, edit: F) -> ConfResult<()>
where
    E: ConfigEngine + Default,
    F: FnOnce(&mut E) -> ConfResult<()>,
{
    let mut engine = E::default();
    engine.load_data(path)?;
    edit(&mut engine)?;
    engine.save(path)?;
    Ok(())
}

fn already_exists<K: ConfigObject>(name: &str, section: &str) -> ConfError {
    ConfError::AlreadyExists(format!(
        "{} {name} already exists in {} {section}",
        K::LABEL,
        K::PARENT.keyword()
    ))
}
