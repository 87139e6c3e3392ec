//! Entity façade.
//!
//! Writes go to the local store first and are visible to `list` as soon as
//! they return. When online, each write then schedules a push whose
//! [`SyncTicket`] is handed back to the caller.

use crate::error::SyncResult;
use crate::outcome::SyncTicket;
use crate::remote::RemoteService;
use crate::state::SyncEngine;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tillsync_model::{
    from_record, next_code, to_record, Category, Entity, Product, Receipt, Record, Return,
    SequenceField, Shopkeeper, ShopkeeperProfile,
};
use tillsync_store::LocalStore;
use tracing::{debug, warn};
use uuid::Uuid;

/// A locally stored entity and the push scheduled after the write.
#[derive(Debug)]
pub struct Written<E> {
    /// The entity as stored, with ID and sequence code assigned.
    pub entity: E,
    /// The opportunistic push.
    pub sync: SyncTicket,
}

/// Per-entity operations over a shared engine.
pub struct Catalog<S: LocalStore, R: RemoteService> {
    engine: Arc<SyncEngine<S, R>>,
    // Held across the code scan and the save so in-process writers never
    // compute the same code. Other devices can still collide.
    sequence_lock: Mutex<()>,
}

impl<S, R> Catalog<S, R>
where
    S: LocalStore + 'static,
    R: RemoteService + 'static,
{
    /// Creates a catalog over `engine`.
    pub fn new(engine: Arc<SyncEngine<S, R>>) -> Self {
        Self {
            engine,
            sequence_lock: Mutex::new(()),
        }
    }

    /// Gets the engine.
    pub fn engine(&self) -> &Arc<SyncEngine<S, R>> {
        &self.engine
    }

    /// Returns the repository for entity type `E`.
    pub fn repository<E: Entity>(&self) -> Repository<'_, E, S, R> {
        Repository {
            catalog: self,
            _entity: PhantomData,
        }
    }

    /// Products.
    pub fn products(&self) -> Repository<'_, Product, S, R> {
        self.repository()
    }

    /// Categories.
    pub fn categories(&self) -> Repository<'_, Category, S, R> {
        self.repository()
    }

    /// Shopkeepers.
    pub fn shopkeepers(&self) -> Repository<'_, Shopkeeper, S, R> {
        self.repository()
    }

    /// Receipts.
    pub fn receipts(&self) -> Repository<'_, Receipt, S, R> {
        self.repository()
    }

    /// Returns.
    pub fn returns(&self) -> Repository<'_, Return, S, R> {
        self.repository()
    }

    /// Finds a shopkeeper by name and phone, or creates one.
    ///
    /// A match only has its `updated_at` refreshed; the other fields of
    /// `profile` are not applied to it. Otherwise a new active shopkeeper is
    /// created with the profile's role, or `customer`.
    pub fn create_or_update_shopkeeper(
        &self,
        profile: ShopkeeperProfile,
    ) -> SyncResult<Written<Shopkeeper>> {
        let shopkeepers = self.shopkeepers();
        let existing = shopkeepers
            .list()?
            .into_iter()
            .find(|shopkeeper| shopkeeper.matches(&profile.name, &profile.phone));

        match existing {
            Some(mut shopkeeper) => {
                if profile.email != shopkeeper.email || profile.address != shopkeeper.address {
                    debug!(
                        id = %shopkeeper.id,
                        "existing shopkeeper kept; incoming contact details ignored"
                    );
                }
                shopkeeper.updated_at = Some(Utc::now());
                shopkeepers.save(shopkeeper)
            }
            None => shopkeepers.save(Shopkeeper::from_profile(profile, Utc::now())),
        }
    }
}

/// Save, delete and list for one entity type.
pub struct Repository<'a, E, S: LocalStore, R: RemoteService> {
    catalog: &'a Catalog<S, R>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S, R> Repository<'_, E, S, R>
where
    E: Entity,
    S: LocalStore + 'static,
    R: RemoteService + 'static,
{
    fn store(&self) -> &S {
        self.catalog.engine.store()
    }

    /// Stores `entity` locally and schedules a push.
    ///
    /// Assigns a random ID if missing and, for sequenced entities, the next
    /// sequence code if missing. Existing codes are never replaced.
    ///
    /// # Errors
    ///
    /// Returns validation and local store errors. Push failures are only
    /// visible through the returned ticket.
    pub fn save(&self, mut entity: E) -> SyncResult<Written<E>> {
        if entity.id().is_empty() {
            entity.set_id(Uuid::new_v4().to_string());
        }
        entity.validate()?;
        let mut record = to_record(&entity)?;

        let item = match E::SEQUENCE {
            Some(field) => {
                let _allocation = self.catalog.sequence_lock.lock();
                self.assign_sequence(field, &mut record)?;
                self.store().save(E::TABLE, record)?
            }
            None => self.store().save(E::TABLE, record)?,
        };

        let entity: E = from_record(item.data)?;
        debug!(table = %E::TABLE, id = entity.id(), queue_id = %item.id, "saved locally");
        Ok(Written {
            entity,
            sync: self.catalog.engine.schedule_push(),
        })
    }

    fn assign_sequence(&self, field: SequenceField, record: &mut Record) -> SyncResult<()> {
        let assigned = record
            .get(field.column)
            .and_then(Value::as_str)
            .is_some_and(|code| !code.is_empty());
        if assigned {
            return Ok(());
        }

        let existing = self.store().get_all(E::TABLE)?;
        let code = next_code(
            field.prefix,
            existing
                .iter()
                .filter_map(|row| row.get(field.column).and_then(Value::as_str)),
        )?;
        debug!(table = %E::TABLE, %code, "sequence code assigned");
        record.insert(field.column.to_string(), Value::String(code));
        Ok(())
    }

    /// Deletes the entity locally and schedules a push.
    ///
    /// Products are soft-deleted; other entities are removed.
    pub fn delete(&self, id: &str) -> SyncResult<SyncTicket> {
        let item = self.store().delete(E::TABLE, id)?;
        debug!(table = %E::TABLE, id, queue_id = %item.id, "deleted locally");
        Ok(self.catalog.engine.schedule_push())
    }

    /// Returns every locally stored entity. Never contacts the remote.
    ///
    /// Rows that do not match the entity schema are skipped with a warning.
    pub fn list(&self) -> SyncResult<Vec<E>> {
        Ok(self
            .store()
            .get_all(E::TABLE)?
            .into_iter()
            .filter_map(|row| match from_record::<E>(row) {
                Ok(entity) => Some(entity),
                Err(error) => {
                    warn!(table = %E::TABLE, %error, "skipping unreadable row");
                    None
                }
            })
            .collect())
    }

    /// Returns the locally stored entity with `id`.
    pub fn get(&self, id: &str) -> SyncResult<Option<E>> {
        match self.store().get(E::TABLE, id)? {
            Some(row) => Ok(Some(from_record(row)?)),
            None => Ok(None),
        }
    }
}
