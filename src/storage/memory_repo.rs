//! In-memory repository for tests and headless simulation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::error::StoreError;
use super::repo::{
    BattleRecord, CharacterRepository, HistoryRepository, MissionDefinition, MissionRepository,
    UserRecord, UserRepository, prepend_capped,
};
use crate::resources::characters::CharacterDefinition;

#[derive(Debug, Default)]
struct MemoryData {
    characters: BTreeMap<String, CharacterDefinition>,
    users: BTreeMap<String, UserRecord>,
    missions: BTreeMap<String, MissionDefinition>,
    history: Vec<BattleRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    data: Mutex<MemoryData>,
    read_only: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character(self, name: &str, def: CharacterDefinition) -> Self {
        if let Ok(mut data) = self.data.lock() {
            data.characters.insert(name.to_string(), def);
        }
        self
    }

    /// Make every write fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn data(&self) -> Result<MutexGuard<'_, MemoryData>, StoreError> {
        self.data.lock().map_err(|_| StoreError::Poisoned)
    }

    fn writable(&self) -> Result<MutexGuard<'_, MemoryData>, StoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        self.data()
    }
}

impl CharacterRepository for MemoryRepository {
    fn get(&self, name: &str) -> Result<CharacterDefinition, StoreError> {
        self.data()?
            .characters
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("character", name))
    }

    fn put(&self, name: &str, def: &CharacterDefinition) -> Result<(), StoreError> {
        self.writable()?
            .characters
            .insert(name.to_string(), def.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.data()?.characters.keys().cloned().collect())
    }
}

impl UserRepository for MemoryRepository {
    fn get_user(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.data()?.users.get(name).cloned())
    }

    fn put_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.writable()?
            .users
            .insert(record.name.clone(), record.clone());
        Ok(())
    }

    fn update_user(
        &self,
        name: &str,
        apply: &mut dyn FnMut(&mut UserRecord),
    ) -> Result<UserRecord, StoreError> {
        let mut data = self.writable()?;
        let record = data
            .users
            .entry(name.to_string())
            .or_insert_with(|| UserRecord::new(name));
        apply(record);
        Ok(record.clone())
    }
}

impl MissionRepository for MemoryRepository {
    fn missions(&self) -> Result<Vec<(String, MissionDefinition)>, StoreError> {
        Ok(self
            .data()?
            .missions
            .iter()
            .map(|(id, m)| (id.clone(), m.clone()))
            .collect())
    }

    fn put_mission(&self, id: &str, mission: &MissionDefinition) -> Result<(), StoreError> {
        self.writable()?
            .missions
            .insert(id.to_string(), mission.clone());
        Ok(())
    }
}

impl HistoryRepository for MemoryRepository {
    fn history(&self) -> Result<Vec<BattleRecord>, StoreError> {
        Ok(self.data()?.history.clone())
    }

    fn push(&self, record: BattleRecord) -> Result<(), StoreError> {
        prepend_capped(&mut self.writable()?.history, record);
        Ok(())
    }
}
