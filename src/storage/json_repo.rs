//! Flat-file JSON repository.
//!
//! One directory holds four documents:
//!
//! | file                  | shape                              |
//! |-----------------------|------------------------------------|
//! | `characters.json`     | `{ name: CharacterDefinition }`    |
//! | `users.json`          | `{ name: UserRecord }`             |
//! | `missions.json`       | `{ id: MissionDefinition }`        |
//! | `battle_history.json` | `[ BattleRecord ]`, newest first   |
//!
//! A missing file reads as empty. Every write goes to a temporary file that
//! is then renamed over the target, and a mutex serialises read-modify-write
//! cycles of this process.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::StoreError;
use super::repo::{
    BattleRecord, CharacterRepository, HistoryRepository, MissionDefinition, MissionRepository,
    UserRecord, UserRepository, prepend_capped,
};
use crate::resources::characters::CharacterDefinition;

pub const CHARACTERS_FILE: &str = "characters.json";
pub const USERS_FILE: &str = "users.json";
pub const MISSIONS_FILE: &str = "missions.json";
pub const HISTORY_FILE: &str = "battle_history.json";

#[derive(Debug)]
pub struct JsonRepository {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        info!("JSON repository at {:?}", dir);
        Self {
            dir,
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.lock.lock().map_err(|_| StoreError::Poisoned)
    }

    fn read<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T, StoreError> {
        let path = self.dir.join(file);
        match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Ok(T::default()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file);
        let tmp = self.dir.join(format!(".{}.tmp", file));
        fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        debug!("Wrote {:?}", path);
        Ok(())
    }

    fn read_users(&self) -> Result<BTreeMap<String, UserRecord>, StoreError> {
        let mut users: BTreeMap<String, UserRecord> = self.read(USERS_FILE)?;
        for (name, record) in users.iter_mut() {
            record.name = name.clone();
        }
        Ok(users)
    }
}

impl CharacterRepository for JsonRepository {
    fn get(&self, name: &str) -> Result<CharacterDefinition, StoreError> {
        let _guard = self.guard()?;
        let mut characters: BTreeMap<String, CharacterDefinition> = self.read(CHARACTERS_FILE)?;
        characters
            .remove(name)
            .ok_or_else(|| StoreError::not_found("character", name))
    }

    fn put(&self, name: &str, def: &CharacterDefinition) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut characters: BTreeMap<String, CharacterDefinition> = self.read(CHARACTERS_FILE)?;
        characters.insert(name.to_string(), def.clone());
        self.write(CHARACTERS_FILE, &characters)
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.guard()?;
        let characters: BTreeMap<String, CharacterDefinition> = self.read(CHARACTERS_FILE)?;
        Ok(characters.into_keys().collect())
    }
}

impl UserRepository for JsonRepository {
    fn get_user(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
        let _guard = self.guard()?;
        Ok(self.read_users()?.remove(name))
    }

    fn put_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut users = self.read_users()?;
        users.insert(record.name.clone(), record.clone());
        self.write(USERS_FILE, &users)
    }

    fn update_user(
        &self,
        name: &str,
        apply: &mut dyn FnMut(&mut UserRecord),
    ) -> Result<UserRecord, StoreError> {
        let _guard = self.guard()?;
        let mut users = self.read_users()?;
        let record = users
            .entry(name.to_string())
            .or_insert_with(|| UserRecord::new(name));
        apply(record);
        let updated = record.clone();
        self.write(USERS_FILE, &users)?;
        Ok(updated)
    }
}

impl MissionRepository for JsonRepository {
    fn missions(&self) -> Result<Vec<(String, MissionDefinition)>, StoreError> {
        let _guard = self.guard()?;
        let missions: BTreeMap<String, MissionDefinition> = self.read(MISSIONS_FILE)?;
        Ok(missions.into_iter().collect())
    }

    fn put_mission(&self, id: &str, mission: &MissionDefinition) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut missions: BTreeMap<String, MissionDefinition> = self.read(MISSIONS_FILE)?;
        missions.insert(id.to_string(), mission.clone());
        self.write(MISSIONS_FILE, &missions)
    }
}

impl HistoryRepository for JsonRepository {
    fn history(&self) -> Result<Vec<BattleRecord>, StoreError> {
        let _guard = self.guard()?;
        self.read(HISTORY_FILE)
    }

    fn push(&self, record: BattleRecord) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut history: Vec<BattleRecord> = self.read(HISTORY_FILE)?;
        prepend_capped(&mut history, record);
        self.write(HISTORY_FILE, &history)
    }
}
