//! Injected repositories.
//!
//! Systems never touch files; they go through the trait objects held by
//! [`Storage`]. The production wiring puts a
//! [`JsonRepository`](crate::storage::JsonRepository) behind every handle and
//! a [`ProgressionRecorder`] as the round-result sink.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;

use crate::events::round::RoundResultSink;
use crate::progression::ProgressionRecorder;
use crate::storage::repo::{CharacterRepository, ProgressStore, UserRepository, UserStatSink};

#[derive(Resource, Clone)]
pub struct Storage {
    pub characters: Arc<dyn CharacterRepository>,
    pub users: Arc<dyn UserRepository>,
    /// Receives fighter stat snapshots.
    pub stats: Arc<dyn UserStatSink>,
    /// Receives one result per finished round.
    pub results: Arc<dyn RoundResultSink>,
}

impl Storage {
    /// Wire every handle to one store.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: CharacterRepository + ProgressStore + 'static,
    {
        let progress: Arc<dyn ProgressStore> = store.clone();
        Self::with_results(store, Arc::new(ProgressionRecorder::new(progress)))
    }

    /// Like [`Storage::from_store`] with a custom result sink.
    pub fn with_results<S>(store: Arc<S>, results: Arc<dyn RoundResultSink>) -> Self
    where
        S: CharacterRepository + UserRepository + 'static,
    {
        Self {
            characters: store.clone(),
            users: store.clone(),
            stats: store,
            results,
        }
    }
}
