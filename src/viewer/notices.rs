use bevy::prelude::*;

use crate::constants::NOTICE_LIFETIME_SECS;

#[derive(Debug, Clone, PartialEq)]
pub struct NoticeEntry {
    pub id: u64,
    pub message: String,
    /// Seconds since the notice was raised
    pub age: f32,
}

/// Transient user-facing messages (failed saves, unreadable pages, ...).
#[derive(Resource, Default)]
pub struct Notices {
    entries: Vec<NoticeEntry>,
    next_id: u64,
}

impl Notices {
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        // Repeating the same failure should not stack identical rows.
        if let Some(existing) = self.entries.iter_mut().find(|e| e.message == message) {
            existing.age = 0.0;
            return;
        }
        self.next_id += 1;
        self.entries.push(NoticeEntry {
            id: self.next_id,
            message,
            age: 0.0,
        });
    }

    pub fn dismiss(&mut self, id: u64) {
        self.entries.retain(|e| e.id != id);
    }

    pub fn entries(&self) -> &[NoticeEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Age every notice by `delta` seconds and drop the expired ones.
    pub fn tick(&mut self, delta: f32) {
        for entry in &mut self.entries {
            entry.age += delta;
        }
        self.entries.retain(|e| e.age < NOTICE_LIFETIME_SECS);
    }
}

pub fn expire_notices(time: Res<Time>, mut notices: ResMut<Notices>) {
    if notices.is_empty() {
        return;
    }
    notices.tick(time.delta_secs());
}
