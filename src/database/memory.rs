use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::GameStore;
use crate::error::{AppError, AppResult};
use crate::models::{Identity, ParticipantEntry, Prize};

#[derive(Default)]
struct EstablishmentState {
    prizes: Vec<Prize>,
    // 按写入顺序追加，读取时倒序
    participants: Vec<ParticipantEntry>,
}

impl EstablishmentState {
    fn is_duplicate(&self, identity: &Identity) -> bool {
        self.participants
            .iter()
            .any(|p| p.identity().matches(identity))
    }

    fn code_taken(&self, prize_code: &str) -> bool {
        self.participants.iter().any(|p| p.prize_code == prize_code)
    }

    fn check_insertable(&self, entry: &ParticipantEntry) -> AppResult<()> {
        if self.is_duplicate(&entry.identity()) {
            return Err(AppError::DuplicateParticipation);
        }
        if self.code_taken(&entry.prize_code) {
            return Err(AppError::InternalError(format!(
                "Prize code {} already in use",
                entry.prize_code
            )));
        }
        Ok(())
    }
}

/// 内存存储（演示环境 / 测试）
///
/// 每个写操作在同一把写锁内完成且中间没有 await，天然原子。
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<HashMap<String, EstablishmentState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn list_prizes(&self, establishment_id: &str) -> AppResult<Vec<Prize>> {
        let state = self.state.read().await;
        Ok(state
            .get(establishment_id)
            .map(|s| s.prizes.clone())
            .unwrap_or_default())
    }

    async fn find_prize(
        &self,
        establishment_id: &str,
        prize_id: Uuid,
    ) -> AppResult<Option<Prize>> {
        let state = self.state.read().await;
        Ok(state
            .get(establishment_id)
            .and_then(|s| s.prizes.iter().find(|p| p.id == prize_id).cloned()))
    }

    async fn insert_prize(&self, prize: &Prize) -> AppResult<()> {
        let mut state = self.state.write().await;
        state
            .entry(prize.establishment_id.clone())
            .or_default()
            .prizes
            .push(prize.clone());
        Ok(())
    }

    async fn update_prize(&self, prize: &Prize) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .get_mut(&prize.establishment_id)
            .and_then(|s| s.prizes.iter_mut().find(|p| p.id == prize.id))
            .ok_or_else(|| AppError::NotFound("Prize not found".to_string()))?;
        *stored = prize.clone();
        Ok(())
    }

    async fn delete_prize(&self, establishment_id: &str, prize_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let Some(s) = state.get_mut(establishment_id) else {
            return Ok(false);
        };
        let before = s.prizes.len();
        s.prizes.retain(|p| p.id != prize_id);
        Ok(s.prizes.len() != before)
    }

    async fn list_participants(&self, establishment_id: &str) -> AppResult<Vec<ParticipantEntry>> {
        let state = self.state.read().await;
        Ok(state
            .get(establishment_id)
            .map(|s| s.participants.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn page_participants(
        &self,
        establishment_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<ParticipantEntry>, u64)> {
        let state = self.state.read().await;
        let Some(s) = state.get(establishment_id) else {
            return Ok((Vec::new(), 0));
        };
        let items = s
            .participants
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((items, s.participants.len() as u64))
    }

    async fn find_participant(
        &self,
        establishment_id: &str,
        participant_id: Uuid,
    ) -> AppResult<Option<ParticipantEntry>> {
        let state = self.state.read().await;
        Ok(state.get(establishment_id).and_then(|s| {
            s.participants
                .iter()
                .find(|p| p.id == participant_id)
                .cloned()
        }))
    }

    async fn find_by_identity(
        &self,
        establishment_id: &str,
        identity: &Identity,
    ) -> AppResult<Option<ParticipantEntry>> {
        let state = self.state.read().await;
        Ok(state.get(establishment_id).and_then(|s| {
            s.participants
                .iter()
                .find(|p| p.identity().matches(identity))
                .cloned()
        }))
    }

    async fn prize_code_exists(&self, establishment_id: &str, prize_code: &str) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .get(establishment_id)
            .is_some_and(|s| s.code_taken(prize_code)))
    }

    async fn insert_participant(&self, entry: &ParticipantEntry) -> AppResult<()> {
        let mut state = self.state.write().await;
        let s = state.entry(entry.establishment_id.clone()).or_default();
        s.check_insertable(entry)?;
        s.participants.push(entry.clone());
        Ok(())
    }

    async fn commit_draw(&self, prize: &Prize, entry: &ParticipantEntry) -> AppResult<()> {
        let mut state = self.state.write().await;
        let s = state
            .get_mut(&prize.establishment_id)
            .ok_or_else(|| AppError::NotFound("Prize not found".to_string()))?;

        // 先完成全部校验，再一起写入
        s.check_insertable(entry)?;
        let stored = s
            .prizes
            .iter_mut()
            .find(|p| p.id == prize.id)
            .ok_or_else(|| AppError::NotFound("Prize not found".to_string()))?;
        if stored.remaining_quantity != prize.remaining_quantity + 1 {
            return Err(AppError::InventoryError(format!(
                "Stock of prize {} changed during the draw",
                prize.id
            )));
        }

        stored.remaining_quantity = prize.remaining_quantity;
        s.participants.push(entry.clone());
        Ok(())
    }

    async fn update_redemption(&self, entry: &ParticipantEntry) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .get_mut(&entry.establishment_id)
            .and_then(|s| s.participants.iter_mut().find(|p| p.id == entry.id))
            .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;
        stored.redeemed = entry.redeemed;
        stored.redeemed_at = entry.redeemed_at;
        Ok(())
    }

    async fn delete_participant(
        &self,
        establishment_id: &str,
        participant_id: Uuid,
    ) -> AppResult<Option<ParticipantEntry>> {
        let mut state = self.state.write().await;
        let Some(s) = state.get_mut(establishment_id) else {
            return Ok(None);
        };
        let Some(pos) = s.participants.iter().position(|p| p.id == participant_id) else {
            return Ok(None);
        };
        let removed = s.participants.remove(pos);
        if let Some(prize) = s.prizes.iter_mut().find(|p| p.id == removed.prize_id)
            && prize.remaining_quantity < prize.quantity
        {
            prize.remaining_quantity += 1;
        }
        Ok(Some(removed))
    }
}
