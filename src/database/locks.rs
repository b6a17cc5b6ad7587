use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 按商户划分的互斥锁
///
/// 同一商户的 "查重 -> 写入"、"扣库存 -> 写记录" 必须串行执行，
/// 不同商户之间互不阻塞。
#[derive(Clone, Default)]
pub struct EstablishmentLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl EstablishmentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, establishment_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(establishment_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
