use crate::core::Simultaneous;
use crate::utils::error::{HostError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub struct SimultaneousService {
    next_id: AtomicI32,
    words: Mutex<Vec<String>>,
    work_delay: Duration,
}

impl SimultaneousService {
    pub fn new(work_delay: Duration) -> Self {
        Self {
            next_id: AtomicI32::new(1),
            words: Mutex::new(Vec::new()),
            work_delay,
        }
    }

    async fn pause(&self) {
        if !self.work_delay.is_zero() {
            tokio::time::sleep(self.work_delay).await;
        }
    }

    pub async fn pending_words(&self) -> usize {
        self.words.lock().await.len()
    }
}

impl Default for SimultaneousService {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl Simultaneous for SimultaneousService {
    async fn get_id(&self) -> Result<i32> {
        self.pause().await;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Issued id {}", id);
        Ok(id)
    }

    async fn load_it(&self, word: String) -> Result<()> {
        if word.is_empty() {
            return Err(HostError::invalid_argument("LoadIt", "word cannot be empty"));
        }
        self.pause().await;
        let mut words = self.words.lock().await;
        words.push(word);
        tracing::debug!("Loaded word, {} pending", words.len());
        Ok(())
    }

    async fn remove_it(&self) -> Result<Option<String>> {
        self.pause().await;
        let word = self.words.lock().await.pop();
        if word.is_none() {
            tracing::debug!("RemoveIt called with nothing loaded");
        }
        Ok(word)
    }

    async fn close(&self) -> Result<()> {
        let mut words = self.words.lock().await;
        if !words.is_empty() {
            tracing::info!("Discarding {} pending words", words.len());
        }
        words.clear();
        Ok(())
    }
}
