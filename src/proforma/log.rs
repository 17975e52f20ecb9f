// src/proforma/log.rs

use crate::{
    config::PROFORMA_RESPONSES_KEY, error::AppError, models::proforma::ProformaResponse,
    store::KvStore,
};

/// The proforma's flat response list, kept whole under one key.
#[derive(Clone)]
pub struct ResponseLog {
    kv: KvStore,
}

impl ResponseLog {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Loads every stored response, oldest first.
    ///
    /// Unreadable storage yields an empty list.
    pub async fn load(&self) -> Vec<ProformaResponse> {
        match self.kv.get::<Vec<ProformaResponse>>(PROFORMA_RESPONSES_KEY).await {
            Ok(Some(responses)) => responses,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Unreadable proforma responses, starting empty: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Appends a response and returns the participant id it was stored under.
    ///
    /// An id already in the log gets a `-2`, `-3`, ... suffix.
    pub async fn add(&self, mut response: ProformaResponse) -> Result<String, AppError> {
        let mut stored_id = String::new();
        self.kv
            .update(PROFORMA_RESPONSES_KEY, |responses: &mut Vec<ProformaResponse>| {
                response.participant_id = unique_id(responses, &response.participant_id);
                stored_id = response.participant_id.clone();
                responses.push(response);
                true
            })
            .await
            .map_err(|e| {
                tracing::error!("Failed to save proforma response: {:?}", e);
                e
            })?;
        Ok(stored_id)
    }

    pub async fn find(&self, participant_id: &str) -> Option<ProformaResponse> {
        self.load()
            .await
            .into_iter()
            .find(|r| r.participant_id == participant_id)
    }

    /// Returns whether a response was removed.
    pub async fn delete(&self, participant_id: &str) -> Result<bool, AppError> {
        self.kv
            .update(PROFORMA_RESPONSES_KEY, |responses: &mut Vec<ProformaResponse>| {
                let before = responses.len();
                responses.retain(|r| r.participant_id != participant_id);
                responses.len() != before
            })
            .await
    }
}

fn unique_id(responses: &[ProformaResponse], wanted: &str) -> String {
    let taken = |id: &str| responses.iter().any(|r| r.participant_id == id);
    if !taken(wanted) {
        return wanted.to_string();
    }
    (2..)
        .map(|n| format!("{wanted}-{n}"))
        .find(|id| !taken(id))
        .unwrap_or_else(|| wanted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::proforma::Notes;
    use crate::store::test_pool;

    fn response(id: &str, timestamp: i64) -> ProformaResponse {
        ProformaResponse {
            participant_id: id.to_string(),
            timestamp,
            answers: Default::default(),
            notes: Notes {
                language: "Balochi".into(),
                tehsil: "Jhal Jhao".into(),
                observations: String::new(),
            },
        }
    }

    #[tokio::test]
    async fn add_find_delete() {
        let log = ResponseLog::new(KvStore::new(test_pool().await));
        log.add(response("P-1", 1)).await.unwrap();
        log.add(response("P-2", 2)).await.unwrap();

        assert_eq!(log.load().await.len(), 2);
        assert_eq!(log.find("P-2").await.unwrap().timestamp, 2);

        assert!(log.delete("P-1").await.unwrap());
        assert!(!log.delete("P-1").await.unwrap());
        let remaining = log.load().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].participant_id, "P-2");
    }

    #[tokio::test]
    async fn same_millisecond_submissions_get_distinct_ids() {
        let log = ResponseLog::new(KvStore::new(test_pool().await));
        assert_eq!(log.add(response("P-5", 5)).await.unwrap(), "P-5");
        assert_eq!(log.add(response("P-5", 5)).await.unwrap(), "P-5-2");
        assert_eq!(log.add(response("P-5", 5)).await.unwrap(), "P-5-3");

        assert!(log.delete("P-5").await.unwrap());
        let ids: Vec<String> = log.load().await.into_iter().map(|r| r.participant_id).collect();
        assert_eq!(ids, vec!["P-5-2", "P-5-3"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_are_all_kept() {
        let path = std::env::temp_dir().join(format!("proforma-log-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let pool = crate::store::connect(&format!("sqlite://{}", path.display()))
            .await
            .unwrap();
        let log = ResponseLog::new(KvStore::new(pool));

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let log = log.clone();
                tokio::spawn(async move { log.add(response("P-1", 1)).await })
            })
            .collect();
        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap().unwrap());
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 20);
        assert_eq!(log.load().await.len(), 20);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn corrupt_storage_falls_back_to_empty() {
        let kv = KvStore::new(test_pool().await);
        kv.set_raw(PROFORMA_RESPONSES_KEY, "[{\"oops\":").await.unwrap();
        let log = ResponseLog::new(kv);
        assert!(log.load().await.is_empty());
    }
}
