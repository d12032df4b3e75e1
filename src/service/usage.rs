//! Usage slider state.
//!
//! The same slider values feed two consumers with different freshness
//! requirements: per-card price display reads the live value, while the
//! catalog-wide ranking (price sorts) reads a debounced snapshot so the
//! sort order does not thrash while a slider is being dragged.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Per-provider runtime usage values overriding the global sliders.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageOverride {
    pub input: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<f64>,
}

/// A point-in-time view of the slider state, used by the pricing and
/// ranking engines.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UsageSnapshot {
    pub global_input: Option<f64>,
    pub global_output: Option<f64>,
    pub overrides: HashMap<i64, UsageOverride>,
}

impl UsageSnapshot {
    pub fn has_active_sliders(&self) -> bool {
        self.global_input.is_some() || self.global_output.is_some() || !self.overrides.is_empty()
    }

    pub fn override_for(&self, provider_id: i64) -> Option<&UsageOverride> {
        self.overrides.get(&provider_id)
    }
}

#[derive(Clone)]
pub struct UsageService {
    global_input: Arc<RwLock<Option<f64>>>,
    global_output: Arc<RwLock<Option<f64>>>,
    overrides: Arc<DashMap<i64, UsageOverride>>,
    ranking: Arc<RwLock<UsageSnapshot>>,
    changed_tx: watch::Sender<u64>,
}

impl UsageService {
    pub fn new(settle: Duration) -> Self {
        let (changed_tx, changed_rx) = watch::channel(0u64);
        let service = Self {
            global_input: Arc::new(RwLock::new(None)),
            global_output: Arc::new(RwLock::new(None)),
            overrides: Arc::new(DashMap::new()),
            ranking: Arc::new(RwLock::new(UsageSnapshot::default())),
            changed_tx,
        };

        service.clone().spawn_settle_task(changed_rx, settle);

        service
    }

    /// Copies the live values into the ranking snapshot once input has been
    /// quiet for the settle period. Each new change restarts the timer.
    fn spawn_settle_task(self, mut changed_rx: watch::Receiver<u64>, settle: Duration) {
        tokio::spawn(async move {
            while changed_rx.changed().await.is_ok() {
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(settle) => break,
                        changed = changed_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                    }
                }
                let snapshot = self.display_snapshot();
                if let Ok(mut ranking) = self.ranking.write() {
                    *ranking = snapshot;
                }
            }
        });
    }

    fn touch(&self) {
        self.changed_tx.send_modify(|generation| *generation += 1);
    }

    fn read_global(slot: &RwLock<Option<f64>>) -> Option<f64> {
        slot.read().ok().and_then(|value| *value)
    }

    fn write_global(slot: &RwLock<Option<f64>>, value: Option<f64>) {
        if let Ok(mut slot) = slot.write() {
            *slot = value;
        }
    }

    pub fn set_global_usage(&self, input: Option<f64>, output: Option<f64>) {
        Self::write_global(&self.global_input, input);
        Self::write_global(&self.global_output, output);
        self.touch();
    }

    /// Setting an override takes the provider off the global sliders, which
    /// are reset in the process.
    pub fn set_override(&self, provider_id: i64, usage: UsageOverride) {
        self.overrides.insert(provider_id, usage);
        Self::write_global(&self.global_input, None);
        Self::write_global(&self.global_output, None);
        self.touch();
    }

    pub fn remove_override(&self, provider_id: i64) -> bool {
        let removed = self.overrides.remove(&provider_id).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    pub fn clear_all(&self) {
        self.overrides.clear();
        Self::write_global(&self.global_input, None);
        Self::write_global(&self.global_output, None);
        self.touch();
    }

    pub fn global_input(&self) -> Option<f64> {
        Self::read_global(&self.global_input)
    }

    /// Live values, for the display path.
    pub fn display_snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            global_input: Self::read_global(&self.global_input),
            global_output: Self::read_global(&self.global_output),
            overrides: self
                .overrides
                .iter()
                .map(|entry| (*entry.key(), *entry.value()))
                .collect(),
        }
    }

    /// Debounced values, for the ranking path.
    pub fn ranking_snapshot(&self) -> UsageSnapshot {
        self.ranking
            .read()
            .map(|snapshot| snapshot.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_display_path_is_immediate() {
        let service = UsageService::new(Duration::from_millis(50));
        service.set_global_usage(Some(1000.0), None);

        let snapshot = service.display_snapshot();
        assert_eq!(snapshot.global_input, Some(1000.0));
        assert!(snapshot.has_active_sliders());
    }

    #[tokio::test]
    async fn test_ranking_path_waits_for_settle() {
        let service = UsageService::new(Duration::from_millis(50));
        service.set_global_usage(Some(1000.0), None);

        // Before the settle period the ranking snapshot is unchanged.
        assert_eq!(service.ranking_snapshot(), UsageSnapshot::default());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(service.ranking_snapshot().global_input, Some(1000.0));
    }

    #[tokio::test]
    async fn test_settle_timer_resets_on_new_input() {
        let service = UsageService::new(Duration::from_millis(100));
        service.set_global_usage(Some(1.0), None);
        tokio::time::sleep(Duration::from_millis(60)).await;
        service.set_global_usage(Some(2.0), None);
        tokio::time::sleep(Duration::from_millis(60)).await;

        // 120ms elapsed but the second change restarted the timer.
        assert_eq!(service.ranking_snapshot(), UsageSnapshot::default());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(service.ranking_snapshot().global_input, Some(2.0));
    }

    #[tokio::test]
    async fn test_override_resets_global_sliders() {
        let service = UsageService::new(Duration::from_millis(10));
        service.set_global_usage(Some(1000.0), Some(800.0));
        service.set_override(
            7,
            UsageOverride {
                input: 500.0,
                output: None,
            },
        );

        let snapshot = service.display_snapshot();
        assert_eq!(snapshot.global_input, None);
        assert_eq!(snapshot.global_output, None);
        assert_eq!(snapshot.override_for(7).map(|o| o.input), Some(500.0));
        assert!(snapshot.has_active_sliders());
    }

    #[tokio::test]
    async fn test_clear_all_deactivates_sliders() {
        let service = UsageService::new(Duration::from_millis(10));
        service.set_override(
            7,
            UsageOverride {
                input: 500.0,
                output: Some(100.0),
            },
        );
        service.clear_all();

        assert!(!service.display_snapshot().has_active_sliders());
    }
}
