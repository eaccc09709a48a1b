//! 播放进度的保存与续播。

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};

use crate::{
    config::CatalogConfig,
    model::playback::PlaybackProgress,
    storage::KeyValueStore,
    timer,
};

#[derive(Debug, Clone, PartialEq)]
struct Sample {
    series_id: String,
    display_number: u32,
    elapsed: f64,
    duration: f64,
}

/// 节流地把播放进度写入持久存储。
pub struct ProgressTracker {
    store: Arc<dyn KeyValueStore>,
    min_elapsed_secs: f64,
    write_interval: Duration,
    resume_finished_ratio: f64,
    last_write: Option<DateTime<Utc>>,
    latest: Option<Sample>,
}

impl ProgressTracker {
    /// 创建进度记录器。
    pub fn new(store: Arc<dyn KeyValueStore>, config: &CatalogConfig) -> Self {
        Self {
            store,
            min_elapsed_secs: config.progress_min_elapsed_secs,
            write_interval: config.progress_write_interval(),
            resume_finished_ratio: config.resume_finished_ratio,
            last_write: None,
            latest: None,
        }
    }

    /// 记录一次播放位置。
    ///
    /// 只有已播放超过最短时长且时长已知时才会写入，两次写入之间至少间隔写入间隔。
    ///
    /// # 返回
    /// 本次是否写入了存储。
    pub fn record(
        &mut self,
        series_id: &str,
        display_number: u32,
        elapsed: f64,
        duration: f64,
        now: DateTime<Utc>,
    ) -> bool {
        self.latest = Some(Sample {
            series_id: series_id.to_string(),
            display_number,
            elapsed,
            duration,
        });

        let due = self.last_write.is_none_or(|last| {
            (now - last)
                .to_std()
                .is_ok_and(|since| since >= self.write_interval)
        });
        if !due {
            return false;
        }

        let written = self.write_latest();
        if written {
            self.last_write = Some(now);
        }
        written
    }

    /// 忽略节流，立即写入最近一次记录的位置。在离开当前集之前调用。
    pub fn flush(&mut self) -> bool {
        let written = self.write_latest();
        if written {
            self.last_write = Some(Utc::now());
        }
        written
    }

    fn write_latest(&self) -> bool {
        let Some(sample) = &self.latest else {
            return false;
        };
        if sample.elapsed <= self.min_elapsed_secs || sample.duration <= 0.0 {
            return false;
        }

        let key = PlaybackProgress::storage_key(&sample.series_id, sample.display_number);
        let percent_key = PlaybackProgress::percent_key(&sample.series_id, sample.display_number);
        let percent = format!("{:.1}", sample.elapsed / sample.duration * 100.0);

        let result = self
            .store
            .set(&key, &sample.elapsed.to_string())
            .and_then(|()| self.store.set(&percent_key, &percent));
        match result {
            Ok(()) => {
                tracing::debug!(
                    "[Progress] 已保存 {} 第 {} 集: {:.1}s ({}%)",
                    sample.series_id,
                    sample.display_number,
                    sample.elapsed,
                    percent
                );
                true
            }
            Err(e) => {
                tracing::warn!("[Progress] 保存进度失败: {}", e);
                false
            }
        }
    }

    /// 读取已保存的进度。
    pub fn saved(&self, series_id: &str, display_number: u32) -> Option<PlaybackProgress> {
        let raw = self
            .store
            .get(&PlaybackProgress::storage_key(series_id, display_number))?;
        let elapsed_secs = raw.trim().parse::<f64>().ok().filter(|s| s.is_finite())?;
        Some(PlaybackProgress {
            series_id: series_id.to_string(),
            display_number,
            elapsed_secs,
        })
    }

    /// 读取已保存的播放百分比（一位小数的字符串）。
    pub fn saved_percent(&self, series_id: &str, display_number: u32) -> Option<String> {
        self.store
            .get(&PlaybackProgress::percent_key(series_id, display_number))
    }

    /// 计算续播位置。已播放比例达到完成阈值时视为看完，返回 `None`。
    pub fn resume_position(&self, series_id: &str, display_number: u32, duration: f64) -> Option<f64> {
        let saved = self.saved(series_id, display_number)?;
        (duration > 0.0 && saved.elapsed_secs < duration * self.resume_finished_ratio)
            .then_some(saved.elapsed_secs)
    }
}

/// 轮询 `probe` 直到返回 `true` 或超时。
///
/// # 返回
/// 超时前就绪时返回 `true`。
pub async fn wait_until_ready<F>(mut probe: F, interval: Duration, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let poll = async {
        loop {
            if probe() {
                return;
            }
            timer::sleep(interval).await;
        }
    };
    timer::with_timeout(timeout, poll).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeDelta;

    fn tracker() -> (ProgressTracker, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (
            ProgressTracker::new(store.clone(), &CatalogConfig::default()),
            store,
        )
    }

    #[test]
    fn test_record_requires_min_elapsed_and_duration() {
        let (mut tracker, store) = tracker();
        let now = Utc::now();

        assert!(!tracker.record("9", 1, 8.0, 100.0, now));
        assert!(!tracker.record("9", 1, 30.0, 0.0, now));
        assert!(store.get("progress_9_1").is_none());

        assert!(tracker.record("9", 1, 30.0, 120.0, now));
        assert_eq!(store.get("progress_9_1").as_deref(), Some("30"));
        assert_eq!(store.get("progress_9_1_percent").as_deref(), Some("25.0"));
    }

    #[test]
    fn test_record_is_throttled_but_flush_is_not() {
        let (mut tracker, store) = tracker();
        let start = Utc::now();

        assert!(tracker.record("9", 2, 20.0, 100.0, start));
        assert!(!tracker.record("9", 2, 22.0, 100.0, start + TimeDelta::seconds(2)));
        assert_eq!(store.get("progress_9_2").as_deref(), Some("20"));

        assert!(tracker.record("9", 2, 26.5, 100.0, start + TimeDelta::seconds(5)));
        assert_eq!(store.get("progress_9_2").as_deref(), Some("26.5"));

        tracker.record("9", 2, 27.0, 100.0, start + TimeDelta::seconds(6));
        assert!(tracker.flush());
        assert_eq!(store.get("progress_9_2").as_deref(), Some("27"));
    }

    #[test]
    fn test_resume_position_respects_finished_ratio() {
        let (tracker, store) = tracker();
        assert_eq!(tracker.resume_position("9", 1, 100.0), None);

        store.set("progress_9_1", "45.5").unwrap();
        assert_eq!(tracker.resume_position("9", 1, 100.0), Some(45.5));
        assert_eq!(tracker.resume_position("9", 1, 0.0), None);

        store.set("progress_9_1", "95").unwrap();
        assert_eq!(tracker.resume_position("9", 1, 100.0), None);

        store.set("progress_9_1", "garbage").unwrap();
        assert_eq!(tracker.resume_position("9", 1, 100.0), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready() {
        let mut polls = 0;
        let ready = wait_until_ready(
            || {
                polls += 1;
                polls >= 3
            },
            Duration::from_millis(100),
            Duration::from_secs(5),
        )
        .await;
        assert!(ready);
        assert_eq!(polls, 3);

        let ready = wait_until_ready(|| false, Duration::from_millis(100), Duration::from_secs(5)).await;
        assert!(!ready);
    }
}
