//! Fixed-interval OCR status polling.

use std::time::Duration;

use archive_core::config::PollingConfig;
use archive_core::ContractId;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::ContractApi;
use crate::error::ClientError;
use crate::wire::OcrStatusReport;

/// Polls a contract's OCR status until it completes or fails.
///
/// Polls never overlap: each status check is awaited before the next tick.
/// A failed check is logged and counted as an attempt; polling continues.
/// Shortest interval between two status checks.
const MIN_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct OcrStatusPoller {
    interval: Duration,
    max_attempts: u32,
}

impl OcrStatusPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(
            Duration::from_secs(config.ocr_interval_secs),
            config.max_attempts,
        )
    }

    /// Poll until the OCR stage is terminal.
    ///
    /// `on_update` sees every successfully fetched report, including the
    /// final one.
    pub async fn wait_for<A, F>(
        &self,
        api: &A,
        contract_id: ContractId,
        mut on_update: F,
    ) -> Result<OcrStatusReport, ClientError>
    where
        A: ContractApi + ?Sized,
        F: FnMut(&OcrStatusReport),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for attempt in 1..=self.max_attempts {
            ticker.tick().await;
            match api.ocr_status(contract_id).await {
                Ok(report) => {
                    debug!(contract_id, attempt, status = %report.ocr_status, "OCR status polled");
                    on_update(&report);
                    if report.ocr_status.is_terminal() {
                        info!(contract_id, status = %report.ocr_status, attempts = attempt, "OCR finished");
                        return Ok(report);
                    }
                }
                Err(e) => {
                    warn!(contract_id, attempt, error = %e, "OCR status check failed");
                }
            }
        }

        Err(ClientError::PollingExhausted {
            contract_id,
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{
        ContractPage, ContractRecord, HealthReport, HtmlContent, OcrProcessReceipt, UploadReceipt,
    };
    use archive_core::ProcessingStatus;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    /// Replays a scripted sequence of status responses.
    struct ScriptedStatus {
        script: Mutex<Vec<Result<ProcessingStatus, ClientError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedStatus {
        fn new(mut script: Vec<Result<ProcessingStatus, ClientError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ContractApi for ScriptedStatus {
        async fn health(&self) -> Result<HealthReport, ClientError> {
            unimplemented!()
        }
        async fn list_contracts(&self, _: u32, _: u32) -> Result<ContractPage, ClientError> {
            unimplemented!()
        }
        async fn get_contract(&self, _: ContractId) -> Result<ContractRecord, ClientError> {
            unimplemented!()
        }
        async fn upload_contract(
            &self,
            _: &Path,
            _: Option<&str>,
        ) -> Result<UploadReceipt, ClientError> {
            unimplemented!()
        }
        async fn ocr_status(&self, id: ContractId) -> Result<OcrStatusReport, ClientError> {
            *self.calls.lock().unwrap() += 1;
            let next = self
                .script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Ok(ProcessingStatus::Processing));
            next.map(|ocr_status| OcrStatusReport {
                contract_id: id,
                ocr_status,
                ..Default::default()
            })
        }
        async fn process_ocr(&self, _: ContractId) -> Result<OcrProcessReceipt, ClientError> {
            unimplemented!()
        }
        async fn delete_contract(&self, _: ContractId) -> Result<(), ClientError> {
            unimplemented!()
        }
        async fn html_content(&self, _: ContractId) -> Result<HtmlContent, ClientError> {
            unimplemented!()
        }
        async fn download_contract(&self, _: ContractId) -> Result<Vec<u8>, ClientError> {
            unimplemented!()
        }
    }

    fn poller(max_attempts: u32) -> OcrStatusPoller {
        OcrStatusPoller::new(Duration::from_millis(2), max_attempts)
    }

    #[tokio::test]
    async fn test_stops_at_completed() {
        let api = ScriptedStatus::new(vec![
            Ok(ProcessingStatus::Pending),
            Ok(ProcessingStatus::Processing),
            Ok(ProcessingStatus::Completed),
        ]);
        let mut seen = Vec::new();
        let report = poller(10)
            .wait_for(&api, 5, |r| seen.push(r.ocr_status))
            .await
            .unwrap();
        assert_eq!(report.ocr_status, ProcessingStatus::Completed);
        assert_eq!(report.contract_id, 5);
        assert_eq!(api.calls(), 3);
        assert_eq!(
            seen,
            vec![
                ProcessingStatus::Pending,
                ProcessingStatus::Processing,
                ProcessingStatus::Completed
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_is_terminal() {
        let api = ScriptedStatus::new(vec![Ok(ProcessingStatus::Failed)]);
        let report = poller(10).wait_for(&api, 1, |_| {}).await.unwrap();
        assert_eq!(report.ocr_status, ProcessingStatus::Failed);
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_errors_do_not_stop_polling() {
        let api = ScriptedStatus::new(vec![
            Err(ClientError::Transport("reset".to_string())),
            Ok(ProcessingStatus::Completed),
        ]);
        let mut updates = 0;
        let report = poller(5).wait_for(&api, 2, |_| updates += 1).await.unwrap();
        assert_eq!(report.ocr_status, ProcessingStatus::Completed);
        assert_eq!(api.calls(), 2);
        assert_eq!(updates, 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let api = ScriptedStatus::new(vec![]);
        let err = poller(3).wait_for(&api, 8, |_| {}).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::PollingExhausted {
                contract_id: 8,
                attempts: 3
            }
        ));
        assert_eq!(api.calls(), 3);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let p = OcrStatusPoller::new(Duration::from_secs(1), 0);
        assert_eq!(p.max_attempts, 1);

        let p = OcrStatusPoller::from_config(&PollingConfig::default());
        assert_eq!(p.interval, Duration::from_secs(3));
        assert_eq!(p.max_attempts, 200);
    }

    #[tokio::test]
    async fn test_zero_interval_clamped() {
        let config = PollingConfig {
            ocr_interval_secs: 0,
            max_attempts: 3,
        };
        let p = OcrStatusPoller::from_config(&config);
        assert_eq!(p.interval, MIN_INTERVAL);

        let api = ScriptedStatus::new(vec![Ok(ProcessingStatus::Completed)]);
        let report = p.wait_for(&api, 1, |_| {}).await.unwrap();
        assert_eq!(report.ocr_status, ProcessingStatus::Completed);
        assert_eq!(api.calls(), 1);
    }
}
