// Device service - Use case for restarting the backend device
use crate::application::log_sink::LogSink;
use crate::application::manager_api::ManagerApi;
use crate::error::DashboardResult;
use std::sync::Arc;

#[derive(Clone)]
pub struct DeviceService {
    api: Arc<dyn ManagerApi>,
    sink: LogSink,
}

impl DeviceService {
    pub fn new(api: Arc<dyn ManagerApi>, sink: LogSink) -> Self {
        Self { api, sink }
    }

    pub async fn restart(&self) -> DashboardResult<String> {
        self.sink.warn("Restarting device...");
        match self.api.restart_device().await {
            Ok(ack) => {
                self.sink.info(ack.clone());
                Ok(ack)
            }
            Err(e) => {
                self.sink.error(format!("Could not restart device: {}", e));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::log_sink::LogLevel;
    use crate::application::testing::{recording_sink, FakeManagerApi, Step};

    #[tokio::test]
    async fn test_restart_logs_acknowledgement() {
        let api = Arc::new(FakeManagerApi::default());
        api.restart.push(Step::ok("Rebooting in 5s".to_string()));
        let (sink, recorder) = recording_sink();
        let service = DeviceService::new(api, sink);

        assert_eq!(service.restart().await.unwrap(), "Rebooting in 5s");
        assert_eq!(recorder.events().last().unwrap().message, "Rebooting in 5s");
    }

    #[tokio::test]
    async fn test_failed_restart_is_reported() {
        let api = Arc::new(FakeManagerApi::default());
        api.restart.push(Step::status(502));
        let (sink, recorder) = recording_sink();
        let service = DeviceService::new(api, sink);

        assert!(service.restart().await.is_err());
        assert_eq!(recorder.count(LogLevel::Error), 1);
    }
}
