// Manager HTTP client - reqwest implementation of the backend API
use crate::application::manager_api::ManagerApi;
use crate::domain::power::MeterReading;
use crate::domain::time_series::{Channel, TimeSeriesPoint};
use crate::domain::vehicle::VehicleState;
use crate::domain::wallbox::{ChargeMode, ChargingSession};
use crate::error::{DashboardError, DashboardResult};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpManagerClient {
    client: reqwest::Client,
    base_url: String,
    restart_url: String,
}

#[derive(Debug, Deserialize)]
struct SoeResponse {
    percentage: f64,
}

#[derive(Debug, Deserialize)]
struct MetersResponse {
    solar: f64,
    house: f64,
    battery: f64,
    grid: f64,
    wallbox: f64,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    history: Vec<HistoryPoint>,
}

/// Channels arrive as sibling fields of the timestamp; anything else is ignored.
#[derive(Debug, Deserialize)]
struct HistoryPoint {
    timestamp: f64,
    #[serde(flatten)]
    fields: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ModeResponse {
    mode: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    reason: i64,
    #[serde(rename = "vehicle name", default)]
    vehicle_name: String,
    #[serde(rename = "E pres", default)]
    energy_present: f64,
}

#[derive(Debug, Deserialize)]
struct KebaPowerResponse {
    power: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BmwStateResponse {
    charging_status: String,
    charging_level_hv: f64,
    remaining_range_electric: f64,
}

#[derive(Debug, Deserialize)]
struct LastUpdateResponse {
    last_update: f64,
}

impl HistoryPoint {
    fn into_point(self) -> TimeSeriesPoint {
        Channel::ALL
            .iter()
            .fold(TimeSeriesPoint::new(self.timestamp), |point, &channel| {
                match self.fields.get(channel.key()).and_then(|v| v.as_f64()) {
                    Some(watts) => point.with(channel, watts),
                    None => point,
                }
            })
    }
}

impl HttpManagerClient {
    pub fn new(base_url: &str, restart_url: String, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            restart_url,
        })
    }

    fn build_url(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        for (i, (key, value)) in query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> DashboardResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|source| DashboardError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} answered {}", endpoint, status);
            return Err(DashboardError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn read_text(&self, endpoint: &str, response: reqwest::Response) -> DashboardResult<String> {
        response
            .text()
            .await
            .map_err(|source| DashboardError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> DashboardResult<T> {
        let url = self.build_url(path, query);
        tracing::debug!("GET {}", url);

        let request = self.client.get(&url).header(ACCEPT, "application/json");
        let response = self.send(path, request).await?;
        let body = self.read_text(path, response).await?;

        serde_json::from_str(&body).map_err(|e| DashboardError::MalformedBody {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }

    async fn put(&self, path: &str, query: &[(&str, String)]) -> DashboardResult<()> {
        let url = self.build_url(path, query);
        tracing::debug!("PUT {}", url);

        self.send(path, self.client.put(&url)).await?;
        Ok(())
    }
}

#[async_trait]
impl ManagerApi for HttpManagerClient {
    async fn powerwall_soe(&self) -> DashboardResult<f64> {
        let soe: SoeResponse = self.get_json("/manager/powerwall/soe", &[]).await?;
        Ok(soe.percentage)
    }

    async fn meters(&self) -> DashboardResult<MeterReading> {
        let meters: MetersResponse = self.get_json("/manager/meters", &[]).await?;
        Ok(MeterReading {
            solar: meters.solar,
            house: meters.house,
            battery: meters.battery,
            grid: meters.grid,
            wallbox: meters.wallbox,
        })
    }

    async fn meter_history(&self, cursor: Option<f64>) -> DashboardResult<Vec<TimeSeriesPoint>> {
        let query: Vec<(&str, String)> = cursor
            .map(|timestamp| ("timestamp", timestamp.to_string()))
            .into_iter()
            .collect();

        let response: HistoryResponse = self.get_json("/manager/meters/history", &query).await?;
        tracing::debug!("Got {} history points (cursor {:?})", response.history.len(), cursor);
        Ok(response.history.into_iter().map(HistoryPoint::into_point).collect())
    }

    async fn mode(&self) -> DashboardResult<ChargeMode> {
        let mode: ModeResponse = self.get_json("/manager/mode", &[]).await?;
        Ok(ChargeMode::from_wire(&mode.mode))
    }

    async fn set_mode(&self, mode: ChargeMode) -> DashboardResult<()> {
        self.put("/manager/mode", &[("mode", mode.as_query().to_string())])
            .await
    }

    async fn set_power_limit(&self, watts: f64) -> DashboardResult<()> {
        self.put("/manager/limit", &[("limit", watts.to_string())]).await
    }

    async fn session(&self) -> DashboardResult<ChargingSession> {
        let session: SessionResponse = self.get_json("/manager/session", &[]).await?;
        Ok(ChargingSession {
            reason: session.reason,
            vehicle_name: session.vehicle_name,
            energy_present: session.energy_present,
        })
    }

    async fn wallbox_power(&self) -> DashboardResult<f64> {
        let power: KebaPowerResponse = self.get_json("/keba/power", &[]).await?;
        Ok(power.power)
    }

    async fn bmw_state(&self, alias: &str, allow_cache: bool) -> DashboardResult<VehicleState> {
        let query = [
            ("vehicle", alias.to_string()),
            ("allow_cache", allow_cache.to_string()),
        ];
        let state: BmwStateResponse = self.get_json("/bmw/state", &query).await?;
        Ok(VehicleState {
            charging_status: state.charging_status,
            state_of_charge: state.charging_level_hv,
            remaining_range_km: state.remaining_range_electric,
        })
    }

    async fn bmw_last_update(&self, alias: &str) -> DashboardResult<f64> {
        let update: LastUpdateResponse = self
            .get_json("/bmw/last_update", &[("vehicle", alias.to_string())])
            .await?;
        Ok(update.last_update)
    }

    async fn restart_device(&self) -> DashboardResult<String> {
        const ENDPOINT: &str = "/dev/restart";
        tracing::debug!("PUT {}", self.restart_url);

        let response = self.send(ENDPOINT, self.client.put(&self.restart_url)).await?;
        self.read_text(ENDPOINT, response).await
    }
}
