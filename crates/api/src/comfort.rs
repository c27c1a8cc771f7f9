use async_trait::async_trait;
use sched_core::ports::{ComfortSource, RepositoryError};
use sched_core::scoring::comfort_snapshot;
use serde::Deserialize;
use std::time::Duration;
use types::{RoomComfortSnapshot, RoomId};

/// Latest sensor readings of one room, as served by the sensor gateway.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomReading {
    pub room_id: RoomId,
    pub temperature: f64,
    pub humidity: f64,
    pub air_pressure: f64,
}

impl From<RoomReading> for RoomComfortSnapshot {
    fn from(r: RoomReading) -> Self {
        comfort_snapshot(r.room_id, r.temperature, r.humidity, r.air_pressure)
    }
}

/// Reads `GET {base_url}/rooms/readings?ids=a,b,c`.
pub struct HttpComfortSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpComfortSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ComfortSource for HttpComfortSource {
    async fn get_snapshots(&self, room_ids: &[RoomId]) -> Result<Vec<RoomComfortSnapshot>, RepositoryError> {
        if room_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = room_ids.iter().map(|r| r.0.as_str()).collect::<Vec<_>>().join(",");
        let readings: Vec<RoomReading> = self
            .client
            .get(format!("{}/rooms/readings", self.base_url))
            .query(&[("ids", ids)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| RepositoryError::Other(format!("bad readings payload: {e}")))?;
        Ok(readings.into_iter().map(RoomComfortSnapshot::from).collect())
    }
}
