//! Recording-related API endpoints

use crate::StoreClient;
use crate::error::Result;
use crate::handle_response;
use cantor_core::domain::recording::Recording;
use cantor_core::dto::recording::CreateRecording;

impl StoreClient {
    /// Append a recording to the job store
    ///
    /// # Arguments
    /// * `req` - The recording fields
    ///
    /// # Returns
    /// The stored recording with its assigned ID
    pub async fn create_recording(&self, req: &CreateRecording) -> Result<Recording> {
        let url = format!("{}/api/recordings", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantor_core::domain::recording::AudioFormat;
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_recording() {
        let server = MockServer::start().await;
        let performance_id = Uuid::new_v4();
        let req = CreateRecording::deterministic(
            performance_id,
            AudioFormat::Mp3,
            "http://cdn/audio/nocturne-take.mp3",
        );

        Mock::given(method("POST"))
            .and(path("/api/recordings"))
            .and(body_json(json!({
                "uri": "http://cdn/audio/nocturne-take.mp3",
                "performance_id": performance_id,
                "label": "deterministic-compressed",
                "format": "mp3"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": Uuid::new_v4(),
                "uri": "http://cdn/audio/nocturne-take.mp3",
                "performance_id": performance_id,
                "label": "deterministic-compressed",
                "format": "mp3",
                "created_at": "2026-01-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = StoreClient::new(server.uri());
        let recording = client.create_recording(&req).await.unwrap();
        assert_eq!(recording.format, AudioFormat::Mp3);
        assert_eq!(recording.label, "deterministic-compressed");
    }
}
