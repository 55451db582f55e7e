use std::collections::HashMap;
use std::time::Duration;

use opamp_client::error::ConnectionError;
use opamp_client::http::{HttpClientReqwest, HttpConfig, NotStartedHttpClient};
use opamp_client::opamp::proto::{
    AgentCapabilities, ComponentHealth, EffectiveConfig, OpAmpConnectionSettings,
    ServerErrorResponse, ServerToAgentCommand,
};
use opamp_client::operation::callbacks::{Callbacks, MessageData};
use opamp_client::operation::settings::{AgentDescription, StartSettings};
use opamp_client::{capabilities, Client, NotStartedClient, StartedClient};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
enum CallbacksError {}

struct AgentCallbacks;

impl Callbacks for AgentCallbacks {
    type Error = CallbacksError;

    fn on_connect(&self) {
        info!("connected to the opamp server");
    }

    fn on_connect_failed(&self, err: ConnectionError) {
        info!("failed to connect: {err}");
    }

    fn on_error(&self, err: ServerErrorResponse) {
        info!("server reported an error: {err:?}");
    }

    fn on_message(&self, msg: MessageData) {
        info!("received a message: {msg:?}");
    }

    fn on_opamp_connection_settings(
        &self,
        _settings: &OpAmpConnectionSettings,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn on_opamp_connection_settings_accepted(&self, _settings: &OpAmpConnectionSettings) {}

    fn on_command(&self, _command: &ServerToAgentCommand) -> Result<(), Self::Error> {
        Ok(())
    }

    fn get_effective_config(&self) -> Result<EffectiveConfig, Self::Error> {
        Ok(EffectiveConfig::default())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let http_config = HttpConfig::new("https://127.0.0.1/v1/opamp")
        .unwrap()
        .with_headers(HashMap::from([(
            "super-key".to_string(),
            "super-password".to_string(),
        )]))
        .unwrap()
        .with_timeout(Duration::from_secs(5));

    let http_client = HttpClientReqwest::new(http_config).unwrap();
    let not_started = NotStartedHttpClient::new(http_client);

    let start_settings = StartSettings {
        instance_id: "3Q38XWW0Q98GMAD3NHWZM2PZWZ".into(),
        capabilities: capabilities!(AgentCapabilities::ReportsStatus),
        agent_description: AgentDescription {
            identifying_attributes: HashMap::from([
                ("service.name".to_string(), "com.example.agent".into()),
                ("service.namespace".to_string(), "example".into()),
                ("service.version".to_string(), "0.1.0".into()),
            ]),
            non_identifying_attributes: HashMap::new(),
        },
        ..Default::default()
    };

    let client = not_started.start(AgentCallbacks, start_settings).await.unwrap();

    client
        .set_health(ComponentHealth {
            healthy: true,
            start_time_unix_nano: 1689942447,
            ..Default::default()
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;

    client.stop().await.unwrap();
}
