use std::time::Duration;
use async_trait::async_trait;
use tracing::{Instrument, instrument};
use rdkafka::{ClientConfig, message::OwnedHeaders, producer::{FutureProducer, FutureRecord}};
use crate::{model::events::CredentialEvent, notify::Notifier, utils::{config::Configuration, errors::{ErrorCode, GatekeeperError}, logging::APP_NAME}};

const VERSION: u8 = 1;

///
/// Publishes each credential event as JSON to its own topic, keyed by account so events for
/// one account stay in order.
///
pub struct KafkaNotifier {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaNotifier {
    pub fn new(config: &Configuration) -> Result<Self, GatekeeperError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_servers)
            .set("message.timeout.ms", format!("{}", config.kafka_timeout))
            .create()
            .map_err(|err| ErrorCode::KafkaSendError
                .with_msg(&format!("Producer creation error: {}", err)))?;

        Ok(KafkaNotifier {
            producer,
            timeout: Duration::from_millis(config.kafka_timeout as u64),
        })
    }
}

#[async_trait]
impl Notifier for KafkaNotifier {
    #[instrument(name="kafka:send", skip(self, event), fields(topic = event.topic()))]
    async fn send(&self, event: CredentialEvent) -> Result<(), GatekeeperError> {
        let payload = event.payload()?.to_string();

        self.producer
            .send(
                FutureRecord::to(event.topic())
                    .payload(&payload)
                    .key(event.account_id()) // Partition key - keeps an account's events in sequence.
                    .headers(OwnedHeaders::new()
                        .add("version", &format!("{}", VERSION))
                        .add("sender", APP_NAME)),
                self.timeout,
            )
            .instrument(tracing::debug_span!("kafka:deliver"))
            .await?;

        Ok(())
    }
}
