use super::config::{self, Configuration};
use opentelemetry::{global, sdk::{propagation::TraceContextPropagator, trace, trace::Sampler}};
use tracing_subscriber::{prelude::__tracing_subscriber_SubscriberExt, Registry, util::SubscriberInitExt};

pub const APP_NAME: &str = "Gatekeeper";

///
/// Initialise tracing and plug-in the Jaeger feature if enabled. Returns true if the jaeger
/// pipeline was installed and should be flushed with `shutdown_tracing`.
///
/// Safe to call more than once - only the first call installs a subscriber.
///
pub fn init_tracing(config: &Configuration) -> bool {
    // Default log level to INFO if it's not specified.
    config::default_env("RUST_LOG", "INFO");

    global::set_text_map_propagator(TraceContextPropagator::new());

    match config.distributed_tracing {
        true => { // Install the Jaeger pipeline.
            let tracer = match opentelemetry_jaeger::new_pipeline()
                .with_service_name(APP_NAME)
                .with_trace_config(trace::config().with_sampler(Sampler::AlwaysOn))
                .with_agent_endpoint(config.jaeger_endpoint.clone().unwrap_or_default())
                .install_batch(opentelemetry::runtime::Tokio) {
                    Ok(tracer) => tracer,
                    Err(err) => {
                        tracing::warn!("Unable to build Jaeger pipeline, continuing without it: {}", err);
                        return init_console()
                    }
                };

            if let Err(err) = Registry::default()
                .with(tracing_subscriber::EnvFilter::from_default_env()) // Set the tracing level to match RUST_LOG env variable.
                .with(tracing_subscriber::fmt::layer().with_test_writer().with_ansi(true))
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init() {
                    tracing::info!("Tracing already initialised: {}", err.to_string()); // Allowed error here - tests call this fn repeatedly.
            }

            true
        },
        false => init_console()
    }
}

///
/// Send any remaining spans to jaeger.
///
pub fn shutdown_tracing(distributed: bool) {
    if distributed {
        global::shutdown_tracer_provider();
    }
}

fn init_console() -> bool {
    if let Err(err) = Registry::default()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_test_writer().with_ansi(true))
        .try_init() {
            tracing::info!("Tracing already initialised: {}", err.to_string());
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_tracing_can_be_initialised_repeatedly() {
        let config = Configuration::default();
        assert_eq!(init_tracing(&config), false);
        assert_eq!(init_tracing(&config), false);
        shutdown_tracing(false);
    }
}
