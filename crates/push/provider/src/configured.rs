//! Providers built from configuration.

use std::collections::BTreeMap;

use color_eyre::eyre::WrapErr as _;
use push_core::{DeliveryTask, Platform, ProviderConfig, ProviderError};

use crate::{ApnsProvider, NoopProvider, PlatformRouter, Provider};

/// A provider variant selected by configuration.
pub enum ConfiguredProvider {
    Apns(ApnsProvider),
    Noop(NoopProvider),
}

impl ConfiguredProvider {
    /// Build the provider described by `config`.
    pub fn from_config(config: &ProviderConfig) -> color_eyre::eyre::Result<Self> {
        match config {
            ProviderConfig::Apns {
                certificate_path,
                certificate_password,
                sandbox,
                topic,
            } => {
                let mut provider =
                    ApnsProvider::from_file(certificate_path, certificate_password, *sandbox)?;
                if let Some(topic) = topic {
                    provider = provider.with_topic(topic);
                }
                Ok(Self::Apns(provider))
            }
            ProviderConfig::Noop => Ok(Self::Noop(NoopProvider)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Apns(_) => "apns",
            Self::Noop(_) => "noop",
        }
    }
}

impl Provider for ConfiguredProvider {
    async fn send(&self, task: &DeliveryTask) -> Result<(), ProviderError> {
        match self {
            Self::Apns(p) => p.send(task).await,
            Self::Noop(p) => p.send(task).await,
        }
    }

    fn is_transient(&self, task: &DeliveryTask, error: &ProviderError) -> bool {
        match self {
            Self::Apns(p) => p.is_transient(task, error),
            Self::Noop(p) => p.is_transient(task, error),
        }
    }
}

/// Build a router with one configured provider per platform.
pub fn build_router(
    providers: &BTreeMap<Platform, ProviderConfig>,
) -> color_eyre::eyre::Result<PlatformRouter<ConfiguredProvider>> {
    let mut router = PlatformRouter::new();

    for (platform, config) in providers {
        let provider = ConfiguredProvider::from_config(config)
            .wrap_err_with(|| format!("failed to configure provider for {platform}"))?;

        tracing::info!(platform = %platform, kind = provider.kind(), "provider configured");
        router.insert(*platform, provider);
    }

    Ok(router)
}
