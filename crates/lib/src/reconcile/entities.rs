//! Override entries built from scratch by full inference.

use indexmap::IndexMap;

use crate::error::ValidationError;
use crate::overrides::{EnvBinding, OverrideDocument, ServiceOverride, VolumeOverride};
use crate::params::{infer_service, infer_volume};
use crate::source::{Service, SourceModel, Volume};

/// Override entry for a service seen for the first time.
pub fn base_service_override(service: &Service) -> Result<ServiceOverride, ValidationError> {
  Ok(ServiceOverride {
    labels: infer_service(service)?,
    environment: declared_bindings(service),
    extra: IndexMap::new(),
  })
}

/// Override entry for a volume seen for the first time.
pub fn base_volume_override(volume: &Volume) -> Result<VolumeOverride, ValidationError> {
  Ok(VolumeOverride {
    labels: infer_volume(volume)?,
    extra: IndexMap::new(),
  })
}

/// A complete override document for a new environment.
pub fn base_document(source: &SourceModel) -> Result<OverrideDocument, ValidationError> {
  let mut doc = OverrideDocument {
    version: source.version.clone(),
    ..Default::default()
  };
  for (name, service) in &source.services {
    doc.services.insert(name.clone(), base_service_override(service)?);
  }
  for (name, volume) in &source.volumes {
    doc.volumes.insert(name.clone(), base_volume_override(volume)?);
  }
  Ok(doc)
}

pub(super) fn declared_bindings(service: &Service) -> IndexMap<String, EnvBinding> {
  service
    .environment
    .iter()
    .map(|(name, value)| (name.clone(), EnvBinding::from_source(value.as_deref())))
    .collect()
}
