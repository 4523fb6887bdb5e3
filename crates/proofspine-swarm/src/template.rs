use std::collections::BTreeMap;

use proofspine_types::{Worker, WorkerTemplate};
use tracing::info;

use crate::error::SwarmError;

/// Registry of worker templates, keyed by template id.
///
/// Spawning is pure: the same template and count always produce the
/// same worker identities, so a restarted process recreates the exact
/// roster a batch was dispatched to.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, WorkerTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, replacing any previous one under the same id.
    pub fn register(&mut self, template: WorkerTemplate) {
        info!(template = %template.id, role = %template.role, "worker template registered");
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, id: &str) -> Option<&WorkerTemplate> {
        self.templates.get(id)
    }

    /// Spawn `count` clones of a template, with 1-based ordinals.
    pub fn spawn(&self, template_id: &str, count: u32) -> Result<Vec<Worker>, SwarmError> {
        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| SwarmError::UnknownTemplate {
                id: template_id.to_string(),
            })?;
        Ok((1..=count)
            .map(|ordinal| Worker::clone_from(template, ordinal))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofspine_types::{WorkerCapability, WorkerId};

    fn registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        registry.register(WorkerTemplate::new(
            "auditor",
            "Security Auditor",
            vec![WorkerCapability::AuditReview],
        ));
        registry
    }

    #[test]
    fn spawn_yields_ordinal_identities() {
        let workers = registry().spawn("auditor", 3).unwrap();
        let ids: Vec<_> = workers.iter().map(|worker| worker.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                WorkerId("auditor-01".into()),
                WorkerId("auditor-02".into()),
                WorkerId("auditor-03".into()),
            ]
        );
    }

    #[test]
    fn spawn_is_repeatable() {
        let registry = registry();
        assert_eq!(
            registry.spawn("auditor", 5).unwrap(),
            registry.spawn("auditor", 5).unwrap()
        );
    }

    #[test]
    fn unknown_template_is_an_error() {
        let err = registry().spawn("negotiator", 1).unwrap_err();
        assert!(matches!(err, SwarmError::UnknownTemplate { .. }));
    }

    #[test]
    fn zero_count_spawns_nothing() {
        assert!(registry().spawn("auditor", 0).unwrap().is_empty());
    }
}
