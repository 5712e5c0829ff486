//! Ordered, id-keyed collection of report definitions.

#![allow(missing_docs)]

use std::collections::HashMap;

use crate::core::errors::{Result, SreError};
use crate::report::definition::ReportDefinition;

/// Report definitions in registration order. Ids are unique.
#[derive(Debug, Default)]
pub struct ReportRegistry {
    reports: Vec<ReportDefinition>,
    by_id: HashMap<String, usize>,
}

impl ReportRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a definition. The registry is unchanged on error.
    pub fn register(&mut self, definition: ReportDefinition) -> Result<()> {
        if self.by_id.contains_key(&definition.id) {
            return Err(SreError::DuplicateReport { id: definition.id });
        }
        definition.validate()?;
        self.by_id.insert(definition.id.clone(), self.reports.len());
        self.reports.push(definition);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&ReportDefinition> {
        self.by_id
            .get(id)
            .map(|&i| &self.reports[i])
            .ok_or_else(|| SreError::UnknownReport { id: id.to_string() })
    }

    /// Ids in registration order. Each call starts a fresh pass.
    pub fn list_ids(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.reports.iter().map(|r| r.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportDefinition> + '_ {
        self.reports.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// 1-based position, as shown in menus.
    pub fn get_by_position(&self, position: usize) -> Result<&ReportDefinition> {
        position
            .checked_sub(1)
            .and_then(|i| self.reports.get(i))
            .ok_or_else(|| SreError::UnknownReport {
                id: format!("#{position}"),
            })
    }

    /// Accept either an id or a menu number.
    pub fn resolve_selector(&self, selector: &str) -> Result<&ReportDefinition> {
        let selector = selector.trim();
        match selector.parse::<usize>() {
            Ok(position) => self.get_by_position(position),
            Err(_) => self.get(selector),
        }
    }
}
