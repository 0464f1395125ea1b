//! Decorations: hidden animated objects revealed by their own trigger

use crate::platform::{AnimationPlayState, Display, Platform, StyledElement};
use crate::{DecorationConfig, Result};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Outcome of revealing a decoration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationOutcome {
    Shown,
    /// No object is mapped under that name
    NotFound,
}

/// Name -> element mapping for the page's decorative objects.
///
/// Only objects whose element resolved at startup are mapped.
pub struct Decorations<E> {
    objects: BTreeMap<String, E>,
}

impl<E: StyledElement> Decorations<E> {
    pub fn new() -> Self {
        Self { objects: BTreeMap::new() }
    }

    pub fn resolve<P>(platform: &P, configs: &[DecorationConfig]) -> Self
    where
        P: Platform<Element = E>,
    {
        let mut decorations = Self::new();
        for cfg in configs {
            match platform.element(&cfg.element_id) {
                Some(el) => decorations.insert(&cfg.name, el),
                None => debug!("Decoration '{}' has no element '{}'", cfg.name, cfg.element_id),
            }
        }
        decorations
    }

    pub fn insert(&mut self, name: &str, element: E) {
        self.objects.insert(name.to_string(), element);
    }

    pub fn get(&self, name: &str) -> Option<&E> {
        self.objects.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<E: StyledElement> Default for Decorations<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Show the named object and resume its animation. Repeating it re-asserts
/// the same state.
pub fn enable_object<E: StyledElement>(decorations: &Decorations<E>, name: &str) -> Result<DecorationOutcome> {
    match decorations.get(name) {
        Some(obj) => {
            obj.set_display(Display::Block)?;
            obj.set_animation_play_state(AnimationPlayState::Running)?;
            Ok(DecorationOutcome::Shown)
        }
        None => {
            warn!("Object with name '{}' not found.", name);
            Ok(DecorationOutcome::NotFound)
        }
    }
}
