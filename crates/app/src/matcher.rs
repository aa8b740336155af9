//! Trigger matcher — finds the automations a change event should fire.

use rulehub_domain::automation::{AutomationDefinition, Trigger};
use rulehub_domain::event::ChangeEvent;

use crate::store::AutomationSet;

/// One matched automation, with the trigger that matched.
#[derive(Debug, Clone, Copy)]
pub struct TriggerMatch<'a> {
    pub name: &'a str,
    pub definition: &'a AutomationDefinition,
    pub trigger: &'a Trigger,
}

/// Find every enabled automation with at least one trigger matching `event`.
///
/// Result order follows the set's iteration order, so side effects across
/// automations that touch the same record stay deterministic.
#[must_use]
pub fn find_matches<'a>(event: &ChangeEvent, set: &'a AutomationSet) -> Vec<TriggerMatch<'a>> {
    let mut matches = Vec::new();
    for definition in set {
        if !definition.enabled {
            continue;
        }
        if let Some(trigger) = definition
            .triggers
            .iter()
            .find(|trigger| trigger.matches_event(event))
        {
            matches.push(TriggerMatch {
                name: &definition.name,
                definition,
                trigger,
            });
        }
    }
    matches
}
