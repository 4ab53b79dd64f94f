//! Root owner of a graph instance and capability lookup on it.

use crate::core::AsAny;

/// The object a graph instance runs on behalf of (a level, an actor, a
/// component, a quest giver...).
pub trait FlowOwner: AsAny + Send + Sync {
    /// The composite this owner is part of, if any: a behavior component
    /// returns the object it is attached to.
    fn container(&self) -> Option<&dyn FlowOwner> {
        None
    }
}

/// Finds the expected owner type `T`: the root owner itself when it is a `T`,
/// otherwise its container when that is a `T`. `None` means the capability is
/// simply unavailable.
pub fn resolve_owner<T: FlowOwner + 'static>(root: &dyn FlowOwner) -> Option<&T> {
    if let Some(owner) = root.as_any().downcast_ref::<T>() {
        return Some(owner);
    }

    root.container()?.as_any().downcast_ref::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Actor {
        name: String,
    }

    impl FlowOwner for Actor {}

    struct QuestComponent {
        actor: Option<Arc<Actor>>,
    }

    impl FlowOwner for QuestComponent {
        fn container(&self) -> Option<&dyn FlowOwner> {
            self.actor.as_deref().map(|actor| actor as &dyn FlowOwner)
        }
    }

    struct Level;

    impl FlowOwner for Level {}

    #[test]
    fn test_root_owner_matches_directly() {
        let actor = Actor { name: "Npc".into() };
        let resolved = resolve_owner::<Actor>(&actor);
        assert_eq!(resolved.map(|a| a.name.as_str()), Some("Npc"));
    }

    #[test]
    fn test_component_falls_back_to_container() {
        let component = QuestComponent {
            actor: Some(Arc::new(Actor { name: "Guard".into() })),
        };
        let resolved = resolve_owner::<Actor>(&component);
        assert_eq!(resolved.map(|a| a.name.as_str()), Some("Guard"));
        assert!(resolve_owner::<QuestComponent>(&component).is_some());
    }

    #[test]
    fn test_unresolved_capability_is_none() {
        let detached = QuestComponent { actor: None };
        assert!(resolve_owner::<Actor>(&detached).is_none());
        assert!(resolve_owner::<Actor>(&Level).is_none());
    }
}
