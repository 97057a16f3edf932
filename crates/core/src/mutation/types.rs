use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::approval::GatedAction;

/// An entity stored in a remote collection.
///
/// Each entity kind binds its own record type; the data layer only needs the
/// identifier and a serde representation.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns the unique identifier of this record.
    fn id(&self) -> &str;

    /// Replaces the identifier (temporary ids are swapped for server ids).
    fn set_id(&mut self, id: String);
}

/// The user issuing a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: String,
    /// Plant the actor belongs to, when scoped to one.
    pub plant: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            plant: None,
        }
    }

    /// Sets the plant this actor is scoped to.
    pub fn with_plant(mut self, plant: impl Into<String>) -> Self {
        self.plant = Some(plant.into());
        self
    }
}

/// Kind of write applied to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationAction {
    Create,
    Update,
    Delete,
}

impl MutationAction {
    /// Returns the gated action for this write, `None` for creates.
    pub fn gated(self) -> Option<GatedAction> {
        match self {
            Self::Create => None,
            Self::Update => Some(GatedAction::Edit),
            Self::Delete => Some(GatedAction::Delete),
        }
    }

    /// Past-tense verb used in activity previews.
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Create => "Created",
            Self::Update => "Updated",
            Self::Delete => "Deleted",
        }
    }
}

impl std::fmt::Display for MutationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// The payload of a write, with the prior snapshot where one exists.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T> {
    Create(T),
    Update { before: T, after: T },
    Delete { before: T },
}

impl<T: Record> Mutation<T> {
    pub fn action(&self) -> MutationAction {
        match self {
            Self::Create(_) => MutationAction::Create,
            Self::Update { .. } => MutationAction::Update,
            Self::Delete { .. } => MutationAction::Delete,
        }
    }

    /// Returns the id of the record being changed, `None` for creates.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Self::Create(_) => None,
            Self::Update { after, .. } => Some(after.id()),
            Self::Delete { before } => Some(before.id()),
        }
    }
}

/// A user-initiated write, consumed once by the mutation gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest<T> {
    pub entity_kind: String,
    pub mutation: Mutation<T>,
    pub actor: Actor,
    /// Justification copied into approval records.
    pub reason: Option<String>,
}

impl<T: Record> MutationRequest<T> {
    fn build(entity_kind: impl Into<String>, actor: Actor, mutation: Mutation<T>) -> Self {
        Self {
            entity_kind: entity_kind.into(),
            mutation,
            actor,
            reason: None,
        }
    }

    pub fn create(entity_kind: impl Into<String>, actor: Actor, record: T) -> Self {
        Self::build(entity_kind, actor, Mutation::Create(record))
    }

    pub fn update(entity_kind: impl Into<String>, actor: Actor, before: T, after: T) -> Self {
        Self::build(entity_kind, actor, Mutation::Update { before, after })
    }

    pub fn delete(entity_kind: impl Into<String>, actor: Actor, before: T) -> Self {
        Self::build(entity_kind, actor, Mutation::Delete { before })
    }

    /// Attaches a reason shown to reviewers when the write needs approval.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn action(&self) -> MutationAction {
        self.mutation.action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Pump {
        id: String,
        status: String,
    }

    impl Record for Pump {
        fn id(&self) -> &str {
            &self.id
        }

        fn set_id(&mut self, id: String) {
            self.id = id;
        }
    }

    fn pump(id: &str, status: &str) -> Pump {
        Pump {
            id: id.to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn test_gated_actions() {
        assert_eq!(MutationAction::Create.gated(), None);
        assert_eq!(MutationAction::Update.gated(), Some(GatedAction::Edit));
        assert_eq!(MutationAction::Delete.gated(), Some(GatedAction::Delete));
    }

    #[test]
    fn test_target_id() {
        let actor = Actor::new("u-1", "operator");
        let create = MutationRequest::create("pump", actor.clone(), pump("tmp", "ok"));
        let update =
            MutationRequest::update("pump", actor.clone(), pump("7", "ok"), pump("7", "fault"));
        let delete = MutationRequest::delete("pump", actor, pump("9", "ok"));

        assert_eq!(create.mutation.target_id(), None);
        assert_eq!(update.mutation.target_id(), Some("7"));
        assert_eq!(delete.mutation.target_id(), Some("9"));
        assert_eq!(delete.action(), MutationAction::Delete);
    }

    #[test]
    fn test_with_reason() {
        let request = MutationRequest::delete("pump", Actor::new("u-1", "operator"), pump("9", "ok"))
            .with_reason("duplicate entry");
        assert_eq!(request.reason.as_deref(), Some("duplicate entry"));
    }

    #[test]
    fn test_actor_with_plant() {
        let actor = Actor::new("u-2", "supervisor").with_plant("north");
        assert_eq!(actor.plant.as_deref(), Some("north"));
    }

    #[test]
    fn test_action_display_and_serde() {
        assert_eq!(MutationAction::Update.to_string(), "update");
        assert_eq!(
            serde_json::to_string(&MutationAction::Delete).unwrap(),
            "\"delete\""
        );
    }
}
