use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EntityKind;

/// An endpoint of a cross-link: a kind plus an opaque id.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    #[must_use]
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Order two endpoints into the stored (source, target) orientation.
    ///
    /// The lower `(kind, id)` pair becomes the source, so `link(a, b)` and
    /// `link(b, a)` land on the same row.
    #[must_use]
    pub fn canonical_pair(a: Self, b: Self) -> (Self, Self) {
        if a <= b { (a, b) } else { (b, a) }
    }
}

/// A typed association between two tracked entities.
///
/// Logically undirected; stored in canonical orientation (see
/// [`EntityRef::canonical_pair`]).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CrossLink {
    pub id: String,
    pub source_type: EntityKind,
    pub source_id: String,
    pub target_type: EntityKind,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl CrossLink {
    #[must_use]
    pub fn source(&self) -> EntityRef {
        EntityRef::new(self.source_type, self.source_id.clone())
    }

    #[must_use]
    pub fn target(&self) -> EntityRef {
        EntityRef::new(self.target_type, self.target_id.clone())
    }

    /// The endpoint that is not `entity_id` (optionally also matching `kind`).
    ///
    /// Returns `None` when the link does not touch the entity at all.
    #[must_use]
    pub fn opposite(&self, kind: Option<EntityKind>, entity_id: &str) -> Option<EntityRef> {
        let hits = |k: EntityKind, id: &str| id == entity_id && kind.is_none_or(|want| want == k);
        if hits(self.source_type, &self.source_id) {
            Some(self.target())
        } else if hits(self.target_type, &self.target_id) {
            Some(self.source())
        } else {
            None
        }
    }
}

/// The far end of a link, as seen from one entity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkedEntity {
    pub link_id: String,
    pub kind: EntityKind,
    pub id: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// All entities linked to one entity, for a single opposite-side kind.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkGroup {
    pub kind: EntityKind,
    pub entities: Vec<LinkedEntity>,
}

/// Links of one entity grouped by the kind on the other side.
///
/// Groups appear in `EntityKind` order and are omitted when empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkedItems {
    pub groups: Vec<LinkGroup>,
}

impl LinkedItems {
    /// Group `links` by the side opposite `entity_id`. Links that do not touch
    /// the entity are skipped.
    #[must_use]
    pub fn collect(kind: Option<EntityKind>, entity_id: &str, links: &[CrossLink]) -> Self {
        let mut groups: Vec<LinkGroup> = Vec::new();
        for link in links {
            let Some(other) = link.opposite(kind, entity_id) else {
                continue;
            };
            let entity = LinkedEntity {
                link_id: link.id.clone(),
                kind: other.kind,
                id: other.id,
                notes: link.notes.clone(),
                created_at: link.created_at,
            };
            match groups.iter_mut().find(|g| g.kind == other.kind) {
                Some(group) => group.entities.push(entity),
                None => groups.push(LinkGroup {
                    kind: other.kind,
                    entities: vec![entity],
                }),
            }
        }
        groups.sort_by_key(|g| g.kind);
        Self { groups }
    }

    /// Linked entities of one kind (empty slice if none).
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> &[LinkedEntity] {
        self.groups
            .iter()
            .find(|g| g.kind == kind)
            .map_or(&[], |g| g.entities.as_slice())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.entities.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Per-kind connection counts for an entity badge.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ConnectionCounts {
    pub updates: u64,
    pub watch_lists: u64,
    pub dossiers: u64,
    pub policies: u64,
    pub kanban_items: u64,
    pub total: u64,
}

impl ConnectionCounts {
    /// Count-by-kind reduction over grouped links.
    #[must_use]
    pub fn from_linked(linked: &LinkedItems) -> Self {
        let mut counts = Self::default();
        for group in &linked.groups {
            let n = group.entities.len() as u64;
            match group.kind {
                EntityKind::Update => counts.updates += n,
                EntityKind::WatchList => counts.watch_lists += n,
                EntityKind::Dossier => counts.dossiers += n,
                EntityKind::Policy => counts.policies += n,
                EntityKind::WorkflowItem => counts.kanban_items += n,
            }
            counts.total += n;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str, source: EntityRef, target: EntityRef) -> CrossLink {
        CrossLink {
            id: id.into(),
            source_type: source.kind,
            source_id: source.id,
            target_type: target.kind,
            target_id: target.id,
            created_at: Utc::now(),
            notes: None,
        }
    }

    #[test]
    fn canonical_pair_is_order_independent() {
        let item = EntityRef::new(EntityKind::WorkflowItem, "rci-1");
        let dossier = EntityRef::new(EntityKind::Dossier, "dos-9");
        let forward = EntityRef::canonical_pair(item.clone(), dossier.clone());
        let reverse = EntityRef::canonical_pair(dossier.clone(), item.clone());
        assert_eq!(forward, reverse);
        assert_eq!(forward.0, item);
    }

    #[test]
    fn canonical_pair_puts_update_first() {
        let update = EntityRef::new(EntityKind::Update, "zzz");
        let policy = EntityRef::new(EntityKind::Policy, "aaa");
        let (source, target) = EntityRef::canonical_pair(policy, update.clone());
        assert_eq!(source, update);
        assert!(target.kind.is_link_target());
    }

    #[test]
    fn canonical_pair_same_kind_orders_by_id() {
        let a = EntityRef::new(EntityKind::WorkflowItem, "rci-a");
        let b = EntityRef::new(EntityKind::WorkflowItem, "rci-b");
        let (source, _) = EntityRef::canonical_pair(b, a.clone());
        assert_eq!(source, a);
    }

    #[test]
    fn collect_groups_by_opposite_side() {
        let item = EntityRef::new(EntityKind::WorkflowItem, "rci-1");
        let links = vec![
            link("lnk-1", EntityRef::new(EntityKind::Update, "upd-1"), item.clone()),
            link("lnk-2", item.clone(), EntityRef::new(EntityKind::Dossier, "dos-1")),
            link("lnk-3", item.clone(), EntityRef::new(EntityKind::Dossier, "dos-2")),
            link(
                "lnk-4",
                EntityRef::new(EntityKind::Update, "upd-2"),
                EntityRef::new(EntityKind::Policy, "pol-1"),
            ),
        ];

        let linked = LinkedItems::collect(Some(EntityKind::WorkflowItem), "rci-1", &links);
        assert_eq!(linked.len(), 3);
        assert_eq!(linked.get(EntityKind::Update).len(), 1);
        assert_eq!(linked.get(EntityKind::Dossier).len(), 2);
        assert!(linked.get(EntityKind::Policy).is_empty());
        assert_eq!(linked.groups[0].kind, EntityKind::Update);

        let counts = ConnectionCounts::from_linked(&linked);
        assert_eq!(counts.updates, 1);
        assert_eq!(counts.dossiers, 2);
        assert_eq!(counts.kanban_items, 0);
        assert_eq!(counts.total, 3);
    }

    #[test]
    fn opposite_respects_kind_filter() {
        let l = link(
            "lnk-1",
            EntityRef::new(EntityKind::Update, "x"),
            EntityRef::new(EntityKind::Dossier, "x"),
        );
        let from_dossier = l.opposite(Some(EntityKind::Dossier), "x").unwrap();
        assert_eq!(from_dossier.kind, EntityKind::Update);
        assert!(l.opposite(Some(EntityKind::Policy), "x").is_none());
    }
}
