//! Cache key definitions.
//!
//! `CacheKey` addresses one cached value; `EntityKey` names the logical record or
//! collection a cached value was derived from, for invalidation.

use std::fmt;

use serde::Serialize;

/// Entity types that pass through the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customer,
    Category,
    Product,
    Order,
    OrderItem,
    Inventory,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Customer,
        EntityKind::Category,
        EntityKind::Product,
        EntityKind::Order,
        EntityKind::OrderItem,
        EntityKind::Inventory,
    ];

    /// Singular tag used as the prefix of record keys.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Category => "category",
            Self::Product => "product",
            Self::Order => "order",
            Self::OrderItem => "order-item",
            Self::Inventory => "inventory",
        }
    }

    /// Key of the full-collection snapshot.
    pub fn collection_tag(self) -> &'static str {
        match self {
            Self::Customer => "customers",
            Self::Category => "categories",
            Self::Product => "products",
            Self::Order => "orders",
            Self::OrderItem => "order-items",
            Self::Inventory => "inventories",
        }
    }

    /// Trailing segment of a child listing, as in `order:7:items`.
    pub fn child_segment(self) -> &'static str {
        match self {
            Self::OrderItem => "items",
            other => other.collection_tag(),
        }
    }

    /// Name used in configuration files and metric labels.
    pub fn label(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Category => "category",
            Self::Product => "product",
            Self::Order => "order",
            Self::OrderItem => "order_item",
            Self::Inventory => "inventory",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Secondary attributes a record can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupAttribute {
    Email,
    Name,
    Phone,
}

impl LookupAttribute {
    pub fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Name => "name",
            Self::Phone => "phone",
        }
    }

    /// Canonical form used both in the key and in the backing-store query, so a
    /// cached hit never answers a lookup the store would have rejected.
    pub fn normalize(self, value: &str) -> String {
        match self {
            Self::Email => value.trim().to_lowercase(),
            Self::Name | Self::Phone => value.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Discriminator {
    /// Primary identity.
    Id(i64),
    /// Normalized secondary attribute.
    Attribute {
        attribute: LookupAttribute,
        value: String,
    },
    /// Snapshot of every record of the kind.
    Collection,
    /// Records of the kind that belong to one parent record.
    Children { parent: EntityKind, parent_id: i64 },
}

/// Address of one cached value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: EntityKind,
    discriminator: Discriminator,
}

impl CacheKey {
    pub fn id(kind: EntityKind, id: i64) -> Self {
        Self {
            kind,
            discriminator: Discriminator::Id(id),
        }
    }

    /// Key for a lookup by `attribute`; `value` is normalized here.
    pub fn attribute(kind: EntityKind, attribute: LookupAttribute, value: &str) -> Self {
        Self {
            kind,
            discriminator: Discriminator::Attribute {
                attribute,
                value: attribute.normalize(value),
            },
        }
    }

    pub fn collection(kind: EntityKind) -> Self {
        Self {
            kind,
            discriminator: Discriminator::Collection,
        }
    }

    pub fn children(kind: EntityKind, parent: EntityKind, parent_id: i64) -> Self {
        Self {
            kind,
            discriminator: Discriminator::Children { parent, parent_id },
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }

    /// True for keys holding a list of records rather than a single one.
    pub fn is_listing(&self) -> bool {
        matches!(
            self.discriminator,
            Discriminator::Collection | Discriminator::Children { .. }
        )
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.discriminator {
            Discriminator::Id(id) => write!(f, "{}:{id}", self.kind.tag()),
            Discriminator::Attribute { attribute, value } => {
                write!(f, "{}:{}:{value}", self.kind.tag(), attribute.name())
            }
            Discriminator::Collection => f.write_str(self.kind.collection_tag()),
            Discriminator::Children { parent, parent_id } => write!(
                f,
                "{}:{parent_id}:{}",
                parent.tag(),
                self.kind.child_segment()
            ),
        }
    }
}

/// Identifies the logical data a cache entry was populated from.
///
/// When the data changes, every cache key registered against it is purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// One stored record.
    Record(EntityKind, i64),
    /// Membership of the kind's collection (creations and removals).
    Collection(EntityKind),
}

impl EntityKey {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Record(kind, _) | Self::Collection(kind) => *kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_render_with_entity_tag_and_discriminator() {
        assert_eq!(CacheKey::id(EntityKind::Customer, 1).to_string(), "customer:1");
        assert_eq!(
            CacheKey::collection(EntityKind::Product).to_string(),
            "products"
        );
        assert_eq!(
            CacheKey::children(EntityKind::OrderItem, EntityKind::Order, 7).to_string(),
            "order:7:items"
        );
        assert_eq!(
            CacheKey::children(EntityKind::Order, EntityKind::Customer, 3).to_string(),
            "customer:3:orders"
        );
        assert_eq!(
            CacheKey::attribute(EntityKind::Customer, LookupAttribute::Phone, " 843806784 ")
                .to_string(),
            "customer:phone:843806784"
        );
    }

    #[test]
    fn email_keys_are_case_insensitive() {
        let upper = CacheKey::attribute(
            EntityKind::Customer,
            LookupAttribute::Email,
            "Email@gmail.com",
        );
        let lower = CacheKey::attribute(
            EntityKind::Customer,
            LookupAttribute::Email,
            "email@gmail.com ",
        );
        assert_eq!(upper, lower);
        assert_eq!(upper.to_string(), "customer:email:email@gmail.com");
    }

    #[test]
    fn names_keep_their_case() {
        let a = CacheKey::attribute(EntityKind::Customer, LookupAttribute::Name, "Name");
        let b = CacheKey::attribute(EntityKind::Customer, LookupAttribute::Name, "name");
        assert_ne!(a, b);
    }

    #[test]
    fn id_and_attribute_keys_never_alias() {
        let by_id = CacheKey::id(EntityKind::Customer, 1);
        let by_name = CacheKey::attribute(EntityKind::Customer, LookupAttribute::Name, "1");
        assert_ne!(by_id, by_name);
        assert!(!by_id.is_listing());
        assert!(CacheKey::collection(EntityKind::Customer).is_listing());
    }

    #[test]
    fn labels_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(
            EntityKind::from_label("Order-Item"),
            Some(EntityKind::OrderItem)
        );
        assert_eq!(EntityKind::from_label("invoice"), None);
    }
}
