use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Server-assigned node identifier. Opaque to the client: never generated
/// locally, only echoed back in commands.
///
/// Serialized as a bare integer. Deserialization also accepts the numeric
/// string form JSON uses for object keys (`{"nodes": {"12": ...}}`), which
/// matters once the payload has been buffered by an internally tagged enum.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NodeIdVisitor;

        impl Visitor<'_> for NodeIdVisitor {
            type Value = NodeId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a node id as integer or numeric string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<NodeId, E> {
                u32::try_from(v)
                    .map(NodeId)
                    .map_err(|_| E::custom(format!("node id {v} out of range")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<NodeId, E> {
                u32::try_from(v)
                    .map(NodeId)
                    .map_err(|_| E::custom(format!("node id {v} out of range")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<NodeId, E> {
                v.trim()
                    .parse::<u32>()
                    .map(NodeId)
                    .map_err(|_| E::custom(format!("invalid node id {v:?}")))
            }
        }

        deserializer.deserialize_any(NodeIdVisitor)
    }
}

/// Identity of an edge: the ordered `(start, end)` pair.
///
/// On the wire an edge id is a two-element array `[start, end]`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    pub start: NodeId,
    pub end: NodeId,
}

impl EdgeKey {
    pub const fn new(start: NodeId, end: NodeId) -> Self {
        Self { start, end }
    }
}

impl fmt::Debug for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.start, self.end)
    }
}

impl Serialize for EdgeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.start, self.end).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EdgeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (start, end) = <(NodeId, NodeId)>::deserialize(deserializer)?;
        Ok(EdgeKey { start, end })
    }
}
