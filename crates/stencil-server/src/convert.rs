//! Domain <-> wire conversions.

use stencil_core::models::template::Template;

use crate::proto::v1;

/// Protobuf timestamps keep `nanos` in `0..1e9` even before the epoch.
pub fn to_proto_timestamp(ts: jiff::Timestamp) -> prost_types::Timestamp {
    let mut seconds = ts.as_second();
    let mut nanos = ts.subsec_nanosecond();
    if nanos < 0 {
        seconds -= 1;
        nanos += 1_000_000_000;
    }
    prost_types::Timestamp { seconds, nanos }
}

impl From<Template> for v1::Template {
    fn from(t: Template) -> Self {
        v1::Template {
            id: t.id,
            items: t.items,
            created: Some(to_proto_timestamp(t.created)),
            updated: Some(to_proto_timestamp(t.updated)),
        }
    }
}
