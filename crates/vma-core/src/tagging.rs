//! Marker detection and merging over launch-template tag specifications.
//!
//! The marker lives in the `"instance"` resource-type group. Keys are compared
//! exactly: no case folding, no trimming.

use vma_fleet::{ResourceTags, Tag, TagSpecification};

/// Provenance marker key.
pub const MARKER_KEY: &str = "Vendor_Managed_AMI";

/// Resource type whose tag group carries the marker.
pub const INSTANCE_RESOURCE_TYPE: &str = "instance";

/// `true` iff some `"instance"` group holds a pair keyed exactly
/// [`MARKER_KEY`]. A marker under any other resource type does not count.
pub fn has_marker(spec: &TagSpecification) -> bool {
    marker_value(spec).is_some()
}

/// Value of the first marker found across the `"instance"` groups.
pub fn marker_value(spec: &TagSpecification) -> Option<&str> {
    spec.entries()
        .iter()
        .filter(|entry| entry.resource_type == INSTANCE_RESOURCE_TYPE)
        .flat_map(|entry| entry.tags.iter())
        .find(|t| t.key == MARKER_KEY)
        .map(|t| t.value.as_str())
}

/// Build the tag specification for the next template version.
///
/// Non-instance groups are copied unchanged, in order. The first instance
/// group gets `{MARKER_KEY: value}` appended to a copy of its pairs and keeps
/// its position; later instance groups are dropped. Without an instance group,
/// a new one holding only the marker is appended.
pub fn with_marker_merged(spec: &TagSpecification, value: &str) -> TagSpecification {
    let marker = Tag::new(MARKER_KEY, value);
    let mut merged = Vec::with_capacity(spec.entries().len() + 1);
    let mut instance_seen = false;

    for entry in spec.entries() {
        if entry.resource_type != INSTANCE_RESOURCE_TYPE {
            merged.push(entry.clone());
            continue;
        }
        if instance_seen {
            continue;
        }
        instance_seen = true;
        let mut tags = entry.tags.clone();
        tags.push(marker.clone());
        merged.push(ResourceTags::new(INSTANCE_RESOURCE_TYPE, tags));
    }

    if !instance_seen {
        merged.push(ResourceTags::new(INSTANCE_RESOURCE_TYPE, vec![marker]));
    }
    TagSpecification::new(merged)
}
