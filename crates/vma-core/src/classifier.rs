//! Provenance classification: image metadata → marker value.
//!
//! The rule deciding whether an image is vendor-managed belongs to whoever
//! deploys the reconciler. Implement [`ProvenanceClassifier`] (or pass a
//! closure) to supply it. Results are written into infrastructure, so a
//! classifier must be total and deterministic.

use vma_fleet::ImageMetadata;

/// Maps image metadata to the value stored under the marker key.
pub trait ProvenanceClassifier: Send + Sync {
    fn classify(&self, location: &str, name: &str, owner_id: &str) -> String;

    fn classify_image(&self, image: &ImageMetadata) -> String {
        self.classify(&image.location, &image.name, &image.owner_id)
    }
}

impl<F> ProvenanceClassifier for F
where
    F: Fn(&str, &str, &str) -> String + Send + Sync,
{
    fn classify(&self, location: &str, name: &str, owner_id: &str) -> String {
        self(location, name, owner_id)
    }
}

/// Marks every image as vendor-managed until a real rule is supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderClassifier;

impl PlaceholderClassifier {
    pub const VALUE: &'static str = "true";
}

impl ProvenanceClassifier for PlaceholderClassifier {
    fn classify(&self, _location: &str, _name: &str, _owner_id: &str) -> String {
        Self::VALUE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_constant() {
        let c = PlaceholderClassifier;
        assert_eq!(c.classify("amazon/al2023", "al2023", "137112412989"), "true");
        assert_eq!(c.classify("", "", ""), "true");
        assert_eq!(c.classify_image(&ImageMetadata::unresolved("ami-1")), "true");
    }

    #[test]
    fn closures_are_classifiers() {
        let by_owner = |_: &str, _: &str, owner: &str| {
            if owner == "111122223333" {
                "true".to_string()
            } else {
                "false".to_string()
            }
        };
        assert_eq!(by_owner.classify("x", "y", "111122223333"), "true");
        assert_eq!(by_owner.classify("x", "y", "999999999999"), "false");
    }

    #[test]
    fn classify_image_forwards_fields() {
        let echo = |loc: &str, name: &str, owner: &str| format!("{}|{}|{}", loc, name, owner);
        let image = ImageMetadata {
            image_id: "ami-1".to_string(),
            location: "123/web".to_string(),
            name: "web".to_string(),
            owner_id: "123".to_string(),
        };
        assert_eq!(echo.classify_image(&image), "123/web|web|123");
    }
}
