use log::error;

const RESOURCES_TAG: &str = "<resources";

/// Metadata describing one published resource bundle.
///
/// `raw_payload` keeps the document exactly as it was received so it can be
/// written back to disk without re-serialising.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceDescriptor {
    version: String,
    expected_size: u64,
    raw_payload: String,
}

impl ResourceDescriptor {
    /// Parse a descriptor document.
    ///
    /// Returns `None` unless the `<resources` element and both the `version`
    /// and `fileSize` attributes are present and well formed.
    pub fn parse(payload: &str) -> Option<Self> {
        let version = parse_field(payload, "version")?;
        let file_size = parse_field(payload, "fileSize")?;

        if version.is_empty() {
            error!("descriptor: empty version attribute");
            return None;
        }
        let expected_size = match file_size.parse::<u64>() {
            Ok(size) => size,
            Err(err) => {
                error!("descriptor: invalid fileSize {:?}: {}", file_size, err);
                return None;
            }
        };

        Some(Self {
            version: version.to_owned(),
            expected_size,
            raw_payload: payload.to_owned(),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn expected_size(&self) -> u64 {
        self.expected_size
    }

    pub fn raw_payload(&self) -> &str {
        &self.raw_payload
    }
}

fn parse_field<'a>(payload: &'a str, field: &str) -> Option<&'a str> {
    let Some(tag_start) = payload.find(RESOURCES_TAG) else {
        error!("descriptor: couldn't find resources tag");
        return None;
    };
    let search_from = tag_start + RESOURCES_TAG.len();

    let marker = format!("{field}=\"");
    let Some(offset) = payload[search_from..].find(&marker) else {
        error!("descriptor: couldn't find {} attribute", field);
        return None;
    };
    let data_start = search_from + offset + marker.len();

    let Some(len) = payload[data_start..].find('"') else {
        error!("descriptor: unterminated {} attribute", field);
        return None;
    };
    Some(&payload[data_start..data_start + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_version_and_size() {
        let xml = r#"<?xml version="1.0"?>
<resources version="3.7" fileSize="1048576" />"#;
        let descriptor = ResourceDescriptor::parse(xml).unwrap();
        assert_eq!(descriptor.version(), "3.7");
        assert_eq!(descriptor.expected_size(), 1_048_576);
        assert_eq!(descriptor.raw_payload(), xml);
    }

    #[test]
    fn ignores_attributes_before_resources_tag() {
        // The prolog's version attribute must not be picked up.
        let xml = r#"<?xml version="1.0"?><resources fileSize="10" version="2.0"/>"#;
        let descriptor = ResourceDescriptor::parse(xml).unwrap();
        assert_eq!(descriptor.version(), "2.0");
        assert_eq!(descriptor.expected_size(), 10);
    }

    #[test]
    fn accepts_tags_starting_with_resources() {
        let xml = r#"<resourcesBundle version="1.0" fileSize="5"></resourcesBundle>"#;
        assert!(ResourceDescriptor::parse(xml).is_some());
    }

    #[test]
    fn rejects_missing_element() {
        assert!(ResourceDescriptor::parse(r#"<bundle version="1" fileSize="2"/>"#).is_none());
    }

    #[test]
    fn rejects_missing_attribute() {
        assert!(ResourceDescriptor::parse(r#"<resources version="1.0"/>"#).is_none());
        assert!(ResourceDescriptor::parse(r#"<resources fileSize="12"/>"#).is_none());
    }

    #[test]
    fn rejects_unterminated_or_invalid_values() {
        assert!(ResourceDescriptor::parse(r#"<resources version="1.0" fileSize="12"#).is_none());
        assert!(ResourceDescriptor::parse(r#"<resources version="1.0" fileSize="abc"/>"#).is_none());
        assert!(ResourceDescriptor::parse(r#"<resources version="1.0" fileSize="-4"/>"#).is_none());
        assert!(ResourceDescriptor::parse(r#"<resources version="" fileSize="4"/>"#).is_none());
    }

    #[test]
    fn rejects_padded_size() {
        assert!(ResourceDescriptor::parse(r#"<resources version="1.0" fileSize=" 12 "/>"#).is_none());
        assert!(ResourceDescriptor::parse(r#"<resources version="1.0" fileSize="12 "/>"#).is_none());
    }

    #[test]
    fn zero_size_is_still_a_valid_descriptor() {
        let descriptor =
            ResourceDescriptor::parse(r#"<resources version="1.0" fileSize="0"/>"#).unwrap();
        assert_eq!(descriptor.expected_size(), 0);
    }
}
