//! Hardened-runtime entitlements for the signed app

use plist::{Dictionary, Value};

/// Lets the app load a library signed by another team
pub const DISABLE_LIBRARY_VALIDATION: &str = "com.apple.security.cs.disable-library-validation";

/// Lets the Steam overlay inject through `DYLD_*` variables
pub const ALLOW_DYLD_ENVIRONMENT: &str = "com.apple.security.cs.allow-dyld-environment-variables";

/// Entitlement keys granted for the given features
pub fn entitlement_keys(steam: bool) -> Vec<&'static str> {
    if steam {
        vec![DISABLE_LIBRARY_VALIDATION, ALLOW_DYLD_ENVIRONMENT]
    } else {
        Vec::new()
    }
}

/// Render the entitlements plist as XML.
pub fn render(steam: bool) -> Result<Vec<u8>, plist::Error> {
    let mut dict = Dictionary::new();
    for key in entitlement_keys(steam) {
        dict.insert(key.to_string(), Value::Boolean(true));
    }
    let mut buf = Vec::new();
    Value::Dictionary(dict).to_writer_xml(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steam_entitlements() {
        let xml = render(true).unwrap();
        let value = Value::from_reader_xml(xml.as_slice()).unwrap();
        let dict = value.as_dictionary().unwrap();

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(DISABLE_LIBRARY_VALIDATION).and_then(Value::as_boolean), Some(true));
        assert_eq!(dict.get(ALLOW_DYLD_ENVIRONMENT).and_then(Value::as_boolean), Some(true));
    }

    #[test]
    fn test_no_features_is_empty_dict() {
        let value = Value::from_reader_xml(render(false).unwrap().as_slice()).unwrap();
        assert!(value.as_dictionary().unwrap().is_empty());
    }
}
